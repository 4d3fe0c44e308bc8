//! The exception dispatcher: exception in, [`Resume`] verdict out.

use crate::arch::reg::Regs;
use crate::arch::ExceptionFrame;
use crate::conn::ConnectionExt;
use crate::stub::error::Error;
use crate::stub::GdbTarget;
use crate::sys::Extender;
use crate::sys::Resume;
use crate::sys::TrapKind;

impl<C: ConnectionExt, X: Extender> GdbTarget<C, X> {
    /// Service a delivered exception.
    ///
    /// Snapshots the CPU state out of `frame`, then either:
    ///
    /// - hands a Segv raised inside the stub's armed memory-access window to
    ///   the fault hook and asks the glue to escape back to the access site
    ///   ([`Resume::FaultRecovery`]), or
    /// - reports the stop to the host and serves commands until a
    ///   continue/step, at which point the (possibly host-modified) snapshot
    ///   is published back into `frame` and the glue reloads the CPU from it
    ///   ([`Resume::Frame`]).
    ///
    /// An `Err` means the transport died mid-session; `frame` has already
    /// been updated with the latest snapshot when that happens.
    pub fn on_exception(
        &mut self,
        kind: TrapKind,
        vector: u16,
        frame: &mut ExceptionFrame,
    ) -> Result<Resume, Error<C::Error>> {
        self.regs = Regs::from_frame(frame);

        // a fault inside an armed access window belongs to the memory
        // primitive, not to the debuggee
        if kind == TrapKind::Segv && self.fault.trip() {
            self.regs.write_frame(frame);
            return Ok(Resume::FaultRecovery);
        }

        self.err_code = (frame.sigmask & 0xffff) as u16;

        let result = self.command_loop(vector);
        self.regs.write_frame(frame);
        result.map(|()| Resume::Frame)
    }
}
