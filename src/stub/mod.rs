//! The stub proper: per-target state, lifecycle, and the process-wide
//! exception entry points.
//!
//! All stub state lives in a single [`GdbTarget`] value owned by the
//! embedder. [`attach`] publishes it to a process-wide cell; the extender
//! glue then funnels every delivered exception through
//! [`dispatch_exception`]. Nothing here allocates, and nothing here is
//! reentrant; see the crate docs for the two-context execution model.

mod cmd;
mod dispatch;
mod mem;

pub(crate) mod error;

#[cfg(test)]
pub(crate) mod testing;

pub use error::ConnectionErrorKind;
pub use error::Error;

use core::cell::UnsafeCell;
use core::ptr::NonNull;

use crate::arch::reg::Regs;
use crate::arch::ExceptionFrame;
use crate::common::Signal;
use crate::conn::ConnectionExt;
use crate::stub::mem::FaultTrap;
use crate::sys::Extender;
use crate::sys::Region;
use crate::sys::Resume;
use crate::sys::TrapKind;
use crate::BUF_MAX;

/// A GDB target stub: the register snapshot, packet buffers, and
/// fault-recovery state for one debuggee, bound to a
/// [`Connection`](crate::conn::Connection) and an [`Extender`].
///
/// The embedder typically places this in static storage and hands it to
/// [`attach`]; everything after that happens in exception context.
pub struct GdbTarget<C, X> {
    conn: C,
    sys: X,
    regs: Regs,
    last_signal: Signal,
    vector: Option<u16>,
    err_code: u16,
    verbose: bool,
    fault: FaultTrap,
    in_buf: [u8; BUF_MAX],
    out_buf: [u8; BUF_MAX],
}

impl<C: ConnectionExt, X: Extender> GdbTarget<C, X> {
    pub fn new(conn: C, sys: X) -> GdbTarget<C, X> {
        GdbTarget {
            conn,
            sys,
            regs: Regs::default(),
            last_signal: Signal::SIGTRAP,
            vector: None,
            err_code: 0,
            verbose: false,
            fault: FaultTrap::new(),
            in_buf: [0; BUF_MAX],
            out_buf: [0; BUF_MAX],
        }
    }

    /// The register snapshot as of the last stop.
    pub fn regs(&self) -> &Regs {
        &self.regs
    }

    /// The vector of the last exception dispatched through the stub, kept
    /// for post-mortem inspection (GDB itself only sees the signal number).
    pub fn last_vector(&self) -> Option<u16> {
        self.vector
    }

    /// The CPU-reported error code (the low half of the saved-state
    /// record's signal-mask word) of the last stop.
    pub fn last_error_code(&self) -> u16 {
        self.err_code
    }
}

/// Object-safe view of a [`GdbTarget`], used by the process-wide cell so
/// the entry points don't carry the embedder's type parameters.
trait ExceptionEntry {
    fn exception(&mut self, kind: TrapKind, vector: u16, frame: &mut ExceptionFrame) -> Resume;
    fn teardown(&mut self);
}

impl<C: ConnectionExt, X: Extender> ExceptionEntry for GdbTarget<C, X> {
    fn exception(&mut self, kind: TrapKind, vector: u16, frame: &mut ExceptionFrame) -> Resume {
        match self.on_exception(kind, vector, frame) {
            Ok(resume) => resume,
            Err(e) => {
                // nothing sane left to do over a dead transport; put the
                // debuggee back on the road
                log::error!(
                    "fatal {:?}-side transport error while serving the host; resuming debuggee",
                    e.kind()
                );
                Resume::Frame
            }
        }
    }

    fn teardown(&mut self) {
        if self.sys.restore_traps().is_err() {
            log::error!("failed to restore default trap handlers");
        }
    }
}

struct ActiveCell(UnsafeCell<Option<NonNull<dyn ExceptionEntry>>>);

// SAFETY: the debuggee and the stub are two cooperative contexts in a
// single-threaded program; the stub only runs with the debuggee frozen in
// an exception, so the cell is never accessed concurrently.
unsafe impl Sync for ActiveCell {}

static ACTIVE: ActiveCell = ActiveCell(UnsafeCell::new(None));

/// Install the stub: lock its state in memory, register the trap handlers,
/// and publish it as the process-wide exception target.
///
/// A previously attached stub is silently replaced (without restoring its
/// handlers first).
pub fn attach<C, X>(stub: &'static mut GdbTarget<C, X>) -> Result<(), X::Error>
where
    C: ConnectionExt + 'static,
    X: Extender + 'static,
{
    // the handlers must never page-fault themselves
    let region = Region::of_val(&*stub);
    stub.sys.lock_region(region)?;
    stub.sys.install_traps()?;

    let entry: &'static mut dyn ExceptionEntry = stub;
    // SAFETY: see ActiveCell
    unsafe { *ACTIVE.0.get() = Some(NonNull::from(entry)) };
    Ok(())
}

/// Restore default trap handling and forget the attached stub.
///
/// A no-op when nothing is attached. Hosted builds typically also register
/// this as an exit hook so a crashing debuggee can't leave stale handlers
/// behind.
pub fn detach() {
    // SAFETY: see ActiveCell
    let entry = unsafe { (*ACTIVE.0.get()).take() };
    if let Some(mut entry) = entry {
        // SAFETY: attach takes a &'static mut, so the pointee is still live
        unsafe { entry.as_mut() }.teardown();
    }
}

/// Whether a stub is currently attached.
pub fn attached() -> bool {
    // SAFETY: see ActiveCell
    unsafe { (*ACTIVE.0.get()).is_some() }
}

/// The process-wide exception entry the extender glue routes traps to.
///
/// With no stub attached the exception is ignored and the debuggee resumed
/// unchanged.
pub fn dispatch_exception(kind: TrapKind, vector: u16, frame: &mut ExceptionFrame) -> Resume {
    // SAFETY: see ActiveCell
    match unsafe { (*ACTIVE.0.get()).as_mut() } {
        // SAFETY: attach takes a &'static mut, so the pointee is still live
        Some(entry) => unsafe { entry.as_mut() }.exception(kind, vector, frame),
        None => Resume::Frame,
    }
}

/// Raise a software breakpoint trap, stopping the program under the
/// attached debugger.
///
/// Used at program start to synchronize with the host. Before [`attach`]
/// (and on non-x86 builds) this is silently a no-op.
pub fn breakpoint() {
    if !attached() {
        return;
    }

    #[cfg(any(target_arch = "x86", target_arch = "x86_64"))]
    // SAFETY: raises the breakpoint trap serviced by the handlers that
    // `attached()` just confirmed are installed
    unsafe {
        core::arch::asm!("int3")
    };
}
