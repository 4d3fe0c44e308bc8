//! Fault-tolerant access to the debuggee's address space.
//!
//! Host-driven memory reads and writes must survive bad addresses: the stub
//! arms a fault hook before touching memory, and the exception dispatcher
//! consults it when a Segv trap arrives. A fault inside the window turns
//! into a truncated read or aborted write and an `E03` reply; a fault
//! anywhere else in the stub is terminal, exactly as it would be in the
//! debuggee.

use crate::protocol::response_writer::ResponseWriter;
use crate::sys::Extender;
use crate::sys::MemFault;

/// The cooperative fault-recovery window.
///
/// `hook` is non-`None` only between [`FaultTrap::arm`] and
/// [`FaultTrap::disarm`]; it points at the routine a Segv dispatch invokes
/// in place of the command loop. `mem_err` records that the window tripped,
/// and stays set until the access's caller consumes it.
pub(crate) struct FaultTrap {
    hook: Option<fn(&mut FaultTrap)>,
    mem_err: bool,
}

impl FaultTrap {
    pub const fn new() -> FaultTrap {
        FaultTrap {
            hook: None,
            mem_err: false,
        }
    }

    fn note_fault(trap: &mut FaultTrap) {
        trap.mem_err = true;
    }

    pub fn arm(&mut self) {
        self.mem_err = false;
        self.hook = Some(FaultTrap::note_fault);
    }

    pub fn disarm(&mut self) {
        self.hook = None;
    }

    pub fn armed(&self) -> bool {
        self.hook.is_some()
    }

    /// Dispatcher path: invoke and clear the armed hook.
    ///
    /// Returns `false` when no hook was armed, i.e. the fault did not come
    /// from a stub-initiated access and must be treated as a debuggee stop.
    pub fn trip(&mut self) -> bool {
        match self.hook.take() {
            Some(hook) => {
                hook(self);
                true
            }
            None => false,
        }
    }

    /// Consume the fault record for the window that just closed.
    pub fn take_err(&mut self) -> bool {
        core::mem::replace(&mut self.mem_err, false)
    }
}

/// Read `len` bytes starting at `addr`, streaming them into `out` as hex.
///
/// A fault (or a full reply buffer) stops the loop early; the truncated
/// output already staged remains valid. Check
/// [`FaultTrap::take_err`] afterwards to distinguish the two.
pub(crate) fn read_into_hex<X: Extender>(
    sys: &mut X,
    trap: &mut FaultTrap,
    addr: u32,
    len: usize,
    out: &mut ResponseWriter<'_>,
) {
    trap.arm();
    for i in 0..len {
        let byte = match sys.peek(addr.wrapping_add(i as u32)) {
            Ok(byte) => byte,
            Err(MemFault) => {
                trap.mem_err = true;
                break;
            }
        };
        // the dispatcher may have tripped the window underneath the access
        if trap.mem_err {
            break;
        }
        if out.write_hex(byte).is_err() {
            break;
        }
    }
    trap.disarm();
}

/// Write `data` to the debuggee starting at `addr`.
///
/// Stops at the first faulting byte; check [`FaultTrap::take_err`]
/// afterwards.
pub(crate) fn write_bytes<X: Extender>(
    sys: &mut X,
    trap: &mut FaultTrap,
    addr: u32,
    data: &[u8],
) {
    trap.arm();
    for (i, &byte) in data.iter().enumerate() {
        if sys.poke(addr.wrapping_add(i as u32), byte).is_err() {
            trap.mem_err = true;
            break;
        }
        if trap.mem_err {
            break;
        }
    }
    trap.disarm();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stub::testing::MockSys;
    use crate::stub::testing::RAM_BASE;

    #[test]
    fn read_streams_hex() {
        let mut sys = MockSys::new();
        sys.ram[..3].copy_from_slice(&[0x01, 0x02, 0x03]);
        let mut trap = FaultTrap::new();
        let mut buf = [0u8; 16];
        let mut out = ResponseWriter::new(&mut buf);

        read_into_hex(&mut sys, &mut trap, RAM_BASE, 3, &mut out);

        assert_eq!(out.as_payload(), b"010203");
        assert!(!trap.take_err());
        assert!(!trap.armed());
    }

    #[test]
    fn read_fault_truncates_and_records() {
        let mut sys = MockSys::new();
        sys.ram[62] = 0xaa;
        sys.ram[63] = 0xbb;
        let mut trap = FaultTrap::new();
        let mut buf = [0u8; 16];
        let mut out = ResponseWriter::new(&mut buf);

        // runs off the end of RAM after two bytes
        read_into_hex(&mut sys, &mut trap, RAM_BASE + 62, 4, &mut out);

        assert_eq!(out.as_payload(), b"aabb");
        assert!(trap.take_err());
        assert!(!trap.armed());
        // consumed
        assert!(!trap.take_err());
    }

    #[test]
    fn write_stops_at_fault() {
        let mut sys = MockSys::new();
        let mut trap = FaultTrap::new();

        write_bytes(&mut sys, &mut trap, RAM_BASE + 63, &[0x11, 0x22]);

        assert_eq!(sys.ram[63], 0x11);
        assert!(trap.take_err());
        assert!(!trap.armed());
    }

    #[test]
    fn trip_requires_armed_window() {
        let mut trap = FaultTrap::new();
        assert!(!trap.trip());

        trap.arm();
        assert!(trap.trip());
        assert!(!trap.armed());
        assert!(trap.take_err());
    }
}
