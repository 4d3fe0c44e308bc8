//! Scripted `Connection`/`Extender` doubles shared by the stub's unit
//! tests.

use crate::conn::Connection;
use crate::conn::ConnectionExt;
use crate::stub::GdbTarget;
use crate::sys::Extender;
use crate::sys::MemFault;
use crate::sys::Region;

/// A scripted serial line: reads pop from the script, writes accumulate in
/// `tx`.
pub(crate) struct Pipe {
    rx: Vec<u8>,
    pos: usize,
    pub tx: Vec<u8>,
}

impl Pipe {
    pub fn new(script: Vec<u8>) -> Pipe {
        Pipe {
            rx: script,
            pos: 0,
            tx: Vec::new(),
        }
    }
}

impl Connection for Pipe {
    type Error = &'static str;

    fn write(&mut self, byte: u8) -> Result<(), Self::Error> {
        self.tx.push(byte);
        Ok(())
    }

    fn flush(&mut self) -> Result<(), Self::Error> {
        Ok(())
    }
}

impl ConnectionExt for Pipe {
    fn read(&mut self) -> Result<u8, Self::Error> {
        let b = *self.rx.get(self.pos).ok_or("script exhausted")?;
        self.pos += 1;
        Ok(b)
    }
}

pub(crate) const RAM_BASE: u32 = 0x1000;
pub(crate) const RAM_LEN: usize = 64;

/// A fake extender with 64 bytes of "RAM" at [`RAM_BASE`]; any other
/// address faults.
pub(crate) struct MockSys {
    pub ram: [u8; RAM_LEN],
}

impl MockSys {
    pub fn new() -> MockSys {
        MockSys { ram: [0; RAM_LEN] }
    }

    fn slot(&self, addr: u32) -> Option<usize> {
        let off = addr.checked_sub(RAM_BASE)? as usize;
        (off < self.ram.len()).then_some(off)
    }
}

impl Extender for MockSys {
    type Error = &'static str;

    fn install_traps(&mut self) -> Result<(), Self::Error> {
        Ok(())
    }

    fn restore_traps(&mut self) -> Result<(), Self::Error> {
        Ok(())
    }

    fn lock_region(&mut self, _region: Region) -> Result<(), Self::Error> {
        Ok(())
    }

    fn peek(&mut self, addr: u32) -> Result<u8, MemFault> {
        let slot = self.slot(addr).ok_or(MemFault)?;
        Ok(self.ram[slot])
    }

    fn poke(&mut self, addr: u32, val: u8) -> Result<(), MemFault> {
        let slot = self.slot(addr).ok_or(MemFault)?;
        self.ram[slot] = val;
        Ok(())
    }
}

/// Frame a payload as the host (or the stub) would put it on the wire.
pub(crate) fn frame_pkt(payload: &[u8]) -> Vec<u8> {
    let sum = payload.iter().fold(0u8, |a, x| a.wrapping_add(*x));
    let mut out = vec![b'$'];
    out.extend_from_slice(payload);
    out.push(b'#');
    out.push(crate::protocol::hex::HEX_DIGITS[usize::from(sum >> 4)]);
    out.push(crate::protocol::hex::HEX_DIGITS[usize::from(sum & 0xf)]);
    out
}

/// Build the host's side of a session: an ack for the stop reply, then each
/// command packet followed by an ack for the stub's reply to it. The final
/// command (`c`/`s`) gets no trailing ack since the stub leaves the loop
/// without replying.
pub(crate) fn host_script(commands: &[&[u8]]) -> Vec<u8> {
    let mut script = vec![b'+'];
    for (i, cmd) in commands.iter().enumerate() {
        script.extend_from_slice(&frame_pkt(cmd));
        let last = i == commands.len() - 1;
        if !last {
            script.push(b'+');
        }
    }
    script
}

pub(crate) fn make_stub(script: Vec<u8>) -> GdbTarget<Pipe, MockSys> {
    GdbTarget::new(Pipe::new(script), MockSys::new())
}
