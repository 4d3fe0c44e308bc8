//! The register snapshot exchanged with the host.

mod id;

pub use id::RegId;

use core::convert::TryInto;

use crate::arch::Eflags;
use crate::arch::ExceptionFrame;

/// Number of registers in the snapshot.
pub const NUM_REGS: usize = 16;

/// Number of raw bytes in the snapshot's wire form.
pub const NUM_REG_BYTES: usize = NUM_REGS * 4;

/// i386 general registers, in the fixed order GDB's `g`/`G` packets expect.
///
/// Source: <https://github.com/bminor/binutils-gdb/blob/master/gdb/features/i386/32bit-core.xml>
///
/// Each slot is 32 bits wide on the wire; segment selectors occupy the low
/// 16 bits of theirs.
///
/// `repr(C)`: the resume trampoline addresses individual slots by byte
/// offset, so field order must be the in-memory layout.
#[repr(C)]
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Regs {
    /// Accumulator
    pub eax: u32,
    /// Count register
    pub ecx: u32,
    /// Data register
    pub edx: u32,
    /// Base register
    pub ebx: u32,
    /// Stack pointer
    pub esp: u32,
    /// Base pointer
    pub ebp: u32,
    /// Source index
    pub esi: u32,
    /// Destination index
    pub edi: u32,
    /// Instruction pointer
    pub eip: u32,
    /// Status register
    pub eflags: u32,
    pub cs: u32,
    pub ss: u32,
    pub ds: u32,
    pub es: u32,
    pub fs: u32,
    pub gs: u32,
}

impl Regs {
    pub fn pc(&self) -> u32 {
        self.eip
    }

    pub fn trace_flag(&self) -> bool {
        Eflags::from_bits_retain(self.eflags).contains(Eflags::TRACE)
    }

    /// Force EFLAGS.TF to the given state, leaving every other flag alone.
    pub fn set_trace_flag(&mut self, on: bool) {
        let mut flags = Eflags::from_bits_retain(self.eflags);
        flags.set(Eflags::TRACE, on);
        self.eflags = flags.bits();
    }

    /// Emit the snapshot in wire order: little-endian per register,
    /// registers concatenated in `P`-index order.
    pub fn gdb_serialize(&self, mut write_byte: impl FnMut(u8)) {
        macro_rules! write_regs {
            ($($reg:ident),*) => {
                $(
                    for b in self.$reg.to_le_bytes() {
                        write_byte(b)
                    }
                )*
            }
        }

        write_regs!(eax, ecx, edx, ebx, esp, ebp, esi, edi, eip, eflags, cs, ss, ds, es, fs, gs);
    }

    /// Reload the snapshot from its wire form.
    ///
    /// The upper 16 bits of incoming segment slots are discarded.
    pub fn gdb_deserialize(&mut self, bytes: &[u8]) -> Result<(), ()> {
        if bytes.len() < NUM_REG_BYTES {
            return Err(());
        }

        let mut vals = bytes
            .chunks_exact(4)
            .map(|c| u32::from_le_bytes(c.try_into().unwrap()));

        macro_rules! parse_regs {
            ($($reg:ident),*) => {
                $(
                    self.$reg = vals.next().ok_or(())?;
                )*
            }
        }

        macro_rules! parse_segs {
            ($($reg:ident),*) => {
                $(
                    self.$reg = vals.next().ok_or(())? & 0xffff;
                )*
            }
        }

        parse_regs!(eax, ecx, edx, ebx, esp, ebp, esi, edi, eip, eflags);
        parse_segs!(cs, ss, ds, es, fs, gs);

        Ok(())
    }

    pub fn read(&self, id: RegId) -> u32 {
        match id {
            RegId::Eax => self.eax,
            RegId::Ecx => self.ecx,
            RegId::Edx => self.edx,
            RegId::Ebx => self.ebx,
            RegId::Esp => self.esp,
            RegId::Ebp => self.ebp,
            RegId::Esi => self.esi,
            RegId::Edi => self.edi,
            RegId::Eip => self.eip,
            RegId::Eflags => self.eflags,
            RegId::Cs => self.cs,
            RegId::Ss => self.ss,
            RegId::Ds => self.ds,
            RegId::Es => self.es,
            RegId::Fs => self.fs,
            RegId::Gs => self.gs,
        }
    }

    pub fn write(&mut self, id: RegId, val: u32) {
        let val = if id.is_segment() { val & 0xffff } else { val };
        match id {
            RegId::Eax => self.eax = val,
            RegId::Ecx => self.ecx = val,
            RegId::Edx => self.edx = val,
            RegId::Ebx => self.ebx = val,
            RegId::Esp => self.esp = val,
            RegId::Ebp => self.ebp = val,
            RegId::Esi => self.esi = val,
            RegId::Edi => self.edi = val,
            RegId::Eip => self.eip = val,
            RegId::Eflags => self.eflags = val,
            RegId::Cs => self.cs = val,
            RegId::Ss => self.ss = val,
            RegId::Ds => self.ds = val,
            RegId::Es => self.es = val,
            RegId::Fs => self.fs = val,
            RegId::Gs => self.gs = val,
        }
    }

    /// Snapshot the architectural state out of the extender's saved-state
    /// record.
    pub fn from_frame(frame: &ExceptionFrame) -> Regs {
        Regs {
            eax: frame.eax,
            ecx: frame.ecx,
            edx: frame.edx,
            ebx: frame.ebx,
            esp: frame.esp,
            ebp: frame.ebp,
            esi: frame.esi,
            edi: frame.edi,
            eip: frame.eip,
            eflags: frame.eflags,
            cs: frame.cs,
            ss: frame.ss,
            ds: frame.ds,
            es: frame.es,
            fs: frame.fs,
            gs: frame.gs,
        }
    }

    /// Publish the (possibly host-modified) snapshot back into the
    /// extender's saved-state record.
    pub fn write_frame(&self, frame: &mut ExceptionFrame) {
        frame.eax = self.eax;
        frame.ecx = self.ecx;
        frame.edx = self.edx;
        frame.ebx = self.ebx;
        frame.esp = self.esp;
        frame.ebp = self.ebp;
        frame.esi = self.esi;
        frame.edi = self.edi;
        frame.eip = self.eip;
        frame.eflags = self.eflags;
        frame.cs = self.cs;
        frame.ss = self.ss;
        frame.ds = self.ds;
        frame.es = self.es;
        frame.fs = self.fs;
        frame.gs = self.gs;
    }
}
