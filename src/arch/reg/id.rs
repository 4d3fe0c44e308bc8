/// i386 register identifier, in GDB's `P`-packet numbering.
///
/// Source: <https://github.com/bminor/binutils-gdb/blob/master/gdb/features/i386/32bit-core.xml>
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegId {
    Eax,
    Ecx,
    Edx,
    Ebx,
    Esp,
    Ebp,
    Esi,
    Edi,
    Eip,
    Eflags,
    Cs,
    Ss,
    Ds,
    Es,
    Fs,
    Gs,
}

impl RegId {
    /// Map a raw `P`-packet register number to an identifier.
    pub fn from_raw_id(id: usize) -> Option<RegId> {
        use self::RegId::*;

        let r = match id {
            0 => Eax,
            1 => Ecx,
            2 => Edx,
            3 => Ebx,
            4 => Esp,
            5 => Ebp,
            6 => Esi,
            7 => Edi,
            8 => Eip,
            9 => Eflags,
            10 => Cs,
            11 => Ss,
            12 => Ds,
            13 => Es,
            14 => Fs,
            15 => Gs,
            _ => return None,
        };
        Some(r)
    }

    /// Segment selectors are only 16 bits wide; writes to them are masked.
    pub fn is_segment(self) -> bool {
        use self::RegId::*;

        matches!(self, Cs | Ss | Ds | Es | Fs | Gs)
    }
}
