use core::ops::Range;

use crate::protocol::hex::hex_nibble;
use crate::protocol::hex::parse_hex_prefix;

/// A parsed host command.
///
/// Payload-bearing commands (`G`, `M`) hold ranges into the inbound packet
/// buffer rather than borrowed slices, so the dispatcher is free to mutate
/// other stub state while a command is in flight.
#[derive(Debug, PartialEq, Eq)]
pub(crate) enum Command {
    /// `?`: re-report the last stop signal.
    LastSignal,
    /// `H`: thread selection (single-threaded, so always a no-op).
    SetThread,
    /// `qC`
    QueryCurrentThread,
    /// `qAttached`
    QueryAttached,
    /// `qfThreadInfo`
    QueryThreadInfoFirst,
    /// `qsThreadInfo`
    QueryThreadInfoNext,
    /// `qSymbol::`, the symbol lookup handshake.
    QuerySymbol,
    /// `d`: toggle verbose diagnostics.
    ToggleVerbose,
    /// `g`
    ReadRegisters,
    /// `G`, holding the range of the hex-encoded register file.
    WriteRegisters(Range<usize>),
    /// `P n=hhhhhhhh`, with the value already decoded from its little-endian
    /// wire form.
    WriteRegister { id: usize, val: u32 },
    /// `m addr,len`
    ReadMem { addr: u32, len: usize },
    /// `M addr,len:hh..`, holding the range of the hex-encoded data.
    WriteMem { addr: u32, data: Range<usize> },
    /// `c [addr]`
    Continue { addr: Option<u32> },
    /// `s [addr]`
    Step { addr: Option<u32> },
    /// `k`: a no-op here; the host drives teardown.
    Kill,
    /// Anything unrecognized, answered with the empty "unsupported" reply.
    Unknown,
}

/// Parse failure, tagged with the error reply the protocol expects for the
/// command that failed.
#[derive(Debug, PartialEq, Eq)]
pub(crate) enum Malformed {
    E01,
    E02,
}

impl Malformed {
    pub fn reply(&self) -> &'static [u8] {
        match self {
            Malformed::E01 => b"E01",
            Malformed::E02 => b"E02",
        }
    }
}

pub(crate) fn parse(buf: &[u8], body: Range<usize>) -> Result<Command, Malformed> {
    let base = body.start;
    let body = &buf[body];
    let total = body.len();

    let (&first, args) = match body.split_first() {
        Some(parts) => parts,
        None => return Ok(Command::Unknown),
    };

    let cmd = match first {
        b'?' => Command::LastSignal,
        b'H' => Command::SetThread,
        b'q' => match args {
            b"C" => Command::QueryCurrentThread,
            b"Attached" => Command::QueryAttached,
            b"fThreadInfo" => Command::QueryThreadInfoFirst,
            b"sThreadInfo" => Command::QueryThreadInfoNext,
            b"Symbol::" => Command::QuerySymbol,
            _ => Command::Unknown,
        },
        b'd' => Command::ToggleVerbose,
        b'g' => Command::ReadRegisters,
        b'G' => Command::WriteRegisters((base + 1)..(base + total)),
        b'P' => {
            let (id, rest) = parse_hex_prefix(args);
            let id = id.ok_or(Malformed::E01)?;
            let rest = rest.strip_prefix(b"=").ok_or(Malformed::E01)?;
            if rest.len() != 8 {
                return Err(Malformed::E01);
            }
            let mut bytes = [0u8; 4];
            for (i, pair) in rest.chunks_exact(2).enumerate() {
                let hi = hex_nibble(pair[0]).ok_or(Malformed::E01)?;
                let lo = hex_nibble(pair[1]).ok_or(Malformed::E01)?;
                bytes[i] = hi << 4 | lo;
            }
            Command::WriteRegister {
                id: id as usize,
                val: u32::from_le_bytes(bytes),
            }
        }
        b'm' => {
            let (addr, rest) = parse_hex_prefix(args);
            let addr = addr.ok_or(Malformed::E01)?;
            let rest = rest.strip_prefix(b",").ok_or(Malformed::E01)?;
            let (len, _) = parse_hex_prefix(rest);
            let len = len.ok_or(Malformed::E01)?;
            Command::ReadMem {
                addr,
                len: len as usize,
            }
        }
        b'M' => {
            let (addr, rest) = parse_hex_prefix(args);
            let addr = addr.ok_or(Malformed::E02)?;
            let rest = rest.strip_prefix(b",").ok_or(Malformed::E02)?;
            let (len, rest) = parse_hex_prefix(rest);
            let len = len.ok_or(Malformed::E02)?;
            let rest = rest.strip_prefix(b":").ok_or(Malformed::E02)?;
            if rest.len() != len as usize * 2 {
                return Err(Malformed::E02);
            }
            let start = base + (total - rest.len());
            Command::WriteMem {
                addr,
                data: start..(base + total),
            }
        }
        b'c' => {
            let (addr, _) = parse_hex_prefix(args);
            Command::Continue { addr }
        }
        b's' => {
            let (addr, _) = parse_hex_prefix(args);
            Command::Step { addr }
        }
        b'k' => Command::Kill,
        _ => Command::Unknown,
    };

    Ok(cmd)
}
