use btoi::btou_radix;
use btoi::ParseIntegerError;
use num_traits::CheckedAdd;
use num_traits::CheckedMul;
use num_traits::FromPrimitive;
use num_traits::Zero;

/// Lowercase hex digits, used wherever the stub emits hex.
pub(crate) const HEX_DIGITS: &[u8; 16] = b"0123456789abcdef";

/// Decode a hex digit, case-insensitive.
pub(crate) fn hex_nibble(c: u8) -> Option<u8> {
    match c {
        b'0'..=b'9' => Some(c - b'0'),
        b'a'..=b'f' => Some(c - b'a' + 10),
        b'A'..=b'F' => Some(c - b'A' + 10),
        _ => None,
    }
}

/// Decode an entire buffer of hex chars into an integer.
#[inline]
pub(crate) fn decode_hex<I>(buf: &[u8]) -> Result<I, ParseIntegerError>
where
    I: FromPrimitive + Zero + CheckedAdd + CheckedMul,
{
    btou_radix(buf, 16)
}

#[derive(Debug, PartialEq, Eq)]
pub(crate) enum DecodeHexBufError {
    NotAscii,
    NotEvenLen,
}

/// Decode a hex string into a byte slice _in place_.
pub(crate) fn decode_hex_buf(buf: &mut [u8]) -> Result<&mut [u8], DecodeHexBufError> {
    use DecodeHexBufError::*;

    if buf.len() % 2 != 0 {
        return Err(NotEvenLen);
    }

    let decoded_len = buf.len() / 2;
    for i in 0..decoded_len {
        let b = hex_nibble(buf[i * 2]).ok_or(NotAscii)? << 4
            | hex_nibble(buf[i * 2 + 1]).ok_or(NotAscii)?;
        buf[i] = b;
    }

    Ok(&mut buf[..decoded_len])
}

/// Consume the leading run of hex chars from `buf`, returning the accumulated
/// value and the rest of the input.
///
/// `None` means no hex digit was present at all. Accumulation wraps past 32
/// bits, matching the permissive parser GDB's reference stubs use.
pub(crate) fn parse_hex_prefix(buf: &[u8]) -> (Option<u32>, &[u8]) {
    let mut val: u32 = 0;
    let mut consumed = 0;

    for &c in buf {
        match hex_nibble(c) {
            Some(d) => {
                val = val.wrapping_shl(4) | u32::from(d);
                consumed += 1;
            }
            None => break,
        }
    }

    if consumed == 0 {
        (None, buf)
    } else {
        (Some(val), &buf[consumed..])
    }
}
