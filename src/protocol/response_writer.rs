use crate::conn::ConnectionExt;
use crate::protocol::hex::HEX_DIGITS;
use crate::stub::error::Error;

/// Insufficient room left in the outbound packet buffer.
///
/// Replies the stub composes on its own all fit by construction; the one
/// place this can legitimately fire is a large `m` read, where stopping
/// early yields a protocol-legal truncated reply.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct CapacityError;

/// Stages a reply payload into the outbound packet buffer.
///
/// Framing and checksumming happen later, in [`transmit`]: retransmission
/// requires the raw payload to stay addressable until the host acks it.
pub(crate) struct ResponseWriter<'a> {
    buf: &'a mut [u8],
    len: usize,
}

impl<'a> ResponseWriter<'a> {
    pub fn new(buf: &'a mut [u8]) -> ResponseWriter<'a> {
        ResponseWriter { buf, len: 0 }
    }

    /// Append a single byte.
    pub fn write(&mut self, byte: u8) -> Result<(), CapacityError> {
        if self.len >= self.buf.len() {
            return Err(CapacityError);
        }
        self.buf[self.len] = byte;
        self.len += 1;
        Ok(())
    }

    /// Append an entire buffer.
    pub fn write_all(&mut self, data: &[u8]) -> Result<(), CapacityError> {
        data.iter().try_for_each(|b| self.write(*b))
    }

    /// Append a single byte as two lowercase hex chars.
    pub fn write_hex(&mut self, byte: u8) -> Result<(), CapacityError> {
        self.write(HEX_DIGITS[usize::from(byte >> 4)])?;
        self.write(HEX_DIGITS[usize::from(byte & 0xf)])
    }

    /// Append an entire buffer as hex (two chars per byte).
    pub fn write_hex_buf(&mut self, data: &[u8]) -> Result<(), CapacityError> {
        data.iter().try_for_each(|b| self.write_hex(*b))
    }

    pub fn as_payload(&self) -> &[u8] {
        &self.buf[..self.len]
    }
}

/// Send `payload` as a framed packet, retransmitting until the host acks.
///
/// `$<payload>#<checksum>`, then block on one byte: `+` finishes, anything
/// else resends. There is no retry limit; the protocol assumes the line
/// eventually converges.
pub(crate) fn transmit<C: ConnectionExt>(
    conn: &mut C,
    payload: &[u8],
) -> Result<(), Error<C::Error>> {
    let sum = payload.iter().fold(0u8, |a, x| a.wrapping_add(*x));

    loop {
        conn.write(b'$').map_err(Error::conn_write)?;
        conn.write_all(payload).map_err(Error::conn_write)?;
        conn.write(b'#').map_err(Error::conn_write)?;
        conn.write(HEX_DIGITS[usize::from(sum >> 4)])
            .map_err(Error::conn_write)?;
        conn.write(HEX_DIGITS[usize::from(sum & 0xf)])
            .map_err(Error::conn_write)?;
        conn.flush().map_err(Error::conn_write)?;

        #[cfg(feature = "trace-pkt")]
        log::trace!(
            "--> ${}#{:02x}",
            core::str::from_utf8(payload).unwrap_or("<invalid packet>"),
            sum
        );

        if conn.read().map_err(Error::conn_read)? == b'+' {
            return Ok(());
        }

        log::debug!("host nak'd reply, retransmitting");
    }
}
