use core::ops::Range;

use crate::conn::ConnectionExt;
use crate::protocol::hex::decode_hex;
use crate::stub::error::Error;

/// Receive one well-formed packet, blocking until the host delivers it.
///
/// Scans for the `$<payload>#<checksum>` frame, acking with `+` and naking
/// (then re-hunting) on checksum mismatch. A stray `$` mid-payload restarts
/// the payload; payloads longer than `buf.len() - 1` are discarded with a
/// nak.
///
/// If the payload carries a two-char sequence prefix (`xx:`), the prefix is
/// echoed to the host right after the ack and the returned range starts past
/// it.
///
/// Returns the payload's range within `buf`.
pub(crate) fn recv_packet<C: ConnectionExt>(
    conn: &mut C,
    buf: &mut [u8],
) -> Result<Range<usize>, Error<C::Error>> {
    let max_payload = buf.len() - 1;

    loop {
        // wait around for the start character, ignore all other characters
        while conn.read().map_err(Error::conn_read)? != b'$' {}

        'packet: loop {
            let mut sum: u8 = 0;
            let mut len: usize = 0;
            let mut overflow = false;

            loop {
                let c = conn.read().map_err(Error::conn_read)?;
                match c {
                    b'$' => continue 'packet,
                    b'#' => break,
                    _ => {
                        if len >= max_payload {
                            overflow = true;
                        } else {
                            sum = sum.wrapping_add(c);
                            buf[len] = c;
                            len += 1;
                        }
                    }
                }
            }

            let mut checksum = [0u8; 2];
            checksum[0] = conn.read().map_err(Error::conn_read)?;
            checksum[1] = conn.read().map_err(Error::conn_read)?;
            let xmit = decode_hex::<u8>(&checksum).ok();

            if overflow || xmit != Some(sum) {
                log::debug!(
                    "dropping packet: computed checksum {:#04x}, sent {:?}, overflow {}",
                    sum,
                    xmit,
                    overflow
                );
                conn.write(b'-').map_err(Error::conn_write)?;
                conn.flush().map_err(Error::conn_write)?;
                // resync on the next start character
                break 'packet;
            }

            conn.write(b'+').map_err(Error::conn_write)?;

            #[cfg(feature = "trace-pkt")]
            log::trace!(
                "<-- ${}#{:02x}",
                core::str::from_utf8(&buf[..len]).unwrap_or("<invalid packet>"),
                sum
            );

            let body = if len >= 3 && buf[2] == b':' {
                // sequence id: echo it, hand back the payload past the ':'
                conn.write(buf[0]).map_err(Error::conn_write)?;
                conn.write(buf[1]).map_err(Error::conn_write)?;
                3..len
            } else {
                0..len
            };
            conn.flush().map_err(Error::conn_write)?;

            return Ok(body);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::conn::Connection;

    struct Pipe {
        rx: Vec<u8>,
        pos: usize,
        tx: Vec<u8>,
    }

    impl Pipe {
        fn new(script: &[u8]) -> Pipe {
            Pipe {
                rx: script.to_vec(),
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

    fn frame(payload: &[u8]) -> Vec<u8> {
        let sum = payload.iter().fold(0u8, |a, x| a.wrapping_add(*x));
        let mut out = vec![b'$'];
        out.extend_from_slice(payload);
        out.push(b'#');
        out.push(crate::protocol::hex::HEX_DIGITS[usize::from(sum >> 4)]);
        out.push(crate::protocol::hex::HEX_DIGITS[usize::from(sum & 0xf)]);
        out
    }

    #[test]
    fn accepts_valid_packet() {
        let mut conn = Pipe::new(b"$m1000,3#8d");
        let mut buf = [0u8; crate::BUF_MAX];
        let body = recv_packet(&mut conn, &mut buf).unwrap();
        assert_eq!(&buf[body], b"m1000,3");
        assert_eq!(conn.tx, b"+");
    }

    #[test]
    fn ignores_line_noise_before_start() {
        let mut conn = Pipe::new(b"\x00\xffxyz$g#67");
        let mut buf = [0u8; crate::BUF_MAX];
        let body = recv_packet(&mut conn, &mut buf).unwrap();
        assert_eq!(&buf[body], b"g");
    }

    #[test]
    fn naks_bad_checksum_then_accepts_resend() {
        let mut conn = Pipe::new(b"$m1000,1#00$m1000,1#8b");
        let mut buf = [0u8; crate::BUF_MAX];
        let body = recv_packet(&mut conn, &mut buf).unwrap();
        assert_eq!(&buf[body], b"m1000,1");
        assert_eq!(conn.tx, b"-+");
    }

    #[test]
    fn stray_dollar_restarts_payload() {
        // host aborts "m10" mid-frame and starts over
        let mut script = b"$m10".to_vec();
        script.extend_from_slice(&frame(b"g"));
        let mut conn = Pipe::new(&script);
        let mut buf = [0u8; crate::BUF_MAX];
        let body = recv_packet(&mut conn, &mut buf).unwrap();
        assert_eq!(&buf[body], b"g");
        assert_eq!(conn.tx, b"+");
    }

    #[test]
    fn echoes_sequence_prefix() {
        let mut conn = Pipe::new(&frame(b"AB:g"));
        let mut buf = [0u8; crate::BUF_MAX];
        let body = recv_packet(&mut conn, &mut buf).unwrap();
        assert_eq!(&buf[body], b"g");
        assert_eq!(conn.tx, b"+AB");
    }

    #[test]
    fn accepts_payload_up_to_capacity() {
        let payload = vec![b'a'; 398];
        let mut conn = Pipe::new(&frame(&payload));
        let mut buf = [0u8; crate::BUF_MAX];
        let body = recv_packet(&mut conn, &mut buf).unwrap();
        assert_eq!(&buf[body], &payload[..]);
    }

    #[test]
    fn naks_oversized_payload() {
        let mut script = frame(&vec![b'a'; crate::BUF_MAX]);
        script.extend_from_slice(&frame(b"g"));
        let mut conn = Pipe::new(&script);
        let mut buf = [0u8; crate::BUF_MAX];
        let body = recv_packet(&mut conn, &mut buf).unwrap();
        assert_eq!(&buf[body], b"g");
        assert_eq!(conn.tx, b"-+");
    }
}
