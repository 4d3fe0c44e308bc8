//! The command loop: stop reporting and packet dispatch.

use crate::arch::reg::RegId;
use crate::arch::vector_to_signal;
use crate::conn::ConnectionExt;
use crate::protocol::commands;
use crate::protocol::commands::Command;
use crate::protocol::hex::decode_hex_buf;
use crate::protocol::hex::HEX_DIGITS;
use crate::protocol::recv::recv_packet;
use crate::protocol::response_writer::transmit;
use crate::protocol::response_writer::ResponseWriter;
use crate::stub::error::Error;
use crate::stub::mem;
use crate::stub::GdbTarget;
use crate::sys::Extender;

impl<C: ConnectionExt, X: Extender> GdbTarget<C, X> {
    /// Report the stop for `vector` and serve host commands until a
    /// continue/step.
    ///
    /// On return the snapshot holds the state the debuggee must resume
    /// with: PC possibly overridden, EFLAGS.TF forced to match the chosen
    /// resume mode.
    pub(crate) fn command_loop(&mut self, vector: u16) -> Result<(), Error<C::Error>> {
        self.vector = Some(vector);
        self.last_signal = vector_to_signal(vector);

        if self.verbose {
            log::debug!(
                "stopped: vector={} signal={} eflags={:#010x} pc={:#010x}",
                vector,
                self.last_signal,
                self.regs.eflags,
                self.regs.pc()
            );
        }

        self.send_stop_reply()?;

        loop {
            let body = recv_packet(&mut self.conn, &mut self.in_buf)?;
            let cmd = match commands::parse(&self.in_buf, body) {
                Ok(cmd) => cmd,
                Err(malformed) => {
                    transmit(&mut self.conn, malformed.reply())?;
                    continue;
                }
            };

            match cmd {
                Command::LastSignal => self.send_stop_reply()?,

                // single-threaded: accept any thread selection
                Command::SetThread => transmit(&mut self.conn, b"OK")?,
                Command::QueryCurrentThread => transmit(&mut self.conn, b"QC0")?,
                Command::QueryAttached => transmit(&mut self.conn, b"1")?,
                Command::QueryThreadInfoFirst => transmit(&mut self.conn, b"m0")?,
                Command::QueryThreadInfoNext => transmit(&mut self.conn, b"l")?,
                Command::QuerySymbol => transmit(&mut self.conn, b"OK")?,

                Command::ToggleVerbose => {
                    self.verbose = !self.verbose;
                    transmit(&mut self.conn, b"")?
                }

                Command::ReadRegisters => {
                    let GdbTarget {
                        conn,
                        regs,
                        out_buf,
                        ..
                    } = self;
                    let mut out = ResponseWriter::new(&mut out_buf[..]);
                    // 128 hex chars; cannot overflow the reply buffer
                    regs.gdb_serialize(|b| {
                        let _ = out.write_hex(b);
                    });
                    transmit(conn, out.as_payload())?
                }

                Command::WriteRegisters(range) => {
                    let GdbTarget {
                        conn,
                        regs,
                        in_buf,
                        ..
                    } = self;
                    let reply: &[u8] = match decode_hex_buf(&mut in_buf[range]) {
                        Ok(bytes) => match regs.gdb_deserialize(bytes) {
                            Ok(()) => b"OK",
                            Err(()) => b"E01",
                        },
                        Err(_) => b"E01",
                    };
                    transmit(conn, reply)?
                }

                Command::WriteRegister { id, val } => {
                    let reply: &[u8] = match RegId::from_raw_id(id) {
                        Some(id) => {
                            self.regs.write(id, val);
                            b"OK"
                        }
                        None => b"E01",
                    };
                    transmit(&mut self.conn, reply)?
                }

                Command::ReadMem { addr, len } => {
                    let GdbTarget {
                        conn,
                        sys,
                        fault,
                        out_buf,
                        ..
                    } = self;
                    let mut out = ResponseWriter::new(&mut out_buf[..]);
                    mem::read_into_hex(sys, fault, addr, len, &mut out);
                    if fault.take_err() {
                        log::debug!("memory fault reading {:#010x},{:#x}", addr, len);
                        transmit(conn, b"E03")?
                    } else {
                        transmit(conn, out.as_payload())?
                    }
                }

                Command::WriteMem { addr, data } => {
                    let GdbTarget {
                        conn,
                        sys,
                        fault,
                        in_buf,
                        ..
                    } = self;
                    let reply: &[u8] = match decode_hex_buf(&mut in_buf[data]) {
                        Ok(bytes) => {
                            mem::write_bytes(sys, fault, addr, bytes);
                            if fault.take_err() {
                                log::debug!("memory fault writing {:#010x}", addr);
                                b"E03"
                            } else {
                                b"OK"
                            }
                        }
                        Err(_) => b"E02",
                    };
                    transmit(conn, reply)?
                }

                Command::Continue { addr } => return self.prepare_resume(addr, false),
                Command::Step { addr } => return self.prepare_resume(addr, true),

                // `k` is deliberately a no-op; the host hangs up on its own
                Command::Kill => transmit(&mut self.conn, b"")?,
                Command::Unknown => transmit(&mut self.conn, b"")?,
            }
        }
    }

    fn prepare_resume(&mut self, addr: Option<u32>, stepping: bool) -> Result<(), Error<C::Error>> {
        if let Some(addr) = addr {
            self.regs.eip = addr;
        }
        self.regs.set_trace_flag(stepping);

        if self.verbose {
            log::debug!(
                "resuming at {:#010x}, stepping={}",
                self.regs.pc(),
                stepping
            );
        }
        Ok(())
    }

    fn send_stop_reply(&mut self) -> Result<(), Error<C::Error>> {
        let sig = self.last_signal.0;
        let payload = [
            b'S',
            HEX_DIGITS[usize::from(sig >> 4)],
            HEX_DIGITS[usize::from(sig & 0xf)],
        ];
        transmit(&mut self.conn, &payload)
    }
}
