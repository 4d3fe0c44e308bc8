#![cfg(feature = "std")]

use std::io::Read;
use std::io::Write;
use std::net::TcpStream;

use crate::conn::Connection;
use crate::conn::ConnectionExt;

// Lets `gdb` attach over `target remote host:port` while the crate is being
// developed on a hosted platform.
impl Connection for TcpStream {
    type Error = std::io::Error;

    fn write(&mut self, byte: u8) -> Result<(), Self::Error> {
        Write::write_all(self, &[byte])
    }

    fn write_all(&mut self, buf: &[u8]) -> Result<(), Self::Error> {
        Write::write_all(self, buf)
    }

    fn flush(&mut self) -> Result<(), Self::Error> {
        Write::flush(self)
    }
}

impl ConnectionExt for TcpStream {
    fn read(&mut self) -> Result<u8, Self::Error> {
        let mut byte = [0u8];
        self.read_exact(&mut byte)?;
        Ok(byte[0])
    }
}
