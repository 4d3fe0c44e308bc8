//! The byte transport between the stub and the debugging host.

mod impls;

/// One half of the debug channel: sending bytes to the host.
///
/// On a real DOS box this sits directly on a UART or the BIOS serial
/// services. During hosted development the `std` feature wires it up for
/// [`TcpStream`](std::net::TcpStream) instead, so a stock `gdb` can connect
/// over `target remote`.
pub trait Connection {
    /// Transport-specific error type.
    type Error;

    /// Send one byte, blocking until the transport has queued it.
    fn write(&mut self, byte: u8) -> Result<(), Self::Error>;

    /// Send a whole buffer.
    ///
    /// The provided implementation just loops over [`Connection::write`].
    /// Transports with a bulk path (an `std::io::Write` underneath, a FIFO)
    /// should override it.
    fn write_all(&mut self, buf: &[u8]) -> Result<(), Self::Error> {
        for b in buf {
            self.write(*b)?;
        }
        Ok(())
    }

    /// Push any buffered output out to the host.
    ///
    /// A bare TX register has nothing to buffer; such transports return
    /// `Ok(())` unconditionally.
    fn flush(&mut self) -> Result<(), Self::Error>;
}

/// The other half: receiving bytes from the host.
///
/// There is only a blocking `read`. The stub runs with the debuggee frozen
/// in an exception handler, so while it waits for the next command there is
/// nothing else to schedule anyway.
pub trait ConnectionExt: Connection {
    /// Receive one byte, blocking until it arrives.
    fn read(&mut self) -> Result<u8, Self::Error>;
}
