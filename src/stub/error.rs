use core::fmt;
#[cfg(feature = "std")]
use core::fmt::Debug;
use core::fmt::Display;

/// An error that may occur while interacting with the
/// [`Connection`](crate::conn::Connection).
#[derive(Debug)]
pub enum ConnectionErrorKind {
    /// Error reading data.
    Read,
    /// Error writing data.
    Write,
}

/// An error which may occur while serving the debugging host.
///
/// Everything the protocol defines an in-band answer for (checksum
/// mismatches, malformed commands, memory faults) is reported to the host
/// directly and never surfaces here; the only fatal condition left is the
/// transport failing underneath the stub.
#[derive(Debug)]
pub struct Error<C> {
    kind: ConnectionErrorKind,
    source: C,
}

impl<C> Error<C> {
    pub(crate) fn conn_read(source: C) -> Self {
        Error {
            kind: ConnectionErrorKind::Read,
            source,
        }
    }

    pub(crate) fn conn_write(source: C) -> Self {
        Error {
            kind: ConnectionErrorKind::Write,
            source,
        }
    }

    /// Which direction of the transport failed.
    pub fn kind(&self) -> &ConnectionErrorKind {
        &self.kind
    }

    /// Recover the concrete transport error.
    pub fn into_source(self) -> C {
        self.source
    }
}

impl<C: Display> Display for Error<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            ConnectionErrorKind::Read => {
                write!(f, "Connection Error while reading request: {}", self.source)
            }
            ConnectionErrorKind::Write => {
                write!(f, "Connection Error while writing response: {}", self.source)
            }
        }
    }
}

#[cfg(feature = "std")]
impl<C: Debug + Display> std::error::Error for Error<C> {}
