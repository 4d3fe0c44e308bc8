//! Types shared across multiple parts of the stub.

mod signal;

pub use signal::Signal;
