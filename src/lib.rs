//! A target-side implementation of the [GDB Remote Serial Protocol][rsp] for
//! 32-bit x86 programs hosted by a DPMI/DOS-extender environment.
//!
//! Unlike a debug _server_, this crate is linked directly into the debuggee:
//! when the program faults or hits a software breakpoint, the extender hands
//! control to the stub, which then speaks RSP with a remote GDB over a serial
//! line (or any other byte transport) until the host resumes execution.
//!
//! [rsp]: https://sourceware.org/gdb/current/onlinedocs/gdb/Remote-Protocol.html
//!
//! ## Integration
//!
//! The embedder provides two things:
//!
//! - a [`Connection`](conn::Connection) + [`ConnectionExt`](conn::ConnectionExt)
//!   implementation for the debug channel (a UART, a BIOS COM port shim, a
//!   `TcpStream` during development, ...), and
//! - an [`Extender`](sys::Extender) implementation wrapping the DPMI host's
//!   services: exception handler installation, page locking, and raw access
//!   to the debuggee's address space.
//!
//! A [`GdbTarget`] tying the two together is placed in static storage and
//! published via [`stub::attach`]. From that point on, the extender glue
//! routes CPU exceptions to [`stub::dispatch_exception`], and
//! [`stub::breakpoint`] can be used to synchronize with the host on startup:
//!
//! ```no_run
//! # use gdbstub_dpmi::{stub, GdbTarget};
//! # fn example<C, X>(stub_slot: &'static mut GdbTarget<C, X>)
//! # where
//! #     C: gdbstub_dpmi::conn::ConnectionExt + 'static,
//! #     X: gdbstub_dpmi::sys::Extender + 'static,
//! #     X::Error: core::fmt::Debug,
//! # {
//! stub::attach(stub_slot).expect("failed to install debug traps");
//! stub::breakpoint(); // sync with the host, then run under its control
//! # }
//! ```
//!
//! ## Features
//!
//! - `std` (default): `Connection` impls for `TcpStream`, plus
//!   `std::error::Error` impls.
//! - `trace-pkt`: log all inbound/outbound packets at `trace!` level.

#![cfg_attr(not(feature = "std"), no_std)]

pub mod arch;
pub mod common;
pub mod conn;
pub mod stub;
pub mod sys;

mod protocol;

pub use stub::GdbTarget;

/// Size of the inbound/outbound packet buffers.
///
/// A register dump is `NUM_REG_BYTES * 2 = 128` hex chars; 400 bytes leaves
/// comfortable headroom for every packet the stub emits while still fitting
/// in statically-owned stub memory.
pub const BUF_MAX: usize = 400;
