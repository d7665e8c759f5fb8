//! # rwcancel
//!
//! **rwcancel** turns a non-blocking Unix file descriptor into ordinary
//! blocking reads and writes that another thread can abort at any time.
//!
//! A blocked [`RwCancel::read`] or [`RwCancel::write`] parks its thread in
//! `select(2)`, watching both the descriptor and the read end of a private
//! pipe. [`RwCancel::cancel`] writes one byte into that pipe (the self-pipe
//! trick), so the parked thread wakes within scheduling latency, with no
//! polling and no need to shut the descriptor down.
//!
//! - Reads and writes try the syscall first and only park on `EAGAIN`
//! - Cancellation is sticky: every later call fails with [`Cancelled`]
//! - The descriptor is never closed by this crate, only made non-blocking
//! - Dropping a channel cancels it deterministically
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use rwcancel::{RwCancel, is_cancelled};
//! use std::os::unix::net::UnixStream;
//! use std::sync::Arc;
//! use std::thread;
//!
//! let (socket, _peer) = UnixStream::pair()?;
//! let channel = Arc::new(RwCancel::from_fd(&socket)?);
//!
//! let reader = {
//!     let channel = channel.clone();
//!     thread::spawn(move || {
//!         let mut buffer = [0u8; 64];
//!         channel.read(&mut buffer)
//!     })
//! };
//!
//! channel.cancel()?;
//! let err = reader.join().unwrap().unwrap_err();
//! assert!(is_cancelled(&err));
//! ```
//!
//! ## Modules
//!
//! - [`poller`] — the `select(2)` readiness multiplexer

#![cfg(unix)]

mod channel;

pub mod poller;

pub use channel::{Cancelled, ConstructError, RwCancel, RwCancelBuilder, WaitErrorPolicy, is_cancelled};
pub use poller::unix::is_would_block;
