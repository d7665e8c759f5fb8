//! Readiness multiplexing over `select(2)`.
//!
//! This module provides the blocking wait the channel parks on:
//! - [`select`]: the transient [`Multiplexer`] built fresh for each wait
//! - [`common`]: the [`Interest`] watched per descriptor
//! - [`unix`]: raw syscall wrappers shared with the channel

pub(crate) mod common;
pub(crate) mod select;
pub(crate) mod unix;

pub use common::Interest;
pub use select::Multiplexer;
