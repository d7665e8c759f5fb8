use super::RwCancel;

use std::io;
use std::os::fd::RawFd;

/// What a blocked read or write reports when the readiness wait itself fails.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum WaitErrorPolicy {
    /// Report the failure as [`Cancelled`](super::Cancelled), exactly as if
    /// the channel had been cancelled.
    #[default]
    Cancel,

    /// Return the OS error from `select(2)` unchanged.
    Propagate,
}

/// Builder for configuring and creating a [`RwCancel`].
///
/// # Examples
///
/// ```rust,ignore
/// let channel = RwCancelBuilder::new()
///     .wait_errors(WaitErrorPolicy::Propagate)
///     .build(fd)?;
/// ```
#[derive(Clone, Debug, Default)]
pub struct RwCancelBuilder {
    /// Handling of failed readiness waits.
    wait_errors: WaitErrorPolicy,
}

impl RwCancelBuilder {
    /// Creates a builder with the default configuration.
    ///
    /// Failed waits are reported as cancellation.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets how a failed readiness wait is reported.
    pub fn wait_errors(mut self, policy: WaitErrorPolicy) -> Self {
        self.wait_errors = policy;
        self
    }

    /// Builds a channel over `fd`.
    ///
    /// `fd` is switched to non-blocking mode and stays that way, even after
    /// the channel is dropped. The caller keeps ownership of closing it.
    pub fn build(self, fd: RawFd) -> io::Result<RwCancel> {
        RwCancel::with_policy(fd, self.wait_errors)
    }
}
