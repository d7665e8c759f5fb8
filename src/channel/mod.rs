//! Cancellable blocking I/O over one non-blocking descriptor.
//!
//! [`RwCancel`] retries reads and writes that would block by parking the
//! calling thread in `select(2)` on two descriptors: the wrapped one, and
//! the read end of an internal pipe. [`RwCancel::cancel`] writes a byte to
//! that pipe, which wakes every parked caller. The pipe is never drained, so
//! once cancelled a channel stays cancelled.

pub(crate) mod builder;
pub(crate) mod error;

pub use builder::{RwCancelBuilder, WaitErrorPolicy};
pub use error::{Cancelled, ConstructError, is_cancelled};

use crate::poller::common::Interest;
use crate::poller::select::Multiplexer;
use crate::poller::unix::{is_would_block, sys_pipe, sys_read, sys_set_nonblocking, sys_write};

use log::{debug, trace};
use std::io;
use std::os::fd::{AsRawFd, OwnedFd, RawFd};
use std::sync::atomic::{AtomicBool, Ordering};

/// A descriptor whose blocking reads and writes can be cancelled from
/// another thread.
///
/// The channel uses the descriptor but does not own it: dropping the channel
/// never closes it. The descriptor is switched to non-blocking mode on
/// construction and is left that way.
///
/// One reader and one writer may use the same channel concurrently (share
/// it through an `Arc`); either can be woken by [`cancel`](Self::cancel).
#[derive(Debug)]
pub struct RwCancel {
    /// Wrapped descriptor, non-blocking for the channel's whole life.
    fd: RawFd,

    /// Pipe end watched by parked callers.
    signal_read: OwnedFd,

    /// Pipe end written by `cancel`.
    signal_write: OwnedFd,

    /// Sticky cancellation flag, checked before every syscall attempt.
    cancelled: AtomicBool,

    /// Handling of failed readiness waits.
    wait_errors: WaitErrorPolicy,
}

/// Outcome of parking on the descriptor and the signal pipe.
enum Wakeup {
    Ready,
    Cancelled,
    Failed(io::Error),
}

impl RwCancel {
    /// Wraps `fd` with the default configuration.
    ///
    /// See [`RwCancelBuilder`] to change how failed waits are reported.
    ///
    /// # Errors
    ///
    /// Fails with a [`ConstructError`] payload if `fd` cannot be made
    /// non-blocking, the pipe cannot be created, or either descriptor is
    /// outside the range `select(2)` can watch.
    pub fn new(fd: RawFd) -> io::Result<Self> {
        Self::with_policy(fd, WaitErrorPolicy::default())
    }

    /// Wraps the raw descriptor of `source` with the default configuration.
    ///
    /// `source` keeps ownership of the descriptor and must outlive the channel.
    pub fn from_fd<F: AsRawFd>(source: &F) -> io::Result<Self> {
        Self::new(source.as_raw_fd())
    }

    pub(crate) fn with_policy(fd: RawFd, wait_errors: WaitErrorPolicy) -> io::Result<Self> {
        if !Multiplexer::fits(fd) {
            return Err(ConstructError::OutOfRange(fd).into());
        }

        sys_set_nonblocking(fd).map_err(ConstructError::NonBlocking)?;

        let (signal_read, signal_write) = sys_pipe().map_err(ConstructError::Pipe)?;
        sys_set_nonblocking(signal_write.as_raw_fd()).map_err(ConstructError::Pipe)?;

        if !Multiplexer::fits(signal_read.as_raw_fd()) {
            return Err(ConstructError::OutOfRange(signal_read.as_raw_fd()).into());
        }

        debug!(
            "rwcancel: wrapping fd {} (signal pipe {} -> {})",
            fd,
            signal_write.as_raw_fd(),
            signal_read.as_raw_fd()
        );

        Ok(Self {
            fd,
            signal_read,
            signal_write,
            cancelled: AtomicBool::new(false),
            wait_errors,
        })
    }

    /// Reads into `buffer`, blocking until data arrives or the channel is
    /// cancelled.
    ///
    /// A zero-length result means end of file. Errors other than "would
    /// block" are returned unchanged and are not retried.
    ///
    /// # Errors
    ///
    /// Returns a [`Cancelled`] error, with nothing read, once the channel
    /// has been cancelled.
    pub fn read(&self, buffer: &mut [u8]) -> io::Result<usize> {
        self.retry(Interest::READABLE, || sys_read(self.fd, buffer))
    }

    /// Writes from `buffer`, blocking until there is room or the channel is
    /// cancelled.
    ///
    /// Like `write(2)`, this may write fewer bytes than `buffer.len()`.
    ///
    /// # Errors
    ///
    /// Returns a [`Cancelled`] error, with nothing written, once the channel
    /// has been cancelled.
    pub fn write(&self, buffer: &[u8]) -> io::Result<usize> {
        self.retry(Interest::WRITABLE, || sys_write(self.fd, buffer))
    }

    /// Cancels the channel, waking any blocked reader or writer.
    ///
    /// Every read or write that has not returned yet, or starts later, fails
    /// with [`Cancelled`]. Safe to call from any thread and more than once.
    ///
    /// # Errors
    ///
    /// Returns the error from writing the wake byte. The channel counts as
    /// cancelled regardless.
    pub fn cancel(&self) -> io::Result<()> {
        if !self.cancelled.swap(true, Ordering::AcqRel) {
            debug!("rwcancel: cancelling fd {}", self.fd);
        }

        sys_write(self.signal_write.as_raw_fd(), &[0]).map(|_| ())
    }

    /// Returns `true` once [`cancel`](Self::cancel) has been called.
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
    }

    /// Blocks until the descriptor is readable.
    ///
    /// Returns `false` if the channel was cancelled or the wait failed.
    pub fn ready_read(&self) -> bool {
        matches!(self.park(Interest::READABLE), Wakeup::Ready)
    }

    /// Blocks until the descriptor is writable.
    ///
    /// Returns `false` if the channel was cancelled or the wait failed.
    pub fn ready_write(&self) -> bool {
        matches!(self.park(Interest::WRITABLE), Wakeup::Ready)
    }

    /// Runs `op` until it stops reporting "would block", parking between
    /// attempts.
    fn retry<F>(&self, interest: Interest, mut op: F) -> io::Result<usize>
    where
        F: FnMut() -> io::Result<usize>,
    {
        loop {
            if self.is_cancelled() {
                return Err(Cancelled.into());
            }

            match op() {
                Err(err) if is_would_block(&err) => {}
                result => return result,
            }

            match self.park(interest) {
                Wakeup::Ready => continue,
                Wakeup::Cancelled => return Err(Cancelled.into()),
                Wakeup::Failed(err) => {
                    debug!("rwcancel: wait on fd {} failed: {}", self.fd, err);

                    return match self.wait_errors {
                        WaitErrorPolicy::Cancel => Err(Cancelled.into()),
                        WaitErrorPolicy::Propagate => Err(err),
                    };
                }
            }
        }
    }

    /// Blocks until the descriptor is ready for `interest` or the signal
    /// pipe becomes readable. The pipe wins if both fire.
    fn park(&self, interest: Interest) -> Wakeup {
        let signal = self.signal_read.as_raw_fd();

        let mut multiplexer = Multiplexer::new();
        multiplexer.mark(self.fd, interest);
        multiplexer.mark(signal, Interest::READABLE);

        trace!("rwcancel: parking on fd {} ({:?})", self.fd, interest);

        if let Err(err) = multiplexer.wait() {
            return Wakeup::Failed(err);
        }

        if multiplexer.is_signaled(signal) {
            trace!("rwcancel: fd {} woken by cancellation", self.fd);
            return Wakeup::Cancelled;
        }

        if multiplexer.is_signaled(self.fd) {
            Wakeup::Ready
        } else {
            Wakeup::Failed(io::Error::other("select returned with nothing ready"))
        }
    }
}

impl AsRawFd for RwCancel {
    fn as_raw_fd(&self) -> RawFd {
        self.fd
    }
}

impl io::Read for RwCancel {
    fn read(&mut self, buffer: &mut [u8]) -> io::Result<usize> {
        RwCancel::read(self, buffer)
    }
}

impl io::Read for &RwCancel {
    fn read(&mut self, buffer: &mut [u8]) -> io::Result<usize> {
        RwCancel::read(*self, buffer)
    }
}

impl io::Write for RwCancel {
    fn write(&mut self, buffer: &[u8]) -> io::Result<usize> {
        RwCancel::write(self, buffer)
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl io::Write for &RwCancel {
    fn write(&mut self, buffer: &[u8]) -> io::Result<usize> {
        RwCancel::write(*self, buffer)
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl Drop for RwCancel {
    /// Cancels the channel, then closes the signal pipe.
    ///
    /// The wrapped descriptor is left open.
    fn drop(&mut self) {
        let _ = self.cancel();
        trace!("rwcancel: released fd {}", self.fd);
    }
}
