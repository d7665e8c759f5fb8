//! `select(2)`-based readiness wait.
//!
//! A [`Multiplexer`] is built fresh for every wait: descriptors are marked,
//! [`wait`](Multiplexer::wait) blocks with no timeout until one of them is
//! ready, and [`is_signaled`](Multiplexer::is_signaled) reports which ones
//! fired. Nothing survives past one wait.

use super::common::Interest;

use libc::{FD_ISSET, FD_SET, FD_SETSIZE, FD_ZERO, c_int, fd_set, select};
use std::os::fd::RawFd;
use std::{io, mem, ptr};

/// Readiness sets for a single blocking `select(2)` call.
pub struct Multiplexer {
    /// Descriptors watched for read-readiness.
    read: fd_set,

    /// Descriptors watched for write-readiness.
    write: fd_set,

    /// One greater than the largest marked descriptor.
    nfds: c_int,

    /// Set once `wait` has returned successfully.
    ready: bool,
}

impl Multiplexer {
    /// Creates a multiplexer with nothing marked.
    pub fn new() -> Self {
        let mut read: fd_set = unsafe { mem::zeroed() };
        let mut write: fd_set = unsafe { mem::zeroed() };

        unsafe {
            FD_ZERO(&mut read);
            FD_ZERO(&mut write);
        }

        Self {
            read,
            write,
            nfds: 0,
            ready: false,
        }
    }

    /// Returns `true` if `fd` can be placed in an `fd_set`.
    pub fn fits(fd: RawFd) -> bool {
        fd >= 0 && (fd as usize) < FD_SETSIZE as usize
    }

    /// Marks `fd` as watched for the given interest.
    ///
    /// Marking the same descriptor twice is a no-op.
    ///
    /// # Panics
    ///
    /// Panics if `fd` is negative or not below `FD_SETSIZE`.
    pub fn mark(&mut self, fd: RawFd, interest: Interest) {
        assert!(Self::fits(fd), "descriptor {fd} out of select range");

        if interest.read {
            unsafe { FD_SET(fd, &mut self.read) };
        }
        if interest.write {
            unsafe { FD_SET(fd, &mut self.write) };
        }

        self.nfds = self.nfds.max(fd + 1);
        self.ready = false;
    }

    /// Upper bound handed to `select(2)`: the largest marked descriptor plus
    /// one, or `0` when nothing is marked.
    pub fn nfds(&self) -> c_int {
        self.nfds
    }

    /// Blocks until at least one marked descriptor is ready.
    ///
    /// There is no timeout. Any OS error, including `EINTR`, is returned
    /// as-is; the caller decides whether to wait again.
    pub fn wait(&mut self) -> io::Result<usize> {
        let n = unsafe {
            select(
                self.nfds,
                &mut self.read,
                &mut self.write,
                ptr::null_mut(),
                ptr::null_mut(),
            )
        };

        if n < 0 {
            self.ready = false;
            return Err(io::Error::last_os_error());
        }

        self.ready = true;
        Ok(n as usize)
    }

    /// Returns `true` if `fd` was reported ready by the last [`wait`](Self::wait).
    ///
    /// Only marked descriptors should be queried. Before a successful wait
    /// this always returns `false`.
    pub fn is_signaled(&self, fd: RawFd) -> bool {
        if !self.ready || !Self::fits(fd) || fd >= self.nfds {
            return false;
        }

        unsafe { FD_ISSET(fd, &self.read) || FD_ISSET(fd, &self.write) }
    }
}

impl Default for Multiplexer {
    fn default() -> Self {
        Self::new()
    }
}
