use std::error::Error;
use std::fmt;
use std::io;
use std::os::fd::RawFd;

/// The channel was cancelled, or its readiness wait failed.
///
/// Returned inside an [`io::Error`] of kind [`io::ErrorKind::Other`]. Use
/// [`is_cancelled`] to recognise it.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Cancelled;

impl fmt::Display for Cancelled {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("operation cancelled")
    }
}

impl Error for Cancelled {}

impl From<Cancelled> for io::Error {
    fn from(cancelled: Cancelled) -> Self {
        // Not `Interrupted`: std's read_exact/write_all retry that kind.
        io::Error::other(cancelled)
    }
}

/// Returns `true` if `err` reports a cancelled channel.
pub fn is_cancelled(err: &io::Error) -> bool {
    err.get_ref().is_some_and(|inner| inner.is::<Cancelled>())
}

/// Failure while building a channel. No channel exists afterwards.
#[derive(Debug)]
pub enum ConstructError {
    /// The descriptor could not be switched to non-blocking mode.
    NonBlocking(io::Error),

    /// The cancellation pipe could not be created.
    Pipe(io::Error),

    /// The descriptor cannot be watched with `select(2)`.
    OutOfRange(RawFd),
}

impl fmt::Display for ConstructError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConstructError::NonBlocking(err) => {
                write!(f, "failed to set descriptor non-blocking: {err}")
            }
            ConstructError::Pipe(err) => write!(f, "failed to create cancellation pipe: {err}"),
            ConstructError::OutOfRange(fd) => {
                write!(f, "descriptor {fd} is outside the select range")
            }
        }
    }
}

impl Error for ConstructError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            ConstructError::NonBlocking(err) | ConstructError::Pipe(err) => Some(err),
            ConstructError::OutOfRange(_) => None,
        }
    }
}

impl From<ConstructError> for io::Error {
    fn from(err: ConstructError) -> Self {
        let kind = match &err {
            ConstructError::NonBlocking(inner) | ConstructError::Pipe(inner) => inner.kind(),
            ConstructError::OutOfRange(_) => io::ErrorKind::InvalidInput,
        };

        io::Error::new(kind, err)
    }
}
