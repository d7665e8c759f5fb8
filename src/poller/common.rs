/// Readiness direction watched for a descriptor.
///
/// The channel only ever watches one direction per descriptor: the wrapped
/// descriptor in the direction of the current operation, and the signal pipe
/// always for reading.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Interest {
    pub read: bool,
    pub write: bool,
}

impl Interest {
    /// Watch for read-readiness.
    pub const READABLE: Interest = Interest {
        read: true,
        write: false,
    };

    /// Watch for write-readiness.
    pub const WRITABLE: Interest = Interest {
        read: false,
        write: true,
    };
}
