use trackable::error::TrackableError;
use trackable::error::{ErrorKind as TrackableErrorKind, ErrorKindExt};

/// This crate specific `Error` type.
#[derive(Debug, Clone)]
pub struct Error(TrackableError<ErrorKind>);
derive_traits_for_trackable_error_newtype!(Error, ErrorKind);
impl From<std::io::Error> for Error {
    fn from(f: std::io::Error) -> Self {
        ErrorKind::Other.cause(f).into()
    }
}

/// Possible error kinds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    /// A fixed bit pattern, marker bit or start code does not have its mandatory value.
    Malformed,

    /// The header uses an optional field that this crate does not decode.
    Unsupported,

    /// The input ended before a required field could be read.
    Truncated,

    /// Other errors (e.g., invalid arguments, I/O failures).
    Other,
}
impl TrackableErrorKind for ErrorKind {}
