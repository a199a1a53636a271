use crate::exception::ExceptionCode;

/// Unified error type returned by all fallible operations in the library
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Error {
    /// error from the underlying transport
    Io(std::io::ErrorKind),
    /// the server replied with a Modbus exception response
    Exception(ExceptionCode),
    /// a received frame or ADU could not be parsed
    Parse(ParseError),
    /// a request was rejected before transmission because its range is invalid
    BadRange(InvalidRange),
    /// errors that can only occur if there is a logic error in the library
    Internal(InternalError),
    /// no connection exists to the Modbus server
    NoConnection,
}

impl std::error::Error for Error {}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            Error::Io(kind) => write!(f, "I/O error: {kind:?}"),
            Error::Exception(ex) => write!(f, "Modbus exception: {ex}"),
            Error::Parse(err) => write!(f, "parse error: {err}"),
            Error::BadRange(err) => write!(f, "invalid request: {err}"),
            Error::Internal(err) => write!(f, "internal error: {err}"),
            Error::NoConnection => f.write_str("no connection exists to the Modbus server"),
        }
    }
}

/// Errors that occur while parsing frames and ADUs received from the peer
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ParseError {
    /// a frame or ADU was shorter than required, or a count field disagreed
    /// with the number of bytes actually present
    MessageSizeMismatch,
    /// the MBAP length field exceeds the maximum allowed value (actual, maximum)
    FrameLengthTooBig(usize, usize),
    /// a response carried a function code that does not match the request (actual, expected)
    UnexpectedFunctionCode(u8, u8),
    /// a coil value was neither `0xFF00` nor `0x0000`
    InvalidCoilValue(u16),
    /// an ADU contained bytes beyond its advertised end
    TrailingBytes(usize),
}

impl std::error::Error for ParseError {}

impl std::fmt::Display for ParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            ParseError::MessageSizeMismatch => {
                f.write_str("message size does not match the advertised length")
            }
            ParseError::FrameLengthTooBig(length, max) => write!(
                f,
                "MBAP length field ({length}) exceeds the maximum allowed value ({max})"
            ),
            ParseError::UnexpectedFunctionCode(actual, expected) => write!(
                f,
                "received function code {actual:#04X} when {expected:#04X} was expected"
            ),
            ParseError::InvalidCoilValue(value) => {
                write!(f, "received coil state with unspecified value: {value:#06X}")
            }
            ParseError::TrailingBytes(count) => {
                write!(f, "ADU contains {count} extra trailing bytes")
            }
        }
    }
}

/// Errors that result from an invalid address range in a request
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum InvalidRange {
    /// request contains a count of zero
    CountOfZero,
    /// start + count would overflow the 16-bit address space (start, count)
    AddressOverflow(u16, u16),
    /// the count exceeds the maximum allowed for this request type (count, maximum)
    CountTooLargeForType(u16, u16),
}

impl std::error::Error for InvalidRange {}

impl std::fmt::Display for InvalidRange {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            InvalidRange::CountOfZero => f.write_str("request contains a count of zero"),
            InvalidRange::AddressOverflow(start, count) => write!(
                f,
                "start == {start} and count == {count} would overflow the u16 address space"
            ),
            InvalidRange::CountTooLargeForType(count, max) => write!(
                f,
                "count of {count} exceeds the maximum allowed count of {max} for this type"
            ),
        }
    }
}

/// Errors that should only occur if there is a logic error in the library
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum InternalError {
    /// attempted to write past the end of the frame buffer
    InsufficientWriteSpace,
    /// a byte count does not fit in a u8
    BadByteCount(usize),
    /// the ADU size exceeds what the frame can carry
    AduTooBig(usize),
}

impl std::error::Error for InternalError {}

impl std::fmt::Display for InternalError {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            InternalError::InsufficientWriteSpace => {
                f.write_str("attempted to write past the end of the frame buffer")
            }
            InternalError::BadByteCount(count) => {
                write!(f, "byte count would exceed the maximum size of a u8: {count}")
            }
            InternalError::AduTooBig(size) => {
                write!(f, "ADU length of {size} exceeds the maximum allowed length")
            }
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::Io(err.kind())
    }
}

impl From<ExceptionCode> for Error {
    fn from(ex: ExceptionCode) -> Self {
        Error::Exception(ex)
    }
}

impl From<ParseError> for Error {
    fn from(err: ParseError) -> Self {
        Error::Parse(err)
    }
}

impl From<InvalidRange> for Error {
    fn from(err: InvalidRange) -> Self {
        Error::BadRange(err)
    }
}

impl From<InternalError> for Error {
    fn from(err: InternalError) -> Self {
        Error::Internal(err)
    }
}

impl From<scursor::ReadError> for Error {
    fn from(_: scursor::ReadError) -> Self {
        Error::Parse(ParseError::MessageSizeMismatch)
    }
}

impl From<scursor::WriteError> for Error {
    fn from(_: scursor::WriteError) -> Self {
        Error::Internal(InternalError::InsufficientWriteSpace)
    }
}
