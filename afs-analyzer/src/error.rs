//! Flat error taxonomy shared by the analyzer and the encode pipeline.
//!
//! Kept deliberately small: each variant carries exactly the payload a caller needs to act on
//! (the offending field, the verbatim backend status code) rather than a general-purpose
//! context bag. Richer diagnostic context belongs in a `tracing` event at the call site, not in
//! the error value itself.

use std::fmt;

/// Errors surfaced anywhere in the analyzer or encode pipeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TranscodeError {
    /// No capable GPU, or its driver is missing.
    DeviceUnavailable(String),
    /// Configuration validation failed for the named field.
    UnsupportedParam { field: &'static str, reason: String },
    /// Source frame layout is not one of the supported planar variants.
    UnsupportedCsp(String),
    /// Device or host allocation failed.
    OutOfMemory(String),
    /// Verbatim status code from the encoder backend.
    EncoderError(i32),
    /// Verbatim status code from the decoder backend.
    DecoderError(i32),
    /// A caller provided frames out of order.
    InvalidSequence(String),
    /// A component was queried before its lookahead window was satisfied.
    NotReady(String),
    /// I/O failure writing the sink, timecode, or AFS log file.
    IoError(String),
    /// Flush exceeded its deadline.
    Timeout(String),
}

impl fmt::Display for TranscodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DeviceUnavailable(msg) => write!(f, "device unavailable: {msg}"),
            Self::UnsupportedParam { field, reason } => {
                write!(f, "unsupported parameter `{field}`: {reason}")
            }
            Self::UnsupportedCsp(msg) => write!(f, "unsupported chroma subsampling: {msg}"),
            Self::OutOfMemory(msg) => write!(f, "out of memory: {msg}"),
            Self::EncoderError(status) => write!(f, "encoder error, status {status}"),
            Self::DecoderError(status) => write!(f, "decoder error, status {status}"),
            Self::InvalidSequence(msg) => write!(f, "invalid sequence: {msg}"),
            Self::NotReady(msg) => write!(f, "not ready: {msg}"),
            Self::IoError(msg) => write!(f, "io error: {msg}"),
            Self::Timeout(msg) => write!(f, "timeout: {msg}"),
        }
    }
}

impl std::error::Error for TranscodeError {}

impl From<std::io::Error> for TranscodeError {
    fn from(err: std::io::Error) -> Self {
        Self::IoError(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, TranscodeError>;
