//! Error types for eeprog-core
//!
//! Every failure of the underlying channel is wrapped together with the
//! [`Operation`] that was being attempted, so the CLI can print a single
//! line such as `failed to read page 12: timeout waiting for response`.

use core::fmt;

use thiserror::Error;

use crate::image::Mismatch;
use crate::rpc::{device_error_name, methods};

/// RPC call being attempted when a channel failure occurred
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    /// `init_chip`
    InitChip,
    /// `set_read_mode`
    SetReadMode,
    /// `read_page` for the given page number
    ReadPage(u32),
    /// `set_write_mode`
    SetWriteMode,
    /// `write_page` for the given page number
    WritePage(u32),
    /// `get_write_perf`
    GetWritePerf,
}

impl Operation {
    /// Name of the RPC method this operation calls
    pub fn method(&self) -> &'static str {
        match self {
            Self::InitChip => methods::INIT_CHIP,
            Self::SetReadMode => methods::SET_READ_MODE,
            Self::ReadPage(_) => methods::READ_PAGE,
            Self::SetWriteMode => methods::SET_WRITE_MODE,
            Self::WritePage(_) => methods::WRITE_PAGE,
            Self::GetWritePerf => methods::GET_WRITE_PERF,
        }
    }

    /// Wrap a channel failure with this operation
    pub fn fail(self, source: ChannelError) -> Error {
        Error::Channel { op: self, source }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InitChip => write!(f, "init chip"),
            Self::SetReadMode => write!(f, "set READ mode"),
            Self::ReadPage(page_no) => write!(f, "read page {}", page_no),
            Self::SetWriteMode => write!(f, "set WRITE mode"),
            Self::WritePage(page_no) => write!(f, "write page {}", page_no),
            Self::GetWritePerf => write!(f, "get write performance"),
        }
    }
}

/// Failure reported by an [`RpcChannel`](crate::RpcChannel) implementation
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ChannelError {
    /// The link itself failed (port closed, I/O error)
    #[error("transport error: {0}")]
    Transport(String),

    /// No response arrived in time
    #[error("timeout waiting for response")]
    Timeout,

    /// The response could not be decoded as a JSON-RPC message
    #[error("protocol error: {0}")]
    Protocol(String),

    /// The board answered with an error object
    #[error("device error {code} ({name}): {message}", name = device_error_name(.code))]
    Remote {
        /// Board error code
        code: i64,
        /// Board error message
        message: String,
    },

    /// The call succeeded but the result has the wrong shape
    #[error("unexpected response: {0}")]
    UnexpectedResponse(String),
}

/// Coarse error classes, used by the CLI and by tests
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Unknown or empty chip type, invalid erase pattern, bad page size
    Config,
    /// Any RPC or transport failure
    Channel,
    /// Input larger than the chip memory
    SizeMismatch,
    /// Read-back differs from the reference image
    VerifyMismatch,
    /// Zero-length input
    EmptySource,
}

/// Core error type
#[derive(Debug, Error)]
pub enum Error {
    /// No chip type was given
    #[error("chip type is empty")]
    EmptyChipType,

    /// Chip type not present in the registry
    #[error("unsupported EEPROM type: {0}")]
    UnknownChip(String),

    /// Erase pattern is not a hex byte
    #[error("invalid erase pattern {input}, {reason}")]
    InvalidPattern {
        /// Pattern as given by the user
        input: String,
        /// What is wrong with it
        reason: &'static str,
    },

    /// Configured page size cannot be used
    #[error("invalid page size: {0}")]
    InvalidPageSize(u32),

    /// An RPC call failed
    #[error("failed to {op}: {source}")]
    Channel {
        /// Call being attempted
        op: Operation,
        /// Underlying channel failure
        source: ChannelError,
    },

    /// `init_chip` succeeded but carried no geometry
    #[error("device returned no settings for {0}")]
    NoChipSettings(String),

    /// Geometry violates the chip settings invariants
    #[error("invalid chip settings: {0}")]
    InvalidChipSettings(String),

    /// Source image does not fit in the chip
    #[error("source is bigger than the chip memory size ({len} > {memory_size} bytes)")]
    SizeMismatch {
        /// Source length in bytes
        len: usize,
        /// Chip memory size in bytes
        memory_size: u32,
    },

    /// Source image is empty
    #[error("source is empty")]
    EmptySource,

    /// Read-back differs from the reference image
    #[error("verification failed: {0}")]
    VerifyMismatch(Mismatch),
}

impl Error {
    /// Classify this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::EmptyChipType
            | Self::UnknownChip(_)
            | Self::InvalidPattern { .. }
            | Self::InvalidPageSize(_) => ErrorKind::Config,
            Self::Channel { .. } | Self::NoChipSettings(_) | Self::InvalidChipSettings(_) => {
                ErrorKind::Channel
            }
            Self::SizeMismatch { .. } => ErrorKind::SizeMismatch,
            Self::EmptySource => ErrorKind::EmptySource,
            Self::VerifyMismatch(_) => ErrorKind::VerifyMismatch,
        }
    }

    /// The operation that failed, for channel errors
    pub fn operation(&self) -> Option<Operation> {
        match self {
            Self::Channel { op, .. } => Some(*op),
            _ => None,
        }
    }
}

/// Result type alias using the core Error type
pub type Result<T> = core::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_channel_error_message() {
        let err = Operation::ReadPage(12).fail(ChannelError::Timeout);
        assert_eq!(
            err.to_string(),
            "failed to read page 12: timeout waiting for response"
        );
        assert_eq!(err.kind(), ErrorKind::Channel);
        assert_eq!(err.operation(), Some(Operation::ReadPage(12)));
    }

    #[test]
    fn test_remote_error_names_code() {
        let err = ChannelError::Remote {
            code: 23,
            message: "chip not initialized".into(),
        };
        assert_eq!(
            err.to_string(),
            "device error 23 (CHIP_NOT_INITIALIZED): chip not initialized"
        );
    }

    #[test]
    fn test_kinds() {
        assert_eq!(Error::EmptyChipType.kind(), ErrorKind::Config);
        assert_eq!(Error::UnknownChip("X".into()).kind(), ErrorKind::Config);
        assert_eq!(Error::EmptySource.kind(), ErrorKind::EmptySource);
        assert_eq!(
            Error::SizeMismatch {
                len: 9000,
                memory_size: 8192
            }
            .kind(),
            ErrorKind::SizeMismatch
        );
    }
}
