//! Error types for the serial channel

use eeprog_core::ChannelError;
use thiserror::Error;

/// Transport and framing errors
#[derive(Debug, Error)]
pub enum SerialError {
    /// Failed to open or connect
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    /// Connection string could not be parsed
    #[error("Invalid connection string: {0}")]
    InvalidConnection(String),

    /// I/O error during communication
    #[error("I/O error: {0}")]
    IoError(String),

    /// No complete response before the deadline
    #[error("Communication timeout")]
    Timeout,

    /// Malformed JSON-RPC message
    #[error("Framing error: {0}")]
    Framing(String),

    /// Serial port error
    #[error("Serial port error: {0}")]
    SerialError(#[from] serialport::Error),
}

/// Result type for serial channel operations
pub type Result<T> = core::result::Result<T, SerialError>;

impl From<std::io::Error> for SerialError {
    fn from(e: std::io::Error) -> Self {
        SerialError::IoError(e.to_string())
    }
}

impl From<SerialError> for ChannelError {
    fn from(e: SerialError) -> Self {
        match e {
            SerialError::Timeout => ChannelError::Timeout,
            SerialError::Framing(msg) => ChannelError::Protocol(msg),
            other => ChannelError::Transport(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_channel_error_mapping() {
        assert_eq!(ChannelError::from(SerialError::Timeout), ChannelError::Timeout);
        assert_eq!(
            ChannelError::from(SerialError::Framing("bad id".into())),
            ChannelError::Protocol("bad id".into())
        );
        assert_eq!(
            ChannelError::from(SerialError::IoError("broken pipe".into())),
            ChannelError::Transport("I/O error: broken pipe".into())
        );
    }
}
