//! RPC channel abstraction and response decoding
//!
//! The programmer board exposes a handful of JSON-RPC methods (see
//! [`methods`]). An [`RpcChannel`] carries one request at a time and returns
//! the decoded `result` value; the helpers in this module check that result
//! has the shape each method promises.

use serde_json::Value;

use crate::error::ChannelError;

/// RPC method names understood by the programmer board
pub mod methods {
    /// Initialize the chip: `[chip_type]`
    pub const INIT_CHIP: &str = "init_chip";
    /// Enter READ mode: `[page_size]`
    pub const SET_READ_MODE: &str = "set_read_mode";
    /// Read one page: `[page_no]`
    pub const READ_PAGE: &str = "read_page";
    /// Enter WRITE mode: `[page_size]`
    pub const SET_WRITE_MODE: &str = "set_write_mode";
    /// Write one page: `[page_no, bytes]`
    pub const WRITE_PAGE: &str = "write_page";
    /// Latency samples of the last write: `[]`
    pub const GET_WRITE_PERF: &str = "get_write_perf";
}

/// Synchronous request/response channel to the programmer board
///
/// Implementations must have at most one request outstanding; every call
/// blocks until the response (or a failure) arrives. Timeouts, if any, are
/// the implementation's business.
pub trait RpcChannel {
    /// Send `method` with positional `params` and return the `result` value
    fn send_request(&mut self, method: &str, params: &[Value]) -> Result<Value, ChannelError>;
}

impl<C: RpcChannel + ?Sized> RpcChannel for &mut C {
    fn send_request(&mut self, method: &str, params: &[Value]) -> Result<Value, ChannelError> {
        (**self).send_request(method, params)
    }
}

impl<C: RpcChannel + ?Sized> RpcChannel for Box<C> {
    fn send_request(&mut self, method: &str, params: &[Value]) -> Result<Value, ChannelError> {
        (**self).send_request(method, params)
    }
}

/// Error codes reported by the programmer board firmware
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i64)]
pub enum DeviceErrorCode {
    /// Wiring type not supported by the board
    InvalidWiringType = 11,
    /// Pins were not initialized
    PinsNotInitialized = 12,
    /// Chip type not supported by the board
    ChipNotSupported = 21,
    /// `init_chip` was already called
    ChipAlreadyInitialized = 22,
    /// A mode or page call arrived before `init_chip`
    ChipNotInitialized = 23,
    /// Page size outside 1..=64
    InvalidPageSize = 31,
    /// Page number addresses memory beyond the chip
    InvalidPageNo = 32,
    /// Address beyond the chip
    InvalidAddress = 33,
    /// `read_page` without `set_read_mode`
    ReadModeDisabled = 41,
    /// Read failed on the bus
    ReadFailed = 42,
    /// `write_page` without `set_write_mode`
    WriteModeDisabled = 51,
    /// Write failed on the bus
    WriteFailed = 52,
    /// Anything else
    Unknown = 1000,
}

impl DeviceErrorCode {
    /// Map a wire code to a known error code
    pub fn from_code(code: i64) -> Option<Self> {
        Some(match code {
            11 => Self::InvalidWiringType,
            12 => Self::PinsNotInitialized,
            21 => Self::ChipNotSupported,
            22 => Self::ChipAlreadyInitialized,
            23 => Self::ChipNotInitialized,
            31 => Self::InvalidPageSize,
            32 => Self::InvalidPageNo,
            33 => Self::InvalidAddress,
            41 => Self::ReadModeDisabled,
            42 => Self::ReadFailed,
            51 => Self::WriteModeDisabled,
            52 => Self::WriteFailed,
            1000 => Self::Unknown,
            _ => return None,
        })
    }

    /// Wire code
    pub fn code(self) -> i64 {
        self as i64
    }

    /// Firmware name of the code
    pub fn name(self) -> &'static str {
        match self {
            Self::InvalidWiringType => "INVALID_WIRING_TYPE",
            Self::PinsNotInitialized => "PINS_NOT_INITIALIZED",
            Self::ChipNotSupported => "CHIP_NOT_SUPPORTED",
            Self::ChipAlreadyInitialized => "CHIP_ALREADY_INITIALIZED",
            Self::ChipNotInitialized => "CHIP_NOT_INITIALIZED",
            Self::InvalidPageSize => "INVALID_PAGE_SIZE",
            Self::InvalidPageNo => "INVALID_PAGE_NO",
            Self::InvalidAddress => "INVALID_ADDRESS",
            Self::ReadModeDisabled => "READ_MODE_DISABLED",
            Self::ReadFailed => "READ_FAILED",
            Self::WriteModeDisabled => "WRITE_MODE_DISABLED",
            Self::WriteFailed => "WRITE_FAILED",
            Self::Unknown => "UNKNOWN_ERROR",
        }
    }

    /// Build the channel error a board would report for this code
    pub fn into_error(self, message: impl Into<String>) -> ChannelError {
        ChannelError::Remote {
            code: self.code(),
            message: message.into(),
        }
    }
}

/// Human-readable name for a board error code
pub fn device_error_name(code: &i64) -> &'static str {
    DeviceErrorCode::from_code(*code).map_or("unrecognized", DeviceErrorCode::name)
}

/// Decode a page of bytes (`[u8, ...]`)
pub fn decode_bytes(value: &Value) -> Result<Vec<u8>, ChannelError> {
    let items = value
        .as_array()
        .ok_or_else(|| ChannelError::UnexpectedResponse(format!("expected byte array, got {}", value)))?;

    items
        .iter()
        .map(|item| {
            item.as_u64()
                .and_then(|b| u8::try_from(b).ok())
                .ok_or_else(|| ChannelError::UnexpectedResponse(format!("not a byte: {}", item)))
        })
        .collect()
}

/// Decode a list of numeric samples (`[number, ...]`)
///
/// `null` is accepted as an empty list.
pub fn decode_numbers(value: &Value) -> Result<Vec<f64>, ChannelError> {
    match value {
        Value::Null => Ok(Vec::new()),
        Value::Array(items) => items
            .iter()
            .map(|item| {
                item.as_f64().ok_or_else(|| {
                    ChannelError::UnexpectedResponse(format!("not a number: {}", item))
                })
            })
            .collect(),
        other => Err(ChannelError::UnexpectedResponse(format!(
            "expected number array, got {}",
            other
        ))),
    }
}

/// Decode chip geometry returned by `init_chip`
///
/// Returns `None` when the board answered without settings (`null`, an empty
/// array or a bare acknowledgement), otherwise `(memory_size, max_page_size)`.
pub fn decode_settings(value: &Value) -> Result<Option<(u64, Option<u64>)>, ChannelError> {
    let items = match value {
        Value::Array(items) if !items.is_empty() => items,
        Value::Array(_) | Value::Null | Value::Bool(_) | Value::String(_) => return Ok(None),
        other => {
            return Err(ChannelError::UnexpectedResponse(format!(
                "expected chip settings array, got {}",
                other
            )))
        }
    };

    let number = |item: &Value| {
        item.as_u64().ok_or_else(|| {
            ChannelError::UnexpectedResponse(format!("chip setting is not an integer: {}", item))
        })
    };

    let memory_size = number(&items[0])?;
    let max_page_size = items.get(1).map(number).transpose()?;
    Ok(Some((memory_size, max_page_size)))
}
