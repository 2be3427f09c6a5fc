//! eeprog-serial - JSON-RPC channel to an EEPROM programmer board
//!
//! The board firmware speaks line-delimited JSON-RPC 2.0 over its USB
//! serial port. This crate provides the byte transports (serial port or a
//! TCP bridge), the line framing, and [`JsonRpcClient`], which implements
//! [`eeprog_core::RpcChannel`].
//!
//! # Example
//!
//! ```no_run
//! use std::time::Duration;
//! use eeprog_core::chip::ChipDatabase;
//! use eeprog_core::programmer::{Programmer, ProgrammerConfig};
//! use eeprog_serial::Connection;
//!
//! let conn = Connection::parse("/dev/ttyUSB0")?;
//! let client = eeprog_serial::open(&conn, None, Duration::from_secs(2))?;
//! let mut programmer = Programmer::init(
//!     client,
//!     &ChipDatabase::builtin(),
//!     "AT28C64",
//!     ProgrammerConfig::default(),
//! )?;
//! let image = programmer.read_data()?;
//! println!("read {} bytes", image.len());
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod client;
pub mod error;
pub mod protocol;
pub mod transport;

use std::time::Duration;

pub use client::JsonRpcClient;
pub use error::{Result, SerialError};
pub use transport::serial::SerialTransport;
pub use transport::tcp::TcpTransport;
pub use transport::Transport;

/// Connection options
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Connection {
    /// Serial port connection
    Serial {
        /// Device path (e.g., "/dev/ttyUSB0" or "COM1")
        device: String,
    },
    /// TCP connection to a serial bridge
    Tcp {
        /// Hostname or IP address
        host: String,
        /// Port number
        port: u16,
    },
}

impl Connection {
    /// Parse a connection string
    ///
    /// Formats:
    /// - `/dev/ttyUSB0`, `COM3` - Serial port
    /// - `tcp:host:port` - TCP connection
    pub fn parse(s: &str) -> Result<Self> {
        let s = s.trim();
        if s.is_empty() {
            return Err(SerialError::InvalidConnection("empty port".into()));
        }

        if let Some(addr) = s.strip_prefix("tcp:") {
            let (host, port_str) = addr.rsplit_once(':').ok_or_else(|| {
                SerialError::InvalidConnection(format!("missing port in {}", s))
            })?;
            if host.is_empty() {
                return Err(SerialError::InvalidConnection(format!("missing host in {}", s)));
            }
            let port = port_str
                .parse()
                .map_err(|_| SerialError::InvalidConnection(format!("invalid port: {}", port_str)))?;
            Ok(Connection::Tcp {
                host: host.to_string(),
                port,
            })
        } else {
            Ok(Connection::Serial {
                device: s.to_string(),
            })
        }
    }
}

impl core::fmt::Display for Connection {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Connection::Serial { device } => write!(f, "{}", device),
            Connection::Tcp { host, port } => write!(f, "tcp:{}:{}", host, port),
        }
    }
}

/// Open `conn` and wait up to `init_timeout` for the board to come up
///
/// `baud` only applies to serial ports.
pub fn open(
    conn: &Connection,
    baud: Option<u32>,
    init_timeout: Duration,
) -> Result<JsonRpcClient<Box<dyn Transport>>> {
    let transport: Box<dyn Transport> = match conn {
        Connection::Serial { device } => {
            let mut port = SerialTransport::open(device, baud)?;
            port.clear_input()?;
            Box::new(port)
        }
        Connection::Tcp { host, port } => Box::new(TcpTransport::connect(host, *port)?),
    };
    JsonRpcClient::connect(transport, init_timeout)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_serial() {
        assert_eq!(
            Connection::parse("/dev/ttyUSB0").unwrap(),
            Connection::Serial {
                device: "/dev/ttyUSB0".into()
            }
        );
        assert_eq!(
            Connection::parse("COM3").unwrap(),
            Connection::Serial {
                device: "COM3".into()
            }
        );
        assert!(Connection::parse("  ").is_err());
    }

    #[test]
    fn test_parse_tcp() {
        let conn = Connection::parse("tcp:192.168.1.20:4000").unwrap();
        assert_eq!(
            conn,
            Connection::Tcp {
                host: "192.168.1.20".into(),
                port: 4000
            }
        );
        assert_eq!(conn.to_string(), "tcp:192.168.1.20:4000");

        assert!(Connection::parse("tcp:localhost").is_err());
        assert!(Connection::parse("tcp::4000").is_err());
        assert!(Connection::parse("tcp:localhost:http").is_err());
    }
}
