//! Transport layer abstraction for the JSON-RPC channel
//!
//! This module provides a unified interface for serial and TCP transports.
//! Line framing is done by the client on top of [`Transport::read_nonblock`].

use std::time::Duration;

use crate::error::{Result, SerialError};

/// Transport trait for reading and writing bytes
pub trait Transport {
    /// Write all bytes to the transport
    fn write(&mut self, data: &[u8]) -> Result<()>;

    /// Read with timeout
    ///
    /// Reads up to `buf.len()` bytes, waiting up to `timeout`.
    /// Returns the number of bytes read, or 0 on timeout.
    fn read_nonblock(&mut self, buf: &mut [u8], timeout: Duration) -> Result<usize>;

    /// Flush any buffered data
    fn flush(&mut self) -> Result<()>;
}

impl<T: Transport + ?Sized> Transport for Box<T> {
    fn write(&mut self, data: &[u8]) -> Result<()> {
        (**self).write(data)
    }

    fn read_nonblock(&mut self, buf: &mut [u8], timeout: Duration) -> Result<usize> {
        (**self).read_nonblock(buf, timeout)
    }

    fn flush(&mut self) -> Result<()> {
        (**self).flush()
    }
}

fn timed_out(e: &std::io::Error) -> bool {
    matches!(
        e.kind(),
        std::io::ErrorKind::TimedOut | std::io::ErrorKind::WouldBlock
    )
}

pub mod serial {
    //! Serial port transport implementation

    use super::*;
    use serialport::{DataBits, FlowControl, Parity, SerialPort, StopBits};
    use std::io::{Read, Write};

    /// Default baud rate of the programmer firmware
    pub const DEFAULT_BAUD: u32 = 115200;

    /// Serial port transport
    pub struct SerialTransport {
        port: Box<dyn SerialPort>,
    }

    impl SerialTransport {
        /// Open a serial port, 8N1 without flow control
        pub fn open(device: &str, baud: Option<u32>) -> Result<Self> {
            let baud_rate = baud.unwrap_or(DEFAULT_BAUD);

            let port = serialport::new(device, baud_rate)
                .data_bits(DataBits::Eight)
                .parity(Parity::None)
                .stop_bits(StopBits::One)
                .flow_control(FlowControl::None)
                .timeout(Duration::from_secs(5))
                .open()?;

            log::info!("Opened serial port {} at {} baud", device, baud_rate);

            Ok(Self { port })
        }

        /// Drop anything the board sent before we were listening
        pub fn clear_input(&mut self) -> Result<()> {
            self.port.clear(serialport::ClearBuffer::Input)?;
            Ok(())
        }
    }

    impl Transport for SerialTransport {
        fn write(&mut self, data: &[u8]) -> Result<()> {
            self.port.write_all(data)?;
            Ok(())
        }

        fn read_nonblock(&mut self, buf: &mut [u8], timeout: Duration) -> Result<usize> {
            self.port.set_timeout(timeout)?;

            match self.port.read(buf) {
                Ok(n) => Ok(n),
                Err(e) if timed_out(&e) => Ok(0),
                Err(e) => Err(SerialError::from(e)),
            }
        }

        fn flush(&mut self) -> Result<()> {
            self.port.flush()?;
            Ok(())
        }
    }
}

pub mod tcp {
    //! TCP socket transport implementation
    //!
    //! Useful with a serial-to-network bridge such as `ser2net`.

    use super::*;
    use std::io::{Read, Write};
    use std::net::TcpStream;

    /// TCP socket transport
    pub struct TcpTransport {
        stream: TcpStream,
    }

    impl TcpTransport {
        /// Connect to a bridged programmer at the specified host and port
        pub fn connect(host: &str, port: u16) -> Result<Self> {
            let addr = format!("{}:{}", host, port);
            log::info!("Connecting to {}", addr);

            let stream = TcpStream::connect(&addr)
                .map_err(|e| SerialError::ConnectionFailed(e.to_string()))?;

            // Requests are tiny; don't let Nagle hold them back
            stream.set_nodelay(true).map_err(|e| {
                SerialError::ConnectionFailed(format!("Failed to set TCP_NODELAY: {}", e))
            })?;

            stream
                .set_write_timeout(Some(Duration::from_secs(5)))
                .map_err(|e| {
                    SerialError::ConnectionFailed(format!("Failed to set write timeout: {}", e))
                })?;

            log::info!("Connected to {}", addr);

            Ok(Self { stream })
        }
    }

    impl Transport for TcpTransport {
        fn write(&mut self, data: &[u8]) -> Result<()> {
            self.stream.write_all(data)?;
            Ok(())
        }

        fn read_nonblock(&mut self, buf: &mut [u8], timeout: Duration) -> Result<usize> {
            // A zero read timeout means "block forever" for TcpStream
            let timeout = timeout.max(Duration::from_millis(1));
            self.stream.set_read_timeout(Some(timeout))?;

            match self.stream.read(buf) {
                Ok(0) => Err(SerialError::ConnectionFailed("connection closed".into())),
                Ok(n) => Ok(n),
                Err(e) if timed_out(&e) => Ok(0),
                Err(e) => Err(SerialError::from(e)),
            }
        }

        fn flush(&mut self) -> Result<()> {
            self.stream.flush()?;
            Ok(())
        }
    }
}
