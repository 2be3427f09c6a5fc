//! JSON-RPC client over a byte transport

use std::time::{Duration, Instant};

use eeprog_core::{ChannelError, RpcChannel};
use serde_json::Value;

use crate::error::{Result, SerialError};
use crate::protocol::{self, Response};
use crate::transport::Transport;

/// Default time to wait for a response
pub const DEFAULT_RESPONSE_TIMEOUT: Duration = Duration::from_secs(5);

/// Synchronous JSON-RPC client
///
/// One request is in flight at a time. Request ids start at 1 and increase
/// with every call.
pub struct JsonRpcClient<T: Transport> {
    transport: T,
    next_id: u64,
    /// Received bytes not yet consumed as a line
    rx: Vec<u8>,
    response_timeout: Duration,
    banner: Option<String>,
}

impl<T: Transport> JsonRpcClient<T> {
    /// Wrap a transport without waiting for the board
    pub fn new(transport: T) -> Self {
        Self {
            transport,
            next_id: 1,
            rx: Vec::new(),
            response_timeout: DEFAULT_RESPONSE_TIMEOUT,
            banner: None,
        }
    }

    /// Wrap a transport and wait up to `init_timeout` for the board's first line
    ///
    /// Most boards reset when the port is opened and print a banner once the
    /// firmware is up. Not getting one is not an error.
    pub fn connect(transport: T, init_timeout: Duration) -> Result<Self> {
        let mut client = Self::new(transport);
        if !init_timeout.is_zero() {
            client.banner = client.read_line(init_timeout)?;
            match &client.banner {
                Some(banner) => log::info!("Board says: {}", banner),
                None => log::debug!("No banner within {:?}", init_timeout),
            }
        }
        Ok(client)
    }

    /// First line printed by the board after connecting, if any
    pub fn banner(&self) -> Option<&str> {
        self.banner.as_deref()
    }

    /// Change the per-request response timeout
    pub fn set_response_timeout(&mut self, timeout: Duration) {
        self.response_timeout = timeout;
    }

    /// Get a mutable reference to the transport
    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }

    /// Consume the client and return the transport
    pub fn into_inner(self) -> T {
        self.transport
    }

    /// Send one request and wait for its response
    pub fn call(&mut self, method: &str, params: &[Value]) -> Result<Response> {
        let id = self.next_id;
        self.next_id += 1;

        let frame = protocol::encode_request(id, method, params)?;
        log::debug!("request #{}: {}", id, method);
        log::trace!("-> {}", frame.trim_end());
        self.transport.write(frame.as_bytes())?;
        self.transport.flush()?;

        let deadline = Instant::now() + self.response_timeout;
        loop {
            let remaining = deadline.saturating_duration_since(Instant::now());
            let line = self.read_line(remaining)?.ok_or(SerialError::Timeout)?;
            log::trace!("<- {}", line);

            let Some(response) = protocol::decode_response(&line)? else {
                if !line.trim().is_empty() {
                    log::debug!("Skipping board output: {}", line);
                }
                continue;
            };

            match response.id {
                // Late answer to a request that already timed out
                Some(got) if got < id => {
                    log::debug!("Dropping stale response #{} while waiting for #{}", got, id);
                    continue;
                }
                Some(got) if got != id => {
                    return Err(SerialError::Framing(format!(
                        "response id {} does not match request id {}",
                        got, id
                    )));
                }
                _ => {}
            }
            match &response.outcome {
                Ok(_) => log::debug!("response #{}: ok", id),
                Err(e) => log::debug!("response #{}: error {} {}", id, e.code, e.message),
            }
            return Ok(response);
        }
    }

    /// Read one line, waiting at most `timeout`
    ///
    /// Returns `None` if no complete line arrived in time. The line
    /// terminator (and a preceding `\r`) is stripped.
    fn read_line(&mut self, timeout: Duration) -> Result<Option<String>> {
        let deadline = Instant::now() + timeout;
        let mut buf = [0u8; 256];

        loop {
            if let Some(pos) = self.rx.iter().position(|&b| b == b'\n') {
                let mut line: Vec<u8> = self.rx.drain(..=pos).collect();
                line.pop();
                if line.last() == Some(&b'\r') {
                    line.pop();
                }
                return Ok(Some(String::from_utf8_lossy(&line).into_owned()));
            }

            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                return Ok(None);
            }

            let n = self.transport.read_nonblock(&mut buf, remaining)?;
            self.rx.extend_from_slice(&buf[..n]);
        }
    }
}

impl<T: Transport> RpcChannel for JsonRpcClient<T> {
    fn send_request(
        &mut self,
        method: &str,
        params: &[Value],
    ) -> core::result::Result<Value, ChannelError> {
        let response = self.call(method, params)?;
        response.outcome.map_err(|e| ChannelError::Remote {
            code: e.code,
            message: e.message,
        })
    }
}
