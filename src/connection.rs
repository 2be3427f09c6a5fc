//! Connection registration and dispatch
//!
//! The `PORT` argument selects how the board is reached. Which kinds are
//! available depends on the enabled features.

use std::time::Duration;

use eeprog_core::chip::ChipDatabase;
use eeprog_core::RpcChannel;

/// Information about a connection kind
pub struct ConnectionInfo {
    /// Name or syntax shown in help
    pub name: &'static str,
    /// Short description
    pub description: &'static str,
}

/// Get information about all connection kinds enabled at compile time
#[allow(unused_mut, clippy::vec_init_then_push)]
pub fn available_connections() -> Vec<ConnectionInfo> {
    let mut connections = Vec::new();

    #[cfg(feature = "serial")]
    connections.push(ConnectionInfo {
        name: "<serial port>",
        description: "Programmer board on a serial port (/dev/ttyUSB0, COM3)",
    });

    #[cfg(feature = "serial")]
    connections.push(ConnectionInfo {
        name: "tcp:<host>:<port>",
        description: "Programmer board behind a serial-to-TCP bridge",
    });

    #[cfg(feature = "dummy")]
    connections.push(ConnectionInfo {
        name: "dummy",
        description: "Simulated board for testing",
    });

    connections
}

/// Generate a short list of connection names for CLI help
pub fn connection_names_short() -> String {
    let connections = available_connections();
    if connections.is_empty() {
        return "none, recompile with connection features enabled".to_string();
    }
    let names: Vec<&str> = connections.iter().map(|c| c.name).collect();
    names.join(", ")
}

/// One `name - description` line per enabled connection kind
pub fn connection_lines() -> Vec<String> {
    available_connections()
        .iter()
        .map(|c| format!("  {:<20} - {}", c.name, c.description))
        .collect()
}

/// An open channel to a board
pub struct Opened {
    /// Request/response channel
    pub channel: Box<dyn RpcChannel>,
    /// First line the board printed, if any
    pub banner: Option<String>,
}

/// Open the connection named by `port`
///
/// The simulated board accepts every chip in `db`.
#[allow(unused_variables)]
pub fn open(
    port: &str,
    baud: u32,
    init_timeout: Duration,
    db: &ChipDatabase,
) -> Result<Opened, Box<dyn std::error::Error>> {
    #[cfg(feature = "dummy")]
    if port == "dummy" {
        use eeprog_dummy::{DummyBoard, DummyConfig};

        log::info!("Using simulated board");
        let board = DummyBoard::new(DummyConfig {
            chips: db.clone(),
            ..Default::default()
        });
        return Ok(Opened {
            channel: Box::new(board),
            banner: None,
        });
    }

    #[cfg(feature = "serial")]
    {
        let conn = eeprog_serial::Connection::parse(port)?;
        let client = eeprog_serial::open(&conn, Some(baud), init_timeout)?;
        Ok(Opened {
            banner: client.banner().map(str::to_string),
            channel: Box::new(client),
        })
    }

    #[cfg(not(feature = "serial"))]
    Err(format!("Unsupported connection: {}", port).into())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_connection_lines() {
        let lines = connection_lines();
        assert_eq!(lines.len(), available_connections().len());

        #[cfg(feature = "dummy")]
        assert!(lines
            .iter()
            .any(|l| l.contains("dummy") && l.ends_with("Simulated board for testing")));
    }
}
