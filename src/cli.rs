//! CLI argument parsing

use crate::connection;
use clap::{ArgGroup, Parser};
use eeprog_core::chip::ChipSource;
use std::path::PathBuf;

/// Generate dynamic help text for the port argument
fn port_help() -> String {
    format!(
        "Programmer connection [available: {}]",
        connection::connection_names_short()
    )
}

#[derive(Parser)]
#[command(name = "eeprog")]
#[command(author, version, about = "EEPROM programmer client", long_about = None)]
#[command(group(
    ArgGroup::new("mode")
        .required(true)
        .args(["read", "write", "erase", "verify", "list_chips"])
))]
pub struct Cli {
    /// Programmer connection
    #[arg(help = port_help(), required_unless_present = "list_chips")]
    pub port: Option<String>,

    /// Chip type (e.g. AT28C64)
    #[arg(short = 'p', long = "device", required_unless_present = "list_chips")]
    pub chip: Option<String>,

    /// Read the whole chip into FILE
    #[arg(short, long, value_name = "FILE")]
    pub read: Option<PathBuf>,

    /// Write FILE to the chip (erases first unless --skip-erase)
    #[arg(short, long, value_name = "FILE")]
    pub write: Option<PathBuf>,

    /// Fill the whole chip with the erase pattern
    #[arg(short, long)]
    pub erase: bool,

    /// Compare the chip content with FILE
    #[arg(long, value_name = "FILE")]
    pub verify: Option<PathBuf>,

    /// Erase pattern as a HEX byte
    #[arg(long, value_name = "HEX")]
    pub erase_pattern: Option<String>,

    /// Don't erase before writing
    #[arg(
        long,
        requires = "write",
        conflicts_with_all = ["read", "erase", "verify", "list_chips"]
    )]
    pub skip_erase: bool,

    /// Query write latency after every page and print a summary
    #[arg(long)]
    pub collect_write_performance: bool,

    /// Serial baud rate
    #[arg(long, default_value_t = 115200)]
    pub baudrate: u32,

    /// Seconds to wait for the board to come up after connecting
    #[arg(long, default_value_t = 3, value_name = "SECS")]
    pub init_timeout: u64,

    /// Where chip geometry comes from (registry or device)
    #[arg(long, default_value_t = ChipSource::Registry)]
    pub chip_source: ChipSource,

    /// Extra chip definitions (RON file or directory of .ron files)
    #[arg(long)]
    pub chip_db: Option<PathBuf>,

    /// Print a hex dump of the data read
    #[arg(
        long,
        requires = "read",
        conflicts_with_all = ["write", "erase", "verify", "list_chips"]
    )]
    pub dump: bool,

    /// List known chips and exit
    #[arg(long)]
    pub list_chips: bool,

    /// Verbosity level (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

/// What a single invocation does
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mode {
    /// Read the chip into a file
    Read(PathBuf),
    /// Write a file to the chip
    Write(PathBuf),
    /// Fill the chip with the erase pattern
    Erase,
    /// Compare the chip with a file
    Verify(PathBuf),
    /// Print the chip registry
    ListChips,
}

impl Cli {
    /// The selected mode; clap guarantees exactly one is present
    pub fn mode(&self) -> Mode {
        if let Some(path) = &self.read {
            Mode::Read(path.clone())
        } else if let Some(path) = &self.write {
            Mode::Write(path.clone())
        } else if let Some(path) = &self.verify {
            Mode::Verify(path.clone())
        } else if self.erase {
            Mode::Erase
        } else {
            Mode::ListChips
        }
    }
}
