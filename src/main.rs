//! eeprog - EEPROM programmer client
//!
//! Reads, writes, erases and verifies parallel EEPROMs (AT28C16, AT28C64,
//! AT28C256, ...) through a programmer board that speaks JSON-RPC over a
//! serial port.
//!
//! # Architecture
//!
//! - `eeprog-core` turns whole-memory operations into page transfers over
//!   any `RpcChannel` and owns the chip registry
//! - `eeprog-serial` is the channel to real hardware (serial port or TCP
//!   bridge)
//! - `eeprog-dummy` is a simulated board, selected with the `dummy` port
//!
//! Each invocation connects, initializes the chip and performs exactly one
//! operation. Every step prints `<step>: success, <secs> sec` or
//! `<step>: failed, <reason>`; any failure exits with status 1.

mod cli;
mod commands;
mod connection;

use clap::Parser;
use cli::{Cli, Mode};
use commands::StepFailed;
use eeprog_core::chip::ChipDatabase;
use eeprog_core::programmer::{ErasePattern, Programmer, ProgrammerConfig};
use std::path::{Path, PathBuf};
use std::time::Duration;

fn main() {
    let cli = Cli::parse();

    // Initialize logger; RUST_LOG still overrides the verbosity flags
    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or(log_filter(cli.verbose)),
    )
    .init();

    // Load chip database
    let db = match load_chip_database(cli.chip_db.as_deref()) {
        Ok(db) => db,
        Err(e) => {
            eprintln!("Failed to load chip database: {}", e);
            std::process::exit(1);
        }
    };

    log::debug!("Loaded {} chip definitions", db.len());

    if let Err(e) = run(&cli, &db) {
        // Step failures were already reported with their step name
        if !e.is::<StepFailed>() {
            eprintln!("{}", e);
        }
        std::process::exit(1);
    }
}

/// Default log filter for a `-v` count
fn log_filter(verbose: u8) -> &'static str {
    match verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    }
}

fn run(cli: &Cli, db: &ChipDatabase) -> Result<(), Box<dyn std::error::Error>> {
    let mode = cli.mode();
    if mode == Mode::ListChips {
        commands::list_chips(db);
        println!();
        commands::list_connections();
        return Ok(());
    }

    // Report a bad pattern before touching the board
    let pattern = cli
        .erase_pattern
        .as_deref()
        .map(ErasePattern::parse)
        .transpose()?
        .unwrap_or_default();

    let port = cli.port.as_deref().ok_or("missing PORT")?;
    let chip = cli.chip.as_deref().ok_or("missing chip type")?;

    let opened = commands::run_step("connect", port, || {
        let opened = connection::open(
            port,
            cli.baudrate,
            Duration::from_secs(cli.init_timeout),
            db,
        )?;
        if let Some(banner) = &opened.banner {
            println!("connect: response {}", banner);
        }
        Ok(opened)
    })?;

    let config = ProgrammerConfig {
        chip_source: cli.chip_source,
        ..Default::default()
    };
    let mut programmer = commands::run_step("chip init", chip, || {
        Ok(Programmer::init(opened.channel, db, chip, config)?)
    })?;

    let collect = cli.collect_write_performance;
    match mode {
        Mode::Read(path) => commands::run_read(&mut programmer, &path, cli.dump),
        Mode::Write(path) => {
            let erase = (!cli.skip_erase).then_some(pattern);
            commands::run_write(&mut programmer, &path, erase, collect)
        }
        Mode::Erase => commands::run_erase(&mut programmer, pattern, collect),
        Mode::Verify(path) => commands::run_verify(&mut programmer, &path),
        Mode::ListChips => Ok(()),
    }
}

/// Load the chip database: built-in parts plus the specified path or default locations
fn load_chip_database(path: Option<&Path>) -> Result<ChipDatabase, Box<dyn std::error::Error>> {
    let mut db = ChipDatabase::builtin();

    if let Some(path) = path {
        // User specified a path
        let count = if path.is_dir() {
            db.load_dir(path)?
        } else if path.is_file() {
            db.load_file(path)?
        } else {
            return Err(format!("Chip database path not found: {}", path.display()).into());
        };
        log::info!("Loaded {} chips from {}", count, path.display());
    } else {
        // Extra definitions are optional
        let default_paths = [
            PathBuf::from("chips"),
            PathBuf::from("/usr/share/eeprog/chips"),
            PathBuf::from("/usr/local/share/eeprog/chips"),
        ];

        for dir in &default_paths {
            if dir.is_dir() {
                match db.load_dir(dir) {
                    Ok(count) => log::debug!("Loaded {} chips from {}", count, dir.display()),
                    Err(e) => log::warn!("Failed to load chips from {}: {}", dir.display(), e),
                }
            }
        }
    }

    Ok(db)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_filter() {
        assert_eq!(log_filter(0), "info");
        assert_eq!(log_filter(1), "debug");
        assert_eq!(log_filter(2), "trace");
        assert_eq!(log_filter(5), "trace");
    }

    #[cfg(feature = "dummy")]
    #[test]
    fn test_bad_pattern_stops_before_connect() {
        use eeprog_core::{Error, ErrorKind};

        let db = ChipDatabase::builtin();
        for pattern in ["1FF", "ZZ", "-1"] {
            let cli = Cli::parse_from([
                "eeprog",
                "dummy",
                "-p",
                "AT28C16",
                "-e",
                "--erase-pattern",
                pattern,
            ]);
            let err = run(&cli, &db).unwrap_err();

            // A failed connect step would come back as StepFailed
            assert!(!err.is::<StepFailed>());
            let err = err.downcast_ref::<Error>().unwrap();
            assert_eq!(err.kind(), ErrorKind::Config);
        }
    }

    #[cfg(feature = "dummy")]
    #[test]
    fn test_erase_on_dummy() {
        let db = ChipDatabase::builtin();
        let cli = Cli::parse_from([
            "eeprog",
            "dummy",
            "-p",
            "AT28C16",
            "-e",
            "--erase-pattern",
            "CC",
        ]);
        run(&cli, &db).unwrap();
    }
}
