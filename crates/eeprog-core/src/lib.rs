//! eeprog-core - Core library for EEPROM programming
//!
//! This crate turns whole-memory operations (read, write, erase, verify) into
//! a sequence of bounded-size page transfers against a programmer board that
//! is reached through an [`RpcChannel`]. It also owns chip geometry (the
//! [`chip::ChipDatabase`]) and validates images against the chip capacity.
//!
//! The channel itself (serial port, TCP socket, simulated board) lives in
//! other crates; this one only assumes a reliable, ordered, synchronous
//! request/response primitive.
//!
//! # Example
//!
//! ```ignore
//! use eeprog_core::chip::ChipDatabase;
//! use eeprog_core::programmer::{ErasePattern, Programmer, ProgrammerConfig};
//!
//! let db = ChipDatabase::builtin();
//! let mut programmer = Programmer::init(channel, &db, "at28c64", ProgrammerConfig::default())?;
//!
//! programmer.erase_data(ErasePattern::DEFAULT, false)?;
//! programmer.write_data(&image, false)?;
//! programmer.verify_data(&image)?;
//! ```

#![warn(missing_docs)]
#![warn(rust_2018_idioms)]

pub mod chip;
pub mod error;
pub mod image;
pub mod programmer;
pub mod rpc;

pub use error::{ChannelError, Error, ErrorKind, Operation, Result};
pub use rpc::RpcChannel;
