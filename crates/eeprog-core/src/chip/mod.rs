//! EEPROM chip types and registry
//!
//! Chip geometry comes from one of two places: the local [`ChipDatabase`]
//! (built-in table, optionally extended from RON files) or the board itself,
//! which may answer `init_chip` with `[memory_size, max_page_size]`.

mod database;
mod init;
mod types;

pub use database::*;
pub use init::initialize;
pub(crate) use init::send_init_chip;
pub use types::*;
