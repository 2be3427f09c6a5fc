//! Chip registry
//!
//! [`ChipDatabase::builtin`] returns the parts every board supports. Extra
//! parts can be loaded from RON files at runtime:
//!
//! ```ron
//! (
//!     vendor: "Atmel",
//!     chips: [
//!         (name: "AT28C64", memory_size: KiB(8), max_page_size: Some(64)),
//!     ],
//! )
//! ```

use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::Path;

use thiserror::Error;

use super::types::{normalize_chip_type, ChipDefinition, ChipSettings};
use crate::error::{Error, Result};

/// Parts known without any database file: (name, vendor, memory size, max page size)
const BUILTIN_CHIPS: &[(&str, &str, u32, Option<u32>)] = &[
    ("AT28C16", "Atmel", 2 * 1024, None),
    ("AT28C64", "Atmel", 8 * 1024, Some(64)),
    ("AT28C256", "Atmel", 32 * 1024, Some(64)),
];

/// Error type for chip database loading
#[derive(Debug, Error)]
pub enum ChipDbError {
    /// I/O error reading files
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    /// RON parsing error
    #[error("Parse error: {0}")]
    Parse(#[from] ron::error::SpannedError),
    /// Validation error
    #[error("Validation error: {0}")]
    Validation(String),
}

// ============================================================================
// RON deserialization types (intermediate format)
// ============================================================================

/// Size specification with human-readable units (for RON parsing)
#[derive(Debug, Clone, Copy, serde::Deserialize)]
pub enum Size {
    /// Size in bytes
    B(u32),
    /// Size in kibibytes (1024 bytes)
    KiB(u32),
}

impl Size {
    /// Convert to bytes
    pub fn to_bytes(self) -> u32 {
        match self {
            Size::B(n) => n,
            Size::KiB(n) => n * 1024,
        }
    }
}

#[derive(Debug, Clone, serde::Deserialize)]
struct ChipDef {
    name: String,
    memory_size: Size,
    #[serde(default)]
    max_page_size: Option<u32>,
}

#[derive(Debug, Clone, serde::Deserialize)]
struct VendorDef {
    vendor: String,
    chips: Vec<ChipDef>,
}

// ============================================================================
// Chip database
// ============================================================================

/// Immutable-once-built chip registry keyed by uppercase chip type
#[derive(Debug, Clone, Default)]
pub struct ChipDatabase {
    chips: BTreeMap<String, ChipDefinition>,
}

impl ChipDatabase {
    /// Create an empty chip database
    pub fn new() -> Self {
        Self {
            chips: BTreeMap::new(),
        }
    }

    /// Create a database holding the built-in parts
    pub fn builtin() -> Self {
        let mut db = Self::new();
        for &(name, vendor, memory_size, max_page_size) in BUILTIN_CHIPS {
            // Built-in sizes are non-zero constants
            if let Ok(settings) = ChipSettings::new(memory_size, max_page_size) {
                db.insert(ChipDefinition {
                    name: name.to_string(),
                    vendor: vendor.to_string(),
                    settings,
                });
            }
        }
        db
    }

    /// Add or replace a chip definition
    pub fn insert(&mut self, mut chip: ChipDefinition) {
        chip.name = chip.name.to_ascii_uppercase();
        self.chips.insert(chip.name.clone(), chip);
    }

    /// Load chip definitions from a single RON file
    pub fn load_file(&mut self, path: &Path) -> core::result::Result<usize, ChipDbError> {
        let content = fs::read_to_string(path)?;
        self.load_ron(&content)
    }

    /// Load chip definitions from a RON string
    ///
    /// Entries replace existing chips with the same name.
    pub fn load_ron(&mut self, content: &str) -> core::result::Result<usize, ChipDbError> {
        let vendor_def: VendorDef = ron::from_str(content)?;
        let count = vendor_def.chips.len();

        for chip_def in vendor_def.chips {
            if chip_def.name.trim().is_empty() {
                return Err(ChipDbError::Validation("chip with empty name".into()));
            }
            let settings = ChipSettings::new(chip_def.memory_size.to_bytes(), chip_def.max_page_size)
                .map_err(|e| ChipDbError::Validation(format!("{}: {}", chip_def.name, e)))?;
            self.insert(ChipDefinition {
                name: chip_def.name.trim().to_string(),
                vendor: vendor_def.vendor.clone(),
                settings,
            });
        }

        Ok(count)
    }

    /// Load all RON files from a directory
    pub fn load_dir(&mut self, dir: &Path) -> core::result::Result<usize, ChipDbError> {
        let mut total = 0;

        for entry in fs::read_dir(dir)? {
            let entry = entry?;
            let path = entry.path();

            if path.extension().is_some_and(|ext| ext == "ron") {
                total += self.load_file(&path)?;
            }
        }

        Ok(total)
    }

    /// Look up chip settings by type (case-insensitive)
    pub fn lookup(&self, chip_type: &str) -> Result<ChipSettings> {
        self.find(chip_type).map(|chip| chip.settings)
    }

    /// Look up a full chip definition by type (case-insensitive)
    pub fn find(&self, chip_type: &str) -> Result<&ChipDefinition> {
        let key = normalize_chip_type(chip_type)?;
        self.chips.get(&key).ok_or(Error::UnknownChip(key))
    }

    /// Get the number of chips in the database
    pub fn len(&self) -> usize {
        self.chips.len()
    }

    /// Check if the database is empty
    pub fn is_empty(&self) -> bool {
        self.chips.is_empty()
    }

    /// Iterate over all chips in name order
    pub fn iter(&self) -> impl Iterator<Item = &ChipDefinition> {
        self.chips.values()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_sizes_positive() {
        let db = ChipDatabase::builtin();
        assert_eq!(db.len(), 3);
        for chip in db.iter() {
            assert!(chip.settings.memory_size() > 0, "{} has no memory", chip.name);
        }
    }

    #[test]
    fn test_lookup_case_insensitive() {
        let db = ChipDatabase::builtin();
        let settings = db.lookup("at28c64").unwrap();
        assert_eq!(settings.memory_size(), 8192);
        assert_eq!(settings.max_page_size(), Some(64));
        assert_eq!(db.lookup("AT28C256").unwrap().memory_size(), 32768);
    }

    #[test]
    fn test_lookup_unknown_and_empty() {
        let db = ChipDatabase::builtin();
        match db.lookup("at24c02") {
            Err(Error::UnknownChip(name)) => assert_eq!(name, "AT24C02"),
            other => panic!("unexpected: {:?}", other),
        }
        assert!(matches!(db.lookup(""), Err(Error::EmptyChipType)));
    }

    #[test]
    fn test_load_ron() {
        let ron = r#"
        (
            vendor: "Xicor",
            chips: [
                (name: "x28c256", memory_size: KiB(32), max_page_size: Some(64)),
                (name: "X2816", memory_size: B(2048)),
            ],
        )
        "#;

        let mut db = ChipDatabase::builtin();
        let count = db.load_ron(ron).unwrap();

        assert_eq!(count, 2);
        assert_eq!(db.len(), 5);

        let chip = db.find("X28C256").unwrap();
        assert_eq!(chip.name, "X28C256");
        assert_eq!(chip.vendor, "Xicor");
        assert_eq!(chip.settings.memory_size(), 32768);
        assert_eq!(db.lookup("x2816").unwrap().max_page_size(), None);
    }

    #[test]
    fn test_load_ron_replaces_existing() {
        let ron = r#"(vendor: "Microchip", chips: [(name: "AT28C64", memory_size: KiB(8), max_page_size: Some(32))])"#;
        let mut db = ChipDatabase::builtin();
        db.load_ron(ron).unwrap();
        assert_eq!(db.len(), 3);
        assert_eq!(db.lookup("AT28C64").unwrap().max_page_size(), Some(32));
        assert_eq!(db.find("AT28C64").unwrap().vendor, "Microchip");
    }

    #[test]
    fn test_load_ron_rejects_zero_size() {
        let ron = r#"(vendor: "Nobody", chips: [(name: "EMPTY", memory_size: B(0))])"#;
        let mut db = ChipDatabase::new();
        assert!(matches!(db.load_ron(ron), Err(ChipDbError::Validation(_))));
    }

    #[test]
    fn test_load_shipped_definitions() {
        let mut db = ChipDatabase::builtin();
        let count = db
            .load_ron(include_str!("../../../../chips/xicor.ron"))
            .unwrap();
        assert_eq!(count, 3);
        assert_eq!(db.lookup("x28hc256").unwrap().memory_size(), 32768);
        assert_eq!(db.lookup("X2816C").unwrap().max_page_size(), None);
    }

    #[test]
    fn test_size_conversion() {
        assert_eq!(Size::B(256).to_bytes(), 256);
        assert_eq!(Size::KiB(8).to_bytes(), 8192);
    }
}
