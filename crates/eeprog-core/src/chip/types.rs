//! Chip geometry types

use core::fmt;
use core::str::FromStr;

use crate::error::{Error, Result};

/// Memory geometry of an EEPROM part
///
/// Immutable once obtained. `memory_size` is never zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChipSettings {
    memory_size: u32,
    max_page_size: Option<u32>,
}

impl ChipSettings {
    /// Create chip settings, rejecting a zero memory or page size
    pub fn new(memory_size: u32, max_page_size: Option<u32>) -> Result<Self> {
        if memory_size == 0 {
            return Err(Error::InvalidChipSettings("memory size is zero".into()));
        }
        if max_page_size == Some(0) {
            return Err(Error::InvalidChipSettings("max page size is zero".into()));
        }
        Ok(Self {
            memory_size,
            max_page_size,
        })
    }

    /// Total memory size in bytes
    pub fn memory_size(&self) -> u32 {
        self.memory_size
    }

    /// Largest page the chip (or board) accepts, if known
    pub fn max_page_size(&self) -> Option<u32> {
        self.max_page_size
    }

    /// Clamp a requested page size to the chip maximum
    pub fn effective_page_size(&self, requested: u32) -> u32 {
        match self.max_page_size {
            Some(max) => requested.min(max),
            None => requested,
        }
    }
}

impl fmt::Display for ChipSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} bytes", self.memory_size)?;
        if let Some(max) = self.max_page_size {
            write!(f, ", max page {} bytes", max)?;
        }
        Ok(())
    }
}

/// A registry entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChipDefinition {
    /// Chip type, always uppercase (e.g. "AT28C64")
    pub name: String,
    /// Vendor name
    pub vendor: String,
    /// Geometry
    pub settings: ChipSettings,
}

/// Where chip geometry is taken from during initialization
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ChipSource {
    /// Local registry; `init_chip` is still sent but its result is not parsed
    #[default]
    Registry,
    /// Settings returned by the board in response to `init_chip`
    Device,
}

impl fmt::Display for ChipSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Registry => write!(f, "registry"),
            Self::Device => write!(f, "device"),
        }
    }
}

impl FromStr for ChipSource {
    type Err = String;

    fn from_str(s: &str) -> core::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "registry" => Ok(Self::Registry),
            "device" => Ok(Self::Device),
            _ => Err(format!("invalid chip source: {} (use registry or device)", s)),
        }
    }
}

/// Normalize a user-supplied chip type to its registry key
pub fn normalize_chip_type(chip_type: &str) -> Result<String> {
    let trimmed = chip_type.trim();
    if trimmed.is_empty() {
        return Err(Error::EmptyChipType);
    }
    Ok(trimmed.to_ascii_uppercase())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_settings_invariants() {
        assert!(ChipSettings::new(0, None).is_err());
        assert!(ChipSettings::new(8192, Some(0)).is_err());
        let settings = ChipSettings::new(8192, Some(64)).unwrap();
        assert_eq!(settings.memory_size(), 8192);
        assert_eq!(settings.max_page_size(), Some(64));
    }

    #[test]
    fn test_effective_page_size() {
        let capped = ChipSettings::new(8192, Some(32)).unwrap();
        assert_eq!(capped.effective_page_size(64), 32);
        assert_eq!(capped.effective_page_size(16), 16);

        let uncapped = ChipSettings::new(2048, None).unwrap();
        assert_eq!(uncapped.effective_page_size(64), 64);
    }

    #[test]
    fn test_normalize_chip_type() {
        assert_eq!(normalize_chip_type(" at28c64 ").unwrap(), "AT28C64");
        assert!(matches!(normalize_chip_type(""), Err(Error::EmptyChipType)));
        assert!(matches!(normalize_chip_type("   "), Err(Error::EmptyChipType)));
    }

    #[test]
    fn test_chip_source_parse() {
        assert_eq!("Device".parse::<ChipSource>().unwrap(), ChipSource::Device);
        assert_eq!(ChipSource::default(), ChipSource::Registry);
        assert!("board".parse::<ChipSource>().is_err());
    }
}
