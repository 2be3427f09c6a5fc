//! Memory images
//!
//! A [`MemoryImage`] is the byte content of (part of) a chip, either read
//! from the board or loaded from a local file.

use core::fmt;
use core::ops::Deref;

use crate::chip::ChipSettings;
use crate::error::{Error, Result};

/// How a source image fits into the chip memory
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fit {
    /// Image covers the whole chip
    Exact,
    /// Image is shorter than the chip by `missing` bytes
    Short {
        /// Bytes of chip memory not covered by the image
        missing: usize,
    },
}

/// Check that `len` bytes can be written to a chip with `settings`
///
/// An empty source and a source larger than the chip are errors; a shorter
/// source is allowed and reported as [`Fit::Short`].
pub fn check_fit(len: usize, settings: &ChipSettings) -> Result<Fit> {
    let memory_size = settings.memory_size();
    if len == 0 {
        return Err(Error::EmptySource);
    }
    if len > memory_size as usize {
        return Err(Error::SizeMismatch { len, memory_size });
    }
    Ok(match memory_size as usize - len {
        0 => Fit::Exact,
        missing => Fit::Short { missing },
    })
}

/// Why a read-back image differs from the reference
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mismatch {
    /// Images have different lengths
    Length {
        /// Reference length
        expected: usize,
        /// Read-back length
        actual: usize,
    },
    /// Images differ at `offset` (first differing byte)
    Content {
        /// Address of the first differing byte
        offset: usize,
        /// Reference byte
        expected: u8,
        /// Read-back byte
        actual: u8,
    },
}

impl fmt::Display for Mismatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Length { expected, actual } => write!(
                f,
                "length mismatch, expected {} bytes, read {} bytes",
                expected, actual
            ),
            Self::Content {
                offset,
                expected,
                actual,
            } => write!(
                f,
                "data mismatch at 0x{:08X}, expected 0x{:02X}, read 0x{:02X}",
                offset, expected, actual
            ),
        }
    }
}

/// Ordered chip content
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct MemoryImage {
    data: Vec<u8>,
}

impl MemoryImage {
    /// Wrap raw bytes
    pub fn new(data: Vec<u8>) -> Self {
        Self { data }
    }

    /// Image filled with one byte value
    pub fn filled(len: usize, value: u8) -> Self {
        Self {
            data: vec![value; len],
        }
    }

    /// Image content
    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    /// Take the content
    pub fn into_vec(self) -> Vec<u8> {
        self.data
    }

    /// Byte-exact comparison against `reference`
    pub fn compare(&self, reference: &[u8]) -> core::result::Result<(), Mismatch> {
        if self.data.len() != reference.len() {
            return Err(Mismatch::Length {
                expected: reference.len(),
                actual: self.data.len(),
            });
        }

        match self
            .data
            .iter()
            .zip(reference)
            .position(|(actual, expected)| actual != expected)
        {
            Some(offset) => Err(Mismatch::Content {
                offset,
                expected: reference[offset],
                actual: self.data[offset],
            }),
            None => Ok(()),
        }
    }

    /// Hex dump view of the image, `bytes_per_line` bytes per line
    pub fn hex_dump(&self, bytes_per_line: usize) -> HexDump<'_> {
        HexDump {
            data: &self.data,
            bytes_per_line: bytes_per_line.max(1),
        }
    }
}

impl Deref for MemoryImage {
    type Target = [u8];

    fn deref(&self) -> &[u8] {
        &self.data
    }
}

impl From<Vec<u8>> for MemoryImage {
    fn from(data: Vec<u8>) -> Self {
        Self::new(data)
    }
}

/// Hex dump formatter
///
/// One line per chunk: address, hex bytes grouped in pairs, printable ASCII.
///
/// ```text
/// 00000000: 4865 6c6c 6f00 ffff  Hello...
/// ```
pub struct HexDump<'a> {
    data: &'a [u8],
    bytes_per_line: usize,
}

impl fmt::Display for HexDump<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (line_no, chunk) in self.data.chunks(self.bytes_per_line).enumerate() {
            write!(f, "{:08x}: ", line_no * self.bytes_per_line)?;

            for (i, byte) in chunk.iter().enumerate() {
                write!(f, "{:02x}", byte)?;
                if i % 2 == 1 {
                    write!(f, " ")?;
                }
            }

            // Pad a short last line so the ASCII column lines up
            for i in chunk.len()..self.bytes_per_line {
                write!(f, "  ")?;
                if i % 2 == 1 {
                    write!(f, " ")?;
                }
            }

            write!(f, " ")?;
            for &byte in chunk {
                if byte.is_ascii_graphic() || byte == b' ' {
                    write!(f, "{}", byte as char)?;
                } else {
                    write!(f, ".")?;
                }
            }
            writeln!(f)?;
        }
        Ok(())
    }
}
