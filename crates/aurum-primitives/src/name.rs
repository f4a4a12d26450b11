//! Packed 7-byte asset names and units of measurement

use std::fmt;
use thiserror::Error;

/// Low 56 bits of a packed name/unit; the high byte must stay clear.
const PACKED_MASK: u64 = 0x00FF_FFFF_FFFF_FFFF;

/// Asset name validation error
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum NameError {
    /// More than 7 bytes packed into the carrier integer
    #[error("name wider than 7 bytes: {0:#018x}")]
    TooWide(u64),
    /// Empty name or first character outside A-Z
    #[error("first character must be A-Z, got 0x{0:02x}")]
    BadFirstChar(u8),
    /// Character outside 0-9/A-Z after the first
    #[error("invalid character 0x{byte:02x} at position {position}")]
    BadChar {
        /// Byte offset within the 7-byte window
        position: usize,
        /// Offending byte value
        byte: u8,
    },
    /// Non-nul byte after the nul terminator
    #[error("name continues after nul terminator at position {0}")]
    AfterNul(usize),
    /// String form longer than 7 characters
    #[error("name longer than 7 characters: {0:?}")]
    TooLong(String),
}

/// Asset name: 1-7 ASCII characters packed little-endian into the low
/// 56 bits of a `u64`, nul-padded.
///
/// The first character must be `A`-`Z`; the rest are `0`-`9` or `A`-`Z`.
/// Construction validates, so a held value is always well-formed.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AssetName(u64);

impl AssetName {
    /// Validate and wrap a packed name.
    pub fn from_packed(packed: u64) -> Result<Self, NameError> {
        if packed > PACKED_MASK {
            return Err(NameError::TooWide(packed));
        }
        let bytes = packed.to_le_bytes();
        if !bytes[0].is_ascii_uppercase() {
            return Err(NameError::BadFirstChar(bytes[0]));
        }
        let mut terminated = None;
        for (position, &byte) in bytes.iter().enumerate().take(7).skip(1) {
            match (terminated, byte) {
                (Some(_), 0) => {}
                (Some(nul_at), _) => return Err(NameError::AfterNul(nul_at)),
                (None, 0) => terminated = Some(position),
                (None, b) if b.is_ascii_uppercase() || b.is_ascii_digit() => {}
                (None, b) => return Err(NameError::BadChar { position, byte: b }),
            }
        }
        Ok(AssetName(packed))
    }

    /// The packed 56-bit representation.
    pub fn packed(self) -> u64 {
        self.0
    }

    /// The 7-byte window, nul-padded.
    pub fn bytes(self) -> [u8; 7] {
        let le = self.0.to_le_bytes();
        [le[0], le[1], le[2], le[3], le[4], le[5], le[6]]
    }

    /// Number of characters before the nul padding.
    pub fn len(self) -> usize {
        self.bytes().iter().position(|&b| b == 0).unwrap_or(7)
    }

    /// Always false: a valid name has at least one character.
    pub fn is_empty(self) -> bool {
        false
    }
}

impl std::str::FromStr for AssetName {
    type Err = NameError;

    fn from_str(name: &str) -> Result<Self, NameError> {
        if name.len() > 7 {
            return Err(NameError::TooLong(name.to_string()));
        }
        let mut packed = 0u64;
        for (i, &byte) in name.as_bytes().iter().enumerate() {
            packed |= (byte as u64) << (i * 8);
        }
        Self::from_packed(packed)
    }
}

impl fmt::Display for AssetName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for &byte in self.bytes().iter().take_while(|&&b| b != 0) {
            write!(f, "{}", byte as char)?;
        }
        Ok(())
    }
}

impl fmt::Debug for AssetName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "AssetName({})", self)
    }
}

/// Unit of measurement: an opaque 7-byte code packed like [`AssetName`]
/// but without the character-set restriction. Zero means dimensionless.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct UnitOfMeasurement(u64);

impl UnitOfMeasurement {
    /// Dimensionless unit
    pub const NONE: UnitOfMeasurement = UnitOfMeasurement(0);

    /// Validate and wrap a packed unit code.
    pub fn from_packed(packed: u64) -> Result<Self, NameError> {
        if packed > PACKED_MASK {
            return Err(NameError::TooWide(packed));
        }
        Ok(UnitOfMeasurement(packed))
    }

    /// The packed 56-bit representation.
    pub fn packed(self) -> u64 {
        self.0
    }
}

impl fmt::Debug for UnitOfMeasurement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "UnitOfMeasurement({:#x})", self.0)
    }
}
