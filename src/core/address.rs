//! Address types for executable patching.
//!
//! `Rva` (relative virtual address) and `Offset` (physical file offset) are
//! distinct newtypes so the two coordinate systems can never be mixed by
//! accident. Conversion between them goes through a section mapping
//! (see `formats::pe::SectionView::rva_to_offset`).

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, Sub};

/// Relative virtual address: an address relative to the image base.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Rva(pub u64);

/// Physical byte offset within the file on disk.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Offset(pub u64);

impl Rva {
    /// The numeric value of the address.
    #[inline]
    pub const fn value(self) -> u64 {
        self.0
    }

    /// Add a byte delta, returning `None` on overflow.
    #[inline]
    pub fn checked_add(self, delta: u64) -> Option<Rva> {
        self.0.checked_add(delta).map(Rva)
    }

    /// Distance in bytes from `base` to `self`, if `self >= base`.
    #[inline]
    pub fn offset_from(self, base: Rva) -> Option<u64> {
        self.0.checked_sub(base.0)
    }
}

impl Offset {
    /// The numeric value of the offset.
    #[inline]
    pub const fn value(self) -> u64 {
        self.0
    }

    #[inline]
    pub fn checked_add(self, delta: u64) -> Option<Offset> {
        self.0.checked_add(delta).map(Offset)
    }
}

impl Add<u64> for Rva {
    type Output = Rva;

    fn add(self, rhs: u64) -> Rva {
        Rva(self.0 + rhs)
    }
}

impl Sub<Rva> for Rva {
    type Output = u64;

    fn sub(self, rhs: Rva) -> u64 {
        self.0 - rhs.0
    }
}

impl Add<u64> for Offset {
    type Output = Offset;

    fn add(self, rhs: u64) -> Offset {
        Offset(self.0 + rhs)
    }
}

impl From<u64> for Rva {
    fn from(value: u64) -> Self {
        Rva(value)
    }
}

impl From<u32> for Rva {
    fn from(value: u32) -> Self {
        Rva(value as u64)
    }
}

impl From<u64> for Offset {
    fn from(value: u64) -> Self {
        Offset(value)
    }
}

impl fmt::Display for Rva {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#x}", self.0)
    }
}

impl fmt::Display for Offset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#x}", self.0)
    }
}

impl fmt::LowerHex for Rva {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::LowerHex::fmt(&self.0, f)
    }
}

impl fmt::LowerHex for Offset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::LowerHex::fmt(&self.0, f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_is_hex() {
        assert_eq!(Rva(0x1000).to_string(), "0x1000");
        assert_eq!(Offset(0x400).to_string(), "0x400");
        assert_eq!(format!("{:x}", Rva(0xbeef)), "beef");
    }

    #[test]
    fn test_arithmetic() {
        assert_eq!(Rva(0x10) + 4, Rva(0x14));
        assert_eq!(Rva(0x14) - Rva(0x10), 4);
        assert_eq!(Rva(0x14).offset_from(Rva(0x10)), Some(4));
        assert_eq!(Rva(0x10).offset_from(Rva(0x14)), None);
        assert_eq!(Rva(u64::MAX).checked_add(1), None);
        assert_eq!(Offset(8) + 8, Offset(16));
    }

    #[test]
    fn test_serde_transparent() {
        let json = serde_json::to_string(&Rva(42)).unwrap();
        assert_eq!(json, "42");
        let back: Offset = serde_json::from_str("7").unwrap();
        assert_eq!(back, Offset(7));
    }
}
