//! Configuration for aligned string extraction.

use serde::{Deserialize, Serialize};

/// Filters applied to candidate string bytes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StringExtractConfig {
    /// Strings start on multiples of this many bytes
    pub alignment: usize,
    /// Encoding the candidate bytes must decode under
    pub encoding: String,
    /// Highest byte accepted without whitelisting (printable ASCII ends at 0x7E)
    pub printable_max: u8,
    /// Bytes accepted regardless of the printable range
    pub allowed: Vec<u8>,
    /// Bytes that reject a candidate outright
    pub forbidden: Vec<u8>,
}

impl Default for StringExtractConfig {
    fn default() -> Self {
        Self {
            alignment: 4,
            encoding: "cp437".to_string(),
            printable_max: 0x7E,
            allowed: b"\r\t".to_vec(),
            forbidden: b"$^\0".to_vec(),
        }
    }
}

impl StringExtractConfig {
    /// Per-byte "allowed" table: whitelisted, or printable and not forbidden.
    pub(crate) fn allowed_table(&self) -> [bool; 256] {
        let mut table = [false; 256];
        for byte in 0x20..=self.printable_max {
            table[byte as usize] = true;
        }
        for &byte in &self.forbidden {
            table[byte as usize] = false;
        }
        for &byte in &self.allowed {
            table[byte as usize] = true;
        }
        // the terminator never belongs to a string
        table[0] = false;
        table
    }
}
