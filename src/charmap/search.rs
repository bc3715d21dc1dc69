//! Locating the program's embedded Unicode glyph table.

use crate::core::address::Rva;
use memchr::memmem;

/// Code points the glyph table starts with (space, ☺ ☻ ♥ ♦ ♣ ♠ •).
const FINGERPRINT_CODEPOINTS: [u32; 8] = [0x20, 0x263A, 0x263B, 0x2665, 0x2666, 0x2663, 0x2660, 0x2022];

const fn fingerprint() -> [u8; 32] {
    let mut out = [0u8; 32];
    let mut i = 0;
    while i < FINGERPRINT_CODEPOINTS.len() {
        let bytes = FINGERPRINT_CODEPOINTS[i].to_le_bytes();
        out[i * 4] = bytes[0];
        out[i * 4 + 1] = bytes[1];
        out[i * 4 + 2] = bytes[2];
        out[i * 4 + 3] = bytes[3];
        i += 1;
    }
    out
}

/// The fingerprint as consecutive little-endian dwords.
pub const UNICODE_TABLE_START: [u8; 32] = fingerprint();

/// Address of the first occurrence of the glyph table fingerprint.
pub fn search_charmap(bytes: &[u8], base: Rva) -> Option<Rva> {
    memmem::find(bytes, &UNICODE_TABLE_START).map(|pos| base + pos as u64)
}
