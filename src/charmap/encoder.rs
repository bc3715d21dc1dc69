//! Encoder for scripts that need a remapped glyph table.
//!
//! Codepages such as VISCII are not expressible as "cp437 with a different
//! upper half": they place letters in the control range too, and translated
//! text often arrives with decomposed combining marks. The encoder is built
//! from the same table that patches the glyph table, so text encodes to
//! exactly the codes the patched program renders as those letters.

use crate::charmap::codec::{cp437_byte, cp437_char, EncodeErrorPolicy, NATIVE_CODEPAGE};
use crate::charmap::tables::CodepageTable;
use crate::error::{PatchError, Result};
use std::collections::HashMap;
use unicode_normalization::UnicodeNormalization;

/// Reverse lookup from glyph-table characters to native 8-bit codes.
#[derive(Debug, Clone)]
pub struct CharmapEncoder {
    lookup: HashMap<char, u8>,
    decode: [Option<char>; 256],
}

/// Compose a single code point the way translated text will be composed.
fn composed(ch: char) -> char {
    let mut it = std::iter::once(ch).nfc();
    match (it.next(), it.next()) {
        (Some(c), None) => c,
        _ => ch,
    }
}

impl CharmapEncoder {
    /// Build the reverse lookup from a codepage table.
    ///
    /// Each entry contributes `code + i` for the i-th code point of its run.
    /// Code points that are not valid `char`s are skipped.
    pub fn new(table: &CodepageTable) -> Self {
        let mut lookup = HashMap::new();
        let mut decode = [None; 256];
        for (code, values) in table.entries() {
            for (i, &value) in values.iter().enumerate() {
                let Some(byte) = u8::try_from(code as usize + i).ok() else {
                    break;
                };
                let Some(ch) = char::from_u32(value) else {
                    continue;
                };
                let ch = composed(ch);
                lookup.insert(ch, byte);
                decode[byte as usize] = Some(ch);
            }
        }
        Self { lookup, decode }
    }

    /// Native code for a character, if the table covers it.
    pub fn lookup(&self, ch: char) -> Option<u8> {
        self.lookup.get(&composed(ch)).copied()
    }

    /// Character the patched program shows for `byte`.
    pub fn decode_byte(&self, byte: u8) -> char {
        self.decode[byte as usize].unwrap_or_else(|| cp437_char(byte))
    }

    /// Encode text into native codes.
    ///
    /// Input is NFC-normalized first so decomposed sequences match the
    /// precomposed table entries; characters outside the table fall back to
    /// cp437 under `policy`.
    pub fn encode(&self, text: &str, policy: EncodeErrorPolicy) -> Result<Vec<u8>> {
        let mut out = Vec::with_capacity(text.len());
        for ch in text.nfc() {
            if let Some(&code) = self.lookup.get(&ch) {
                out.push(code);
            } else if let Some(code) = cp437_byte(ch) {
                out.push(code);
            } else {
                match policy {
                    EncodeErrorPolicy::Strict => {
                        return Err(PatchError::UnencodableText {
                            text: text.to_string(),
                            encoding: NATIVE_CODEPAGE.to_string(),
                        })
                    }
                    EncodeErrorPolicy::Replace => out.push(b'?'),
                }
            }
        }
        Ok(out)
    }

    /// Number of characters covered by the table.
    pub fn len(&self) -> usize {
        self.lookup.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lookup.is_empty()
    }
}
