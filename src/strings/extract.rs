//! Aligned scan for NUL-terminated text in a raw section.
//!
//! x64 code mostly reaches static strings through RIP-relative operands that
//! never show up in a relocation table, so strings have to be found by a
//! linear scan of the data section and confirmed later by cross references.

use super::StringExtractConfig;
use crate::charmap::codec::TextCodec;
use crate::core::address::Rva;
use crate::error::{PatchError, Result};
use serde::Serialize;
use std::iter::FusedIterator;

/// A string candidate accepted by the extractor.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct ExtractedStringInfo {
    /// RVA of the first byte of the string
    pub address: Rva,
    pub text: String,
}

/// Measure a candidate run at the start of `buf`.
///
/// Returns `(length, letters)`. The length is 0 when a byte before the
/// terminator is not allowed or not decodable, or when no terminator exists.
pub fn check_string(buf: &[u8], codec: &TextCodec, allowed: &[bool; 256]) -> (usize, usize) {
    let mut letters = 0;
    for (i, &byte) in buf.iter().enumerate() {
        if byte == 0 {
            return (i, letters);
        }
        if !allowed[byte as usize] {
            return (0, 0);
        }
        match codec.decode_byte(byte) {
            Some(ch) if ch.is_alphabetic() => letters += 1,
            Some(_) => {}
            None => return (0, 0),
        }
    }
    (0, 0)
}

/// Lazy iterator over the strings of one buffer, in ascending address order.
pub struct StringExtractor<'a> {
    data: &'a [u8],
    base: Rva,
    alignment: usize,
    codec: TextCodec,
    allowed: [bool; 256],
    pos: usize,
}

impl<'a> StringExtractor<'a> {
    pub fn new(data: &'a [u8], base: Rva, cfg: &StringExtractConfig) -> Result<Self> {
        if cfg.alignment == 0 {
            return Err(PatchError::InvalidInput("alignment must be non-zero".into()));
        }
        Ok(Self {
            data,
            base,
            alignment: cfg.alignment,
            codec: TextCodec::for_name(&cfg.encoding)?,
            allowed: cfg.allowed_table(),
            pos: 0,
        })
    }
}

impl Iterator for StringExtractor<'_> {
    type Item = ExtractedStringInfo;

    fn next(&mut self) -> Option<Self::Item> {
        while self.pos < self.data.len() {
            let i = self.pos;
            let (len, letters) = check_string(&self.data[i..], &self.codec, &self.allowed);
            if len > 0 && letters > 0 {
                if let Some(text) = self.codec.decode(&self.data[i..i + len]) {
                    // skip the whole string and its terminator, rounded up
                    self.pos = i + (len / self.alignment + 1) * self.alignment;
                    return Some(ExtractedStringInfo {
                        address: self.base + i as u64,
                        text,
                    });
                }
            }
            self.pos = i + self.alignment;
        }
        None
    }
}

impl FusedIterator for StringExtractor<'_> {}

/// Extract everything that looks like a text string from `data`.
pub fn extract_strings_from_raw_bytes<'a>(
    data: &'a [u8],
    base: Rva,
    cfg: &StringExtractConfig,
) -> Result<StringExtractor<'a>> {
    StringExtractor::new(data, base, cfg)
}
