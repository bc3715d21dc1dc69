//! What a patch run did.
//!
//! Every recoverable condition ends up here as well as in the log, so
//! callers can act on it without scraping diagnostics.

use crate::charmap::CharmapOutcome;
use crate::core::address::{Offset, Rva};
use serde::Serialize;

/// Result for one string that had a translation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum StringOutcome {
    Patched {
        rva: Rva,
        offset: Offset,
        original: String,
        translation: String,
    },
    /// The encoded translation needs more bytes than the original string.
    TooLong {
        rva: Rva,
        original: String,
        translation: String,
        original_len: usize,
        translated_len: usize,
    },
    /// The translation has characters the target encoding cannot represent.
    Unencodable {
        rva: Rva,
        original: String,
        translation: String,
        encoding: String,
    },
}

impl StringOutcome {
    pub fn rva(&self) -> Rva {
        match self {
            StringOutcome::Patched { rva, .. }
            | StringOutcome::TooLong { rva, .. }
            | StringOutcome::Unencodable { rva, .. } => *rva,
        }
    }

    pub fn is_patched(&self) -> bool {
        matches!(self, StringOutcome::Patched { .. })
    }
}

/// Two references whose displacement fields overlap, with their targets.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReferenceOverlap {
    pub first: Rva,
    pub first_target: Rva,
    pub second: Rva,
    pub second_target: Rva,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PatchReport {
    /// String-like objects found in the data section
    pub strings_found: usize,
    /// Strings with at least one reference from code
    pub referenced_strings: usize,
    pub total_references: usize,
    pub overlaps: Vec<ReferenceOverlap>,
    pub outcomes: Vec<StringOutcome>,
    /// Glyph table step, when the run included one
    pub charmap: Option<CharmapOutcome>,
}

impl PatchReport {
    pub fn patched(&self) -> usize {
        self.outcomes.iter().filter(|o| o.is_patched()).count()
    }

    pub fn skipped(&self) -> usize {
        self.outcomes.len() - self.patched()
    }
}
