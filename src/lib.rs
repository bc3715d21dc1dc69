//! transpatch: in-place string translation for x64 PE executables.
//!
//! The pipeline finds NUL-terminated strings in the data section, confirms
//! them through RIP-relative references from the code section and rewrites
//! them with translations from a dictionary. Scripts the program cannot
//! render natively are enabled by remapping its embedded glyph table.

/// Addresses and little-endian binary helpers
pub mod core;

/// String discovery in raw section bytes
pub mod strings;

/// Cross references, subroutines and string context
pub mod analysis;

/// Codepages, glyph table search and patching
pub mod charmap;

/// PE section access
pub mod formats;

/// Translation dictionaries
pub mod dictionary;

/// Patch engine
pub mod patch;

/// Mapped files and working copies
pub mod io;

pub mod config;
pub mod error;
pub mod logging;

pub use crate::analysis::{
    extract_strings_grouped_by_subroutines, extract_subroutines, find_intersected_cross_references,
    find_relative_cross_references, invert_cross_reference_table, which_subroutine, AnalysisConfig,
    SubroutineInfo,
};
pub use crate::config::AppConfig;
pub use crate::core::{Offset, Rva};
pub use crate::dictionary::{load_translation_file, TranslationDictionary};
pub use crate::error::{PatchError, Result};
pub use crate::formats::{PeImage, SectionView};
pub use crate::patch::{
    extract_referenced_strings, patch_charmap_file, patch_strings, run_on_file, PatchConfig, PatchReport,
    StringOutcome,
};
pub use crate::strings::{extract_strings_from_raw_bytes, ExtractedStringInfo, StringExtractConfig};
