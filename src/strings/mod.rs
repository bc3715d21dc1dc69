//! String discovery in raw section bytes.
//!
//! Candidates are NUL-terminated runs of allowed, decodable bytes that start
//! on an alignment boundary and contain at least one letter. Whether a
//! candidate is really used by the program is decided later by the
//! cross-reference resolver.

mod config;
pub mod extract;

pub use config::StringExtractConfig;
pub use extract::{check_string, extract_strings_from_raw_bytes, ExtractedStringInfo, StringExtractor};
