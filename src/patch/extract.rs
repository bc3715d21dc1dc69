//! Listing the strings a patch run would consider.

use crate::analysis::context::strings_with_references;
use crate::analysis::AnalysisConfig;
use crate::error::Result;
use crate::formats::pe::PeImage;
use crate::strings::ExtractedStringInfo;
use std::io::{self, Write};

/// Strings of the data section that code refers to, in the order their
/// first reference appears in the code section.
///
/// This is the list a translator works from; strings nothing refers to
/// would never be patched.
pub fn extract_referenced_strings(image: &PeImage, cfg: &AnalysisConfig) -> Result<Vec<ExtractedStringInfo>> {
    let mut found = strings_with_references(image, cfg)?;
    found.sort_by_key(|(_, refs)| refs.iter().min().copied());
    Ok(found.into_iter().map(|(info, _)| info).collect())
}

/// One string per line, as a translator's work list.
pub fn write_strings<W: Write>(out: &mut W, strings: &[ExtractedStringInfo]) -> io::Result<()> {
    for info in strings {
        writeln!(out, "{}", info.text)?;
    }
    Ok(())
}
