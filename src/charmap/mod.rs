//! Codepage and glyph-table transcoding.
//!
//! The program renders text through an embedded table of Unicode code points
//! indexed by its native 8-bit codes. Rewriting entries of that table lets
//! the unchanged 8-bit strings display another script; `codec` and `encoder`
//! then turn translated text into those same 8-bit codes.

pub mod codec;
pub mod encoder;
pub mod search;
pub mod tables;

pub use codec::{EncodeErrorPolicy, TextCodec, NATIVE_CODEPAGE};
pub use encoder::CharmapEncoder;
pub use search::{search_charmap, UNICODE_TABLE_START};
pub use tables::{codepage_table, derive_table, CodepageTable};

use crate::core::address::{Offset, Rva};
use crate::core::binio::{write_dwords, DWORD_SIZE};
use crate::error::{PatchError, Result};
use crate::formats::pe::SectionView;
use serde::Serialize;
use std::io::{Seek, Write};
use tracing::{info, warn};

/// Result of the glyph table step. Only I/O problems are errors.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum CharmapOutcome {
    /// No codepage requested.
    Skipped,
    /// The fingerprint does not occur in the section.
    TableNotFound,
    /// The codepage has no table.
    NotImplemented { codepage: String },
    Patched {
        codepage: String,
        rva: Rva,
        offset: Offset,
        glyphs: usize,
    },
}

/// Write `table` into the glyph table located at `table_offset`.
///
/// Entry `code` lands at `table_offset + code * 4`; a run of n code points
/// fills n consecutive dwords. Returns the number of dwords written.
pub fn patch_unicode_table<W: Write + Seek>(
    out: &mut W,
    table_offset: Offset,
    table: &CodepageTable,
) -> std::io::Result<usize> {
    let mut written = 0;
    for (code, values) in table.entries() {
        let offset = table_offset + code as u64 * DWORD_SIZE as u64;
        written += write_dwords(out, offset, values.iter().copied())?;
    }
    Ok(written)
}

/// Find the glyph table in `section` and remap it to `codepage`.
pub fn fix_unicode_table<W: Write + Seek>(
    out: &mut W,
    section: &SectionView,
    codepage: Option<&str>,
) -> Result<CharmapOutcome> {
    let Some(codepage) = codepage.filter(|c| !c.is_empty()) else {
        info!("Codepage is not set, skipping unicode table patch");
        return Ok(CharmapOutcome::Skipped);
    };

    info!("Searching for unicode table...");
    let Some(rva) = search_charmap(&section.data, section.virtual_address) else {
        warn!(section = %section.name, "Unicode table not found, skipping");
        return Ok(CharmapOutcome::TableNotFound);
    };
    let offset = section
        .rva_to_offset(rva)
        .ok_or(PatchError::AddressOutOfRange { rva })?;
    info!(%rva, %offset, "Found unicode table");

    let Some(table) = codepage_table(codepage) else {
        warn!(%codepage, "Codepage not implemented, skipping");
        return Ok(CharmapOutcome::NotImplemented {
            codepage: codepage.to_string(),
        });
    };

    info!(%codepage, glyphs = table.glyph_count(), "Patching unicode table");
    let glyphs = patch_unicode_table(out, offset, &table)?;
    info!(glyphs, "Unicode table patched");
    Ok(CharmapOutcome::Patched {
        codepage: codepage.to_string(),
        rva,
        offset,
        glyphs,
    })
}
