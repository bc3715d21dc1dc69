//! Patch engine: translate strings of an executable in place.
//!
//! A run works on a working copy of the executable. The glyph table is
//! remapped first (when a codepage is configured), then strings are
//! extracted, confirmed through code references and overwritten with their
//! translations where those fit.

pub mod engine;
pub mod extract;
pub mod report;

pub use engine::patch_strings;
pub use extract::{extract_referenced_strings, write_strings};
pub use report::{PatchReport, ReferenceOverlap, StringOutcome};

use crate::analysis::AnalysisConfig;
use crate::charmap::{fix_unicode_table, CharmapOutcome, EncodeErrorPolicy, TextCodec, NATIVE_CODEPAGE};
use crate::dictionary::TranslationDictionary;
use crate::error::Result;
use crate::formats::pe::PeImage;
use crate::io::{IOLimits, PatchTarget};
use crate::span_trace;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{info, warn};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PatchConfig {
    pub analysis: AnalysisConfig,
    /// Encoding of translated text; defaults to the glyph codepage when it
    /// has a codec, then cp437
    pub encoding: Option<String>,
    /// Codepage the glyph table is remapped to
    pub codepage: Option<String>,
    /// What to do with characters the encoding cannot represent
    pub error_policy: EncodeErrorPolicy,
    pub limits: IOLimits,
}

impl Default for PatchConfig {
    fn default() -> Self {
        Self {
            analysis: AnalysisConfig::default(),
            encoding: None,
            codepage: None,
            error_policy: EncodeErrorPolicy::Strict,
            limits: IOLimits::default(),
        }
    }
}

impl PatchConfig {
    /// Codec translations are written in.
    ///
    /// An explicit `encoding` must resolve. Otherwise the glyph codepage is
    /// used when it names a text codec, and cp437 when it does not: a
    /// codepage without a codec only loses its glyph remap, not the run.
    pub fn translation_codec(&self) -> Result<TextCodec> {
        if let Some(encoding) = self.encoding.as_deref().filter(|name| !name.is_empty()) {
            return TextCodec::for_name(encoding);
        }
        if let Some(codepage) = self.codepage.as_deref().filter(|name| !name.is_empty()) {
            match TextCodec::for_name(codepage) {
                Ok(codec) => return Ok(codec),
                Err(e) => warn!(
                    %codepage,
                    error = %e,
                    "Codepage has no text codec, encoding translations as {NATIVE_CODEPAGE}"
                ),
            }
        }
        Ok(TextCodec::native())
    }
}

fn remap_glyphs(target: &mut PatchTarget, image: &PeImage, cfg: &PatchConfig) -> Result<CharmapOutcome> {
    let section = image.section(cfg.analysis.data_section)?;
    fix_unicode_table(&mut target.writer(), section, cfg.codepage.as_deref())
}

/// Remap only the glyph table of the executable at `path`.
pub fn patch_charmap_file(path: &Path, cfg: &PatchConfig) -> Result<CharmapOutcome> {
    let _span = span_trace!("patch_charmap", path = %path.display()).entered();
    let mut target = PatchTarget::open(path, &cfg.limits)?;
    let image = PeImage::parse(target.bytes())?;
    let outcome = remap_glyphs(&mut target, &image, cfg)?;
    target.flush()?;
    Ok(outcome)
}

/// Patch the executable at `path` in place: glyph table, then strings.
pub fn run_on_file(path: &Path, dictionary: &TranslationDictionary, cfg: &PatchConfig) -> Result<PatchReport> {
    let _span = span_trace!("patch", path = %path.display()).entered();
    let mut target = PatchTarget::open(path, &cfg.limits)?;
    let mut image = PeImage::parse(target.bytes())?;

    let charmap = remap_glyphs(&mut target, &image, cfg)?;
    if matches!(charmap, CharmapOutcome::Patched { .. }) {
        // string extraction must see the section as it is now
        image = PeImage::parse(target.bytes())?;
    }

    let mut report = patch_strings(&image, dictionary, cfg, &mut target.writer())?;
    report.charmap = Some(charmap);
    target.flush()?;
    info!(path = %target.path().display(), patched = report.patched(), "Done");
    Ok(report)
}
