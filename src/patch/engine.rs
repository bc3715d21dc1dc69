//! In-place string translation.

use super::report::{PatchReport, ReferenceOverlap, StringOutcome};
use super::PatchConfig;
use crate::analysis::xrefs::{
    find_intersected_cross_references, find_relative_cross_references, invert_cross_reference_table,
    reference_count,
};
use crate::core::address::Rva;
use crate::core::binio::{write_string, ReadExt};
use crate::dictionary::TranslationDictionary;
use crate::error::{PatchError, Result};
use crate::formats::pe::PeImage;
use crate::span_trace;
use crate::strings::extract_strings_from_raw_bytes;
use std::collections::BTreeMap;
use std::io::{Seek, Write};
use tracing::{debug, info, warn};

/// Translate the referenced strings of `image`, writing through `out`.
///
/// `out` must address the same file `image` was parsed from. A translation
/// replaces the original bytes and is NUL-padded to the original allocation
/// (string length plus terminator), so nothing outside a string's own bytes
/// is ever touched. Translations that do not fit are skipped and reported.
pub fn patch_strings<W: Write + Seek>(
    image: &PeImage,
    dictionary: &TranslationDictionary,
    cfg: &PatchConfig,
    out: &mut W,
) -> Result<PatchReport> {
    let _span = span_trace!("patch_strings", entries = dictionary.len()).entered();
    let code = image.section(cfg.analysis.code_section)?;
    let data = image.section(cfg.analysis.data_section)?;

    info!("Extracting strings...");
    let strings: BTreeMap<Rva, String> =
        extract_strings_from_raw_bytes(&data.data, data.virtual_address, &cfg.analysis.strings)?
            .map(|s| (s.address, s.text))
            .collect();
    info!(count = strings.len(), "Found string-like objects");

    info!("Searching for cross references...");
    let xrefs = find_relative_cross_references(&code.data, code.virtual_address, &strings);
    let object_by_reference = invert_cross_reference_table(&xrefs);
    let total_references = reference_count(&xrefs);
    info!(count = xrefs.len(), "Found objects with references from code section");
    info!(count = total_references, "In total cross references");

    info!("Searching intersections in the cross references...");
    let mut overlaps = Vec::new();
    for (first, second) in find_intersected_cross_references(&xrefs) {
        let (Some(&first_target), Some(&second_target)) =
            (object_by_reference.get(&first), object_by_reference.get(&second))
        else {
            continue;
        };
        info!(
            "{first} (to {first_target} {:?}) / {second} (to {second_target} {:?})",
            strings.get(&first_target).map_or("", String::as_str),
            strings.get(&second_target).map_or("", String::as_str),
        );
        overlaps.push(ReferenceOverlap {
            first,
            first_target,
            second,
            second_target,
        });
    }

    let codec = cfg.translation_codec()?;
    debug!(encoding = codec.name(), "Translation encoding");

    let mut outcomes = Vec::new();
    for (&rva, original) in &strings {
        if xrefs.get(&rva).map_or(true, Vec::is_empty) {
            continue;
        }
        let Some(translation) = dictionary.get(original) else {
            continue;
        };

        let encoded = match codec.encode(translation, cfg.error_policy) {
            Ok(bytes) => bytes,
            Err(PatchError::UnencodableText { encoding, .. }) => {
                warn!(%rva, original, translation, %encoding, "Translation cannot be encoded, skipping");
                outcomes.push(StringOutcome::Unencodable {
                    rva,
                    original: original.clone(),
                    translation: translation.to_string(),
                    encoding,
                });
                continue;
            }
            Err(e) => return Err(e),
        };

        let original_len = data
            .bytes_from(rva)
            .and_then(|tail| tail.read_cstring_bytes_at(0))
            .map(<[u8]>::len)
            .ok_or(PatchError::AddressOutOfRange { rva })?;

        if encoded.len() > original_len {
            warn!(
                %rva,
                original,
                translation,
                "Translation is longer than the original string, skipping"
            );
            outcomes.push(StringOutcome::TooLong {
                rva,
                original: original.clone(),
                translation: translation.to_string(),
                original_len,
                translated_len: encoded.len(),
            });
            continue;
        }

        let offset = data
            .rva_to_offset(rva)
            .ok_or(PatchError::AddressOutOfRange { rva })?;
        write_string(out, offset, &encoded, original_len + 1)?;
        debug!(%rva, %offset, original, translation, "Patched string");
        outcomes.push(StringOutcome::Patched {
            rva,
            offset,
            original: original.clone(),
            translation: translation.to_string(),
        });
    }

    let report = PatchReport {
        strings_found: strings.len(),
        referenced_strings: xrefs.len(),
        total_references,
        overlaps,
        outcomes,
        charmap: None,
    };
    info!(
        patched = report.patched(),
        skipped = report.skipped(),
        "String patching finished"
    );
    Ok(report)
}
