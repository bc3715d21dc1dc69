//! Strings in the context of the code that uses them.

use super::subroutines::{extract_subroutines, which_subroutine};
use super::xrefs::find_relative_cross_references;
use super::AnalysisConfig;
use crate::core::address::Rva;
use crate::error::Result;
use crate::formats::pe::PeImage;
use crate::strings::{extract_strings_from_raw_bytes, ExtractedStringInfo};
use serde::Serialize;
use std::collections::{BTreeMap, HashSet};
use std::io::{self, Write};
use tracing::info;

/// A string and one place in code that refers to it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StringCrossReference {
    pub string: String,
    pub cross_reference: Rva,
}

/// Strings of the data section with the code positions referring to them.
///
/// Strings nothing refers to are left out; the order is the string order in
/// the data section.
pub fn strings_with_references(
    image: &PeImage,
    cfg: &AnalysisConfig,
) -> Result<Vec<(ExtractedStringInfo, Vec<Rva>)>> {
    let code = image.section(cfg.code_section)?;
    let data = image.section(cfg.data_section)?;

    let strings: Vec<ExtractedStringInfo> =
        extract_strings_from_raw_bytes(&data.data, data.virtual_address, &cfg.strings)?.collect();
    let addresses: HashSet<Rva> = strings.iter().map(|s| s.address).collect();
    let mut xrefs = find_relative_cross_references(&code.data, code.virtual_address, &addresses);
    info!(
        strings = strings.len(),
        referenced = xrefs.len(),
        section = %data.name,
        "Strings extracted"
    );

    Ok(strings
        .into_iter()
        .filter_map(|s| {
            let refs = xrefs.remove(&s.address)?;
            Some((s, refs))
        })
        .collect())
}

/// Group referenced strings by the subroutine each reference lies in.
///
/// Keys are subroutine start addresses as virtual addresses (image base
/// added). Each group is sorted by reference address; references outside
/// every subroutine are dropped.
pub fn extract_strings_grouped_by_subroutines(
    image: &PeImage,
    cfg: &AnalysisConfig,
) -> Result<BTreeMap<u64, Vec<StringCrossReference>>> {
    let code = image.section(cfg.code_section)?;
    let subroutines = extract_subroutines(&code.data, code.virtual_address, &cfg.segmenter);
    info!(count = subroutines.len(), "Subroutines found");

    let mut grouped: BTreeMap<u64, Vec<StringCrossReference>> = BTreeMap::new();
    for (info, refs) in strings_with_references(image, cfg)? {
        for xref in refs {
            let Some(sub) = which_subroutine(&subroutines, xref) else {
                continue;
            };
            grouped
                .entry(image.image_base() + sub.start.value())
                .or_default()
                .push(StringCrossReference {
                    string: info.text.clone(),
                    cross_reference: xref,
                });
        }
    }
    for group in grouped.values_mut() {
        group.sort_by_key(|x| x.cross_reference);
    }
    Ok(grouped)
}

/// Render grouped strings as `sub_<addr>:` blocks, one tab-indented string
/// per reference and a blank line after each block.
pub fn write_grouped<W: Write>(out: &mut W, grouped: &BTreeMap<u64, Vec<StringCrossReference>>) -> io::Result<()> {
    for (start, refs) in grouped {
        writeln!(out, "sub_{start:x}:")?;
        for item in refs {
            writeln!(out, "\t{}", item.string)?;
        }
        writeln!(out)?;
    }
    Ok(())
}
