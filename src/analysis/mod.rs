//! Code-side analysis: references into the data section and the
//! subroutines they live in.
//!
//! Nothing here disassembles. References come from a byte-level scan for
//! relative displacements and subroutines from compiler padding, so both are
//! heuristics; `xrefs::find_intersected_cross_references` and the grouping in
//! `context` exist to let an operator judge the results.

pub mod context;
pub mod subroutines;
pub mod xrefs;

pub use context::{
    extract_strings_grouped_by_subroutines, strings_with_references, write_grouped, StringCrossReference,
};
pub use subroutines::{extract_subroutines, which_subroutine, SegmenterConfig, SubroutineInfo};
pub use xrefs::{
    find_intersected_cross_references, find_relative_cross_references, invert_cross_reference_table,
    AddressSet, CrossReferenceTable, InvertedReferenceTable, REFERENCE_SIZE,
};

use crate::strings::StringExtractConfig;
use serde::{Deserialize, Serialize};

/// Which sections to analyze and how.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Section table index of the machine code
    pub code_section: usize,
    /// Section table index of the initialized data holding the strings
    pub data_section: usize,
    pub strings: StringExtractConfig,
    pub segmenter: SegmenterConfig,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            code_section: 0,
            data_section: 1,
            strings: StringExtractConfig::default(),
            segmenter: SegmenterConfig::default(),
        }
    }
}
