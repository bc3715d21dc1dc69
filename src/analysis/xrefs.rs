//! Relative cross-reference resolution.
//!
//! Every byte position of the code buffer is read as a signed 32-bit
//! displacement relative to the end of the 4-byte field, the way x64
//! RIP-relative operands work. Positions whose displacement lands on a
//! target address are recorded as references. There is no disassembly, so
//! coincidental matches inside other instructions are possible; overlapping
//! references are reported by `find_intersected_cross_references`.

use crate::core::address::Rva;
use crate::core::binio::ReadExt;
use rayon::prelude::*;
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};
use std::ops::Range;
use tracing::debug;

/// Size of a displacement field in bytes.
pub const REFERENCE_SIZE: usize = 4;

/// Destination → source positions, sources in ascending order.
pub type CrossReferenceTable = BTreeMap<Rva, Vec<Rva>>;

/// Source position → destination.
pub type InvertedReferenceTable = BTreeMap<Rva, Rva>;

// below this many bytes a sequential scan is faster than fanning out
const PAR_THRESHOLD: usize = 1 << 16;
const CHUNK_SIZE: usize = 1 << 16;

/// Membership test for the resolver's target addresses.
pub trait AddressSet {
    fn contains_rva(&self, rva: Rva) -> bool;

    /// Number of addresses in the set, when cheap to know.
    fn size_hint(&self) -> Option<usize> {
        None
    }
}

impl AddressSet for HashSet<Rva> {
    fn contains_rva(&self, rva: Rva) -> bool {
        self.contains(&rva)
    }

    fn size_hint(&self) -> Option<usize> {
        Some(self.len())
    }
}

impl AddressSet for BTreeSet<Rva> {
    fn contains_rva(&self, rva: Rva) -> bool {
        self.contains(&rva)
    }

    fn size_hint(&self) -> Option<usize> {
        Some(self.len())
    }
}

impl<V> AddressSet for HashMap<Rva, V> {
    fn contains_rva(&self, rva: Rva) -> bool {
        self.contains_key(&rva)
    }

    fn size_hint(&self) -> Option<usize> {
        Some(self.len())
    }
}

impl<V> AddressSet for BTreeMap<Rva, V> {
    fn contains_rva(&self, rva: Rva) -> bool {
        self.contains_key(&rva)
    }

    fn size_hint(&self) -> Option<usize> {
        Some(self.len())
    }
}

/// A contiguous address range, tested without materializing it.
impl AddressSet for Range<Rva> {
    fn contains_rva(&self, rva: Rva) -> bool {
        self.contains(&rva)
    }

    fn size_hint(&self) -> Option<usize> {
        usize::try_from(self.end.value().saturating_sub(self.start.value())).ok()
    }
}

/// Where a displacement `disp` stored at `base + pos` points.
#[inline]
pub fn resolve_displacement(base: Rva, pos: usize, disp: i32) -> Option<Rva> {
    let dest = base.value() as i128 + pos as i128 + REFERENCE_SIZE as i128 + disp as i128;
    u64::try_from(dest).ok().map(Rva)
}

fn scan_positions<S>(bytes: &[u8], base: Rva, positions: Range<usize>, targets: &S) -> Vec<(Rva, Rva)>
where
    S: AddressSet + ?Sized,
{
    let mut hits = Vec::new();
    for pos in positions {
        let Some(disp) = bytes.read_i32_le_at(pos) else {
            break;
        };
        let Some(dest) = resolve_displacement(base, pos, disp) else {
            continue;
        };
        if targets.contains_rva(dest) {
            hits.push((dest, base + pos as u64));
        }
    }
    hits
}

/// Find every position in `bytes` whose relative displacement resolves to
/// one of `targets`.
///
/// Large buffers are scanned in parallel chunks; chunk results are merged in
/// position order, so each reference list stays sorted.
pub fn find_relative_cross_references<S>(bytes: &[u8], base: Rva, targets: &S) -> CrossReferenceTable
where
    S: AddressSet + Sync + ?Sized,
{
    let positions = bytes.len().saturating_sub(REFERENCE_SIZE - 1);
    let hits: Vec<(Rva, Rva)> = if bytes.len() >= PAR_THRESHOLD {
        let starts: Vec<usize> = (0..positions).step_by(CHUNK_SIZE).collect();
        starts
            .into_par_iter()
            .map(|start| {
                let end = (start + CHUNK_SIZE).min(positions);
                scan_positions(bytes, base, start..end, targets)
            })
            .collect::<Vec<_>>()
            .into_iter()
            .flatten()
            .collect()
    } else {
        scan_positions(bytes, base, 0..positions, targets)
    };

    let mut table = CrossReferenceTable::new();
    for (dest, source) in hits {
        table.entry(dest).or_default().push(source);
    }
    debug!(
        targets = targets.size_hint(),
        destinations = table.len(),
        "Relative cross references resolved"
    );
    table
}

/// Invert `{destination: [source]}` into `{source: destination}`.
///
/// A source recorded under two destinations keeps the later one.
pub fn invert_cross_reference_table(table: &CrossReferenceTable) -> InvertedReferenceTable {
    let mut inverted = InvertedReferenceTable::new();
    for (&dest, sources) in table {
        for &source in sources {
            inverted.insert(source, dest);
        }
    }
    inverted
}

/// Total number of references in the table.
pub fn reference_count(table: &CrossReferenceTable) -> usize {
    table.values().map(Vec::len).sum()
}

/// Pairs of references whose 4-byte fields overlap.
///
/// All sources are sorted; each one is paired with every following source
/// less than `REFERENCE_SIZE` bytes after it. At least one reference of each
/// pair is spurious; which one is left to the operator.
pub fn find_intersected_cross_references(table: &CrossReferenceTable) -> Vec<(Rva, Rva)> {
    let mut references: Vec<Rva> = table.values().flatten().copied().collect();
    references.sort_unstable();

    let mut pairs = Vec::new();
    for (i, &item) in references.iter().enumerate() {
        for &other in &references[i + 1..] {
            if other - item >= REFERENCE_SIZE as u64 {
                break;
            }
            pairs.push((item, other));
        }
    }
    pairs
}
