//! Subroutine segmentation by filler runs.
//!
//! Compilers pad between functions with a breakpoint byte (`0xCC` on x86)
//! so the next function starts aligned. A maximal filler run whose end is
//! aligned is taken as a gap between two subroutines; shorter coincidental
//! runs inside instructions end unaligned often enough to be ignored.

use crate::core::address::Rva;
use serde::{Deserialize, Serialize};

/// Half-open code range `[start, end)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct SubroutineInfo {
    pub start: Rva,
    pub end: Rva,
}

impl SubroutineInfo {
    pub fn new(start: Rva, end: Rva) -> Self {
        Self { start, end }
    }

    #[inline]
    pub fn contains(&self, rva: Rva) -> bool {
        self.start <= rva && rva < self.end
    }

    pub fn len(&self) -> u64 {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start >= self.end
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SegmenterConfig {
    /// Padding byte between subroutines
    pub filler: u8,
    /// A filler run separates subroutines only if it ends on this alignment
    pub alignment: usize,
}

impl Default for SegmenterConfig {
    fn default() -> Self {
        Self {
            filler: 0xCC,
            alignment: 4,
        }
    }
}

/// Split `buf` into subroutines separated by aligned filler runs.
///
/// Filler runs ending unaligned stay inside the surrounding subroutine.
/// Empty ranges (a buffer starting with an aligned filler run, or two
/// adjacent runs) are not emitted.
pub fn extract_subroutines(buf: &[u8], base: Rva, cfg: &SegmenterConfig) -> Vec<SubroutineInfo> {
    let alignment = cfg.alignment.max(1);
    let mut subroutines = Vec::new();
    let mut start = 0usize;
    let mut pos = 0usize;

    while let Some(found) = memchr::memchr(cfg.filler, &buf[pos..]) {
        let run_start = pos + found;
        let run_end = buf[run_start..]
            .iter()
            .position(|&b| b != cfg.filler)
            .map_or(buf.len(), |n| run_start + n);
        pos = run_end;

        if run_end % alignment != 0 {
            continue;
        }
        if start < run_start {
            subroutines.push(SubroutineInfo::new(base + start as u64, base + run_start as u64));
        }
        start = run_end;
        if pos >= buf.len() {
            break;
        }
    }

    if start < buf.len() {
        subroutines.push(SubroutineInfo::new(base + start as u64, base + buf.len() as u64));
    }
    subroutines
}

/// The subroutine whose range contains `address`.
///
/// `subroutines` must be sorted by start and non-overlapping, as
/// `extract_subroutines` returns them.
pub fn which_subroutine(subroutines: &[SubroutineInfo], address: Rva) -> Option<&SubroutineInfo> {
    let index = subroutines.partition_point(|s| s.start <= address);
    let candidate = subroutines.get(index.checked_sub(1)?)?;
    candidate.contains(address).then_some(candidate)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ranges(buf: &[u8]) -> Vec<(u64, u64)> {
        extract_subroutines(buf, Rva(0), &SegmenterConfig::default())
            .into_iter()
            .map(|s| (s.start.value(), s.end.value()))
            .collect()
    }

    #[test]
    fn no_filler_is_one_subroutine() {
        assert_eq!(ranges(&[0x90; 8]), vec![(0, 8)]);
    }

    #[test]
    fn unaligned_run_is_code() {
        assert_eq!(ranges(b"\x90\xCC"), vec![(0, 2)]);
        assert_eq!(ranges(b"\x90\xCC\xCC\x90\x90\x90"), vec![(0, 6)]);
    }

    #[test]
    fn aligned_run_splits() {
        assert_eq!(ranges(b"\x90\xCC\xCC\xCC\x90\x90"), vec![(0, 1), (4, 6)]);
    }

    #[test]
    fn leading_and_trailing_filler() {
        assert_eq!(ranges(b"\xCC\xCC\xCC\xCC\x90\x90\xCC\xCC"), vec![(4, 6)]);
        assert_eq!(ranges(&[0xCC; 8]), Vec::<(u64, u64)>::new());
        assert_eq!(ranges(&[]), Vec::<(u64, u64)>::new());
    }

    #[test]
    fn base_is_added_and_alignment_is_relative_to_buffer() {
        let subs = extract_subroutines(b"\x90\xCC\xCC\xCC\x90\x90", Rva(0x1001), &SegmenterConfig::default());
        assert_eq!(
            subs,
            vec![
                SubroutineInfo::new(Rva(0x1001), Rva(0x1002)),
                SubroutineInfo::new(Rva(0x1005), Rva(0x1007)),
            ]
        );
    }

    #[test]
    fn custom_filler_and_alignment() {
        let cfg = SegmenterConfig {
            filler: 0x00,
            alignment: 16,
        };
        let mut buf = vec![0x90u8; 10];
        buf.extend_from_slice(&[0u8; 6]);
        buf.extend_from_slice(&[0x90u8; 4]);
        let subs = extract_subroutines(&buf, Rva(0), &cfg);
        assert_eq!(
            subs,
            vec![
                SubroutineInfo::new(Rva(0), Rva(10)),
                SubroutineInfo::new(Rva(16), Rva(20)),
            ]
        );
    }

    #[test]
    fn lookup_by_address() {
        let subs = vec![
            SubroutineInfo::new(Rva(0), Rva(1)),
            SubroutineInfo::new(Rva(4), Rva(6)),
            SubroutineInfo::new(Rva(8), Rva(20)),
        ];
        assert_eq!(which_subroutine(&subs, Rva(0)), Some(&subs[0]));
        assert_eq!(which_subroutine(&subs, Rva(5)), Some(&subs[1]));
        assert_eq!(which_subroutine(&subs, Rva(19)), Some(&subs[2]));
        // gaps and past the end
        assert_eq!(which_subroutine(&subs, Rva(2)), None);
        assert_eq!(which_subroutine(&subs, Rva(6)), None);
        assert_eq!(which_subroutine(&subs, Rva(20)), None);

        let shifted = vec![SubroutineInfo::new(Rva(0x100), Rva(0x200))];
        assert_eq!(which_subroutine(&shifted, Rva(0xff)), None);
        assert_eq!(which_subroutine(&[], Rva(0)), None);
    }
}
