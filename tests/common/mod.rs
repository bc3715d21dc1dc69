//! Common test utilities and helpers.
//!
//! Integration tests build their executables in memory with `pe_builder`
//! instead of shipping binaries.

#![allow(dead_code)]

pub mod pe_builder;

use pe_builder::{glyph_table, plant_lea, PeBuilder, SectionLayout};
use std::fs;
use std::path::{Path, PathBuf};

pub const IMAGE_BASE: u64 = 0x1_4000_0000;
pub const TEXT_RVA: u32 = 0x1000;
pub const RDATA_RVA: u32 = 0x2000;

pub const HELLO_RVA: u32 = 0x2000;
pub const QUIT_RVA: u32 = 0x200C;
pub const UNUSED_RVA: u32 = 0x2014;
pub const CONTINUE_RVA: u32 = 0x2020;
pub const GLYPH_TABLE_RVA: u32 = 0x2100;

/// A two-section executable with known strings and references.
pub struct Sample {
    pub bytes: Vec<u8>,
    pub text: SectionLayout,
    pub rdata: SectionLayout,
}

impl Sample {
    /// File offset of an RVA inside `.rdata`.
    pub fn rdata_offset(&self, rva: u32) -> usize {
        self.rdata.file_offset + (rva - self.rdata.rva) as usize
    }

    pub fn write_to(&self, dir: &Path, name: &str) -> PathBuf {
        let path = dir.join(name);
        fs::write(&path, &self.bytes).unwrap();
        path
    }
}

/// Code layout:
///
/// ```text
/// 0x1000 lea rcx, "Hello world"     ; subroutine 0x1000..0x100f
/// 0x1007 lea rcx, "Quit"
/// 0x100e ret
/// 0x100f int3 x5
/// 0x1014 lea rcx, "Continue"        ; subroutine 0x1014..0x1023
/// 0x101b lea rcx, "Hello world"
/// 0x1022 ret
/// 0x1023 int3 ...
/// ```
pub fn sample_executable() -> Sample {
    let mut code = vec![0xCCu8; 0x40];
    plant_lea(&mut code, TEXT_RVA, 0x00, HELLO_RVA);
    plant_lea(&mut code, TEXT_RVA, 0x07, QUIT_RVA);
    code[0x0E] = 0xC3;
    plant_lea(&mut code, TEXT_RVA, 0x14, CONTINUE_RVA);
    plant_lea(&mut code, TEXT_RVA, 0x1B, HELLO_RVA);
    code[0x22] = 0xC3;

    let mut data = Vec::new();
    data.extend_from_slice(b"Hello world\0");
    data.extend_from_slice(b"Quit\0\0\0\0");
    data.extend_from_slice(b"Unused text\0");
    data.extend_from_slice(b"Continue\0\0\0\0");
    data.resize((GLYPH_TABLE_RVA - RDATA_RVA) as usize, 0);
    data.extend_from_slice(&glyph_table());

    let (bytes, layouts) = PeBuilder::new(IMAGE_BASE)
        .section(".text", TEXT_RVA, code)
        .section(".rdata", RDATA_RVA, data)
        .build();
    Sample {
        bytes,
        text: layouts[0],
        rdata: layouts[1],
    }
}

/// Write a dictionary file in the escaped CSV form the loader expects.
pub fn write_dictionary(dir: &Path, rows: &[(&str, &str)]) -> PathBuf {
    let path = dir.join("dict.csv");
    let mut writer = csv::WriterBuilder::new()
        .quote_style(csv::QuoteStyle::Always)
        .from_path(&path)
        .unwrap();
    for (source, translation) in rows {
        let escape = |s: &str| s.replace('\r', "\\r").replace('\t', "\\t");
        writer.write_record([escape(source), escape(translation)]).unwrap();
    }
    writer.flush().unwrap();
    path
}

/// The NUL-terminated bytes at `offset`.
pub fn cstring_at(bytes: &[u8], offset: usize) -> &[u8] {
    let len = bytes[offset..].iter().position(|&b| b == 0).unwrap();
    &bytes[offset..offset + len]
}
