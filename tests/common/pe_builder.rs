//! Minimal PE32+ images for tests.
//!
//! Only the parts the section reader looks at are filled in: DOS header,
//! file header, the optional header magic/image base/directory count and
//! the section table. Sections are laid out on 0x200 file alignment.

const FILE_ALIGNMENT: usize = 0x200;
const E_LFANEW: usize = 0x40;
const OPTIONAL_HEADER_SIZE: usize = 240;

pub struct PeBuilder {
    image_base: u64,
    sections: Vec<(String, u32, Vec<u8>)>,
}

/// Where a section ended up in the built file.
#[derive(Debug, Clone, Copy)]
pub struct SectionLayout {
    pub rva: u32,
    pub file_offset: usize,
    pub size: usize,
}

fn align_up(value: usize, align: usize) -> usize {
    value.div_ceil(align) * align
}

fn put_u16(buf: &mut [u8], at: usize, value: u16) {
    buf[at..at + 2].copy_from_slice(&value.to_le_bytes());
}

fn put_u32(buf: &mut [u8], at: usize, value: u32) {
    buf[at..at + 4].copy_from_slice(&value.to_le_bytes());
}

impl PeBuilder {
    pub fn new(image_base: u64) -> Self {
        Self {
            image_base,
            sections: Vec::new(),
        }
    }

    pub fn section(mut self, name: &str, rva: u32, data: Vec<u8>) -> Self {
        self.sections.push((name.to_string(), rva, data));
        self
    }

    pub fn build(&self) -> (Vec<u8>, Vec<SectionLayout>) {
        let table_offset = E_LFANEW + 4 + 20 + OPTIONAL_HEADER_SIZE;
        let headers_end = align_up(table_offset + 40 * self.sections.len(), FILE_ALIGNMENT);

        let mut layouts = Vec::new();
        let mut cursor = headers_end;
        for (_, rva, data) in &self.sections {
            let size = align_up(data.len().max(1), FILE_ALIGNMENT);
            layouts.push(SectionLayout {
                rva: *rva,
                file_offset: cursor,
                size,
            });
            cursor += size;
        }

        let mut file = vec![0u8; cursor];
        // DOS header
        file[0..2].copy_from_slice(b"MZ");
        put_u32(&mut file, 0x3C, E_LFANEW as u32);

        // NT signature and file header
        file[E_LFANEW..E_LFANEW + 4].copy_from_slice(b"PE\0\0");
        let fh = E_LFANEW + 4;
        put_u16(&mut file, fh, 0x8664);
        put_u16(&mut file, fh + 2, self.sections.len() as u16);
        put_u16(&mut file, fh + 16, OPTIONAL_HEADER_SIZE as u16);
        put_u16(&mut file, fh + 18, 0x0022);

        // optional header (PE32+)
        let oh = fh + 20;
        put_u16(&mut file, oh, 0x20B);
        file[oh + 24..oh + 32].copy_from_slice(&self.image_base.to_le_bytes());
        put_u32(&mut file, oh + 32, 0x1000);
        put_u32(&mut file, oh + 36, FILE_ALIGNMENT as u32);
        let image_end = self
            .sections
            .iter()
            .map(|(_, rva, data)| align_up(*rva as usize + data.len(), 0x1000))
            .max()
            .unwrap_or(0x1000);
        put_u32(&mut file, oh + 56, image_end as u32);
        put_u32(&mut file, oh + 60, headers_end as u32);
        put_u16(&mut file, oh + 68, 3);
        put_u32(&mut file, oh + 108, 16);

        for (i, ((name, rva, data), layout)) in self.sections.iter().zip(&layouts).enumerate() {
            let entry = table_offset + 40 * i;
            let name_bytes = name.as_bytes();
            let n = name_bytes.len().min(8);
            file[entry..entry + n].copy_from_slice(&name_bytes[..n]);
            put_u32(&mut file, entry + 8, layout.size as u32);
            put_u32(&mut file, entry + 12, *rva);
            put_u32(&mut file, entry + 16, layout.size as u32);
            put_u32(&mut file, entry + 20, layout.file_offset as u32);
            put_u32(&mut file, entry + 36, if i == 0 { 0x6000_0020 } else { 0x4000_0040 });
            file[layout.file_offset..layout.file_offset + data.len()].copy_from_slice(data);
        }

        (file, layouts)
    }
}

/// Encode `lea rcx, [rip + disp]` at `at` (relative to the section start at
/// `code_rva`) so that it addresses `target`.
pub fn plant_lea(code: &mut [u8], code_rva: u32, at: usize, target: u32) {
    code[at..at + 3].copy_from_slice(&[0x48, 0x8D, 0x0D]);
    let next = code_rva as i64 + at as i64 + 7;
    let disp = (target as i64 - next) as i32;
    code[at + 3..at + 7].copy_from_slice(&disp.to_le_bytes());
}

/// The glyph table fingerprint followed by the rest of a 256-entry table.
pub fn glyph_table() -> Vec<u8> {
    let mut table = Vec::with_capacity(256 * 4);
    for cp in [0x20u32, 0x263A, 0x263B, 0x2665, 0x2666, 0x2663, 0x2660, 0x2022] {
        table.extend_from_slice(&cp.to_le_bytes());
    }
    table.resize(256 * 4, 0);
    table
}
