//! Section access for PE images.
//!
//! This is the only place that knows about the container format. It hands
//! the rest of the crate plain `SectionView`s: a start RVA, the raw bytes
//! and where those bytes live in the file.

use crate::core::address::{Offset, Rva};
use crate::error::{PatchError, Result};
use bytes::Bytes;
use object::read::{Object, ObjectSection};
use tracing::debug;

/// One section's raw data and its RVA ↔ file offset mapping.
#[derive(Debug, Clone)]
pub struct SectionView {
    pub name: String,
    /// RVA of the first byte of `data`
    pub virtual_address: Rva,
    /// Raw bytes as stored in the file
    pub data: Bytes,
    /// File offset of the first byte of `data`
    pub file_offset: Offset,
}

impl SectionView {
    pub fn new(
        name: impl Into<String>,
        virtual_address: Rva,
        data: impl Into<Bytes>,
        file_offset: Offset,
    ) -> Self {
        Self {
            name: name.into(),
            virtual_address,
            data: data.into(),
            file_offset,
        }
    }

    /// Whether `rva` falls inside the section's raw data.
    #[inline]
    pub fn contains_rva(&self, rva: Rva) -> bool {
        rva.offset_from(self.virtual_address)
            .is_some_and(|delta| delta < self.data.len() as u64)
    }

    /// Map an RVA inside this section to its file offset.
    pub fn rva_to_offset(&self, rva: Rva) -> Option<Offset> {
        if !self.contains_rva(rva) {
            return None;
        }
        let delta = rva.offset_from(self.virtual_address)?;
        self.file_offset.checked_add(delta)
    }

    /// Section bytes from `rva` to the end of the section.
    pub fn bytes_from(&self, rva: Rva) -> Option<&[u8]> {
        if !self.contains_rva(rva) {
            return None;
        }
        let delta = rva.offset_from(self.virtual_address)? as usize;
        self.data.get(delta..)
    }
}

/// The sections of a PE image, in section table order.
#[derive(Debug, Clone)]
pub struct PeImage {
    image_base: u64,
    sections: Vec<SectionView>,
}

impl PeImage {
    /// Parse section headers and copy out each section's raw data.
    pub fn parse(data: &[u8]) -> Result<Self> {
        let obj = object::read::File::parse(data)?;
        if obj.format() != object::BinaryFormat::Pe {
            return Err(PatchError::InvalidFormat(format!(
                "expected a PE image, found {:?}",
                obj.format()
            )));
        }

        let image_base = obj.relative_address_base();
        let mut sections = Vec::new();
        for sec in obj.sections() {
            let name = sec.name().unwrap_or("").to_string();
            let rva = Rva(sec.address().saturating_sub(image_base));
            let (file_offset, raw) = match sec.file_range() {
                Some((offset, _)) => (Offset(offset), sec.data()?),
                // uninitialized data has no file bytes
                None => (Offset(0), &[][..]),
            };
            debug!(
                section = %name,
                rva = %rva,
                offset = %file_offset,
                size = raw.len(),
                "Section"
            );
            sections.push(SectionView::new(name, rva, Bytes::copy_from_slice(raw), file_offset));
        }

        Ok(Self { image_base, sections })
    }

    /// Assemble an image from already-extracted sections.
    pub fn from_sections(image_base: u64, sections: Vec<SectionView>) -> Self {
        Self { image_base, sections }
    }

    pub fn image_base(&self) -> u64 {
        self.image_base
    }

    pub fn sections(&self) -> &[SectionView] {
        &self.sections
    }

    /// Section by position in the section table.
    pub fn section(&self, index: usize) -> Result<&SectionView> {
        self.sections.get(index).ok_or(PatchError::SectionNotFound {
            index,
            count: self.sections.len(),
        })
    }

    /// Map an RVA to a file offset through whichever section contains it.
    pub fn rva_to_offset(&self, rva: Rva) -> Option<Offset> {
        self.sections.iter().find_map(|s| s.rva_to_offset(rva))
    }
}
