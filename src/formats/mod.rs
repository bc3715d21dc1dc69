//! Executable container formats.

pub mod pe;

pub use pe::{PeImage, SectionView};
