//! Core data types for transpatch.
//!
//! Address newtypes and the little-endian binary helpers every other module
//! builds on.

pub mod address;
pub mod binio;

pub use address::{Offset, Rva};
