//! Codepage tables for the program's glyph table.
//!
//! A `CodepageTable` maps native 8-bit codes to the Unicode code points the
//! patched program should render for them. Tables are either derived (the
//! upper half of a target codepage compared with cp437) or hand-written for
//! scripts that need more than a 1:1 remap of the upper half.

use crate::charmap::codec::{TextCodec, NATIVE_CODEPAGE};
use crate::charmap::encoder::CharmapEncoder;
use once_cell::sync::Lazy;
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, RwLock};
use tracing::debug;

/// Code → code point run. A run of length n covers codes `code..code + n`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CodepageTable {
    entries: BTreeMap<u8, Vec<u32>>,
}

impl CodepageTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert (or replace) the run starting at `code`.
    pub fn insert(&mut self, code: u8, values: Vec<u32>) {
        self.entries.insert(code, values);
    }

    /// Entries in ascending code order.
    pub fn entries(&self) -> impl Iterator<Item = (u8, &[u32])> + '_ {
        self.entries.iter().map(|(&code, values)| (code, values.as_slice()))
    }

    pub fn get(&self, code: u8) -> Option<&[u32]> {
        self.entries.get(&code).map(Vec::as_slice)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Total number of glyph slots the table rewrites.
    pub fn glyph_count(&self) -> usize {
        self.entries.values().map(Vec::len).sum()
    }
}

fn run(first: char, last: char) -> Vec<u32> {
    (u32::from(first)..=u32::from(last)).collect()
}

fn chars(s: &str) -> Vec<u32> {
    s.chars().map(u32::from).collect()
}

fn cp1251_table() -> CodepageTable {
    let mut t = CodepageTable::new();
    t.insert(0xC0, run('А', 'Я'));
    t.insert(0xE0, run('а', 'я'));
    t.insert(0xA8, chars("Ё"));
    t.insert(0xB8, chars("ё"));
    t.insert(0xB2, chars("Іі"));
    t.insert(0xBF, chars("ї"));
    t.insert(0xAA, chars("Є"));
    t.insert(0xBA, chars("є"));
    t.insert(0xA5, chars("Ґ"));
    t.insert(0xB4, chars("ґ"));
    t.insert(0xA2, chars("ў"));
    t
}

fn viscii_table() -> CodepageTable {
    let mut t = CodepageTable::new();
    t.insert(0x02, chars("Ẳ"));
    t.insert(0x05, chars("ẴẪ"));
    t.insert(0x14, chars("Ỷ"));
    t.insert(0x19, chars("Ỹ"));
    t.insert(0x1E, chars("Ỵ"));
    t.insert(0x80, chars("ẠẮẰẶẤẦẨẬẼẸẾỀỂỄỆỐ"));
    t.insert(0x90, chars("ỒỔỖỘỢỚỜỞỊỎỌỈỦŨỤỲ"));
    t.insert(0xA0, chars("Õắằặấầẩậẽẹếềểễệố"));
    t.insert(0xB0, chars("ồổỗỠƠộờởịỰỨỪỬơớƯ"));
    t.insert(0xC0, chars("ÀÁÂÃẢĂẳẵÈÉÊẺÌÍĨỳ"));
    t.insert(0xD0, chars("ĐứÒÓÔạỷừửÙÚỹỵÝỡư"));
    t.insert(0xE0, chars("àáâãảăữẫèéêẻìíĩỉ"));
    t.insert(0xF0, chars("đựòóôõỏọụùúũủýợỮ"));
    t
}

/// Hand-written tables. These take precedence over derived ones.
static CUSTOM_TABLES: Lazy<BTreeMap<&'static str, Arc<CodepageTable>>> = Lazy::new(|| {
    let mut m = BTreeMap::new();
    // native codepage: nothing to remap
    m.insert(NATIVE_CODEPAGE, Arc::new(CodepageTable::new()));
    m.insert("cp1251", Arc::new(cp1251_table()));
    m.insert("viscii", Arc::new(viscii_table()));
    m
});

/// Codepages whose text cannot go through a standard codec.
const CUSTOM_ENCODER_NAMES: &[&str] = &["viscii"];

static CUSTOM_ENCODERS: Lazy<HashMap<&'static str, Arc<CharmapEncoder>>> = Lazy::new(|| {
    CUSTOM_ENCODER_NAMES
        .iter()
        .filter_map(|&name| {
            CUSTOM_TABLES
                .get(name)
                .map(|table| (name, Arc::new(CharmapEncoder::new(table))))
        })
        .collect()
});

/// Derived tables keyed by `native->target`; `None` caches "not implemented".
static TABLE_CACHE: Lazy<RwLock<HashMap<String, Option<Arc<CodepageTable>>>>> =
    Lazy::new(|| RwLock::new(HashMap::new()));

/// Custom encoder for `name`, if the codepage needs one.
pub fn custom_encoder(name: &str) -> Option<(&'static str, Arc<CharmapEncoder>)> {
    CUSTOM_ENCODERS
        .get_key_value(name)
        .map(|(&name, encoder)| (name, Arc::clone(encoder)))
}

/// Names of the hand-written tables.
pub fn custom_codepages() -> impl Iterator<Item = &'static str> {
    CUSTOM_TABLES.keys().copied()
}

/// Derive the remap of codes 0x80..=0xFF from `native` to `target`.
///
/// A code is remapped when the two codecs decode it differently and the
/// target character is alphabetic. Bytes the target cannot decode are
/// skipped. The low half is never touched.
pub fn derive_table(native: &TextCodec, target: &TextCodec) -> CodepageTable {
    let mut table = CodepageTable::new();
    for byte in 0x80u8..=0xFF {
        let Some(target_char) = target.decode_byte(byte) else {
            continue;
        };
        if native.decode_byte(byte) != Some(target_char) && target_char.is_alphabetic() {
            table.insert(byte, vec![u32::from(target_char)]);
        }
    }
    table
}

/// Glyph table for codepage `name`, or `None` if it is not implemented.
///
/// Custom tables are returned as-is; anything else is derived against the
/// native codepage once and cached for the life of the process.
pub fn codepage_table(name: &str) -> Option<Arc<CodepageTable>> {
    let name = name.trim().to_ascii_lowercase();
    if let Some(table) = CUSTOM_TABLES.get(name.as_str()) {
        return Some(Arc::clone(table));
    }

    let key = format!("{NATIVE_CODEPAGE}->{name}");
    if let Some(cached) = TABLE_CACHE
        .read()
        .unwrap_or_else(|e| e.into_inner())
        .get(&key)
    {
        return cached.clone();
    }

    let derived = TextCodec::for_name(&name).ok().map(|target| {
        let table = derive_table(&TextCodec::native(), &target);
        debug!(codepage = %name, entries = table.len(), "Derived codepage table");
        Arc::new(table)
    });

    TABLE_CACHE
        .write()
        .unwrap_or_else(|e| e.into_inner())
        .entry(key)
        .or_insert(derived)
        .clone()
}
