//! Single-byte text codecs resolved by codepage name.
//!
//! The program's native codepage (cp437) is not part of the WHATWG set that
//! `encoding_rs` implements, so its table lives here. Single-byte WHATWG
//! encodings are delegated to `encoding_rs` and the remaining DOS codepages
//! (cp850, cp852, ...) come from the `oem_cp` registry.

use crate::charmap::encoder::CharmapEncoder;
use crate::charmap::tables;
use crate::error::{PatchError, Result};
use encoding_rs::Encoding;
use oem_cp::code_table::DECODING_TABLE_CP_MAP;
use oem_cp::code_table_type::TableType;
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::sync::Arc;

/// Name of the program's native codepage.
pub const NATIVE_CODEPAGE: &str = "cp437";

/// cp437 code points for bytes 0x80..=0xFF. 0x00..=0x7F decode as ASCII.
#[rustfmt::skip]
const CP437_HIGH: [char; 128] = [
    '\u{00C7}', '\u{00FC}', '\u{00E9}', '\u{00E2}', '\u{00E4}', '\u{00E0}', '\u{00E5}', '\u{00E7}',
    '\u{00EA}', '\u{00EB}', '\u{00E8}', '\u{00EF}', '\u{00EE}', '\u{00EC}', '\u{00C4}', '\u{00C5}',
    '\u{00C9}', '\u{00E6}', '\u{00C6}', '\u{00F4}', '\u{00F6}', '\u{00F2}', '\u{00FB}', '\u{00F9}',
    '\u{00FF}', '\u{00D6}', '\u{00DC}', '\u{00A2}', '\u{00A3}', '\u{00A5}', '\u{20A7}', '\u{0192}',
    '\u{00E1}', '\u{00ED}', '\u{00F3}', '\u{00FA}', '\u{00F1}', '\u{00D1}', '\u{00AA}', '\u{00BA}',
    '\u{00BF}', '\u{2310}', '\u{00AC}', '\u{00BD}', '\u{00BC}', '\u{00A1}', '\u{00AB}', '\u{00BB}',
    '\u{2591}', '\u{2592}', '\u{2593}', '\u{2502}', '\u{2524}', '\u{2561}', '\u{2562}', '\u{2556}',
    '\u{2555}', '\u{2563}', '\u{2551}', '\u{2557}', '\u{255D}', '\u{255C}', '\u{255B}', '\u{2510}',
    '\u{2514}', '\u{2534}', '\u{252C}', '\u{251C}', '\u{2500}', '\u{253C}', '\u{255E}', '\u{255F}',
    '\u{255A}', '\u{2554}', '\u{2569}', '\u{2566}', '\u{2560}', '\u{2550}', '\u{256C}', '\u{2567}',
    '\u{2568}', '\u{2564}', '\u{2565}', '\u{2559}', '\u{2558}', '\u{2552}', '\u{2553}', '\u{256B}',
    '\u{256A}', '\u{2518}', '\u{250C}', '\u{2588}', '\u{2584}', '\u{258C}', '\u{2590}', '\u{2580}',
    '\u{03B1}', '\u{00DF}', '\u{0393}', '\u{03C0}', '\u{03A3}', '\u{03C3}', '\u{00B5}', '\u{03C4}',
    '\u{03A6}', '\u{0398}', '\u{03A9}', '\u{03B4}', '\u{221E}', '\u{03C6}', '\u{03B5}', '\u{2229}',
    '\u{2261}', '\u{00B1}', '\u{2265}', '\u{2264}', '\u{2320}', '\u{2321}', '\u{00F7}', '\u{2248}',
    '\u{00B0}', '\u{2219}', '\u{00B7}', '\u{221A}', '\u{207F}', '\u{00B2}', '\u{25A0}', '\u{00A0}',
];

/// What to do with characters the codec cannot represent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EncodeErrorPolicy {
    /// Fail the whole encode.
    #[default]
    Strict,
    /// Substitute `?` for each unencodable character.
    Replace,
}

/// Upper half of a DOS codepage from the `oem_cp` registry.
#[derive(Debug)]
pub struct OemCodepage {
    name: String,
    high: [Option<char>; 128],
}

impl OemCodepage {
    /// Look up codepage `code`; `None` if the registry does not have it.
    pub fn lookup(code: u16) -> Option<Self> {
        let table = DECODING_TABLE_CP_MAP.get(&code)?;
        let mut high = [None; 128];
        for (i, slot) in high.iter_mut().enumerate() {
            *slot = match table {
                TableType::Complete(chars) => Some(chars[i]),
                TableType::Incomplete(chars) => chars[i],
            };
        }
        Some(Self {
            name: format!("cp{code}"),
            high,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn decode_byte(&self, byte: u8) -> Option<char> {
        if byte < 0x80 {
            Some(byte as char)
        } else {
            self.high[(byte - 0x80) as usize]
        }
    }

    pub fn encode_char(&self, ch: char) -> Option<u8> {
        if ch.is_ascii() {
            return Some(ch as u8);
        }
        self.high
            .iter()
            .position(|&c| c == Some(ch))
            .map(|idx| 0x80 + idx as u8)
    }
}

/// Numeric id of `cpNNN`, `ibmNNN`, `oemNNN` or bare `NNN`.
fn oem_code(name: &str) -> Option<u16> {
    let digits = ["cp", "ibm", "oem"]
        .iter()
        .find_map(|prefix| name.strip_prefix(prefix))
        .unwrap_or(name);
    digits.parse().ok()
}

/// A resolved text codec.
#[derive(Debug, Clone)]
pub enum TextCodec {
    /// IBM PC codepage 437, the native codepage.
    Cp437,
    /// ISO-8859-1: bytes map 1:1 to U+0000..=U+00FF.
    Latin1,
    Utf8,
    /// A single-byte `encoding_rs` encoding.
    SingleByte(&'static Encoding),
    /// A DOS codepage `encoding_rs` does not cover.
    Oem(Arc<OemCodepage>),
    /// A glyph-table encoder with a cp437 fallback.
    Custom {
        name: &'static str,
        encoder: Arc<CharmapEncoder>,
    },
}

/// Map `cpNNN` style names onto WHATWG labels `encoding_rs` understands.
fn whatwg_label(name: &str) -> Cow<'_, str> {
    match name {
        "cp866" | "866" => Cow::Borrowed("ibm866"),
        "cp874" | "874" => Cow::Borrowed("windows-874"),
        _ => match name.strip_prefix("cp") {
            Some(num) if num.starts_with("125") && num.len() == 4 => {
                Cow::Owned(format!("windows-{num}"))
            }
            _ => Cow::Borrowed(name),
        },
    }
}

impl TextCodec {
    /// Resolve a codepage or encoding name.
    pub fn for_name(name: &str) -> Result<Self> {
        let normalized = name.trim().to_ascii_lowercase().replace('_', "-");
        match normalized.as_str() {
            "cp437" | "ibm437" | "437" => return Ok(TextCodec::Cp437),
            // WHATWG maps cp819 to windows-1252; it is ISO-8859-1
            "latin" | "latin1" | "latin-1" | "iso-8859-1" | "iso8859-1" | "l1" | "cp819" | "ibm819" => {
                return Ok(TextCodec::Latin1)
            }
            "utf-8" | "utf8" => return Ok(TextCodec::Utf8),
            _ => {}
        }

        if let Some((name, encoder)) = tables::custom_encoder(&normalized) {
            return Ok(TextCodec::Custom { name, encoder });
        }

        if let Some(encoding) = Encoding::for_label(whatwg_label(&normalized).as_bytes()) {
            if encoding.is_single_byte() {
                return Ok(TextCodec::SingleByte(encoding));
            }
        }

        oem_code(&normalized)
            .and_then(OemCodepage::lookup)
            .map(|cp| TextCodec::Oem(Arc::new(cp)))
            .ok_or_else(|| PatchError::UnknownEncoding(name.to_string()))
    }

    /// The native codepage codec.
    pub fn native() -> Self {
        TextCodec::Cp437
    }

    /// Human-readable codec name.
    pub fn name(&self) -> &str {
        match self {
            TextCodec::Cp437 => NATIVE_CODEPAGE,
            TextCodec::Latin1 => "latin-1",
            TextCodec::Utf8 => "utf-8",
            TextCodec::SingleByte(encoding) => encoding.name(),
            TextCodec::Oem(cp) => cp.name(),
            TextCodec::Custom { name, .. } => name,
        }
    }

    /// Decode a single byte on its own, or `None` if it is not decodable
    /// in isolation under this codec.
    pub fn decode_byte(&self, byte: u8) -> Option<char> {
        match self {
            TextCodec::Cp437 => Some(cp437_char(byte)),
            TextCodec::Custom { encoder, .. } => Some(encoder.decode_byte(byte)),
            TextCodec::Latin1 => Some(byte as char),
            TextCodec::Oem(cp) => cp.decode_byte(byte),
            TextCodec::Utf8 => byte.is_ascii().then_some(byte as char),
            TextCodec::SingleByte(encoding) => encoding
                .decode_without_bom_handling_and_without_replacement(&[byte])
                .and_then(|s| s.chars().next()),
        }
    }

    /// Decode a byte run, or `None` if any part of it is malformed.
    pub fn decode(&self, bytes: &[u8]) -> Option<String> {
        match self {
            TextCodec::Utf8 => std::str::from_utf8(bytes).ok().map(str::to_string),
            TextCodec::SingleByte(encoding) => encoding
                .decode_without_bom_handling_and_without_replacement(bytes)
                .map(Cow::into_owned),
            _ => bytes.iter().map(|&b| self.decode_byte(b)).collect(),
        }
    }

    /// Encode text into bytes.
    pub fn encode(&self, text: &str, policy: EncodeErrorPolicy) -> Result<Vec<u8>> {
        if let TextCodec::Custom { encoder, .. } = self {
            return encoder.encode(text, policy);
        }

        let mut out = Vec::with_capacity(text.len());
        for ch in text.chars() {
            match self.encode_char(ch) {
                Some(bytes) => out.extend_from_slice(&bytes),
                None => match policy {
                    EncodeErrorPolicy::Strict => {
                        return Err(PatchError::UnencodableText {
                            text: text.to_string(),
                            encoding: self.name().to_string(),
                        })
                    }
                    EncodeErrorPolicy::Replace => out.push(b'?'),
                },
            }
        }
        Ok(out)
    }

    fn encode_char(&self, ch: char) -> Option<Vec<u8>> {
        match self {
            TextCodec::Cp437 | TextCodec::Custom { .. } => cp437_byte(ch).map(|b| vec![b]),
            TextCodec::Latin1 => u8::try_from(u32::from(ch)).ok().map(|b| vec![b]),
            TextCodec::Oem(cp) => cp.encode_char(ch).map(|b| vec![b]),
            TextCodec::Utf8 => {
                let mut buf = [0u8; 4];
                Some(ch.encode_utf8(&mut buf).as_bytes().to_vec())
            }
            TextCodec::SingleByte(encoding) => {
                let mut buf = [0u8; 4];
                let (bytes, _, had_errors) = encoding.encode(ch.encode_utf8(&mut buf));
                (!had_errors).then(|| bytes.into_owned())
            }
        }
    }
}

/// Decode one cp437 byte.
#[inline]
pub fn cp437_char(byte: u8) -> char {
    if byte < 0x80 {
        byte as char
    } else {
        CP437_HIGH[(byte - 0x80) as usize]
    }
}

/// Encode one character into cp437.
pub fn cp437_byte(ch: char) -> Option<u8> {
    if ch.is_ascii() {
        return Some(ch as u8);
    }
    CP437_HIGH
        .iter()
        .position(|&c| c == ch)
        .map(|idx| 0x80 + idx as u8)
}
