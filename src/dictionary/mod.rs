//! Translation dictionaries.
//!
//! Dictionaries are CSV files of `source,translation` rows without a header
//! row. Carriage returns and tabs inside strings are written as the literal
//! escapes `\r` and `\t`, since the strings themselves come from game data
//! where those characters are meaningful.

use crate::error::{PatchError, Result};
use std::collections::HashMap;
use std::fs::File;
use std::io::Read;
use std::path::Path;
use tracing::{debug, info};

/// Undo the `\r` and `\t` escapes of a dictionary cell.
pub fn unescape(cell: &str) -> String {
    cell.replace("\\r", "\r").replace("\\t", "\t")
}

/// Read `(source, translation)` pairs from CSV.
///
/// Columns after the second are ignored. A row with fewer than two columns
/// is an error carrying its line number.
pub fn load_translation_file<R: Read>(reader: R) -> Result<Vec<(String, String)>> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(reader);

    let mut entries = Vec::new();
    for record in csv_reader.records() {
        let record = record.map_err(|e| PatchError::Dictionary {
            line: e.position().map_or(0, |p| p.line()),
            message: e.to_string(),
        })?;
        let line = record.position().map_or(0, |p| p.line());
        match (record.get(0), record.get(1)) {
            (Some(source), Some(translation)) => {
                entries.push((unescape(source), unescape(translation)));
            }
            _ => {
                return Err(PatchError::Dictionary {
                    line,
                    message: format!("expected 2 columns, found {}", record.len()),
                })
            }
        }
    }
    debug!(entries = entries.len(), "Translation file parsed");
    Ok(entries)
}

/// Exact-match lookup from original text to its translation.
#[derive(Debug, Clone, Default)]
pub struct TranslationDictionary {
    map: HashMap<String, String>,
}

impl TranslationDictionary {
    /// Build from pairs; a repeated source keeps its last translation.
    pub fn from_entries<I>(entries: I) -> Self
    where
        I: IntoIterator<Item = (String, String)>,
    {
        Self {
            map: entries.into_iter().collect(),
        }
    }

    /// Load a dictionary file from disk.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        info!(path = %path.display(), "Loading translation file...");
        let file = File::open(path)?;
        let dict = Self::from_entries(load_translation_file(file)?);
        info!(entries = dict.len(), "Translation file loaded");
        Ok(dict)
    }

    /// Translation for `source`. Empty translations count as missing.
    pub fn get(&self, source: &str) -> Option<&str> {
        self.map
            .get(source)
            .map(String::as_str)
            .filter(|t| !t.is_empty())
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }
}

impl FromIterator<(String, String)> for TranslationDictionary {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
        Self::from_entries(iter)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn escape(text: &str) -> String {
        text.replace('\r', "\\r").replace('\t', "\\t")
    }

    #[test]
    fn unescapes_control_sequences() {
        let pairs = vec![
            ("\tsome\rtext".to_string(), "\tкакой-то\rтекст".to_string()),
            ("plain".to_string(), "простой".to_string()),
        ];
        let mut writer = csv::WriterBuilder::new()
            .quote_style(csv::QuoteStyle::Always)
            .from_writer(vec![]);
        for (source, translation) in &pairs {
            writer.write_record([escape(source), escape(translation)]).unwrap();
        }
        let data = writer.into_inner().unwrap();

        assert_eq!(load_translation_file(&data[..]).unwrap(), pairs);
    }

    #[test]
    fn quoted_cells_keep_commas_and_quotes() {
        let data = "\"a, b\",\"say \"\"hi\"\"\"\nx,y,extra\n";
        let entries = load_translation_file(data.as_bytes()).unwrap();
        assert_eq!(
            entries,
            vec![
                ("a, b".to_string(), "say \"hi\"".to_string()),
                ("x".to_string(), "y".to_string()),
            ]
        );
    }

    #[test]
    fn short_row_reports_line() {
        let data = "a,b\nlonely\n";
        match load_translation_file(data.as_bytes()) {
            Err(PatchError::Dictionary { line, .. }) => assert_eq!(line, 2),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn lookups_skip_empty_and_keep_last() {
        let dict = TranslationDictionary::from_entries(vec![
            ("Hello".to_string(), "Hi".to_string()),
            ("Hello".to_string(), "Yo".to_string()),
            ("Bye".to_string(), String::new()),
        ]);
        assert_eq!(dict.get("Hello"), Some("Yo"));
        assert_eq!(dict.get("Bye"), None);
        assert_eq!(dict.get("missing"), None);
        assert_eq!(dict.len(), 2);
    }

    #[test]
    fn empty_file_is_empty_dictionary() {
        assert!(load_translation_file(&b""[..]).unwrap().is_empty());
    }
}
