//! Loosely-structured tabular input: a header row plus string cells.

use std::collections::HashSet;
use std::io::Read;

use csv::{ReaderBuilder, Trim};

use crate::error::{PipelineError, Result};

/// One raw input table as read from a source, before any reconciliation.
///
/// Every row has exactly `headers.len()` cells and header names are unique:
/// a repeated name gets a `.1`, `.2`, … suffix.
#[derive(Debug, Clone, PartialEq)]
pub struct RawTable {
    pub source: String,
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl RawTable {
    /// Builds a table from in-memory rows, padding or truncating rows to the header width.
    pub fn new(source: impl Into<String>, headers: Vec<String>, rows: Vec<Vec<String>>) -> Self {
        let headers = dedupe_headers(headers);
        let width = headers.len();
        let rows = rows
            .into_iter()
            .map(|mut row| {
                row.resize(width, String::new());
                row
            })
            .collect();

        Self {
            source: source.into(),
            headers,
            rows,
        }
    }

    /// Parses comma-delimited text with a mandatory header row.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::MalformedInput`] when the header row is missing,
    /// a row has more cells than the header, or the bytes are not valid UTF-8.
    /// Short rows are padded with empty cells.
    pub fn from_reader<R: Read>(source: &str, reader: R) -> Result<Self> {
        let mut rdr = ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .trim(Trim::Headers)
            .from_reader(reader);

        let headers: Vec<String> = rdr
            .headers()
            .map_err(|e| PipelineError::malformed(source, e))?
            .iter()
            .enumerate()
            .map(|(i, h)| {
                if i == 0 {
                    h.trim_start_matches('\u{feff}').trim().to_string()
                } else {
                    h.to_string()
                }
            })
            .collect();

        if headers.iter().all(|h| h.is_empty()) {
            return Err(PipelineError::malformed(source, "missing header row"));
        }

        let width = headers.len();
        let mut rows = Vec::new();
        for record in rdr.records() {
            let record = record.map_err(|e| PipelineError::malformed(source, e))?;
            if record.len() > width {
                let line = record.position().map_or(0, |p| p.line());
                return Err(PipelineError::malformed(
                    source,
                    format!(
                        "line {line} has {} fields, header has {width}",
                        record.len()
                    ),
                ));
            }
            let mut row: Vec<String> = record.iter().map(str::to_string).collect();
            row.resize(width, String::new());
            rows.push(row);
        }

        Ok(Self {
            source: source.to_string(),
            headers: dedupe_headers(headers),
            rows,
        })
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == name)
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.column_index(name).is_some()
    }

    pub(crate) fn rename_column(&mut self, index: usize, name: &str) {
        self.headers[index] = name.to_string();
    }

    /// Appends a column with the same value in every row.
    pub(crate) fn push_constant_column(&mut self, name: &str, value: &str) {
        self.headers.push(name.to_string());
        for row in &mut self.rows {
            row.push(value.to_string());
        }
    }

    /// Cell at `(row, column)`, if both exist.
    pub fn cell(&self, row: usize, column: usize) -> Option<&str> {
        self.rows
            .get(row)
            .and_then(|r| r.get(column))
            .map(String::as_str)
    }
}

/// Suffixes repeated header names with `.1`, `.2`, … so no column shadows another.
fn dedupe_headers(headers: Vec<String>) -> Vec<String> {
    let original: HashSet<String> = headers.iter().cloned().collect();
    let mut seen = HashSet::with_capacity(headers.len());
    headers
        .into_iter()
        .map(|name| {
            if seen.insert(name.clone()) {
                return name;
            }
            let mut n = 1;
            loop {
                let candidate = format!("{name}.{n}");
                if !original.contains(&candidate) && seen.insert(candidate.clone()) {
                    return candidate;
                }
                n += 1;
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_reader_reads_headers_and_rows() {
        let data = "Location, dBm ,Download_Mbps\nA,-80,12.5\nB,-100,\n";
        let table = RawTable::from_reader("mem", data.as_bytes()).unwrap();

        assert_eq!(table.headers, vec!["Location", "dBm", "Download_Mbps"]);
        assert_eq!(table.len(), 2);
        assert_eq!(table.cell(1, 2), Some(""));
        assert_eq!(table.source, "mem");
    }

    #[test]
    fn test_from_reader_strips_bom() {
        let data = "\u{feff}Location,Signal_dBm\nA,-80\n";
        let table = RawTable::from_reader("bom", data.as_bytes()).unwrap();
        assert_eq!(table.headers[0], "Location");
    }

    #[test]
    fn test_header_only_table_is_empty_not_malformed() {
        let table = RawTable::from_reader("hdr", "Location,Signal_dBm\n".as_bytes()).unwrap();
        assert!(table.is_empty());
        assert_eq!(table.headers.len(), 2);
    }

    #[test]
    fn test_short_rows_are_padded() {
        let data = "Location,Signal_dBm,Download_Mbps,Network_Type\nA,-80,10,4G\nB,-90,5,5G\nC,-100,1\n";
        let table = RawTable::from_reader("short.csv", data.as_bytes()).unwrap();

        assert_eq!(table.len(), 3);
        assert_eq!(table.rows[2], vec!["C", "-100", "1", ""]);
    }

    #[test]
    fn test_repeated_headers_get_suffixes() {
        let data = "Location,Signal_dBm,Note,Note,Location\nA,-80,first,second,B\n";
        let table = RawTable::from_reader("dup.csv", data.as_bytes()).unwrap();

        assert_eq!(
            table.headers,
            vec!["Location", "Signal_dBm", "Note", "Note.1", "Location.1"]
        );
        assert_eq!(table.cell(0, 2), Some("first"));
        assert_eq!(table.cell(0, 3), Some("second"));
    }

    #[test]
    fn test_header_suffix_skips_existing_names() {
        let table = RawTable::new(
            "mem",
            vec!["Note".into(), "Note".into(), "Note.1".into()],
            vec![],
        );
        assert_eq!(table.headers, vec!["Note", "Note.2", "Note.1"]);
    }

    #[test]
    fn test_long_rows_are_malformed() {
        let data = "Location,Signal_dBm\nA,-80,extra\n";
        let err = RawTable::from_reader("ragged.csv", data.as_bytes()).unwrap_err();
        assert!(matches!(err, PipelineError::MalformedInput { ref path, .. } if path == "ragged.csv"));
    }

    #[test]
    fn test_empty_input_is_malformed() {
        let err = RawTable::from_reader("empty.csv", "".as_bytes()).unwrap_err();
        assert!(matches!(err, PipelineError::MalformedInput { .. }));
    }

    #[test]
    fn test_new_pads_short_rows() {
        let table = RawTable::new(
            "mem",
            vec!["Location".into(), "Signal_dBm".into()],
            vec![vec!["A".into()]],
        );
        assert_eq!(table.rows[0], vec!["A".to_string(), String::new()]);
    }

    #[test]
    fn test_push_constant_column() {
        let mut table = RawTable::new("mem", vec!["Location".into()], vec![vec!["A".into()]]);
        table.push_constant_column("Latency_ms", "0");
        assert_eq!(table.column_index("Latency_ms"), Some(1));
        assert_eq!(table.cell(0, 1), Some("0"));
    }
}
