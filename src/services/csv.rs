//! Minimal CSV reading/writing for the bulk import/export paths and the
//! PHC master list. Handles quoted fields, embedded commas, doubled quotes
//! and embedded newlines; anything more exotic is rejected by the callers'
//! header checks.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CsvError {
    #[error("CSV input is empty")]
    Empty,

    #[error("Missing required column: {0}")]
    MissingColumn(String),
}

/// A parsed CSV document: one header row plus data rows.
#[derive(Debug, Clone)]
pub struct CsvTable {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl CsvTable {
    pub fn parse(content: &str) -> Result<Self, CsvError> {
        let mut records = parse_records(content);
        if records.is_empty() {
            return Err(CsvError::Empty);
        }
        let headers = records
            .remove(0)
            .into_iter()
            .map(|h| h.trim().to_string())
            .collect();
        Ok(Self {
            headers,
            rows: records,
        })
    }

    pub fn column(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h.eq_ignore_ascii_case(name))
    }

    pub fn require_column(&self, name: &str) -> Result<usize, CsvError> {
        self.column(name)
            .ok_or_else(|| CsvError::MissingColumn(name.to_string()))
    }

    /// Field value at (row, column), trimmed; empty cells become `None`.
    pub fn value(&self, row: &[String], idx: usize) -> Option<String> {
        row.get(idx)
            .map(|v| v.trim())
            .filter(|v| !v.is_empty())
            .map(|v| v.to_string())
    }
}

/// Splits raw CSV text into records of fields.
fn parse_records(content: &str) -> Vec<Vec<String>> {
    let mut records = Vec::new();
    let mut record: Vec<String> = Vec::new();
    let mut field = String::new();
    let mut in_quotes = false;
    let mut chars = content.chars().peekable();

    while let Some(c) = chars.next() {
        if in_quotes {
            match c {
                '"' => {
                    if chars.peek() == Some(&'"') {
                        chars.next();
                        field.push('"');
                    } else {
                        in_quotes = false;
                    }
                }
                _ => field.push(c),
            }
        } else {
            match c {
                '"' => in_quotes = true,
                ',' => {
                    record.push(std::mem::take(&mut field));
                }
                '\r' => {} // swallowed; records end on \n
                '\n' => {
                    record.push(std::mem::take(&mut field));
                    if !(record.len() == 1 && record[0].is_empty()) {
                        records.push(std::mem::take(&mut record));
                    } else {
                        record.clear();
                    }
                }
                _ => field.push(c),
            }
        }
    }

    // Final record without trailing newline
    if !field.is_empty() || !record.is_empty() {
        record.push(field);
        if !(record.len() == 1 && record[0].is_empty()) {
            records.push(record);
        }
    }

    records
}

/// Quotes a field when needed, doubling embedded quotes.
pub fn escape(s: &str) -> String {
    if s.contains(',') || s.contains('"') || s.contains('\n') {
        format!("\"{}\"", s.replace('"', "\"\""))
    } else {
        s.to_string()
    }
}

/// Joins fields into one CSV line (no trailing newline).
pub fn write_row(fields: &[String]) -> String {
    fields
        .iter()
        .map(|f| escape(f))
        .collect::<Vec<_>>()
        .join(",")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_headers_and_rows() {
        let table = CsvTable::parse("name,mandal_name\nRavi,KUPPAM\nLatha,PUNGANUR\n").unwrap();
        assert_eq!(table.headers, vec!["name", "mandal_name"]);
        assert_eq!(table.rows.len(), 2);
        assert_eq!(table.rows[1], vec!["Latha", "PUNGANUR"]);
    }

    #[test]
    fn handles_quotes_commas_and_embedded_newlines() {
        let table =
            CsvTable::parse("name,address\n\"Rao, K\",\"D.No 4-12,\nNear PHC\"\n").unwrap();
        assert_eq!(table.rows[0][0], "Rao, K");
        assert_eq!(table.rows[0][1], "D.No 4-12,\nNear PHC");
    }

    #[test]
    fn doubled_quotes_unescape() {
        let table = CsvTable::parse("name\n\"K \"\"Babu\"\" Rao\"\n").unwrap();
        assert_eq!(table.rows[0][0], "K \"Babu\" Rao");
    }

    #[test]
    fn empty_input_is_an_error() {
        assert!(matches!(CsvTable::parse(""), Err(CsvError::Empty)));
    }

    #[test]
    fn column_lookup_is_case_insensitive() {
        let table = CsvTable::parse("Name,Sec_Name\n").unwrap();
        assert_eq!(table.column("sec_name"), Some(1));
        assert!(table.require_column("phc_name").is_err());
    }

    #[test]
    fn escape_round_trip() {
        let row = write_row(&["Rao, K".into(), "plain".into(), "say \"hi\"".into()]);
        assert_eq!(row, "\"Rao, K\",plain,\"say \"\"hi\"\"\"");
        let table = CsvTable::parse(&format!("a,b,c\n{}\n", row)).unwrap();
        assert_eq!(table.rows[0][0], "Rao, K");
        assert_eq!(table.rows[0][2], "say \"hi\"");
    }
}
