//! Decoding the admin tool's delimited tabular output.
//!
//! The tool prints one header row naming the columns, then one row per
//! entity. Fields are comma-delimited; a field containing the delimiter or
//! a quote is double-quoted with `""` escaping. Output is line-oriented —
//! the tool never emits a value spanning lines.

use tracing::trace;

use crate::result::{CatadorError, CatadorResult};

/// One decoded row, fields in column order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    fields: Vec<(String, String)>,
}

impl Record {
    /// Build a record from (column, value) pairs
    #[must_use]
    pub fn new(fields: Vec<(String, String)>) -> Self {
        Self { fields }
    }

    /// Value of the named column
    #[must_use]
    pub fn get(&self, column: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(name, _)| name == column)
            .map(|(_, value)| value.as_str())
    }

    /// Column names in order
    #[must_use]
    pub fn columns(&self) -> Vec<&str> {
        self.fields.iter().map(|(name, _)| name.as_str()).collect()
    }

    /// Values in column order
    #[must_use]
    pub fn values(&self) -> Vec<&str> {
        self.fields.iter().map(|(_, value)| value.as_str()).collect()
    }

    /// Number of columns
    #[must_use]
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Whether the record has no columns
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

fn split_line(line: &str, line_no: usize) -> CatadorResult<Vec<String>> {
    let mut fields = Vec::new();
    let mut current = String::new();
    let mut chars = line.chars().peekable();
    let mut quoted = false;

    while let Some(c) = chars.next() {
        if quoted {
            match c {
                '"' => {
                    if chars.peek() == Some(&'"') {
                        let _ = chars.next();
                        current.push('"');
                    } else {
                        quoted = false;
                    }
                }
                other => current.push(other),
            }
        } else {
            match c {
                ',' => fields.push(std::mem::take(&mut current)),
                '"' if current.is_empty() => quoted = true,
                '"' => {
                    return Err(CatadorError::OutputParse {
                        line: line_no,
                        message: "quote inside unquoted field".to_string(),
                    })
                }
                other => current.push(other),
            }
        }
    }
    if quoted {
        return Err(CatadorError::OutputParse {
            line: line_no,
            message: "unterminated quoted field".to_string(),
        });
    }
    fields.push(current);
    Ok(fields)
}

/// Decode tool stdout into records.
///
/// Empty output (no header at all) decodes to no records; a header with no
/// rows likewise. A row whose field count disagrees with the header is a
/// [`CatadorError::OutputParse`] naming the offending line.
pub fn parse_table(stdout: &str) -> CatadorResult<Vec<Record>> {
    let mut lines = stdout
        .lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty());

    let Some((header_idx, header_line)) = lines.next() else {
        return Ok(Vec::new());
    };
    let columns = split_line(header_line, header_idx + 1)?;

    let mut records = Vec::new();
    for (idx, line) in lines {
        let values = split_line(line, idx + 1)?;
        if values.len() != columns.len() {
            return Err(CatadorError::OutputParse {
                line: idx + 1,
                message: format!(
                    "expected {} fields per the header, found {}",
                    columns.len(),
                    values.len()
                ),
            });
        }
        records.push(Record::new(
            columns.iter().cloned().zip(values).collect(),
        ));
    }
    trace!(rows = records.len(), columns = columns.len(), "decoded tool output");
    Ok(records)
}

fn encode_field(value: &str) -> String {
    if value.contains(',') || value.contains('"') {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

/// Encode records back into the tool's tabular form.
///
/// Used for fixtures; every record must share the first record's columns.
/// Values must be line-free (the format is line-oriented).
#[must_use]
pub fn encode_table(records: &[Record]) -> String {
    let Some(first) = records.first() else {
        return String::new();
    };
    let mut out = first
        .columns()
        .iter()
        .map(|c| encode_field(c))
        .collect::<Vec<_>>()
        .join(",");
    out.push('\n');
    for record in records {
        out.push_str(
            &record
                .values()
                .iter()
                .map(|v| encode_field(v))
                .collect::<Vec<_>>()
                .join(","),
        );
        out.push('\n');
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    const FIXTURE: &str = "\
id,name,organization,description
3,acme-release,Acme,Release signing key
4,acme-nightly,Acme,\"Nightly, unstable\"
7,\"quoted \"\"name\"\"\",Acme,
";

    #[test]
    fn fixture_decodes_to_expected_records() {
        let records = parse_table(FIXTURE).unwrap();
        assert_eq!(records.len(), 3);
        assert_eq!(records[0].get("name"), Some("acme-release"));
        assert_eq!(records[1].get("description"), Some("Nightly, unstable"));
        assert_eq!(records[2].get("name"), Some("quoted \"name\""));
        assert_eq!(records[2].get("description"), Some(""));
    }

    #[test]
    fn empty_output_is_zero_records() {
        assert!(parse_table("").unwrap().is_empty());
        assert!(parse_table("\n\n").unwrap().is_empty());
    }

    #[test]
    fn header_only_is_zero_records() {
        assert!(parse_table("id,name\n").unwrap().is_empty());
    }

    #[test]
    fn field_count_mismatch_names_the_line() {
        let err = parse_table("id,name\n1,acme\n2\n").unwrap_err();
        match err {
            CatadorError::OutputParse { line, .. } => assert_eq!(line, 3),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn unterminated_quote_is_rejected() {
        assert!(parse_table("id,name\n1,\"acme\n").is_err());
    }

    #[test]
    fn fixture_round_trips_through_encode() {
        let records = parse_table(FIXTURE).unwrap();
        let encoded = encode_table(&records);
        assert_eq!(parse_table(&encoded).unwrap(), records);
    }

    #[test]
    fn unknown_column_reads_as_none() {
        let records = parse_table("id,name\n1,acme\n").unwrap();
        assert_eq!(records[0].get("uuid"), None);
    }

    mod properties {
        use super::*;
        use proptest::prelude::*;

        fn field() -> impl Strategy<Value = String> {
            // Line-free values, per the format contract.
            "[a-zA-Z0-9 ,\"._:-]{0,20}"
        }

        proptest! {
            #[test]
            fn any_record_set_round_trips(
                // Two or more columns: a one-column table whose sole value is
                // blank would encode to a line the decoder skips as empty.
                columns in proptest::collection::vec("[a-z_]{1,10}", 2..5),
                rows in proptest::collection::vec(
                    proptest::collection::vec(field(), 5),
                    0..8,
                ),
            ) {
                let records: Vec<Record> = rows
                    .iter()
                    .map(|row| {
                        Record::new(
                            columns
                                .iter()
                                .cloned()
                                .zip(row.iter().take(columns.len()).cloned())
                                .collect(),
                        )
                    })
                    .collect();
                let encoded = encode_table(&records);
                let decoded = parse_table(&encoded).unwrap();
                prop_assert_eq!(decoded, records);
            }
        }
    }
}
