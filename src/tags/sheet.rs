//! Reader for the CSV export of the tag spreadsheet.
//!
//! The sheet has two columns, `file_name` and `tags`, where `tags` is a
//! comma-separated list inside one (usually quoted) cell. A header row is
//! optional. Quoted cells may contain commas, doubled quotes and line breaks.

use super::{TagRow, TagSyncError};

/// First-cell values recognised as a header row.
const HEADER_NAMES: [&str; 4] = ["file_name", "filename", "file name", "file"];

/// Parses the text of a tag sheet export into rows.
///
/// Rows with an empty file name are dropped. Tags are trimmed, empty entries
/// are removed and repeats within a row keep their first position.
///
/// # Errors
///
/// Returns [`TagSyncError::Sheet`] when a quoted cell is never closed.
pub fn parse_tag_sheet(text: &str) -> Result<Vec<TagRow>, TagSyncError> {
    let text = text.strip_prefix('\u{feff}').unwrap_or(text);
    let records = split_records(text)?;

    let mut rows = Vec::new();
    for (position, (line, cells)) in records.into_iter().enumerate() {
        let file_name = cells.first().map_or("", |cell| cell.trim());
        if position == 0 && is_header(file_name) {
            continue;
        }
        if file_name.is_empty() {
            tracing::debug!(line, "skipping tag sheet row without a file name");
            continue;
        }
        let tags = cells.get(1).map(|cell| split_tags(cell)).unwrap_or_default();
        rows.push(TagRow {
            file_name: file_name.to_string(),
            tags,
        });
    }
    Ok(rows)
}

fn is_header(first_cell: &str) -> bool {
    HEADER_NAMES
        .iter()
        .any(|name| first_cell.eq_ignore_ascii_case(name))
}

/// Splits a `tags` cell on commas.
pub(crate) fn split_tags(cell: &str) -> Vec<String> {
    let mut tags: Vec<String> = Vec::new();
    for tag in cell.split(',').map(str::trim).filter(|tag| !tag.is_empty()) {
        if !tags.iter().any(|seen| seen == tag) {
            tags.push(tag.to_string());
        }
    }
    tags
}

/// Splits CSV text into records, each tagged with the line it starts on.
/// Blank lines produce no record.
fn split_records(text: &str) -> Result<Vec<(usize, Vec<String>)>, TagSyncError> {
    let mut records = Vec::new();
    let mut record: Vec<String> = Vec::new();
    let mut field = String::new();
    let mut in_quotes = false;
    let mut line = 1;
    let mut record_line = 1;
    let mut quote_line = 1;

    let mut chars = text.chars().peekable();
    while let Some(c) = chars.next() {
        if in_quotes {
            match c {
                '"' if chars.peek() == Some(&'"') => {
                    chars.next();
                    field.push('"');
                }
                '"' => in_quotes = false,
                '\n' => {
                    line += 1;
                    field.push('\n');
                }
                _ => field.push(c),
            }
            continue;
        }

        match c {
            '"' => {
                in_quotes = true;
                quote_line = line;
            }
            ',' => record.push(std::mem::take(&mut field)),
            '\r' => {}
            '\n' => {
                record.push(std::mem::take(&mut field));
                push_record(&mut records, record_line, std::mem::take(&mut record));
                line += 1;
                record_line = line;
            }
            _ => field.push(c),
        }
    }

    if in_quotes {
        return Err(TagSyncError::Sheet {
            line: quote_line,
            message: "unterminated quoted cell".to_string(),
        });
    }
    if !field.is_empty() || !record.is_empty() {
        record.push(field);
        push_record(&mut records, record_line, record);
    }
    Ok(records)
}

fn push_record(records: &mut Vec<(usize, Vec<String>)>, line: usize, record: Vec<String>) {
    let blank = record.iter().all(|cell| cell.trim().is_empty());
    if !blank {
        records.push((line, record));
    }
}
