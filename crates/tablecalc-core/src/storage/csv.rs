//! CSV import into a table snapshot.

use crate::error::{CoreError, Result};
use crate::table::Table;
use std::path::Path;
use tablecalc_engine::CellValue;

/// Parse a CSV file. With `has_header`, the first line supplies display headers.
pub fn parse_csv(path: &Path, has_header: bool) -> Result<Table> {
    let content = std::fs::read_to_string(path)?;
    parse_csv_str(&content, has_header)
}

/// Parse CSV text. Blank lines are skipped; rows may have different widths.
pub fn parse_csv_str(content: &str, has_header: bool) -> Result<Table> {
    let mut headers = Vec::new();
    let mut rows = Vec::new();
    let mut saw_line = false;

    for (idx, line) in content.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        let fields = parse_csv_line(line).ok_or_else(|| CoreError::Parse {
            line: idx + 1,
            message: "unterminated quoted field".to_string(),
        })?;

        if has_header && !saw_line {
            headers = fields;
        } else {
            rows.push(fields.iter().map(|f| parse_csv_field(f)).collect());
        }
        saw_line = true;
    }

    if !saw_line {
        return Err(CoreError::EmptyCsv);
    }
    Ok(Table::new(headers, rows))
}

/// Parse a single CSV line, handling quoted fields.
/// Returns None when a quoted field is never closed.
pub(crate) fn parse_csv_line(line: &str) -> Option<Vec<String>> {
    let mut fields = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut field_was_quoted = false;
    let mut chars = line.chars().peekable();

    while let Some(c) = chars.next() {
        if in_quotes {
            if c == '"' {
                // Check for escaped quote
                if chars.peek() == Some(&'"') {
                    current.push('"');
                    chars.next();
                } else {
                    in_quotes = false;
                }
            } else {
                current.push(c);
            }
        } else {
            match c {
                '"' => {
                    in_quotes = true;
                    field_was_quoted = true;
                }
                ',' => {
                    if field_was_quoted {
                        fields.push(std::mem::take(&mut current));
                    } else {
                        fields.push(current.trim().to_string());
                        current.clear();
                    }
                    field_was_quoted = false;
                }
                _ => current.push(c),
            }
        }
    }
    if in_quotes {
        return None;
    }
    if field_was_quoted {
        fields.push(current);
    } else {
        fields.push(current.trim().to_string());
    }
    Some(fields)
}

/// Parse a CSV field into a cell value
/// - Valid number -> Number (unless it has leading zeros like "007")
/// - Otherwise -> Text, including the empty string
pub(crate) fn parse_csv_field(field: &str) -> CellValue {
    // Keep explicit surrounding whitespace (typically from quoted CSV fields).
    let trimmed = field.trim();
    if field != trimmed || trimmed.is_empty() {
        return CellValue::text(field);
    }

    // Preserve strings that look like numbers but have leading zeros (e.g., "007", "00123")
    // unless they're just "0" or start with "0."
    if trimmed.starts_with('0')
        && trimmed.len() > 1
        && !trimmed.starts_with("0.")
        && trimmed.chars().nth(1).is_some_and(|c| c.is_ascii_digit())
    {
        return CellValue::text(trimmed);
    }

    match trimmed.parse::<f64>() {
        Ok(n) if n.is_finite() => CellValue::Number(n),
        _ => CellValue::text(trimmed),
    }
}
