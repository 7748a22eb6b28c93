//! Parsing of the three whitespace-separated text tables used for bulk
//! ingest: superpixel bounds, superpixel-to-segment map, segment-to-body
//! map.

use stack_table::Table;

use crate::error::TextError;

/// Parse a whitespace-separated integer table, skipping blank lines and
/// lines whose first non-whitespace character is `#`. Every kept line must
/// have exactly `columns` fields.
fn parse_table(text: &str, columns: u32) -> Result<Table, TextError> {
    let mut rows: Vec<Vec<u32>> = Vec::new();

    for (line_number, line) in text.lines().enumerate() {
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }

        let fields: Vec<&str> = trimmed.split_whitespace().collect();
        if fields.len() != columns as usize {
            return Err(TextError::WrongColumnCount {
                line: line_number + 1,
                expected: columns as usize,
                found: fields.len(),
            });
        }

        let mut row = Vec::with_capacity(columns as usize);
        for field in fields {
            let value = field.parse::<u32>().map_err(|_| TextError::NotAnInteger {
                line: line_number + 1,
                text: field.to_string(),
            })?;
            row.push(value);
        }
        rows.push(row);
    }

    let mut table = Table::new(0, columns);
    table.append_rows(rows.len() as u32)?;
    for (r, row) in rows.iter().enumerate() {
        for (c, &value) in row.iter().enumerate() {
            table.set(r as u32, c as u32, value)?;
        }
    }

    Ok(table)
}

/// `z  spid  x  y  width  height  volume`
pub fn read_bounds(text: &str) -> Result<Table, TextError> {
    parse_table(text, 7)
}

/// `z  spid  segid`
pub fn read_segments(text: &str) -> Result<Table, TextError> {
    parse_table(text, 3)
}

/// `segid  bodyid`
pub fn read_bodies(text: &str) -> Result<Table, TextError> {
    parse_table(text, 2)
}
