//! Reading the command table.
//!
//! The table is delimited text (comma, or tab for `.tsv` files) with a header
//! row. Only the `Command` column is used.

use std::path::Path;

use csv::{ReaderBuilder, Trim};
use tracing::{debug, info};

use crate::error::ValidationError;

pub const COMMAND_COLUMN: &str = "Command";

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// Read commands from a table file on disk.
pub fn load_commands(path: &Path) -> Result<Vec<String>, ValidationError> {
    let data = std::fs::read(path).map_err(|source| ValidationError::Unreadable {
        path: path.display().to_string(),
        source,
    })?;
    let delimiter = match path.extension().and_then(|e| e.to_str()) {
        Some(ext) if ext.eq_ignore_ascii_case("tsv") => b'\t',
        _ => b',',
    };
    let commands = parse_commands(&data, delimiter)?;
    info!(path = %path.display(), count = commands.len(), "Loaded command table");
    Ok(commands)
}

/// Parse table data and return the non-blank values of the `Command` column.
///
/// Rows may be shorter than the header; cells are trimmed and blank ones skipped.
pub fn parse_commands(data: impl AsRef<[u8]>, delimiter: u8) -> Result<Vec<String>, ValidationError> {
    let data = data.as_ref();
    let data = data.strip_prefix(UTF8_BOM).unwrap_or(data);

    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(Trim::All)
        .delimiter(delimiter)
        .from_reader(data);

    let header: Vec<String> = reader.headers()?.iter().map(str::to_string).collect();
    let column = header
        .iter()
        .position(|h| h == COMMAND_COLUMN)
        .ok_or_else(|| ValidationError::MissingColumn {
            expected: COMMAND_COLUMN,
            found: header.clone(),
        })?;
    debug!(column, columns = header.len(), "Found command column");

    let mut commands = Vec::new();
    for record in reader.records() {
        let record = record?;
        if let Some(cell) = record.get(column).filter(|c| !c.is_empty()) {
            commands.push(cell.to_string());
        }
    }

    if commands.is_empty() {
        return Err(ValidationError::NoCommands);
    }
    Ok(commands)
}
