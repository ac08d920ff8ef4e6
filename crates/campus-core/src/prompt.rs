use crate::table::Sheet;

/// How many column names go into the `[Header: ...]` hint.
pub const HEADER_HINT_COLUMNS: usize = 12;

/// Marker separating the row payload from its sheet/header context.
const ROW_MARKER: &str = "row:";

/// Encodes every non-empty row of a sheet as a single prompt line:
///
/// `[Sheet: <name>] [Header: <cols>] row: <col>=<value> | <col>=<value> | ...`
///
/// Only cells whose trimmed value is non-empty are included; rows with no
/// such cells are dropped. Row order is preserved.
pub fn encode_sheet(sheet: &Sheet) -> Vec<String> {
    let columns: Vec<String> = sheet
        .columns
        .iter()
        .map(|column| column.trim().to_string())
        .collect();
    let header_guess = columns
        .iter()
        .take(HEADER_HINT_COLUMNS)
        .cloned()
        .collect::<Vec<_>>()
        .join(", ");

    let mut prompts = Vec::new();
    for row in &sheet.rows {
        let mut parts = Vec::new();
        for (column, value) in columns.iter().zip(row) {
            let value = value.trim();
            if !value.is_empty() {
                parts.push(format!("{column}={value}"));
            }
        }
        if !parts.is_empty() {
            prompts.push(format!(
                "[Sheet: {}] [Header: {}] {ROW_MARKER} {}",
                sheet.name,
                header_guess,
                parts.join(" | ")
            ));
        }
    }
    prompts
}

/// Re-derives the column→value pairs from an encoded prompt line.
///
/// The safety net for replies where the model dropped or corrupted fields:
/// everything after `row:` splits on `|`, each segment splits on the first
/// `=`. Duplicate keys keep their first position, last value wins. Returns
/// ordered pairs so downstream alias collisions stay deterministic; an input
/// without the marker yields no pairs.
pub fn fallback_parse(prompt: &str) -> Vec<(String, String)> {
    let Some(index) = prompt.find(ROW_MARKER) else {
        return Vec::new();
    };
    let cells = &prompt[index + ROW_MARKER.len()..];

    let mut pairs: Vec<(String, String)> = Vec::new();
    for part in cells.split('|') {
        let part = part.trim();
        if part.is_empty() {
            continue;
        }
        let Some((key, value)) = part.split_once('=') else {
            continue;
        };
        let key = key.trim();
        let value = value.trim();
        if key.is_empty() {
            continue;
        }
        if let Some(slot) = pairs.iter_mut().find(|(existing, _)| existing == key) {
            slot.1 = value.to_string();
        } else {
            pairs.push((key.to_string(), value.to_string()));
        }
    }
    pairs
}
