use std::fs;
use std::path::Path;

use calamine::{open_workbook_auto, Data, Range, Reader};

use crate::error::ScheduleError;

/// One tabular sheet: a name, a header row, and data rows of string cells.
#[derive(Debug, Clone)]
pub struct Sheet {
    pub name: String,
    pub columns: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

const TEXT_EXTENSIONS: &[&str] = &["csv", "tsv", "txt"];
const DELIMITER_CANDIDATES: &[u8] = &[b',', b';', b'\t', b'|'];

/// Reads a schedule table from disk.
///
/// `.csv`/`.tsv`/`.txt` files are parsed as delimited text with the
/// delimiter sniffed from the header line; anything else is opened as an
/// Excel-compatible workbook and every sheet is read. All failures are
/// table-read errors, which the pipeline reports as a top-level error
/// result.
pub fn read_table(path: &Path) -> Result<Vec<Sheet>, ScheduleError> {
    let ext = path
        .extension()
        .and_then(|ext| ext.to_str())
        .unwrap_or_default()
        .to_lowercase();

    if TEXT_EXTENSIONS.contains(&ext.as_str()) {
        let raw = fs::read_to_string(path).map_err(|err| {
            ScheduleError::Table(format!("failed to read {}: {err}", path.display()))
        })?;
        return Ok(vec![parse_delimited(&raw, &ext)?]);
    }

    read_workbook(path)
}

fn parse_delimited(raw: &str, ext: &str) -> Result<Sheet, ScheduleError> {
    let delimiter = sniff_delimiter(raw);
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .flexible(true)
        .from_reader(raw.as_bytes());

    let columns: Vec<String> = reader
        .headers()
        .map_err(|err| ScheduleError::Table(format!("malformed {ext} header: {err}")))?
        .iter()
        .map(|header| header.trim().to_string())
        .collect();

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record
            .map_err(|err| ScheduleError::Table(format!("malformed {ext} record: {err}")))?;
        rows.push(record.iter().map(str::to_string).collect());
    }

    Ok(Sheet {
        name: ext.to_uppercase(),
        columns,
        rows,
    })
}

/// Picks the most frequent candidate delimiter on the header line; comma
/// wins ties and is the fallback when nothing matches.
fn sniff_delimiter(raw: &str) -> u8 {
    let header = raw.lines().find(|line| !line.trim().is_empty()).unwrap_or_default();

    let mut best = (b',', 0usize);
    for &candidate in DELIMITER_CANDIDATES {
        let count = header.matches(candidate as char).count();
        if count > best.1 {
            best = (candidate, count);
        }
    }
    best.0
}

fn read_workbook(path: &Path) -> Result<Vec<Sheet>, ScheduleError> {
    let mut workbook = open_workbook_auto(path)
        .map_err(|err| ScheduleError::Table(format!("failed to open workbook: {err}")))?;

    let mut sheets = Vec::new();
    for name in workbook.sheet_names().to_owned() {
        let range = workbook.worksheet_range(&name).map_err(|err| {
            ScheduleError::Table(format!("failed to read sheet {name}: {err}"))
        })?;
        sheets.push(sheet_from_range(name, &range));
    }
    Ok(sheets)
}

fn sheet_from_range(name: String, range: &Range<Data>) -> Sheet {
    let mut rows = range.rows();
    let Some(header) = rows.next() else {
        return Sheet {
            name,
            columns: Vec::new(),
            rows: Vec::new(),
        };
    };

    let columns = header
        .iter()
        .enumerate()
        .map(|(index, cell)| {
            let label = render_cell(cell).trim().to_string();
            if label.is_empty() {
                format!("column_{}", index + 1)
            } else {
                label
            }
        })
        .collect();

    let rows = rows
        .map(|row| row.iter().map(render_cell).collect())
        .collect();

    Sheet {
        name,
        columns,
        rows,
    }
}

fn render_cell(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        // Room numbers and group codes come out of Excel as floats; keep
        // integral values free of the ".0" tail.
        Data::Float(value) if value.fract() == 0.0 && value.abs() < 1e15 => {
            format!("{}", *value as i64)
        }
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sniffs_the_dominant_delimiter() {
        assert_eq!(sniff_delimiter("Предмет,Время,Аудитория"), b',');
        assert_eq!(sniff_delimiter("Предмет;Время;Аудитория"), b';');
        assert_eq!(sniff_delimiter("Предмет\tВремя\tАудитория"), b'\t');
        assert_eq!(sniff_delimiter("Предмет|Время|Аудитория"), b'|');
    }

    #[test]
    fn sniffing_defaults_to_comma() {
        assert_eq!(sniff_delimiter("одна_колонка"), b',');
        assert_eq!(sniff_delimiter(""), b',');
    }

    #[test]
    fn parses_comma_separated_text() {
        let raw = "Предмет,Время\nМатематика,9:00-10:30\nФизика,11:00\n";
        let sheet = parse_delimited(raw, "csv").expect("sheet");
        assert_eq!(sheet.name, "CSV");
        assert_eq!(sheet.columns, vec!["Предмет", "Время"]);
        assert_eq!(sheet.rows.len(), 2);
        assert_eq!(sheet.rows[0], vec!["Математика", "9:00-10:30"]);
    }

    #[test]
    fn parses_semicolon_separated_text_with_ragged_rows() {
        let raw = "Предмет;Время;Ауд.\nМатематика;9:00\n";
        let sheet = parse_delimited(raw, "csv").expect("sheet");
        assert_eq!(sheet.columns.len(), 3);
        assert_eq!(sheet.rows[0], vec!["Математика", "9:00"]);
    }

    #[test]
    fn read_table_reports_missing_files_as_table_errors() {
        let err = read_table(Path::new("/no/such/schedule.csv")).unwrap_err();
        assert_eq!(err.kind(), "TableError");
    }

    #[test]
    fn read_table_reports_garbage_workbooks_as_table_errors() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("broken.xlsx");
        fs::write(&path, b"definitely not a zip archive").expect("write fixture");

        let err = read_table(&path).unwrap_err();
        assert_eq!(err.kind(), "TableError");
    }

    #[test]
    fn renders_integral_floats_without_the_decimal_tail() {
        assert_eq!(render_cell(&Data::Float(201.0)), "201");
        assert_eq!(render_cell(&Data::Float(1.5)), "1.5");
        assert_eq!(render_cell(&Data::String("ауд. 201".to_string())), "ауд. 201");
        assert_eq!(render_cell(&Data::Empty), "");
    }
}
