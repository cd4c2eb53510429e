//! Sheet readers producing rows of [`Cell`]s.
//!
//! Spreadsheets (`.xlsx`, `.xlsm`, `.xlsb`, `.xls`, `.ods`) are read with
//! calamine from their first worksheet. Anything else is treated as
//! delimited text, which keeps layouts and participation extracts usable when
//! they have been exported to CSV.

use std::{io::Read, path::Path};

use calamine::{Data, Reader, open_workbook_auto};
use encoding_rs::Encoding;

use crate::{
    data::Cell,
    error::{Error, Result},
    io_utils,
};

const SPREADSHEET_EXTENSIONS: &[&str] = &["xlsx", "xlsm", "xlsb", "xls", "ods"];

pub fn is_spreadsheet(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| {
            SPREADSHEET_EXTENSIONS
                .iter()
                .any(|known| ext.eq_ignore_ascii_case(known))
        })
}

/// Reads every row of the first sheet in `path`.
pub fn read_rows(path: &Path, delimiter: Option<u8>, encoding: &'static Encoding) -> Result<Vec<Vec<Cell>>> {
    if is_spreadsheet(path) {
        read_spreadsheet(path)
    } else {
        let delimiter = io_utils::resolve_input_delimiter(path, delimiter);
        let reader = io_utils::open_input(path)?;
        read_delimited(reader, delimiter, encoding)
    }
}

pub fn read_spreadsheet(path: &Path) -> Result<Vec<Vec<Cell>>> {
    let mut workbook = open_workbook_auto(path)
        .map_err(|err| Error::Workbook(format!("opening {}: {err}", path.display())))?;
    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| Error::Workbook(format!("{} has no worksheets", path.display())))?
        .map_err(|err| Error::Workbook(format!("reading {}: {err}", path.display())))?;

    Ok(range
        .rows()
        .map(|row| row.iter().map(cell_from_data).collect())
        .collect())
}

/// Reads delimited text, inferring numeric cells the way a spreadsheet
/// stores them.
pub fn read_delimited<R: Read>(
    reader: R,
    delimiter: u8,
    encoding: &'static Encoding,
) -> Result<Vec<Vec<Cell>>> {
    let mut reader = io_utils::open_csv_reader(reader, delimiter);
    let mut rows = Vec::new();
    for record in reader.byte_records() {
        let record = record?;
        let fields = io_utils::decode_record(&record, encoding)?;
        rows.push(fields.iter().map(|field| Cell::infer(field)).collect());
    }
    Ok(rows)
}

fn cell_from_data(data: &Data) -> Cell {
    match data {
        Data::Empty => Cell::Empty,
        Data::String(text) => Cell::Text(text.clone()),
        Data::Float(number) => Cell::Number(*number),
        Data::Int(number) => Cell::Number(*number as f64),
        Data::Bool(flag) => Cell::Bool(*flag),
        other => Cell::Text(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use encoding_rs::UTF_8;

    use super::*;

    #[test]
    fn spreadsheet_detection_uses_extension() {
        assert!(is_spreadsheet(Path::new("layout.XLSX")));
        assert!(is_spreadsheet(Path::new("participation.xls")));
        assert!(!is_spreadsheet(Path::new("layout.csv")));
        assert!(!is_spreadsheet(Path::new("layout")));
    }

    #[test]
    fn delimited_rows_keep_ragged_lengths() {
        let input = "ASSESSMENT LAYOUT\n1,,,1-15,15,SCHOOL ID,A15\n\"GRADE 3\"\n";
        let rows = read_delimited(input.as_bytes(), b',', UTF_8).unwrap();
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0], vec![Cell::Text("ASSESSMENT LAYOUT".into())]);
        assert_eq!(rows[1].len(), 7);
        assert_eq!(rows[1][0], Cell::Number(1.0));
        assert_eq!(rows[1][1], Cell::Empty);
        assert_eq!(rows[1][5], Cell::Text("SCHOOL ID".into()));
        assert_eq!(rows[2], vec![Cell::Text("GRADE 3".into())]);
    }

    #[test]
    fn calamine_values_map_to_cells() {
        assert_eq!(cell_from_data(&Data::Int(3)), Cell::Number(3.0));
        assert_eq!(cell_from_data(&Data::Empty), Cell::Empty);
        assert_eq!(
            cell_from_data(&Data::String("<10".into())),
            Cell::Text("<10".into())
        );
    }
}
