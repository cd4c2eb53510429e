use std::{borrow::Cow, fmt};

use serde::{Deserialize, Serialize};

use crate::{
    error::{Error, Result},
    schema::{Column, ColumnType},
};

/// Marker the participation feed uses for suppressed counts (`"<10"`).
pub const MASK_MARKER: char = '<';

/// A raw input cell, as read from a spreadsheet or a delimited text row.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Cell {
    #[default]
    Empty,
    Text(String),
    Number(f64),
    Bool(bool),
}

impl Cell {
    /// Builds a cell from delimited text, treating plain decimal numbers the
    /// way a spreadsheet would store them. Zero-padded codes such as RCDTS
    /// ids stay text.
    pub fn infer(raw: &str) -> Self {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Cell::Empty;
        }
        match trimmed.parse::<f64>() {
            Ok(number) if is_plain_number(trimmed) => Cell::Number(number),
            _ => Cell::Text(raw.to_string()),
        }
    }

    pub fn is_number(&self) -> bool {
        matches!(self, Cell::Number(_))
    }

    pub fn is_masked(&self) -> bool {
        matches!(self, Cell::Text(text) if text.trim_start().starts_with(MASK_MARKER))
    }

    pub fn as_text(&self) -> Cow<'_, str> {
        match self {
            Cell::Empty => Cow::Borrowed(""),
            Cell::Text(text) => Cow::Borrowed(text),
            Cell::Number(number) => Cow::Owned(format_number(*number)),
            Cell::Bool(flag) => Cow::Owned(flag.to_string()),
        }
    }
}

fn is_plain_number(text: &str) -> bool {
    let digits = text.strip_prefix('-').unwrap_or(text);
    let zero_padded = digits.len() > 1 && digits.starts_with('0') && !digits.starts_with("0.");
    !zero_padded && digits.chars().all(|ch| ch.is_ascii_digit() || ch == '.')
}

impl From<&str> for Cell {
    fn from(value: &str) -> Self {
        Cell::Text(value.to_string())
    }
}

impl From<f64> for Cell {
    fn from(value: f64) -> Self {
        Cell::Number(value)
    }
}

fn format_number(number: f64) -> String {
    if number.is_finite() && number.fract() == 0.0 && number.abs() < 1e15 {
        (number as i64).to_string()
    } else {
        number.to_string()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub enum Value {
    Integer(i64),
    Float(f64),
    String(String),
    Boolean(bool),
}

impl Value {
    pub fn as_display(&self) -> String {
        match self {
            Value::Integer(i) => i.to_string(),
            Value::Float(f) => f.to_string(),
            Value::String(s) => s.clone(),
            Value::Boolean(b) => b.to_string(),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_display())
    }
}

/// Converts a raw cell into the typed value declared by `column`.
///
/// Empty numeric fields become `None`; string fields keep empty text as an
/// empty string. Punctuation stripping only applies to text cells.
pub fn convert(column: &Column, cell: &Cell) -> Result<Option<Value>> {
    let failed = |value: &str| Error::Conversion {
        value: value.to_string(),
        column_type: column.column_type,
        column: column.name.clone(),
        index: column.index,
    };

    let converted = match (column.column_type, cell) {
        (ColumnType::Integer | ColumnType::Float, Cell::Empty) => None,
        (ColumnType::Integer, Cell::Text(text)) => {
            let cleaned = text.trim().replace(',', "");
            if cleaned.is_empty() && text.is_empty() {
                None
            } else {
                let parsed = cleaned.parse::<i64>().map_err(|_| failed(text))?;
                Some(Value::Integer(parsed))
            }
        }
        (ColumnType::Integer, Cell::Number(number)) => {
            if !number.is_finite() {
                return Err(failed(&number.to_string()));
            }
            Some(Value::Integer(number.trunc() as i64))
        }
        (ColumnType::Integer, Cell::Bool(flag)) => Some(Value::Integer(i64::from(*flag))),
        (ColumnType::Float, Cell::Text(text)) => {
            let cleaned = text.trim().replace(['$', ','], "");
            if cleaned.is_empty() && text.is_empty() {
                None
            } else {
                let parsed = cleaned.parse::<f64>().map_err(|_| failed(text))?;
                Some(Value::Float(parsed))
            }
        }
        (ColumnType::Float, Cell::Number(number)) => Some(Value::Float(*number)),
        (ColumnType::Float, Cell::Bool(flag)) => {
            Some(Value::Float(if *flag { 1.0 } else { 0.0 }))
        }
        (ColumnType::String, cell) => Some(Value::String(cell.as_text().into_owned())),
        (ColumnType::Boolean, Cell::Bool(flag)) => Some(Value::Boolean(*flag)),
        (ColumnType::Boolean, cell) => Some(Value::Boolean(cell.is_masked())),
    };
    Ok(converted)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn column(column_type: ColumnType) -> Column {
        Column::new(4, "enrollment", column_type)
    }

    fn text(value: &str) -> Cell {
        Cell::Text(value.to_string())
    }

    #[test]
    fn integer_conversion_strips_thousands_separators() {
        let col = column(ColumnType::Integer);
        assert_eq!(convert(&col, &text("")).unwrap(), None);
        assert_eq!(
            convert(&col, &text("1,234")).unwrap(),
            Some(Value::Integer(1234))
        );
        assert_eq!(
            convert(&col, &Cell::Number(17.0)).unwrap(),
            Some(Value::Integer(17))
        );
    }

    #[test]
    fn integer_conversion_reports_offending_value() {
        let col = column(ColumnType::Integer);
        let err = convert(&col, &text("abc")).unwrap_err();
        match err {
            Error::Conversion {
                value,
                column_type,
                column,
                index,
            } => {
                assert_eq!(value, "abc");
                assert_eq!(column_type, ColumnType::Integer);
                assert_eq!(column, "enrollment");
                assert_eq!(index, 4);
            }
            other => panic!("Expected conversion error, got {other:?}"),
        }
    }

    #[test]
    fn float_conversion_strips_currency_marker() {
        let col = column(ColumnType::Float);
        assert_eq!(
            convert(&col, &text("$1,234.50")).unwrap(),
            Some(Value::Float(1234.50))
        );
        assert_eq!(convert(&col, &Cell::Empty).unwrap(), None);
        assert!(convert(&col, &text("n/a")).is_err());
    }

    #[test]
    fn string_conversion_keeps_empty_text() {
        let col = column(ColumnType::String);
        assert_eq!(
            convert(&col, &text("")).unwrap(),
            Some(Value::String(String::new()))
        );
        assert_eq!(
            convert(&col, &Cell::Number(12.0)).unwrap(),
            Some(Value::String("12".to_string()))
        );
        assert_eq!(
            convert(&col, &Cell::Number(2.5)).unwrap(),
            Some(Value::String("2.5".to_string()))
        );
    }

    #[test]
    fn boolean_conversion_follows_mask_marker() {
        let col = column(ColumnType::Boolean);
        assert_eq!(
            convert(&col, &text(" <10")).unwrap(),
            Some(Value::Boolean(true))
        );
        assert_eq!(
            convert(&col, &text("42")).unwrap(),
            Some(Value::Boolean(false))
        );
        assert_eq!(
            convert(&col, &Cell::Number(3.0)).unwrap(),
            Some(Value::Boolean(false))
        );
        assert_eq!(
            convert(&col, &Cell::Empty).unwrap(),
            Some(Value::Boolean(false))
        );
    }

    #[test]
    fn infer_distinguishes_numbers_from_text() {
        assert_eq!(Cell::infer("12"), Cell::Number(12.0));
        assert_eq!(Cell::infer("  "), Cell::Empty);
        assert_eq!(Cell::infer("GRADE 3"), text("GRADE 3"));
        assert_eq!(Cell::infer("-0.5"), Cell::Number(-0.5));
        assert_eq!(Cell::infer("010010010260001"), text("010010010260001"));
        assert_eq!(Cell::infer("NaN"), text("NaN"));
        assert_eq!(Cell::infer("1,204"), text("1,204"));
    }
}
