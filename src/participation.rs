//! PARCC participation spreadsheet loader.
//!
//! The participation extract reports suppressed enrollment counts as `"<10"`.
//! The logical schema carries a boolean "masked" flag after each tested
//! enrollment column, but the spreadsheet has no physical cell for either
//! flag, so column indices are shifted back when reading and the flags are
//! derived from the enrollment cells they follow.

use std::sync::LazyLock;

use log::debug;
use regex::Regex;

use crate::{
    data::{Cell, Value},
    error::Result,
    load::{LoadOptions, LoadSummary, write_table},
    schema::{Column, ColumnType, Schema, Table},
    store::{Row, Store},
};

static RCDTS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9]{15}$").expect("static RCDTS pattern"));

const TESTED_ENROLLMENT_ELA: &str = "tested_enrollment_ela";
const TESTED_ENROLLMENT_MATH: &str = "tested_enrollment_math";
const MASKED_ELA: &str = "tested_enrollment_masked_ela";
const MASKED_MATH: &str = "tested_enrollment_masked_math";

static EMPTY: Cell = Cell::Empty;

/// Fixed schema of the participation extract for a release.
pub fn participation_schema(name: &str) -> Result<Schema> {
    use ColumnType::{Boolean as Flag, Integer as Count, String as Text};

    let definitions = [
        ("rcdts", Text),
        ("county", Text),
        ("district_number", Text),
        ("district_name_school_name", Text),
        ("city", Text),
        (TESTED_ENROLLMENT_ELA, Count),
        (MASKED_ELA, Flag),
        ("tested_ela", Count),
        ("absent_ela", Count),
        ("refusal_ela", Count),
        ("other_ela", Count),
        ("invalid_score_ela", Count),
        (TESTED_ENROLLMENT_MATH, Count),
        (MASKED_MATH, Flag),
        ("tested_math", Count),
        ("absent_math", Count),
        ("refusal_math", Count),
        ("other_math", Count),
        ("invalid_score_math", Count),
    ];
    let columns = definitions
        .into_iter()
        .enumerate()
        .map(|(index, (name, ty))| {
            let column = Column::new(index, name, ty);
            if index == 0 { column.as_primary_key() } else { column }
        })
        .collect();
    Schema::single_table(name, columns)
}

/// Physical cell position of a logical column, skipping the two masked flags
/// that have no cell of their own.
pub fn remap_index(index: usize) -> usize {
    if index >= 13 {
        index - 2
    } else if index >= 6 {
        index - 1
    } else {
        index
    }
}

pub fn is_data_row(row: &[Cell]) -> bool {
    row.first()
        .is_some_and(|cell| RCDTS.is_match(cell.as_text().trim()))
}

/// Converts one participation value, applying the suppression rules on top
/// of the column's own conversion.
pub fn column_value(column: &Column, row: &[Cell]) -> Result<Option<Value>> {
    let cell = row.get(remap_index(column.index)).unwrap_or(&EMPTY);
    match column.name.as_str() {
        MASKED_ELA | MASKED_MATH => Ok(Some(Value::Boolean(cell.is_masked()))),
        TESTED_ENROLLMENT_ELA | TESTED_ENROLLMENT_MATH if cell.is_masked() => Ok(None),
        _ => match cell {
            Cell::Text(text) => column.convert(&Cell::Text(text.trim().to_string())),
            other => column.convert(other),
        },
    }
}

pub fn row_values(table: &Table, row: &[Cell]) -> Result<Row> {
    table
        .columns()
        .iter()
        .map(|column| column_value(column, row))
        .collect()
}

#[derive(Debug, Clone)]
pub struct ParticipationLoader<'a> {
    schema: &'a Schema,
    options: LoadOptions,
}

impl<'a> ParticipationLoader<'a> {
    pub fn new(schema: &'a Schema, options: LoadOptions) -> Self {
        Self { schema, options }
    }

    pub fn parse(&self, rows: &[Vec<Cell>]) -> Result<Vec<Vec<Row>>> {
        let data_rows: Vec<&Vec<Cell>> = rows.iter().filter(|row| is_data_row(row)).collect();
        debug!(
            "Skipped {} header/footer row(s)",
            rows.len() - data_rows.len()
        );
        self.schema
            .tables
            .iter()
            .map(|table| {
                data_rows
                    .iter()
                    .map(|row| row_values(table, row))
                    .collect()
            })
            .collect()
    }

    pub fn load<S: Store + ?Sized>(&self, rows: &[Vec<Cell>], store: &mut S) -> Result<LoadSummary> {
        let table_rows = self.parse(rows)?;
        let mut summary = LoadSummary {
            rows_read: rows.len(),
            tables: Vec::with_capacity(table_rows.len()),
        };
        for (table, rows) in self.schema.tables.iter().zip(table_rows) {
            let inserted = write_table(store, &table.name, &rows, &self.options)?;
            summary.tables.push((table.name.clone(), inserted));
        }
        Ok(summary)
    }
}
