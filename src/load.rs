//! Loading of semicolon-delimited data releases into a compiled schema.
//!
//! Every input row feeds every table: each column reads the raw field at its
//! `index`. All rows are converted before anything is written, so a bad value
//! anywhere aborts the load with nothing inserted. Writing then happens table
//! by table; a persistence failure part way leaves earlier tables written.

use std::io::Read;

use encoding_rs::{Encoding, UTF_8};
use log::{debug, info};

use crate::{
    data::Cell,
    error::{Error, Result},
    io_utils,
    schema::{Schema, Table},
    store::{Row, Store},
};

pub const DEFAULT_BATCH_SIZE: usize = 1000;

#[derive(Debug, Clone)]
pub struct LoadOptions {
    /// Delete existing rows of each table before inserting new ones.
    pub flush: bool,
    pub batch_size: usize,
    pub delimiter: u8,
    pub encoding: &'static Encoding,
}

impl Default for LoadOptions {
    fn default() -> Self {
        Self {
            flush: false,
            batch_size: DEFAULT_BATCH_SIZE,
            delimiter: io_utils::DATA_DELIMITER,
            encoding: UTF_8,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoadSummary {
    pub rows_read: usize,
    /// Rows inserted per table, in schema order.
    pub tables: Vec<(String, usize)>,
}

/// Creates every table of `schema` in `store`.
pub fn create_tables<S: Store + ?Sized>(schema: &Schema, store: &mut S) -> Result<()> {
    for table in &schema.tables {
        info!("Creating database table {}", table.name);
        store.create_table(table)?;
    }
    Ok(())
}

/// Converts one raw row into the values of `table`.
pub fn row_values(table: &Table, raw: &[String], row_number: usize) -> Result<Row> {
    table
        .columns()
        .iter()
        .map(|column| {
            let field = raw.get(column.index).ok_or_else(|| Error::MissingField {
                row: row_number,
                index: column.index,
                column: column.name.clone(),
            })?;
            column.convert(&Cell::Text(field.trim().to_string()))
        })
        .collect()
}

/// Writes converted rows for one table, honoring the flush flag.
pub(crate) fn write_table<S: Store + ?Sized>(
    store: &mut S,
    table: &str,
    rows: &[Row],
    options: &LoadOptions,
) -> Result<usize> {
    if options.flush {
        debug!("Deleting existing rows from {table}");
        store.delete_all_rows(table)?;
    }
    for batch in rows.chunks(options.batch_size.max(1)) {
        store.insert_rows(table, batch)?;
    }
    info!("Inserted {} row(s) into {table}", rows.len());
    Ok(rows.len())
}

#[derive(Debug, Clone)]
pub struct DelimitedLoader<'a> {
    schema: &'a Schema,
    options: LoadOptions,
}

impl<'a> DelimitedLoader<'a> {
    pub fn new(schema: &'a Schema, options: LoadOptions) -> Self {
        Self { schema, options }
    }

    /// Converts all rows of `reader`, returning one row list per table.
    pub fn parse<R: Read>(&self, reader: R) -> Result<(usize, Vec<Vec<Row>>)> {
        let mut reader = io_utils::open_csv_reader(reader, self.options.delimiter);
        let mut table_rows: Vec<Vec<Row>> = vec![Vec::new(); self.schema.tables.len()];
        let mut rows_read = 0usize;

        for record in reader.byte_records() {
            let record = record?;
            rows_read += 1;
            let raw = io_utils::decode_record(&record, self.options.encoding)?;
            for (table, rows) in self.schema.tables.iter().zip(table_rows.iter_mut()) {
                rows.push(row_values(table, &raw, rows_read)?);
            }
        }
        debug!("Parsed {rows_read} row(s) for {} table(s)", self.schema.tables.len());
        Ok((rows_read, table_rows))
    }

    pub fn load<R: Read, S: Store + ?Sized>(&self, reader: R, store: &mut S) -> Result<LoadSummary> {
        let (rows_read, table_rows) = self.parse(reader)?;
        let mut summary = LoadSummary {
            rows_read,
            tables: Vec::with_capacity(table_rows.len()),
        };
        for (table, rows) in self.schema.tables.iter().zip(table_rows) {
            let inserted = write_table(store, &table.name, &rows, &self.options)?;
            summary.tables.push((table.name.clone(), inserted));
        }
        Ok(summary)
    }
}
