//! Persistence targets for compiled tables and loaded rows.
//!
//! Loaders only need three operations from a relational engine, captured by
//! the [`Store`] trait. [`MemoryStore`] keeps rows in memory;
//! [`SqlScriptStore`] renders PostgreSQL statements to any writer so the
//! output can be piped into `psql`.

use std::{collections::BTreeMap, io::Write};

use crate::{
    data::Value,
    error::{Error, Result},
    schema::{ColumnType, Table},
};

/// One converted data row, in table column order.
pub type Row = Vec<Option<Value>>;

pub trait Store {
    /// Creates `table` unless a table with the same name already exists.
    fn create_table(&mut self, table: &Table) -> Result<()>;
    fn delete_all_rows(&mut self, table: &str) -> Result<()>;
    fn insert_rows(&mut self, table: &str, rows: &[Row]) -> Result<()>;
}

#[derive(Debug, Clone, Default)]
struct StoredTable {
    columns: Vec<String>,
    rows: Vec<Row>,
}

#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    tables: BTreeMap<String, StoredTable>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn table_names(&self) -> Vec<&str> {
        self.tables.keys().map(String::as_str).collect()
    }

    pub fn columns(&self, table: &str) -> Option<&[String]> {
        self.tables.get(table).map(|t| t.columns.as_slice())
    }

    pub fn rows(&self, table: &str) -> Option<&[Row]> {
        self.tables.get(table).map(|t| t.rows.as_slice())
    }

    fn stored_mut(&mut self, table: &str) -> Result<&mut StoredTable> {
        self.tables.get_mut(table).ok_or_else(|| Error::Persistence {
            table: table.to_string(),
            reason: "table does not exist".to_string(),
        })
    }
}

impl Store for MemoryStore {
    fn create_table(&mut self, table: &Table) -> Result<()> {
        self.tables
            .entry(table.name.clone())
            .or_insert_with(|| StoredTable {
                columns: table.columns().iter().map(|c| c.name.clone()).collect(),
                rows: Vec::new(),
            });
        Ok(())
    }

    fn delete_all_rows(&mut self, table: &str) -> Result<()> {
        self.stored_mut(table)?.rows.clear();
        Ok(())
    }

    fn insert_rows(&mut self, table: &str, rows: &[Row]) -> Result<()> {
        let stored = self.stored_mut(table)?;
        if let Some(row) = rows.iter().find(|row| row.len() != stored.columns.len()) {
            return Err(Error::Persistence {
                table: table.to_string(),
                reason: format!(
                    "row has {} value(s) but the table has {} column(s)",
                    row.len(),
                    stored.columns.len()
                ),
            });
        }
        stored.rows.extend_from_slice(rows);
        Ok(())
    }
}

/// Writes PostgreSQL DDL and DML statements instead of executing them.
pub struct SqlScriptStore<W: Write> {
    writer: W,
    columns: BTreeMap<String, Vec<String>>,
}

impl<W: Write> SqlScriptStore<W> {
    pub fn new(writer: W) -> Self {
        Self {
            writer,
            columns: BTreeMap::new(),
        }
    }

    /// Registers the column list of a table that already exists in the
    /// database, so rows can be inserted without emitting its DDL.
    pub fn register(&mut self, table: &Table) {
        self.columns.insert(
            table.name.clone(),
            table.columns().iter().map(|c| c.name.clone()).collect(),
        );
    }

    pub fn finish(mut self) -> Result<W> {
        self.writer.flush()?;
        Ok(self.writer)
    }
}

pub fn sql_type(column_type: ColumnType) -> &'static str {
    match column_type {
        ColumnType::Integer => "INTEGER",
        ColumnType::Float => "DOUBLE PRECISION",
        ColumnType::String => "VARCHAR",
        ColumnType::Boolean => "BOOLEAN",
    }
}

pub fn sql_literal(value: Option<&Value>) -> String {
    match value {
        None => "NULL".to_string(),
        Some(Value::Integer(i)) => i.to_string(),
        Some(Value::Float(f)) if f.is_nan() => "'NaN'".to_string(),
        Some(Value::Float(f)) if f.is_infinite() => {
            if *f > 0.0 {
                "'Infinity'".to_string()
            } else {
                "'-Infinity'".to_string()
            }
        }
        Some(Value::Float(f)) => format!("{f:?}"),
        Some(Value::String(s)) => format!("'{}'", s.replace('\'', "''")),
        Some(Value::Boolean(true)) => "TRUE".to_string(),
        Some(Value::Boolean(false)) => "FALSE".to_string(),
    }
}

pub fn create_table_sql(table: &Table) -> String {
    let mut definitions: Vec<String> = table
        .columns()
        .iter()
        .map(|c| format!("    {} {}", c.name, sql_type(c.column_type)))
        .collect();
    let keys: Vec<&str> = table
        .columns()
        .iter()
        .filter(|c| c.primary_key)
        .map(|c| c.name.as_str())
        .collect();
    if !keys.is_empty() {
        definitions.push(format!("    PRIMARY KEY ({})", keys.join(", ")));
    }
    format!(
        "CREATE TABLE IF NOT EXISTS {} (\n{}\n);\n",
        table.name,
        definitions.join(",\n")
    )
}

impl<W: Write> Store for SqlScriptStore<W> {
    fn create_table(&mut self, table: &Table) -> Result<()> {
        self.writer.write_all(create_table_sql(table).as_bytes())?;
        self.register(table);
        Ok(())
    }

    fn delete_all_rows(&mut self, table: &str) -> Result<()> {
        writeln!(self.writer, "DELETE FROM {table};")?;
        Ok(())
    }

    fn insert_rows(&mut self, table: &str, rows: &[Row]) -> Result<()> {
        if rows.is_empty() {
            return Ok(());
        }
        let columns = self.columns.get(table).ok_or_else(|| Error::Persistence {
            table: table.to_string(),
            reason: "table has not been created or registered".to_string(),
        })?;
        writeln!(
            self.writer,
            "INSERT INTO {table} ({}) VALUES",
            columns.join(", ")
        )?;
        for (idx, row) in rows.iter().enumerate() {
            let values: Vec<String> = row.iter().map(|v| sql_literal(v.as_ref())).collect();
            let terminator = if idx + 1 == rows.len() { ";" } else { "," };
            writeln!(self.writer, "    ({}){terminator}", values.join(", "))?;
        }
        Ok(())
    }
}
