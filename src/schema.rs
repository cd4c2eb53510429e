//! Table and column definitions derived from a record layout.
//!
//! A [`Schema`] owns an ordered list of [`Table`]s; each table owns an ordered
//! list of [`Column`]s whose `index` points at the field position in the raw
//! data rows. Definitions are built once by a layout compiler (or literally,
//! for fixed feeds) and are read-only afterwards.

use std::{fmt, sync::LazyLock};

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::{
    data::{Cell, Value, convert},
    error::{Error, Result},
};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum ColumnType {
    Integer,
    Float,
    String,
    Boolean,
}

impl fmt::Display for ColumnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ColumnType::Integer => "integer",
            ColumnType::Float => "float",
            ColumnType::String => "string",
            ColumnType::Boolean => "boolean",
        };
        f.write_str(label)
    }
}

static TYPE_CODES: LazyLock<Vec<(Regex, ColumnType)>> = LazyLock::new(|| {
    [
        (r"^A\d+", ColumnType::String),
        (r"^COMMA\d(\.0)?", ColumnType::Integer),
        (r"^F\d+\.\d+", ColumnType::Float),
        (r"^DOLLAR\d", ColumnType::Float),
    ]
    .into_iter()
    .map(|(pattern, ty)| (Regex::new(pattern).expect("static type code pattern"), ty))
    .collect()
});

/// Maps a record layout type code (`A15`, `COMMA6`, `F5.1`, `DOLLAR8`) to a
/// column type. The first matching prefix wins.
pub fn resolve_type(code: &str) -> Result<ColumnType> {
    let code = code.trim();
    TYPE_CODES
        .iter()
        .find(|(pattern, _)| pattern.is_match(code))
        .map(|(_, ty)| *ty)
        .ok_or_else(|| Error::schema(format!("could not determine column type for '{code}'")))
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Column {
    pub index: usize,
    pub name: String,
    pub column_type: ColumnType,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub primary_key: bool,
    #[serde(skip)]
    pub table: Option<String>,
}

impl Column {
    pub fn new(index: usize, name: impl Into<String>, column_type: ColumnType) -> Self {
        Self {
            index,
            name: name.into(),
            column_type,
            primary_key: false,
            table: None,
        }
    }

    pub fn as_primary_key(mut self) -> Self {
        self.primary_key = true;
        self
    }

    /// Copy of this column with no owning table, ready to be attached to a
    /// sibling table as a foreign key.
    pub fn detached(&self) -> Self {
        Self {
            table: None,
            ..self.clone()
        }
    }

    pub fn convert(&self, cell: &Cell) -> Result<Option<Value>> {
        convert(self, cell)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Table {
    pub name: String,
    columns: Vec<Column>,
}

impl Table {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            columns: Vec::new(),
        }
    }

    /// Attaches `column` to this table. Column names must be unique within a
    /// table.
    pub fn add_column(&mut self, mut column: Column) -> Result<&Column> {
        if self.column(&column.name).is_some() {
            return Err(Error::schema(format!(
                "duplicate column '{}' in table '{}'",
                column.name, self.name
            )));
        }
        debug_assert!(column.table.is_none(), "column attached twice");
        column.table = Some(self.name.clone());
        let position = self.columns.len();
        self.columns.push(column);
        Ok(&self.columns[position])
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    pub fn primary_key(&self) -> Option<&Column> {
        self.columns.iter().find(|c| c.primary_key)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Schema {
    pub name: String,
    pub tables: Vec<Table>,
    #[serde(skip)]
    pub columns: Vec<Column>,
}

impl Schema {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            tables: Vec::new(),
            columns: Vec::new(),
        }
    }

    /// Builds a single-table schema from literal column definitions.
    pub fn single_table(name: &str, columns: Vec<Column>) -> Result<Self> {
        let mut table = Table::new(name);
        for column in columns {
            table.add_column(column)?;
        }
        let mut schema = Schema::new(name);
        schema.columns = table.columns().to_vec();
        schema.push_table(table)?;
        Ok(schema)
    }

    pub fn table(&self, name: &str) -> Option<&Table> {
        self.tables.iter().find(|t| t.name == name)
    }

    /// Appends a finished table; table names are unique within a schema.
    pub(crate) fn push_table(&mut self, table: Table) -> Result<()> {
        if self.table(&table.name).is_some() {
            return Err(Error::schema(format!(
                "table '{}' is defined more than once",
                table.name
            )));
        }
        self.tables.push(table);
        Ok(())
    }
}
