use thiserror::Error;

use crate::schema::ColumnType;

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, Error)]
pub enum Error {
    /// The record layout cannot be turned into a usable schema.
    #[error("invalid schema definition: {0}")]
    SchemaDefinition(String),

    #[error("could not convert value '{value}' to {column_type} for column '{column}' (index {index})")]
    Conversion {
        value: String,
        column_type: ColumnType,
        column: String,
        index: usize,
    },

    #[error("row {row} has no field at index {index} for column '{column}'")]
    MissingField {
        row: usize,
        index: usize,
        column: String,
    },

    #[error("persistence failure on table '{table}': {reason}")]
    Persistence { table: String, reason: String },

    #[error("no release definition found for {0}")]
    UnsupportedRelease(u16),

    #[error("input has no column named '{0}'")]
    MissingColumn(String),

    #[error("failed to read workbook: {0}")]
    Workbook(String),

    #[error("{0}")]
    Encoding(String),

    #[error(transparent)]
    Csv(#[from] csv::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl Error {
    pub(crate) fn schema(message: impl Into<String>) -> Self {
        Error::SchemaDefinition(message.into())
    }
}
