use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::{
    describe::DescribeFormat,
    load::DEFAULT_BATCH_SIZE,
    query::{SortOrder, Subject},
    release::LayoutKind,
};

#[derive(Debug, Parser)]
#[command(
    author,
    version,
    about = "Build database schemas from Illinois report card record layouts and load the data releases",
    long_about = None
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Compile a record layout and emit CREATE TABLE statements for it
    CreateSchema(CreateSchemaArgs),
    /// Load a delimited data release into the tables of a compiled layout
    Load(LoadArgs),
    /// Load the PARCC participation spreadsheet
    LoadParticipation(LoadParticipationArgs),
    /// Print the tables and columns compiled from a record layout
    Describe(DescribeArgs),
    /// Print the summary query used to build print tables
    SummarySql(SummarySqlArgs),
    /// Print the best or worst performing schools query for a subject
    BestWorstSql(BestWorstSqlArgs),
    /// Write per-paper print tables from exported summary results
    PrintTables(PrintTablesArgs),
}

#[derive(Debug, Args)]
pub struct LayoutArgs {
    /// School year of the data release
    #[arg(short, long)]
    pub year: u16,
    /// Record layout spreadsheet (.xlsx) or a delimited export of it
    #[arg(short, long)]
    pub layout: PathBuf,
    /// Layout variant to compile
    #[arg(long, value_enum, default_value = "assessment")]
    pub kind: LayoutKind,
    /// Delimiter of a delimited layout export (defaults to ',' or tab by extension)
    #[arg(long = "layout-delimiter", value_parser = parse_delimiter)]
    pub layout_delimiter: Option<u8>,
}

#[derive(Debug, Args)]
pub struct CreateSchemaArgs {
    #[command(flatten)]
    pub layout: LayoutArgs,
    /// Destination for the SQL script ('-' for stdout)
    #[arg(long, default_value = "-")]
    pub sql: PathBuf,
}

#[derive(Debug, Args)]
pub struct LoadArgs {
    #[command(flatten)]
    pub layout: LayoutArgs,
    /// Data release file ('-' for stdin)
    #[arg(short, long)]
    pub data: PathBuf,
    /// Delete existing rows from each table before loading
    #[arg(long)]
    pub flush: bool,
    /// Also emit CREATE TABLE statements ahead of the inserts
    #[arg(long)]
    pub create: bool,
    /// Data delimiter character (supports ',', 'tab', ';', '|'; defaults to ';')
    #[arg(long, value_parser = parse_delimiter)]
    pub delimiter: Option<u8>,
    /// Character encoding of the data file (defaults to utf-8)
    #[arg(long = "input-encoding")]
    pub input_encoding: Option<String>,
    /// Number of rows per INSERT statement
    #[arg(long, default_value_t = DEFAULT_BATCH_SIZE)]
    pub batch_size: usize,
    /// Destination for the SQL script ('-' for stdout)
    #[arg(long, default_value = "-")]
    pub sql: PathBuf,
}

#[derive(Debug, Args)]
pub struct LoadParticipationArgs {
    /// School year of the data release
    #[arg(short, long)]
    pub year: u16,
    /// Participation spreadsheet (.xlsx) or a delimited export of it
    #[arg(short, long)]
    pub data: PathBuf,
    /// Delimiter of a delimited export (defaults to ',' or tab by extension)
    #[arg(long, value_parser = parse_delimiter)]
    pub delimiter: Option<u8>,
    /// Character encoding of a delimited export (defaults to utf-8)
    #[arg(long = "input-encoding")]
    pub input_encoding: Option<String>,
    /// Delete existing rows before loading
    #[arg(long)]
    pub flush: bool,
    /// Also emit the CREATE TABLE statement ahead of the inserts
    #[arg(long)]
    pub create: bool,
    /// Number of rows per INSERT statement
    #[arg(long, default_value_t = DEFAULT_BATCH_SIZE)]
    pub batch_size: usize,
    /// Destination for the SQL script ('-' for stdout)
    #[arg(long, default_value = "-")]
    pub sql: PathBuf,
}

#[derive(Debug, Args)]
pub struct DescribeArgs {
    #[command(flatten)]
    pub layout: LayoutArgs,
    /// Output format
    #[arg(long, value_enum, default_value = "table")]
    pub format: DescribeFormat,
}

#[derive(Debug, Args)]
pub struct SummarySqlArgs {
    /// School year of the data release
    #[arg(short, long)]
    pub year: u16,
    /// Restrict results to the ids bound to the :rcdts_ids parameter
    #[arg(long)]
    pub filtered: bool,
}

#[derive(Debug, Args)]
pub struct BestWorstSqlArgs {
    /// School year of the data release
    #[arg(short, long)]
    pub year: u16,
    #[arg(long, value_enum)]
    pub subject: Subject,
    /// Sort direction of the proficiency rate
    #[arg(long, value_enum, default_value = "desc")]
    pub order: SortOrder,
    #[arg(long, default_value_t = 50)]
    pub limit: usize,
    /// Restrict results to the counties bound to the :counties parameter
    #[arg(long = "chicago-area")]
    pub chicago_area: bool,
}

#[derive(Debug, Args)]
pub struct PrintTablesArgs {
    /// Summary query results exported as CSV with a header row
    #[arg(short, long)]
    pub summary: PathBuf,
    /// CSV mapping RCDTS ids to paper codes
    #[arg(short, long)]
    pub papermap: PathBuf,
    /// Paper map column holding comma-separated paper codes
    #[arg(long = "paper-column")]
    pub paper_column: String,
    /// Paper map column holding the RCDTS id
    #[arg(long = "rcdts-column")]
    pub rcdts_column: String,
    /// Directory the print tables are written to
    #[arg(long = "output-dir", default_value = ".")]
    pub output_dir: PathBuf,
    /// File name the per-paper names are derived from
    #[arg(long = "output-filename", default_value = "print_tables.csv")]
    pub output_filename: String,
}

pub fn parse_delimiter(value: &str) -> Result<u8, String> {
    match value {
        "tab" | "\t" => Ok(b'\t'),
        "comma" | "," => Ok(b','),
        "|" | "pipe" => Ok(b'|'),
        ";" | "semicolon" => Ok(b';'),
        other => {
            let mut chars = other.chars();
            let first = chars
                .next()
                .ok_or_else(|| "Delimiter cannot be empty".to_string())?;
            if chars.next().is_some() {
                return Err("Delimiter must be a single character".to_string());
            }
            if !first.is_ascii() {
                return Err("Delimiter must be ASCII".to_string());
            }
            Ok(first as u8)
        }
    }
}
