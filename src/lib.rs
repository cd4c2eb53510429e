pub mod cli;
pub mod data;
pub mod describe;
pub mod error;
pub mod io_utils;
pub mod layout;
pub mod load;
pub mod naming;
pub mod participation;
pub mod query;
pub mod release;
pub mod report;
pub mod schema;
pub mod store;
pub mod workbook;

pub use error::Error;

use std::{env, fs::File, io::Write, sync::OnceLock};

use anyhow::{Context, Result};
use clap::Parser;
use encoding_rs::UTF_8;
use log::{LevelFilter, debug, info};

use crate::{
    cli::{Cli, Commands},
    describe::DescribeFormat,
    load::{DelimitedLoader, LoadOptions},
    participation::ParticipationLoader,
    release::Release,
    report::PaperMap,
    schema::Schema,
    store::SqlScriptStore,
};

static LOGGER: OnceLock<()> = OnceLock::new();

fn init_logging() {
    LOGGER.get_or_init(|| {
        let mut builder = env_logger::Builder::from_env(env_logger::Env::default());
        if env::var("RUST_LOG").is_err() {
            builder.filter_module("report_card_ingest", LevelFilter::Info);
        }
        let _ = builder.format_timestamp_millis().try_init();
    });
}

pub fn run() -> Result<()> {
    init_logging();
    let cli = Cli::parse();
    match cli.command {
        Commands::CreateSchema(args) => handle_create_schema(&args),
        Commands::Load(args) => handle_load(&args),
        Commands::LoadParticipation(args) => handle_load_participation(&args),
        Commands::Describe(args) => handle_describe(&args),
        Commands::SummarySql(args) => handle_summary_sql(&args),
        Commands::BestWorstSql(args) => handle_best_worst_sql(&args),
        Commands::PrintTables(args) => handle_print_tables(&args),
    }
}

fn compile_layout(args: &cli::LayoutArgs) -> Result<Schema> {
    let release = Release::from_year(args.year)?;
    info!(
        "Compiling {:?} layout '{}' for {}",
        args.kind,
        args.layout.display(),
        args.year
    );
    let rows = workbook::read_rows(&args.layout, args.layout_delimiter, UTF_8)
        .with_context(|| format!("Reading layout from {:?}", args.layout))?;
    let schema = release
        .compiler(args.kind)
        .compile(&rows)
        .with_context(|| format!("Compiling layout {:?}", args.layout))?;
    for table in &schema.tables {
        debug!("Table {} has {} column(s)", table.name, table.columns().len());
    }
    Ok(schema)
}

fn sql_store(path: &std::path::Path) -> Result<SqlScriptStore<Box<dyn Write>>> {
    let output = io_utils::open_output(path)
        .with_context(|| format!("Opening SQL output {path:?}"))?;
    Ok(SqlScriptStore::new(output))
}

fn handle_create_schema(args: &cli::CreateSchemaArgs) -> Result<()> {
    let schema = compile_layout(&args.layout)?;
    let mut store = sql_store(&args.sql)?;
    load::create_tables(&schema, &mut store)?;
    store.finish().context("Flushing SQL output")?;
    info!(
        "Schema {} defines {} table(s)",
        schema.name,
        schema.tables.len()
    );
    Ok(())
}

fn handle_load(args: &cli::LoadArgs) -> Result<()> {
    let schema = compile_layout(&args.layout)?;
    let options = LoadOptions {
        flush: args.flush,
        batch_size: args.batch_size,
        delimiter: args.delimiter.unwrap_or(io_utils::DATA_DELIMITER),
        encoding: io_utils::resolve_encoding(args.input_encoding.as_deref())?,
    };
    info!(
        "Loading '{}' with delimiter '{}'",
        args.data.display(),
        printable_delimiter(options.delimiter)
    );

    let mut store = sql_store(&args.sql)?;
    if args.create {
        load::create_tables(&schema, &mut store)?;
    } else {
        schema.tables.iter().for_each(|table| store.register(table));
    }
    let input = io_utils::open_input(&args.data)
        .with_context(|| format!("Opening data file {:?}", args.data))?;
    let summary = DelimitedLoader::new(&schema, options)
        .load(input, &mut store)
        .with_context(|| format!("Loading {:?}", args.data))?;
    store.finish().context("Flushing SQL output")?;
    info!(
        "Loaded {} row(s) into {} table(s)",
        summary.rows_read,
        summary.tables.len()
    );
    Ok(())
}

fn handle_load_participation(args: &cli::LoadParticipationArgs) -> Result<()> {
    let release = Release::from_year(args.year)?;
    let schema = release.participation_schema()?;
    let encoding = io_utils::resolve_encoding(args.input_encoding.as_deref())?;
    let rows = workbook::read_rows(&args.data, args.delimiter, encoding)
        .with_context(|| format!("Reading participation data from {:?}", args.data))?;

    let mut store = sql_store(&args.sql)?;
    if args.create {
        load::create_tables(&schema, &mut store)?;
    } else {
        schema.tables.iter().for_each(|table| store.register(table));
    }
    let options = LoadOptions {
        flush: args.flush,
        batch_size: args.batch_size,
        encoding,
        ..LoadOptions::default()
    };
    let summary = ParticipationLoader::new(&schema, options)
        .load(&rows, &mut store)
        .with_context(|| format!("Loading {:?}", args.data))?;
    store.finish().context("Flushing SQL output")?;
    for (table, inserted) in &summary.tables {
        info!(
            "Loaded {inserted} of {} row(s) into {table}",
            summary.rows_read
        );
    }
    Ok(())
}

fn handle_describe(args: &cli::DescribeArgs) -> Result<()> {
    let schema = compile_layout(&args.layout)?;
    let rendered = match args.format {
        DescribeFormat::Table => describe::render_schema(&schema),
        DescribeFormat::Yaml => {
            serde_yaml::to_string(&schema).context("Serializing schema to YAML")?
        }
    };
    print!("{rendered}");
    Ok(())
}

fn handle_summary_sql(args: &cli::SummarySqlArgs) -> Result<()> {
    let release = Release::from_year(args.year)?;
    print!("{}", query::summary_sql(release, args.filtered));
    Ok(())
}

fn handle_best_worst_sql(args: &cli::BestWorstSqlArgs) -> Result<()> {
    let release = Release::from_year(args.year)?;
    if args.chicago_area {
        info!(
            "Bind :counties to {}",
            query::CHICAGO_AREA_COUNTIES.join(", ")
        );
        print!("{}", query::counties_comment());
    }
    print!(
        "{}",
        query::best_worst_sql(
            release,
            args.subject,
            args.order,
            args.limit,
            args.chicago_area
        )
    );
    Ok(())
}

fn handle_print_tables(args: &cli::PrintTablesArgs) -> Result<()> {
    let papermap = File::open(&args.papermap)
        .with_context(|| format!("Opening paper map {:?}", args.papermap))?;
    let paper_map = PaperMap::from_reader(papermap, &args.paper_column, &args.rcdts_column)
        .with_context(|| format!("Reading paper map {:?}", args.papermap))?;
    let summary = File::open(&args.summary)
        .with_context(|| format!("Opening summary results {:?}", args.summary))?;
    let summary = report::read_results(summary)
        .with_context(|| format!("Reading summary results {:?}", args.summary))?;
    info!(
        "Building print tables for {} paper(s) from {} summary row(s)",
        paper_map.papers().len(),
        summary.len()
    );
    let written = report::write_print_tables(
        &summary,
        &paper_map,
        &args.output_dir,
        &args.output_filename,
    )
    .with_context(|| format!("Writing print tables to {:?}", args.output_dir))?;
    info!("Wrote {} print table(s)", written.len());
    Ok(())
}

pub(crate) fn printable_delimiter(delimiter: u8) -> String {
    match delimiter {
        b',' => ",".to_string(),
        b'\t' => "\\t".to_string(),
        b'\n' => "\\n".to_string(),
        other => (other as char).to_string(),
    }
}
