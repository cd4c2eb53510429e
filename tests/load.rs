mod common;

use std::fs::File;

use common::{compiled_fixture, fixture_path};
use report_card_ingest::{
    Error,
    data::Value,
    load::{self, DelimitedLoader, LoadOptions},
    release::LayoutKind,
    store::{MemoryStore, Store},
};

fn loaded_store(options: LoadOptions) -> MemoryStore {
    let schema = compiled_fixture("assessment_layout_2015.csv", LayoutKind::Assessment);
    let mut store = MemoryStore::new();
    load::create_tables(&schema, &mut store).unwrap();
    let data = File::open(fixture_path("rc15_assessment_sample.txt")).unwrap();
    let summary = DelimitedLoader::new(&schema, options)
        .load(data, &mut store)
        .unwrap();
    assert_eq!(summary.rows_read, 2);
    assert!(summary.tables.iter().all(|(_, inserted)| *inserted == 2));
    store
}

#[test]
fn every_row_feeds_every_table() {
    let store = loaded_store(LoadOptions::default());
    assert_eq!(
        store.table_names(),
        vec![
            "assessment_2015_overall_achievement_parcc_dlm_performance",
            "assessment_2015_participation",
            "assessment_2015_schools",
        ]
    );

    let schools = store.rows("assessment_2015_schools").unwrap();
    assert_eq!(
        schools[1],
        vec![
            Some(Value::String("150162990250002".into())),
            Some(Value::String("O'KEEFE ELEM SCHOOL".into())),
            Some(Value::String("CITY OF CHICAGO SD 299".into())),
            Some(Value::String("K8".into())),
        ]
    );

    let participation = store.rows("assessment_2015_participation").unwrap();
    assert_eq!(
        participation[0],
        vec![
            Some(Value::String("150162990250001".into())),
            Some(Value::Integer(1204)),
            Some(Value::Float(3.5)),
        ]
    );
    assert_eq!(participation[1][2], None);

    let performance = store
        .rows("assessment_2015_overall_achievement_parcc_dlm_performance")
        .unwrap();
    assert_eq!(performance[1][1], None);
    assert_eq!(performance[1][3], Some(Value::Float(12.0)));
}

#[test]
fn small_batches_insert_the_same_rows() {
    let batched = loaded_store(LoadOptions {
        batch_size: 1,
        ..LoadOptions::default()
    });
    let whole = loaded_store(LoadOptions::default());
    for table in whole.table_names() {
        assert_eq!(batched.rows(table), whole.rows(table));
    }
}

#[test]
fn short_rows_abort_before_writing() {
    let schema = compiled_fixture("assessment_layout_2015.csv", LayoutKind::Assessment);
    let mut store = MemoryStore::new();
    load::create_tables(&schema, &mut store).unwrap();
    let input = "150162990250001;LINCOLN;CHICAGO;K8;45.5;25.1;38.2;20.4;1,204;3.5\n\
                 150162990250002;O'KEEFE;CHICAGO;K8;45.5\n";
    let err = DelimitedLoader::new(&schema, LoadOptions::default())
        .load(input.as_bytes(), &mut store)
        .unwrap_err();
    assert!(matches!(err, Error::MissingField { row: 2, index: 5, .. }));
    for table in &schema.tables {
        assert!(store.rows(&table.name).unwrap().is_empty());
    }
}

#[test]
fn latin1_input_is_decoded() {
    let schema = compiled_fixture("assessment_layout_2015.csv", LayoutKind::Assessment);
    let mut store = MemoryStore::new();
    for table in &schema.tables {
        store.create_table(table).unwrap();
    }
    let mut input = b"150162990250003;SCHOOL ".to_vec();
    input.push(0xC9);
    input.extend_from_slice(b"COLE;CHICAGO;K8;1;2;3;4;5;6\n");

    let options = LoadOptions {
        encoding: encoding_rs::WINDOWS_1252,
        ..LoadOptions::default()
    };
    DelimitedLoader::new(&schema, options)
        .load(input.as_slice(), &mut store)
        .unwrap();
    let schools = store.rows("assessment_2015_schools").unwrap();
    assert_eq!(schools[0][1], Some(Value::String("SCHOOL \u{c9}COLE".into())));
}
