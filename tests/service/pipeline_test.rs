use std::fs::File;
use std::io::Write;

use starschema::agency;
use starschema::catalog::FilterParams;
use starschema::ingest::{extract_csv, read_csv_path};
use starschema::ingest::read_csv;
use starschema::model::DimensionSpec;
use starschema::normalize::NormalizeError;
use starschema::pipeline::{load, LoadTarget, PipelineError};
use starschema::service::QueryService;
use starschema::store::SqliteStore;
use tempfile::TempDir;
use zip::write::FileOptions;

const EXTRACT: &str = "\
AGENCY_ID,PRIMARY_AGENCY_ID,PROD_ABBR,PROD_LINE,STATE_ABBR,VENDOR,PL_START_YEAR,PL_END_YEAR,WRTN_PREM_AMT
0003,3,CPP,CL,OH,NA,2008,2012,100.5
0003,3,HO,PL,OH,Applied,2010,2014,NaN
0007,3,CPP,CL,PA,,2011,2015,25
";

fn write_extract(dir: &TempDir) -> std::path::PathBuf {
    let path = dir.path().join("finalapi.csv");
    File::create(&path)
        .unwrap()
        .write_all(EXTRACT.as_bytes())
        .unwrap();
    path
}

#[test]
fn test_load_into_file_database() {
    let dir = TempDir::new().unwrap();
    let raw = read_csv_path(&write_extract(&dir)).unwrap();
    let db = dir.path().join("data").join("insurance.db");

    let mut store = SqliteStore::open(&db).unwrap();
    let summary = load(&mut store, &raw, &LoadTarget::default()).unwrap();

    assert_eq!(summary.raw_rows, 3);
    assert_eq!(summary.fact_rows, 3);
    assert_eq!(
        summary.dimensions,
        vec![
            ("agency".to_string(), 2),
            ("product".to_string(), 2),
            ("state".to_string(), 2),
            ("vendor".to_string(), 2),
        ]
    );
    assert!(db.exists());

    drop(store);
    let reopened = SqliteStore::open(&db).unwrap();
    assert_eq!(reopened.row_count(agency::FACT_TABLE).unwrap(), 3);
    assert_eq!(reopened.row_count("vendor").unwrap(), 2);
}

#[test]
fn test_padded_keys_compare_numerically() {
    let dir = TempDir::new().unwrap();
    let raw = read_csv_path(&write_extract(&dir)).unwrap();
    let mut store = SqliteStore::open_in_memory().unwrap();
    load(&mut store, &raw, &LoadTarget::default()).unwrap();

    let service = QueryService::new(store).unwrap();
    let response = service
        .detail(&FilterParams::new().with("AGENCY_ID", "0003"))
        .unwrap();
    assert_eq!(response.data.len(), 2);
}

#[test]
fn test_reload_replaces_star_and_appends_raw() {
    let dir = TempDir::new().unwrap();
    let raw = read_csv_path(&write_extract(&dir)).unwrap();
    let mut store = SqliteStore::open_in_memory().unwrap();

    load(&mut store, &raw, &LoadTarget::default()).unwrap();
    let second = load(&mut store, &raw, &LoadTarget::default()).unwrap();

    assert_eq!(second.fact_rows, 3);
    assert_eq!(store.row_count(agency::FACT_TABLE).unwrap(), 3);
    assert_eq!(store.row_count("product").unwrap(), 2);
    assert_eq!(store.row_count(agency::RAW_TABLE).unwrap(), 6);
}

#[test]
fn test_nan_premium_is_stored_as_null() {
    let dir = TempDir::new().unwrap();
    let raw = read_csv_path(&write_extract(&dir)).unwrap();
    let mut store = SqliteStore::open_in_memory().unwrap();
    load(&mut store, &raw, &LoadTarget::default()).unwrap();

    let service = QueryService::new(store).unwrap();
    let detail = service
        .detail(&FilterParams::new().with("PROD_LINE", "PL"))
        .unwrap();
    assert_eq!(
        detail.data.value(0, "WRTN_PREM_AMT"),
        Some(&starschema::dataset::Value::Null)
    );
}

#[test]
fn test_failed_normalization_keeps_previous_load() {
    let dir = TempDir::new().unwrap();
    let raw = read_csv_path(&write_extract(&dir)).unwrap();
    let mut store = SqliteStore::open_in_memory().unwrap();
    load(&mut store, &raw, &LoadTarget::default()).unwrap();

    let broken = LoadTarget {
        specs: vec![DimensionSpec::new("region", &["REGION"])],
        ..LoadTarget::default()
    };
    let err = load(&mut store, &raw, &broken).unwrap_err();

    assert!(matches!(err, PipelineError::Normalize(_)));
    assert_eq!(store.row_count(agency::FACT_TABLE).unwrap(), 3);
    assert_eq!(store.row_count(agency::RAW_TABLE).unwrap(), 3);
}

#[test]
fn test_null_agency_id_aborts_load() {
    let raw = read_csv(
        "\
AGENCY_ID,PRIMARY_AGENCY_ID,PROD_ABBR,PROD_LINE,STATE_ABBR,VENDOR,PL_START_YEAR,PL_END_YEAR,WRTN_PREM_AMT
5,9,CPP,CL,OH,Applied,2010,2014,10
,9,HO,PL,OH,Applied,2011,2015,20
"
        .as_bytes(),
    )
    .unwrap();
    let mut store = SqliteStore::open_in_memory().unwrap();

    let err = load(&mut store, &raw, &LoadTarget::default()).unwrap_err();

    assert!(matches!(
        err,
        PipelineError::Normalize(NormalizeError::NullNaturalKey { ref table, row: 1 }) if table == "agency"
    ));
    assert!(!store.has_table("agency").unwrap());
    assert!(!store.has_table(agency::FACT_TABLE).unwrap());
    assert!(!store.has_table(agency::RAW_TABLE).unwrap());
}

#[test]
fn test_empty_extract_loads_empty_tables() {
    let header = EXTRACT.lines().next().unwrap();
    let raw = read_csv(format!("{header}\n").as_bytes()).unwrap();
    let mut store = SqliteStore::open_in_memory().unwrap();

    let summary = load(&mut store, &raw, &LoadTarget::default()).unwrap();

    assert_eq!(summary.fact_rows, 0);
    assert!(summary.dimensions.iter().all(|(_, rows)| *rows == 0));
    assert_eq!(store.row_count(agency::FACT_TABLE).unwrap(), 0);
    assert_eq!(store.row_count("vendor").unwrap(), 0);
}

#[test]
fn test_load_from_zip_archive() {
    let dir = TempDir::new().unwrap();
    let archive = dir.path().join("agencyperformance.zip");
    {
        let mut zip = zip::ZipWriter::new(File::create(&archive).unwrap());
        let options = FileOptions::default().compression_method(zip::CompressionMethod::Deflated);
        zip.start_file("finalapi.csv", options).unwrap();
        zip.write_all(EXTRACT.as_bytes()).unwrap();
        zip.finish().unwrap();
    }

    let raw = extract_csv(&archive, "finalapi.csv").unwrap();
    let target = LoadTarget {
        raw_table: None,
        ..LoadTarget::default()
    };
    let mut store = SqliteStore::open_in_memory().unwrap();
    let summary = load(&mut store, &raw, &target).unwrap();

    assert_eq!(summary.raw_rows, 0);
    assert!(!store.has_table(agency::RAW_TABLE).unwrap());
    assert_eq!(store.row_count("state").unwrap(), 2);
}
