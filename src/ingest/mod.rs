//! Raw extract ingestion.
//!
//! Reads the flat agency extract, either as a plain CSV file or as a member of
//! a ZIP archive, into a [`Dataset`]. Column types are inferred from the
//! data: a column whose every non-missing cell parses as an integer is
//! integer (year, when the header ends in `_YEAR`), one whose cells parse as
//! numbers is decimal, and anything else is text.

use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

use csv::ReaderBuilder;
use tracing::{debug, info};

use crate::dataset::{Column, ColumnType, Dataset, DatasetError, Value};

/// Cell contents read as missing values.
pub const NA_TOKENS: &[&str] = &["", "NA", "N/A", "NaN", "nan", "NULL", "null", "#N/A"];

/// Errors that can occur while reading raw data.
#[derive(Debug, thiserror::Error)]
pub enum IngestError {
    #[error("file not found: {path}")]
    FileNotFound { path: PathBuf },

    #[error("failed to read file {path}: {source}")]
    FileRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse CSV: {0}")]
    Csv(#[from] csv::Error),

    #[error("failed to open archive {path}: {source}")]
    Archive {
        path: PathBuf,
        #[source]
        source: zip::result::ZipError,
    },

    #[error("archive {path} has no member named '{member}'")]
    MissingMember { path: PathBuf, member: String },

    #[error("CSV input has no header row")]
    EmptyCsv,

    #[error(transparent)]
    Dataset(#[from] DatasetError),
}

pub type IngestResult<T> = Result<T, IngestError>;

/// Read CSV text with a header row.
pub fn read_csv<R: Read>(reader: R) -> IngestResult<Dataset> {
    let mut reader = ReaderBuilder::new().has_headers(true).from_reader(reader);

    let headers: Vec<String> = reader
        .headers()?
        .iter()
        .map(|h| h.trim_matches('\u{feff}').trim().to_string())
        .collect();
    if headers.iter().all(String::is_empty) {
        return Err(IngestError::EmptyCsv);
    }

    let mut cells: Vec<Vec<Option<String>>> = Vec::new();
    for record in reader.records() {
        let record = record?;
        cells.push(
            (0..headers.len())
                .map(|i| record.get(i).map(str::trim).filter(|v| !is_missing(v)).map(String::from))
                .collect(),
        );
    }

    let types: Vec<ColumnType> = headers
        .iter()
        .enumerate()
        .map(|(i, name)| infer_column(name, cells.iter().filter_map(|row| row[i].as_deref())))
        .collect();

    let rows = cells
        .into_iter()
        .map(|row| {
            row.into_iter()
                .zip(&types)
                .map(|(cell, ty)| cell.map_or(Value::Null, |text| parse_cell(text, *ty)))
                .collect()
        })
        .collect::<Vec<Vec<Value>>>();

    let columns = headers
        .into_iter()
        .zip(types)
        .map(|(name, ty)| Column::new(name, ty))
        .collect();

    let dataset = Dataset::from_rows(columns, rows)?;
    debug!(rows = dataset.len(), columns = dataset.width(), "CSV parsed");
    Ok(dataset)
}

/// Read a CSV file from disk.
pub fn read_csv_path(path: &Path) -> IngestResult<Dataset> {
    let file = open(path)?;
    let dataset = read_csv(file)?;
    info!(path = %path.display(), rows = dataset.len(), "Read raw extract");
    Ok(dataset)
}

/// Read one CSV member out of a ZIP archive.
pub fn extract_csv(archive: &Path, member: &str) -> IngestResult<Dataset> {
    let file = open(archive)?;
    let mut zip = zip::ZipArchive::new(file).map_err(|source| IngestError::Archive {
        path: archive.to_path_buf(),
        source,
    })?;

    let entry = match zip.by_name(member) {
        Ok(entry) => entry,
        Err(zip::result::ZipError::FileNotFound) => {
            return Err(IngestError::MissingMember {
                path: archive.to_path_buf(),
                member: member.to_string(),
            })
        }
        Err(source) => {
            return Err(IngestError::Archive {
                path: archive.to_path_buf(),
                source,
            })
        }
    };

    let dataset = read_csv(entry)?;
    info!(
        archive = %archive.display(),
        member,
        rows = dataset.len(),
        "Extracted raw extract"
    );
    Ok(dataset)
}

fn open(path: &Path) -> IngestResult<File> {
    File::open(path).map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            IngestError::FileNotFound {
                path: path.to_path_buf(),
            }
        } else {
            IngestError::FileRead {
                path: path.to_path_buf(),
                source: e,
            }
        }
    })
}

fn is_missing(cell: &str) -> bool {
    NA_TOKENS.contains(&cell)
}

fn infer_column<'a>(name: &str, cells: impl Iterator<Item = &'a str>) -> ColumnType {
    let mut ty = ColumnType::Any;
    for cell in cells {
        ty = match ty {
            ColumnType::Text => return ColumnType::Text,
            ColumnType::Any | ColumnType::Integer if cell.parse::<i64>().is_ok() => ColumnType::Integer,
            _ if cell.parse::<f64>().is_ok() => ColumnType::Decimal,
            _ => ColumnType::Text,
        };
    }
    if ty == ColumnType::Integer && name.ends_with("_YEAR") {
        ColumnType::Year
    } else {
        ty
    }
}

fn parse_cell(text: String, ty: ColumnType) -> Value {
    match ty {
        ColumnType::Integer | ColumnType::Year => match text.parse() {
            Ok(n) => Value::Int(n),
            Err(_) => Value::Text(text),
        },
        ColumnType::Decimal => match text.parse() {
            Ok(f) => Value::Float(f),
            Err(_) => Value::Text(text),
        },
        ColumnType::Text | ColumnType::Any => Value::Text(text),
    }
}
