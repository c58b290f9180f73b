//! CSV rendering of query results.

use std::io::Write;

use csv::WriterBuilder;

use crate::dataset::Dataset;

/// Write `data` as CSV: one header row, then one record per row. Nulls are
/// written as empty fields.
pub fn write_csv<W: Write>(data: &Dataset, writer: W) -> Result<(), csv::Error> {
    let mut writer = WriterBuilder::new().has_headers(true).from_writer(writer);

    writer.write_record(data.column_names())?;
    for row in data.rows() {
        writer.write_record(row.iter().map(|value| value.to_string()))?;
    }
    writer.flush()?;
    Ok(())
}

/// Render `data` as a CSV string.
pub fn to_csv_string(data: &Dataset) -> Result<String, csv::Error> {
    let mut buffer = Vec::new();
    write_csv(data, &mut buffer)?;
    Ok(String::from_utf8_lossy(&buffer).into_owned())
}
