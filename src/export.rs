use chrono::Utc;
use polars::prelude::*;

/// Serialize a table to CSV text for a user-initiated download. The only
/// contract is a faithful round-trip of rows and columns.
pub fn table_to_csv(df: &DataFrame) -> Result<String, String> {
    let mut buf = Vec::new();
    let mut out = df.clone();
    CsvWriter::new(&mut buf)
        .include_header(true)
        .finish(&mut out)
        .map_err(|e| format!("Failed to serialize CSV: {e}"))?;
    String::from_utf8(buf).map_err(|e| format!("Serialized CSV was not valid UTF-8: {e}"))
}

/// Suggested download filename, date-stamped.
pub fn csv_filename(variable: &str, country: &str) -> String {
    format!(
        "glocal_{variable}_{country}_{}.csv",
        Utc::now().format("%Y%m%d")
    )
}
