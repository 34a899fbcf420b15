use thiserror::Error;

/// Errors surfaced by the data layer.
///
/// All variants propagate to the caller unchanged; the webview decides the
/// user-facing message. There is no internal retry and no partial result: a
/// read either yields a complete table or fails with one of these.
#[derive(Debug, Error)]
pub enum DataError {
    #[error("file format not supported: {0}")]
    UnsupportedFormat(String),

    #[error("{0}")]
    UnsupportedOperation(String),

    #[error("failed to fetch {path}: {reason}")]
    FetchFailure { path: String, reason: String },

    #[error("GADM level not supported: {0}")]
    UnsupportedLevel(u8),

    #[error("column '{column}' missing from {path}")]
    SchemaViolation { path: String, column: String },

    #[error("no data available for {country} / {variable}")]
    NoDataAvailable { country: String, variable: String },
}

/// Tauri commands return `Result<T, String>`; this lets `?` bridge into them.
impl From<DataError> for String {
    fn from(err: DataError) -> Self {
        err.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_schema_violation_names_the_column() {
        let err = DataError::SchemaViolation {
            path: "simplified_shapefiles/gadm/country_level/gadm_1/IND.parquet".to_string(),
            column: "NAME_1".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("NAME_1"), "message should name the column: {msg}");
        assert!(msg.contains("IND.parquet"), "message should name the object: {msg}");
    }

    #[test]
    fn test_fetch_failure_names_the_path() {
        let err = DataError::FetchFailure {
            path: "annualized_level_0.parquet".to_string(),
            reason: "HTTP 404".to_string(),
        };
        assert!(err.to_string().contains("annualized_level_0.parquet"));
        assert!(err.to_string().contains("HTTP 404"));
    }

    #[test]
    fn test_converts_to_string_for_command_boundary() {
        let err = DataError::UnsupportedLevel(3);
        let msg: String = err.into();
        assert_eq!(msg, "GADM level not supported: 3");
    }
}
