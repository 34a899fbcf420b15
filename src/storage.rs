use crate::error::DataError;
use crate::types::DatasetRequest;
use geozero::{CoordDimensions, ToWkb};
use polars::prelude::*;
use reqwest::Client;
use std::io::Cursor;

/// Geometry column name used by the GeoParquet boundary objects.
pub const GEOMETRY_COLUMN: &str = "geometry";

const DEFAULT_BASE_URL: &str = "https://storage.googleapis.com";
const DEFAULT_BUCKET: &str = "glocal";
const USER_AGENT: &str = "GlocalView/1.0";

/// Recognized object formats, keyed by file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ObjectFormat {
    Parquet,
    Csv,
    Shapefile,
}

/// Remote storage endpoint and credentials, supplied by the environment.
pub struct StorageConfig {
    pub base_url: String,
    pub bucket: String,
    pub auth_token: Option<String>,
}

impl StorageConfig {
    pub fn from_env() -> Self {
        Self {
            base_url: std::env::var("GLOCAL_STORAGE_BASE_URL")
                .unwrap_or_else(|_| DEFAULT_BASE_URL.to_string()),
            bucket: std::env::var("GLOCAL_BUCKET").unwrap_or_else(|_| DEFAULT_BUCKET.to_string()),
            auth_token: std::env::var("GLOCAL_STORAGE_TOKEN").ok(),
        }
    }
}

/// Reader for the read-only bucket of pre-computed aggregation objects.
/// One GET per `read_table` call; callers wanting reuse go through the cache.
pub struct BucketReader {
    client: Client,
    config: StorageConfig,
}

impl BucketReader {
    pub fn new(config: StorageConfig) -> Result<Self, String> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| format!("Failed to build storage client: {e}"))?;

        Ok(Self { client, config })
    }

    /// Build the object URL for a path in the configured bucket.
    fn object_url(&self, path: &str) -> String {
        format!(
            "{}/{}/{}",
            self.config.base_url.trim_end_matches('/'),
            self.config.bucket,
            path
        )
    }

    /// Fetch an object and decode it into an in-memory table.
    ///
    /// Request validation (recognized extension, column subsetting only for
    /// parquet) happens before any network I/O, so an invalid request never
    /// costs a fetch. A network or decode failure propagates as
    /// `FetchFailure`: single attempt, no retry.
    pub async fn read_table(&self, request: &DatasetRequest) -> Result<DataFrame, DataError> {
        let format = validate_request(request)?;
        let bytes = self.fetch_bytes(&request.path).await?;

        match format {
            ObjectFormat::Parquet => {
                decode_parquet(bytes, request.columns.as_deref(), &request.path)
            }
            ObjectFormat::Csv => decode_csv(bytes, &request.path),
            ObjectFormat::Shapefile => decode_shapefile(bytes, &request.path),
        }
    }

    async fn fetch_bytes(&self, path: &str) -> Result<Vec<u8>, DataError> {
        let url = self.object_url(path);

        let mut request = self.client.get(&url);
        if let Some(token) = &self.config.auth_token {
            request = request.bearer_auth(token);
        }

        let resp = request.send().await.map_err(|e| DataError::FetchFailure {
            path: path.to_string(),
            reason: format!("network error: {e}"),
        })?;

        if !resp.status().is_success() {
            return Err(DataError::FetchFailure {
                path: path.to_string(),
                reason: format!("storage returned {}", resp.status()),
            });
        }

        let bytes = resp.bytes().await.map_err(|e| DataError::FetchFailure {
            path: path.to_string(),
            reason: format!("failed to read body: {e}"),
        })?;

        Ok(bytes.to_vec())
    }
}

/// Check a request against the format rules before any I/O happens.
///
/// Tabular reads accept `.parquet` and `.csv`; spatial reads accept
/// `.parquet` (GeoParquet) and `.shp`. Column subsetting is a parquet-only
/// capability.
pub fn validate_request(request: &DatasetRequest) -> Result<ObjectFormat, DataError> {
    let format = if request.path.ends_with(".parquet") {
        ObjectFormat::Parquet
    } else if request.path.ends_with(".csv") {
        ObjectFormat::Csv
    } else if request.path.ends_with(".shp") {
        ObjectFormat::Shapefile
    } else {
        return Err(DataError::UnsupportedFormat(request.path.clone()));
    };

    match format {
        ObjectFormat::Csv if request.spatial => {
            return Err(DataError::UnsupportedFormat(request.path.clone()));
        }
        ObjectFormat::Shapefile if !request.spatial => {
            return Err(DataError::UnsupportedFormat(request.path.clone()));
        }
        _ => {}
    }

    if request.columns.is_some() {
        match format {
            ObjectFormat::Csv => {
                return Err(DataError::UnsupportedOperation(
                    "columns not supported for CSV files".to_string(),
                ));
            }
            ObjectFormat::Shapefile => {
                return Err(DataError::UnsupportedOperation(
                    "columns not supported for shapefiles".to_string(),
                ));
            }
            ObjectFormat::Parquet => {}
        }
    }

    Ok(format)
}

/// Every required column must be present after a fetch; reference objects
/// with a drifted schema fail loudly instead of producing partial records.
pub fn validate_columns(df: &DataFrame, required: &[String], path: &str) -> Result<(), DataError> {
    for column in required {
        if df.column(column).is_err() {
            return Err(DataError::SchemaViolation {
                path: path.to_string(),
                column: column.clone(),
            });
        }
    }
    Ok(())
}

fn decode_parquet(
    bytes: Vec<u8>,
    columns: Option<&[String]>,
    path: &str,
) -> Result<DataFrame, DataError> {
    ParquetReader::new(Cursor::new(bytes))
        .with_columns(columns.map(|c| c.to_vec()))
        .finish()
        .map_err(|e| DataError::FetchFailure {
            path: path.to_string(),
            reason: format!("parquet decode failed: {e}"),
        })
}

fn decode_csv(bytes: Vec<u8>, path: &str) -> Result<DataFrame, DataError> {
    CsvReadOptions::default()
        .into_reader_with_file_handle(Cursor::new(bytes))
        .finish()
        .map_err(|e| DataError::FetchFailure {
            path: path.to_string(),
            reason: format!("csv decode failed: {e}"),
        })
}

/// Decode a lone `.shp` object into a geometry-only table (WKB per row).
/// Attribute columns live in a separate `.dbf` the bucket never pairs with
/// the shapes, so none are produced here.
fn decode_shapefile(bytes: Vec<u8>, path: &str) -> Result<DataFrame, DataError> {
    let reader =
        shapefile::ShapeReader::new(Cursor::new(bytes)).map_err(|e| DataError::FetchFailure {
            path: path.to_string(),
            reason: format!("shapefile decode failed: {e}"),
        })?;

    let shapes = reader.read().map_err(|e| DataError::FetchFailure {
        path: path.to_string(),
        reason: format!("shapefile decode failed: {e}"),
    })?;

    let mut wkbs: Vec<Vec<u8>> = Vec::with_capacity(shapes.len());
    for shape in shapes {
        let geometry =
            geo_types::Geometry::<f64>::try_from(shape).map_err(|e| DataError::FetchFailure {
                path: path.to_string(),
                reason: format!("unsupported shape type: {e}"),
            })?;
        let wkb = geometry
            .to_wkb(CoordDimensions::xy())
            .map_err(|e| DataError::FetchFailure {
                path: path.to_string(),
                reason: format!("geometry encoding failed: {e}"),
            })?;
        wkbs.push(wkb);
    }

    let slices: Vec<&[u8]> = wkbs.iter().map(|w| w.as_slice()).collect();
    DataFrame::new(vec![Series::new(GEOMETRY_COLUMN, slices)]).map_err(|e| {
        DataError::FetchFailure {
            path: path.to_string(),
            reason: format!("failed to assemble geometry table: {e}"),
        }
    })
}
