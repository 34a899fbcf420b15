use crate::cache::DataCache;
use crate::catalog;
use crate::error::DataError;
use crate::storage::{validate_columns, BucketReader, GEOMETRY_COLUMN};
use crate::types::{AdminLevel, RegionEntry};
use geozero::wkb::Wkb;
use geozero::ToJson;
use polars::prelude::*;
use serde_json::{json, Map, Value};

/// Fetch the simplified GADM boundary table for a country at a level,
/// through the cache. With `spatial` set the table carries a WKB geometry
/// column; without it only the region code/name attributes are read.
///
/// Every expected column is checked after the fetch, so malformed upstream
/// reference data fails here with the missing column named instead of
/// leaking a partial record downstream.
pub async fn fetch_boundary(
    cache: &DataCache,
    reader: &BucketReader,
    level: u8,
    country: &str,
    spatial: bool,
) -> Result<DataFrame, DataError> {
    let request = catalog::resolve_boundary(level, country, spatial)?;
    let df = cache
        .get_or_fetch(&request, || reader.read_table(&request))
        .await?;

    let required = request.columns.clone().unwrap_or_default();
    validate_columns(&df, &required, &request.path)?;
    Ok(df)
}

/// Convert a boundary table (attributes + WKB geometry) into a GeoJSON
/// FeatureCollection for the choropleth renderer. Pure transform, no I/O.
pub fn to_feature_collection(df: &DataFrame, level: AdminLevel) -> Result<Value, DataError> {
    let code_col = level.code_column();
    let name_col = level.name_column();
    let required = vec![
        code_col.clone(),
        name_col.clone(),
        GEOMETRY_COLUMN.to_string(),
    ];
    validate_columns(df, &required, "boundary table")?;

    let codes = df
        .column(&code_col)
        .and_then(|s| s.str().map(|c| c.clone()))
        .map_err(|_| schema_violation(&code_col))?;
    let names = df
        .column(&name_col)
        .and_then(|s| s.str().map(|c| c.clone()))
        .map_err(|_| schema_violation(&name_col))?;
    let geometries = df
        .column(GEOMETRY_COLUMN)
        .and_then(|s| s.binary().map(|c| c.clone()))
        .map_err(|_| schema_violation(GEOMETRY_COLUMN))?;

    let mut features = Vec::with_capacity(df.height());
    for i in 0..df.height() {
        let geometry = match geometries.get(i) {
            Some(wkb) => {
                let geojson = Wkb(wkb.to_vec())
                    .to_json()
                    .map_err(|_| schema_violation(GEOMETRY_COLUMN))?;
                serde_json::from_str::<Value>(&geojson)
                    .map_err(|_| schema_violation(GEOMETRY_COLUMN))?
            }
            None => Value::Null,
        };

        let mut properties = Map::new();
        properties.insert(
            code_col.clone(),
            codes.get(i).map(Value::from).unwrap_or(Value::Null),
        );
        properties.insert(
            name_col.clone(),
            names.get(i).map(Value::from).unwrap_or(Value::Null),
        );

        features.push(json!({
            "type": "Feature",
            "properties": Value::Object(properties),
            "geometry": geometry,
        }));
    }

    Ok(json!({
        "type": "FeatureCollection",
        "features": features,
    }))
}

/// Flatten a boundary attribute table into region entries for the UI.
pub fn region_entries(df: &DataFrame, level: AdminLevel) -> Result<Vec<RegionEntry>, String> {
    let code_col = level.code_column();
    let name_col = level.name_column();
    validate_columns(df, &[code_col.clone(), name_col.clone()], "boundary table")?;

    let codes = df
        .column(&code_col)
        .and_then(|s| s.str().map(|c| c.clone()))
        .map_err(|e| format!("{code_col} column is not text: {e}"))?;
    let names = df
        .column(&name_col)
        .and_then(|s| s.str().map(|c| c.clone()))
        .map_err(|e| format!("{name_col} column is not text: {e}"))?;

    let mut entries = Vec::with_capacity(df.height());
    for i in 0..df.height() {
        if let (Some(code), Some(name)) = (codes.get(i), names.get(i)) {
            entries.push(RegionEntry {
                region_code: code.to_string(),
                region_name: name.to_string(),
            });
        }
    }
    Ok(entries)
}

fn schema_violation(column: &str) -> DataError {
    DataError::SchemaViolation {
        path: "boundary table".to_string(),
        column: column.to_string(),
    }
}
