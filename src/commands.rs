use crate::availability::{self, AvailabilityWindow};
use crate::boundary;
use crate::cache::DataCache;
use crate::catalog;
use crate::error::DataError;
use crate::export;
use crate::series;
use crate::storage::BucketReader;
use crate::types::{
    AdminLevel, CodebookEntry, CountryEntry, CsvDownload, DatasetRequest, RegionEntry, RegionMean,
    SeriesPoint,
};
use polars::prelude::DataFrame;
use tauri::State;

pub struct StorageState(pub BucketReader);

/// All reads funnel through the shared cache; repeated UI interactions
/// within the TTL window cost no network I/O.
async fn read_cached(
    storage: &StorageState,
    cache: &DataCache,
    request: &DatasetRequest,
) -> Result<DataFrame, DataError> {
    cache
        .get_or_fetch(request, || storage.0.read_table(request))
        .await
}

#[tauri::command]
pub async fn get_countries(
    storage: State<'_, StorageState>,
    cache: State<'_, DataCache>,
) -> Result<Vec<CountryEntry>, String> {
    let request = catalog::resolve_country_codes();
    let df = read_cached(&storage, &cache, &request).await?;
    series::country_entries(&df)
}

#[tauri::command]
pub async fn get_country_code(
    country_name: String,
    storage: State<'_, StorageState>,
    cache: State<'_, DataCache>,
) -> Result<String, String> {
    let request = catalog::resolve_country_codes();
    let df = read_cached(&storage, &cache, &request).await?;
    series::country_code_for(&df, &country_name)
}

#[tauri::command]
pub async fn get_variables(
    storage: State<'_, StorageState>,
    cache: State<'_, DataCache>,
) -> Result<Vec<String>, String> {
    let request = catalog::resolve_variable_catalog();
    let df = read_cached(&storage, &cache, &request).await?;
    series::variable_names(&df)
}

#[tauri::command]
pub async fn get_codebook(
    storage: State<'_, StorageState>,
    cache: State<'_, DataCache>,
) -> Result<Vec<CodebookEntry>, String> {
    let request = catalog::resolve_codebook();
    let df = read_cached(&storage, &cache, &request).await?;
    series::codebook_entries(&df)
}

/// Years for which any data exists at the selected level, driving the year
/// slider. Recomputed on every selection change; only the underlying
/// missingness fetch is cached.
#[tauri::command]
pub async fn get_availability(
    level: u8,
    country_code: String,
    variable: String,
    storage: State<'_, StorageState>,
    cache: State<'_, DataCache>,
) -> Result<AvailabilityWindow, String> {
    let request = catalog::resolve_missingness(level, &variable)?;
    let df = read_cached(&storage, &cache, &request).await?;
    Ok(availability::compute_window(&df, &country_code, &variable)?)
}

#[tauri::command]
pub async fn get_trend_series(
    country_codes: Vec<String>,
    variable: String,
    start_year: i32,
    end_year: i32,
    storage: State<'_, StorageState>,
    cache: State<'_, DataCache>,
) -> Result<Vec<SeriesPoint>, String> {
    let request = catalog::resolve_aggregation(0, &variable)?;
    let df = read_cached(&storage, &cache, &request).await?;
    let df = series::drop_missing_variable(&df, &variable)?;
    let filtered = series::filter_series(&df, &country_codes, &variable, start_year, end_year)?;
    series::series_points(&filtered, &variable)
}

#[tauri::command]
pub async fn get_rank_series(
    country_codes: Vec<String>,
    variable: String,
    start_year: i32,
    end_year: i32,
    storage: State<'_, StorageState>,
    cache: State<'_, DataCache>,
) -> Result<Vec<SeriesPoint>, String> {
    let request = catalog::resolve_rank(&variable);
    let df = read_cached(&storage, &cache, &request).await?;
    let df = series::drop_missing_variable(&df, &variable)?;
    let filtered = series::filter_series(&df, &country_codes, &variable, start_year, end_year)?;
    series::series_points(&filtered, &variable)
}

/// Fraction-of-values-missing series. Nulls are kept here since a missing
/// fraction is itself the data being charted.
#[tauri::command]
pub async fn get_missing_series(
    level: u8,
    country_codes: Vec<String>,
    variable: String,
    start_year: i32,
    end_year: i32,
    storage: State<'_, StorageState>,
    cache: State<'_, DataCache>,
) -> Result<Vec<SeriesPoint>, String> {
    let request = catalog::resolve_missingness(level, &variable)?;
    let df = read_cached(&storage, &cache, &request).await?;
    let filtered = series::filter_series(&df, &country_codes, &variable, start_year, end_year)?;
    series::series_points(&filtered, &variable)
}

#[tauri::command]
pub async fn get_subnational_means(
    level: u8,
    country_code: String,
    variable: String,
    start_year: i32,
    end_year: i32,
    storage: State<'_, StorageState>,
    cache: State<'_, DataCache>,
) -> Result<Vec<RegionMean>, String> {
    let display = AdminLevel::try_from(level)?.subnational();
    let request = catalog::resolve_aggregation(display.as_u8(), &variable)?;
    let df = read_cached(&storage, &cache, &request).await?;
    let df = series::drop_missing_variable(&df, &variable)?;
    series::subnational_means(
        &df,
        display,
        &country_code,
        &variable,
        start_year,
        end_year,
    )
}

#[tauri::command]
pub async fn get_boundary(
    level: u8,
    country_code: String,
    storage: State<'_, StorageState>,
    cache: State<'_, DataCache>,
) -> Result<serde_json::Value, String> {
    let display = AdminLevel::try_from(level)?.subnational();
    let df = boundary::fetch_boundary(
        &cache,
        &storage.0,
        display.as_u8(),
        &country_code,
        true,
    )
    .await?;
    Ok(boundary::to_feature_collection(&df, display)?)
}

#[tauri::command]
pub async fn get_regions(
    level: u8,
    country_code: String,
    storage: State<'_, StorageState>,
    cache: State<'_, DataCache>,
) -> Result<Vec<RegionEntry>, String> {
    let display = AdminLevel::try_from(level)?.subnational();
    let df = boundary::fetch_boundary(
        &cache,
        &storage.0,
        display.as_u8(),
        &country_code,
        false,
    )
    .await?;
    boundary::region_entries(&df, display)
}

#[tauri::command]
pub async fn export_trend_csv(
    country_codes: Vec<String>,
    variable: String,
    start_year: i32,
    end_year: i32,
    storage: State<'_, StorageState>,
    cache: State<'_, DataCache>,
) -> Result<CsvDownload, String> {
    let request = catalog::resolve_aggregation(0, &variable)?;
    let df = read_cached(&storage, &cache, &request).await?;
    let df = series::drop_missing_variable(&df, &variable)?;
    let filtered = series::filter_series(&df, &country_codes, &variable, start_year, end_year)?;

    let content = export::table_to_csv(&filtered)?;
    let primary = country_codes.first().map(String::as_str).unwrap_or("all");
    Ok(CsvDownload {
        filename: export::csv_filename(&variable, primary),
        content,
    })
}
