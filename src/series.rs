use crate::catalog;
use crate::storage::validate_columns;
use crate::types::{AdminLevel, CodebookEntry, CountryEntry, RegionMean, SeriesPoint};
use polars::prelude::*;

/// Drop rows where the selected variable is null. Aggregation tables carry
/// a row per region-year even when the variable was never observed there.
pub fn drop_missing_variable(df: &DataFrame, variable: &str) -> Result<DataFrame, String> {
    df.drop_nulls(Some(&[variable]))
        .map_err(|e| format!("Failed to drop empty {variable} rows: {e}"))
}

/// Restrict a {year, GID_0, variable} table to the selected countries and
/// the inclusive year range.
pub fn filter_series(
    df: &DataFrame,
    countries: &[String],
    variable: &str,
    start_year: i32,
    end_year: i32,
) -> Result<DataFrame, String> {
    let selected = Series::new("selected", countries);
    df.clone()
        .lazy()
        .filter(
            col("GID_0")
                .is_in(lit(selected))
                .and(col("year").gt_eq(lit(start_year)))
                .and(col("year").lt_eq(lit(end_year))),
        )
        .select([col("year"), col("GID_0"), col(variable)])
        .collect()
        .map_err(|e| format!("Failed to filter {variable} series: {e}"))
}

/// Flatten a filtered series table into chart points.
pub fn series_points(df: &DataFrame, variable: &str) -> Result<Vec<SeriesPoint>, String> {
    let year_series = df
        .column("year")
        .and_then(|s| s.cast(&DataType::Int32))
        .map_err(|e| format!("Series table has no usable year column: {e}"))?;
    let years = year_series
        .i32()
        .map_err(|e| format!("Series table has no usable year column: {e}"))?;

    let code_series = df
        .column("GID_0")
        .map_err(|e| format!("Series table has no GID_0 column: {e}"))?;
    let codes = code_series
        .str()
        .map_err(|e| format!("GID_0 column is not text: {e}"))?;

    let value_series = df
        .column(variable)
        .and_then(|s| s.cast(&DataType::Float64))
        .map_err(|e| format!("Series table has no usable {variable} column: {e}"))?;
    let values = value_series
        .f64()
        .map_err(|e| format!("Series table has no usable {variable} column: {e}"))?;

    let mut points = Vec::with_capacity(df.height());
    for i in 0..df.height() {
        if let (Some(year), Some(code)) = (years.get(i), codes.get(i)) {
            points.push(SeriesPoint {
                year,
                country_code: code.to_string(),
                value: values.get(i),
            });
        }
    }
    Ok(points)
}

/// Per-region mean of the variable for one country over the selected year
/// span, at the subnational display level. Feeds the choropleth.
pub fn subnational_means(
    df: &DataFrame,
    level: AdminLevel,
    country: &str,
    variable: &str,
    start_year: i32,
    end_year: i32,
) -> Result<Vec<RegionMean>, String> {
    let code_col = level.code_column();

    let grouped = df
        .clone()
        .lazy()
        .filter(
            col("GID_0")
                .eq(lit(country))
                .and(col("year").gt_eq(lit(start_year)))
                .and(col("year").lt_eq(lit(end_year))),
        )
        .group_by([col(&code_col)])
        .agg([col(variable).mean()])
        .collect()
        .map_err(|e| format!("Failed to average {variable} by {code_col}: {e}"))?;

    let code_series = grouped
        .column(&code_col)
        .map_err(|e| format!("Grouped table lost {code_col}: {e}"))?;
    let codes = code_series
        .str()
        .map_err(|e| format!("{code_col} column is not text: {e}"))?;

    let value_series = grouped
        .column(variable)
        .and_then(|s| s.cast(&DataType::Float64))
        .map_err(|e| format!("Grouped table lost {variable}: {e}"))?;
    let values = value_series
        .f64()
        .map_err(|e| format!("Grouped table lost {variable}: {e}"))?;

    let mut means = Vec::with_capacity(grouped.height());
    for i in 0..grouped.height() {
        if let Some(code) = codes.get(i) {
            means.push(RegionMean {
                region_code: code.to_string(),
                value: values.get(i),
            });
        }
    }
    Ok(means)
}

/// Variables offered in the sidebar: every catalog column except the keys.
pub fn variable_names(catalog_df: &DataFrame) -> Result<Vec<String>, String> {
    validate_columns(
        catalog_df,
        &["colname".to_string()],
        catalog::VARIABLE_CATALOG_PATH,
    )?;
    let names = catalog_df
        .column("colname")
        .and_then(|s| s.str().map(|c| c.clone()))
        .map_err(|e| format!("Variable catalog is not text: {e}"))?;

    Ok(names
        .into_iter()
        .flatten()
        .filter(|name| *name != "year" && *name != "GID_0")
        .map(String::from)
        .collect())
}

/// Sidebar country list, sorted by display name.
pub fn country_entries(df: &DataFrame) -> Result<Vec<CountryEntry>, String> {
    validate_columns(
        df,
        &["country_code".to_string(), "country_name".to_string()],
        catalog::COUNTRY_CODES_PATH,
    )?;

    let codes = df
        .column("country_code")
        .and_then(|s| s.str().map(|c| c.clone()))
        .map_err(|e| format!("country_code column is not text: {e}"))?;
    let names = df
        .column("country_name")
        .and_then(|s| s.str().map(|c| c.clone()))
        .map_err(|e| format!("country_name column is not text: {e}"))?;

    let mut entries = Vec::with_capacity(df.height());
    for i in 0..df.height() {
        if let (Some(code), Some(name)) = (codes.get(i), names.get(i)) {
            entries.push(CountryEntry {
                country_code: code.to_string(),
                country_name: name.to_string(),
            });
        }
    }
    entries.sort_by(|a, b| a.country_name.cmp(&b.country_name));
    Ok(entries)
}

/// Map a display name back to its fixed-width country code.
pub fn country_code_for(df: &DataFrame, country_name: &str) -> Result<String, String> {
    country_entries(df)?
        .into_iter()
        .find(|entry| entry.country_name == country_name)
        .map(|entry| entry.country_code)
        .ok_or_else(|| format!("Unknown country: {country_name}"))
}

/// Codebook rows for the documentation panel.
pub fn codebook_entries(df: &DataFrame) -> Result<Vec<CodebookEntry>, String> {
    validate_columns(
        df,
        &["colname".to_string(), "description".to_string()],
        catalog::CODEBOOK_PATH,
    )?;

    let names = df
        .column("colname")
        .and_then(|s| s.str().map(|c| c.clone()))
        .map_err(|e| format!("colname column is not text: {e}"))?;
    let descriptions = df
        .column("description")
        .and_then(|s| s.str().map(|c| c.clone()))
        .map_err(|e| format!("description column is not text: {e}"))?;

    let mut entries = Vec::with_capacity(df.height());
    for i in 0..df.height() {
        if let Some(name) = names.get(i) {
            entries.push(CodebookEntry {
                colname: name.to_string(),
                description: descriptions.get(i).unwrap_or_default().to_string(),
            });
        }
    }
    Ok(entries)
}

#[cfg(test)]
mod tests {
    use super::*;
    use polars::df;

    fn aggregation_table() -> DataFrame {
        df!(
            "year" => [2009i32, 2010, 2011, 2009, 2010, 2011],
            "GID_0" => ["IND", "IND", "IND", "BRA", "BRA", "BRA"],
            "night_lights" => [Some(0.5f64), Some(0.7), None, Some(0.2), Some(0.3), Some(0.4)],
        )
        .unwrap()
    }

    // ---- drop_missing_variable ----

    #[test]
    fn test_drop_missing_removes_null_rows_only() {
        let kept = drop_missing_variable(&aggregation_table(), "night_lights").unwrap();
        assert_eq!(kept.height(), 5);
        assert_eq!(
            kept.column("night_lights").unwrap().null_count(),
            0,
            "no nulls should survive"
        );
    }

    // ---- filter_series ----

    #[test]
    fn test_filter_series_by_country_and_year_range() {
        let countries = vec!["IND".to_string()];
        let filtered =
            filter_series(&aggregation_table(), &countries, "night_lights", 2009, 2010).unwrap();
        assert_eq!(filtered.height(), 2);
    }

    #[test]
    fn test_filter_series_year_bounds_are_inclusive() {
        let countries = vec!["BRA".to_string()];
        let filtered =
            filter_series(&aggregation_table(), &countries, "night_lights", 2009, 2011).unwrap();
        assert_eq!(filtered.height(), 3);
    }

    #[test]
    fn test_filter_series_with_comparators() {
        // primary country plus one comparator
        let countries = vec!["IND".to_string(), "BRA".to_string()];
        let filtered =
            filter_series(&aggregation_table(), &countries, "night_lights", 2010, 2010).unwrap();
        assert_eq!(filtered.height(), 2);
    }

    // ---- series_points ----

    #[test]
    fn test_series_points_carry_nulls_as_none() {
        let countries = vec!["IND".to_string()];
        let filtered =
            filter_series(&aggregation_table(), &countries, "night_lights", 2009, 2011).unwrap();
        let points = series_points(&filtered, "night_lights").unwrap();
        assert_eq!(points.len(), 3);

        let missing: Vec<_> = points.iter().filter(|p| p.value.is_none()).collect();
        assert_eq!(missing.len(), 1);
        assert_eq!(missing[0].year, 2011);
        assert_eq!(missing[0].country_code, "IND");
    }

    // ---- subnational_means ----

    #[test]
    fn test_subnational_means_average_over_years() {
        let table = df!(
            "year" => [2010i32, 2011, 2010, 2011],
            "GID_0" => ["IND", "IND", "IND", "IND"],
            "GID_1" => ["IND.1_1", "IND.1_1", "IND.2_1", "IND.2_1"],
            "night_lights" => [1.0f64, 3.0, 10.0, 20.0],
        )
        .unwrap();

        let mut means = subnational_means(
            &table,
            AdminLevel::Province,
            "IND",
            "night_lights",
            2010,
            2011,
        )
        .unwrap();
        means.sort_by(|a, b| a.region_code.cmp(&b.region_code));

        assert_eq!(means.len(), 2);
        assert_eq!(means[0].region_code, "IND.1_1");
        assert!((means[0].value.unwrap() - 2.0).abs() < 1e-9);
        assert!((means[1].value.unwrap() - 15.0).abs() < 1e-9);
    }

    #[test]
    fn test_subnational_means_exclude_other_countries_and_years() {
        let table = df!(
            "year" => [2010i32, 2010, 1999],
            "GID_0" => ["IND", "BRA", "IND"],
            "GID_1" => ["IND.1_1", "BRA.1_1", "IND.1_1"],
            "night_lights" => [2.0f64, 99.0, 99.0],
        )
        .unwrap();

        let means = subnational_means(
            &table,
            AdminLevel::Province,
            "IND",
            "night_lights",
            2010,
            2011,
        )
        .unwrap();

        assert_eq!(means.len(), 1);
        assert_eq!(means[0].region_code, "IND.1_1");
        assert!((means[0].value.unwrap() - 2.0).abs() < 1e-9);
    }

    // ---- reference tables ----

    #[test]
    fn test_variable_names_exclude_key_columns() {
        let catalog_df = df!(
            "colname" => ["year", "GID_0", "night_lights", "population"],
        )
        .unwrap();
        let names = variable_names(&catalog_df).unwrap();
        assert_eq!(names, vec!["night_lights", "population"]);
    }

    #[test]
    fn test_country_entries_sorted_by_name() {
        let codes = df!(
            "country_code" => ["IND", "BRA", "PRY"],
            "country_name" => ["India", "Brazil", "Paraguay"],
        )
        .unwrap();
        let entries = country_entries(&codes).unwrap();
        let names: Vec<_> = entries.iter().map(|e| e.country_name.as_str()).collect();
        assert_eq!(names, vec!["Brazil", "India", "Paraguay"]);
    }

    #[test]
    fn test_country_entries_missing_column_is_schema_violation() {
        let codes = df!("country_code" => ["IND"]).unwrap();
        let err = country_entries(&codes).unwrap_err();
        assert!(
            err.contains("country_name"),
            "error should name the missing column: {err}"
        );
    }

    #[test]
    fn test_country_code_lookup() {
        let codes = df!(
            "country_code" => ["IND", "BRA"],
            "country_name" => ["India", "Brazil"],
        )
        .unwrap();
        assert_eq!(country_code_for(&codes, "India").unwrap(), "IND");
        assert!(country_code_for(&codes, "Atlantis").is_err());
    }

    #[test]
    fn test_codebook_entries() {
        let codebook = df!(
            "colname" => ["night_lights"],
            "description" => ["Mean nighttime luminosity"],
        )
        .unwrap();
        let entries = codebook_entries(&codebook).unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].colname, "night_lights");
        assert_eq!(entries[0].description, "Mean nighttime luminosity");
    }
}
