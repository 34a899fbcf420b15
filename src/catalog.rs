use crate::error::DataError;
use crate::storage::GEOMETRY_COLUMN;
use crate::types::{AdminLevel, DatasetRequest};

/// Fixed object layout of the bucket. One aggregation object per GADM level,
/// shared across all variables. Resolvers pick columns, not files, so each
/// level costs at most one fetch per TTL window.
pub const COUNTRY_CODES_PATH: &str = "country_codes.parquet";
pub const VARIABLE_CATALOG_PATH: &str = "available_cols.parquet";
pub const COUNTRY_RANK_PATH: &str = "supporting_data/glocal_0_rank.parquet";
pub const CODEBOOK_PATH: &str = "codebook.csv";

pub fn aggregation_path(level: AdminLevel) -> String {
    format!("annualized_level_{}.parquet", level.as_u8())
}

pub fn missingness_path(level: AdminLevel) -> String {
    format!("supporting_data/glocal_{}_missing.parquet", level.as_u8())
}

pub fn boundary_path(level: AdminLevel, country: &str) -> String {
    format!(
        "simplified_shapefiles/gadm/country_level/gadm_{}/{}.parquet",
        level.as_u8(),
        country
    )
}

/// Columns needed to chart a variable at a level: year and country code
/// always, the level's own region code for subnational levels, then the
/// variable itself.
pub fn aggregation_columns(level: AdminLevel, variable: &str) -> Vec<String> {
    let mut columns = vec!["year".to_string(), "GID_0".to_string()];
    if level != AdminLevel::Country {
        columns.push(level.code_column());
    }
    columns.push(variable.to_string());
    columns
}

/// Missingness and rank tables are keyed by country regardless of level.
fn country_series_columns(variable: &str) -> Vec<String> {
    vec![
        "year".to_string(),
        "GID_0".to_string(),
        variable.to_string(),
    ]
}

/// Boundary attribute columns, plus the geometry itself when requested.
pub fn boundary_columns(level: AdminLevel, spatial: bool) -> Vec<String> {
    let mut columns = vec![level.code_column(), level.name_column()];
    if spatial {
        columns.push(GEOMETRY_COLUMN.to_string());
    }
    columns
}

pub fn resolve_aggregation(level: u8, variable: &str) -> Result<DatasetRequest, DataError> {
    let level = AdminLevel::try_from(level)?;
    Ok(DatasetRequest::tabular(
        aggregation_path(level),
        Some(aggregation_columns(level, variable)),
    ))
}

pub fn resolve_missingness(level: u8, variable: &str) -> Result<DatasetRequest, DataError> {
    let level = AdminLevel::try_from(level)?;
    Ok(DatasetRequest::tabular(
        missingness_path(level),
        Some(country_series_columns(variable)),
    ))
}

pub fn resolve_rank(variable: &str) -> DatasetRequest {
    DatasetRequest::tabular(COUNTRY_RANK_PATH, Some(country_series_columns(variable)))
}

pub fn resolve_boundary(
    level: u8,
    country: &str,
    spatial: bool,
) -> Result<DatasetRequest, DataError> {
    let level = AdminLevel::try_from(level)?;
    let columns = Some(boundary_columns(level, spatial));
    let path = boundary_path(level, country);
    Ok(if spatial {
        DatasetRequest::spatial(path, columns)
    } else {
        DatasetRequest::tabular(path, columns)
    })
}

pub fn resolve_country_codes() -> DatasetRequest {
    DatasetRequest::tabular(COUNTRY_CODES_PATH, None)
}

pub fn resolve_variable_catalog() -> DatasetRequest {
    DatasetRequest::tabular(VARIABLE_CATALOG_PATH, None)
}

pub fn resolve_codebook() -> DatasetRequest {
    DatasetRequest::tabular(CODEBOOK_PATH, None)
}

#[cfg(test)]
mod tests {
    use super::*;

    // ---- paths ----

    #[test]
    fn test_aggregation_path_per_level() {
        assert_eq!(
            aggregation_path(AdminLevel::Country),
            "annualized_level_0.parquet"
        );
        assert_eq!(
            aggregation_path(AdminLevel::County),
            "annualized_level_2.parquet"
        );
    }

    #[test]
    fn test_missingness_path_per_level() {
        assert_eq!(
            missingness_path(AdminLevel::Province),
            "supporting_data/glocal_1_missing.parquet"
        );
    }

    #[test]
    fn test_boundary_path_embeds_level_and_country() {
        assert_eq!(
            boundary_path(AdminLevel::Province, "IND"),
            "simplified_shapefiles/gadm/country_level/gadm_1/IND.parquet"
        );
    }

    // ---- column sets ----

    #[test]
    fn test_level_0_columns() {
        assert_eq!(
            aggregation_columns(AdminLevel::Country, "night_lights"),
            vec!["year", "GID_0", "night_lights"]
        );
    }

    #[test]
    fn test_level_1_columns_add_gid_1() {
        assert_eq!(
            aggregation_columns(AdminLevel::Province, "night_lights"),
            vec!["year", "GID_0", "GID_1", "night_lights"]
        );
    }

    #[test]
    fn test_level_2_columns_add_gid_2_not_gid_1() {
        assert_eq!(
            aggregation_columns(AdminLevel::County, "night_lights"),
            vec!["year", "GID_0", "GID_2", "night_lights"]
        );
    }

    #[test]
    fn test_boundary_columns_without_geometry() {
        assert_eq!(
            boundary_columns(AdminLevel::Province, false),
            vec!["GID_1", "NAME_1"]
        );
    }

    #[test]
    fn test_boundary_columns_with_geometry() {
        assert_eq!(
            boundary_columns(AdminLevel::County, true),
            vec!["GID_2", "NAME_2", "geometry"]
        );
    }

    // ---- resolvers ----

    #[test]
    fn test_resolve_aggregation_valid_levels() {
        for level in 0..=2u8 {
            let req = resolve_aggregation(level, "population").unwrap();
            assert_eq!(req.path, format!("annualized_level_{level}.parquet"));
            assert!(!req.spatial);
        }
    }

    #[test]
    fn test_resolve_aggregation_rejects_level_3() {
        let err = resolve_aggregation(3, "population").unwrap_err();
        assert!(matches!(err, DataError::UnsupportedLevel(3)));
    }

    #[test]
    fn test_resolve_missingness_rejects_bad_level() {
        let err = resolve_missingness(7, "population").unwrap_err();
        assert!(matches!(err, DataError::UnsupportedLevel(7)));
    }

    #[test]
    fn test_resolve_boundary_spatial_flag_carries_through() {
        let spatial = resolve_boundary(1, "IND", true).unwrap();
        assert!(spatial.spatial);
        assert!(spatial
            .columns
            .as_ref()
            .unwrap()
            .contains(&"geometry".to_string()));

        let attrs = resolve_boundary(1, "IND", false).unwrap();
        assert!(!attrs.spatial);
        assert!(!attrs
            .columns
            .as_ref()
            .unwrap()
            .contains(&"geometry".to_string()));
    }

    #[test]
    fn test_reference_objects_read_whole() {
        assert!(resolve_country_codes().columns.is_none());
        assert!(resolve_variable_catalog().columns.is_none());
        assert!(resolve_codebook().columns.is_none());
        assert_eq!(resolve_codebook().path, "codebook.csv");
    }
}
