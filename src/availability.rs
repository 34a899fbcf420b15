use crate::error::DataError;
use polars::prelude::*;
use serde::Serialize;

/// Label used when the missingness table itself is malformed; the table is
/// passed in already fetched, so there is no object path to report.
const TABLE_LABEL: &str = "missingness table";

/// Inclusive year bounds over which real data exists for a country and
/// variable at one GADM level. `single_year` marks windows that were
/// widened from a one-year span so the Trends view can show its notice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct AvailabilityWindow {
    pub min_year: i32,
    pub max_year: i32,
    pub single_year: bool,
}

/// Scan a missingness table for the years where the variable has any data
/// for the country (missing fraction strictly below 1), and return the
/// inclusive year range.
///
/// A one-year range is widened by a year on the upper bound so the year
/// slider downstream keeps a non-degenerate span. No qualifying rows at
/// all → `NoDataAvailable`, never garbage bounds.
pub fn compute_window(
    missingness: &DataFrame,
    country: &str,
    variable: &str,
) -> Result<AvailabilityWindow, DataError> {
    for column in ["year", "GID_0", variable] {
        if missingness.column(column).is_err() {
            return Err(DataError::SchemaViolation {
                path: TABLE_LABEL.to_string(),
                column: column.to_string(),
            });
        }
    }

    let filtered = missingness
        .clone()
        .lazy()
        .filter(col("GID_0").eq(lit(country)).and(col(variable).lt(lit(1.0))))
        .select([col("year")])
        .collect()
        .map_err(|_| DataError::SchemaViolation {
            path: TABLE_LABEL.to_string(),
            column: variable.to_string(),
        })?;

    if filtered.height() == 0 {
        return Err(DataError::NoDataAvailable {
            country: country.to_string(),
            variable: variable.to_string(),
        });
    }

    let years = filtered
        .column("year")
        .and_then(|s| s.cast(&DataType::Int32))
        .map_err(|_| DataError::SchemaViolation {
            path: TABLE_LABEL.to_string(),
            column: "year".to_string(),
        })?;
    let years = years.i32().map_err(|_| DataError::SchemaViolation {
        path: TABLE_LABEL.to_string(),
        column: "year".to_string(),
    })?;

    let (min_year, max_year) = match (years.min(), years.max()) {
        (Some(min), Some(max)) => (min, max),
        _ => {
            return Err(DataError::NoDataAvailable {
                country: country.to_string(),
                variable: variable.to_string(),
            })
        }
    };

    if min_year == max_year {
        Ok(AvailabilityWindow {
            min_year,
            max_year: max_year + 1,
            single_year: true,
        })
    } else {
        Ok(AvailabilityWindow {
            min_year,
            max_year,
            single_year: false,
        })
    }
}
