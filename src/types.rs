use crate::error::DataError;
use serde::{Deserialize, Serialize};

/// GADM administrative granularity: 0 = country, 1 = state/province,
/// 2 = county-equivalent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AdminLevel {
    Country,
    Province,
    County,
}

impl AdminLevel {
    pub fn as_u8(self) -> u8 {
        match self {
            AdminLevel::Country => 0,
            AdminLevel::Province => 1,
            AdminLevel::County => 2,
        }
    }

    /// Region-code column for this level ("GID_0", "GID_1", "GID_2").
    pub fn code_column(self) -> String {
        format!("GID_{}", self.as_u8())
    }

    /// Region-name column for this level ("NAME_0", "NAME_1", "NAME_2").
    pub fn name_column(self) -> String {
        format!("NAME_{}", self.as_u8())
    }

    /// Level at which subnational exhibits are drawn: country and province
    /// selections map down to province boundaries, county stays county.
    pub fn subnational(self) -> AdminLevel {
        match self {
            AdminLevel::Country | AdminLevel::Province => AdminLevel::Province,
            AdminLevel::County => AdminLevel::County,
        }
    }
}

impl TryFrom<u8> for AdminLevel {
    type Error = DataError;

    fn try_from(level: u8) -> Result<Self, Self::Error> {
        match level {
            0 => Ok(AdminLevel::Country),
            1 => Ok(AdminLevel::Province),
            2 => Ok(AdminLevel::County),
            other => Err(DataError::UnsupportedLevel(other)),
        }
    }
}

/// One read against the bucket, as the cache sees it: the resolved object
/// path, an optional column projection, and whether the object is decoded
/// as a geometry-carrying table. Equal values must fingerprint equally.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DatasetRequest {
    pub path: String,
    pub columns: Option<Vec<String>>,
    pub spatial: bool,
}

impl DatasetRequest {
    pub fn tabular(path: impl Into<String>, columns: Option<Vec<String>>) -> Self {
        Self {
            path: path.into(),
            columns,
            spatial: false,
        }
    }

    pub fn spatial(path: impl Into<String>, columns: Option<Vec<String>>) -> Self {
        Self {
            path: path.into(),
            columns,
            spatial: true,
        }
    }
}

/// A country as presented in the sidebar selector.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CountryEntry {
    pub country_code: String,
    pub country_name: String,
}

/// One point of a chart series: a year, the country it belongs to, and the
/// variable value (None where the table holds a null).
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct SeriesPoint {
    pub year: i32,
    pub country_code: String,
    pub value: Option<f64>,
}

/// A subnational region as listed for the selected country and level.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct RegionEntry {
    pub region_code: String,
    pub region_name: String,
}

/// Per-region mean over the selected year span, for the choropleth.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct RegionMean {
    pub region_code: String,
    pub value: Option<f64>,
}

/// One row of the codebook reference table.
#[derive(Debug, Clone, Serialize)]
pub struct CodebookEntry {
    pub colname: String,
    pub description: String,
}

/// A CSV download handed to the webview: suggested filename plus content.
#[derive(Debug, Clone, Serialize)]
pub struct CsvDownload {
    pub filename: String,
    pub content: String,
}
