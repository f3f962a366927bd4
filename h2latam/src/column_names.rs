//! This module stores the column names used by the facility dataframe. The `source` submodule
//! holds the header names of the upstream facility export and must be kept in sync with it; the
//! remaining constants are the canonical names the dataset is normalised to at load time.

/// Header names as they appear in the facility spreadsheet.
pub mod source {
    pub const COUNTRY: &str = "Country";
    pub const TECHNOLOGY: &str = "Technology";
    pub const TECHNOLOGY_DETAIL: &str = "Technology_electricity_details";
    pub const CAPACITY: &str = "Capacity_Nm³ H₂/y";
    pub const PROJECT_NAME: &str = "Project name";
    pub const DATE_ONLINE: &str = "Date online";
}

pub const COUNTRY: &str = "country";
pub const TECHNOLOGY: &str = "technology";
pub const TECHNOLOGY_DETAIL: &str = "technology_detail";
pub const CAPACITY: &str = "capacity";
pub const PROJECT_NAME: &str = "project_name";
pub const ONLINE_DATE: &str = "online_date";
pub const ONLINE_YEAR: &str = "online_year";

// Derived per facility at load time
pub const PRODUCTION_TONNES: &str = "production_tonnes";
pub const CO2_AVOIDED_TONNES: &str = "co2_avoided_tonnes";
pub const CAPACITY_MW: &str = "capacity_mw";

// Aggregation outputs
pub const COUNT: &str = "count";
pub const TOTAL_CAPACITY: &str = "total_capacity";
pub const TOTAL_PROJECTS: &str = "total_projects";

// Map placement
pub const LATITUDE: &str = "latitude";
pub const LONGITUDE: &str = "longitude";
pub const RADIUS: &str = "radius";
pub const POPUP: &str = "popup";
