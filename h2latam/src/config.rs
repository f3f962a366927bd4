use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct Config {
    /// Path of the facility spreadsheet (.xlsx, .xls, .ods, .csv or .parquet)
    pub data_path: String,
    /// Worksheet to read from spreadsheet sources; the first sheet when unset
    pub sheet: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            data_path: "db_operational.xlsx".into(),
            sheet: None,
        }
    }
}
