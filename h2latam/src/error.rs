//! Error types.

#[derive(thiserror::Error, Debug)]
pub enum H2Error {
    #[error("Wrapped anyhow error: {0}")]
    AnyhowError(#[from] anyhow::Error),
    #[error("Schema mismatch on column '{column}': {reason}")]
    SchemaMismatch { column: String, reason: String },
    #[error("Unsupported source format: {0}")]
    UnsupportedFormat(String),
    #[error("Source contains no sheets or rows: {0}")]
    EmptySource(String),
    #[error("Wrapped spreadsheet error: {0}")]
    SpreadsheetError(#[from] calamine::Error),
    #[error("Wrapped polars error: {0}")]
    PolarsError(#[from] polars::error::PolarsError),
    #[error("Wrapped IO error: {0}")]
    IOError(#[from] std::io::Error),
}

impl H2Error {
    pub fn schema_mismatch(column: &str, reason: impl Into<String>) -> Self {
        Self::SchemaMismatch {
            column: column.to_string(),
            reason: reason.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, H2Error>;

#[cfg(test)]
mod tests {
    use anyhow::anyhow;

    use super::*;

    #[test]
    fn test_anyhow() {
        let anyhow_error = anyhow!("An anyhow error");
        let h2_error: H2Error = anyhow_error.into();
        println!("{}", h2_error);
    }

    #[test]
    fn schema_mismatch_names_the_column() {
        let err = H2Error::schema_mismatch("Country", "column not found");
        assert_eq!(
            err.to_string(),
            "Schema mismatch on column 'Country': column not found"
        );
    }
}
