use aggregate::{grouped_agg, GroupSummary};
use dataset::{Dataset, RowFilter};
use error::Result;
use log::debug;
use views::{compute_kpis, compute_view, Kpis, UnitSelection, View, ViewData};

use crate::config::Config;

// Re-exports
pub use column_names as COL;

// Modules
pub mod aggregate;
pub mod column_names;
pub mod config;
pub mod dataset;
pub mod error;
#[cfg(feature = "formatters")]
pub mod formatters;
pub mod map;
pub mod region;
pub mod source;
pub mod units;
pub mod views;

/// Type for the loaded facility data and the dashboard built on it
#[derive(Debug, Clone)]
pub struct Dashboard {
    pub dataset: Dataset,
    latam: GroupSummary,
}

impl Dashboard {
    /// Setup the Dashboard object with default configuration
    pub fn new() -> Result<Self> {
        Self::new_with_config(Config::default())
    }

    /// Setup the Dashboard object with custom configuration
    pub fn new_with_config(config: Config) -> Result<Self> {
        debug!("config: {config:?}");
        let dataset = Dataset::load(&config.data_path, config.sheet.as_deref())?;
        Self::from_dataset(dataset)
    }

    /// Build the dashboard over an already loaded dataset
    pub fn from_dataset(dataset: Dataset) -> Result<Self> {
        let latam = grouped_agg(dataset.rows(&RowFilter::Latam), COL::COUNTRY)?;
        Ok(Self { dataset, latam })
    }

    /// Headline metrics with the given unit toggles
    pub fn kpis(&self, units: UnitSelection) -> Result<Kpis> {
        compute_kpis(&self.dataset, units)
    }

    /// Computes a single view
    pub fn view(&self, view: View) -> Result<ViewData> {
        compute_view(&self.dataset, &self.latam, view)
    }

    /// Per-country capacity and project totals over the LATAM subset
    pub fn latam_summary(&self) -> &GroupSummary {
        &self.latam
    }
}
