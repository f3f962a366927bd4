//! Composition of the dashboard: the headline metrics and the nine chart views.
//!
//! A view is a pure function of the dataset (plus the shared LATAM summary) producing a table and
//! the hints a renderer needs to draw it. Rendering itself happens elsewhere.

use std::fmt::Display;

use polars::prelude::DataFrame;
use serde::{Deserialize, Serialize};
use strum_macros::{Display as StrumDisplay, EnumIter, EnumString};

use crate::aggregate::{
    co2_avoided, country_total, group_count, group_sum, group_sum_by_year, project_listing,
    top_n, total_capacity, GroupSummary, UNKNOWN_CATEGORY,
};
use crate::dataset::{Dataset, RowFilter};
use crate::error::Result;
use crate::map::{map_markers, markers_frame};
use crate::region::FOCUS_COUNTRY;
use crate::units::{convert_unit, format_quantity, CapacityUnit};
use crate::COL;

/// Number of countries shown in the leading-countries view.
pub const LEADING_COUNTRIES: usize = 5;

/// The dashboard views, in tab order.
#[derive(
    Clone,
    Copy,
    Debug,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    EnumString,
    EnumIter,
    StrumDisplay,
)]
#[strum(serialize_all = "kebab-case", ascii_case_insensitive)]
pub enum View {
    TechnologyTypes,
    TechnologyDistribution,
    CapacityByYear,
    LeadingCountries,
    LatamProjects,
    LatamProduction,
    LatamMap,
    Co2ByCountry,
    ColombiaProjects,
}

impl View {
    pub fn title(&self) -> &'static str {
        match self {
            View::TechnologyTypes => "Technology types used worldwide",
            View::TechnologyDistribution => "Project distribution by technology",
            View::CapacityByYear => "Hydrogen production capacity by year",
            View::LeadingCountries => "Leading countries in hydrogen production",
            View::LatamProjects => "Total projects in LATAM",
            View::LatamProduction => "Total production in LATAM",
            View::LatamMap => "Hydrogen production map of LATAM",
            View::Co2ByCountry => "CO₂ avoided per country in LATAM",
            View::ColombiaProjects => "Colombia projects",
        }
    }

    pub fn chart_kind(&self) -> ChartKind {
        match self {
            View::TechnologyTypes
            | View::TechnologyDistribution
            | View::LeadingCountries
            | View::LatamProduction
            | View::Co2ByCountry => ChartKind::Bar,
            View::CapacityByYear => ChartKind::Line,
            View::LatamProjects => ChartKind::Pie,
            View::LatamMap => ChartKind::Map,
            View::ColombiaProjects => ChartKind::Table,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChartKind {
    Bar,
    Line,
    Pie,
    Map,
    Table,
}

/// Output of one view: the table to draw and how to draw it.
#[derive(Debug, Clone)]
pub struct ViewData {
    pub view: View,
    pub kind: ChartKind,
    /// Column holding category labels (or years for line charts).
    pub label_column: String,
    /// Column holding the plotted value; `None` for plain tables.
    pub value_column: Option<String>,
    /// Axis labels for charts; empty for maps and tables, which are drawn from column names.
    pub x_label: &'static str,
    pub y_label: &'static str,
    pub frame: DataFrame,
}

impl ViewData {
    fn new(
        view: View,
        label_column: &str,
        value_column: Option<&str>,
        (x_label, y_label): (&'static str, &'static str),
        frame: DataFrame,
    ) -> Self {
        Self {
            view,
            kind: view.chart_kind(),
            label_column: label_column.to_string(),
            value_column: value_column.map(str::to_string),
            x_label,
            y_label,
            frame,
        }
    }

    pub fn title(&self) -> &'static str {
        self.view.title()
    }

    pub fn is_empty(&self) -> bool {
        self.frame.height() == 0
    }
}

/// Compute a single view. `latam` is the per-country LATAM summary shared by the proportion, bar
/// and map views so that all three always agree.
pub fn compute_view(dataset: &Dataset, latam: &GroupSummary, view: View) -> Result<ViewData> {
    const CAPACITY_AXIS: &str = "Total capacity (Nm³ H₂/y)";
    const NO_AXES: (&str, &str) = ("", "");
    let all = dataset.rows(&RowFilter::All);
    let data = match view {
        View::TechnologyTypes => {
            let counts = group_count(all, COL::TECHNOLOGY_DETAIL, Some(UNKNOWN_CATEGORY))?;
            ViewData::new(
                view,
                COL::TECHNOLOGY_DETAIL,
                Some(COL::COUNT),
                ("Technology", "Count"),
                counts.frame,
            )
        }
        View::TechnologyDistribution => {
            let counts = group_count(all, COL::TECHNOLOGY, None)?.sorted_by_count()?;
            ViewData::new(
                view,
                COL::TECHNOLOGY,
                Some(COL::COUNT),
                ("Technology", "Project count"),
                counts.frame,
            )
        }
        View::CapacityByYear => {
            let series = group_sum_by_year(all, COL::ONLINE_YEAR, COL::CAPACITY)?;
            ViewData::new(
                view,
                COL::ONLINE_YEAR,
                Some(COL::CAPACITY),
                ("Year", CAPACITY_AXIS),
                series.frame,
            )
        }
        View::LeadingCountries => {
            let top = top_n(all, COL::COUNTRY, COL::CAPACITY, LEADING_COUNTRIES)?;
            ViewData::new(
                view,
                COL::COUNTRY,
                Some(COL::CAPACITY),
                ("Country", CAPACITY_AXIS),
                top.frame,
            )
        }
        View::LatamProjects => ViewData::new(
            view,
            &latam.key,
            Some(COL::TOTAL_PROJECTS),
            ("Country", "Projects"),
            latam.frame.clone(),
        ),
        View::LatamProduction => ViewData::new(
            view,
            &latam.key,
            Some(COL::TOTAL_CAPACITY),
            ("Country", CAPACITY_AXIS),
            latam.frame.clone(),
        ),
        View::LatamMap => {
            let markers = map_markers(latam)?;
            ViewData::new(
                view,
                COL::COUNTRY,
                Some(COL::TOTAL_CAPACITY),
                NO_AXES,
                markers_frame(&markers)?,
            )
        }
        View::Co2ByCountry => {
            let sums = group_sum(
                dataset.rows(&RowFilter::Latam),
                COL::COUNTRY,
                COL::CO2_AVOIDED_TONNES,
            )?;
            ViewData::new(
                view,
                COL::COUNTRY,
                Some(COL::CO2_AVOIDED_TONNES),
                ("Country", "CO₂ avoided (tonnes)"),
                sums.frame,
            )
        }
        View::ColombiaProjects => {
            let listing = project_listing(all, FOCUS_COUNTRY)?;
            ViewData::new(
                view,
                COL::PROJECT_NAME,
                None,
                NO_AXES,
                listing.0,
            )
        }
    };
    Ok(data)
}

/// A headline number with its unit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Metric {
    pub label: String,
    pub value: f64,
    pub unit: String,
}

impl Display for Metric {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}: {} {}",
            self.label,
            format_quantity(self.value),
            self.unit
        )
    }
}

/// Units chosen for the two production toggles.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnitSelection {
    pub world: CapacityUnit,
    pub latam: CapacityUnit,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Kpis {
    pub world_production: Metric,
    pub latam_production: Metric,
    pub focus_country_production: Metric,
    pub latam_co2_avoided: Metric,
}

impl Kpis {
    pub fn metrics(&self) -> [&Metric; 4] {
        [
            &self.world_production,
            &self.latam_production,
            &self.focus_country_production,
            &self.latam_co2_avoided,
        ]
    }
}

pub fn compute_kpis(dataset: &Dataset, units: UnitSelection) -> Result<Kpis> {
    let world = total_capacity(dataset.rows(&RowFilter::All))?;
    let latam = total_capacity(dataset.rows(&RowFilter::Latam))?;
    let focus = country_total(dataset.rows(&RowFilter::All), FOCUS_COUNTRY)?;
    let co2 = co2_avoided(dataset.rows(&RowFilter::Latam))?;
    Ok(Kpis {
        world_production: Metric {
            label: "World total production".into(),
            value: convert_unit(world, units.world),
            unit: units.world.to_string(),
        },
        latam_production: Metric {
            label: "LATAM total production".into(),
            value: convert_unit(latam, units.latam),
            unit: units.latam.to_string(),
        },
        focus_country_production: Metric {
            label: format!("{FOCUS_COUNTRY} total production"),
            value: convert_unit(focus, CapacityUnit::Megawatt),
            unit: CapacityUnit::Megawatt.to_string(),
        },
        latam_co2_avoided: Metric {
            label: "CO₂ avoided in LATAM".into(),
            value: co2,
            unit: "tonnes".into(),
        },
    })
}
