//! The aggregation engine.
//!
//! Every operation takes a lazy row subset (see [`crate::dataset::Dataset::rows`]) and returns a
//! scalar or a freshly collected summary table. Nothing here mutates the facility set, and an
//! empty subset gives a zero or an empty table rather than an error.

use itertools::izip;
use polars::prelude::*;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::COL;

/// Category label excluded from the technology-type counts.
pub const UNKNOWN_CATEGORY: &str = "Unknown";

/// Row counts per distinct value of a categorical column.
#[derive(Debug, Clone, PartialEq)]
pub struct CountTable {
    pub key: String,
    pub frame: DataFrame,
}

impl CountTable {
    pub fn entries(&self) -> Result<Vec<(String, u32)>> {
        Ok(izip!(
            self.frame.column(&self.key)?.str()?,
            self.frame.column(COL::COUNT)?.u32()?
        )
        .map(|(key, count)| (key.unwrap_or_default().to_string(), count.unwrap_or(0)))
        .collect())
    }

    /// Reorder by count, largest first. Equal counts keep their current relative order.
    pub fn sorted_by_count(self) -> Result<Self> {
        let frame = self.frame.sort(
            [COL::COUNT],
            SortMultipleOptions::default()
                .with_order_descending(true)
                .with_maintain_order(true),
        )?;
        Ok(Self { frame, ..self })
    }
}

/// Summed values per calendar year, ascending by year.
#[derive(Debug, Clone, PartialEq)]
pub struct YearSeries {
    pub year: String,
    pub value: String,
    pub frame: DataFrame,
}

impl YearSeries {
    pub fn entries(&self) -> Result<Vec<(i32, f64)>> {
        Ok(izip!(
            self.frame.column(&self.year)?.i32()?,
            self.frame.column(&self.value)?.f64()?
        )
        .filter_map(|(year, value)| year.map(|year| (year, value.unwrap_or(0.0))))
        .collect())
    }
}

/// Summed values keyed by a categorical column, in the order produced by the operation.
#[derive(Debug, Clone, PartialEq)]
pub struct KeyedSums {
    pub key: String,
    pub value: String,
    pub frame: DataFrame,
}

impl KeyedSums {
    pub fn entries(&self) -> Result<Vec<(String, f64)>> {
        Ok(izip!(
            self.frame.column(&self.key)?.str()?,
            self.frame.column(&self.value)?.f64()?
        )
        .map(|(key, value)| (key.unwrap_or_default().to_string(), value.unwrap_or(0.0)))
        .collect())
    }
}

/// One row of a [`GroupSummary`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupAggregate {
    pub key: String,
    pub total_capacity: f64,
    pub total_projects: u32,
}

/// Capacity and project totals per group, ascending by key.
#[derive(Debug, Clone, PartialEq)]
pub struct GroupSummary {
    pub key: String,
    pub frame: DataFrame,
}

impl GroupSummary {
    pub fn entries(&self) -> Result<Vec<GroupAggregate>> {
        Ok(izip!(
            self.frame.column(&self.key)?.str()?,
            self.frame.column(COL::TOTAL_CAPACITY)?.f64()?,
            self.frame.column(COL::TOTAL_PROJECTS)?.u32()?
        )
        .map(|(key, capacity, projects)| GroupAggregate {
            key: key.unwrap_or_default().to_string(),
            total_capacity: capacity.unwrap_or(0.0),
            total_projects: projects.unwrap_or(0),
        })
        .collect())
    }

    pub fn total_capacity(&self) -> Result<f64> {
        Ok(self
            .frame
            .column(COL::TOTAL_CAPACITY)?
            .f64()?
            .sum()
            .unwrap_or(0.0))
    }

    pub fn is_empty(&self) -> bool {
        self.frame.height() == 0
    }
}

/// One facility of a [`ProjectListing`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectEntry {
    pub project_name: String,
    pub capacity: Option<f64>,
    pub online_date: Option<String>,
}

/// Name, capacity and online date (as listed in the source) of the facilities in one country,
/// in input order.
#[derive(Debug, Clone, PartialEq)]
pub struct ProjectListing(pub DataFrame);

impl ProjectListing {
    pub fn entries(&self) -> Result<Vec<ProjectEntry>> {
        Ok(izip!(
            self.0.column(COL::PROJECT_NAME)?.str()?,
            self.0.column(COL::CAPACITY)?.f64()?,
            self.0.column(COL::ONLINE_DATE)?.str()?
        )
        .map(|(name, capacity, online_date)| ProjectEntry {
            project_name: name.unwrap_or_default().to_string(),
            capacity,
            online_date: online_date.map(str::to_string),
        })
        .collect())
    }
}

/// Sum of a numeric column over `rows`; zero when there are no rows.
pub fn sum_column(rows: LazyFrame, column: &str) -> Result<f64> {
    let df = rows
        .select([col(column).cast(DataType::Float64).sum()])
        .collect()?;
    Ok(df.column(column)?.f64()?.get(0).unwrap_or(0.0))
}

pub fn total_capacity(rows: LazyFrame) -> Result<f64> {
    sum_column(rows, COL::CAPACITY)
}

pub fn country_total(rows: LazyFrame, country: &str) -> Result<f64> {
    total_capacity(rows.filter(col(COL::COUNTRY).eq(lit(country))))
}

/// Tonnes of CO₂ avoided by the facilities in `rows`.
pub fn co2_avoided(rows: LazyFrame) -> Result<f64> {
    sum_column(rows, COL::CO2_AVOIDED_TONNES)
}

/// Count rows per value of `key`, optionally dropping one category first. Rows with no value
/// for `key` are not counted.
pub fn group_count(rows: LazyFrame, key: &str, exclude: Option<&str>) -> Result<CountTable> {
    let rows = rows.filter(col(key).is_not_null());
    let rows = match exclude {
        Some(category) => rows.filter(col(key).neq(lit(category))),
        None => rows,
    };
    let frame = rows
        .group_by([col(key)])
        .agg([col(key)
            .count()
            .cast(DataType::UInt32)
            .alias(COL::COUNT)])
        .sort([key], SortMultipleOptions::default())
        .collect()?;
    Ok(CountTable {
        key: key.to_string(),
        frame,
    })
}

/// Sum `value_key` per year in `date_key`, ascending by year whatever the input order.
pub fn group_sum_by_year(rows: LazyFrame, date_key: &str, value_key: &str) -> Result<YearSeries> {
    let frame = rows
        .filter(col(date_key).is_not_null())
        .group_by([col(date_key).cast(DataType::Int32)])
        .agg([col(value_key).cast(DataType::Float64).sum()])
        .sort([date_key], SortMultipleOptions::default())
        .collect()?;
    Ok(YearSeries {
        year: date_key.to_string(),
        value: value_key.to_string(),
        frame,
    })
}

/// The `n` groups of `key` with the largest summed `value_key`, largest first. Groups with equal
/// sums keep the order in which they first appear in `rows`.
pub fn top_n(rows: LazyFrame, key: &str, value_key: &str, n: usize) -> Result<KeyedSums> {
    let frame = rows
        .filter(col(key).is_not_null())
        .group_by_stable([col(key)])
        .agg([col(value_key).cast(DataType::Float64).sum()])
        .sort(
            [value_key],
            SortMultipleOptions::default()
                .with_order_descending(true)
                .with_maintain_order(true),
        )
        .limit(IdxSize::try_from(n).unwrap_or(IdxSize::MAX))
        .collect()?;
    Ok(KeyedSums {
        key: key.to_string(),
        value: value_key.to_string(),
        frame,
    })
}

/// Sum `value_key` per value of `key`, ascending by key.
pub fn group_sum(rows: LazyFrame, key: &str, value_key: &str) -> Result<KeyedSums> {
    let frame = rows
        .filter(col(key).is_not_null())
        .group_by([col(key)])
        .agg([col(value_key).cast(DataType::Float64).sum()])
        .sort([key], SortMultipleOptions::default())
        .collect()?;
    Ok(KeyedSums {
        key: key.to_string(),
        value: value_key.to_string(),
        frame,
    })
}

/// Total capacity and number of facilities per value of `key`, ascending by key.
pub fn grouped_agg(rows: LazyFrame, key: &str) -> Result<GroupSummary> {
    let frame = rows
        .filter(col(key).is_not_null())
        .group_by([col(key)])
        .agg([
            col(COL::CAPACITY)
                .cast(DataType::Float64)
                .sum()
                .alias(COL::TOTAL_CAPACITY),
            col(key)
                .count()
                .cast(DataType::UInt32)
                .alias(COL::TOTAL_PROJECTS),
        ])
        .sort([key], SortMultipleOptions::default())
        .collect()?;
    Ok(GroupSummary {
        key: key.to_string(),
        frame,
    })
}

pub fn project_listing(rows: LazyFrame, country: &str) -> Result<ProjectListing> {
    let frame = rows
        .filter(col(COL::COUNTRY).eq(lit(country)))
        .select([
            col(COL::PROJECT_NAME),
            col(COL::CAPACITY),
            col(COL::ONLINE_DATE),
        ])
        .collect()?;
    Ok(ProjectListing(frame))
}
