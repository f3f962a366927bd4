//! The loaded facility set.
//!
//! A `Dataset` is built once from a raw source table: the source columns are projected onto the
//! canonical schema in [`crate::column_names`], the online date is normalised to a year and the
//! derived columns are appended. The facility frame is never modified afterwards; aggregations
//! work on lazy views of it obtained through [`Dataset::rows`].

use std::path::Path;

use chrono::{DateTime, Datelike};
use log::{debug, info, warn};
use polars::prelude::*;
use regex::Regex;

use crate::error::{H2Error, Result};
use crate::region::LATAM_COUNTRIES;
use crate::source::read_source;
use crate::units;
use crate::COL;

/// Source columns every facility table must carry.
pub const REQUIRED_SOURCE_COLUMNS: [&str; 6] = [
    COL::source::COUNTRY,
    COL::source::TECHNOLOGY,
    COL::source::TECHNOLOGY_DETAIL,
    COL::source::CAPACITY,
    COL::source::PROJECT_NAME,
    COL::source::DATE_ONLINE,
];

/// Selects the subset of facilities an aggregation runs over.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RowFilter {
    All,
    Country(String),
    Countries(Vec<String>),
    Latam,
}

impl RowFilter {
    /// Predicate for the filter, `None` when every row is kept.
    pub fn expr(&self) -> Option<Expr> {
        match self {
            RowFilter::All => None,
            RowFilter::Country(country) => Some(col(COL::COUNTRY).eq(lit(country.as_str()))),
            RowFilter::Countries(countries) => Some(
                col(COL::COUNTRY).is_in(lit(Series::new("countries", countries.as_slice()))),
            ),
            RowFilter::Latam => Some(
                col(COL::COUNTRY).is_in(lit(Series::new("latam_countries", LATAM_COUNTRIES))),
            ),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Dataset {
    facilities: DataFrame,
}

impl Dataset {
    /// Read, validate and enrich the facility table at `path`.
    pub fn load<P: AsRef<Path>>(path: P, sheet: Option<&str>) -> Result<Self> {
        let raw = read_source(path, sheet)?;
        Self::from_frame(&raw)
    }

    /// Build a dataset from a raw table carrying the source column names.
    pub fn from_frame(raw: &DataFrame) -> Result<Self> {
        let facilities = enrich(normalise(raw)?)?;
        info!("Loaded {} facilities", facilities.height());
        debug!("Facility columns: {:?}", facilities.get_column_names());
        Ok(Self { facilities })
    }

    pub fn facilities(&self) -> &DataFrame {
        &self.facilities
    }

    pub fn len(&self) -> usize {
        self.facilities.height()
    }

    pub fn is_empty(&self) -> bool {
        self.facilities.height() == 0
    }

    /// Lazy view over the facilities selected by `filter`.
    pub fn rows(&self, filter: &RowFilter) -> LazyFrame {
        let rows = self.facilities.clone().lazy();
        match filter.expr() {
            Some(predicate) => rows.filter(predicate),
            None => rows,
        }
    }
}

fn normalise(raw: &DataFrame) -> Result<DataFrame> {
    let missing = REQUIRED_SOURCE_COLUMNS
        .iter()
        .copied()
        .filter(|name| raw.column(name).is_err())
        .collect::<Vec<_>>();
    if !missing.is_empty() {
        return Err(H2Error::schema_mismatch(
            &missing.join(", "),
            "column not found in source",
        ));
    }

    let columns = vec![
        text_column(raw, COL::source::COUNTRY, COL::COUNTRY)?,
        text_column(raw, COL::source::TECHNOLOGY, COL::TECHNOLOGY)?,
        text_column(raw, COL::source::TECHNOLOGY_DETAIL, COL::TECHNOLOGY_DETAIL)?,
        capacity_column(raw)?,
        text_column(raw, COL::source::PROJECT_NAME, COL::PROJECT_NAME)?,
    ];
    let mut facilities = DataFrame::new(columns)?;
    for series in online_date_columns(raw)? {
        facilities.with_column(series)?;
    }
    Ok(facilities)
}

fn text_column(raw: &DataFrame, source: &str, name: &str) -> Result<Series> {
    let series = raw.column(source)?;
    series
        .cast(&DataType::String)
        .map(|s| s.with_name(name))
        .map_err(|e| H2Error::schema_mismatch(source, format!("expected text values: {e}")))
}

fn capacity_column(raw: &DataFrame) -> Result<Series> {
    let source = COL::source::CAPACITY;
    let series = raw.column(source)?;
    let dtype = series.dtype();
    if !(dtype.is_numeric() || matches!(dtype, DataType::String | DataType::Null)) {
        return Err(H2Error::schema_mismatch(
            source,
            format!("expected numeric capacities, found {dtype}"),
        ));
    }
    series
        .strict_cast(&DataType::Float64)
        .map(|s| s.with_name(COL::CAPACITY))
        .map_err(|e| H2Error::schema_mismatch(source, format!("non-numeric capacity: {e}")))
}

/// The online date as listed in the source, plus the calendar year it falls in.
fn online_date_columns(raw: &DataFrame) -> Result<[Series; 2]> {
    let source = COL::source::DATE_ONLINE;
    let series = raw.column(source)?;
    let dtype = series.dtype();
    if !(dtype.is_numeric()
        || matches!(
            dtype,
            DataType::String | DataType::Date | DataType::Datetime(_, _) | DataType::Null
        ))
    {
        return Err(H2Error::schema_mismatch(
            source,
            format!("expected years or dates, found {dtype}"),
        ));
    }

    let year_pattern = Regex::new(r"(?:^|\D)(\d{4})(?:\D|$)").map_err(anyhow::Error::from)?;
    // Note: if using iter on an AnyValue, need to rechunk first.
    let (dates, years): (Vec<Option<String>>, Vec<Option<i32>>) = series
        .rechunk()
        .iter()
        .map(|value| {
            (
                date_text(&value),
                year_from_any_value(&value, &year_pattern),
            )
        })
        .unzip();

    let unparsed = (series.len() - series.null_count())
        - years.iter().filter(|year| year.is_some()).count();
    if unparsed > 0 {
        warn!(
            "{unparsed} value(s) in '{source}' have no recognisable year; they are kept in \
             '{}' but left out of the yearly series",
            COL::ONLINE_DATE
        );
    }
    Ok([
        Series::new(COL::ONLINE_DATE, dates),
        Series::new(COL::ONLINE_YEAR, years),
    ])
}

/// A single cell of the online date column as text, unchanged apart from whole-number floats
/// losing their fraction (spreadsheet years arrive as `2021.0`).
fn date_text(value: &AnyValue) -> Option<String> {
    match value {
        AnyValue::Null => None,
        AnyValue::String(s) => Some((*s).to_string()),
        AnyValue::StringOwned(s) => Some(s.to_string()),
        AnyValue::Float64(n) if n.fract() == 0.0 => Some(format!("{n:.0}")),
        AnyValue::Float32(n) if n.fract() == 0.0 => Some(format!("{n:.0}")),
        other => Some(format!("{other}")),
    }
}

/// Extract a calendar year from a single cell of the online date column.
pub fn year_from_any_value(value: &AnyValue, year_pattern: &Regex) -> Option<i32> {
    match value {
        AnyValue::Int8(n) => Some(i32::from(*n)),
        AnyValue::Int16(n) => Some(i32::from(*n)),
        AnyValue::Int32(n) => Some(*n),
        AnyValue::Int64(n) => i32::try_from(*n).ok(),
        AnyValue::UInt8(n) => Some(i32::from(*n)),
        AnyValue::UInt16(n) => Some(i32::from(*n)),
        AnyValue::UInt32(n) => i32::try_from(*n).ok(),
        AnyValue::UInt64(n) => i32::try_from(*n).ok(),
        AnyValue::Float32(n) => year_from_float(f64::from(*n)),
        AnyValue::Float64(n) => year_from_float(*n),
        AnyValue::String(s) => year_from_str(s, year_pattern),
        AnyValue::StringOwned(s) => year_from_str(s.as_str(), year_pattern),
        AnyValue::Date(days) => {
            DateTime::from_timestamp(i64::from(*days) * 86_400, 0).map(|dt| dt.year())
        }
        AnyValue::Datetime(v, unit, _) => match unit {
            TimeUnit::Nanoseconds => Some(DateTime::from_timestamp_nanos(*v)),
            TimeUnit::Microseconds => DateTime::from_timestamp_micros(*v),
            TimeUnit::Milliseconds => DateTime::from_timestamp_millis(*v),
        }
        .map(|dt| dt.year()),
        _ => None,
    }
}

fn year_from_float(value: f64) -> Option<i32> {
    (value.is_finite() && value >= f64::from(i32::MIN) && value <= f64::from(i32::MAX))
        .then(|| value.trunc() as i32)
}

fn year_from_str(value: &str, year_pattern: &Regex) -> Option<i32> {
    year_pattern
        .captures(value.trim())
        .and_then(|caps| caps.get(1))
        .and_then(|year| year.as_str().parse().ok())
}

fn enrich(mut facilities: DataFrame) -> Result<DataFrame> {
    let derived: Vec<Series> = {
        let capacity = facilities.column(COL::CAPACITY)?.f64()?;
        let derivations: [(&str, fn(f64) -> f64); 3] = [
            (COL::PRODUCTION_TONNES, units::production_tonnes),
            (COL::CO2_AVOIDED_TONNES, units::co2_avoided_tonnes),
            (COL::CAPACITY_MW, units::capacity_mw),
        ];
        derivations
            .into_iter()
            .map(|(name, derive)| {
                let values: Vec<Option<f64>> =
                    capacity.into_iter().map(|v| v.map(derive)).collect();
                Series::new(name, values)
            })
            .collect()
    };
    for series in derived {
        facilities.with_column(series)?;
    }
    Ok(facilities)
}
