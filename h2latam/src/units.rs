//! Fixed conversion constants and the per-facility derived quantities.
//!
//! Every function here depends on a single capacity value, so derived columns can be computed
//! row by row without looking at any other facility.

use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};

/// Divisor taking Nm³ H₂/y to tonnes of hydrogen per year.
pub const TONNES_DIVISOR: f64 = 1000.0;

/// Avoided CO₂ per unit of hydrogen relative to natural gas reforming (kg CO₂ / kg H₂).
pub const EMISSION_FACTOR: f64 = 10.5;

/// Approximate MW equivalent of one Nm³ H₂/y.
pub const MW_PER_NM3_PER_YEAR: f64 = 0.000277778;

/// Unit a capacity figure is displayed in.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize, Display, EnumString,
)]
#[strum(ascii_case_insensitive)]
pub enum CapacityUnit {
    #[default]
    #[strum(to_string = "Nm³ H₂/y", serialize = "nm3", serialize = "Nm3/y")]
    Nm3PerYear,
    #[strum(to_string = "MW", serialize = "mw")]
    Megawatt,
}

/// Express a capacity given in Nm³ H₂/y in `unit`.
pub fn convert_unit(value: f64, unit: CapacityUnit) -> f64 {
    match unit {
        CapacityUnit::Nm3PerYear => value,
        CapacityUnit::Megawatt => value * MW_PER_NM3_PER_YEAR,
    }
}

pub fn production_tonnes(capacity: f64) -> f64 {
    capacity / TONNES_DIVISOR
}

// NOTE: applies a kg/kg factor to tonnes without a unit conversion step. Kept as the upstream
// dashboard computes it until the domain owners confirm the intended units.
pub fn co2_avoided_tonnes(capacity: f64) -> f64 {
    production_tonnes(capacity) * EMISSION_FACTOR
}

pub fn capacity_mw(capacity: f64) -> f64 {
    convert_unit(capacity, CapacityUnit::Megawatt)
}

/// Round to a whole number and group thousands with commas, e.g. `1234567.6` -> `1,234,568`.
pub fn format_quantity(value: f64) -> String {
    let rounded = format!("{value:.0}");
    let (sign, digits) = match rounded.strip_prefix('-') {
        Some(digits) => ("-", digits),
        None => ("", rounded.as_str()),
    };
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (idx, ch) in digits.chars().enumerate() {
        if idx > 0 && (digits.len() - idx) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    format!("{sign}{grouped}")
}
