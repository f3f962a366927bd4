use comfy_table::{presets::NOTHING, *};
use h2latam::units::format_quantity;
use h2latam::views::{ChartKind, Kpis, View, ViewData};
use itertools::izip;
use polars::prelude::{AnyValue, DataFrame, DataType};
use strum::IntoEnumIterator;

const BAR_WIDTH: usize = 30;
const NO_DATA: &str = "No data";

fn base_table() -> Table {
    let mut table = Table::new();
    table
        .load_preset(NOTHING)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_style(comfy_table::TableComponent::BottomBorder, '─')
        .set_style(comfy_table::TableComponent::MiddleHeaderIntersections, '─')
        .set_style(comfy_table::TableComponent::HeaderLines, '─')
        .set_style(comfy_table::TableComponent::BottomBorderIntersections, '─')
        .set_style(comfy_table::TableComponent::TopBorder, '─')
        .set_style(comfy_table::TableComponent::TopBorderIntersections, '─');
    table
}

fn header(names: &[&str]) -> Vec<Cell> {
    names
        .iter()
        .map(|name| Cell::new(name).add_attribute(Attribute::Bold))
        .collect()
}

fn cell_text(value: &AnyValue) -> String {
    match value {
        AnyValue::Null => String::new(),
        AnyValue::String(s) => (*s).to_string(),
        AnyValue::StringOwned(s) => s.to_string(),
        AnyValue::Float64(v) => float_text(*v),
        AnyValue::Float32(v) => float_text(f64::from(*v)),
        other => format!("{other}"),
    }
}

fn float_text(value: f64) -> String {
    if value.fract() == 0.0 {
        format_quantity(value)
    } else {
        format!("{value:.4}")
    }
}

/// Bar of `BAR_WIDTH` blocks at most, scaled against `max`.
pub fn bar(value: f64, max: f64) -> String {
    if max <= 0.0 || value <= 0.0 {
        return String::new();
    }
    "█".repeat(((value / max) * BAR_WIDTH as f64).round() as usize)
}

/// Percentage of `total` taken by `value`, one decimal.
pub fn share(value: f64, total: f64) -> String {
    if total <= 0.0 {
        return "0.0%".to_string();
    }
    format!("{:.1}%", value / total * 100.0)
}

pub fn render_kpis(kpis: &Kpis) -> String {
    let mut table = base_table();
    for metric in kpis.metrics() {
        table.add_row(vec![
            Cell::new(&metric.label).add_attribute(Attribute::Bold),
            Cell::new(format_quantity(metric.value)),
            Cell::new(&metric.unit),
        ]);
    }
    if let Some(column) = table.column_mut(1) {
        column.set_cell_alignment(CellAlignment::Right);
    }
    table.to_string()
}

pub fn render_view_list() -> String {
    let mut table = base_table();
    table.set_header(header(&["View", "Title", "Chart"]));
    for view in View::iter() {
        table.add_row(vec![
            view.to_string(),
            view.title().to_string(),
            format!("{:?}", view.chart_kind()),
        ]);
    }
    table.to_string()
}

/// Render one view as a titled terminal table.
pub fn render_view(data: &ViewData) -> anyhow::Result<String> {
    if data.is_empty() {
        return Ok(format!("{}\n{NO_DATA}", data.title()));
    }
    let table = match (data.kind, data.value_column.as_deref()) {
        (ChartKind::Bar | ChartKind::Line, Some(value_column)) => {
            let (labels, values) = labels_and_values(data, value_column)?;
            let max = values.iter().copied().fold(0.0, f64::max);
            let mut table = base_table();
            table.set_header(header(&[data.x_label, data.y_label, ""]));
            for (label, value) in izip!(labels, values) {
                table.add_row(vec![label, float_text(value), bar(value, max)]);
            }
            table
        }
        (ChartKind::Pie, Some(value_column)) => {
            let (labels, values) = labels_and_values(data, value_column)?;
            let total: f64 = values.iter().sum();
            let mut table = base_table();
            table.set_header(header(&[data.x_label, data.y_label, "Share"]));
            for (label, value) in izip!(labels, values) {
                table.add_row(vec![label, float_text(value), share(value, total)]);
            }
            table
        }
        _ => frame_table(&data.frame)?,
    };
    Ok(format!("{}\n{table}", data.title()))
}

fn labels_and_values(data: &ViewData, value_column: &str) -> anyhow::Result<(Vec<String>, Vec<f64>)> {
    // Note: if using iter on an AnyValue, need to rechunk first.
    let labels = data
        .frame
        .column(&data.label_column)?
        .rechunk()
        .iter()
        .map(|value| cell_text(&value))
        .collect();
    let values = data
        .frame
        .column(value_column)?
        .cast(&DataType::Float64)?
        .f64()?
        .into_iter()
        .map(Option::unwrap_or_default)
        .collect();
    Ok((labels, values))
}

fn frame_table(frame: &DataFrame) -> anyhow::Result<Table> {
    let mut table = base_table();
    table.set_header(header(&frame.get_column_names()));
    for idx in 0..frame.height() {
        let row = frame
            .get_columns()
            .iter()
            .map(|column| column.get(idx).map(|value| cell_text(&value)))
            .collect::<Result<Vec<_>, _>>()?;
        table.add_row(row);
    }
    Ok(table)
}
