use anyhow::{anyhow, Result};
use enum_dispatch::enum_dispatch;
use geo::geometry::{Geometry, Point};
use geojson;
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use serde_json::json;
use serde_json::Value;
use std::io::Cursor;
use std::io::Write;

use crate::region::{MAP_CENTER, MAP_ZOOM};
use crate::COL;

/// Utility function to convert from polars `AnyValue` to `serde_json::Value`
/// Doesn't cover all types but most of them.
fn any_value_to_json(value: &AnyValue) -> Result<Value> {
    match value {
        AnyValue::Null => Ok(Value::Null),
        AnyValue::Boolean(b) => Ok(Value::Bool(*b)),
        AnyValue::String(s) => Ok(Value::String((*s).to_string())),
        AnyValue::StringOwned(s) => Ok(Value::String(s.to_string())),
        AnyValue::Int8(n) => Ok(json!(*n)),
        AnyValue::Int16(n) => Ok(json!(*n)),
        AnyValue::Int32(n) => Ok(json!(*n)),
        AnyValue::Int64(n) => Ok(json!(*n)),
        AnyValue::UInt8(n) => Ok(json!(*n)),
        AnyValue::UInt16(n) => Ok(json!(*n)),
        AnyValue::UInt32(n) => Ok(json!(*n)),
        AnyValue::UInt64(n) => Ok(json!(*n)),
        AnyValue::Float32(n) => Ok(json!(*n)),
        AnyValue::Float64(n) => Ok(json!(*n)),
        _ => Err(anyhow!("Failed to convert type")),
    }
}

/// Serialise row `idx` of `columns` as a JSON object keyed by column name.
fn row_properties(columns: &[Series], idx: usize) -> Result<serde_json::Map<String, Value>> {
    let mut properties = serde_json::Map::new();
    for col in columns {
        let val = any_value_to_json(&col.get(idx)?)?;
        properties.insert(col.name().to_string(), val);
    }
    Ok(properties)
}

/// Trait to define different output generators. Defines two
/// functions, format which generates a serialized string of the
/// `DataFrame` and save which writes the serialized output to
/// a writer
#[enum_dispatch]
pub trait OutputGenerator {
    fn save(&self, writer: &mut impl Write, df: &mut DataFrame) -> Result<()>;
    fn format(&self, df: &mut DataFrame) -> Result<String> {
        // Just creating an empty vec to store the buffered output
        let mut data: Vec<u8> = vec![];
        let mut buff = Cursor::new(&mut data);
        self.save(&mut buff, df)?;

        Ok(String::from_utf8(data)?)
    }
}

/// Enum of OutputFormatters one for each potential
/// output type
#[enum_dispatch(OutputGenerator)]
#[derive(Serialize, Deserialize, Debug)]
pub enum OutputFormatter {
    GeoJSON(GeoJSONFormatter),
    Json(JSONFormatter),
    Csv(CSVFormatter),
}

/// Format the results as a CSV file
#[derive(Serialize, Deserialize, Debug, Default)]
pub struct CSVFormatter;

impl OutputGenerator for CSVFormatter {
    fn save(&self, writer: &mut impl Write, df: &mut DataFrame) -> Result<()> {
        CsvWriter::new(writer).finish(df)?;
        Ok(())
    }
}

/// Format the results as a JSON array with one object per row
#[derive(Serialize, Deserialize, Debug, Default)]
pub struct JSONFormatter;

impl OutputGenerator for JSONFormatter {
    fn save(&self, writer: &mut impl Write, df: &mut DataFrame) -> Result<()> {
        let rows = (0..df.height())
            .map(|idx| row_properties(df.get_columns(), idx).map(Value::Object))
            .collect::<Result<Vec<_>>>()?;
        serde_json::to_writer(&mut *writer, &Value::Array(rows))?;
        writeln!(writer)?;
        Ok(())
    }
}

/// Format the results as a geojson FeatureCollection of points. The
/// `DataFrame` must carry latitude and longitude columns; every other
/// column becomes a feature property. The map centre and zoom are
/// written as foreign members of the collection.
#[derive(Serialize, Deserialize, Debug, Default)]
pub struct GeoJSONFormatter;

impl OutputGenerator for GeoJSONFormatter {
    fn format(&self, df: &mut DataFrame) -> Result<String> {
        let latitudes = df.column(COL::LATITUDE)?.cast(&DataType::Float64)?;
        let longitudes = df.column(COL::LONGITUDE)?.cast(&DataType::Float64)?;
        let other_cols = df.drop_many(&[COL::LATITUDE, COL::LONGITUDE]);
        let mut features: Vec<geojson::Feature> = vec![];

        for (idx, (lat, lon)) in latitudes
            .f64()?
            .into_iter()
            .zip(longitudes.f64()?)
            .enumerate()
        {
            if let (Some(lat), Some(lon)) = (lat, lon) {
                let geom: Geometry<f64> = Geometry::Point(Point::new(lon, lat));
                let feature = geojson::Feature {
                    geometry: Some(geojson::Geometry::from(&geom)),
                    properties: Some(row_properties(other_cols.get_columns(), idx)?),
                    bbox: None,
                    id: None,
                    foreign_members: None,
                };
                features.push(feature);
            }
        }

        let mut foreign_members = serde_json::Map::new();
        foreign_members.insert("center".into(), json!([MAP_CENTER.0, MAP_CENTER.1]));
        foreign_members.insert("zoom".into(), json!(MAP_ZOOM));

        let feature_collection = geojson::FeatureCollection {
            bbox: None,
            features,
            foreign_members: Some(foreign_members),
        };
        Ok(feature_collection.to_string())
    }

    fn save(&self, writer: &mut impl Write, df: &mut DataFrame) -> Result<()> {
        let result = self.format(df)?;
        writer.write_all(result.as_bytes())?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn markers() -> DataFrame {
        df!(
            COL::COUNTRY => &["Chile", "Colombia"],
            COL::TOTAL_CAPACITY => &[500.0, 3000.0],
            COL::TOTAL_PROJECTS => &[1u32, 2],
            COL::LATITUDE => &[-35.6751, 4.5709],
            COL::LONGITUDE => &[-71.5429, -74.2973]
        )
        .unwrap()
    }

    #[test]
    fn test_csv_output() {
        let mut df = markers();
        let output = CSVFormatter.format(&mut df).unwrap();
        let mut lines = output.lines();
        assert_eq!(
            lines.next().unwrap(),
            "country,total_capacity,total_projects,latitude,longitude"
        );
        assert!(lines.next().unwrap().starts_with("Chile,500"));
        assert_eq!(output.lines().count(), 3);
    }

    #[test]
    fn test_json_output() {
        let mut df = markers();
        let output = JSONFormatter.format(&mut df).unwrap();
        let value: Value = serde_json::from_str(&output).unwrap();
        let rows = value.as_array().unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[1]["country"], json!("Colombia"));
        assert_eq!(rows[1]["total_projects"], json!(2));
    }

    #[test]
    fn test_geojson_output() {
        let mut df = markers();
        let output = GeoJSONFormatter.format(&mut df).unwrap();
        let collection: geojson::FeatureCollection = output.parse::<geojson::GeoJson>()
            .unwrap()
            .try_into()
            .unwrap();
        assert_eq!(collection.features.len(), 2);
        let colombia = &collection.features[1];
        assert_eq!(
            colombia.geometry.as_ref().unwrap().value,
            geojson::Value::Point(vec![-74.2973, 4.5709])
        );
        let properties = colombia.properties.as_ref().unwrap();
        assert_eq!(properties["country"], json!("Colombia"));
        assert!(!properties.contains_key(COL::LATITUDE));
        assert_eq!(
            collection.foreign_members.unwrap()["zoom"],
            json!(MAP_ZOOM)
        );
    }

    #[test]
    fn geojson_needs_coordinates() {
        let mut df = markers().drop(COL::LATITUDE).unwrap();
        assert!(GeoJSONFormatter.format(&mut df).is_err());
    }

    #[test]
    fn formatter_enum_dispatches() {
        let mut df = markers();
        let formatter: OutputFormatter = CSVFormatter.into();
        assert!(formatter.format(&mut df).unwrap().starts_with("country,"));
    }
}
