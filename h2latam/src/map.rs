//! Map placement for per-country aggregates.

use geo::Point;
use log::debug;
use polars::prelude::*;
use serde::{Deserialize, Serialize};

use crate::aggregate::GroupSummary;
use crate::error::Result;
use crate::region::{coordinates, marker_radius};
use crate::units::CapacityUnit;
use crate::COL;

/// A circle marker for one country.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MapMarker {
    pub country: String,
    pub location: Point<f64>,
    pub total_capacity: f64,
    pub total_projects: u32,
    pub radius: f64,
    pub popup: String,
}

/// Place every group of `summary` that has known coordinates. Groups without coordinates are
/// skipped.
pub fn map_markers(summary: &GroupSummary) -> Result<Vec<MapMarker>> {
    Ok(summary
        .entries()?
        .into_iter()
        .filter_map(|group| {
            let Some(location) = coordinates(&group.key) else {
                debug!("No coordinates for '{}', leaving it off the map", group.key);
                return None;
            };
            Some(MapMarker {
                popup: format!(
                    "{}: {} {}",
                    group.key,
                    group.total_capacity,
                    CapacityUnit::Nm3PerYear
                ),
                radius: marker_radius(group.total_capacity),
                country: group.key,
                location,
                total_capacity: group.total_capacity,
                total_projects: group.total_projects,
            })
        })
        .collect())
}

/// The markers as a table with latitude and longitude columns, ready for a GeoJSON export.
pub fn markers_frame(markers: &[MapMarker]) -> Result<DataFrame> {
    Ok(df!(
        COL::COUNTRY => markers.iter().map(|m| m.country.as_str()).collect::<Vec<_>>(),
        COL::TOTAL_CAPACITY => markers.iter().map(|m| m.total_capacity).collect::<Vec<_>>(),
        COL::TOTAL_PROJECTS => markers.iter().map(|m| m.total_projects).collect::<Vec<_>>(),
        COL::LATITUDE => markers.iter().map(|m| m.location.y()).collect::<Vec<_>>(),
        COL::LONGITUDE => markers.iter().map(|m| m.location.x()).collect::<Vec<_>>(),
        COL::RADIUS => markers.iter().map(|m| m.radius).collect::<Vec<_>>(),
        COL::POPUP => markers.iter().map(|m| m.popup.as_str()).collect::<Vec<_>>()
    )?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregate::grouped_agg;
    use crate::dataset::tests::dataset;
    use crate::dataset::RowFilter;

    #[test]
    fn markers_scale_with_capacity() {
        let dataset = dataset();
        let summary = grouped_agg(dataset.rows(&RowFilter::Latam), COL::COUNTRY).unwrap();
        let markers = map_markers(&summary).unwrap();
        assert_eq!(markers.len(), 4);
        let colombia = markers.iter().find(|m| m.country == "Colombia").unwrap();
        assert_eq!(colombia.total_capacity, 3000.0);
        assert_eq!(colombia.total_projects, 2);
        assert_eq!(colombia.radius, 3000.0 * 0.00001);
        assert_eq!(colombia.popup, "Colombia: 3000 Nm³ H₂/y");
        assert_eq!(colombia.location.y(), 4.5709);
    }

    #[test]
    fn countries_without_coordinates_are_skipped() {
        let dataset = dataset();
        let summary = grouped_agg(dataset.rows(&RowFilter::All), COL::COUNTRY).unwrap();
        let markers = map_markers(&summary).unwrap();
        assert!(markers.iter().all(|m| m.country != "Germany"));
        assert_eq!(markers.len(), 4);
    }

    #[test]
    fn marker_frame_has_one_row_per_marker() {
        let dataset = dataset();
        let summary = grouped_agg(dataset.rows(&RowFilter::Latam), COL::COUNTRY).unwrap();
        let frame = markers_frame(&map_markers(&summary).unwrap()).unwrap();
        assert_eq!(frame.shape(), (4, 7));
        assert_eq!(frame.column(COL::LATITUDE).unwrap().dtype(), &DataType::Float64);
    }
}
