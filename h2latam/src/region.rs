//! Fixed regional lookups: the LATAM country list, the country the dashboard highlights, and the
//! coordinates used to place per-country markers on the map.

use geo::Point;

/// Countries making up the LATAM subset. Membership is exact string match.
pub const LATAM_COUNTRIES: [&str; 5] = ["Argentina", "Brazil", "Chile", "Colombia", "Peru"];

/// Country with its own KPI and project listing.
pub const FOCUS_COUNTRY: &str = "Colombia";

/// Approximate centre of South America as (latitude, longitude).
pub const MAP_CENTER: (f64, f64) = (-8.0, -55.0);
pub const MAP_ZOOM: u8 = 4;

/// Marker radius per Nm³ H₂/y of capacity.
pub const MARKER_RADIUS_SCALE: f64 = 0.00001;

/// Map coordinates of a country as a point (x = longitude, y = latitude).
pub fn coordinates(country: &str) -> Option<Point<f64>> {
    let (lat, lon) = match country {
        "Argentina" => (-38.4161, -63.6167),
        "Brazil" => (-14.2350, -51.9253),
        "Chile" => (-35.6751, -71.5429),
        "Colombia" => (4.5709, -74.2973),
        "Peru" => (-9.1899, -75.0152),
        _ => return None,
    };
    Some(Point::new(lon, lat))
}

pub fn marker_radius(total_capacity: f64) -> f64 {
    total_capacity * MARKER_RADIUS_SCALE
}
