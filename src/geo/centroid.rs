use super::Coordinate;
use geojson::{GeoJson, Geometry, PolygonType, Value};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum GeometryError {
    #[error("invalid GeoJSON: {0}")]
    Parse(#[from] geojson::Error),
    #[error("unsupported geometry type: {0}")]
    Unsupported(&'static str),
    #[error("geometry has no usable ring")]
    EmptyRing,
}

/// Centroid of the outer ring of an embedded polygon, as (lat, lon).
///
/// For a `MultiPolygon` only the outer ring of the first polygon is used.
/// Positions are stored `[lon, lat]` in the source and swapped on output.
/// Every ring vertex counts, including a repeated closing vertex.
pub fn centroid(raw: &str) -> Result<Coordinate, GeometryError> {
    let geometry = parse_geometry(raw)?;

    let ring = match &geometry.value {
        Value::Polygon(polygon) => outer_ring(polygon),
        Value::MultiPolygon(polygons) => polygons.first().and_then(outer_ring),
        Value::Point(_) => return Err(GeometryError::Unsupported("Point")),
        Value::MultiPoint(_) => return Err(GeometryError::Unsupported("MultiPoint")),
        Value::LineString(_) => return Err(GeometryError::Unsupported("LineString")),
        Value::MultiLineString(_) => return Err(GeometryError::Unsupported("MultiLineString")),
        Value::GeometryCollection(_) => {
            return Err(GeometryError::Unsupported("GeometryCollection"))
        }
    }
    .ok_or(GeometryError::EmptyRing)?;

    ring_mean(ring).ok_or(GeometryError::EmptyRing)
}

/// Accepts a bare geometry, a feature, or a feature collection (first
/// feature with a geometry).
fn parse_geometry(raw: &str) -> Result<Geometry, GeometryError> {
    match raw.trim().parse::<GeoJson>()? {
        GeoJson::Geometry(geometry) => Ok(geometry),
        GeoJson::Feature(feature) => feature.geometry.ok_or(GeometryError::EmptyRing),
        GeoJson::FeatureCollection(collection) => collection
            .features
            .into_iter()
            .find_map(|f| f.geometry)
            .ok_or(GeometryError::EmptyRing),
    }
}

fn outer_ring(polygon: &PolygonType) -> Option<&Vec<Vec<f64>>> {
    polygon.first().filter(|ring| !ring.is_empty())
}

fn ring_mean(ring: &[Vec<f64>]) -> Option<Coordinate> {
    let mut lat_total = 0.0;
    let mut lon_total = 0.0;
    let mut count = 0usize;

    for position in ring {
        if let [lon, lat, ..] = position.as_slice() {
            lon_total += lon;
            lat_total += lat;
            count += 1;
        }
    }

    if count == 0 {
        return None;
    }

    Coordinate::new(lat_total / count as f64, lon_total / count as f64)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_close(actual: Coordinate, lat: f64, lon: f64) {
        assert!((actual.latitude - lat).abs() < 1e-9, "lat {}", actual.latitude);
        assert!((actual.longitude - lon).abs() < 1e-9, "lon {}", actual.longitude);
    }

    #[test]
    fn polygon_centroid_is_vertex_mean_with_axes_swapped() {
        let raw = r#"{
            "type": "Polygon",
            "coordinates": [[[-48.0, -22.0], [-47.0, -22.0], [-47.0, -23.0], [-48.0, -23.0]]]
        }"#;
        assert_close(centroid(raw).unwrap(), -22.5, -47.5);
    }

    #[test]
    fn closing_vertex_is_counted() {
        let raw = r#"{
            "type": "Polygon",
            "coordinates": [[[0.0, 0.0], [3.0, 0.0], [0.0, 3.0], [0.0, 0.0]]]
        }"#;
        assert_close(centroid(raw).unwrap(), 0.75, 0.75);
    }

    #[test]
    fn multipolygon_uses_first_ring_of_first_polygon() {
        let raw = r#"{
            "type": "MultiPolygon",
            "coordinates": [
                [[[-40.0, -10.0], [-42.0, -10.0], [-42.0, -12.0]]],
                [[[10.0, 10.0], [11.0, 11.0], [12.0, 12.0]]]
            ]
        }"#;
        assert_close(centroid(raw).unwrap(), -32.0 / 3.0, -124.0 / 3.0);
    }

    #[test]
    fn feature_wrapper_is_accepted() {
        let raw = r#"{
            "type": "Feature",
            "properties": {},
            "geometry": {"type": "Polygon", "coordinates": [[[-50.0, -20.0], [-52.0, -22.0]]]}
        }"#;
        assert_close(centroid(raw).unwrap(), -21.0, -51.0);
    }

    #[test]
    fn malformed_geometry_is_an_error() {
        assert!(matches!(centroid("{not json"), Err(GeometryError::Parse(_))));
        assert!(matches!(
            centroid(r#"{"type": "Point", "coordinates": [-47.0, -22.0]}"#),
            Err(GeometryError::Unsupported("Point"))
        ));
        assert!(matches!(
            centroid(r#"{"type": "Polygon", "coordinates": []}"#),
            Err(GeometryError::EmptyRing)
        ));
    }
}
