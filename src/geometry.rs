use serde::Deserialize;

/// A latitude/longitude pair in degrees, as returned by the server.
///
/// Equality is exact on both fields. Segment merging and ring closure
/// checks rely on the server emitting bit-identical coordinates for
/// shared endpoints, which Overpass does.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct Coordinate {
    pub lat: f64,
    pub lon: f64,
}

impl Coordinate {
    pub fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }
}

/// The resolved spatial form of a decoded element.
///
/// Nodes are always a `Point`. Ways resolve to `Polyline` or `Polygon`
/// depending on closure and tags. Relations aggregate member ways into
/// `MultiPolyline` (routes, waterways) or `MultiPolygon` (polygons with
/// holes), or collapse to a `Point` when the server only returned a
/// center. `None` marks elements that carry no renderable geometry of
/// their own.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Geometry {
    #[default]
    None,
    Point(Coordinate),
    Polyline(Vec<Coordinate>),
    Polygon(Vec<Coordinate>),
    MultiPolyline(Vec<Vec<Coordinate>>),
    MultiPolygon(Vec<NestedPolygon>),
}

/// One outer ring plus the inner rings (holes) it contains.
///
/// Rings are closed coordinate sequences: at least 4 points with
/// first == last.
#[derive(Debug, Clone, PartialEq)]
pub struct NestedPolygon {
    pub outer: Vec<Coordinate>,
    pub inners: Vec<Vec<Coordinate>>,
}
