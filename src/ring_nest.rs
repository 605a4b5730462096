use crate::geometry::{Coordinate, NestedPolygon};
use itertools::Itertools;

/// Matches merged inner rings to merged outer rings by containment,
/// producing one polygon-with-holes record per outer ring.
///
/// Sequences whose endpoints do not coincide are dropped up front; a
/// merge over incomplete map data can finish unclosed. Each unassigned
/// inner ring is tested against the outers in merge-output order and
/// the first containing outer wins. Inner rings contained by no outer
/// ring are dropped silently.
pub fn nest_rings(
    outers: Vec<Vec<Coordinate>>,
    inners: Vec<Vec<Coordinate>>,
) -> Vec<NestedPolygon> {
    let outer_rings: Vec<Vec<Coordinate>> = outers.into_iter().filter(|s| is_closed(s)).collect();
    let inner_rings: Vec<Vec<Coordinate>> = inners.into_iter().filter(|s| is_closed(s)).collect();

    let mut assigned = vec![false; inner_rings.len()];
    let mut polygons = Vec::with_capacity(outer_rings.len());

    for outer in outer_rings {
        let mut inners_for_outer = Vec::new();

        for (index, inner) in inner_rings.iter().enumerate() {
            if assigned[index] {
                continue;
            }

            let Some(&probe) = inner.first() else {
                continue;
            };

            if ring_contains(&outer, probe) {
                inners_for_outer.push(inner.clone());
                assigned[index] = true;
            }
        }

        polygons.push(NestedPolygon {
            outer,
            inners: inners_for_outer,
        });
    }

    polygons
}

fn is_closed(sequence: &[Coordinate]) -> bool {
    match (sequence.first(), sequence.last()) {
        (Some(first), Some(last)) => first == last,
        _ => false,
    }
}

/// Even-odd ray cast over the ring's edges: a ray from the point toward
/// negative longitude is inside the ring iff it crosses an odd number
/// of edges.
fn ring_contains(ring: &[Coordinate], point: Coordinate) -> bool {
    let mut inside = false;

    for (a, b) in ring.iter().tuple_windows() {
        if (a.lat > point.lat) == (b.lat > point.lat) {
            continue;
        }

        let crossing_lon = (b.lon - a.lon) * (point.lat - a.lat) / (b.lat - a.lat) + a.lon;
        if point.lon < crossing_lon {
            inside = !inside;
        }
    }

    inside
}
