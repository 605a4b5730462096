use crate::geometry::Coordinate;
use once_cell::sync::Lazy;
use std::collections::{HashMap, HashSet};

// Keys that mark a closed way as a polygon EXCEPT when paired with one of
// the listed values.
static DENYLIST: Lazy<HashMap<&'static str, HashSet<&'static str>>> = Lazy::new(|| {
    HashMap::from([
        ("area:highway", HashSet::from(["no"])),
        ("aeroway", HashSet::from(["no", "taxiway"])),
        ("amenity", HashSet::from(["no"])),
        ("boundary", HashSet::from(["no"])),
        ("building:part", HashSet::from(["no"])),
        ("building", HashSet::from(["no"])),
        ("craft", HashSet::from(["no"])),
        ("golf", HashSet::from(["no"])),
        ("historic", HashSet::from(["no"])),
        ("indoor", HashSet::from(["no"])),
        ("landuse", HashSet::from(["no"])),
        (
            "leisure",
            HashSet::from(["no", "cutline", "embankment", "pipeline"]),
        ),
        (
            "natural",
            HashSet::from(["no", "coastline", "cliff", "ridge", "arete", "tree_row"]),
        ),
        ("office", HashSet::from(["no"])),
        ("place", HashSet::from(["no"])),
        ("public_transport", HashSet::from(["no"])),
        ("ruins", HashSet::from(["no"])),
        ("shop", HashSet::from(["no"])),
        ("tourism", HashSet::from(["no"])),
    ])
});

// Keys that mark a closed way as a polygon ONLY when paired with one of
// the listed values.
static ALLOWLIST: Lazy<HashMap<&'static str, HashSet<&'static str>>> = Lazy::new(|| {
    HashMap::from([
        (
            "barrier",
            HashSet::from(["city_wall", "ditch", "hedge", "retaining_wall", "wall, spikes"]),
        ),
        (
            "highway",
            HashSet::from(["services", "rest_area", "escape", "elevator"]),
        ),
        (
            "power",
            HashSet::from(["plant", "substation", "generator", "transformer"]),
        ),
        (
            "railway",
            HashSet::from(["station", "turntable", "roundhouse", "platform"]),
        ),
        (
            "waterway",
            HashSet::from(["riverbank", "dock", "boatyard", "dam"]),
        ),
    ])
});

/// Decides whether a way's coordinate sequence should be treated as a
/// polygon rather than a polyline.
///
/// Geometric eligibility first: at least 4 points with first == last.
/// An `area` tag then decides directly (any value but "no" means
/// polygon). Otherwise the fixed deny/allow tables are consulted; if no
/// rule fires the way stays a polyline even when closed.
pub fn is_polygon(coordinates: &[Coordinate], tags: &HashMap<String, String>) -> bool {
    forms_ring(coordinates) && tags_allow_polygon(tags)
}

fn forms_ring(coordinates: &[Coordinate]) -> bool {
    coordinates.len() > 3 && coordinates.first() == coordinates.last()
}

fn tags_allow_polygon(tags: &HashMap<String, String>) -> bool {
    if let Some(area) = tags.get("area") {
        return area != "no";
    }

    for (key, value) in tags {
        if let Some(excluded) = DENYLIST.get(key.as_str()) {
            if !excluded.contains(value.as_str()) {
                return true;
            }
        }

        if let Some(included) = ALLOWLIST.get(key.as_str()) {
            if included.contains(value.as_str()) {
                return true;
            }
        }
    }

    false
}
