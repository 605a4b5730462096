use crate::geometry::Geometry;
use fnv::FnvHashMap;
use serde::Deserialize;
use std::collections::HashMap;

/// The element kinds a response can contain, in required decode order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ElementKind {
    Node,
    Way,
    Relation,
}

impl ElementKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ElementKind::Node => "node",
            ElementKind::Way => "way",
            ElementKind::Relation => "relation",
        }
    }
}

/// Authorship metadata attached to an element when the query requested
/// it. Present only when all five source fields were present.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Meta {
    pub version: u32,
    pub timestamp: String,
    pub changeset: u64,
    pub uid: u64,
    pub user: String,
}

/// A single geographic point. Can be a point of interest on its own or
/// one vertex of a parent way or relation.
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    pub id: u64,
    pub tags: HashMap<String, String>,
    pub is_interesting: bool,
    pub is_skippable: bool,
    pub geometry: Geometry,
    pub meta: Option<Meta>,
}

/// An ordered run of nodes forming a polylinear or polygonal feature,
/// such as a road or a building outline.
#[derive(Debug, Clone, PartialEq)]
pub struct Way {
    pub id: u64,
    pub tags: HashMap<String, String>,
    pub is_interesting: bool,
    pub is_skippable: bool,
    /// Ids of the member nodes, one per coordinate of the full geometry.
    pub nodes: Vec<u64>,
    pub geometry: Geometry,
    pub meta: Option<Meta>,
}

/// A collection of related members. Most relations are pure grouping
/// containers; displayable types carry their own aggregate geometry.
#[derive(Debug, Clone, PartialEq)]
pub struct Relation {
    pub id: u64,
    pub tags: HashMap<String, String>,
    pub is_interesting: bool,
    pub is_skippable: bool,
    /// Flattened ids of the relation's members.
    pub members: Vec<u64>,
    pub geometry: Geometry,
    pub meta: Option<Meta>,
}

impl Relation {
    /// Relation types that require their own rendered aggregate geometry
    /// rather than acting as a pure grouping container.
    pub const DISPLAYABLE_TYPES: [&'static str; 4] =
        ["multipolygon", "barrier", "route", "waterway"];

    /// Relation types whose aggregate geometry is a polygon with holes.
    pub const MULTIPOLYGON_TYPES: [&'static str; 2] = ["multipolygon", "barrier"];
}

/// A decoded map element.
#[derive(Debug, Clone, PartialEq)]
pub enum Element {
    Node(Node),
    Way(Way),
    Relation(Relation),
}

impl Element {
    pub fn id(&self) -> u64 {
        match self {
            Element::Node(node) => node.id,
            Element::Way(way) => way.id,
            Element::Relation(relation) => relation.id,
        }
    }

    pub fn kind(&self) -> ElementKind {
        match self {
            Element::Node(_) => ElementKind::Node,
            Element::Way(_) => ElementKind::Way,
            Element::Relation(_) => ElementKind::Relation,
        }
    }

    pub fn tags(&self) -> &HashMap<String, String> {
        match self {
            Element::Node(node) => &node.tags,
            Element::Way(way) => &way.tags,
            Element::Relation(relation) => &relation.tags,
        }
    }

    /// Whether the element carries tags worth displaying on their own.
    pub fn is_interesting(&self) -> bool {
        match self {
            Element::Node(node) => node.is_interesting,
            Element::Way(way) => way.is_interesting,
            Element::Relation(relation) => relation.is_interesting,
        }
    }

    /// Whether the element's geometry is already represented inside a
    /// parent aggregate and should not be rendered standalone.
    pub fn is_skippable(&self) -> bool {
        match self {
            Element::Node(node) => node.is_skippable,
            Element::Way(way) => way.is_skippable,
            Element::Relation(relation) => relation.is_skippable,
        }
    }

    pub fn set_skippable(&mut self, skippable: bool) {
        match self {
            Element::Node(node) => node.is_skippable = skippable,
            Element::Way(way) => way.is_skippable = skippable,
            Element::Relation(relation) => relation.is_skippable = skippable,
        }
    }

    pub fn geometry(&self) -> &Geometry {
        match self {
            Element::Node(node) => &node.geometry,
            Element::Way(way) => &way.geometry,
            Element::Relation(relation) => &relation.geometry,
        }
    }

    pub fn meta(&self) -> Option<&Meta> {
        match self {
            Element::Node(node) => node.meta.as_ref(),
            Element::Way(way) => way.meta.as_ref(),
            Element::Relation(relation) => relation.meta.as_ref(),
        }
    }
}

/// The decoded elements of one response, keyed by element id.
///
/// Built once per decode call and read-only afterwards; the decoder
/// holds no reference to it after returning.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ElementGraph {
    elements: FnvHashMap<u64, Element>,
}

impl ElementGraph {
    pub(crate) fn new(elements: FnvHashMap<u64, Element>) -> Self {
        Self { elements }
    }

    pub fn get(&self, id: u64) -> Option<&Element> {
        self.elements.get(&id)
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&u64, &Element)> {
        self.elements.iter()
    }

    pub fn values(&self) -> impl Iterator<Item = &Element> {
        self.elements.values()
    }

    pub fn into_inner(self) -> FnvHashMap<u64, Element> {
        self.elements
    }
}
