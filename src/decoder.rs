//! Three-pass decoding of an Overpass JSON response into an element
//! graph.
//!
//! Geometry construction is ordered: ways need the coordinates of
//! already-decoded nodes and relations need the coordinates of
//! already-decoded ways, so the element array is walked once per kind
//! in the fixed order node, way, relation. A failure while decoding one
//! element drops that element and is recorded; it never aborts the
//! batch, because upstream map data is frequently incomplete.

use crate::element::{Element, ElementGraph, ElementKind, Meta, Node, Relation, Way};
use crate::errors::{ElementError, EnvelopeError};
use crate::geometry::{Coordinate, Geometry};
use crate::polygon_checker;
use crate::ring_nest;
use crate::segment_merge;
use crate::tag_checker;
use fnv::FnvHashMap;
use log::{debug, warn};
use serde::Deserialize;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Shared cooperative cancellation flag.
///
/// Decoding polls the flag between element iterations, so an in-flight
/// single-element decode always completes before a check can abort the
/// pass. Cancellation produces no partial result and no side effects.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// The product of a completed decode call.
#[derive(Debug, Default)]
pub struct Decoded {
    /// All successfully decoded elements, keyed by id.
    pub elements: ElementGraph,
    /// Elements that failed to decode and were dropped from the graph.
    pub failures: Vec<ElementError>,
    /// Server-side remark carried by the envelope, if any. Overpass
    /// emits one on runtime errors and truncated responses.
    pub remark: Option<String>,
}

/// How a decode call ended. Cancellation is a non-error outcome that
/// carries no result.
#[derive(Debug)]
pub enum DecodeOutcome {
    Decoded(Decoded),
    Cancelled,
}

// Raw wire shapes. The envelope keeps each element as a raw JSON value
// so that one malformed element cannot fail the batch.

#[derive(Debug, Deserialize)]
struct RawEnvelope {
    elements: Option<Vec<Value>>,
    remark: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawVertex {
    lat: Option<f64>,
    lon: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct RawMember {
    r#type: ElementKind,
    r#ref: u64,
    role: String,
    geometry: Option<Vec<RawVertex>>,
}

#[derive(Debug, Deserialize)]
struct RawElement {
    id: u64,
    #[serde(default)]
    tags: HashMap<String, String>,
    lat: Option<f64>,
    lon: Option<f64>,
    nodes: Option<Vec<u64>>,
    center: Option<Coordinate>,
    geometry: Option<Vec<RawVertex>>,
    members: Option<Vec<RawMember>>,
    version: Option<u32>,
    timestamp: Option<String>,
    changeset: Option<u64>,
    uid: Option<u64>,
    user: Option<String>,
}

impl RawElement {
    // Meta is all-or-nothing: absent unless every source field is present.
    fn meta(&self) -> Option<Meta> {
        Some(Meta {
            version: self.version?,
            timestamp: self.timestamp.clone()?,
            changeset: self.changeset?,
            uid: self.uid?,
            user: self.user.clone()?,
        })
    }
}

/// A relation member with its role and resolved coordinates. Exists
/// only while the relation's aggregate geometry is being built.
#[derive(Debug)]
struct ResolvedMember {
    kind: ElementKind,
    id: u64,
    role: String,
    coordinates: Vec<Coordinate>,
}

/// Decodes a raw response payload into an element graph.
///
/// The payload must be a JSON object with a top-level `elements` array;
/// anything else is a fatal [`EnvelopeError`] and no graph is returned.
/// Individual element failures are recorded on the result instead.
pub fn decode(payload: &[u8], cancel: &CancelToken) -> Result<DecodeOutcome, EnvelopeError> {
    let envelope: RawEnvelope = serde_json::from_slice(payload)?;
    let raw_elements = envelope.elements.ok_or(EnvelopeError::MissingElements)?;

    if let Some(remark) = envelope.remark.as_deref() {
        warn!("server remark in response: {remark}");
    }

    let mut decoder = Decoder::default();

    for kind in [ElementKind::Node, ElementKind::Way, ElementKind::Relation] {
        for value in &raw_elements {
            if cancel.is_cancelled() {
                return Ok(DecodeOutcome::Cancelled);
            }

            if value.get("type").and_then(Value::as_str) != Some(kind.as_str()) {
                continue;
            }

            if let Err(error) = decoder.decode_element(kind, value) {
                debug!("dropping element: {error}");
                decoder.failures.push(error);
            }
        }
    }

    Ok(DecodeOutcome::Decoded(Decoded {
        elements: ElementGraph::new(decoder.elements),
        failures: decoder.failures,
        remark: envelope.remark,
    }))
}

#[derive(Default)]
struct Decoder {
    elements: FnvHashMap<u64, Element>,
    failures: Vec<ElementError>,
}

impl Decoder {
    fn decode_element(&mut self, kind: ElementKind, value: &Value) -> Result<(), ElementError> {
        let element = match kind {
            ElementKind::Node => self.decode_node(value)?,
            ElementKind::Way => self.decode_way(value)?,
            ElementKind::Relation => self.decode_relation(value)?,
        };

        self.elements.insert(element.id(), element);
        Ok(())
    }

    fn decode_node(&mut self, value: &Value) -> Result<Element, ElementError> {
        let raw = parse_raw(value)?;
        let meta = raw.meta();

        let (Some(lat), Some(lon)) = (raw.lat, raw.lon) else {
            return Err(ElementError::UnexpectedNil { element_id: raw.id });
        };

        let is_interesting = tag_checker::has_interesting_tags(&raw.tags);

        Ok(Element::Node(Node {
            id: raw.id,
            tags: raw.tags,
            is_interesting,
            is_skippable: false,
            geometry: Geometry::Point(Coordinate::new(lat, lon)),
            meta,
        }))
    }

    fn decode_way(&mut self, value: &Value) -> Result<Element, ElementError> {
        let raw = parse_raw(value)?;
        let meta = raw.meta();
        let is_interesting = tag_checker::has_interesting_tags(&raw.tags);

        let node_ids = raw
            .nodes
            .ok_or(ElementError::UnexpectedNil { element_id: raw.id })?;

        let geometry = if let Some(center) = raw.center {
            // A center output collapses the way to a single coordinate.
            Geometry::Point(center)
        } else {
            let coordinates: Vec<Coordinate> = if let Some(vertices) = &raw.geometry {
                vertices_to_coordinates(vertices)
            } else {
                node_ids
                    .iter()
                    .filter_map(|id| match self.elements.get(id).map(Element::geometry) {
                        Some(Geometry::Point(coordinate)) => Some(*coordinate),
                        _ => None,
                    })
                    .collect()
            };

            // Every node id must have produced a coordinate.
            if coordinates.len() != node_ids.len() {
                return Err(ElementError::InvalidLength { way_id: raw.id });
            }

            if polygon_checker::is_polygon(&coordinates, &raw.tags) {
                Geometry::Polygon(coordinates)
            } else {
                Geometry::Polyline(coordinates)
            }
        };

        Ok(Element::Way(Way {
            id: raw.id,
            tags: raw.tags,
            is_interesting,
            is_skippable: false,
            nodes: node_ids,
            geometry,
            meta,
        }))
    }

    fn decode_relation(&mut self, value: &Value) -> Result<Element, ElementError> {
        let mut raw = parse_raw(value)?;
        let meta = raw.meta();
        let is_interesting = tag_checker::has_interesting_tags(&raw.tags);

        let relation_type = raw.tags.get("type").map(String::as_str);
        let is_displayable =
            relation_type.is_some_and(|t| Relation::DISPLAYABLE_TYPES.contains(&t));
        let is_multipolygon =
            relation_type.is_some_and(|t| Relation::MULTIPOLYGON_TYPES.contains(&t));

        let raw_members = raw
            .members
            .take()
            .ok_or(ElementError::UnexpectedNil { element_id: raw.id })?;

        // Member coordinates are only needed when an aggregate geometry
        // will actually be built from them.
        let members: Vec<ResolvedMember> = if is_displayable && raw.center.is_none() {
            self.resolve_member_coordinates(&raw_members)
        } else {
            raw_members
                .iter()
                .map(|member| ResolvedMember {
                    kind: member.r#type,
                    id: member.r#ref,
                    role: member.role.clone(),
                    coordinates: Vec::new(),
                })
                .collect()
        };

        let member_ids: Vec<u64> = members.iter().map(|member| member.id).collect();

        let geometry = if let Some(center) = raw.center {
            if is_multipolygon {
                // The aggregate collapses to its center; members would
                // otherwise be rendered a second time.
                self.mark_skippable(&member_ids);
                Geometry::Point(center)
            } else {
                Geometry::None
            }
        } else if is_multipolygon {
            self.multipolygon_geometry(raw.id, &members)?
        } else if is_displayable {
            self.multipolyline_geometry(raw.id, &members)?
        } else {
            Geometry::None
        };

        Ok(Element::Relation(Relation {
            id: raw.id,
            tags: raw.tags,
            is_interesting,
            is_skippable: false,
            members: member_ids,
            geometry,
            meta,
        }))
    }

    /// Resolves each member's coordinates from its inline geometry or,
    /// failing that, from the already-decoded way it references.
    fn resolve_member_coordinates(&self, members: &[RawMember]) -> Vec<ResolvedMember> {
        let mut resolved = Vec::with_capacity(members.len());

        for member in members {
            let coordinates = if let Some(vertices) = &member.geometry {
                let coordinates = vertices_to_coordinates(vertices);
                if coordinates.len() != vertices.len() {
                    warn!(
                        "dropping relation member {} with incomplete inline geometry",
                        member.r#ref
                    );
                    continue;
                }
                coordinates
            } else {
                let Some(element) = self.elements.get(&member.r#ref) else {
                    continue;
                };
                match element.geometry() {
                    Geometry::Polygon(coordinates) | Geometry::Polyline(coordinates) => {
                        coordinates.clone()
                    }
                    _ => Vec::new(),
                }
            };

            resolved.push(ResolvedMember {
                kind: member.r#type,
                id: member.r#ref,
                role: member.role.clone(),
                coordinates,
            });
        }

        resolved
    }

    fn multipolygon_geometry(
        &mut self,
        relation_id: u64,
        members: &[ResolvedMember],
    ) -> Result<Geometry, ElementError> {
        let outer_ways: Vec<&ResolvedMember> = members
            .iter()
            .filter(|member| member.kind == ElementKind::Way && member.role == "outer")
            .collect();
        let inner_ways: Vec<&ResolvedMember> = members
            .iter()
            .filter(|member| member.kind == ElementKind::Way && member.role == "inner")
            .collect();

        let merged_outers = segment_merge::merge_segments(
            outer_ways.iter().map(|m| m.coordinates.clone()).collect(),
        );
        let merged_inners = segment_merge::merge_segments(
            inner_ways.iter().map(|m| m.coordinates.clone()).collect(),
        );

        let polygons = ring_nest::nest_rings(merged_outers, merged_inners);
        if polygons.is_empty() {
            return Err(ElementError::EmptyRelation { relation_id });
        }

        // The rings now carry the member ways' geometry.
        for member in outer_ways.iter().chain(inner_ways.iter()) {
            if let Some(element) = self.elements.get_mut(&member.id) {
                element.set_skippable(true);
            }
        }

        Ok(Geometry::MultiPolygon(polygons))
    }

    fn multipolyline_geometry(
        &mut self,
        relation_id: u64,
        members: &[ResolvedMember],
    ) -> Result<Geometry, ElementError> {
        let way_members: Vec<&ResolvedMember> = members
            .iter()
            .filter(|member| member.kind == ElementKind::Way)
            .collect();

        let merged = segment_merge::merge_segments(
            way_members.iter().map(|m| m.coordinates.clone()).collect(),
        );
        if merged.is_empty() {
            return Err(ElementError::EmptyRelation { relation_id });
        }

        // Interesting member ways keep standing on their own; the rest
        // are represented by the aggregate.
        for member in &way_members {
            if let Some(element) = self.elements.get_mut(&member.id) {
                if !element.is_interesting() {
                    element.set_skippable(true);
                }
            }
        }

        Ok(Geometry::MultiPolyline(merged))
    }

    fn mark_skippable(&mut self, ids: &[u64]) {
        for id in ids {
            if let Some(element) = self.elements.get_mut(id) {
                element.set_skippable(true);
            }
        }
    }
}

fn parse_raw(value: &Value) -> Result<RawElement, ElementError> {
    RawElement::deserialize(value).map_err(|_| ElementError::UnexpectedNil {
        element_id: value.get("id").and_then(Value::as_u64).unwrap_or_default(),
    })
}

fn vertices_to_coordinates(vertices: &[RawVertex]) -> Vec<Coordinate> {
    vertices
        .iter()
        .filter_map(|vertex| match (vertex.lat, vertex.lon) {
            (Some(lat), Some(lon)) => Some(Coordinate::new(lat, lon)),
            _ => None,
        })
        .collect()
}
