//! Decode Overpass API JSON responses into a typed graph of map
//! elements with fully resolved geometry.
//!
//! The decoder walks the response in three ordered passes (nodes, then
//! ways, then relations), stitches fragmented way segments into
//! continuous paths or closed rings, and nests interior rings inside
//! exterior rings to form polygons with holes. Transport, query
//! construction, and rendering are left to the caller.

pub mod decoder;
pub mod element;
pub mod errors;
pub mod geometry;
pub mod polygon_checker;
pub mod queue;
pub mod ring_nest;
pub mod segment_merge;
pub mod tag_checker;

pub use decoder::{decode, CancelToken, DecodeOutcome, Decoded};
pub use element::{Element, ElementGraph, ElementKind, Meta, Node, Relation, Way};
pub use errors::{ElementError, EnvelopeError};
pub use geometry::{Coordinate, Geometry, NestedPolygon};
pub use queue::{DecodeCallback, DecodeQueue};
