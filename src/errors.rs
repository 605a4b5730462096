use thiserror::Error;

/// Failures that invalidate an entire decode call. No graph is produced.
#[derive(Debug, Error)]
pub enum EnvelopeError {
    #[error("response body is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("response is missing the `elements` array")]
    MissingElements,
}

/// Failures scoped to a single element. The element is dropped, the
/// failure is recorded, and decoding of the batch continues.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ElementError {
    /// The full coordinate sequence for a way could not be constructed,
    /// usually because a referenced node is absent from the response.
    #[error("unable to construct the full geometry for way with id: {way_id}")]
    InvalidLength { way_id: u64 },
    /// A required value was missing or malformed while decoding one element.
    #[error("unexpected missing value when decoding element with id: {element_id}")]
    UnexpectedNil { element_id: u64 },
    /// Aggregate geometry construction yielded zero usable rings/segments.
    #[error("unable to create geometry for relation {relation_id} with 0 valid members")]
    EmptyRelation { relation_id: u64 },
}
