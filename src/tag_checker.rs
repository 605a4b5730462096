use std::collections::HashMap;

/// Tag keys that carry provenance rather than descriptive detail. An
/// element whose tags are all in this set is not worth displaying on
/// its own.
const UNINTERESTING_TAGS: [&str; 9] = [
    "source",
    "source_ref",
    "source:ref",
    "history",
    "attribution",
    "created_by",
    "tiger:county",
    "tiger:tlid",
    "tiger:upload_uuid",
];

/// Returns true if any tag key falls outside the uninteresting set.
pub fn has_interesting_tags(tags: &HashMap<String, String>) -> bool {
    tags.keys()
        .any(|key| !UNINTERESTING_TAGS.contains(&key.as_str()))
}
