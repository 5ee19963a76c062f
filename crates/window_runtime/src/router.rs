//! Endpoint pattern matching for refresh routing.

pub use window_host::normalize_endpoint as normalize_path;

/// Returns whether `path` matches `pattern`.
///
/// Patterns are `/`-separated: `*` accepts any segment (and, in last position, any suffix),
/// `{name}` accepts any segment or, when `entity_id` is given, only that id. Other segments are
/// literal. Segment counts must agree unless the pattern ends in `*`.
pub fn match_route(pattern: &str, path: &str, entity_id: Option<&str>) -> bool {
    if pattern == path {
        return true;
    }

    let pattern_segments: Vec<&str> = pattern.split('/').collect();
    let path_segments: Vec<&str> = path.split('/').collect();

    let has_wildcard = pattern_segments.last() == Some(&"*");
    if !has_wildcard && pattern_segments.len() != path_segments.len() {
        return false;
    }

    pattern_segments
        .iter()
        .enumerate()
        .all(|(idx, segment)| {
            let actual = path_segments.get(idx).copied();
            if *segment == "*" {
                return true;
            }
            if is_parameter(segment) {
                return match entity_id {
                    Some(id) => actual == Some(id),
                    None => true,
                };
            }
            actual == Some(*segment)
        })
}

fn is_parameter(segment: &str) -> bool {
    segment.len() >= 2 && segment.starts_with('{') && segment.ends_with('}')
}
