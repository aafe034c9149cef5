//! # Attribute Paths
//!
//! A path locates one value inside a nested entity graph. The wire form is a
//! flat string of dot-separated segment names, each optionally suffixed with a
//! bracketed value index: `"items[2].title"` or `"md:description[1]"`.
//! Attribute names may contain `':'` (namespaced attributes); only `'.'`
//! separates segments.
//!
//! Encoding omits `[0]`, so a raw string round-trip is not byte-identical for
//! explicit zero indices (`"a[0]"` decodes and re-encodes as `"a"`). The
//! decoded round-trip is canonical: `decode(encode(decode(p))) == decode(p)`.

use serde::{Deserialize, Serialize};
use thiserror::Error;

const SEPARATOR: char = '.';

#[derive(Error, Debug, Clone, PartialEq)]
pub enum PathError {
    #[error("Malformed index in segment '{0}'")]
    MalformedIndex(String),

    #[error("Empty segment in path '{0}'")]
    EmptySegment(String),
}

/// One step in an attribute path: an attribute name plus a value index.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PathSegment {
    pub name: String,
    pub index: usize,
}

impl PathSegment {
    pub fn new(name: impl Into<String>, index: usize) -> Self {
        Self {
            name: name.into(),
            index,
        }
    }
}

/// An ordered sequence of segments locating a value in the entity graph.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct AttributePath(pub Vec<PathSegment>);

impl AttributePath {
    pub fn root() -> Self {
        Self(Vec::new())
    }

    pub fn segment(name: impl Into<String>, index: usize) -> Self {
        Self(vec![PathSegment::new(name, index)])
    }

    pub fn push(&mut self, segment: PathSegment) {
        self.0.push(segment);
    }

    /// New path with one more segment appended.
    pub fn child(&self, name: impl Into<String>, index: usize) -> Self {
        let mut segments = self.0.clone();
        segments.push(PathSegment::new(name, index));
        Self(segments)
    }

    pub fn segments(&self) -> &[PathSegment] {
        &self.0
    }

    pub fn last(&self) -> Option<&PathSegment> {
        self.0.last()
    }

    /// The path without its final segment.
    pub fn parent(&self) -> Self {
        let mut segments = self.0.clone();
        segments.pop();
        Self(segments)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Lenient decode: malformed bracket content is coerced to index 0 and
    /// the bracket suffix is still stripped from the name.
    pub fn decode(path: &str) -> Self {
        Self(
            path.split(SEPARATOR)
                .filter(|s| !s.is_empty())
                .map(decode_segment)
                .collect(),
        )
    }

    /// Strict decode: reports malformed indices and empty segments instead of
    /// coercing. Used by tests and hosts that want codec drift surfaced.
    pub fn decode_strict(path: &str) -> Result<Self, PathError> {
        let mut segments = Vec::new();
        for raw in path.split(SEPARATOR) {
            if raw.is_empty() {
                return Err(PathError::EmptySegment(path.to_string()));
            }
            if let Some((name, digits)) = split_bracket(raw) {
                let index = digits
                    .parse::<usize>()
                    .map_err(|_| PathError::MalformedIndex(raw.to_string()))?;
                segments.push(PathSegment::new(name, index));
            } else {
                segments.push(PathSegment::new(raw, 0));
            }
        }
        Ok(Self(segments))
    }

    /// Encode to the wire form, omitting `[0]`.
    pub fn encode(&self) -> String {
        let parts: Vec<String> = self
            .0
            .iter()
            .map(|s| {
                if s.index > 0 {
                    format!("{}[{}]", s.name, s.index)
                } else {
                    s.name.clone()
                }
            })
            .collect();
        parts.join(".")
    }
}

fn decode_segment(raw: &str) -> PathSegment {
    match split_bracket(raw) {
        Some((name, digits)) => {
            // Non-numeric bracket content is coerced to 0.
            let index = digits.parse::<usize>().unwrap_or(0);
            PathSegment::new(name, index)
        }
        None => PathSegment::new(raw, 0),
    }
}

/// Splits `"name[7]"` into `("name", "7")`; `None` when there is no bracket
/// suffix. Uses the last `'['` so names containing brackets mid-string keep
/// everything before the suffix.
fn split_bracket(raw: &str) -> Option<(&str, &str)> {
    if !raw.ends_with(']') {
        return None;
    }
    let open = raw.rfind('[')?;
    Some((&raw[..open], &raw[open + 1..raw.len() - 1]))
}

impl std::fmt::Display for AttributePath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.encode())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_plain_name() {
        let path = AttributePath::decode("title");
        assert_eq!(path.segments(), &[PathSegment::new("title", 0)]);
    }

    #[test]
    fn test_decode_indexed_segments() {
        let path = AttributePath::decode("items[2].title[1]");
        assert_eq!(
            path.segments(),
            &[PathSegment::new("items", 2), PathSegment::new("title", 1)]
        );
    }

    #[test]
    fn test_decode_namespaced_name() {
        let path = AttributePath::decode("a:b[1]");
        assert_eq!(path.segments(), &[PathSegment::new("a:b", 1)]);
    }

    #[test]
    fn test_malformed_index_coerced_to_zero() {
        let path = AttributePath::decode("items[abc]");
        assert_eq!(path.segments(), &[PathSegment::new("items", 0)]);
    }

    #[test]
    fn test_strict_decode_reports_malformed_index() {
        let err = AttributePath::decode_strict("items[abc]").unwrap_err();
        assert_eq!(err, PathError::MalformedIndex("items[abc]".to_string()));
    }

    #[test]
    fn test_strict_decode_reports_empty_segment() {
        for raw in ["a..b", ".a", "a."] {
            let err = AttributePath::decode_strict(raw).unwrap_err();
            assert_eq!(err, PathError::EmptySegment(raw.to_string()), "for {raw}");
        }
    }

    #[test]
    fn test_strict_decode_accepts_valid_path() {
        let path = AttributePath::decode_strict("items[2].title").unwrap();
        assert_eq!(path, AttributePath::decode("items[2].title"));
    }

    #[test]
    fn test_encode_omits_zero_index() {
        let path = AttributePath(vec![
            PathSegment::new("items", 0),
            PathSegment::new("title", 3),
        ]);
        assert_eq!(path.encode(), "items.title[3]");
    }

    #[test]
    fn test_decoded_round_trip_is_canonical() {
        for raw in ["a", "a[0]", "a[2].b:c[1]", "x.y.z", "items[bad].title"] {
            let decoded = AttributePath::decode(raw);
            let again = AttributePath::decode(&decoded.encode());
            assert_eq!(decoded, again, "canonical round-trip failed for {raw}");
        }
    }

    #[test]
    fn test_raw_round_trip_asymmetry_for_explicit_zero() {
        // Documented asymmetry: explicit [0] is compacted away on encode.
        let decoded = AttributePath::decode("a[0]");
        assert_eq!(decoded.encode(), "a");
    }

    #[test]
    fn test_parent_and_child() {
        let path = AttributePath::decode("a[1].b");
        assert_eq!(path.parent(), AttributePath::decode("a[1]"));
        assert_eq!(path.child("c", 2), AttributePath::decode("a[1].b.c[2]"));
    }
}
