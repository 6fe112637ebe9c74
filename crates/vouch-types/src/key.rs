//! Canonical slash-separated paths into a store snapshot.
//!
//! A [`KeyPath`] is the only way store paths are built or decoded. Parsing
//! tolerates leading, trailing, and repeated slashes (`"/a//b/"` is `a/b`) but
//! rejects `.` and `..` segments, so a key can never escape its scope.

use std::fmt;
use std::str::FromStr;

use crate::error::TypeError;

/// Validate a single path segment.
///
/// Segments must be non-empty, must not contain `/` or NUL, and must not be
/// `.` or `..`.
pub fn validate_segment(segment: &str) -> Result<(), TypeError> {
    let reason = if segment.is_empty() {
        "segment must not be empty"
    } else if segment.contains('/') {
        "segment must not contain '/'"
    } else if segment.contains('\0') {
        "segment must not contain NUL"
    } else if segment == "." || segment == ".." {
        "segment must not be '.' or '..'"
    } else {
        return Ok(());
    };
    Err(TypeError::InvalidSegment {
        segment: segment.to_string(),
        reason: reason.into(),
    })
}

/// A validated path of segments. The empty path is the store root.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct KeyPath {
    segments: Vec<String>,
}

impl KeyPath {
    /// The root path.
    pub fn root() -> Self {
        Self::default()
    }

    /// Parse a slash-separated path.
    pub fn parse(path: &str) -> Result<Self, TypeError> {
        let segments = path
            .split('/')
            .filter(|s| !s.is_empty())
            .map(|s| validate_segment(s).map(|()| s.to_string()))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { segments })
    }

    /// Build a path from individual segments, each validated as a whole
    /// segment (a `/` inside a segment is an error, not a separator).
    pub fn from_segments<I, S>(segments: I) -> Result<Self, TypeError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let segments = segments
            .into_iter()
            .map(|s| {
                let s = s.into();
                validate_segment(&s).map(|()| s)
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { segments })
    }

    /// Returns `true` for the root path.
    pub fn is_root(&self) -> bool {
        self.segments.is_empty()
    }

    /// The segments of this path.
    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    /// Number of segments.
    pub fn len(&self) -> usize {
        self.segments.len()
    }

    /// Returns `true` for the root path.
    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// `self` followed by `other`.
    pub fn join(&self, other: &KeyPath) -> KeyPath {
        let mut segments = self.segments.clone();
        segments.extend(other.segments.iter().cloned());
        KeyPath { segments }
    }

    /// `self` with one more segment.
    pub fn child(&self, segment: &str) -> Result<KeyPath, TypeError> {
        validate_segment(segment)?;
        let mut segments = self.segments.clone();
        segments.push(segment.to_string());
        Ok(KeyPath { segments })
    }
}

impl fmt::Display for KeyPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.segments.join("/"))
    }
}

impl FromStr for KeyPath {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_normalizes_slashes() {
        let p = KeyPath::parse("/a//b/c/").unwrap();
        assert_eq!(p.segments(), &["a", "b", "c"]);
        assert_eq!(p.to_string(), "a/b/c");
    }

    #[test]
    fn root_variants() {
        assert!(KeyPath::parse("").unwrap().is_root());
        assert!(KeyPath::parse("/").unwrap().is_root());
        assert_eq!(KeyPath::root().to_string(), "");
    }

    #[test]
    fn reject_dot_segments() {
        assert!(KeyPath::parse("a/../b").is_err());
        assert!(KeyPath::parse("./a").is_err());
    }

    #[test]
    fn from_segments_rejects_embedded_slash() {
        let err = KeyPath::from_segments(["abc", "x/y"]).unwrap_err();
        assert!(matches!(err, TypeError::InvalidSegment { .. }));
    }

    #[test]
    fn segments_keep_spaces_and_brackets() {
        let p = KeyPath::from_segments(["h", "Signed-off-by", "Jane Doe <jane@example.com>"])
            .unwrap();
        assert_eq!(p.segments()[2], "Jane Doe <jane@example.com>");
        assert_eq!(KeyPath::parse(&p.to_string()).unwrap(), p);
    }

    #[test]
    fn join_prepends_scope() {
        let scope = KeyPath::parse("0.0.2").unwrap();
        let key = KeyPath::parse("abc/Acked-by").unwrap();
        let full = scope.join(&key);
        assert_eq!(full.to_string(), "0.0.2/abc/Acked-by");
        assert_eq!(&full.segments()[1..], key.segments());
    }

    #[test]
    fn child_validates() {
        let p = KeyPath::root().child("a").unwrap();
        assert_eq!(p.to_string(), "a");
        assert!(p.child("").is_err());
    }
}
