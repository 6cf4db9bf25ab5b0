//! Document paths
//!
//! Provides [`DocPath`] for addressing nodes inside a [`Document`](crate::Document).

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt::{self, Display, Formatter, Write as _};
use std::str::FromStr;

/// One step of a [`DocPath`]
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Segment {
    /// Map entry addressed by its key text
    Key(String),
    /// Sequence item addressed by position
    Index(usize),
}

impl Segment {
    /// Key text, if this is a key segment
    #[inline]
    #[must_use]
    pub fn as_key(&self) -> Option<&str> {
        match self {
            Self::Key(key) => Some(key),
            Self::Index(_) => None,
        }
    }

    /// Index, if this is an index segment
    #[inline]
    #[must_use]
    pub fn as_index(&self) -> Option<usize> {
        match self {
            Self::Key(_) => None,
            Self::Index(index) => Some(*index),
        }
    }
}

impl From<&str> for Segment {
    fn from(key: &str) -> Self {
        Self::Key(key.to_string())
    }
}

impl From<String> for Segment {
    fn from(key: String) -> Self {
        Self::Key(key)
    }
}

impl From<usize> for Segment {
    fn from(index: usize) -> Self {
        Self::Index(index)
    }
}

/// Path within a document tree
///
/// Hierarchical address made of map keys and sequence indices.
///
/// # Examples
/// - `["technical_assets", "server", "id"]` → `technical_assets.server.id`
/// - `["tags_available", 0]` → `tags_available[0]`
/// - keys containing `.`, `[` or `]` are written quoted: `risk_tracking."a.b@ta-1"`
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct DocPath(Vec<Segment>);

impl DocPath {
    /// Create new path from segments
    #[inline]
    #[must_use]
    pub fn new(segments: Vec<Segment>) -> Self {
        Self(segments)
    }

    /// Empty path (document root)
    #[inline]
    #[must_use]
    pub fn root() -> Self {
        Self(Vec::new())
    }

    /// Build a path made only of map keys
    #[must_use]
    pub fn from_keys<I, S>(keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self(keys.into_iter().map(|k| Segment::Key(k.into())).collect())
    }

    /// Get path segments
    #[inline]
    #[must_use]
    pub fn segments(&self) -> &[Segment] {
        &self.0
    }

    /// Get number of segments
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Check if path is empty (root)
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Get parent path (if not root)
    #[inline]
    #[must_use]
    pub fn parent(&self) -> Option<Self> {
        if self.0.is_empty() {
            None
        } else {
            Some(Self(self.0[..self.0.len() - 1].to_vec()))
        }
    }

    /// Get last segment (if not root)
    #[inline]
    #[must_use]
    pub fn last(&self) -> Option<&Segment> {
        self.0.last()
    }

    /// Split into parent segments and last segment
    #[inline]
    #[must_use]
    pub fn split_last(&self) -> Option<(&Segment, &[Segment])> {
        self.0.split_last()
    }

    /// Append a key segment, returning new path
    #[inline]
    #[must_use]
    pub fn key(&self, key: impl Into<String>) -> Self {
        let mut new = self.clone();
        new.0.push(Segment::Key(key.into()));
        new
    }

    /// Append an index segment, returning new path
    #[inline]
    #[must_use]
    pub fn index(&self, index: usize) -> Self {
        let mut new = self.clone();
        new.0.push(Segment::Index(index));
        new
    }

    /// Extend with all segments of another path
    #[inline]
    #[must_use]
    pub fn join(&self, other: &Self) -> Self {
        let mut new = self.clone();
        new.0.extend(other.0.iter().cloned());
        new
    }

    /// Check if this path is a prefix of another
    #[inline]
    #[must_use]
    pub fn is_prefix_of(&self, other: &Self) -> bool {
        if self.0.len() > other.0.len() {
            return false;
        }
        self.0 == other.0[..self.0.len()]
    }

    /// Iterator over segments from root to leaf
    #[inline]
    pub fn iter(&self) -> impl Iterator<Item = &Segment> {
        self.0.iter()
    }

    pub(crate) fn push(&mut self, segment: Segment) {
        self.0.push(segment);
    }

    pub(crate) fn pop(&mut self) {
        self.0.pop();
    }
}

fn key_needs_quotes(key: &str) -> bool {
    key.is_empty()
        || key
            .chars()
            .any(|c| matches!(c, '.' | '[' | ']' | '"' | '\\') || c.is_whitespace())
}

impl Display for DocPath {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        for (i, segment) in self.0.iter().enumerate() {
            match segment {
                Segment::Key(key) => {
                    if i > 0 {
                        f.write_char('.')?;
                    }
                    if key_needs_quotes(key) {
                        f.write_char('"')?;
                        for c in key.chars() {
                            if matches!(c, '"' | '\\') {
                                f.write_char('\\')?;
                            }
                            f.write_char(c)?;
                        }
                        f.write_char('"')?;
                    } else {
                        f.write_str(key)?;
                    }
                }
                Segment::Index(index) => write!(f, "[{index}]")?,
            }
        }
        Ok(())
    }
}

impl FromStr for DocPath {
    type Err = PathError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.is_empty() {
            return Ok(Self::root());
        }

        let mut segments = Vec::new();
        let mut chars = s.char_indices().peekable();
        // true right after a '.', or at the start: a key must follow
        let mut expect_key = true;

        while let Some(&(pos, c)) = chars.peek() {
            match c {
                '[' => {
                    chars.next();
                    let mut digits = String::new();
                    loop {
                        match chars.next() {
                            Some((_, ']')) => break,
                            Some((_, d)) if d.is_ascii_digit() => digits.push(d),
                            Some((p, other)) => {
                                return Err(PathError::UnexpectedChar { ch: other, pos: p })
                            }
                            None => return Err(PathError::UnterminatedIndex),
                        }
                    }
                    let index = digits
                        .parse::<usize>()
                        .map_err(|_| PathError::InvalidIndex(digits.clone()))?;
                    if expect_key && !segments.is_empty() {
                        return Err(PathError::EmptySegment);
                    }
                    segments.push(Segment::Index(index));
                    expect_key = false;
                }
                '.' => {
                    chars.next();
                    if expect_key {
                        return Err(PathError::EmptySegment);
                    }
                    expect_key = true;
                }
                '"' => {
                    if !expect_key {
                        return Err(PathError::UnexpectedChar { ch: c, pos });
                    }
                    chars.next();
                    let mut key = String::new();
                    loop {
                        match chars.next() {
                            Some((_, '"')) => break,
                            Some((_, '\\')) => match chars.next() {
                                Some((_, escaped)) => key.push(escaped),
                                None => return Err(PathError::UnterminatedQuote),
                            },
                            Some((_, other)) => key.push(other),
                            None => return Err(PathError::UnterminatedQuote),
                        }
                    }
                    segments.push(Segment::Key(key));
                    expect_key = false;
                }
                ']' => return Err(PathError::UnexpectedChar { ch: c, pos }),
                _ => {
                    if !expect_key {
                        return Err(PathError::UnexpectedChar { ch: c, pos });
                    }
                    let mut key = String::new();
                    while let Some(&(_, k)) = chars.peek() {
                        if matches!(k, '.' | '[' | ']' | '"') {
                            break;
                        }
                        key.push(k);
                        chars.next();
                    }
                    segments.push(Segment::Key(key));
                    expect_key = false;
                }
            }
        }

        if expect_key {
            return Err(PathError::EmptySegment);
        }

        Ok(Self(segments))
    }
}

impl From<Vec<Segment>> for DocPath {
    fn from(segments: Vec<Segment>) -> Self {
        Self(segments)
    }
}

impl From<&[&str]> for DocPath {
    fn from(keys: &[&str]) -> Self {
        Self::from_keys(keys.iter().copied())
    }
}

impl<const N: usize> From<[&str; N]> for DocPath {
    fn from(keys: [&str; N]) -> Self {
        Self::from_keys(keys)
    }
}

impl Serialize for DocPath {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for DocPath {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        text.parse().map_err(serde::de::Error::custom)
    }
}

/// Errors related to document paths
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PathError {
    /// Empty segment in path
    #[error("path contains empty segment")]
    EmptySegment,

    /// `[` without matching `]`
    #[error("unterminated index segment")]
    UnterminatedIndex,

    /// Index text does not fit a usize
    #[error("invalid index: {0}")]
    InvalidIndex(String),

    /// Quoted key without closing quote
    #[error("unterminated quoted key")]
    UnterminatedQuote,

    /// Character not allowed at this position
    #[error("unexpected '{ch}' at byte {pos}")]
    UnexpectedChar {
        /// Offending character
        ch: char,
        /// Byte offset in the path text
        pos: usize,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn path_from_keys() {
        let path = DocPath::from(["technical_assets", "server", "id"]);
        assert_eq!(path.len(), 3);
        assert_eq!(path.to_string(), "technical_assets.server.id");
    }

    #[test]
    fn path_parent_and_last() {
        let path = DocPath::from(["a", "b", "c"]);
        assert_eq!(path.parent().unwrap(), DocPath::from(["a", "b"]));
        assert_eq!(path.last(), Some(&Segment::Key("c".into())));
        assert!(DocPath::root().parent().is_none());
    }

    #[test]
    fn path_key_and_index_builders() {
        let path = DocPath::from(["tags_available"]).index(2);
        assert_eq!(path.to_string(), "tags_available[2]");
        let path = path.key("x");
        assert_eq!(path.to_string(), "tags_available[2].x");
    }

    #[test]
    fn path_is_prefix_of() {
        let a = DocPath::from(["a", "b"]);
        let b = DocPath::from(["a", "b", "c"]);
        assert!(a.is_prefix_of(&b));
        assert!(!b.is_prefix_of(&a));
    }

    #[test]
    fn path_from_str_with_indices() {
        let path: DocPath = "technical_assets.web.data_assets_sent[3]".parse().unwrap();
        assert_eq!(
            path.segments(),
            &[
                Segment::Key("technical_assets".into()),
                Segment::Key("web".into()),
                Segment::Key("data_assets_sent".into()),
                Segment::Index(3),
            ]
        );
    }

    #[test]
    fn path_from_str_quoted_key() {
        let path: DocPath = r#"risk_tracking."sql-injection@ta.1""#.parse().unwrap();
        assert_eq!(path.last(), Some(&Segment::Key("sql-injection@ta.1".into())));
        assert_eq!(path.to_string(), r#"risk_tracking."sql-injection@ta.1""#);
    }

    #[test]
    fn path_from_str_empty_is_root() {
        let path: DocPath = "".parse().unwrap();
        assert!(path.is_empty());
    }

    #[test]
    fn path_from_str_rejects_malformed() {
        assert_eq!("a..b".parse::<DocPath>(), Err(PathError::EmptySegment));
        assert_eq!("a.".parse::<DocPath>(), Err(PathError::EmptySegment));
        assert_eq!("a[1".parse::<DocPath>(), Err(PathError::UnterminatedIndex));
        assert!(matches!(
            "a[x]".parse::<DocPath>(),
            Err(PathError::UnexpectedChar { ch: 'x', .. })
        ));
        assert_eq!(r#"a."b"#.parse::<DocPath>(), Err(PathError::UnterminatedQuote));
    }

    #[test]
    fn path_display_round_trips() {
        let path = DocPath::new(vec![
            Segment::Key("risk_tracking".into()),
            Segment::Key("a b.c".into()),
            Segment::Index(0),
        ]);
        let text = path.to_string();
        assert_eq!(text.parse::<DocPath>().unwrap(), path);
    }

    #[test]
    fn path_serializes_as_string() {
        let path = DocPath::from(["a", "b"]).index(1);
        let json = serde_json::to_string(&path).unwrap();
        assert_eq!(json, "\"a.b[1]\"");
        let back: DocPath = serde_json::from_str(&json).unwrap();
        assert_eq!(back, path);
    }
}
