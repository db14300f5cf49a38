//! Ant-style path patterns.
//!
//! - `?` matches one character within a segment
//! - `*` matches zero or more characters within a segment
//! - `**` as a whole segment matches zero or more segments
//!
//! Empty segments are ignored, so `/a//b/` and `/a/b` are the same path.

/// A compiled path pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathPattern {
    source: String,
    segments: Vec<String>,
}

impl PathPattern {
    #[must_use]
    pub fn new(pattern: &str) -> Self {
        Self {
            source: pattern.to_string(),
            segments: split(pattern).map(str::to_string).collect(),
        }
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.source
    }

    /// Whether this pattern matches every path.
    #[must_use]
    pub fn matches_everything(&self) -> bool {
        self.segments.iter().all(|segment| segment == "**") && !self.segments.is_empty()
    }

    #[must_use]
    pub fn matches(&self, path: &str) -> bool {
        let path: Vec<&str> = split(path).collect();
        let pattern: Vec<&str> = self.segments.iter().map(String::as_str).collect();
        match_segments(&pattern, &path)
    }
}

impl std::fmt::Display for PathPattern {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.source)
    }
}

/// Selects the requests a rule applies to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RequestMatcher {
    AnyRequest,
    Path(PathPattern),
}

impl RequestMatcher {
    #[must_use]
    pub fn path(pattern: &str) -> Self {
        Self::Path(PathPattern::new(pattern))
    }

    #[must_use]
    pub fn matches(&self, path: &str) -> bool {
        match self {
            Self::AnyRequest => true,
            Self::Path(pattern) => pattern.matches(path),
        }
    }

    /// Whether this matcher accepts every request path.
    #[must_use]
    pub fn is_universal(&self) -> bool {
        match self {
            Self::AnyRequest => true,
            Self::Path(pattern) => pattern.matches_everything(),
        }
    }
}

impl std::fmt::Display for RequestMatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::AnyRequest => f.write_str("any request"),
            Self::Path(pattern) => pattern.fmt(f),
        }
    }
}

fn split(path: &str) -> impl Iterator<Item = &str> {
    path.split('/').filter(|segment| !segment.is_empty())
}

fn match_segments(pattern: &[&str], path: &[&str]) -> bool {
    match pattern.split_first() {
        None => path.is_empty(),
        Some((&"**", rest)) => (0..=path.len()).any(|skip| match_segments(rest, &path[skip..])),
        Some((segment, rest)) => path.split_first().is_some_and(|(head, tail)| {
            match_segment(segment.as_bytes(), head.as_bytes()) && match_segments(rest, tail)
        }),
    }
}

fn match_segment(pattern: &[u8], text: &[u8]) -> bool {
    match pattern.split_first() {
        None => text.is_empty(),
        Some((b'*', rest)) => (0..=text.len()).any(|skip| match_segment(rest, &text[skip..])),
        Some((b'?', rest)) => !text.is_empty() && match_segment(rest, &text[1..]),
        Some((c, rest)) => text.first() == Some(c) && match_segment(rest, &text[1..]),
    }
}
