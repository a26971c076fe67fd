//! Path pattern compilation and segment matching.
//!
//! A pattern such as `/users/:id/files/*` is compiled once, at registration
//! time, into a [`PathPattern`]: an ordered list of [`Segment`]s. Request
//! paths are split with the same rules by [`split_path`] and compared
//! segment by segment, so the hot path never re-parses a pattern.
//!
//! ## Syntax
//!
//! | Piece        | Segment                                   |
//! |--------------|-------------------------------------------|
//! | `users`      | `Literal("users")`                        |
//! | `:id`        | `Parameter { name: "id" }`                |
//! | `{id}`       | `Parameter { name: "id" }`                |
//! | `:id?`       | optional parameter, final segment only    |
//! | `*`          | `Wildcard`, final segment only            |
//! | `.` / `..`   | dropped / removes the previous piece      |
//!
//! Empty pieces produced by leading, trailing or doubled slashes are
//! discarded, so `""`, `/` and `//` all compile to the root pattern.

use regex::Regex;
use smallvec::SmallVec;
use std::borrow::Cow;
use std::fmt;
use std::sync::Arc;

use super::core::ParamVec;

/// Name under which a [`Segment::Wildcard`] binds the remaining path.
pub const CATCH_ALL: &str = "*";

/// Request path segments, decoded and borrowed from the request path where possible.
pub type PathSegments<'a> = SmallVec<[Cow<'a, str>; 8]>;

/// Anchored regex constraint attached to a parameter segment.
#[derive(Clone)]
pub struct Constraint {
    source: Arc<str>,
    regex: Regex,
}

impl Constraint {
    fn new(source: &str) -> Result<Self, regex::Error> {
        let regex = Regex::new(&format!("^(?:{source})$"))?;
        Ok(Self {
            source: Arc::from(source),
            regex,
        })
    }

    /// The constraint as it was declared, without the added anchors.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.source
    }

    #[inline]
    fn accepts(&self, value: &str) -> bool {
        self.regex.is_match(value)
    }
}

impl PartialEq for Constraint {
    fn eq(&self, other: &Self) -> bool {
        self.source == other.source
    }
}

impl Eq for Constraint {}

impl fmt::Debug for Constraint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Constraint").field(&self.source).finish()
    }
}

/// One classified unit of a compiled path pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    /// Matches exactly one request segment with the same text (case-sensitive).
    Literal(Box<str>),
    /// Matches one non-empty request segment and binds it to `name`.
    Parameter {
        name: Arc<str>,
        /// When set, the segment must fully match this regex.
        constraint: Option<Constraint>,
        /// Optional parameters may match nothing; they are always last.
        optional: bool,
    },
    /// Matches the rest of the path (zero or more segments) and binds it
    /// under [`CATCH_ALL`].
    Wildcard,
}

impl Segment {
    pub fn literal(text: &str) -> Self {
        Segment::Literal(Box::from(text))
    }

    pub fn param(name: &str) -> Self {
        Segment::Parameter {
            name: Arc::from(name),
            constraint: None,
            optional: false,
        }
    }

    pub fn optional_param(name: &str) -> Self {
        Segment::Parameter {
            name: Arc::from(name),
            constraint: None,
            optional: true,
        }
    }

    /// Two segments have the same shape when they accept exactly the same
    /// request segments. Parameter names do not affect the shape.
    fn same_shape(&self, other: &Segment) -> bool {
        match (self, other) {
            (Segment::Literal(a), Segment::Literal(b)) => a == b,
            (
                Segment::Parameter {
                    constraint: ca,
                    optional: oa,
                    ..
                },
                Segment::Parameter {
                    constraint: cb,
                    optional: ob,
                    ..
                },
            ) => ca == cb && oa == ob,
            (Segment::Wildcard, Segment::Wildcard) => true,
            _ => false,
        }
    }
}

/// Malformed path pattern. Always a build-time defect in the route table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PatternError {
    /// `*` appeared somewhere other than the final segment.
    MisplacedWildcard { pattern: String },
    /// An optional parameter appeared somewhere other than the final segment.
    MisplacedOptional { pattern: String, name: String },
    /// A parameter sigil with nothing after it (`:`, `{}`, `:?`).
    EmptyParameterName { pattern: String },
    /// A parameter name that is not an identifier.
    InvalidParameterName { pattern: String, name: String },
    /// The same parameter name bound twice in one pattern.
    DuplicateParameter { pattern: String, name: String },
    /// A piece that could be read either as a literal or as a parameter or
    /// wildcard (`{id`, `a{id}`, `files*`).
    AmbiguousSegment { pattern: String, segment: String },
    /// A `..` piece that climbs above the root.
    EscapesRoot { pattern: String },
    /// A constraint was declared for a parameter the pattern does not bind.
    UnknownParameter { pattern: String, name: String },
    /// A constraint regex failed to compile.
    InvalidConstraint {
        pattern: String,
        name: String,
        message: String,
    },
}

impl fmt::Display for PatternError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PatternError::MisplacedWildcard { pattern } => {
                write!(f, "pattern '{pattern}': wildcard '*' must be the last segment")
            }
            PatternError::MisplacedOptional { pattern, name } => write!(
                f,
                "pattern '{pattern}': optional parameter '{name}' must be the last segment"
            ),
            PatternError::EmptyParameterName { pattern } => {
                write!(f, "pattern '{pattern}': parameter name is empty")
            }
            PatternError::InvalidParameterName { pattern, name } => write!(
                f,
                "pattern '{pattern}': invalid parameter name '{name}' (expected [A-Za-z_][A-Za-z0-9_]*)"
            ),
            PatternError::DuplicateParameter { pattern, name } => {
                write!(f, "pattern '{pattern}': parameter '{name}' is bound more than once")
            }
            PatternError::AmbiguousSegment { pattern, segment } => write!(
                f,
                "pattern '{pattern}': segment '{segment}' is neither a plain literal nor a whole-segment parameter"
            ),
            PatternError::EscapesRoot { pattern } => {
                write!(f, "pattern '{pattern}': '..' climbs above the root")
            }
            PatternError::UnknownParameter { pattern, name } => {
                write!(f, "pattern '{pattern}': no parameter named '{name}'")
            }
            PatternError::InvalidConstraint {
                pattern,
                name,
                message,
            } => write!(
                f,
                "pattern '{pattern}': invalid constraint for '{name}': {message}"
            ),
        }
    }
}

impl std::error::Error for PatternError {}

/// A compiled path pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathPattern {
    source: Arc<str>,
    segments: Box<[Segment]>,
}

impl PathPattern {
    /// Compile `pattern`, percent-decoding literal segments.
    pub fn parse(pattern: &str) -> Result<Self, PatternError> {
        Self::parse_with(pattern, true)
    }

    /// Compile `pattern`. `decode` must agree with the setting used when
    /// splitting request paths, otherwise encoded literals never match.
    pub fn parse_with(pattern: &str, decode: bool) -> Result<Self, PatternError> {
        let mut segments: Vec<Segment> = Vec::with_capacity(pattern.matches('/').count() + 1);

        for piece in pattern.split('/') {
            match piece {
                "" | "." => {}
                ".." => {
                    if segments.pop().is_none() {
                        return Err(PatternError::EscapesRoot {
                            pattern: pattern.to_string(),
                        });
                    }
                }
                "*" => segments.push(Segment::Wildcard),
                _ => segments.push(classify(pattern, piece, decode)?),
            }
        }

        validate(pattern, &segments)?;

        Ok(Self {
            source: Arc::from(pattern),
            segments: segments.into_boxed_slice(),
        })
    }

    /// Assemble a pattern from already-validated segments.
    pub(crate) fn from_segments(source: &str, segments: Vec<Segment>) -> Self {
        Self {
            source: Arc::from(source),
            segments: segments.into_boxed_slice(),
        }
    }

    /// The text this pattern was compiled from.
    #[must_use]
    pub fn source(&self) -> &str {
        &self.source
    }

    #[must_use]
    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// True for the root pattern (zero segments).
    #[must_use]
    pub fn is_root(&self) -> bool {
        self.segments.is_empty()
    }

    #[must_use]
    pub fn ends_with_wildcard(&self) -> bool {
        matches!(self.segments.last(), Some(Segment::Wildcard))
    }

    /// Names bound by this pattern, in order. The wildcard binds [`CATCH_ALL`].
    pub fn param_names(&self) -> impl Iterator<Item = &str> + '_ {
        self.segments.iter().filter_map(|s| match s {
            Segment::Parameter { name, .. } => Some(name.as_ref()),
            Segment::Wildcard => Some(CATCH_ALL),
            Segment::Literal(_) => None,
        })
    }

    /// Segments before a trailing wildcard (all segments if there is none).
    #[must_use]
    pub fn fixed_segments(&self) -> &[Segment] {
        match self.segments.split_last() {
            Some((Segment::Wildcard, head)) => head,
            _ => &self.segments,
        }
    }

    /// Append a wildcard unless the pattern already ends with one.
    ///
    /// Mount and middleware prefixes are always wildcard-terminated.
    pub fn into_prefix(self) -> Result<Self, PatternError> {
        if self.ends_with_wildcard() {
            return Ok(self);
        }
        if let Some(Segment::Parameter {
            name,
            optional: true,
            ..
        }) = self.segments.last()
        {
            return Err(PatternError::MisplacedOptional {
                pattern: self.source.to_string(),
                name: name.to_string(),
            });
        }
        let mut segments = self.segments.into_vec();
        segments.push(Segment::Wildcard);
        Ok(Self {
            source: self.source,
            segments: segments.into_boxed_slice(),
        })
    }

    /// Restrict parameter `name` to segments fully matching `regex`.
    pub fn constrain(&mut self, name: &str, regex: &str) -> Result<(), PatternError> {
        let source = Arc::clone(&self.source);
        let slot = self
            .segments
            .iter_mut()
            .find_map(|s| match s {
                Segment::Parameter {
                    name: n,
                    constraint,
                    ..
                } if n.as_ref() == name => Some(constraint),
                _ => None,
            })
            .ok_or_else(|| PatternError::UnknownParameter {
                pattern: source.to_string(),
                name: name.to_string(),
            })?;

        let compiled = Constraint::new(regex).map_err(|e| PatternError::InvalidConstraint {
            pattern: source.to_string(),
            name: name.to_string(),
            message: e.to_string(),
        })?;
        *slot = Some(compiled);
        Ok(())
    }

    /// True when both patterns accept exactly the same request paths.
    #[must_use]
    pub fn same_shape(&self, other: &PathPattern) -> bool {
        self.segments.len() == other.segments.len()
            && self
                .segments
                .iter()
                .zip(other.segments.iter())
                .all(|(a, b)| a.same_shape(b))
    }

    /// Match the whole of `path`. Bindings are appended to `params`; on
    /// failure `params` is left as it was.
    pub fn matches(&self, path: &[Cow<'_, str>], params: &mut ParamVec) -> bool {
        let mark = params.len();
        match match_segments(&self.segments, path, params) {
            Some(consumed) if consumed == path.len() => true,
            _ => {
                params.truncate(mark);
                false
            }
        }
    }

    /// Match the fixed part of a wildcard-terminated prefix against the
    /// leading segments of `path` and return how many segments it consumed.
    /// The trailing wildcard itself is not bound.
    pub fn match_prefix(&self, path: &[Cow<'_, str>], params: &mut ParamVec) -> Option<usize> {
        let mark = params.len();
        let consumed = match_segments(self.fixed_segments(), path, params);
        if consumed.is_none() {
            params.truncate(mark);
        }
        consumed
    }

    /// Render the pattern with concrete values. Returns `None` if a required
    /// parameter has no value.
    pub fn render<'v, F>(&self, mut lookup: F) -> Option<String>
    where
        F: FnMut(&str) -> Option<&'v str>,
    {
        let mut out = String::with_capacity(self.source.len());
        for segment in self.segments.iter() {
            match segment {
                Segment::Literal(text) => {
                    out.push('/');
                    out.push_str(&urlencoding::encode(text));
                }
                Segment::Parameter { name, optional, .. } => match lookup(name) {
                    Some(value) => {
                        out.push('/');
                        out.push_str(&urlencoding::encode(value));
                    }
                    None if *optional => {}
                    None => return None,
                },
                Segment::Wildcard => {
                    for piece in lookup(CATCH_ALL)
                        .unwrap_or_default()
                        .split('/')
                        .filter(|p| !p.is_empty())
                    {
                        out.push('/');
                        out.push_str(&urlencoding::encode(piece));
                    }
                }
            }
        }
        if out.is_empty() {
            out.push('/');
        }
        Some(out)
    }
}

impl fmt::Display for PathPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.segments.is_empty() {
            return f.write_str("/");
        }
        for segment in self.segments.iter() {
            match segment {
                Segment::Literal(text) => write!(f, "/{text}")?,
                Segment::Parameter { name, optional, .. } => {
                    write!(f, "/:{name}{}", if *optional { "?" } else { "" })?
                }
                Segment::Wildcard => f.write_str("/*")?,
            }
        }
        Ok(())
    }
}

/// Split a request path into segments.
///
/// Any `?query` or `#fragment` is dropped, empty pieces are discarded and,
/// when `decode` is set, each piece is percent-decoded *after* splitting so
/// an encoded `%2F` stays inside its segment. Pieces that do not decode to
/// valid UTF-8 are kept verbatim.
pub fn split_path(path: &str, decode: bool) -> PathSegments<'_> {
    let path = path
        .split_once(['?', '#'])
        .map_or(path, |(before, _)| before);
    path.split('/')
        .filter(|piece| !piece.is_empty())
        .map(|piece| decode_piece(piece, decode))
        .collect()
}

fn decode_piece(piece: &str, decode: bool) -> Cow<'_, str> {
    if decode && piece.contains('%') {
        urlencoding::decode(piece).unwrap_or(Cow::Borrowed(piece))
    } else {
        Cow::Borrowed(piece)
    }
}

fn classify(pattern: &str, piece: &str, decode: bool) -> Result<Segment, PatternError> {
    if let Some(raw) = piece.strip_prefix(':') {
        return parse_param(pattern, raw);
    }
    if piece.len() >= 2 && piece.starts_with('{') && piece.ends_with('}') {
        return parse_param(pattern, &piece[1..piece.len() - 1]);
    }
    if piece.contains(['{', '}', '*']) {
        return Err(PatternError::AmbiguousSegment {
            pattern: pattern.to_string(),
            segment: piece.to_string(),
        });
    }
    let decoded = decode_piece(piece, decode);
    Ok(Segment::Literal(Box::from(&*decoded)))
}

fn parse_param(pattern: &str, raw: &str) -> Result<Segment, PatternError> {
    let (name, optional) = match raw.strip_suffix('?') {
        Some(name) => (name, true),
        None => (raw, false),
    };
    if name.is_empty() {
        return Err(PatternError::EmptyParameterName {
            pattern: pattern.to_string(),
        });
    }
    if !is_identifier(name) {
        return Err(PatternError::InvalidParameterName {
            pattern: pattern.to_string(),
            name: name.to_string(),
        });
    }
    Ok(Segment::Parameter {
        name: Arc::from(name),
        constraint: None,
        optional,
    })
}

fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

fn validate(pattern: &str, segments: &[Segment]) -> Result<(), PatternError> {
    let last = segments.len().saturating_sub(1);
    for (i, segment) in segments.iter().enumerate() {
        match segment {
            Segment::Wildcard if i != last => {
                return Err(PatternError::MisplacedWildcard {
                    pattern: pattern.to_string(),
                })
            }
            Segment::Parameter { name, optional, .. } => {
                if *optional && i != last {
                    return Err(PatternError::MisplacedOptional {
                        pattern: pattern.to_string(),
                        name: name.to_string(),
                    });
                }
                let seen_before = segments[..i].iter().any(
                    |s| matches!(s, Segment::Parameter { name: n, .. } if n == name),
                );
                if seen_before {
                    return Err(PatternError::DuplicateParameter {
                        pattern: pattern.to_string(),
                        name: name.to_string(),
                    });
                }
            }
            _ => {}
        }
    }
    Ok(())
}

/// Pairwise segment comparison shared by routes, middleware and mounts.
///
/// Returns the number of request segments consumed. Bindings are pushed onto
/// `params` as they are found; the caller truncates on failure.
fn match_segments(
    pattern: &[Segment],
    path: &[Cow<'_, str>],
    params: &mut ParamVec,
) -> Option<usize> {
    let mut consumed = 0;
    for segment in pattern {
        match segment {
            Segment::Literal(text) => {
                if **path.get(consumed)? != **text {
                    return None;
                }
                consumed += 1;
            }
            Segment::Parameter {
                name,
                constraint,
                optional,
            } => {
                let Some(value) = path.get(consumed) else {
                    if *optional {
                        continue;
                    }
                    return None;
                };
                if let Some(constraint) = constraint {
                    if !constraint.accepts(value) {
                        return None;
                    }
                }
                params.push((Arc::clone(name), value.to_string()));
                consumed += 1;
            }
            Segment::Wildcard => {
                let rest = path[consumed..].join("/");
                params.push((Arc::from(CATCH_ALL), rest));
                return Some(path.len());
            }
        }
    }
    Some(consumed)
}
