//! Path segment matching.
//!
//! # Responsibilities
//! - Tokenise a node's pattern string (`posts/:postId/*`)
//! - Match one pattern token against one path segment
//! - Match a whole node pattern against the head of the remaining path
//!
//! # Design Decisions
//! - Pattern kinds are a closed enum; one function dispatches on the tag
//! - Static tokens are case-sensitive exact matches
//! - `*` consumes exactly one segment, never the rest of the path
//! - Regex patterns are anchored and tested against a single segment
//! - Matching is pure and synchronous; it never suspends

use std::collections::HashSet;

use regex::Regex;

use crate::routing::types::{MatchParams, RouteError, RouteResult};

/// One token of a string pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SegmentToken {
    /// Matches a segment equal to the literal.
    Static(String),
    /// `:name`, binds the segment to `name`.
    Dynamic(String),
    /// `*`, accepts any single segment without binding it.
    Wildcard,
}

impl SegmentToken {
    /// Parse one `/`-delimited token of a pattern string.
    fn parse(node: &str, token: &str) -> RouteResult<Self> {
        if token.is_empty() {
            return Err(RouteError::MalformedPattern {
                node: node.to_string(),
                reason: "empty segment".to_string(),
            });
        }
        if let Some(name) = token.strip_prefix(':') {
            if name.is_empty() {
                return Err(RouteError::MalformedPattern {
                    node: node.to_string(),
                    reason: "dynamic segment ':' has no name".to_string(),
                });
            }
            return Ok(Self::Dynamic(name.to_string()));
        }
        if token.starts_with('*') {
            return Ok(Self::Wildcard);
        }
        Ok(Self::Static(token.to_string()))
    }
}

/// A param name bound twice in one pattern would silently keep only the
/// later segment.
fn check_unique_names<'a>(node: &str, names: impl Iterator<Item = &'a str>) -> RouteResult<()> {
    let mut seen = HashSet::new();
    for name in names {
        if !seen.insert(name) {
            return Err(RouteError::MalformedPattern {
                node: node.to_string(),
                reason: format!("duplicate param name ':{name}'"),
            });
        }
    }
    Ok(())
}

/// Result of matching a single token against the path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MatchOutcome {
    /// The token accepted the segment, binding zero or more params.
    Accepted(MatchParams),
    /// A segment was present but the token refused it.
    Rejected,
    /// The path ran out before the token could be tested.
    Exhausted,
}

/// Match one token against one (possibly missing) path segment.
pub fn match_segment(token: &SegmentToken, segment: Option<&str>) -> MatchOutcome {
    let Some(segment) = segment else {
        return MatchOutcome::Exhausted;
    };

    match token {
        SegmentToken::Static(literal) if literal == segment => MatchOutcome::Accepted(MatchParams::new()),
        SegmentToken::Static(_) => MatchOutcome::Rejected,
        SegmentToken::Dynamic(name) => {
            let mut params = MatchParams::new();
            params.insert(name.clone(), segment.to_string());
            MatchOutcome::Accepted(params)
        }
        SegmentToken::Wildcard => MatchOutcome::Accepted(MatchParams::new()),
    }
}

/// A node's route pattern.
#[derive(Debug, Clone, Default)]
pub enum RoutePattern {
    /// No pattern: consumes nothing and always accepts structurally.
    #[default]
    PassThrough,
    /// Ordered tokens, one per consumed segment.
    Tokens(Vec<SegmentToken>),
    /// A regular expression tested against exactly one segment.
    Regex {
        regex: Regex,
        /// Names bound positionally to capture groups 1..=n.
        captures: Vec<String>,
    },
}

/// A successful pattern match against the head of a path.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PatternMatch {
    /// Params bound by this node's pattern alone.
    pub params: MatchParams,
    /// Number of segments consumed from the path.
    pub consumed: usize,
}

impl RoutePattern {
    /// Tokenise a pattern string such as `comments/:commentId`.
    ///
    /// Leading and trailing `/` are ignored; interior empty segments are
    /// rejected as malformed.
    pub fn parse(node: &str, pattern: &str) -> RouteResult<Self> {
        let trimmed = pattern.trim_matches('/');
        if trimmed.is_empty() {
            return Err(RouteError::MalformedPattern {
                node: node.to_string(),
                reason: format!("pattern {pattern:?} has no segments; omit it for a pass-through node"),
            });
        }

        let tokens = trimmed
            .split('/')
            .map(|token| SegmentToken::parse(node, token))
            .collect::<RouteResult<Vec<_>>>()?;

        let names = tokens.iter().filter_map(|token| match token {
            SegmentToken::Dynamic(name) => Some(name.as_str()),
            _ => None,
        });
        check_unique_names(node, names)?;
        Ok(Self::Tokens(tokens))
    }

    /// Compile a regular expression pattern with positional capture names.
    ///
    /// The expression is anchored so it must match the whole segment.
    pub fn regex(node: &str, source: &str, captures: Vec<String>) -> RouteResult<Self> {
        let regex = Regex::new(&format!("^(?:{source})$")).map_err(|source| RouteError::InvalidRegex {
            node: node.to_string(),
            source,
        })?;

        let groups = regex.captures_len() - 1;
        if captures.len() > groups {
            return Err(RouteError::MalformedPattern {
                node: node.to_string(),
                reason: format!("{} capture names for {groups} capture groups", captures.len()),
            });
        }
        check_unique_names(node, captures.iter().map(String::as_str))?;
        Ok(Self::Regex { regex, captures })
    }

    /// Is this a pass-through pattern?
    pub fn is_pass_through(&self) -> bool {
        matches!(self, Self::PassThrough)
    }

    /// Match the pattern against the head of `tail`.
    ///
    /// Returns `None` if any token rejects or the path is exhausted first.
    pub fn match_tail(&self, tail: &[String]) -> Option<PatternMatch> {
        match self {
            Self::PassThrough => Some(PatternMatch::default()),
            Self::Tokens(tokens) => {
                let mut params = MatchParams::new();
                for (index, token) in tokens.iter().enumerate() {
                    match match_segment(token, tail.get(index).map(String::as_str)) {
                        MatchOutcome::Accepted(bound) => params.extend(bound),
                        MatchOutcome::Rejected | MatchOutcome::Exhausted => return None,
                    }
                }
                Some(PatternMatch {
                    params,
                    consumed: tokens.len(),
                })
            }
            Self::Regex { regex, captures } => {
                let segment = tail.first()?;
                let groups = regex.captures(segment)?;
                let params = captures
                    .iter()
                    .enumerate()
                    .filter_map(|(index, name)| {
                        groups
                            .get(index + 1)
                            .map(|group| (name.clone(), group.as_str().to_string()))
                    })
                    .collect();
                Some(PatternMatch { params, consumed: 1 })
            }
        }
    }
}
