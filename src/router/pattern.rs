//! Route pattern compilation.
//!
//! A route format such as `/users/{id:\d+}/posts/{slug}` is turned into a pair
//! of anchored regular expressions plus the ordered list of declared
//! parameters. Literal text is escaped verbatim; `{name}` matches one or more
//! non-`/` characters and `{name:regex}` uses the given constraint.
//!
//! Each placeholder occurrence gets its own named group (`p0`, `p1`, ...), so
//! capture groups inside a custom constraint never shift the group to parameter
//! correspondence.
//!
//! When a name is declared twice in one pattern, the last occurrence's
//! constraint applies to every occurrence and the last occurrence's capture is
//! the extracted value.

use once_cell::sync::Lazy;
use regex::Regex;
use std::sync::Arc;

use super::params::RawParams;
use crate::error::{Result, RoutingError};

/// Constraint used for `{name}` placeholders
pub const DEFAULT_CONSTRAINT: &str = "[^/]+";

static PARAM_NAME_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").expect("parameter name regex should be valid")
});

/// A declared placeholder
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParamSpec {
    pub name: Arc<str>,
    /// Explicit constraint, `None` for the default
    pub constraint: Option<String>,
}

impl ParamSpec {
    #[must_use]
    pub fn constraint_or_default(&self) -> &str {
        self.constraint.as_deref().unwrap_or(DEFAULT_CONSTRAINT)
    }
}

#[derive(Debug, Clone)]
enum Segment {
    Literal(String),
    /// Index into `CompiledPattern::params`
    Param(usize),
}

/// Compiled form of a route format string
#[derive(Debug, Clone)]
pub struct CompiledPattern {
    format: String,
    /// `^body$`
    exact: Regex,
    /// `^body`
    prefix: Regex,
    params: Vec<ParamSpec>,
    segments: Vec<Segment>,
    /// Capture group index of the last occurrence of each param
    groups: Vec<usize>,
}

impl CompiledPattern {
    /// Compile a route format string
    ///
    /// # Example
    ///
    /// ```
    /// use nestroute::router::CompiledPattern;
    ///
    /// let pattern = CompiledPattern::compile(r"/users/{id:\d+}").unwrap();
    /// assert_eq!(pattern.param_names().collect::<Vec<_>>(), vec!["id"]);
    /// assert!(pattern.captures("/users/42", true).is_some());
    /// assert!(pattern.captures("/users/abc", true).is_none());
    /// ```
    pub fn compile(format: &str) -> Result<Self> {
        let segments = parse_segments(format)?;

        let mut params: Vec<ParamSpec> = Vec::with_capacity(format.matches('{').count());
        let mut occurrences: Vec<usize> = Vec::new();
        let mut compiled_segments = Vec::with_capacity(segments.len());

        for raw in segments {
            match raw {
                RawSegment::Literal(text) => compiled_segments.push(Segment::Literal(text)),
                RawSegment::Param { name, constraint } => {
                    if !PARAM_NAME_REGEX.is_match(&name) {
                        return Err(RoutingError::InvalidParamName {
                            format: format.to_string(),
                            name,
                        });
                    }
                    let idx = match params.iter().position(|p| p.name.as_ref() == name) {
                        Some(idx) => {
                            // Last declaration's constraint wins
                            params[idx].constraint = constraint;
                            idx
                        }
                        None => {
                            params.push(ParamSpec {
                                name: Arc::from(name),
                                constraint,
                            });
                            params.len() - 1
                        }
                    };
                    occurrences.push(idx);
                    compiled_segments.push(Segment::Param(idx));
                }
            }
        }

        let mut body = String::with_capacity(format.len() * 2);
        let mut occurrence = 0usize;
        for segment in &compiled_segments {
            match segment {
                Segment::Literal(text) => body.push_str(&regex::escape(text)),
                Segment::Param(idx) => {
                    body.push_str(&format!(
                        "(?P<p{occurrence}>{})",
                        params[*idx].constraint_or_default()
                    ));
                    occurrence += 1;
                }
            }
        }

        let build = |anchored: String| {
            Regex::new(&anchored).map_err(|source| RoutingError::InvalidPattern {
                format: format.to_string(),
                source,
            })
        };
        let exact = build(format!("^{body}$"))?;
        let prefix = build(format!("^{body}"))?;

        // Map each param to the group of its last occurrence
        let group_of = |name: &str| {
            exact
                .capture_names()
                .position(|n| n == Some(name))
                .unwrap_or_default()
        };
        let mut groups = vec![0usize; params.len()];
        for (occ, idx) in occurrences.iter().enumerate() {
            groups[*idx] = group_of(&format!("p{occ}"));
        }

        Ok(Self {
            format: format.to_string(),
            exact,
            prefix,
            params,
            segments: compiled_segments,
            groups,
        })
    }

    #[must_use]
    pub fn format(&self) -> &str {
        &self.format
    }

    /// Declared parameters, first declaration order, no duplicates
    #[must_use]
    pub fn params(&self) -> &[ParamSpec] {
        &self.params
    }

    pub fn param_names(&self) -> impl Iterator<Item = &str> {
        self.params.iter().map(|p| p.name.as_ref())
    }

    #[must_use]
    pub fn has_param(&self, name: &str) -> bool {
        self.params.iter().any(|p| p.name.as_ref() == name)
    }

    /// The anchored regex used for matching
    #[must_use]
    pub fn regex(&self, strict: bool) -> &Regex {
        if strict {
            &self.exact
        } else {
            &self.prefix
        }
    }

    /// Match `path` and extract raw parameters in declaration order
    ///
    /// Captured values are percent-decoded; a capture that does not decode to
    /// UTF-8 is kept as matched.
    #[must_use]
    pub fn captures(&self, path: &str, strict: bool) -> Option<RawParams> {
        let caps = self.regex(strict).captures(path)?;
        let mut raw = RawParams::new();
        for (param, group) in self.params.iter().zip(&self.groups) {
            let value = caps.get(*group).map(|m| m.as_str()).unwrap_or_default();
            let value = urlencoding::decode(value)
                .map_or_else(|_| value.to_string(), |decoded| decoded.into_owned());
            raw.push_shared(&param.name, value);
        }
        Some(raw)
    }

    /// Whether the pattern matches the start of `path`
    #[must_use]
    pub fn is_prefix_of(&self, path: &str) -> bool {
        self.prefix.is_match(path)
    }

    /// Rebuild a concrete path by substituting every placeholder occurrence
    ///
    /// Values are written as returned by `value`; callers encode them.
    pub fn render<F>(&self, mut value: F) -> Result<String>
    where
        F: FnMut(&str) -> Result<String>,
    {
        let mut out = String::with_capacity(self.format.len() + 16);
        for segment in &self.segments {
            match segment {
                Segment::Literal(text) => out.push_str(text),
                Segment::Param(idx) => out.push_str(&value(&self.params[*idx].name)?),
            }
        }
        Ok(out)
    }
}

enum RawSegment {
    Literal(String),
    Param {
        name: String,
        constraint: Option<String>,
    },
}

/// Split a format string into literal runs and placeholders.
///
/// Braces nest inside a placeholder so constraints like `\d{4}` survive.
fn parse_segments(format: &str) -> Result<Vec<RawSegment>> {
    let unbalanced = || RoutingError::UnbalancedBraces {
        format: format.to_string(),
    };

    let mut segments = Vec::new();
    let mut literal = String::new();
    let mut placeholder = String::new();
    let mut depth = 0usize;

    for ch in format.chars() {
        match (ch, depth) {
            ('{', 0) => {
                if !literal.is_empty() {
                    segments.push(RawSegment::Literal(std::mem::take(&mut literal)));
                }
                depth = 1;
            }
            ('}', 0) => return Err(unbalanced()),
            ('{', _) => {
                depth += 1;
                placeholder.push(ch);
            }
            ('}', 1) => {
                depth = 0;
                let content = std::mem::take(&mut placeholder);
                let (name, constraint) = match content.split_once(':') {
                    Some((name, constraint)) => (name.trim(), Some(constraint.to_string())),
                    None => (content.trim(), None),
                };
                segments.push(RawSegment::Param {
                    name: name.to_string(),
                    constraint: constraint.filter(|c| !c.is_empty()),
                });
            }
            ('}', _) => {
                depth -= 1;
                placeholder.push(ch);
            }
            (_, 0) => literal.push(ch),
            (_, _) => placeholder.push(ch),
        }
    }

    if depth != 0 {
        return Err(unbalanced());
    }
    if !literal.is_empty() {
        segments.push(RawSegment::Literal(literal));
    }
    Ok(segments)
}
