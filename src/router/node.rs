use http::Method;
use once_cell::sync::OnceCell;
use std::fmt;

use super::params::RawParams;
use super::pattern::CompiledPattern;
use crate::binder::Binders;
use crate::dispatcher::{Action, Resolver};
use crate::error::Result;

/// Index of a node inside its [`RouteTree`](super::RouteTree)
///
/// Parent links are stored as ids rather than references, so the tree owns
/// every node exactly once.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub(crate) usize);

impl NodeId {
    /// The top-level scope of every tree
    pub const ROOT: NodeId = NodeId(0);

    #[must_use]
    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Which requests a node takes part in
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MethodConstraint {
    /// Matches every method
    Any,
    /// Matches one HTTP method
    Only(Method),
    /// Named for reverse routing, never matched
    Hidden,
    /// Scope for nested routes, never matched directly
    Group,
}

impl MethodConstraint {
    /// Whether a node with this constraint can be the result of a match
    ///
    /// `None` means the caller does not filter by method.
    #[must_use]
    pub fn accepts(&self, method: Option<&Method>) -> bool {
        match self {
            MethodConstraint::Any => true,
            MethodConstraint::Only(own) => method.map_or(true, |m| m == own),
            MethodConstraint::Hidden | MethodConstraint::Group => false,
        }
    }

    #[must_use]
    pub fn is_group(&self) -> bool {
        matches!(self, MethodConstraint::Group)
    }
}

impl fmt::Display for MethodConstraint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MethodConstraint::Any => write!(f, "ANY"),
            MethodConstraint::Only(method) => write!(f, "{method}"),
            MethodConstraint::Hidden => write!(f, "HIDDEN"),
            MethodConstraint::Group => write!(f, "GROUP"),
        }
    }
}

/// A single routable unit of the tree
///
/// Owns its pattern, action and local configuration. Anything not set locally
/// (host, error action, dispatcher, binders) is looked up through the parent
/// chain by the tree; a node never writes to its ancestors.
pub struct RouteNode {
    pub(crate) format: String,
    /// Ancestor formats followed by this node's own
    pub(crate) full_format: String,
    compiled: OnceCell<CompiledPattern>,
    pub(crate) action: Action,
    pub(crate) name: Option<String>,
    pub(crate) method: MethodConstraint,
    pub(crate) strict: bool,
    pub(crate) parent: Option<NodeId>,
    pub(crate) children: Vec<NodeId>,
    pub(crate) host: Option<String>,
    pub(crate) error_action: Option<Action>,
    pub(crate) dispatcher: Option<Resolver>,
    pub(crate) binders: Binders,
}

impl RouteNode {
    pub(crate) fn new(
        format: &str,
        full_format: String,
        action: Action,
        method: MethodConstraint,
        parent: Option<NodeId>,
    ) -> Self {
        let strict = !method.is_group();
        Self {
            format: format.to_string(),
            full_format,
            compiled: OnceCell::new(),
            action,
            name: None,
            method,
            strict,
            parent,
            children: Vec::new(),
            host: None,
            error_action: None,
            dispatcher: None,
            binders: Binders::default(),
        }
    }

    /// Compiled full pattern, built on first use and cached
    pub fn pattern(&self) -> Result<&CompiledPattern> {
        self.compiled
            .get_or_try_init(|| CompiledPattern::compile(&self.full_format))
    }

    /// Path-shape match: anchored at the end when strict, prefix otherwise
    pub fn captures(&self, path: &str) -> Result<Option<RawParams>> {
        Ok(self.pattern()?.captures(path, self.strict))
    }

    /// This node's own format, relative to its parent
    #[must_use]
    pub fn format(&self) -> &str {
        &self.format
    }

    #[must_use]
    pub fn full_format(&self) -> &str {
        &self.full_format
    }

    #[must_use]
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    #[must_use]
    pub fn method(&self) -> &MethodConstraint {
        &self.method
    }

    #[must_use]
    pub fn is_strict(&self) -> bool {
        self.strict
    }

    #[must_use]
    pub fn action(&self) -> &Action {
        &self.action
    }

    #[must_use]
    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    #[must_use]
    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    #[must_use]
    pub fn has_children(&self) -> bool {
        !self.children.is_empty()
    }

    pub(crate) fn set_strict(&mut self, strict: bool) {
        // Groups always match as a prefix
        self.strict = strict && !self.method.is_group();
    }
}
