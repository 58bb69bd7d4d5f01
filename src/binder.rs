//! # Binder Module
//!
//! Binders transform parameter values on their way in and out of the router.
//!
//! - **Inbound** binders run after a path matched. They receive the raw
//!   captured strings and produce the value handed to the action (for
//!   instance parsing `"42"` into `42`, or loading a record by id).
//! - **Outbound** binders run while building a path. They are either a fixed
//!   string, hard-wiring a segment regardless of what the caller passes, or a
//!   transform that derives the segment from the outgoing parameters.
//!
//! Binders are registered per node and inherited: a lookup walks from the
//! matched node up to the root and takes the first registration found.
//!
//! ## Single execution per pass
//!
//! Every resolution or fetch allocates a fresh pass ([`InboundPass`] /
//! [`OutboundPass`]) holding the memo for that call only. A binder may ask the
//! pass for another parameter's bound value; the pass computes it at most once
//! and returns the memoized value to every later caller. Nothing is cached on
//! the nodes, so a shared tree can serve concurrent passes.

use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::trace;

use crate::error::{Result, RoutingError};
use crate::router::{NodeId, Params, RawParams, RouteTree};

/// Inbound transform: raw captures in, bound value out
pub type BindInFn = Arc<dyn Fn(&mut InboundPass<'_>) -> anyhow::Result<Value> + Send + Sync>;

/// Outbound transform: outgoing params in, path segment out
pub type BindOutFn = Arc<dyn Fn(&mut OutboundPass<'_>) -> anyhow::Result<String> + Send + Sync>;

/// An outbound binder registration
#[derive(Clone)]
pub enum BindOut {
    /// Fixed segment value
    Value(String),
    /// Derived from the outgoing parameters
    Transform(BindOutFn),
}

impl BindOut {
    pub fn transform<F>(f: F) -> Self
    where
        F: Fn(&mut OutboundPass<'_>) -> anyhow::Result<String> + Send + Sync + 'static,
    {
        BindOut::Transform(Arc::new(f))
    }
}

impl From<&str> for BindOut {
    fn from(value: &str) -> Self {
        BindOut::Value(value.to_string())
    }
}

impl From<String> for BindOut {
    fn from(value: String) -> Self {
        BindOut::Value(value)
    }
}

impl std::fmt::Debug for BindOut {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BindOut::Value(v) => f.debug_tuple("Value").field(v).finish(),
            BindOut::Transform(_) => f.write_str("Transform(..)"),
        }
    }
}

/// Per-node binder registries
#[derive(Clone, Default)]
pub(crate) struct Binders {
    pub(crate) inbound: HashMap<String, BindInFn>,
    pub(crate) outbound: HashMap<String, BindOut>,
}

/// Render a bound value as a path segment
#[must_use]
pub fn value_to_segment(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

/// One inbound binding pass over a set of raw captures
pub struct InboundPass<'t> {
    tree: &'t RouteTree,
    node: NodeId,
    raw: &'t RawParams,
    memo: HashMap<String, Value>,
    active: Vec<String>,
}

impl<'t> InboundPass<'t> {
    pub(crate) fn new(tree: &'t RouteTree, node: NodeId, raw: &'t RawParams) -> Self {
        Self {
            tree,
            node,
            raw,
            memo: HashMap::new(),
            active: Vec::new(),
        }
    }

    /// The full raw-params mapping of the match
    #[must_use]
    pub fn raw_params(&self) -> &RawParams {
        self.raw
    }

    #[must_use]
    pub fn raw(&self, name: &str) -> Option<&str> {
        self.raw.get(name).map(String::as_str)
    }

    /// The node whose binders are in effect
    #[must_use]
    pub fn node(&self) -> NodeId {
        self.node
    }

    /// Bound value of `name`
    ///
    /// Runs the inherited binder at most once per pass; without a binder the
    /// raw string passes through. `None` when the name was not captured and no
    /// binder exists.
    pub fn bound(&mut self, name: &str) -> Result<Option<Value>> {
        if let Some(value) = self.memo.get(name) {
            return Ok(Some(value.clone()));
        }

        let tree = self.tree;
        let Some(binder) = tree.binder_in(self.node, name) else {
            return Ok(self.raw(name).map(|v| Value::String(v.to_string())));
        };

        if self.active.iter().any(|n| n == name) {
            return Err(RoutingError::BinderCycle {
                name: name.to_string(),
            });
        }
        self.active.push(name.to_string());
        let result = binder(self);
        self.active.pop();

        let value = result.map_err(|source| RoutingError::Binder {
            name: name.to_string(),
            source,
        })?;
        trace!(node = %self.node, param = %name, value = %value, "Inbound binder applied");
        self.memo.insert(name.to_string(), value.clone());
        Ok(Some(value))
    }

    /// Bind every captured name, keeping capture order
    pub fn bind_all(&mut self) -> Result<Params<Value>> {
        let raw = self.raw;
        let mut bound = Params::new();
        for (name, value) in raw.iter() {
            let value = self
                .bound(name)?
                .unwrap_or_else(|| Value::String(value.clone()));
            bound.insert(name, value);
        }
        Ok(bound)
    }
}

/// One outbound binding pass over caller-supplied params
pub struct OutboundPass<'t> {
    tree: &'t RouteTree,
    node: NodeId,
    params: &'t Params<Value>,
    memo: HashMap<String, String>,
    active: Vec<String>,
}

impl<'t> OutboundPass<'t> {
    pub(crate) fn new(tree: &'t RouteTree, node: NodeId, params: &'t Params<Value>) -> Self {
        Self {
            tree,
            node,
            params,
            memo: HashMap::new(),
            active: Vec::new(),
        }
    }

    /// The full outgoing param mapping
    #[must_use]
    pub fn params(&self) -> &Params<Value> {
        self.params
    }

    #[must_use]
    pub fn value(&self, name: &str) -> Option<&Value> {
        self.params.get(name)
    }

    #[must_use]
    pub fn node(&self) -> NodeId {
        self.node
    }

    /// Path segment for `name`
    ///
    /// A fixed binder value wins over whatever the caller passed. A transform
    /// runs at most once per pass. Without a binder the caller's value is
    /// rendered as-is; `None` if the caller did not pass one.
    pub fn bound(&mut self, name: &str) -> Result<Option<String>> {
        if let Some(value) = self.memo.get(name) {
            return Ok(Some(value.clone()));
        }

        let tree = self.tree;
        let value = match tree.binder_out(self.node, name) {
            None => return Ok(self.params.get(name).map(value_to_segment)),
            Some(BindOut::Value(fixed)) => fixed.clone(),
            Some(BindOut::Transform(transform)) => {
                if self.active.iter().any(|n| n == name) {
                    return Err(RoutingError::BinderCycle {
                        name: name.to_string(),
                    });
                }
                self.active.push(name.to_string());
                let result = transform(self);
                self.active.pop();
                result.map_err(|source| RoutingError::Binder {
                    name: name.to_string(),
                    source,
                })?
            }
        };

        trace!(node = %self.node, param = %name, value = %value, "Outbound binder applied");
        self.memo.insert(name.to_string(), value.clone());
        Ok(Some(value))
    }

    /// Bind every outgoing name, keeping the caller's order
    pub fn bind_all(&mut self) -> Result<Params<String>> {
        let params = self.params;
        let mut bound = Params::new();
        for (name, value) in params.iter() {
            let segment = match self.bound(name)? {
                Some(segment) => segment,
                None => value_to_segment(value),
            };
            bound.insert(name, segment);
        }
        Ok(bound)
    }
}

impl RouteTree {
    /// Inbound binder for `name`, local first, then up the parent chain
    #[must_use]
    pub fn binder_in(&self, id: NodeId, name: &str) -> Option<&BindInFn> {
        self.ancestors(id)
            .find_map(|node| node.binders.inbound.get(name))
    }

    /// Outbound binder for `name`, local first, then up the parent chain
    #[must_use]
    pub fn binder_out(&self, id: NodeId, name: &str) -> Option<&BindOut> {
        self.ancestors(id)
            .find_map(|node| node.binders.outbound.get(name))
    }

    /// Bound value of a single inbound parameter, in a pass of its own
    pub fn get_bound_in_param(
        &self,
        id: NodeId,
        name: &str,
        raw: &RawParams,
    ) -> Result<Option<Value>> {
        InboundPass::new(self, id, raw).bound(name)
    }

    /// Bind every raw capture for node `id`
    pub fn bind_in_params(&self, id: NodeId, raw: &RawParams) -> Result<Params<Value>> {
        InboundPass::new(self, id, raw).bind_all()
    }

    /// Bound segment of a single outbound parameter, in a pass of its own
    pub fn get_bound_out_param(
        &self,
        id: NodeId,
        name: &str,
        params: &Params<Value>,
    ) -> Result<Option<String>> {
        OutboundPass::new(self, id, params).bound(name)
    }

    /// Bind every outgoing param for node `id`
    pub fn bind_out_params(&self, id: NodeId, params: &Params<Value>) -> Result<Params<String>> {
        OutboundPass::new(self, id, params).bind_all()
    }
}
