//! Router core module - route tree storage, registration and path resolution.

use http::Method;
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, trace};

use super::node::{MethodConstraint, NodeId, RouteNode};
use super::params::{RawParams, RouteData};
use crate::binder::{BindInFn, BindOut, InboundPass};
use crate::dispatcher::{Action, Handler, Resolver};
use crate::error::{Result, RoutingError};

/// Tree of nested route scopes
///
/// Nodes live in an arena and refer to their parent by [`NodeId`]; the tree
/// owns every node and nodes are never removed individually. Children are
/// kept in declaration order, which is also the order matching tries them in.
///
/// The tree is built once and then read. Resolution takes `&self` and keeps
/// its per-call binder memo on the stack, so a finished tree can be shared
/// between threads; registering while resolving needs outside locking.
pub struct RouteTree {
    nodes: Vec<RouteNode>,
}

impl Default for RouteTree {
    fn default() -> Self {
        Self::new()
    }
}

/// One row of [`RouteTree::routes`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RouteSummary {
    #[serde(skip)]
    pub id: NodeId,
    pub method: String,
    pub pattern: String,
    pub name: Option<String>,
    pub depth: usize,
}

/// Iterator from a node up to the root, the node itself first
pub struct Ancestors<'t> {
    tree: &'t RouteTree,
    next: Option<NodeId>,
}

impl<'t> Iterator for Ancestors<'t> {
    type Item = &'t RouteNode;

    fn next(&mut self) -> Option<Self::Item> {
        let node = self.tree.nodes.get(self.next?.0)?;
        self.next = node.parent;
        Some(node)
    }
}

impl RouteTree {
    /// Create a tree holding only the root scope
    #[must_use]
    pub fn new() -> Self {
        let root = RouteNode::new("", String::new(), Action::None, MethodConstraint::Group, None);
        Self { nodes: vec![root] }
    }

    #[must_use]
    pub fn root(&self) -> NodeId {
        NodeId::ROOT
    }

    /// Borrow a node
    ///
    /// # Panics
    ///
    /// Ids are only handed out by this tree; an id from another tree may be
    /// out of range. [`get_node`](Self::get_node) is the checked form.
    #[must_use]
    pub fn node(&self, id: NodeId) -> &RouteNode {
        &self.nodes[id.0]
    }

    /// Borrow a node, failing with `UnknownNode` for a foreign id
    pub fn get_node(&self, id: NodeId) -> Result<&RouteNode> {
        self.nodes
            .get(id.0)
            .ok_or(RoutingError::UnknownNode { route: id })
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Whether only the root scope exists
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.len() == 1
    }

    /// Fluent handle on an existing node, for further configuration
    pub fn scope_mut(&mut self, id: NodeId) -> Result<RouteMut<'_>> {
        self.get_node(id)?;
        Ok(RouteMut { tree: self, id })
    }

    pub fn ancestors(&self, id: NodeId) -> Ancestors<'_> {
        Ancestors {
            tree: self,
            next: Some(id),
        }
    }

    /// Nearest host up the parent chain
    #[must_use]
    pub fn host(&self, id: NodeId) -> Option<&str> {
        self.ancestors(id).find_map(|node| node.host.as_deref())
    }

    pub(crate) fn add_child(
        &mut self,
        parent: NodeId,
        format: &str,
        action: Action,
        method: MethodConstraint,
    ) -> NodeId {
        let full_format = format!("{}{}", self.nodes[parent.0].full_format, format);
        let id = NodeId(self.nodes.len());

        debug!(
            route = %id,
            parent = %parent,
            method = %method,
            pattern = %full_format,
            "Route registered"
        );

        self.nodes
            .push(RouteNode::new(format, full_format, action, method, Some(parent)));
        self.nodes[parent.0].children.push(id);
        id
    }

    /// Resolve `path` to the first matching route, any method
    ///
    /// Children are tried in declaration order and the first match wins. A
    /// group is entered only when its own prefix matches; if none of its
    /// children match, resolution moves on to the group's next sibling.
    /// Hidden routes and groups are never returned.
    ///
    /// A query string or fragment is not part of the match: routes see the
    /// text before the first `?` or `#`, and the query lands in
    /// [`RouteData::query_params`].
    pub fn find_path(&self, path: &str) -> Result<Option<RouteData>> {
        self.find(path, None)
    }

    /// Resolve `path` to the first matching route that accepts `method`
    pub fn find_path_for(&self, method: &Method, path: &str) -> Result<Option<RouteData>> {
        self.find(path, Some(method))
    }

    fn find(&self, path: &str, method: Option<&Method>) -> Result<Option<RouteData>> {
        debug!(
            path = %path,
            method = ?method,
            "Route match attempt"
        );

        let (route_path, _) = split_target(path);
        let found = self.find_in(NodeId::ROOT, path, route_path, method)?;
        match &found {
            Some(data) => debug!(
                path = %path,
                route = %data.route(),
                route_pattern = %self.node(data.route()).full_format,
                path_params = ?data.raw_params(),
                "Route matched"
            ),
            None => debug!(path = %path, method = ?method, "No route matched"),
        }
        Ok(found)
    }

    fn find_in(
        &self,
        scope: NodeId,
        path: &str,
        route_path: &str,
        method: Option<&Method>,
    ) -> Result<Option<RouteData>> {
        for &child in &self.node(scope).children {
            let node = self.node(child);

            if node.method.accepts(method) {
                if let Some(data) = self.match_route(child, path)? {
                    return Ok(Some(data));
                }
            }

            if node.has_children() && node.pattern()?.is_prefix_of(route_path) {
                trace!(route = %child, path = %route_path, "Entering scope");
                if let Some(data) = self.find_in(child, path, route_path, method)? {
                    return Ok(Some(data));
                }
            }
        }
        Ok(None)
    }

    /// Match `path` against node `id` alone and bind its parameters
    ///
    /// Path shape only: the node's method constraint is not consulted. Any
    /// query string or fragment is split off before matching.
    pub fn match_route(&self, id: NodeId, path: &str) -> Result<Option<RouteData>> {
        let (route_path, query) = split_target(path);
        let Some(raw) = self.get_node(id)?.captures(route_path)? else {
            return Ok(None);
        };
        let params = InboundPass::new(self, id, &raw).bind_all()?;
        Ok(Some(
            RouteData::new(id, path, params, raw).with_query_params(parse_query(query)),
        ))
    }

    /// First node named `name`, depth-first in declaration order
    #[must_use]
    pub fn find_route(&self, name: &str) -> Option<NodeId> {
        self.preorder()
            .into_iter()
            .map(|(id, _)| id)
            .find(|id| self.node(*id).name.as_deref() == Some(name))
    }

    #[must_use]
    pub fn has_route(&self, name: &str) -> bool {
        self.find_route(name).is_some()
    }

    /// Like [`find_route`](Self::find_route), failing with `RouteNotFound`
    pub fn get_route(&self, name: &str) -> Result<NodeId> {
        self.find_route(name)
            .ok_or_else(|| RoutingError::RouteNotFound {
                name: name.to_string(),
            })
    }

    /// Every registered node except the root, in pre-order
    #[must_use]
    pub fn routes(&self) -> Vec<RouteSummary> {
        self.preorder()
            .into_iter()
            .map(|(id, depth)| {
                let node = self.node(id);
                RouteSummary {
                    id,
                    method: node.method.to_string(),
                    pattern: node.full_format.clone(),
                    name: node.name.clone(),
                    depth,
                }
            })
            .collect()
    }

    /// Full patterns of every matchable route
    #[must_use]
    pub fn path_patterns(&self) -> Vec<String> {
        self.preorder()
            .into_iter()
            .map(|(id, _)| self.node(id))
            .filter(|node| node.method.accepts(None))
            .map(|node| node.full_format.clone())
            .collect()
    }

    fn preorder(&self) -> Vec<(NodeId, usize)> {
        let mut out = Vec::with_capacity(self.nodes.len());
        let mut stack: Vec<(NodeId, usize)> = self.nodes[0]
            .children
            .iter()
            .rev()
            .map(|id| (*id, 0))
            .collect();
        while let Some((id, depth)) = stack.pop() {
            out.push((id, depth));
            stack.extend(self.node(id).children.iter().rev().map(|c| (*c, depth + 1)));
        }
        out
    }
}

/// Split a request target into the routed path and its query string
///
/// The fragment is dropped.
fn split_target(target: &str) -> (&str, Option<&str>) {
    let target = target.split_once('#').map_or(target, |(before, _)| before);
    match target.split_once('?') {
        Some((path, query)) => (path, Some(query)),
        None => (target, None),
    }
}

fn parse_query(query: Option<&str>) -> RawParams {
    let decode = |part: &str| {
        urlencoding::decode(part).map_or_else(|_| part.to_string(), |v| v.into_owned())
    };
    query
        .into_iter()
        .flat_map(|q| q.split('&'))
        .filter(|pair| !pair.is_empty())
        .map(|pair| match pair.split_once('=') {
            Some((key, value)) => (decode(key), decode(value)),
            None => (decode(pair), String::new()),
        })
        .collect()
}

/// Registration and scope configuration, shared by the tree (root scope) and
/// by [`RouteMut`] (any nested scope)
pub trait RouteScope {
    /// The tree being configured
    fn tree_mut(&mut self) -> &mut RouteTree;

    /// The node registrations attach to
    fn scope_id(&self) -> NodeId;

    /// Append a child route and return a handle to it
    fn route(
        &mut self,
        format: &str,
        action: impl Into<Action>,
        method: MethodConstraint,
    ) -> RouteMut<'_> {
        let parent = self.scope_id();
        let tree = self.tree_mut();
        let id = tree.add_child(parent, format, action.into(), method);
        RouteMut { tree, id }
    }

    fn any(&mut self, format: &str, action: impl Into<Action>) -> RouteMut<'_> {
        self.route(format, action, MethodConstraint::Any)
    }

    fn get(&mut self, format: &str, action: impl Into<Action>) -> RouteMut<'_> {
        self.route(format, action, MethodConstraint::Only(Method::GET))
    }

    fn head(&mut self, format: &str, action: impl Into<Action>) -> RouteMut<'_> {
        self.route(format, action, MethodConstraint::Only(Method::HEAD))
    }

    fn post(&mut self, format: &str, action: impl Into<Action>) -> RouteMut<'_> {
        self.route(format, action, MethodConstraint::Only(Method::POST))
    }

    fn put(&mut self, format: &str, action: impl Into<Action>) -> RouteMut<'_> {
        self.route(format, action, MethodConstraint::Only(Method::PUT))
    }

    fn delete(&mut self, format: &str, action: impl Into<Action>) -> RouteMut<'_> {
        self.route(format, action, MethodConstraint::Only(Method::DELETE))
    }

    fn connect(&mut self, format: &str, action: impl Into<Action>) -> RouteMut<'_> {
        self.route(format, action, MethodConstraint::Only(Method::CONNECT))
    }

    fn options(&mut self, format: &str, action: impl Into<Action>) -> RouteMut<'_> {
        self.route(format, action, MethodConstraint::Only(Method::OPTIONS))
    }

    fn trace(&mut self, format: &str, action: impl Into<Action>) -> RouteMut<'_> {
        self.route(format, action, MethodConstraint::Only(Method::TRACE))
    }

    fn patch(&mut self, format: &str, action: impl Into<Action>) -> RouteMut<'_> {
        self.route(format, action, MethodConstraint::Only(Method::PATCH))
    }

    /// Named route that only serves reverse routing
    fn hidden(&mut self, format: &str, name: &str) -> RouteMut<'_> {
        let mut route = self.route(format, Action::None, MethodConstraint::Hidden);
        route.name(name);
        route
    }

    /// Nested scope; `configure` runs immediately with the new group
    fn group<F>(&mut self, format: &str, configure: F) -> RouteMut<'_>
    where
        F: FnOnce(&mut RouteMut<'_>),
    {
        let mut group = self.route(format, Action::None, MethodConstraint::Group);
        configure(&mut group);
        group
    }

    /// Register an inbound binder; replaces an earlier one for `name` here
    fn bind_in<F>(&mut self, name: &str, binder: F) -> &mut Self
    where
        F: Fn(&mut InboundPass<'_>) -> anyhow::Result<serde_json::Value> + Send + Sync + 'static,
        Self: Sized,
    {
        let id = self.scope_id();
        let binder: BindInFn = Arc::new(binder);
        self.tree_mut().nodes[id.0]
            .binders
            .inbound
            .insert(name.to_string(), binder);
        self
    }

    /// Register an outbound binder; replaces an earlier one for `name` here
    fn bind_out(&mut self, name: &str, binder: impl Into<BindOut>) -> &mut Self
    where
        Self: Sized,
    {
        let id = self.scope_id();
        self.tree_mut().nodes[id.0]
            .binders
            .outbound
            .insert(name.to_string(), binder.into());
        self
    }

    fn set_error_action(&mut self, action: impl Into<Action>) -> &mut Self
    where
        Self: Sized,
    {
        let id = self.scope_id();
        self.tree_mut().nodes[id.0].error_action = Some(action.into());
        self
    }

    /// Resolver for identifier actions in this scope and below
    fn set_dispatcher<F>(&mut self, resolver: F) -> &mut Self
    where
        F: Fn(&str) -> Option<Handler> + Send + Sync + 'static,
        Self: Sized,
    {
        self.set_resolver(Arc::new(resolver))
    }

    /// Like [`set_dispatcher`](Self::set_dispatcher), for a shared resolver
    fn set_resolver(&mut self, resolver: Resolver) -> &mut Self
    where
        Self: Sized,
    {
        let id = self.scope_id();
        self.tree_mut().nodes[id.0].dispatcher = Some(resolver);
        self
    }

    fn set_host(&mut self, host: &str) -> &mut Self
    where
        Self: Sized,
    {
        let id = self.scope_id();
        self.tree_mut().nodes[id.0].host = Some(host.to_string());
        self
    }
}

impl RouteScope for RouteTree {
    fn tree_mut(&mut self) -> &mut RouteTree {
        self
    }

    fn scope_id(&self) -> NodeId {
        NodeId::ROOT
    }
}

/// Mutable handle on one node, returned by every registration call
pub struct RouteMut<'t> {
    tree: &'t mut RouteTree,
    id: NodeId,
}

impl RouteMut<'_> {
    #[must_use]
    pub fn id(&self) -> NodeId {
        self.id
    }

    pub fn name(&mut self, name: &str) -> &mut Self {
        self.tree.nodes[self.id.0].name = Some(name.to_string());
        self
    }

    /// Require the pattern to match to the end of the path (default), or
    /// allow a prefix match. Groups ignore this and stay non-strict.
    pub fn strict(&mut self, strict: bool) -> &mut Self {
        self.tree.nodes[self.id.0].set_strict(strict);
        self
    }

    #[must_use]
    pub fn node(&self) -> &RouteNode {
        self.tree.node(self.id)
    }
}

impl RouteScope for RouteMut<'_> {
    fn tree_mut(&mut self) -> &mut RouteTree {
        self.tree
    }

    fn scope_id(&self) -> NodeId {
        self.id
    }
}
