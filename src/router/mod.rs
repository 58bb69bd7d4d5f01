//! # Router Module
//!
//! The router module provides the route tree: registration of nested routes,
//! path matching and reverse routing.
//!
//! ## Overview
//!
//! The router is responsible for:
//! - Compiling route formats (`/users/{id:\d+}`) into anchored regexes
//! - Holding routes in a tree of scopes (groups) that share a path prefix
//! - Matching a path against the tree in declaration order
//! - Building paths back from a named route and its parameters
//!
//! ## Architecture
//!
//! Nodes live in an arena owned by [`RouteTree`]. Each node stores its own
//! format and the concatenation of its ancestors' formats; matching always
//! uses the full pattern, so a child of `/api` declared as `/users` matches
//! `/api/users`. Host, error action, dispatcher and binders are inherited by
//! walking the parent chain at use time.
//!
//! Patterns compile lazily on first use and are cached on the node.
//!
//! ## Example
//!
//! ```rust
//! use nestroute::{Params, RouteScope, RouteTree};
//!
//! let mut tree = RouteTree::new();
//! tree.get(r"/users/{id:\d+}", "users::show").name("user.show");
//! tree.group("/api", |api| {
//!     api.get("/status", "api::status");
//! });
//!
//! let data = tree.find_path("/users/42").unwrap().unwrap();
//! assert_eq!(data.raw_param("id"), Some("42"));
//! assert!(tree.find_path("/users/abc").unwrap().is_none());
//! assert!(tree.find_path("/api/status").unwrap().is_some());
//!
//! let params: Params<serde_json::Value> = [("id", serde_json::json!(42))].into_iter().collect();
//! assert_eq!(tree.fetch_route("user.show", &params, false).unwrap(), "/users/42");
//! ```

mod core;
mod node;
mod params;
pub mod pattern;
mod reverse;
#[cfg(test)]
mod tests;

pub use core::{Ancestors, RouteMut, RouteScope, RouteSummary, RouteTree};
pub use node::{MethodConstraint, NodeId, RouteNode};
pub use params::{BoundParams, Params, RawParams, RouteData, MAX_INLINE_PARAMS};
pub use pattern::{CompiledPattern, ParamSpec, DEFAULT_CONSTRAINT};
