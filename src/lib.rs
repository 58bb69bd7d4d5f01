//! # nestroute
//!
//! **nestroute** is a nested, regex-based path router with inheritable scopes,
//! parameter binders and reverse routing.
//!
//! ## Overview
//!
//! Routes are declared as a tree. A group contributes a path prefix and
//! configuration (host, error action, dispatcher, binders) that every route
//! beneath it inherits unless it overrides them. Matching walks the tree in
//! declaration order and returns the first route whose full pattern matches.
//! Reverse routing turns a named route and its parameters back into a path.
//!
//! ## Architecture
//!
//! The library is organized into several key modules:
//!
//! - **[`router`]** - Pattern compilation, the route tree, matching and reverse routing
//! - **[`binder`]** - Inbound and outbound parameter binders, memoized per pass
//! - **[`dispatcher`]** - Action execution with inherited error-action fallback
//! - **[`config`]** - Declarative route tables loaded from YAML, TOML or JSON
//! - **[`logging`]** - `tracing` subscriber setup driven by environment variables
//! - **[`cli`]** - The `nestroute` command line tool
//! - **[`error`]** - The crate error type
//!
//! ## Quick Start
//!
//! ```rust
//! use nestroute::{Action, Params, RouteScope, RouteTree};
//! use serde_json::json;
//!
//! let mut tree = RouteTree::new();
//! tree.group("/api", |api| {
//!     api.get(r"/users/{id:\d+}", Action::handler(|call| {
//!         Ok(json!({ "user": call.arg(0) }))
//!     }))
//!     .name("user.show");
//!     api.bind_in("id", |pass| {
//!         let raw = pass.raw("id").unwrap_or_default();
//!         Ok(json!(raw.parse::<u64>()?))
//!     });
//! });
//!
//! assert_eq!(tree.dispatch_path("/api/users/42").unwrap(), json!({ "user": 42 }));
//!
//! let params: Params<serde_json::Value> = [("id", json!(7))].into_iter().collect();
//! assert_eq!(tree.fetch_route("user.show", &params, false).unwrap(), "/api/users/7");
//! ```
//!
//! ## Concurrency
//!
//! A tree is built once and then read. Matching, dispatch and reverse routing
//! take `&self` and keep their binder memo per call, so a finished tree can be
//! shared across threads behind an `Arc`.

pub mod binder;
pub mod cli;
pub mod config;
pub mod dispatcher;
pub mod echo;
pub mod error;
pub mod logging;
pub mod router;

pub use binder::{BindInFn, BindOut, BindOutFn, InboundPass, OutboundPass};
pub use config::{RouteConfig, RouteTableConfig};
pub use dispatcher::{Action, Call, Handler, Resolver};
pub use error::{Result, RoutingError};
pub use router::{
    BoundParams, CompiledPattern, MethodConstraint, NodeId, Params, RawParams, RouteData,
    RouteMut, RouteScope, RouteSummary, RouteTree,
};
