//! # Dispatcher Module
//!
//! The dispatcher executes the action of a matched route.
//!
//! ## Overview
//!
//! An action is either a handler closure, invoked directly, or an identifier
//! string resolved at execution time through the nearest dispatcher
//! ([`Resolver`]) registered on the route or one of its ancestors.
//!
//! Handlers receive a [`Call`]: the matched [`RouteData`](crate::router::RouteData)
//! plus positional arguments (bound parameters in declaration order, then any
//! extra arguments).
//!
//! ## Error Handling
//!
//! Every failure raised while resolving or running an action, including a
//! panic inside a handler, is caught and handed to the nearest error action
//! up the parent chain, invoked with the original route data and the failure.
//! Without an error action the failure propagates to the caller unchanged.
//!
//! ```rust
//! use nestroute::{Action, RouteScope, RouteTree};
//! use serde_json::json;
//!
//! let mut tree = RouteTree::new();
//! tree.set_error_action(Action::handler(|call| {
//!     Ok(json!({ "error": call.failure().map(|e| e.to_string()) }))
//! }));
//! tree.get("/boom", Action::handler(|_| anyhow::bail!("boom")));
//!
//! let value = tree.dispatch_path("/boom").unwrap();
//! assert_eq!(value, json!({ "error": "boom" }));
//! ```

mod core;

pub use core::{Action, Call, Handler, Resolver};
