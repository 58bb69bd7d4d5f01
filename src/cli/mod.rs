//! # CLI Module
//!
//! The CLI module provides the `nestroute` command-line tool for inspecting
//! route tables.
//!
//! ## Commands
//!
//! ### `routes`
//!
//! List every route of a table, indented by nesting depth:
//!
//! ```bash
//! nestroute routes --table routes.yaml
//! ```
//!
//! ### `match`
//!
//! Resolve a path and print the matched route, its bound and raw params:
//!
//! ```bash
//! nestroute match --table routes.yaml /api/users/42 --method GET
//! ```
//!
//! ### `dispatch`
//!
//! Resolve a path and execute it. Every action identifier resolves to an echo
//! handler, so the output shows exactly what the action would receive:
//!
//! ```bash
//! nestroute dispatch --table routes.yaml /api/users/42
//! ```
//!
//! ### `fetch`
//!
//! Build the path of a named route:
//!
//! ```bash
//! nestroute fetch --table routes.yaml user.show id=42 --full
//! ```
//!
//! The table may also be given through `NESTROUTE_TABLE`.

mod commands;


pub use commands::{execute, run_cli, Cli, Commands};
