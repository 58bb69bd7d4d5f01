use crate::config::RouteTableConfig;
use crate::echo::echo_resolver;
use crate::router::{Params, RouteTree};
use anyhow::{anyhow, Context};
use clap::{Parser, Subcommand};
use http::Method;
use serde_json::{json, Value};
use std::io::Write;
use std::path::{Path, PathBuf};

/// Command-line interface for nestroute
///
/// Loads a route table and matches, dispatches or reverse-routes against it.
#[derive(Parser)]
#[command(name = "nestroute")]
#[command(about = "Nested route table inspector", long_about = None)]
#[command(version)]
pub struct Cli {
    /// The subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands
#[derive(Subcommand)]
pub enum Commands {
    /// List every route of a table in declaration order
    Routes {
        /// Route table file (YAML, TOML or JSON)
        #[arg(short, long, env = "NESTROUTE_TABLE")]
        table: PathBuf,

        /// Print the listing as JSON
        #[arg(long, default_value_t = false)]
        json: bool,
    },
    /// Resolve a path and print the matched route data
    Match {
        /// Route table file (YAML, TOML or JSON)
        #[arg(short, long, env = "NESTROUTE_TABLE")]
        table: PathBuf,

        /// Request path, e.g. /users/42
        path: String,

        /// Only consider routes accepting this HTTP method
        #[arg(short, long)]
        method: Option<String>,
    },
    /// Resolve a path and execute it with echo handlers
    Dispatch {
        /// Route table file (YAML, TOML or JSON)
        #[arg(short, long, env = "NESTROUTE_TABLE")]
        table: PathBuf,

        /// Request path, e.g. /users/42
        path: String,

        /// Only consider routes accepting this HTTP method
        #[arg(short, long)]
        method: Option<String>,
    },
    /// Build the path of a named route
    Fetch {
        /// Route table file (YAML, TOML or JSON)
        #[arg(short, long, env = "NESTROUTE_TABLE")]
        table: PathBuf,

        /// Route name
        name: String,

        /// Parameters as key=value pairs
        params: Vec<String>,

        /// Prefix the path with the route's host
        #[arg(long, default_value_t = false)]
        full: bool,
    },
}

/// Parse the command line and execute it, writing results to stdout
///
/// # Errors
///
/// Returns an error if:
/// - The route table cannot be loaded or built
/// - No route matches the given path
/// - The named route does not exist or a parameter is missing
pub fn run_cli() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let stdout = std::io::stdout();
    execute(&cli, &mut stdout.lock())
}

/// Execute a parsed command, writing results to `out`
pub fn execute(cli: &Cli, out: &mut impl Write) -> anyhow::Result<()> {
    match &cli.command {
        Commands::Routes { table, json } => {
            let tree = load_tree(table)?;
            let routes = tree.routes();
            if *json {
                writeln!(out, "{}", serde_json::to_string_pretty(&routes)?)?;
            } else {
                for route in &routes {
                    let indent = "  ".repeat(route.depth);
                    let name = route.name.as_deref().unwrap_or("-");
                    writeln!(out, "{indent}{:<7} {}  {name}", route.method, route.pattern)?;
                }
            }
            Ok(())
        }
        Commands::Match {
            table,
            path,
            method,
        } => {
            let tree = load_tree(table)?;
            let data = match parse_method(method.as_deref())? {
                Some(method) => tree.find_path_for(&method, path)?,
                None => tree.find_path(path)?,
            }
            .ok_or_else(|| anyhow!("No route matched `{path}`"))?;

            let node = tree.node(data.route());
            let report = json!({
                "route": node.full_format(),
                "name": node.name(),
                "method": node.method().to_string(),
                "path": data.path(),
                "params": data.params(),
                "raw_params": data.raw_params(),
                "query_params": data.query_params(),
            });
            writeln!(out, "{}", serde_json::to_string_pretty(&report)?)?;
            Ok(())
        }
        Commands::Dispatch {
            table,
            path,
            method,
        } => {
            let tree = load_tree(table)?;
            let value = match parse_method(method.as_deref())? {
                Some(method) => tree.dispatch_request(&method, path)?,
                None => tree.dispatch_path(path)?,
            };
            writeln!(out, "{}", serde_json::to_string_pretty(&value)?)?;
            Ok(())
        }
        Commands::Fetch {
            table,
            name,
            params,
            full,
        } => {
            let tree = load_tree(table)?;
            let params = parse_params(params)?;
            let path = tree.fetch_route(name, &params, *full)?;
            writeln!(out, "{path}")?;
            Ok(())
        }
    }
}

fn load_tree(table: &Path) -> anyhow::Result<RouteTree> {
    let config = RouteTableConfig::load(table)
        .with_context(|| format!("Failed to load route table {}", table.display()))?;
    Ok(config.build(Some(echo_resolver()))?)
}

fn parse_method(method: Option<&str>) -> anyhow::Result<Option<Method>> {
    method
        .map(|m| {
            Method::from_bytes(m.to_ascii_uppercase().as_bytes())
                .map_err(|_| anyhow!("Invalid HTTP method `{m}`"))
        })
        .transpose()
}

/// Parse `key=value` pairs, keeping their order
pub(crate) fn parse_params(pairs: &[String]) -> anyhow::Result<Params<Value>> {
    pairs
        .iter()
        .map(|pair| {
            pair.split_once('=')
                .map(|(key, value)| (key.to_string(), Value::String(value.to_string())))
                .ok_or_else(|| anyhow!("Expected key=value, got `{pair}`"))
        })
        .collect()
}
