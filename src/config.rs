//! Declarative route tables
//!
//! A route table describes a tree in YAML, TOML or JSON and is built into a
//! [`RouteTree`]. Actions are identifiers, resolved at dispatch time by the
//! resolver passed to [`RouteTableConfig::build`].
//!
//! ```yaml
//! host: example.com
//! error_action: errors::handle
//! bind_out:
//!   locale: en
//! routes:
//!   - path: /api
//!     routes:
//!       - method: GET
//!         path: /users/{id:\d+}
//!         action: users::show
//!         name: user.show
//!   - method: hidden
//!     path: /assets/{file}
//!     name: asset
//! ```
//!
//! `method` is an HTTP method, `any`, `hidden` or `group`. Without one, an
//! entry with nested `routes` is a group and anything else matches every
//! method.

use http::Method;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::path::Path;
use tracing::{debug, info};

use crate::binder::value_to_segment;
use crate::dispatcher::{Action, Resolver};
use crate::error::{Result, RoutingError};
use crate::router::{MethodConstraint, RouteScope, RouteTree};

/// Top-level route table, configuring the root scope
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct RouteTableConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub host: Option<String>,
    /// Identifier of the root error action
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_action: Option<String>,
    /// Fixed outbound values for every route
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub bind_out: BTreeMap<String, Value>,
    #[serde(default)]
    pub routes: Vec<RouteConfig>,
}

/// One route or group entry
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct RouteConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub method: Option<String>,
    pub path: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub strict: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub host: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_action: Option<String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub bind_out: BTreeMap<String, Value>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub routes: Vec<RouteConfig>,
}

fn config_error(message: impl Into<String>) -> RoutingError {
    RoutingError::Config {
        message: message.into(),
    }
}

impl RouteTableConfig {
    /// Load a route table, picking the format from the file extension
    ///
    /// `.yaml`/`.yml`, `.toml` and `.json` are recognised.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|e| config_error(format!("failed to read {}: {e}", path.display())))?;

        let extension = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(str::to_ascii_lowercase)
            .unwrap_or_default();

        let config = match extension.as_str() {
            "yaml" | "yml" => Self::from_yaml_str(&content),
            "toml" => Self::from_toml_str(&content),
            "json" => Self::from_json_str(&content),
            other => Err(config_error(format!(
                "unsupported route table format `{other}` for {}",
                path.display()
            ))),
        }?;

        info!(
            path = %path.display(),
            routes = config.routes.len(),
            "Route table loaded"
        );
        Ok(config)
    }

    pub fn from_yaml_str(content: &str) -> Result<Self> {
        serde_yaml::from_str(content).map_err(|e| config_error(format!("invalid YAML: {e}")))
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| config_error(format!("invalid TOML: {e}")))
    }

    pub fn from_json_str(content: &str) -> Result<Self> {
        serde_json::from_str(content).map_err(|e| config_error(format!("invalid JSON: {e}")))
    }

    /// Build the tree, with `resolver` as the root dispatcher
    ///
    /// Every pattern is compiled here, so a table with a malformed route fails
    /// to build instead of failing on the first request.
    pub fn build(&self, resolver: Option<Resolver>) -> Result<RouteTree> {
        let mut tree = RouteTree::new();
        if let Some(resolver) = resolver {
            tree.set_resolver(resolver);
        }
        apply_scope(
            &mut tree,
            self.host.as_deref(),
            self.error_action.as_deref(),
            &self.bind_out,
        );
        add_routes(&mut tree, &self.routes)?;

        for route in tree.routes() {
            tree.node(route.id).pattern()?;
        }
        debug!(nodes = tree.len(), "Route tree built from table");
        Ok(tree)
    }
}

impl RouteConfig {
    /// The constraint this entry registers with
    pub fn method_constraint(&self) -> Result<MethodConstraint> {
        let Some(method) = self.method.as_deref() else {
            return Ok(if self.routes.is_empty() {
                MethodConstraint::Any
            } else {
                MethodConstraint::Group
            });
        };

        match method.to_ascii_lowercase().as_str() {
            "any" => Ok(MethodConstraint::Any),
            "group" => Ok(MethodConstraint::Group),
            "hidden" => Ok(MethodConstraint::Hidden),
            _ => Method::from_bytes(method.to_ascii_uppercase().as_bytes())
                .map(MethodConstraint::Only)
                .map_err(|_| {
                    config_error(format!("invalid method `{method}` for `{}`", self.path))
                }),
        }
    }
}

fn add_routes<S: RouteScope>(scope: &mut S, routes: &[RouteConfig]) -> Result<()> {
    for entry in routes {
        let method = entry.method_constraint()?;
        let action = match (&entry.action, &method) {
            (Some(action), MethodConstraint::Group | MethodConstraint::Hidden) => {
                return Err(config_error(format!(
                    "`{}` is a {method} entry and cannot have action `{action}`",
                    entry.path
                )));
            }
            (Some(action), _) => Action::from(action.as_str()),
            (None, _) => Action::None,
        };
        if method == MethodConstraint::Hidden && entry.name.is_none() {
            return Err(config_error(format!(
                "hidden route `{}` needs a name",
                entry.path
            )));
        }

        let mut node = scope.route(&entry.path, action, method);
        if let Some(name) = &entry.name {
            node.name(name);
        }
        if let Some(strict) = entry.strict {
            node.strict(strict);
        }
        apply_scope(
            &mut node,
            entry.host.as_deref(),
            entry.error_action.as_deref(),
            &entry.bind_out,
        );
        add_routes(&mut node, &entry.routes)?;
    }
    Ok(())
}

fn apply_scope<S: RouteScope>(
    scope: &mut S,
    host: Option<&str>,
    error_action: Option<&str>,
    bind_out: &BTreeMap<String, Value>,
) {
    if let Some(host) = host {
        scope.set_host(host);
    }
    if let Some(error_action) = error_action {
        scope.set_error_action(error_action);
    }
    for (name, value) in bind_out {
        scope.bind_out(name, value_to_segment(value));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const TABLE_YAML: &str = r#"
host: example.com
bind_out:
  locale: en
routes:
  - path: /api
    error_action: errors::api
    routes:
      - method: GET
        path: /users/{id:\d+}
        action: users::show
        name: user.show
      - method: post
        path: /users
        action: users::create
  - method: hidden
    path: /{locale}/assets/{file}
    name: asset
  - path: /docs
    action: docs::index
    strict: false
"#;

    #[test]
    fn test_yaml_table_builds_tree() {
        let config = RouteTableConfig::from_yaml_str(TABLE_YAML).unwrap();
        let tree = config.build(None).unwrap();

        let routes = tree.routes();
        assert_eq!(routes.len(), 5);
        assert_eq!(routes[0].method, "GROUP");
        assert_eq!(routes[1].pattern, r"/api/users/{id:\d+}");
        assert_eq!(routes[2].method, "POST");
        assert_eq!(routes[3].method, "HIDDEN");
        assert_eq!(routes[4].method, "ANY");

        assert!(tree.find_path("/api/users/42").unwrap().is_some());
        assert!(tree.find_path("/docs/intro").unwrap().is_some());
        assert!(tree.has_route("asset"));
        assert!(tree.error_action(tree.get_route("user.show").unwrap()).is_some());
    }

    #[test]
    fn test_static_bind_out_from_table() {
        let config = RouteTableConfig::from_yaml_str(TABLE_YAML).unwrap();
        let tree = config.build(None).unwrap();

        let params = [("file", serde_json::json!("app.js"))].into_iter().collect();
        assert_eq!(
            tree.fetch_route("asset", &params, true).unwrap(),
            "http://example.com/en/assets/app.js"
        );
    }

    #[test]
    fn test_toml_and_json_tables() {
        let toml = r#"
[[routes]]
method = "GET"
path = "/health"
action = "health"
name = "health"
"#;
        let tree = RouteTableConfig::from_toml_str(toml)
            .unwrap()
            .build(None)
            .unwrap();
        assert!(tree.has_route("health"));

        let json = r#"{"routes": [{"path": "/ping", "action": "ping"}]}"#;
        let tree = RouteTableConfig::from_json_str(json)
            .unwrap()
            .build(None)
            .unwrap();
        assert!(tree.find_path("/ping").unwrap().is_some());
    }

    #[test]
    fn test_load_by_extension() {
        let mut file = tempfile::Builder::new()
            .suffix(".yml")
            .tempfile()
            .unwrap();
        file.write_all(TABLE_YAML.as_bytes()).unwrap();

        let config = RouteTableConfig::load(file.path()).unwrap();
        assert_eq!(config.host.as_deref(), Some("example.com"));
        assert_eq!(config.routes.len(), 3);
    }

    #[test]
    fn test_load_unknown_extension() {
        let file = tempfile::Builder::new()
            .suffix(".ini")
            .tempfile()
            .unwrap();
        assert!(matches!(
            RouteTableConfig::load(file.path()),
            Err(RoutingError::Config { .. })
        ));
    }

    #[test]
    fn test_invalid_method() {
        let yaml = "routes:\n  - method: FETCH ME\n    path: /x\n";
        let config = RouteTableConfig::from_yaml_str(yaml).unwrap();
        assert!(matches!(
            config.build(None),
            Err(RoutingError::Config { .. })
        ));
    }

    #[test]
    fn test_group_with_action_rejected() {
        let yaml = "routes:\n  - method: group\n    path: /x\n    action: nope\n";
        let config = RouteTableConfig::from_yaml_str(yaml).unwrap();
        assert!(matches!(
            config.build(None),
            Err(RoutingError::Config { .. })
        ));
    }

    #[test]
    fn test_hidden_needs_name() {
        let yaml = "routes:\n  - method: hidden\n    path: /x\n";
        let config = RouteTableConfig::from_yaml_str(yaml).unwrap();
        assert!(matches!(
            config.build(None),
            Err(RoutingError::Config { .. })
        ));
    }

    #[test]
    fn test_malformed_pattern_fails_build() {
        let yaml = "routes:\n  - path: /users/{id\n    action: users::show\n";
        let config = RouteTableConfig::from_yaml_str(yaml).unwrap();
        assert!(matches!(
            config.build(None),
            Err(RoutingError::UnbalancedBraces { .. })
        ));
    }
}
