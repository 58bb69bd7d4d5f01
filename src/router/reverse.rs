//! Reverse routing: build a path from a route and its parameters.

use serde_json::Value;
use tracing::debug;

use super::core::RouteTree;
use super::node::NodeId;
use super::params::Params;
use crate::binder::OutboundPass;
use crate::error::{Result, RoutingError};

impl RouteTree {
    /// Build the path of the route named `name`
    ///
    /// See [`fetch`](Self::fetch).
    pub fn fetch_route(&self, name: &str, params: &Params<Value>, full: bool) -> Result<String> {
        let id = self.get_route(name)?;
        self.fetch(id, params, full)
    }

    /// Build the path of route `id` from `params`
    ///
    /// Each placeholder takes the outbound-bound value of its name: a fixed
    /// binder value, a transform's output, or the caller's value rendered as a
    /// segment. Segments are percent-encoded, so a `/` inside a value stays
    /// inside its placeholder. Params that fill no placeholder are appended as a query
    /// string in the caller's order. With `full` set, the inherited host is
    /// prepended (`http://` is assumed when it carries no scheme).
    pub fn fetch(&self, id: NodeId, params: &Params<Value>, full: bool) -> Result<String> {
        let node = self.get_node(id)?;
        let pattern = node.pattern()?;

        let mut pass = OutboundPass::new(self, id, params);
        let bound = pass.bind_all()?;

        let mut path = pattern.render(|name| {
            let segment = match bound.get(name) {
                Some(segment) => segment.clone(),
                None => pass
                    .bound(name)?
                    .ok_or_else(|| RoutingError::MissingParam {
                        format: node.full_format.clone(),
                        name: name.to_string(),
                    })?,
            };
            Ok(urlencoding::encode(&segment).into_owned())
        })?;

        let query: Vec<String> = bound
            .iter()
            .filter(|(name, _)| !pattern.has_param(name))
            .map(|(name, value)| {
                format!(
                    "{}={}",
                    urlencoding::encode(name),
                    urlencoding::encode(value)
                )
            })
            .collect();
        if !query.is_empty() {
            path.push('?');
            path.push_str(&query.join("&"));
        }

        if full {
            if let Some(host) = self.host(id) {
                let host = host.trim_end_matches('/');
                path = if host.contains("://") {
                    format!("{host}{path}")
                } else {
                    format!("http://{host}{path}")
                };
            }
        }

        debug!(route = %id, path = %path, full, "Route path built");
        Ok(path)
    }
}
