//! Dispatcher core module - executes matched routes.

use http::Method;
use serde_json::Value;
use std::fmt;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;
use tracing::debug;

use crate::error::RoutingError;
use crate::router::{NodeId, RouteData, RouteTree};

/// An invocable route action
pub type Handler = Arc<dyn Fn(&Call<'_>) -> anyhow::Result<Value> + Send + Sync>;

/// Turns an action identifier (e.g. `"users::show"`) into a handler
pub type Resolver = Arc<dyn Fn(&str) -> Option<Handler> + Send + Sync>;

/// What a route does when it is executed
#[derive(Clone, Default)]
pub enum Action {
    /// Invoked directly
    Handler(Handler),
    /// Resolved through the inherited dispatcher at execution time
    Identifier(String),
    /// Pure scope
    #[default]
    None,
}

impl Action {
    pub fn handler<F>(f: F) -> Self
    where
        F: Fn(&Call<'_>) -> anyhow::Result<Value> + Send + Sync + 'static,
    {
        Action::Handler(Arc::new(f))
    }

    #[must_use]
    pub fn is_none(&self) -> bool {
        matches!(self, Action::None)
    }
}

impl From<&str> for Action {
    fn from(identifier: &str) -> Self {
        Action::Identifier(identifier.to_string())
    }
}

impl From<String> for Action {
    fn from(identifier: String) -> Self {
        Action::Identifier(identifier)
    }
}

impl From<Handler> for Action {
    fn from(handler: Handler) -> Self {
        Action::Handler(handler)
    }
}

impl fmt::Debug for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Action::Handler(_) => f.write_str("Handler(..)"),
            Action::Identifier(id) => f.debug_tuple("Identifier").field(id).finish(),
            Action::None => f.write_str("None"),
        }
    }
}

/// Arguments an action is invoked with
///
/// Positional arguments are the bound parameters in declaration order followed
/// by any extra arguments. When invoked as an error action, `failure` carries
/// the error that was caught.
pub struct Call<'a> {
    route: &'a RouteData,
    args: Vec<Value>,
    failure: Option<&'a anyhow::Error>,
}

impl<'a> Call<'a> {
    #[must_use]
    pub fn route(&self) -> &'a RouteData {
        self.route
    }

    #[must_use]
    pub fn args(&self) -> &[Value] {
        &self.args
    }

    #[must_use]
    pub fn arg(&self, index: usize) -> Option<&Value> {
        self.args.get(index)
    }

    /// Bound parameter by name
    #[must_use]
    pub fn param(&self, name: &str) -> Option<&Value> {
        self.route.param(name)
    }

    /// The caught failure, for error actions
    #[must_use]
    pub fn failure(&self) -> Option<&'a anyhow::Error> {
        self.failure
    }
}

impl RouteTree {
    /// Nearest error action up the parent chain
    #[must_use]
    pub fn error_action(&self, id: NodeId) -> Option<&Action> {
        self.ancestors(id)
            .find_map(|node| node.error_action.as_ref().filter(|a| !a.is_none()))
    }

    /// Nearest dispatcher up the parent chain
    #[must_use]
    pub fn dispatcher(&self, id: NodeId) -> Option<&Resolver> {
        self.ancestors(id).find_map(|node| node.dispatcher.as_ref())
    }

    /// Execute the route that produced `data`
    ///
    /// Any failure raised while resolving or running the action, panics
    /// included, is handed to the inherited error action. Without one the
    /// failure is returned unchanged. Route data from another tree fails with
    /// `UnknownNode` before anything runs.
    pub fn exec(&self, data: &RouteData) -> anyhow::Result<Value> {
        let id = data.route();
        let node = self.get_node(id)?;
        match self.exec_action(id, &node.action, data, &[]) {
            Ok(value) => Ok(value),
            Err(failure) => {
                debug!(
                    route = %id,
                    path = %data.path(),
                    error = %failure,
                    "Route action failed"
                );
                self.exec_error_action(id, failure, data)
            }
        }
    }

    /// Resolve `action` in the scope of `id` and invoke it
    ///
    /// Arguments: the bound params of `data` in declaration order, then `extra`.
    pub fn exec_action(
        &self,
        id: NodeId,
        action: &Action,
        data: &RouteData,
        extra: &[Value],
    ) -> anyhow::Result<Value> {
        self.invoke(id, action, data, extra, None)
    }

    /// Run the inherited error action with `failure` as the trailing argument
    pub fn exec_error_action(
        &self,
        id: NodeId,
        failure: anyhow::Error,
        data: &RouteData,
    ) -> anyhow::Result<Value> {
        let Some(error_action) = self.error_action(id) else {
            return Err(failure);
        };
        debug!(route = %id, error = %failure, "Dispatching error action");
        self.invoke(id, error_action, data, &[], Some(&failure))
    }

    /// Resolve `path` and execute the matched route
    pub fn dispatch_path(&self, path: &str) -> anyhow::Result<Value> {
        let data = self.find_path(path)?.ok_or_else(|| RoutingError::NoMatch {
            path: path.to_string(),
        })?;
        self.exec(&data)
    }

    /// Resolve `path` for `method` and execute the matched route
    pub fn dispatch_request(&self, method: &Method, path: &str) -> anyhow::Result<Value> {
        let data = self
            .find_path_for(method, path)?
            .ok_or_else(|| RoutingError::NoMatch {
                path: path.to_string(),
            })?;
        self.exec(&data)
    }

    fn resolve_action(&self, id: NodeId, action: &Action) -> Result<Handler, RoutingError> {
        match action {
            Action::Handler(handler) => Ok(Arc::clone(handler)),
            Action::Identifier(identifier) => self
                .dispatcher(id)
                .and_then(|resolve| resolve(identifier.as_str()))
                .ok_or_else(|| RoutingError::NotCallable {
                    action: identifier.clone(),
                }),
            Action::None => Err(RoutingError::UndefinedAction {
                format: self.get_node(id)?.full_format.clone(),
            }),
        }
    }

    fn invoke(
        &self,
        id: NodeId,
        action: &Action,
        data: &RouteData,
        extra: &[Value],
        failure: Option<&anyhow::Error>,
    ) -> anyhow::Result<Value> {
        let handler = self.resolve_action(id, action)?;

        let mut args: Vec<Value> = data.params().values().cloned().collect();
        args.extend_from_slice(extra);
        let call = Call {
            route: data,
            args,
            failure,
        };

        debug!(
            route = %id,
            path = %data.path(),
            action = ?action,
            args = call.args.len(),
            "Action dispatched"
        );

        match catch_unwind(AssertUnwindSafe(|| handler(&call))) {
            Ok(result) => result,
            Err(panic) => {
                let message = panic
                    .downcast_ref::<&str>()
                    .map(|s| (*s).to_string())
                    .or_else(|| panic.downcast_ref::<String>().cloned())
                    .unwrap_or_else(|| "unknown panic".to_string());
                Err(anyhow::anyhow!("Route action panicked: {message}"))
            }
        }
    }
}
