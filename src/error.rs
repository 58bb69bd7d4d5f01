use std::fmt;

use crate::router::NodeId;

/// Routing and configuration error
///
/// Raised while compiling patterns, running binders, resolving actions or
/// building paths. Failures raised by user actions are carried as
/// [`anyhow::Error`] instead; a `RoutingError` converts into one so both take
/// the same error-action path during dispatch.
#[derive(Debug)]
pub enum RoutingError {
    /// The pattern compiled to an invalid regular expression
    InvalidPattern {
        /// The route format string
        format: String,
        /// Underlying regex error
        source: regex::Error,
    },
    /// A placeholder name is empty or contains characters outside `[A-Za-z0-9_]`
    InvalidParamName {
        /// The route format string
        format: String,
        /// The offending placeholder name
        name: String,
    },
    /// A `{` without its matching `}` (or the reverse)
    UnbalancedBraces {
        /// The route format string
        format: String,
    },
    /// No route in the tree carries the requested name
    RouteNotFound {
        /// The requested route name
        name: String,
    },
    /// A node id that this tree never handed out
    UnknownNode {
        /// The foreign id
        route: NodeId,
    },
    /// The action could not be turned into a handler
    ///
    /// Either no dispatcher is set anywhere up the chain, or the dispatcher
    /// returned nothing for the identifier.
    NotCallable {
        /// The action identifier that failed to resolve
        action: String,
    },
    /// The route is a pure scope and has no action to execute
    UndefinedAction {
        /// The full pattern of the route
        format: String,
    },
    /// `fetch` could not produce a value for a placeholder
    MissingParam {
        /// The full pattern of the route
        format: String,
        /// The placeholder with no value
        name: String,
    },
    /// A binder returned an error
    Binder {
        /// The parameter name the binder is registered for
        name: String,
        /// The binder's error
        source: anyhow::Error,
    },
    /// A binder requested its own value while it was being computed
    BinderCycle {
        /// The parameter name at which the cycle closed
        name: String,
    },
    /// No route matched the path
    NoMatch {
        /// The requested path
        path: String,
    },
    /// A route table file could not be read or built
    Config {
        /// Description of the problem
        message: String,
    },
}

impl fmt::Display for RoutingError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RoutingError::InvalidPattern { format, source } => {
                write!(f, "Route pattern `{format}` is not a valid expression: {source}")
            }
            RoutingError::InvalidParamName { format, name } => {
                write!(f, "Route pattern `{format}` has an invalid parameter name `{name}`")
            }
            RoutingError::UnbalancedBraces { format } => {
                write!(f, "Route pattern `{format}` has unbalanced braces")
            }
            RoutingError::RouteNotFound { name } => write!(f, "Route `{name}` not found."),
            RoutingError::UnknownNode { route } => {
                write!(f, "Route {route} does not belong to this tree.")
            }
            RoutingError::NotCallable { action } => {
                write!(f, "Route action `{action}` is not callable.")
            }
            RoutingError::UndefinedAction { format } => {
                write!(f, "Route `{format}` has no action.")
            }
            RoutingError::MissingParam { format, name } => {
                write!(f, "Route `{format}` requires parameter `{name}`")
            }
            RoutingError::Binder { name, source } => {
                write!(f, "Binder for `{name}` failed: {source}")
            }
            RoutingError::BinderCycle { name } => {
                write!(f, "Binder for `{name}` depends on itself")
            }
            RoutingError::NoMatch { path } => write!(f, "No route matches `{path}`"),
            RoutingError::Config { message } => write!(f, "Route table error: {message}"),
        }
    }
}

impl std::error::Error for RoutingError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            RoutingError::InvalidPattern { source, .. } => Some(source),
            RoutingError::Binder { source, .. } => Some(&**source),
            _ => None,
        }
    }
}

/// Result alias used throughout the routing core
pub type Result<T, E = RoutingError> = std::result::Result<T, E>;
