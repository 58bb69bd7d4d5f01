use serde::ser::{Serialize, SerializeMap, Serializer};
use serde_json::Value;
use smallvec::SmallVec;
use std::sync::Arc;

use super::node::NodeId;

/// Maximum number of path parameters before heap allocation.
/// Most routes have ≤4 placeholders (e.g., /users/{id}/posts/{slug}).
pub const MAX_INLINE_PARAMS: usize = 8;

/// Ordered name → value mapping for route parameters
///
/// Keeps declaration order, which is what positional dispatch relies on.
/// Names are `Arc<str>` because they come from the compiled pattern and are
/// shared by every match; values are per-path data.
#[derive(Debug, Clone, PartialEq)]
pub struct Params<V>(SmallVec<[(Arc<str>, V); MAX_INLINE_PARAMS]>);

/// Unbound strings captured from a path
pub type RawParams = Params<String>;

/// Values after inbound binding
pub type BoundParams = Params<Value>;

impl<V> Default for Params<V> {
    fn default() -> Self {
        Self(SmallVec::new())
    }
}

impl<V> Params<V> {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Get a parameter by name
    #[inline]
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&V> {
        self.0
            .iter()
            .find(|(k, _)| k.as_ref() == name)
            .map(|(_, v)| v)
    }

    #[must_use]
    pub fn contains_key(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Insert a parameter, replacing the value in place if the name exists
    ///
    /// Replacing keeps the original position, so re-binding a name never
    /// changes positional order.
    pub fn insert(&mut self, name: impl Into<Arc<str>>, value: V) {
        let name = name.into();
        match self.0.iter_mut().find(|(k, _)| *k == name) {
            Some(slot) => slot.1 = value,
            None => self.0.push((name, value)),
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &V)> {
        self.0.iter().map(|(k, v)| (k.as_ref(), v))
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(|(k, _)| k.as_ref())
    }

    pub fn values(&self) -> impl Iterator<Item = &V> {
        self.0.iter().map(|(_, v)| v)
    }

    pub(crate) fn push_shared(&mut self, name: &Arc<str>, value: V) {
        self.insert(Arc::clone(name), value);
    }
}

impl<K, V> FromIterator<(K, V)> for Params<V>
where
    K: Into<Arc<str>>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut params = Params::new();
        for (k, v) in iter {
            params.insert(k, v);
        }
        params
    }
}

impl<V: Serialize> Serialize for Params<V> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (k, v) in &self.0 {
            map.serialize_entry(k.as_ref(), v)?;
        }
        map.end()
    }
}

/// Result of successfully matching a path against a route
///
/// Immutable once built; consumed by dispatch. `path` is the input as given,
/// query string included; only the part before `?` is matched.
#[derive(Debug, Clone, serde::Serialize)]
pub struct RouteData {
    #[serde(skip)]
    route: NodeId,
    path: String,
    params: BoundParams,
    raw_params: RawParams,
    query_params: RawParams,
}

impl RouteData {
    #[must_use]
    pub fn new(route: NodeId, path: &str, params: BoundParams, raw_params: RawParams) -> Self {
        Self {
            route,
            path: path.to_string(),
            params,
            raw_params,
            query_params: RawParams::new(),
        }
    }

    /// Attach the decoded query string of the input
    #[must_use]
    pub fn with_query_params(mut self, query_params: RawParams) -> Self {
        self.query_params = query_params;
        self
    }

    /// The node that produced this match
    #[must_use]
    pub fn route(&self) -> NodeId {
        self.route
    }

    #[must_use]
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Bound parameter values in declaration order
    #[must_use]
    pub fn params(&self) -> &BoundParams {
        &self.params
    }

    /// Matched strings before binding
    #[must_use]
    pub fn raw_params(&self) -> &RawParams {
        &self.raw_params
    }

    #[must_use]
    pub fn param(&self, name: &str) -> Option<&Value> {
        self.params.get(name)
    }

    #[must_use]
    pub fn raw_param(&self, name: &str) -> Option<&str> {
        self.raw_params.get(name).map(String::as_str)
    }

    /// Query string parameters, decoded, in input order
    #[must_use]
    pub fn query_params(&self) -> &RawParams {
        &self.query_params
    }

    /// Get a query parameter by name
    ///
    /// A key repeated in the query string keeps its last value.
    #[must_use]
    pub fn query_param(&self, name: &str) -> Option<&str> {
        self.query_params.get(name).map(String::as_str)
    }
}
