use crate::dispatcher::{Call, Handler, Resolver};
use serde_json::{json, Value};
use std::sync::Arc;

// Example handler: echoes back the call it received
pub fn echo_handler(action: &str, call: &Call<'_>) -> Value {
    let route = call.route();
    json!({
        "action": action,
        "path": route.path(),
        "params": route.params(),
        "raw_params": route.raw_params(),
        "query_params": route.query_params(),
        "args": call.args(),
        "failure": call.failure().map(|e| format!("{e:#}")),
    })
}

/// Resolver that turns every identifier into an [`echo_handler`]
#[must_use]
pub fn echo_resolver() -> Resolver {
    Arc::new(|identifier: &str| {
        let action = identifier.to_string();
        let handler: Handler = Arc::new(move |call: &Call<'_>| -> anyhow::Result<Value> {
            Ok(echo_handler(&action, call))
        });
        Some(handler)
    })
}
