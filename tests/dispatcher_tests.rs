//! Tests for action execution and error-action fallback
//!
//! # Test Coverage
//!
//! - Handler actions receive bound params positionally, then extra args
//! - Identifier actions resolve through the nearest dispatcher
//! - Failures (errors, panics, unresolvable actions) go to the nearest error action
//! - Without an error action the failure reaches the caller unchanged

use nestroute::{Action, Call, Handler, RouteScope, RouteTree, RoutingError};
use serde_json::{json, Value};
use std::sync::Arc;

fn echo_args(call: &Call<'_>) -> anyhow::Result<Value> {
    Ok(Value::Array(call.args().to_vec()))
}

fn report_failure(call: &Call<'_>) -> anyhow::Result<Value> {
    Ok(json!({
        "path": call.route().path(),
        "failure": call.failure().map(|e| e.to_string()),
        "args": call.args(),
    }))
}

#[test]
fn test_handler_receives_positional_params() {
    let mut tree = RouteTree::new();
    tree.get("/users/{id}/posts/{slug}", Action::handler(echo_args));

    let value = tree.dispatch_path("/users/3/posts/intro").unwrap();
    assert_eq!(value, json!(["3", "intro"]));
}

#[test]
fn test_exec_action_appends_extra_args() {
    let mut tree = RouteTree::new();
    tree.get("/users/{id}", "users::show");

    let data = tree.find_path("/users/3").unwrap().unwrap();
    let action = Action::handler(echo_args);
    let value = tree
        .exec_action(data.route(), &action, &data, &[json!("extra")])
        .unwrap();
    assert_eq!(value, json!(["3", "extra"]));
}

#[test]
fn test_identifier_resolved_by_nearest_dispatcher() {
    let mut tree = RouteTree::new();
    tree.set_dispatcher(|id| {
        let id = id.to_string();
        Some(Arc::new(move |_: &Call<'_>| -> anyhow::Result<Value> {
            Ok(json!(format!("root:{id}")))
        }) as Handler)
    });
    tree.group("/admin", |admin| {
        admin.set_dispatcher(|id| {
            let id = id.to_string();
            Some(Arc::new(move |_: &Call<'_>| -> anyhow::Result<Value> {
                Ok(json!(format!("admin:{id}")))
            }) as Handler)
        });
        admin.get("/users", "users::index");
    });
    tree.get("/home", "home::index");

    assert_eq!(tree.dispatch_path("/admin/users").unwrap(), json!("admin:users::index"));
    assert_eq!(tree.dispatch_path("/home").unwrap(), json!("root:home::index"));
}

#[test]
fn test_unresolvable_identifier_is_not_callable() {
    let mut tree = RouteTree::new();
    tree.get("/a", "missing::action");
    tree.group("/b", |b| {
        b.set_dispatcher(|_| None);
        b.get("/c", "also::missing");
    });

    let err = tree.dispatch_path("/a").unwrap_err();
    assert!(matches!(
        err.downcast_ref::<RoutingError>(),
        Some(RoutingError::NotCallable { action }) if action == "missing::action"
    ));
    assert_eq!(err.to_string(), "Route action `missing::action` is not callable.");

    let err = tree.dispatch_path("/b/c").unwrap_err();
    assert!(matches!(
        err.downcast_ref::<RoutingError>(),
        Some(RoutingError::NotCallable { .. })
    ));
}

#[test]
fn test_route_without_action_is_undefined() {
    let mut tree = RouteTree::new();
    tree.route("/scope", Action::None, nestroute::MethodConstraint::Any);

    let err = tree.dispatch_path("/scope").unwrap_err();
    assert!(matches!(
        err.downcast_ref::<RoutingError>(),
        Some(RoutingError::UndefinedAction { .. })
    ));
}

#[test]
fn test_error_action_receives_failure() {
    let mut tree = RouteTree::new();
    tree.set_error_action(Action::handler(report_failure));
    tree.get("/boom/{id}", Action::handler(|_| anyhow::bail!("boom")));

    let value = tree.dispatch_path("/boom/9").unwrap();
    assert_eq!(
        value,
        json!({ "path": "/boom/9", "failure": "boom", "args": ["9"] })
    );
}

#[test]
fn test_error_action_catches_panics() {
    let mut tree = RouteTree::new();
    tree.set_error_action(Action::handler(report_failure));
    tree.get("/panic", Action::handler(|_| panic!("handler exploded")));

    let value = tree.dispatch_path("/panic").unwrap();
    let failure = value["failure"].as_str().unwrap();
    assert!(failure.contains("handler exploded"), "{failure}");
}

#[test]
fn test_error_action_catches_not_callable() {
    let mut tree = RouteTree::new();
    tree.set_error_action(Action::handler(report_failure));
    tree.get("/ghost", "ghost::action");

    let value = tree.dispatch_path("/ghost").unwrap();
    assert_eq!(value["failure"], "Route action `ghost::action` is not callable.");
}

#[test]
fn test_nearest_error_action_wins() {
    let mut tree = RouteTree::new();
    tree.set_error_action(Action::handler(|_| Ok(json!("root"))));
    tree.group("/api", |api| {
        api.set_error_action(Action::handler(|_| Ok(json!("api"))));
        api.get("/fail", Action::handler(|_| anyhow::bail!("nope")));
    });
    tree.get("/fail", Action::handler(|_| anyhow::bail!("nope")));

    assert_eq!(tree.dispatch_path("/api/fail").unwrap(), json!("api"));
    assert_eq!(tree.dispatch_path("/fail").unwrap(), json!("root"));
}

#[test]
fn test_identifier_error_action_uses_dispatcher() {
    let mut tree = RouteTree::new();
    tree.set_dispatcher(|id| match id {
        "errors::handle" => Some(Arc::new(report_failure) as Handler),
        _ => None,
    });
    tree.set_error_action("errors::handle");
    tree.get("/x", Action::handler(|_| anyhow::bail!("x failed")));

    let value = tree.dispatch_path("/x").unwrap();
    assert_eq!(value["failure"], "x failed");
}

#[test]
fn test_failure_propagates_without_error_action() {
    let mut tree = RouteTree::new();
    tree.get("/fail", Action::handler(|_| anyhow::bail!("unhandled")));

    let err = tree.dispatch_path("/fail").unwrap_err();
    assert_eq!(err.to_string(), "unhandled");
}

#[test]
fn test_failing_error_action_returns_its_error() {
    let mut tree = RouteTree::new();
    tree.set_error_action(Action::handler(|_| anyhow::bail!("error action failed")));
    tree.get("/fail", Action::handler(|_| anyhow::bail!("first")));

    let err = tree.dispatch_path("/fail").unwrap_err();
    assert_eq!(err.to_string(), "error action failed");
}

#[test]
fn test_dispatch_without_match() {
    let tree = RouteTree::new();
    let err = tree.dispatch_path("/nowhere").unwrap_err();
    assert!(matches!(
        err.downcast_ref::<RoutingError>(),
        Some(RoutingError::NoMatch { path }) if path == "/nowhere"
    ));
}

#[test]
fn test_dispatch_request_filters_method() {
    let mut tree = RouteTree::new();
    tree.get("/items", Action::handler(|_| Ok(json!("list"))));
    tree.post("/items", Action::handler(|_| Ok(json!("create"))));

    assert_eq!(
        tree.dispatch_request(&http::Method::POST, "/items").unwrap(),
        json!("create")
    );
    assert!(tree
        .dispatch_request(&http::Method::DELETE, "/items")
        .is_err());
}

#[test]
fn test_exec_with_bound_params() {
    let mut tree = RouteTree::new();
    tree.get(r"/users/{id:\d+}", Action::handler(|call| {
        let id = call.param("id").and_then(Value::as_u64).unwrap_or_default();
        Ok(json!({ "id": id, "double": id * 2 }))
    }))
    .bind_in("id", |pass| Ok(json!(pass.raw("id").unwrap_or("0").parse::<u64>()?)));

    let data = tree.find_path("/users/21").unwrap().unwrap();
    assert_eq!(tree.exec(&data).unwrap(), json!({ "id": 21, "double": 42 }));
}

#[test]
fn test_grandchild_inherits_from_root_through_empty_scope() {
    let mut tree = RouteTree::new();
    tree.set_host("example.com");
    tree.set_error_action("errors::handle");
    tree.set_dispatcher(|id| match id {
        "errors::handle" => Some(Arc::new(report_failure) as Handler),
        "pages::show" => Some(Arc::new(echo_args) as Handler),
        _ => None,
    });
    let mut ok = None;
    let mut failing = None;
    tree.group("/a", |a| {
        a.group("/b", |b| {
            ok = Some(b.get("/pages/{page}", "pages::show").name("page").id());
            failing = Some(b.get("/fail", Action::handler(|_| anyhow::bail!("deep failure"))).id());
        });
    });
    let (ok, failing) = (ok.unwrap(), failing.unwrap());
    let middle = tree.node(ok).parent().and_then(|b| tree.node(b).parent()).unwrap();

    // The middle scope sets nothing of its own
    assert_eq!(tree.node(middle).full_format(), "/a");
    assert!(tree.node(middle).parent() == Some(tree.root()));

    assert_eq!(tree.host(ok), Some("example.com"));
    assert!(tree.dispatcher(failing).is_some());
    assert!(matches!(
        tree.error_action(failing),
        Some(Action::Identifier(id)) if id == "errors::handle"
    ));

    assert_eq!(tree.dispatch_path("/a/b/pages/intro").unwrap(), json!(["intro"]));
    let value = tree.dispatch_path("/a/b/fail").unwrap();
    assert_eq!(value["failure"], "deep failure");
    assert_eq!(value["path"], "/a/b/fail");

    let params = [("page", json!("intro"))].into_iter().collect();
    assert_eq!(
        tree.fetch_route("page", &params, true).unwrap(),
        "http://example.com/a/b/pages/intro"
    );
}

#[test]
fn test_exec_rejects_route_data_from_another_tree() {
    let mut tree = RouteTree::new();
    tree.get("/x", Action::handler(|_| Ok(json!("x"))));
    let data = tree.find_path("/x").unwrap().unwrap();

    let mut other = RouteTree::new();
    other.set_error_action(Action::handler(report_failure));
    let err = other.exec(&data).unwrap_err();
    assert!(matches!(
        err.downcast_ref::<RoutingError>(),
        Some(RoutingError::UnknownNode { .. })
    ));
}

#[test]
fn test_handler_sees_query_params() {
    let mut tree = RouteTree::new();
    tree.get(
        "/search/{scope}",
        Action::handler(|call| {
            let route = call.route();
            Ok(json!({
                "args": call.args(),
                "q": route.query_param("q"),
                "page": route.query_param("page"),
            }))
        }),
    );

    let value = tree.dispatch_path("/search/docs?q=a%20b&page=1&page=3").unwrap();
    assert_eq!(value, json!({ "args": ["docs"], "q": "a b", "page": "3" }));
}
