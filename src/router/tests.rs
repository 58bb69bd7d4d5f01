use super::{CompiledPattern, MethodConstraint, RouteScope, RouteTree};
use crate::error::RoutingError;
use http::Method;

#[test]
fn test_root_path() {
    let pattern = CompiledPattern::compile("/").unwrap();
    assert!(pattern.captures("/", true).is_some());
    assert!(pattern.captures("/x", true).is_none());
    assert!(pattern.params().is_empty());
}

#[test]
fn test_parameterized_path() {
    let pattern = CompiledPattern::compile("/items/{id}").unwrap();
    let raw = pattern.captures("/items/123", true).unwrap();
    assert_eq!(raw.get("id").map(String::as_str), Some("123"));
    assert_eq!(pattern.param_names().collect::<Vec<_>>(), vec!["id"]);
}

#[test]
fn test_default_constraint_stops_at_slash() {
    let pattern = CompiledPattern::compile("/items/{id}").unwrap();
    assert!(pattern.captures("/items/1/2", true).is_none());
    assert!(pattern.captures("/items/", true).is_none());
}

#[test]
fn test_nested_path() {
    let pattern = CompiledPattern::compile("/a/{b}/c").unwrap();
    let raw = pattern.captures("/a/1/c", true).unwrap();
    assert_eq!(raw.get("b").map(String::as_str), Some("1"));
}

#[test]
fn test_custom_constraint() {
    let pattern = CompiledPattern::compile(r"/users/{id:\d+}").unwrap();
    assert!(pattern.captures("/users/42", true).is_some());
    assert!(pattern.captures("/users/abc", true).is_none());
}

#[test]
fn test_constraint_with_braces() {
    let pattern = CompiledPattern::compile(r"/archive/{year:\d{4}}/{slug}").unwrap();
    let raw = pattern.captures("/archive/2024/hello", true).unwrap();
    assert_eq!(raw.get("year").map(String::as_str), Some("2024"));
    assert_eq!(raw.get("slug").map(String::as_str), Some("hello"));
    assert!(pattern.captures("/archive/24/hello", true).is_none());
}

#[test]
fn test_constraint_with_inner_groups() {
    let pattern = CompiledPattern::compile("/{kind:(post|page)}/{id}").unwrap();
    let raw = pattern.captures("/page/7", true).unwrap();
    assert_eq!(raw.get("kind").map(String::as_str), Some("page"));
    assert_eq!(raw.get("id").map(String::as_str), Some("7"));
}

#[test]
fn test_duplicate_name_last_wins() {
    let pattern = CompiledPattern::compile(r"/{a}/{a:\d+}").unwrap();
    assert_eq!(pattern.params().len(), 1);
    assert_eq!(pattern.params()[0].constraint_or_default(), r"\d+");

    let raw = pattern.captures("/1/2", true).unwrap();
    assert_eq!(raw.get("a").map(String::as_str), Some("2"));
    assert!(pattern.captures("/x/2", true).is_none());
}

#[test]
fn test_captures_are_percent_decoded() {
    let pattern = CompiledPattern::compile("/files/{name}").unwrap();
    let raw = pattern.captures("/files/a%20b%2Fc", true).unwrap();
    assert_eq!(raw.get("name").map(String::as_str), Some("a b/c"));

    // Not valid UTF-8 once decoded: kept as matched
    let raw = pattern.captures("/files/%FF", true).unwrap();
    assert_eq!(raw.get("name").map(String::as_str), Some("%FF"));
}

#[test]
fn test_literals_are_escaped() {
    let pattern = CompiledPattern::compile("/files.json").unwrap();
    assert!(pattern.captures("/files.json", true).is_some());
    assert!(pattern.captures("/filesXjson", true).is_none());
}

#[test]
fn test_prefix_match() {
    let pattern = CompiledPattern::compile("/api").unwrap();
    assert!(pattern.is_prefix_of("/api/users"));
    assert!(pattern.captures("/api/users", false).is_some());
    assert!(pattern.captures("/api/users", true).is_none());
    assert!(!pattern.is_prefix_of("/other"));
}

#[test]
fn test_unbalanced_braces() {
    assert!(matches!(
        CompiledPattern::compile("/users/{id"),
        Err(RoutingError::UnbalancedBraces { .. })
    ));
    assert!(matches!(
        CompiledPattern::compile("/users/id}"),
        Err(RoutingError::UnbalancedBraces { .. })
    ));
}

#[test]
fn test_invalid_param_name() {
    assert!(matches!(
        CompiledPattern::compile("/{1abc}"),
        Err(RoutingError::InvalidParamName { .. })
    ));
    assert!(matches!(
        CompiledPattern::compile("/{}"),
        Err(RoutingError::InvalidParamName { .. })
    ));
}

#[test]
fn test_invalid_constraint_regex() {
    assert!(matches!(
        CompiledPattern::compile("/{id:[}"),
        Err(RoutingError::InvalidPattern { .. })
    ));
}

#[test]
fn test_render_substitutes_every_occurrence() {
    let pattern = CompiledPattern::compile("/users/{id}/posts/{slug}").unwrap();
    let path = pattern
        .render(|name| Ok(format!("<{name}>")))
        .unwrap();
    assert_eq!(path, "/users/<id>/posts/<slug>");
}

#[test]
fn test_full_format_concatenates_ancestors() {
    let mut tree = RouteTree::new();
    let mut leaf = None;
    tree.group("/api", |api| {
        api.group("/v1", |v1| {
            leaf = Some(v1.get("/users/{id}", "users::show").id());
        });
    });
    let leaf = leaf.unwrap();
    assert_eq!(tree.node(leaf).full_format(), "/api/v1/users/{id}");
    assert_eq!(tree.node(leaf).format(), "/users/{id}");
    assert_eq!(tree.ancestors(leaf).count(), 4);
}

#[test]
fn test_group_is_never_matched_directly() {
    let mut tree = RouteTree::new();
    tree.group("/api", |api| {
        api.get("/users", "users::index");
    });
    assert!(tree.find_path("/api").unwrap().is_none());
    assert!(tree.find_path("/api/users").unwrap().is_some());
}

#[test]
fn test_group_falls_through_to_sibling() {
    let mut tree = RouteTree::new();
    tree.group("/api", |api| {
        api.get("/users", "users::index");
    });
    let fallback = tree.any("/api/{rest}", "fallback").id();
    let data = tree.find_path("/api/other").unwrap().unwrap();
    assert_eq!(data.route(), fallback);
}

#[test]
fn test_declaration_order_wins() {
    let mut tree = RouteTree::new();
    let first = tree.get("/users/{id}", "first").id();
    tree.get("/users/me", "second");
    let data = tree.find_path("/users/me").unwrap().unwrap();
    assert_eq!(data.route(), first);
}

#[test]
fn test_hidden_route_not_matched() {
    let mut tree = RouteTree::new();
    tree.hidden("/assets/{file}", "asset");
    assert!(tree.find_path("/assets/app.js").unwrap().is_none());
    assert!(tree.has_route("asset"));
}

#[test]
fn test_method_filter() {
    let mut tree = RouteTree::new();
    let get = tree.get("/users", "users::index").id();
    let post = tree.post("/users", "users::create").id();

    let data = tree.find_path_for(&Method::POST, "/users").unwrap().unwrap();
    assert_eq!(data.route(), post);
    let data = tree.find_path_for(&Method::GET, "/users").unwrap().unwrap();
    assert_eq!(data.route(), get);
    assert!(tree.find_path_for(&Method::DELETE, "/users").unwrap().is_none());
    // Without a method the first declared route wins
    assert_eq!(tree.find_path("/users").unwrap().unwrap().route(), get);
}

#[test]
fn test_non_strict_route_matches_prefix() {
    let mut tree = RouteTree::new();
    tree.get("/docs", "docs").strict(false);
    assert!(tree.find_path("/docs/intro").unwrap().is_some());
}

#[test]
fn test_group_stays_non_strict() {
    let mut tree = RouteTree::new();
    let mut group = tree.group("/api", |_| {});
    group.strict(true);
    assert!(!group.node().is_strict());
    assert_eq!(group.node().method(), &MethodConstraint::Group);
}

#[test]
fn test_find_route_first_in_preorder() {
    let mut tree = RouteTree::new();
    let mut nested = None;
    tree.group("/a", |a| {
        nested = Some(a.get("/x", "x").name("dup").id());
    });
    tree.get("/b", "b").name("dup");
    assert_eq!(tree.find_route("dup"), nested);
    assert!(matches!(
        tree.get_route("missing"),
        Err(RoutingError::RouteNotFound { .. })
    ));
}

#[test]
fn test_routes_summary_depth() {
    let mut tree = RouteTree::new();
    tree.group("/api", |api| {
        api.get("/users", "users::index").name("users");
    });
    tree.post("/login", "auth::login");

    let routes = tree.routes();
    assert_eq!(routes.len(), 3);
    assert_eq!(routes[0].method, "GROUP");
    assert_eq!(routes[0].depth, 0);
    assert_eq!(routes[1].pattern, "/api/users");
    assert_eq!(routes[1].depth, 1);
    assert_eq!(routes[1].name.as_deref(), Some("users"));
    assert_eq!(routes[2].method, "POST");
    assert_eq!(tree.path_patterns(), vec!["/api/users", "/login"]);
}

#[test]
fn test_invalid_pattern_surfaces_on_match() {
    let mut tree = RouteTree::new();
    tree.get("/{id", "broken");
    assert!(matches!(
        tree.find_path("/1"),
        Err(RoutingError::UnbalancedBraces { .. })
    ));
}
