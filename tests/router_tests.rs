//! Exercises `router::resolve`/`router::route` through the public API only,
//! against `ServerConfig`s built the way `config::load` would produce them.
//! Virtual hosting by `Host` is out of scope, so every scenario here is
//! keyed purely on method + path within one server block.

use server_proxy::config::{RouteConfig, ServerConfig};
use server_proxy::http::{HttpRequest, Method};
use server_proxy::router::{self, RoutingError};
use std::sync::Arc;

fn route_cfg(path: &str, methods: &[&str]) -> RouteConfig {
    RouteConfig { path: path.to_string(), methods: methods.iter().map(|s| s.to_string()).collect(), ..RouteConfig::default() }
}

fn server_with(routes: Vec<RouteConfig>) -> ServerConfig {
    ServerConfig { routes, ..ServerConfig::default() }
}

#[test]
fn resolves_the_only_configured_location() {
    let cfg = server_with(vec![route_cfg("/", &["GET"])]);
    let r = router::resolve(&cfg, &Method::Get, "/").unwrap();
    assert_eq!(r.path, "/");
}

#[test]
fn root_location_catches_any_unconfigured_path_under_it() {
    let cfg = server_with(vec![route_cfg("/", &["GET"])]);
    let r = router::resolve(&cfg, &Method::Get, "/unconfigured/deep/path").unwrap();
    assert_eq!(r.path, "/");
}

#[test]
fn longest_prefix_wins_over_a_shorter_ancestor() {
    let cfg = server_with(vec![route_cfg("/a", &["GET"]), route_cfg("/a/b", &["GET"])]);
    let r = router::resolve(&cfg, &Method::Get, "/a/b/c").unwrap();
    assert_eq!(r.path, "/a/b");
}

#[test]
fn equal_length_ties_are_broken_by_declaration_order() {
    let mut first = route_cfg("/dup", &["GET"]);
    first.default_file = "first.html".to_string();
    let mut second = route_cfg("/dup", &["GET"]);
    second.default_file = "second.html".to_string();

    let cfg = server_with(vec![first, second]);
    let r = router::resolve(&cfg, &Method::Get, "/dup").unwrap();
    assert_eq!(r.default_file, "first.html");
}

#[test]
fn method_outside_the_locations_allow_list_is_rejected() {
    let cfg = server_with(vec![route_cfg("/", &["GET"])]);
    assert_eq!(router::resolve(&cfg, &Method::Post, "/").unwrap_err(), RoutingError::MethodNotAllowed);
}

#[test]
fn path_with_no_covering_location_is_not_found() {
    let cfg = server_with(vec![route_cfg("/a", &["GET"])]);
    assert_eq!(router::resolve(&cfg, &Method::Get, "/b").unwrap_err(), RoutingError::NotFound);
}

#[test]
fn full_route_pipeline_serves_a_real_file_from_disk() {
    let dir = std::env::temp_dir().join("webserv_router_tests_static");
    let _ = std::fs::remove_dir_all(&dir);
    std::fs::create_dir_all(&dir).unwrap();
    std::fs::write(dir.join("index.html"), b"<h1>root</h1>").unwrap();

    let cfg = Arc::new(server_with(vec![RouteConfig {
        path: "/".to_string(),
        root: dir.to_str().unwrap().to_string(),
        ..RouteConfig::default()
    }]));

    let mut req = HttpRequest::new();
    req.method = Method::Get;
    req.url = "/".to_string();

    let res = router::route(&req, &cfg);
    assert_eq!(res.status_code, 200);
    assert_eq!(res.body, b"<h1>root</h1>");
}

#[test]
fn full_route_pipeline_reports_method_not_allowed_for_the_whole_server() {
    let cfg = Arc::new(server_with(vec![route_cfg("/", &["GET", "HEAD"])]));

    let mut req = HttpRequest::new();
    req.method = Method::Delete;
    req.url = "/anything".to_string();

    let res = router::route(&req, &cfg);
    assert_eq!(res.status_code, 405);
}

#[test]
fn redirect_location_short_circuits_before_any_handler_dispatch() {
    let mut r = route_cfg("/old", &["GET"]);
    r.redirect = Some((302, "/new".to_string()));
    let cfg = Arc::new(server_with(vec![r]));

    let mut req = HttpRequest::new();
    req.method = Method::Get;
    req.url = "/old".to_string();

    let res = router::route(&req, &cfg);
    assert_eq!(res.status_code, 302);
    assert_eq!(res.headers.get("location").unwrap(), "/new");
}
