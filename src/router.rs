//! Routes a completed request to the handler that produces its response.

use crate::cgi;
use crate::handlers::resolve_under_root;
use crate::prelude::*;

#[derive(Debug, PartialEq, Eq)]
pub enum RoutingError {
    NotFound,
    MethodNotAllowed,
}

/// Finds the best-matching location for `path` and checks the method is
/// allowed on it, without producing a response. Kept separate from
/// [`route`] so the matching rule (longest prefix, ties by declaration
/// order, from [`ServerConfig::find_route`]) is independently testable.
pub fn resolve<'a>(
    server_config: &'a ServerConfig,
    method: &Method,
    path: &str,
) -> std::result::Result<&'a RouteConfig, RoutingError> {
    let route = server_config.find_route(path).ok_or(RoutingError::NotFound)?;
    if !method.is_allowed(&route.methods) {
        return Err(RoutingError::MethodNotAllowed);
    }
    Ok(route)
}

/// Drives the full routing algorithm and returns the finished response.
/// Never panics or propagates an error across the
/// component boundary — every outcome, including a CGI script crashing or
/// timing out, becomes an `HttpResponse`.
pub fn route(request: &HttpRequest, server_config: &Arc<ServerConfig>) -> HttpResponse {
    let path = request.path();

    let route = match resolve(server_config, &request.method, path) {
        Ok(r) => r,
        Err(RoutingError::NotFound) => return handle_error(HTTP_NOT_FOUND, Some(server_config)),
        Err(RoutingError::MethodNotAllowed) => {
            return handle_error(HTTP_METHOD_NOT_ALLOWED, Some(server_config));
        }
    };

    if let Some((code, target)) = &route.redirect {
        return redirect_response(*code, target);
    }

    if let Some(interpreter) = cgi_interpreter_for(route, path) {
        return dispatch_cgi(request, server_config, route, path, &interpreter);
    }

    match request.method {
        Method::Get | Method::Head => handle_get_or_head(request, route, server_config),
        Method::Delete => handle_delete(request, route, server_config),
        Method::Post => handle_upload(request, route, server_config),
        Method::Put => put_acknowledgement(),
        Method::Unknown(_) => handle_error(HTTP_BAD_REQUEST, Some(server_config)),
    }
}

fn cgi_interpreter_for(route: &RouteConfig, path: &str) -> Option<PathBuf> {
    let ext = Path::new(path).extension()?.to_str()?;
    route.cgi.get(&format!(".{ext}")).map(PathBuf::from)
}

fn dispatch_cgi(
    request: &HttpRequest,
    server_config: &Arc<ServerConfig>,
    route: &RouteConfig,
    path: &str,
    interpreter: &Path,
) -> HttpResponse {
    let script_path = match resolve_under_root(route, path) {
        Ok(p) => p,
        Err(code) => return handle_error(code, Some(server_config)),
    };

    if !script_path.is_file() {
        return handle_error(HTTP_NOT_FOUND, Some(server_config));
    }

    let env = cgi::build_cgi_env(request, server_config, &script_path, path, "");

    match cgi::execute(interpreter, &script_path, request, &env) {
        Ok(response) => response,
        Err(e) => {
            errors!("cgi execution failed for '{}': {}", script_path.display(), e);
            handle_error(HTTP_INTERNAL_SERVER_ERROR, Some(server_config))
        }
    }
}

fn redirect_response(code: u16, target: &str) -> HttpResponse {
    let mut response = HttpResponse::redirect(code, target);
    let body = format!("<html><body>Moved to <a href=\"{target}\">{target}</a></body></html>");
    response.set_body(body.into_bytes(), "text/html");
    response.set_header("location", target);
    response
}

fn put_acknowledgement() -> HttpResponse {
    let mut response = HttpResponse::new(HTTP_OK, HttpResponse::status_text(HTTP_OK));
    response.set_body(b"<html><body>Resource stored</body></html>".to_vec(), "text/html");
    response
}

#[cfg(test)]
mod tests {
    use super::*;

    fn route_cfg(path: &str, methods: &[&str]) -> RouteConfig {
        RouteConfig {
            path: path.to_string(),
            methods: methods.iter().map(|s| s.to_string()).collect(),
            ..RouteConfig::default()
        }
    }

    fn server_with(routes: Vec<RouteConfig>) -> ServerConfig {
        ServerConfig { routes, ..ServerConfig::default() }
    }

    #[test]
    fn resolves_longest_prefix() {
        let cfg = server_with(vec![route_cfg("/a", &["GET"]), route_cfg("/a/b", &["GET"])]);
        let r = resolve(&cfg, &Method::Get, "/a/b/c").unwrap();
        assert_eq!(r.path, "/a/b");
    }

    #[test]
    fn missing_location_is_not_found() {
        let cfg = server_with(vec![route_cfg("/a", &["GET"])]);
        assert_eq!(resolve(&cfg, &Method::Get, "/elsewhere").unwrap_err(), RoutingError::NotFound);
    }

    #[test]
    fn disallowed_method_is_method_not_allowed() {
        let cfg = server_with(vec![route_cfg("/", &["GET"])]);
        assert_eq!(resolve(&cfg, &Method::Post, "/").unwrap_err(), RoutingError::MethodNotAllowed);
    }

    #[test]
    fn put_gets_fixed_acknowledgement() {
        let mut req = HttpRequest::new();
        req.method = Method::Put;
        req.url = "/file.txt".to_string();
        let cfg = Arc::new(server_with(vec![route_cfg("/", &["PUT"])]));
        let res = route(&req, &cfg);
        assert_eq!(res.status_code, HTTP_OK);
    }

    #[test]
    fn redirect_location_takes_priority_over_dispatch() {
        let mut req = HttpRequest::new();
        req.method = Method::Get;
        req.url = "/old".to_string();
        let mut r = route_cfg("/old", &["GET"]);
        r.redirect = Some((301, "/new".to_string()));
        let cfg = Arc::new(server_with(vec![r]));
        let res = route(&req, &cfg);
        assert_eq!(res.status_code, 301);
        assert_eq!(res.headers.get("location").unwrap(), "/new");
    }

    #[test]
    fn unknown_method_is_bad_request() {
        let mut req = HttpRequest::new();
        req.method = Method::Unknown("PATCH".to_string());
        req.url = "/".to_string();
        let cfg = Arc::new(server_with(vec![route_cfg("/", &["GET", "PATCH"])]));
        let res = route(&req, &cfg);
        assert_eq!(res.status_code, HTTP_BAD_REQUEST);
    }

    #[test]
    fn cgi_dispatch_rejects_dot_dot_escaping_the_location_root() {
        let dir = std::env::temp_dir().join("webserv_router_test_cgi_escape");
        fs::create_dir_all(&dir).unwrap();

        let mut r = route_cfg("/scripts", &["GET"]);
        r.root = dir.to_str().unwrap().to_string();
        r.cgi.insert(".cgi".to_string(), "/bin/sh".to_string());
        let cfg = Arc::new(server_with(vec![r]));

        let mut req = HttpRequest::new();
        req.method = Method::Get;
        req.url = "/scripts/../../../../etc/passwd.cgi".to_string();

        let res = route(&req, &cfg);
        assert_ne!(res.status_code, HTTP_OK);
        assert!(matches!(res.status_code, HTTP_BAD_REQUEST | HTTP_NOT_FOUND | HTTP_FORBIDDEN));
    }
}
