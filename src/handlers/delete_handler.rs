use crate::handlers::resolve_under_root;
use crate::prelude::*;

/// DELETE on a regular file under the location root.
/// Never allowed on the configured index file name, directories, or
/// anything outside the location root (enforced by `resolve_under_root`).
pub fn handle_delete(request: &HttpRequest, route: &RouteConfig, server_config: &Arc<ServerConfig>) -> HttpResponse {
    if request.method != Method::Delete {
        return handle_error(HTTP_METHOD_NOT_ALLOWED, Some(server_config));
    }

    let path = match resolve_under_root(route, request.path()) {
        Ok(p) => p,
        Err(code) => return handle_error(code, Some(server_config)),
    };

    if !route.default_file.is_empty() && path.file_name().and_then(|n| n.to_str()) == Some(route.default_file.as_str()) {
        return method_not_allowed_with_reason("Permission denied");
    }

    if !path.is_file() {
        return handle_error(HTTP_NOT_FOUND, Some(server_config));
    }

    match fs::remove_file(&path) {
        Ok(()) => {
            let mut response = HttpResponse::new(HTTP_OK, HttpResponse::status_text(HTTP_OK));
            response.set_body(b"<html><body>File deleted</body></html>".to_vec(), "text/html");
            response
        }
        Err(e) if e.kind() == ErrorKind::PermissionDenied => method_not_allowed_with_reason("Permission denied"),
        Err(_) => handle_error(HTTP_INTERNAL_SERVER_ERROR, Some(server_config)),
    }
}

fn method_not_allowed_with_reason(reason: &str) -> HttpResponse {
    let mut response = HttpResponse::new(HTTP_METHOD_NOT_ALLOWED, HttpResponse::status_text(HTTP_METHOD_NOT_ALLOWED));
    response.set_body(reason.as_bytes().to_vec(), "text/plain");
    response
}
