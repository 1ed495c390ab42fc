use crate::handlers::resolve_under_root;
use crate::prelude::*;

/// GET/HEAD static file serving, directory index/autoindex.
/// HEAD preserves every header a GET would have produced but sends no body.
pub fn handle_get_or_head(request: &HttpRequest, route: &RouteConfig, server_config: &Arc<ServerConfig>) -> HttpResponse {
    if !matches!(request.method, Method::Get | Method::Head) {
        return handle_error(HTTP_METHOD_NOT_ALLOWED, Some(server_config));
    }

    let path = match resolve_under_root(route, request.path()) {
        Ok(p) => p,
        Err(code) => return handle_error(code, Some(server_config)),
    };

    let mut response = if path.is_dir() {
        serve_directory(&path, request.path(), route, server_config)
    } else {
        serve_file(&path, server_config)
    };

    if request.method == Method::Head {
        response.body.clear();
    }
    response
}

fn serve_directory(dir: &Path, request_path: &str, route: &RouteConfig, server_config: &Arc<ServerConfig>) -> HttpResponse {
    if !route.default_file.is_empty() {
        let index_path = dir.join(&route.default_file);
        if index_path.is_file() {
            return serve_file(&index_path, server_config);
        }
    }

    if route.autoindex {
        return generate_autoindex(dir, request_path);
    }

    handle_error(HTTP_NOT_FOUND, Some(server_config))
}

fn serve_file(path: &Path, server_config: &Arc<ServerConfig>) -> HttpResponse {
    match fs::read(path) {
        Ok(content) => {
            let mime = get_mime_type(path.extension().and_then(|e| e.to_str()));
            let mut response = HttpResponse::new(HTTP_OK, HttpResponse::status_text(HTTP_OK));
            response.set_body(content, mime);
            response
        }
        Err(e) => match e.kind() {
            ErrorKind::NotFound => handle_error(HTTP_NOT_FOUND, Some(server_config)),
            ErrorKind::PermissionDenied => handle_error(HTTP_FORBIDDEN, Some(server_config)),
            _ => handle_error(HTTP_INTERNAL_SERVER_ERROR, Some(server_config)),
        },
    }
}
