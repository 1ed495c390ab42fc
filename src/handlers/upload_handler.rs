use crate::prelude::*;
use crate::upload::{save_upload, UploadError};

/// POST multipart upload. `client_max_body_size` has already been enforced
/// by the parser before a request ever reaches `Complete`, but the declared
/// `Content-Length` is re-checked here since the parser's limit is
/// server-wide while a location could, in principle, be stricter — kept
/// identical to the server limit for now (see DESIGN.md).
pub fn handle_upload(request: &HttpRequest, route: &RouteConfig, server_config: &Arc<ServerConfig>) -> HttpResponse {
    if request.method != Method::Post {
        return handle_error(HTTP_METHOD_NOT_ALLOWED, Some(server_config));
    }

    if request.body.len() > server_config.client_max_body_size {
        return handle_error(HTTP_PAYLOAD_TOO_LARGE, Some(server_config));
    }

    let content_type = match request.headers.get("content-type") {
        Some(ct) => ct,
        None => return handle_error(HTTP_BAD_REQUEST, Some(server_config)),
    };

    let upload_dir = route.upload_dir.as_deref().unwrap_or(DEFAULT_UPLOAD_DIR);

    match save_upload(&request.body, content_type, Path::new(upload_dir)) {
        Ok(saved) => success_response(&saved),
        Err(UploadError::MissingBoundary) => handle_error(HTTP_BAD_REQUEST, Some(server_config)),
        Err(UploadError::NothingSaved) => handle_error(HTTP_INTERNAL_SERVER_ERROR, Some(server_config)),
        Err(UploadError::MethodNotAllowed) => handle_error(HTTP_METHOD_NOT_ALLOWED, Some(server_config)),
        Err(UploadError::PayloadTooLarge) => handle_error(HTTP_PAYLOAD_TOO_LARGE, Some(server_config)),
    }
}

fn success_response(saved: &[String]) -> HttpResponse {
    let items: String = saved.iter().map(|name| format!("<li>{name}</li>")).collect();
    let body = format!("<html><body><ul>{items}</ul></body></html>");
    let mut response = HttpResponse::new(HTTP_OK, HttpResponse::status_text(HTTP_OK));
    response.set_body(body.into_bytes(), "text/html");
    response
}

#[cfg(test)]
mod tests {
    use super::*;

    fn route_with_upload_dir(dir: &Path) -> RouteConfig {
        RouteConfig { path: "/".to_string(), upload_dir: Some(dir.to_str().unwrap().to_string()), ..RouteConfig::default() }
    }

    fn multipart_request(boundary: &str, body: &str) -> HttpRequest {
        let mut req = HttpRequest::new();
        req.method = Method::Post;
        req.url = "/upload".to_string();
        req.headers.insert("content-type".to_string(), format!("multipart/form-data; boundary={boundary}"));
        req.body = body.as_bytes().to_vec();
        req
    }

    #[test]
    fn non_post_is_method_not_allowed() {
        let mut req = HttpRequest::new();
        req.method = Method::Get;
        let cfg = Arc::new(ServerConfig::default());
        let route = RouteConfig::default();
        let res = handle_upload(&req, &route, &cfg);
        assert_eq!(res.status_code, HTTP_METHOD_NOT_ALLOWED);
    }

    #[test]
    fn missing_content_type_is_bad_request() {
        let mut req = HttpRequest::new();
        req.method = Method::Post;
        let cfg = Arc::new(ServerConfig::default());
        let route = RouteConfig::default();
        let res = handle_upload(&req, &route, &cfg);
        assert_eq!(res.status_code, HTTP_BAD_REQUEST);
    }

    #[test]
    fn saves_file_and_returns_200() {
        let dir = std::env::temp_dir().join("webserv_upload_handler_test");
        let _ = fs::remove_dir_all(&dir);

        let boundary = "X-BOUNDARY";
        let body = format!(
            "--{b}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"a.txt\"\r\n\r\ndata\r\n--{b}--\r\n",
            b = boundary
        );
        let req = multipart_request(boundary, &body);
        let route = route_with_upload_dir(&dir);
        let cfg = Arc::new(ServerConfig::default());

        let res = handle_upload(&req, &route, &cfg);
        assert_eq!(res.status_code, HTTP_OK);
        assert!(fs::read(dir.join("a.txt")).unwrap() == b"data");
    }

    #[test]
    fn oversized_body_is_413() {
        let mut req = HttpRequest::new();
        req.method = Method::Post;
        req.headers.insert("content-type".to_string(), "multipart/form-data; boundary=x".to_string());
        req.body = vec![0u8; 100];
        let route = RouteConfig::default();
        let mut cfg = ServerConfig::default();
        cfg.client_max_body_size = 10;
        let res = handle_upload(&req, &route, &Arc::new(cfg));
        assert_eq!(res.status_code, HTTP_PAYLOAD_TOO_LARGE);
    }
}
