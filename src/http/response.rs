use crate::prelude::*;
use std::path::Path;

#[derive(Debug)]
pub struct HttpResponse {
    pub version: String,
    pub status_code: u16,
    pub status_text: String,
    pub headers: HashMap<String, String>,
    pub body: Vec<u8>,
}

impl HttpResponse {
    pub fn new(status_code: u16, status_text: &str) -> Self {
        Self {
            version: "HTTP/1.1".to_string(),
            status_code,
            status_text: status_text.to_string(),
            headers: HashMap::from([
                ("content-length".to_string(), "0".to_string()),
                ("server".to_string(), "webserv".to_string()),
            ]),
            body: Vec::new(),
        }
    }

    pub fn from_status(code: u16) -> Self {
        Self::new(code, Self::status_text(code))
    }

    pub fn set_header(&mut self, key: &str, value: &str) -> &mut Self {
        self.headers.insert(key.to_ascii_lowercase(), value.to_string());
        self
    }

    pub fn set_body(&mut self, body: Vec<u8>, content_type: &str) -> &mut Self {
        self.headers.insert("content-length".to_string(), body.len().to_string());
        self.headers.insert("content-type".to_string(), content_type.to_string());
        self.body = body;
        self
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let mut res = self.to_bytes_headers_only();
        res.extend_from_slice(&self.body);
        res
    }

    pub fn to_bytes_headers_only(&self) -> Vec<u8> {
        let mut res = format!("{} {} {}\r\n", self.version, self.status_code, self.status_text).into_bytes();
        for (key, val) in &self.headers {
            res.extend_from_slice(format!("{}: {}\r\n", Self::to_pascal_case(key), val).as_bytes());
        }
        res.extend_from_slice(b"\r\n");
        res
    }

    fn to_pascal_case(s: &str) -> String {
        s.split('-')
            .map(|word| {
                let mut chars = word.chars();
                match chars.next() {
                    None => String::new(),
                    Some(f) => f.to_uppercase().collect::<String>() + chars.as_str(),
                }
            })
            .collect::<Vec<String>>()
            .join("-")
    }

    pub fn status_text(code: u16) -> &'static str {
        match code {
            HTTP_OK => "OK",
            HTTP_CREATED => "Created",
            HTTP_NO_CONTENT => "No Content",
            HTTP_MOVED_PERMANENTLY => "Moved Permanently",
            HTTP_FOUND => "Found",
            HTTP_NOT_MODIFIED => "Not Modified",
            HTTP_BAD_REQUEST => "Bad Request",
            HTTP_FORBIDDEN => "Forbidden",
            HTTP_NOT_FOUND => "Not Found",
            HTTP_METHOD_NOT_ALLOWED => "Method Not Allowed",
            HTTP_PAYLOAD_TOO_LARGE => "Payload Too Large",
            HTTP_REQUEST_HEADER_FIELDS_TOO_LARGE => "Request Header Fields Too Large",
            HTTP_INTERNAL_SERVER_ERROR => "Internal Server Error",
            HTTP_NOT_IMPLEMENTED => "Not Implemented",
            HTTP_VERSION_NOT_SUPPORTED => "HTTP Version Not Supported",
            _ => "Unknown",
        }
    }

    pub fn set_status_code(&mut self, code: u16) -> &mut Self {
        self.status_code = code;
        self.status_text = Self::status_text(code).to_string();
        self
    }

    pub fn redirect(code: u16, target_url: &str) -> Self {
        let mut res = HttpResponse::new(code, Self::status_text(code));
        res.set_header("location", target_url).set_header("content-length", "0");
        res
    }
}

/// Closed MIME-type set, per the static handler's scope.
pub fn get_mime_type(extension: Option<&str>) -> &'static str {
    match extension {
        Some("html") | Some("htm") => "text/html",
        Some("css") => "text/css",
        Some("js") => "application/javascript",
        Some("json") => "application/json",
        Some("png") => "image/png",
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("gif") => "image/gif",
        Some("svg") => "image/svg+xml",
        Some("ico") => "image/x-icon",
        Some("txt") => "text/plain",
        Some("pdf") => "application/pdf",
        Some("xml") => "application/xml",
        Some("zip") => "application/zip",
        Some("mp4") => "video/mp4",
        Some("mp3") => "audio/mpeg",
        Some("woff") => "font/woff",
        Some("woff2") => "font/woff2",
        Some("ttf") => "font/ttf",
        Some("wasm") => "application/wasm",
        _ => "application/octet-stream",
    }
}

pub fn generate_autoindex(dir: &Path, request_path: &str) -> HttpResponse {
    let base = request_path.trim_end_matches('/');
    let mut html = format!("<html><body><h1>Index of {}</h1><ul>", request_path);
    html.push_str("<li><a href=\"../\">..</a></li>");

    if let Ok(entries) = dir.read_dir() {
        let mut names: Vec<(String, bool)> = entries
            .flatten()
            .filter_map(|e| {
                let name = e.file_name().into_string().ok()?;
                if name.starts_with('.') {
                    return None;
                }
                let is_dir = e.path().is_dir();
                Some((name, is_dir))
            })
            .collect();
        names.sort();

        for (name, is_dir) in names {
            let suffix = if is_dir { "/" } else { "" };
            html.push_str(&format!("<li><a href=\"{base}/{name}{suffix}\">{name}{suffix}</a></li>"));
        }
    }
    html.push_str("</ul></body></html>");

    let mut res = HttpResponse::new(HTTP_OK, HttpResponse::status_text(HTTP_OK));
    res.set_body(html.into_bytes(), "text/html");
    res
}

/// Builds an error response, preferring the server's configured error page
/// for `code` and falling back to a small inline body.
pub fn handle_error(code: u16, cfg: Option<&ServerConfig>) -> HttpResponse {
    if let Some(cfg) = cfg {
        if let Some(path_str) = cfg.error_pages.get(&code) {
            if let Ok(content) = fs::read(path_str) {
                let mut res = HttpResponse::new(code, HttpResponse::status_text(code));
                res.set_body(content, "text/html");
                return res;
            }
            warn!("configured error page '{}' for {} could not be read", path_str, code);
        }
    }

    let mut res = HttpResponse::new(code, HttpResponse::status_text(code));
    let body = format!("{} {}", code, HttpResponse::status_text(code)).into_bytes();
    res.set_body(body, "text/plain");
    res
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn to_bytes_includes_status_line_and_body() {
        let mut res = HttpResponse::new(HTTP_OK, "OK");
        res.set_body(b"hi".to_vec(), "text/plain");
        let bytes = res.to_bytes();
        let text = String::from_utf8(bytes).unwrap();
        assert!(text.starts_with("HTTP/1.1 200 OK\r\n"));
        assert!(text.contains("Content-Length: 2"));
        assert!(text.ends_with("hi"));
    }

    #[test]
    fn always_carries_a_server_header() {
        let res = HttpResponse::new(HTTP_OK, "OK");
        assert!(res.headers.contains_key("server"));
    }

    #[test]
    fn redirect_sets_location_header() {
        let res = HttpResponse::redirect(301, "/new");
        assert_eq!(res.headers.get("location").unwrap(), "/new");
        assert_eq!(res.status_code, 301);
    }

    #[test]
    fn handle_error_falls_back_to_inline_body_without_config() {
        let res = handle_error(HTTP_NOT_FOUND, None);
        assert_eq!(res.status_code, 404);
        assert!(String::from_utf8(res.body).unwrap().contains("404"));
    }

    #[test]
    fn mime_type_closed_set_defaults_to_octet_stream() {
        assert_eq!(get_mime_type(Some("html")), "text/html");
        assert_eq!(get_mime_type(Some("zip")), "application/zip");
        assert_eq!(get_mime_type(Some("woff2")), "font/woff2");
        assert_eq!(get_mime_type(Some("ttf")), "font/ttf");
        assert_eq!(get_mime_type(Some("bogus")), "application/octet-stream");
        assert_eq!(get_mime_type(None), "application/octet-stream");
    }
}
