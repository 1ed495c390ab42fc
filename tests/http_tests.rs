//! Request parsing exercised across arbitrary chunk boundaries, then fed
//! straight into the router to confirm the two stages agree on a finished
//! `HttpRequest`'s shape end to end.

use server_proxy::config::{RouteConfig, ServerConfig};
use server_proxy::http::{HttpRequest, HttpResponse, Method, ParsingState};
use server_proxy::router;
use std::sync::Arc;

fn feed_in_chunks(req: &mut HttpRequest, bytes: &[u8], chunk_size: usize, max_body: usize) {
    for chunk in bytes.chunks(chunk_size) {
        req.buffer.extend_from_slice(chunk);
        req.advance(max_body).unwrap();
    }
}

#[test]
fn get_request_completes_regardless_of_chunk_size() {
    let raw = b"GET /index.html?x=1 HTTP/1.1\r\nHost: example.com\r\nAccept: */*\r\n\r\n";

    for chunk_size in [1, 3, 7, 64, 4096] {
        let mut req = HttpRequest::new();
        feed_in_chunks(&mut req, raw, chunk_size, 1024);
        assert_eq!(req.state, ParsingState::Complete, "chunk size {chunk_size}");
        assert_eq!(req.method, Method::Get);
        assert_eq!(req.path(), "/index.html");
        assert_eq!(req.query(), "x=1");
        assert_eq!(req.headers.get("host").unwrap(), "example.com");
    }
}

#[test]
fn post_body_spanning_many_small_reads_is_reassembled_whole() {
    let raw = b"POST /upload HTTP/1.1\r\nContent-Length: 13\r\n\r\nhello, world!";
    let mut req = HttpRequest::new();
    feed_in_chunks(&mut req, raw, 2, 1024);
    assert_eq!(req.state, ParsingState::Complete);
    assert_eq!(req.body, b"hello, world!");
}

#[test]
fn header_values_with_mixed_case_keys_are_normalized_to_lowercase() {
    let raw = b"GET / HTTP/1.1\r\nHOST: example.com\r\nX-Custom-Header: Value\r\n\r\n";
    let mut req = HttpRequest::new();
    req.buffer.extend_from_slice(raw);
    req.advance(1024).unwrap();
    assert_eq!(req.headers.get("host").unwrap(), "example.com");
    assert_eq!(req.headers.get("x-custom-header").unwrap(), "Value");
}

#[test]
fn completed_request_routes_to_a_404_response_when_nothing_matches() {
    let raw = b"GET /nowhere HTTP/1.1\r\nHost: x\r\n\r\n";
    let mut req = HttpRequest::new();
    req.buffer.extend_from_slice(raw);
    req.advance(1024).unwrap();

    let cfg = Arc::new(ServerConfig {
        routes: vec![RouteConfig { path: "/elsewhere".to_string(), ..RouteConfig::default() }],
        ..ServerConfig::default()
    });

    let response = router::route(&req, &cfg);
    assert_eq!(response.status_code, 404);
}

#[test]
fn head_request_is_routed_like_get_but_handler_still_sees_head() {
    let dir = std::env::temp_dir().join("webserv_http_tests_head");
    let _ = std::fs::remove_dir_all(&dir);
    std::fs::create_dir_all(&dir).unwrap();
    std::fs::write(dir.join("index.html"), b"hello").unwrap();

    let raw = b"HEAD / HTTP/1.1\r\nHost: x\r\n\r\n";
    let mut req = HttpRequest::new();
    req.buffer.extend_from_slice(raw);
    req.advance(1024).unwrap();
    assert_eq!(req.method, Method::Head);

    let cfg = Arc::new(ServerConfig {
        routes: vec![RouteConfig {
            path: "/".to_string(),
            root: dir.to_str().unwrap().to_string(),
            ..RouteConfig::default()
        }],
        ..ServerConfig::default()
    });

    let response = router::route(&req, &cfg);
    assert_eq!(response.status_code, 200);
    assert!(response.body.is_empty(), "HEAD must not carry a body");
}

#[test]
fn bad_version_is_rejected_before_routing_ever_sees_it() {
    let raw = b"GET / HTTP/3.0\r\nHost: x\r\n\r\n";
    let mut req = HttpRequest::new();
    req.buffer.extend_from_slice(raw);
    let err = req.advance(1024).unwrap_err();
    assert_eq!(err.status_code(), 505);
}

#[test]
fn response_serializes_status_line_headers_and_body_in_order() {
    let mut res = HttpResponse::new(200, "OK");
    res.set_header("content-type", "text/plain").set_body(b"Hello Rust".to_vec(), "text/plain");

    let bytes = res.to_bytes();
    let s = String::from_utf8_lossy(&bytes);

    assert!(s.starts_with("HTTP/1.1 200 OK\r\n"));
    assert!(s.contains("Content-Type: text/plain\r\n"));
    assert!(s.contains("Content-Length: 10\r\n"));
    assert!(s.ends_with("\r\n\r\nHello Rust"));
}
