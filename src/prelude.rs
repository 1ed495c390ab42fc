pub use crate::config::{AppConfig, RouteConfig, ServerConfig};
pub use crate::error::Result;
pub use crate::http::*;

pub use mio::{
    Events, Interest, Poll, Token,
    event::Event,
    net::{TcpListener, TcpStream},
};
pub use proxy_log::{errors, info, trace, warn};
pub use std::collections::HashMap;
pub use std::fs::{self, File, OpenOptions};
pub use std::io::{ErrorKind, Read, Write};
pub use std::net::SocketAddr;
pub use std::path::{Path, PathBuf};
pub use std::sync::Arc;
pub use std::time::{Duration, Instant};

pub use crate::{
    cgi::CgiError,
    handlers::{handle_delete, handle_get_or_head, handle_upload},
    router::RoutingError,
    upload::UploadError,
};

// 2xx Success
pub const HTTP_OK: u16 = 200;
pub const HTTP_CREATED: u16 = 201;
pub const HTTP_NO_CONTENT: u16 = 204;

// 3xx Redirection
pub const HTTP_MOVED_PERMANENTLY: u16 = 301;
pub const HTTP_FOUND: u16 = 302;
pub const HTTP_NOT_MODIFIED: u16 = 304;

// 4xx Client Errors
pub const HTTP_BAD_REQUEST: u16 = 400;
pub const HTTP_FORBIDDEN: u16 = 403;
pub const HTTP_NOT_FOUND: u16 = 404;
pub const HTTP_METHOD_NOT_ALLOWED: u16 = 405;
pub const HTTP_PAYLOAD_TOO_LARGE: u16 = 413;
pub const HTTP_REQUEST_HEADER_FIELDS_TOO_LARGE: u16 = 431;

// 5xx Server Errors
pub const HTTP_INTERNAL_SERVER_ERROR: u16 = 500;
pub const HTTP_NOT_IMPLEMENTED: u16 = 501;
pub const HTTP_VERSION_NOT_SUPPORTED: u16 = 505;

/// Request line + headers must fit this many bytes before a 431 is raised.
pub const MAX_HEADER_BYTES: usize = 8_192;
/// One `read()` of at most this many bytes happens per ready connection per iteration.
pub const READ_BUF_SIZE: usize = 4096;
/// Connections idle longer than this are closed at the top of the next iteration.
pub const IDLE_TIMEOUT: Duration = Duration::from_secs(60);
/// Poll horizon for the main event loop.
pub const POLL_TIMEOUT: Duration = Duration::from_millis(1000);
/// Read-idle deadline for the CGI executor's own multiplexing call.
pub const CGI_READ_TIMEOUT: Duration = Duration::from_secs(5);
/// Default upload directory when a location does not configure one.
pub const DEFAULT_UPLOAD_DIR: &str = "./uploads";
