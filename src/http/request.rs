use crate::prelude::*;
use std::fmt::{self, Display};

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Method {
    Get,
    Head,
    Post,
    Put,
    Delete,
    Unknown(String),
}

impl Method {
    pub fn parse(s: &str) -> Self {
        match s {
            "GET" => Method::Get,
            "HEAD" => Method::Head,
            "POST" => Method::Post,
            "PUT" => Method::Put,
            "DELETE" => Method::Delete,
            other => Method::Unknown(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Method::Get => "GET",
            Method::Head => "HEAD",
            Method::Post => "POST",
            Method::Put => "PUT",
            Method::Delete => "DELETE",
            Method::Unknown(s) => s.as_str(),
        }
    }

    pub fn is_allowed(&self, allowed_methods: &[String]) -> bool {
        allowed_methods.iter().any(|m| m == self.as_str())
    }
}

impl Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, PartialEq, Clone, Copy)]
pub enum ParsingState {
    RequestLine,
    Headers,
    Body,
    Complete,
    Error,
}

const CRLF_LEN: usize = 2;

#[derive(Debug, Clone, PartialEq)]
pub enum ParseError {
    IncompleteRequestLine,
    MalformedRequestLine,
    InvalidUtf8,
    HeaderTooLarge,
    ChunkedNotSupported,
    PayloadTooLarge,
    UnsupportedVersion,
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParseError::IncompleteRequestLine => write!(f, "incomplete request"),
            ParseError::MalformedRequestLine => write!(f, "malformed request line"),
            ParseError::InvalidUtf8 => write!(f, "invalid utf-8 in request"),
            ParseError::HeaderTooLarge => write!(f, "request header fields too large"),
            ParseError::ChunkedNotSupported => write!(f, "chunked transfer encoding is not supported"),
            ParseError::PayloadTooLarge => write!(f, "payload too large"),
            ParseError::UnsupportedVersion => write!(f, "unsupported http version"),
        }
    }
}

impl std::error::Error for ParseError {}

impl ParseError {
    /// The status code this parse failure should be reported to the client as.
    pub fn status_code(&self) -> u16 {
        match self {
            ParseError::HeaderTooLarge => HTTP_REQUEST_HEADER_FIELDS_TOO_LARGE,
            ParseError::ChunkedNotSupported => HTTP_NOT_IMPLEMENTED,
            ParseError::PayloadTooLarge => HTTP_PAYLOAD_TOO_LARGE,
            ParseError::UnsupportedVersion => HTTP_VERSION_NOT_SUPPORTED,
            ParseError::IncompleteRequestLine | ParseError::MalformedRequestLine | ParseError::InvalidUtf8 => {
                HTTP_BAD_REQUEST
            }
        }
    }
}

#[derive(Debug)]
pub struct HttpRequest {
    pub method: Method,
    pub url: String,
    pub version: String,
    pub headers: HashMap<String, String>,
    pub body: Vec<u8>,
    pub buffer: Vec<u8>,
    pub cursor: usize,
    pub state: ParsingState,
    pub error: Option<ParseError>,
    content_length: usize,
}

impl Default for HttpRequest {
    fn default() -> Self {
        Self::new()
    }
}

impl HttpRequest {
    pub fn new() -> Self {
        HttpRequest {
            method: Method::Get,
            url: String::new(),
            version: String::new(),
            headers: HashMap::new(),
            body: Vec::new(),
            buffer: Vec::with_capacity(4096),
            cursor: 0,
            state: ParsingState::RequestLine,
            error: None,
            content_length: 0,
        }
    }

    pub fn path(&self) -> &str {
        self.url.split('?').next().unwrap_or(&self.url)
    }

    pub fn query(&self) -> &str {
        self.url.splitn(2, '?').nth(1).unwrap_or("")
    }

    /// Drives the state machine as far as the currently buffered bytes allow.
    /// Returns once the request is `Complete`, hits a fatal `Error`, or there
    /// simply isn't enough data yet (still `RequestLine`/`Headers`/`Body`).
    pub fn advance(&mut self, max_body_size: usize) -> core::result::Result<(), ParseError> {
        loop {
            let res = match self.state {
                ParsingState::RequestLine => self.parse_request_line(),
                ParsingState::Headers => self.parse_headers(max_body_size),
                ParsingState::Body => self.parse_body(),
                ParsingState::Complete | ParsingState::Error => return Ok(()),
            };

            match res {
                Ok(()) => {
                    if self.state == ParsingState::Complete {
                        return Ok(());
                    }
                }
                Err(ParseError::IncompleteRequestLine) => return Ok(()),
                Err(e) => {
                    self.state = ParsingState::Error;
                    self.error = Some(e.clone());
                    return Err(e);
                }
            }
        }
    }

    fn parse_request_line(&mut self) -> core::result::Result<(), ParseError> {
        let Some(line_end) = find_crlf(&self.buffer, self.cursor) else {
            if self.buffer.len() - self.cursor > MAX_HEADER_BYTES {
                return Err(ParseError::HeaderTooLarge);
            }
            return Err(ParseError::IncompleteRequestLine);
        };

        let line_bytes = &self.buffer[self.cursor..line_end];
        let line = std::str::from_utf8(line_bytes).map_err(|_| ParseError::InvalidUtf8)?;

        let parts: Vec<&str> = line.split_whitespace().collect();
        if parts.len() != 3 {
            return Err(ParseError::MalformedRequestLine);
        }

        if parts[2] != "HTTP/1.1" && parts[2] != "HTTP/1.0" {
            return Err(ParseError::UnsupportedVersion);
        }

        self.method = Method::parse(parts[0]);
        self.url = parts[1].to_string();
        self.version = parts[2].to_string();
        self.cursor = line_end + CRLF_LEN;
        self.state = ParsingState::Headers;
        Ok(())
    }

    fn extract_header_line(&mut self) -> core::result::Result<Option<(String, String)>, ParseError> {
        let Some(line_end) = find_crlf(&self.buffer, self.cursor) else {
            return Err(ParseError::IncompleteRequestLine);
        };

        let line_bytes = &self.buffer[self.cursor..line_end];
        if line_bytes.is_empty() {
            self.cursor = line_end + CRLF_LEN;
            return Ok(None);
        }

        let line = std::str::from_utf8(line_bytes).map_err(|_| ParseError::InvalidUtf8)?;
        self.cursor = line_end + CRLF_LEN;

        match line.find(':') {
            Some(sep) => {
                let key = line[..sep].trim().to_ascii_lowercase();
                let val = line[sep + 1..].trim().to_string();
                Ok(Some((key, val)))
            }
            None => Err(ParseError::MalformedRequestLine),
        }
    }

    fn parse_headers(&mut self, max_body_size: usize) -> core::result::Result<(), ParseError> {
        loop {
            if self.buffer.len() > MAX_HEADER_BYTES {
                return Err(ParseError::HeaderTooLarge);
            }

            match self.extract_header_line()? {
                Some((k, v)) => {
                    self.headers.insert(k, v);
                }
                None => return self.finish_headers(max_body_size),
            }
        }
    }

    fn finish_headers(&mut self, max_body_size: usize) -> core::result::Result<(), ParseError> {
        if self
            .headers
            .get("transfer-encoding")
            .map(|v| v.to_ascii_lowercase().contains("chunked"))
            .unwrap_or(false)
        {
            return Err(ParseError::ChunkedNotSupported);
        }

        let content_length = self
            .headers
            .get("content-length")
            .and_then(|s| s.trim().parse::<usize>().ok())
            .unwrap_or(0);

        if content_length > max_body_size {
            return Err(ParseError::PayloadTooLarge);
        }

        self.buffer.drain(..self.cursor);
        self.cursor = 0;
        self.content_length = content_length;

        if content_length == 0 {
            self.state = ParsingState::Complete;
        } else {
            self.state = ParsingState::Body;
        }
        Ok(())
    }

    fn parse_body(&mut self) -> core::result::Result<(), ParseError> {
        let available = self.buffer.len() - self.cursor;
        if available < self.content_length {
            return Err(ParseError::IncompleteRequestLine);
        }

        self.body = self.buffer[self.cursor..self.cursor + self.content_length].to_vec();
        self.cursor += self.content_length;
        self.buffer.drain(..self.cursor);
        self.cursor = 0;
        self.state = ParsingState::Complete;
        Ok(())
    }
}

pub fn find_crlf(buffer: &[u8], start_offset: usize) -> Option<usize> {
    let search_area = buffer.get(start_offset..)?;

    let mut current_pos = 0;
    while let Some(r_pos) = search_area[current_pos..].iter().position(|&b| b == b'\r') {
        let abs_r_pos = current_pos + r_pos;
        if search_area.get(abs_r_pos + 1) == Some(&b'\n') {
            return Some(start_offset + abs_r_pos);
        }
        current_pos = abs_r_pos + 1;
    }
    None
}

pub fn find_subsequence(buffer: &[u8], needle: &[u8], start_offset: usize) -> Option<usize> {
    if needle.is_empty() {
        return None;
    }
    let search_area = buffer.get(start_offset..)?;
    let first_byte = needle[0];
    let mut current_pos = 0;

    while let Some(rel_pos) = search_area[current_pos..].iter().position(|&b| b == first_byte) {
        let abs_pos = current_pos + rel_pos;
        if let Some(candidate) = search_area.get(abs_pos..abs_pos + needle.len()) {
            if candidate == needle {
                return Some(start_offset + abs_pos);
            }
        } else {
            return None;
        }
        current_pos = abs_pos + 1;
    }
    None
}

#[derive(Debug, Default, Clone)]
pub struct PartInfo {
    pub name: String,
    pub filename: Option<String>,
    pub content_type: String,
}

pub fn parse_part_headers(headers: &str) -> PartInfo {
    let mut info = PartInfo::default();

    for line in headers.lines() {
        if line.starts_with("Content-Disposition:") {
            if let Some(n) = line.split(';').find(|s| s.trim().starts_with("name=")) {
                info.name = n.split('=').nth(1).unwrap_or("").trim_matches('"').to_string();
            }
            if let Some(fnm) = line.split(';').find(|s| s.trim().starts_with("filename=")) {
                info.filename = Some(fnm.split('=').nth(1).unwrap_or("").trim_matches('"').to_string());
            }
        } else if line.starts_with("Content-Type:") {
            info.content_type = line.split(':').nth(1).unwrap_or("text/plain").trim().to_string();
        }
    }
    info
}

impl Display for HttpRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{} {} {}", self.method, self.url, self.version)?;
        for (key, value) in &self.headers {
            writeln!(f, "  {}: {}", key, value)?;
        }
        write!(f, "body: {} bytes", self.body.len())
    }
}
