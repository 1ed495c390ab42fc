//! One-shot multipart/form-data decoder.
//!
//! The request parser only reaches `Complete` once the whole declared
//! `Content-Length` body has been buffered, so this decoder runs once over
//! the fully assembled body rather than incrementally across socket reads.

use crate::prelude::*;

#[derive(Debug)]
pub enum UploadError {
    MethodNotAllowed,
    PayloadTooLarge,
    MissingBoundary,
    NothingSaved,
}

impl std::fmt::Display for UploadError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            UploadError::MethodNotAllowed => write!(f, "method not allowed"),
            UploadError::PayloadTooLarge => write!(f, "payload too large"),
            UploadError::MissingBoundary => write!(f, "missing multipart boundary"),
            UploadError::NothingSaved => write!(f, "no file part could be saved"),
        }
    }
}

impl std::error::Error for UploadError {}

/// One decoded multipart part that carried a filename.
struct FilePart {
    filename: String,
    data: Vec<u8>,
}

/// Extracts the `boundary=` parameter from a `Content-Type: multipart/form-data; boundary=...` header.
pub fn extract_boundary(content_type: &str) -> Option<String> {
    content_type.split(';').skip(1).find_map(|param| {
        let (key, value) = param.trim().split_once('=')?;
        if key.eq_ignore_ascii_case("boundary") {
            Some(value.trim_matches('"').to_string())
        } else {
            None
        }
    })
}

/// Decomposes `body` around `--boundary` delimiters, keeping only the parts
/// that declared a `filename`.
fn decode_parts(body: &[u8], boundary: &str) -> Vec<FilePart> {
    let delimiter = format!("--{boundary}");
    let delimiter = delimiter.as_bytes();

    let mut parts = Vec::new();
    let mut pos = match find_subsequence(body, delimiter, 0) {
        Some(p) => p + delimiter.len(),
        None => return parts,
    };

    loop {
        if body.get(pos..pos + 2) == Some(b"--") {
            break;
        }
        // skip the CRLF that follows the boundary line
        if body.get(pos..pos + 2) == Some(b"\r\n") {
            pos += 2;
        }

        let header_end = match find_subsequence(body, b"\r\n\r\n", pos) {
            Some(p) => p,
            None => break,
        };
        let headers = String::from_utf8_lossy(&body[pos..header_end]);
        let info = parse_part_headers(&headers);
        let data_start = header_end + 4;

        let next_boundary = match find_subsequence(body, delimiter, data_start) {
            Some(p) => p,
            None => break,
        };
        let mut data_end = next_boundary;
        if data_end >= 2 && &body[data_end - 2..data_end] == b"\r\n" {
            data_end -= 2;
        }

        if let Some(filename) = info.filename {
            parts.push(FilePart { filename, data: body[data_start..data_end].to_vec() });
        }

        pos = next_boundary + delimiter.len();
    }

    parts
}

/// Strips any directory component and replaces every character outside
/// `[A-Za-z0-9._-]` with `_`.
pub fn sanitize_filename(raw: &str) -> String {
    let base = Path::new(raw).file_name().and_then(|n| n.to_str()).unwrap_or("");

    let sanitized: String = base
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '.' || c == '_' || c == '-' { c } else { '_' })
        .collect();

    let trimmed = sanitized.trim_start_matches('.');

    if trimmed.is_empty() || trimmed == "." || trimmed == ".." {
        "uploaded_file".to_string()
    } else {
        trimmed.to_string()
    }
}

/// Runs the full upload procedure over a completed POST request and
/// returns the names of the files actually written.
pub fn save_upload(
    body: &[u8],
    content_type: &str,
    upload_dir: &Path,
) -> std::result::Result<Vec<String>, UploadError> {
    let boundary = extract_boundary(content_type).ok_or(UploadError::MissingBoundary)?;
    if boundary.is_empty() {
        return Err(UploadError::MissingBoundary);
    }

    let parts = decode_parts(body, &boundary);

    if !upload_dir.exists() {
        let _ = fs::create_dir_all(upload_dir);
    }

    let mut saved = Vec::new();
    for part in parts {
        let name = sanitize_filename(&part.filename);
        let path = upload_dir.join(&name);
        if fs::write(&path, &part.data).is_ok() {
            saved.push(name);
        }
    }

    if saved.is_empty() {
        return Err(UploadError::NothingSaved);
    }
    Ok(saved)
}
