//! Synchronous CGI bridge.
//!
//! Deliberately *not* a participant in the main event loop's `Poll`: it owns
//! the lifetime of one child process and its two pipes, blocks the calling
//! thread for at most a few seconds, and returns a finished `HttpResponse`.
//! Modeling it this way — rather than as another tracked connection — keeps
//! the event loop's one-read/one-write-per-iteration invariants simple.

use crate::prelude::*;
use mio::unix::SourceFd;
use std::os::fd::{AsRawFd, RawFd};
use std::process::{Child, Command, Stdio};

#[derive(Debug)]
pub enum CgiError {
    ScriptNotFound,
    SpawnFailed(std::io::Error),
    Timeout,
    Io(std::io::Error),
}

impl std::fmt::Display for CgiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CgiError::ScriptNotFound => write!(f, "cgi script not found"),
            CgiError::SpawnFailed(e) => write!(f, "failed to spawn cgi interpreter: {e}"),
            CgiError::Timeout => write!(f, "cgi script timed out"),
            CgiError::Io(e) => write!(f, "cgi i/o error: {e}"),
        }
    }
}

impl std::error::Error for CgiError {}

/// Builds the CGI/1.1 environment for one request.
pub fn build_cgi_env(
    request: &HttpRequest,
    server_config: &ServerConfig,
    script_path: &Path,
    script_name: &str,
    path_info: &str,
) -> HashMap<String, String> {
    let mut env = HashMap::new();

    env.insert("REQUEST_METHOD".to_string(), request.method.to_string());
    env.insert("SCRIPT_FILENAME".to_string(), script_path.display().to_string());
    env.insert("SCRIPT_NAME".to_string(), script_name.to_string());
    env.insert("PATH_INFO".to_string(), path_info.to_string());
    env.insert("QUERY_STRING".to_string(), request.query().to_string());
    env.insert("SERVER_PROTOCOL".to_string(), "HTTP/1.1".to_string());
    env.insert("SERVER_NAME".to_string(), server_config.server_name.clone());
    env.insert(
        "SERVER_PORT".to_string(),
        server_config.ports.first().copied().unwrap_or(0).to_string(),
    );
    env.insert("GATEWAY_INTERFACE".to_string(), "CGI/1.1".to_string());
    env.insert("REDIRECT_STATUS".to_string(), "200".to_string());

    if request.method == Method::Post {
        env.insert("CONTENT_LENGTH".to_string(), request.body.len().to_string());
        let content_type = request
            .headers
            .get("content-type")
            .cloned()
            .unwrap_or_else(|| "application/x-www-form-urlencoded".to_string());
        env.insert("CONTENT_TYPE".to_string(), content_type);
    }

    env
}

/// Runs `interpreter script_path`, feeding it `request`'s body on stdin and
/// reading its stdout back. Never leaves a zombie: every return path kills
/// (if still running) and then blocking-`wait()`s the child, rather than
/// racing a non-blocking reap against a kill.
pub fn execute(
    interpreter: &Path,
    script_path: &Path,
    request: &HttpRequest,
    env: &HashMap<String, String>,
) -> std::result::Result<HttpResponse, CgiError> {
    if !script_path.is_file() {
        return Err(CgiError::ScriptNotFound);
    }

    let script_dir = script_path.parent().unwrap_or_else(|| Path::new("."));

    let mut child = Command::new(interpreter)
        .arg(script_path)
        .current_dir(script_dir)
        .env_clear()
        .envs(env)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .spawn()
        .map_err(CgiError::SpawnFailed)?;

    let result = run_pipes(&mut child, &request.body);
    let _ = child.kill();
    let _ = child.wait();

    match result {
        Ok(output) if output.is_empty() => Ok(handle_error(HTTP_INTERNAL_SERVER_ERROR, None)),
        Ok(output) => Ok(parse_cgi_output(&output)),
        Err(e) => Err(e),
    }
}

fn set_nonblocking(fd: RawFd) -> std::io::Result<()> {
    unsafe {
        let flags = libc::fcntl(fd, libc::F_GETFL, 0);
        if flags < 0 {
            return Err(std::io::Error::last_os_error());
        }
        if libc::fcntl(fd, libc::F_SETFL, flags | libc::O_NONBLOCK) < 0 {
            return Err(std::io::Error::last_os_error());
        }
    }
    Ok(())
}

const STDOUT_TOKEN: Token = Token(0);
const STDIN_TOKEN: Token = Token(1);

/// Writes `body` to the child's stdin and reads its stdout to EOF, over a
/// short-lived `Poll` registered on the two pipe fds. Aborts with
/// `CgiError::Timeout` if 5 seconds elapse without a successful read — the
/// deadline resets on every `stdout` read, not on `stdin` progress, since a
/// slow writer with a quiet script should still time out.
fn run_pipes(child: &mut Child, body: &[u8]) -> std::result::Result<Vec<u8>, CgiError> {
    let mut stdin = child.stdin.take().expect("piped stdin");
    let mut stdout = child.stdout.take().expect("piped stdout");

    set_nonblocking(stdout.as_raw_fd()).map_err(CgiError::Io)?;

    let poll = Poll::new().map_err(CgiError::Io)?;
    let mut events = Events::with_capacity(2);

    poll.registry()
        .register(&mut SourceFd(&stdout.as_raw_fd()), STDOUT_TOKEN, Interest::READABLE)
        .map_err(CgiError::Io)?;

    let mut written = 0usize;
    let mut stdin: Option<std::process::ChildStdin> = if body.is_empty() {
        drop(stdin);
        None
    } else {
        set_nonblocking(stdin.as_raw_fd()).map_err(CgiError::Io)?;
        poll.registry()
            .register(&mut SourceFd(&stdin.as_raw_fd()), STDIN_TOKEN, Interest::WRITABLE)
            .map_err(CgiError::Io)?;
        Some(stdin)
    };

    let mut output = Vec::new();
    let mut read_buf = [0u8; 4096];
    let mut deadline = Instant::now() + CGI_READ_TIMEOUT;

    loop {
        let budget = deadline.saturating_duration_since(Instant::now());
        if budget.is_zero() {
            return Err(CgiError::Timeout);
        }

        poll.poll(&mut events, Some(budget)).map_err(CgiError::Io)?;
        if events.is_empty() {
            return Err(CgiError::Timeout);
        }

        for event in events.iter() {
            match event.token() {
                STDOUT_TOKEN if event.is_readable() => match stdout.read(&mut read_buf) {
                    Ok(0) => return Ok(output),
                    Ok(n) => {
                        output.extend_from_slice(&read_buf[..n]);
                        deadline = Instant::now() + CGI_READ_TIMEOUT;
                    }
                    Err(e) if e.kind() == ErrorKind::WouldBlock => {}
                    Err(e) => return Err(CgiError::Io(e)),
                },
                STDIN_TOKEN if event.is_writable() => {
                    if let Some(pipe) = stdin.as_mut() {
                        match pipe.write(&body[written..]) {
                            Ok(0) => {}
                            Ok(n) => {
                                written += n;
                                if written >= body.len() {
                                    let _ = poll.registry().deregister(&mut SourceFd(&pipe.as_raw_fd()));
                                    stdin = None; // closes the pipe, signaling EOF to the script
                                }
                            }
                            Err(e) if e.kind() == ErrorKind::WouldBlock => {}
                            Err(e) => return Err(CgiError::Io(e)),
                        }
                    }
                }
                _ => {}
            }
        }
    }
}

/// Splits CGI output at the first blank line into headers and body.
fn parse_cgi_output(raw: &[u8]) -> HttpResponse {
    let (header_end, sep_len) = match find_subsequence(raw, b"\r\n\r\n", 0) {
        Some(pos) => (pos, 4),
        None => match find_subsequence(raw, b"\n\n", 0) {
            Some(pos) => (pos, 2),
            None => (raw.len(), 0),
        },
    };

    let header_section = String::from_utf8_lossy(&raw[..header_end]);
    let body = if sep_len == 0 { Vec::new() } else { raw[header_end + sep_len..].to_vec() };

    let mut status = HTTP_OK;
    let mut content_type = "text/html".to_string();
    let mut extra_headers = Vec::new();

    for line in header_section.lines() {
        if let Some((key, value)) = line.split_once(':') {
            let key = key.trim().to_ascii_lowercase();
            let value = value.trim().to_string();
            match key.as_str() {
                "status" => {
                    status = value.split_whitespace().next().and_then(|s| s.parse().ok()).unwrap_or(HTTP_OK);
                }
                "content-type" => content_type = value,
                _ => extra_headers.push((key, value)),
            }
        }
    }

    let mut response = HttpResponse::new(status, HttpResponse::status_text(status));
    response.set_body(body, &content_type);
    for (k, v) in extra_headers {
        response.set_header(&k, &v);
    }
    response
}
