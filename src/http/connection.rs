use crate::prelude::*;

#[derive(Debug)]
pub struct HttpConnection {
    pub stream: TcpStream,
    pub addr: SocketAddr,
    pub server_config: Arc<ServerConfig>,
    pub request: HttpRequest,
    pub write_buffer: Vec<u8>,
    pub closed: bool,
    pub last_activity: Instant,
}

impl HttpConnection {
    pub fn new(stream: TcpStream, addr: SocketAddr, server_config: Arc<ServerConfig>) -> Self {
        Self {
            stream,
            addr,
            server_config,
            request: HttpRequest::new(),
            write_buffer: Vec::new(),
            closed: false,
            last_activity: Instant::now(),
        }
    }

    pub fn touch(&mut self) {
        self.last_activity = Instant::now();
    }

    pub fn is_idle_timed_out(&self, now: Instant) -> bool {
        now.duration_since(self.last_activity) > IDLE_TIMEOUT
    }

    /// Single-request-then-close: once the response has been fully written,
    /// the connection is done, full stop — there is no "reset and await the
    /// next request" path on the same socket.
    pub fn should_close(&self) -> bool {
        self.closed && self.write_buffer.is_empty()
    }

    /// Reads at most one `READ_BUF_SIZE` chunk per call, per the event
    /// loop's at-most-one-read-per-ready-connection-per-iteration invariant.
    /// Returns `true` if the peer has closed the connection (EOF).
    pub fn read_once(&mut self) -> bool {
        let mut buf = [0u8; READ_BUF_SIZE];
        match self.stream.read(&mut buf) {
            Ok(0) => true,
            Ok(n) => {
                self.request.buffer.extend_from_slice(&buf[..n]);
                false
            }
            Err(e) if e.kind() == ErrorKind::WouldBlock => false,
            Err(_) => true,
        }
    }

    /// Writes at most one chunk of the outbound buffer. Returns `true` if
    /// the socket should be considered failed (and the connection closed).
    pub fn write_once(&mut self) -> bool {
        match self.stream.write(&self.write_buffer) {
            Ok(n) => {
                self.write_buffer.drain(..n);
                false
            }
            Err(e) if e.kind() == ErrorKind::WouldBlock => false,
            Err(_) => true,
        }
    }
}
