//! The event loop / connection manager: one `mio::Poll` call per iteration
//! drives every listening socket and every accepted connection, with at
//! most one read and one write per connection per iteration.

use crate::prelude::*;
use crate::router;
use crate::signal;
use crate::timeouts;

/// Hands out distinct `mio::Token`s to listeners and connections from one
/// shared counter, so both can be looked up in separate maps without ever
/// colliding inside `Poll`'s registry.
struct TokenAllocator {
    next: usize,
}

impl TokenAllocator {
    fn new() -> Self {
        Self { next: 0 }
    }

    fn next(&mut self) -> Token {
        let token = Token(self.next);
        self.next += 1;
        token
    }
}

pub struct Server {
    poll: Poll,
    listeners: HashMap<Token, (TcpListener, Arc<ServerConfig>)>,
    connections: HashMap<Token, HttpConnection>,
    tokens: TokenAllocator,
}

impl Server {
    /// Binds one listening socket per `listen` port of every configured
    /// server block and registers each with the shared `Poll`.
    pub fn new(config: &AppConfig) -> Result<Self> {
        let poll = Poll::new()?;
        let mut tokens = TokenAllocator::new();
        let mut listeners = HashMap::new();

        for server_config in &config.servers {
            let server_config = Arc::new(server_config.clone());
            for &port in &server_config.ports {
                let addr: SocketAddr = format!("{}:{}", server_config.host, port).parse()?;
                let mut listener = TcpListener::bind(addr)?;
                let token = tokens.next();
                poll.registry().register(&mut listener, token, Interest::READABLE)?;
                info!("listening on {} (server_name='{}')", addr, server_config.server_name);
                listeners.insert(token, (listener, Arc::clone(&server_config)));
            }
        }

        Ok(Self { poll, listeners, connections: HashMap::new(), tokens })
    }

    /// Runs until the signal handler sets the shutdown flag, then tears
    /// down every listener and connection and returns.
    pub fn run(&mut self) -> Result<()> {
        let mut events = Events::with_capacity(1024);

        while !signal::shutdown_requested() {
            if let Err(e) = self.poll.poll(&mut events, Some(POLL_TIMEOUT)) {
                if e.kind() == ErrorKind::Interrupted {
                    continue;
                }
                return Err(e.into());
            }

            timeouts::close_idle_connections(&mut self.connections, &self.poll);

            for event in events.iter() {
                self.handle_event(event);
            }
        }

        self.shutdown();
        Ok(())
    }

    fn handle_event(&mut self, event: &Event) {
        let token = event.token();

        if self.listeners.contains_key(&token) {
            self.accept_one(token);
            return;
        }

        if !self.connections.contains_key(&token) {
            return;
        }

        if event.is_error() || event.is_read_closed() {
            self.close_connection(token);
            return;
        }

        let mut should_close = false;

        if event.is_readable() {
            should_close = self.handle_readable(token);
        }

        if !should_close && event.is_writable() {
            should_close = self.handle_writable(token);
        }

        let fully_drained = self.connections.get(&token).map(|c| c.should_close()).unwrap_or(true);

        if should_close || fully_drained {
            self.close_connection(token);
        } else {
            self.update_interest(token);
        }
    }

    /// Accepts exactly one connection per ready listener — accept is never
    /// retried in a tight loop against one readiness notification.
    fn accept_one(&mut self, token: Token) {
        let accepted = match self.listeners.get(&token) {
            Some((listener, server_config)) => match listener.accept() {
                Ok((stream, addr)) => Some((stream, addr, Arc::clone(server_config))),
                Err(e) if e.kind() == ErrorKind::WouldBlock => None,
                Err(e) => {
                    errors!("accept failed: {e}");
                    None
                }
            },
            None => None,
        };

        let Some((mut stream, addr, server_config)) = accepted else { return };

        let conn_token = self.tokens.next();
        if let Err(e) = self.poll.registry().register(&mut stream, conn_token, Interest::READABLE) {
            errors!("failed to register accepted connection from {addr}: {e}");
            return;
        }

        info!("accepted connection from {addr}");
        self.connections.insert(conn_token, HttpConnection::new(stream, addr, server_config));
    }

    /// Performs exactly one `read()` and, if that completed a request,
    /// routes it and queues the response. Returns whether the connection
    /// should close immediately (peer EOF or a transport error).
    fn handle_readable(&mut self, token: Token) -> bool {
        let Some(conn) = self.connections.get_mut(&token) else { return true };

        let eof = conn.read_once();
        conn.touch();
        if eof {
            return true;
        }

        let max_body_size = conn.server_config.client_max_body_size;
        match conn.request.advance(max_body_size) {
            Ok(()) => {
                if conn.request.state == ParsingState::Complete {
                    let response = router::route(&conn.request, &conn.server_config);
                    conn.write_buffer.extend_from_slice(&response.to_bytes());
                    // Single-request-then-close: there is no keep-alive
                    // path, so the connection is done as soon as this
                    // response is fully queued.
                    conn.closed = true;
                }
            }
            Err(e) => {
                warn!("parse error from {}: {e}", conn.addr);
                let response = handle_error(e.status_code(), Some(&conn.server_config));
                conn.write_buffer.extend_from_slice(&response.to_bytes());
                conn.closed = true;
            }
        }

        false
    }

    /// Performs exactly one `write()` of the pending outbound prefix.
    /// Returns whether a transport failure means the connection must close.
    fn handle_writable(&mut self, token: Token) -> bool {
        let Some(conn) = self.connections.get_mut(&token) else { return true };
        if conn.write_buffer.is_empty() {
            return false;
        }
        conn.write_once()
    }

    /// Recomputes readiness interest for one connection: always readable
    /// until closed, writable only while bytes remain queued.
    fn update_interest(&mut self, token: Token) {
        let Some(conn) = self.connections.get_mut(&token) else { return };

        let interest = if conn.write_buffer.is_empty() {
            Interest::READABLE
        } else {
            Interest::READABLE | Interest::WRITABLE
        };

        if let Err(e) = self.poll.registry().reregister(&mut conn.stream, token, interest) {
            errors!("failed to reregister connection from {}: {e}", conn.addr);
        }
    }

    fn close_connection(&mut self, token: Token) {
        if let Some(mut conn) = self.connections.remove(&token) {
            let _ = self.poll.registry().deregister(&mut conn.stream);
        }
    }

    fn shutdown(&mut self) {
        for (_, mut conn) in self.connections.drain() {
            let _ = self.poll.registry().deregister(&mut conn.stream);
        }
        for (_, (mut listener, _)) in self.listeners.drain() {
            let _ = self.poll.registry().deregister(&mut listener);
        }
        info!("all listeners and connections torn down, exiting");
    }
}
