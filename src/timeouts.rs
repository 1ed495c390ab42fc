//! Idle-connection reaping: at the start of every event loop iteration,
//! close connections whose last activity exceeds `IDLE_TIMEOUT`, discarding
//! any pending request or queued response.

use crate::prelude::*;

pub fn close_idle_connections(connections: &mut HashMap<Token, HttpConnection>, poll: &Poll) {
    let now = Instant::now();
    let stale: Vec<Token> =
        connections.iter().filter(|(_, conn)| conn.is_idle_timed_out(now)).map(|(token, _)| *token).collect();

    for token in stale {
        if let Some(mut conn) = connections.remove(&token) {
            warn!("closing idle connection from {}", conn.addr);
            let _ = poll.registry().deregister(&mut conn.stream);
        }
    }
}
