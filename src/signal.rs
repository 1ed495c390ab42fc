//! Shutdown flag and SIGPIPE suppression.
//!
//! The handler stores into an `AtomicBool` with a relaxed store and nothing
//! else — no allocation, no formatting — so it stays signal-safe. The event
//! loop polls the flag between iterations; it never blocks waiting on it.

use std::sync::atomic::{AtomicBool, Ordering};

static SHUTDOWN: AtomicBool = AtomicBool::new(false);

extern "C" fn on_terminate(_signum: libc::c_int) {
    SHUTDOWN.store(true, Ordering::Relaxed);
}

/// Returns `true` once SIGINT or SIGTERM has been observed.
pub fn shutdown_requested() -> bool {
    SHUTDOWN.load(Ordering::Relaxed)
}

/// Installs the SIGINT/SIGTERM handler and ignores SIGPIPE. Must run once
/// at startup, before the event loop's first iteration.
pub fn install() {
    unsafe {
        let mut action: libc::sigaction = std::mem::zeroed();
        action.sa_sigaction = on_terminate as usize;
        libc::sigemptyset(&mut action.sa_mask);
        libc::sigaction(libc::SIGINT, &action, std::ptr::null_mut());
        libc::sigaction(libc::SIGTERM, &action, std::ptr::null_mut());
        libc::signal(libc::SIGPIPE, libc::SIG_IGN);
    }
}
