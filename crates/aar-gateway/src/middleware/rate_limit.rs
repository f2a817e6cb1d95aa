//! Per-client fixed-window rate limiting: one counter per client key,
//! reset once the window elapses.

use std::time::{Duration, Instant};

use dashmap::DashMap;

struct Window {
    count: u32,
    started_at: Instant,
}

/// Fixed-window limiter: `max_requests` per `window` per client key. Not
/// sliding — a burst at the window boundary can admit up to `2 * max`
/// requests in quick succession, which is an acceptable tradeoff for the
/// simplicity of a single counter per client.
pub struct RateLimiter {
    windows: DashMap<String, Window>,
    max_requests: u32,
    window: Duration,
}

impl RateLimiter {
    pub fn new(max_requests: u32, window: Duration) -> Self {
        Self { windows: DashMap::new(), max_requests, window }
    }

    /// Returns `true` if the request should be admitted, recording it
    /// against the client's current window as a side effect.
    pub fn check(&self, client_key: &str) -> bool {
        let now = Instant::now();
        let mut entry = self.windows.entry(client_key.to_string()).or_insert_with(|| Window { count: 0, started_at: now });

        if now.duration_since(entry.started_at) >= self.window {
            entry.count = 0;
            entry.started_at = now;
        }

        if entry.count >= self.max_requests {
            return false;
        }
        entry.count += 1;
        true
    }

    /// Drops windows that have been idle for at least one full window
    /// duration. Call periodically from a background task; the map would
    /// otherwise grow by one entry per distinct client key forever.
    pub fn gc(&self) {
        let now = Instant::now();
        self.windows.retain(|_, w| now.duration_since(w.started_at) < self.window);
    }
}
