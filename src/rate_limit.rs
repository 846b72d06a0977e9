// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Per-client fixed-window rate limiting.
//!
//! One window per client key, tracked in process memory. The table is a
//! sharded concurrent map so the check-and-increment for one client never
//! serializes unrelated clients; the shard guard makes the read-modify-write
//! for a single key atomic, so two concurrent requests can never both sneak
//! past the ceiling on a stale count.
//!
//! Scaling limitation: windows live in this process only. Running several
//! gateway replicas multiplies the effective ceiling by the replica count;
//! promoting the table to a shared store is explicitly out of scope here.

use std::net::IpAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::http::HeaderMap;
use dashmap::DashMap;
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// How often idle windows are swept out of the table.
const PURGE_INTERVAL: Duration = Duration::from_secs(60);

/// Window length and ceiling, fixed at startup.
#[derive(Debug, Clone)]
pub struct RateLimitSettings {
    pub max_requests: u32,
    pub window: Duration,
}

impl Default for RateLimitSettings {
    fn default() -> Self {
        RateLimitSettings {
            max_requests: 100,
            window: Duration::from_secs(900),
        }
    }
}

/// A single client's current window.
#[derive(Debug)]
struct RateWindow {
    window_start: Instant,
    count: u32,
}

/// Outcome of an admission check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RateDecision {
    Admitted {
        /// Requests left in the current window
        remaining: u32,
    },
    Rejected {
        /// Remainder of the offending window
        retry_after: Duration,
    },
}

/// Fixed-window counter keyed by client network address.
pub struct RateLimiter {
    settings: RateLimitSettings,
    windows: DashMap<String, RateWindow>,
}

impl RateLimiter {
    pub fn new(settings: RateLimitSettings) -> Self {
        RateLimiter {
            settings,
            windows: DashMap::new(),
        }
    }

    /// Admission check against the wall clock.
    pub fn admit(&self, client_key: &str) -> RateDecision {
        self.admit_at(client_key, Instant::now())
    }

    /// Admission check at an explicit instant.
    ///
    /// The first request from a key, or the first after its window lapsed,
    /// starts a fresh window with count 1. Within a window the count grows
    /// on every call, admitted or not; rejection never extends the window.
    pub fn admit_at(&self, client_key: &str, now: Instant) -> RateDecision {
        // Avoid allocating the key for clients we already track.
        let mut window = match self.windows.get_mut(client_key) {
            Some(window) => window,
            None => self
                .windows
                .entry(client_key.to_string())
                .or_insert_with(|| RateWindow {
                    window_start: now,
                    count: 0,
                }),
        };

        if now.duration_since(window.window_start) >= self.settings.window {
            window.window_start = now;
            window.count = 0;
        }
        window.count = window.count.saturating_add(1);

        if window.count <= self.settings.max_requests {
            RateDecision::Admitted {
                remaining: self.settings.max_requests - window.count,
            }
        } else {
            let elapsed = now.duration_since(window.window_start);
            RateDecision::Rejected {
                retry_after: self.settings.window.saturating_sub(elapsed),
            }
        }
    }

    /// Number of client keys currently tracked.
    pub fn tracked_keys(&self) -> usize {
        self.windows.len()
    }

    /// Drops windows whose start lies a full window length in the past.
    /// They would be reset on the next request anyway; sweeping them keeps
    /// one-time clients from accumulating in the table.
    pub fn purge_expired(&self) -> usize {
        let before = self.windows.len();
        let window = self.settings.window;
        self.windows
            .retain(|_, entry| entry.window_start.elapsed() < window);
        before - self.windows.len()
    }

    /// Periodic sweep, cancelled on shutdown.
    pub async fn run_purge_loop(self: Arc<Self>, shutdown: CancellationToken) {
        let mut interval = tokio::time::interval(PURGE_INTERVAL);
        loop {
            tokio::select! {
                _ = interval.tick() => {
                    let removed = self.purge_expired();
                    if removed > 0 {
                        debug!(removed, "dropped idle rate windows");
                    }
                }
                _ = shutdown.cancelled() => break,
            }
        }
    }
}

/// Derives the limiter key for a request: the first address in
/// `X-Forwarded-For` when it parses (the gateway normally sits behind the
/// edge balancer), otherwise the peer address.
pub fn client_key(headers: &HeaderMap, peer: Option<IpAddr>) -> String {
    forwarded_ip(headers)
        .or(peer)
        .map(|ip| ip.to_string())
        .unwrap_or_else(|| "unknown".to_string())
}

fn forwarded_ip(headers: &HeaderMap) -> Option<IpAddr> {
    headers
        .get("x-forwarded-for")?
        .to_str()
        .ok()?
        .split(',')
        .next()?
        .trim()
        .parse()
        .ok()
}
