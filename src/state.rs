// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use std::sync::Arc;

use crate::auth::ClaimResolver;
use crate::config::GatewayConfig;
use crate::proxy::{ProxyClient, RouteTable};
use crate::rate_limit::RateLimiter;

/// Shared per-process state, cloned into every request task.
///
/// Every field is either an `Arc` or internally reference-counted
/// (`reqwest::Client`), so a clone is a handful of pointer bumps.
#[derive(Clone)]
pub struct AppState {
    pub resolver: Arc<ClaimResolver>,
    pub limiter: Arc<RateLimiter>,
    pub routes: Arc<RouteTable>,
    pub proxy: ProxyClient,
}

impl AppState {
    pub fn new(config: &GatewayConfig) -> Self {
        Self {
            resolver: Arc::new(ClaimResolver::new(&config.auth)),
            limiter: Arc::new(RateLimiter::new(config.rate_limit.clone())),
            routes: Arc::new(config.route_table()),
            proxy: ProxyClient::new(config.proxy_timeout),
        }
    }
}
