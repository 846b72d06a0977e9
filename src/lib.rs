// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Relational Gateway - Authentication and Routing Edge Service
//!
//! This crate is the single entry point in front of the platform's
//! microservices: it classifies and verifies bearer credentials, derives a
//! canonical identity from heterogeneous token payloads, rate-limits
//! clients, and reverse-proxies requests to the owning downstream by
//! longest path prefix.
//!
//! ## Modules
//!
//! - `api` - Gateway-owned HTTP endpoints (health, docs)
//! - `auth` - Credential classification and claim resolution
//! - `pipeline` - Per-request processing chain for proxied traffic
//! - `proxy` - Routing table and downstream dispatch
//! - `rate_limit` - Fixed-window per-client admission

pub mod api;
pub mod auth;
pub mod config;
pub mod error;
pub mod pipeline;
pub mod proxy;
pub mod rate_limit;
pub mod state;
