// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Reverse-proxy surface: route resolution and downstream dispatch.
//!
//! [`table`] decides which downstream owns a path (longest matching prefix
//! wins), [`forward`] carries the request there and contains downstream
//! failures. Neither layer knows about authentication beyond the
//! `requires_auth` flag a rule carries; the pipeline sequences the two
//! around credential resolution.

pub mod forward;
pub mod table;

pub use forward::ProxyClient;
pub use table::{RouteRule, RouteTable};
