// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Static routing table.
//!
//! One rule per downstream prefix, loaded once at startup and immutable
//! afterwards. Lookup is longest-prefix: with both `/api/` and `/api/game/`
//! configured, `/api/game/new` belongs to the game rule. Prefixes match on
//! path-segment boundaries, so `/api/game` never claims `/api/gamestats`.

use url::Url;

/// One prefix → downstream mapping.
#[derive(Debug, Clone)]
pub struct RouteRule {
    /// Logical downstream name, used in logs and synthesized errors
    pub service: String,
    /// Path prefix this rule owns, stored without a trailing slash
    pub prefix: String,
    /// Downstream base URL
    pub target: Url,
    /// Replacement for the matched prefix; `None` forwards the path untouched
    pub rewrite: Option<String>,
    /// Whether the pipeline must resolve an identity before dispatch
    pub requires_auth: bool,
}

impl RouteRule {
    pub fn new(
        service: impl Into<String>,
        prefix: impl Into<String>,
        target: Url,
        requires_auth: bool,
    ) -> Self {
        let prefix: String = prefix.into();
        let prefix = if prefix == "/" {
            prefix
        } else {
            prefix.trim_end_matches('/').to_string()
        };
        RouteRule {
            service: service.into(),
            prefix,
            target,
            rewrite: None,
            requires_auth,
        }
    }

    /// Replaces the matched prefix when forwarding; `""` strips it.
    pub fn with_rewrite(mut self, rewrite: impl Into<String>) -> Self {
        self.rewrite = Some(rewrite.into());
        self
    }

    /// Whether this rule owns `path`. Matches the prefix exactly or at a
    /// `/` boundary.
    pub fn matches(&self, path: &str) -> bool {
        if self.prefix == "/" {
            return path.starts_with('/');
        }
        match path.strip_prefix(self.prefix.as_str()) {
            Some(rest) => rest.is_empty() || rest.starts_with('/'),
            None => false,
        }
    }

    /// Path presented to the downstream.
    pub fn rewritten_path(&self, path: &str) -> String {
        let Some(rewrite) = &self.rewrite else {
            return path.to_string();
        };
        let rest = if self.prefix == "/" {
            path
        } else {
            path.strip_prefix(self.prefix.as_str()).unwrap_or(path)
        };
        let rewritten = format!("{rewrite}{rest}");
        if rewritten.is_empty() {
            "/".to_string()
        } else {
            rewritten
        }
    }
}

/// The immutable rule set, shared read-only across request tasks.
#[derive(Debug, Clone)]
pub struct RouteTable {
    rules: Vec<RouteRule>,
}

impl RouteTable {
    pub fn new(rules: Vec<RouteRule>) -> Self {
        RouteTable { rules }
    }

    /// Longest-prefix match; `None` means no downstream owns the path.
    pub fn resolve(&self, path: &str) -> Option<&RouteRule> {
        self.rules
            .iter()
            .filter(|rule| rule.matches(path))
            .max_by_key(|rule| rule.prefix.len())
    }

    /// All configured rules, used by readiness probing.
    pub fn rules(&self) -> &[RouteRule] {
        &self.rules
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn target() -> Url {
        Url::parse("http://127.0.0.1:5001").unwrap()
    }

    fn sample_table() -> RouteTable {
        RouteTable::new(vec![
            RouteRule::new("fallback", "/api/", target(), false),
            RouteRule::new("game", "/api/game/", target(), true),
            RouteRule::new("profile", "/api/profile/", target(), true),
        ])
    }

    #[test]
    fn longest_prefix_wins() {
        let table = sample_table();
        assert_eq!(table.resolve("/api/game/new").unwrap().service, "game");
        assert_eq!(table.resolve("/api/users/42").unwrap().service, "fallback");
        assert_eq!(
            table.resolve("/api/profile/me").unwrap().service,
            "profile"
        );
    }

    #[test]
    fn exact_prefix_path_matches() {
        let table = sample_table();
        assert_eq!(table.resolve("/api/game").unwrap().service, "game");
    }

    #[test]
    fn prefixes_match_on_segment_boundaries() {
        let table = sample_table();
        // Not the game service, even though the strings share a prefix.
        assert_eq!(table.resolve("/api/gamestats").unwrap().service, "fallback");
    }

    #[test]
    fn unmatched_path_resolves_to_none() {
        let table = sample_table();
        assert!(table.resolve("/metrics").is_none());
        assert!(table.resolve("/apifoo").is_none());
    }

    #[test]
    fn rewrite_none_keeps_the_path() {
        let rule = RouteRule::new("game", "/api/game/", target(), true);
        assert_eq!(rule.rewritten_path("/api/game/new"), "/api/game/new");
    }

    #[test]
    fn rewrite_empty_strips_the_prefix() {
        let rule = RouteRule::new("game", "/api/game/", target(), true).with_rewrite("");
        assert_eq!(rule.rewritten_path("/api/game/new"), "/new");
        assert_eq!(rule.rewritten_path("/api/game"), "/");
    }

    #[test]
    fn rewrite_replaces_the_prefix() {
        let rule = RouteRule::new("game", "/api/game/", target(), true).with_rewrite("/internal/game");
        assert_eq!(rule.rewritten_path("/api/game/new"), "/internal/game/new");
    }

    #[test]
    fn auth_requirement_is_carried_per_rule() {
        let table = sample_table();
        assert!(table.resolve("/api/game/new").unwrap().requires_auth);
        assert!(!table.resolve("/api/users/42").unwrap().requires_auth);
    }
}
