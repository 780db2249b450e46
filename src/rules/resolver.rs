//! Request → response resolution.
//!
//! # Responsibilities
//! - Derive the domain from the request host
//! - Fetch the domain's rule file from the store
//! - Return the first matching rule's response, or the default
//!
//! # Design Decisions
//! - "No rule matched" is a normal outcome, never an error
//! - The domain keeps the case the client sent it in

use std::sync::Arc;

use crate::observability::metrics;
use crate::rules::error::ResolveError;
use crate::rules::matcher::RequestView;
use crate::rules::model::ResponseTemplate;
use crate::rules::store::RuleStore;

/// Strip the port from a host. Bracketed IPv6 literals keep their brackets.
pub fn domain_from_host(host: &str) -> &str {
    if host.starts_with('[') {
        return match host.find(']') {
            Some(end) => &host[..=end],
            None => host,
        };
    }
    match host.split_once(':') {
        Some((domain, _port)) => domain,
        None => host,
    }
}

/// Resolves requests to canned responses.
#[derive(Debug, Clone)]
pub struct Resolver {
    store: Arc<RuleStore>,
}

impl Resolver {
    pub fn new(store: Arc<RuleStore>) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &Arc<RuleStore> {
        &self.store
    }

    /// Pick the response for `request`.
    pub fn resolve(&self, request: &RequestView<'_>) -> Result<ResponseTemplate, ResolveError> {
        let domain = domain_from_host(request.host);

        let file = self.store.get_rule_file(domain).map_err(|source| {
            metrics::record_resolution("error");
            ResolveError {
                domain: domain.to_string(),
                source,
            }
        })?;

        match file.find_match(request) {
            Some((index, rule)) => {
                tracing::debug!(
                    domain = %domain,
                    rule = index + 1,
                    method = %rule.rule().method,
                    path = %rule.rule().path,
                    "Rule matched"
                );
                metrics::record_resolution("rule");
                Ok(rule.response().clone())
            }
            None => {
                tracing::debug!(domain = %domain, path = %request.path, "No rule matched, using default response");
                metrics::record_resolution("default");
                Ok(file.default_response().clone())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::error::RuleError;
    use crate::rules::storage::MemoryStorage;

    const EXAMPLE: &str = r#"{
        "rules": [
            {"path": "/ok", "method": "GET", "response": {"status": 200, "body": "fine"}}
        ],
        "default": {"status": 404, "body": "missing"}
    }"#;

    fn resolver_with(files: &[(&str, &str)]) -> (Resolver, Arc<MemoryStorage>) {
        let storage = Arc::new(MemoryStorage::new());
        for (domain, contents) in files {
            storage.insert(*domain, *contents);
        }
        let store = RuleStore::new(storage.clone(), "no rule matched");
        (Resolver::new(Arc::new(store)), storage)
    }

    fn view<'a>(method: &'a str, host: &'a str, path: &'a str) -> RequestView<'a> {
        RequestView { method, host, path }
    }

    #[test]
    fn strips_port_from_host() {
        assert_eq!(domain_from_host("example.com"), "example.com");
        assert_eq!(domain_from_host("example.com:8443"), "example.com");
        assert_eq!(domain_from_host("127.0.0.1:80"), "127.0.0.1");
        assert_eq!(domain_from_host("[::1]:8080"), "[::1]");
        assert_eq!(domain_from_host("[::1]"), "[::1]");
        assert_eq!(domain_from_host("Example.COM:1"), "Example.COM");
    }

    #[test]
    fn example_scenario() {
        let (resolver, _) = resolver_with(&[("example.com", EXAMPLE)]);

        let ok = resolver.resolve(&view("GET", "example.com", "/ok")).unwrap();
        assert_eq!((ok.status, ok.body.as_str()), (200, "fine"));

        let nope = resolver.resolve(&view("GET", "example.com", "/nope")).unwrap();
        assert_eq!((nope.status, nope.body.as_str()), (404, "missing"));

        let post = resolver.resolve(&view("POST", "example.com:8080", "/ok")).unwrap();
        assert_eq!((post.status, post.body.as_str()), (404, "missing"));
    }

    #[test]
    fn default_is_returned_verbatim() {
        let file = r#"{
            "rules": [],
            "default": {"status": 418, "headers": {"X-Teapot": "yes"}, "body": "short and stout"}
        }"#;
        let (resolver, _) = resolver_with(&[("tea.test", file)]);

        let resolved = resolver.resolve(&view("GET", "tea.test", "/")).unwrap();
        assert_eq!(resolved.status, 418);
        assert_eq!(resolved.headers.get("X-Teapot").map(String::as_str), Some("yes"));
        assert_eq!(resolved.body, "short and stout");
        assert_eq!(resolved.file, None);
    }

    #[test]
    fn earlier_rule_wins_when_both_match() {
        let file = r#"{
            "rules": [
                {"path": "^/api/.*$", "response": {"body": "wildcard"}},
                {"path": "/api/users", "method": "GET", "response": {"body": "specific"}}
            ],
            "default": {}
        }"#;
        let (resolver, _) = resolver_with(&[("api.test", file)]);

        let resolved = resolver.resolve(&view("GET", "api.test", "/api/users")).unwrap();
        assert_eq!(resolved.body, "wildcard");
    }

    #[test]
    fn unknown_host_gets_synthesized_default() {
        let (resolver, storage) = resolver_with(&[]);

        let resolved = resolver.resolve(&view("GET", "fresh.test:3000", "/x")).unwrap();
        assert_eq!(resolved.status, 404);
        assert_eq!(resolved.body, "no rule matched");
        assert!(storage.get("fresh.test").is_some());
    }

    #[test]
    fn domain_is_case_sensitive() {
        let (resolver, storage) = resolver_with(&[("example.com", EXAMPLE)]);

        let resolved = resolver.resolve(&view("GET", "EXAMPLE.com", "/ok")).unwrap();
        assert_eq!(resolved.body, "no rule matched");
        assert!(storage.get("EXAMPLE.com").is_some());
    }

    #[test]
    fn broken_rule_file_is_a_resolution_failure() {
        let (resolver, storage) = resolver_with(&[]);
        storage.insert("broken.test", "not json at all");

        let err = resolver.resolve(&view("GET", "broken.test", "/")).unwrap_err();
        assert_eq!(err.domain, "broken.test");
        assert!(matches!(err.source, RuleError::Malformed { .. }));
    }
}
