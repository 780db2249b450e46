//! Persisted rule-file shapes.
//!
//! These types mirror the `<domain>.json` files on disk exactly. Anything
//! derived at load time (compiled path matchers) lives in
//! [`crate::rules::matcher`] so it can never leak into serialized output.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Content type of a synthesized default response.
pub const DEFAULT_CONTENT_TYPE: &str = "text/plain; charset=utf-8";

/// Status of a synthesized default response.
pub const DEFAULT_STATUS: u16 = 404;

/// A canned response returned when a rule (or the default) is selected.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct ResponseTemplate {
    /// HTTP status code.
    #[serde(default = "default_status")]
    pub status: u16,

    /// Response headers, names kept exactly as written.
    #[serde(default)]
    pub headers: BTreeMap<String, String>,

    /// Response body, also the fallback when `file` cannot be read.
    #[serde(default)]
    pub body: String,

    /// Local file whose contents replace `body` when set.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file: Option<String>,
}

fn default_status() -> u16 {
    200
}

impl ResponseTemplate {
    /// The file to serve, if one is named. An empty string counts as unset.
    pub fn file_path(&self) -> Option<&str> {
        self.file.as_deref().filter(|f| !f.is_empty())
    }
}

impl Default for ResponseTemplate {
    fn default() -> Self {
        Self {
            status: default_status(),
            headers: BTreeMap::new(),
            body: String::new(),
            file: None,
        }
    }
}

/// A single `(method, path) → response` mapping.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Rule {
    /// Exact request path, or a regex when written as `^...$`.
    #[serde(default)]
    pub path: String,

    /// HTTP method to require. Empty matches every method.
    #[serde(default)]
    pub method: String,

    /// Response returned when this rule matches.
    #[serde(default)]
    pub response: ResponseTemplate,
}

/// All rules for one domain plus the fallback response.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct RuleFile {
    /// Rules in evaluation order. The first match wins.
    #[serde(default)]
    pub rules: Vec<Rule>,

    /// Returned when no rule matches.
    #[serde(default)]
    pub default: ResponseTemplate,
}

impl RuleFile {
    /// Build the rule file written for a domain seen for the first time.
    pub fn with_default_response(body: impl Into<String>) -> Self {
        let mut headers = BTreeMap::new();
        headers.insert("Content-Type".to_string(), DEFAULT_CONTENT_TYPE.to_string());

        Self {
            rules: Vec::new(),
            default: ResponseTemplate {
                status: DEFAULT_STATUS,
                headers,
                body: body.into(),
                file: None,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_rule_file_shape() {
        let file = RuleFile::with_default_response("nothing here");
        assert!(file.rules.is_empty());
        assert_eq!(file.default.status, 404);
        assert_eq!(file.default.body, "nothing here");
        assert_eq!(
            file.default.headers.get("Content-Type").map(String::as_str),
            Some("text/plain; charset=utf-8")
        );
        assert_eq!(file.default.file_path(), None);
    }

    #[test]
    fn missing_fields_take_defaults() {
        let file: RuleFile = serde_json::from_str(
            r#"{"rules": [{"path": "/ok", "response": {"body": "fine"}}]}"#,
        )
        .unwrap();

        assert_eq!(file.rules.len(), 1);
        assert_eq!(file.rules[0].method, "");
        assert_eq!(file.rules[0].response.status, 200);
        assert!(file.rules[0].response.headers.is_empty());
        assert_eq!(file.default, ResponseTemplate::default());
    }

    #[test]
    fn empty_file_field_means_no_file() {
        let template: ResponseTemplate =
            serde_json::from_str(r#"{"status": 200, "body": "x", "file": ""}"#).unwrap();
        assert_eq!(template.file_path(), None);

        let template: ResponseTemplate =
            serde_json::from_str(r#"{"status": 200, "file": "page.html"}"#).unwrap();
        assert_eq!(template.file_path(), Some("page.html"));
    }

    #[test]
    fn json_round_trip_keeps_order_and_templates() {
        let source = r#"{
            "rules": [
                {"path": "^/users/\\d+$", "method": "GET",
                 "response": {"status": 200, "headers": {"X-Trace": "1"}, "body": "user"}},
                {"path": "/login", "method": "POST",
                 "response": {"status": 302, "headers": {"Location": "/home"}, "body": ""}},
                {"path": "/logo", "method": "",
                 "response": {"status": 200, "body": "fallback", "file": "static/logo.png"}}
            ],
            "default": {"status": 404, "headers": {}, "body": "missing"}
        }"#;

        let file: RuleFile = serde_json::from_str(source).unwrap();
        let written = serde_json::to_string_pretty(&file).unwrap();
        let reloaded: RuleFile = serde_json::from_str(&written).unwrap();

        assert_eq!(reloaded, file);
        let paths: Vec<_> = reloaded.rules.iter().map(|r| r.path.as_str()).collect();
        assert_eq!(paths, ["^/users/\\d+$", "/login", "/logo"]);
    }

    #[test]
    fn absent_file_is_not_serialized() {
        let written = serde_json::to_string(&ResponseTemplate::default()).unwrap();
        assert!(!written.contains("\"file\""));
    }
}
