//! Request matching against compiled rules.
//!
//! # Responsibilities
//! - Classify a rule path as exact or regex
//! - Compile regex paths once, when a rule file is loaded
//! - Match a request's method and path against a rule
//!
//! # Design Decisions
//! - A path is a regex only when it starts with `^` and ends with `$`
//! - Exact paths use full-string equality, no prefix semantics
//! - Method and path matching are both case-sensitive
//! - One bad pattern rejects the whole file; rule sets are never partial

use regex::Regex;

use crate::rules::error::RuleError;
use crate::rules::model::{ResponseTemplate, Rule, RuleFile};

/// The parts of an inbound request the rule engine looks at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RequestView<'a> {
    /// Request method, e.g. `GET`.
    pub method: &'a str,
    /// Host with optional port, as sent by the client.
    pub host: &'a str,
    /// URL path without the query string.
    pub path: &'a str,
}

/// Compiled form of a rule's `path`.
#[derive(Debug, Clone)]
pub enum PathMatcher {
    Exact(String),
    Regex(Regex),
}

impl PathMatcher {
    /// Compile a rule path.
    pub fn compile(path: &str) -> Result<Self, regex::Error> {
        if is_regex_pattern(path) {
            Ok(Self::Regex(Regex::new(path)?))
        } else {
            Ok(Self::Exact(path.to_string()))
        }
    }

    pub fn matches(&self, path: &str) -> bool {
        match self {
            PathMatcher::Exact(p) => p == path,
            PathMatcher::Regex(r) => r.is_match(path),
        }
    }
}

/// Whether a rule path is written as an anchored regex.
pub fn is_regex_pattern(path: &str) -> bool {
    !path.is_empty() && path.starts_with('^') && path.ends_with('$')
}

/// A rule together with its compiled path matcher.
#[derive(Debug, Clone)]
pub struct CompiledRule {
    rule: Rule,
    path_matcher: PathMatcher,
}

impl CompiledRule {
    pub fn compile(rule: Rule) -> Result<Self, regex::Error> {
        let path_matcher = PathMatcher::compile(&rule.path)?;
        Ok(Self { rule, path_matcher })
    }

    /// Returns true if the request satisfies both method and path.
    pub fn matches(&self, request: &RequestView<'_>) -> bool {
        if !self.rule.method.is_empty() && self.rule.method != request.method {
            return false;
        }
        self.path_matcher.matches(request.path)
    }

    pub fn rule(&self) -> &Rule {
        &self.rule
    }

    pub fn response(&self) -> &ResponseTemplate {
        &self.rule.response
    }

    pub fn path_matcher(&self) -> &PathMatcher {
        &self.path_matcher
    }
}

/// A rule file whose rules have all been compiled.
#[derive(Debug, Clone)]
pub struct CompiledRuleFile {
    rules: Vec<CompiledRule>,
    default: ResponseTemplate,
}

impl CompiledRuleFile {
    /// Compile every rule of `file`. `location` names the source in errors.
    pub fn compile(file: RuleFile, location: &str) -> Result<Self, RuleError> {
        let rules = file
            .rules
            .into_iter()
            .map(|rule| {
                let pattern = rule.path.clone();
                CompiledRule::compile(rule).map_err(|source| RuleError::InvalidPattern {
                    location: location.to_string(),
                    pattern,
                    source,
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            rules,
            default: file.default,
        })
    }

    /// Index and rule of the first match, in stored order.
    pub fn find_match(&self, request: &RequestView<'_>) -> Option<(usize, &CompiledRule)> {
        self.rules
            .iter()
            .enumerate()
            .find(|(_, rule)| rule.matches(request))
    }

    pub fn rules(&self) -> &[CompiledRule] {
        &self.rules
    }

    pub fn default_response(&self) -> &ResponseTemplate {
        &self.default
    }

    /// Back to the persisted shape, dropping compiled matchers.
    pub fn to_rule_file(&self) -> RuleFile {
        RuleFile {
            rules: self.rules.iter().map(|r| r.rule.clone()).collect(),
            default: self.default.clone(),
        }
    }
}
