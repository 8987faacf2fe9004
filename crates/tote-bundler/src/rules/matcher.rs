use std::fmt;
use std::sync::Arc;

use regex::Regex;
use tote_config::TestPattern;

use super::path;
use crate::error::ConfigurationError;

type PredicateFn = dyn Fn(&str) -> bool + Send + Sync;

/// Selects normalized source paths.
#[derive(Clone)]
pub enum Matcher {
    /// Catch-all.
    Any,
    /// Lowercased extensions without the leading dot.
    Extensions(Vec<String>),
    Regex(Regex),
    Prefix(String),
    /// Arbitrary test, only available programmatically.
    Predicate(Arc<PredicateFn>),
}

impl Matcher {
    /// Build from the serialized form, rejecting malformed patterns.
    pub fn from_pattern(rule: &str, pattern: &TestPattern) -> Result<Self, ConfigurationError> {
        let malformed = |reason: String| ConfigurationError::MalformedRule {
            rule: rule.to_string(),
            reason,
        };

        match pattern {
            TestPattern::Any => Ok(Matcher::Any),
            TestPattern::Extensions(list) => Matcher::extensions(list.iter().map(String::as_str))
                .ok_or_else(|| malformed("extension list is empty or has an empty entry".into())),
            TestPattern::Regex(source) => {
                let regex =
                    Regex::new(source).map_err(|err| malformed(format!("invalid regex: {err}")))?;
                if regex.is_match("") {
                    return Err(malformed(format!(
                        "regex `{source}` matches the empty string"
                    )));
                }
                Ok(Matcher::Regex(regex))
            }
            TestPattern::Prefix(prefix) => {
                let directory = prefix.ends_with('/') || prefix.ends_with('\\');
                let mut prefix = path::normalize(prefix);
                if prefix.is_empty() {
                    return Err(malformed("prefix is empty".into()));
                }
                if directory {
                    prefix.push('/');
                }
                Ok(Matcher::Prefix(prefix))
            }
        }
    }

    /// `None` when the list is empty or contains an empty extension.
    pub fn extensions<'a>(list: impl IntoIterator<Item = &'a str>) -> Option<Self> {
        let mut exts = Vec::new();
        for ext in list {
            let ext = ext.trim_start_matches('.').to_ascii_lowercase();
            if ext.is_empty() {
                return None;
            }
            exts.push(ext);
        }
        (!exts.is_empty()).then_some(Matcher::Extensions(exts))
    }

    pub fn predicate<F>(f: F) -> Self
    where
        F: Fn(&str) -> bool + Send + Sync + 'static,
    {
        Matcher::Predicate(Arc::new(f))
    }

    /// `path` must already be normalized.
    pub fn matches(&self, path: &str) -> bool {
        match self {
            Matcher::Any => true,
            Matcher::Extensions(exts) => match path::extension(path) {
                Some(ext) => exts.iter().any(|e| e.eq_ignore_ascii_case(ext)),
                None => false,
            },
            Matcher::Regex(regex) => regex.is_match(path),
            Matcher::Prefix(prefix) => path.starts_with(prefix.as_str()),
            Matcher::Predicate(f) => f(path),
        }
    }

    pub fn is_catch_all(&self) -> bool {
        matches!(self, Matcher::Any)
    }
}

impl fmt::Debug for Matcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Matcher::Any => f.write_str("Any"),
            Matcher::Extensions(exts) => f.debug_tuple("Extensions").field(exts).finish(),
            Matcher::Regex(regex) => f.debug_tuple("Regex").field(&regex.as_str()).finish(),
            Matcher::Prefix(prefix) => f.debug_tuple("Prefix").field(prefix).finish(),
            Matcher::Predicate(_) => f.write_str("Predicate(..)"),
        }
    }
}
