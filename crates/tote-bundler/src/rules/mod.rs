//! Rule matching: source path to transform chain.

mod matcher;
pub mod path;

pub use matcher::Matcher;

use tote_config::{AssetKind, RuleOptions};

use crate::error::ConfigurationError;
use crate::transform::{TransformRef, TransformRegistry};

#[derive(Debug, Clone)]
pub struct Rule {
    pub name: String,
    pub test: Matcher,
    pub exclude: Option<Matcher>,
    pub kind: AssetKind,
    /// Declared outer-to-inner.
    pub chain: Vec<TransformRef>,
}

impl Rule {
    pub fn new(name: impl Into<String>, test: Matcher, kind: AssetKind) -> Self {
        Self {
            name: name.into(),
            test,
            exclude: None,
            kind,
            chain: Vec::new(),
        }
    }

    pub fn exclude(mut self, matcher: Matcher) -> Self {
        self.exclude = Some(matcher);
        self
    }

    pub fn chain(mut self, chain: Vec<TransformRef>) -> Self {
        self.chain = chain;
        self
    }

    /// `path` must already be normalized.
    pub fn applies_to(&self, path: &str) -> bool {
        self.test.matches(path) && !self.exclude.as_ref().is_some_and(|ex| ex.matches(path))
    }
}

/// Ordered rules, built once and read-only afterwards.
#[derive(Debug, Clone, Default)]
pub struct RuleSet {
    rules: Vec<Rule>,
}

impl RuleSet {
    pub fn new(rules: Vec<Rule>) -> Result<Self, ConfigurationError> {
        for rule in &rules {
            if rule.name.trim().is_empty() {
                return Err(ConfigurationError::MalformedRule {
                    rule: rule.name.clone(),
                    reason: "rule name is empty".into(),
                });
            }
        }
        Ok(Self { rules })
    }

    /// Compile serialized rules, resolving every chain against `registry`.
    pub fn from_options(
        options: &[RuleOptions],
        registry: &TransformRegistry,
    ) -> Result<Self, ConfigurationError> {
        let mut rules = Vec::with_capacity(options.len());
        for opts in options {
            let test = Matcher::from_pattern(&opts.name, &opts.test)?;
            let exclude = opts
                .exclude
                .as_ref()
                .map(|pattern| Matcher::from_pattern(&opts.name, pattern))
                .transpose()?;
            let chain = opts
                .chain
                .iter()
                .map(|t| registry.resolve(&opts.name, &t.transform, &t.options))
                .collect::<Result<Vec<_>, _>>()?;

            rules.push(Rule {
                name: opts.name.clone(),
                test,
                exclude,
                kind: opts.kind,
                chain,
            });
        }
        Self::new(rules)
    }

    /// First rule, in declaration order, that applies to `source`.
    ///
    /// Later rules are never consulted once one applies.
    pub fn match_source(&self, source: &str) -> Result<&Rule, ConfigurationError> {
        let normalized = path::normalize(source);
        self.rules
            .iter()
            .find(|rule| rule.applies_to(&normalized))
            .ok_or(ConfigurationError::UnmatchedSource { path: normalized })
    }

    pub fn has_catch_all(&self) -> bool {
        self.rules
            .iter()
            .any(|rule| rule.test.is_catch_all() && rule.exclude.is_none())
    }

    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tote_config::{TestPattern, TransformOptions};

    fn rule(name: &str, test: TestPattern, kind: AssetKind) -> RuleOptions {
        RuleOptions::new(name, test, kind).chain([TransformOptions::new("raw")])
    }

    fn exts(list: &[&str]) -> TestPattern {
        TestPattern::Extensions(list.iter().map(|s| s.to_string()).collect())
    }

    fn build(options: &[RuleOptions]) -> RuleSet {
        RuleSet::from_options(options, &TransformRegistry::with_builtins()).unwrap()
    }

    #[test]
    fn first_match_wins_for_overlapping_rules() {
        let rules = build(&[
            rule("images", exts(&["svg", "png"]), AssetKind::Resource),
            rule("fonts", exts(&["woff", "svg"]), AssetKind::Inline),
        ]);
        assert_eq!(rules.match_source("logo.svg").unwrap().name, "images");
        assert_eq!(rules.match_source("a.woff").unwrap().name, "fonts");
    }

    #[test]
    fn matching_is_deterministic() {
        let rules = build(&[
            rule("scripts", exts(&["js"]), AssetKind::Script),
            rule("rest", TestPattern::Any, AssetKind::Resource),
        ]);
        for _ in 0..10 {
            assert_eq!(rules.match_source("./app/main.js").unwrap().name, "scripts");
        }
    }

    #[test]
    fn exclude_defers_to_later_rules() {
        let rules = build(&[
            rule("scripts", exts(&["js"]), AssetKind::Script)
                .exclude(TestPattern::Regex("node_modules/".into())),
            rule("vendor", exts(&["js"]), AssetKind::Resource),
        ]);
        assert_eq!(rules.match_source("index.js").unwrap().name, "scripts");
        assert_eq!(
            rules.match_source("node_modules/lib/index.js").unwrap().name,
            "vendor"
        );
    }

    #[test]
    fn unmatched_source_without_catch_all() {
        let rules = build(&[rule("scripts", exts(&["js"]), AssetKind::Script)]);
        assert!(!rules.has_catch_all());
        let err = rules.match_source("LICENSE").unwrap_err();
        assert!(matches!(err, ConfigurationError::UnmatchedSource { path } if path == "LICENSE"));
    }

    #[test]
    fn catch_all_takes_the_rest() {
        let rules = build(&[
            rule("scripts", exts(&["js"]), AssetKind::Script),
            rule("rest", TestPattern::Any, AssetKind::Resource),
        ]);
        assert!(rules.has_catch_all());
        assert_eq!(rules.match_source("LICENSE").unwrap().name, "rest");
    }

    #[test]
    fn unknown_transform_fails_construction() {
        let options = [RuleOptions::new("scripts", exts(&["js"]), AssetKind::Script)
            .chain([TransformOptions::new("babel-loader")])];
        let err = RuleSet::from_options(&options, &TransformRegistry::with_builtins()).unwrap_err();
        assert!(matches!(err, ConfigurationError::UnknownTransform { .. }));
    }

    #[test]
    fn predicate_rules_are_programmatic() {
        let rules = RuleSet::new(vec![Rule::new(
            "short",
            Matcher::predicate(|p| !p.contains('/')),
            AssetKind::Resource,
        )])
        .unwrap();
        assert!(rules.match_source("top.txt").is_ok());
        assert!(rules.match_source("nested/file.txt").is_err());
    }
}
