//! Pluggable config validation strategies
//!
//! Separates filesystem validation (for CLI use) from schema validation (for library use).

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use path_clean::PathClean;
use regex::Regex;

use crate::config::ToteConfig;
use crate::error::{ConfigError, Result};
use crate::optimization::{MAX_HASH_LENGTH, MIN_HASH_LENGTH};
use crate::rules::TestPattern;

/// Trait for pluggable config validation strategies
pub trait ConfigValidator {
    fn validate(&self, config: &ToteConfig) -> Result<()>;
}

/// Schema-only validation (no filesystem checks)
///
/// # Example
///
/// ```
/// use tote_config::{ConfigValidator, SchemaValidator, ToteConfig};
///
/// let config = ToteConfig::default_project();
/// SchemaValidator.validate(&config).unwrap();
/// ```
pub struct SchemaValidator;

impl ConfigValidator for SchemaValidator {
    fn validate(&self, config: &ToteConfig) -> Result<()> {
        for (name, sources) in &config.entries {
            if !is_valid_entry_name(name) {
                return Err(ConfigError::schema(
                    format!("invalid entry name `{name}`"),
                    "Entry names must be non-empty, relative and free of `..` segments",
                ));
            }
            if sources.paths().is_empty() {
                return Err(ConfigError::schema(
                    format!("entry `{name}` has no sources"),
                    "List at least one source path for every entry",
                ));
            }
        }

        let mut seen = HashSet::new();
        for rule in &config.rules {
            if rule.name.trim().is_empty() {
                return Err(ConfigError::schema(
                    "rule names cannot be empty",
                    "Give every rule a unique `name`",
                ));
            }
            if !seen.insert(rule.name.as_str()) {
                return Err(ConfigError::schema(
                    format!("duplicate rule name `{}`", rule.name),
                    "Rule names must be unique",
                ));
            }
            validate_pattern(&rule.name, &rule.test)?;
            if let Some(exclude) = &rule.exclude {
                validate_pattern(&rule.name, exclude)?;
            }
        }

        for plugin in &config.plugins {
            if plugin.name.trim().is_empty() {
                return Err(ConfigError::schema(
                    "plugin name cannot be empty",
                    "Specify a registered plugin name for each plugin",
                ));
            }
        }

        let hash_length = config.optimization.hash_length;
        if !(MIN_HASH_LENGTH..=MAX_HASH_LENGTH).contains(&hash_length) {
            return Err(ConfigError::schema(
                format!(
                    "hash_length {hash_length} is out of range ({MIN_HASH_LENGTH} to {MAX_HASH_LENGTH})"
                ),
                "Use a hash length between 8 and 64",
            ));
        }

        if !is_valid_output_root(&config.output_root) {
            return Err(ConfigError::schema(
                format!(
                    "output_root `{}` does not name a directory inside the project",
                    config.output_root.display()
                ),
                "Use a subdirectory such as `dist`; the clean plugin empties it before every build",
            ));
        }

        if config.dev.port == 0 {
            return Err(ConfigError::schema(
                "dev port cannot be 0",
                "Pick a free port such as 2020",
            ));
        }

        Ok(())
    }
}

fn validate_pattern(rule: &str, pattern: &TestPattern) -> Result<()> {
    match pattern {
        TestPattern::Any => Ok(()),
        TestPattern::Extensions(list) => {
            if list.is_empty() || list.iter().any(|ext| ext.trim_start_matches('.').is_empty()) {
                return Err(ConfigError::schema(
                    format!("rule `{rule}` has an empty extension"),
                    "List extensions without wildcards, e.g. [\"png\", \"jpg\"]",
                ));
            }
            Ok(())
        }
        TestPattern::Regex(source) => {
            let regex = Regex::new(source).map_err(|err| {
                ConfigError::schema(
                    format!("rule `{rule}` has an invalid regex: {err}"),
                    "Check the pattern syntax",
                )
            })?;
            if regex.is_match("") {
                return Err(ConfigError::schema(
                    format!("rule `{rule}` has a regex that matches the empty string"),
                    "Remove empty alternatives such as `|)` from the pattern",
                ));
            }
            Ok(())
        }
        TestPattern::Prefix(prefix) => {
            if prefix.is_empty() {
                return Err(ConfigError::schema(
                    format!("rule `{rule}` has an empty prefix"),
                    "Use `test = \"any\"` for a catch-all rule",
                ));
            }
            Ok(())
        }
    }
}

/// Entry names end up in output file names.
pub fn is_valid_entry_name(name: &str) -> bool {
    !name.trim().is_empty()
        && !name.starts_with('/')
        && !name.contains('\\')
        && !name.split('/').any(|segment| segment == "..")
}

/// Relative output roots must stay strictly below the project root.
/// Absolute roots are taken as given.
pub fn is_valid_output_root(path: &Path) -> bool {
    if path.is_absolute() {
        return true;
    }
    let cleaned = path.clean();
    cleaned != Path::new(".") && !cleaned.starts_with("..")
}

/// Filesystem validator (for CLI use)
///
/// Validates that the context directory and every entry source exist on disk.
pub struct FsValidator {
    root: PathBuf,
}

impl FsValidator {
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }
}

impl ConfigValidator for FsValidator {
    fn validate(&self, config: &ToteConfig) -> Result<()> {
        SchemaValidator.validate(config)?;

        let context = self.root.join(&config.context);
        if !context.is_dir() {
            return Err(ConfigError::ContextNotFound { path: context });
        }

        for (entry, source) in config.entry_sources() {
            let path = context.join(source);
            if !path.is_file() {
                return Err(ConfigError::EntrySourceNotFound {
                    entry: entry.to_string(),
                    path,
                });
            }
        }

        Ok(())
    }
}

/// Convenience function for schema-only validation
pub fn validate_schema(config: &ToteConfig) -> Result<()> {
    SchemaValidator.validate(config)
}

/// Convenience function for filesystem validation
pub fn validate_fs(config: &ToteConfig, root: impl AsRef<Path>) -> Result<()> {
    FsValidator::new(root).validate(config)
}
