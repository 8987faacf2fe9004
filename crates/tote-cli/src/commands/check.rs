//! Check command implementation.
//!
//! Validates configuration and rule coverage without running any transform.

use indexmap::IndexMap;
use tote_bundler::{FsDiscovery, Pipeline, RuleSet, SourceSet};
use tote_config::{ConfigOverrides, validate_fs};

use crate::cli::CheckArgs;
use crate::config::load_project;
use crate::error::{CliError, Result};
use crate::ui;

/// Which rule claims each source.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct Coverage {
    /// Rule name → number of sources it matched, in rule order.
    pub per_rule: IndexMap<String, usize>,
    /// Sources no rule matches, in discovery order.
    pub unmatched: Vec<String>,
}

/// Match every source against `rules`.
pub fn coverage(rules: &RuleSet, sources: &SourceSet) -> Coverage {
    let mut per_rule: IndexMap<String, usize> = rules
        .rules()
        .iter()
        .map(|rule| (rule.name.clone(), 0))
        .collect();
    let mut unmatched = Vec::new();

    for source in sources.files() {
        match rules.match_source(&source.path) {
            Ok(rule) => *per_rule.entry(rule.name.clone()).or_default() += 1,
            Err(_) => unmatched.push(source.path.clone()),
        }
    }

    Coverage {
        per_rule,
        unmatched,
    }
}

/// Execute the check command.
///
/// 1. Load and validate configuration, including entry files on disk
/// 2. Build the pipeline (rules, transforms, plugins)
/// 3. Match every discovered source against the rule set
///
/// # Errors
///
/// Returns [`CliError::UnmatchedSources`] when any source matches no rule.
pub async fn execute(args: CheckArgs) -> Result<()> {
    ui::info("Checking configuration...");

    let project = load_project(&args.project, ConfigOverrides::default())?;
    match &project.config_file {
        Some(path) => ui::info(&format!("Using {}", path.display())),
        None => ui::warning("No tote.toml found, using defaults"),
    }

    validate_fs(&project.config, &project.root)?;
    let pipeline = Pipeline::from_config(&project.config, &project.root)?;
    ui::success(&format!(
        "Configuration is valid: {} rule(s), {} plugin(s)",
        pipeline.rules().len(),
        pipeline.plugins().len()
    ));

    let sources = pipeline.load_sources(&FsDiscovery::new())?;
    let report = coverage(pipeline.rules(), &sources);

    for (rule, count) in &report.per_rule {
        if *count > 0 {
            ui::info(&format!("  {rule}: {count} source(s)"));
        }
    }

    if !report.unmatched.is_empty() {
        for path in &report.unmatched {
            ui::error(&format!("  no rule matches {path}"));
        }
        return Err(CliError::UnmatchedSources {
            count: report.unmatched.len(),
        });
    }

    ui::success(&format!("All {} source(s) are covered", sources.len()));
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tote_bundler::{Matcher, Rule, SourceFile};
    use tote_config::AssetKind;

    #[test]
    fn coverage_counts_first_match_only() {
        let rules = RuleSet::new(vec![
            Rule::new("scripts", Matcher::extensions(["js"]).unwrap(), AssetKind::Script),
            Rule::new("styles", Matcher::extensions(["css"]).unwrap(), AssetKind::Style),
        ])
        .unwrap();
        let sources = SourceSet::from_files(
            "/project/src",
            [
                SourceFile::new("a.js", "a"),
                SourceFile::new("b.js", "b"),
                SourceFile::new("LICENSE", "MIT"),
            ],
        );

        let report = coverage(&rules, &sources);
        assert_eq!(report.per_rule["scripts"], 2);
        assert_eq!(report.per_rule["styles"], 0);
        assert_eq!(report.unmatched, ["LICENSE"]);
    }
}
