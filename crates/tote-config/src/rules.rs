//! Rule and entry declarations.
//!
//! These are the serialized forms only. Regexes are compiled and transform
//! names resolved when `tote-bundler` builds its rule table.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// What a matched source becomes once its chain has run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AssetKind {
    Script,
    Style,
    Markup,
    Resource,
    Inline,
}

impl AssetKind {
    /// Output extension used when a chunk of this kind carries no better one.
    pub fn default_extension(self) -> &'static str {
        match self {
            Self::Script => "js",
            Self::Style => "css",
            Self::Markup => "html",
            Self::Resource | Self::Inline => "bin",
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Script => "script",
            Self::Style => "style",
            Self::Markup => "markup",
            Self::Resource => "resource",
            Self::Inline => "inline",
        }
    }
}

impl std::fmt::Display for AssetKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How a rule selects source paths.
///
/// ```toml
/// test = "any"
/// test = { extensions = ["js", "mjs"] }
/// test = { regex = "\\.(png|jpe?g)$" }
/// test = { prefix = "vendor/" }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TestPattern {
    Any,
    Extensions(Vec<String>),
    Regex(String),
    Prefix(String),
}

/// One transform reference inside a rule's `use` list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransformOptions {
    pub transform: String,

    #[serde(default = "empty_object")]
    pub options: Value,
}

impl TransformOptions {
    pub fn new(transform: impl Into<String>) -> Self {
        Self {
            transform: transform.into(),
            options: empty_object(),
        }
    }

    pub fn with_options(mut self, options: Value) -> Self {
        self.options = options;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuleOptions {
    pub name: String,

    pub test: TestPattern,

    #[serde(default)]
    pub exclude: Option<TestPattern>,

    pub kind: AssetKind,

    /// Declared outer-to-inner; the last entry runs first.
    #[serde(default, rename = "use")]
    pub chain: Vec<TransformOptions>,
}

impl RuleOptions {
    pub fn new(name: impl Into<String>, test: TestPattern, kind: AssetKind) -> Self {
        Self {
            name: name.into(),
            test,
            exclude: None,
            kind,
            chain: Vec::new(),
        }
    }

    pub fn exclude(mut self, pattern: TestPattern) -> Self {
        self.exclude = Some(pattern);
        self
    }

    pub fn chain<I>(mut self, transforms: I) -> Self
    where
        I: IntoIterator<Item = TransformOptions>,
    {
        self.chain = transforms.into_iter().collect();
        self
    }
}

/// The sources of one logical entry: a single path or an ordered list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum EntrySources {
    One(String),
    Many(Vec<String>),
}

impl EntrySources {
    pub fn paths(&self) -> Vec<&str> {
        match self {
            Self::One(path) => vec![path.as_str()],
            Self::Many(paths) => paths.iter().map(String::as_str).collect(),
        }
    }
}

impl From<&str> for EntrySources {
    fn from(value: &str) -> Self {
        Self::One(value.to_string())
    }
}

pub(crate) fn empty_object() -> Value {
    Value::Object(serde_json::Map::new())
}
