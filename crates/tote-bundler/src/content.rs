//! Asset content and the per-source asset record.

use std::borrow::Cow;

use tote_config::AssetKind;

/// File contents as they move through a chain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Content {
    Text(String),
    Binary(Vec<u8>),
}

impl Content {
    /// Text when the bytes are valid UTF-8, binary otherwise.
    pub fn from_bytes(bytes: Vec<u8>) -> Self {
        match String::from_utf8(bytes) {
            Ok(text) => Content::Text(text),
            Err(err) => Content::Binary(err.into_bytes()),
        }
    }

    pub fn as_bytes(&self) -> &[u8] {
        match self {
            Content::Text(text) => text.as_bytes(),
            Content::Binary(bytes) => bytes,
        }
    }

    pub fn into_bytes(self) -> Vec<u8> {
        match self {
            Content::Text(text) => text.into_bytes(),
            Content::Binary(bytes) => bytes,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Content::Text(text) => Some(text),
            Content::Binary(_) => None,
        }
    }

    /// Text view, decoding binary content when it happens to be UTF-8.
    pub fn to_text(&self) -> anyhow::Result<Cow<'_, str>> {
        match self {
            Content::Text(text) => Ok(Cow::Borrowed(text)),
            Content::Binary(bytes) => std::str::from_utf8(bytes)
                .map(Cow::Borrowed)
                .map_err(|err| anyhow::anyhow!("content is not valid UTF-8: {err}")),
        }
    }

    pub fn is_text(&self) -> bool {
        matches!(self, Content::Text(_))
    }

    pub fn len(&self) -> usize {
        self.as_bytes().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl From<String> for Content {
    fn from(value: String) -> Self {
        Content::Text(value)
    }
}

impl From<&str> for Content {
    fn from(value: &str) -> Self {
        Content::Text(value.to_string())
    }
}

impl From<Vec<u8>> for Content {
    fn from(value: Vec<u8>) -> Self {
        Content::Binary(value)
    }
}

/// One source file and its current transformed state.
///
/// Each transform consumes the asset and yields the next state, so there is
/// never more than one live version of a source's content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Asset {
    /// Normalized path relative to the context directory.
    pub source_path: String,
    pub kind: AssetKind,
    pub content: Content,
}

impl Asset {
    pub fn new(source_path: impl Into<String>, kind: AssetKind, content: Content) -> Self {
        Self {
            source_path: source_path.into(),
            kind,
            content,
        }
    }

    pub fn with_content(self, content: Content) -> Self {
        Self { content, ..self }
    }

    /// Final extension of the source file name, if it has one.
    pub fn source_extension(&self) -> Option<&str> {
        crate::rules::path::extension(&self.source_path)
    }
}
