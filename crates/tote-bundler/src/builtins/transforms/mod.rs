//! Transforms registered by [`TransformRegistry::with_builtins`].
//!
//! [`TransformRegistry::with_builtins`]: crate::transform::TransformRegistry::with_builtins

mod csv;
mod css;
pub(crate) mod extract;
mod inline;
mod json;
pub(crate) mod markup;
mod preprocess;
mod raw;
pub(crate) mod script;
mod xml;

use std::sync::Arc;

use crate::transform::Transform;

pub use csv::CsvTransform;
pub use css::CssTransform;
pub use extract::{ExtractTransform, rewrite_urls};
pub use inline::{InlineTransform, data_url, mime_type};
pub use json::JsonTransform;
pub use markup::{MarkupTransform, collapse_whitespace};
pub use preprocess::{LessTransform, SassTransform};
pub use raw::RawTransform;
pub use script::ScriptTransform;
pub use xml::XmlTransform;

pub fn all() -> Vec<Arc<dyn Transform>> {
    vec![
        Arc::new(RawTransform),
        Arc::new(ScriptTransform),
        Arc::new(CssTransform),
        Arc::new(SassTransform),
        Arc::new(LessTransform),
        Arc::new(ExtractTransform),
        Arc::new(MarkupTransform),
        Arc::new(InlineTransform),
        Arc::new(JsonTransform),
        Arc::new(CsvTransform),
        Arc::new(XmlTransform),
    ]
}
