//! Outermost stylesheet step: anchors relative `url()` references.

use serde_json::Value;

use crate::content::Content;
use crate::naming::public_url;
use crate::rules::path;
use crate::transform::{Transform, TransformInput, known_keys, string_option};

/// Rewrites relative `url(...)` references so they resolve from the output
/// root. `public_path` defaults to the pipeline's public path.
///
/// A reference `url(../img/a.png)` in `styles/main.css` with public path
/// `./` becomes `url("./img/a.png")`. Final file names are linked in once
/// resources have been named.
pub struct ExtractTransform;

impl Transform for ExtractTransform {
    fn name(&self) -> &str {
        "extract"
    }

    fn validate_options(&self, options: &Value) -> Result<(), String> {
        known_keys(options, &["public_path"])?;
        string_option(options, "public_path").map(|_| ())
    }

    fn apply(&self, input: TransformInput<'_>) -> anyhow::Result<Content> {
        let public_path = string_option(input.options, "public_path")
            .map_err(anyhow::Error::msg)?
            .unwrap_or(input.public_path);
        let source = input.content.to_text()?;
        let dir = path::parent(input.path);

        let rewritten = rewrite_urls(&source, |reference| {
            if !is_relative(reference) {
                return None;
            }
            let (target, suffix) = split_suffix(reference);
            let joined = if dir.is_empty() {
                path::normalize(target)
            } else {
                path::normalize(&format!("{dir}/{target}"))
            };
            Some(format!("{}{suffix}", public_url(public_path, &joined)))
        });

        Ok(Content::Text(rewritten))
    }
}

fn is_relative(reference: &str) -> bool {
    !(reference.is_empty()
        || reference.starts_with('/')
        || reference.starts_with('#')
        || reference.starts_with("data:")
        || reference.contains("://"))
}

/// Split off a `?query` or `#fragment` tail.
pub(crate) fn split_suffix(reference: &str) -> (&str, &str) {
    match reference.find(['?', '#']) {
        Some(idx) => reference.split_at(idx),
        None => (reference, ""),
    }
}

/// Replace the value of every `url(...)` token for which `replace` returns
/// `Some`. Comments are left untouched; quoting style is preserved.
pub fn rewrite_urls(css: &str, mut replace: impl FnMut(&str) -> Option<String>) -> String {
    let mut out = String::with_capacity(css.len());
    let bytes = css.as_bytes();
    let mut i = 0;

    while i < bytes.len() {
        if css[i..].starts_with("/*") {
            let end = css[i + 2..].find("*/").map_or(css.len(), |e| i + 2 + e + 2);
            out.push_str(&css[i..end]);
            i = end;
            continue;
        }

        if bytes[i].eq_ignore_ascii_case(&b'u')
            && css.get(i..i + 4).is_some_and(|t| t.eq_ignore_ascii_case("url("))
            && !preceded_by_ident(bytes, i)
        {
            if let Some((token_end, value, quote)) = parse_url_token(css, i + 4) {
                match replace(value) {
                    Some(new_value) => {
                        let quote = quote.unwrap_or('"');
                        out.push_str(&css[i..i + 4]);
                        out.push(quote);
                        out.push_str(&new_value);
                        out.push(quote);
                        out.push(')');
                    }
                    None => out.push_str(&css[i..token_end]),
                }
                i = token_end;
                continue;
            }
        }

        let ch = css[i..].chars().next().map_or(1, char::len_utf8);
        out.push_str(&css[i..i + ch]);
        i += ch;
    }

    out
}

fn preceded_by_ident(bytes: &[u8], i: usize) -> bool {
    i > 0 && (bytes[i - 1].is_ascii_alphanumeric() || bytes[i - 1] == b'-' || bytes[i - 1] == b'_')
}

/// Returns the index just past `)`, the trimmed value and its quote.
fn parse_url_token(css: &str, start: usize) -> Option<(usize, &str, Option<char>)> {
    let rest = &css[start..];
    let trimmed = rest.trim_start();
    let offset = start + (rest.len() - trimmed.len());

    let quote = trimmed.chars().next().filter(|c| *c == '"' || *c == '\'');
    match quote {
        Some(q) => {
            let body = &css[offset + 1..];
            let close = body.find(q)?;
            let value = &body[..close];
            let after = &css[offset + 1 + close + 1..];
            let paren = after.find(')')?;
            if !after[..paren].trim().is_empty() {
                return None;
            }
            Some((offset + 1 + close + 1 + paren + 1, value, Some(q)))
        }
        None => {
            let close = trimmed.find(')')?;
            Some((offset + close + 1, trimmed[..close].trim(), None))
        }
    }
}
