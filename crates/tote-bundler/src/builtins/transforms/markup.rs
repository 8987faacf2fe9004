use serde_json::Value;

use crate::content::Content;
use crate::transform::{Transform, TransformInput, bool_option, known_keys};

/// Markup passthrough, optionally collapsing whitespace.
pub struct MarkupTransform;

impl Transform for MarkupTransform {
    fn name(&self) -> &str {
        "markup"
    }

    fn validate_options(&self, options: &Value) -> Result<(), String> {
        known_keys(options, &["collapse_whitespace"])?;
        bool_option(options, "collapse_whitespace").map(|_| ())
    }

    fn apply(&self, input: TransformInput<'_>) -> anyhow::Result<Content> {
        let collapse = bool_option(input.options, "collapse_whitespace")
            .map_err(anyhow::Error::msg)?
            .unwrap_or(false);
        if !collapse {
            return Ok(input.content);
        }
        let source = input.content.to_text()?;
        Ok(Content::Text(collapse_whitespace(&source)))
    }
}

/// Elements whose content is copied verbatim.
pub(crate) const RAW_TEXT_ELEMENTS: [&str; 4] = ["script", "style", "pre", "textarea"];

/// Drops whitespace-only text between tags and squeezes other whitespace
/// runs to one space. Comments and raw-text elements are left alone.
pub fn collapse_whitespace(html: &str) -> String {
    let mut out = String::with_capacity(html.len());
    let mut rest = html;

    while !rest.is_empty() {
        if rest.starts_with("<!--") {
            let end = rest.find("-->").map_or(rest.len(), |e| e + 3);
            out.push_str(&rest[..end]);
            rest = &rest[end..];
            continue;
        }

        if rest.starts_with('<') {
            let tag_end = tag_end(rest);
            let tag = &rest[..tag_end];
            out.push_str(tag);
            rest = &rest[tag_end..];

            if let Some(name) = raw_text_open(tag) {
                let close = find_closing(rest, name);
                out.push_str(&rest[..close]);
                rest = &rest[close..];
            }
            continue;
        }

        let text_end = rest.find('<').unwrap_or(rest.len());
        let text = &rest[..text_end];
        if !text.trim().is_empty() {
            squeeze_into(&mut out, text);
        }
        rest = &rest[text_end..];
    }

    out
}

fn squeeze_into(out: &mut String, text: &str) {
    let mut in_space = false;
    for c in text.chars() {
        if c.is_whitespace() {
            if !in_space {
                out.push(' ');
                in_space = true;
            }
        } else {
            out.push(c);
            in_space = false;
        }
    }
}

/// Length of the tag at the start of `s`, quotes respected.
pub(crate) fn tag_end(s: &str) -> usize {
    let mut quote = None;
    for (idx, c) in s.char_indices().skip(1) {
        match (quote, c) {
            (Some(q), c) if c == q => quote = None,
            (Some(_), _) => {}
            (None, '"' | '\'') => quote = Some(c),
            (None, '>') => return idx + 1,
            _ => {}
        }
    }
    s.len()
}

/// Name of the raw-text element opened by `tag`, if any.
pub(crate) fn raw_text_open(tag: &str) -> Option<&'static str> {
    if tag.starts_with("</") || tag.ends_with("/>") {
        return None;
    }
    let name: String = tag[1..]
        .chars()
        .take_while(|c| c.is_ascii_alphanumeric())
        .collect::<String>()
        .to_ascii_lowercase();
    RAW_TEXT_ELEMENTS.into_iter().find(|raw| *raw == name)
}

/// Offset of `</name` in `s`, case-insensitive, or the end of `s`.
pub(crate) fn find_closing(s: &str, name: &str) -> usize {
    let needle = format!("</{name}");
    let lower = s.to_ascii_lowercase();
    lower.find(&needle).unwrap_or(s.len())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn drops_inter_tag_whitespace() {
        let html = "<ul>\n  <li>one</li>\n  <li>two   words</li>\n</ul>\n";
        assert_eq!(
            collapse_whitespace(html),
            "<ul><li>one</li><li>two words</li></ul>"
        );
    }

    #[test]
    fn keeps_raw_text_elements() {
        let html = "<pre>\n  a\n   b</pre>\n<script>\n if (a  <  b) {}\n</script>";
        assert_eq!(
            collapse_whitespace(html),
            "<pre>\n  a\n   b</pre><script>\n if (a  <  b) {}\n</script>"
        );
    }

    #[test]
    fn quoted_attributes_may_contain_angle_brackets() {
        let html = "<a title=\"x > y\">  link  </a>";
        assert_eq!(collapse_whitespace(html), "<a title=\"x > y\"> link </a>");
    }
}
