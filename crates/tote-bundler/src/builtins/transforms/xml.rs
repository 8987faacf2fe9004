use serde_json::Value;

use crate::content::Content;
use crate::transform::{Transform, TransformInput, known_keys};

/// Checks XML well-formedness and passes the document through.
pub struct XmlTransform;

impl Transform for XmlTransform {
    fn name(&self) -> &str {
        "xml"
    }

    fn validate_options(&self, options: &Value) -> Result<(), String> {
        known_keys(options, &[])
    }

    fn apply(&self, input: TransformInput<'_>) -> anyhow::Result<Content> {
        let source = input.content.to_text()?;
        check_well_formed(&source)?;
        Ok(Content::Text(source.into_owned()))
    }
}

/// Balanced tags and a single root element. Declarations, processing
/// instructions, comments and CDATA sections are skipped.
fn check_well_formed(xml: &str) -> anyhow::Result<()> {
    let mut stack: Vec<&str> = Vec::new();
    let mut roots = 0;
    let mut rest = xml.trim_start_matches('\u{feff}');

    while let Some(open) = rest.find('<') {
        let text = &rest[..open];
        if stack.is_empty() && !text.trim().is_empty() {
            anyhow::bail!("text outside the root element: {:?}", text.trim());
        }
        rest = &rest[open..];

        let skip = [("<?", "?>"), ("<!--", "-->"), ("<![CDATA[", "]]>"), ("<!", ">")]
            .into_iter()
            .find(|(start, _)| rest.starts_with(start));
        if let Some((start, end)) = skip {
            let close = rest[start.len()..]
                .find(end)
                .ok_or_else(|| anyhow::anyhow!("unterminated `{start}`"))?;
            rest = &rest[start.len() + close + end.len()..];
            continue;
        }

        let end = super::markup::tag_end(rest);
        let tag = &rest[..end];
        if !tag.ends_with('>') {
            anyhow::bail!("unterminated tag `{}`", tag.chars().take(40).collect::<String>());
        }
        rest = &rest[end..];

        let closing = tag.starts_with("</");
        let name_start = if closing { 2 } else { 1 };
        let name = tag[name_start..]
            .split(|c: char| c.is_whitespace() || c == '/' || c == '>')
            .next()
            .unwrap_or_default();
        if name.is_empty() {
            anyhow::bail!("tag without a name");
        }

        if closing {
            match stack.pop() {
                Some(open) if open == name => {}
                Some(open) => anyhow::bail!("`</{name}>` closes `<{open}>`"),
                None => anyhow::bail!("unexpected `</{name}>`"),
            }
        } else {
            if stack.is_empty() {
                roots += 1;
                if roots > 1 {
                    anyhow::bail!("more than one root element");
                }
            }
            if !tag.ends_with("/>") {
                stack.push(name);
            }
        }
    }

    if !rest.trim().is_empty() && stack.is_empty() {
        anyhow::bail!("text outside the root element: {:?}", rest.trim());
    }
    if let Some(open) = stack.pop() {
        anyhow::bail!("`<{open}>` is never closed");
    }
    if roots == 0 {
        anyhow::bail!("document has no root element");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_well_formed_documents() {
        let xml = r#"<?xml version="1.0"?>
<!DOCTYPE note>
<!-- feed -->
<note id="1"><to a="x > y">Tove</to><empty/><![CDATA[<raw>]]></note>
"#;
        assert!(check_well_formed(xml).is_ok());
    }

    #[test]
    fn rejects_mismatched_tags() {
        let err = check_well_formed("<a><b></a></b>").unwrap_err();
        assert!(err.to_string().contains("closes"));
    }

    #[test]
    fn rejects_unclosed_and_multiple_roots() {
        assert!(check_well_formed("<a><b></b>").is_err());
        assert!(check_well_formed("<a/><b/>").is_err());
        assert!(check_well_formed("").is_err());
    }
}
