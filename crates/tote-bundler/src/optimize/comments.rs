//! Comment removal for stylesheets and markup.

use crate::builtins::transforms::markup::{find_closing, raw_text_open, tag_end};

/// Remove `/* ... */` comments, `/*! ... */` included. String literals are
/// respected.
pub fn strip_style_comments(css: &str) -> String {
    let mut out = String::with_capacity(css.len());
    let mut chars = css.char_indices().peekable();
    let mut quote: Option<char> = None;

    while let Some((idx, c)) = chars.next() {
        if let Some(q) = quote {
            out.push(c);
            if c == '\\' {
                if let Some((_, escaped)) = chars.next() {
                    out.push(escaped);
                }
            } else if c == q {
                quote = None;
            }
            continue;
        }

        match c {
            '"' | '\'' => {
                quote = Some(c);
                out.push(c);
            }
            '/' if css[idx..].starts_with("/*") => {
                let end = css[idx + 2..].find("*/").map_or(css.len(), |e| idx + 2 + e + 2);
                while chars.peek().is_some_and(|(next, _)| *next < end) {
                    chars.next();
                }
            }
            _ => out.push(c),
        }
    }
    out
}

/// Remove `<!-- ... -->` comments outside raw-text elements.
pub fn strip_markup_comments(html: &str) -> String {
    let mut out = String::with_capacity(html.len());
    let mut rest = html;

    while let Some(open) = rest.find('<') {
        out.push_str(&rest[..open]);
        rest = &rest[open..];

        if rest.starts_with("<!--") {
            rest = rest.find("-->").map_or("", |end| &rest[end + 3..]);
            continue;
        }

        let end = tag_end(rest);
        let tag = &rest[..end];
        out.push_str(tag);
        rest = &rest[end..];
        if let Some(name) = raw_text_open(tag) {
            let close = find_closing(rest, name);
            out.push_str(&rest[..close]);
            rest = &rest[close..];
        }
    }
    out.push_str(rest);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn style_comments_go_but_strings_stay() {
        let css = "/*! banner */a{content:\"/* not a comment */\"}/* x */b{}";
        assert_eq!(
            strip_style_comments(css),
            "a{content:\"/* not a comment */\"}b{}"
        );
    }

    #[test]
    fn markup_comments_go_but_scripts_stay() {
        let html = "<p>a<!-- note --></p><script>var s = '<!-- keep -->';</script>";
        assert_eq!(
            strip_markup_comments(html),
            "<p>a</p><script>var s = '<!-- keep -->';</script>"
        );
    }

    #[test]
    fn unterminated_comment_runs_to_the_end() {
        assert_eq!(strip_markup_comments("<p>a</p><!-- open"), "<p>a</p>");
        assert_eq!(strip_style_comments("a{}/* open"), "a{}");
    }
}
