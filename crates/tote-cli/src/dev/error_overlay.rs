//! Error page served in place of the application while the last build failed.
//!
//! The page listens on the same event stream as the reload client, so it
//! replaces itself with the application once a build succeeds again.

use super::server::EVENTS_PATH;

/// Escape the five HTML-significant characters.
pub fn html_escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#x27;"),
            _ => out.push(c),
        }
    }
    out
}

/// Render the overlay page for `error`.
pub fn render(error: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="utf-8">
  <title>Build Error</title>
  <style>
    body {{ margin: 0; background: #1e1e1e; color: #e6e6e6; font: 14px/1.5 ui-monospace, monospace; }}
    main {{ max-width: 960px; margin: 48px auto; padding: 0 24px; }}
    h1 {{ color: #ff6b6b; font-size: 20px; }}
    pre {{ background: #2b2b2b; border-left: 4px solid #ff6b6b; padding: 16px; white-space: pre-wrap; word-break: break-word; }}
    p {{ color: #9a9a9a; }}
  </style>
</head>
<body>
  <main>
    <h1>Build Error</h1>
    <pre>{error}</pre>
    <p>Fix the error and save; this page reloads once the build succeeds.</p>
  </main>
  <script>
    new EventSource("{events}").onmessage = function (e) {{
      if (JSON.parse(e.data).type === "BuildCompleted") location.reload();
    }};
  </script>
</body>
</html>
"#,
        error = html_escape(error),
        events = EVENTS_PATH,
    )
}
