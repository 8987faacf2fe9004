//! CSV to JSON conversion.

use serde_json::{Map, Value};

use crate::content::Content;
use crate::transform::{Transform, TransformInput, bool_option, known_keys, string_option};

/// Converts CSV text to a JSON array.
///
/// With `header` (the default) each row becomes an object keyed by the
/// first row; otherwise each row is an array of strings. `delimiter` must
/// be a single character and defaults to `,`.
pub struct CsvTransform;

impl Transform for CsvTransform {
    fn name(&self) -> &str {
        "csv"
    }

    fn validate_options(&self, options: &Value) -> Result<(), String> {
        known_keys(options, &["delimiter", "header"])?;
        bool_option(options, "header")?;
        delimiter(options).map(|_| ())
    }

    fn apply(&self, input: TransformInput<'_>) -> anyhow::Result<Content> {
        let delimiter = delimiter(input.options).map_err(anyhow::Error::msg)?;
        let header = bool_option(input.options, "header")
            .map_err(anyhow::Error::msg)?
            .unwrap_or(true);

        let source = input.content.to_text()?;
        let rows = parse(&source, delimiter)?;
        let value = if header {
            rows_to_objects(rows)?
        } else {
            Value::Array(
                rows.into_iter()
                    .map(|row| Value::Array(row.into_iter().map(Value::String).collect()))
                    .collect(),
            )
        };
        Ok(Content::Text(serde_json::to_string(&value)?))
    }
}

fn delimiter(options: &Value) -> Result<char, String> {
    match string_option(options, "delimiter")? {
        None => Ok(','),
        Some(s) => {
            let mut chars = s.chars();
            match (chars.next(), chars.next()) {
                (Some(c), None) if c != '"' && c != '\n' && c != '\r' => Ok(c),
                _ => Err(format!("`delimiter` must be a single character, got {s:?}")),
            }
        }
    }
}

fn rows_to_objects(rows: Vec<Vec<String>>) -> anyhow::Result<Value> {
    let mut rows = rows.into_iter();
    let Some(headers) = rows.next() else {
        return Ok(Value::Array(Vec::new()));
    };

    let mut out = Vec::new();
    for (idx, row) in rows.enumerate() {
        if row.len() > headers.len() {
            anyhow::bail!(
                "row {} has {} fields, expected at most {}",
                idx + 2,
                row.len(),
                headers.len()
            );
        }
        let mut object = Map::new();
        let mut fields = row.into_iter();
        for name in &headers {
            let field = fields.next().unwrap_or_default();
            object.insert(name.clone(), Value::String(field));
        }
        out.push(Value::Object(object));
    }
    Ok(Value::Array(out))
}

/// RFC 4180 style: quoted fields, doubled quotes, CRLF or LF line endings.
fn parse(source: &str, delimiter: char) -> anyhow::Result<Vec<Vec<String>>> {
    let mut rows = Vec::new();
    let mut row = Vec::new();
    let mut field = String::new();
    let mut in_quotes = false;
    let mut line = 1;
    let mut chars = source.chars().peekable();

    while let Some(c) = chars.next() {
        if in_quotes {
            match c {
                '"' if chars.peek() == Some(&'"') => {
                    chars.next();
                    field.push('"');
                }
                '"' => in_quotes = false,
                '\n' => {
                    line += 1;
                    field.push(c);
                }
                _ => field.push(c),
            }
            continue;
        }

        match c {
            '"' if field.is_empty() => in_quotes = true,
            '\r' if chars.peek() == Some(&'\n') => {}
            '\n' => {
                line += 1;
                row.push(std::mem::take(&mut field));
                rows.push(std::mem::take(&mut row));
            }
            c if c == delimiter => row.push(std::mem::take(&mut field)),
            _ => field.push(c),
        }
    }

    if in_quotes {
        anyhow::bail!("unterminated quoted field at line {line}");
    }
    if !field.is_empty() || !row.is_empty() {
        row.push(field);
        rows.push(row);
    }

    rows.retain(|r| !(r.len() == 1 && r[0].is_empty()));
    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tote_config::BuildMode;

    fn run(source: &str, options: Value) -> anyhow::Result<Value> {
        let out = CsvTransform.apply(TransformInput {
            content: Content::from(source),
            options: &options,
            path: "data.csv",
            public_path: "/",
            mode: BuildMode::Development,
        })?;
        Ok(serde_json::from_str(out.as_text().unwrap())?)
    }

    #[test]
    fn header_rows_become_objects() {
        let value = run("name,age\r\nada,36\nlinus,\n", json!({})).unwrap();
        assert_eq!(
            value,
            json!([{ "name": "ada", "age": "36" }, { "name": "linus", "age": "" }])
        );
    }

    #[test]
    fn quoted_fields_keep_delimiters_and_newlines() {
        let value = run("a;b\n\"x;y\";\"say \"\"hi\"\"\nthere\"", json!({ "delimiter": ";" }))
            .unwrap();
        assert_eq!(value, json!([{ "a": "x;y", "b": "say \"hi\"\nthere" }]));
    }

    #[test]
    fn headerless_rows_are_arrays() {
        let value = run("1,2\n3,4", json!({ "header": false })).unwrap();
        assert_eq!(value, json!([["1", "2"], ["3", "4"]]));
    }

    #[test]
    fn unterminated_quote_is_an_error() {
        let err = run("a\n\"open", json!({})).unwrap_err();
        assert!(err.to_string().contains("unterminated"));
    }

    #[test]
    fn rejects_multi_character_delimiter() {
        assert!(CsvTransform.validate_options(&json!({ "delimiter": "::" })).is_err());
    }
}
