use lightningcss::{
    printer::PrinterOptions,
    stylesheet::{MinifyOptions, ParserOptions, StyleSheet},
};

/// Minify a stylesheet through lightningcss.
pub fn minify_style(source: &str, filename: &str) -> anyhow::Result<String> {
    let mut stylesheet = StyleSheet::parse(
        source,
        ParserOptions {
            filename: filename.to_string(),
            ..Default::default()
        },
    )
    .map_err(|e| anyhow::anyhow!("Failed to parse CSS from {}: {}", filename, e))?;

    stylesheet
        .minify(MinifyOptions::default())
        .map_err(|e| anyhow::anyhow!("Failed to minify CSS from {}: {}", filename, e))?;

    let result = stylesheet
        .to_css(PrinterOptions {
            minify: true,
            ..Default::default()
        })
        .map_err(|e| anyhow::anyhow!("Failed to print CSS from {}: {}", filename, e))?;
    Ok(result.code)
}
