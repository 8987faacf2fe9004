//! Formatting utilities for sizes, durations and build summaries.

use std::time::Duration;

use console::Term;
use owo_colors::OwoColorize;
use tote_bundler::BuildOutput;

use super::colors_enabled;

/// Format a byte count with the largest fitting unit.
///
/// ```
/// use tote_cli::ui::format_size;
///
/// assert_eq!(format_size(0), "0 B");
/// assert_eq!(format_size(500), "500 B");
/// assert_eq!(format_size(1536), "1.50 KB");
/// ```
pub fn format_size(bytes: u64) -> String {
    const UNITS: &[&str] = &["B", "KB", "MB", "GB"];

    if bytes == 0 {
        return "0 B".to_string();
    }

    let mut size = bytes as f64;
    let mut unit = 0;
    while size >= 1024.0 && unit < UNITS.len() - 1 {
        size /= 1024.0;
        unit += 1;
    }

    if unit == 0 {
        format!("{} {}", bytes, UNITS[0])
    } else {
        format!("{:.2} {}", size, UNITS[unit])
    }
}

/// Format a duration as `ms`, `s` or `m s`.
///
/// ```
/// use std::time::Duration;
/// use tote_cli::ui::format_duration;
///
/// assert_eq!(format_duration(Duration::from_millis(42)), "42ms");
/// assert_eq!(format_duration(Duration::from_millis(1500)), "1.50s");
/// assert_eq!(format_duration(Duration::from_secs(125)), "2m 5s");
/// ```
pub fn format_duration(duration: Duration) -> String {
    let millis = duration.as_millis();
    if millis < 1000 {
        format!("{millis}ms")
    } else if millis < 60_000 {
        format!("{:.2}s", duration.as_secs_f64())
    } else {
        let secs = duration.as_secs();
        format!("{}m {}s", secs / 60, secs % 60)
    }
}

/// Print one line per written file: emitted assets first, then derived
/// files, each with its size.
pub fn print_build_summary(output: &BuildOutput) {
    let width = Term::stderr().size().1 as usize;
    let name_width = output
        .files()
        .map(|(name, _)| name.len())
        .max()
        .unwrap_or(0)
        .min(width.saturating_sub(16).max(20));

    eprintln!();
    for (name, content) in output.files() {
        let size = format_size(content.len() as u64);
        if colors_enabled() {
            eprintln!("  {:<name_width$}  {}", name.cyan(), size.dimmed());
        } else {
            eprintln!("  {name:<name_width$}  {size}");
        }
    }
    eprintln!();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sizes_scale_units() {
        assert_eq!(format_size(1023), "1023 B");
        assert_eq!(format_size(1024), "1.00 KB");
        assert_eq!(format_size(1_048_576), "1.00 MB");
        assert_eq!(format_size(1_073_741_824), "1.00 GB");
    }

    #[test]
    fn durations_pick_units() {
        assert_eq!(format_duration(Duration::from_millis(0)), "0ms");
        assert_eq!(format_duration(Duration::from_millis(999)), "999ms");
        assert_eq!(format_duration(Duration::from_secs(60)), "1m 0s");
    }
}
