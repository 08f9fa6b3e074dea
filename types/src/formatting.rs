//! Number formatting for status messages and worker summaries.
//!
//! Loading indicators and the decode worker's summary output both go through
//! here so progress and sizes render the same everywhere.

/// Format a byte or record count with K/M suffix for compact display.
///
/// - Values >= 1,000,000 are formatted as `X.XXM`
/// - Values >= 1,000 are formatted as `X.XXK`
/// - Values below 1,000 are formatted as-is
///
/// # Examples
/// ```
/// use liveparse_types::formatting::format_compact;
/// assert_eq!(format_compact(500), "500");
/// assert_eq!(format_compact(1_500), "1.50K");
/// assert_eq!(format_compact(1_500_000), "1.50M");
/// ```
pub fn format_compact(n: u64) -> String {
    if n >= 1_000_000 {
        format!("{:.2}M", n as f64 / 1_000_000.0)
    } else if n >= 1_000 {
        format!("{:.2}K", n as f64 / 1_000.0)
    } else {
        format!("{}", n)
    }
}

/// Format a fraction in `0.0..=1.0` as a percentage with 1 decimal place.
///
/// Out-of-range input is clamped.
///
/// # Examples
/// ```
/// use liveparse_types::formatting::format_fraction_pct;
/// assert_eq!(format_fraction_pct(0.427), "42.7%");
/// assert_eq!(format_fraction_pct(1.5), "100.0%");
/// ```
pub fn format_fraction_pct(fraction: f64) -> String {
    format!("{:.1}%", fraction.clamp(0.0, 1.0) * 100.0)
}

/// Status line shown by a loading indicator while a large backlog decodes.
///
/// # Examples
/// ```
/// use liveparse_types::formatting::format_loading;
/// assert_eq!(format_loading(0.5), "Loading (50.0%)");
/// ```
pub fn format_loading(fraction: f64) -> String {
    format!("Loading ({})", format_fraction_pct(fraction))
}

/// Format elapsed milliseconds as `S.mmms`, or `M:SS` past a minute.
///
/// # Examples
/// ```
/// use liveparse_types::formatting::format_elapsed_ms;
/// assert_eq!(format_elapsed_ms(1_234), "1.234s");
/// assert_eq!(format_elapsed_ms(125_000), "2:05");
/// ```
pub fn format_elapsed_ms(ms: u128) -> String {
    let secs = ms / 1_000;
    if secs >= 60 {
        format!("{}:{:02}", secs / 60, secs % 60)
    } else {
        format!("{}.{:03}s", secs, ms % 1_000)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_compact() {
        assert_eq!(format_compact(0), "0");
        assert_eq!(format_compact(999), "999");
        assert_eq!(format_compact(1_000), "1.00K");
        assert_eq!(format_compact(102_400), "102.40K");
        assert_eq!(format_compact(999_999), "1000.00K");
        assert_eq!(format_compact(1_000_000), "1.00M");
        assert_eq!(format_compact(4_500_000), "4.50M");
    }

    #[test]
    fn test_format_fraction_pct() {
        assert_eq!(format_fraction_pct(0.0), "0.0%");
        assert_eq!(format_fraction_pct(0.5), "50.0%");
        assert_eq!(format_fraction_pct(1.0), "100.0%");
        assert_eq!(format_fraction_pct(-0.2), "0.0%");
    }

    #[test]
    fn test_format_loading() {
        assert_eq!(format_loading(0.0), "Loading (0.0%)");
        assert_eq!(format_loading(0.9999), "Loading (100.0%)");
    }

    #[test]
    fn test_format_elapsed_ms() {
        assert_eq!(format_elapsed_ms(0), "0.000s");
        assert_eq!(format_elapsed_ms(59_999), "59.999s");
        assert_eq!(format_elapsed_ms(60_000), "1:00");
    }
}
