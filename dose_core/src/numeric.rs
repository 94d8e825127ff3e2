//! Numeric parsing and formatting helpers.
//!
//! Form fields and printed syringe volumes arrive as free text (`"1 ml"`,
//! `"3"`, `" 0.5ml"`). These helpers extract the leading number and render
//! calculated values back as minimal decimal strings for display.

/// Parse the leading decimal number from a string, ignoring any trailing
/// text (`"1 ml"` → `1.0`, `"3"` → `3.0`).
///
/// Returns `None` when the string does not start with a number.
pub fn parse_leading_number(text: &str) -> Option<f64> {
    let trimmed = text.trim_start();

    let mut end = 0;
    let mut seen_digit = false;
    let mut seen_dot = false;

    for (idx, ch) in trimmed.char_indices() {
        match ch {
            '+' | '-' if idx == 0 => end = idx + ch.len_utf8(),
            '0'..='9' => {
                seen_digit = true;
                end = idx + ch.len_utf8();
            }
            '.' if !seen_dot => {
                seen_dot = true;
                end = idx + ch.len_utf8();
            }
            _ => break,
        }
    }

    if !seen_digit {
        return None;
    }

    trimmed[..end].trim_end_matches('.').parse().ok()
}

/// Render a value as a minimal decimal string: rounded to three decimal
/// places, trailing zeros trimmed (`0.25`, `30`, `0.05`).
///
/// Display-only; never feed the output back into numeric comparisons.
pub fn format_minimal(value: f64) -> String {
    let mut text = format!("{:.3}", value);

    while text.ends_with('0') {
        text.pop();
    }
    if text.ends_with('.') {
        text.pop();
    }

    text
}

/// Tolerance-based equality for comparing calculated values against printed
/// marks. Draw volumes live in [0.005, 2.0] ml (at most 200 insulin units),
/// so an absolute epsilon is sufficient.
pub fn approx_eq(a: f64, b: f64) -> bool {
    (a - b).abs() < 1e-6
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_plain_number() {
        assert_eq!(parse_leading_number("3"), Some(3.0));
        assert_eq!(parse_leading_number("0.3"), Some(0.3));
        assert_eq!(parse_leading_number("2.5"), Some(2.5));
    }

    #[test]
    fn test_parse_with_unit_suffix() {
        assert_eq!(parse_leading_number("1 ml"), Some(1.0));
        assert_eq!(parse_leading_number("0.5 ml"), Some(0.5));
        assert_eq!(parse_leading_number("  3ml"), Some(3.0));
    }

    #[test]
    fn test_parse_rejects_non_numeric() {
        assert_eq!(parse_leading_number("ml"), None);
        assert_eq!(parse_leading_number(""), None);
        assert_eq!(parse_leading_number("approx 3"), None);
    }

    #[test]
    fn test_parse_signed() {
        assert_eq!(parse_leading_number("-1.5"), Some(-1.5));
        assert_eq!(parse_leading_number("+2"), Some(2.0));
    }

    #[test]
    fn test_format_trims_noise() {
        assert_eq!(format_minimal(0.25000000000000004), "0.25");
        assert_eq!(format_minimal(30.000000000000004), "30");
        assert_eq!(format_minimal(0.05), "0.05");
    }

    #[test]
    fn test_format_whole_and_fractional() {
        assert_eq!(format_minimal(2.0), "2");
        assert_eq!(format_minimal(0.2), "0.2");
        assert_eq!(format_minimal(0.005), "0.005");
        assert_eq!(format_minimal(1.5), "1.5");
    }

    #[test]
    fn test_approx_eq() {
        assert!(approx_eq(29.999999999999996, 30.0));
        assert!(!approx_eq(0.2, 0.3));
    }
}
