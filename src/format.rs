//! German number formatting: `.` groups thousands, `,` separates decimals

/// Placeholder printed for values that are not defined (e.g. an IRR that did not converge)
pub const NOT_AVAILABLE: &str = "n/a";

/// Parse a number that may use a German decimal comma ("28,5" or "28.5")
///
/// Returns `None` if the text is not a number after the comma is replaced.
pub fn parse_de_number(text: &str) -> Option<f64> {
    text.trim().replace(',', ".").parse::<f64>().ok()
}

/// Format a number German style, e.g. `12345.67` -> `"12.345,67"`
///
/// With a currency the unit is appended after a space: `"12.345,67 €"`.
/// Non-finite values print as `n/a`.
pub fn format_de(value: f64, decimals: usize, currency: Option<&str>) -> String {
    let body = if value.is_finite() {
        let plain = format!("{:.*}", decimals, value);
        let (sign, unsigned) = match plain.strip_prefix('-') {
            Some(rest) => ("-", rest),
            None => ("", plain.as_str()),
        };
        let (int_part, frac_part) = match unsigned.split_once('.') {
            Some((int_part, frac_part)) => (int_part, Some(frac_part)),
            None => (unsigned, None),
        };

        let mut out = String::with_capacity(plain.len() + plain.len() / 3);
        out.push_str(sign);
        out.push_str(&group_thousands(int_part));
        if let Some(frac) = frac_part {
            out.push(',');
            out.push_str(frac);
        }
        out
    } else {
        NOT_AVAILABLE.to_string()
    };

    match currency {
        Some(unit) => format!("{} {}", body, unit),
        None => body,
    }
}

/// Format a fractional rate as a German percentage: `0.1234` -> `"12,34%"`
pub fn format_percent_de(rate: Option<f64>, decimals: usize) -> String {
    match rate {
        Some(r) if r.is_finite() => format!("{}%", format_de(r * 100.0, decimals, None)),
        _ => NOT_AVAILABLE.to_string(),
    }
}

fn group_thousands(digits: &str) -> String {
    let len = digits.len();
    let mut out = String::with_capacity(len + len / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (len - i) % 3 == 0 {
            out.push('.');
        }
        out.push(ch);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_decimal_comma() {
        assert_eq!(parse_de_number("28,5"), Some(28.5));
        assert_eq!(parse_de_number(" 6.0 "), Some(6.0));
        assert_eq!(parse_de_number("-1,25"), Some(-1.25));
        assert_eq!(parse_de_number("abc"), None);
        assert_eq!(parse_de_number(""), None);
        // Thousands separators are not understood
        assert_eq!(parse_de_number("1.234,5"), None);
    }

    #[test]
    fn test_format_grouping() {
        assert_eq!(format_de(12345.67, 2, None), "12.345,67");
        assert_eq!(format_de(1234567.0, 0, None), "1.234.567");
        assert_eq!(format_de(999.0, 0, None), "999");
        assert_eq!(format_de(0.5, 2, None), "0,50");
        assert_eq!(format_de(100.0, 0, None), "100");
    }

    #[test]
    fn test_format_negative_and_currency() {
        assert_eq!(format_de(-100000.0, 0, Some("€")), "-100.000 €");
        assert_eq!(format_de(-1234.5, 1, None), "-1.234,5");
    }

    #[test]
    fn test_format_undefined_values() {
        assert_eq!(format_de(f64::NAN, 2, None), "n/a");
        assert_eq!(format_de(f64::INFINITY, 0, Some("€")), "n/a €");
    }

    #[test]
    fn test_format_percent() {
        assert_eq!(format_percent_de(Some(0.1234), 2), "12,34%");
        assert_eq!(format_percent_de(Some(-0.05), 1), "-5,0%");
        assert_eq!(format_percent_de(None, 2), "n/a");
    }
}
