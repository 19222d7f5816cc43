//! Text <-> number conversions at the edges of the entry state machine.

/// Parses operand text the way the keypad sends it. Text that is not a
/// number becomes NaN and is forwarded as-is; the service decides.
pub fn parse_operand(text: &str) -> f64 {
    text.trim().parse::<f64>().unwrap_or(f64::NAN)
}

/// Renders a result for the display and for history entries.
pub fn format_number(value: f64) -> String {
    if value.is_nan() {
        "NaN".to_string()
    } else if value.is_infinite() {
        if value > 0.0 {
            "Infinity".to_string()
        } else {
            "-Infinity".to_string()
        }
    } else if value == 0.0 {
        // also folds -0
        "0".to_string()
    } else if value.abs() >= 1e21 || value.abs() < 1e-6 {
        exponential(value)
    } else {
        value.to_string()
    }
}

/// Shortest mantissa with a signed exponent: `1e+21`, `1.5e-7`.
fn exponential(value: f64) -> String {
    let formatted = format!("{:e}", value);
    match formatted.split_once('e') {
        Some((mantissa, exponent)) if !exponent.starts_with('-') => {
            format!("{}e+{}", mantissa, exponent)
        }
        _ => formatted,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_operand() {
        assert_eq!(parse_operand("42"), 42.0);
        assert_eq!(parse_operand("0.5"), 0.5);
        assert_eq!(parse_operand("3."), 3.0);
        assert_eq!(parse_operand("-7.25"), -7.25);
        assert!(parse_operand("").is_nan());
        assert!(parse_operand("abc").is_nan());
    }

    #[test]
    fn test_format_number() {
        assert_eq!(format_number(7.0), "7");
        assert_eq!(format_number(-2.5), "-2.5");
        assert_eq!(format_number(0.1 + 0.2), "0.30000000000000004");
        assert_eq!(format_number(-0.0), "0");
        assert_eq!(format_number(f64::INFINITY), "Infinity");
        assert_eq!(format_number(f64::NEG_INFINITY), "-Infinity");
        assert_eq!(format_number(f64::NAN), "NaN");
    }

    #[test]
    fn test_format_number_switches_to_exponent_at_extremes() {
        assert_eq!(format_number(1e21), "1e+21");
        assert_eq!(format_number(-2.5e22), "-2.5e+22");
        assert_eq!(format_number(1e-7), "1e-7");
        assert_eq!(format_number(1.5e-7), "1.5e-7");
        assert_eq!(format_number(1e20), "100000000000000000000");
        assert_eq!(format_number(0.000001), "0.000001");
    }
}
