//! Number-to-text rendering used by reads and writes

use rust_decimal::Decimal;

/// Strip trailing zeros after the decimal point, and the point itself when
/// nothing is left after it.
///
/// Strings without a `.` or not ending in `0` are returned unchanged.
///
/// ```
/// use xlkit::accessor::remove_zero;
///
/// assert_eq!(remove_zero("12.50"), "12.5");
/// assert_eq!(remove_zero("12.00"), "12");
/// assert_eq!(remove_zero("120"), "120");
/// ```
pub fn remove_zero(s: &str) -> String {
    if !s.contains('.') || !s.ends_with('0') {
        return s.to_string();
    }
    let trimmed = s.trim_end_matches('0');
    if trimmed == "." {
        // nothing before the point
        return s.to_string();
    }
    trimmed.strip_suffix('.').unwrap_or(trimmed).to_string()
}

/// Round half-up to `places` decimals.
pub fn round_to(value: f64, places: u32) -> f64 {
    let rate = 10f64.powi(places as i32);
    (value * rate + 0.5).floor() / rate
}

/// Shortest decimal for a written floating point value, zeros stripped.
pub(crate) fn written_number(value: f64) -> String {
    remove_zero(&value.to_string())
}

/// Integer rendering of a numeric cell, ties to even, never in exponent form.
pub(crate) fn plain_integer(value: f64) -> String {
    format!("{value:.0}")
}

/// Decimal rendering of a cached formula number, always with a fraction.
pub(crate) fn cached_number(value: f64) -> String {
    with_fraction(value.to_string())
}

/// Append `.0` to a rendered whole number; `NaN`, `inf` and fractions pass.
pub(crate) fn with_fraction(text: String) -> String {
    let digits = text.trim_start_matches('-');
    if !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit()) {
        text + ".0"
    } else {
        text
    }
}

/// Exact decimal expansion of a stored double, never in exponent form.
///
/// Values `Decimal` cannot hold fall back to integer rendering.
pub(crate) fn plain_decimal(value: f64) -> String {
    match Decimal::from_f64_retain(value) {
        Some(d) => d.normalize().to_string(),
        None => plain_integer(value),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_remove_zero() {
        assert_eq!(remove_zero("12.500"), "12.5");
        assert_eq!(remove_zero("12.000"), "12");
        assert_eq!(remove_zero("12"), "12");
        assert_eq!(remove_zero("0.10"), "0.1");
        assert_eq!(remove_zero("100"), "100");
        assert_eq!(remove_zero("1.05"), "1.05");
        assert_eq!(remove_zero("v1.0"), "v1");
        assert_eq!(remove_zero(""), "");
        assert_eq!(remove_zero(".00"), ".00");
    }

    #[test]
    fn test_round_to() {
        assert_eq!(round_to(1.005_f32 as f64, 2), 1.0);
        assert_eq!(round_to(2.345, 1), 2.3);
        assert_eq!(round_to(2.5, 0), 3.0);
        assert_eq!(round_to(-2.5, 0), -2.0);
        assert_eq!(round_to(1.1_f32 as f64, 2), 1.1);
    }

    #[test]
    fn test_written_number() {
        assert_eq!(written_number(12.5), "12.5");
        assert_eq!(written_number(12.0), "12");
        assert_eq!(written_number(0.1), "0.1");
        assert_eq!(written_number(-3.25), "-3.25");
    }

    #[test]
    fn test_plain_integer_is_ties_to_even() {
        assert_eq!(plain_integer(2.5), "2");
        assert_eq!(plain_integer(3.5), "4");
        assert_eq!(plain_integer(3.49), "3");
        assert_eq!(plain_integer(1e20), "100000000000000000000");
        assert_eq!(plain_integer(-7.0), "-7");
    }

    #[test]
    fn test_cached_number() {
        assert_eq!(cached_number(3.0), "3.0");
        assert_eq!(cached_number(2.75), "2.75");
        assert_eq!(cached_number(-1.0), "-1.0");
        assert_eq!(cached_number(f64::NAN), "NaN");
    }

    #[test]
    fn test_with_fraction() {
        assert_eq!(with_fraction(12.0f32.to_string()), "12.0");
        assert_eq!(with_fraction(0.1f32.to_string()), "0.1");
        assert_eq!(with_fraction(f64::INFINITY.to_string()), "inf");
        assert_eq!(with_fraction(String::new()), "");
    }

    #[test]
    fn test_plain_decimal() {
        assert_eq!(plain_decimal(12.5), "12.5");
        assert_eq!(plain_decimal(45292.0), "45292");
        assert_eq!(plain_decimal(0.25), "0.25");
        assert_eq!(plain_decimal(1e40), plain_integer(1e40));
    }
}
