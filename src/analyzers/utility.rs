/// Computes the arithmetic mean of a slice of values. Returns 0.0 for empty input.
pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// `part / total` as a fraction in `[0, 1]`. Returns 0.0 when `total` is zero.
pub fn share(part: f64, total: f64) -> f64 {
    if total <= 0.0 {
        0.0
    } else {
        (part / total).clamp(0.0, 1.0)
    }
}

/// Parses a rate written as `0.41`, `41`, `41%` or `41,4%`.
///
/// Values above 1 are read as percentages.
pub fn parse_rate(raw: &str) -> Option<f64> {
    let cleaned = raw.trim().replace('%', "").replace(',', ".");
    let rate = cleaned.trim().parse::<f64>().ok().filter(|v| v.is_finite())?;
    Some(if rate > 1.0 { rate / 100.0 } else { rate })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mean_empty_is_zero() {
        assert_eq!(mean(&[]), 0.0);
    }

    #[test]
    fn test_mean_late_flags() {
        assert_eq!(mean(&[0.0, 1.0, 0.0, 0.0, 1.0]), 0.4);
    }

    #[test]
    fn test_share_with_zero_total() {
        assert_eq!(share(10.0, 0.0), 0.0);
        assert_eq!(share(1.0, 4.0), 0.25);
    }

    #[test]
    fn test_parse_rate_formats() {
        assert_eq!(parse_rate("0.41"), Some(0.41));
        assert_eq!(parse_rate("41%"), Some(0.41));
        assert_eq!(parse_rate("41,5 %"), Some(0.415));
        assert_eq!(parse_rate("1"), Some(1.0));
        assert_eq!(parse_rate("late"), None);
    }
}
