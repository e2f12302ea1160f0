//! Currency formatting for schedule output

/// Currency code prefixed to every rendered amount
pub const CURRENCY_CODE: &str = "KES";

/// Render an amount as `KES 1,234.56`
pub fn format_kes(amount: f64) -> String {
    format!("{} {}", CURRENCY_CODE, group_thousands(amount))
}

/// Two decimals with comma thousands separators
pub fn group_thousands(amount: f64) -> String {
    let fixed = format!("{:.2}", amount.abs());
    let (whole, fraction) = fixed.split_once('.').unwrap_or((fixed.as_str(), "00"));

    let mut grouped = String::with_capacity(whole.len() + whole.len() / 3);
    for (i, digit) in whole.chars().enumerate() {
        if i > 0 && (whole.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(digit);
    }

    // -0.001 rounds to 0.00 and should not print a sign
    let sign = if amount < 0.0 && fixed.bytes().any(|b| b.is_ascii_digit() && b != b'0') {
        "-"
    } else {
        ""
    };

    format!("{}{}.{}", sign, grouped, fraction)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_kes() {
        assert_eq!(format_kes(9025.8332), "KES 9,025.83");
        assert_eq!(format_kes(0.0), "KES 0.00");
        assert_eq!(format_kes(999.999), "KES 1,000.00");
        assert_eq!(format_kes(1_234_567.5), "KES 1,234,567.50");
        assert_eq!(format_kes(100_000.0), "KES 100,000.00");
    }

    #[test]
    fn test_negative_amounts() {
        assert_eq!(format_kes(-8309.96), "KES -8,309.96");
        assert_eq!(format_kes(-0.001), "KES 0.00");
    }
}
