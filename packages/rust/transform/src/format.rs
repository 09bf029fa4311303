//! Date and amount formatters shared by every clause.

use chrono::{Datelike, FixedOffset, TimeZone};

/// Offset used for document dates unless configured otherwise (UTC+8).
pub const DEFAULT_UTC_OFFSET_SECS: i32 = 8 * 3600;

/// The document's default time zone.
pub fn default_offset() -> FixedOffset {
    FixedOffset::east_opt(DEFAULT_UTC_OFFSET_SECS).expect("UTC+8 is a valid offset")
}

/// Render an epoch-millisecond timestamp as `2024年1月5日` (no zero padding).
///
/// `None`, `0` or an unrepresentable timestamp yields an empty string.
pub fn format_date_to_chinese(timestamp_ms: Option<i64>, offset: &FixedOffset) -> String {
    let Some(ms) = timestamp_ms.filter(|ms| *ms != 0) else {
        return String::new();
    };
    match offset.timestamp_millis_opt(ms).single() {
        Some(date) => format!("{}年{}月{}日", date.year(), date.month(), date.day()),
        None => String::new(),
    }
}

/// Two decimals, rounding an exact half-cent away from zero
/// (`0.125` → `"0.13"`).
pub fn format_two_decimals(value: f64) -> String {
    // Only multiples of 1/8 with an odd numerator sit exactly on a half-cent.
    let eighths = value * 8.0;
    if eighths.fract() == 0.0 && eighths % 2.0 != 0.0 {
        let cents = (value * 100.0).round();
        return format!("{:.2}", cents / 100.0);
    }
    format!("{value:.2}")
}

/// Two-decimal amount; `None` renders as `0.00`.
pub fn format_amount(amount: Option<f64>) -> String {
    match amount {
        Some(value) => format_two_decimals(value),
        None => "0.00".into(),
    }
}

/// Two-decimal amount suffixed with `万元`; `None` renders as an empty string.
pub fn format_amount_wan(amount: Option<f64>) -> String {
    match amount {
        Some(value) => format!("{}万元", format_two_decimals(value)),
        None => String::new(),
    }
}

/// Shortest decimal form of a score (`30` → `"30"`, `12.5` → `"12.5"`).
pub fn format_score(score: Option<f64>) -> String {
    match score {
        Some(value) => value.to_string(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// 2024-01-05 00:00:00 at UTC+8.
    const JAN_5_2024_CST: i64 = 1_704_384_000_000;

    #[test]
    fn chinese_date_has_no_padding() {
        let offset = default_offset();
        assert_eq!(
            format_date_to_chinese(Some(JAN_5_2024_CST), &offset),
            "2024年1月5日"
        );
        assert_eq!(
            format_date_to_chinese(Some(1_734_969_600_000), &offset),
            "2024年12月24日"
        );
    }

    #[test]
    fn chinese_date_uses_the_given_offset() {
        // Midnight in Beijing is still the previous day in UTC.
        let utc = FixedOffset::east_opt(0).expect("utc");
        assert_eq!(
            format_date_to_chinese(Some(JAN_5_2024_CST), &utc),
            "2024年1月4日"
        );
    }

    #[test]
    fn missing_date_is_empty() {
        assert_eq!(format_date_to_chinese(None, &default_offset()), "");
        assert_eq!(format_date_to_chinese(Some(0), &default_offset()), "");
        assert_eq!(format_date_to_chinese(Some(i64::MAX), &default_offset()), "");
    }

    #[test]
    fn plain_amount() {
        assert_eq!(format_amount(None), "0.00");
        assert_eq!(format_amount(Some(1234.5)), "1234.50");
        assert_eq!(format_amount(Some(0.0)), "0.00");
    }

    #[test]
    fn half_cent_rounds_up() {
        assert_eq!(format_amount(Some(0.125)), "0.13");
        assert_eq!(format_amount(Some(0.375)), "0.38");
        assert_eq!(format_amount(Some(2.5)), "2.50");
        assert_eq!(format_amount_wan(Some(0.125)), "0.13万元");
        // 1.005 is stored slightly below the half-cent.
        assert_eq!(format_two_decimals(1.005), "1.00");
        assert_eq!(format_two_decimals(-0.125), "-0.13");
    }

    #[test]
    fn wan_amount() {
        assert_eq!(format_amount_wan(None), "");
        assert_eq!(format_amount_wan(Some(1234.5)), "1234.50万元");
        assert_eq!(format_amount_wan(Some(50.0)), "50.00万元");
    }

    #[test]
    fn scores() {
        assert_eq!(format_score(Some(30.0)), "30");
        assert_eq!(format_score(Some(12.5)), "12.5");
        assert_eq!(format_score(Some(0.0)), "0");
        assert_eq!(format_score(None), "");
    }
}
