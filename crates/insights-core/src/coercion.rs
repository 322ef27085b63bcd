//! Best-effort coercion of spreadsheet cells into typed values.
//!
//! Every function here is total: malformed input degrades to a documented
//! default instead of an error, because exports from the field are routinely
//! hand-edited and the dashboard must still load.

use std::sync::OnceLock;

use chrono::{Datelike, NaiveDate};
use rand::Rng;
use regex::Regex;
use tracing::trace;

/// Year covered by generated fallback dates.
pub const FALLBACK_YEAR: i32 = 2025;

/// Hours credited to a service visit whose clock times are unusable.
pub const SERVICE_VISIT_DEFAULT_HOURS: f64 = 0.5;

/// Largest quantity a single cell can contribute.
pub const MAX_QUANTITY: u64 = u32::MAX as u64;

const MINUTES_PER_DAY: i64 = 24 * 60;

// ── Date source ───────────────────────────────────────────────────────────────

/// Supplies the date used when a row has no usable date of its own.
///
/// Constructed once per ingestion and passed by reference to the normaliser so
/// tests can swap in a deterministic source.
pub trait DateSource: Send + Sync {
    fn fallback_date(&self) -> NaiveDate;
}

/// Uniformly random day within [`FALLBACK_YEAR`].
///
/// Keeps time-series charts from collapsing into a single point when an
/// export has no date column.
#[derive(Debug, Clone, Copy, Default)]
pub struct RandomDateSource;

impl DateSource for RandomDateSource {
    fn fallback_date(&self) -> NaiveDate {
        let days_in_year = if is_leap_year(FALLBACK_YEAR) { 366 } else { 365 };
        let ordinal = rand::thread_rng().gen_range(1..=days_in_year);
        NaiveDate::from_yo_opt(FALLBACK_YEAR, ordinal).unwrap_or_default()
    }
}

/// Always returns the same date.
#[derive(Debug, Clone, Copy)]
pub struct FixedDateSource(pub NaiveDate);

impl DateSource for FixedDateSource {
    fn fallback_date(&self) -> NaiveDate {
        self.0
    }
}

fn is_leap_year(year: i32) -> bool {
    NaiveDate::from_ymd_opt(year, 2, 29).is_some()
}

// ── Dates ─────────────────────────────────────────────────────────────────────

fn day_month_year() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^(\d{1,2})/(\d{1,2})/(\d{4})").expect("regex is valid"))
}

/// Normalise a raw date cell into `YYYY-MM-DD`.
///
/// * blank → generated fallback
/// * `D/M/YYYY` or `DD/MM/YYYY` → rewritten as ISO, zero padded
/// * already ISO (contains `-`, at least 10 chars, leading date valid) → that
///   leading date, unchanged for plain `YYYY-MM-DD` input
/// * anything else, including impossible calendar dates → generated fallback
pub fn normalize_date(raw: &str, dates: &dyn DateSource) -> String {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return format_date(dates.fallback_date());
    }

    if let Some(caps) = day_month_year().captures(trimmed) {
        let day = caps[1].parse::<u32>().ok();
        let month = caps[2].parse::<u32>().ok();
        let year = caps[3].parse::<i32>().ok();
        if let (Some(d), Some(m), Some(y)) = (day, month, year) {
            if let Some(date) = NaiveDate::from_ymd_opt(y, m, d) {
                return format_date(date);
            }
        }
        return fallback(trimmed, dates);
    }

    if trimmed.contains('-') && trimmed.len() >= 10 {
        if let Some(prefix) = trimmed.get(..10) {
            if let Ok(date) = NaiveDate::parse_from_str(prefix, "%Y-%m-%d") {
                return format_date(date);
            }
        }
    }

    fallback(trimmed, dates)
}

fn fallback(raw: &str, dates: &dyn DateSource) -> String {
    let date = format_date(dates.fallback_date());
    trace!("Unusable date {:?}, substituted {}", raw, date);
    date
}

fn format_date(date: NaiveDate) -> String {
    format!("{:04}-{:02}-{:02}", date.year(), date.month(), date.day())
}

// ── Numbers ───────────────────────────────────────────────────────────────────

fn leading_number() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^[+-]?(\d+(\.\d*)?|\.\d+)([eE][+-]?\d+)?").expect("regex is valid")
    })
}

/// Parse a number written in Brazilian/European or plain notation.
///
/// Currency markers (`R`, `$`) and whitespace are stripped. When both `.` and
/// `,` appear, `.` is a thousands separator; the first `,` then becomes the
/// decimal point. The longest numeric prefix is parsed and anything
/// unparseable yields `0.0`.
pub fn parse_locale_number(raw: &str) -> f64 {
    let mut cleaned: String = raw
        .chars()
        .filter(|c| !c.is_whitespace() && *c != 'R' && *c != '$')
        .collect();

    if cleaned.contains('.') && cleaned.contains(',') {
        cleaned = cleaned.replace('.', "");
    }
    let cleaned = cleaned.replacen(',', ".", 1);

    leading_number()
        .find(&cleaned)
        .and_then(|m| m.as_str().parse::<f64>().ok())
        .filter(|n| n.is_finite())
        .unwrap_or(0.0)
}

/// Quantity for a visit: the ceiling of `value`, within `1..=MAX_QUANTITY`.
pub fn ceil_quantity(value: f64) -> u64 {
    let ceiled = value.ceil();
    if !ceiled.is_finite() || ceiled < 1.0 {
        1
    } else if ceiled >= MAX_QUANTITY as f64 {
        MAX_QUANTITY
    } else {
        ceiled as u64
    }
}

/// Round to two decimal places.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

// ── Durations ─────────────────────────────────────────────────────────────────

/// Minutes since midnight for `HH:MM[:SS]`; seconds are ignored.
///
/// Hours must lie in `0..24` and minutes in `0..60`.
fn clock_minutes(raw: &str) -> Option<i64> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    let mut parts = trimmed.split(':');
    let hours = parts.next()?.trim().parse::<i64>().ok()?;
    let minutes = parts.next()?.trim().parse::<i64>().ok()?;
    if !(0..24).contains(&hours) || !(0..60).contains(&minutes) {
        return None;
    }
    Some(hours * 60 + minutes)
}

/// Hours between two clock readings, wrapping past midnight.
///
/// Unparseable or blank readings, and spans that round to zero, yield
/// [`SERVICE_VISIT_DEFAULT_HOURS`] for service visits and `0.0` otherwise.
pub fn compute_duration(entry: &str, exit: &str, is_service_visit: bool) -> f64 {
    let default = if is_service_visit {
        SERVICE_VISIT_DEFAULT_HOURS
    } else {
        0.0
    };

    let (Some(start), Some(end)) = (clock_minutes(entry), clock_minutes(exit)) else {
        return default;
    };

    let mut diff = end - start;
    if diff < 0 {
        diff += MINUTES_PER_DAY;
    }

    let hours = round2(diff as f64 / 60.0);
    if hours == 0.0 {
        default
    } else {
        hours
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn fixed() -> FixedDateSource {
        FixedDateSource(NaiveDate::from_ymd_opt(2025, 6, 15).unwrap())
    }

    // ── normalize_date ────────────────────────────────────────────────────────

    #[test]
    fn test_normalize_date_day_month_year() {
        assert_eq!(normalize_date("23/10/2025", &fixed()), "2025-10-23");
    }

    #[test]
    fn test_normalize_date_pads_single_digits() {
        assert_eq!(normalize_date("3/7/2025", &fixed()), "2025-07-03");
    }

    #[test]
    fn test_normalize_date_iso_is_idempotent() {
        assert_eq!(normalize_date("2025-10-23", &fixed()), "2025-10-23");
        let once = normalize_date("23/10/2025", &fixed());
        assert_eq!(normalize_date(&once, &fixed()), once);
    }

    #[test]
    fn test_normalize_date_iso_with_time_keeps_date() {
        assert_eq!(normalize_date("2025-10-23T08:30:00", &fixed()), "2025-10-23");
    }

    #[test]
    fn test_normalize_date_blank_uses_source() {
        assert_eq!(normalize_date("", &fixed()), "2025-06-15");
        assert_eq!(normalize_date("   ", &fixed()), "2025-06-15");
    }

    #[test]
    fn test_normalize_date_garbage_uses_source() {
        assert_eq!(normalize_date("ontem", &fixed()), "2025-06-15");
        assert_eq!(normalize_date("31/02/2025", &fixed()), "2025-06-15");
        assert_eq!(normalize_date("not-a-date-at-all", &fixed()), "2025-06-15");
    }

    #[test]
    fn test_random_date_source_stays_in_year() {
        let source = RandomDateSource;
        for _ in 0..200 {
            assert_eq!(source.fallback_date().year(), FALLBACK_YEAR);
        }
    }

    // ── parse_locale_number ───────────────────────────────────────────────────

    #[test]
    fn test_parse_locale_number_thousands_and_decimal() {
        assert!((parse_locale_number("1.234,56") - 1234.56).abs() < 1e-9);
    }

    #[test]
    fn test_parse_locale_number_comma_decimal() {
        assert!((parse_locale_number("12,5") - 12.5).abs() < 1e-9);
    }

    #[test]
    fn test_parse_locale_number_currency() {
        assert!((parse_locale_number("R$ 160,88") - 160.88).abs() < 1e-9);
    }

    #[test]
    fn test_parse_locale_number_plain() {
        assert_eq!(parse_locale_number("42"), 42.0);
        assert!((parse_locale_number("0.75") - 0.75).abs() < 1e-9);
    }

    #[test]
    fn test_parse_locale_number_blank_and_garbage() {
        assert_eq!(parse_locale_number(""), 0.0);
        assert_eq!(parse_locale_number("n/a"), 0.0);
    }

    #[test]
    fn test_parse_locale_number_numeric_prefix() {
        assert_eq!(parse_locale_number("3 un"), 3.0);
        assert_eq!(parse_locale_number("12kg"), 12.0);
    }

    // ── ceil_quantity ─────────────────────────────────────────────────────────

    #[test]
    fn test_ceil_quantity() {
        assert_eq!(ceil_quantity(2.1), 3);
        assert_eq!(ceil_quantity(3.0), 3);
        assert_eq!(ceil_quantity(0.0), 1);
        assert_eq!(ceil_quantity(-4.0), 1);
        assert_eq!(ceil_quantity(f64::NAN), 1);
    }

    #[test]
    fn test_ceil_quantity_caps_huge_values() {
        assert_eq!(ceil_quantity(1e20), MAX_QUANTITY);
        assert_eq!(ceil_quantity(parse_locale_number("1e20")), MAX_QUANTITY);
        assert_eq!(ceil_quantity(f64::MAX), MAX_QUANTITY);
        assert_eq!(ceil_quantity(4_294_967_294.5), MAX_QUANTITY);
    }

    // ── compute_duration ──────────────────────────────────────────────────────

    #[test]
    fn test_compute_duration_simple_span() {
        assert_eq!(compute_duration("08:00", "09:30", false), 1.5);
    }

    #[test]
    fn test_compute_duration_midnight_wrap() {
        assert_eq!(compute_duration("23:00", "01:00", false), 2.0);
    }

    #[test]
    fn test_compute_duration_ignores_seconds() {
        assert_eq!(compute_duration("08:00:59", "08:20:01", false), 0.33);
    }

    #[test]
    fn test_compute_duration_missing_inputs() {
        assert_eq!(compute_duration("", "", true), 0.5);
        assert_eq!(compute_duration("", "", false), 0.0);
        assert_eq!(compute_duration("08:00", "", true), 0.5);
        assert_eq!(compute_duration("oito", "09:00", false), 0.0);
        assert_eq!(compute_duration("8", "9", true), 0.5);
    }

    #[test]
    fn test_compute_duration_out_of_range_clock_uses_default() {
        assert_eq!(compute_duration("9223372036854775807:00", "09:00", true), 0.5);
        assert_eq!(compute_duration("08:00", "-9223372036854775808:00", false), 0.0);
        assert_eq!(compute_duration("25:00", "09:00", true), 0.5);
        assert_eq!(compute_duration("08:75", "09:00", false), 0.0);
        assert_eq!(compute_duration("-1:00", "09:00", false), 0.0);
    }

    #[test]
    fn test_compute_duration_zero_span_uses_default() {
        assert_eq!(compute_duration("10:00", "10:00", true), 0.5);
        assert_eq!(compute_duration("10:00", "10:00", false), 0.0);
    }

    // ── properties ────────────────────────────────────────────────────────────

    proptest! {
        #[test]
        fn prop_normalize_date_always_calendar_date(raw in ".{0,24}") {
            let out = normalize_date(&raw, &RandomDateSource);
            prop_assert!(NaiveDate::parse_from_str(&out, "%Y-%m-%d").is_ok());
            prop_assert_eq!(out.len(), 10);
        }

        #[test]
        fn prop_compute_duration_non_negative(
            h1 in 0u32..24, m1 in 0u32..60, h2 in 0u32..24, m2 in 0u32..60, service in any::<bool>()
        ) {
            let hours = compute_duration(&format!("{h1:02}:{m1:02}"), &format!("{h2:02}:{m2:02}"), service);
            prop_assert!(hours >= 0.0);
            prop_assert!(hours < 24.0);
        }

        #[test]
        fn prop_compute_duration_total_on_any_clock_text(
            entry in "-?[0-9]{0,22}:[0-9]{0,22}", exit in "-?[0-9]{0,22}:[0-9]{0,22}", service in any::<bool>()
        ) {
            let hours = compute_duration(&entry, &exit, service);
            prop_assert!(hours >= 0.0);
            prop_assert!(hours < 24.0);
        }

        #[test]
        fn prop_parse_locale_number_is_finite(raw in ".{0,16}") {
            prop_assert!(parse_locale_number(&raw).is_finite());
        }
    }
}
