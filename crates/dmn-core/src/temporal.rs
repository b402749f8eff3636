//! FEEL temporal lexical forms and calendar arithmetic.
//!
//! Accepted forms (§ external interfaces):
//! - date: `YYYY-MM-DD`
//! - time: `HH:MM:SS[.fff][Z | ±HH:MM]`
//! - date-and-time: `YYYY-MM-DDTHH:MM:SS[.fff][Z | ±HH:MM]`
//! - years-months duration: `[-]PnYnM`
//! - days-time duration: `[-]P[nD]T[nH][nM][nS]`
//!
//! Unrecognised text yields `None`; callers turn that into FEEL `null`.

use chrono::{DateTime, FixedOffset, Months, NaiveDate, NaiveDateTime, NaiveTime, TimeDelta, TimeZone};

use crate::value::{FeelTime, Value};

pub fn utc_offset() -> FixedOffset {
    FixedOffset::east_opt(0).expect("zero offset is valid")
}

// ---------------------------------------------------------------------------
// Parsing
// ---------------------------------------------------------------------------

pub fn parse_date(text: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(text.trim(), "%Y-%m-%d").ok()
}

pub fn parse_time(text: &str) -> Option<FeelTime> {
    let text = text.trim();
    let (clock, offset) = split_offset(text)?;
    let time = NaiveTime::parse_from_str(clock, "%H:%M:%S%.f").ok()?;
    Some(FeelTime { time, offset })
}

pub fn parse_date_time(text: &str) -> Option<DateTime<FixedOffset>> {
    let text = text.trim();
    let t_pos = text.find('T')?;
    let (date_part, time_part) = (&text[..t_pos], &text[t_pos + 1..]);
    let date = parse_date(date_part)?;
    let FeelTime { time, offset } = parse_time(time_part)?;
    let offset = offset.unwrap_or_else(utc_offset);
    offset
        .from_local_datetime(&NaiveDateTime::new(date, time))
        .single()
}

/// Split a trailing `Z` / `±HH:MM` offset from a time string.
fn split_offset(text: &str) -> Option<(&str, Option<FixedOffset>)> {
    if let Some(clock) = text.strip_suffix(['Z', 'z']) {
        return Some((clock, Some(utc_offset())));
    }
    // Look for a sign past the mandatory HH:MM:SS prefix.
    if let Some(sign_pos) = text[8.min(text.len())..]
        .find(['+', '-'])
        .map(|p| p + 8.min(text.len()))
    {
        let (clock, offset_text) = text.split_at(sign_pos);
        let offset = parse_offset(offset_text)?;
        return Some((clock, Some(offset)));
    }
    Some((text, None))
}

fn parse_offset(text: &str) -> Option<FixedOffset> {
    let (sign, rest) = match text.strip_prefix('-') {
        Some(rest) => (-1, rest),
        None => (1, text.strip_prefix('+')?),
    };
    let (hours, minutes) = rest.split_once(':')?;
    let hours: i32 = hours.parse().ok()?;
    let minutes: i32 = minutes.parse().ok()?;
    FixedOffset::east_opt(sign * (hours * 3600 + minutes * 60))
}

/// `[-]PnYnM` — calendar months. Pure `P0M` / `P0Y` allowed.
pub fn parse_ym_duration(text: &str) -> Option<i64> {
    let text = text.trim();
    let (negative, rest) = strip_sign(text);
    let rest = rest.strip_prefix('P')?;
    if rest.is_empty() {
        return None;
    }
    let mut months: i64 = 0;
    let mut cursor = rest;
    let mut seen = false;
    while !cursor.is_empty() {
        let (number, unit, remaining) = next_component(cursor)?;
        match unit {
            'Y' => months = months.checked_add(number.checked_mul(12)?)?,
            'M' => months = months.checked_add(number)?,
            _ => return None,
        }
        seen = true;
        cursor = remaining;
    }
    if !seen {
        return None;
    }
    Some(if negative { -months } else { months })
}

/// `[-]P[nD]T[nH][nM][nS]` — clock duration; seconds may be fractional.
pub fn parse_dt_duration(text: &str) -> Option<TimeDelta> {
    let text = text.trim();
    let (negative, rest) = strip_sign(text);
    let rest = rest.strip_prefix('P')?;
    if rest.is_empty() {
        return None;
    }
    let (date_part, time_part) = match rest.split_once('T') {
        Some((d, t)) => (d, Some(t)),
        None => (rest, None),
    };

    let mut secs: i64 = 0;
    let mut nanos: i64 = 0;
    let mut seen = false;

    let mut cursor = date_part;
    while !cursor.is_empty() {
        let (number, unit, remaining) = next_component(cursor)?;
        match unit {
            'D' => secs = secs.checked_add(number.checked_mul(86_400)?)?,
            _ => return None,
        }
        seen = true;
        cursor = remaining;
    }

    if let Some(time_part) = time_part {
        if time_part.is_empty() {
            return None;
        }
        let mut cursor = time_part;
        while !cursor.is_empty() {
            let (number_text, unit, remaining) = next_raw_component(cursor)?;
            match unit {
                'H' => secs = secs.checked_add(number_text.parse::<i64>().ok()?.checked_mul(3600)?)?,
                'M' => secs = secs.checked_add(number_text.parse::<i64>().ok()?.checked_mul(60)?)?,
                'S' => {
                    let (whole, frac) = match number_text.split_once('.') {
                        Some((w, f)) => (w, f),
                        None => (number_text, ""),
                    };
                    secs = secs.checked_add(whole.parse::<i64>().ok()?)?;
                    if !frac.is_empty() {
                        let digits: String = frac.chars().take(9).collect();
                        let scale = 10i64.pow(9 - digits.len() as u32);
                        nanos = nanos.checked_add(digits.parse::<i64>().ok()?.checked_mul(scale)?)?;
                    }
                }
                _ => return None,
            }
            seen = true;
            cursor = remaining;
        }
    }

    if !seen {
        return None;
    }
    let delta = TimeDelta::try_seconds(secs)?.checked_add(&TimeDelta::nanoseconds(nanos))?;
    Some(if negative { -delta } else { delta })
}

fn strip_sign(text: &str) -> (bool, &str) {
    match text.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, text),
    }
}

fn next_component(cursor: &str) -> Option<(i64, char, &str)> {
    let (raw, unit, rest) = next_raw_component(cursor)?;
    Some((raw.parse().ok()?, unit, rest))
}

fn next_raw_component(cursor: &str) -> Option<(&str, char, &str)> {
    let unit_pos = cursor.find(|c: char| c.is_ascii_alphabetic())?;
    if unit_pos == 0 {
        return None;
    }
    let number = &cursor[..unit_pos];
    if !number.chars().all(|c| c.is_ascii_digit() || c == '.') {
        return None;
    }
    let unit = cursor[unit_pos..].chars().next()?;
    Some((number, unit, &cursor[unit_pos + 1..]))
}

/// Parse an `@"..."` literal: tried as date, time, date-and-time, then
/// duration. Unrecognised text yields `Null`.
pub fn parse_temporal_literal(text: &str) -> Value {
    if let Some(date) = parse_date(text) {
        return Value::Date(date);
    }
    if let Some(dt) = parse_date_time(text) {
        return Value::DateTime(dt);
    }
    if let Some(time) = parse_time(text) {
        return Value::Time(time);
    }
    if let Some(months) = parse_ym_duration(text) {
        return Value::YearsMonthsDuration(months);
    }
    if let Some(delta) = parse_dt_duration(text) {
        return Value::DaysTimeDuration(delta);
    }
    Value::Null
}

// ---------------------------------------------------------------------------
// Formatting (canonical textual forms)
// ---------------------------------------------------------------------------

pub fn format_date(date: &NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

pub fn format_time(t: &FeelTime) -> String {
    let mut out = t.time.format("%H:%M:%S%.f").to_string();
    if let Some(offset) = t.offset {
        out.push_str(&format_offset(offset));
    }
    out
}

pub fn format_date_time(dt: &DateTime<FixedOffset>) -> String {
    format!(
        "{}T{}{}",
        dt.date_naive().format("%Y-%m-%d"),
        dt.time().format("%H:%M:%S%.f"),
        format_offset(*dt.offset()),
    )
}

fn format_offset(offset: FixedOffset) -> String {
    let total = offset.local_minus_utc();
    let sign = if total < 0 { '-' } else { '+' };
    let total = total.abs();
    format!("{}{:02}:{:02}", sign, total / 3600, (total % 3600) / 60)
}

/// `PnYnM` with zero components omitted; pure zero is `P0M`.
pub fn format_ym_duration(months: i64) -> String {
    if months == 0 {
        return "P0M".to_string();
    }
    let mut out = String::new();
    if months < 0 {
        out.push('-');
    }
    out.push('P');
    let magnitude = months.abs();
    let (years, rem) = (magnitude / 12, magnitude % 12);
    if years != 0 {
        out.push_str(&format!("{years}Y"));
    }
    if rem != 0 {
        out.push_str(&format!("{rem}M"));
    }
    out
}

/// `P[nD]T[nH][nM][nS]` with zero components omitted; pure zero is `PT0S`.
pub fn format_dt_duration(delta: &TimeDelta) -> String {
    let total_nanos = delta.num_seconds() as i128 * 1_000_000_000 + delta.subsec_nanos() as i128;
    if total_nanos == 0 {
        return "PT0S".to_string();
    }
    let mut out = String::new();
    if total_nanos < 0 {
        out.push('-');
    }
    let magnitude = total_nanos.abs();
    let (secs, nanos) = (magnitude / 1_000_000_000, magnitude % 1_000_000_000);
    let days = secs / 86_400;
    let hours = (secs % 86_400) / 3600;
    let minutes = (secs % 3600) / 60;
    let seconds = secs % 60;
    out.push('P');
    if days != 0 {
        out.push_str(&format!("{days}D"));
    }
    if hours != 0 || minutes != 0 || seconds != 0 || nanos != 0 {
        out.push('T');
        if hours != 0 {
            out.push_str(&format!("{hours}H"));
        }
        if minutes != 0 {
            out.push_str(&format!("{minutes}M"));
        }
        if nanos != 0 {
            let frac = format!("{nanos:09}");
            let frac = frac.trim_end_matches('0');
            out.push_str(&format!("{seconds}.{frac}S"));
        } else if seconds != 0 {
            out.push_str(&format!("{seconds}S"));
        }
    }
    out
}

// ---------------------------------------------------------------------------
// Calendar arithmetic
// ---------------------------------------------------------------------------

/// Add signed calendar months with end-of-month day clamping
/// (2024-01-31 + 1 month = 2024-02-29).
pub fn add_months_to_date(date: NaiveDate, months: i64) -> Option<NaiveDate> {
    let magnitude = u32::try_from(months.unsigned_abs()).ok()?;
    if months >= 0 {
        date.checked_add_months(Months::new(magnitude))
    } else {
        date.checked_sub_months(Months::new(magnitude))
    }
}

pub fn add_months_to_date_time(
    dt: &DateTime<FixedOffset>,
    months: i64,
) -> Option<DateTime<FixedOffset>> {
    let date = add_months_to_date(dt.date_naive(), months)?;
    dt.offset()
        .from_local_datetime(&NaiveDateTime::new(date, dt.time()))
        .single()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_and_format_date() {
        let d = parse_date("2024-01-15").unwrap();
        assert_eq!(format_date(&d), "2024-01-15");
        assert!(parse_date("2024-13-01").is_none());
        assert!(parse_date("not a date").is_none());
    }

    #[test]
    fn parse_time_with_offset() {
        let t = parse_time("10:30:00+02:00").unwrap();
        assert_eq!(t.offset, FixedOffset::east_opt(7200));
        assert_eq!(format_time(&t), "10:30:00+02:00");
    }

    #[test]
    fn parse_time_zulu() {
        let t = parse_time("23:59:01Z").unwrap();
        assert_eq!(t.offset, Some(utc_offset()));
    }

    #[test]
    fn parse_time_without_offset() {
        let t = parse_time("08:00:05.250").unwrap();
        assert_eq!(t.offset, None);
        assert_eq!(format_time(&t), "08:00:05.250");
    }

    #[test]
    fn parse_date_time_forms() {
        let dt = parse_date_time("2024-01-15T10:30:00+02:00").unwrap();
        assert_eq!(format_date_time(&dt), "2024-01-15T10:30:00+02:00");
        let zulu = parse_date_time("2024-01-15T10:30:00Z").unwrap();
        assert_eq!(format_date_time(&zulu), "2024-01-15T10:30:00+00:00");
        let local = parse_date_time("2024-01-15T10:30:00").unwrap();
        assert_eq!(local.offset().local_minus_utc(), 0);
    }

    #[test]
    fn ym_duration_round_trip() {
        assert_eq!(parse_ym_duration("P1Y6M"), Some(18));
        assert_eq!(parse_ym_duration("-P2M"), Some(-2));
        assert_eq!(parse_ym_duration("P0M"), Some(0));
        assert_eq!(format_ym_duration(18), "P1Y6M");
        assert_eq!(format_ym_duration(-2), "-P2M");
        assert_eq!(format_ym_duration(0), "P0M");
        assert_eq!(format_ym_duration(24), "P2Y");
    }

    #[test]
    fn ym_duration_rejects_time_components() {
        assert!(parse_ym_duration("P1D").is_none());
        assert!(parse_ym_duration("PT1H").is_none());
        assert!(parse_ym_duration("P").is_none());
    }

    #[test]
    fn dt_duration_round_trip() {
        let delta = parse_dt_duration("P1DT2H3M4S").unwrap();
        assert_eq!(delta.num_seconds(), 86_400 + 7200 + 180 + 4);
        assert_eq!(format_dt_duration(&delta), "P1DT2H3M4S");
        assert_eq!(format_dt_duration(&TimeDelta::zero()), "PT0S");
        assert_eq!(
            format_dt_duration(&parse_dt_duration("-PT90S").unwrap()),
            "-PT1M30S"
        );
    }

    #[test]
    fn dt_duration_fractional_seconds() {
        let delta = parse_dt_duration("PT0.5S").unwrap();
        assert_eq!(delta.subsec_nanos(), 500_000_000);
        assert_eq!(format_dt_duration(&delta), "PT0.5S");
    }

    #[test]
    fn dt_duration_rejects_calendar_components() {
        assert!(parse_dt_duration("P1Y").is_none());
        assert!(parse_dt_duration("P1DT").is_none());
    }

    #[test]
    fn month_addition_clamps_day() {
        let d = parse_date("2024-01-31").unwrap();
        assert_eq!(
            add_months_to_date(d, 1),
            Some(parse_date("2024-02-29").unwrap())
        );
        let d = parse_date("2018-01-23").unwrap();
        assert_eq!(
            add_months_to_date(d, 36),
            Some(parse_date("2021-01-23").unwrap())
        );
    }

    #[test]
    fn temporal_literal_dispatch() {
        assert!(matches!(parse_temporal_literal("2024-01-15"), Value::Date(_)));
        assert!(matches!(parse_temporal_literal("10:30:00"), Value::Time(_)));
        assert!(matches!(
            parse_temporal_literal("2024-01-15T10:30:00Z"),
            Value::DateTime(_)
        ));
        assert!(matches!(
            parse_temporal_literal("P1Y"),
            Value::YearsMonthsDuration(12)
        ));
        assert!(matches!(
            parse_temporal_literal("PT2H"),
            Value::DaysTimeDuration(_)
        ));
        assert!(matches!(parse_temporal_literal("gibberish"), Value::Null));
    }
}
