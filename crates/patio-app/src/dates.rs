// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use time::{Date, Month, OffsetDateTime};

pub const BRAZILIAN_LAYOUT: &str = "dd/mm/yyyy";
pub const MIN_YEAR: i32 = 1900;
pub const MAX_YEAR: i32 = 2100;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateError {
    Empty,
    Malformed,
    YearOutOfRange,
    InvalidCalendarDate,
}

impl std::fmt::Display for DateError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Empty => f.write_str("date is empty"),
            Self::Malformed => write!(f, "date must be {BRAZILIAN_LAYOUT}"),
            Self::YearOutOfRange => write!(f, "year must be between {MIN_YEAR} and {MAX_YEAR}"),
            Self::InvalidCalendarDate => f.write_str("date does not exist"),
        }
    }
}

impl std::error::Error for DateError {}

pub type DateResult<T> = std::result::Result<T, DateError>;

/// Strict `dd/mm/yyyy` parse. Two-digit day and month are required.
pub fn parse_brazilian_date(input: &str) -> DateResult<Date> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(DateError::Empty);
    }
    let [d1, d2, '/', m1, m2, '/', y1, y2, y3, y4] = fixed_chars(trimmed)? else {
        return Err(DateError::Malformed);
    };
    let day = digits(&[d1, d2])?;
    let month = digits(&[m1, m2])?;
    let year = digits(&[y1, y2, y3, y4])?;
    build_date(year, month, day)
}

/// Strict `yyyy-mm-dd` parse.
pub fn parse_iso_date(input: &str) -> DateResult<Date> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(DateError::Empty);
    }
    let [y1, y2, y3, y4, '-', m1, m2, '-', d1, d2] = fixed_chars(trimmed)? else {
        return Err(DateError::Malformed);
    };
    let year = digits(&[y1, y2, y3, y4])?;
    let month = digits(&[m1, m2])?;
    let day = digits(&[d1, d2])?;
    build_date(year, month, day)
}

pub fn format_brazilian_date(date: Date) -> String {
    format!(
        "{:02}/{:02}/{:04}",
        date.day(),
        u8::from(date.month()),
        date.year()
    )
}

pub fn format_iso_date(date: Date) -> String {
    format!(
        "{:04}-{:02}-{:02}",
        date.year(),
        u8::from(date.month()),
        date.day()
    )
}

pub fn brazilian_to_iso(input: &str) -> DateResult<String> {
    parse_brazilian_date(input).map(format_iso_date)
}

pub fn iso_to_brazilian(input: &str) -> DateResult<String> {
    parse_iso_date(input).map(format_brazilian_date)
}

/// Keeps digits only and re-inserts the slashes as the user types.
pub fn mask_date_input(input: &str) -> String {
    let digits: String = input.chars().filter(char::is_ascii_digit).take(8).collect();
    match digits.len() {
        0..=2 => digits,
        3..=4 => format!("{}/{}", &digits[..2], &digits[2..]),
        _ => format!("{}/{}/{}", &digits[..2], &digits[2..4], &digits[4..]),
    }
}

/// Renders a backend date value as `dd/mm/yyyy`.
///
/// Accepts ISO dates (optionally followed by a time part) and epoch
/// timestamps: ten digits or fewer are seconds, longer values milliseconds.
/// A bare year and anything unrecognised are returned unchanged. Epoch
/// values are read in UTC.
pub fn format_table_date(raw: &str) -> String {
    let value = raw.trim();
    if value.is_empty() {
        return String::new();
    }
    if value.len() == 4 && value.chars().all(|ch| ch.is_ascii_digit()) {
        return value.to_owned();
    }
    if let Some(date) = epoch_date(value) {
        return format_brazilian_date(date);
    }
    if let Some(prefix) = value.get(..10)
        && let Ok(date) = parse_iso_date(prefix)
        && (value.len() == 10 || matches!(value.as_bytes()[10], b'T' | b' '))
    {
        return format_brazilian_date(date);
    }
    value.to_owned()
}

/// Truncates integer-like values at the decimal point (`"4512.0"` → `"4512"`).
pub fn format_integer(raw: &str) -> String {
    let value = raw.trim();
    match value.split_once('.') {
        Some((whole, _)) => whole.to_owned(),
        None => value.to_owned(),
    }
}

fn epoch_date(value: &str) -> Option<Date> {
    let whole = match value.split_once('.') {
        Some((whole, fraction)) if fraction.chars().all(|ch| ch.is_ascii_digit()) => whole,
        Some(_) => return None,
        None => value,
    };
    if whole.is_empty() || !whole.chars().all(|ch| ch.is_ascii_digit()) {
        return None;
    }
    let number: i64 = whole.parse().ok()?;
    let timestamp = if value.len() <= 10 {
        OffsetDateTime::from_unix_timestamp(number).ok()?
    } else {
        OffsetDateTime::from_unix_timestamp_nanos(i128::from(number) * 1_000_000).ok()?
    };
    Some(timestamp.date())
}

fn fixed_chars(value: &str) -> DateResult<[char; 10]> {
    let chars: Vec<char> = value.chars().collect();
    chars.try_into().map_err(|_| DateError::Malformed)
}

fn digits(chars: &[char]) -> DateResult<i32> {
    chars.iter().try_fold(0_i32, |acc, ch| {
        ch.to_digit(10)
            .map(|digit| acc * 10 + digit as i32)
            .ok_or(DateError::Malformed)
    })
}

fn build_date(year: i32, month: i32, day: i32) -> DateResult<Date> {
    if !(MIN_YEAR..=MAX_YEAR).contains(&year) {
        return Err(DateError::YearOutOfRange);
    }
    let month = u8::try_from(month)
        .ok()
        .and_then(|month| Month::try_from(month).ok())
        .ok_or(DateError::InvalidCalendarDate)?;
    let day = u8::try_from(day).map_err(|_| DateError::InvalidCalendarDate)?;
    Date::from_calendar_date(year, month, day).map_err(|_| DateError::InvalidCalendarDate)
}
