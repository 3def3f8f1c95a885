//! Разбор и форматирование дат и сумм.

use chrono::NaiveDate;
use rust_decimal::{Decimal, RoundingStrategy};
use std::str::FromStr;

/// Формат даты, которым пишется QIF.
pub const QIF_DATE_FORMAT: &str = "%m/%d/%Y";

/// Форматы, перебираемые по порядку. Двузначный год идёт раньше
/// четырёхзначного: `%Y` принял бы «23» как 23-й год.
const DATE_FORMATS: &[&str] = &[
    "%m/%d/%y",
    "%m/%d/%Y",
    "%d/%m/%y",
    "%d/%m/%Y",
    "%Y-%m-%d",
    "%m-%d-%Y",
    "%d-%m-%Y",
    "%d.%m.%Y",
    "%Y.%m.%d",
    "%d-%b-%Y",
    "%b %d, %Y",
    "%B %d, %Y",
];

/// Разбор даты по общему списку форматов.
///
/// Понимает квикеновский апостроф перед годом (`1/15'23`, `01/15'2023`) и
/// пробелы внутри числовых дат (` 1/ 5/23`).
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    let s = normalize_date(raw);
    if s.is_empty() {
        return None;
    }
    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(&s, fmt).ok())
}

/// Сначала формат шаблона, потом общий список.
pub fn parse_date_with(raw: &str, format: &str) -> Option<NaiveDate> {
    let trimmed = raw.trim();
    if !format.is_empty() {
        if let Ok(d) = NaiveDate::parse_from_str(trimmed, format) {
            return Some(d);
        }
    }
    parse_date(trimmed)
}

fn normalize_date(raw: &str) -> String {
    let s = raw.trim();
    if s.contains('\'') || s.contains('/') {
        s.chars()
            .filter(|c| !c.is_whitespace())
            .map(|c| if c == '\'' { '/' } else { c })
            .collect()
    } else {
        s.to_string()
    }
}

pub fn format_date(date: NaiveDate, format: &str) -> String {
    date.format(format).to_string()
}

/// Разбор суммы: разделители тысяч, символы валют, `(123.45)` как минус.
pub fn parse_amount(raw: &str) -> Result<Decimal, String> {
    let mut s = raw.trim();
    if s.is_empty() {
        return Err("empty amount".into());
    }
    let mut negative = false;
    if s.starts_with('(') && s.ends_with(')') && s.len() >= 2 {
        negative = true;
        s = &s[1..s.len() - 1];
    }
    let cleaned: String = s
        .chars()
        .filter(|c| !matches!(c, '$' | '€' | '£' | '¥' | '₽' | ',' | ' ' | '\u{a0}'))
        .collect();
    let cleaned = cleaned.strip_prefix('+').unwrap_or(&cleaned);
    if cleaned.is_empty() {
        return Err(format!("no digits in {raw:?}"));
    }
    let value = Decimal::from_str(cleaned).map_err(|e| format!("{raw:?}: {e}"))?;
    Ok(if negative { -value } else { value })
}

/// Умножение на множитель колонки; переполнение Decimal — ошибка, не паника.
pub fn apply_multiplier(value: Decimal, multiplier: Decimal) -> Result<Decimal, String> {
    value
        .checked_mul(multiplier)
        .ok_or_else(|| format!("{value} * {multiplier} overflows the decimal range"))
}

/// Обратное к [`apply_multiplier`]; нулевой множитель оставляет значение как есть.
pub fn remove_multiplier(value: Decimal, multiplier: Decimal) -> Result<Decimal, String> {
    if multiplier.is_zero() {
        return Ok(value);
    }
    value
        .checked_div(multiplier)
        .ok_or_else(|| format!("{value} / {multiplier} overflows the decimal range"))
}

/// Ровно два знака после точки.
pub fn format_amount(value: &Decimal) -> String {
    let mut v = value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
    v.rescale(2);
    v.to_string()
}

/// Целое — без дробной части, иначе с естественной точностью
/// (цена и количество бумаг).
pub fn format_natural(value: &Decimal) -> String {
    value.normalize().to_string()
}

/// Процент доли сплита: `50%` и `50` равнозначны.
pub fn parse_percentage(raw: &str) -> Result<Decimal, String> {
    parse_amount(raw.trim().trim_end_matches('%'))
}
