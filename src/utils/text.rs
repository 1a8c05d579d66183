//! Lenient conversions of text scraped from Yahoo! Finance pages.
//!
//! Pages show `N/A`, `--` or an empty cell when a figure is unavailable. The helpers here
//! map such values to a neutral default (zero, `None`, `0:0`) instead of failing.

use crate::config::{DATE_FORMAT, FACTOR_REGEX, VALUE_WITH_PERCENT_REGEX, VALUE_WITH_UNIT_REGEX};
use crate::domain::model::{DecimalWithUnit, FactorRatio, ScaleUnit};
use bigdecimal::BigDecimal;
use chrono::NaiveDate;
use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use std::str::FromStr;
use std::sync::LazyLock;

static VALUE_WITH_PERCENT_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(VALUE_WITH_PERCENT_REGEX).expect("percent pattern is valid"));
static VALUE_WITH_UNIT_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(VALUE_WITH_UNIT_REGEX).expect("unit pattern is valid"));
static FACTOR_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(FACTOR_REGEX).expect("factor pattern is valid"));

fn zero() -> BigDecimal {
    BigDecimal::from(0)
}

/// Form-urlencode `value`, or `default` when absent. `^FTSE` becomes `%5EFTSE`.
pub fn url_encode(value: Option<&str>, default: &str) -> String {
    url::form_urlencoded::byte_serialize(value.unwrap_or(default).as_bytes()).collect()
}

/// `1,234.56` -> 1234.56; invalid input -> 0.
pub fn parse_decimal(text: &str) -> BigDecimal {
    BigDecimal::from_str(text.replace(',', "").trim()).unwrap_or_else(|_| zero())
}

/// `3.45%` -> 3.45; without a percent sign falls back to [`parse_decimal`].
pub fn parse_decimal_percent(text: &str) -> BigDecimal {
    parse_decimal_percent_with(text, &VALUE_WITH_PERCENT_PATTERN)
}

pub fn parse_decimal_percent_with(text: &str, pattern: &Regex) -> BigDecimal {
    match pattern.captures(text) {
        Some(caps) => parse_decimal(&caps[1]),
        None => parse_decimal(text),
    }
}

pub fn parse_integer(text: &str) -> i32 {
    text.replace(',', "").trim().parse().unwrap_or(0)
}

pub fn parse_long(text: &str) -> i64 {
    text.replace(',', "").trim().parse().unwrap_or(0)
}

/// `Jul 26, 2022` -> 2022-07-26; anything else -> `None`.
pub fn parse_date(text: &str) -> Option<NaiveDate> {
    parse_date_with(text, DATE_FORMAT)
}

pub fn parse_date_with(text: &str, format: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(text.trim(), format).ok()
}

/// `1.35B` -> (1.35, Billion); without a unit -> (`parse_decimal(text)`, One).
pub fn parse_decimal_and_unit(text: &str) -> DecimalWithUnit {
    parse_decimal_and_unit_with(text, &VALUE_WITH_UNIT_PATTERN)
}

pub fn parse_decimal_and_unit_with(text: &str, pattern: &Regex) -> DecimalWithUnit {
    match pattern.captures(text) {
        Some(caps) => DecimalWithUnit::new(
            parse_decimal(&caps[1]),
            ScaleUnit::from_str_lossy(&caps[2]),
        ),
        None => DecimalWithUnit::new(parse_decimal(text), ScaleUnit::One),
    }
}

/// `20:1` -> 20:1; invalid input -> 0:0.
pub fn parse_factor_ratio(text: &str) -> FactorRatio {
    parse_factor_ratio_with(text, &FACTOR_PATTERN)
}

pub fn parse_factor_ratio_with(text: &str, pattern: &Regex) -> FactorRatio {
    match pattern.captures(text) {
        Some(caps) => FactorRatio {
            left_value: parse_decimal(&caps[1]),
            right_value: parse_decimal(&caps[2]),
        },
        None => FactorRatio {
            left_value: zero(),
            right_value: zero(),
        },
    }
}

/// Text of an element and its descendants with whitespace collapsed, as a browser shows it.
pub fn element_text(element: ElementRef<'_>) -> String {
    let raw: String = element.text().collect();
    raw.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// [`element_text`] of every match of `selector`, in document order.
pub fn select_texts(document: &Html, selector: &Selector) -> Vec<String> {
    document.select(selector).map(element_text).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dec(s: &str) -> BigDecimal {
        BigDecimal::from_str(s).unwrap()
    }

    #[test]
    fn test_url_encode() {
        assert_eq!(url_encode(Some("^FTSE"), ""), "%5EFTSE");
        assert_eq!(url_encode(Some("0005.HK"), ""), "0005.HK");
        assert_eq!(url_encode(Some("EURUSD=X"), ""), "EURUSD%3DX");
        assert_eq!(url_encode(None, "GOOG"), "GOOG");
        assert_eq!(url_encode(None, ""), "");
    }

    #[test]
    fn test_parse_decimal() {
        assert_eq!(parse_decimal("1,234.56"), dec("1234.56"));
        assert_eq!(parse_decimal("-0.5"), dec("-0.5"));
        assert_eq!(parse_decimal("N/A"), dec("0"));
        assert_eq!(parse_decimal(""), dec("0"));
    }

    #[test]
    fn test_parse_decimal_percent() {
        assert_eq!(parse_decimal_percent("2.46%"), dec("2.46"));
        assert_eq!(parse_decimal_percent("-12.30%"), dec("-12.30"));
        assert_eq!(parse_decimal_percent("7%"), dec("7"));
        assert_eq!(parse_decimal_percent("1,053.10%"), dec("1053.10"));
        assert_eq!(parse_decimal_percent("0.89"), dec("0.89"));
        assert_eq!(parse_decimal_percent("N/A"), dec("0"));
    }

    #[test]
    fn test_parse_integer_and_long() {
        assert_eq!(parse_integer("1,100"), 1100);
        assert_eq!(parse_integer("N/A"), 0);
        assert_eq!(parse_long("25,123,456,789"), 25_123_456_789);
        assert_eq!(parse_long("1.2M"), 0);
    }

    #[test]
    fn test_parse_date() {
        assert_eq!(parse_date("Jul 26, 2022"), NaiveDate::from_ymd_opt(2022, 7, 26));
        assert_eq!(parse_date("Dec 31, 2021"), NaiveDate::from_ymd_opt(2021, 12, 31));
        assert_eq!(parse_date("N/A"), None);
        assert_eq!(parse_date("Jul 25, 2022 - Jul 29, 2022"), None);
        assert_eq!(
            parse_date_with("2022-07-26", "%Y-%m-%d"),
            NaiveDate::from_ymd_opt(2022, 7, 26)
        );
    }

    #[test]
    fn test_parse_decimal_and_unit() {
        let cap = parse_decimal_and_unit("1.485T");
        assert_eq!(cap.base_value, dec("1.485"));
        assert_eq!(cap.scale_unit, ScaleUnit::Trillion);

        let flow = parse_decimal_and_unit("-3.21B");
        assert_eq!(flow.base_value, dec("-3.21"));
        assert_eq!(flow.scale_unit, ScaleUnit::Billion);

        let plain = parse_decimal_and_unit("1,234");
        assert_eq!(plain.base_value, dec("1234"));
        assert_eq!(plain.scale_unit, ScaleUnit::One);

        let missing = parse_decimal_and_unit("N/A");
        assert_eq!(missing.base_value, dec("0"));
        assert_eq!(missing.scale_unit, ScaleUnit::One);
    }

    #[test]
    fn test_parse_factor_ratio() {
        let split = parse_factor_ratio("20:1");
        assert_eq!(split.left_value, dec("20"));
        assert_eq!(split.right_value, dec("1"));

        let none = parse_factor_ratio("N/A");
        assert_eq!(none.left_value, dec("0"));
        assert_eq!(none.right_value, dec("0"));
    }

    #[test]
    fn test_element_text_collapses_whitespace() {
        let html = Html::parse_document(
            "<table><tbody><tr><td>\n  <span>1.48</span>T \n</td><td>  a   b </td></tr></tbody></table>",
        );
        let selector = Selector::parse("td").unwrap();
        assert_eq!(select_texts(&html, &selector), vec!["1.48T", "a b"]);
    }
}
