use crate::config::CSV_DATE_FORMAT;
use crate::domain::model::HistoricalQuote;
use crate::utils::error::{Result, YFinanceError};
use bigdecimal::BigDecimal;
use chrono::Datelike;
use serde_json::{Number, Value};
use std::collections::BTreeMap;
use std::str::FromStr;

pub const QUOTE_CSV_HEADER: [&str; 8] = [
    "symbol",
    "trade_date",
    "open",
    "high",
    "low",
    "close",
    "adj_close",
    "volume",
];

/// Count of days closing above the open, per calendar year.
///
/// Every year present in `quotes` gets an entry, even when it has no bullish day.
pub fn bullish_days_by_year(quotes: &[HistoricalQuote]) -> BTreeMap<i32, u64> {
    let mut result = BTreeMap::new();
    for quote in quotes {
        let count = result.entry(quote.trade_date.year()).or_insert(0);
        if quote.is_bullish() {
            *count += 1;
        }
    }
    result
}

fn decimal_to_json(value: &BigDecimal) -> Value {
    Number::from_str(&value.to_string())
        .map(Value::Number)
        .unwrap_or_else(|_| Value::String(value.to_string()))
}

/// `{"symbol": "GOOG", "trade_date": "2022-07-26", "open": .., "high": .., "low": .., "close": .., "adj_close": .., "volume": ..}`
pub fn quote_to_json(quote: &HistoricalQuote) -> Value {
    serde_json::json!({
        "symbol": quote.symbol,
        "trade_date": quote.trade_date.format(CSV_DATE_FORMAT).to_string(),
        "open": decimal_to_json(&quote.open_price),
        "high": decimal_to_json(&quote.high_price),
        "low": decimal_to_json(&quote.low_price),
        "close": decimal_to_json(&quote.close_price),
        "adj_close": decimal_to_json(&quote.adjust_price),
        "volume": quote.volume,
    })
}

pub fn quotes_to_json(quotes: &[HistoricalQuote]) -> Result<String> {
    let values: Vec<Value> = quotes.iter().map(quote_to_json).collect();
    Ok(serde_json::to_string_pretty(&values)?)
}

pub fn quotes_to_csv(quotes: &[HistoricalQuote]) -> Result<String> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(QUOTE_CSV_HEADER)?;

    for quote in quotes {
        writer.write_record([
            quote.symbol.clone(),
            quote.trade_date.format(CSV_DATE_FORMAT).to_string(),
            quote.open_price.to_string(),
            quote.high_price.to_string(),
            quote.low_price.to_string(),
            quote.close_price.to_string(),
            quote.adjust_price.to_string(),
            quote.volume.to_string(),
        ])?;
    }

    let bytes = writer
        .into_inner()
        .map_err(|e| YFinanceError::ProcessingError {
            message: format!("Failed to flush CSV output: {}", e),
        })?;
    String::from_utf8(bytes).map_err(|e| YFinanceError::ProcessingError {
        message: format!("CSV output is not UTF-8: {}", e),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn quote(date: (i32, u32, u32), open: &str, close: &str) -> HistoricalQuote {
        HistoricalQuote {
            symbol: "GOOG".to_string(),
            trade_date: NaiveDate::from_ymd_opt(date.0, date.1, date.2).unwrap(),
            open_price: BigDecimal::from_str(open).unwrap(),
            high_price: BigDecimal::from_str("120.5").unwrap(),
            low_price: BigDecimal::from_str("99.25").unwrap(),
            close_price: BigDecimal::from_str(close).unwrap(),
            adjust_price: BigDecimal::from_str(close).unwrap(),
            volume: 1_000,
        }
    }

    #[test]
    fn test_bullish_days_by_year() {
        let quotes = vec![
            quote((2021, 12, 30), "100", "101"),
            quote((2021, 12, 31), "101", "100"),
            quote((2022, 1, 3), "100", "105"),
            quote((2022, 1, 4), "105", "106.5"),
            quote((2023, 1, 3), "106", "106"),
        ];

        let result = bullish_days_by_year(&quotes);
        assert_eq!(result.get(&2021), Some(&1));
        assert_eq!(result.get(&2022), Some(&2));
        assert_eq!(result.get(&2023), Some(&0));
        assert!(bullish_days_by_year(&[]).is_empty());
    }

    #[test]
    fn test_quote_to_json_fields() {
        let value = quote_to_json(&quote((2022, 7, 26), "100.5", "101.25"));
        assert_eq!(value["symbol"], "GOOG");
        assert_eq!(value["trade_date"], "2022-07-26");
        assert_eq!(value["open"].as_f64(), Some(100.5));
        assert_eq!(value["adj_close"].as_f64(), Some(101.25));
        assert_eq!(value["volume"], 1_000);
    }

    #[test]
    fn test_quotes_to_json_keeps_rows_of_each_symbol_apart() {
        let goog = quote((2022, 7, 4), "100", "100");
        let msft = HistoricalQuote {
            symbol: "MSFT".to_string(),
            ..goog.clone()
        };

        let json = quotes_to_json(&[goog, msft]).unwrap();
        let values: Vec<Value> = serde_json::from_str(&json).unwrap();
        assert_eq!(values.len(), 2);
        assert_eq!(values[0]["symbol"], "GOOG");
        assert_eq!(values[1]["symbol"], "MSFT");
        assert_ne!(values[0], values[1]);
    }

    #[test]
    fn test_quotes_to_csv() {
        let csv = quotes_to_csv(&[quote((2022, 7, 26), "100.5", "101.25")]).unwrap();
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(lines[0], "symbol,trade_date,open,high,low,close,adj_close,volume");
        assert_eq!(lines[1], "GOOG,2022-07-26,100.5,120.5,99.25,101.25,101.25,1000");
    }
}
