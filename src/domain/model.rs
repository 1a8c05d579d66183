use crate::config::CSV_DATE_FORMAT;
use bigdecimal::BigDecimal;
use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Reporting interval of time-sequential data such as historical quotes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Interval {
    #[default]
    #[serde(alias = "d", alias = "1d")]
    Daily,
    #[serde(alias = "w", alias = "1wk")]
    Weekly,
    #[serde(alias = "m", alias = "1mo")]
    Monthly,
}

impl Interval {
    /// Code used by the download endpoint.
    pub fn code(&self) -> &'static str {
        match self {
            Interval::Daily => "1d",
            Interval::Weekly => "1wk",
            Interval::Monthly => "1mo",
        }
    }

    /// `w` is weekly, `m` is monthly, anything else daily.
    pub fn from_flag(flag: char) -> Self {
        match flag {
            'w' | 'W' => Interval::Weekly,
            'm' | 'M' => Interval::Monthly,
            _ => Interval::Daily,
        }
    }
}

/// Scale of a large number written with an English suffix, e.g. `K` = 1,000, `B` = 1 billion.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ScaleUnit {
    #[default]
    One,
    Thousand,
    Million,
    Billion,
    Trillion,
    Quadrillion,
}

impl ScaleUnit {
    pub fn from_char(c: char) -> Self {
        match c.to_ascii_uppercase() {
            'K' => ScaleUnit::Thousand,
            'M' => ScaleUnit::Million,
            'B' => ScaleUnit::Billion,
            'T' => ScaleUnit::Trillion,
            'Q' => ScaleUnit::Quadrillion,
            _ => ScaleUnit::One,
        }
    }

    /// Looks at the first character only; empty input is `One`.
    pub fn from_str_lossy(text: &str) -> Self {
        text.chars().next().map(Self::from_char).unwrap_or_default()
    }

    pub fn multiplier(&self) -> u64 {
        match self {
            ScaleUnit::One => 1,
            ScaleUnit::Thousand => 1_000,
            ScaleUnit::Million => 1_000_000,
            ScaleUnit::Billion => 1_000_000_000,
            ScaleUnit::Trillion => 1_000_000_000_000,
            ScaleUnit::Quadrillion => 1_000_000_000_000_000,
        }
    }

    pub fn to_decimal(&self) -> BigDecimal {
        BigDecimal::from(self.multiplier())
    }

    pub fn as_char(&self) -> char {
        match self {
            ScaleUnit::One => ' ',
            ScaleUnit::Thousand => 'K',
            ScaleUnit::Million => 'M',
            ScaleUnit::Billion => 'B',
            ScaleUnit::Trillion => 'T',
            ScaleUnit::Quadrillion => 'Q',
        }
    }
}

impl fmt::Display for ScaleUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_char())
    }
}

/// A base value with its scale unit, e.g. `1.35B`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecimalWithUnit {
    pub base_value: BigDecimal,
    pub scale_unit: ScaleUnit,
}

impl DecimalWithUnit {
    pub fn new(base_value: BigDecimal, scale_unit: ScaleUnit) -> Self {
        Self {
            base_value,
            scale_unit,
        }
    }

    /// The full value, base multiplied by the unit.
    pub fn value(&self) -> BigDecimal {
        &self.base_value * self.scale_unit.to_decimal()
    }
}

impl fmt::Display for DecimalWithUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.scale_unit {
            ScaleUnit::One => write!(f, "{}", self.base_value),
            unit => write!(f, "{}{}", self.base_value, unit),
        }
    }
}

/// Ratio written as `a:b`, e.g. a stock split of `1:3`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FactorRatio {
    pub left_value: BigDecimal,
    pub right_value: BigDecimal,
}

impl fmt::Display for FactorRatio {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.left_value, self.right_value)
    }
}

/// One row of historical prices of a stock or index.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoricalQuote {
    pub symbol: String,
    pub trade_date: NaiveDate,
    pub open_price: BigDecimal,
    pub high_price: BigDecimal,
    pub low_price: BigDecimal,
    pub close_price: BigDecimal,
    pub adjust_price: BigDecimal,
    pub volume: i64,
}

impl HistoricalQuote {
    /// Build from the download CSV columns `Date,Open,High,Low,Close,Adj Close,Volume`.
    ///
    /// Returns `None` when there are fewer than seven fields or any of them does not
    /// parse (Yahoo! writes `null` for days without trading).
    pub fn from_csv_fields<S: AsRef<str>>(symbol: &str, fields: &[S]) -> Option<Self> {
        if fields.len() < 7 {
            return None;
        }
        let field = |i: usize| fields[i].as_ref().trim();
        let decimal = |i: usize| BigDecimal::from_str(field(i)).ok();

        Some(Self {
            symbol: symbol.to_string(),
            trade_date: NaiveDate::parse_from_str(field(0), CSV_DATE_FORMAT).ok()?,
            open_price: decimal(1)?,
            high_price: decimal(2)?,
            low_price: decimal(3)?,
            close_price: decimal(4)?,
            adjust_price: decimal(5)?,
            volume: field(6).parse().ok()?,
        })
    }

    pub fn is_bullish(&self) -> bool {
        self.open_price < self.close_price
    }
}

/// A component stock of a stock index.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexComponent {
    pub symbol: String,
    pub company_name: String,
    pub last_price: BigDecimal,
    pub change: BigDecimal,
    pub percent_change: BigDecimal,
    pub volume: i64,
}

impl IndexComponent {
    /// Cells in table order: symbol, company, last price, change, % change, volume.
    pub fn from_cells<S: AsRef<str>>(cells: &[S]) -> Option<Self> {
        if cells.len() < 6 {
            return None;
        }
        let strip = |i: usize| cells[i].as_ref().replace([',', '%'], "");
        let decimal = |i: usize| BigDecimal::from_str(strip(i).trim()).ok();

        Some(Self {
            symbol: cells[0].as_ref().to_string(),
            company_name: cells[1].as_ref().to_string(),
            last_price: decimal(2)?,
            change: decimal(3)?,
            percent_change: decimal(4)?,
            volume: strip(5).trim().parse().ok()?,
        })
    }
}

/// All components of a stock index at download time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexComponentInfo {
    pub symbol: String,
    pub download_date_time: NaiveDateTime,
    pub currency_code: String,
    pub components: Vec<IndexComponent>,
}

/// Summary of a stock quote as shown on its quote page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SummaryQuote {
    pub symbol: String,
    pub download_date_time: NaiveDateTime,
    pub company_name: String,
    pub stock_exchange: String,
    pub currency_code: String,
    pub previous_price: BigDecimal,
    pub open_price: BigDecimal,
    pub bid_price: BigDecimal,
    pub bid_count: i32,
    pub ask_price: BigDecimal,
    pub ask_count: i32,
    pub day_low: BigDecimal,
    pub day_high: BigDecimal,
    pub fifty_two_week_low: BigDecimal,
    pub fifty_two_week_high: BigDecimal,
    pub volume: i64,
    pub average_volume: i64,
    /// Market Cap (intraday)
    pub market_cap: DecimalWithUnit,
    /// Beta (5Y Monthly)
    pub beta: BigDecimal,
    /// P/E ratio (TTM)
    pub pe_ratio: BigDecimal,
    /// Earnings per share (TTM)
    pub eps: BigDecimal,
    pub earnings_date: Option<NaiveDate>,
    pub forward_dividend: BigDecimal,
    pub forward_yield_percent: BigDecimal,
    pub ex_dividend_date: Option<NaiveDate>,
    /// 1y target estimate
    pub one_year_est: BigDecimal,
}

impl SummaryQuote {
    pub fn description(&self) -> String {
        format!("{} - {}", self.symbol, self.company_name)
    }
}

/// Key statistics of a stock. TTM = trailing twelve months, MRQ = most recent quarter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeyStatistics {
    // Identity
    pub symbol: String,
    pub download_date_time: NaiveDateTime,
    pub company_name: String,
    pub stock_exchange: String,
    pub currency_code: String,

    // Valuation measures
    /// Market Cap (intraday)
    pub market_cap: DecimalWithUnit,
    pub enterprise_value: DecimalWithUnit,
    pub trailing_pe: BigDecimal,
    pub forward_pe: BigDecimal,
    /// PEG Ratio (5 yr expected)
    pub peg_ratio: BigDecimal,
    /// Price/Sales (TTM)
    pub price_sales_ratio: BigDecimal,
    /// Price/Book (MRQ)
    pub price_book_ratio: BigDecimal,
    pub enterprise_value_revenue_ratio: BigDecimal,
    pub enterprise_value_ebitda_ratio: BigDecimal,

    // Fiscal year
    pub fiscal_year_ends: Option<NaiveDate>,
    pub most_recent_quarter: Option<NaiveDate>,

    // Profitability
    pub profit_margin_percent: BigDecimal,
    /// Operating Margin (TTM)
    pub operating_margin_percent: BigDecimal,

    // Management effectiveness
    /// Return on Assets (TTM)
    pub return_on_assets_percent: BigDecimal,
    /// Return on Equity (TTM)
    pub return_on_equity_percent: BigDecimal,

    // Income statement
    /// Revenue (TTM)
    pub revenue: DecimalWithUnit,
    pub revenue_per_share: BigDecimal,
    /// Quarterly Revenue Growth (yoy)
    pub quarterly_revenue_growth_percent: BigDecimal,
    pub gross_profit: DecimalWithUnit,
    pub ebitda: DecimalWithUnit,
    /// Net Income Avi to Common (TTM)
    pub net_income_avi_to_common: DecimalWithUnit,
    /// Diluted EPS (TTM)
    pub diluted_eps: BigDecimal,
    /// Quarterly Earnings Growth (yoy)
    pub quarterly_earnings_growth_percent: BigDecimal,

    // Balance sheet
    pub total_cash: DecimalWithUnit,
    pub total_cash_per_share: BigDecimal,
    pub total_debt: DecimalWithUnit,
    pub total_debt_equity_ratio: BigDecimal,
    pub current_ratio: BigDecimal,
    pub book_value_per_share: BigDecimal,

    // Cash flow statement
    pub operating_cash_flow: DecimalWithUnit,
    pub levered_free_cash_flow: DecimalWithUnit,

    // Stock price history
    /// Beta (5Y Monthly)
    pub beta: BigDecimal,
    pub fifty_two_week_change_percent: BigDecimal,
    pub snp500_52_week_change_percent: BigDecimal,
    pub fifty_two_week_high: BigDecimal,
    pub fifty_two_week_low: BigDecimal,
    pub fifty_day_moving_average: BigDecimal,
    pub two_hundred_day_moving_average: BigDecimal,

    // Share statistics
    pub avg_vol_3_month: DecimalWithUnit,
    pub avg_vol_10_day: DecimalWithUnit,
    pub shares_outstanding: DecimalWithUnit,
    pub implied_shares_outstanding: DecimalWithUnit,
    /// Shares available for public trading.
    pub shares_float: DecimalWithUnit,
    pub held_by_insiders_percent: BigDecimal,
    pub held_by_institutions: BigDecimal,
    pub shares_short: DecimalWithUnit,
    pub short_ratio: BigDecimal,
    pub short_percent_of_float: BigDecimal,
    pub shares_outstanding_short_percent: BigDecimal,
    pub shares_short_prior_month: DecimalWithUnit,

    // Dividends & splits
    pub forward_annual_dividend_rate: BigDecimal,
    pub forward_annual_dividend_yield_percent: BigDecimal,
    pub trailing_annual_dividend_rate: BigDecimal,
    pub trailing_annual_dividend_yield_percent: BigDecimal,
    pub five_year_average_dividend_yield_percent: BigDecimal,
    pub payout_ratio_percent: BigDecimal,
    pub dividend_date: Option<NaiveDate>,
    pub ex_dividend_date: Option<NaiveDate>,
    pub last_split_factor: FactorRatio,
    pub last_split_date: Option<NaiveDate>,
}

impl KeyStatistics {
    pub fn description(&self) -> String {
        format!("{} - {}", self.symbol, self.company_name)
    }
}

/// Either kind of per-stock quote page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum StockQuote {
    Summary(SummaryQuote),
    KeyStatistics(KeyStatistics),
}

impl StockQuote {
    pub fn symbol(&self) -> &str {
        match self {
            StockQuote::Summary(q) => &q.symbol,
            StockQuote::KeyStatistics(s) => &s.symbol,
        }
    }

    pub fn description(&self) -> String {
        match self {
            StockQuote::Summary(q) => q.description(),
            StockQuote::KeyStatistics(s) => s.description(),
        }
    }
}

impl From<SummaryQuote> for StockQuote {
    fn from(quote: SummaryQuote) -> Self {
        StockQuote::Summary(quote)
    }
}

impl From<KeyStatistics> for StockQuote {
    fn from(stats: KeyStatistics) -> Self {
        StockQuote::KeyStatistics(stats)
    }
}

/// Output of the export pipeline's transform step.
#[derive(Debug, Clone)]
pub struct ExportBundle {
    pub quotes: Vec<HistoricalQuote>,
    pub csv_output: String,
    pub json_output: String,
    /// symbol -> year -> number of bullish days
    pub bullish_days: BTreeMap<String, BTreeMap<i32, u64>>,
}
