use super::{parse_company_name, parse_exchange_currency, parse_selector, Cells, RequestBase};
use crate::adapters::http::get_text;
use crate::config::ClientConfig;
use crate::domain::model::KeyStatistics;
use crate::utils::error::Result;
use crate::utils::text::{
    parse_date, parse_decimal, parse_decimal_and_unit, parse_decimal_percent, parse_factor_ratio,
};
use chrono::Local;
use reqwest::Client;
use scraper::{Html, Selector};
use std::sync::{Arc, LazyLock};
use tokio::task::JoinHandle;

const CSS_SELECT_VALUATION: &str = "tr.fi-row > td:nth-child(2)";
const CSS_SELECT_FINANCIAL: &str = "div[class*=Fl]:nth-child(3) > div:nth-child(2) > div > div:nth-child(1) > div:nth-child(1) > table:nth-child(2) > tbody:nth-child(1) > tr > td:nth-child(2)";
// Older layout of the financial highlights column
const CSS_SELECT_FINANCIAL_ALT: &str = "div[class*=Mb]:nth-child(3) > div > div:nth-child(1) > div:nth-child(1) > table:nth-child(2) > tbody:nth-child(1) > tr > td:nth-child(2)";
const CSS_SELECT_TRADING: &str = "div[class*=Pstart] > div > div:nth-child(1) > div:nth-child(1) > table:nth-child(2) > tbody:nth-child(1) > tr > td:nth-child(2)";

static VALUATION_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| parse_selector(CSS_SELECT_VALUATION));
static FINANCIAL_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| parse_selector(CSS_SELECT_FINANCIAL));
static FINANCIAL_ALT_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| parse_selector(CSS_SELECT_FINANCIAL_ALT));
static TRADING_SELECTOR: LazyLock<Selector> = LazyLock::new(|| parse_selector(CSS_SELECT_TRADING));

/// Scrape a key statistics page.
///
/// The page has three tables: valuation measures (9 rows), financial highlights
/// (22 rows) and trading information (29 rows). Cells are read by position.
pub fn parse_key_statistics(body: &str, symbol: &str) -> Result<KeyStatistics> {
    let document = Html::parse_document(body);

    let company_name = parse_company_name(&document, symbol)?;
    let (stock_exchange, currency_code) = parse_exchange_currency(&document)?;

    let valuation = Cells::select(&document, "valuation measures", CSS_SELECT_VALUATION, &VALUATION_SELECTOR);

    let mut financial = Cells::select(&document, "financial highlights", CSS_SELECT_FINANCIAL, &FINANCIAL_SELECTOR);
    if financial.is_empty() {
        tracing::debug!("Financial highlights not found, trying the alternate layout");
        financial = Cells::select(
            &document,
            "financial highlights",
            CSS_SELECT_FINANCIAL_ALT,
            &FINANCIAL_ALT_SELECTOR,
        );
    }

    let trading = Cells::select(&document, "trading information", CSS_SELECT_TRADING, &TRADING_SELECTOR);

    Ok(KeyStatistics {
        symbol: symbol.to_string(),
        download_date_time: Local::now().naive_local(),
        company_name,
        stock_exchange,
        currency_code,

        market_cap: parse_decimal_and_unit(valuation.get(0)?),
        enterprise_value: parse_decimal_and_unit(valuation.get(1)?),
        trailing_pe: parse_decimal(valuation.get(2)?),
        forward_pe: parse_decimal(valuation.get(3)?),
        peg_ratio: parse_decimal(valuation.get(4)?),
        price_sales_ratio: parse_decimal(valuation.get(5)?),
        price_book_ratio: parse_decimal(valuation.get(6)?),
        enterprise_value_revenue_ratio: parse_decimal(valuation.get(7)?),
        enterprise_value_ebitda_ratio: parse_decimal(valuation.get(8)?),

        fiscal_year_ends: parse_date(financial.get(0)?),
        most_recent_quarter: parse_date(financial.get(1)?),
        profit_margin_percent: parse_decimal_percent(financial.get(2)?),
        operating_margin_percent: parse_decimal_percent(financial.get(3)?),
        return_on_assets_percent: parse_decimal_percent(financial.get(4)?),
        return_on_equity_percent: parse_decimal_percent(financial.get(5)?),
        revenue: parse_decimal_and_unit(financial.get(6)?),
        revenue_per_share: parse_decimal(financial.get(7)?),
        quarterly_revenue_growth_percent: parse_decimal_percent(financial.get(8)?),
        gross_profit: parse_decimal_and_unit(financial.get(9)?),
        ebitda: parse_decimal_and_unit(financial.get(10)?),
        net_income_avi_to_common: parse_decimal_and_unit(financial.get(11)?),
        diluted_eps: parse_decimal(financial.get(12)?),
        quarterly_earnings_growth_percent: parse_decimal_percent(financial.get(13)?),
        total_cash: parse_decimal_and_unit(financial.get(14)?),
        total_cash_per_share: parse_decimal(financial.get(15)?),
        total_debt: parse_decimal_and_unit(financial.get(16)?),
        total_debt_equity_ratio: parse_decimal(financial.get(17)?),
        current_ratio: parse_decimal(financial.get(18)?),
        book_value_per_share: parse_decimal(financial.get(19)?),
        operating_cash_flow: parse_decimal_and_unit(financial.get(20)?),
        levered_free_cash_flow: parse_decimal_and_unit(financial.get(21)?),

        beta: parse_decimal(trading.get(0)?),
        fifty_two_week_change_percent: parse_decimal_percent(trading.get(1)?),
        snp500_52_week_change_percent: parse_decimal_percent(trading.get(2)?),
        fifty_two_week_high: parse_decimal(trading.get(3)?),
        fifty_two_week_low: parse_decimal(trading.get(4)?),
        fifty_day_moving_average: parse_decimal(trading.get(5)?),
        two_hundred_day_moving_average: parse_decimal(trading.get(6)?),
        avg_vol_3_month: parse_decimal_and_unit(trading.get(7)?),
        avg_vol_10_day: parse_decimal_and_unit(trading.get(8)?),
        shares_outstanding: parse_decimal_and_unit(trading.get(9)?),
        implied_shares_outstanding: parse_decimal_and_unit(trading.get(10)?),
        shares_float: parse_decimal_and_unit(trading.get(11)?),
        held_by_insiders_percent: parse_decimal_percent(trading.get(12)?),
        held_by_institutions: parse_decimal_percent(trading.get(13)?),
        shares_short: parse_decimal_and_unit(trading.get(14)?),
        short_ratio: parse_decimal(trading.get(15)?),
        short_percent_of_float: parse_decimal_percent(trading.get(16)?),
        shares_outstanding_short_percent: parse_decimal_percent(trading.get(17)?),
        shares_short_prior_month: parse_decimal_and_unit(trading.get(18)?),
        forward_annual_dividend_rate: parse_decimal(trading.get(19)?),
        forward_annual_dividend_yield_percent: parse_decimal_percent(trading.get(20)?),
        trailing_annual_dividend_rate: parse_decimal(trading.get(21)?),
        trailing_annual_dividend_yield_percent: parse_decimal_percent(trading.get(22)?),
        five_year_average_dividend_yield_percent: parse_decimal_percent(trading.get(23)?),
        payout_ratio_percent: parse_decimal_percent(trading.get(24)?),
        dividend_date: parse_date(trading.get(25)?),
        ex_dividend_date: parse_date(trading.get(26)?),
        last_split_factor: parse_factor_ratio(trading.get(27)?),
        last_split_date: parse_date(trading.get(28)?),
    })
}

/// Builder for the key statistics page of one stock.
#[derive(Debug, Clone)]
pub struct KeyStatisticsRequest {
    base: RequestBase,
}

impl KeyStatisticsRequest {
    pub fn new(client: Client, config: Arc<ClientConfig>) -> Self {
        Self {
            base: RequestBase::new(client, config),
        }
    }

    pub fn symbol(mut self, symbol: &str) -> Self {
        self.base.set_symbol(symbol);
        self
    }

    pub fn timeout(mut self, timeout_ms: u64) -> Self {
        self.base.set_timeout(timeout_ms);
        self
    }

    pub fn target_url(&self) -> String {
        let code = self.base.encoded_symbol();
        format!(
            "{}/quote/{}/key-statistics?p={}",
            self.base.config().quote_base_url.trim_end_matches('/'),
            code,
            code
        )
    }

    pub async fn fetch(&self) -> Result<KeyStatistics> {
        let symbol = self.base.require_symbol()?;
        tracing::info!("Fetching key statistics of {}", symbol);

        let body = get_text(self.base.client(), &self.target_url(), self.base.timeout_ms()).await?;
        let stats = parse_key_statistics(&body, &symbol)?;

        tracing::debug!("Parsed key statistics: {}", stats.description());
        Ok(stats)
    }

    pub fn spawn(self) -> JoinHandle<Result<KeyStatistics>> {
        tokio::spawn(async move { self.fetch().await })
    }
}
