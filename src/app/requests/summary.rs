use super::{parse_company_name, parse_exchange_currency, parse_selector, Cells, RequestBase};
use crate::adapters::http::get_text;
use crate::config::ClientConfig;
use crate::domain::model::SummaryQuote;
use crate::utils::error::Result;
use crate::utils::text::{
    parse_date, parse_decimal, parse_decimal_and_unit, parse_integer, parse_long,
};
use bigdecimal::BigDecimal;
use chrono::Local;
use regex::Regex;
use reqwest::Client;
use scraper::{Html, Selector};
use std::sync::{Arc, LazyLock};
use tokio::task::JoinHandle;

// "108.80 x 1,100"
static BID_ASK_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)([,\d]+\.?\d*)\s+x\s+([,\d]+)").expect("bid/ask pattern is valid")
});
// "107.51 - 110.11"
static PRICE_RANGE_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)([,\d]+\.?\d*)\s+-\s+([,\d]+\.?\d*)").expect("price range pattern is valid")
});
// "0.88 (2.46%)"
static FORWARD_DIVIDEND_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(\d+\.\d*)\s+\((\d+\.\d*)%\)").expect("dividend pattern is valid")
});

const CSS_SELECT_SUM_COL1: &str =
    "div[class*=W]:nth-child(1) > table:nth-child(1) > tbody:nth-child(1) > tr > td:nth-child(2)";
const CSS_SELECT_SUM_COL2: &str = "table[class*=M] > tbody:nth-child(1) > tr > td:nth-child(2)";

static SUM_COL1_SELECTOR: LazyLock<Selector> = LazyLock::new(|| parse_selector(CSS_SELECT_SUM_COL1));
static SUM_COL2_SELECTOR: LazyLock<Selector> = LazyLock::new(|| parse_selector(CSS_SELECT_SUM_COL2));

/// Both numbers of a `a x b` or `a - b` cell; zeros when the cell does not match.
fn decimal_pair(pattern: &Regex, text: &str) -> (BigDecimal, BigDecimal) {
    match pattern.captures(text) {
        Some(caps) => (parse_decimal(&caps[1]), parse_decimal(&caps[2])),
        None => (BigDecimal::from(0), BigDecimal::from(0)),
    }
}

fn price_and_count(text: &str) -> (BigDecimal, i32) {
    match BID_ASK_PATTERN.captures(text) {
        Some(caps) => (parse_decimal(&caps[1]), parse_integer(&caps[2])),
        None => (BigDecimal::from(0), 0),
    }
}

/// Scrape a quote summary page.
pub fn parse_summary_quote(body: &str, symbol: &str) -> Result<SummaryQuote> {
    let document = Html::parse_document(body);

    let company_name = parse_company_name(&document, symbol)?;
    let (stock_exchange, currency_code) = parse_exchange_currency(&document)?;

    let first = Cells::select(&document, "summary column 1", CSS_SELECT_SUM_COL1, &SUM_COL1_SELECTOR);
    let (bid_price, bid_count) = price_and_count(first.get(2)?);
    let (ask_price, ask_count) = price_and_count(first.get(3)?);
    let (day_low, day_high) = decimal_pair(&PRICE_RANGE_PATTERN, first.get(4)?);
    let (fifty_two_week_low, fifty_two_week_high) =
        decimal_pair(&PRICE_RANGE_PATTERN, first.get(5)?);

    let second = Cells::select(&document, "summary column 2", CSS_SELECT_SUM_COL2, &SUM_COL2_SELECTOR);
    let (forward_dividend, forward_yield_percent) =
        decimal_pair(&FORWARD_DIVIDEND_PATTERN, second.get(5)?);

    Ok(SummaryQuote {
        symbol: symbol.to_string(),
        download_date_time: Local::now().naive_local(),
        company_name,
        stock_exchange,
        currency_code,
        previous_price: parse_decimal(first.get(0)?),
        open_price: parse_decimal(first.get(1)?),
        bid_price,
        bid_count,
        ask_price,
        ask_count,
        day_low,
        day_high,
        fifty_two_week_low,
        fifty_two_week_high,
        volume: parse_long(first.get(6)?),
        average_volume: parse_long(first.get(7)?),
        market_cap: parse_decimal_and_unit(second.get(0)?),
        beta: parse_decimal(second.get(1)?),
        pe_ratio: parse_decimal(second.get(2)?),
        eps: parse_decimal(second.get(3)?),
        earnings_date: parse_date(second.get(4)?),
        forward_dividend,
        forward_yield_percent,
        ex_dividend_date: parse_date(second.get(6)?),
        one_year_est: parse_decimal(second.get(7)?),
    })
}

/// Builder for the quote summary page of one stock.
#[derive(Debug, Clone)]
pub struct SummaryQuoteRequest {
    base: RequestBase,
}

impl SummaryQuoteRequest {
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
            "{}/quote/{}?p={}",
            self.base.config().quote_base_url.trim_end_matches('/'),
            code,
            code
        )
    }

    pub async fn fetch(&self) -> Result<SummaryQuote> {
        let symbol = self.base.require_symbol()?;
        tracing::info!("Fetching summary quote of {}", symbol);

        let body = get_text(self.base.client(), &self.target_url(), self.base.timeout_ms()).await?;
        let quote = parse_summary_quote(&body, &symbol)?;

        tracing::debug!("Parsed summary quote: {}", quote.description());
        Ok(quote)
    }

    pub fn spawn(self) -> JoinHandle<Result<SummaryQuote>> {
        tokio::spawn(async move { self.fetch().await })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::http::build_http_client;
    use crate::app::requests::fixtures::{label_rows, page_header};
    use crate::domain::model::ScaleUnit;
    use crate::utils::error::YFinanceError;
    use chrono::NaiveDate;
    use httpmock::prelude::*;
    use std::str::FromStr;

    const COLUMN_1: [&str; 8] = [
        "108.95",
        "109.23",
        "108.80 x 1000",
        "108.90 x 1,100",
        "107.51 - 110.11",
        "101.88 - 151.55",
        "22,535,000",
        "31,236,482",
    ];

    const COLUMN_2: [&str; 8] = [
        "1.423T",
        "1.07",
        "19.92",
        "5.47",
        "Jul 26, 2022",
        "N/A (N/A)",
        "N/A",
        "142.93",
    ];

    fn summary_page(column_1: &[&str], column_2: &[&str]) -> String {
        format!(
            r#"<html><body>{}
<div id="quote-summary">
<div class="D(ib) W(1/2) Bxz(bb)"><table class="W(100%)"><tbody>{}</tbody></table></div>
<div class="D(ib) W(1/2) Bxz(bb)"><table class="W(100%) M(0) Bdcl(c)"><tbody>{}</tbody></table></div>
</div></body></html>"#,
            page_header("Alphabet Inc. (GOOG)", "NasdaqGS - NasdaqGS Real Time Price. Currency in USD"),
            label_rows(column_1),
            label_rows(column_2)
        )
    }

    fn dec(s: &str) -> BigDecimal {
        BigDecimal::from_str(s).unwrap()
    }

    #[test]
    fn test_parse_summary_quote() {
        let quote = parse_summary_quote(&summary_page(&COLUMN_1, &COLUMN_2), "GOOG").unwrap();

        assert_eq!(quote.company_name, "Alphabet Inc.");
        assert_eq!(quote.stock_exchange, "NasdaqGS");
        assert_eq!(quote.currency_code, "USD");
        assert_eq!(quote.previous_price, dec("108.95"));
        assert_eq!(quote.open_price, dec("109.23"));
        assert_eq!(quote.bid_price, dec("108.80"));
        assert_eq!(quote.bid_count, 1000);
        assert_eq!(quote.ask_count, 1100);
        assert_eq!(quote.day_low, dec("107.51"));
        assert_eq!(quote.day_high, dec("110.11"));
        assert_eq!(quote.fifty_two_week_high, dec("151.55"));
        assert_eq!(quote.volume, 22_535_000);
        assert_eq!(quote.average_volume, 31_236_482);
        assert_eq!(quote.market_cap.base_value, dec("1.423"));
        assert_eq!(quote.market_cap.scale_unit, ScaleUnit::Trillion);
        assert_eq!(quote.pe_ratio, dec("19.92"));
        assert_eq!(quote.earnings_date, NaiveDate::from_ymd_opt(2022, 7, 26));
        assert_eq!(quote.forward_dividend, dec("0"));
        assert_eq!(quote.ex_dividend_date, None);
        assert_eq!(quote.one_year_est, dec("142.93"));
        assert_eq!(quote.description(), "GOOG - Alphabet Inc.");
    }

    #[test]
    fn test_parse_summary_quote_with_dividend() {
        let mut column_2 = COLUMN_2;
        column_2[5] = "0.88 (2.46%)";
        column_2[6] = "Aug 11, 2022";

        let quote = parse_summary_quote(&summary_page(&COLUMN_1, &column_2), "GOOG").unwrap();
        assert_eq!(quote.forward_dividend, dec("0.88"));
        assert_eq!(quote.forward_yield_percent, dec("2.46"));
        assert_eq!(quote.ex_dividend_date, NaiveDate::from_ymd_opt(2022, 8, 11));
    }

    #[test]
    fn test_unparsable_volume_defaults_to_zero() {
        let mut column_1 = COLUMN_1;
        column_1[6] = "N/A";

        let quote = parse_summary_quote(&summary_page(&column_1, &COLUMN_2), "GOOG").unwrap();
        assert_eq!(quote.volume, 0);
    }

    #[test]
    fn test_missing_cell_is_reported() {
        let err = parse_summary_quote(&summary_page(&COLUMN_1, &COLUMN_2[..7]), "GOOG").unwrap_err();
        match err {
            YFinanceError::MissingElement { section, index, .. } => {
                assert_eq!(section, "summary column 2");
                assert_eq!(index, 7);
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_fetch_summary_quote() {
        let server = MockServer::start();
        let page_mock = server.mock(|when, then| {
            when.method(GET).path("/quote/GOOG").query_param("p", "GOOG");
            then.status(200)
                .header("Content-Type", "text/html")
                .body(summary_page(&COLUMN_1, &COLUMN_2));
        });

        let config = ClientConfig::default().with_base_url(&server.base_url());
        let client = build_http_client(&config).unwrap();
        let quote = SummaryQuoteRequest::new(client, Arc::new(config))
            .symbol("goog")
            .spawn()
            .await
            .unwrap()
            .unwrap();

        page_mock.assert();
        assert_eq!(quote.symbol, "GOOG");
        assert_eq!(quote.beta, dec("1.07"));
    }

    #[test]
    fn test_target_url_encodes_symbol() {
        let request = SummaryQuoteRequest::new(Client::new(), Arc::new(ClientConfig::default()))
            .symbol("0005.hk");
        assert_eq!(request.target_url(), "https://finance.yahoo.com/quote/0005.HK?p=0005.HK");
    }
}
