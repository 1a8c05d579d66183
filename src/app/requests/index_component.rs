use super::{parse_selector, RequestBase, NOT_AVAILABLE};
use crate::adapters::http::get_text;
use crate::config::ClientConfig;
use crate::domain::model::{IndexComponent, IndexComponentInfo};
use crate::utils::error::{Result, YFinanceError};
use crate::utils::text::element_text;
use chrono::Local;
use regex::Regex;
use reqwest::Client;
use scraper::{ElementRef, Html, Selector};
use std::sync::{Arc, LazyLock};
use tokio::task::JoinHandle;

static COMP_CURRENCY_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)Currency\sin\s(\w+)").expect("currency pattern is valid"));

const CSS_SELECT_CURRENCY: &str = "div[class*=My] > span:nth-child(1)";

static CURRENCY_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| parse_selector(CSS_SELECT_CURRENCY));

const CSS_SELECT_ROW: &str = "tr.BdT";

static ROW_SELECTOR: LazyLock<Selector> = LazyLock::new(|| parse_selector(CSS_SELECT_ROW));

/// Scrape an index components page. Rows that do not parse are skipped.
pub fn parse_index_components(body: &str, symbol: &str) -> IndexComponentInfo {
    let document = Html::parse_document(body);

    let currency_code = document
        .select(&CURRENCY_SELECTOR)
        .next()
        .map(element_text)
        .and_then(|line| {
            COMP_CURRENCY_PATTERN
                .captures(&line)
                .map(|caps| caps[1].to_string())
        })
        .unwrap_or_else(|| NOT_AVAILABLE.to_string());

    // symbol, company, last price, change, % change, volume
    let mut components = Vec::new();
    for (i, row) in document.select(&ROW_SELECTOR).enumerate() {
        let cells: Vec<String> = row
            .children()
            .filter_map(ElementRef::wrap)
            .filter(|cell| cell.value().name() == "td")
            .map(element_text)
            .collect();

        match IndexComponent::from_cells(&cells) {
            Some(component) => components.push(component),
            None => tracing::debug!("Skipping component row {} of {}", i, symbol),
        }
    }

    IndexComponentInfo {
        symbol: symbol.to_string(),
        download_date_time: Local::now().naive_local(),
        currency_code,
        components,
    }
}

/// Builder for the component list of a stock index such as `^FTSE`.
#[derive(Debug, Clone)]
pub struct IndexComponentRequest {
    base: RequestBase,
    rejected_symbol: Option<String>,
}

impl IndexComponentRequest {
    pub fn new(client: Client, config: Arc<ClientConfig>) -> Self {
        Self {
            base: RequestBase::new(client, config),
            rejected_symbol: None,
        }
    }

    /// Only index symbols, which start with `^`, are kept.
    pub fn symbol(mut self, symbol: &str) -> Self {
        if symbol.trim().starts_with('^') {
            self.base.set_symbol(symbol);
            self.rejected_symbol = None;
        } else {
            self.base.clear_symbol();
            self.rejected_symbol = Some(symbol.to_string());
        }
        self
    }

    pub fn timeout(mut self, timeout_ms: u64) -> Self {
        self.base.set_timeout(timeout_ms);
        self
    }

    pub fn target_url(&self) -> String {
        let code = self.base.encoded_symbol();
        format!(
            "{}/quote/{}/components?p={}",
            self.base.config().quote_base_url.trim_end_matches('/'),
            code,
            code
        )
    }

    pub async fn fetch(&self) -> Result<IndexComponentInfo> {
        if let Some(rejected) = &self.rejected_symbol {
            return Err(YFinanceError::InvalidSymbol {
                symbol: rejected.clone(),
                reason: "Index symbol must start with '^'".to_string(),
            });
        }
        let symbol = self.base.require_symbol()?;
        tracing::info!("Fetching components of {}", symbol);

        let body = get_text(self.base.client(), &self.target_url(), self.base.timeout_ms()).await?;
        let info = parse_index_components(&body, &symbol);

        tracing::info!(
            "Found {} components of {} ({})",
            info.components.len(),
            symbol,
            info.currency_code
        );
        Ok(info)
    }

    pub fn spawn(self) -> JoinHandle<Result<IndexComponentInfo>> {
        tokio::spawn(async move { self.fetch().await })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bigdecimal::BigDecimal;
    use httpmock::prelude::*;
    use std::str::FromStr;

    fn component_row(cells: [&str; 6]) -> String {
        let tds: String = cells.iter().map(|c| format!("<td>{}</td>", c)).collect();
        format!("<tr class=\"BdT Bdc($seperatorColor)\">{}</tr>", tds)
    }

    fn components_page() -> String {
        format!(
            r#"<html><body>
<div class="D(ib) My(6px)"><span>FTSE Index - FTSE Delayed Price. Currency in GBP</span></div>
<table><thead><tr><th>Symbol</th></tr></thead><tbody>{}{}{}</tbody></table>
</body></html>"#,
            component_row(["AAL.L", "Anglo American plc", "3,012.50", "-21.50", "-0.71%", "1,234,567"]),
            component_row(["ABF.L", "Associated British Foods plc", "1,632.00", "+12.00", "+0.74%", "-"]),
            component_row(["AZN.L", "AstraZeneca PLC", "10,890.00", "104.00", "0.96%", "2,045,112"]),
        )
    }

    #[test]
    fn test_parse_index_components_skips_bad_rows() {
        let info = parse_index_components(&components_page(), "^FTSE");

        assert_eq!(info.symbol, "^FTSE");
        assert_eq!(info.currency_code, "GBP");
        assert_eq!(info.components.len(), 2);
        assert_eq!(info.components[0].symbol, "AAL.L");
        assert_eq!(info.components[1].company_name, "AstraZeneca PLC");
        assert_eq!(
            info.components[1].last_price,
            BigDecimal::from_str("10890.00").unwrap()
        );
    }

    #[test]
    fn test_short_row_does_not_shift_later_rows() {
        let short_row = "<tr class=\"BdT\"><td>BAD.L</td><td>Broken plc</td><td>1.00</td><td>0.01</td><td>1.00%</td></tr>";
        let page = format!(
            r#"<html><body><table><tbody>{}{}{}</tbody></table></body></html>"#,
            component_row(["AAL.L", "Anglo American plc", "3,012.50", "-21.50", "-0.71%", "1,234,567"]),
            short_row,
            component_row(["AZN.L", "AstraZeneca PLC", "10,890.00", "104.00", "0.96%", "2,045,112"]),
        );

        let info = parse_index_components(&page, "^FTSE");

        assert_eq!(info.components.len(), 2);
        assert_eq!(info.components[1].symbol, "AZN.L");
        assert_eq!(info.components[1].company_name, "AstraZeneca PLC");
        assert_eq!(info.components[1].volume, 2_045_112);
    }

    #[test]
    fn test_missing_currency_is_not_available() {
        let info = parse_index_components("<html><body><table></table></body></html>", "^FTSE");
        assert_eq!(info.currency_code, "N/A");
        assert!(info.components.is_empty());
    }

    #[tokio::test]
    async fn test_non_index_symbol_is_rejected() {
        let request = IndexComponentRequest::new(Client::new(), Arc::new(ClientConfig::default()))
            .symbol("GOOG");
        let err = request.fetch().await.unwrap_err();
        match err {
            YFinanceError::InvalidSymbol { symbol, .. } => assert_eq!(symbol, "GOOG"),
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_fetch_components() {
        let server = MockServer::start();
        let page_mock = server.mock(|when, then| {
            when.method(GET).path_contains("/components");
            then.status(200).body(components_page());
        });

        let config = ClientConfig::default().with_base_url(&server.base_url());
        let client = crate::adapters::http::build_http_client(&config).unwrap();
        let info = IndexComponentRequest::new(client, Arc::new(config))
            .symbol("^ftse")
            .spawn()
            .await
            .unwrap()
            .unwrap();

        page_mock.assert();
        assert_eq!(info.symbol, "^FTSE");
        assert_eq!(info.components.len(), 2);
    }

    #[test]
    fn test_target_url() {
        let request = IndexComponentRequest::new(Client::new(), Arc::new(ClientConfig::default()))
            .symbol("^FTSE");
        assert_eq!(
            request.target_url(),
            "https://finance.yahoo.com/quote/%5EFTSE/components?p=%5EFTSE"
        );
    }
}
