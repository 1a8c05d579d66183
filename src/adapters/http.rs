use crate::config::ClientConfig;
use crate::utils::error::{Result, YFinanceError};
use reqwest::{redirect, Client};
use std::time::Duration;

/// Shared client: connect and read timeouts, redirects followed, browser-like user agent.
pub fn build_http_client(config: &ClientConfig) -> Result<Client> {
    let timeout = Duration::from_millis(config.timeout_ms);
    let client = Client::builder()
        .connect_timeout(timeout)
        .timeout(timeout)
        .redirect(redirect::Policy::limited(10))
        .user_agent(config.user_agent.as_str())
        .build()?;
    Ok(client)
}

/// GET `url` and return the body; a non-success status is an error.
pub async fn get_text(client: &Client, url: &str, timeout_ms: u64) -> Result<String> {
    tracing::debug!("GET {}", url);
    let response = client
        .get(url)
        .timeout(Duration::from_millis(timeout_ms))
        .send()
        .await?;

    let status = response.status();
    tracing::debug!("Response status {} for {}", status, url);
    if !status.is_success() {
        return Err(YFinanceError::UnsuccessfulStatus {
            status: status.as_u16(),
            url: url.to_string(),
        });
    }

    Ok(response.text().await?)
}

/// Download a CSV document and map each data row with `map_fn`.
///
/// The header row is skipped. Rows that are malformed or that `map_fn` rejects are dropped.
pub async fn download_csv_to_list<T, F>(
    client: &Client,
    url: &str,
    timeout_ms: u64,
    mut map_fn: F,
) -> Result<Vec<T>>
where
    F: FnMut(&csv::StringRecord) -> Option<T>,
{
    let body = get_text(client, url, timeout_ms).await?;
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(body.as_bytes());

    let mut records = Vec::new();
    let mut skipped = 0usize;
    for row in reader.records() {
        let mapped = match row {
            Ok(record) => map_fn(&record),
            Err(_) => None,
        };
        match mapped {
            Some(record) => records.push(record),
            None => skipped += 1,
        }
    }

    tracing::debug!(
        "Mapped {} records from {} ({} rows skipped)",
        records.len(),
        url,
        skipped
    );
    Ok(records)
}
