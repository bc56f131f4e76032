use std::time::Duration;

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde_json::{json, Map, Value};
use tracing::debug;

use crate::carousell::traits::CarousellApi;
use crate::carousell::types::SearchQuery;

/// Result count requested per search; the feed never grows past this.
pub const FEED_ITEM_LIMIT: u64 = 22;

const SEARCH_ENDPOINT: &str = "api-service/filter/search/3.3/products/";
const LISTING_ENDPOINT: &str = "api-service/listing/3.1/listings/";

/// Pause after each listing fetch to stay polite towards the API.
const LISTING_PAUSE: Duration = Duration::from_secs(1);

/// HTTP client for the Carousell search and listing endpoints.
pub struct CarousellClient {
    client: Client,
}

impl CarousellClient {
    pub fn new() -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .user_agent("Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36")
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self { client })
    }
}

/// Build the search POST body for a validated query. The price filter is
/// only attached when at least one bound is set; countryCode rides along
/// even though the API appears to key off countryId alone.
pub fn search_payload(query: &SearchQuery) -> Value {
    let mut filters = Vec::new();

    let mut ranged_float = Map::new();
    if let Some(min_price) = query.min_price {
        ranged_float.insert("start".to_string(), json!({ "value": min_price }));
    }
    if let Some(max_price) = query.max_price {
        ranged_float.insert("end".to_string(), json!({ "value": max_price }));
    }
    if !ranged_float.is_empty() {
        filters.push(json!({
            "rangedFloat": ranged_float,
            "fieldName": "price"
        }));
    }

    if query.used_only {
        filters.push(json!({
            "idsOrKeywords": { "value": ["USED"] },
            "fieldName": "condition_v2"
        }));
    }

    json!({
        "count": FEED_ITEM_LIMIT,
        "countryCode": query.country.code,
        "countryId": query.country.geocode,
        "filters": filters,
        "query": query.query,
        "sortParam": {
            "fieldName": "time_created"
        }
    })
}

/// Check an upstream response and parse its body as JSON. Bodies are only
/// dumped at debug level since they can be large.
fn process_response(context: &str, status: StatusCode, body: &str) -> Result<Value> {
    if !status.is_success() {
        debug!("\"{}\" - error from source, dumping input:", context);
        debug!("{}", body);
        bail!("HTTP status from source: {}", status.as_u16());
    }

    match serde_json::from_str(body) {
        Ok(value) => Ok(value),
        Err(_) => {
            debug!("\"{}\" - invalid API response, dumping input:", context);
            debug!("{}", body);
            bail!("Invalid API response")
        }
    }
}

#[async_trait]
impl CarousellApi for CarousellClient {
    async fn search(&self, base_url: &str, query: &SearchQuery) -> Result<Value> {
        let search_url = format!("{}{}", base_url, SEARCH_ENDPOINT);
        let payload = search_payload(query);

        debug!("\"{}\" - querying endpoint: {}", query.query, search_url);
        debug!("\"{}\" - payload: {}", query.query, payload);
        let response = self
            .client
            .post(&search_url)
            .json(&payload)
            .send()
            .await
            .context("Failed to reach the search endpoint")?;

        let status = response.status();
        let body = response
            .text()
            .await
            .context("Failed to read response body")?;

        process_response(&query.query, status, &body)
    }

    async fn listing(&self, base_url: &str, item_id: &str) -> Result<Value> {
        let listing_url = format!("{}{}{}", base_url, LISTING_ENDPOINT, item_id);

        debug!("querying endpoint: {}", listing_url);
        let response = self
            .client
            .get(&listing_url)
            .send()
            .await
            .context("Failed to reach the listing endpoint")?;

        let status = response.status();
        let body = response
            .text()
            .await
            .context("Failed to read response body")?;
        tokio::time::sleep(LISTING_PAUSE).await;

        process_response(item_id, status, &body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::matching_country;

    fn query(min: Option<u64>, max: Option<u64>, used_only: bool) -> SearchQuery {
        SearchQuery {
            query: "red shoes".to_string(),
            country: matching_country("SG"),
            min_price: min,
            max_price: max,
            used_only,
            strict: false,
        }
    }

    #[test]
    fn payload_without_filters() {
        let payload = search_payload(&query(None, None, false));

        assert_eq!(payload["count"], 22);
        assert_eq!(payload["countryCode"], "SG");
        assert_eq!(payload["countryId"], "1880251");
        assert_eq!(payload["query"], "red shoes");
        assert_eq!(payload["sortParam"]["fieldName"], "time_created");
        assert_eq!(payload["filters"].as_array().map(Vec::len), Some(0));
    }

    #[test]
    fn payload_with_price_range() {
        let payload = search_payload(&query(Some(10), Some(50), false));

        let filters = payload["filters"].as_array().expect("filters array");
        assert_eq!(filters.len(), 1);
        assert_eq!(filters[0]["fieldName"], "price");
        assert_eq!(filters[0]["rangedFloat"]["start"]["value"], 10);
        assert_eq!(filters[0]["rangedFloat"]["end"]["value"], 50);
    }

    #[test]
    fn payload_with_min_price_only_has_no_end_bound() {
        let payload = search_payload(&query(Some(10), None, false));

        let ranged = &payload["filters"][0]["rangedFloat"];
        assert_eq!(ranged["start"]["value"], 10);
        assert!(ranged.get("end").is_none());
    }

    #[test]
    fn payload_used_filter_follows_price_filter() {
        let payload = search_payload(&query(None, Some(50), true));

        let filters = payload["filters"].as_array().expect("filters array");
        assert_eq!(filters.len(), 2);
        assert_eq!(filters[0]["fieldName"], "price");
        assert_eq!(filters[1]["fieldName"], "condition_v2");
        assert_eq!(filters[1]["idsOrKeywords"]["value"][0], "USED");
    }

    #[test]
    fn error_status_surfaces_the_code() {
        let error = process_response("bag", StatusCode::BAD_GATEWAY, "oops").unwrap_err();

        assert_eq!(error.to_string(), "HTTP status from source: 502");
    }

    #[test]
    fn unparseable_body_is_an_invalid_response() {
        let error = process_response("bag", StatusCode::OK, "<html>not json</html>").unwrap_err();

        assert_eq!(error.to_string(), "Invalid API response");
    }

    #[test]
    fn valid_body_parses_to_json() {
        let value = process_response("bag", StatusCode::OK, r#"{"data":{}}"#).expect("json value");

        assert!(value["data"].is_object());
    }
}
