use std::collections::HashSet;

use anyhow::Result;
use chrono::{DateTime, NaiveDateTime, SecondsFormat, Utc};
use serde_json::{Map, Value};
use tracing::{debug, info, warn};

use crate::carousell::folds::flatten_fold;
use crate::carousell::sanitize::clean_content;
use crate::carousell::traits::CarousellApi;
use crate::carousell::types::SearchQuery;
use crate::models::{prune_empty, JsonFeed, JsonFeedAuthor, JsonFeedItem, JSONFEED_VERSION};

/// Above-fold keys that may carry the creation time, in lookup order.
const TIMESTAMP_KEYS: [&str; 3] = ["time_created", "expired_bump", "active_bump"];

/// Timestamp format served by the per-listing detail endpoint.
const LISTING_TIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%SZ";

/// Run a search and assemble the full feed. Validation errors never reach
/// this point; any error returned here is an upstream failure. The final
/// value has all empty fields pruned, ready for serialization.
pub async fn build_feed(api: &dyn CarousellApi, query: &SearchQuery) -> Result<Value> {
    let base_url = format!("https://{}/", query.country.domain);

    let response = api.search(&base_url, query).await?;

    let terms = strict_terms(&query.query);
    if query.strict {
        debug!(
            "\"{}\" - strict mode enabled, title must contain: {:?}",
            query.query, terms
        );
    }

    let mut feed = top_level_feed(&base_url, query);

    let results = response
        .pointer("/data/results")
        .and_then(Value::as_array)
        .filter(|results| !results.is_empty());

    if let Some(results) = results {
        for result in results {
            let Some(card) = result.get("listingCard") else {
                warn!(
                    "\"{}\" - search result without a listingCard, skipping",
                    query.query
                );
                continue;
            };

            let Some(listing) = listing_item(api, &base_url, card, query).await else {
                continue;
            };

            if query.strict && !title_matches(&terms, &listing.title) {
                debug!(
                    "\"{}\" - strict mode - removed {} \"{}\"",
                    query.query, listing.item_id, listing.title
                );
                continue;
            }

            feed.items.push(listing.item);
        }

        info!(
            "\"{}\" - found {} - published {}",
            query.query,
            results.len(),
            feed.items.len()
        );
    }

    Ok(prune_empty(serde_json::to_value(feed)?))
}

/// Build the feed envelope before any items are known. The title names the
/// source domain and spells out the active filters; the home page URL
/// points back at the equivalent search on the site itself. Strict mode is
/// our own post-filter and has no upstream parameter to echo.
pub fn top_level_feed(base_url: &str, query: &SearchQuery) -> JsonFeed {
    let mut title_parts = vec![query.country.domain.to_string(), query.query.clone()];

    let mut filter_clauses = Vec::new();
    let mut search_params = vec![
        ("search", query.query.clone()),
        ("sort_by", "time_created,descending".to_string()),
    ];

    if let Some(min_price) = query.min_price {
        filter_clauses.push(format!("min {}", min_price));
        search_params.push(("price_start", min_price.to_string()));
    }

    if let Some(max_price) = query.max_price {
        filter_clauses.push(format!("max {}", max_price));
        search_params.push(("price_end", max_price.to_string()));
    }

    if query.used_only {
        filter_clauses.push("used only".to_string());
        search_params.push(("condition_v2", "USED".to_string()));
    }

    if query.strict {
        filter_clauses.push("strict".to_string());
    }

    if !filter_clauses.is_empty() {
        title_parts.push(format!("Filtered by {}", filter_clauses.join(", ")));
    }

    let query_string = search_params
        .iter()
        .map(|(key, value)| format!("{}={}", key, urlencoding::encode(value)))
        .collect::<Vec<_>>()
        .join("&");

    JsonFeed {
        version: JSONFEED_VERSION,
        title: title_parts.join(" - "),
        home_page_url: format!("{}search/products/?{}", base_url, query_string),
        favicon: format!("{}favicon.ico", base_url),
        items: Vec::new(),
    }
}

/// An extracted listing, kept alongside the raw pieces the strict filter
/// and its logging need.
struct NormalizedListing {
    item: JsonFeedItem,
    item_id: String,
    title: String,
}

/// Normalize one listing card into a feed item. Cards without an id are
/// skipped with a warning; any other missing field degrades to an empty
/// value and gets pruned from the serialized feed later.
async fn listing_item(
    api: &dyn CarousellApi,
    base_url: &str,
    card: &Value,
    query: &SearchQuery,
) -> Option<NormalizedListing> {
    let Some(item_id) = card.get("id").and_then(Value::as_str) else {
        warn!("\"{}\" - listing card without an id, skipping", query.query);
        return None;
    };

    let item_url = format!("{}p/{}", base_url, item_id);

    let username = card
        .pointer("/seller/username")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string();

    let thumbnail = card
        .pointer("/photoUrls/0")
        .and_then(Value::as_str)
        .map(str::to_string);

    let above_fold = flatten_fold(fold_entries(card, "aboveFold"));
    let below_fold = flatten_fold(fold_entries(card, "belowFold"));

    let title = fold_text(&below_fold, "header_1");
    let price = fold_text(&below_fold, "header_2");
    let description = fold_text(&below_fold, "paragraph1");

    let timestamp = resolve_timestamp(api, base_url, item_id, &above_fold, query).await;
    let date_published = DateTime::from_timestamp(timestamp, 0)
        .unwrap_or_else(Utc::now)
        .to_rfc3339_opts(SecondsFormat::Secs, true);

    let mut content = String::new();
    if let Some(thumbnail) = &thumbnail {
        content.push_str(&format!(r#"<img src="{}" />"#, thumbnail));
    }
    if !description.is_empty() {
        content.push_str(&format!("<p>{}</p>", description));
    }

    let item = JsonFeedItem {
        id: item_url.clone(),
        url: item_url,
        title: format!("[{}] {}", price, title),
        content_html: clean_content(&content),
        date_published,
        author: Some(JsonFeedAuthor { name: username }),
        image: thumbnail,
    };

    Some(NormalizedListing {
        item,
        item_id: item_id.to_string(),
        title,
    })
}

/// Resolve a listing's creation time. The above-fold keys are tried in
/// order; only when none is present at all does the per-listing detail
/// endpoint get queried. A present key with an unusable value falls
/// straight through to the current time. Never fails.
async fn resolve_timestamp(
    api: &dyn CarousellApi,
    base_url: &str,
    item_id: &str,
    above_fold: &Map<String, Value>,
    query: &SearchQuery,
) -> i64 {
    for key in TIMESTAMP_KEYS {
        if let Some(value) = above_fold.get(key) {
            if let Some(seconds) = fold_seconds(value) {
                return seconds;
            }
            info!(
                "\"{}\" - using default timestamp for item {}",
                query.query, item_id
            );
            return Utc::now().timestamp();
        }
    }

    info!(
        "\"{}\" - time_created not found for item {}",
        query.query, item_id
    );

    match listing_time_created(api, base_url, item_id).await {
        Some(timestamp) => timestamp,
        None => {
            warn!(
                "\"{}\" - using default timestamp for item {}",
                query.query, item_id
            );
            Utc::now().timestamp()
        }
    }
}

/// Fetch the per-listing detail record and read its creation time.
async fn listing_time_created(
    api: &dyn CarousellApi,
    base_url: &str,
    item_id: &str,
) -> Option<i64> {
    let response = match api.listing(base_url, item_id).await {
        Ok(response) => response,
        Err(error) => {
            warn!("listing fetch failed for item {}: {}", item_id, error);
            return None;
        }
    };

    let raw = response.pointer("/data/time_created")?.as_str()?;

    match NaiveDateTime::parse_from_str(raw, LISTING_TIME_FORMAT) {
        Ok(parsed) => Some(parsed.and_utc().timestamp()),
        Err(error) => {
            warn!(
                "unparseable time_created {:?} for item {}: {}",
                raw, item_id, error
            );
            None
        }
    }
}

/// A fold array off a listing card, or an empty slice when missing.
fn fold_entries<'a>(card: &'a Value, key: &str) -> &'a [Value] {
    card.get(key)
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or_default()
}

/// Read a text field out of a flattened fold, defaulting to empty.
fn fold_text(fold: &Map<String, Value>, key: &str) -> String {
    fold.get(key)
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string()
}

/// Timestamps in folds arrive as a nested `{seconds: {low}}` structure.
fn fold_seconds(value: &Value) -> Option<i64> {
    value.get("seconds")?.get("low")?.as_i64()
}

/// Lowercased, deduplicated terms for strict title matching.
fn strict_terms(query_text: &str) -> HashSet<String> {
    query_text
        .split_whitespace()
        .map(str::to_lowercase)
        .collect()
}

/// Every term must appear somewhere in the title, case-insensitively.
/// An empty term set matches everything.
fn title_matches(terms: &HashSet<String>, title: &str) -> bool {
    let lowered = title.to_lowercase();
    terms.iter().all(|term| lowered.contains(term))
}
