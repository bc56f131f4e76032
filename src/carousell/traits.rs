use anyhow::Result;
use async_trait::async_trait;
use serde_json::Value;

use crate::carousell::types::SearchQuery;

/// Upstream API surface for one Carousell region.
/// The production implementation talks HTTP; tests substitute canned
/// responses so the feed pipeline runs without network access.
#[async_trait]
pub trait CarousellApi: Send + Sync {
    /// Run a product search and return the parsed response body
    async fn search(&self, base_url: &str, query: &SearchQuery) -> Result<Value>;

    /// Fetch one listing's detail document by item id
    async fn listing(&self, base_url: &str, item_id: &str) -> Result<Value>;
}
