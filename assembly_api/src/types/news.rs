//! News search response types.

use serde::{Deserialize, Serialize};

/// Body of a news search response.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewsSearchResponse {
    #[serde(default)]
    pub total: i64,
    pub items: Vec<NewsSearchItem>,
}

/// One search hit. Title and description carry `<b>` highlight markup.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewsSearchItem {
    pub title: String,
    /// Publisher link; empty for some aggregator-only articles.
    #[serde(rename = "originallink", default)]
    pub original_link: Option<String>,
    /// Canonical aggregator link, used as the dedup key.
    pub link: String,
    #[serde(default)]
    pub description: String,
    /// RFC 2822 timestamp, e.g. "Mon, 12 Jan 2026 08:50:00 +0900".
    #[serde(rename = "pubDate")]
    pub pub_date: String,
}
