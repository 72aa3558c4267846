//! HTTP clients for the Open Assembly portal and the news search API.

use std::time::Duration;

use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use url::Url;

use crate::{
    query::{BillQuery, MemberQuery, NewsQuery, Query, SnsQuery},
    types::{parse_envelope, BillRow, NewsSearchResponse, RosterRow, SnsRow},
    Error,
};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Service name of the full member roster.
pub const ROSTER_SERVICE: &str = "ALLNAMEMBER";
/// Service name of the sitting members' SNS accounts.
pub const SNS_SERVICE: &str = "negnlnyvatsjwocar";
/// Service name of the bill search by proposer.
pub const BILL_SERVICE: &str = "nzmimeepazxkubdpn";

/// Client for the Open Assembly portal (`open.assembly.go.kr`).
///
/// All services share one API key passed as the `KEY` query parameter.
pub struct OpenAssemblyClient {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl OpenAssemblyClient {
    /// Creates a client pointing at the production portal.
    pub fn new(api_key: String) -> Result<Self, Error> {
        Self::with_base_url("https://open.assembly.go.kr/portal/openapi", api_key)
    }

    /// Creates a client with a custom base URL. Used for testing with wiremock.
    pub fn with_base_url(base_url: &str, api_key: String) -> Result<Self, Error> {
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()?;
        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
        })
    }

    fn service_url(&self, service: &str, query: &impl Query) -> Result<Url, Error> {
        let url = Url::parse(&format!("{}/{}", self.base_url, service)).map_err(|e| {
            tracing::error!("Invalid URL constructed: {}", e);
            Error::UnexpectedShape(format!("invalid url for {}", service))
        })?;
        let mut url = query.add_to_url(&url);
        url.query_pairs_mut().append_pair("KEY", &self.api_key);
        Ok(url)
    }

    async fn rows<T: DeserializeOwned>(
        &self,
        service: &str,
        query: &impl Query,
    ) -> Result<Vec<T>, Error> {
        let url = self.service_url(service, query)?;
        let body = fetch_text(self.http.get(url)).await?;
        parse_envelope(service, &body).map_err(|e| {
            tracing::error!("Failed to parse {} page: {} | body: {}", service, e, truncate_body(&body));
            e
        })
    }

    /// Fetches one page of the full member roster.
    pub async fn members(&self, query: &MemberQuery) -> Result<Vec<RosterRow>, Error> {
        self.rows(ROSTER_SERVICE, query).await
    }

    /// Fetches the SNS accounts of sitting members.
    pub async fn sns(&self, query: &SnsQuery) -> Result<Vec<SnsRow>, Error> {
        self.rows(SNS_SERVICE, query).await
    }

    /// Fetches one page of bills matching a proposer and term.
    pub async fn bills(&self, query: &BillQuery) -> Result<Vec<BillRow>, Error> {
        self.rows(BILL_SERVICE, query).await
    }
}

/// Client for the news search API.
pub struct NewsSearchClient {
    http: reqwest::Client,
    base_url: String,
    client_id: String,
    client_secret: String,
}

impl NewsSearchClient {
    /// Creates a client pointing at the production search API.
    pub fn new(client_id: String, client_secret: String) -> Result<Self, Error> {
        Self::with_base_url("https://openapi.naver.com", client_id, client_secret)
    }

    /// Creates a client with a custom base URL. Used for testing with wiremock.
    pub fn with_base_url(
        base_url: &str,
        client_id: String,
        client_secret: String,
    ) -> Result<Self, Error> {
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()?;
        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            client_id,
            client_secret,
        })
    }

    /// Searches news articles, newest first by default.
    pub async fn search(&self, query: &NewsQuery) -> Result<NewsSearchResponse, Error> {
        let url = Url::parse(&format!("{}/v1/search/news.json", self.base_url)).map_err(|e| {
            tracing::error!("Invalid URL constructed: {}", e);
            Error::UnexpectedShape("invalid news search url".into())
        })?;
        let request = self
            .http
            .get(query.add_to_url(&url))
            .header("X-Naver-Client-Id", &self.client_id)
            .header("X-Naver-Client-Secret", &self.client_secret);
        let body = fetch_text(request).await?;
        serde_json::from_str(&body).map_err(|e| {
            tracing::error!("Failed to parse news search: {} | body: {}", e, truncate_body(&body));
            Error::Parse(e)
        })
    }
}

async fn fetch_text(request: reqwest::RequestBuilder) -> Result<String, Error> {
    let resp = request.send().await.map_err(|e| {
        tracing::error!("Failed to get resource: {}", e);
        Error::Request(e)
    })?;

    let status = resp.status();
    if status == StatusCode::TOO_MANY_REQUESTS {
        tracing::warn!("Upstream rate limit hit");
        return Err(Error::RateLimited);
    }

    let body = resp.text().await?;
    if !status.is_success() {
        let snippet = truncate_body(&body);
        tracing::error!("Request failed with status {}: {}", status, snippet);
        return Err(Error::HttpStatus {
            status: status.as_u16(),
            body: snippet,
        });
    }
    Ok(body)
}

fn truncate_body(body: &str) -> String {
    const MAX: usize = 2000;
    if body.len() <= MAX {
        body.to_string()
    } else {
        let mut end = MAX;
        while !body.is_char_boundary(end) {
            end -= 1;
        }
        format!("{}...[truncated]", &body[..end])
    }
}

#[cfg(test)]
mod tests {
    use super::truncate_body;

    #[test]
    fn truncate_respects_char_boundaries() {
        let body = "가".repeat(1000);
        let out = truncate_body(&body);
        assert!(out.ends_with("...[truncated]"));
        assert!(out.len() <= 2000 + "...[truncated]".len());
    }

    #[test]
    fn short_bodies_are_untouched() {
        assert_eq!(truncate_body("ok"), "ok");
    }
}
