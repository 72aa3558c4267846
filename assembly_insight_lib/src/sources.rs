//! Upstream fetch capabilities and their adapters over the portal clients.
//!
//! Pipeline stages depend only on these traits, so every stage can run
//! against in-memory fakes.

use async_trait::async_trait;

use assembly_api::types::{BillRow, NewsSearchItem, RosterRow, SnsRow};
use assembly_api::{
    BillQuery, MemberQuery, NewsQuery, NewsSearchClient, NewsSort, OpenAssemblyClient, Query,
    SnsQuery,
};

use crate::error::FetchError;

#[async_trait]
pub trait RosterSource: Send + Sync {
    async fn roster_page(&self, page: u32, page_size: u32) -> Result<Vec<RosterRow>, FetchError>;
}

#[async_trait]
pub trait SnsSource: Send + Sync {
    async fn sns_rows(&self) -> Result<Vec<SnsRow>, FetchError>;
}

#[async_trait]
pub trait NewsSource: Send + Sync {
    async fn search_news(&self, member_name: &str) -> Result<Vec<NewsSearchItem>, FetchError>;
}

#[async_trait]
pub trait BillSource: Send + Sync {
    async fn bills_page(
        &self,
        proposer: &str,
        page: u32,
        page_size: u32,
    ) -> Result<Vec<BillRow>, FetchError>;
}

/// Roster, SNS and bill services of the Open Assembly portal, with bill
/// searches scoped to one assembly term.
pub struct PortalSource {
    client: OpenAssemblyClient,
    term: u32,
}

impl PortalSource {
    pub fn new(client: OpenAssemblyClient, term: u32) -> Self {
        Self { client, term }
    }
}

#[async_trait]
impl RosterSource for PortalSource {
    async fn roster_page(&self, page: u32, page_size: u32) -> Result<Vec<RosterRow>, FetchError> {
        let query = MemberQuery::default()
            .with_page(page)
            .with_page_size(page_size);
        Ok(self.client.members(&query).await?)
    }
}

#[async_trait]
impl SnsSource for PortalSource {
    async fn sns_rows(&self) -> Result<Vec<SnsRow>, FetchError> {
        Ok(self.client.sns(&SnsQuery::default()).await?)
    }
}

#[async_trait]
impl BillSource for PortalSource {
    async fn bills_page(
        &self,
        proposer: &str,
        page: u32,
        page_size: u32,
    ) -> Result<Vec<BillRow>, FetchError> {
        let query = BillQuery::default()
            .with_age(self.term)
            .with_proposer(proposer)
            .with_page(page)
            .with_page_size(page_size);
        Ok(self.client.bills(&query).await?)
    }
}

/// News search for a member, newest first.
pub struct NewsSearchSource {
    client: NewsSearchClient,
    display: u32,
}

impl NewsSearchSource {
    pub fn new(client: NewsSearchClient, display: u32) -> Self {
        Self { client, display }
    }

    /// Search phrase for a member.
    pub fn query_for(member_name: &str) -> String {
        format!("국회의원 {}", member_name)
    }
}

#[async_trait]
impl NewsSource for NewsSearchSource {
    async fn search_news(&self, member_name: &str) -> Result<Vec<NewsSearchItem>, FetchError> {
        let query = NewsQuery::new(&Self::query_for(member_name))
            .with_display(self.display)
            .with_sort(NewsSort::Date);
        Ok(self.client.search(&query).await?.items)
    }
}
