//! Change-detected narrative summaries of a member's sponsored bills.

use async_trait::async_trait;
use chrono::{SecondsFormat, Utc};
use serde::Serialize;

use crate::store::{Store, StoreError};

/// Stored when a member has no bill titles to summarise.
pub const FALLBACK_SUMMARY: &str =
    "제22대 국회 임기 초반으로, 현재 분석 가능한 대표 발의 데이터가 부족합니다.";

#[derive(thiserror::Error, Debug)]
pub enum SummaryError {
    #[error("summary generation failed: {0}")]
    Generation(String),
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Narrative summary generator.
#[async_trait]
pub trait Summarizer: Send + Sync {
    async fn summarize(&self, member_name: &str, bill_titles: &[String]) -> Result<String, SummaryError>;
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SummaryReport {
    pub generated: usize,
    pub skipped: usize,
    pub failed: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SummaryStatus {
    pub member_code: String,
    pub member_name: Option<String>,
    pub bill_count: i64,
    pub summarized_bill_count: Option<i64>,
    pub summary_updated_at: Option<String>,
    pub stale: bool,
}

/// Summary freshness of every stored policy document.
pub fn summary_status(store: &dyn Store) -> Result<Vec<SummaryStatus>, StoreError> {
    Ok(store
        .query_policies()?
        .into_iter()
        .map(|p| SummaryStatus {
            stale: p.summary_is_stale(),
            member_code: p.member_code,
            member_name: p.member_name,
            bill_count: p.bill_count,
            summarized_bill_count: p.summarized_bill_count,
            summary_updated_at: p.summary_updated_at,
        })
        .collect())
}

/// Regenerate every stale summary.
///
/// A summary is skipped when one exists and the bill count has not moved
/// since it was generated. Generator failures are logged and counted; the
/// member keeps its previous summary.
pub async fn refresh_summaries(
    store: &mut dyn Store,
    summarizer: &dyn Summarizer,
    max_titles: usize,
) -> Result<SummaryReport, StoreError> {
    let mut report = SummaryReport::default();

    for policy in store.query_policies()? {
        if !policy.summary_is_stale() {
            report.skipped += 1;
            continue;
        }

        let name = policy
            .member_name
            .clone()
            .unwrap_or_else(|| policy.member_code.clone());
        let titles: Vec<String> = store
            .query_bills(&policy.member_code, None)?
            .into_iter()
            .map(|b| b.title)
            .filter(|t| !t.trim().is_empty())
            .take(max_titles)
            .collect();

        let summary = if titles.is_empty() {
            FALLBACK_SUMMARY.to_string()
        } else {
            match summarizer.summarize(&name, &titles).await {
                Ok(summary) => summary.trim().to_string(),
                Err(e) => {
                    tracing::error!(member = %name, "Summary generation failed: {}", e);
                    report.failed += 1;
                    continue;
                }
            }
        };

        let now = Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true);
        store.record_summary(&policy.member_code, &summary, policy.bill_count, &now)?;
        tracing::info!(
            member = %name,
            previous = ?policy.summarized_bill_count,
            bills = policy.bill_count,
            "Summary regenerated"
        );
        report.generated += 1;
    }

    tracing::info!(
        generated = report.generated,
        skipped = report.skipped,
        failed = report.failed,
        "Summary refresh complete"
    );
    Ok(report)
}
