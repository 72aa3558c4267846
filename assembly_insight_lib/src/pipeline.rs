//! Pipeline stages.
//!
//! Each stage fetches from one upstream capability, classifies, and merges
//! through the reconciliation engine. Failures scoped to one member are
//! logged and counted; only a rate-limit response stops the remaining
//! fetches. Every stage ends by logging its [`RunReport`].

use std::path::Path;

use assembly_api::types::{BillRow, NewsSearchItem};
use chrono::{DateTime, SecondsFormat, Utc};
use serde::Serialize;

use crate::classify::{video_mentions_member, MarkupCleaner, MemberDirectory, TrustedSources};
use crate::error::FetchError;
use crate::pacing::{paced, Pacer, RequestCounts};
use crate::paging::{collect_pages, PageCursor};
use crate::reconcile::{reconcile, NewsRecord, ReconcileReport, VideoRecord};
use crate::settings::FetchSettings;
use crate::sources::{BillSource, NewsSource, RosterSource, SnsSource};
use crate::store::{Bill, MemberFilter, MemberRow, MergeOutcome, Store, StoreError};
use crate::trend::calendar_date;

/// Outcome counts of one stage run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RunReport {
    pub stage: &'static str,
    /// Entities (members, pages or files) whose processing completed.
    pub processed: usize,
    /// Records skipped as malformed or without a target.
    pub skipped: usize,
    /// Entities or records abandoned after a fetch or store failure.
    pub failed: usize,
    /// Items dropped by classification.
    pub rejected: usize,
    pub inserted: usize,
    pub updated: usize,
    pub unchanged: usize,
    pub relations_added: usize,
    /// True when a rate-limit response stopped the run early.
    pub aborted: bool,
    pub requests: RequestCounts,
}

impl RunReport {
    pub fn new(stage: &'static str) -> Self {
        Self {
            stage,
            ..Self::default()
        }
    }

    fn absorb(&mut self, report: &ReconcileReport) {
        self.inserted += report.inserted;
        self.updated += report.updated;
        self.unchanged += report.unchanged;
        self.skipped += report.skipped;
        self.failed += report.failed;
        self.relations_added += report.relations_added;
    }

    fn fetch_failed(&mut self, entity: &str, error: &FetchError) {
        if error.is_rate_limited() {
            tracing::error!(stage = self.stage, "Rate limited while fetching {}; aborting run", entity);
            self.aborted = true;
        } else {
            tracing::error!(stage = self.stage, "Fetch failed for {}: {}", entity, error);
        }
        self.failed += 1;
    }

    pub fn log(&self) {
        tracing::info!(
            stage = self.stage,
            processed = self.processed,
            skipped = self.skipped,
            failed = self.failed,
            rejected = self.rejected,
            inserted = self.inserted,
            updated = self.updated,
            unchanged = self.unchanged,
            relations_added = self.relations_added,
            aborted = self.aborted,
            requests_made = self.requests.made,
            requests_succeeded = self.requests.succeeded,
            requests_rate_limited = self.requests.rate_limited,
            requests_failed = self.requests.failed,
            "Run complete"
        );
    }
}

/// Per-member progress hook. `()` reports nothing.
pub trait Progress {
    fn begin(&self, _total: u64) {}
    fn step(&self, _label: &str) {}
    fn finish(&self) {}
}

impl Progress for () {}

fn now_rfc3339() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true)
}

fn finish(store: &mut dyn Store, report: RunReport) -> Result<RunReport, StoreError> {
    if !report.aborted {
        store.set_meta(&format!("last_run:{}", report.stage), &now_rfc3339())?;
    }
    report.log();
    Ok(report)
}

fn current_members(store: &dyn Store) -> Result<Vec<MemberRow>, StoreError> {
    store.query_members(&MemberFilter {
        current_only: true,
        ..MemberFilter::default()
    })
}

/// Page through the full roster, merging each page as it arrives.
pub async fn sync_members(
    store: &mut dyn Store,
    source: &dyn RosterSource,
    fetch: &FetchSettings,
) -> Result<RunReport, StoreError> {
    let mut report = RunReport::new("sync-members");
    let pacer = Pacer::new(fetch.bill_delay());
    let mut cursor = PageCursor::new(fetch.page_size, fetch.max_pages);

    while let Some(page) = cursor.next_page() {
        let rows = match paced(&pacer, || source.roster_page(page, cursor.page_size())).await {
            Ok(rows) => rows,
            Err(e) => {
                report.fetch_failed(&format!("roster page {}", page), &e);
                break;
            }
        };
        cursor.observe(rows.len());

        report.absorb(&reconcile(store, &rows));
        report.processed += 1;
        tracing::info!(page, rows = rows.len(), "Roster page merged");
    }

    report.requests = pacer.counts();
    finish(store, report)
}

/// Attach SNS links to existing members and mark them as sitting members.
pub async fn sync_sns(
    store: &mut dyn Store,
    source: &dyn SnsSource,
    fetch: &FetchSettings,
) -> Result<RunReport, StoreError> {
    let mut report = RunReport::new("sync-sns");
    let pacer = Pacer::new(fetch.bill_delay());

    match paced(&pacer, || source.sns_rows()).await {
        Ok(rows) => {
            report.absorb(&reconcile(store, &rows));
            report.processed += 1;
        }
        Err(e) => report.fetch_failed("SNS accounts", &e),
    }

    report.requests = pacer.counts();
    finish(store, report)
}

/// Parse a search-API publication date (RFC 2822) into RFC 3339, keeping
/// its offset.
pub fn parse_pub_date(raw: &str) -> Option<String> {
    DateTime::parse_from_rfc2822(raw.trim())
        .ok()
        .map(|dt| dt.to_rfc3339_opts(SecondsFormat::Secs, true))
}

/// Turns raw search results for one member into merge-ready records.
pub struct NewsClassifier<'a> {
    pub trusted: &'a TrustedSources,
    pub directory: &'a MemberDirectory,
    pub cleaner: &'a MarkupCleaner,
}

impl NewsClassifier<'_> {
    /// `None` when the item's publisher is not on the allow-list.
    pub fn classify(&self, member_code: &str, item: &NewsSearchItem) -> Option<NewsRecord> {
        let origin = item
            .original_link
            .as_deref()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .unwrap_or(item.link.as_str());
        let source = self.trusted.classify(origin)?;

        let title = self.cleaner.clean(&item.title);
        let description = self.cleaner.clean(&item.description);

        let mut related = self.directory.mentions(&title, &description);
        related.insert(member_code.to_string());

        let published_at = parse_pub_date(&item.pub_date);
        if published_at.is_none() {
            tracing::warn!(link = %item.link, raw = %item.pub_date, "Unparseable publication date");
        }

        Some(NewsRecord {
            url: item.link.trim().to_string(),
            title,
            description,
            published_at,
            source: source.to_string(),
            origin_url: origin.to_string(),
            related,
        })
    }
}

/// Search news for every sitting member, keeping trusted publishers only and
/// linking every other member mentioned in an article.
pub async fn collect_news(
    store: &mut dyn Store,
    source: &dyn NewsSource,
    trusted: &TrustedSources,
    cleaner: &MarkupCleaner,
    fetch: &FetchSettings,
    progress: &dyn Progress,
) -> Result<RunReport, StoreError> {
    let mut report = RunReport::new("collect-news");
    let members = current_members(store)?;
    let directory = MemberDirectory::new(members.iter().map(|m| (m.code.clone(), m.name.clone())));
    let classifier = NewsClassifier {
        trusted,
        directory: &directory,
        cleaner,
    };
    let pacer = Pacer::new(fetch.news_delay());

    tracing::info!(members = members.len(), press = trusted.len(), "Collecting news");
    progress.begin(members.len() as u64);

    for member in &members {
        progress.step(&member.name);
        let items = match paced(&pacer, || source.search_news(&member.name)).await {
            Ok(items) => items,
            Err(e) => {
                report.fetch_failed(&member.name, &e);
                if report.aborted {
                    break;
                }
                continue;
            }
        };

        let mut records = Vec::with_capacity(items.len());
        for item in &items {
            match classifier.classify(&member.code, item) {
                Some(record) => records.push(record),
                None => report.rejected += 1,
            }
        }

        report.absorb(&reconcile(store, &records));
        report.processed += 1;
    }

    progress.finish();
    report.requests = pacer.counts();
    finish(store, report)
}

/// Merge externally extracted video metadata.
///
/// A video is kept only for a known member whose name appears in its title
/// and only when it runs at least `min_duration_secs`.
pub fn import_videos(
    store: &mut dyn Store,
    videos: &[VideoRecord],
    min_duration_secs: f64,
) -> Result<RunReport, StoreError> {
    let mut report = RunReport::new("import-videos");
    let mut accepted = Vec::with_capacity(videos.len());

    for video in videos {
        let Some(member) = store.get_member(video.member_code.trim())? else {
            tracing::warn!(code = %video.member_code, "Video for unknown member");
            report.skipped += 1;
            continue;
        };
        let title = video.title.as_deref().unwrap_or_default();
        if !video_mentions_member(title, &member.name) {
            report.rejected += 1;
            continue;
        }
        if video.duration.is_some_and(|d| d < min_duration_secs) {
            report.rejected += 1;
            continue;
        }
        accepted.push(video.clone());
    }

    report.absorb(&reconcile(store, &accepted));
    report.processed += 1;

    finish(store, report)
}

/// Convert a portal row into a stored bill. Rows without an id are dropped.
pub fn bill_from_row(row: &BillRow) -> Option<Bill> {
    let bill_id = row
        .bill_id
        .as_deref()
        .map(str::trim)
        .filter(|id| !id.is_empty())?
        .to_string();
    Some(Bill {
        bill_id,
        bill_no: row.bill_no.clone(),
        title: row.bill_name.clone().unwrap_or_default().trim().to_string(),
        outcome: row.proc_result.clone(),
        proposed_on: row
            .propose_dt
            .as_deref()
            .and_then(calendar_date)
            .map(|d| d.format("%Y-%m-%d").to_string()),
        committee: row.committee.clone(),
        detail_url: row.detail_link.clone(),
    })
}

/// Replace each sitting member's list of lead-sponsored bills.
///
/// The proposer search matches co-sponsors too, so rows are kept only when
/// the lead proposer field names the member. An empty result leaves the
/// stored list alone.
pub async fn collect_bills(
    store: &mut dyn Store,
    source: &dyn BillSource,
    fetch: &FetchSettings,
    progress: &dyn Progress,
) -> Result<RunReport, StoreError> {
    let mut report = RunReport::new("collect-bills");
    let members = current_members(store)?;
    let pacer = Pacer::new(fetch.bill_delay());

    progress.begin(members.len() as u64);

    for member in &members {
        progress.step(&member.name);
        let name = member.name.as_str();
        let pacer = &pacer;
        let fetched = collect_pages(
            PageCursor::new(fetch.page_size, fetch.max_pages),
            move |page, size| async move {
                paced(pacer, || source.bills_page(name, page, size)).await
            },
        )
        .await;

        let rows = match fetched {
            Ok(rows) => rows,
            Err(e) => {
                report.fetch_failed(name, &e);
                if report.aborted {
                    break;
                }
                continue;
            }
        };

        let mut bills = Vec::new();
        for row in rows
            .iter()
            .filter(|r| r.rst_proposer.as_deref().unwrap_or_default().contains(name))
        {
            match bill_from_row(row) {
                Some(bill) => bills.push(bill),
                None => {
                    tracing::warn!(member = %name, "Bill row without id");
                    report.skipped += 1;
                }
            }
        }

        if bills.is_empty() {
            tracing::debug!(member = %name, "No lead-sponsored bills; keeping stored list");
            report.unchanged += 1;
            report.processed += 1;
            continue;
        }

        match store.replace_bills(&member.code, &bills, &now_rfc3339()) {
            Ok(count) => {
                tracing::info!(member = %name, bills = count, "Bills replaced");
                report.updated += 1;
                report.processed += 1;
            }
            Err(e) => {
                tracing::error!(member = %name, "Bills not stored: {}", e);
                report.failed += 1;
            }
        }
    }

    progress.finish();
    report.requests = pacer.counts();
    finish(store, report)
}

/// Thumbnail file name for a member.
pub fn photo_file_name(member: &MemberRow) -> String {
    format!("{}_{}_300.jpg", member.name, member.code)
}

/// Point each member's photo reference at an existing thumbnail in `dir`,
/// stored as `{web_prefix}/{file}`. Members without a file are counted as
/// skipped.
pub fn link_photos(store: &mut dyn Store, dir: &Path, web_prefix: &str) -> Result<RunReport, StoreError> {
    let mut report = RunReport::new("link-photos");
    let members = store.query_members(&MemberFilter::default())?;
    let prefix = web_prefix.trim_end_matches('/');

    for member in &members {
        let file = photo_file_name(member);
        if !dir.join(&file).is_file() {
            report.skipped += 1;
            continue;
        }
        let reference = if prefix.is_empty() {
            file
        } else {
            format!("{}/{}", prefix, file)
        };
        match store.set_member_photo(&member.code, &reference) {
            Ok(MergeOutcome::Updated) => report.updated += 1,
            Ok(MergeOutcome::Unchanged) => report.unchanged += 1,
            Ok(_) => report.skipped += 1,
            Err(e) => {
                tracing::error!(member = %member.name, "Photo not linked: {}", e);
                report.failed += 1;
                continue;
            }
        }
        report.processed += 1;
    }

    if report.skipped > 0 {
        tracing::warn!(missing = report.skipped, dir = %dir.display(), "Thumbnails not found");
    }
    finish(store, report)
}
