//! Per-member analytical snapshots for the dashboard.
//!
//! The exporter only reads from the store. Each file is written to a
//! temporary file in the export directory and renamed over the target, so a
//! reader sees either the previous snapshot or the complete new one.

use std::collections::BTreeMap;
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::{DateTime, FixedOffset, NaiveDate, SecondsFormat};
use serde::Serialize;
use serde_json::Value;
use tempfile::NamedTempFile;

use crate::keywords::{KeywordCount, KeywordDocument, KeywordExtractor, Tokenizer};
use crate::settings::Settings;
use crate::stats::{compute_for_bills, PolicyStats};
use crate::store::{Bill, ContentFilter, ContentKind, ContentRow, MemberFilter, MemberRow, SnsLinks, Store, StoreError};
use crate::timeline::{TimelineEntry, TimelineMismatch};
use crate::trend::{trend, TrendSeries};

pub const LISTING_FILE: &str = "members_all.json";

#[derive(thiserror::Error, Debug)]
pub enum ExportError {
    #[error("cannot create export directory {path}: {source}")]
    CreateDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("rename failed: {0}")]
    Persist(#[from] tempfile::PersistError),
    #[error("member code {0:?} is not usable as a file name")]
    UnsafeCode(String),
    #[error(transparent)]
    Store(#[from] StoreError),
}

#[derive(Debug, Clone, Serialize)]
pub struct Profile {
    pub code: String,
    pub name: String,
    pub party: String,
    pub district: String,
    pub times_elected: u32,
    pub timeline: Vec<TimelineEntry>,
    pub timeline_mismatch: Option<TimelineMismatch>,
    pub sns: SnsLinks,
    pub photo_path: Option<String>,
    pub is_current: bool,
    pub extra: BTreeMap<String, Value>,
    pub created_at: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct Analysis {
    pub keywords: Vec<String>,
    pub keyword_frequency: Vec<KeywordCount>,
    pub trend_news: TrendSeries,
    pub last_analyzed_at: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct PolicySnapshot {
    pub stats: PolicyStats,
    pub summary: Option<String>,
    pub summary_updated_at: Option<String>,
    pub bill_count: i64,
    pub synced_at: String,
    pub recent_bills: Vec<Bill>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ContentSnapshot {
    pub url: String,
    pub title: String,
    pub description: String,
    pub published_at: Option<String>,
    pub source: Option<String>,
    pub origin_url: Option<String>,
    pub duration_secs: Option<i64>,
    pub related_members: Vec<String>,
}

impl From<&ContentRow> for ContentSnapshot {
    fn from(row: &ContentRow) -> Self {
        ContentSnapshot {
            url: row.url.clone(),
            title: row.title.clone(),
            description: row.description.clone(),
            published_at: row.published_at.as_deref().map(normalize_timestamp),
            source: row.source.clone(),
            origin_url: row.origin_url.clone(),
            duration_secs: row.duration_secs,
            related_members: row.related.iter().cloned().collect(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct MemberSnapshot {
    pub profile: Profile,
    pub analysis: Analysis,
    pub policy: Option<PolicySnapshot>,
    pub recent_news: Vec<ContentSnapshot>,
    pub recent_videos: Vec<ContentSnapshot>,
    pub exported_at: String,
}

/// Minimal per-member entry of the global listing.
#[derive(Debug, Clone, Serialize)]
pub struct ListingEntry {
    pub code: String,
    pub name: String,
    pub party: String,
    pub district: String,
    pub times_elected: u32,
    pub photo_path: Option<String>,
    pub is_current: bool,
}

impl From<&MemberRow> for ListingEntry {
    fn from(m: &MemberRow) -> Self {
        ListingEntry {
            code: m.code.clone(),
            name: m.name.clone(),
            party: m.party.clone(),
            district: m.district.clone(),
            times_elected: m.times_elected,
            photo_path: m.photo_path.clone(),
            is_current: m.is_current,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ExportReport {
    pub written: usize,
    pub failed: usize,
    pub listing_written: bool,
}

/// Render a stored timestamp as ISO-8601. RFC 3339 values keep their
/// offset, RFC 2822 values are converted, compact `YYYYMMDD` dates gain
/// separators; anything else is returned as is.
pub fn normalize_timestamp(raw: &str) -> String {
    let trimmed = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(trimmed) {
        return dt.to_rfc3339_opts(SecondsFormat::AutoSi, true);
    }
    if let Ok(dt) = DateTime::parse_from_rfc2822(trimmed) {
        return dt.to_rfc3339_opts(SecondsFormat::AutoSi, true);
    }
    if trimmed.len() == 8 && trimmed.bytes().all(|b| b.is_ascii_digit()) {
        if let Ok(date) = NaiveDate::parse_from_str(trimmed, "%Y%m%d") {
            return date.format("%Y-%m-%d").to_string();
        }
    }
    raw.to_string()
}

fn is_temporal_key(key: &str) -> bool {
    let key = key.to_ascii_lowercase();
    key.ends_with("_at")
        || key.ends_with("_on")
        || key.ends_with("_dt")
        || key.ends_with("date")
}

/// Normalise temporal strings anywhere inside `value`, recursing through
/// arrays and objects. Temporal fields are recognised by key suffix.
fn portable_entry(key: Option<&str>, value: Value) -> Value {
    match value {
        Value::String(s) if key.is_some_and(is_temporal_key) => Value::String(normalize_timestamp(&s)),
        Value::Array(items) => Value::Array(items.into_iter().map(|v| portable_entry(key, v)).collect()),
        Value::Object(map) => Value::Object(
            map.into_iter()
                .map(|(k, v)| {
                    let v = portable_entry(Some(k.as_str()), v);
                    (k, v)
                })
                .collect(),
        ),
        other => other,
    }
}

fn profile(member: &MemberRow) -> Profile {
    let extra = member
        .extra
        .iter()
        .map(|(k, v)| (k.clone(), portable_entry(Some(k.as_str()), Value::String(v.clone()))))
        .collect();
    Profile {
        code: member.code.clone(),
        name: member.name.clone(),
        party: member.party.clone(),
        district: member.district.clone(),
        times_elected: member.times_elected,
        timeline: member.timeline.clone(),
        timeline_mismatch: member.timeline_mismatch,
        sns: member.sns.clone(),
        photo_path: member.photo_path.clone(),
        is_current: member.is_current,
        extra,
        created_at: normalize_timestamp(&member.created_at),
    }
}

/// File name of a member's snapshot. Codes come from upstream, so anything
/// that could leave the export directory is rejected.
pub fn snapshot_file_name(code: &str) -> Result<String, ExportError> {
    let unsafe_code = code.is_empty()
        || code == "."
        || code.contains("..")
        || code.contains(['/', '\\', '\0'])
        || Path::new(code).is_absolute();
    if unsafe_code {
        return Err(ExportError::UnsafeCode(code.to_string()));
    }
    Ok(format!("{}.json", code))
}

/// Write `value` as pretty UTF-8 JSON to `path` via temp file and rename.
pub fn write_json_atomic<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<(), ExportError> {
    let dir = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    let mut tmp = NamedTempFile::new_in(dir)?;
    serde_json::to_writer_pretty(&mut tmp, value)?;
    tmp.write_all(b"\n")?;
    tmp.as_file().sync_all()?;
    tmp.persist(path)?;
    Ok(())
}

pub struct Exporter<'a, T> {
    store: &'a dyn Store,
    extractor: &'a KeywordExtractor<T>,
    settings: &'a Settings,
}

impl<'a, T: Tokenizer> Exporter<'a, T> {
    pub fn new(store: &'a dyn Store, extractor: &'a KeywordExtractor<T>, settings: &'a Settings) -> Self {
        Self {
            store,
            extractor,
            settings,
        }
    }

    /// Assemble one member's snapshot as of `now`.
    pub fn build_snapshot(
        &self,
        member: &MemberRow,
        now: DateTime<FixedOffset>,
    ) -> Result<MemberSnapshot, StoreError> {
        let keywords = &self.settings.keywords;
        let news = self.store.query_content(&ContentFilter {
            member_code: Some(member.code.clone()),
            kind: Some(ContentKind::News),
            limit: Some(keywords.recent_news),
        })?;
        let videos = self.store.query_content(&ContentFilter {
            member_code: Some(member.code.clone()),
            kind: Some(ContentKind::Video),
            limit: Some(keywords.recent_videos),
        })?;

        let documents: Vec<KeywordDocument<'_>> = news
            .iter()
            .chain(videos.iter())
            .map(|c| KeywordDocument {
                title: &c.title,
                body: &c.description,
            })
            .collect();
        let keyword_frequency = self.extractor.extract(&documents, &member.name);
        let trend_news = trend(
            news.iter().filter_map(|n| n.published_at.as_deref()),
            now.date_naive(),
        );

        let policy = match self.store.get_policy(&member.code)? {
            Some(policy) => {
                let all_bills = self.store.query_bills(&member.code, None)?;
                let stats = compute_for_bills(&all_bills);
                let recent_bills = all_bills
                    .into_iter()
                    .take(self.settings.export.recent_bills.max(0) as usize)
                    .collect();
                Some(PolicySnapshot {
                    stats,
                    summary: policy.summary,
                    summary_updated_at: policy.summary_updated_at.as_deref().map(normalize_timestamp),
                    bill_count: policy.bill_count,
                    synced_at: normalize_timestamp(&policy.synced_at),
                    recent_bills,
                })
            }
            None => None,
        };

        let stamp = now.to_rfc3339_opts(SecondsFormat::Secs, true);
        Ok(MemberSnapshot {
            profile: profile(member),
            analysis: Analysis {
                keywords: keyword_frequency.iter().map(|k| k.text.clone()).collect(),
                keyword_frequency,
                trend_news,
                last_analyzed_at: stamp.clone(),
            },
            policy,
            recent_news: news.iter().map(ContentSnapshot::from).collect(),
            recent_videos: videos.iter().map(ContentSnapshot::from).collect(),
            exported_at: stamp,
        })
    }

    fn export_member(&self, member: &MemberRow, out_dir: &Path, now: DateTime<FixedOffset>) -> Result<(), ExportError> {
        let file_name = snapshot_file_name(&member.code)?;
        let snapshot = self.build_snapshot(member, now)?;
        write_json_atomic(&out_dir.join(file_name), &snapshot)
    }

    /// Write the listing and one snapshot per sitting member into `out_dir`.
    ///
    /// Only an uncreatable directory or an unreadable member list fails the
    /// run; a member whose snapshot cannot be built or written is logged and
    /// counted.
    pub fn export_all(&self, out_dir: &Path, now: DateTime<FixedOffset>) -> Result<ExportReport, ExportError> {
        std::fs::create_dir_all(out_dir).map_err(|source| ExportError::CreateDir {
            path: out_dir.to_path_buf(),
            source,
        })?;

        let members = self.store.query_members(&MemberFilter {
            current_only: true,
            ..MemberFilter::default()
        })?;
        if members.is_empty() {
            tracing::warn!("No sitting members in the store; run sync-members and sync-sns first");
        }

        let mut report = ExportReport::default();

        let listing: Vec<ListingEntry> = members.iter().map(ListingEntry::from).collect();
        match write_json_atomic(&out_dir.join(LISTING_FILE), &listing) {
            Ok(()) => report.listing_written = true,
            Err(e) => tracing::error!("Listing not written: {}", e),
        }

        for member in &members {
            match self.export_member(member, out_dir, now) {
                Ok(()) => report.written += 1,
                Err(e) => {
                    tracing::error!(member = %member.name, code = %member.code, "Snapshot not written: {}", e);
                    report.failed += 1;
                }
            }
        }

        tracing::info!(
            written = report.written,
            failed = report.failed,
            listing = report.listing_written,
            dir = %out_dir.display(),
            "Export complete"
        );
        Ok(report)
    }
}
