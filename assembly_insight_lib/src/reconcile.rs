//! Idempotent merge of fetched batches into the store.
//!
//! Each record knows its natural key and how to express itself as a store
//! upsert. [`reconcile`] applies a batch record by record. Records are
//! independent: a malformed record is skipped with a warning and a record
//! whose write fails is logged and counted, and the batch moves on.

use std::collections::{BTreeMap, BTreeSet};

use serde::Deserialize;

use assembly_api::types::{RosterRow, SnsRow};

use crate::error::MalformedRecord;
use crate::store::{ContentKind, ContentUpsert, MemberUpsert, MergeOutcome, SnsLinks, Store, StoreError};
use crate::timeline;

/// Raw roster fields that are never kept in a member's extra map.
const DROPPED_ROSTER_FIELDS: &[&str] = &["ELECD_DIV_NM"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Merged {
    pub outcome: MergeOutcome,
    pub relations_added: usize,
}

impl From<MergeOutcome> for Merged {
    fn from(outcome: MergeOutcome) -> Self {
        Merged {
            outcome,
            relations_added: 0,
        }
    }
}

#[derive(thiserror::Error, Debug)]
pub enum MergeError {
    #[error(transparent)]
    Malformed(#[from] MalformedRecord),
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// A fetched record that can be merged idempotently.
pub trait MergeRecord {
    /// Immutable natural identifier, or the reason the record is unusable.
    fn natural_key(&self) -> Result<String, MalformedRecord>;

    fn merge_into(&self, key: &str, store: &mut dyn Store) -> Result<Merged, MergeError>;
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReconcileReport {
    pub inserted: usize,
    pub updated: usize,
    pub unchanged: usize,
    pub skipped: usize,
    /// Records whose store write failed.
    pub failed: usize,
    pub relations_added: usize,
}

impl ReconcileReport {
    pub fn merged(&self) -> usize {
        self.inserted + self.updated + self.unchanged
    }

    fn record(&mut self, merged: Merged) {
        match merged.outcome {
            MergeOutcome::Inserted => self.inserted += 1,
            MergeOutcome::Updated => self.updated += 1,
            MergeOutcome::Unchanged => self.unchanged += 1,
            MergeOutcome::NotFound => self.skipped += 1,
        }
        self.relations_added += merged.relations_added;
    }
}

/// Merge every record of `batch` into `store`.
pub fn reconcile<R: MergeRecord>(store: &mut dyn Store, batch: &[R]) -> ReconcileReport {
    let mut report = ReconcileReport::default();

    for record in batch {
        let key = match record.natural_key() {
            Ok(key) => key,
            Err(e) => {
                tracing::warn!("Skipping record: {}", e);
                report.skipped += 1;
                continue;
            }
        };

        match record.merge_into(&key, store) {
            Ok(merged) => {
                if merged.outcome == MergeOutcome::NotFound {
                    tracing::debug!(key = %key, "No stored entity for update-only record");
                }
                report.record(merged);
            }
            Err(MergeError::Malformed(e)) => {
                tracing::warn!(key = %key, "Skipping record: {}", e);
                report.skipped += 1;
            }
            Err(MergeError::Store(e)) => {
                tracing::error!(key = %key, "Store write failed: {}", e);
                report.failed += 1;
            }
        }
    }

    report
}

fn required_key(value: Option<&str>, what: &str) -> Result<String, MalformedRecord> {
    match value.map(str::trim) {
        Some(v) if !v.is_empty() => Ok(v.to_string()),
        _ => Err(MalformedRecord::new(format!("missing {}", what))),
    }
}

fn non_empty(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

/// Roster rows carry the parallel history fields and pass through timeline
/// reconstruction before merging.
impl MergeRecord for RosterRow {
    fn natural_key(&self) -> Result<String, MalformedRecord> {
        required_key(self.code.as_deref(), "member code (NAAS_CD)")
    }

    fn merge_into(&self, key: &str, store: &mut dyn Store) -> Result<Merged, MergeError> {
        let name = non_empty(self.name.as_deref());
        if name.is_none() && store.get_member(key)?.is_none() {
            return Err(MalformedRecord::new(format!("new member {} has no name", key)).into());
        }

        let history_observed =
            self.periods.is_some() || self.parties.is_some() || self.districts.is_some();
        let history = history_observed.then(|| {
            timeline::reconstruct(
                self.periods.as_deref(),
                self.parties.as_deref(),
                self.districts.as_deref(),
                self.reelection.as_deref(),
            )
        });
        if let Some(mismatch) = history.as_ref().and_then(|h| h.mismatch) {
            tracing::warn!(
                code = key,
                periods = mismatch.periods,
                affiliations = mismatch.affiliations,
                locations = mismatch.locations,
                "History fields differ in length; pairing to the shortest"
            );
        }

        let upsert = MemberUpsert {
            code: key.to_string(),
            name,
            history,
            extra: roster_extra(self),
        };
        Ok(store.upsert_member(&upsert)?.into())
    }
}

fn roster_extra(row: &RosterRow) -> BTreeMap<String, String> {
    let mut extra = BTreeMap::new();
    for (field, value) in &row.extra {
        if DROPPED_ROSTER_FIELDS.contains(&field.as_str()) {
            continue;
        }
        let text = match value {
            serde_json::Value::Null => continue,
            serde_json::Value::String(s) => s.clone(),
            other => other.to_string(),
        };
        extra.insert(field.clone(), text);
    }
    if let Some(reelection) = non_empty(row.reelection.as_deref()) {
        extra.insert("RLCT_DIV_NM".to_string(), reelection);
    }
    extra
}

/// SNS rows only update members that already exist.
impl MergeRecord for SnsRow {
    fn natural_key(&self) -> Result<String, MalformedRecord> {
        required_key(self.code.as_deref(), "member code (MONA_CD)")
    }

    fn merge_into(&self, key: &str, store: &mut dyn Store) -> Result<Merged, MergeError> {
        let links = SnsLinks {
            facebook: non_empty(self.facebook.as_deref()),
            youtube: non_empty(self.youtube.as_deref()),
            twitter: non_empty(self.twitter.as_deref()),
            blog: non_empty(self.blog.as_deref()),
        };
        Ok(store.update_member_sns(key, &links)?.into())
    }
}

/// A news article that passed trust classification.
#[derive(Debug, Clone, PartialEq)]
pub struct NewsRecord {
    pub url: String,
    pub title: String,
    pub description: String,
    pub published_at: Option<String>,
    pub source: String,
    pub origin_url: String,
    pub related: BTreeSet<String>,
}

impl MergeRecord for NewsRecord {
    fn natural_key(&self) -> Result<String, MalformedRecord> {
        required_key(Some(self.url.as_str()), "article link")
    }

    fn merge_into(&self, key: &str, store: &mut dyn Store) -> Result<Merged, MergeError> {
        let upsert = ContentUpsert {
            url: key.to_string(),
            kind: ContentKind::News,
            title: Some(self.title.clone()),
            description: Some(self.description.clone()),
            published_at: self.published_at.clone(),
            source: Some(self.source.clone()),
            origin_url: Some(self.origin_url.clone()),
            duration_secs: None,
            related: self.related.clone(),
        };
        let merge = store.upsert_content(&upsert)?;
        Ok(Merged {
            outcome: merge.outcome,
            relations_added: merge.relations_added,
        })
    }
}

/// Video metadata produced by an external extractor.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct VideoRecord {
    pub member_code: String,
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    /// Upload date as `YYYYMMDD`.
    #[serde(default)]
    pub upload_date: Option<String>,
    #[serde(default)]
    pub duration: Option<f64>,
    #[serde(default)]
    pub channel: Option<String>,
}

impl VideoRecord {
    /// Upload date as `YYYY-MM-DD`; unparseable dates are dropped.
    pub fn published_on(&self) -> Option<String> {
        let raw = self.upload_date.as_deref()?.trim();
        chrono::NaiveDate::parse_from_str(raw, "%Y%m%d")
            .or_else(|_| chrono::NaiveDate::parse_from_str(raw, "%Y-%m-%d"))
            .ok()
            .map(|d| d.format("%Y-%m-%d").to_string())
    }
}

impl MergeRecord for VideoRecord {
    fn natural_key(&self) -> Result<String, MalformedRecord> {
        if let Some(id) = non_empty(self.id.as_deref()) {
            return Ok(crate::classify::video_url(&id));
        }
        let url = required_key(self.url.as_deref(), "video id or url")?;
        match crate::classify::video_id_from_url(&url) {
            Some(id) => Ok(crate::classify::video_url(id)),
            None => Err(MalformedRecord::new(format!("unrecognised video url {}", url))),
        }
    }

    fn merge_into(&self, key: &str, store: &mut dyn Store) -> Result<Merged, MergeError> {
        let member_code = required_key(Some(self.member_code.as_str()), "video member code")?;
        let upsert = ContentUpsert {
            url: key.to_string(),
            kind: ContentKind::Video,
            title: non_empty(self.title.as_deref()),
            description: None,
            published_at: self.published_on(),
            source: non_empty(self.channel.as_deref()),
            origin_url: None,
            duration_secs: self.duration.map(|d| d.round() as i64),
            related: BTreeSet::from([member_code]),
        };
        let merge = store.upsert_content(&upsert)?;
        Ok(Merged {
            outcome: merge.outcome,
            relations_added: merge.relations_added,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::Db;

    fn open_test_db() -> Db {
        let db = Db::open_in_memory().expect("open in-memory db");
        db.init().expect("init schema");
        db
    }

    fn roster(code: Option<&str>, name: Option<&str>) -> RosterRow {
        RosterRow {
            code: code.map(String::from),
            name: name.map(String::from),
            periods: Some("제21대, 제22대".into()),
            parties: Some("가나당/다라당".into()),
            districts: Some("서울 종로구/서울 중구".into()),
            reelection: Some("재선".into()),
            extra: BTreeMap::from([
                ("ELECD_DIV_NM".to_string(), serde_json::json!("지역구")),
                ("NAAS_EMAIL".to_string(), serde_json::json!("hong@example.kr")),
                ("NAAS_HP_URL".to_string(), serde_json::Value::Null),
            ]),
        }
    }

    fn news(url: &str, related: &[&str]) -> NewsRecord {
        NewsRecord {
            url: url.into(),
            title: "예산안 합의".into(),
            description: "여야 예산안 합의".into(),
            published_at: Some("2026-10-15T09:30:00+09:00".into()),
            source: "연합뉴스".into(),
            origin_url: "https://www.yna.co.kr/view/1".into(),
            related: related.iter().map(|s| s.to_string()).collect(),
        }
    }

    #[test]
    fn malformed_record_is_skipped_and_batch_continues() {
        let mut db = open_test_db();
        let batch = vec![
            roster(None, Some("무명")),
            roster(Some("A0001"), Some("홍길동")),
            roster(Some("A0002"), None),
            roster(Some("A0003"), Some("김영희")),
        ];
        let report = reconcile(&mut db, &batch);
        assert_eq!(report.inserted, 2);
        assert_eq!(report.skipped, 2);
        assert!(db.get_member("A0003").unwrap().is_some());
    }

    #[test]
    fn roster_rerun_is_unchanged() {
        let mut db = open_test_db();
        let batch = vec![roster(Some("A0001"), Some("홍길동"))];
        reconcile(&mut db, &batch);
        let report = reconcile(&mut db, &batch);
        assert_eq!(report.unchanged, 1);
        assert_eq!(report.inserted + report.updated, 0);
    }

    #[test]
    fn roster_extra_drops_consumed_and_null_fields() {
        let mut db = open_test_db();
        reconcile(&mut db, &[roster(Some("A0001"), Some("홍길동"))]);
        let member = db.get_member("A0001").unwrap().unwrap();
        assert!(!member.extra.contains_key("ELECD_DIV_NM"));
        assert!(!member.extra.contains_key("NAAS_HP_URL"));
        assert_eq!(member.extra.get("RLCT_DIV_NM").map(String::as_str), Some("재선"));
        assert_eq!(member.party, "다라당");
    }

    #[test]
    fn roster_without_history_keeps_stored_timeline() {
        let mut db = open_test_db();
        reconcile(&mut db, &[roster(Some("A0001"), Some("홍길동"))]);

        let mut bare = roster(Some("A0001"), None);
        bare.periods = None;
        bare.parties = None;
        bare.districts = None;
        let report = reconcile(&mut db, &[bare]);
        assert_eq!(report.skipped, 0);

        let member = db.get_member("A0001").unwrap().unwrap();
        assert_eq!(member.name, "홍길동");
        assert_eq!(member.timeline.len(), 2);
    }

    #[test]
    fn mismatched_history_is_persisted() {
        let mut db = open_test_db();
        let mut row = roster(Some("A0001"), Some("홍길동"));
        row.parties = Some("가나당".into());
        reconcile(&mut db, &[row]);
        let member = db.get_member("A0001").unwrap().unwrap();
        assert_eq!(member.timeline.len(), 1);
        let mismatch = member.timeline_mismatch.unwrap();
        assert_eq!(mismatch.affiliations, 1);
        assert_eq!(mismatch.periods, 2);
    }

    #[test]
    fn sns_for_unknown_member_is_skipped() {
        let mut db = open_test_db();
        reconcile(&mut db, &[roster(Some("A0001"), Some("홍길동"))]);
        let rows = vec![
            SnsRow {
                code: Some("A0001".into()),
                facebook: None,
                youtube: Some("https://youtube.example/hong".into()),
                twitter: Some("".into()),
                blog: None,
            },
            SnsRow {
                code: Some("Z9999".into()),
                facebook: None,
                youtube: None,
                twitter: None,
                blog: None,
            },
        ];
        let report = reconcile(&mut db, &rows);
        assert_eq!(report.updated, 1);
        assert_eq!(report.skipped, 1);
        assert!(db.get_member("Z9999").unwrap().is_none());
        let member = db.get_member("A0001").unwrap().unwrap();
        assert!(member.is_current);
        assert_eq!(member.sns.twitter, None);
    }

    #[test]
    fn news_relations_union_across_batches() {
        let mut db = open_test_db();
        let url = "https://n.news.example/1";
        let first = reconcile(&mut db, &[news(url, &["A0001"])]);
        assert_eq!(first.inserted, 1);
        let second = reconcile(&mut db, &[news(url, &["A0002"])]);
        assert_eq!(second.updated, 1);
        assert_eq!(second.relations_added, 1);

        let row = db.get_content(url).unwrap().unwrap();
        assert_eq!(row.related.len(), 2);
    }

    #[test]
    fn video_key_is_canonical_url() {
        let by_id = VideoRecord {
            member_code: "A0001".into(),
            id: Some("abc123".into()),
            url: None,
            title: Some("홍길동 의원 인터뷰".into()),
            upload_date: Some("20261015".into()),
            duration: Some(125.4),
            channel: None,
        };
        let by_url = VideoRecord {
            id: None,
            url: Some("https://youtu.be/abc123".into()),
            ..by_id.clone()
        };
        assert_eq!(by_id.natural_key().unwrap(), by_url.natural_key().unwrap());
        assert_eq!(by_id.published_on().as_deref(), Some("2026-10-15"));

        let mut db = open_test_db();
        let report = reconcile(&mut db, &[by_id, by_url]);
        assert_eq!(report.inserted, 1);
        assert_eq!(report.unchanged, 1);

        let row = db
            .get_content("https://www.youtube.com/watch?v=abc123")
            .unwrap()
            .unwrap();
        assert_eq!(row.kind, ContentKind::Video);
        assert_eq!(row.duration_secs, Some(125));
    }

    #[test]
    fn video_without_id_or_url_is_malformed() {
        let video = VideoRecord {
            member_code: "A0001".into(),
            id: None,
            url: Some("https://example.com/watch".into()),
            title: None,
            upload_date: None,
            duration: None,
            channel: None,
        };
        assert!(video.natural_key().is_err());
    }
}
