//! The store contract and the records that flow through it.
//!
//! Every reconciliation write goes through one of the upsert methods and
//! every analytics read goes through a `get_*` or `query_*` method. The
//! field-level merge rules live here as pure functions so that any backend
//! applies them identically; [`crate::Db`] is the SQLite backend.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::timeline::{Timeline, TimelineEntry, TimelineMismatch, UNAFFILIATED, UNDETERMINED};

/// Failure reported by a store backend.
///
/// Backends convert their own errors into this type, so merge and analytics
/// code never depends on a particular engine.
#[derive(thiserror::Error, Debug)]
pub enum StoreError {
    /// A new entity lacks a field required to insert it.
    #[error("missing required field: {0}")]
    MissingField(&'static str),
    #[error("store backend error: {0}")]
    Backend(#[source] Box<dyn std::error::Error + Send + Sync>),
}

/// Result of a single idempotent merge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MergeOutcome {
    Inserted,
    Updated,
    /// The stored row already held identical values; nothing was written.
    Unchanged,
    /// Update-only merge whose target does not exist.
    NotFound,
}

/// Roster fields for one member. `None` fields leave stored values alone.
#[derive(Debug, Clone, PartialEq)]
pub struct MemberUpsert {
    pub code: String,
    pub name: Option<String>,
    /// Present only when the roster row carried at least one history field.
    pub history: Option<Timeline>,
    /// Remaining raw roster fields, merged key by key.
    pub extra: BTreeMap<String, String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnsLinks {
    pub facebook: Option<String>,
    pub youtube: Option<String>,
    pub twitter: Option<String>,
    pub blog: Option<String>,
}

impl SnsLinks {
    /// Incoming links win; absent ones keep the stored value.
    pub fn merged_with(&self, incoming: &SnsLinks) -> SnsLinks {
        SnsLinks {
            facebook: incoming.facebook.clone().or_else(|| self.facebook.clone()),
            youtube: incoming.youtube.clone().or_else(|| self.youtube.clone()),
            twitter: incoming.twitter.clone().or_else(|| self.twitter.clone()),
            blog: incoming.blog.clone().or_else(|| self.blog.clone()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MemberRow {
    pub code: String,
    pub name: String,
    pub party: String,
    pub district: String,
    pub times_elected: u32,
    pub timeline: Vec<TimelineEntry>,
    pub timeline_mismatch: Option<TimelineMismatch>,
    pub extra: BTreeMap<String, String>,
    pub photo_path: Option<String>,
    pub sns: SnsLinks,
    pub is_current: bool,
    pub created_at: String,
}

impl MemberRow {
    /// Build the row for a first observation. Returns `None` when the roster
    /// row has no display name to create the member with.
    pub fn from_upsert(upsert: &MemberUpsert, created_at: &str) -> Option<MemberRow> {
        let name = upsert.name.clone()?;
        let mut row = MemberRow {
            code: upsert.code.clone(),
            name,
            party: UNAFFILIATED.to_string(),
            district: UNDETERMINED.to_string(),
            times_elected: 1,
            timeline: Vec::new(),
            timeline_mismatch: None,
            extra: upsert.extra.clone(),
            photo_path: None,
            sns: SnsLinks::default(),
            is_current: false,
            created_at: created_at.to_string(),
        };
        if let Some(history) = &upsert.history {
            row.apply_history(history);
        }
        Some(row)
    }

    /// Apply a roster observation to an existing row.
    ///
    /// Derived history fields are replaced together; extra keys are merged;
    /// SNS links, photo and the current-term flag belong to other sources and
    /// are untouched.
    pub fn merged_with(&self, incoming: &MemberUpsert) -> MemberRow {
        let mut merged = self.clone();
        if let Some(name) = &incoming.name {
            merged.name = name.clone();
        }
        if let Some(history) = &incoming.history {
            merged.apply_history(history);
        }
        for (key, value) in &incoming.extra {
            merged.extra.insert(key.clone(), value.clone());
        }
        merged
    }

    fn apply_history(&mut self, history: &Timeline) {
        self.party = history.current_party.clone();
        self.district = history.current_district.clone();
        self.times_elected = history.times_elected;
        self.timeline = history.entries.clone();
        self.timeline_mismatch = history.mismatch;
    }
}

#[derive(Debug, Clone, Default)]
pub struct MemberFilter {
    pub current_only: bool,
    pub name: Option<String>,
    pub party: Option<String>,
    pub limit: Option<i64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentKind {
    News,
    Video,
}

impl ContentKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ContentKind::News => "news",
            ContentKind::Video => "video",
        }
    }
}

impl fmt::Display for ContentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ContentKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "news" => Ok(ContentKind::News),
            "video" => Ok(ContentKind::Video),
            other => Err(format!("unknown content kind: {}", other)),
        }
    }
}

/// One observation of a content record, keyed by canonical URL.
#[derive(Debug, Clone, PartialEq)]
pub struct ContentUpsert {
    pub url: String,
    pub kind: ContentKind,
    pub title: Option<String>,
    pub description: Option<String>,
    pub published_at: Option<String>,
    pub source: Option<String>,
    pub origin_url: Option<String>,
    pub duration_secs: Option<i64>,
    /// Member codes to union into the stored relation set.
    pub related: BTreeSet<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ContentRow {
    pub url: String,
    pub kind: ContentKind,
    pub title: String,
    pub description: String,
    pub published_at: Option<String>,
    pub source: Option<String>,
    pub origin_url: Option<String>,
    pub duration_secs: Option<i64>,
    pub related: BTreeSet<String>,
    pub created_at: String,
}

impl ContentRow {
    pub fn from_upsert(upsert: &ContentUpsert, created_at: &str) -> ContentRow {
        ContentRow {
            url: upsert.url.clone(),
            kind: upsert.kind,
            title: upsert.title.clone().unwrap_or_default(),
            description: upsert.description.clone().unwrap_or_default(),
            published_at: upsert.published_at.clone(),
            source: upsert.source.clone(),
            origin_url: upsert.origin_url.clone(),
            duration_secs: upsert.duration_secs,
            related: upsert.related.clone(),
            created_at: created_at.to_string(),
        }
    }

    /// Mutable fields refresh from the incoming observation; the publication
    /// timestamp is kept once set and the kind never changes. Relations are
    /// not touched here (see [`Store::upsert_content`]).
    pub fn merged_with(&self, incoming: &ContentUpsert) -> ContentRow {
        let mut merged = self.clone();
        if let Some(title) = &incoming.title {
            merged.title = title.clone();
        }
        if let Some(description) = &incoming.description {
            merged.description = description.clone();
        }
        if merged.published_at.is_none() {
            merged.published_at = incoming.published_at.clone();
        }
        if incoming.source.is_some() {
            merged.source = incoming.source.clone();
        }
        if incoming.origin_url.is_some() {
            merged.origin_url = incoming.origin_url.clone();
        }
        if incoming.duration_secs.is_some() {
            merged.duration_secs = incoming.duration_secs;
        }
        merged
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContentMerge {
    pub outcome: MergeOutcome,
    pub relations_added: usize,
}

#[derive(Debug, Clone, Default)]
pub struct ContentFilter {
    pub member_code: Option<String>,
    pub kind: Option<ContentKind>,
    pub limit: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bill {
    pub bill_id: String,
    pub bill_no: Option<String>,
    pub title: String,
    /// Processing result code; `None` while the bill is still under review.
    pub outcome: Option<String>,
    pub proposed_on: Option<String>,
    pub committee: Option<String>,
    pub detail_url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PolicyRow {
    pub member_code: String,
    pub member_name: Option<String>,
    pub bill_count: i64,
    pub synced_at: String,
    pub summary: Option<String>,
    pub summarized_bill_count: Option<i64>,
    pub summary_updated_at: Option<String>,
}

impl PolicyRow {
    /// A summary is stale when none exists or the bill count moved since it
    /// was generated.
    pub fn summary_is_stale(&self) -> bool {
        self.summary.is_none() || self.summarized_bill_count != Some(self.bill_count)
    }
}

/// Typed access to persisted members, content and policy documents.
pub trait Store {
    fn get_member(&self, code: &str) -> Result<Option<MemberRow>, StoreError>;
    fn query_members(&self, filter: &MemberFilter) -> Result<Vec<MemberRow>, StoreError>;
    fn upsert_member(&mut self, member: &MemberUpsert) -> Result<MergeOutcome, StoreError>;
    /// Update-only: SNS links for a member that already exists. Also marks the
    /// member as serving in the current term.
    fn update_member_sns(&mut self, code: &str, sns: &SnsLinks) -> Result<MergeOutcome, StoreError>;
    fn set_member_photo(&mut self, code: &str, photo_path: &str) -> Result<MergeOutcome, StoreError>;

    fn get_content(&self, url: &str) -> Result<Option<ContentRow>, StoreError>;
    /// Newest first by publication timestamp; undated records last.
    fn query_content(&self, filter: &ContentFilter) -> Result<Vec<ContentRow>, StoreError>;
    fn upsert_content(&mut self, content: &ContentUpsert) -> Result<ContentMerge, StoreError>;

    /// Replace a member's bill list wholesale and refresh its policy document,
    /// preserving any stored summary. Returns the number of bills stored.
    fn replace_bills(
        &mut self,
        member_code: &str,
        bills: &[Bill],
        synced_at: &str,
    ) -> Result<usize, StoreError>;
    fn get_policy(&self, member_code: &str) -> Result<Option<PolicyRow>, StoreError>;
    fn query_policies(&self) -> Result<Vec<PolicyRow>, StoreError>;
    /// Newest proposal first; undated bills keep their upstream order at the end.
    fn query_bills(&self, member_code: &str, limit: Option<i64>) -> Result<Vec<Bill>, StoreError>;
    fn record_summary(
        &mut self,
        member_code: &str,
        summary: &str,
        bill_count: i64,
        updated_at: &str,
    ) -> Result<(), StoreError>;

    fn get_meta(&self, key: &str) -> Result<Option<String>, StoreError>;
    fn set_meta(&mut self, key: &str, value: &str) -> Result<(), StoreError>;
}
