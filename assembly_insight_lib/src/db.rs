//! SQLite storage for Assembly Insight data.

use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

use chrono::{SecondsFormat, Utc};
use rusqlite::{params, Connection, OptionalExtension};

use crate::store::{
    Bill, ContentFilter, ContentKind, ContentMerge, ContentRow, ContentUpsert, MemberFilter,
    MemberRow, MemberUpsert, MergeOutcome, PolicyRow, SnsLinks, Store, StoreError,
};
use crate::timeline::{TimelineEntry, TimelineMismatch};

#[derive(thiserror::Error, Debug)]
pub enum DbError {
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("missing required field: {0}")]
    MissingField(&'static str),
    #[error("invalid stored value: {0}")]
    InvalidValue(String),
}

impl From<DbError> for StoreError {
    fn from(e: DbError) -> Self {
        match e {
            DbError::MissingField(field) => StoreError::MissingField(field),
            other => StoreError::Backend(Box::new(other)),
        }
    }
}

const SCHEMA_VERSION: i32 = 1;

const MEMBER_COLUMNS: &str = "code, name, party, district, times_elected, timeline_json,
     timeline_mismatch_json, extra_json, photo_path, sns_facebook, sns_youtube,
     sns_twitter, sns_blog, is_current, created_at";

const CONTENT_SELECT: &str = "SELECT c.url, c.kind, c.title, c.description, c.published_at,
            c.source, c.origin_url, c.duration_secs, c.created_at,
            COALESCE((SELECT GROUP_CONCAT(cm.member_code)
                      FROM content_members cm WHERE cm.url = c.url), '')
     FROM content c";

pub struct Db {
    conn: Connection,
}

impl Db {
    pub fn open(path: impl AsRef<Path>) -> Result<Self, DbError> {
        let conn = Connection::open(path)?;
        conn.execute_batch(
            "PRAGMA foreign_keys = ON;
             PRAGMA journal_mode = WAL;
             PRAGMA synchronous = NORMAL;",
        )?;
        Ok(Self { conn })
    }

    /// Open an in-memory database (for testing).
    pub fn open_in_memory() -> Result<Self, DbError> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        Ok(Self { conn })
    }

    #[doc(hidden)]
    pub fn conn(&self) -> &Connection {
        &self.conn
    }

    pub fn init(&self) -> Result<(), DbError> {
        let version: i32 = self
            .conn
            .pragma_query_value(None, "user_version", |row| row.get(0))?;

        let schema = include_str!("../../schema/sqlite.sql");
        self.conn.execute_batch(schema)?;

        if version < SCHEMA_VERSION {
            self.conn
                .pragma_update(None, "user_version", SCHEMA_VERSION)?;
        }
        Ok(())
    }

    fn now() -> String {
        Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true)
    }
}

struct RawMember {
    code: String,
    name: String,
    party: String,
    district: String,
    times_elected: i64,
    timeline_json: String,
    timeline_mismatch_json: Option<String>,
    extra_json: String,
    photo_path: Option<String>,
    sns: SnsLinks,
    is_current: bool,
    created_at: String,
}

impl RawMember {
    fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
        Ok(RawMember {
            code: row.get(0)?,
            name: row.get(1)?,
            party: row.get(2)?,
            district: row.get(3)?,
            times_elected: row.get(4)?,
            timeline_json: row.get(5)?,
            timeline_mismatch_json: row.get(6)?,
            extra_json: row.get(7)?,
            photo_path: row.get(8)?,
            sns: SnsLinks {
                facebook: row.get(9)?,
                youtube: row.get(10)?,
                twitter: row.get(11)?,
                blog: row.get(12)?,
            },
            is_current: row.get::<_, i64>(13)? != 0,
            created_at: row.get(14)?,
        })
    }

    fn into_member(self) -> Result<MemberRow, DbError> {
        let timeline: Vec<TimelineEntry> = serde_json::from_str(&self.timeline_json)?;
        let timeline_mismatch: Option<TimelineMismatch> = match self.timeline_mismatch_json {
            Some(json) => Some(serde_json::from_str(&json)?),
            None => None,
        };
        let extra: BTreeMap<String, String> = serde_json::from_str(&self.extra_json)?;
        let times_elected = u32::try_from(self.times_elected)
            .map_err(|_| DbError::InvalidValue(format!("times_elected {}", self.times_elected)))?;
        Ok(MemberRow {
            code: self.code,
            name: self.name,
            party: self.party,
            district: self.district,
            times_elected,
            timeline,
            timeline_mismatch,
            extra,
            photo_path: self.photo_path,
            sns: self.sns,
            is_current: self.is_current,
            created_at: self.created_at,
        })
    }
}

struct RawContent {
    url: String,
    kind: String,
    title: String,
    description: String,
    published_at: Option<String>,
    source: Option<String>,
    origin_url: Option<String>,
    duration_secs: Option<i64>,
    created_at: String,
    related: String,
}

impl RawContent {
    fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
        Ok(RawContent {
            url: row.get(0)?,
            kind: row.get(1)?,
            title: row.get(2)?,
            description: row.get(3)?,
            published_at: row.get(4)?,
            source: row.get(5)?,
            origin_url: row.get(6)?,
            duration_secs: row.get(7)?,
            created_at: row.get(8)?,
            related: row.get(9)?,
        })
    }

    fn into_content(self) -> Result<ContentRow, DbError> {
        let kind: ContentKind = self.kind.parse().map_err(DbError::InvalidValue)?;
        let related: BTreeSet<String> = if self.related.is_empty() {
            BTreeSet::new()
        } else {
            self.related.split(',').map(|s| s.to_string()).collect()
        };
        Ok(ContentRow {
            url: self.url,
            kind,
            title: self.title,
            description: self.description,
            published_at: self.published_at,
            source: self.source,
            origin_url: self.origin_url,
            duration_secs: self.duration_secs,
            related,
            created_at: self.created_at,
        })
    }
}

fn load_member(conn: &Connection, code: &str) -> Result<Option<MemberRow>, DbError> {
    let sql = format!("SELECT {} FROM members WHERE code = ?1", MEMBER_COLUMNS);
    let raw = conn
        .query_row(&sql, params![code], RawMember::from_row)
        .optional()?;
    raw.map(RawMember::into_member).transpose()
}

fn load_content(conn: &Connection, url: &str) -> Result<Option<ContentRow>, DbError> {
    let sql = format!("{} WHERE c.url = ?1", CONTENT_SELECT);
    let raw = conn
        .query_row(&sql, params![url], RawContent::from_row)
        .optional()?;
    raw.map(RawContent::into_content).transpose()
}

fn write_member(conn: &Connection, member: &MemberRow, insert: bool) -> Result<(), DbError> {
    let timeline_json = serde_json::to_string(&member.timeline)?;
    let mismatch_json = member
        .timeline_mismatch
        .as_ref()
        .map(serde_json::to_string)
        .transpose()?;
    let extra_json = serde_json::to_string(&member.extra)?;

    let sql = if insert {
        format!(
            "INSERT INTO members ({}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15)",
            MEMBER_COLUMNS
        )
    } else {
        "UPDATE members SET name = ?2, party = ?3, district = ?4, times_elected = ?5,
                timeline_json = ?6, timeline_mismatch_json = ?7, extra_json = ?8,
                photo_path = ?9, sns_facebook = ?10, sns_youtube = ?11, sns_twitter = ?12,
                sns_blog = ?13, is_current = ?14
         WHERE code = ?1"
            .to_string()
    };

    let mut stmt = conn.prepare(&sql)?;
    let mut values: Vec<Box<dyn rusqlite::types::ToSql>> = vec![
        Box::new(member.code.clone()),
        Box::new(member.name.clone()),
        Box::new(member.party.clone()),
        Box::new(member.district.clone()),
        Box::new(member.times_elected),
        Box::new(timeline_json),
        Box::new(mismatch_json),
        Box::new(extra_json),
        Box::new(member.photo_path.clone()),
        Box::new(member.sns.facebook.clone()),
        Box::new(member.sns.youtube.clone()),
        Box::new(member.sns.twitter.clone()),
        Box::new(member.sns.blog.clone()),
        Box::new(member.is_current as i64),
    ];
    if insert {
        values.push(Box::new(member.created_at.clone()));
    }
    let refs: Vec<&dyn rusqlite::types::ToSql> = values.iter().map(|v| v.as_ref()).collect();
    stmt.execute(refs.as_slice())?;
    Ok(())
}

/// SQLite implementations of the store operations. The [`Store`] impl
/// below forwards to these and converts [`DbError`] into [`StoreError`].
impl Db {
    pub fn get_member(&self, code: &str) -> Result<Option<MemberRow>, DbError> {
        load_member(&self.conn, code)
    }

    pub fn query_members(&self, filter: &MemberFilter) -> Result<Vec<MemberRow>, DbError> {
        let mut sql = format!("SELECT {} FROM members WHERE 1=1", MEMBER_COLUMNS);

        let mut params_vec: Vec<Box<dyn rusqlite::types::ToSql>> = Vec::new();
        let mut param_idx = 1;

        if filter.current_only {
            sql.push_str(" AND is_current = 1");
        }
        if let Some(ref name) = filter.name {
            sql.push_str(&format!(" AND name LIKE ?{}", param_idx));
            params_vec.push(Box::new(format!("%{}%", name)));
            param_idx += 1;
        }
        if let Some(ref party) = filter.party {
            sql.push_str(&format!(" AND party = ?{}", param_idx));
            params_vec.push(Box::new(party.clone()));
        }

        sql.push_str(" ORDER BY name, code");

        if let Some(n) = filter.limit {
            sql.push_str(&format!(" LIMIT {}", n));
        }

        let param_refs: Vec<&dyn rusqlite::types::ToSql> =
            params_vec.iter().map(|p| p.as_ref()).collect();

        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map(param_refs.as_slice(), RawMember::from_row)?;

        let mut result = Vec::new();
        for row in rows {
            result.push(row?.into_member()?);
        }
        Ok(result)
    }

    pub fn upsert_member(&mut self, member: &MemberUpsert) -> Result<MergeOutcome, DbError> {
        let tx = self.conn.transaction()?;

        let outcome = match load_member(&tx, &member.code)? {
            None => {
                let row = MemberRow::from_upsert(member, &Self::now())
                    .ok_or(DbError::MissingField("name"))?;
                write_member(&tx, &row, true)?;
                MergeOutcome::Inserted
            }
            Some(existing) => {
                let merged = existing.merged_with(member);
                if merged == existing {
                    MergeOutcome::Unchanged
                } else {
                    write_member(&tx, &merged, false)?;
                    MergeOutcome::Updated
                }
            }
        };

        tx.commit()?;
        Ok(outcome)
    }

    pub fn update_member_sns(&mut self, code: &str, sns: &SnsLinks) -> Result<MergeOutcome, DbError> {
        let tx = self.conn.transaction()?;

        let Some(existing) = load_member(&tx, code)? else {
            return Ok(MergeOutcome::NotFound);
        };
        let mut merged = existing.clone();
        merged.sns = existing.sns.merged_with(sns);
        merged.is_current = true;

        let outcome = if merged == existing {
            MergeOutcome::Unchanged
        } else {
            write_member(&tx, &merged, false)?;
            MergeOutcome::Updated
        };

        tx.commit()?;
        Ok(outcome)
    }

    pub fn set_member_photo(&mut self, code: &str, photo_path: &str) -> Result<MergeOutcome, DbError> {
        let current: Option<Option<String>> = self
            .conn
            .query_row(
                "SELECT photo_path FROM members WHERE code = ?1",
                params![code],
                |row| row.get(0),
            )
            .optional()?;

        match current {
            None => Ok(MergeOutcome::NotFound),
            Some(Some(ref existing)) if existing == photo_path => Ok(MergeOutcome::Unchanged),
            Some(_) => {
                self.conn.execute(
                    "UPDATE members SET photo_path = ?2 WHERE code = ?1",
                    params![code, photo_path],
                )?;
                Ok(MergeOutcome::Updated)
            }
        }
    }

    pub fn get_content(&self, url: &str) -> Result<Option<ContentRow>, DbError> {
        load_content(&self.conn, url)
    }

    pub fn query_content(&self, filter: &ContentFilter) -> Result<Vec<ContentRow>, DbError> {
        let mut sql = format!("{} WHERE 1=1", CONTENT_SELECT);

        let mut params_vec: Vec<Box<dyn rusqlite::types::ToSql>> = Vec::new();
        let mut param_idx = 1;

        if let Some(ref code) = filter.member_code {
            sql.push_str(&format!(
                " AND EXISTS (SELECT 1 FROM content_members f
                              WHERE f.url = c.url AND f.member_code = ?{})",
                param_idx
            ));
            params_vec.push(Box::new(code.clone()));
            param_idx += 1;
        }
        if let Some(kind) = filter.kind {
            sql.push_str(&format!(" AND c.kind = ?{}", param_idx));
            params_vec.push(Box::new(kind.as_str()));
        }

        sql.push_str(" ORDER BY c.published_at IS NULL, c.published_at DESC, c.url");

        if let Some(n) = filter.limit {
            sql.push_str(&format!(" LIMIT {}", n));
        }

        let param_refs: Vec<&dyn rusqlite::types::ToSql> =
            params_vec.iter().map(|p| p.as_ref()).collect();

        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map(param_refs.as_slice(), RawContent::from_row)?;

        let mut result = Vec::new();
        for row in rows {
            result.push(row?.into_content()?);
        }
        Ok(result)
    }

    pub fn upsert_content(&mut self, content: &ContentUpsert) -> Result<ContentMerge, DbError> {
        let tx = self.conn.transaction()?;

        let mut outcome = match load_content(&tx, &content.url)? {
            None => {
                let row = ContentRow::from_upsert(content, &Self::now());
                tx.execute(
                    "INSERT INTO content (url, kind, title, description, published_at, source,
                                          origin_url, duration_secs, created_at)
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
                    params![
                        row.url,
                        row.kind.as_str(),
                        row.title,
                        row.description,
                        row.published_at,
                        row.source,
                        row.origin_url,
                        row.duration_secs,
                        row.created_at,
                    ],
                )?;
                MergeOutcome::Inserted
            }
            Some(existing) => {
                let merged = existing.merged_with(content);
                if merged == existing {
                    MergeOutcome::Unchanged
                } else {
                    tx.execute(
                        "UPDATE content SET title = ?2, description = ?3, published_at = ?4,
                                source = ?5, origin_url = ?6, duration_secs = ?7
                         WHERE url = ?1",
                        params![
                            merged.url,
                            merged.title,
                            merged.description,
                            merged.published_at,
                            merged.source,
                            merged.origin_url,
                            merged.duration_secs,
                        ],
                    )?;
                    MergeOutcome::Updated
                }
            }
        };

        let mut relations_added = 0usize;
        {
            let mut stmt = tx.prepare(
                "INSERT OR IGNORE INTO content_members (url, member_code) VALUES (?1, ?2)",
            )?;
            for code in &content.related {
                relations_added += stmt.execute(params![content.url, code])?;
            }
        }

        tx.commit()?;

        if outcome == MergeOutcome::Unchanged && relations_added > 0 {
            outcome = MergeOutcome::Updated;
        }
        Ok(ContentMerge {
            outcome,
            relations_added,
        })
    }

    pub fn replace_bills(
        &mut self,
        member_code: &str,
        bills: &[Bill],
        synced_at: &str,
    ) -> Result<usize, DbError> {
        let tx = self.conn.transaction()?;

        tx.execute(
            "INSERT INTO policies (member_code, bill_count, synced_at) VALUES (?1, ?2, ?3)
             ON CONFLICT(member_code) DO UPDATE SET
               bill_count = excluded.bill_count,
               synced_at = excluded.synced_at",
            params![member_code, bills.len() as i64, synced_at],
        )?;
        tx.execute(
            "DELETE FROM bills WHERE member_code = ?1",
            params![member_code],
        )?;

        let mut inserted = 0usize;
        {
            let mut stmt = tx.prepare(
                "INSERT OR IGNORE INTO bills (member_code, bill_id, position, bill_no, title,
                                              outcome, proposed_on, committee, detail_url)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
            )?;
            for (position, bill) in bills.iter().enumerate() {
                inserted += stmt.execute(params![
                    member_code,
                    bill.bill_id,
                    position as i64,
                    bill.bill_no,
                    bill.title,
                    bill.outcome,
                    bill.proposed_on,
                    bill.committee,
                    bill.detail_url,
                ])?;
            }
        }

        // Upstream occasionally repeats a bill across pages; count what landed.
        if inserted != bills.len() {
            tx.execute(
                "UPDATE policies SET bill_count = ?2 WHERE member_code = ?1",
                params![member_code, inserted as i64],
            )?;
        }

        tx.commit()?;
        Ok(inserted)
    }

    pub fn get_policy(&self, member_code: &str) -> Result<Option<PolicyRow>, DbError> {
        self.conn
            .query_row(
                "SELECT p.member_code, m.name, p.bill_count, p.synced_at, p.summary,
                        p.summarized_bill_count, p.summary_updated_at
                 FROM policies p LEFT JOIN members m ON m.code = p.member_code
                 WHERE p.member_code = ?1",
                params![member_code],
                policy_from_row,
            )
            .optional()
            .map_err(DbError::from)
    }

    pub fn query_policies(&self) -> Result<Vec<PolicyRow>, DbError> {
        let mut stmt = self.conn.prepare(
            "SELECT p.member_code, m.name, p.bill_count, p.synced_at, p.summary,
                    p.summarized_bill_count, p.summary_updated_at
             FROM policies p LEFT JOIN members m ON m.code = p.member_code
             ORDER BY m.name, p.member_code",
        )?;
        let rows = stmt.query_map([], policy_from_row)?;

        let mut result = Vec::new();
        for row in rows {
            result.push(row?);
        }
        Ok(result)
    }

    pub fn query_bills(&self, member_code: &str, limit: Option<i64>) -> Result<Vec<Bill>, DbError> {
        let mut sql = String::from(
            "SELECT bill_id, bill_no, title, outcome, proposed_on, committee, detail_url
             FROM bills WHERE member_code = ?1
             ORDER BY proposed_on IS NULL, proposed_on DESC, position",
        );
        if let Some(n) = limit {
            sql.push_str(&format!(" LIMIT {}", n));
        }

        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map(params![member_code], |row| {
            Ok(Bill {
                bill_id: row.get(0)?,
                bill_no: row.get(1)?,
                title: row.get(2)?,
                outcome: row.get(3)?,
                proposed_on: row.get(4)?,
                committee: row.get(5)?,
                detail_url: row.get(6)?,
            })
        })?;

        let mut result = Vec::new();
        for row in rows {
            result.push(row?);
        }
        Ok(result)
    }

    pub fn record_summary(
        &mut self,
        member_code: &str,
        summary: &str,
        bill_count: i64,
        updated_at: &str,
    ) -> Result<(), DbError> {
        self.conn.execute(
            "UPDATE policies SET summary = ?2, summarized_bill_count = ?3, summary_updated_at = ?4
             WHERE member_code = ?1",
            params![member_code, summary, bill_count, updated_at],
        )?;
        Ok(())
    }

    pub fn get_meta(&self, key: &str) -> Result<Option<String>, DbError> {
        self.conn
            .query_row(
                "SELECT value FROM ingest_meta WHERE key = ?1",
                params![key],
                |row| row.get(0),
            )
            .optional()
            .map_err(DbError::from)
    }

    pub fn set_meta(&mut self, key: &str, value: &str) -> Result<(), DbError> {
        self.conn.execute(
            "INSERT INTO ingest_meta (key, value) VALUES (?1, ?2)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value",
            params![key, value],
        )?;
        Ok(())
    }
}


impl Store for Db {
    fn get_member(&self, code: &str) -> Result<Option<MemberRow>, StoreError> {
        Ok(Db::get_member(self, code)?)
    }

    fn query_members(&self, filter: &MemberFilter) -> Result<Vec<MemberRow>, StoreError> {
        Ok(Db::query_members(self, filter)?)
    }

    fn upsert_member(&mut self, member: &MemberUpsert) -> Result<MergeOutcome, StoreError> {
        Ok(Db::upsert_member(self, member)?)
    }

    fn update_member_sns(&mut self, code: &str, sns: &SnsLinks) -> Result<MergeOutcome, StoreError> {
        Ok(Db::update_member_sns(self, code, sns)?)
    }

    fn set_member_photo(&mut self, code: &str, photo_path: &str) -> Result<MergeOutcome, StoreError> {
        Ok(Db::set_member_photo(self, code, photo_path)?)
    }

    fn get_content(&self, url: &str) -> Result<Option<ContentRow>, StoreError> {
        Ok(Db::get_content(self, url)?)
    }

    fn query_content(&self, filter: &ContentFilter) -> Result<Vec<ContentRow>, StoreError> {
        Ok(Db::query_content(self, filter)?)
    }

    fn upsert_content(&mut self, content: &ContentUpsert) -> Result<ContentMerge, StoreError> {
        Ok(Db::upsert_content(self, content)?)
    }

    fn replace_bills(
        &mut self,
        member_code: &str,
        bills: &[Bill],
        synced_at: &str,
    ) -> Result<usize, StoreError> {
        Ok(Db::replace_bills(self, member_code, bills, synced_at)?)
    }

    fn get_policy(&self, member_code: &str) -> Result<Option<PolicyRow>, StoreError> {
        Ok(Db::get_policy(self, member_code)?)
    }

    fn query_policies(&self) -> Result<Vec<PolicyRow>, StoreError> {
        Ok(Db::query_policies(self)?)
    }

    fn query_bills(&self, member_code: &str, limit: Option<i64>) -> Result<Vec<Bill>, StoreError> {
        Ok(Db::query_bills(self, member_code, limit)?)
    }

    fn record_summary(
        &mut self,
        member_code: &str,
        summary: &str,
        bill_count: i64,
        updated_at: &str,
    ) -> Result<(), StoreError> {
        Ok(Db::record_summary(self, member_code, summary, bill_count, updated_at)?)
    }

    fn get_meta(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(Db::get_meta(self, key)?)
    }

    fn set_meta(&mut self, key: &str, value: &str) -> Result<(), StoreError> {
        Ok(Db::set_meta(self, key, value)?)
    }
}

fn policy_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<PolicyRow> {
    Ok(PolicyRow {
        member_code: row.get(0)?,
        member_name: row.get(1)?,
        bill_count: row.get(2)?,
        synced_at: row.get(3)?,
        summary: row.get(4)?,
        summarized_bill_count: row.get(5)?,
        summary_updated_at: row.get(6)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::timeline::reconstruct;

    fn open_test_db() -> Db {
        let db = Db::open_in_memory().expect("open in-memory db");
        db.init().expect("init schema");
        db
    }

    fn get_user_version(db: &Db) -> i32 {
        db.conn
            .pragma_query_value(None, "user_version", |row| row.get(0))
            .expect("read user_version")
    }

    /// Every row of every table rendered as text, in key order.
    fn dump(db: &Db) -> String {
        let mut out = String::new();
        for (table, order) in [
            ("members", "code"),
            ("content", "url"),
            ("content_members", "url, member_code"),
            ("policies", "member_code"),
            ("bills", "member_code, bill_id"),
            ("ingest_meta", "key"),
        ] {
            let sql = format!("SELECT * FROM {} ORDER BY {}", table, order);
            let mut stmt = db.conn.prepare(&sql).expect("prepare dump");
            let cols = stmt.column_count();
            let rows = stmt
                .query_map([], |row| {
                    let mut line = Vec::with_capacity(cols);
                    for i in 0..cols {
                        let value: rusqlite::types::Value = row.get(i)?;
                        line.push(format!("{:?}", value));
                    }
                    Ok(line.join("|"))
                })
                .expect("query dump");
            out.push_str(table);
            out.push('\n');
            for row in rows {
                out.push_str(&row.expect("row"));
                out.push('\n');
            }
        }
        out
    }

    fn sample_member(code: &str, name: &str) -> MemberUpsert {
        MemberUpsert {
            code: code.into(),
            name: Some(name.into()),
            history: Some(reconstruct(
                Some("제21대, 제22대"),
                Some("가나당/다라당"),
                Some("서울 종로구/서울 중구"),
                Some("재선"),
            )),
            extra: BTreeMap::from([("NAAS_EMAIL".to_string(), "hong@example.kr".to_string())]),
        }
    }

    fn sample_news(url: &str, related: &[&str]) -> ContentUpsert {
        ContentUpsert {
            url: url.into(),
            kind: ContentKind::News,
            title: Some("예산안 처리 합의".into()),
            description: Some("여야가 예산안 처리에 합의했다".into()),
            published_at: Some("2026-10-15T09:30:00+09:00".into()),
            source: Some("연합뉴스".into()),
            origin_url: Some("https://www.yna.co.kr/view/1".into()),
            duration_secs: None,
            related: related.iter().map(|s| s.to_string()).collect(),
        }
    }

    fn bill(id: &str, proposed_on: Option<&str>, outcome: Option<&str>) -> Bill {
        Bill {
            bill_id: id.into(),
            bill_no: Some(format!("22000{}", id.len())),
            title: format!("{} 일부개정법률안", id),
            outcome: outcome.map(String::from),
            proposed_on: proposed_on.map(String::from),
            committee: Some("법제사법위원회".into()),
            detail_url: None,
        }
    }

    #[test]
    fn test_init_sets_schema_version() {
        let db = open_test_db();
        assert_eq!(get_user_version(&db), SCHEMA_VERSION);
        // second init is a no-op
        db.init().expect("re-init");
        assert_eq!(get_user_version(&db), SCHEMA_VERSION);
    }

    #[test]
    fn test_upsert_member_insert_then_unchanged() {
        let mut db = open_test_db();
        let member = sample_member("A0001", "홍길동");

        assert_eq!(db.upsert_member(&member).unwrap(), MergeOutcome::Inserted);
        assert_eq!(db.upsert_member(&member).unwrap(), MergeOutcome::Unchanged);

        let row = db.get_member("A0001").unwrap().unwrap();
        assert_eq!(row.party, "다라당");
        assert_eq!(row.district, "서울 중구");
        assert_eq!(row.times_elected, 2);
        assert_eq!(row.timeline.len(), 2);
        assert_eq!(row.extra.get("NAAS_EMAIL").map(String::as_str), Some("hong@example.kr"));
    }

    #[test]
    fn test_upsert_member_without_name_on_insert_fails() {
        let mut db = open_test_db();
        let mut member = sample_member("A0001", "홍길동");
        member.name = None;
        assert!(matches!(
            db.upsert_member(&member),
            Err(DbError::MissingField("name"))
        ));
    }

    #[test]
    fn test_store_trait_reports_backend_neutral_errors() {
        let mut db = open_test_db();
        let mut member = sample_member("A0001", "홍길동");
        member.name = None;
        let store: &mut dyn Store = &mut db;
        assert!(matches!(
            store.upsert_member(&member),
            Err(StoreError::MissingField("name"))
        ));

        let broken: StoreError = DbError::InvalidValue("kind".into()).into();
        assert!(matches!(broken, StoreError::Backend(_)));
        assert!(broken.to_string().contains("invalid stored value: kind"));
    }

    #[test]
    fn test_reconcile_twice_is_byte_identical() {
        let mut db = open_test_db();
        let run = |db: &mut Db| {
            db.upsert_member(&sample_member("A0001", "홍길동")).unwrap();
            db.upsert_member(&sample_member("A0002", "김영희")).unwrap();
            db.upsert_content(&sample_news("https://n.news.example/1", &["A0001"]))
                .unwrap();
            db.upsert_content(&sample_news("https://n.news.example/2", &["A0001", "A0002"]))
                .unwrap();
        };

        run(&mut db);
        let first = dump(&db);
        run(&mut db);
        assert_eq!(dump(&db), first);
    }

    #[test]
    fn test_content_relations_union() {
        let mut db = open_test_db();
        let url = "https://n.news.example/1";

        let first = db.upsert_content(&sample_news(url, &["A"])).unwrap();
        assert_eq!(first.outcome, MergeOutcome::Inserted);
        assert_eq!(first.relations_added, 1);

        let second = db.upsert_content(&sample_news(url, &["B"])).unwrap();
        assert_eq!(second.outcome, MergeOutcome::Updated);
        assert_eq!(second.relations_added, 1);

        let row = db.get_content(url).unwrap().unwrap();
        let related: Vec<&str> = row.related.iter().map(String::as_str).collect();
        assert_eq!(related, vec!["A", "B"]);

        // no relation is ever removed
        let third = db.upsert_content(&sample_news(url, &[])).unwrap();
        assert_eq!(third.outcome, MergeOutcome::Unchanged);
        assert_eq!(db.get_content(url).unwrap().unwrap().related.len(), 2);
    }

    #[test]
    fn test_content_published_at_immutable() {
        let mut db = open_test_db();
        let url = "https://n.news.example/1";
        db.upsert_content(&sample_news(url, &["A"])).unwrap();

        let mut later = sample_news(url, &["A"]);
        later.published_at = Some("2026-10-16T10:00:00+09:00".into());
        later.title = Some("예산안 처리 최종 합의".into());
        let merge = db.upsert_content(&later).unwrap();
        assert_eq!(merge.outcome, MergeOutcome::Updated);

        let row = db.get_content(url).unwrap().unwrap();
        assert_eq!(row.published_at.as_deref(), Some("2026-10-15T09:30:00+09:00"));
        assert_eq!(row.title, "예산안 처리 최종 합의");
    }

    #[test]
    fn test_query_content_by_member_newest_first() {
        let mut db = open_test_db();
        let mut old = sample_news("https://n.news.example/old", &["A"]);
        old.published_at = Some("2026-10-01T09:00:00+09:00".into());
        let mut undated = sample_news("https://n.news.example/undated", &["A"]);
        undated.published_at = None;
        db.upsert_content(&old).unwrap();
        db.upsert_content(&undated).unwrap();
        db.upsert_content(&sample_news("https://n.news.example/new", &["A", "B"]))
            .unwrap();
        db.upsert_content(&sample_news("https://n.news.example/other", &["B"]))
            .unwrap();

        let rows = db
            .query_content(&ContentFilter {
                member_code: Some("A".into()),
                kind: Some(ContentKind::News),
                limit: None,
            })
            .unwrap();
        let urls: Vec<&str> = rows.iter().map(|r| r.url.as_str()).collect();
        assert_eq!(
            urls,
            vec![
                "https://n.news.example/new",
                "https://n.news.example/old",
                "https://n.news.example/undated"
            ]
        );
        // the full relation set is reported, not just the filtered member
        assert_eq!(rows[0].related.len(), 2);

        let videos = db
            .query_content(&ContentFilter {
                member_code: Some("A".into()),
                kind: Some(ContentKind::Video),
                limit: None,
            })
            .unwrap();
        assert!(videos.is_empty());
    }

    #[test]
    fn test_update_member_sns_is_update_only() {
        let mut db = open_test_db();
        let sns = SnsLinks {
            youtube: Some("https://youtube.example/hong".into()),
            ..SnsLinks::default()
        };
        assert_eq!(db.update_member_sns("A0001", &sns).unwrap(), MergeOutcome::NotFound);
        assert!(db.get_member("A0001").unwrap().is_none());

        db.upsert_member(&sample_member("A0001", "홍길동")).unwrap();
        assert_eq!(db.update_member_sns("A0001", &sns).unwrap(), MergeOutcome::Updated);
        assert_eq!(db.update_member_sns("A0001", &sns).unwrap(), MergeOutcome::Unchanged);

        // a roster re-sync must not erase SNS or the current-term flag
        db.upsert_member(&sample_member("A0001", "홍길동")).unwrap();
        let row = db.get_member("A0001").unwrap().unwrap();
        assert!(row.is_current);
        assert_eq!(row.sns.youtube.as_deref(), Some("https://youtube.example/hong"));
    }

    #[test]
    fn test_query_members_filters() {
        let mut db = open_test_db();
        db.upsert_member(&sample_member("A0001", "홍길동")).unwrap();
        db.upsert_member(&sample_member("A0002", "김영희")).unwrap();
        db.update_member_sns("A0002", &SnsLinks::default()).unwrap();

        let current = db
            .query_members(&MemberFilter {
                current_only: true,
                ..MemberFilter::default()
            })
            .unwrap();
        assert_eq!(current.len(), 1);
        assert_eq!(current[0].code, "A0002");

        let by_name = db
            .query_members(&MemberFilter {
                name: Some("길동".into()),
                ..MemberFilter::default()
            })
            .unwrap();
        assert_eq!(by_name.len(), 1);
        assert_eq!(by_name[0].code, "A0001");
    }

    #[test]
    fn test_set_member_photo() {
        let mut db = open_test_db();
        assert_eq!(
            db.set_member_photo("A0001", "thumbs/a.jpg").unwrap(),
            MergeOutcome::NotFound
        );
        db.upsert_member(&sample_member("A0001", "홍길동")).unwrap();
        assert_eq!(
            db.set_member_photo("A0001", "thumbs/a.jpg").unwrap(),
            MergeOutcome::Updated
        );
        assert_eq!(
            db.set_member_photo("A0001", "thumbs/a.jpg").unwrap(),
            MergeOutcome::Unchanged
        );
    }

    #[test]
    fn test_replace_bills_is_wholesale_and_keeps_summary() {
        let mut db = open_test_db();
        db.upsert_member(&sample_member("A0001", "홍길동")).unwrap();

        let first = vec![
            bill("B1", Some("2024-06-01"), Some("원안가결")),
            bill("B2", Some("2024-07-01"), None),
        ];
        assert_eq!(db.replace_bills("A0001", &first, "t1").unwrap(), 2);
        db.record_summary("A0001", "요약", 2, "t1").unwrap();

        let second = vec![
            bill("B3", None, None),
            bill("B2", Some("2024-07-01"), Some("대안반영폐기")),
        ];
        assert_eq!(db.replace_bills("A0001", &second, "t2").unwrap(), 2);

        let bills = db.query_bills("A0001", None).unwrap();
        let ids: Vec<&str> = bills.iter().map(|b| b.bill_id.as_str()).collect();
        assert_eq!(ids, vec!["B2", "B3"]);
        assert_eq!(bills[0].outcome.as_deref(), Some("대안반영폐기"));

        let policy = db.get_policy("A0001").unwrap().unwrap();
        assert_eq!(policy.bill_count, 2);
        assert_eq!(policy.synced_at, "t2");
        assert_eq!(policy.summary.as_deref(), Some("요약"));
        assert_eq!(policy.member_name.as_deref(), Some("홍길동"));
    }

    #[test]
    fn test_replace_bills_counts_duplicates_once() {
        let mut db = open_test_db();
        db.upsert_member(&sample_member("A0001", "홍길동")).unwrap();
        let bills = vec![bill("B1", None, None), bill("B1", None, None)];
        assert_eq!(db.replace_bills("A0001", &bills, "t").unwrap(), 1);
        assert_eq!(db.get_policy("A0001").unwrap().unwrap().bill_count, 1);
    }

    #[test]
    fn test_query_bills_limit() {
        let mut db = open_test_db();
        db.upsert_member(&sample_member("A0001", "홍길동")).unwrap();
        let bills: Vec<Bill> = (1..=5)
            .map(|i| bill(&format!("B{}", i), Some(format!("2024-0{}-01", i).as_str()), None))
            .collect();
        db.replace_bills("A0001", &bills, "t").unwrap();
        let recent = db.query_bills("A0001", Some(2)).unwrap();
        assert_eq!(recent.len(), 2);
        assert_eq!(recent[0].bill_id, "B5");
    }

    #[test]
    fn test_meta_roundtrip() {
        let mut db = open_test_db();
        assert_eq!(db.get_meta("last_sync_members").unwrap(), None);
        db.set_meta("last_sync_members", "2026-10-16T00:00:00Z").unwrap();
        db.set_meta("last_sync_members", "2026-10-16T01:00:00Z").unwrap();
        assert_eq!(
            db.get_meta("last_sync_members").unwrap().as_deref(),
            Some("2026-10-16T01:00:00Z")
        );
    }
}
