use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::path::{Path, PathBuf};

use assembly_insight_lib::store::{Bill, ContentKind, ContentUpsert, MemberUpsert, SnsLinks};
use assembly_insight_lib::timeline::reconstruct;
use assembly_insight_lib::{Db, Exporter, KeywordExtractor, Settings, SimpleTokenizer};
use chrono::DateTime;
use serde_json::Value;

fn workspace_root() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .parent()
        .expect("CLI crate should be inside workspace")
        .to_path_buf()
}

fn load_schema(name: &str) -> Value {
    let path = workspace_root().join("schema").join(name);
    let text = std::fs::read_to_string(&path)
        .unwrap_or_else(|e| panic!("read schema {}: {}", path.display(), e));
    serde_json::from_str(&text).expect("schema is valid JSON")
}

fn read_json(path: &Path) -> Value {
    let text = std::fs::read_to_string(path)
        .unwrap_or_else(|e| panic!("read {}: {}", path.display(), e));
    serde_json::from_str(&text).expect("export is valid JSON")
}

/// A store with one sitting member who has news, a video and bills, and one
/// sitting member with nothing collected yet.
fn populated_db() -> Db {
    let mut db = Db::open_in_memory().unwrap();
    db.init().unwrap();

    for (code, name, periods, parties, districts) in [
        ("A0001", "홍길동", "제21대, 제22대", "가나당/다라당", "서울 종로구/서울 중구"),
        ("A0002", "김영희", "제22대", "가나당", "비례대표"),
    ] {
        db.upsert_member(&MemberUpsert {
            code: code.into(),
            name: Some(name.into()),
            history: Some(reconstruct(Some(periods), Some(parties), Some(districts), None)),
            extra: BTreeMap::from([("BIRDY_DT".to_string(), "19650301".to_string())]),
        })
        .unwrap();
        db.update_member_sns(code, &SnsLinks::default()).unwrap();
    }

    db.upsert_content(&ContentUpsert {
        url: "https://n.news.naver.com/article/001/1".into(),
        kind: ContentKind::News,
        title: Some("홍길동 의원 교통 안전 법안 발의".into()),
        description: Some("교통 안전 강화".into()),
        published_at: Some("2026-10-15T08:50:00+09:00".into()),
        source: Some("연합뉴스".into()),
        origin_url: Some("https://www.yna.co.kr/view/1".into()),
        duration_secs: None,
        related: BTreeSet::from(["A0001".to_string(), "A0002".to_string()]),
    })
    .unwrap();
    db.upsert_content(&ContentUpsert {
        url: "https://www.youtube.com/watch?v=abc123".into(),
        kind: ContentKind::Video,
        title: Some("홍길동 의원 대정부 질문".into()),
        description: None,
        published_at: Some("2026-10-10".into()),
        source: Some("국회방송".into()),
        origin_url: None,
        duration_secs: Some(640),
        related: BTreeSet::from(["A0001".to_string()]),
    })
    .unwrap();

    let bills = vec![
        Bill {
            bill_id: "PRC_A1".into(),
            bill_no: Some("2200001".into()),
            title: "도로교통법 일부개정법률안".into(),
            outcome: Some("원안가결".into()),
            proposed_on: Some("2024-06-01".into()),
            committee: Some("행정안전위원회".into()),
            detail_url: None,
        },
        Bill {
            bill_id: "PRC_A3".into(),
            bill_no: None,
            title: "주차장법 일부개정법률안".into(),
            outcome: Some("계류".into()),
            proposed_on: None,
            committee: None,
            detail_url: None,
        },
    ];
    db.replace_bills("A0001", &bills, "2026-10-16T00:00:00Z").unwrap();
    db
}

fn export(db: &Db, out: &Path) {
    let settings = Settings::default();
    let extractor = KeywordExtractor::new(SimpleTokenizer, HashSet::new(), 2, 15);
    let now = DateTime::parse_from_rfc3339("2026-10-16T12:00:00+09:00").unwrap();
    let report = Exporter::new(db, &extractor, &settings)
        .export_all(out, now)
        .unwrap();
    assert_eq!(report.written, 2);
    assert_eq!(report.failed, 0);
}

// ---------------------------------------------------------------------------
// Positive validation: exported files conform to their schemas
// ---------------------------------------------------------------------------

#[test]
fn test_member_snapshots_conform_to_schema() {
    let db = populated_db();
    let dir = tempfile::tempdir().unwrap();
    export(&db, dir.path());

    let schema = load_schema("member_snapshot.schema.json");
    let validator = jsonschema::draft202012::new(&schema).expect("snapshot schema compiles");

    for code in ["A0001", "A0002"] {
        let snapshot = read_json(&dir.path().join(format!("{}.json", code)));
        if let Err(e) = validator.validate(&snapshot) {
            panic!("{} snapshot failed validation: {e}", code);
        }
    }
}

#[test]
fn test_listing_conforms_to_schema() {
    let db = populated_db();
    let dir = tempfile::tempdir().unwrap();
    export(&db, dir.path());

    let schema = load_schema("members_all.schema.json");
    let validator = jsonschema::draft202012::new(&schema).expect("listing schema compiles");
    let listing = read_json(&dir.path().join("members_all.json"));
    if let Err(e) = validator.validate(&listing) {
        panic!("listing failed validation: {e}");
    }
    assert_eq!(listing.as_array().unwrap().len(), 2);
}

#[test]
fn test_snapshot_contents() {
    let db = populated_db();
    let dir = tempfile::tempdir().unwrap();
    export(&db, dir.path());

    let hong = read_json(&dir.path().join("A0001.json"));
    assert_eq!(hong["profile"]["party"], "다라당");
    assert_eq!(hong["profile"]["times_elected"], 2);
    assert_eq!(hong["profile"]["extra"]["BIRDY_DT"], "1965-03-01");
    assert_eq!(hong["policy"]["stats"]["unclassified"], 1);
    assert_eq!(hong["policy"]["stats"]["achievement_rate"], 50.0);
    assert_eq!(hong["analysis"]["trend_news"]["data"], serde_json::json!([0, 0, 0, 0, 0, 1, 0]));
    assert_eq!(hong["recent_videos"][0]["duration_secs"], 640);

    // cross-referenced news appears for the second member too
    let kim = read_json(&dir.path().join("A0002.json"));
    assert!(kim["policy"].is_null());
    assert_eq!(kim["recent_news"].as_array().unwrap().len(), 1);
}

// ---------------------------------------------------------------------------
// Negative validation: schemas reject invalid data
// ---------------------------------------------------------------------------

#[test]
fn test_snapshot_schema_rejects_missing_profile_code() {
    let db = populated_db();
    let dir = tempfile::tempdir().unwrap();
    export(&db, dir.path());

    let mut snapshot = read_json(&dir.path().join("A0001.json"));
    snapshot["profile"]
        .as_object_mut()
        .expect("profile is an object")
        .remove("code");

    let schema = load_schema("member_snapshot.schema.json");
    let validator = jsonschema::draft202012::new(&schema).expect("schema compiles");
    assert!(
        validator.validate(&snapshot).is_err(),
        "schema should reject snapshot missing profile.code"
    );
}

#[test]
fn test_snapshot_schema_rejects_short_trend() {
    let db = populated_db();
    let dir = tempfile::tempdir().unwrap();
    export(&db, dir.path());

    let mut snapshot = read_json(&dir.path().join("A0001.json"));
    snapshot["analysis"]["trend_news"]["data"] = serde_json::json!([1, 2, 3]);

    let schema = load_schema("member_snapshot.schema.json");
    let validator = jsonschema::draft202012::new(&schema).expect("schema compiles");
    assert!(validator.validate(&snapshot).is_err());
}
