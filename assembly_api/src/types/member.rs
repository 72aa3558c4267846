//! Member roster and SNS rows returned by the portal.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Immutable member code assigned by the portal (e.g. "A7Q1208M").
pub type MemberCode = String;

/// One row of the full member roster (`ALLNAMEMBER`).
///
/// The three history fields are parallel, delimiter-separated lists:
/// `periods` is comma-separated ("제21대, 제22대"), `parties` and
/// `districts` are slash-separated.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RosterRow {
    #[serde(rename = "NAAS_CD")]
    pub code: Option<MemberCode>,

    #[serde(rename = "NAAS_NM")]
    pub name: Option<String>,

    #[serde(rename = "GTELT_ERACO")]
    pub periods: Option<String>,

    #[serde(rename = "PLPT_NM")]
    pub parties: Option<String>,

    #[serde(rename = "ELECD_NM")]
    pub districts: Option<String>,

    /// Free-text re-election label, e.g. "재선" or "3선".
    #[serde(rename = "RLCT_DIV_NM")]
    pub reelection: Option<String>,

    /// Every other field the portal returns, kept verbatim.
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_json::Value>,
}

/// One row of the sitting members' SNS service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SnsRow {
    #[serde(rename = "MONA_CD")]
    pub code: Option<MemberCode>,
    #[serde(rename = "F_URL")]
    pub facebook: Option<String>,
    #[serde(rename = "Y_URL")]
    pub youtube: Option<String>,
    #[serde(rename = "T_URL")]
    pub twitter: Option<String>,
    #[serde(rename = "B_URL")]
    pub blog: Option<String>,
}
