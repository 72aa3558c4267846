//! Sponsored-bill rows returned by the portal.

use serde::{Deserialize, Serialize};

/// One bill from the proposer search service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BillRow {
    #[serde(rename = "BILL_ID")]
    pub bill_id: Option<String>,

    #[serde(rename = "BILL_NO")]
    pub bill_no: Option<String>,

    #[serde(rename = "BILL_NAME")]
    pub bill_name: Option<String>,

    #[serde(rename = "COMMITTEE")]
    pub committee: Option<String>,

    /// Proposal date, `YYYY-MM-DD`.
    #[serde(rename = "PROPOSE_DT")]
    pub propose_dt: Option<String>,

    /// Processing outcome, e.g. "원안가결". Absent while under review.
    #[serde(rename = "PROC_RESULT")]
    pub proc_result: Option<String>,

    /// Representative proposer line, e.g. "홍길동의원 등 10인".
    #[serde(rename = "RST_PROPOSER")]
    pub rst_proposer: Option<String>,

    #[serde(rename = "DETAIL_LINK")]
    pub detail_link: Option<String>,
}
