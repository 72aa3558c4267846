//! Legislative outcome statistics.

use std::collections::BTreeSet;

use serde::Serialize;

use crate::store::Bill;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutcomeCategory {
    Passed,
    Reflected,
    Pending,
    Failed,
    Unclassified,
}

impl OutcomeCategory {
    /// Map a raw processing-result code onto its category.
    pub fn from_code(code: Option<&str>) -> Self {
        match code.map(str::trim) {
            None | Some("") | Some("null") => OutcomeCategory::Pending,
            Some("원안가결") | Some("수정가결") => OutcomeCategory::Passed,
            Some("대안반영폐기") | Some("수정안반영폐기") => OutcomeCategory::Reflected,
            Some("폐기") | Some("철회") => OutcomeCategory::Failed,
            Some(_) => OutcomeCategory::Unclassified,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PolicyStats {
    pub passed: u32,
    pub reflected: u32,
    pub pending: u32,
    pub failed: u32,
    pub unclassified: u32,
    /// Distinct unrecognised codes behind `unclassified`.
    pub unclassified_codes: Vec<String>,
    pub total: u32,
    pub achievement_rate: f64,
}

/// Categorise outcome codes and derive the achievement rate:
/// (passed + reflected) / total, as a percentage rounded to one decimal.
pub fn compute<'a>(outcomes: impl IntoIterator<Item = Option<&'a str>>) -> PolicyStats {
    let mut stats = PolicyStats::default();
    let mut unknown = BTreeSet::new();

    for code in outcomes {
        stats.total += 1;
        match OutcomeCategory::from_code(code) {
            OutcomeCategory::Passed => stats.passed += 1,
            OutcomeCategory::Reflected => stats.reflected += 1,
            OutcomeCategory::Pending => stats.pending += 1,
            OutcomeCategory::Failed => stats.failed += 1,
            OutcomeCategory::Unclassified => {
                stats.unclassified += 1;
                if let Some(code) = code {
                    unknown.insert(code.trim().to_string());
                }
            }
        }
    }

    if !unknown.is_empty() {
        tracing::warn!(
            count = stats.unclassified,
            codes = ?unknown,
            "Unclassified bill outcome codes"
        );
    }
    stats.unclassified_codes = unknown.into_iter().collect();

    stats.achievement_rate = if stats.total == 0 {
        0.0
    } else {
        let success = (stats.passed + stats.reflected) as f64;
        (success / stats.total as f64 * 1000.0).round() / 10.0
    };
    stats
}

pub fn compute_for_bills(bills: &[Bill]) -> PolicyStats {
    compute(bills.iter().map(|b| b.outcome.as_deref()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn four_categories_and_rate() {
        let stats = compute([Some("원안가결"), Some("폐기"), None, Some("대안반영폐기")]);
        assert_eq!(stats.passed, 1);
        assert_eq!(stats.reflected, 1);
        assert_eq!(stats.pending, 1);
        assert_eq!(stats.failed, 1);
        assert_eq!(stats.unclassified, 0);
        assert_eq!(stats.total, 4);
        assert_eq!(stats.achievement_rate, 50.0);
    }

    #[test]
    fn empty_and_null_strings_are_pending() {
        let stats = compute([Some(""), Some("null"), Some("  ")]);
        assert_eq!(stats.pending, 3);
        assert_eq!(stats.achievement_rate, 0.0);
    }

    #[test]
    fn unknown_codes_go_to_fifth_bucket() {
        let stats = compute([Some("원안가결"), Some("부결"), Some("부결"), Some("임기만료폐기")]);
        assert_eq!(stats.passed, 1);
        assert_eq!(stats.failed, 0);
        assert_eq!(stats.unclassified, 3);
        assert_eq!(stats.unclassified_codes, vec!["부결", "임기만료폐기"]);
        assert_eq!(stats.total, 4);
        assert_eq!(stats.achievement_rate, 25.0);
    }

    #[test]
    fn rate_rounds_to_one_decimal() {
        let stats = compute([Some("수정가결"), None, None]);
        assert_eq!(stats.achievement_rate, 33.3);
        let stats = compute([Some("수정가결"), Some("수정안반영폐기"), None]);
        assert_eq!(stats.achievement_rate, 66.7);
    }

    #[test]
    fn no_bills_no_rate() {
        let stats = compute(std::iter::empty());
        assert_eq!(stats.total, 0);
        assert_eq!(stats.achievement_rate, 0.0);
    }
}
