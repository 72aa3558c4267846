//! Rebuild a member's service history from the roster's parallel fields.
//!
//! The roster reports terms, parties and districts as three independent
//! delimited strings (`"제21대, 제22대"`, `"가나당/다라당"`, ...). Entries are
//! paired by position in encounter order, which the roster emits oldest
//! first.

use serde::{Deserialize, Serialize};

/// Party recorded for a member with no reconstructable history.
pub const UNAFFILIATED: &str = "무소속";
/// District recorded for a member with no reconstructable history.
pub const UNDETERMINED: &str = "미정";

const PERIOD_DELIMITER: char = ',';
const LIST_DELIMITER: char = '/';

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimelineEntry {
    pub period: u32,
    pub party: String,
    pub district: String,
}

/// Raw list lengths when the three parallel fields disagree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimelineMismatch {
    pub periods: usize,
    pub affiliations: usize,
    pub locations: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Timeline {
    pub entries: Vec<TimelineEntry>,
    pub current_party: String,
    pub current_district: String,
    pub times_elected: u32,
    pub mismatch: Option<TimelineMismatch>,
}

/// Parse the three history fields plus the free-text re-election field
/// (`"재선"`, `"3선"`, ...) into a [`Timeline`].
pub fn reconstruct(
    periods: Option<&str>,
    parties: Option<&str>,
    districts: Option<&str>,
    reelection: Option<&str>,
) -> Timeline {
    let periods: Vec<u32> = split_tokens(periods, PERIOD_DELIMITER)
        .filter_map(parse_period)
        .collect();
    let parties: Vec<&str> = split_tokens(parties, LIST_DELIMITER).collect();
    let districts: Vec<&str> = split_tokens(districts, LIST_DELIMITER).collect();

    let mismatch = if periods.len() == parties.len() && parties.len() == districts.len() {
        None
    } else {
        Some(TimelineMismatch {
            periods: periods.len(),
            affiliations: parties.len(),
            locations: districts.len(),
        })
    };

    let entries: Vec<TimelineEntry> = periods
        .iter()
        .zip(parties.iter())
        .zip(districts.iter())
        .map(|((period, party), district)| TimelineEntry {
            period: *period,
            party: party.to_string(),
            district: district.to_string(),
        })
        .collect();

    let (current_party, current_district) = match entries.last() {
        Some(last) => (last.party.clone(), last.district.clone()),
        None => (UNAFFILIATED.to_string(), UNDETERMINED.to_string()),
    };

    let times_elected = if entries.is_empty() {
        reelection.and_then(parse_digits).unwrap_or(1)
    } else {
        entries.len() as u32
    };

    Timeline {
        entries,
        current_party,
        current_district,
        times_elected,
        mismatch,
    }
}

fn split_tokens(raw: Option<&str>, delimiter: char) -> impl Iterator<Item = &str> {
    raw.unwrap_or_default()
        .split(delimiter)
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

fn parse_period(token: &str) -> Option<u32> {
    parse_digits(token)
}

/// Concatenate every ASCII digit in `text` and parse the result.
fn parse_digits(text: &str) -> Option<u32> {
    let digits: String = text.chars().filter(|c| c.is_ascii_digit()).collect();
    if digits.is_empty() {
        return None;
    }
    digits.parse().ok()
}
