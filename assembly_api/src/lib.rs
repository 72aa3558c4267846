//! Typed HTTP clients for the upstream sources feeding Assembly Insight:
//! the Open Assembly portal (member roster, SNS accounts, sponsored bills)
//! and the news search API.

mod client;
mod errors;
mod query;
pub mod types;

pub use self::client::{
    NewsSearchClient, OpenAssemblyClient, BILL_SERVICE, ROSTER_SERVICE, SNS_SERVICE,
};
pub use self::errors::Error;
pub use self::query::{BillQuery, MemberQuery, NewsQuery, NewsSort, Query, SnsQuery};
