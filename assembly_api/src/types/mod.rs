mod envelope;
pub use self::envelope::{parse_envelope, PortalResult, NO_DATA_CODE};

mod member;
pub use self::member::{MemberCode, RosterRow, SnsRow};

mod bill;
pub use self::bill::BillRow;

mod news;
pub use self::news::{NewsSearchItem, NewsSearchResponse};
