mod common;
pub use self::common::{Query, QueryCommon};

mod member;
pub use self::member::{MemberQuery, SnsQuery};

mod bill;
pub use self::bill::BillQuery;

mod news;
pub use self::news::{NewsQuery, NewsSort};
