use url::Url;

use super::{common::QueryCommon, Query};

/// Query for the full member roster (`ALLNAMEMBER`).
#[derive(Default)]
pub struct MemberQuery {
    pub common: QueryCommon,
}

impl Query for MemberQuery {
    fn get_common(&mut self) -> &mut QueryCommon {
        &mut self.common
    }
    fn add_to_url(&self, url: &Url) -> Url {
        self.common.add_to_url(url)
    }
}

/// Query for the sitting members' SNS accounts.
pub struct SnsQuery {
    pub common: QueryCommon,
}

impl Default for SnsQuery {
    fn default() -> Self {
        // The SNS service returns every sitting member on one page.
        Self {
            common: QueryCommon {
                page: 1,
                page_size: 500,
            },
        }
    }
}

impl Query for SnsQuery {
    fn get_common(&mut self) -> &mut QueryCommon {
        &mut self.common
    }
    fn add_to_url(&self, url: &Url) -> Url {
        self.common.add_to_url(url)
    }
}
