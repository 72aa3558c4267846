use url::Url;

use super::{common::QueryCommon, Query};

/// Query for bills by proposer and assembly term.
#[derive(Default)]
pub struct BillQuery {
    pub common: QueryCommon,
    /// Assembly term (`AGE`), e.g. 22.
    pub age: Option<u32>,
    /// Proposer name (`PROPOSER`). The portal matches any co-sponsor.
    pub proposer: Option<String>,
}

impl Query for BillQuery {
    fn get_common(&mut self) -> &mut QueryCommon {
        &mut self.common
    }
    fn add_to_url(&self, url: &Url) -> Url {
        let mut url = self.common.add_to_url(url);
        if let Some(age) = self.age {
            url.query_pairs_mut().append_pair("AGE", &age.to_string());
        }
        if let Some(proposer) = &self.proposer {
            url.query_pairs_mut().append_pair("PROPOSER", proposer);
        }
        url
    }
}

impl BillQuery {
    pub fn with_age(mut self, age: u32) -> Self {
        self.age = Some(age);
        self
    }

    pub fn with_proposer(mut self, proposer: &str) -> Self {
        self.proposer = Some(proposer.to_string());
        self
    }
}
