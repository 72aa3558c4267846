//! Shared query infrastructure for the Open Assembly portal: the [`Query`]
//! trait and the [`QueryCommon`] pagination fields every service accepts.

use url::Url;

/// Trait implemented by every Open Assembly query builder. Provides URL
/// serialization and shared builder methods for pagination.
pub trait Query {
    /// Appends this query's parameters to the given URL, returning the modified URL.
    fn add_to_url(&self, url: &Url) -> Url;

    /// Returns a mutable reference to the common query fields.
    fn get_common(&mut self) -> &mut QueryCommon;

    /// Sets the page number (1-indexed, `pIndex`).
    fn with_page(mut self, page: u32) -> Self
    where
        Self: Sized,
    {
        self.get_common().page = page;
        self
    }

    /// Sets the number of rows per page (`pSize`).
    fn with_page_size(mut self, page_size: u32) -> Self
    where
        Self: Sized,
    {
        self.get_common().page_size = page_size;
        self
    }
}

/// Fields shared by all portal services: response type and pagination.
#[derive(Clone, Copy, Debug)]
pub struct QueryCommon {
    /// Page number (1-indexed). Defaults to 1.
    pub page: u32,
    /// Rows per page. Defaults to 100, the portal maximum for most services.
    pub page_size: u32,
}

impl Default for QueryCommon {
    fn default() -> QueryCommon {
        QueryCommon {
            page: 1,
            page_size: 100,
        }
    }
}

impl QueryCommon {
    /// Appends `Type=json` and the pagination parameters to the URL.
    pub fn add_to_url(&self, url: &Url) -> Url {
        let mut url = url.clone();
        url.query_pairs_mut()
            .append_pair("Type", "json")
            .append_pair("pIndex", &self.page.to_string())
            .append_pair("pSize", &self.page_size.to_string());
        url
    }
}
