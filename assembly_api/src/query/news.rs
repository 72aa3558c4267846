use url::Url;

/// Result ordering for the news search endpoint.
#[derive(Clone, Copy, Debug, Default)]
pub enum NewsSort {
    /// Newest first.
    #[default]
    Date,
    /// Relevance ranking.
    Similarity,
}

impl std::fmt::Display for NewsSort {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}",
            match self {
                NewsSort::Date => "date",
                NewsSort::Similarity => "sim",
            }
        )
    }
}

/// Query for the news search endpoint.
pub struct NewsQuery {
    pub query: String,
    /// Number of items to return (the endpoint caps this at 100).
    pub display: u32,
    pub sort: NewsSort,
}

impl NewsQuery {
    pub fn new(query: &str) -> Self {
        Self {
            query: query.to_string(),
            display: 50,
            sort: NewsSort::Date,
        }
    }

    pub fn with_display(mut self, display: u32) -> Self {
        self.display = display.clamp(1, 100);
        self
    }

    pub fn with_sort(mut self, sort: NewsSort) -> Self {
        self.sort = sort;
        self
    }

    pub fn add_to_url(&self, url: &Url) -> Url {
        let mut url = url.clone();
        url.query_pairs_mut()
            .append_pair("query", &self.query)
            .append_pair("display", &self.display.to_string())
            .append_pair("sort", &self.sort.to_string());
        url
    }
}
