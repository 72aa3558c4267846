//! Bounded pagination.

use std::future::Future;

use crate::error::FetchError;

/// Tracks position in a paginated fetch.
///
/// Fetching stops after a page shorter than `page_size` or once `max_pages`
/// pages have been fetched, whichever comes first.
#[derive(Debug, Clone)]
pub struct PageCursor {
    page_size: u32,
    max_pages: u32,
    next: Option<u32>,
}

impl PageCursor {
    pub fn new(page_size: u32, max_pages: u32) -> Self {
        Self {
            page_size,
            max_pages,
            next: if max_pages == 0 { None } else { Some(1) },
        }
    }

    pub fn page_size(&self) -> u32 {
        self.page_size
    }

    /// The 1-based page to fetch next, or `None` when paging is done.
    pub fn next_page(&self) -> Option<u32> {
        self.next
    }

    /// Record the row count of the page just fetched.
    pub fn observe(&mut self, rows: usize) {
        let Some(current) = self.next else {
            return;
        };
        if rows < self.page_size as usize {
            self.next = None;
        } else if current >= self.max_pages {
            tracing::warn!(
                max_pages = self.max_pages,
                "Page ceiling reached with a full last page; results may be truncated"
            );
            self.next = None;
        } else {
            self.next = Some(current + 1);
        }
    }
}

/// Fetch every page through `fetch(page, page_size)` and concatenate rows.
pub async fn collect_pages<T, F, Fut>(mut cursor: PageCursor, mut fetch: F) -> Result<Vec<T>, FetchError>
where
    F: FnMut(u32, u32) -> Fut,
    Fut: Future<Output = Result<Vec<T>, FetchError>>,
{
    let mut rows = Vec::new();
    while let Some(page) = cursor.next_page() {
        let batch = fetch(page, cursor.page_size()).await?;
        cursor.observe(batch.len());
        rows.extend(batch);
    }
    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_page_terminates() {
        let mut cursor = PageCursor::new(100, 50);
        assert_eq!(cursor.next_page(), Some(1));
        cursor.observe(100);
        assert_eq!(cursor.next_page(), Some(2));
        cursor.observe(37);
        assert_eq!(cursor.next_page(), None);
    }

    #[test]
    fn empty_page_terminates() {
        let mut cursor = PageCursor::new(100, 50);
        cursor.observe(0);
        assert_eq!(cursor.next_page(), None);
    }

    #[test]
    fn ceiling_terminates_full_pages() {
        let mut cursor = PageCursor::new(10, 3);
        let mut fetched = 0;
        while cursor.next_page().is_some() {
            fetched += 1;
            cursor.observe(10);
        }
        assert_eq!(fetched, 3);
    }

    #[test]
    fn zero_ceiling_fetches_nothing() {
        assert_eq!(PageCursor::new(10, 0).next_page(), None);
    }

    #[tokio::test]
    async fn collect_pages_concatenates_until_short_page() {
        let rows = collect_pages(PageCursor::new(2, 50), |page, size| async move {
            assert_eq!(size, 2);
            Ok(match page {
                1 => vec![1, 2],
                2 => vec![3, 4],
                _ => vec![5],
            })
        })
        .await
        .unwrap();
        assert_eq!(rows, vec![1, 2, 3, 4, 5]);
    }

    #[tokio::test]
    async fn collect_pages_propagates_errors() {
        let result: Result<Vec<u8>, _> = collect_pages(PageCursor::new(2, 50), |page, _| async move {
            if page == 1 {
                Ok(vec![1, 2])
            } else {
                Err(FetchError::RateLimited)
            }
        })
        .await;
        assert!(result.unwrap_err().is_rate_limited());
    }
}
