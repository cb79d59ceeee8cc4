//! Cursor-paginated collection fetcher
//!
//! Drains a remote collection page by page into one ordered `Vec`. The
//! remote order is kept: pages are appended in the order received and items
//! keep their within-page order.
//!
//! A page without a cursor (or with an empty one) ends the drain. Because a
//! misbehaving server could hand out cursors forever, the drain is bounded by
//! [`PaginationLimits::max_pages`] and [`PaginationLimits::max_items`].

use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, trace};

/// Largest page size the graph endpoints accept
pub const MAX_PAGE_SIZE: u32 = 100;

/// Default pause between page requests
pub const DEFAULT_PAGE_DELAY: Duration = Duration::from_millis(50);

/// Default bound on the number of pages drained from one collection
pub const DEFAULT_MAX_PAGES: u32 = 1_000;

/// Default bound on the number of items drained from one collection
pub const DEFAULT_MAX_ITEMS: usize = 100_000;

/// One page of a collection
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page<T> {
    /// Items in server order
    pub items: Vec<T>,

    /// Continuation token; `None` when this is the last page
    pub cursor: Option<String>,
}

impl<T> Page<T> {
    /// Create a page
    pub fn new(items: Vec<T>, cursor: Option<String>) -> Self {
        Self { items, cursor }
    }

    /// The cursor for the next request, if the collection continues
    fn next_cursor(&self) -> Option<&str> {
        self.cursor.as_deref().filter(|c| !c.is_empty())
    }
}

/// A remote collection that can be read one page at a time
#[async_trait]
pub trait PageSource: Send + Sync {
    /// Item type of the collection
    type Item: Send;

    /// Error returned by a failed page request
    type Error: Send;

    /// Fetch the page starting at `cursor` (`None` for the first page)
    async fn fetch_page(
        &self,
        cursor: Option<&str>,
        limit: u32,
    ) -> Result<Page<Self::Item>, Self::Error>;
}

/// Invalid pagination settings
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LimitsError {
    /// Page size outside `1..=MAX_PAGE_SIZE`
    #[error("page size must be between 1 and {MAX_PAGE_SIZE}, got {0}")]
    PageSize(u32),

    /// Zero page or item bound
    #[error("{0} must be greater than zero")]
    ZeroBound(&'static str),
}

/// How a collection is drained
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PaginationLimits {
    page_size: u32,
    max_pages: u32,
    max_items: usize,
    page_delay: Duration,
}

impl PaginationLimits {
    /// Validate and build limits.
    pub fn new(
        page_size: u32,
        max_pages: u32,
        max_items: usize,
        page_delay: Duration,
    ) -> Result<Self, LimitsError> {
        if !(1..=MAX_PAGE_SIZE).contains(&page_size) {
            return Err(LimitsError::PageSize(page_size));
        }
        if max_pages == 0 {
            return Err(LimitsError::ZeroBound("max_pages"));
        }
        if max_items == 0 {
            return Err(LimitsError::ZeroBound("max_items"));
        }
        Ok(Self {
            page_size,
            max_pages,
            max_items,
            page_delay,
        })
    }

    /// Same limits with a different inter-page delay
    pub fn with_page_delay(mut self, page_delay: Duration) -> Self {
        self.page_delay = page_delay;
        self
    }

    /// Items requested per page
    pub fn page_size(&self) -> u32 {
        self.page_size
    }

    /// Most pages a drain may request
    pub fn max_pages(&self) -> u32 {
        self.max_pages
    }

    /// Most items a drain may accumulate
    pub fn max_items(&self) -> usize {
        self.max_items
    }

    /// Pause between consecutive page requests
    pub fn page_delay(&self) -> Duration {
        self.page_delay
    }
}

impl Default for PaginationLimits {
    fn default() -> Self {
        Self {
            page_size: MAX_PAGE_SIZE,
            max_pages: DEFAULT_MAX_PAGES,
            max_items: DEFAULT_MAX_ITEMS,
            page_delay: DEFAULT_PAGE_DELAY,
        }
    }
}

/// Why a drain did not complete
#[derive(Debug, Error)]
pub enum FetchError<E> {
    /// A page request failed
    #[error(transparent)]
    Source(E),

    /// The collection kept returning cursors past the page bound
    #[error("collection exceeded {limit} pages")]
    TooManyPages {
        /// The bound that was hit
        limit: u32,
    },

    /// The collection grew past the item bound
    #[error("collection exceeded {limit} items")]
    TooManyItems {
        /// The bound that was hit
        limit: usize,
    },
}

/// Progress after each drained page
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FetchProgress {
    /// Pages received so far
    pub pages: u32,
    /// Items accumulated so far
    pub items: usize,
}

/// Drain `source` completely.
///
/// All-or-nothing: on any error the partial accumulation is dropped.
pub async fn fetch_all<S>(
    source: &S,
    limits: &PaginationLimits,
) -> Result<Vec<S::Item>, FetchError<S::Error>>
where
    S: PageSource + ?Sized,
{
    fetch_all_with_progress(source, limits, |_| {}).await
}

/// Drain `source` completely, reporting progress after every page.
pub async fn fetch_all_with_progress<S, F>(
    source: &S,
    limits: &PaginationLimits,
    mut on_page: F,
) -> Result<Vec<S::Item>, FetchError<S::Error>>
where
    S: PageSource + ?Sized,
    F: FnMut(FetchProgress) + Send,
{
    let mut items = Vec::new();
    let mut cursor: Option<String> = None;
    let mut pages: u32 = 0;

    loop {
        if pages >= limits.max_pages {
            return Err(FetchError::TooManyPages {
                limit: limits.max_pages,
            });
        }
        if pages > 0 && !limits.page_delay.is_zero() {
            tokio::time::sleep(limits.page_delay).await;
        }

        trace!(page = pages, cursor = ?cursor, "Requesting page");
        let page = source
            .fetch_page(cursor.as_deref(), limits.page_size)
            .await
            .map_err(FetchError::Source)?;
        pages += 1;

        let next = page.next_cursor().map(str::to_string);
        items.extend(page.items);
        if items.len() > limits.max_items {
            return Err(FetchError::TooManyItems {
                limit: limits.max_items,
            });
        }

        on_page(FetchProgress {
            pages,
            items: items.len(),
        });

        match next {
            Some(c) => cursor = Some(c),
            None => break,
        }
    }

    debug!(pages, items = items.len(), "Collection drained");
    Ok(items)
}
