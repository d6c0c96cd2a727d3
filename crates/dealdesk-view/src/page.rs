// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

/// Manual pagination counters over an externally held list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pager {
    page: usize,
    page_size: usize,
}

impl Pager {
    pub const fn new(page_size: usize) -> Self {
        Self {
            page: 1,
            page_size: if page_size == 0 { 1 } else { page_size },
        }
    }

    pub const fn page(&self) -> usize {
        self.page
    }

    pub const fn page_size(&self) -> usize {
        self.page_size
    }

    pub const fn next_page(&mut self) {
        self.page = self.page.saturating_add(1);
    }

    /// Floors at page 1.
    pub const fn prev_page(&mut self) {
        if self.page > 1 {
            self.page -= 1;
        }
    }

    pub const fn go_to(&mut self, page: usize) {
        self.page = if page == 0 { 1 } else { page };
    }

    /// Changing the window size resets to page 1 so page and size never
    /// disagree about what the window means.
    pub const fn set_page_size(&mut self, page_size: usize) {
        self.page_size = if page_size == 0 { 1 } else { page_size };
        self.page = 1;
    }

    pub const fn page_count(&self, total: usize) -> usize {
        total.div_ceil(self.page_size)
    }

    /// Current window of `items`; empty once the page runs past the end.
    pub fn slice<'a, T>(&self, items: &'a [T]) -> &'a [T] {
        let start = (self.page - 1).saturating_mul(self.page_size);
        if start >= items.len() {
            return &[];
        }
        let end = start.saturating_add(self.page_size).min(items.len());
        &items[start..end]
    }
}

/// A fetch the owner must execute; completions come back through
/// [`InfiniteScroll::complete`] tagged with the request id.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FetchRequest {
    pub request_id: u64,
    pub page: usize,
}

/// Accumulating page feed driven by a visibility signal. The struct owns
/// loading/error/has_more state; the owner performs the fetch and reports
/// the outcome. Request ids double as a cancellation token: `reset`
/// invalidates whatever is still in flight, so late completions cannot
/// resurrect a feed the owner already discarded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InfiniteScroll<T> {
    items: Vec<T>,
    page: usize,
    page_size: usize,
    loading: bool,
    error: Option<String>,
    has_more: bool,
    request_id: u64,
}

impl<T> InfiniteScroll<T> {
    pub const fn new(page_size: usize) -> Self {
        Self {
            items: Vec::new(),
            page: 1,
            page_size: if page_size == 0 { 1 } else { page_size },
            loading: false,
            error: None,
            has_more: true,
            request_id: 0,
        }
    }

    pub fn items(&self) -> &[T] {
        &self.items
    }

    pub const fn page_size(&self) -> usize {
        self.page_size
    }

    pub const fn loading(&self) -> bool {
        self.loading
    }

    pub const fn has_more(&self) -> bool {
        self.has_more
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Drives loading from the sentinel-visibility signal: a fetch is
    /// issued only when the sentinel is visible, more data is expected,
    /// and no fetch is already in flight.
    pub fn poll(&mut self, sentinel_visible: bool) -> Option<FetchRequest> {
        if sentinel_visible { self.begin() } else { None }
    }

    /// Manual load-more with the same re-entrancy guard as `poll`.
    pub fn begin(&mut self) -> Option<FetchRequest> {
        if self.loading || !self.has_more {
            return None;
        }
        self.loading = true;
        self.error = None;
        self.request_id = self.request_id.saturating_add(1);
        Some(FetchRequest {
            request_id: self.request_id,
            page: self.page,
        })
    }

    /// Applies a fetch outcome. Stale request ids are dropped. On success
    /// the batch is appended and the cursor advances; a short or empty
    /// batch means the feed is exhausted. On failure only `error` changes,
    /// so the same page can be retried with another `begin`.
    pub fn complete(&mut self, request_id: u64, result: Result<Vec<T>, String>) -> bool {
        if request_id != self.request_id {
            return false;
        }
        self.loading = false;
        match result {
            Ok(batch) => {
                if batch.is_empty() || batch.len() < self.page_size {
                    self.has_more = false;
                }
                self.items.extend(batch);
                self.page = self.page.saturating_add(1);
            }
            Err(message) => {
                self.error = Some(message);
            }
        }
        true
    }

    /// Back to the initial state, `has_more` included. Outstanding
    /// completions are invalidated.
    pub fn reset(&mut self) {
        self.items.clear();
        self.page = 1;
        self.loading = false;
        self.error = None;
        self.has_more = true;
        self.request_id = self.request_id.saturating_add(1);
    }
}
