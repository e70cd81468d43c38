//! Client-side cache for the book collection.
//!
//! The cache never talks to the network itself. It hands out fetch
//! *generations* that the caller turns into requests, and it is told how each
//! generation settled. That keeps the deduplication and invalidation rules in
//! one place and lets them be tested without a server.

use crate::models::Book;

/// Where the cached collection stands.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryStatus {
    /// Nothing has been fetched successfully yet.
    Loading,
    /// Data is present (possibly being refreshed).
    Ready,
    /// The first fetch failed and there is nothing to show.
    Failed(String),
}

#[derive(Debug)]
pub struct BooksQuery {
    books: Vec<Book>,
    status: QueryStatus,
    in_flight: Option<u64>,
    refetch_after: bool,
    next_generation: u64,
    last_error: Option<String>,
}

impl Default for BooksQuery {
    fn default() -> Self {
        Self::new()
    }
}

impl BooksQuery {
    pub fn new() -> Self {
        Self {
            books: Vec::new(),
            status: QueryStatus::Loading,
            in_flight: None,
            refetch_after: false,
            next_generation: 1,
            last_error: None,
        }
    }

    /// Request a fetch. Returns the generation to fetch, or `None` when one is
    /// already outstanding and this request coalesces into it.
    pub fn begin_fetch(&mut self) -> Option<u64> {
        if self.in_flight.is_some() {
            return None;
        }
        let generation = self.next_generation;
        self.next_generation += 1;
        self.in_flight = Some(generation);
        if matches!(self.status, QueryStatus::Failed(_)) {
            self.status = QueryStatus::Loading;
        }
        Some(generation)
    }

    /// Mark the cached collection stale. If a fetch is already running it may
    /// have been answered before the write landed, so one more fetch is
    /// scheduled for when it settles.
    pub fn invalidate(&mut self) -> Option<u64> {
        if self.in_flight.is_some() {
            self.refetch_after = true;
            return None;
        }
        self.begin_fetch()
    }

    /// Record how a fetch ended. Returns the next generation to fetch when an
    /// invalidation arrived while this one was running.
    pub fn settle(&mut self, generation: u64, result: Result<Vec<Book>, String>) -> Option<u64> {
        if self.in_flight != Some(generation) {
            return None;
        }
        self.in_flight = None;

        match result {
            Ok(books) => {
                self.books = books;
                self.status = QueryStatus::Ready;
                self.last_error = None;
            }
            Err(message) => {
                if self.status == QueryStatus::Loading && self.books.is_empty() {
                    self.status = QueryStatus::Failed(message.clone());
                }
                self.last_error = Some(message);
            }
        }

        if std::mem::take(&mut self.refetch_after) {
            self.begin_fetch()
        } else {
            None
        }
    }

    pub fn books(&self) -> &[Book] {
        &self.books
    }

    pub fn status(&self) -> &QueryStatus {
        &self.status
    }

    /// A fetch is outstanding while data is already on screen.
    pub fn is_refreshing(&self) -> bool {
        self.in_flight.is_some() && self.status == QueryStatus::Ready
    }

    pub fn is_fetching(&self) -> bool {
        self.in_flight.is_some()
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }
}
