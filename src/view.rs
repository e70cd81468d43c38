//! Filtering and pagination over the fetched collection. Everything here is
//! pure so the dashboard can recompute it on every frame.

use crate::models::{Book, BookStatus};

/// Rows shown per page.
pub const PAGE_SIZE: usize = 10;

/// Genres offered by the filter even before any record uses them.
pub const DEFAULT_GENRES: [&str; 3] = ["Fiction", "Self-Help", "Thriller"];

/// Active list filters. Empty values impose no constraint.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Filters {
    pub search: String,
    pub genre: Option<String>,
    pub status: Option<BookStatus>,
}

impl Filters {
    /// Title or author contains the search text (ignoring case), and genre and
    /// status match exactly when set.
    pub fn matches(&self, book: &Book) -> bool {
        let needle = self.search.to_lowercase();
        let matches_search = book.title.to_lowercase().contains(&needle)
            || book.author.to_lowercase().contains(&needle);
        let matches_genre = self.genre.as_ref().map_or(true, |genre| &book.genre == genre);
        let matches_status = self.status.map_or(true, |status| book.status == status);

        matches_search && matches_genre && matches_status
    }

    pub fn is_empty(&self) -> bool {
        self.search.is_empty() && self.genre.is_none() && self.status.is_none()
    }

    /// Step the genre filter: all → each option in turn → all.
    pub fn cycle_genre(&mut self, options: &[String]) {
        self.genre = match &self.genre {
            None => options.first().cloned(),
            Some(current) => options
                .iter()
                .position(|option| option == current)
                .and_then(|idx| options.get(idx + 1))
                .cloned(),
        };
    }

    /// Step the status filter: all → Available → Issued → all.
    pub fn cycle_status(&mut self) {
        self.status = match self.status {
            None => Some(BookStatus::Available),
            Some(BookStatus::Available) => Some(BookStatus::Issued),
            Some(BookStatus::Issued) => None,
        };
    }
}

/// Records passing `filters`, in their original order.
pub fn filter_books<'a>(books: &'a [Book], filters: &Filters) -> Vec<&'a Book> {
    books.iter().filter(|book| filters.matches(book)).collect()
}

/// `ceil(count / page_size)`; zero when there is nothing to show.
pub fn total_pages(count: usize, page_size: usize) -> usize {
    if page_size == 0 {
        return 0;
    }
    count.div_ceil(page_size)
}

/// Keep a stored page number inside `[1, total_pages]`.
pub fn clamp_page(page: usize, total_pages: usize) -> usize {
    page.clamp(1, total_pages.max(1))
}

/// The 1-based `page` of `items`. Pages past the end are empty.
pub fn page_slice<T>(items: &[T], page: usize, page_size: usize) -> &[T] {
    let start = page.saturating_sub(1).saturating_mul(page_size);
    if start >= items.len() {
        return &[];
    }
    let end = (start + page_size).min(items.len());
    &items[start..end]
}

/// "Page 2 of 3".
pub fn page_label(page: usize, total_pages: usize) -> String {
    format!("Page {page} of {}", total_pages.max(1))
}

/// "Showing 21–25 of 25 books".
pub fn showing_label(page: usize, page_size: usize, count: usize) -> String {
    let last = (page * page_size).min(count);
    let first = if last == 0 {
        0
    } else {
        (page - 1) * page_size + 1
    };
    format!("Showing {first}–{last} of {count} books")
}

/// Filter choices: the default genres first, then any other genre found in
/// the collection, alphabetically.
pub fn genre_options(books: &[Book]) -> Vec<String> {
    let mut options: Vec<String> = DEFAULT_GENRES.iter().map(|g| g.to_string()).collect();
    let mut extra: Vec<String> = books
        .iter()
        .map(|book| book.genre.as_str())
        .filter(|genre| !genre.trim().is_empty())
        .filter(|genre| !options.iter().any(|known| known == genre))
        .map(str::to_string)
        .collect();
    extra.sort();
    extra.dedup();
    options.extend(extra);
    options
}
