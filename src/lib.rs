//! Core library surface for the Book Dashboard TUI.
//!
//! The modules follow the list view pipeline: `api` talks to the `/books`
//! collection, `store` caches what it returns, `dispatch` runs requests off the
//! draw loop, `view` filters and paginates, and `ui` renders it all.
pub mod api;
pub mod config;
pub mod dispatch;
pub mod logging;
pub mod models;
pub mod mutations;
pub mod store;
pub mod ui;
pub mod view;

pub use api::{ApiError, BooksApi};
pub use config::Config;
pub use dispatch::{Dispatcher, Outcome};

/// The domain types other layers manipulate.
pub use models::{Book, BookDraft, BookId, BookStatus};

/// The interactive application entry point and state container.
pub use ui::{run_app, App};
