//! Terminal front-end: the dashboard page and the widgets it composes.

mod app;
mod forms;
mod helpers;
mod table;
mod terminal;

pub use app::App;
pub use terminal::run_app;
