//! The book table: one row per record on the current page, plus the row
//! selection and the delete flow it owns.

use ratatui::layout::{Constraint, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::Line;
use ratatui::widgets::{Block, Borders, Cell, Row, Table, TableState};
use ratatui::Frame;
use tracing::info;

use crate::dispatch::Dispatcher;
use crate::models::Book;
use crate::mutations::Mutation;

use super::forms::ConfirmDelete;
use super::helpers::status_badge;

/// Selected row within the visible page.
#[derive(Default, Debug)]
pub(crate) struct BookTable {
    selected: usize,
}

impl BookTable {
    pub(crate) fn selected(&self) -> usize {
        self.selected
    }

    pub(crate) fn move_selection(&mut self, offset: isize, rows: usize) {
        if rows == 0 {
            self.selected = 0;
            return;
        }
        let max = rows as isize - 1;
        self.selected = (self.selected as isize + offset).clamp(0, max) as usize;
    }

    pub(crate) fn reset(&mut self) {
        self.selected = 0;
    }

    /// Keep the selection on a real row after the page shrinks.
    pub(crate) fn clamp(&mut self, rows: usize) {
        self.selected = self.selected.min(rows.saturating_sub(1));
    }

    /// Record under the cursor.
    pub(crate) fn current<'a>(&self, rows: &[&'a Book]) -> Option<&'a Book> {
        rows.get(self.selected).copied()
    }

    /// Edit trigger: the full record for the form to start from.
    pub(crate) fn edit_target(&self, rows: &[&Book]) -> Option<Book> {
        self.current(rows).cloned()
    }

    /// Delete trigger: nothing is removed until the user confirms.
    pub(crate) fn request_delete(&self, rows: &[&Book]) -> Option<ConfirmDelete> {
        self.current(rows).map(|book| ConfirmDelete { book: book.clone() })
    }

    pub(crate) fn draw(&self, frame: &mut Frame, area: Rect, rows: &[&Book], title: Line<'static>) {
        let header = Row::new(["Title", "Author", "Genre", "Year", "Status"]).style(
            Style::default()
                .fg(Color::Gray)
                .add_modifier(Modifier::BOLD | Modifier::UNDERLINED),
        );

        let body = rows.iter().map(|book| {
            Row::new(vec![
                Cell::from(book.title.clone()).style(Style::default().add_modifier(Modifier::BOLD)),
                Cell::from(book.author.clone()),
                Cell::from(book.genre.clone()),
                Cell::from(book.year.to_string()),
                Cell::from(Line::from(status_badge(book.status))),
            ])
        });

        let table = Table::new(
            body,
            [
                Constraint::Percentage(32),
                Constraint::Percentage(24),
                Constraint::Percentage(16),
                Constraint::Length(6),
                Constraint::Length(11),
            ],
        )
        .header(header)
        .block(Block::default().borders(Borders::ALL).title(title))
        .row_highlight_style(Style::default().bg(Color::DarkGray))
        .highlight_symbol("> ");

        let mut state = TableState::default();
        if !rows.is_empty() {
            state.select(Some(self.selected));
        }
        frame.render_stateful_widget(table, area, &mut state);
    }
}

/// Confirmed deletion: the table issues the delete itself. The dashboard
/// reacts to the outcome with a notification and, on success, a refetch.
pub(crate) fn confirm_delete(dispatcher: &mut Dispatcher, confirm: ConfirmDelete) {
    info!(id = %confirm.book.id, title = %confirm.book.title, "delete confirmed");
    dispatcher.submit(Mutation::Delete(confirm.book.id));
}
