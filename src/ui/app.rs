use std::mem;
use std::time::{Duration, Instant};

use crossterm::event::KeyCode;
use ratatui::layout::{Alignment, Constraint, Direction, Layout, Rect};
use ratatui::prelude::*;
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Clear, Paragraph, Wrap};
use ratatui::Frame;
use tracing::{info, warn};

use crate::dispatch::{Dispatcher, Outcome};
use crate::models::{Book, BookDraft, BookId};
use crate::mutations::Mutation;
use crate::store::{BooksQuery, QueryStatus};
use crate::view::{
    clamp_page, filter_books, genre_options, page_label, page_slice, showing_label, total_pages,
    Filters, PAGE_SIZE,
};

use super::forms::{BookField, BookForm, ConfirmDelete};
use super::helpers::{centered_rect, surface_error, ToastKind, Toasts};
use super::table::{confirm_delete, BookTable};

/// Footer space reserved for notifications and instructions.
const FOOTER_HEIGHT: u16 = 3;

/// Which modal, if any, currently owns the keyboard.
enum Mode {
    Normal,
    /// Typing into the search box; `previous` is restored on Esc.
    Searching { previous: String },
    AddingBook(BookForm),
    EditingBook { id: BookId, form: BookForm },
    ConfirmDelete(ConfirmDelete),
}

/// Result of feeding a key to an open form.
enum FormAction {
    Keep,
    Cancel,
    Submit(BookDraft),
}

/// The dashboard page: owns every piece of view state and wires the cache,
/// the table and the form together.
pub struct App {
    dispatcher: Dispatcher,
    query: BooksQuery,
    filters: Filters,
    page: usize,
    table: BookTable,
    mode: Mode,
    toasts: Toasts,
    current_year: i32,
}

impl App {
    /// `current_year` bounds the publication year accepted by the form.
    pub fn new(dispatcher: Dispatcher, current_year: i32) -> Self {
        Self {
            dispatcher,
            query: BooksQuery::new(),
            filters: Filters::default(),
            page: 1,
            table: BookTable::default(),
            mode: Mode::Normal,
            toasts: Toasts::default(),
            current_year,
        }
    }

    /// Kick off the initial collection fetch.
    pub fn start(&mut self) {
        info!(base_url = %self.dispatcher.api().base_url(), "loading books");
        self.refresh();
    }

    /// Apply every request that has completed since the last call. Returns
    /// how many were applied.
    pub fn pump(&mut self) -> usize {
        let mut applied = 0;
        while let Some(outcome) = self.dispatcher.try_next() {
            self.apply(outcome);
            applied += 1;
        }
        self.toasts.expire(Instant::now());
        applied
    }

    /// Like [`pump`](Self::pump), but wait up to `timeout` for the first
    /// completion.
    pub fn pump_timeout(&mut self, timeout: Duration) -> usize {
        match self.dispatcher.next_timeout(timeout) {
            Some(outcome) => {
                self.apply(outcome);
                1 + self.pump()
            }
            None => self.pump(),
        }
    }

    /// Feed a key press. Returns `true` when the user asked to quit.
    pub fn handle_key(&mut self, code: KeyCode) -> bool {
        let mut exit = false;
        let mode = mem::replace(&mut self.mode, Mode::Normal);

        self.mode = match mode {
            Mode::Normal => self.handle_normal_key(code, &mut exit),
            Mode::Searching { previous } => self.handle_search(code, previous),
            Mode::AddingBook(form) => self.handle_add_book(code, form),
            Mode::EditingBook { id, form } => self.handle_edit_book(code, id, form),
            Mode::ConfirmDelete(confirm) => self.handle_confirm_delete(code, confirm),
        };

        exit
    }

    pub fn books(&self) -> &[Book] {
        self.query.books()
    }

    pub fn status(&self) -> &QueryStatus {
        self.query.status()
    }

    pub fn filters(&self) -> &Filters {
        &self.filters
    }

    /// Records passing the active filters, across all pages.
    pub fn filtered_books(&self) -> Vec<&Book> {
        filter_books(self.query.books(), &self.filters)
    }

    pub fn total_pages(&self) -> usize {
        total_pages(self.filtered_books().len(), PAGE_SIZE)
    }

    /// Page on screen. The stored page survives filter changes; it is only
    /// clamped for display.
    pub fn page(&self) -> usize {
        clamp_page(self.page, self.total_pages())
    }

    /// Rows of the page on screen.
    pub fn visible_books(&self) -> Vec<&Book> {
        let filtered = self.filtered_books();
        let page = clamp_page(self.page, total_pages(filtered.len(), PAGE_SIZE));
        page_slice(&filtered, page, PAGE_SIZE).to_vec()
    }

    /// Text of the notifications currently shown, oldest first.
    pub fn notifications(&self) -> Vec<String> {
        self.toasts.iter().map(|toast| toast.text.clone()).collect()
    }

    pub fn is_form_open(&self) -> bool {
        matches!(self.mode, Mode::AddingBook(_) | Mode::EditingBook { .. })
    }

    pub fn is_confirming_delete(&self) -> bool {
        matches!(self.mode, Mode::ConfirmDelete(_))
    }

    /// Mutations started or waiting on the same record.
    pub fn pending_mutations(&self) -> usize {
        self.dispatcher.pending_mutations()
    }

    fn handle_normal_key(&mut self, code: KeyCode, exit: &mut bool) -> Mode {
        if self.query.status() != &QueryStatus::Ready {
            match code {
                KeyCode::Char('q') | KeyCode::Esc => *exit = true,
                KeyCode::Char('r') | KeyCode::Char('R') => self.refresh(),
                _ => {}
            }
            return Mode::Normal;
        }

        match code {
            KeyCode::Char('q') | KeyCode::Esc => *exit = true,
            KeyCode::Up => self.move_row(-1),
            KeyCode::Down => self.move_row(1),
            KeyCode::Left | KeyCode::PageUp => self.go_to_page(self.page().saturating_sub(1)),
            KeyCode::Right | KeyCode::PageDown => self.go_to_page(self.page() + 1),
            KeyCode::Home => self.go_to_page(1),
            KeyCode::End => self.go_to_page(self.total_pages()),
            KeyCode::Char('a') | KeyCode::Char('A') | KeyCode::Char('+') => {
                return Mode::AddingBook(BookForm::default());
            }
            KeyCode::Char('e') | KeyCode::Char('E') | KeyCode::Enter => {
                let target = self.table.edit_target(&self.visible_books());
                match target {
                    Some(book) => {
                        return Mode::EditingBook {
                            form: BookForm::from_book(&book),
                            id: book.id,
                        };
                    }
                    None => self.toasts.push("No book selected to edit.", ToastKind::Error),
                }
            }
            KeyCode::Char('d') | KeyCode::Char('D') | KeyCode::Char('-') => {
                let request = self.table.request_delete(&self.visible_books());
                match request {
                    Some(confirm) => return Mode::ConfirmDelete(confirm),
                    None => self.toasts.push("No book selected to delete.", ToastKind::Error),
                }
            }
            KeyCode::Char('/') | KeyCode::Char('f') | KeyCode::Char('F') => {
                return Mode::Searching {
                    previous: self.filters.search.clone(),
                };
            }
            KeyCode::Char('g') | KeyCode::Char('G') => {
                let options = genre_options(self.query.books());
                self.filters.cycle_genre(&options);
                self.after_filter_change();
            }
            KeyCode::Char('s') | KeyCode::Char('S') => {
                self.filters.cycle_status();
                self.after_filter_change();
            }
            KeyCode::Char('c') | KeyCode::Char('C') => {
                if !self.filters.is_empty() {
                    self.filters = Filters::default();
                    self.after_filter_change();
                    self.toasts.push("Filters cleared.", ToastKind::Info);
                }
            }
            KeyCode::Char('r') | KeyCode::Char('R') => self.refresh(),
            _ => {}
        }
        Mode::Normal
    }

    fn handle_search(&mut self, code: KeyCode, previous: String) -> Mode {
        match code {
            KeyCode::Esc => {
                self.filters.search = previous;
                self.after_filter_change();
                return Mode::Normal;
            }
            KeyCode::Enter | KeyCode::Tab => return Mode::Normal,
            KeyCode::Backspace => {
                self.filters.search.pop();
                self.after_filter_change();
            }
            KeyCode::Char(ch) if !ch.is_control() => {
                self.filters.search.push(ch);
                self.after_filter_change();
            }
            _ => {}
        }
        Mode::Searching { previous }
    }

    fn handle_add_book(&mut self, code: KeyCode, mut form: BookForm) -> Mode {
        match self.handle_form_key(code, &mut form) {
            FormAction::Keep => Mode::AddingBook(form),
            FormAction::Cancel => Mode::Normal,
            FormAction::Submit(draft) => {
                info!(title = %draft.title, "submitting new book");
                self.dispatcher.submit(Mutation::Create(draft));
                Mode::Normal
            }
        }
    }

    fn handle_edit_book(&mut self, code: KeyCode, id: BookId, mut form: BookForm) -> Mode {
        match self.handle_form_key(code, &mut form) {
            FormAction::Keep => Mode::EditingBook { id, form },
            FormAction::Cancel => Mode::Normal,
            FormAction::Submit(draft) => {
                info!(%id, title = %draft.title, "submitting book update");
                self.dispatcher.submit(Mutation::Update { id, draft });
                Mode::Normal
            }
        }
    }

    fn handle_form_key(&self, code: KeyCode, form: &mut BookForm) -> FormAction {
        match code {
            KeyCode::Esc => return FormAction::Cancel,
            KeyCode::Tab | KeyCode::Down => form.next_field(),
            KeyCode::BackTab | KeyCode::Up => form.previous_field(),
            KeyCode::Left | KeyCode::Right => {
                form.toggle_status();
            }
            KeyCode::Backspace => form.backspace(),
            KeyCode::Enter => match form.validate(self.current_year) {
                Ok(draft) => return FormAction::Submit(draft),
                Err(errors) => {
                    if let Some(first) = errors.first() {
                        form.active = first.field();
                    }
                    form.errors = errors;
                }
            },
            KeyCode::Char(ch) => {
                form.push_char(ch);
            }
            _ => {}
        }
        FormAction::Keep
    }

    fn handle_confirm_delete(&mut self, code: KeyCode, confirm: ConfirmDelete) -> Mode {
        match code {
            KeyCode::Esc | KeyCode::Char('n') | KeyCode::Char('N') => Mode::Normal,
            KeyCode::Enter | KeyCode::Char('y') | KeyCode::Char('Y') => {
                confirm_delete(&mut self.dispatcher, confirm);
                Mode::Normal
            }
            _ => Mode::ConfirmDelete(confirm),
        }
    }

    fn apply(&mut self, outcome: Outcome) {
        match outcome {
            Outcome::Fetched { generation, result } => {
                let had_data = self.query.status() == &QueryStatus::Ready;
                let result = result.map_err(|err| {
                    warn!(generation, error = %err, "fetching books failed");
                    surface_error(&err)
                });
                let failed = result.is_err();
                if let Some(next) = self.query.settle(generation, result) {
                    self.dispatcher.fetch(next);
                }
                if failed && had_data {
                    self.toasts.push("Failed to refresh books", ToastKind::Error);
                }
                let rows = self.visible_books().len();
                self.table.clamp(rows);
            }
            Outcome::Mutated { mutation, result } => match (mutation, result) {
                (Mutation::Create(_), Ok(_)) => {
                    self.invalidate_books();
                    self.toasts.push("Book added!", ToastKind::Success);
                }
                (Mutation::Create(draft), Err(err)) => {
                    warn!(title = %draft.title, error = %err, "creating book failed");
                    self.toasts.push("Failed to add book", ToastKind::Error);
                    self.reopen_form(None, &draft, surface_error(&err));
                }
                (Mutation::Update { .. }, Ok(_)) => {
                    self.invalidate_books();
                    self.toasts.push("Book updated!", ToastKind::Success);
                }
                (Mutation::Update { id, draft }, Err(err)) => {
                    warn!(%id, error = %err, "updating book failed");
                    self.toasts.push("Failed to update book", ToastKind::Error);
                    self.reopen_form(Some(id), &draft, surface_error(&err));
                }
                (Mutation::Delete(_), Ok(_)) => {
                    self.invalidate_books();
                    self.toasts.push("Book deleted!", ToastKind::Success);
                }
                (Mutation::Delete(id), Err(err)) => {
                    warn!(%id, error = %err, "deleting book failed");
                    self.toasts.push("Failed to delete book", ToastKind::Error);
                }
            },
        }
    }

    /// Discard the cached collection and fetch it again. Every successful
    /// write goes through here.
    fn invalidate_books(&mut self) {
        if let Some(generation) = self.query.invalidate() {
            self.dispatcher.fetch(generation);
        }
    }

    fn refresh(&mut self) {
        if let Some(generation) = self.query.begin_fetch() {
            self.dispatcher.fetch(generation);
        }
    }

    /// Give the user their rejected submission back, unless another dialog
    /// has been opened in the meantime.
    fn reopen_form(&mut self, id: Option<BookId>, draft: &BookDraft, message: String) {
        if !matches!(self.mode, Mode::Normal) {
            return;
        }
        let mut form = BookForm::from_draft(draft);
        form.submit_error = Some(message);
        self.mode = match id {
            Some(id) => Mode::EditingBook { id, form },
            None => Mode::AddingBook(form),
        };
    }

    fn after_filter_change(&mut self) {
        self.table.reset();
    }

    fn move_row(&mut self, offset: isize) {
        let rows = self.visible_books().len();
        self.table.move_selection(offset, rows);
    }

    fn go_to_page(&mut self, page: usize) {
        let target = clamp_page(page, self.total_pages());
        if target != self.page() {
            self.page = target;
            self.table.reset();
        }
    }

    pub(crate) fn draw(&self, frame: &mut Frame) {
        let area = frame.area();
        match self.query.status() {
            QueryStatus::Loading => {
                self.draw_placeholder(frame, area, vec![Line::from("Loading books...")]);
                return;
            }
            QueryStatus::Failed(message) => {
                let lines = vec![
                    Line::styled("Could not load books", Style::default().fg(Color::Red)),
                    Line::from(message.clone()),
                    Line::from(""),
                    Line::styled(
                        "Press r to retry or q to quit.",
                        Style::default().fg(Color::DarkGray),
                    ),
                ];
                self.draw_placeholder(frame, area, lines);
                return;
            }
            QueryStatus::Ready => {}
        }

        let layout = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(3),
                Constraint::Length(3),
                Constraint::Min(5),
                Constraint::Length(2),
                Constraint::Length(FOOTER_HEIGHT),
            ])
            .split(area);

        self.draw_header(frame, layout[0]);
        self.draw_filters(frame, layout[1]);

        let rows = self.visible_books();
        let title = Line::from(vec![
            Span::raw(" Books "),
            Span::styled(
                format!("({} total) ", self.query.books().len()),
                Style::default().fg(Color::DarkGray),
            ),
        ]);
        self.table.draw(frame, layout[2], &rows, title);

        self.draw_pagination(frame, layout[3]);
        self.draw_footer(frame, layout[4]);

        match &self.mode {
            Mode::AddingBook(form) => self.draw_form(frame, area, "Add Book", form),
            Mode::EditingBook { form, .. } => self.draw_form(frame, area, "Edit Book", form),
            Mode::ConfirmDelete(confirm) => self.draw_confirm_delete(frame, area, confirm),
            Mode::Searching { .. } => {
                let bar = layout[1];
                let typed = "Search: ".len() + self.filters.search.chars().count();
                let x = bar.x.saturating_add(1).saturating_add(to_column(typed));
                frame.set_cursor_position((x.min(bar.right().saturating_sub(2)), bar.y + 1));
            }
            Mode::Normal => {}
        }
    }

    fn draw_placeholder(&self, frame: &mut Frame, area: Rect, lines: Vec<Line<'static>>) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Min(3), Constraint::Length(FOOTER_HEIGHT)])
            .split(area);
        let popup = centered_rect(50, 30, chunks[0]);
        let paragraph = Paragraph::new(lines)
            .alignment(Alignment::Center)
            .wrap(Wrap { trim: true })
            .block(Block::default().borders(Borders::ALL).title(" Book Dashboard "));
        frame.render_widget(paragraph, popup);
        self.draw_footer(frame, chunks[1]);
    }

    fn draw_header(&self, frame: &mut Frame, area: Rect) {
        let mut spans = vec![Span::styled(
            "Book Dashboard",
            Style::default()
                .fg(Color::Blue)
                .add_modifier(Modifier::BOLD),
        )];
        if self.query.is_refreshing() {
            spans.push(Span::styled("  refreshing…", Style::default().fg(Color::DarkGray)));
        }
        let pending = self.dispatcher.pending_mutations();
        if pending > 0 {
            spans.push(Span::styled(
                format!("  saving {pending}…"),
                Style::default().fg(Color::Yellow),
            ));
        }
        spans.push(Span::styled(
            "   [a] Add Book",
            Style::default().fg(Color::Cyan),
        ));

        let header = Paragraph::new(Line::from(spans))
            .block(Block::default().borders(Borders::BOTTOM));
        frame.render_widget(header, area);
    }

    fn draw_filters(&self, frame: &mut Frame, area: Rect) {
        let searching = matches!(self.mode, Mode::Searching { .. });
        let search = if self.filters.search.is_empty() && !searching {
            Span::styled(
                "Search by title or author",
                Style::default().fg(Color::DarkGray),
            )
        } else {
            let style = if searching {
                Style::default().fg(Color::Yellow)
            } else {
                Style::default()
            };
            Span::styled(self.filters.search.clone(), style)
        };

        let genre = self.filters.genre.as_deref().unwrap_or("All Genres").to_string();
        let status = self
            .filters
            .status
            .map(|status| status.to_string())
            .unwrap_or_else(|| "All Status".to_string());

        let line = Line::from(vec![
            Span::raw("Search: "),
            search,
            Span::raw("   Genre: "),
            Span::styled(genre, Style::default().add_modifier(Modifier::BOLD)),
            Span::raw("   Status: "),
            Span::styled(status, Style::default().add_modifier(Modifier::BOLD)),
        ]);
        let filters = Paragraph::new(line).block(Block::default().borders(Borders::ALL));
        frame.render_widget(filters, area);
    }

    fn draw_pagination(&self, frame: &mut Frame, area: Rect) {
        let filtered = self.filtered_books().len();
        let pages = total_pages(filtered, PAGE_SIZE);
        let current = self.page();

        let mut buttons: Vec<Span> = (1..=pages)
            .map(|page| {
                if page == current {
                    Span::styled(
                        format!(" {page} "),
                        Style::default().fg(Color::White).bg(Color::Blue),
                    )
                } else {
                    Span::raw(format!(" {page} "))
                }
            })
            .collect();
        buttons.push(Span::styled(
            format!("   {}", page_label(current, pages)),
            Style::default().fg(Color::Gray),
        ));

        let lines = vec![
            Line::from(buttons),
            Line::styled(
                showing_label(current, PAGE_SIZE, filtered),
                Style::default().fg(Color::DarkGray),
            ),
        ];
        frame.render_widget(Paragraph::new(lines).alignment(Alignment::Center), area);
    }

    fn draw_footer(&self, frame: &mut Frame, area: Rect) {
        let notice = match self.toasts.latest() {
            Some(toast) => Line::styled(toast.text.clone(), toast.kind.style()),
            None => Line::from(""),
        };
        let footer = Paragraph::new(vec![notice, self.footer_instructions()])
            .block(Block::default().borders(Borders::TOP));
        frame.render_widget(footer, area);
    }

    fn footer_instructions(&self) -> Line<'static> {
        let text = match (&self.mode, self.query.status()) {
            (_, QueryStatus::Loading) => "q quit",
            (_, QueryStatus::Failed(_)) => "r retry · q quit",
            (Mode::Searching { .. }, _) => "Type to search · Enter keep · Esc restore",
            (Mode::AddingBook(_) | Mode::EditingBook { .. }, _) => {
                "Enter save · Esc cancel · Tab/↑/↓ field · Space/←/→ status"
            }
            (Mode::ConfirmDelete(_), _) => "y delete · n keep",
            (Mode::Normal, _) => {
                "a add · e edit · d delete · / search · g genre · s status · c clear · ←/→ page · r refresh · q quit"
            }
        };
        Line::styled(text, Style::default().fg(Color::DarkGray))
    }

    fn draw_form(&self, frame: &mut Frame, area: Rect, title: &str, form: &BookForm) {
        let popup = centered_rect(60, 50, area);
        frame.render_widget(Clear, popup);

        let mut lines: Vec<Line> = BookField::ALL
            .iter()
            .map(|field| form.build_line(*field))
            .collect();
        lines.push(Line::from(""));
        if let Some(message) = &form.submit_error {
            lines.push(Line::styled(
                format!("Save failed: {message}"),
                Style::default().fg(Color::Red),
            ));
        }

        let block = Block::default()
            .borders(Borders::ALL)
            .title(format!(" {title} "));
        let paragraph = Paragraph::new(lines).block(block).wrap(Wrap { trim: false });
        frame.render_widget(paragraph, popup);

        if form.active != BookField::Status {
            let row = BookField::ALL
                .iter()
                .position(|field| *field == form.active)
                .unwrap_or(0);
            let label = format!("{}: ", form.active).chars().count();
            let x = popup
                .x
                .saturating_add(1)
                .saturating_add(to_column(label + form.value_len(form.active)));
            let y = popup.y.saturating_add(1).saturating_add(to_column(row));
            if x < popup.right().saturating_sub(1) && y < popup.bottom().saturating_sub(1) {
                frame.set_cursor_position((x, y));
            }
        }
    }

    fn draw_confirm_delete(&self, frame: &mut Frame, area: Rect, confirm: &ConfirmDelete) {
        let popup = centered_rect(50, 25, area);
        frame.render_widget(Clear, popup);
        let lines = vec![
            Line::from("Are you sure you want to delete this book?"),
            Line::from(""),
            Line::styled(
                format!("{} by {}", confirm.book.title, confirm.book.author),
                Style::default().add_modifier(Modifier::BOLD),
            ),
            Line::from(""),
            Line::styled("y / Enter delete · n / Esc keep", Style::default().fg(Color::DarkGray)),
        ];
        let paragraph = Paragraph::new(lines)
            .alignment(Alignment::Center)
            .wrap(Wrap { trim: true })
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .title(" Delete Book ")
                    .border_style(Style::default().fg(Color::Red)),
            );
        frame.render_widget(paragraph, popup);
    }
}

/// Terminal column for a character offset, saturating on very long input.
fn to_column(offset: usize) -> u16 {
    u16::try_from(offset).unwrap_or(u16::MAX)
}
