use std::fmt;

use ratatui::style::{Color, Style};
use ratatui::text::{Line, Span};
use thiserror::Error;

use crate::models::{Book, BookDraft, BookStatus};

/// Earliest publication year the form accepts.
pub(crate) const MIN_YEAR: i32 = 1000;

/// Fields available within the book form, in focus order.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Default)]
pub(crate) enum BookField {
    #[default]
    Title,
    Author,
    Genre,
    Year,
    Status,
}

impl BookField {
    pub(crate) const ALL: [BookField; 5] = [
        BookField::Title,
        BookField::Author,
        BookField::Genre,
        BookField::Year,
        BookField::Status,
    ];

    fn next(self) -> Self {
        match self {
            BookField::Title => BookField::Author,
            BookField::Author => BookField::Genre,
            BookField::Genre => BookField::Year,
            BookField::Year => BookField::Status,
            BookField::Status => BookField::Title,
        }
    }

    fn previous(self) -> Self {
        match self {
            BookField::Title => BookField::Status,
            BookField::Author => BookField::Title,
            BookField::Genre => BookField::Author,
            BookField::Year => BookField::Genre,
            BookField::Status => BookField::Year,
        }
    }
}

impl fmt::Display for BookField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            BookField::Title => "Title",
            BookField::Author => "Author",
            BookField::Genre => "Genre",
            BookField::Year => "Published Year",
            BookField::Status => "Status",
        })
    }
}

/// Why a field blocks submission.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub(crate) enum FieldError {
    #[error("{0} is required.")]
    Required(BookField),
    #[error("Year must be a whole number.")]
    YearNotANumber,
    #[error("Year must be between {min} and {max}.")]
    YearOutOfRange { min: i32, max: i32 },
}

impl FieldError {
    pub(crate) fn field(&self) -> BookField {
        match self {
            FieldError::Required(field) => *field,
            FieldError::YearNotANumber | FieldError::YearOutOfRange { .. } => BookField::Year,
        }
    }
}

/// Form state for creating or editing a book.
#[derive(Default, Clone, Debug)]
pub(crate) struct BookForm {
    pub(crate) title: String,
    pub(crate) author: String,
    pub(crate) genre: String,
    pub(crate) year: String,
    pub(crate) status: BookStatus,
    pub(crate) active: BookField,
    pub(crate) errors: Vec<FieldError>,
    /// Banner shown when the server rejected the last submission.
    pub(crate) submit_error: Option<String>,
}

impl BookForm {
    /// Populate the form from an existing record when entering edit mode.
    pub(crate) fn from_book(book: &Book) -> Self {
        Self::from_draft(&book.draft())
    }

    /// Refill the form with previously submitted values.
    pub(crate) fn from_draft(draft: &BookDraft) -> Self {
        Self {
            title: draft.title.clone(),
            author: draft.author.clone(),
            genre: draft.genre.clone(),
            year: draft.year.to_string(),
            status: draft.status,
            ..Self::default()
        }
    }

    pub(crate) fn next_field(&mut self) {
        self.active = self.active.next();
    }

    pub(crate) fn previous_field(&mut self) {
        self.active = self.active.previous();
    }

    /// Flip the status when it has focus. Returns whether anything changed.
    pub(crate) fn toggle_status(&mut self) -> bool {
        if self.active == BookField::Status {
            self.status = self.status.toggled();
            true
        } else {
            false
        }
    }

    /// Append a character to the active field, validating allowed input.
    pub(crate) fn push_char(&mut self, ch: char) -> bool {
        let accepted = match self.active {
            BookField::Year => {
                if ch.is_ascii_digit() && self.year.len() < 4 {
                    self.year.push(ch);
                    true
                } else {
                    false
                }
            }
            BookField::Status => ch == ' ' && self.toggle_status(),
            field => {
                if ch.is_control() {
                    false
                } else {
                    self.text_mut(field).push(ch);
                    true
                }
            }
        };
        if accepted {
            self.clear_error(self.active);
        }
        accepted
    }

    /// Remove the last character from the active field.
    pub(crate) fn backspace(&mut self) {
        match self.active {
            BookField::Status => {}
            BookField::Year => {
                self.year.pop();
            }
            field => {
                self.text_mut(field).pop();
            }
        }
    }

    /// Check every field and return the record to submit, or every problem
    /// found. `current_year` is the upper bound for the publication year.
    pub(crate) fn validate(&self, current_year: i32) -> Result<BookDraft, Vec<FieldError>> {
        let mut errors = Vec::new();

        let title = self.title.trim();
        let author = self.author.trim();
        let genre = self.genre.trim();
        for (value, field) in [
            (title, BookField::Title),
            (author, BookField::Author),
            (genre, BookField::Genre),
        ] {
            if value.is_empty() {
                errors.push(FieldError::Required(field));
            }
        }

        let year_raw = self.year.trim();
        let year = if year_raw.is_empty() {
            errors.push(FieldError::Required(BookField::Year));
            None
        } else {
            match year_raw.parse::<i32>() {
                Ok(year) if (MIN_YEAR..=current_year).contains(&year) => Some(year),
                Ok(_) => {
                    errors.push(FieldError::YearOutOfRange {
                        min: MIN_YEAR,
                        max: current_year,
                    });
                    None
                }
                Err(_) => {
                    errors.push(FieldError::YearNotANumber);
                    None
                }
            }
        };

        match year {
            Some(year) if errors.is_empty() => Ok(BookDraft {
                title: title.to_string(),
                author: author.to_string(),
                genre: genre.to_string(),
                year,
                status: self.status,
            }),
            _ => Err(errors),
        }
    }

    pub(crate) fn error_for(&self, field: BookField) -> Option<&FieldError> {
        self.errors.iter().find(|err| err.field() == field)
    }

    /// Render a single line for the form widget.
    pub(crate) fn build_line(&self, field: BookField) -> Line<'static> {
        let is_active = self.active == field;
        let value = match field {
            BookField::Status => format!("< {} >", self.status),
            BookField::Year => self.year.clone(),
            other => self.text(other).to_string(),
        };

        let display = if value.is_empty() {
            "<required>".to_string()
        } else {
            value.clone()
        };

        let style = if is_active {
            Style::default().fg(Color::Yellow)
        } else if value.is_empty() {
            Style::default().fg(Color::DarkGray)
        } else {
            Style::default()
        };

        let mut spans = vec![
            Span::raw(format!("{field}: ")),
            Span::styled(display, style),
        ];
        if let Some(err) = self.error_for(field) {
            spans.push(Span::styled(
                format!("  {err}"),
                Style::default().fg(Color::Red),
            ));
        }
        Line::from(spans)
    }

    /// Return the character count for the requested field.
    pub(crate) fn value_len(&self, field: BookField) -> usize {
        match field {
            BookField::Status => 0,
            BookField::Year => self.year.chars().count(),
            other => self.text(other).chars().count(),
        }
    }

    fn clear_error(&mut self, field: BookField) {
        self.errors.retain(|err| err.field() != field);
        self.submit_error = None;
    }

    fn text(&self, field: BookField) -> &str {
        match field {
            BookField::Title => &self.title,
            BookField::Author => &self.author,
            BookField::Genre => &self.genre,
            BookField::Year => &self.year,
            BookField::Status => "",
        }
    }

    fn text_mut(&mut self, field: BookField) -> &mut String {
        match field {
            BookField::Author => &mut self.author,
            BookField::Genre => &mut self.genre,
            BookField::Year => &mut self.year,
            BookField::Title | BookField::Status => &mut self.title,
        }
    }
}

/// Pending confirmation for deleting a record.
#[derive(Clone, Debug)]
pub(crate) struct ConfirmDelete {
    pub(crate) book: Book,
}
