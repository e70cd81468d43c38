use std::collections::VecDeque;
use std::time::{Duration, Instant};

use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::Span;

use crate::models::BookStatus;

/// How long a notification stays in the footer.
pub(crate) const TOAST_TTL: Duration = Duration::from_secs(4);

/// Severity levels shown in the footer.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub(crate) enum ToastKind {
    Success,
    Info,
    Error,
}

impl ToastKind {
    pub(crate) fn style(&self) -> Style {
        match self {
            ToastKind::Success => Style::default().fg(Color::Green),
            ToastKind::Info => Style::default().fg(Color::Cyan),
            ToastKind::Error => Style::default().fg(Color::Red),
        }
    }
}

/// A transient notification.
#[derive(Clone, Debug)]
pub(crate) struct Toast {
    pub(crate) text: String,
    pub(crate) kind: ToastKind,
    shown_at: Instant,
}

/// Notifications currently on screen, oldest first.
#[derive(Default, Debug)]
pub(crate) struct Toasts {
    items: VecDeque<Toast>,
}

impl Toasts {
    /// Keep only the newest few; older ones scroll out.
    const LIMIT: usize = 3;

    pub(crate) fn push<S: Into<String>>(&mut self, text: S, kind: ToastKind) {
        self.items.push_back(Toast {
            text: text.into(),
            kind,
            shown_at: Instant::now(),
        });
        while self.items.len() > Self::LIMIT {
            self.items.pop_front();
        }
    }

    /// Drop notifications older than [`TOAST_TTL`].
    pub(crate) fn expire(&mut self, now: Instant) {
        self.items
            .retain(|toast| now.saturating_duration_since(toast.shown_at) < TOAST_TTL);
    }

    pub(crate) fn iter(&self) -> impl Iterator<Item = &Toast> {
        self.items.iter()
    }

    pub(crate) fn latest(&self) -> Option<&Toast> {
        self.items.back()
    }
}

/// Coloured badge for a status cell.
pub(crate) fn status_badge(status: BookStatus) -> Span<'static> {
    let colour = match status {
        BookStatus::Available => Color::Green,
        BookStatus::Issued => Color::Yellow,
    };
    Span::styled(
        format!(" {status} "),
        Style::default()
            .fg(Color::Black)
            .bg(colour)
            .add_modifier(Modifier::BOLD),
    )
}

/// Produce a rectangle centered within `area` that spans the requested percent
/// of the width and height. Used for modal dialogs.
pub(crate) fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
    let horizontal = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(area);

    let vertical = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(horizontal[1]);

    vertical[1]
}

/// Extract the most specific message from an error and its sources.
pub(crate) fn surface_error(err: &(dyn std::error::Error + 'static)) -> String {
    let mut current = err;
    while let Some(source) = current.source() {
        current = source;
    }
    current.to_string()
}
