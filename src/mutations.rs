//! Write operations and the per-record ordering applied to them.

use std::collections::{HashMap, HashSet, VecDeque};

use crate::models::{BookDraft, BookId};

/// A write against the collection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mutation {
    Create(BookDraft),
    Update { id: BookId, draft: BookDraft },
    Delete(BookId),
}

impl Mutation {
    /// Record the mutation is ordered against. Creates have no id yet and are
    /// never held back.
    pub fn key(&self) -> Option<&BookId> {
        match self {
            Mutation::Create(_) => None,
            Mutation::Update { id, .. } | Mutation::Delete(id) => Some(id),
        }
    }

    pub fn verb(&self) -> &'static str {
        match self {
            Mutation::Create(_) => "create",
            Mutation::Update { .. } => "update",
            Mutation::Delete(_) => "delete",
        }
    }
}

/// Serialises mutations that target the same record. Mutations on different
/// records, and all creates, run as soon as they are submitted.
#[derive(Debug, Default)]
pub struct MutationQueue {
    busy: HashSet<BookId>,
    waiting: HashMap<BookId, VecDeque<Mutation>>,
    creates_in_flight: usize,
}

impl MutationQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Accept a mutation. Returns it back when it may start right away.
    pub fn submit(&mut self, mutation: Mutation) -> Option<Mutation> {
        let Some(id) = mutation.key().cloned() else {
            self.creates_in_flight += 1;
            return Some(mutation);
        };

        if self.busy.contains(&id) {
            self.waiting.entry(id).or_default().push_back(mutation);
            None
        } else {
            self.busy.insert(id);
            Some(mutation)
        }
    }

    /// Note that `finished` settled. Returns the next mutation queued behind it
    /// for the same record, if any.
    pub fn complete(&mut self, finished: &Mutation) -> Option<Mutation> {
        let Some(id) = finished.key() else {
            self.creates_in_flight = self.creates_in_flight.saturating_sub(1);
            return None;
        };

        let next = self.waiting.get_mut(id).and_then(VecDeque::pop_front);
        if next.is_none() {
            self.waiting.remove(id);
            self.busy.remove(id);
        }
        next
    }

    /// Mutations started but not yet settled.
    pub fn in_flight(&self) -> usize {
        self.busy.len() + self.creates_in_flight
    }

    /// Mutations waiting behind another one for the same record.
    pub fn queued(&self) -> usize {
        self.waiting.values().map(VecDeque::len).sum()
    }
}
