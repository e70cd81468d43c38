//! Bridges the synchronous draw loop and the async HTTP client.
//!
//! Requests run as tasks on a tokio runtime. Each one reports back through a
//! channel that the UI drains between frames, so the terminal never blocks on
//! the network.

use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::time::Duration;

use tokio::runtime::Handle;
use tracing::{debug, info};

use crate::api::{ApiError, BooksApi};
use crate::models::Book;
use crate::mutations::{Mutation, MutationQueue};

/// Completion of a background request.
#[derive(Debug)]
pub enum Outcome {
    Fetched {
        generation: u64,
        result: Result<Vec<Book>, ApiError>,
    },
    Mutated {
        mutation: Mutation,
        /// The record the server returned, absent for deletes.
        result: Result<Option<Book>, ApiError>,
    },
}

pub struct Dispatcher {
    api: BooksApi,
    handle: Handle,
    tx: Sender<Outcome>,
    rx: Receiver<Outcome>,
    queue: MutationQueue,
}

impl Dispatcher {
    pub fn new(api: BooksApi, handle: Handle) -> Self {
        let (tx, rx) = mpsc::channel();
        Self {
            api,
            handle,
            tx,
            rx,
            queue: MutationQueue::new(),
        }
    }

    pub fn api(&self) -> &BooksApi {
        &self.api
    }

    /// Start fetching the collection for the given cache generation.
    pub fn fetch(&self, generation: u64) {
        debug!(generation, "fetching collection");
        let api = self.api.clone();
        let tx = self.tx.clone();
        self.handle.spawn(async move {
            let result = api.list().await;
            // The receiver only goes away when the app is shutting down.
            let _ = tx.send(Outcome::Fetched { generation, result });
        });
    }

    /// Hand a mutation to the queue; it starts now or after the mutation
    /// ahead of it on the same record settles.
    pub fn submit(&mut self, mutation: Mutation) {
        match self.queue.submit(mutation) {
            Some(ready) => self.spawn_mutation(ready),
            None => info!(queued = self.queue.queued(), "mutation queued behind same record"),
        }
    }

    /// Number of mutations started or waiting.
    pub fn pending_mutations(&self) -> usize {
        self.queue.in_flight() + self.queue.queued()
    }

    /// Next completed request, if one is ready.
    pub fn try_next(&mut self) -> Option<Outcome> {
        let outcome = self.rx.try_recv().ok()?;
        self.release(&outcome);
        Some(outcome)
    }

    /// Wait up to `timeout` for a completed request.
    pub fn next_timeout(&mut self, timeout: Duration) -> Option<Outcome> {
        match self.rx.recv_timeout(timeout) {
            Ok(outcome) => {
                self.release(&outcome);
                Some(outcome)
            }
            Err(RecvTimeoutError::Timeout | RecvTimeoutError::Disconnected) => None,
        }
    }

    fn release(&mut self, outcome: &Outcome) {
        if let Outcome::Mutated { mutation, .. } = outcome {
            if let Some(next) = self.queue.complete(mutation) {
                self.spawn_mutation(next);
            }
        }
    }

    fn spawn_mutation(&self, mutation: Mutation) {
        info!(verb = mutation.verb(), id = ?mutation.key(), "starting mutation");
        let api = self.api.clone();
        let tx = self.tx.clone();
        self.handle.spawn(async move {
            let result = match &mutation {
                Mutation::Create(draft) => api.create(draft).await.map(Some),
                Mutation::Update { id, draft } => api.update(id, draft).await.map(Some),
                Mutation::Delete(id) => api.delete(id).await.map(|()| None),
            };
            let _ = tx.send(Outcome::Mutated { mutation, result });
        });
    }
}
