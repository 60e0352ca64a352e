//! Where recoverable errors go.
//!
//! The tree builder never fails because one path could not be read. It hands
//! the error to a [`Diagnostics`] sink and carries on. Sinks are shared
//! between the rayon workers building sibling subtrees, so every
//! implementation has to cope with concurrent calls.

use std::sync::{
    Mutex,
    atomic::{AtomicUsize, Ordering},
};

use colored::Colorize;

use crate::error::DuError;

/// Sink for errors that do not stop a traversal.
pub trait Diagnostics: Sync {
    /// Record one recoverable error.
    fn report(&self, error: &DuError);
}

/// Writes one line per error to stderr, keeping stdout parseable.
#[derive(Debug, Default)]
pub struct StderrDiagnostics {
    program: String,
    count: AtomicUsize,
}

impl StderrDiagnostics {
    /// Create a sink that prefixes each line with `program`.
    #[must_use]
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            count: AtomicUsize::new(0),
        }
    }

    /// Number of errors reported so far.
    #[must_use]
    pub fn count(&self) -> usize {
        self.count.load(Ordering::Relaxed)
    }
}

impl Diagnostics for StderrDiagnostics {
    fn report(&self, error: &DuError) {
        self.count.fetch_add(1, Ordering::Relaxed);

        // A single eprintln! call holds the stderr lock for the whole line.
        eprintln!("{}: {}", self.program, error.to_string().red());
    }
}

/// Keeps error messages in memory, in the order they were reported.
#[derive(Debug, Default)]
pub struct CollectedDiagnostics {
    messages: Mutex<Vec<String>>,
}

impl CollectedDiagnostics {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the messages collected so far.
    #[must_use]
    pub fn messages(&self) -> Vec<String> {
        self.messages
            .lock()
            .map(|m| m.clone())
            .unwrap_or_else(|poisoned| poisoned.into_inner().clone())
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.messages().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Diagnostics for CollectedDiagnostics {
    fn report(&self, error: &DuError) {
        self.messages
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .push(error.to_string());
    }
}
