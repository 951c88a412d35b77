//! The three-hook contract the walker drives for every directory.
//!
//! For one directory the walker calls [`Visitor::new_state`], then
//! [`prefix`](Visitor::prefix), then (unless skipped) [`contents`](Visitor::contents),
//! then waits for every returned child subtree, then [`done`](Visitor::done).
//! `done` runs for every directory that was entered, skipped or not. The
//! state lives on the stack of that one directory's traversal and is never
//! seen by another directory.

use anyhow::Result;
use std::path::Path;

use crate::pipeline::ErrorAggregator;
use crate::types::Entry;

/// What the walker should do after [`Visitor::prefix`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Step {
    Descend,
    Skip,
}

pub trait Visitor: Send + Sync {
    /// Per-directory state, created when the directory is entered and consumed by `done`.
    type State;

    fn new_state(&self) -> Self::State;

    /// Called on entering `dir`. `info` is the directory's stat result; `Err` means it
    /// could not be stat'ed and the directory will be skipped whatever this returns.
    /// Returning `Err` also skips and records the error.
    fn prefix(
        &self,
        state: &mut Self::State,
        dir: &Path,
        info: Result<&Entry, &anyhow::Error>,
    ) -> Result<Step>;

    /// Called with the lstat'ed entries of `dir`. Returns the entries to descend into.
    /// Per-entry failures that should not stop the directory go to `errors`.
    fn contents(
        &self,
        state: &mut Self::State,
        dir: &Path,
        entries: Vec<Entry>,
        errors: &ErrorAggregator,
    ) -> Result<Vec<Entry>>;

    /// Called once all selected children of `dir` have finished. `err` is the failure (if
    /// any) from this directory's own stat, read or `contents` step. A returned error is
    /// recorded as a new failure, so return `Ok` when merely passing `err` along.
    fn done(&self, state: Self::State, dir: &Path, err: Option<&anyhow::Error>) -> Result<()>;
}
