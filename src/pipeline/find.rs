//! Filtering visitor that feeds [`Found`] values into the Result Stream.

use anyhow::Result;
use crossbeam_channel::Sender;
use log::debug;
use std::path::Path;

use crate::matcher::MatchExpr;
use crate::types::{Entry, Found};
use crate::visitor::{Step, Visitor};

use super::context::{CancelToken, SendAbort, send_cancellable};
use super::error_handler::ErrorAggregator;

/// Filters for a find walk.
///
/// `prefix` is tested against each directory as it is entered and, together with `file`,
/// against every non-directory entry. A directory is only reported when `prefix` is non-empty.
#[derive(Clone, Debug, Default)]
pub struct FindOpts {
    pub prefix: MatchExpr,
    pub file: MatchExpr,
    /// Stop descending below a directory that matched `prefix`.
    pub prune: bool,
}

pub struct FindVisitor {
    tx: Sender<Found>,
    opts: FindOpts,
    cancel: CancelToken,
}

impl FindVisitor {
    pub fn new(tx: Sender<Found>, opts: FindOpts, cancel: CancelToken) -> Self {
        FindVisitor { tx, opts, cancel }
    }

    /// Push with backpressure. `false` means the walk is over (cancelled or consumer gone).
    fn emit(&self, found: Found) -> bool {
        match send_cancellable(&self.tx, found, &self.cancel) {
            Ok(()) => true,
            Err(SendAbort::Cancelled) => false,
            Err(SendAbort::Disconnected) => {
                debug!("Result stream receiver dropped; cancelling walk");
                self.cancel.cancel();
                false
            }
        }
    }
}

impl Visitor for FindVisitor {
    type State = ();

    fn new_state(&self) -> Self::State {}

    fn prefix(&self, _: &mut (), dir: &Path, info: Result<&Entry, &anyhow::Error>) -> Result<Step> {
        let Ok(info) = info else {
            return Ok(Step::Skip);
        };
        if !self.opts.prefix.is_empty() && self.opts.prefix.matches(info) {
            let found = Found::dir(dir);
            if !self.emit(found) || self.opts.prune {
                return Ok(Step::Skip);
            }
        }
        Ok(Step::Descend)
    }

    fn contents(
        &self,
        _: &mut (),
        dir: &Path,
        entries: Vec<Entry>,
        _: &ErrorAggregator,
    ) -> Result<Vec<Entry>> {
        let mut children = Vec::new();
        for entry in entries {
            if entry.is_dir() {
                children.push(entry);
                continue;
            }
            if self.opts.prefix.matches(&entry) && self.opts.file.matches(&entry) {
                let found = Found::new(dir, entry.file_name);
                if !self.emit(found) {
                    return Ok(Vec::new());
                }
            }
        }
        Ok(children)
    }

    fn done(&self, _: (), _: &Path, _: Option<&anyhow::Error>) -> Result<()> {
        Ok(())
    }
}
