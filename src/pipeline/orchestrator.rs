//! Producer/consumer plumbing: a walk thread feeding a bounded Result Stream.

use anyhow::Result;
use crossbeam_channel::{Receiver, bounded};
use log::debug;
use std::path::PathBuf;
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use crate::WalkOpts;
use crate::fs::FileSystem;
use crate::types::Found;

use super::context::{CancelToken, PipelineTuning};
use super::error_handler::{ErrorAggregator, WalkError};
use super::find::{FindOpts, FindVisitor};
use super::walk::{ProgressFn, Walker};

/// Handles returned by [`run_find`]: receive from `found_rx` until it closes, then [`finish`](Self::finish).
pub struct FindHandles {
    pub found_rx: Receiver<Found>,
    pub walk_handle: JoinHandle<Result<(), WalkError>>,
    /// Shared with the walk; holds per-item failures while the walk is running.
    pub errors: Arc<ErrorAggregator>,
    pub cancel: CancelToken,
}

impl FindHandles {
    /// Blocking iterator over results; ends when the producer closes the stream.
    pub fn iter(&self) -> crossbeam_channel::Iter<'_, Found> {
        self.found_rx.iter()
    }

    /// Join the walk and return its consolidated error.
    ///
    /// Drops the receiver first, so results left undrained cancel the walk instead of
    /// blocking it forever.
    pub fn finish(self) -> Result<()> {
        let FindHandles {
            found_rx,
            walk_handle,
            ..
        } = self;
        drop(found_rx);
        walk_handle
            .join()
            .map_err(|_| anyhow::anyhow!("walk thread panicked"))??;
        Ok(())
    }
}

/// Start a find walk over `roots` on its own thread.
///
/// The walk thread owns the only sender; the stream closes exactly once, when the walk
/// returns (cleanly, with errors, or cancelled).
pub fn run_find<F>(
    fs: F,
    roots: Vec<PathBuf>,
    find: FindOpts,
    opts: &WalkOpts,
    on_dir_done: Option<ProgressFn>,
) -> Result<FindHandles>
where
    F: FileSystem + 'static,
{
    let cancel = opts.cancel.clone().unwrap_or_default();
    let opts = WalkOpts {
        cancel: Some(cancel.clone()),
        ..opts.clone()
    };
    let tuning = PipelineTuning::from_opts(&opts);
    let (found_tx, found_rx) = bounded::<Found>(tuning.channel_cap);

    let visitor = FindVisitor::new(found_tx, find, cancel.clone());
    let mut walker = Walker::new(fs, visitor, &opts)?;
    if let Some(cb) = on_dir_done {
        walker = walker.with_progress(cb);
    }
    let errors = Arc::clone(walker.errors());

    let walk_handle = thread::Builder::new()
        .name(format!("{}-find", env!("CARGO_PKG_NAME")))
        .spawn(move || {
            let res = walker.walk(&roots);
            // Dropping the walker drops the visitor and with it the last sender.
            drop(walker);
            debug!("find: producer done, result stream closed");
            res
        })?;

    Ok(FindHandles {
        found_rx,
        walk_handle,
        errors,
        cancel,
    })
}

/// Collect every match under `roots`. Returns the matches and the walk's outcome.
pub fn collect_found<F>(
    fs: F,
    roots: Vec<PathBuf>,
    find: FindOpts,
    opts: &WalkOpts,
) -> Result<(Vec<Found>, Result<(), WalkError>)>
where
    F: FileSystem + 'static,
{
    let handles = run_find(fs, roots, find, opts, None)?;
    let found: Vec<Found> = handles.iter().collect();
    debug!("find: stream closed, {} matches", found.len());
    let outcome = match handles.finish() {
        Ok(()) => Ok(()),
        Err(e) => match e.downcast::<WalkError>() {
            Ok(walk_err) => Err(walk_err),
            Err(other) => return Err(other),
        },
    };
    Ok((found, outcome))
}
