//! The tree walker: drives a [`Visitor`] over a [`FileSystem`], one directory at a time,
//! descending sibling subtrees on a bounded rayon pool.

use anyhow::Context;
use log::debug;
use rayon::prelude::*;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::WalkOpts;
use crate::fs::FileSystem;
use crate::types::Entry;
use crate::visitor::{Step, Visitor};

use super::context::{CancelToken, PipelineTuning};
use super::error_handler::{ErrorAggregator, WalkError};

/// Called with `1` each time a directory finishes (feeds the progress counter).
pub type ProgressFn = Box<dyn Fn(usize) + Send + Sync>;

pub struct Walker<F, V> {
    fs: F,
    visitor: V,
    errors: Arc<ErrorAggregator>,
    cancel: CancelToken,
    tuning: PipelineTuning,
    pool: Option<rayon::ThreadPool>,
    dirs_done: AtomicUsize,
    on_dir_done: Option<ProgressFn>,
}

impl<F: FileSystem, V: Visitor> Walker<F, V> {
    pub fn new(fs: F, visitor: V, opts: &WalkOpts) -> anyhow::Result<Self> {
        let tuning = PipelineTuning::from_opts(opts);
        let pool = if tuning.parallel() {
            debug!("Walking in parallel");
            Some(
                rayon::ThreadPoolBuilder::new()
                    .num_threads(tuning.num_threads)
                    .thread_name(|i| format!("{}-walk-{i}", env!("CARGO_PKG_NAME")))
                    .build()
                    .context("build walker thread pool")?,
            )
        } else {
            debug!("Walking serially");
            None
        };
        Ok(Walker {
            fs,
            visitor,
            errors: Arc::new(ErrorAggregator::new()),
            cancel: opts.cancel.clone().unwrap_or_default(),
            tuning,
            pool,
            dirs_done: AtomicUsize::new(0),
            on_dir_done: None,
        })
    }

    pub fn with_progress(mut self, on_dir_done: ProgressFn) -> Self {
        self.on_dir_done = Some(on_dir_done);
        self
    }

    /// Use an aggregator shared with another component (e.g. the consumer of a result stream).
    pub fn with_errors(mut self, errors: Arc<ErrorAggregator>) -> Self {
        self.errors = errors;
        self
    }

    pub fn errors(&self) -> &Arc<ErrorAggregator> {
        &self.errors
    }

    pub fn cancel_token(&self) -> &CancelToken {
        &self.cancel
    }

    pub fn visitor(&self) -> &V {
        &self.visitor
    }

    pub fn into_visitor(self) -> V {
        self.visitor
    }

    /// Directories whose `done` hook has run.
    pub fn dirs_done(&self) -> usize {
        self.dirs_done.load(Ordering::Relaxed)
    }

    /// Walk every root to completion or cancellation.
    ///
    /// Non-fatal failures are drained from the aggregator into [`WalkError::Failed`], or into
    /// [`WalkError::Cancelled`] when the walk was cancelled.
    pub fn walk<P: AsRef<Path>>(&self, roots: &[P]) -> Result<(), WalkError> {
        let roots: Vec<PathBuf> = roots.iter().map(|r| r.as_ref().to_path_buf()).collect();
        match &self.pool {
            Some(pool) => pool.install(|| roots.par_iter().for_each(|r| self.walk_root(r))),
            None => roots.iter().for_each(|r| self.walk_root(r)),
        }
        if self.cancel.is_cancelled() {
            debug!("Walk cancelled after {} directories", self.dirs_done());
            return Err(WalkError::Cancelled(self.errors.take()));
        }
        debug!("Walk finished: {} directories", self.dirs_done());
        match self.errors.take() {
            Some(agg) => Err(WalkError::Failed(agg)),
            None => Ok(()),
        }
    }

    fn walk_root(&self, root: &Path) {
        let info = self
            .fs
            .stat(root)
            .with_context(|| format!("stat {}", root.display()));
        self.walk_dir(root, info);
    }

    fn walk_dir(&self, dir: &Path, info: anyhow::Result<Entry>) {
        if self.cancel.is_cancelled() {
            return;
        }
        let mut state = self.visitor.new_state();
        let step = self.visitor.prefix(&mut state, dir, info.as_ref());
        let err = match (info, step) {
            (Err(e), step) => {
                if let Err(pe) = step {
                    self.errors.append(pe);
                }
                Some(e)
            }
            (Ok(_), Err(e)) => Some(e),
            (Ok(_), Ok(Step::Skip)) => None,
            (Ok(_), Ok(Step::Descend)) => match self.read_contents(&mut state, dir) {
                Ok(children) => {
                    self.descend(dir, children);
                    None
                }
                Err(e) => Some(e),
            },
        };

        let done = self.visitor.done(state, dir, err.as_ref());
        if let Some(e) = err {
            self.errors.append(e);
        }
        if let Err(e) = done {
            self.errors.append(e);
        }
        self.dirs_done.fetch_add(1, Ordering::Relaxed);
        if let Some(cb) = &self.on_dir_done {
            cb(1);
        }
    }

    /// Read, lstat and hand the entries of `dir` to the visitor. Entries that fail lstat are
    /// recorded and dropped; a failed read fails the whole directory.
    fn read_contents(&self, state: &mut V::State, dir: &Path) -> anyhow::Result<Vec<Entry>> {
        let names = self
            .fs
            .read_dir(dir)
            .with_context(|| format!("read directory {}", dir.display()))?;
        let mut entries = Vec::with_capacity(names.len());
        for name in names {
            let path = self.fs.join(dir, &name);
            match self.fs.lstat(&path) {
                Ok(entry) => entries.push(entry.with_file_name(name)),
                Err(e) => self
                    .errors
                    .append(anyhow::Error::new(e).context(format!("lstat {}", path.display()))),
            }
        }
        self.visitor.contents(state, dir, entries, &self.errors)
    }

    /// Returns only when every child subtree has finished.
    fn descend(&self, dir: &Path, children: Vec<Entry>) {
        let visit = |child: Entry| {
            let path = self.fs.join(dir, &child.file_name);
            self.walk_dir(&path, Ok(child));
        };
        if self.tuning.parallel() {
            children.into_par_iter().for_each(visit);
        } else {
            children.into_iter().for_each(visit);
        }
    }
}
