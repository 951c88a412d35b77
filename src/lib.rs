//! Syncwalk: concurrent directory-tree walker with pluggable per-directory visitors

pub mod engine;
pub mod fs;
pub mod matcher;
pub mod pipeline;
pub mod types;
pub mod utils;
pub mod visitor;

/// Re-export types for API
pub use types::*;

pub use fs::{FileSystem, LocalFs};
pub use matcher::{Item, MatchError, MatchExpr};
pub use pipeline::{
    AggregateError, CancelToken, ErrorAggregator, FindHandles, FindOpts, WalkError, Walker,
};
pub use visitor::{Step, Visitor};

use std::path::{Path, PathBuf};

/// Result alias used by public syncwalk API
pub use anyhow::Error;
pub type Result<T> = std::result::Result<T, Error>;

/// Walk `roots` on the local filesystem with `visitor`, returning the consolidated error (if any).
///
/// Use [`Walker`] directly for another [`FileSystem`] or to keep the visitor afterwards.
pub fn walk<V, P>(roots: &[P], visitor: V, opts: &WalkOpts) -> Result<()>
where
    V: Visitor,
    P: AsRef<Path>,
{
    let walker = Walker::new(LocalFs::new(), visitor, opts)?;
    walker.walk(roots)?;
    Ok(())
}

/// Start a filtered walk of the local filesystem and return its Result Stream.
///
/// ```ignore
/// let find = syncwalk::FindOpts { file: syncwalk::MatchExpr::parse(&["f", "and", r"\.rs$"])?, ..Default::default() };
/// let handles = syncwalk::find(vec!["src".into()], find, &Default::default())?;
/// for found in handles.iter() {
///     println!("{}", found.display());
/// }
/// handles.finish()?;
/// ```
pub fn find(roots: Vec<PathBuf>, find: FindOpts, opts: &WalkOpts) -> Result<FindHandles> {
    pipeline::run_find(LocalFs::new(), roots, find, opts, None)
}
