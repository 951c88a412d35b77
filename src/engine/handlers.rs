//! Command handlers: each wires a visitor or the result stream to stdout.

use anyhow::Result;
use log::debug;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use crate::Opts;
use crate::engine::conflicts::{ConflictNames, compare, conflict_find_opts};
use crate::engine::listing::{ListOpts, ListVisitor};
use crate::engine::progress::{finish_bar, setup_progress};
use crate::engine::softlinks::{LinkHandler, SymlinkVisitor};
use crate::fs::LocalFs;
use crate::matcher::MatchExpr;
use crate::pipeline::{CancelToken, ErrorAggregator, FindOpts, OutputSink, WalkError, Walker, run_find};

/// Run a symlink visitor over `root`, printing its per-directory reports.
pub fn handle_softlinks<H: LinkHandler>(root: &Path, handler: H, opts: &Opts, cancel: &CancelToken) -> Result<()> {
    let (bar, on_dir) = setup_progress(opts.verbose, "Walking");
    let (sink, out) = OutputSink::stdout();
    let res = {
        let mut walker = Walker::new(
            LocalFs::new(),
            SymlinkVisitor::new(handler, sink),
            &opts.walk_opts(cancel),
        )?;
        if let Some(cb) = on_dir {
            walker = walker.with_progress(cb);
        }
        walker.walk(&[root])
    };
    out.join()?;
    if let Some(bar) = &bar {
        finish_bar(bar);
    }
    res?;
    Ok(())
}

pub fn handle_ls(dirs: &[PathBuf], list: ListOpts, opts: &Opts, cancel: &CancelToken) -> Result<()> {
    let count_only = list.count_only;
    let (sink, out) = OutputSink::stdout();
    let walker = Walker::new(LocalFs::new(), ListVisitor::new(list, sink), &opts.walk_opts(cancel))?;
    let res = walker.walk(dirs);
    let (entries, dirs_seen) = walker.into_visitor().totals();
    out.join()?;
    if count_only {
        println!("{} entries, {} directories", entries, dirs_seen);
    }
    res?;
    Ok(())
}

pub struct FindArgs<'a> {
    pub dirs: &'a [PathBuf],
    pub prefix: &'a [String],
    pub file: &'a [String],
    pub prune: bool,
    pub json: bool,
}

/// Stream matches to stdout as they are found.
pub fn handle_find(args: FindArgs<'_>, opts: &Opts, cancel: &CancelToken) -> Result<()> {
    let find = FindOpts {
        prefix: MatchExpr::parse(args.prefix)?,
        file: MatchExpr::parse(args.file)?,
        prune: args.prune,
    };
    let (bar, on_dir) = setup_progress(opts.verbose, "Finding");
    let handles = run_find(
        LocalFs::new(),
        args.dirs.to_vec(),
        find,
        &opts.walk_opts(cancel),
        on_dir,
    )?;
    let mut count = 0_usize;
    {
        let mut out = io::stdout().lock();
        for found in handles.iter() {
            if args.json {
                writeln!(out, "{}", serde_json::to_string(&found)?)?;
            } else {
                writeln!(out, "{}", found.display())?;
            }
            count += 1;
        }
        out.flush()?;
    }
    debug!("find: {} matches", count);
    if let Some(bar) = &bar {
        finish_bar(bar);
    }
    handles.finish()
}

/// Print conflicted copies; with `details`, compare each with its original.
pub fn handle_conflicts(dirs: &[PathBuf], details: bool, opts: &Opts, cancel: &CancelToken) -> Result<()> {
    let names = ConflictNames::new()?;
    let fs = LocalFs::new();
    let errors = ErrorAggregator::new();
    let (bar, on_dir) = setup_progress(opts.verbose, "Scanning");
    let handles = run_find(fs, dirs.to_vec(), conflict_find_opts()?, &opts.walk_opts(cancel), on_dir)?;

    for found in handles.iter() {
        if !details || found.is_dir_match() {
            println!("{}", found.display());
            continue;
        }
        match compare(&fs, &names, &found) {
            Ok(report) => println!("{}", report.render()),
            Err(e) => errors.append(e),
        }
    }
    if let Some(bar) = &bar {
        finish_bar(bar);
    }

    if let Err(e) = handles.finish() {
        match e.downcast::<WalkError>() {
            Ok(WalkError::Failed(agg)) => errors.extend(agg.into_errors()),
            Ok(WalkError::Cancelled(earlier)) => {
                errors.extend(earlier.map(|agg| agg.into_errors()).into_iter().flatten());
                return Err(WalkError::Cancelled(errors.take()).into());
            }
            Err(other) => return Err(other),
        }
    }
    errors.into_result()?;
    Ok(())
}
