mod common;

use common::MemFs;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::{Duration, Instant};

use syncwalk::pipeline::{OutputSink, collect_found, run_find};
use syncwalk::engine::{ListOpts, ListVisitor};
use syncwalk::{
    CancelToken, Entry, ErrorAggregator, FindOpts, MatchExpr, Step, Visitor, WalkError, WalkOpts,
    Walker,
};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Hook {
    Prefix,
    Contents,
    Done,
}

/// Records every hook call; skips directories whose name starts with "skip".
#[derive(Default)]
struct Recorder {
    events: Mutex<Vec<(PathBuf, Hook)>>,
}

impl Recorder {
    fn record(&self, dir: &Path, hook: Hook) {
        self.events.lock().unwrap().push((dir.to_path_buf(), hook));
    }

    fn events(&self) -> Vec<(PathBuf, Hook)> {
        self.events.lock().unwrap().clone()
    }
}

impl Visitor for Recorder {
    /// The directory this state was created for.
    type State = Option<PathBuf>;

    fn new_state(&self) -> Self::State {
        None
    }

    fn prefix(
        &self,
        state: &mut Self::State,
        dir: &Path,
        info: Result<&Entry, &anyhow::Error>,
    ) -> anyhow::Result<Step> {
        assert!(state.is_none(), "state must be fresh for {}", dir.display());
        *state = Some(dir.to_path_buf());
        self.record(dir, Hook::Prefix);
        match info {
            Ok(e) if e.name.starts_with("skip") => Ok(Step::Skip),
            Ok(_) => Ok(Step::Descend),
            Err(_) => Ok(Step::Skip),
        }
    }

    fn contents(
        &self,
        state: &mut Self::State,
        dir: &Path,
        entries: Vec<Entry>,
        _: &ErrorAggregator,
    ) -> anyhow::Result<Vec<Entry>> {
        assert_eq!(state.as_deref(), Some(dir));
        self.record(dir, Hook::Contents);
        Ok(entries.into_iter().filter(|e| e.is_dir()).collect())
    }

    fn done(
        &self,
        state: Self::State,
        dir: &Path,
        _: Option<&anyhow::Error>,
    ) -> anyhow::Result<()> {
        assert_eq!(state.as_deref(), Some(dir));
        self.record(dir, Hook::Done);
        Ok(())
    }
}

fn opts(threads: usize) -> WalkOpts {
    WalkOpts {
        num_threads: Some(threads),
        ..Default::default()
    }
}

fn deep_tree() -> MemFs {
    let mut fs = MemFs::new();
    for a in 0..3 {
        for b in 0..3 {
            for c in 0..3 {
                fs = fs.file(&format!("/r/a{a}/b{b}/c{c}/leaf"));
            }
        }
    }
    fs
}

fn check_order(events: &[(PathBuf, Hook)]) {
    let mut by_dir: HashMap<&Path, Vec<(usize, Hook)>> = HashMap::new();
    for (i, (dir, hook)) in events.iter().enumerate() {
        by_dir.entry(dir.as_path()).or_default().push((i, *hook));
    }
    for (dir, hooks) in &by_dir {
        let kinds: Vec<Hook> = hooks.iter().map(|(_, h)| *h).collect();
        assert!(
            kinds == [Hook::Prefix, Hook::Contents, Hook::Done] || kinds == [Hook::Prefix, Hook::Done],
            "bad hook sequence for {}: {:?}",
            dir.display(),
            kinds
        );
        // Done of a parent comes after Done of every child.
        let parent_done = hooks.last().unwrap().0;
        for (child, child_hooks) in &by_dir {
            if child.parent() == Some(*dir) {
                assert!(child_hooks.last().unwrap().0 < parent_done);
            }
        }
    }
}

#[test]
fn test_hook_order_serial() {
    let walker = Walker::new(deep_tree(), Recorder::default(), &opts(1)).unwrap();
    walker.walk(&["/r"]).unwrap();
    let events = walker.visitor().events();
    // root + 3 + 9 + 27 directories
    assert_eq!(walker.dirs_done(), 40);
    check_order(&events);
}

#[test]
fn test_hook_order_parallel() {
    for threads in [2, 4, 8] {
        let walker = Walker::new(deep_tree(), Recorder::default(), &opts(threads)).unwrap();
        walker.walk(&["/r"]).unwrap();
        assert_eq!(walker.dirs_done(), 40);
        check_order(&walker.visitor().events());
    }
}

#[test]
fn test_done_runs_for_skipped_directory() {
    let fs = MemFs::new()
        .file("/r/skipme/inner/x")
        .file("/r/keep/y");
    let walker = Walker::new(fs, Recorder::default(), &opts(2)).unwrap();
    walker.walk(&["/r"]).unwrap();
    let events = walker.visitor().events();
    let skip: Vec<Hook> = events
        .iter()
        .filter(|(d, _)| d == Path::new("/r/skipme"))
        .map(|(_, h)| *h)
        .collect();
    assert_eq!(skip, [Hook::Prefix, Hook::Done]);
    assert!(!events.iter().any(|(d, _)| d.starts_with("/r/skipme/inner")));
    assert!(events.contains(&(PathBuf::from("/r/keep"), Hook::Contents)));
}

#[test]
fn test_done_runs_after_read_failure() {
    let fs = MemFs::new().file("/r/bad/x").unreadable("/r/bad");
    let walker = Walker::new(fs, Recorder::default(), &opts(1)).unwrap();
    let err = walker.walk(&["/r"]).unwrap_err();
    let events = walker.visitor().events();
    let bad: Vec<Hook> = events
        .iter()
        .filter(|(d, _)| d == Path::new("/r/bad"))
        .map(|(_, h)| *h)
        .collect();
    assert_eq!(bad, [Hook::Prefix, Hook::Done]);
    let agg = err.aggregate().expect("aggregated error");
    assert_eq!(agg.len(), 1);
    assert!(agg.to_string().contains("read directory /r/bad"));
}

#[test]
fn test_unreadable_sibling_is_isolated() {
    let fs = MemFs::new().tree("/r", 5, 2).unreadable("/r/d3");
    let (found, outcome) = collect_found(
        fs,
        vec![PathBuf::from("/r")],
        FindOpts::default(),
        &opts(4),
    )
    .unwrap();
    let mut dirs: Vec<PathBuf> = found.iter().map(|f| f.prefix.clone()).collect();
    dirs.sort();
    dirs.dedup();
    assert_eq!(
        dirs,
        ["/r/d0", "/r/d1", "/r/d2", "/r/d4"]
            .iter()
            .map(PathBuf::from)
            .collect::<Vec<_>>()
    );
    assert_eq!(found.len(), 8);
    match outcome {
        Err(WalkError::Failed(agg)) => {
            assert_eq!(agg.len(), 1);
            assert!(agg.to_string().contains("/r/d3"));
        }
        other => panic!("expected one aggregated error, got {:?}", other),
    }
}

#[test]
fn test_lstat_failure_skips_only_that_entry() {
    let fs = MemFs::new()
        .file("/r/a")
        .file("/r/b")
        .file("/r/c")
        .bad_lstat("/r/b");
    let (found, outcome) =
        collect_found(fs, vec![PathBuf::from("/r")], FindOpts::default(), &opts(1)).unwrap();
    let mut names: Vec<String> = found.into_iter().map(|f| f.name).collect();
    names.sort();
    assert_eq!(names, ["a", "c"]);
    let agg = outcome.unwrap_err();
    let agg = agg.aggregate().unwrap();
    assert_eq!(agg.len(), 1);
    assert!(agg.to_string().contains("lstat /r/b"));
    assert!(agg.to_string().contains("injected lstat failure"));
}

#[test]
fn test_missing_root_does_not_stop_other_roots() {
    let fs = MemFs::new().file("/r1/x").file("/r2/y");
    let roots = vec![
        PathBuf::from("/r1"),
        PathBuf::from("/missing"),
        PathBuf::from("/r2"),
    ];
    let (found, outcome) = collect_found(fs, roots, FindOpts::default(), &opts(2)).unwrap();
    let mut names: Vec<String> = found.into_iter().map(|f| f.name).collect();
    names.sort();
    assert_eq!(names, ["x", "y"]);
    let err = outcome.unwrap_err();
    let agg = err.aggregate().unwrap();
    assert_eq!(agg.len(), 1);
    assert!(agg.to_string().contains("stat /missing"));
}

/// Fails `prefix` whenever the directory itself could not be stat'd.
struct StrictPrefix;

impl Visitor for StrictPrefix {
    type State = ();

    fn new_state(&self) -> Self::State {}

    fn prefix(&self, _: &mut (), dir: &Path, info: Result<&Entry, &anyhow::Error>) -> anyhow::Result<Step> {
        match info {
            Ok(_) => Ok(Step::Descend),
            Err(_) => Err(anyhow::anyhow!("prefix refused {}", dir.display())),
        }
    }

    fn contents(&self, _: &mut (), _: &Path, entries: Vec<Entry>, _: &ErrorAggregator) -> anyhow::Result<Vec<Entry>> {
        Ok(entries.into_iter().filter(|e| e.is_dir()).collect())
    }

    fn done(&self, _: (), _: &Path, _: Option<&anyhow::Error>) -> anyhow::Result<()> {
        Ok(())
    }
}

#[test]
fn test_prefix_error_kept_alongside_stat_error() {
    let fs = MemFs::new().file("/r/x");
    let walker = Walker::new(fs, StrictPrefix, &opts(1)).unwrap();
    let err = walker.walk(&["/missing", "/r"]).unwrap_err();
    let agg = err.aggregate().unwrap();
    assert_eq!(agg.len(), 2);
    let text = agg.to_string();
    assert!(text.contains("stat /missing"), "{text}");
    assert!(text.contains("prefix refused /missing"), "{text}");
}

#[test]
fn test_every_error_is_kept() {
    let fs = MemFs::new()
        .tree("/r", 4, 1)
        .unreadable("/r/d0")
        .unreadable("/r/d1")
        .bad_lstat("/r/d2/f0");
    let walker = Walker::new(fs, Recorder::default(), &opts(3)).unwrap();
    let err = walker.walk(&["/r"]).unwrap_err();
    let agg = err.aggregate().unwrap();
    assert_eq!(agg.len(), 3);
    let text = agg.to_string();
    assert!(text.starts_with("3 errors:"));
    for needle in ["/r/d0", "/r/d1", "/r/d2/f0"] {
        assert!(text.contains(needle), "{} missing from {}", needle, text);
    }
}

#[test]
fn test_cancel_releases_blocked_consumer() {
    let fs = MemFs::new()
        .tree("/r", 200, 3)
        .read_delay(Duration::from_millis(20));
    let cancel = CancelToken::new();
    let walk_opts = WalkOpts {
        num_threads: Some(2),
        channel_cap: Some(1000),
        cancel: Some(cancel.clone()),
    };
    let handles = run_find(fs, vec![PathBuf::from("/r")], FindOpts::default(), &walk_opts, None).unwrap();

    let canceller = {
        let cancel = cancel.clone();
        std::thread::spawn(move || {
            std::thread::sleep(Duration::from_millis(100));
            cancel.cancel();
        })
    };
    let start = Instant::now();
    let received = handles.iter().count();
    assert!(start.elapsed() < Duration::from_secs(5));
    // 200 dirs * 20ms / 2 threads is far longer than the cancel delay.
    assert!(received < 600);
    canceller.join().unwrap();

    let err = handles.finish().unwrap_err();
    let walk_err = err.downcast_ref::<WalkError>().unwrap();
    assert!(walk_err.is_cancelled());
}

#[test]
fn test_cancel_wins_over_aggregated_errors() {
    let fs = MemFs::new()
        .tree("/r", 50, 1)
        .unreadable("/r/d0")
        .read_delay(Duration::from_millis(10));
    let cancel = CancelToken::new();
    let walk_opts = WalkOpts {
        num_threads: Some(1),
        cancel: Some(cancel.clone()),
        ..Default::default()
    };
    let walker = Walker::new(fs, Recorder::default(), &walk_opts).unwrap();
    std::thread::scope(|s| {
        s.spawn(|| {
            std::thread::sleep(Duration::from_millis(100));
            cancel.cancel();
        });
        let err = walker.walk(&["/r"]).unwrap_err();
        assert!(err.is_cancelled());
        // Failures from before the cancel ride along with it.
        let agg = err.aggregate().expect("earlier errors kept");
        assert!(agg.to_string().contains("/r/d0"));
        let text = err.to_string();
        assert!(text.starts_with("walk cancelled; before that:"), "{text}");
    });
    assert!(!walker.errors().has_errors());
}

#[test]
fn test_cancel_without_earlier_errors_is_bare() {
    let cancel = CancelToken::new();
    cancel.cancel();
    let walk_opts = WalkOpts {
        num_threads: Some(1),
        cancel: Some(cancel),
        ..Default::default()
    };
    let walker = Walker::new(MemFs::new().tree("/r", 2, 1), Recorder::default(), &walk_opts).unwrap();
    let err = walker.walk(&["/r"]).unwrap_err();
    assert!(matches!(err, WalkError::Cancelled(None)));
    assert_eq!(err.to_string(), "walk cancelled");
}

#[test]
fn test_backpressure_blocks_producer_until_consumer_reads() {
    let fs = MemFs::new().tree("/r", 5, 10);
    let walk_opts = WalkOpts {
        num_threads: Some(2),
        channel_cap: Some(4),
        cancel: None,
    };
    let handles = run_find(fs, vec![PathBuf::from("/r")], FindOpts::default(), &walk_opts, None).unwrap();
    std::thread::sleep(Duration::from_millis(300));
    assert_eq!(handles.found_rx.len(), 4);
    assert!(!handles.walk_handle.is_finished());

    let total = handles.iter().count();
    assert_eq!(total, 50);
    handles.finish().unwrap();
}

#[test]
fn test_stalled_consumer_can_still_cancel() {
    let fs = MemFs::new().tree("/r", 5, 10);
    let cancel = CancelToken::new();
    let walk_opts = WalkOpts {
        num_threads: Some(2),
        channel_cap: Some(1),
        cancel: Some(cancel.clone()),
    };
    let handles = run_find(fs, vec![PathBuf::from("/r")], FindOpts::default(), &walk_opts, None).unwrap();
    std::thread::sleep(Duration::from_millis(100));
    cancel.cancel();
    let start = Instant::now();
    let res = handles.walk_handle.join().unwrap();
    assert!(start.elapsed() < Duration::from_secs(5));
    assert!(res.unwrap_err().is_cancelled());
}

#[test]
fn test_dropping_stream_cancels_walk() {
    let fs = MemFs::new().tree("/r", 20, 10);
    let walk_opts = WalkOpts {
        num_threads: Some(2),
        channel_cap: Some(2),
        cancel: None,
    };
    let handles = run_find(fs, vec![PathBuf::from("/r")], FindOpts::default(), &walk_opts, None).unwrap();
    let first = handles.iter().next();
    assert!(first.is_some());
    let err = handles.finish().unwrap_err();
    assert!(err.downcast_ref::<WalkError>().unwrap().is_cancelled());
}

#[test]
fn test_prune_stops_at_matching_directory() {
    let fs = MemFs::new()
        .file("/r/target/inner/x")
        .file("/r/other/y");
    let find = FindOpts {
        prefix: MatchExpr::parse(&["^target$", "or", "^r$", "and", "d"]).unwrap(),
        file: MatchExpr::empty(),
        prune: true,
    };
    // ^r$ matches the root; prune stops there.
    let (found, _) = collect_found(fs, vec![PathBuf::from("/r")], find, &opts(1)).unwrap();
    assert_eq!(found.len(), 1);
    assert!(found[0].is_dir_match());
    assert_eq!(found[0].display(), "/r/");
}

#[test]
fn test_prune_reports_directory_without_descending() {
    let fs = MemFs::new()
        .file("/r/target/inner/target.txt")
        .file("/r/other/y");
    let find = FindOpts {
        prefix: MatchExpr::parse(&["target"]).unwrap(),
        file: MatchExpr::empty(),
        prune: true,
    };
    let (found, outcome) = collect_found(fs, vec![PathBuf::from("/r")], find.clone(), &opts(2)).unwrap();
    outcome.unwrap();
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].display(), "/r/target/");

    let unpruned = FindOpts { prune: false, ..find };
    let fs = MemFs::new()
        .file("/r/target/inner/target.txt")
        .file("/r/other/y");
    let (found, _) = collect_found(fs, vec![PathBuf::from("/r")], unpruned, &opts(2)).unwrap();
    let mut shown: Vec<String> = found.iter().map(|f| f.display()).collect();
    shown.sort();
    assert_eq!(shown, ["/r/target/", "/r/target/inner/target.txt"]);
}

#[test]
fn test_listing_blocks_do_not_interleave() {
    let mut fs = MemFs::new();
    for d in 0..30 {
        for f in 0..20 {
            fs = fs.file(&format!("/r/dir{d}/dir{d}-file{f}"));
        }
    }
    let (sink, out) = OutputSink::spawn(Vec::<u8>::new());
    let list = ListOpts {
        recurse: true,
        count_only: false,
        long: false,
        all: false,
        width: 40,
    };
    let walker = Walker::new(fs, ListVisitor::new(list, sink), &opts(8)).unwrap();
    walker.walk(&["/r"]).unwrap();
    let (entries, dirs) = walker.into_visitor().totals();
    assert_eq!(entries, 30 + 600);
    assert_eq!(dirs, 30);

    let text = String::from_utf8(out.join().unwrap()).unwrap();
    let blocks: Vec<&str> = text.split("\n\n").filter(|b| !b.trim().is_empty()).collect();
    assert_eq!(blocks.len(), 31);
    for block in blocks {
        let mut lines = block.lines();
        let dir = lines.next().unwrap();
        if dir == "/r" {
            continue;
        }
        let name = Path::new(dir).file_name().unwrap().to_str().unwrap().to_string();
        let names: Vec<&str> = lines.flat_map(|l| l.split_whitespace()).collect();
        assert_eq!(names.len(), 20, "block for {}", dir);
        assert!(names.iter().all(|n| n.starts_with(&format!("{name}-"))));
    }
}
