//! Progress counter shown on stderr while a walk runs (verbose mode)

use kdam::{Animation, Bar, BarExt};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use crate::pipeline::ProgressFn;

/// Bar plus the increments that arrived while another thread held it.
pub struct Counter {
    bar: Mutex<Bar>,
    pending: AtomicUsize,
}

pub type ProgressBar = Arc<Counter>;

impl Counter {
    fn new(bar: Bar) -> Self {
        Counter {
            bar: Mutex::new(bar),
            pending: AtomicUsize::new(0),
        }
    }

    /// Count `n`; the bar is redrawn only if no other thread is drawing it.
    pub fn add(&self, n: usize) {
        self.pending.fetch_add(n, Ordering::Relaxed);
        if let Ok(mut bar) = self.bar.try_lock() {
            Self::drain(&self.pending, &mut bar);
        }
    }

    /// Blocking flush of whatever is still pending, then a final refresh.
    pub fn finish(&self) {
        if let Ok(mut bar) = self.bar.lock() {
            Self::drain(&self.pending, &mut bar);
            let _ = bar.refresh();
            eprintln!();
        }
    }

    /// Units counted so far, drawn or not.
    pub fn total(&self) -> usize {
        let drawn = self.bar.lock().map(|b| b.counter).unwrap_or(0);
        drawn + self.pending.load(Ordering::Relaxed)
    }

    fn drain(pending: &AtomicUsize, bar: &mut Bar) {
        let n = pending.swap(0, Ordering::Relaxed);
        if n > 0 {
            let _ = bar.update(n);
        }
    }
}

/// Counter without a total: walks don't know the tree size up front.
pub fn create_counter(desc: &'static str) -> ProgressBar {
    Arc::new(Counter::new(kdam::tqdm!(
        total = 0,
        desc = desc,
        animation = Animation::Classic,
        position = 0,
        unit = " dirs"
    )))
}

/// Update the bar without blocking walker threads. A contended update is kept
/// pending and drawn by the next update that gets the lock, or by [`finish_bar`].
pub fn update_progress_bar(pb: &ProgressBar, n: usize) {
    pb.add(n);
}

/// Final refresh once the walk is over.
pub fn finish_bar(pb: &ProgressBar) {
    pb.finish();
}

/// Walker callback feeding `bar`, when there is one.
pub fn progress_callback(bar: &Option<ProgressBar>) -> Option<ProgressFn> {
    bar.as_ref().map(|bar| {
        let bar = Arc::clone(bar);
        Box::new(move |n: usize| update_progress_bar(&bar, n)) as ProgressFn
    })
}

/// Counter when `verbose`, else nothing.
pub fn setup_progress(verbose: bool, desc: &'static str) -> (Option<ProgressBar>, Option<ProgressFn>) {
    let bar = verbose.then(|| create_counter(desc));
    let cb = progress_callback(&bar);
    (bar, cb)
}
