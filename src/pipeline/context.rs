//! Shared walk context: cancellation signal and pool/channel tuning.

use crossbeam_channel::{SendTimeoutError, Sender};
use log::debug;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::WalkOpts;
use crate::utils::config::{RESULT_CHANNEL_CAP, SEND_POLL_INTERVAL, WorkerThreadLimits};
use crate::utils::fd_limit::cap_workers_by_fd_limit;

/// Cooperative cancellation flag. Clones share the flag.
#[derive(Clone, Debug, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }

    /// Cancel on Ctrl+C. Only one handler can be installed per process.
    pub fn cancel_on_ctrlc(&self) -> anyhow::Result<()> {
        use anyhow::Context;
        let token = self.clone();
        ctrlc::set_handler(move || {
            debug!("Ctrl+C received, cancelling walk");
            token.cancel();
        })
        .context("set Ctrl+C handler")
    }
}

/// Worker count and Result Stream capacity resolved from [`WalkOpts`].
#[derive(Clone, Debug)]
pub struct PipelineTuning {
    pub num_threads: usize,
    pub channel_cap: usize,
}

impl PipelineTuning {
    pub fn from_opts(opts: &WalkOpts) -> Self {
        let num_threads = match opts.num_threads {
            Some(n) => n.max(1),
            None => {
                let limits = WorkerThreadLimits::current();
                cap_workers_by_fd_limit(limits.all_threads.clamp(limits.floor, limits.max))
            }
        };
        let channel_cap = opts.channel_cap.unwrap_or(RESULT_CHANNEL_CAP).max(1);
        debug!(
            "Walk tuning: {} worker(s), result channel cap {}",
            num_threads, channel_cap
        );
        PipelineTuning {
            num_threads,
            channel_cap,
        }
    }

    pub fn parallel(&self) -> bool {
        self.num_threads > 1
    }
}

/// Why [`send_cancellable`] gave up.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SendAbort {
    Cancelled,
    /// Receiver dropped; the consumer is gone.
    Disconnected,
}

/// Blocking send that still notices cancellation while the channel is full.
pub fn send_cancellable<T>(tx: &Sender<T>, mut value: T, cancel: &CancelToken) -> Result<(), SendAbort> {
    loop {
        if cancel.is_cancelled() {
            return Err(SendAbort::Cancelled);
        }
        match tx.send_timeout(value, SEND_POLL_INTERVAL) {
            Ok(()) => return Ok(()),
            Err(SendTimeoutError::Timeout(v)) => value = v,
            Err(SendTimeoutError::Disconnected(_)) => return Err(SendAbort::Disconnected),
        }
    }
}
