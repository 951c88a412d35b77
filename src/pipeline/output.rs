//! Serialized output sink: visitors send finished blocks, one writer thread writes them.

use anyhow::Result;
use crossbeam_channel::{Sender, bounded};
use std::io::{self, Write};
use std::thread::{self, JoinHandle};

use crate::utils::config::OUTPUT_CHANNEL_CAP;

/// Cheap to clone; every clone feeds the same writer. The writer exits once all clones are dropped.
#[derive(Clone, Debug)]
pub struct OutputSink {
    tx: Sender<String>,
}

pub struct OutputHandle<W> {
    handle: JoinHandle<io::Result<W>>,
}

impl OutputSink {
    pub fn spawn<W>(mut writer: W) -> (OutputSink, OutputHandle<W>)
    where
        W: Write + Send + 'static,
    {
        let (tx, rx) = bounded::<String>(OUTPUT_CHANNEL_CAP);
        let handle = thread::spawn(move || {
            for block in rx {
                writer.write_all(block.as_bytes())?;
            }
            writer.flush()?;
            Ok(writer)
        });
        (OutputSink { tx }, OutputHandle { handle })
    }

    pub fn stdout() -> (OutputSink, OutputHandle<io::Stdout>) {
        Self::spawn(io::stdout())
    }

    /// Write `block` as one unit. A trailing newline is added when missing.
    pub fn write_block(&self, mut block: String) {
        if !block.ends_with('\n') {
            block.push('\n');
        }
        // Writer gone means it already failed; that failure surfaces from `join`.
        let _ = self.tx.send(block);
    }

    pub fn line(&self, line: impl Into<String>) {
        self.write_block(line.into());
    }
}

impl<W> OutputHandle<W> {
    /// Wait for the writer to drain. Every [`OutputSink`] clone must be dropped first.
    pub fn join(self) -> Result<W> {
        let writer = self
            .handle
            .join()
            .map_err(|_| anyhow::anyhow!("output writer thread panicked"))??;
        Ok(writer)
    }
}
