//! Pipeline components: walker, result stream, error aggregation, output sink.

pub mod context;
pub mod error_handler;
pub mod find;
pub mod orchestrator;
pub mod output;
pub mod walk;

pub use context::{CancelToken, PipelineTuning, SendAbort, send_cancellable};
pub use error_handler::{AggregateError, ErrorAggregator, WalkError};
pub use find::{FindOpts, FindVisitor};
pub use orchestrator::{FindHandles, collect_found, run_find};
pub use output::{OutputHandle, OutputSink};
pub use walk::{ProgressFn, Walker};
