//! Engine module: CLI, command handlers and the domain visitors built on the pipeline

pub mod arg_parser;
pub mod cli;
pub mod conflicts;
pub mod format;
pub mod handlers;
pub mod hashing;
pub mod listing;
pub mod progress;
pub mod softlinks;
pub mod tools;

// Re-export commonly used items
pub use arg_parser::{Cli, Commands};
pub use cli::handle_run;
pub use conflicts::{ConflictNames, ConflictReport, compare, conflict_find_opts};
pub use hashing::{hash_file, same_contents};
pub use listing::{ListOpts, ListVisitor};
pub use softlinks::{BackupDelete, BackupRestore, LinkHandler, Rewriter, SymlinkVisitor, Verifier};
pub use tools::{backup_path, is_hidden, strip_backup_suffix};
