use clap::{Parser, Subcommand};
use std::path::PathBuf;

struct DefaultArgs;

impl DefaultArgs {
    pub const DIR: &'static str = ".";
}

/// Walk large directory trees: rewrite and verify symlinks, find files, find cloud-sync conflicts.
#[derive(Clone, Debug, Parser)]
#[command(name = "syncwalk", version)]
#[command(about = "Tools for working with cloud-synced directory trees.")]
pub struct Cli {
    /// Verbose output (debug logging and a progress counter). Turns on `verbose` from the config file too.
    #[arg(long, short = 'v', global = true, action = clap::ArgAction::SetTrue)]
    pub verbose: bool,

    /// Walker threads. 1 walks serially. Default: derived from core count.
    #[arg(long, short = 'j', global = true)]
    pub threads: Option<usize>,

    /// Capacity of the result stream between walker and output.
    #[arg(long, global = true)]
    pub channel_cap: Option<usize>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Clone, Debug, Subcommand)]
pub enum Commands {
    /// Work with symbolic links.
    Softlinks {
        #[command(subcommand)]
        command: SoftlinkCommands,
    },
    /// Efficiently walk large directories and directory trees.
    Walk {
        #[command(subcommand)]
        command: WalkCommands,
    },
    /// Work with Dropbox folders.
    Dropbox {
        #[command(subcommand)]
        command: DropboxCommands,
    },
}

#[derive(Clone, Debug, Subcommand)]
pub enum SoftlinkCommands {
    /// Re-point links under NEW_ROOT whose target starts with OLD_ROOT, keeping backups.
    Rewrite {
        old_root: String,
        new_root: String,
        /// Suffix for the backup of each rewritten link.
        #[arg(long)]
        backup_suffix: Option<String>,
    },
    /// Report absolute links under NEW_ROOT that point outside it.
    Verify {
        old_root: String,
        new_root: String,
        /// Show all links, including valid ones.
        #[arg(long, short = 'a')]
        all: bool,
        #[arg(long)]
        backup_suffix: Option<String>,
    },
    /// Restore or delete the backups created by rewrite.
    Backups {
        #[command(subcommand)]
        command: BackupCommands,
    },
}

#[derive(Clone, Debug, Subcommand)]
pub enum BackupCommands {
    /// Move each backup back over its link.
    Restore {
        #[arg(value_name = "DIR", default_value = DefaultArgs::DIR)]
        dir: PathBuf,
        #[arg(long)]
        backup_suffix: Option<String>,
    },
    /// Delete each backup.
    Delete {
        #[arg(value_name = "DIR", default_value = DefaultArgs::DIR)]
        dir: PathBuf,
        #[arg(long)]
        backup_suffix: Option<String>,
    },
}

#[derive(Clone, Debug, Subcommand)]
pub enum WalkCommands {
    /// Find entries matching a filter expression.
    ///
    /// Expressions are tokens folded left to right: `d`, `f`, `l` test the type,
    /// `and`/`or` combine, anything else is a regular expression.
    Find {
        #[arg(value_name = "DIR", required = true)]
        dirs: Vec<PathBuf>,
        /// Expression tested on directories and on every entry.
        #[arg(long, short = 'p', num_args = 1..)]
        prefix: Vec<String>,
        /// Expression tested on non-directory entries.
        #[arg(long, short = 'f', num_args = 1..)]
        file: Vec<String>,
        /// Do not descend below a matching directory.
        #[arg(long)]
        prune: bool,
        /// One JSON object per match.
        #[arg(long)]
        json: bool,
    },
    /// List directories.
    Ls {
        #[arg(value_name = "DIR", default_value = DefaultArgs::DIR)]
        dirs: Vec<PathBuf>,
        /// Walk recursively.
        #[arg(long, short = 'r')]
        recurse: bool,
        /// Print counts of entries and directories only.
        #[arg(long)]
        count_only: bool,
        /// Long listing.
        #[arg(long, short = 'l')]
        long: bool,
        /// Include hidden (dot) files and directories.
        #[arg(long, short = 'a')]
        all: bool,
    },
}

#[derive(Clone, Debug, Subcommand)]
pub enum DropboxCommands {
    /// Find Dropbox conflicted copies.
    Conflicts {
        #[arg(value_name = "DIR", required = true)]
        dirs: Vec<PathBuf>,
        /// Compare each conflicted copy with its original.
        #[arg(long)]
        details: bool,
    },
}
