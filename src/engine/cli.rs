//! CLI dispatch: merge config file and flags into [`Opts`], install Ctrl+C, run the command.

use anyhow::Result;
use log::debug;
use std::path::Path;

use crate::Opts;
use crate::engine::arg_parser::{BackupCommands, Cli, Commands, DropboxCommands, SoftlinkCommands, WalkCommands};
use crate::engine::handlers::{FindArgs, handle_conflicts, handle_find, handle_ls, handle_softlinks};
use crate::engine::listing::ListOpts;
use crate::engine::softlinks::{BackupDelete, BackupRestore, Rewriter, Verifier};
use crate::pipeline::CancelToken;
use crate::utils::setup_logging;
use crate::utils::syncwalk_toml::{apply_file_to_opts, load_syncwalk_toml};

/// Defaults, then `.syncwalk.toml` in the current directory, then flags.
fn setup_opts(cli: &Cli) -> Opts {
    let mut opts = Opts::default();
    let file = load_syncwalk_toml(Path::new("."));
    if let Some(file) = &file {
        apply_file_to_opts(file, &mut opts);
    }
    if cli.verbose {
        opts.verbose = true;
    }
    if cli.threads.is_some() {
        opts.num_threads = cli.threads;
    }
    if let Some(cap) = cli.channel_cap {
        opts.channel_cap = cap;
    }
    setup_logging(opts.verbose);
    if file.is_some() {
        debug!("Loaded settings from config file");
    }
    debug!(
        "{} CONFIG: {:#?}",
        env!("CARGO_PKG_NAME").to_uppercase(),
        opts
    );
    opts
}

fn suffix_or(opts: &Opts, flag: &Option<String>) -> String {
    flag.clone().unwrap_or_else(|| opts.backup_suffix.clone())
}

pub fn handle_run(cli: &Cli) -> Result<()> {
    let opts = setup_opts(cli);
    let cancel = CancelToken::new();
    cancel.cancel_on_ctrlc()?;

    match &cli.command {
        Commands::Softlinks { command } => match command {
            SoftlinkCommands::Rewrite {
                old_root,
                new_root,
                backup_suffix,
            } => {
                let handler = Rewriter {
                    old_root: old_root.clone(),
                    new_root: new_root.clone(),
                    backup_suffix: suffix_or(&opts, backup_suffix),
                };
                handle_softlinks(Path::new(new_root), handler, &opts, &cancel)
            }
            SoftlinkCommands::Verify {
                old_root,
                new_root,
                all,
                backup_suffix,
            } => {
                let handler = Verifier {
                    old_root: old_root.clone(),
                    new_root: new_root.clone(),
                    backup_suffix: suffix_or(&opts, backup_suffix),
                    show_all: *all,
                };
                handle_softlinks(Path::new(new_root), handler, &opts, &cancel)
            }
            SoftlinkCommands::Backups { command } => match command {
                BackupCommands::Restore { dir, backup_suffix } => {
                    let handler = BackupRestore {
                        backup_suffix: suffix_or(&opts, backup_suffix),
                    };
                    handle_softlinks(dir, handler, &opts, &cancel)
                }
                BackupCommands::Delete { dir, backup_suffix } => {
                    let handler = BackupDelete {
                        backup_suffix: suffix_or(&opts, backup_suffix),
                    };
                    handle_softlinks(dir, handler, &opts, &cancel)
                }
            },
        },
        Commands::Walk { command } => match command {
            WalkCommands::Find {
                dirs,
                prefix,
                file,
                prune,
                json,
            } => handle_find(
                FindArgs {
                    dirs,
                    prefix,
                    file,
                    prune: *prune,
                    json: *json,
                },
                &opts,
                &cancel,
            ),
            WalkCommands::Ls {
                dirs,
                recurse,
                count_only,
                long,
                all,
            } => {
                let list = ListOpts {
                    recurse: *recurse,
                    count_only: *count_only,
                    long: *long,
                    all: *all,
                    width: opts.width,
                };
                handle_ls(dirs, list, &opts, &cancel)
            }
        },
        Commands::Dropbox { command } => match command {
            DropboxCommands::Conflicts { dirs, details } => {
                handle_conflicts(dirs, *details, &opts, &cancel)
            }
        },
    }
}
