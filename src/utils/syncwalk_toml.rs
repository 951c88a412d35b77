//! Load `.syncwalk.toml` from a directory (CLI only). Lib callers pass [`WalkOpts`](crate::WalkOpts) directly.

use serde::Deserialize;
use std::path::Path;

use crate::Opts;
use crate::utils::config::config_filename;

#[derive(Debug, Default, Deserialize)]
pub(crate) struct SyncwalkToml {
    #[serde(default)]
    settings: Settings,
}

#[derive(Debug, Default, Deserialize)]
struct Settings {
    threads: Option<usize>,
    channel_cap: Option<usize>,
    backup_suffix: Option<String>,
    width: Option<usize>,
    verbose: Option<bool>,
}

/// Load the config file from `dir` if present. Missing file → None; a malformed file is logged and ignored.
pub(crate) fn load_syncwalk_toml(dir: &Path) -> Option<SyncwalkToml> {
    let path = dir.join(config_filename());
    let s = std::fs::read_to_string(&path).ok()?;
    parse_syncwalk_toml(&s)
        .map_err(|e| log::warn!("{}: {}", path.display(), e))
        .ok()
}

pub(crate) fn parse_syncwalk_toml(s: &str) -> Result<SyncwalkToml, toml::de::Error> {
    toml::from_str(s)
}

/// Overwrite opts field from file when present.
macro_rules! apply_file_opt {
    ($file:expr, $opts:expr, $field:ident => $opts_field:ident) => {
        if let Some(v) = $file.$field.clone() {
            $opts.$opts_field = v;
        }
    };
}

/// Apply file settings to opts. Call before applying CLI flags so flags win.
pub(crate) fn apply_file_to_opts(file: &SyncwalkToml, opts: &mut Opts) {
    let s = &file.settings;
    if s.threads.is_some() {
        opts.num_threads = s.threads;
    }
    apply_file_opt!(s, opts, channel_cap => channel_cap);
    apply_file_opt!(s, opts, backup_suffix => backup_suffix);
    apply_file_opt!(s, opts, width => width);
    apply_file_opt!(s, opts, verbose => verbose);
}
