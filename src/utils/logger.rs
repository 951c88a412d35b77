use colored::Colorize;
use env_logger::Builder;
use log::{Level, LevelFilter};
use std::io::Write;

/// Initialise logging once for the CLI. Dependencies log at warn; this crate at info, or debug when `verbose`.
/// `RUST_LOG` is applied on top.
pub fn setup_logging(verbose: bool) {
    let level = if verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };

    let _ = Builder::new()
        .filter_level(LevelFilter::Warn)
        .filter_module(env!("CARGO_CRATE_NAME"), level)
        .parse_default_env()
        .format(|buf, record| {
            let name = env!("CARGO_PKG_NAME").cyan();
            let tag = match record.level() {
                Level::Error => Some("ERROR".red()),
                Level::Warn => Some("WARN".yellow()),
                Level::Debug if record.target() != env!("CARGO_CRATE_NAME") => {
                    Some(record.target().dimmed())
                }
                _ => None,
            };
            match tag {
                Some(tag) => writeln!(buf, "[{} {}] {}", name, tag, record.args()),
                None => writeln!(buf, "[{}] {}", name, record.args()),
            }
        })
        .try_init();
}
