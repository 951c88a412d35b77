//! Column packing for short listings.

use crate::types::{Entry, FileKind};

/// Packs names into lines no wider than `width`, two spaces apart.
#[derive(Debug)]
pub struct ColumnFormatter {
    width: usize,
    out: String,
    line_len: usize,
}

impl ColumnFormatter {
    pub fn new(width: usize) -> Self {
        ColumnFormatter {
            width,
            out: String::new(),
            line_len: 0,
        }
    }

    pub fn append(&mut self, s: &str) {
        let len = s.chars().count();
        if self.line_len > 0 && self.line_len + len + 2 > self.width {
            self.out.push('\n');
            self.line_len = 0;
        }
        self.out.push_str(s);
        self.out.push_str("  ");
        self.line_len += len + 2;
    }

    /// Add a line of its own (long listings).
    pub fn push_line(&mut self, line: &str) {
        if self.line_len > 0 {
            self.out.push('\n');
            self.line_len = 0;
        }
        self.out.push_str(line);
        self.out.push('\n');
    }

    pub fn is_empty(&self) -> bool {
        self.out.is_empty()
    }

    pub fn finish(self) -> String {
        self.out
            .lines()
            .map(str::trim_end)
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// One-line long listing: type, size, mtime (unix seconds), name.
pub fn format_long(entry: &Entry) -> String {
    let kind = match entry.kind {
        FileKind::Dir => 'd',
        FileKind::File => '-',
        FileKind::Symlink => 'l',
        FileKind::Other => '?',
    };
    format!(
        "{} {:>12} {:>12} {}",
        kind,
        entry.size,
        entry.mtime_ns / 1_000_000_000,
        entry.name
    )
}
