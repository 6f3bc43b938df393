//! Line-level diff computation for text files
//!
//! Line matching is delegated to [`similar`] (Myers' algorithm, linear memory,
//! bounded by a deadline). Its grouped operations are turned into
//! [`DiffHunk`]s with a configurable amount of context and rendered in unified
//! diff format.
//!
//! Lines keep their terminators, so a change in the final newline is a real
//! difference and shows up with a `\ No newline at end of file` marker.
//!
//! ## Examples
//!
//! ```rust
//! use snapvc::diff::{compute_line_diff, render_unified};
//! use snapvc::types::DiffOptions;
//!
//! let hunks = compute_line_diff("hello\n", "world\n", &DiffOptions::default());
//! let text = render_unified("v1/a.txt", "Current/a.txt", &hunks);
//! assert!(text.contains("-hello\n+world\n"));
//! ```

use crate::types::{DiffHunk, DiffKind, DiffOptions, FileDiff, LineChange};
use similar::{Algorithm, ChangeTag, DiffOp, TextDiff};
use std::time::Duration;
use tracing::debug;

/// Past this, similar settles for a correct but possibly non-minimal diff
const DIFF_TIMEOUT: Duration = Duration::from_secs(2);

/// Compute line hunks turning `old` (snapshot) into `new` (working tree)
pub fn compute_line_diff(old: &str, new: &str, options: &DiffOptions) -> Vec<DiffHunk> {
    let diff = TextDiff::configure()
        .algorithm(Algorithm::Myers)
        .timeout(DIFF_TIMEOUT)
        .diff_lines(old, new);

    diff.grouped_ops(options.context_lines)
        .iter()
        .map(|group| {
            let mut hunk = HunkBuilder::default();
            for op in group {
                for change in diff.iter_changes(op) {
                    match change.tag() {
                        ChangeTag::Equal => hunk.add_context(change.value()),
                        ChangeTag::Delete => hunk.add_deletion(change.value()),
                        ChangeTag::Insert => hunk.add_insertion(change.value()),
                    }
                }
            }
            let (old_start, new_start) = group_start(group);
            hunk.build(old_start, new_start)
        })
        .collect()
}

/// Diff two byte buffers
///
/// Falls back to [`DiffKind::Binary`] when either side is not UTF-8 and to
/// [`DiffKind::TooLarge`] when either side exceeds `options.max_file_size`.
pub fn diff_contents(old: &[u8], new: &[u8], options: &DiffOptions) -> DiffKind {
    let largest = old.len().max(new.len()) as u64;
    if options.max_file_size > 0 && largest > options.max_file_size {
        debug!("Skipping line diff: {} bytes over limit {}", largest, options.max_file_size);
        return DiffKind::TooLarge;
    }

    let (Ok(old_text), Ok(new_text)) = (std::str::from_utf8(old), std::str::from_utf8(new)) else {
        return DiffKind::Binary;
    };

    let hunks = compute_line_diff(old_text, new_text, options);
    let (mut lines_added, mut lines_deleted) = (0, 0);
    for change in hunks.iter().flat_map(|h| &h.changes) {
        match change {
            LineChange::Added(_) => lines_added += 1,
            LineChange::Deleted(_) => lines_deleted += 1,
            LineChange::Context(_) => {}
        }
    }

    DiffKind::Modified {
        hunks,
        lines_added,
        lines_deleted,
    }
}

/// Old/new line offsets where a group begins
fn group_start(group: &[DiffOp]) -> (usize, usize) {
    group
        .first()
        .map(|op| (op.old_range().start, op.new_range().start))
        .unwrap_or((0, 0))
}

/// Helper for building diff hunks
#[derive(Default)]
struct HunkBuilder {
    from_count: usize,
    to_count: usize,
    changes: Vec<LineChange>,
}

impl HunkBuilder {
    fn add_context(&mut self, content: &str) {
        self.from_count += 1;
        self.to_count += 1;
        self.changes.push(LineChange::Context(content.to_string()));
    }

    fn add_deletion(&mut self, content: &str) {
        self.from_count += 1;
        self.changes.push(LineChange::Deleted(content.to_string()));
    }

    fn add_insertion(&mut self, content: &str) {
        self.to_count += 1;
        self.changes.push(LineChange::Added(content.to_string()));
    }

    /// Empty ranges point at the line before them, as unified diff expects
    fn build(self, old_start: usize, new_start: usize) -> DiffHunk {
        let line = |start: usize, count: usize| if count == 0 { start } else { start + 1 };
        DiffHunk {
            from_line: line(old_start, self.from_count),
            from_count: self.from_count,
            to_line: line(new_start, self.to_count),
            to_count: self.to_count,
            changes: self.changes,
        }
    }
}

fn format_range(start: usize, count: usize) -> String {
    if count == 1 {
        start.to_string()
    } else {
        format!("{},{}", start, count)
    }
}

/// Render hunks as a unified diff with the given file labels
pub fn render_unified(from_label: &str, to_label: &str, hunks: &[DiffHunk]) -> String {
    if hunks.is_empty() {
        return String::new();
    }

    let mut out = format!("--- {}\n+++ {}\n", from_label, to_label);
    for hunk in hunks {
        out.push_str(&format!(
            "@@ -{} +{} @@\n",
            format_range(hunk.from_line, hunk.from_count),
            format_range(hunk.to_line, hunk.to_count)
        ));
        for change in &hunk.changes {
            let (marker, content) = match change {
                LineChange::Context(c) => (' ', c),
                LineChange::Deleted(c) => ('-', c),
                LineChange::Added(c) => ('+', c),
            };
            out.push(marker);
            out.push_str(content);
            if !content.ends_with('\n') {
                out.push_str("\n\\ No newline at end of file\n");
            }
        }
    }
    out
}

/// Label used for the working tree side of a diff
pub const CURRENT_LABEL: &str = "Current";

/// Unified text for a modified file in a report against `version`
///
/// Headers read `<version>/<path>` and `Current/<path>`. Returns `None` for
/// added, deleted and binary entries, which carry no line diff.
pub fn render_file(version: &str, file: &FileDiff) -> Option<String> {
    match &file.kind {
        DiffKind::Modified { hunks, .. } => Some(render_unified(
            &format!("{}/{}", version, file.path),
            &format!("{}/{}", CURRENT_LABEL, file.path),
            hunks,
        )),
        _ => None,
    }
}
