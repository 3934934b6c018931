//! Multi-edit text patching with whitespace-tolerant matching.
//!
//! Edits apply in order to an LF-normalized buffer. Each one first tries a verbatim match and
//! then a line window that matches after trimming surrounding whitespace. If any edit misses,
//! nothing is written.
use serde::{Deserialize, Serialize};
use similar::TextDiff;

use crate::error::{Error, Result};
use crate::guard::ResolvedPath;
use crate::ops::io::{ensure_write_size, read_string_limited, write_bytes_atomic};

const DIFF_CONTEXT_LINES: usize = 3;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Edit {
    #[serde(alias = "oldText")]
    pub old_text: String,
    #[serde(alias = "newText")]
    pub new_text: String,
}

impl Edit {
    pub fn new(old_text: impl Into<String>, new_text: impl Into<String>) -> Self {
        Self {
            old_text: old_text.into(),
            new_text: new_text.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineEnding {
    Lf,
    CrLf,
}

impl LineEnding {
    pub fn as_str(self) -> &'static str {
        match self {
            LineEnding::Lf => "\n",
            LineEnding::CrLf => "\r\n",
        }
    }
}

/// CRLF wins only when it strictly outnumbers bare LF.
pub fn detect_line_ending(content: &str) -> LineEnding {
    let crlf = content.matches("\r\n").count();
    let lf = content.matches('\n').count();
    if crlf > lf - crlf {
        LineEnding::CrLf
    } else {
        LineEnding::Lf
    }
}

pub fn normalize_line_endings(text: &str) -> String {
    text.replace("\r\n", "\n")
}

fn leading_whitespace(line: &str) -> &str {
    let trimmed = line.trim_start();
    &line[..line.len() - trimmed.len()]
}

fn strip_indent(line: &str) -> &str {
    line.trim_start_matches([' ', '\t'])
}

/// Re-indents `new_lines` so they sit at the indentation of the matched window.
fn reindent(base: &str, old_lines: &[&str], new_lines: &[&str]) -> Vec<String> {
    new_lines
        .iter()
        .enumerate()
        .map(|(j, line)| {
            let stripped = strip_indent(line);
            if j == 0 {
                return format!("{base}{stripped}");
            }
            // Lines beyond the matched window have no reference indent; keep them as written.
            let Some(old) = old_lines.get(j) else {
                return (*line).to_string();
            };
            let old_indent = leading_whitespace(old).len();
            let new_indent = leading_whitespace(line).len();
            if new_indent > old_indent {
                format!("{base}{}{stripped}", " ".repeat(new_indent - old_indent))
            } else {
                format!("{base}{stripped}")
            }
        })
        .collect()
}

fn apply_one(buffer: &str, edit: &Edit) -> Result<String> {
    let old_text = normalize_line_endings(&edit.old_text);
    let new_text = normalize_line_endings(&edit.new_text);

    if buffer.contains(&old_text) {
        return Ok(buffer.replacen(&old_text, &new_text, 1));
    }

    let lines: Vec<&str> = buffer.split('\n').collect();
    let old_lines: Vec<&str> = old_text.split('\n').collect();
    if old_lines.len() <= lines.len() {
        for start in 0..=(lines.len() - old_lines.len()) {
            let window = &lines[start..start + old_lines.len()];
            let matches = window
                .iter()
                .zip(&old_lines)
                .all(|(have, want)| have.trim() == want.trim());
            if !matches {
                continue;
            }

            let base = leading_whitespace(lines[start]);
            let new_lines: Vec<&str> = new_text.split('\n').collect();
            let replacement = reindent(base, &old_lines, &new_lines);

            let mut out: Vec<&str> = Vec::with_capacity(lines.len() + replacement.len());
            out.extend_from_slice(&lines[..start]);
            out.extend(replacement.iter().map(String::as_str));
            out.extend_from_slice(&lines[start + old_lines.len()..]);
            return Ok(out.join("\n"));
        }
    }

    Err(Error::EditNotFound {
        old_text: edit.old_text.clone(),
    })
}

/// Applies every edit in order to LF-normalized `content`.
///
/// Fails on the first edit that matches neither verbatim nor as a whitespace-trimmed window.
pub fn apply_edits(content: &str, edits: &[Edit]) -> Result<String> {
    let mut buffer = content.to_string();
    for edit in edits {
        buffer = apply_one(&buffer, edit)?;
    }
    Ok(buffer)
}

/// Unified diff with three lines of context, labelled `display_path` on both sides.
///
/// Empty when nothing changed.
pub fn unified_diff(original: &str, modified: &str, display_path: &str) -> String {
    TextDiff::from_lines(original, modified)
        .unified_diff()
        .context_radius(DIFF_CONTEXT_LINES)
        .header(display_path, display_path)
        .to_string()
}

/// Wraps `diff` in a backtick fence longer than any backtick run it contains.
pub fn fence_diff(diff: &str) -> String {
    let mut fence = "```".to_string();
    while diff.contains(&fence) {
        fence.push('`');
    }
    format!("{fence}diff\n{diff}{fence}\n\n")
}

/// Size limits for [`apply_file_edits_limited`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EditLimits {
    pub max_read_bytes: u64,
    pub max_write_bytes: u64,
}

impl Default for EditLimits {
    fn default() -> Self {
        Self {
            max_read_bytes: u64::MAX,
            max_write_bytes: u64::MAX,
        }
    }
}

pub fn apply_file_edits(
    path: &ResolvedPath,
    display_path: &str,
    edits: &[Edit],
    dry_run: bool,
) -> Result<String> {
    apply_file_edits_limited(path, display_path, edits, dry_run, EditLimits::default())
}

/// Edits the file at `path` and returns the fenced diff.
///
/// Unless `dry_run`, the file is replaced once, in its dominant line ending.
pub fn apply_file_edits_limited(
    path: &ResolvedPath,
    display_path: &str,
    edits: &[Edit],
    dry_run: bool,
    limits: EditLimits,
) -> Result<String> {
    let raw = read_string_limited(path, limits.max_read_bytes)?;
    let line_ending = detect_line_ending(&raw);
    let original = normalize_line_endings(&raw);

    let modified = apply_edits(&original, edits)?;
    let diff = fence_diff(&unified_diff(&original, &modified, display_path));

    if !dry_run {
        let output = match line_ending {
            LineEnding::Lf => modified,
            LineEnding::CrLf => modified.replace('\n', "\r\n"),
        };
        ensure_write_size(path, output.len(), limits.max_write_bytes)?;
        write_bytes_atomic(path, output.as_bytes())?;
    }

    Ok(diff)
}
