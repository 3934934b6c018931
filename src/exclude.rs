//! Gitignore-style exclude patterns for directory walks.
//!
//! Supported forms: `*.log` (any segment), `build/` (directories only), `src/gen` (anchored at
//! the walk root because it contains `/`), `**/target` (anywhere, matched as a path suffix),
//! `dir/**` (everything under `dir`), and `a/**/b` (zero or more directories in between).
//! `*` never crosses a `/`.
use std::path::Path;

use globset::GlobMatcher;

use crate::error::{Error, Result};
use crate::path_utils::{build_glob, relative_slash_path};

/// One compiled pattern.
#[derive(Debug, Clone)]
pub struct ExcludePattern {
    raw: String,
    glob: GlobMatcher,
    is_dir_only: bool,
    anchored: bool,
    prefix: Option<String>,
    suffix: Option<String>,
}

impl ExcludePattern {
    /// Compiles `raw`, or returns `Ok(None)` for blank lines and `#` comments.
    pub fn compile(raw: &str) -> Result<Option<Self>> {
        let pattern = raw.trim();
        if pattern.is_empty() || pattern.starts_with('#') {
            return Ok(None);
        }

        let is_dir_only = pattern.ends_with('/');
        let anchored = pattern.contains('/') && !pattern.starts_with("**/");

        let mut body = pattern.trim_end_matches('/');
        body = body.strip_prefix('/').unwrap_or(body);
        if body.is_empty() {
            return Err(Error::InvalidPattern(format!(
                "{raw:?} does not name anything"
            )));
        }

        let suffix = body.strip_prefix("**/").map(str::to_string);
        let prefix = body.strip_suffix("/**").map(str::to_string);

        let mut compile = body;
        compile = compile.strip_prefix("**/").unwrap_or(compile);
        compile = compile.strip_suffix("/**").unwrap_or(compile);

        let glob = build_glob(compile)
            .map_err(|err| Error::InvalidPattern(format!("{raw:?}: {err}")))?
            .compile_matcher();

        Ok(Some(Self {
            raw: raw.to_string(),
            glob,
            is_dir_only,
            anchored,
            prefix,
            suffix,
        }))
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// `rel` is relative to the walk root and uses `/` separators.
    pub fn matches(&self, rel: &str, is_dir: bool) -> bool {
        if self.is_dir_only && !is_dir {
            return false;
        }

        let glob_hit = if self.anchored {
            self.glob.is_match(rel)
        } else {
            rel.split('/').any(|segment| self.glob.is_match(segment))
        };
        if glob_hit {
            return true;
        }

        if let Some(suffix) = &self.suffix
            && ends_with_segments(rel, suffix)
        {
            return true;
        }
        if let Some(prefix) = &self.prefix
            && starts_with_segments(rel, prefix)
        {
            return true;
        }
        false
    }
}

// Whole segments only, so `dir1/**` never reaches into `dir10`.
fn starts_with_segments(rel: &str, prefix: &str) -> bool {
    match rel.strip_prefix(prefix) {
        Some(rest) => rest.is_empty() || rest.starts_with('/'),
        None => false,
    }
}

fn ends_with_segments(rel: &str, suffix: &str) -> bool {
    match rel.strip_suffix(suffix) {
        Some(rest) => rest.is_empty() || rest.ends_with('/'),
        None => false,
    }
}

/// An ordered collection of exclude patterns; any hit excludes.
#[derive(Debug, Clone, Default)]
pub struct ExcludeMatcher {
    patterns: Vec<ExcludePattern>,
}

impl ExcludeMatcher {
    pub fn new<I, S>(patterns: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut matcher = Self::default();
        for pattern in patterns {
            matcher.add_pattern(pattern.as_ref())?;
        }
        Ok(matcher)
    }

    pub fn add_pattern(&mut self, raw: &str) -> Result<()> {
        if let Some(pattern) = ExcludePattern::compile(raw)? {
            self.patterns.push(pattern);
        }
        Ok(())
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }

    pub fn len(&self) -> usize {
        self.patterns.len()
    }

    /// Whether `candidate`, found while walking `walk_root`, should be skipped.
    ///
    /// The walk root itself and paths outside it are never excluded.
    pub fn is_excluded(&self, walk_root: &Path, candidate: &Path, is_dir: bool) -> bool {
        if self.patterns.is_empty() {
            return false;
        }
        match relative_slash_path(walk_root, candidate) {
            Some(rel) => self.is_excluded_relative(&rel, is_dir),
            None => false,
        }
    }

    pub fn is_excluded_relative(&self, rel: &str, is_dir: bool) -> bool {
        if rel.is_empty() {
            return false;
        }
        self.patterns
            .iter()
            .any(|pattern| pattern.matches(rel, is_dir))
    }
}
