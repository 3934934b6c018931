//! Containment checks for caller-supplied paths.
//!
//! `AllowedRoots::validate` cleans a path lexically, then walks it the way the OS would,
//! following every symlink it meets and checking each hop against the allowed roots. The
//! returned [`ResolvedPath`] is the cleaned path the caller asked for, not the symlink target.
use std::collections::{HashSet, VecDeque};
use std::ffi::OsString;
use std::fs;
use std::ops::Deref;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};
use crate::path_utils::{expand_home, is_within, normalize_path_lexical};

/// Upper bound on symlinks followed while resolving one path.
pub const MAX_SYMLINK_HOPS: usize = 40;

/// Canonical absolute directories that every operation is confined to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AllowedRoots {
    roots: Vec<PathBuf>,
}

/// A cleaned absolute path that stayed inside the allowed roots at every resolution hop.
///
/// Only [`AllowedRoots::validate`] constructs one.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ResolvedPath(PathBuf);

impl ResolvedPath {
    pub fn as_path(&self) -> &Path {
        &self.0
    }

    pub fn into_path_buf(self) -> PathBuf {
        self.0
    }
}

impl Deref for ResolvedPath {
    type Target = Path;

    fn deref(&self) -> &Path {
        &self.0
    }
}

impl AsRef<Path> for ResolvedPath {
    fn as_ref(&self) -> &Path {
        &self.0
    }
}

#[derive(Debug, Clone)]
enum Step {
    Anchor(PathBuf),
    Parent,
    Name(OsString),
}

fn steps_of(path: &Path) -> Vec<Step> {
    let mut steps = Vec::new();
    if path.has_root() {
        if let Some(anchor) = path.ancestors().last() {
            steps.push(Step::Anchor(anchor.to_path_buf()));
        }
    }
    for comp in path.components() {
        match comp {
            std::path::Component::ParentDir => steps.push(Step::Parent),
            std::path::Component::Normal(part) => steps.push(Step::Name(part.to_os_string())),
            _ => {}
        }
    }
    steps
}

fn render<'a>(base: &Path, steps: impl Iterator<Item = &'a Step>) -> PathBuf {
    let mut out = base.to_path_buf();
    for step in steps {
        match step {
            Step::Anchor(anchor) => out = anchor.clone(),
            Step::Parent => out.push(".."),
            Step::Name(name) => out.push(name),
        }
    }
    out
}

impl AllowedRoots {
    /// Canonicalizes each directory, rejecting anything that is not an existing directory.
    ///
    /// Duplicates collapse onto their first occurrence.
    pub fn new<I, P>(dirs: I) -> Result<Self>
    where
        I: IntoIterator<Item = P>,
        P: AsRef<Path>,
    {
        let mut roots: Vec<PathBuf> = Vec::new();
        for dir in dirs {
            let dir = dir.as_ref();
            let absolute = absolutize(dir)?;
            let canonical = fs::canonicalize(&absolute).map_err(|err| {
                Error::InvalidPolicy(format!(
                    "allowed root {} cannot be resolved: {err}",
                    dir.display()
                ))
            })?;
            let meta = fs::metadata(&canonical)?;
            if !meta.is_dir() {
                return Err(Error::InvalidPolicy(format!(
                    "allowed root {} is not a directory",
                    dir.display()
                )));
            }
            if !roots.contains(&canonical) {
                roots.push(canonical);
            }
        }
        if roots.is_empty() {
            return Err(Error::InvalidPolicy(
                "at least one allowed root is required".to_string(),
            ));
        }
        Ok(Self { roots })
    }

    pub fn as_slice(&self) -> &[PathBuf] {
        &self.roots
    }

    /// Lexical, component-wise containment in any root.
    pub fn contains(&self, path: &Path) -> bool {
        self.roots.iter().any(|root| is_within(path, root))
    }

    pub fn validate(&self, requested: &Path) -> Result<ResolvedPath> {
        let candidate = absolutize(requested)?;
        if !self.contains(&candidate) {
            return Err(Error::OutsideAllowedRoots(candidate));
        }

        let physical = self.resolve_physical(&candidate)?;
        if !self.contains(&physical) {
            return Err(Error::OutsideAllowedRoots(candidate));
        }
        Ok(ResolvedPath(candidate))
    }

    /// Walks `candidate` from its anchor, following symlinks. Once a component is missing the
    /// remainder is applied lexically.
    fn resolve_physical(&self, candidate: &Path) -> Result<PathBuf> {
        let mut pending: VecDeque<Step> = steps_of(candidate).into();
        let mut resolved = PathBuf::new();
        let mut visited: HashSet<PathBuf> = HashSet::new();
        let mut hops = 0usize;
        let mut lexical_only = false;

        while let Some(step) = pending.pop_front() {
            let name = match step {
                Step::Anchor(anchor) => {
                    resolved = anchor;
                    continue;
                }
                Step::Parent => {
                    resolved.pop();
                    continue;
                }
                Step::Name(name) => name,
            };

            let next = resolved.join(&name);
            if lexical_only {
                resolved = next;
                continue;
            }
            let meta = match fs::symlink_metadata(&next) {
                Ok(meta) => meta,
                Err(_) => {
                    lexical_only = true;
                    resolved = next;
                    continue;
                }
            };
            if !meta.file_type().is_symlink() {
                resolved = next;
                continue;
            }

            hops += 1;
            if hops > MAX_SYMLINK_HOPS {
                return Err(Error::SymlinkLoop(candidate.to_path_buf()));
            }
            if !self.contains(&next) {
                return Err(Error::OutsideAllowedRoots(candidate.to_path_buf()));
            }
            let target =
                fs::read_link(&next).map_err(|_| Error::OutsideAllowedRoots(next.clone()))?;
            let target_steps = steps_of(&target);

            let state = render(&resolved, target_steps.iter().chain(pending.iter()));
            if !visited.insert(state.clone()) {
                return Err(Error::SymlinkLoop(candidate.to_path_buf()));
            }
            if !self.contains(&state) {
                return Err(Error::OutsideAllowedRoots(candidate.to_path_buf()));
            }

            for step in target_steps.into_iter().rev() {
                pending.push_front(step);
            }
        }

        Ok(resolved)
    }
}

/// Expands `~`, anchors relative paths at the current directory, and cleans the result.
fn absolutize(requested: &Path) -> Result<PathBuf> {
    if requested.as_os_str().is_empty() {
        return Err(Error::InvalidPath("path is empty".to_string()));
    }
    let expanded = expand_home(requested)?;
    let absolute = if expanded.is_absolute() {
        expanded
    } else {
        let cwd = std::env::current_dir().map_err(|err| {
            Error::InvalidPath(format!(
                "cannot resolve {} against the current directory: {err}",
                requested.display()
            ))
        })?;
        cwd.join(expanded)
    };
    Ok(normalize_path_lexical(&absolute))
}
