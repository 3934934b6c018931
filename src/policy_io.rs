//! Loading a [`SandboxPolicy`] from a TOML or JSON file.
//!
//! Relative `roots` entries in a policy file are taken relative to the directory holding the
//! file, so a policy checked into a repository can say `roots = ["."]`. A leading `~` is the
//! home directory.
use std::io::Read;
use std::path::Path;

use crate::path_utils::expand_home;
use crate::{Error, Result, SandboxPolicy};

const DEFAULT_MAX_POLICY_BYTES: u64 = 4 * 1024 * 1024;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PolicyFormat {
    Toml,
    Json,
}

impl PolicyFormat {
    /// `.json` is JSON; `.toml` or no extension is TOML; anything else is refused.
    pub fn from_path(path: &Path) -> Result<Self> {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("json") => Ok(Self::Json),
            Some(ext) if ext.eq_ignore_ascii_case("toml") => Ok(Self::Toml),
            None => Ok(Self::Toml),
            Some(other) => Err(Error::InvalidPolicy(format!(
                "unsupported policy format {other:?}; expected .toml or .json"
            ))),
        }
    }
}

/// Parses without validating; relative roots are left as written.
pub fn parse_policy(raw: &str, format: PolicyFormat) -> Result<SandboxPolicy> {
    match format {
        PolicyFormat::Json => serde_json::from_str(raw)
            .map_err(|err| Error::InvalidPolicy(format!("invalid json policy: {err}"))),
        PolicyFormat::Toml => toml::from_str(raw)
            .map_err(|err| Error::InvalidPolicy(format!("invalid toml policy: {err}"))),
    }
}

/// Renders `policy` back into `format`, e.g. to show the effective configuration.
pub fn render_policy(policy: &SandboxPolicy, format: PolicyFormat) -> Result<String> {
    match format {
        PolicyFormat::Json => Ok(serde_json::to_string_pretty(policy)?),
        PolicyFormat::Toml => toml::to_string_pretty(policy)
            .map_err(|err| Error::InvalidPolicy(format!("cannot render toml policy: {err}"))),
    }
}

pub fn load_policy(path: impl AsRef<Path>) -> Result<SandboxPolicy> {
    load_policy_limited(path, DEFAULT_MAX_POLICY_BYTES)
}

/// Reads, parses and validates a policy file of at most `max_bytes`.
///
/// The file itself must be a regular file, not a symlink.
pub fn load_policy_limited(path: impl AsRef<Path>, max_bytes: u64) -> Result<SandboxPolicy> {
    if max_bytes == 0 {
        return Err(Error::InvalidPolicy(
            "max policy bytes must be > 0".to_string(),
        ));
    }

    let path = path.as_ref();
    let format = PolicyFormat::from_path(path)?;
    let meta = std::fs::symlink_metadata(path)?;
    if meta.file_type().is_symlink() {
        return Err(Error::InvalidPath(format!(
            "policy file {} is a symlink",
            path.display()
        )));
    }
    if !meta.is_file() {
        return Err(Error::InvalidPath(format!(
            "policy file {} is not a regular file",
            path.display()
        )));
    }

    let mut bytes = Vec::<u8>::new();
    std::fs::File::open(path)?
        .take(max_bytes.saturating_add(1))
        .read_to_end(&mut bytes)?;
    let size_bytes = u64::try_from(bytes.len()).unwrap_or(u64::MAX);
    if size_bytes > max_bytes {
        return Err(Error::FileTooLarge {
            path: path.to_path_buf(),
            size_bytes,
            max_bytes,
        });
    }
    let raw = String::from_utf8(bytes).map_err(|_| Error::InvalidUtf8(path.to_path_buf()))?;

    let mut policy = parse_policy(&raw, format)?;
    let base = match path.parent() {
        Some(parent) if parent.is_absolute() => parent.to_path_buf(),
        Some(parent) => std::env::current_dir()?.join(parent),
        None => std::env::current_dir()?,
    };
    for root in &mut policy.roots {
        let expanded = expand_home(root)?;
        *root = if expanded.is_relative() {
            base.join(expanded)
        } else {
            expanded
        };
    }
    policy.validate()?;
    tracing::debug!(path = %path.display(), roots = policy.roots.len(), "policy loaded");
    Ok(policy)
}
