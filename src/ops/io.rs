use std::fs;
use std::io::{Read, Write};
use std::path::Path;

use crate::error::{Error, Result};

fn file_too_large(path: &Path, size_bytes: u64, max_bytes: u64) -> Error {
    Error::FileTooLarge {
        path: path.to_path_buf(),
        size_bytes,
        max_bytes,
    }
}

/// Reads a regular file, refusing anything larger than `max_bytes`.
///
/// The size is checked against metadata first and again while reading, so a file that grows
/// between the two still cannot exceed the limit.
pub(crate) fn read_bytes_limited(path: &Path, max_bytes: u64) -> Result<Vec<u8>> {
    let file = fs::File::open(path)?;
    let meta = file.metadata()?;
    if !meta.is_file() {
        return Err(Error::InvalidPath(format!(
            "path {} is not a regular file",
            path.display()
        )));
    }
    if meta.len() > max_bytes {
        return Err(file_too_large(path, meta.len(), max_bytes));
    }

    let mut bytes = Vec::<u8>::new();
    file.take(max_bytes.saturating_add(1))
        .read_to_end(&mut bytes)?;
    let read_size = u64::try_from(bytes.len()).unwrap_or(u64::MAX);
    if read_size > max_bytes {
        return Err(file_too_large(path, read_size, max_bytes));
    }
    Ok(bytes)
}

pub(crate) fn read_string_limited(path: &Path, max_bytes: u64) -> Result<String> {
    let bytes = read_bytes_limited(path, max_bytes)?;
    String::from_utf8(bytes).map_err(|_| Error::InvalidUtf8(path.to_path_buf()))
}

pub(crate) fn ensure_write_size(path: &Path, len: usize, max_bytes: u64) -> Result<()> {
    let len = u64::try_from(len).unwrap_or(u64::MAX);
    if len > max_bytes {
        return Err(file_too_large(path, len, max_bytes));
    }
    Ok(())
}

/// Replaces (or creates) `path` with `bytes` through a temp file in the same directory.
///
/// A symlinked `path` is written through to its target; the link itself stays in place. An
/// existing file keeps its permissions.
pub(crate) fn write_bytes_atomic(path: &Path, bytes: &[u8]) -> Result<()> {
    let target = match fs::canonicalize(path) {
        Ok(target) => target,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => path.to_path_buf(),
        Err(err) => return Err(err.into()),
    };
    let existing_perms = match fs::metadata(&target) {
        Ok(meta) if meta.is_dir() => {
            return Err(Error::InvalidPath(format!(
                "path {} is a directory",
                path.display()
            )));
        }
        Ok(meta) => Some(meta.permissions()),
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => None,
        Err(err) => return Err(err.into()),
    };

    let parent = target.parent().ok_or_else(|| {
        Error::InvalidPath(format!(
            "invalid path {}: missing parent directory",
            path.display()
        ))
    })?;

    let mut tmp_file = tempfile::Builder::new()
        .prefix(".rooted-fs.")
        .suffix(".tmp")
        .tempfile_in(parent)?;
    tmp_file.as_file_mut().write_all(bytes)?;
    tmp_file.as_file_mut().sync_all()?;

    if let Some(perms) = existing_perms {
        fs::set_permissions(tmp_file.path(), perms)?;
    }

    tmp_file.persist(&target).map_err(|err| Error::Io(err.error))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn read_limit_is_inclusive() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("a.txt");
        fs::write(&path, "12345").expect("write");

        assert_eq!(read_bytes_limited(&path, 5).expect("read"), b"12345");
        match read_bytes_limited(&path, 4) {
            Err(Error::FileTooLarge {
                size_bytes,
                max_bytes,
                ..
            }) => {
                assert_eq!(size_bytes, 5);
                assert_eq!(max_bytes, 4);
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn non_utf8_content_is_reported() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("bin");
        fs::write(&path, [0xff, 0xfe, 0x00]).expect("write");

        match read_string_limited(&path, 1024) {
            Err(Error::InvalidUtf8(p)) => assert_eq!(p, path),
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn atomic_write_creates_and_replaces() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("out.txt");

        write_bytes_atomic(&path, b"first").expect("create");
        assert_eq!(fs::read(&path).expect("read"), b"first");
        write_bytes_atomic(&path, b"second").expect("replace");
        assert_eq!(fs::read(&path).expect("read"), b"second");

        let leftovers: Vec<_> = fs::read_dir(dir.path())
            .expect("read_dir")
            .filter_map(|entry| entry.ok())
            .filter(|entry| entry.file_name().to_string_lossy().ends_with(".tmp"))
            .collect();
        assert!(leftovers.is_empty());
    }

    #[test]
    #[cfg(unix)]
    fn atomic_write_keeps_permissions_and_symlinks() {
        use std::os::unix::fs::{PermissionsExt, symlink};

        let dir = tempfile::tempdir().expect("tempdir");
        let real = dir.path().join("real.sh");
        fs::write(&real, "old").expect("write");
        fs::set_permissions(&real, fs::Permissions::from_mode(0o750)).expect("chmod");
        let link = dir.path().join("link.sh");
        symlink(&real, &link).expect("symlink");

        write_bytes_atomic(&link, b"new").expect("write through link");

        assert!(
            fs::symlink_metadata(&link)
                .expect("lstat")
                .file_type()
                .is_symlink()
        );
        assert_eq!(fs::read(&real).expect("read"), b"new");
        let mode = fs::metadata(&real).expect("stat").permissions().mode() & 0o777;
        assert_eq!(mode, 0o750);
    }
}
