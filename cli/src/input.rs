use std::io::Read;
use std::path::Path;

const HARD_MAX_TEXT_INPUT_BYTES: u64 = 64 * 1024 * 1024;

/// Reads UTF-8 text from `path`, or stdin when `path` is `-`.
///
/// Inputs come from the caller, not the sandbox, so they are not checked against the roots.
pub(crate) fn load_text_limited(path: &Path, max_bytes: u64) -> Result<String, rooted_fs::Error> {
    if max_bytes == 0 {
        return Err(rooted_fs::Error::InvalidInput(
            "max input bytes must be > 0".to_string(),
        ));
    }
    if max_bytes > HARD_MAX_TEXT_INPUT_BYTES {
        return Err(rooted_fs::Error::InvalidInput(format!(
            "max input bytes exceeds hard limit ({HARD_MAX_TEXT_INPUT_BYTES} bytes)"
        )));
    }

    let limit = max_bytes.saturating_add(1);
    let mut bytes = Vec::<u8>::new();
    if path.as_os_str() == "-" {
        std::io::stdin().take(limit).read_to_end(&mut bytes)?;
    } else {
        let file = std::fs::File::open(path)?;
        let meta = file.metadata()?;
        if !meta.is_file() {
            return Err(rooted_fs::Error::InvalidPath(format!(
                "input {} is not a regular file",
                path.display()
            )));
        }
        if meta.len() > max_bytes {
            return Err(rooted_fs::Error::FileTooLarge {
                path: path.to_path_buf(),
                size_bytes: meta.len(),
                max_bytes,
            });
        }
        file.take(limit).read_to_end(&mut bytes)?;
    }

    let read_size = u64::try_from(bytes.len()).unwrap_or(u64::MAX);
    if read_size > max_bytes {
        return Err(rooted_fs::Error::FileTooLarge {
            path: path.to_path_buf(),
            size_bytes: read_size,
            max_bytes,
        });
    }
    String::from_utf8(bytes).map_err(|_| rooted_fs::Error::InvalidUtf8(path.to_path_buf()))
}
