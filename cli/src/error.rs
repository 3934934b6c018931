use std::path::Path;

const CLI_ERROR_CODE_JSON: &str = "json";

#[derive(Debug)]
pub(crate) enum CliError {
    Tool(rooted_fs::Error),
    Json(serde_json::Error),
}

impl std::fmt::Display for CliError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CliError::Tool(err) => write!(f, "{err}"),
            CliError::Json(err) => write!(f, "json error: {err}"),
        }
    }
}

impl std::error::Error for CliError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CliError::Tool(err) => Some(err),
            CliError::Json(err) => Some(err),
        }
    }
}

impl From<rooted_fs::Error> for CliError {
    fn from(err: rooted_fs::Error) -> Self {
        Self::Tool(err)
    }
}

impl From<serde_json::Error> for CliError {
    fn from(err: serde_json::Error) -> Self {
        Self::Json(err)
    }
}

impl CliError {
    pub(crate) fn code(&self) -> &'static str {
        match self {
            CliError::Tool(err) => err.code(),
            CliError::Json(_) => CLI_ERROR_CODE_JSON,
        }
    }
}

fn details_map(kind: &'static str) -> serde_json::Map<String, serde_json::Value> {
    let mut out = serde_json::Map::new();
    out.insert(
        "kind".to_string(),
        serde_json::Value::String(kind.to_string()),
    );
    out
}

fn path_value(path: &Path) -> serde_json::Value {
    serde_json::Value::String(path.display().to_string())
}

/// Structured fields for `--error-format json`; `kind` always equals `Error::code`.
pub(crate) fn tool_error_details(tool: &rooted_fs::Error) -> serde_json::Value {
    use rooted_fs::Error;

    let mut out = details_map(tool.code());
    match tool {
        Error::Io(err) => {
            out.insert(
                "io_kind".to_string(),
                serde_json::Value::String(format!("{:?}", err.kind())),
            );
            if let Some(raw_os_error) = err.raw_os_error() {
                out.insert("raw_os_error".to_string(), serde_json::json!(raw_os_error));
            }
            out.insert(
                "message".to_string(),
                serde_json::Value::String(err.to_string()),
            );
        }
        Error::OutsideAllowedRoots(path) | Error::SymlinkLoop(path) | Error::InvalidUtf8(path) => {
            out.insert("path".to_string(), path_value(path));
        }
        Error::EditNotFound { old_text } => {
            out.insert(
                "old_text".to_string(),
                serde_json::Value::String(old_text.clone()),
            );
        }
        Error::FileTooLarge {
            path,
            size_bytes,
            max_bytes,
        } => {
            out.insert("path".to_string(), path_value(path));
            out.insert("size_bytes".to_string(), serde_json::json!(size_bytes));
            out.insert("max_bytes".to_string(), serde_json::json!(max_bytes));
        }
        Error::InvalidPolicy(message)
        | Error::InvalidPath(message)
        | Error::NotPermitted(message)
        | Error::InvalidPattern(message)
        | Error::InvalidInput(message) => {
            out.insert(
                "message".to_string(),
                serde_json::Value::String(message.clone()),
            );
        }
        other => {
            out.insert(
                "message".to_string(),
                serde_json::Value::String(other.to_string()),
            );
        }
    }
    if tool.is_access_denied() {
        out.insert("access_denied".to_string(), serde_json::Value::Bool(true));
    }
    serde_json::Value::Object(out)
}
