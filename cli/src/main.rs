use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use tracing_subscriber::EnvFilter;

use rooted_fs::ops::{
    Context, CreateDirectoryRequest, DirectoryTreeRequest, EditFileRequest, FileInfoRequest,
    ListDirectoryRequest, MoveFileRequest, ReadFileRequest, ReadMultipleFilesRequest,
    SearchFilesRequest, WriteFileRequest,
};
use rooted_fs::policy::{Permissions, SandboxPolicy};
use rooted_fs::text_edit::Edit;

mod error;
mod input;

use error::{CliError, tool_error_details};
use input::load_text_limited;

const LOG_ENV: &str = "ROOTED_FS_LOG";

#[derive(Debug, Clone, Copy, ValueEnum)]
enum ErrorFormat {
    Text,
    Json,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum PolicyOutput {
    Toml,
    Json,
}

#[derive(Debug, Parser)]
#[command(name = "rooted-fs")]
#[command(about = "Filesystem operations confined to a set of allowed directories.")]
struct Cli {
    /// Allowed directory; repeat for several. Grants every permission unless `--read-only`.
    #[arg(long = "root", value_name = "DIR", required_unless_present = "policy")]
    roots: Vec<PathBuf>,

    /// Policy file (.toml or .json) instead of `--root`.
    #[arg(long, conflicts_with_all = ["roots", "read_only"])]
    policy: Option<PathBuf>,

    /// With `--root`, only grant read-side permissions.
    #[arg(long, default_value_t = false)]
    read_only: bool,

    #[arg(long, value_enum, default_value_t = ErrorFormat::Text)]
    error_format: ErrorFormat,

    /// Max bytes accepted for content and edit input (file or stdin).
    #[arg(long, default_value_t = 16 * 1024 * 1024)]
    max_input_bytes: u64,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Print a file's text.
    Read { path: PathBuf },
    /// Read several files; failures are reported per file.
    ReadMany {
        #[arg(required = true)]
        paths: Vec<PathBuf>,
    },
    /// Create or replace a file with the text read from `input` (`-` for stdin).
    Write { path: PathBuf, input: PathBuf },
    /// Apply a JSON array of `{"oldText", "newText"}` edits read from `edits` (`-` for stdin).
    Edit {
        path: PathBuf,
        edits: PathBuf,
        #[arg(long, default_value_t = false)]
        dry_run: bool,
    },
    Mkdir { path: PathBuf },
    Ls { path: PathBuf },
    Tree {
        path: PathBuf,
        #[arg(long)]
        max_depth: Option<usize>,
        #[arg(long = "exclude", value_name = "PATTERN")]
        exclude_patterns: Vec<String>,
    },
    Mv {
        source: PathBuf,
        destination: PathBuf,
    },
    /// Find entries whose name contains `pattern`, case-insensitively.
    Search {
        path: PathBuf,
        pattern: String,
        #[arg(long = "exclude", value_name = "PATTERN")]
        exclude_patterns: Vec<String>,
    },
    Info { path: PathBuf },
    Roots,
    /// Print the effective policy.
    Policy {
        #[arg(long, value_enum, default_value_t = PolicyOutput::Toml)]
        format: PolicyOutput,
    },
}

fn init_tracing() {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

fn main() {
    init_tracing();
    let cli = Cli::parse();
    let error_format = cli.error_format;

    match run(&cli) {
        Ok(Output::Json(value)) => match serde_json::to_string_pretty(&value) {
            Ok(text) => println!("{text}"),
            Err(err) => {
                report(&CliError::from(err), error_format);
                std::process::exit(1);
            }
        },
        Ok(Output::Text(text)) => print!("{text}"),
        Err(err) => {
            report(&err, error_format);
            std::process::exit(1);
        }
    }
}

fn report(err: &CliError, format: ErrorFormat) {
    tracing::debug!(code = err.code(), "command failed");
    match format {
        ErrorFormat::Text => eprintln!("{err}"),
        ErrorFormat::Json => {
            let mut error = serde_json::Map::new();
            error.insert(
                "code".to_string(),
                serde_json::Value::String(err.code().to_string()),
            );
            error.insert(
                "message".to_string(),
                serde_json::Value::String(err.to_string()),
            );
            if let CliError::Tool(tool) = err {
                error.insert("details".to_string(), tool_error_details(tool));
            }
            let out = serde_json::json!({ "error": error });
            match serde_json::to_string(&out) {
                Ok(text) => eprintln!("{text}"),
                Err(_) => eprintln!("{err}"),
            }
        }
    }
}

#[derive(Debug)]
enum Output {
    Json(serde_json::Value),
    Text(String),
}

fn build_policy(cli: &Cli) -> Result<SandboxPolicy, CliError> {
    if let Some(path) = &cli.policy {
        return Ok(rooted_fs::policy_io::load_policy(path)?);
    }
    let permissions = if cli.read_only {
        Permissions::read_only()
    } else {
        Permissions::all()
    };
    let cwd = std::env::current_dir().map_err(rooted_fs::Error::from)?;
    let roots = cli.roots.iter().map(|root| cwd.join(root));
    Ok(SandboxPolicy::from_roots(roots, permissions))
}

fn load_edits(cli: &Cli, path: &std::path::Path) -> Result<Vec<Edit>, CliError> {
    let raw = load_text_limited(path, cli.max_input_bytes)?;
    Ok(serde_json::from_str(&raw)?)
}

fn run(cli: &Cli) -> Result<Output, CliError> {
    let policy = build_policy(cli)?;
    let ctx = Context::new(policy)?;

    let value = match &cli.command {
        Command::Read { path } => serde_json::to_value(ctx.read_file(ReadFileRequest {
            path: path.clone(),
        })?)?,
        Command::ReadMany { paths } => {
            serde_json::to_value(ctx.read_multiple_files(ReadMultipleFilesRequest {
                paths: paths.clone(),
            })?)?
        }
        Command::Write { path, input } => {
            let content = load_text_limited(input, cli.max_input_bytes)?;
            serde_json::to_value(ctx.write_file(WriteFileRequest {
                path: path.clone(),
                content,
            })?)?
        }
        Command::Edit {
            path,
            edits,
            dry_run,
        } => {
            let edits = load_edits(cli, edits)?;
            let response = ctx.edit_file(EditFileRequest {
                path: path.clone(),
                edits,
                dry_run: *dry_run,
            })?;
            return Ok(Output::Text(response.diff));
        }
        Command::Mkdir { path } => {
            serde_json::to_value(ctx.create_directory(CreateDirectoryRequest {
                path: path.clone(),
            })?)?
        }
        Command::Ls { path } => serde_json::to_value(ctx.list_directory(ListDirectoryRequest {
            path: path.clone(),
        })?)?,
        Command::Tree {
            path,
            max_depth,
            exclude_patterns,
        } => serde_json::to_value(ctx.directory_tree(DirectoryTreeRequest {
            path: path.clone(),
            max_depth: *max_depth,
            exclude_patterns: exclude_patterns.clone(),
        })?)?,
        Command::Mv {
            source,
            destination,
        } => serde_json::to_value(ctx.move_file(MoveFileRequest {
            source: source.clone(),
            destination: destination.clone(),
        })?)?,
        Command::Search {
            path,
            pattern,
            exclude_patterns,
        } => serde_json::to_value(ctx.search_files(SearchFilesRequest {
            path: path.clone(),
            pattern: pattern.clone(),
            exclude_patterns: exclude_patterns.clone(),
        })?)?,
        Command::Info { path } => serde_json::to_value(ctx.get_file_info(FileInfoRequest {
            path: path.clone(),
        })?)?,
        Command::Roots => serde_json::to_value(ctx.list_allowed_directories())?,
        Command::Policy { format } => {
            let format = match format {
                PolicyOutput::Toml => rooted_fs::policy_io::PolicyFormat::Toml,
                PolicyOutput::Json => rooted_fs::policy_io::PolicyFormat::Json,
            };
            let mut effective = ctx.policy().clone();
            effective.roots = ctx.roots().as_slice().to_vec();
            let mut text = rooted_fs::policy_io::render_policy(&effective, format)?;
            if !text.ends_with('\n') {
                text.push('\n');
            }
            return Ok(Output::Text(text));
        }
    };

    Ok(Output::Json(value))
}
