use std::borrow::Cow;
use std::fs::File;
use std::io;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use tax_core::calculations::{MemoizedCalculator, TaxCalculator};
use tax_core::registry::statutory_registry;
use tax_core::{RegimeRegistry, RegistryConfig, TaxError};
use tax_data::{RegimeTableLoader, RegimeTableLoaderError};
use thiserror::Error;
use tracing::{debug, error, info};

use crate::batch::{BatchOutcome, run_batch};
use crate::cli::{Cli, OutputFormat};
use crate::config::AppConfig;
use crate::render;

/// Process exit status, ordered from best to worst.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Status {
    Success,
    UserError,
    Internal,
}

impl Status {
    pub fn code(self) -> u8 {
        match self {
            Self::Success => 0,
            Self::Internal => 1,
            Self::UserError => 2,
        }
    }

    fn for_tax_error(err: &TaxError) -> Self {
        if err.is_user_correctable() {
            Self::UserError
        } else {
            Self::Internal
        }
    }
}

impl From<Status> for ExitCode {
    fn from(status: Status) -> Self {
        ExitCode::from(status.code())
    }
}

/// Failures before any computation starts.
#[derive(Debug, Error)]
pub enum SetupError {
    #[error("cannot read slab tables '{}': {source}", path.display())]
    TablesRead {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("invalid slab tables '{}': {source}", path.display())]
    Tables {
        path: PathBuf,
        #[source]
        source: RegimeTableLoaderError,
    },

    #[error("cannot read batch file '{}': {source}", path.display())]
    BatchRead {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("missing taxpayer profile: --category, --residency, --regime and --age are required")]
    MissingProfile,

    #[error("cannot build the built-in slab tables")]
    BuiltIn(#[source] TaxError),

    #[error("cannot render output: {0}")]
    Render(#[from] serde_json::Error),
}

impl SetupError {
    pub fn status(&self) -> Status {
        match self {
            Self::BuiltIn(_) | Self::Render(_) => Status::Internal,
            _ => Status::UserError,
        }
    }
}

/// What a run prints and how the process exits.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunOutput {
    pub status: Status,
    pub stdout: String,
    pub stderr: String,
}

impl RunOutput {
    fn success(stdout: String) -> Self {
        Self {
            status: Status::Success,
            stdout,
            stderr: String::new(),
        }
    }
}

/// Picks the registry: a table file when one is given, the built-in tables
/// otherwise. The default built-in registry is shared process-wide.
pub fn load_registry(
    tables: Option<&Path>,
    config: &RegistryConfig,
) -> Result<Cow<'static, RegimeRegistry>, SetupError> {
    if let Some(path) = tables {
        info!(path = %path.display(), "loading slab tables");
        let file = File::open(path).map_err(|source| SetupError::TablesRead {
            path: path.to_path_buf(),
            source,
        })?;
        let registry =
            RegimeTableLoader::load_from_reader(file).map_err(|source| SetupError::Tables {
                path: path.to_path_buf(),
                source,
            })?;
        return Ok(Cow::Owned(registry));
    }

    if *config == RegistryConfig::default() {
        return statutory_registry()
            .map(Cow::Borrowed)
            .map_err(SetupError::BuiltIn);
    }

    debug!(huf_schedule = config.huf_schedule.as_str(), "building slab tables");
    RegimeRegistry::with_statutory_tables(config)
        .map(Cow::Owned)
        .map_err(|err| SetupError::BuiltIn(err.into()))
}

/// Runs one invocation. Flags take precedence over `config`.
pub fn run(
    cli: &Cli,
    config: &AppConfig,
) -> RunOutput {
    match try_run(cli, config) {
        Ok(output) => output,
        Err(err) => {
            if let SetupError::BuiltIn(source) = &err {
                error!(error = %source, "failed to build slab tables");
            }
            RunOutput {
                status: err.status(),
                stdout: String::new(),
                stderr: format!("error: {err}\n"),
            }
        }
    }
}

fn try_run(
    cli: &Cli,
    config: &AppConfig,
) -> Result<RunOutput, SetupError> {
    let tables = cli.tables.as_deref().or(config.tables.as_deref());
    let registry = load_registry(tables, &config.registry)?;

    if let Some(path) = &cli.batch {
        let file = File::open(path).map_err(|source| SetupError::BatchRead {
            path: path.clone(),
            source,
        })?;
        let calculator = MemoizedCalculator::new(&registry);
        let outcomes = run_batch(&calculator, file);
        return render_batch(&outcomes, cli.format);
    }

    let input = cli.computation_input().ok_or(SetupError::MissingProfile)?;
    let calculator = TaxCalculator::new(&registry);

    match calculator.calculate_input(&input) {
        Ok(result) => {
            let stdout = match cli.format {
                OutputFormat::Text => render::render_text(&input.profile, &result),
                OutputFormat::Json => render::render_json(&input.profile, &result)? + "\n",
            };
            Ok(RunOutput::success(stdout))
        }
        Err(err) => {
            if !err.is_user_correctable() {
                error!(error = %err, "tax computation failed");
            }
            let (stdout, stderr) = match cli.format {
                OutputFormat::Text => (String::new(), render::render_error_text(&err)),
                OutputFormat::Json => (render::render_error_json(&err)? + "\n", String::new()),
            };
            Ok(RunOutput {
                status: Status::for_tax_error(&err),
                stdout,
                stderr,
            })
        }
    }
}

fn render_batch(
    outcomes: &[BatchOutcome],
    format: OutputFormat,
) -> Result<RunOutput, SetupError> {
    let status = outcomes
        .iter()
        .map(|outcome| match &outcome.result {
            Ok(_) => Status::Success,
            Err(err) if err.is_user_correctable() => Status::UserError,
            Err(err) => {
                error!(row = outcome.row, error = %err, "batch row failed");
                Status::Internal
            }
        })
        .max()
        .unwrap_or(Status::Success);

    let stdout = match format {
        OutputFormat::Text => render::render_batch_text(outcomes),
        OutputFormat::Json => render::render_batch_json(outcomes)? + "\n",
    };

    Ok(RunOutput {
        status,
        stdout,
        stderr: String::new(),
    })
}
