use std::process::ExitCode;

use clap::Parser;
use tracing::debug;

use tax_cli::app;
use tax_cli::cli::Cli;
use tax_cli::config::AppConfig;
use tax_cli::logging::init_logging;

// ─── entry point ─────────────────────────────────────────────────────────────

fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = match cli.config.as_deref().map(AppConfig::load).transpose() {
        Ok(config) => config.unwrap_or_default(),
        Err(err) => {
            eprintln!("error: {err}");
            return app::Status::UserError.into();
        }
    };

    let log_level = cli.log_level.as_deref().or(config.log_level.as_deref());
    let log_file = cli.log_file.as_deref().or(config.log_file.as_deref());
    if let Err(err) = init_logging(log_level, log_file) {
        eprintln!("error: {err:#}");
        return app::Status::UserError.into();
    }
    debug!(?config, "configuration loaded");

    let output = app::run(&cli, &config);
    print!("{}", output.stdout);
    eprint!("{}", output.stderr);

    output.status.into()
}
