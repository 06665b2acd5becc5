//! Subcommand implementations.

mod credentials;
mod init;
mod probe;
mod run;

use crate::cli::{Cli, Commands};
use crate::config::{self, CliConfig};

/// Loads the config, applies flag overrides and runs the subcommand.
pub async fn dispatch(cli: Cli) -> anyhow::Result<()> {
	let path = cli.config.clone().or_else(config::default_path);
	let mut config = CliConfig::load_from(path.as_deref())?;
	config.apply(&cli.overrides);
	tracing::debug!(target = "lcu.cli", ?config, "effective config");

	match cli.subcommand() {
		Commands::Run(args) => run::execute(&config, args).await,
		Commands::Probe => probe::execute(&config).await,
		Commands::Credentials => credentials::execute(&config).await,
		Commands::Init(args) => init::execute(&config, path.as_deref(), args),
	}
}
