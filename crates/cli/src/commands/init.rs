use std::path::Path;

use anyhow::bail;
use serde_json::json;
use tracing::info;

use crate::cli::InitArgs;
use crate::config::CliConfig;
use crate::output;

/// Writes `config` to `path`. An existing file is only replaced with `--force`.
pub fn execute(config: &CliConfig, path: Option<&Path>, args: InitArgs) -> anyhow::Result<()> {
	let Some(path) = path else {
		bail!("no config directory on this platform, pass --config");
	};
	if path.exists() && !args.force {
		bail!("{} already exists, pass --force to overwrite it", path.display());
	}

	config.save(path)?;
	info!(target = "lcu.cli", path = %path.display(), "config written");
	output::print_line(&json!({ "path": path }))?;
	Ok(())
}
