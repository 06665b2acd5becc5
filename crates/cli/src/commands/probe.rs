use lcu_runtime::{ProcessProbe, SystemProbe};
use serde_json::json;

use crate::config::CliConfig;
use crate::output;

pub async fn execute(config: &CliConfig) -> anyhow::Result<()> {
	let running = SystemProbe.is_running(&config.process_name).await?;
	output::print_line(&json!({
		"process": config.process_name,
		"running": running,
	}))?;
	Ok(())
}
