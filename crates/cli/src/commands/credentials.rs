use anyhow::Context;
use lcu_runtime::CredentialResolver;
use serde_json::json;

use crate::config::CliConfig;
use crate::output;

pub async fn execute(config: &CliConfig) -> anyhow::Result<()> {
	let resolver = config.resolver()?;
	let credentials = resolver
		.resolve()
		.await
		.context("could not resolve client credentials")?;

	output::print_line(&json!({
		"host": credentials.host,
		"port": credentials.port,
		"username": credentials.username,
		"token": "<redacted>",
		"tls": credentials.security.is_tls(),
		"pid": credentials.pid,
		"installDir": credentials.install_dir,
		"httpBase": credentials.http_base(),
	}))?;
	Ok(())
}
