use std::sync::Arc;

use anyhow::Context;
use lcu::{ChannelSink, LiveConnector, Orchestrator, auto_accept_ready_check};
use tracing::info;

use crate::cli::RunArgs;
use crate::config::CliConfig;
use crate::output;

/// Runs the orchestrator until Ctrl-C, printing UI events as they arrive.
pub async fn execute(config: &CliConfig, args: RunArgs) -> anyhow::Result<()> {
	let settings = config.orchestrator_config();
	let monitor = settings.system_monitor()?;
	let mut connector = LiveConnector::new(settings.process_name.clone(), config.resolver()?);
	if let Some(url) = config.lobby_url()? {
		connector = connector.with_lobby_server(url);
	}

	let (sink, mut events) = ChannelSink::new();
	let mut orchestrator = Orchestrator::new(settings, Arc::new(connector), Arc::new(sink));
	if config.auto_accept {
		orchestrator = orchestrator.with_handler(auto_accept_ready_check());
	}

	orchestrator.start(monitor, !args.wait);
	info!(
		target = "lcu.cli",
		process = %orchestrator.config().process_name,
		poll_interval = ?orchestrator.config().poll_interval,
		lobby = config.lobby_server.is_some(),
		"watching for the client"
	);

	let ctrl_c = tokio::signal::ctrl_c();
	tokio::pin!(ctrl_c);
	loop {
		tokio::select! {
			event = events.recv() => match event {
				Some(event) => output::print_line(&event)?,
				None => break,
			},
			signal = &mut ctrl_c => {
				signal.context("failed to listen for Ctrl-C")?;
				info!(target = "lcu.cli", "interrupted, shutting down");
				break;
			}
		}
	}

	orchestrator.shutdown();
	while let Ok(event) = events.try_recv() {
		output::print_line(&event)?;
	}
	Ok(())
}
