//! The few Client API calls the core itself makes.
//!
//! Everything else (match history, runes, chat) belongs to collaborators that
//! call [`Transport::request`] on [`crate::Orchestrator::client`].

use lcu_protocol::{CURRENT_SUMMONER_PATH, READY_CHECK_ACCEPT_PATH, Summoner};
use lcu_runtime::{Error, Method, Result, Transport};

/// Identity probe: succeeds only once the client is past its login sequence.
pub async fn current_summoner(client: &dyn Transport) -> Result<Summoner> {
	let response = client.request(Method::GET, CURRENT_SUMMONER_PATH, None).await?;
	let status = response.status;
	let summoner: Summoner = response.into_result()?;
	if summoner.puuid.is_empty() {
		return Err(Error::Request {
			status,
			message: "current summoner has no puuid yet".into(),
		});
	}
	Ok(summoner)
}

/// Accepts the pending ready check.
pub async fn accept_ready_check(client: &dyn Transport) -> Result<()> {
	client
		.request(Method::POST, READY_CHECK_ACCEPT_PATH, None)
		.await?
		.into_value()
		.map(drop)
}
