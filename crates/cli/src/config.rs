//! Persistent CLI settings.
//!
//! A single JSON file at `<config dir>/lcu/config.json`. Every field is
//! optional in the file; command line flags override file values per run.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use lcu::OrchestratorConfig;
use lcu_runtime::process::{DEFAULT_POLL_INTERVAL, DEFAULT_PROCESS_NAME, UX_PROCESS_NAME};
use lcu_runtime::{ChainResolver, TransportSecurity};
use serde::{Deserialize, Serialize};
use url::Url;

use crate::cli::{Overrides, TlsArg};
use crate::error::{CliError, Result};

const CONFIG_DIR: &str = "lcu";
const CONFIG_FILE: &str = "config.json";

/// Transport security as stored in the config file.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TlsMode {
	#[default]
	Insecure,
	Pinned,
	Plain,
}

impl From<TlsArg> for TlsMode {
	fn from(arg: TlsArg) -> Self {
		match arg {
			TlsArg::Insecure => Self::Insecure,
			TlsArg::Pinned => Self::Pinned,
			TlsArg::Plain => Self::Plain,
		}
	}
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CliConfig {
	pub process_name: String,
	pub ux_process_name: String,
	pub install_dir: Option<PathBuf>,
	pub tls: TlsMode,
	/// PEM root for [`TlsMode::Pinned`].
	pub root_cert: Option<PathBuf>,
	/// Lobby server base URL. Absent disables the lobby transport.
	pub lobby_server: Option<String>,
	pub poll_interval_ms: u64,
	pub grace_period_ms: u64,
	pub auto_accept: bool,
	pub reconnect_on_close: bool,
}

impl Default for CliConfig {
	fn default() -> Self {
		let orchestrator = OrchestratorConfig::default();
		Self {
			process_name: DEFAULT_PROCESS_NAME.to_string(),
			ux_process_name: UX_PROCESS_NAME.to_string(),
			install_dir: None,
			tls: TlsMode::default(),
			root_cert: None,
			lobby_server: None,
			poll_interval_ms: DEFAULT_POLL_INTERVAL.as_millis() as u64,
			grace_period_ms: orchestrator.grace_period.as_millis() as u64,
			auto_accept: false,
			reconnect_on_close: orchestrator.reconnect_on_close,
		}
	}
}

/// `<config dir>/lcu/config.json`, if the platform has a config directory.
pub fn default_path() -> Option<PathBuf> {
	dirs::config_dir().map(|dir| dir.join(CONFIG_DIR).join(CONFIG_FILE))
}

impl CliConfig {
	/// Reads `path`. A missing file yields the defaults; an unreadable or malformed one is an error.
	pub fn load(path: &Path) -> Result<Self> {
		let content = match fs::read_to_string(path) {
			Ok(content) => content,
			Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
				tracing::debug!(target = "lcu.cli", path = %path.display(), "no config file, using defaults");
				return Ok(Self::default());
			}
			Err(source) => {
				return Err(CliError::ReadConfig {
					path: path.to_path_buf(),
					source,
				});
			}
		};
		let config: Self = serde_json::from_str(&content).map_err(|source| CliError::ParseConfig {
			path: path.to_path_buf(),
			source,
		})?;
		config.validate()?;
		Ok(config)
	}

	/// Rejects values the orchestrator cannot run with.
	pub fn validate(&self) -> Result<()> {
		if self.poll_interval_ms == 0 {
			return Err(CliError::InvalidSetting {
				field: "pollIntervalMs",
				reason: "must be at least 1",
			});
		}
		Ok(())
	}

	/// Loads the explicit path, or the default location when `None`.
	pub fn load_from(path: Option<&Path>) -> Result<Self> {
		match path.map(Path::to_path_buf).or_else(default_path) {
			Some(path) => Self::load(&path),
			None => Ok(Self::default()),
		}
	}

	/// Writes the config as pretty JSON, creating parent directories.
	pub fn save(&self, path: &Path) -> Result<()> {
		if let Some(parent) = path.parent() {
			fs::create_dir_all(parent)?;
		}
		fs::write(path, serde_json::to_string_pretty(self)?)?;
		Ok(())
	}

	pub fn apply(&mut self, overrides: &Overrides) {
		if let Some(name) = &overrides.process_name {
			self.process_name = name.clone();
		}
		if let Some(name) = &overrides.ux_process_name {
			self.ux_process_name = name.clone();
		}
		if let Some(dir) = &overrides.install_dir {
			self.install_dir = Some(dir.clone());
		}
		if let Some(cert) = &overrides.root_cert {
			self.root_cert = Some(cert.clone());
			self.tls = TlsMode::Pinned;
		}
		if let Some(tls) = overrides.tls {
			self.tls = tls.into();
		}
		if let Some(url) = &overrides.lobby_server {
			self.lobby_server = Some(url.clone());
		}
		if let Some(ms) = overrides.poll_interval_ms {
			self.poll_interval_ms = ms;
		}
		if let Some(ms) = overrides.grace_period_ms {
			self.grace_period_ms = ms;
		}
		if overrides.auto_accept {
			self.auto_accept = true;
		}
		if overrides.no_reconnect {
			self.reconnect_on_close = false;
		}
	}

	pub fn poll_interval(&self) -> Duration {
		Duration::from_millis(self.poll_interval_ms)
	}

	pub fn security(&self) -> Result<TransportSecurity> {
		match self.tls {
			TlsMode::Insecure => Ok(TransportSecurity::Insecure),
			TlsMode::Plain => Ok(TransportSecurity::Plain),
			TlsMode::Pinned => {
				let cert = self.root_cert.as_deref().ok_or(CliError::MissingRootCert)?;
				Ok(TransportSecurity::pinned_from_file(cert)?)
			}
		}
	}

	pub fn lobby_url(&self) -> Result<Option<Url>> {
		self.lobby_server
			.as_deref()
			.map(|raw| {
				Url::parse(raw).map_err(|source| CliError::LobbyUrl {
					url: raw.to_string(),
					source,
				})
			})
			.transpose()
	}

	/// UX command line first, then the lockfile.
	pub fn resolver(&self) -> Result<Arc<ChainResolver>> {
		Ok(Arc::new(ChainResolver::standard(
			self.ux_process_name.clone(),
			self.install_dir.as_deref(),
			self.security()?,
		)))
	}

	pub fn orchestrator_config(&self) -> OrchestratorConfig {
		OrchestratorConfig::default()
			.with_process_name(self.process_name.clone())
			.with_poll_interval(self.poll_interval())
			.with_grace_period(Duration::from_millis(self.grace_period_ms))
			.with_reconnect_on_close(self.reconnect_on_close)
	}
}

#[cfg(test)]
mod tests {
	use tempfile::TempDir;

	use super::*;

	#[test]
	fn missing_file_gives_defaults() {
		let dir = TempDir::new().unwrap();
		let config = CliConfig::load(&dir.path().join("config.json")).unwrap();
		assert_eq!(config, CliConfig::default());
		assert_eq!(config.poll_interval_ms, 4000);
		assert_eq!(config.grace_period_ms, 1500);
		assert!(config.reconnect_on_close);
		assert!(!config.auto_accept);
	}

	#[test]
	fn partial_file_keeps_other_defaults() {
		let dir = TempDir::new().unwrap();
		let path = dir.path().join("config.json");
		fs::write(
			&path,
			r#"{"installDir": "/games/league", "tls": "plain", "lobbyServer": "http://localhost:3000", "autoAccept": true}"#,
		)
		.unwrap();

		let config = CliConfig::load(&path).unwrap();
		assert_eq!(config.install_dir, Some(PathBuf::from("/games/league")));
		assert_eq!(config.tls, TlsMode::Plain);
		assert!(config.auto_accept);
		assert_eq!(config.process_name, DEFAULT_PROCESS_NAME);
		assert_eq!(
			config.lobby_url().unwrap().map(|u| u.to_string()),
			Some("http://localhost:3000/".to_string())
		);
		assert_eq!(config.security().unwrap(), TransportSecurity::Plain);
	}

	#[test]
	fn malformed_file_is_an_error() {
		let dir = TempDir::new().unwrap();
		let path = dir.path().join("config.json");
		fs::write(&path, "{ not json").unwrap();

		assert!(matches!(CliConfig::load(&path), Err(CliError::ParseConfig { .. })));
	}

	#[test]
	fn zero_poll_interval_in_file_is_rejected() {
		let dir = TempDir::new().unwrap();
		let path = dir.path().join("config.json");
		fs::write(&path, r#"{"pollIntervalMs": 0}"#).unwrap();

		assert!(matches!(
			CliConfig::load(&path),
			Err(CliError::InvalidSetting {
				field: "pollIntervalMs",
				..
			})
		));
		let config = CliConfig {
			poll_interval_ms: 0,
			..CliConfig::default()
		};
		assert!(config.validate().is_err());
		assert!(CliConfig::default().validate().is_ok());
	}

	#[test]
	fn save_then_load_creates_directories() {
		let dir = TempDir::new().unwrap();
		let path = dir.path().join("nested/lcu/config.json");
		let config = CliConfig {
			grace_period_ms: 250,
			reconnect_on_close: false,
			..CliConfig::default()
		};

		config.save(&path).unwrap();
		assert_eq!(CliConfig::load(&path).unwrap(), config);
	}

	#[test]
	fn overrides_win_over_file_values() {
		let mut config = CliConfig {
			tls: TlsMode::Plain,
			auto_accept: false,
			..CliConfig::default()
		};
		config.apply(&Overrides {
			process_name: Some("Client".into()),
			root_cert: Some(PathBuf::from("/certs/riot.pem")),
			poll_interval_ms: Some(500),
			auto_accept: true,
			no_reconnect: true,
			..Overrides::default()
		});

		assert_eq!(config.process_name, "Client");
		assert_eq!(config.tls, TlsMode::Pinned);
		assert_eq!(config.root_cert, Some(PathBuf::from("/certs/riot.pem")));
		assert_eq!(config.poll_interval(), Duration::from_millis(500));
		assert!(config.auto_accept);
		assert!(!config.reconnect_on_close);

		let orchestrator = config.orchestrator_config();
		assert_eq!(orchestrator.process_name, "Client");
		assert_eq!(orchestrator.poll_interval, Duration::from_millis(500));
		assert!(!orchestrator.reconnect_on_close);
	}

	#[test]
	fn pinned_without_certificate_is_rejected() {
		let config = CliConfig {
			tls: TlsMode::Pinned,
			..CliConfig::default()
		};
		assert!(matches!(config.security(), Err(CliError::MissingRootCert)));
		assert!(config.resolver().is_err());
	}

	#[test]
	fn bad_lobby_url_is_rejected() {
		let config = CliConfig {
			lobby_server: Some("not a url".into()),
			..CliConfig::default()
		};
		assert!(matches!(config.lobby_url(), Err(CliError::LobbyUrl { .. })));
	}
}
