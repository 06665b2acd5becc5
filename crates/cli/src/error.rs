use std::path::PathBuf;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, CliError>;

#[derive(Debug, Error)]
pub enum CliError {
	#[error("failed to read config {}: {}", .path.display(), .source)]
	ReadConfig {
		path: PathBuf,
		#[source]
		source: std::io::Error,
	},

	#[error("invalid config {}: {}", .path.display(), .source)]
	ParseConfig {
		path: PathBuf,
		#[source]
		source: serde_json::Error,
	},

	#[error("invalid setting `{field}`: {reason}")]
	InvalidSetting { field: &'static str, reason: &'static str },

	#[error("tls mode `pinned` needs a root certificate (`rootCert` or --root-cert)")]
	MissingRootCert,

	#[error("invalid lobby server url `{url}`: {source}")]
	LobbyUrl {
		url: String,
		#[source]
		source: url::ParseError,
	},

	#[error(transparent)]
	Lcu(#[from] lcu::Error),

	#[error(transparent)]
	Io(#[from] std::io::Error),

	#[error(transparent)]
	Json(#[from] serde_json::Error),
}
