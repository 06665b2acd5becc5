//! Session credential discovery.
//!
//! The client writes fresh auth material on every launch, so nothing here
//! caches: each [`CredentialResolver::resolve`] call reads the sources again.
//! Sources are tried in order by [`ChainResolver`]; the first one that
//! produces credentials wins.

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use futures_util::future::BoxFuture;
use tracing::debug;

use crate::error::{Error, Result};
use crate::process::{SystemProbe, UX_PROCESS_NAME};
use crate::tls::TransportSecurity;

/// User name the client expects for Basic auth.
pub const AUTH_USERNAME: &str = "riot";

/// Loopback host the Client API listens on.
pub const LOOPBACK_HOST: &str = "127.0.0.1";

/// File name of the session lockfile inside the install directory.
pub const LOCKFILE_NAME: &str = "lockfile";

/// Per-session auth material for the Client API.
///
/// Captured once per connect cycle and never mutated. `Debug` redacts the token.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
	pub host: String,
	pub port: u16,
	pub username: String,
	pub token: String,
	pub security: TransportSecurity,
	pub pid: Option<u32>,
	pub install_dir: Option<PathBuf>,
}

impl fmt::Debug for Credentials {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("Credentials")
			.field("host", &self.host)
			.field("port", &self.port)
			.field("username", &self.username)
			.field("token", &"<redacted>")
			.field("security", &self.security)
			.field("pid", &self.pid)
			.field("install_dir", &self.install_dir)
			.finish()
	}
}

impl Credentials {
	pub fn new(port: u16, token: impl Into<String>) -> Self {
		Self {
			host: LOOPBACK_HOST.to_string(),
			port,
			username: AUTH_USERNAME.to_string(),
			token: token.into(),
			security: TransportSecurity::default(),
			pid: None,
			install_dir: None,
		}
	}

	pub fn with_security(mut self, security: TransportSecurity) -> Self {
		self.security = security;
		self
	}

	/// `wss://127.0.0.1:<port>` (or `ws://` in plain mode).
	pub fn ws_url(&self) -> String {
		format!("{}://{}:{}", self.security.ws_scheme(), self.host, self.port)
	}

	/// Base for REST calls, without a trailing slash.
	pub fn http_base(&self) -> String {
		format!("{}://{}:{}", self.security.http_scheme(), self.host, self.port)
	}

	/// `Basic base64(username:token)`.
	pub fn basic_auth_header(&self) -> String {
		let raw = format!("{}:{}", self.username, self.token);
		format!("Basic {}", STANDARD.encode(raw))
	}
}

/// A source of session credentials.
pub trait CredentialResolver: Send + Sync {
	/// Short label used in logs and in aggregated failure messages.
	fn name(&self) -> &str;

	fn resolve(&self) -> BoxFuture<'_, Result<Credentials>>;
}

/// Extracts credentials from the UX process's argument vector.
pub fn parse_command_line<S: AsRef<str>>(args: &[S]) -> Result<Credentials> {
	let mut port = None;
	let mut token = None;
	let mut pid = None;
	let mut install_dir = None;

	for arg in args {
		let arg = arg.as_ref().trim_matches('"');
		let Some((key, value)) = arg.split_once('=') else {
			continue;
		};
		let value = value.trim_matches('"');
		match key {
			"--app-port" => port = value.parse::<u16>().ok(),
			"--remoting-auth-token" => token = Some(value.to_string()),
			"--app-pid" => pid = value.parse::<u32>().ok(),
			"--install-directory" => install_dir = Some(PathBuf::from(value)),
			_ => {}
		}
	}

	let port = port.ok_or_else(|| Error::CredentialsUnavailable("command line has no valid --app-port".into()))?;
	let token = token
		.filter(|t| !t.is_empty())
		.ok_or_else(|| Error::CredentialsUnavailable("command line has no --remoting-auth-token".into()))?;

	let mut creds = Credentials::new(port, token);
	creds.pid = pid;
	creds.install_dir = install_dir;
	Ok(creds)
}

/// Parses `name:pid:port:password:protocol`.
pub fn parse_lockfile(contents: &str) -> Result<Credentials> {
	let fields: Vec<&str> = contents.trim().split(':').collect();
	let [_name, pid, port, password, protocol] = fields.as_slice() else {
		return Err(Error::CredentialsUnavailable(format!(
			"lockfile has {} fields, expected 5",
			fields.len()
		)));
	};

	let port = port
		.parse::<u16>()
		.map_err(|_| Error::CredentialsUnavailable(format!("lockfile port {port:?} is not a number")))?;
	if password.is_empty() {
		return Err(Error::CredentialsUnavailable("lockfile password is empty".into()));
	}
	let security = match *protocol {
		"https" => TransportSecurity::Insecure,
		"http" => TransportSecurity::Plain,
		other => {
			return Err(Error::CredentialsUnavailable(format!(
				"lockfile protocol {other:?} is not supported"
			)));
		}
	};

	let mut creds = Credentials::new(port, *password).with_security(security);
	creds.pid = pid.parse().ok();
	Ok(creds)
}

/// Reads the running UX process's command line.
#[derive(Debug, Clone)]
pub struct CommandLineResolver {
	process_name: String,
	security: TransportSecurity,
}

impl Default for CommandLineResolver {
	fn default() -> Self {
		Self::new(UX_PROCESS_NAME, TransportSecurity::default())
	}
}

impl CommandLineResolver {
	pub fn new(process_name: impl Into<String>, security: TransportSecurity) -> Self {
		Self {
			process_name: process_name.into(),
			security,
		}
	}
}

impl CredentialResolver for CommandLineResolver {
	fn name(&self) -> &str {
		"command line"
	}

	fn resolve(&self) -> BoxFuture<'_, Result<Credentials>> {
		Box::pin(async move {
			let args = SystemProbe
				.command_line(&self.process_name)
				.await
				.map_err(|e| Error::CredentialsUnavailable(e.to_string()))?
				.ok_or_else(|| {
					Error::CredentialsUnavailable(format!("{} is not running", self.process_name))
				})?;
			Ok(parse_command_line(&args)?.with_security(self.security.clone()))
		})
	}
}

/// Reads the lockfile from the first candidate path that exists.
#[derive(Debug, Clone)]
pub struct LockfileResolver {
	candidates: Vec<PathBuf>,
	security: Option<TransportSecurity>,
}

impl LockfileResolver {
	pub fn new(candidates: Vec<PathBuf>) -> Self {
		Self {
			candidates,
			security: None,
		}
	}

	/// Lockfile inside a known install directory.
	pub fn in_install_dir(dir: impl AsRef<Path>) -> Self {
		Self::new(vec![dir.as_ref().join(LOCKFILE_NAME)])
	}

	/// Default install locations for this platform.
	pub fn default_locations() -> Self {
		Self::new(default_install_dirs().into_iter().map(|d| d.join(LOCKFILE_NAME)).collect())
	}

	/// Overrides the lockfile's `protocol` field for TLS handling, e.g. to pin a root.
	/// Plain-HTTP lockfiles keep plain transport.
	pub fn with_security(mut self, security: TransportSecurity) -> Self {
		self.security = Some(security);
		self
	}

	pub fn candidates(&self) -> &[PathBuf] {
		&self.candidates
	}
}

fn default_install_dirs() -> Vec<PathBuf> {
	if cfg!(windows) {
		vec![PathBuf::from(r"C:\Riot Games\League of Legends")]
	} else if cfg!(target_os = "macos") {
		vec![PathBuf::from("/Applications/League of Legends.app/Contents/LoL")]
	} else {
		Vec::new()
	}
}

impl CredentialResolver for LockfileResolver {
	fn name(&self) -> &str {
		"lockfile"
	}

	fn resolve(&self) -> BoxFuture<'_, Result<Credentials>> {
		Box::pin(async move {
			for path in &self.candidates {
				let contents = match tokio::fs::read_to_string(path).await {
					Ok(contents) => contents,
					Err(e) if e.kind() == std::io::ErrorKind::NotFound => continue,
					Err(e) => {
						return Err(Error::CredentialsUnavailable(format!(
							"cannot read {}: {e}",
							path.display()
						)));
					}
				};
				let mut creds = parse_lockfile(&contents)?;
				if let Some(security) = &self.security {
					if creds.security.is_tls() {
						creds.security = security.clone();
					}
				}
				creds.install_dir = path.parent().map(Path::to_path_buf);
				debug!(target = "lcu.runtime", path = %path.display(), port = creds.port, "read lockfile");
				return Ok(creds);
			}
			Err(Error::CredentialsUnavailable(if self.candidates.is_empty() {
				"no lockfile location configured".to_string()
			} else {
				"no lockfile found".to_string()
			}))
		})
	}
}

/// Always yields the same credentials. For tests and explicit overrides.
#[derive(Debug, Clone)]
pub struct StaticResolver(pub Credentials);

impl CredentialResolver for StaticResolver {
	fn name(&self) -> &str {
		"static"
	}

	fn resolve(&self) -> BoxFuture<'_, Result<Credentials>> {
		let creds = self.0.clone();
		Box::pin(async move { Ok(creds) })
	}
}

/// Ordered fallback over several resolvers.
#[derive(Clone, Default)]
pub struct ChainResolver {
	sources: Vec<Arc<dyn CredentialResolver>>,
}

impl fmt::Debug for ChainResolver {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_list().entries(self.sources.iter().map(|s| s.name())).finish()
	}
}

impl ChainResolver {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn with(mut self, source: impl CredentialResolver + 'static) -> Self {
		self.sources.push(Arc::new(source));
		self
	}

	/// Command line of `ux_process_name` first, then the lockfile in `install_dir`
	/// (or the platform default).
	pub fn standard(ux_process_name: impl Into<String>, install_dir: Option<&Path>, security: TransportSecurity) -> Self {
		let lockfile = match install_dir {
			Some(dir) => LockfileResolver::in_install_dir(dir),
			None => LockfileResolver::default_locations(),
		};
		Self::new()
			.with(CommandLineResolver::new(ux_process_name, security.clone()))
			.with(lockfile.with_security(security))
	}
}

impl CredentialResolver for ChainResolver {
	fn name(&self) -> &str {
		"chain"
	}

	fn resolve(&self) -> BoxFuture<'_, Result<Credentials>> {
		Box::pin(async move {
			let mut reasons = Vec::with_capacity(self.sources.len());
			for source in &self.sources {
				match source.resolve().await {
					Ok(creds) => {
						debug!(target = "lcu.runtime", source = source.name(), port = creds.port, "resolved credentials");
						return Ok(creds);
					}
					Err(e) => {
						debug!(target = "lcu.runtime", source = source.name(), error = %e, "credential source failed");
						reasons.push(format!("{}: {e}", source.name()));
					}
				}
			}
			if reasons.is_empty() {
				reasons.push("no credential sources configured".to_string());
			}
			Err(Error::CredentialsUnavailable(reasons.join("; ")))
		})
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn parses_ux_command_line() {
		let args = [
			r"C:\Riot Games\League of Legends\LeagueClientUx.exe",
			"--riotclient-auth-token=abc",
			"--app-port=54321",
			"--remoting-auth-token=s3cret",
			"--app-pid=4242",
			r#""--install-directory=C:\Riot Games\League of Legends""#,
		];
		let creds = parse_command_line(&args).unwrap();
		assert_eq!(creds.port, 54321);
		assert_eq!(creds.token, "s3cret");
		assert_eq!(creds.pid, Some(4242));
		assert_eq!(creds.install_dir, Some(PathBuf::from(r"C:\Riot Games\League of Legends")));
		assert_eq!(creds.ws_url(), "wss://127.0.0.1:54321");
	}

	#[test]
	fn command_line_without_port_is_unavailable() {
		let err = parse_command_line(&["--remoting-auth-token=x"]).unwrap_err();
		assert!(matches!(err, Error::CredentialsUnavailable(_)));
	}

	#[test]
	fn parses_lockfile() {
		let creds = parse_lockfile("LeagueClient:1234:50000:hunter2:https\n").unwrap();
		assert_eq!(creds.port, 50000);
		assert_eq!(creds.token, "hunter2");
		assert_eq!(creds.pid, Some(1234));
		assert_eq!(creds.security, TransportSecurity::Insecure);
		assert_eq!(creds.http_base(), "https://127.0.0.1:50000");
	}

	#[test]
	fn rejects_malformed_lockfiles() {
		for bad in ["", "LeagueClient:1:2:3", "LeagueClient:1:port:pw:https", "LeagueClient:1:2::https", "a:1:2:pw:ftp"] {
			assert!(
				matches!(parse_lockfile(bad), Err(Error::CredentialsUnavailable(_))),
				"{bad:?} should be rejected"
			);
		}
	}

	#[test]
	fn basic_auth_uses_riot_user() {
		let creds = Credentials::new(1, "token");
		// base64("riot:token")
		assert_eq!(creds.basic_auth_header(), "Basic cmlvdDp0b2tlbg==");
	}

	#[test]
	fn debug_redacts_token() {
		let rendered = format!("{:?}", Credentials::new(1, "very-secret"));
		assert!(!rendered.contains("very-secret"));
		assert!(rendered.contains("<redacted>"));
	}

	#[tokio::test]
	async fn lockfile_resolver_reads_install_dir() {
		let dir = tempfile::tempdir().unwrap();
		std::fs::write(dir.path().join(LOCKFILE_NAME), "LeagueClient:7:61000:pw:https").unwrap();

		let creds = LockfileResolver::in_install_dir(dir.path()).resolve().await.unwrap();
		assert_eq!(creds.port, 61000);
		assert_eq!(creds.install_dir.as_deref(), Some(dir.path()));
	}

	#[tokio::test]
	async fn lockfile_resolver_rereads_every_call() {
		let dir = tempfile::tempdir().unwrap();
		let path = dir.path().join(LOCKFILE_NAME);
		let resolver = LockfileResolver::in_install_dir(dir.path());

		std::fs::write(&path, "LeagueClient:7:61000:first:https").unwrap();
		assert_eq!(resolver.resolve().await.unwrap().token, "first");

		std::fs::write(&path, "LeagueClient:8:61001:second:https").unwrap();
		let creds = resolver.resolve().await.unwrap();
		assert_eq!(creds.token, "second");
		assert_eq!(creds.port, 61001);
	}

	#[tokio::test]
	async fn chain_falls_through_and_reports_every_reason() {
		let empty = tempfile::tempdir().unwrap();
		let chain = ChainResolver::new()
			.with(LockfileResolver::in_install_dir(empty.path()))
			.with(LockfileResolver::new(Vec::new()));

		let err = chain.resolve().await.unwrap_err();
		let Error::CredentialsUnavailable(reason) = err else {
			panic!("unexpected error: {err:?}");
		};
		assert!(reason.contains("no lockfile found"));
		assert!(reason.contains("no lockfile location configured"));
	}

	#[tokio::test]
	async fn chain_returns_first_success() {
		let creds = Credentials::new(9, "t").with_security(TransportSecurity::Plain);
		let chain = ChainResolver::new()
			.with(LockfileResolver::new(Vec::new()))
			.with(StaticResolver(creds.clone()));
		assert_eq!(chain.resolve().await.unwrap(), creds);
	}

	#[tokio::test]
	async fn standard_chain_falls_back_to_install_dir_lockfile() {
		let dir = tempfile::tempdir().unwrap();
		std::fs::write(dir.path().join(LOCKFILE_NAME), "LeagueClient:7:61000:secret:https").unwrap();
		let chain = ChainResolver::standard("NoSuchUxProcess-7f3a", Some(dir.path()), TransportSecurity::Plain);

		assert_eq!(format!("{chain:?}"), r#"["command line", "lockfile"]"#);
		let creds = chain.resolve().await.unwrap();
		assert_eq!(creds.port, 61000);
		assert_eq!(creds.token, "secret");
		assert_eq!(creds.security, TransportSecurity::Plain);
	}
}
