use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};


#[derive(Parser, Debug)]
#[command(name = "lcu")]
#[command(about = "League client connection companion - streams connection and game events as NDJSON")]
#[command(version)]
pub struct Cli {
	/// Increase verbosity (-v info, -vv debug)
	#[arg(short, long, global = true, action = clap::ArgAction::Count)]
	pub verbose: u8,

	/// Config file [default: <config dir>/lcu/config.json]
	#[arg(short, long, global = true, value_name = "FILE")]
	pub config: Option<PathBuf>,

	#[command(flatten)]
	pub overrides: Overrides,

	#[command(subcommand)]
	pub command: Option<Commands>,
}

impl Cli {
	/// The requested subcommand, `run` when none was given.
	pub fn subcommand(&self) -> Commands {
		self.command.clone().unwrap_or(Commands::Run(RunArgs::default()))
	}
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Commands {
	/// Watch the client and stream UI events until Ctrl-C (default)
	Run(RunArgs),
	/// Check once whether the client process is running
	Probe,
	/// Resolve the current session credentials once (token redacted)
	Credentials,
	/// Write the effective settings to the config file
	Init(InitArgs),
}

#[derive(Args, Debug, Clone, Default, PartialEq, Eq)]
pub struct RunArgs {
	/// Wait one poll interval before the first process check
	#[arg(long)]
	pub wait: bool,
}

#[derive(Args, Debug, Clone, Default, PartialEq, Eq)]
pub struct InitArgs {
	/// Replace an existing config file
	#[arg(long)]
	pub force: bool,
}

/// Transport security for the client API.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum TlsArg {
	/// Accept the client's self-signed certificate
	Insecure,
	/// Verify against --root-cert
	Pinned,
	/// Plain ws:// and http://
	Plain,
}

/// Per-invocation overrides of config file values.
#[derive(Args, Debug, Clone, Default, PartialEq, Eq)]
pub struct Overrides {
	/// Client executable to watch
	#[arg(long, global = true, value_name = "NAME")]
	pub process_name: Option<String>,

	/// UX process whose command line carries the session credentials
	#[arg(long, global = true, value_name = "NAME")]
	pub ux_process_name: Option<String>,

	/// Client install directory holding the lockfile
	#[arg(long, global = true, value_name = "DIR")]
	pub install_dir: Option<PathBuf>,

	/// Transport security mode
	#[arg(long, global = true, value_enum)]
	pub tls: Option<TlsArg>,

	/// PEM root certificate; implies --tls pinned
	#[arg(long, global = true, value_name = "FILE")]
	pub root_cert: Option<PathBuf>,

	/// Lobby server base URL; enables the lobby transport
	#[arg(long, global = true, value_name = "URL")]
	pub lobby_server: Option<String>,

	/// Process table polling interval in milliseconds
	#[arg(long, global = true, value_name = "MS", value_parser = clap::value_parser!(u64).range(1..))]
	pub poll_interval_ms: Option<u64>,

	/// Delay after the client starts before connecting, in milliseconds
	#[arg(long, global = true, value_name = "MS")]
	pub grace_period_ms: Option<u64>,

	/// Accept ready checks automatically
	#[arg(long, global = true)]
	pub auto_accept: bool,

	/// Do not reconnect after a transport closes
	#[arg(long, global = true)]
	pub no_reconnect: bool,
}
