//! The external config loader: parses the proxy's TOML config
//! file into the list of [`proxy_core::ServerConfig`] values the core
//! expects to already have, plus the transport-connection details
//! (`cmd`/`args` or `host`/`port`) that live one layer above the core's
//! contract — process supervision/restart and the child-process / TCP
//! transport plumbing are out of the core's scope.
//!
//! Load-then-validate shape, TOML array-of-tables for the server list.

mod error;

use std::path::Path;

use proxy_core::ServerConfig;
use serde::Deserialize;
use serde_json::Value;

pub use error::{Error, Result};

/// Where a server is reached: either a spawned child process or a TCP
/// client socket. The core never sees this — only `proxy-transport`
/// and `main.rs` do.
#[derive(Debug, Clone, PartialEq)]
pub enum TransportSpec {
	Process { command: String, args: Vec<String> },
	Tcp { host: String, port: u16 },
}

/// One `[[server]]` table, fully validated: a connection spec plus the
/// core's `ServerConfig`.
#[derive(Debug, Clone)]
pub struct ServerSpec {
	pub transport: TransportSpec,
	pub config: ServerConfig,
}

/// The parsed, validated config file: an ordered list of servers, first
/// entry primary: the first server in the list is the primary server.
#[derive(Debug, Clone)]
pub struct ProxyConfig {
	pub servers: Vec<ServerSpec>,
}

impl ProxyConfig {
	pub fn load(path: impl AsRef<Path>) -> Result<Self> {
		let path = path.as_ref();
		let text = std::fs::read_to_string(path).map_err(|source| Error::Io { path: path.to_path_buf(), source })?;
		let raw: RawConfig = toml::from_str(&text).map_err(|source| Error::Parse { path: path.to_path_buf(), source })?;
		Self::from_raw(raw)
	}

	fn from_raw(raw: RawConfig) -> Result<Self> {
		if raw.server.is_empty() {
			return Err(Error::NoServers);
		}

		let mut servers = Vec::with_capacity(raw.server.len());
		for (index, entry) in raw.server.into_iter().enumerate() {
			let is_primary = index == 0;
			let name = entry.display_name(index);

			if entry.primary == Some(true) && !is_primary {
				return Err(Error::ExplicitPrimaryNotFirst { index, name });
			}

			let transport = entry.transport(index, &name)?;

			let config = ServerConfig {
				display_name: name,
				is_primary,
				use_diagnostics: entry.use_diagnostics,
				use_formatting: entry.use_formatting,
				use_completion: entry.use_completion,
				use_signature: entry.use_signature_help,
				use_execute_command: entry.use_execute_command,
				initialization_options: entry.initialization_options,
			};

			servers.push(ServerSpec { transport, config });
		}

		Ok(ProxyConfig { servers })
	}
}

#[derive(Debug, Deserialize)]
struct RawConfig {
	#[serde(rename = "server", default)]
	server: Vec<RawServer>,
}

#[derive(Debug, Deserialize)]
struct RawServer {
	name: Option<String>,
	cmd: Option<String>,
	#[serde(default)]
	args: Vec<String>,
	host: Option<String>,
	port: Option<u16>,
	#[serde(default)]
	primary: Option<bool>,
	#[serde(default)]
	initialization_options: Option<Value>,
	#[serde(default = "default_true")]
	use_diagnostics: bool,
	#[serde(default)]
	use_formatting: bool,
	#[serde(default)]
	use_completion: bool,
	#[serde(default)]
	use_signature_help: bool,
	#[serde(default)]
	use_execute_command: bool,
}

fn default_true() -> bool {
	true
}

impl RawServer {
	fn display_name(&self, index: usize) -> String {
		if let Some(name) = &self.name {
			return name.clone();
		}
		if let Some(cmd) = &self.cmd {
			return cmd.clone();
		}
		if let (Some(host), Some(port)) = (&self.host, &self.port) {
			return format!("{host}:{port}");
		}
		format!("server#{index}")
	}

	fn transport(&self, index: usize, name: &str) -> Result<TransportSpec> {
		let has_cmd = self.cmd.is_some();
		let has_host = self.host.is_some();
		let has_port = self.port.is_some();

		match (has_cmd, has_host, has_port) {
			(true, false, false) => Ok(TransportSpec::Process { command: self.cmd.clone().expect("checked above"), args: self.args.clone() }),
			(false, true, true) => {
				Ok(TransportSpec::Tcp { host: self.host.clone().expect("checked above"), port: self.port.expect("checked above") })
			}
			(false, true, false) | (false, false, true) => Err(Error::IncompleteTcpAddress { index, name: name.to_string() }),
			_ => Err(Error::AmbiguousTransport { index, name: name.to_string() }),
		}
	}
}
