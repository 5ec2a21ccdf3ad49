use std::path::PathBuf;

use thiserror::Error;

/// Configuration errors, surfaced by the external loader before the core is
/// ever reached. `main.rs` maps every variant to an exit-code-1 failure.
#[derive(Debug, Error)]
pub enum Error {
	#[error("failed to read config file {path}: {source}")]
	Io {
		path: PathBuf,
		#[source]
		source: std::io::Error,
	},

	#[error("failed to parse {path} as TOML: {source}")]
	Parse {
		path: PathBuf,
		#[source]
		source: toml::de::Error,
	},

	#[error("config must declare at least one [[server]]")]
	NoServers,

	#[error("server #{index} ({name}) must set exactly one of `cmd` or `host`+`port`, not both or neither")]
	AmbiguousTransport { index: usize, name: String },

	#[error("server #{index} ({name}) sets `host` without `port`, or `port` without `host`")]
	IncompleteTcpAddress { index: usize, name: String },

	#[error("server #{index} ({name}) sets `primary = true`, but only the first [[server]] table may be primary")]
	ExplicitPrimaryNotFirst { index: usize, name: String },
}

pub type Result<T> = std::result::Result<T, Error>;
