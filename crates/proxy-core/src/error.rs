use thiserror::Error;

/// Errors surfaced by the proxy engine itself, as distinct from transport or
/// configuration errors — those are surfaced by the external loader and by
/// transport-open failures, both outside `proxy-core`'s contract. This
/// enum only covers what the core owns: wire decoding and the two
/// structural invariants that at least one server is configured, and at
/// most one server has `is_primary == true`.
#[derive(Debug, Error)]
pub enum Error {
	#[error("no servers configured")]
	NoServers,

	#[error("more than one server marked primary")]
	MultiplePrimary,

	#[error("transport {name:?} failed to connect")]
	Connect {
		name: String,
		#[source]
		source: std::io::Error,
	},

	#[error(transparent)]
	Rpc(#[from] proxy_rpc::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
