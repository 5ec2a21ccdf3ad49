use std::io;

/// Errors surfaced by [`crate::Framer`].
///
/// A truncated header, a missing/invalid `Content-Length`, a short body, and
/// invalid JSON are all recoverable per-message conditions — `Framer::read_message`
/// logs them itself and yields `Ok(None)` rather than constructing a variant
/// here, so the caller can keep reading the stream. Only a genuine I/O error
/// and an encode failure are fatal enough to propagate as `Err`.
#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("io error: {0}")]
	Io(#[from] io::Error),

	#[error("failed to encode message: {0}")]
	Encode(#[source] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
