use async_trait::async_trait;
use proxy_rpc::Message;
use std::fmt;

use crate::Result;

/// Index into the configured server list, stable for the life of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ServerId(pub usize);

impl fmt::Display for ServerId {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "server#{}", self.0)
	}
}

/// Read half of a connected transport.
///
/// Owned exclusively by the background task that pumps it into the
/// Dispatcher's [`proxy_worker::TaskPump`] — never touched from the
/// Dispatcher's own context, so this trait need not be `Sync`.
#[async_trait]
pub trait MessageSource: Send {
	/// Reads the next decoded message. `Ok(None)` means the stream ended
	/// (caller should check [`MessageSource::at_end_of_input`] to
	/// distinguish that from "try again" — a Framer discarding a malformed
	/// frame also yields `Ok(None)` without the stream having closed).
	async fn recv(&mut self) -> Result<Option<Message>>;

	/// True once the underlying stream has reached a clean end-of-input.
	fn at_end_of_input(&self) -> bool;
}

/// Write half of a connected transport.
#[async_trait]
pub trait MessageSink: Send {
	async fn send(&mut self, message: &Message) -> Result<()>;
}

/// A byte-stream endpoint: child-process stdio or TCP socket.
///
/// Expressed as a capability set rather than an inheritance hierarchy.
/// `connect` hands back
/// independently-ownable read/write halves rather than exposing both
/// through one object, because the Dispatcher needs to give the read half
/// to a detached background task while it keeps the write half for itself
/// (single-writer discipline).
#[async_trait]
pub trait Transport: Send {
	async fn connect(&mut self) -> Result<(Box<dyn MessageSource>, Box<dyn MessageSink>)>;

	fn is_connected(&self) -> bool;

	/// Best-effort termination: process kill or socket shutdown.
	async fn disconnect(&mut self);

	/// Resolves once the transport has fully closed (process exit, socket
	/// close).
	async fn wait_for_completion(&mut self);

	fn display_name(&self) -> &str;
}
