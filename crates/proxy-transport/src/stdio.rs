use async_trait::async_trait;
use proxy_core::{Error, MessageSink, MessageSource, Result, Transport};
use proxy_rpc::{Framer, Message};
use tokio::io::{BufReader, Stdin, Stdout};

/// The proxy's own standard input/output — the half of the "single LSP
/// server" illusion the client editor talks to. Unlike [`crate::ProcessTransport`]
/// and [`crate::TcpTransport`], there is nothing to dial: the streams are
/// already open when the process starts, so `connect` only wraps them.
pub struct StdioTransport {
	connected: bool,
}

impl StdioTransport {
	pub fn new() -> Self {
		StdioTransport { connected: false }
	}
}

impl Default for StdioTransport {
	fn default() -> Self {
		Self::new()
	}
}

#[async_trait]
impl Transport for StdioTransport {
	async fn connect(&mut self) -> Result<(Box<dyn MessageSource>, Box<dyn MessageSink>)> {
		self.connected = true;
		let source: Box<dyn MessageSource> = Box::new(StdioSource { framer: Framer::new(BufReader::new(tokio::io::stdin())), eof: false });
		let sink: Box<dyn MessageSink> = Box::new(StdioSink { writer: tokio::io::stdout() });
		Ok((source, sink))
	}

	fn is_connected(&self) -> bool {
		self.connected
	}

	/// The editor owns the lifetime of its own stdio pipes; the proxy has
	/// nothing to terminate here beyond marking itself disconnected so the
	/// Dispatcher stops writing; signal-driven termination is
	/// best-effort here.
	async fn disconnect(&mut self) {
		self.connected = false;
	}

	async fn wait_for_completion(&mut self) {}

	fn display_name(&self) -> &str {
		"client (stdio)"
	}
}

struct StdioSource {
	framer: Framer<BufReader<Stdin>>,
	eof: bool,
}

#[async_trait]
impl MessageSource for StdioSource {
	async fn recv(&mut self) -> Result<Option<Message>> {
		match self.framer.read_message().await {
			Ok(Some(msg)) => Ok(Some(msg)),
			Ok(None) => {
				self.eof = self.framer.header_truncated_at_eof();
				Ok(None)
			}
			Err(err) => Err(Error::Rpc(err)),
		}
	}

	fn at_end_of_input(&self) -> bool {
		self.eof
	}
}

struct StdioSink {
	writer: Stdout,
}

#[async_trait]
impl MessageSink for StdioSink {
	async fn send(&mut self, message: &Message) -> Result<()> {
		proxy_rpc::write_message(&mut self.writer, message).await.map_err(Error::Rpc)
	}
}
