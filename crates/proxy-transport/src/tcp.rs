use std::io;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use async_trait::async_trait;
use proxy_core::{Error, MessageSink, MessageSource, Result, Transport};
use proxy_rpc::{Framer, Message};
use tokio::io::{AsyncRead, AsyncWrite, AsyncWriteExt, BufReader, ReadBuf};
use tokio::net::TcpStream;

/// A downstream server reached over a TCP client socket. The stream is
/// shared via `Arc` between the reader and writer
/// halves (tokio's `TcpStream` supports concurrent read/write through a
/// shared reference) so [`TcpTransport`] itself can still independently
/// shut the socket down on [`Transport::disconnect`] without fighting the
/// Dispatcher's sink/source for ownership — the TCP analogue of
/// `ProcessTransport` keeping the `Child` handle separate from the stdio
/// pipes it hands out.
pub struct TcpTransport {
	host: String,
	port: u16,
	display_name: String,
	stream: Option<Arc<TcpStream>>,
}

impl TcpTransport {
	pub fn new(host: impl Into<String>, port: u16, display_name: impl Into<String>) -> Self {
		TcpTransport { host: host.into(), port, display_name: display_name.into(), stream: None }
	}
}

#[async_trait]
impl Transport for TcpTransport {
	async fn connect(&mut self) -> Result<(Box<dyn MessageSource>, Box<dyn MessageSink>)> {
		let stream = TcpStream::connect((self.host.as_str(), self.port))
			.await
			.map_err(|source| Error::Connect { name: self.display_name.clone(), source })?;
		let stream = Arc::new(stream);
		self.stream = Some(stream.clone());

		let source: Box<dyn MessageSource> =
			Box::new(TcpSource { framer: Framer::new(BufReader::new(SharedTcpStream(stream.clone()))), eof: false });
		let sink: Box<dyn MessageSink> = Box::new(TcpSink { writer: SharedTcpStream(stream) });
		Ok((source, sink))
	}

	fn is_connected(&self) -> bool {
		self.stream.is_some()
	}

	async fn disconnect(&mut self) {
		if let Some(stream) = self.stream.take()
			&& let Err(err) = SharedTcpStream(stream).shutdown().await
		{
			tracing::warn!(server = %self.display_name, error = %err, "failed to shut down tcp socket");
		}
	}

	/// A TCP client socket has no process to wait on; closing is immediate
	/// once [`Transport::disconnect`] has shut it down.
	async fn wait_for_completion(&mut self) {}

	fn display_name(&self) -> &str {
		&self.display_name
	}
}

/// Cheaply cloneable handle onto a shared `TcpStream`, forwarding
/// `AsyncRead`/`AsyncWrite` the same way tokio's own `&TcpStream` impls do.
#[derive(Clone)]
struct SharedTcpStream(Arc<TcpStream>);

impl AsyncRead for SharedTcpStream {
	fn poll_read(self: Pin<&mut Self>, cx: &mut Context<'_>, buf: &mut ReadBuf<'_>) -> Poll<io::Result<()>> {
		let mut r = &*self.get_mut().0;
		Pin::new(&mut r).poll_read(cx, buf)
	}
}

impl AsyncWrite for SharedTcpStream {
	fn poll_write(self: Pin<&mut Self>, cx: &mut Context<'_>, buf: &[u8]) -> Poll<io::Result<usize>> {
		let mut r = &*self.get_mut().0;
		Pin::new(&mut r).poll_write(cx, buf)
	}

	fn poll_flush(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
		let mut r = &*self.get_mut().0;
		Pin::new(&mut r).poll_flush(cx)
	}

	fn poll_shutdown(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
		let mut r = &*self.get_mut().0;
		Pin::new(&mut r).poll_shutdown(cx)
	}
}

struct TcpSource {
	framer: Framer<BufReader<SharedTcpStream>>,
	eof: bool,
}

#[async_trait]
impl MessageSource for TcpSource {
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

struct TcpSink {
	writer: SharedTcpStream,
}

#[async_trait]
impl MessageSink for TcpSink {
	async fn send(&mut self, message: &Message) -> Result<()> {
		proxy_rpc::write_message(&mut self.writer, message).await.map_err(Error::Rpc)
	}
}
