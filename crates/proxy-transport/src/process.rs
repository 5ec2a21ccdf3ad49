use std::process::Stdio;

use async_trait::async_trait;
use proxy_core::{Error, MessageSink, MessageSource, Result, Transport};
use proxy_rpc::{Framer, Message};
use tokio::io::{AsyncWrite, BufReader};
use tokio::process::{Child, Command};

/// A downstream server launched as a child process, talking LSP over its
/// stdio pipes. `stderr` is inherited so a crashing server's diagnostics
/// land on the proxy's own stderr.
pub struct ProcessTransport {
	command: String,
	args: Vec<String>,
	display_name: String,
	child: Option<Child>,
}

impl ProcessTransport {
	pub fn new(command: impl Into<String>, args: Vec<String>, display_name: impl Into<String>) -> Self {
		ProcessTransport { command: command.into(), args, display_name: display_name.into(), child: None }
	}
}

#[async_trait]
impl Transport for ProcessTransport {
	async fn connect(&mut self) -> Result<(Box<dyn MessageSource>, Box<dyn MessageSink>)> {
		let mut child = Command::new(&self.command)
			.args(&self.args)
			.stdin(Stdio::piped())
			.stdout(Stdio::piped())
			.stderr(Stdio::inherit())
			.spawn()
			.map_err(|source| Error::Connect { name: self.display_name.clone(), source })?;

		let stdin = child.stdin.take().ok_or_else(|| Error::Connect {
			name: self.display_name.clone(),
			source: std::io::Error::other("child process did not inherit a stdin pipe"),
		})?;
		let stdout = child.stdout.take().ok_or_else(|| Error::Connect {
			name: self.display_name.clone(),
			source: std::io::Error::other("child process did not inherit a stdout pipe"),
		})?;

		self.child = Some(child);

		let source: Box<dyn MessageSource> = Box::new(FramedSource { framer: Framer::new(BufReader::new(stdout)), eof: false });
		let sink: Box<dyn MessageSink> = Box::new(FramedSink { writer: stdin });
		Ok((source, sink))
	}

	fn is_connected(&self) -> bool {
		self.child.is_some()
	}

	/// Best-effort kill. The source never waits for an LSP
	/// `shutdown`/`exit` handshake from signal context; it relies on
	/// `procs_running()` going false, mirrored here by `start_kill` plus
	/// [`ProcessTransport::wait_for_completion`].
	async fn disconnect(&mut self) {
		if let Some(child) = self.child.as_mut()
			&& let Err(err) = child.start_kill()
		{
			tracing::warn!(server = %self.display_name, error = %err, "failed to kill downstream server process");
		}
	}

	async fn wait_for_completion(&mut self) {
		if let Some(mut child) = self.child.take() {
			match child.wait().await {
				Ok(status) => tracing::info!(server = %self.display_name, %status, "downstream server process exited"),
				Err(err) => tracing::warn!(server = %self.display_name, error = %err, "error waiting for downstream server process"),
			}
		}
	}

	fn display_name(&self) -> &str {
		&self.display_name
	}
}

struct FramedSource<R> {
	framer: Framer<R>,
	eof: bool,
}

#[async_trait]
impl<R: proxy_rpc::FramedRead> MessageSource for FramedSource<R> {
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

struct FramedSink<W> {
	writer: W,
}

#[async_trait]
impl<W: AsyncWrite + Unpin + Send> MessageSink for FramedSink<W> {
	async fn send(&mut self, message: &Message) -> Result<()> {
		proxy_rpc::write_message(&mut self.writer, message).await.map_err(Error::Rpc)
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[tokio::test]
	async fn connect_failure_on_missing_binary_is_reported_as_connect_error() {
		let mut transport = ProcessTransport::new("this-binary-does-not-exist-xyz", vec![], "test");
		let err = transport.connect().await.unwrap_err();
		assert!(matches!(err, Error::Connect { .. }));
		assert!(!transport.is_connected());
	}

	#[tokio::test]
	async fn display_name_is_stable() {
		let transport = ProcessTransport::new("echo", vec![], "echoServer");
		assert_eq!(transport.display_name(), "echoServer");
	}
}
