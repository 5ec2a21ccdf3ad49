use proxy_rpc::Message;
use proxy_worker::TaskPump;

use crate::router::{Destination, Outgoing, Router};
use crate::transport::{MessageSink, MessageSource, ServerId, Transport};

/// One decoded event from any of the N+1 streams the Dispatcher watches.
/// `None` marks a stream's end-of-input.
enum StreamEvent {
	Client(Option<Message>),
	Server(ServerId, Option<Message>),
}

/// The event loop: one persistent background reader per stream
/// feeding a single [`TaskPump`], message processing serialized on this
/// struct's own async context. See `proxy_worker::TaskPump`'s doc comment
/// for why this replaces the source's "one outstanding read-task per
/// stream, recreated on completion" with detached producers instead of
/// futures rebuilt every loop iteration.
pub struct Dispatcher {
	router: Router,
	client_transport: Box<dyn Transport>,
	client_sink: Box<dyn MessageSink>,
	server_transports: Vec<Box<dyn Transport>>,
	server_sinks: Vec<Box<dyn MessageSink>>,
	connected: Vec<bool>,
	pump: TaskPump<StreamEvent>,
}

impl Dispatcher {
	/// `client` and `servers` must already be connected (`connect()`
	/// having already succeeded); this constructor only wires their halves
	/// into the pump.
	pub fn new(
		router: Router,
		client_transport: Box<dyn Transport>,
		client_source: Box<dyn MessageSource>,
		client_sink: Box<dyn MessageSink>,
		server_transports: Vec<Box<dyn Transport>>,
		server_halves: Vec<(Box<dyn MessageSource>, Box<dyn MessageSink>)>,
	) -> Self {
		assert_eq!(server_transports.len(), server_halves.len());
		assert_eq!(server_transports.len(), router.server_count());

		let pump: TaskPump<StreamEvent> = TaskPump::new(64);
		pump.spawn_producer(move |tx| async move {
			let mut source = client_source;
			loop {
				match source.recv().await {
					Ok(Some(msg)) => {
						if tx.send(StreamEvent::Client(Some(msg))).await.is_err() {
							break;
						}
					}
					Ok(None) if source.at_end_of_input() => {
						let _ = tx.send(StreamEvent::Client(None)).await;
						break;
					}
					Ok(None) => continue,
					Err(err) => {
						tracing::warn!(error = %err, "error reading from client");
						continue;
					}
				}
			}
		});

		let mut server_sinks = Vec::with_capacity(server_halves.len());
		let connected = vec![true; server_halves.len()];
		for (idx, (source, sink)) in server_halves.into_iter().enumerate() {
			server_sinks.push(sink);
			let id = ServerId(idx);
			pump.spawn_producer(move |tx| async move {
				let mut source = source;
				loop {
					match source.recv().await {
						Ok(Some(msg)) => {
							if tx.send(StreamEvent::Server(id, Some(msg))).await.is_err() {
								break;
							}
						}
						Ok(None) if source.at_end_of_input() => {
							let _ = tx.send(StreamEvent::Server(id, None)).await;
							break;
						}
						Ok(None) => continue,
						Err(err) => {
							tracing::warn!(server = %id, error = %err, "error reading from server");
							continue;
						}
					}
				}
			});
		}

		Dispatcher { router, client_transport, client_sink, server_transports, server_sinks, connected, pump }
	}

	/// Runs until zero servers remain connected. Takes `&mut self`
	/// rather than consuming the Dispatcher so a caller can race this
	/// future against a termination signal and still reach
	/// [`Dispatcher::terminate_all`] afterwards — `tokio::select!` drops
	/// the losing branch's future before running the winning arm's body,
	/// so the borrow below is released by the time that happens.
	pub async fn run(&mut self) -> crate::Result<()> {
		while self.connected.iter().any(|c| *c) {
			let Some(event) = self.pump.recv().await else {
				break;
			};
			match event {
				StreamEvent::Client(Some(msg)) => {
					let outgoing = self.router.dispatch_from_client(msg);
					self.deliver(outgoing).await;
				}
				StreamEvent::Client(None) => {
					tracing::info!("client disconnected, terminating");
					self.terminate_all().await;
					break;
				}
				StreamEvent::Server(id, Some(msg)) => {
					let outgoing = self.router.dispatch_from_server(id, msg);
					self.deliver(outgoing).await;
				}
				StreamEvent::Server(id, None) => {
					// §4.1's "header truncated at end-of-stream" rule: suppress
					// as an expected disconnect once this server has answered
					// `shutdown`; otherwise this is an unexpected downstream
					// crash and must be logged, not swallowed.
					if self.router.server(id).shutdown_received() {
						tracing::info!(server = %id, "server disconnected after shutdown");
					} else {
						tracing::warn!(server = %id, "server disconnected unexpectedly before answering shutdown");
					}
					self.connected[id.0] = false;
					self.server_transports[id.0].wait_for_completion().await;
				}
			}
		}
		Ok(())
	}

	async fn deliver(&mut self, outgoing: Vec<Outgoing>) {
		for item in outgoing {
			let result = match item.destination {
				Destination::Client => self.client_sink.send(&item.message).await,
				Destination::Server(id) => {
					if !self.connected[id.0] {
						continue;
					}
					self.server_sinks[id.0].send(&item.message).await
				}
			};
			if let Err(err) = result {
				tracing::warn!(error = %err, "failed to write lsp message");
			}
		}
	}

	/// Best-effort termination of every transport on SIGINT /
	/// SIGTERM or client disconnect. In-flight writes may be truncated;
	/// that is acceptable because the peer is going away.
	pub async fn terminate_all(&mut self) {
		self.client_transport.disconnect().await;
		for transport in &mut self.server_transports {
			transport.disconnect().await;
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::server_state::ServerConfig;
	use crate::Result;
	use async_trait::async_trait;
	use proxy_rpc::RequestId;
	use serde_json::json;
	use std::sync::{Arc, Mutex};
	use std::time::Duration;
	use tokio::sync::mpsc;

	/// A [`MessageSource`] fed from an unbounded channel — the test's hand
	/// on a fake server or client stream, in the same "recording/stub"
	/// shape as the teacher's test doubles.
	struct ChannelSource {
		rx: mpsc::UnboundedReceiver<Message>,
		eof: bool,
	}

	impl ChannelSource {
		fn new(rx: mpsc::UnboundedReceiver<Message>) -> Self {
			ChannelSource { rx, eof: false }
		}
	}

	#[async_trait]
	impl MessageSource for ChannelSource {
		async fn recv(&mut self) -> Result<Option<Message>> {
			match self.rx.recv().await {
				Some(msg) => Ok(Some(msg)),
				None => {
					self.eof = true;
					Ok(None)
				}
			}
		}

		fn at_end_of_input(&self) -> bool {
			self.eof
		}
	}

	/// A [`MessageSink`] that records every message handed to it instead of
	/// writing bytes anywhere, so a test can assert what the Dispatcher
	/// decided to forward.
	#[derive(Clone, Default)]
	struct RecordingSink {
		sent: Arc<Mutex<Vec<Message>>>,
	}

	#[async_trait]
	impl MessageSink for RecordingSink {
		async fn send(&mut self, message: &Message) -> Result<()> {
			self.sent.lock().unwrap().push(message.clone());
			Ok(())
		}
	}

	/// A [`Transport`] whose read/write halves are wired directly into
	/// `Dispatcher::new` by the test rather than produced by `connect`; it
	/// only exists to record whether `disconnect` was called.
	#[derive(Clone, Default)]
	struct StubTransport {
		disconnected: Arc<Mutex<bool>>,
	}

	#[async_trait]
	impl Transport for StubTransport {
		async fn connect(&mut self) -> Result<(Box<dyn MessageSource>, Box<dyn MessageSink>)> {
			unreachable!("test doubles are wired directly into Dispatcher::new, not through connect()")
		}

		fn is_connected(&self) -> bool {
			!*self.disconnected.lock().unwrap()
		}

		async fn disconnect(&mut self) {
			*self.disconnected.lock().unwrap() = true;
		}

		async fn wait_for_completion(&mut self) {}

		fn display_name(&self) -> &str {
			"stub"
		}
	}

	fn config(name: &str, is_primary: bool) -> ServerConfig {
		ServerConfig {
			display_name: name.to_string(),
			is_primary,
			use_diagnostics: true,
			use_formatting: false,
			use_completion: false,
			use_signature: false,
			use_execute_command: false,
			initialization_options: None,
		}
	}

	/// Polls `sent` until it has at least `n` messages or gives up after
	/// roughly a second — avoids the test racing the Dispatcher's
	/// background reader tasks.
	async fn wait_for_len(sent: &Arc<Mutex<Vec<Message>>>, n: usize) {
		for _ in 0..500 {
			if sent.lock().unwrap().len() >= n {
				return;
			}
			tokio::time::sleep(Duration::from_millis(2)).await;
		}
		panic!("timed out waiting for {n} message(s), saw {:?}", sent.lock().unwrap());
	}

	#[tokio::test]
	async fn forwards_request_and_relays_response_through_background_tasks() {
		let router = Router::new(vec![config("A", true)]).unwrap();

		let (client_tx, client_rx) = mpsc::unbounded_channel();
		let client_sink = RecordingSink::default();
		let client_sent = client_sink.sent.clone();

		let (server_tx, server_rx) = mpsc::unbounded_channel();
		let server_sink = RecordingSink::default();
		let server_sent = server_sink.sent.clone();

		let client_transport = StubTransport::default();
		let server_transport = StubTransport::default();

		let mut dispatcher = Dispatcher::new(
			router,
			Box::new(client_transport.clone()),
			Box::new(ChannelSource::new(client_rx)),
			Box::new(client_sink),
			vec![Box::new(server_transport.clone())],
			vec![(Box::new(ChannelSource::new(server_rx)), Box::new(server_sink))],
		);

		client_tx.send(Message::request(RequestId::Number(1), "textDocument/hover", json!({}))).unwrap();

		let run = tokio::spawn(async move { dispatcher.run().await });

		wait_for_len(&server_sent, 1).await;
		let forwarded = server_sent.lock().unwrap()[0].clone();
		assert_eq!(forwarded.method.as_deref(), Some("textDocument/hover"));
		assert_eq!(forwarded.id, Some(RequestId::Number(1)));

		server_tx.send(Message::response_ok(RequestId::Number(1), json!({"contents": "docs"}))).unwrap();
		wait_for_len(&client_sent, 1).await;
		let relayed = client_sent.lock().unwrap()[0].clone();
		assert_eq!(relayed.id, Some(RequestId::Number(1)));
		assert_eq!(relayed.result, Some(json!({"contents": "docs"})));

		// Closing the client stream should drive the Dispatcher to call
		// `terminate_all` on every transport, then return.
		drop(client_tx);
		run.await.unwrap().unwrap();
		assert!(*client_transport.disconnected.lock().unwrap());
		assert!(*server_transport.disconnected.lock().unwrap());
	}

	#[tokio::test]
	async fn terminates_once_the_only_server_disconnects() {
		let router = Router::new(vec![config("A", true)]).unwrap();

		let (_client_tx, client_rx) = mpsc::unbounded_channel();
		let (server_tx, server_rx) = mpsc::unbounded_channel();

		let mut dispatcher = Dispatcher::new(
			router,
			Box::new(StubTransport::default()),
			Box::new(ChannelSource::new(client_rx)),
			Box::new(RecordingSink::default()),
			vec![Box::new(StubTransport::default())],
			vec![(Box::new(ChannelSource::new(server_rx)), Box::new(RecordingSink::default()))],
		);

		// The server hangs up without ever answering `shutdown` — an
		// unexpected disconnect (exercises the `tracing::warn!` branch of
		// the shutdown-gated EOF check) — but the loop must still
		// terminate once zero servers remain connected, per §4.4.
		drop(server_tx);

		let result = tokio::time::timeout(Duration::from_secs(1), dispatcher.run()).await;
		assert!(result.is_ok(), "dispatcher did not terminate after its only server disconnected");
		result.unwrap().unwrap();
	}

	#[tokio::test]
	async fn server_disconnect_after_shutdown_is_treated_as_expected() {
		let router = Router::new(vec![config("A", true)]).unwrap();

		let (client_tx, client_rx) = mpsc::unbounded_channel();
		let (server_tx, server_rx) = mpsc::unbounded_channel();
		let client_sink = RecordingSink::default();
		let client_sent = client_sink.sent.clone();

		let mut dispatcher = Dispatcher::new(
			router,
			Box::new(StubTransport::default()),
			Box::new(ChannelSource::new(client_rx)),
			Box::new(client_sink),
			vec![Box::new(StubTransport::default())],
			vec![(Box::new(ChannelSource::new(server_rx)), Box::new(RecordingSink::default()))],
		);

		client_tx.send(Message::request(RequestId::Number(9), "shutdown", json!(null))).unwrap();

		let run = tokio::spawn(async move { dispatcher.run().await });

		server_tx.send(Message::response_ok(RequestId::Number(9), json!(null))).unwrap();
		wait_for_len(&client_sent, 1).await;

		// This server has now answered `shutdown`; hanging up should take
		// the `shutdown_received() == true` branch rather than being
		// logged as unexpected.
		drop(server_tx);
		drop(client_tx);

		let result = tokio::time::timeout(Duration::from_secs(1), run).await;
		assert!(result.is_ok(), "dispatcher did not terminate after the post-shutdown server disconnect");
		result.unwrap().unwrap().unwrap();
	}
}
