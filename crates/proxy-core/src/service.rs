use std::future::{ready, Ready};
use std::task::{Context, Poll};

use proxy_rpc::Message;
use tower_service::Service;

use crate::router::{Outgoing, Router};

/// Exposes the from-client half of `Router::dispatch_from_client` as a
/// `tower::Service`. `Router` has no backpressure to apply — message
/// processing is synchronous and serialized already — so `poll_ready` is
/// always `Ready`.
impl Service<Message> for Router {
	type Response = Vec<Outgoing>;
	type Error = std::convert::Infallible;
	type Future = Ready<Result<Self::Response, Self::Error>>;

	fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
		Poll::Ready(Ok(()))
	}

	fn call(&mut self, msg: Message) -> Self::Future {
		ready(Ok(self.dispatch_from_client(msg)))
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::ServerConfig;
	use serde_json::json;
	use tower_service::Service;

	#[tokio::test]
	async fn router_is_usable_as_a_tower_service() {
		let config = ServerConfig {
			display_name: "A".into(),
			is_primary: true,
			use_diagnostics: true,
			use_formatting: false,
			use_completion: false,
			use_signature: false,
			use_execute_command: false,
			initialization_options: None,
		};
		let mut router = Router::new(vec![config]).unwrap();
		let out = Service::call(&mut router, Message::notification("initialized", json!({}))).await.unwrap();
		assert_eq!(out.len(), 1);
	}
}
