use proxy_rpc::{Message, RequestId, ResponseError};
use serde_json::Value;
use std::collections::HashMap;

use crate::capabilities;
use crate::methods;
use crate::server_state::{ServerConfig, ServerState};
use crate::transport::ServerId;
use crate::{Error, Result};

/// Which side a message is flowing to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Destination {
	Client,
	Server(ServerId),
}

/// A message the Router has decided to forward, and where.
#[derive(Debug, Clone)]
pub struct Outgoing {
	pub destination: Destination,
	pub message: Message,
}

/// Which side a message arrived from — selects the pending table to check
/// and the direction label on the audit log.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Origin {
	Client,
	Server(ServerId),
}

impl Origin {
	fn audit_label(self) -> &'static str {
		match self {
			Origin::Client => "client_to_server",
			Origin::Server(_) => "server_to_client",
		}
	}
}

/// A single-owner feature.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Feature {
	Formatting,
	Completion,
	SignatureHelp,
}

/// In-flight fan-out of one `textDocument/codeAction` request.
#[derive(Debug)]
struct CodeActionAggregate {
	remaining: usize,
	results: Vec<Option<Value>>,
}

/// The decision core: one `Router` per running proxy, holding
/// every `ServerState` plus the proxy-global correlation state that would
/// otherwise live at module scope, gathered onto this object instead.
pub struct Router {
	servers: Vec<ServerState>,
	initialize_id: Option<RequestId>,
	shutdown_id: Option<RequestId>,
	outstanding_code_action: HashMap<RequestId, CodeActionAggregate>,
}

impl Router {
	pub fn new(configs: Vec<ServerConfig>) -> Result<Self> {
		if configs.is_empty() {
			return Err(Error::NoServers);
		}
		if configs.iter().filter(|c| c.is_primary).count() != 1 {
			return Err(Error::MultiplePrimary);
		}
		let servers = configs.into_iter().map(ServerState::new).collect();
		Ok(Router { servers, initialize_id: None, shutdown_id: None, outstanding_code_action: HashMap::new() })
	}

	pub fn server_count(&self) -> usize {
		self.servers.len()
	}

	pub fn server(&self, id: ServerId) -> &ServerState {
		&self.servers[id.0]
	}

	fn primary(&self) -> ServerId {
		ServerId(self.servers.iter().position(ServerState::is_primary).expect("Router::new enforces exactly one primary"))
	}

	/// Entry point for a message read from the client.
	pub fn dispatch_from_client(&mut self, msg: Message) -> Vec<Outgoing> {
		if msg.is_response() {
			return self.route_client_response(msg);
		}
		match msg.method.as_deref() {
			Some(methods::INITIALIZE) => {
				self.initialize_id = msg.id.clone();
				self.broadcast_with_per_server_override(msg, "initializationOptions")
			}
			Some(methods::DID_CHANGE_CONFIGURATION) => self.broadcast_with_per_server_override(msg, "settings"),
			Some(methods::FORMATTING) | Some(methods::RANGE_FORMATTING) => self.route_single_owner(msg, Feature::Formatting),
			Some(methods::COMPLETION) | Some(methods::RESOLVE_COMPLETION_ITEM) => self.route_single_owner(msg, Feature::Completion),
			Some(methods::SIGNATURE_HELP) => self.route_single_owner(msg, Feature::SignatureHelp),
			Some(methods::CODE_ACTION) => self.route_code_action_fanout(msg),
			Some(methods::EXECUTE_COMMAND) => self.route_execute_command(msg),
			Some(methods::SHUTDOWN) => {
				self.shutdown_id = msg.id.clone();
				self.broadcast_from_client(msg)
			}
			_ => self.broadcast_from_client(msg),
		}
	}

	/// A response from the client answers exactly one server's
	/// server-to-client request — deliver it only to the server whose
	/// `pending_server_to_client` holds the id (§3 invariant 6: forwarded
	/// to exactly one peer, no duplication). The primary's catch-all
	/// `keep` in `process` must not see this message at all, or it would
	/// forward a spurious copy to the primary even when the primary never
	/// issued the request (e.g. a non-primary server's `workspace/applyEdit`).
	fn route_client_response(&mut self, msg: Message) -> Vec<Outgoing> {
		let Some(id) = msg.id.clone() else {
			return Vec::new();
		};
		let Some(idx) = self.servers.iter().position(|s| s.pending_server_to_client.contains_key(&id)) else {
			return Vec::new();
		};
		self.process(ServerId(idx), Origin::Client, msg, methods::PRESERVED_REQUESTS, methods::PRESERVED_C2S_NOTIFICATIONS).into_iter().collect()
	}

	/// Entry point for a message read from `origin`.
	pub fn dispatch_from_server(&mut self, origin: ServerId, msg: Message) -> Vec<Outgoing> {
		if msg.is_response() {
			if let Some(id) = msg.id.clone() {
				if Some(&id) == self.initialize_id.as_ref() {
					return self.handle_initialize_response(origin, id, msg);
				}
				if Some(&id) == self.shutdown_id.as_ref() {
					return self.handle_shutdown_response(origin, id);
				}
				if self.outstanding_code_action.contains_key(&id) {
					return self.handle_code_action_response(origin, id, msg);
				}
			}
		}
		if msg.method.as_deref() == Some(methods::PUBLISH_DIAGNOSTICS) {
			return self.handle_publish_diagnostics(origin, msg);
		}
		self.process(origin, Origin::Server(origin), msg, methods::PRESERVED_REQUESTS, methods::PRESERVED_S2C_NOTIFICATIONS)
			.into_iter()
			.collect()
	}

	fn broadcast_from_client(&mut self, msg: Message) -> Vec<Outgoing> {
		(0..self.servers.len())
			.filter_map(|idx| {
				self.process(ServerId(idx), Origin::Client, msg.clone(), methods::PRESERVED_REQUESTS, methods::PRESERVED_C2S_NOTIFICATIONS)
			})
			.collect()
	}

	/// Shared implementation for `initialize`'s `initializationOptions`
	/// substitution and `workspace/didChangeConfiguration`'s `settings`
	/// substitution (the same substitution as above but on
	/// `params.settings`) — both key on the same per-server
	/// `initialization_options` configuration value).
	fn broadcast_with_per_server_override(&mut self, msg: Message, param_key: &str) -> Vec<Outgoing> {
		let mut out = Vec::new();
		for idx in 0..self.servers.len() {
			let server = ServerId(idx);
			let mut per_server = msg.clone();
			let is_primary = self.servers[idx].config.is_primary;
			let override_value = self.servers[idx].config.initialization_options.clone();
			if let Some(params) = per_server.params.as_mut() {
				if !params.is_object() {
					*params = Value::Object(Default::default());
				}
				match override_value {
					Some(value) => {
						params[param_key] = value;
					}
					None if !is_primary => {
						params[param_key] = Value::Null;
					}
					None => {}
				}
			}
			if let Some(o) = self.process(server, Origin::Client, per_server, methods::PRESERVED_REQUESTS, methods::PRESERVED_C2S_NOTIFICATIONS) {
				out.push(o);
			}
		}
		out
	}

	fn feature_owner(&self, feature: Feature) -> Option<ServerId> {
		let mut first_capable = None;
		for (idx, s) in self.servers.iter().enumerate() {
			let capable = match feature {
				Feature::Formatting => s.capability_formatting(),
				Feature::Completion => s.capability_completion(),
				Feature::SignatureHelp => s.capability_signature_help(),
			};
			if !capable {
				continue;
			}
			if first_capable.is_none() {
				first_capable = Some(ServerId(idx));
			}
			let prefers = match feature {
				Feature::Formatting => s.config.use_formatting,
				Feature::Completion => s.config.use_completion,
				Feature::SignatureHelp => s.config.use_signature,
			};
			if prefers {
				return Some(ServerId(idx));
			}
		}
		first_capable
	}

	fn execute_command_owner(&self, command: &str) -> Option<ServerId> {
		let mut first_capable = None;
		for (idx, s) in self.servers.iter().enumerate() {
			if !s.capability_execute_commands().iter().any(|c| c == command) {
				continue;
			}
			if first_capable.is_none() {
				first_capable = Some(ServerId(idx));
			}
			if s.config.use_execute_command {
				return Some(ServerId(idx));
			}
		}
		first_capable
	}

	fn route_single_owner(&mut self, msg: Message, feature: Feature) -> Vec<Outgoing> {
		match self.feature_owner(feature) {
			Some(owner) => self
				.process(owner, Origin::Client, msg, methods::PRESERVED_REQUESTS, methods::PRESERVED_C2S_NOTIFICATIONS)
				.into_iter()
				.collect(),
			None => vec![self.no_capable_server(msg)],
		}
	}

	fn route_execute_command(&mut self, msg: Message) -> Vec<Outgoing> {
		let command = msg.params.as_ref().and_then(|p| p.get("command")).and_then(Value::as_str).map(str::to_owned);
		let owner = command.as_deref().and_then(|c| self.execute_command_owner(c));
		match owner {
			Some(owner) => self
				.process(owner, Origin::Client, msg, methods::PRESERVED_REQUESTS, methods::PRESERVED_C2S_NOTIFICATIONS)
				.into_iter()
				.collect(),
			None => vec![self.no_capable_server(msg)],
		}
	}

	fn route_code_action_fanout(&mut self, msg: Message) -> Vec<Outgoing> {
		let Some(id) = msg.id.clone() else {
			return Vec::new();
		};
		let capable: Vec<ServerId> = self.servers.iter().enumerate().filter(|(_, s)| s.capability_code_action()).map(|(idx, _)| ServerId(idx)).collect();
		if capable.is_empty() {
			return vec![self.no_capable_server(msg)];
		}
		self.outstanding_code_action.insert(id, CodeActionAggregate { remaining: capable.len(), results: vec![None; self.servers.len()] });
		capable
			.into_iter()
			.filter_map(|server| {
				self.process(server, Origin::Client, msg.clone(), methods::PRESERVED_REQUESTS, methods::PRESERVED_C2S_NOTIFICATIONS)
			})
			.collect()
	}

	/// The well-behaved response to "no server is capable of this
	/// feature" — a JSON-RPC `MethodNotFound` rather than a silent drop.
	fn no_capable_server(&self, msg: Message) -> Outgoing {
		let method = msg.method.clone().unwrap_or_default();
		let id = msg.id.unwrap_or(RequestId::Number(0));
		Outgoing { destination: Destination::Client, message: Message::response_err(id, ResponseError::method_not_found(&method)) }
	}

	/// The per-server `process` algorithm, shared by every call
	/// site above. `origin` picks which pending table is consulted; the
	/// destination is always the opposite party.
	fn process(
		&mut self,
		server: ServerId,
		origin: Origin,
		mut msg: Message,
		preserved_requests: &'static [&'static str],
		preserved_notifications: &'static [&'static str],
	) -> Option<Outgoing> {
		let id = msg.id.clone();
		let method = msg.method.clone();
		let destination = match origin {
			Origin::Client => Destination::Server(server),
			Origin::Server(_) => Destination::Client,
		};

		if let Some(rid) = &id {
			let recorded = match origin {
				Origin::Client => self.servers[server.0].pending_server_to_client.remove(rid),
				Origin::Server(_) => self.servers[server.0].pending_client_to_server.remove(rid),
			};
			if let Some(recorded_method) = recorded {
				msg.method = None;
				tracing::info!(
					direction = origin.audit_label(),
					method = %recorded_method,
					server = %self.servers[server.0].config.display_name,
					"forwarding lsp response",
				);
				return Some(Outgoing { destination, message: msg });
			}
		}

		let is_primary = self.servers[server.0].config.is_primary;
		let keep = is_primary
			|| method.as_deref().is_some_and(|m| if id.is_some() { preserved_requests.contains(&m) } else { preserved_notifications.contains(&m) });
		if !keep {
			return None;
		}

		if let (Some(m), Some(rid)) = (&method, &id) {
			match origin {
				Origin::Client => self.servers[server.0].pending_client_to_server.insert(rid.clone(), m.clone()),
				Origin::Server(_) => self.servers[server.0].pending_server_to_client.insert(rid.clone(), m.clone()),
			};
		}

		if let Some(m) = &method {
			tracing::info!(
				direction = origin.audit_label(),
				method = %m,
				server = %self.servers[server.0].config.display_name,
				"forwarding lsp message",
			);
		}

		Some(Outgoing { destination, message: msg })
	}

	fn handle_initialize_response(&mut self, origin: ServerId, id: RequestId, msg: Message) -> Vec<Outgoing> {
		self.servers[origin.0].pending_client_to_server.remove(&id);
		self.servers[origin.0].initialize_response = Some(msg.result.unwrap_or(Value::Null));
		if self.servers.iter().any(|s| s.initialize_response.is_none()) {
			return Vec::new();
		}
		let message = self.synthesize_initialize_response();
		tracing::info!(direction = "server_to_client", method = methods::INITIALIZE, server = %self.server_names(), "forwarding synthesized lsp response");
		vec![Outgoing { destination: Destination::Client, message }]
	}

	/// Builds the synthesized `initialize` response merged across servers.
	fn synthesize_initialize_response(&self) -> Message {
		let primary_init = self.servers[self.primary().0].initialize_response.clone().unwrap_or_else(|| Value::Object(Default::default()));
		let mut result = primary_init;
		if !result.is_object() {
			result = Value::Object(Default::default());
		}
		let result_obj = result.as_object_mut().expect("normalized to an object above");
		result_obj.insert("serverInfo".to_string(), serde_json::json!({"name": "lsp-proxy", "version": "0.1"}));
		if !result_obj.get("capabilities").is_some_and(Value::is_object) {
			result_obj.insert("capabilities".to_string(), Value::Object(Default::default()));
		}
		let capabilities_obj = result_obj.get_mut("capabilities").and_then(Value::as_object_mut).expect("inserted above");

		if let Some(owner) = self.feature_owner(Feature::Formatting) {
			if let Some(init) = self.servers[owner.0].initialize_response.as_ref() {
				if let Some(v) = capabilities::get(init, &["capabilities", "documentFormattingProvider"]) {
					capabilities_obj.insert("documentFormattingProvider".to_string(), v.clone());
				}
				if let Some(v) = capabilities::get(init, &["capabilities", "documentRangeFormattingProvider"]) {
					capabilities_obj.insert("documentRangeFormattingProvider".to_string(), v.clone());
				}
			}
		}
		if let Some(owner) = self.feature_owner(Feature::Completion) {
			if let Some(init) = self.servers[owner.0].initialize_response.as_ref() {
				if let Some(v) = capabilities::get(init, &["capabilities", "completionProvider"]) {
					capabilities_obj.insert("completionProvider".to_string(), v.clone());
				}
			}
		}
		if let Some(owner) = self.feature_owner(Feature::SignatureHelp) {
			if let Some(init) = self.servers[owner.0].initialize_response.as_ref() {
				if let Some(v) = capabilities::get(init, &["capabilities", "signatureHelpProvider"]) {
					capabilities_obj.insert("signatureHelpProvider".to_string(), v.clone());
				}
			}
		}

		let mut kinds = Vec::new();
		let mut any_code_action = false;
		for s in &self.servers {
			if let Some(init) = s.initialize_response.as_ref() {
				if capabilities::code_action_provider(init) {
					any_code_action = true;
					kinds.extend(capabilities::code_action_kinds(init));
				}
			}
		}
		if any_code_action {
			capabilities_obj.insert("codeActionProvider".to_string(), serde_json::json!({"codeActionKinds": capabilities::dedup_preserve_order(kinds)}));
		}

		let mut commands = Vec::new();
		for s in &self.servers {
			if let Some(init) = s.initialize_response.as_ref() {
				commands.extend(capabilities::execute_command_commands(init));
			}
		}
		if !commands.is_empty() {
			capabilities_obj.insert("executeCommandProvider".to_string(), serde_json::json!({"commands": capabilities::dedup_preserve_order(commands)}));
		}

		Message::response_ok(self.initialize_id.clone().expect("set when the client's initialize request was dispatched"), result)
	}

	fn handle_shutdown_response(&mut self, origin: ServerId, id: RequestId) -> Vec<Outgoing> {
		self.servers[origin.0].pending_client_to_server.remove(&id);
		self.servers[origin.0].shutdown_received = true;
		if self.servers.iter().any(|s| !s.shutdown_received) {
			return Vec::new();
		}
		tracing::info!(direction = "server_to_client", method = methods::SHUTDOWN, server = %self.server_names(), "forwarding synthesized lsp response");
		vec![Outgoing { destination: Destination::Client, message: Message::response_ok(self.shutdown_id.clone().expect("set when shutdown was dispatched"), Value::Null) }]
	}

	fn handle_code_action_response(&mut self, origin: ServerId, id: RequestId, msg: Message) -> Vec<Outgoing> {
		self.servers[origin.0].pending_client_to_server.remove(&id);
		let Some(aggregate) = self.outstanding_code_action.get_mut(&id) else {
			return Vec::new();
		};
		aggregate.results[origin.0] = Some(msg.result.unwrap_or(Value::Null));
		aggregate.remaining = aggregate.remaining.saturating_sub(1);
		if aggregate.remaining > 0 {
			return Vec::new();
		}
		let aggregate = self.outstanding_code_action.remove(&id).expect("just checked present");
		let mut merged = Vec::new();
		for item in aggregate.results.into_iter().flatten() {
			match item {
				Value::Array(items) => merged.extend(items),
				Value::Null => {}
				other => merged.push(other),
			}
		}
		tracing::info!(direction = "server_to_client", method = methods::CODE_ACTION, server = %self.server_names(), "forwarding aggregated lsp response");
		vec![Outgoing { destination: Destination::Client, message: Message::response_ok(id, Value::Array(merged)) }]
	}

	/// The `publishDiagnostics` special case. Caching is unconditional;
	/// only the merge the client sees filters by `use_diagnostics`.
	fn handle_publish_diagnostics(&mut self, origin: ServerId, msg: Message) -> Vec<Outgoing> {
		let Some(params) = msg.params.as_ref() else {
			return Vec::new();
		};
		let Some(uri) = params.get("uri").and_then(Value::as_str).map(str::to_owned) else {
			return Vec::new();
		};
		let diagnostics = params.get("diagnostics").and_then(Value::as_array).cloned().unwrap_or_default();
		self.servers[origin.0].diagnostics.insert(uri.clone(), diagnostics);

		let merged: Vec<Value> = self.servers.iter().filter(|s| s.config.use_diagnostics).flat_map(|s| s.diagnostics_for(&uri).to_vec()).collect();

		let mut out_params = params.clone();
		out_params["diagnostics"] = Value::Array(merged);
		tracing::info!(
			direction = "server_to_client",
			method = methods::PUBLISH_DIAGNOSTICS,
			server = %self.servers[origin.0].config.display_name,
			"forwarding merged lsp message",
		);
		vec![Outgoing { destination: Destination::Client, message: Message::notification(methods::PUBLISH_DIAGNOSTICS, out_params) }]
	}

	/// Comma-joined display names of every configured server, for the
	/// audit log on a response synthesized/aggregated across all of them
	/// (`initialize`, `shutdown`, `textDocument/codeAction`) rather than
	/// forwarded from one.
	fn server_names(&self) -> String {
		self.servers.iter().map(|s| s.config.display_name.as_str()).collect::<Vec<_>>().join(",")
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use pretty_assertions::assert_eq;
	use serde_json::json;

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

	fn two_server_router(b_use_formatting: bool) -> Router {
		let a = config("A", true);
		let mut b = config("B", false);
		b.use_formatting = b_use_formatting;
		Router::new(vec![a, b]).unwrap()
	}

	#[test]
	fn s1_initialize_aggregation() {
		let mut router = two_server_router(true);
		let out = router.dispatch_from_client(Message::request(RequestId::Number(1), "initialize", json!({"capabilities": {}})));
		assert_eq!(out.len(), 2);
		// B (non-primary) gets initializationOptions forced to null.
		let to_b = out.iter().find(|o| o.destination == Destination::Server(ServerId(1))).unwrap();
		assert_eq!(to_b.message.params.as_ref().unwrap()["initializationOptions"], Value::Null);

		let a_reply = Message::response_ok(RequestId::Number(1), json!({"capabilities": {"hoverProvider": true, "documentFormattingProvider": false}}));
		let mid = router.dispatch_from_server(ServerId(0), a_reply);
		assert!(mid.is_empty(), "must suppress until every server has answered");

		let b_reply = Message::response_ok(RequestId::Number(1), json!({"capabilities": {"documentFormattingProvider": true}}));
		let out = router.dispatch_from_server(ServerId(1), b_reply);
		assert_eq!(out.len(), 1);
		let synthesized = &out[0].message;
		assert_eq!(out[0].destination, Destination::Client);
		assert_eq!(synthesized.id, Some(RequestId::Number(1)));
		let result = synthesized.result.as_ref().unwrap();
		assert_eq!(result["serverInfo"], json!({"name": "lsp-proxy", "version": "0.1"}));
		assert_eq!(result["capabilities"]["hoverProvider"], json!(true));
		assert_eq!(result["capabilities"]["documentFormattingProvider"], json!(true));
	}

	#[test]
	fn s2_diagnostics_merge() {
		let mut router = two_server_router(false);
		let a_pub = Message::notification("textDocument/publishDiagnostics", json!({"uri": "file:///x", "diagnostics": [{"message": "m1"}]}));
		let out = router.dispatch_from_server(ServerId(0), a_pub);
		assert_eq!(out[0].message.params.as_ref().unwrap()["diagnostics"], json!([{"message": "m1"}]));

		let b_pub = Message::notification("textDocument/publishDiagnostics", json!({"uri": "file:///x", "diagnostics": [{"message": "m2"}]}));
		let out = router.dispatch_from_server(ServerId(1), b_pub);
		assert_eq!(out.len(), 1);
		assert_eq!(out[0].message.params.as_ref().unwrap()["diagnostics"], json!([{"message": "m1"}, {"message": "m2"}]));
	}

	#[test]
	fn s3_non_preserved_request_from_non_primary_is_dropped() {
		let mut router = two_server_router(false);
		let msg = Message::request(RequestId::Number(99), "window/workDoneProgress/create", json!({}));
		let out = router.dispatch_from_server(ServerId(1), msg);
		assert!(out.is_empty());
		assert_eq!(router.server(ServerId(1)).pending_count(), 0);
	}

	#[test]
	fn s4_formatting_ownership() {
		let mut router = two_server_router(true);
		router.servers[1].initialize_response = Some(json!({"capabilities": {"documentFormattingProvider": true}}));

		let out = router.dispatch_from_client(Message::request(RequestId::Number(7), "textDocument/formatting", json!({})));
		assert_eq!(out.len(), 1);
		assert_eq!(out[0].destination, Destination::Server(ServerId(1)));

		let reply = Message::response_ok(RequestId::Number(7), json!([{"edit": 1}]));
		let out = router.dispatch_from_server(ServerId(1), reply);
		assert_eq!(out.len(), 1);
		assert_eq!(out[0].destination, Destination::Client);
		assert_eq!(out[0].message.result, Some(json!([{"edit": 1}])));
	}

	#[test]
	fn s5_code_action_fan_in() {
		let mut router = two_server_router(false);
		router.servers[0].initialize_response = Some(json!({"capabilities": {"codeActionProvider": true}}));
		router.servers[1].initialize_response = Some(json!({"capabilities": {"codeActionProvider": true}}));

		let out = router.dispatch_from_client(Message::request(RequestId::Number(8), "textDocument/codeAction", json!({})));
		assert_eq!(out.len(), 2);

		let a_reply = Message::response_ok(RequestId::Number(8), json!(["actA"]));
		assert!(router.dispatch_from_server(ServerId(0), a_reply).is_empty());

		let b_reply = Message::response_ok(RequestId::Number(8), json!(["actB"]));
		let out = router.dispatch_from_server(ServerId(1), b_reply);
		assert_eq!(out.len(), 1);
		assert_eq!(out[0].message.result, Some(json!(["actA", "actB"])));
	}

	#[test]
	fn s6_shutdown_gate() {
		let mut router = two_server_router(false);
		let out = router.dispatch_from_client(Message::request(RequestId::Number(9), "shutdown", json!(null)));
		assert_eq!(out.len(), 2);

		let a_reply = Message::response_ok(RequestId::Number(9), Value::Null);
		assert!(router.dispatch_from_server(ServerId(0), a_reply).is_empty());

		let b_reply = Message::response_ok(RequestId::Number(9), Value::Null);
		let out = router.dispatch_from_server(ServerId(1), b_reply);
		assert_eq!(out.len(), 1);
		assert_eq!(out[0].message.id, Some(RequestId::Number(9)));
		assert_eq!(out[0].message.result, Some(Value::Null));
	}

	#[test]
	fn client_response_to_non_primary_server_request_is_not_duplicated_to_primary() {
		let mut router = two_server_router(false);
		let ask = Message::request(RequestId::Number(42), "workspace/applyEdit", json!({"label": "rename"}));
		let out = router.dispatch_from_server(ServerId(1), ask);
		assert_eq!(out.len(), 1);
		assert_eq!(out[0].destination, Destination::Client);

		let reply = Message::response_ok(RequestId::Number(42), json!({"applied": true}));
		let out = router.dispatch_from_client(reply);
		assert_eq!(out.len(), 1, "must be delivered to B alone, never duplicated to A");
		assert_eq!(out[0].destination, Destination::Server(ServerId(1)));
		assert_eq!(out[0].message.result, Some(json!({"applied": true})));
		assert_eq!(router.server(ServerId(1)).pending_count(), 0);
	}

	#[test]
	fn unmatched_client_response_is_dropped_not_broadcast() {
		let mut router = two_server_router(false);
		let reply = Message::response_ok(RequestId::Number(777), json!({"ignored": true}));
		let out = router.dispatch_from_client(reply);
		assert!(out.is_empty());
	}

	#[test]
	fn no_capable_server_returns_method_not_found_instead_of_dropping() {
		let mut router = two_server_router(false);
		let out = router.dispatch_from_client(Message::request(RequestId::Number(3), "textDocument/formatting", json!({})));
		assert_eq!(out.len(), 1);
		assert_eq!(out[0].destination, Destination::Client);
		let error = out[0].message.error.as_ref().expect("expected an error response");
		assert_eq!(error.code, ResponseError::METHOD_NOT_FOUND);
	}

	#[test]
	fn construction_rejects_empty_and_multi_primary_configurations() {
		assert!(matches!(Router::new(vec![]), Err(Error::NoServers)));
		assert!(matches!(Router::new(vec![config("A", true), config("B", true)]), Err(Error::MultiplePrimary)));
	}
}
