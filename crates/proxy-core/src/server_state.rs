use proxy_rpc::RequestId;
use serde_json::Value;
use std::collections::HashMap;

use crate::capabilities;

/// Configured, unchanging-for-the-run properties of one downstream server —
/// the parts a config loader fills in before the proxy starts.
#[derive(Debug, Clone)]
pub struct ServerConfig {
	pub display_name: String,
	pub is_primary: bool,
	pub use_diagnostics: bool,
	pub use_formatting: bool,
	pub use_completion: bool,
	pub use_signature: bool,
	pub use_execute_command: bool,
	pub initialization_options: Option<Value>,
}

/// Per-downstream-server book-keeping.
///
/// Mutated only from the single Dispatcher context — there is no
/// internal locking because there is nothing else to race with it.
#[derive(Debug)]
pub struct ServerState {
	pub config: ServerConfig,
	pub(crate) pending_client_to_server: HashMap<RequestId, String>,
	pub(crate) pending_server_to_client: HashMap<RequestId, String>,
	pub(crate) initialize_response: Option<Value>,
	pub(crate) shutdown_received: bool,
	pub(crate) diagnostics: HashMap<String, Vec<Value>>,
}

impl ServerState {
	pub fn new(config: ServerConfig) -> Self {
		ServerState {
			config,
			pending_client_to_server: HashMap::new(),
			pending_server_to_client: HashMap::new(),
			initialize_response: None,
			shutdown_received: false,
			diagnostics: HashMap::new(),
		}
	}

	pub fn is_primary(&self) -> bool {
		self.config.is_primary
	}

	pub fn shutdown_received(&self) -> bool {
		self.shutdown_received
	}

	pub fn diagnostics_for(&self, uri: &str) -> &[Value] {
		self.diagnostics.get(uri).map(Vec::as_slice).unwrap_or(&[])
	}

	/// Number of requests this server has forwarded to the client and not
	/// yet had answered, plus the reverse — used by tests to assert
	/// quiescence: both pending tables are empty once all traffic has
	/// quiesced.
	pub fn pending_count(&self) -> usize {
		self.pending_client_to_server.len() + self.pending_server_to_client.len()
	}

	fn capability(&self) -> Option<&Value> {
		self.initialize_response.as_ref()
	}

	pub fn capability_formatting(&self) -> bool {
		self.capability().is_some_and(capabilities::document_formatting_provider)
	}

	pub fn capability_completion(&self) -> bool {
		self.capability().is_some_and(capabilities::completion_provider)
	}

	pub fn capability_signature_help(&self) -> bool {
		self.capability().is_some_and(capabilities::signature_help_provider)
	}

	pub fn capability_code_action(&self) -> bool {
		self.capability().is_some_and(capabilities::code_action_provider)
	}

	pub fn capability_execute_commands(&self) -> Vec<String> {
		self.capability().map(capabilities::execute_command_commands).unwrap_or_default()
	}
}
