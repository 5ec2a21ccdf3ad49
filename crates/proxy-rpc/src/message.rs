use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// A JSON-RPC correlation id — either a number or a string, per the LSP base
/// protocol. Hashable so it can key the `pending_*` correlation tables in
/// `proxy-core`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RequestId {
	Number(i64),
	String(String),
}

impl fmt::Display for RequestId {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			RequestId::Number(n) => write!(f, "{n}"),
			RequestId::String(s) => write!(f, "{s}"),
		}
	}
}

/// `error` field of a JSON-RPC response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResponseError {
	pub code: i64,
	pub message: String,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub data: Option<Value>,
}

impl ResponseError {
	pub const METHOD_NOT_FOUND: i64 = -32601;

	/// The well-behaved "no server capable of this feature" error.
	pub fn method_not_found(method: &str) -> Self {
		ResponseError {
			code: Self::METHOD_NOT_FOUND,
			message: format!("no downstream server is capable of handling {method}"),
			data: None,
		}
	}
}

/// A decoded JSON-RPC message.
///
/// The three JSON-RPC shapes (Request, Notification, Response) share one
/// struct rather than an enum: the Router needs to mutate `params` /
/// `result` in place (initializationOptions substitution, diagnostics
/// merge, serverInfo overwrite) and to reclassify a message as it crosses
/// the pending-table lookup, which is simplest against one shape. This is
/// a tagged tree value rather than a raw-bytes-plus-view representation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
	#[serde(default = "jsonrpc_version", skip_serializing_if = "Option::is_none")]
	pub jsonrpc: Option<String>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub id: Option<RequestId>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub method: Option<String>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub params: Option<Value>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub result: Option<Value>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub error: Option<ResponseError>,
}

fn jsonrpc_version() -> Option<String> {
	Some("2.0".to_string())
}

impl Message {
	pub fn request(id: RequestId, method: impl Into<String>, params: Value) -> Self {
		Message {
			jsonrpc: jsonrpc_version(),
			id: Some(id),
			method: Some(method.into()),
			params: Some(params),
			result: None,
			error: None,
		}
	}

	pub fn notification(method: impl Into<String>, params: Value) -> Self {
		Message {
			jsonrpc: jsonrpc_version(),
			id: None,
			method: Some(method.into()),
			params: Some(params),
			result: None,
			error: None,
		}
	}

	pub fn response_ok(id: RequestId, result: Value) -> Self {
		Message {
			jsonrpc: jsonrpc_version(),
			id: Some(id),
			method: None,
			params: None,
			result: Some(result),
			error: None,
		}
	}

	pub fn response_err(id: RequestId, error: ResponseError) -> Self {
		Message {
			jsonrpc: jsonrpc_version(),
			id: Some(id),
			method: None,
			params: None,
			result: None,
			error: Some(error),
		}
	}

	/// True for a Request (id + method, no result/error).
	pub fn is_request(&self) -> bool {
		self.id.is_some() && self.method.is_some()
	}

	/// True for a Notification (method, no id).
	pub fn is_notification(&self) -> bool {
		self.id.is_none() && self.method.is_some()
	}

	/// True for a Response (id, no method).
	pub fn is_response(&self) -> bool {
		self.id.is_some() && self.method.is_none()
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use pretty_assertions::assert_eq;

	#[test]
	fn id_roundtrips_number_and_string() {
		let n: RequestId = serde_json::from_value(serde_json::json!(7)).unwrap();
		assert_eq!(n, RequestId::Number(7));
		let s: RequestId = serde_json::from_value(serde_json::json!("abc")).unwrap();
		assert_eq!(s, RequestId::String("abc".into()));
	}

	#[test]
	fn shape_classification() {
		let req = Message::request(RequestId::Number(1), "initialize", serde_json::json!({}));
		assert!(req.is_request());
		assert!(!req.is_notification());
		assert!(!req.is_response());

		let notif = Message::notification("initialized", serde_json::json!({}));
		assert!(notif.is_notification());

		let resp = Message::response_ok(RequestId::Number(1), serde_json::json!({}));
		assert!(resp.is_response());
	}
}
