//! Safe nested lookups against a cached `initialize` response: capability
//! queries that yield absent rather than failing when a key is missing.

use serde_json::Value;

/// Walks a chain of object keys, returning `None` instead of panicking or
/// erroring at any step that isn't an object or doesn't have the key.
pub fn get<'a>(root: &'a Value, path: &[&str]) -> Option<&'a Value> {
	let mut current = root;
	for segment in path {
		current = current.as_object()?.get(*segment)?;
	}
	Some(current)
}

fn truthy(v: &Value) -> bool {
	!matches!(v, Value::Bool(false) | Value::Null)
}

pub fn document_formatting_provider(init: &Value) -> bool {
	get(init, &["capabilities", "documentFormattingProvider"]).is_some_and(truthy)
}

pub fn completion_provider(init: &Value) -> bool {
	get(init, &["capabilities", "completionProvider"]).is_some_and(truthy)
}

pub fn signature_help_provider(init: &Value) -> bool {
	get(init, &["capabilities", "signatureHelpProvider"]).is_some_and(truthy)
}

pub fn code_action_provider(init: &Value) -> bool {
	get(init, &["capabilities", "codeActionProvider"]).is_some_and(truthy)
}

pub fn code_action_kinds(init: &Value) -> Vec<String> {
	get(init, &["capabilities", "codeActionProvider", "codeActionKinds"])
		.and_then(Value::as_array)
		.map(|kinds| kinds.iter().filter_map(Value::as_str).map(str::to_owned).collect())
		.unwrap_or_default()
}

pub fn execute_command_commands(init: &Value) -> Vec<String> {
	get(init, &["capabilities", "executeCommandProvider", "commands"])
		.and_then(Value::as_array)
		.map(|cmds| cmds.iter().filter_map(Value::as_str).map(str::to_owned).collect())
		.unwrap_or_default()
}

/// Stable-order deduplication for merged capability lists.
pub fn dedup_preserve_order(items: Vec<String>) -> Vec<String> {
	let mut seen = std::collections::HashSet::new();
	items.into_iter().filter(|item| seen.insert(item.clone())).collect()
}
