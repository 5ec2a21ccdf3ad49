//! Method-name tables for the filter rule and the special-cased
//! routes. Names are taken from `lsp-types`'s request and
//! notification markers rather than written out as string literals, so a
//! typo in a method name is a compile error rather than a silent gap in
//! the filter rule.

use lsp_types::notification::Notification as _;
use lsp_types::request::Request as _;

pub const INITIALIZE: &str = lsp_types::request::Initialize::METHOD;
pub const SHUTDOWN: &str = lsp_types::request::Shutdown::METHOD;
pub const SHOW_MESSAGE_REQUEST: &str = lsp_types::request::ShowMessageRequest::METHOD;
pub const SHOW_DOCUMENT: &str = lsp_types::request::ShowDocument::METHOD;
pub const WORKSPACE_FOLDERS: &str = lsp_types::request::WorkspaceFoldersRequest::METHOD;
pub const APPLY_WORKSPACE_EDIT: &str = lsp_types::request::ApplyWorkspaceEdit::METHOD;
pub const FORMATTING: &str = lsp_types::request::Formatting::METHOD;
pub const RANGE_FORMATTING: &str = lsp_types::request::RangeFormatting::METHOD;
pub const COMPLETION: &str = lsp_types::request::Completion::METHOD;
pub const RESOLVE_COMPLETION_ITEM: &str = lsp_types::request::ResolveCompletionItem::METHOD;
pub const SIGNATURE_HELP: &str = lsp_types::request::SignatureHelpRequest::METHOD;
pub const CODE_ACTION: &str = lsp_types::request::CodeActionRequest::METHOD;
pub const EXECUTE_COMMAND: &str = lsp_types::request::ExecuteCommand::METHOD;

pub const INITIALIZED: &str = lsp_types::notification::Initialized::METHOD;
pub const EXIT: &str = lsp_types::notification::Exit::METHOD;
pub const DID_OPEN: &str = lsp_types::notification::DidOpenTextDocument::METHOD;
pub const DID_CHANGE: &str = lsp_types::notification::DidChangeTextDocument::METHOD;
pub const DID_SAVE: &str = lsp_types::notification::DidSaveTextDocument::METHOD;
pub const DID_CLOSE: &str = lsp_types::notification::DidCloseTextDocument::METHOD;
pub const DID_CHANGE_WORKSPACE_FOLDERS: &str = lsp_types::notification::DidChangeWorkspaceFolders::METHOD;
pub const DID_CHANGE_CONFIGURATION: &str = lsp_types::notification::DidChangeConfiguration::METHOD;

pub const PUBLISH_DIAGNOSTICS: &str = lsp_types::notification::PublishDiagnostics::METHOD;
pub const SHOW_MESSAGE: &str = lsp_types::notification::ShowMessage::METHOD;
pub const LOG_MESSAGE: &str = lsp_types::notification::LogMessage::METHOD;

/// Preserved request methods, identical in both directions.
pub const PRESERVED_REQUESTS: &[&str] = &[
	INITIALIZE,
	SHUTDOWN,
	SHOW_MESSAGE_REQUEST,
	SHOW_DOCUMENT,
	WORKSPACE_FOLDERS,
	APPLY_WORKSPACE_EDIT,
	FORMATTING,
	RANGE_FORMATTING,
	COMPLETION,
	RESOLVE_COMPLETION_ITEM,
	SIGNATURE_HELP,
	CODE_ACTION,
	EXECUTE_COMMAND,
];

/// Preserved client→server notifications.
///
/// `window/workDoneProgress/create` and `…/cancel` are deliberately
/// absent from this list.
pub const PRESERVED_C2S_NOTIFICATIONS: &[&str] = &[
	INITIALIZED,
	EXIT,
	DID_OPEN,
	DID_CHANGE,
	DID_SAVE,
	DID_CLOSE,
	DID_CHANGE_WORKSPACE_FOLDERS,
	DID_CHANGE_CONFIGURATION,
];

/// Preserved server→client notifications.
pub const PRESERVED_S2C_NOTIFICATIONS: &[&str] = &[PUBLISH_DIAGNOSTICS, SHOW_MESSAGE, LOG_MESSAGE];
