//! The two concrete [`proxy_core::Transport`] adapters a downstream server
//! can be reached through: child-process stdio and a TCP client socket.
//! Neither the Router nor the Dispatcher know these types exist — they
//! only ever see the `Transport`, `MessageSource`, and `MessageSink` trait
//! objects `proxy-core` defines.
//!
//! Piped stdio, inherited stderr, a child handle kept separately from the
//! stdio halves handed to the message pump.

mod process;
mod stdio;
mod tcp;

pub use process::ProcessTransport;
pub use stdio::StdioTransport;
pub use tcp::TcpTransport;
