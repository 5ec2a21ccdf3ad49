//! The proxy engine: `ServerState`, `Router`, `Dispatcher`, and the
//! `Transport` contract they're built against.
//!
//! Everything that needs to know "there are N downstream servers" lives
//! here; the wire codec and task-fan-in primitive it's built from live in
//! `proxy-rpc` and `proxy-worker`, and the concrete transports and
//! configuration loader that drive it live one layer up, in
//! `proxy-transport` / `proxy-config` / the `lsp-proxy` binary.

mod capabilities;
mod dispatcher;
mod error;
mod methods;
mod router;
mod server_state;
mod service;
mod transport;

pub use dispatcher::Dispatcher;
pub use error::{Error, Result};
pub use router::{Destination, Feature, Origin, Outgoing, Router};
pub use server_state::{ServerConfig, ServerState};
pub use transport::{MessageSink, MessageSource, ServerId, Transport};
