//! Wire-format data model and framing for the LSP base protocol.
//!
//! This crate owns exactly the pieces that are independent of *which*
//! downstream server a message belongs to: the
//! `Content-Length`-framed codec (`Framer`) and the JSON-RPC `Message`
//! shape. Everything that needs to know about multiple servers lives in
//! `proxy-core`.

mod error;
mod framer;
mod message;

pub use error::{Error, Result};
pub use framer::{encode, write_message, FramedRead, Framer};
pub use message::{Message, RequestId, ResponseError};
