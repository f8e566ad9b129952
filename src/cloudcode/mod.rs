//! Cloud Code gateway core.
//!
//! Translates Anthropic Messages API requests into the Cloud Code
//! `generateContent` envelope, delivers them across the backend hosts, and
//! converts the answer back, either as one JSON message or as a synthesized
//! event stream.

pub mod client;
pub mod constants;
pub mod convert;
pub mod discovery;
pub mod dispatch;
pub mod error;
pub mod models;
pub mod synth;
pub mod transport;

pub use client::{CloudCodeClient, CloudCodeClientBuilder};
pub use discovery::{ProjectCache, ProjectResolver};
pub use dispatch::Dispatcher;
pub use error::{GatewayError, Result};
pub use models::{ContentBlock, MessagesRequest, MessagesResponse, StreamEvent};
pub use synth::{EventStream, synthesize};
pub use transport::{HttpTransport, RawResponse, Transport};
