//! Shared networking infrastructure.

pub mod client;

pub use client::{HttpClient, HttpClientBuilder, identity_headers};
