//! Conversion between the Messages API and the Cloud Code backend.
//!
//! None of these functions fail: malformed input degrades to pass-through or
//! empty defaults.

pub mod content;
pub mod request;
pub mod response;
pub mod schema;

pub use content::{convert_role, to_backend_parts, to_frontend_content};
pub use request::{ModelMap, build_request};
pub use response::convert_response;
pub use schema::sanitize_schema;
