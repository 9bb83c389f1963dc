//! Relay webhooks: HTTP client, response decoding, and errors.

mod client;
mod error;
mod response;

pub use client::{Attachment, ChatRequest, Endpoints, RelayClient, WireUser};
pub use error::RelayError;
pub use response::{RelayResponse, Sentinel};
