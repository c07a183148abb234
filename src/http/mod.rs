//! HTTP plumbing for webhook testing
//!
//! Provides the shared HTTP client and payload signing.

mod client;
mod signature;

pub use client::{HttpClient, HttpError, HttpRequest, HttpResponse};
pub use signature::sign;
#[cfg(test)]
pub use signature::verify;
