//! Qase test-management integration
//!
//! Provides the API client and the case id lookup used when building
//! report entries.

mod client;
mod lookup;

pub use client::QaseClient;
pub use lookup::{CaseIdLookup, NoCaseIds};
