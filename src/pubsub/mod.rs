//! Delivery confirmation over Pub/Sub
//!
//! Provides the subscription seam, the REST pull transport, and the
//! correlator that waits for a matching delivery event.

mod correlator;
#[cfg(test)]
pub(crate) mod memory;
mod rest;
mod subscription;

pub use correlator::Correlator;
pub use rest::RestSubscription;
