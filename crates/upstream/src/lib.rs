//! Upstream implementations for ChatBridge.
//!
//! All upstreams implement the `chatbridge_core::Upstream` trait.

pub mod simplifique;

pub use simplifique::SimplifiqueClient;
