//! Shared types for the Spring Insight realtime client
//!
//! This crate contains the types exchanged with the Spring Insight UI backend:
//! - Live channel message envelopes and payloads
//! - Outbound commands and topic names
//! - Client configuration

pub mod config;
pub mod messages;

pub use config::*;
pub use messages::*;
