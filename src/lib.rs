//! whispernet: a minimal peer-to-peer flood broadcast network.
//!
//! Nodes find each other through a small HTTP directory, keep one outbound
//! TCP link per peer, and flood every text message to all of them. Duplicate
//! suppression by message ID and a hop-count TTL bound the traffic.

pub mod api;
pub mod cli;
pub mod directory;
pub mod error;
pub mod message;
pub mod node;
pub mod settings;
pub mod transport;

pub use error::{Result, WhisperError};
pub use message::Message;
