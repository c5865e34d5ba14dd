//! Peer directory: the rendezvous list nodes register with and poll

pub mod client;
pub mod prober;
pub mod store;

pub use client::DirectoryClient;
pub use prober::{LivenessProber, Probe, ProbeReport, TcpProbe};
pub use store::DirectoryStore;
