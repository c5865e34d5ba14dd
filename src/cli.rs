//! CLI for the node and directory binaries
//!
use std::net::IpAddr;

use crate::error::Result;
use crate::settings;

#[derive(Clone, Debug, clap::Parser)]
#[command(name = "whispernet", version, about = "Flood text messages to every reachable peer")]
pub struct NodeCli {
    // Directory service address
    #[clap(
        long,
        env("WHISPERNET_DIRECTORY"),
        help = "Directory service address (host:port)"
    )]
    pub directory: String,

    // Peer listener address
    #[clap(
        long,
        env("WHISPERNET_LISTEN_ADDRESS"),
        help = "IP Address to listen on (default: first non-loopback IPv4 address)"
    )]
    pub listen_address: Option<String>,

    // Peer listener port
    #[clap(
        long,
        default_value = settings::DEFAULT_PORT_NODE,
        env("WHISPERNET_LISTEN_PORT"),
        help = "Port to accept peer connections on (0 picks a free port)"
    )]
    pub listen_port: u16,

    #[clap(
        long,
        default_value = settings::DEFAULT_POLL_INTERVAL_MS,
        env("WHISPERNET_POLL_INTERVAL_MS"),
        help = "Milliseconds between directory polls"
    )]
    pub poll_interval_ms: u64,

    #[clap(
        long,
        default_value = settings::DEFAULT_SEND_TIMEOUT_MS,
        env("WHISPERNET_SEND_TIMEOUT_MS"),
        help = "Milliseconds a broadcast waits on a stalled peer before dropping"
    )]
    pub send_timeout_ms: u64,

    #[clap(
        long,
        default_value = settings::DEFAULT_CONNECT_TIMEOUT_MS,
        env("WHISPERNET_CONNECT_TIMEOUT_MS"),
        help = "Milliseconds to wait when dialing a peer"
    )]
    pub connect_timeout_ms: u64,

    #[clap(
        long,
        default_value = settings::DEFAULT_DIRECTORY_TIMEOUT_MS,
        env("WHISPERNET_DIRECTORY_TIMEOUT_MS"),
        help = "Milliseconds to wait on directory requests"
    )]
    pub directory_timeout_ms: u64,

    #[clap(
        long,
        default_value = settings::DEFAULT_TTL_STR,
        env("WHISPERNET_DEFAULT_TTL"),
        help = "Hop budget for locally originated messages"
    )]
    pub default_ttl: u32,

    #[clap(
        long,
        default_value = settings::DEFAULT_SEND_QUEUE_DEPTH,
        env("WHISPERNET_SEND_QUEUE_DEPTH"),
        help = "Outbound queue capacity per peer link"
    )]
    pub send_queue_depth: usize,
}

impl NodeCli {
    pub fn into_settings(self) -> Result<settings::NodeSettings> {
        if self.directory.trim().is_empty() {
            return Err(crate::config_error!("--directory must not be empty"));
        }
        if self.send_queue_depth == 0 {
            return Err(crate::config_error!("--send-queue-depth must be at least 1"));
        }
        let listen_address = self
            .listen_address
            .as_deref()
            .map(|addr| {
                addr.parse::<IpAddr>()
                    .map_err(|e| crate::config_error!("Invalid listen address {}: {}", addr, e))
            })
            .transpose()?;

        Ok(settings::NodeSettings {
            directory: self.directory,
            listen_address,
            listen_port: self.listen_port,
            poll_interval_ms: self.poll_interval_ms,
            send_timeout_ms: self.send_timeout_ms,
            connect_timeout_ms: self.connect_timeout_ms,
            directory_timeout_ms: self.directory_timeout_ms,
            default_ttl: self.default_ttl,
            send_queue_depth: self.send_queue_depth,
        })
    }
}

#[derive(Clone, Debug, clap::Parser)]
#[command(name = "whispernet-directory", version, about = "Peer directory for whispernet")]
pub struct DirectoryCli {
    // Server listen address
    #[clap(
        long,
        default_value = "0.0.0.0",
        env("WHISPERNET_DIRECTORY_LISTEN_ADDRESS"),
        help = "IP Address to listen on"
    )]
    pub listen_address: String,

    // HTTP API listen port
    #[clap(
        long,
        default_value = settings::DEFAULT_PORT_DIRECTORY,
        env("WHISPERNET_DIRECTORY_LISTEN_PORT"),
        help = "Port to bind the directory HTTP API to"
    )]
    pub listen_port: u16,

    #[clap(
        long,
        default_value_t = true,
        action = clap::ArgAction::Set,
        env("WHISPERNET_PROBE_ENABLED"),
        help = "Probe registered peers and drop the unreachable ones"
    )]
    pub probe_enabled: bool,

    #[clap(
        long,
        default_value = settings::DEFAULT_PROBE_INTERVAL_MS,
        env("WHISPERNET_PROBE_INTERVAL_MS"),
        help = "Milliseconds between liveness probe rounds"
    )]
    pub probe_interval_ms: u64,

    #[clap(
        long,
        default_value = settings::DEFAULT_PROBE_TIMEOUT_MS,
        env("WHISPERNET_PROBE_TIMEOUT_MS"),
        help = "Milliseconds a single probe may spend connecting"
    )]
    pub probe_timeout_ms: u64,
}

impl DirectoryCli {
    pub fn into_settings(self) -> Result<settings::DirectorySettings> {
        let listen_address = self.listen_address.parse::<IpAddr>().map_err(|e| {
            crate::config_error!("Invalid listen address {}: {}", self.listen_address, e)
        })?;
        Ok(settings::DirectorySettings {
            listen_address,
            listen_port: self.listen_port,
            probe_enabled: self.probe_enabled,
            probe_interval_ms: self.probe_interval_ms,
            probe_timeout_ms: self.probe_timeout_ms,
        })
    }
}
