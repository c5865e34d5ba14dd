//! All Paths are recorded here for use throughout this codebase
pub mod base {
    pub const ROOT: &str = "/";
    pub const HEALTH: &str = "/health";
    pub const ABOUT: &str = "/about";
}

/// Node registration: `POST /hello?addr=<host:port>`
pub const HELLO: &str = "/hello";
/// Peer listing: `GET /peers`
pub const PEERS: &str = "/peers";
