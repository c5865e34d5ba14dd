//! The flooded message record and its identifiers
use rand::Rng;
use serde::{Deserialize, Serialize};

/// A text message flooded through the network.
///
/// Field names on the wire are `ID`, `Body` and `TTL`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    #[serde(rename = "ID")]
    pub id: String,
    #[serde(rename = "Body")]
    pub body: String,
    /// Remaining hop budget
    #[serde(rename = "TTL")]
    pub ttl: u32,
}

impl Message {
    pub fn new(id: impl Into<String>, body: impl Into<String>, ttl: u32) -> Self {
        Self {
            id: id.into(),
            body: body.into(),
            ttl,
        }
    }

    /// Build a message originating at this node with a fresh random ID
    pub fn originate(body: impl Into<String>, ttl: u32) -> Self {
        Self::new(random_id(), body, ttl)
    }

    /// The copy this node re-broadcasts, or `None` once the hop budget is spent
    pub fn forwarded(&self) -> Option<Message> {
        self.ttl.checked_sub(1).map(|ttl| Message {
            ttl,
            ..self.clone()
        })
    }
}

/// 128 random bits rendered as 32 lowercase hex characters
pub fn random_id() -> String {
    let mut rng = rand::thread_rng();
    format!("{:016x}{:016x}", rng.gen::<u64>(), rng.gen::<u64>())
}
