use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tracing::debug;

use super::flood::FloodEngine;
use crate::error::Result;

/// Originate one message per input line until the input ends.
///
/// Returns the number of lines sent. Read errors are returned to the caller.
pub async fn read_input<R>(reader: R, engine: &FloodEngine) -> Result<usize>
where
    R: AsyncBufRead + Unpin,
{
    let mut lines = reader.lines();
    let mut sent = 0;
    while let Some(line) = lines.next_line().await? {
        let (message, fanout) = engine.originate(line)?;
        debug!("Sent {} to {} peers", message.id, fanout);
        sent += 1;
    }
    Ok(sent)
}
