//! Newline-delimited JSON framing for [`Message`] streams.
//!
//! Each record is one JSON object followed by `\n`. Blank lines between
//! records are skipped. A trailing record without a newline is still decoded
//! when the stream ends.
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt, BufReader};

use crate::error::{Result, SerializationError};
use crate::message::Message;
use crate::settings::MAX_FRAME_BYTES;

/// Writes messages to a stream in enqueue order
pub struct MessageEncoder<W> {
    writer: W,
    buf: Vec<u8>,
}

impl<W: AsyncWrite + Unpin> MessageEncoder<W> {
    pub fn new(writer: W) -> Self {
        Self {
            writer,
            buf: Vec::with_capacity(256),
        }
    }

    pub async fn send(&mut self, message: &Message) -> Result<()> {
        self.buf.clear();
        serde_json::to_writer(&mut self.buf, message)?;
        self.buf.push(b'\n');
        self.writer.write_all(&self.buf).await?;
        self.writer.flush().await?;
        Ok(())
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

/// Reads messages off a stream one record at a time
pub struct MessageDecoder<R> {
    reader: BufReader<R>,
    buf: Vec<u8>,
}

impl<R: AsyncRead + Unpin> MessageDecoder<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader: BufReader::new(reader),
            buf: Vec::with_capacity(256),
        }
    }

    /// Decode the next message.
    ///
    /// `Ok(None)` is a clean end of stream. Malformed or oversized records are
    /// errors and leave the decoder at an unspecified position, so callers
    /// should stop reading.
    pub async fn next_message(&mut self) -> Result<Option<Message>> {
        loop {
            self.buf.clear();
            let limit = (MAX_FRAME_BYTES + 1) as u64;
            let read = (&mut self.reader)
                .take(limit)
                .read_until(b'\n', &mut self.buf)
                .await?;
            if read == 0 {
                return Ok(None);
            }

            let terminated = self.buf.last() == Some(&b'\n');
            if !terminated && self.buf.len() > MAX_FRAME_BYTES {
                return Err(SerializationError::FrameTooLarge(self.buf.len()).into());
            }
            if self.buf.iter().all(u8::is_ascii_whitespace) {
                if terminated {
                    continue;
                }
                return Ok(None);
            }

            let message = serde_json::from_slice::<Message>(&self.buf)?;
            return Ok(Some(message));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::WhisperError;

    async fn decode_all(input: &[u8]) -> (Vec<Message>, Option<WhisperError>) {
        let mut decoder = MessageDecoder::new(input);
        let mut out = Vec::new();
        loop {
            match decoder.next_message().await {
                Ok(Some(msg)) => out.push(msg),
                Ok(None) => return (out, None),
                Err(e) => return (out, Some(e)),
            }
        }
    }

    #[tokio::test]
    async fn test_encoder_writes_one_line_per_message() {
        let mut encoder = MessageEncoder::new(Vec::new());
        encoder.send(&Message::new("a", "first", 5)).await.unwrap();
        encoder.send(&Message::new("b", "second", 4)).await.unwrap();

        let written = String::from_utf8(encoder.into_inner()).unwrap();
        assert_eq!(
            written,
            "{\"ID\":\"a\",\"Body\":\"first\",\"TTL\":5}\n{\"ID\":\"b\",\"Body\":\"second\",\"TTL\":4}\n"
        );
    }

    #[tokio::test]
    async fn test_decoder_preserves_stream_order() {
        let mut encoder = MessageEncoder::new(Vec::new());
        for i in 0..10 {
            encoder
                .send(&Message::new(format!("id-{}", i), "body", 3))
                .await
                .unwrap();
        }
        let bytes = encoder.into_inner();

        let (messages, err) = decode_all(&bytes).await;
        assert!(err.is_none());
        let ids: Vec<_> = messages.iter().map(|m| m.id.as_str()).collect();
        let expected: Vec<String> = (0..10).map(|i| format!("id-{}", i)).collect();
        assert_eq!(ids, expected);
    }

    #[tokio::test]
    async fn test_decoder_clean_eof() {
        let (messages, err) = decode_all(b"").await;
        assert!(messages.is_empty());
        assert!(err.is_none());

        // blank lines are not records
        let (messages, err) = decode_all(b"\n\n  \n").await;
        assert!(messages.is_empty());
        assert!(err.is_none());
    }

    #[tokio::test]
    async fn test_decoder_accepts_unterminated_final_record() {
        let (messages, err) = decode_all(br#"{"ID":"x","Body":"hi","TTL":2}"#).await;
        assert!(err.is_none());
        assert_eq!(messages, vec![Message::new("x", "hi", 2)]);
    }

    #[tokio::test]
    async fn test_decoder_stops_on_garbage() {
        let input = b"{\"ID\":\"x\",\"Body\":\"hi\",\"TTL\":2}\nnot json\n{\"ID\":\"y\",\"Body\":\"hi\",\"TTL\":2}\n";
        let (messages, err) = decode_all(input).await;

        assert_eq!(messages.len(), 1);
        assert!(matches!(
            err,
            Some(WhisperError::Serialization(SerializationError::Json(_)))
        ));
    }

    #[tokio::test]
    async fn test_decoder_truncated_record_is_an_error() {
        let (messages, err) = decode_all(br#"{"ID":"x","Bo"#).await;
        assert!(messages.is_empty());
        assert!(err.is_some());
    }

    #[tokio::test]
    async fn test_decoder_rejects_oversized_frame() {
        let mut input = vec![b'a'; MAX_FRAME_BYTES + 10];
        input.push(b'\n');
        let (_, err) = decode_all(&input).await;

        assert!(matches!(
            err,
            Some(WhisperError::Serialization(SerializationError::FrameTooLarge(_)))
        ));
    }
}
