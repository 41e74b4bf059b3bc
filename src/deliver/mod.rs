//! Message delivery — chunking and sink abstraction.
//!
//! The transport enforces an opaque maximum payload size; [`split_chunks`]
//! keeps every send under the configured limit and [`deliver`] preserves
//! chunk order so the briefing reassembles correctly on the receiving end.

pub mod telegram;

pub use telegram::TelegramSink;

use std::time::Duration;

use async_trait::async_trait;

use crate::error::DeliveryError;

/// Formatting mode requested from the sink.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Formatting {
    Rich,
    Plain,
}

/// Outbound message transport.
#[async_trait]
pub trait MessageSink: Send + Sync {
    async fn send(&self, text: &str, formatting: Formatting) -> Result<(), DeliveryError>;
}

/// Split `text` into contiguous, non-overlapping chunks of exactly `limit`
/// characters (the final chunk may be shorter). Concatenating the chunks
/// reproduces the input exactly.
///
/// The limit counts characters, not bytes, so multi-byte text never splits
/// inside a code point.
pub fn split_chunks(text: &str, limit: usize) -> Vec<&str> {
    assert!(limit > 0, "chunk limit must be positive");

    if text.is_empty() {
        return Vec::new();
    }

    let mut chunks = Vec::new();
    let mut rest = text;
    while !rest.is_empty() {
        let split_at = rest
            .char_indices()
            .nth(limit)
            .map(|(idx, _)| idx)
            .unwrap_or(rest.len());
        let (chunk, tail) = rest.split_at(split_at);
        chunks.push(chunk);
        rest = tail;
    }
    chunks
}

/// Deliver `text` through `sink`, honoring the size limit.
///
/// Under the limit: one rich-formatted send, with a single plain retry if
/// the sink rejects the payload (malformed rich-text syntax). Over the
/// limit: plain chunks in strict sequence with a fixed pause between sends;
/// a failed chunk is logged and the rest are still attempted. Partial
/// delivery is an accepted degraded outcome; an error is returned only when
/// nothing was delivered at all.
pub async fn deliver(
    sink: &dyn MessageSink,
    text: &str,
    limit: usize,
    pause: Duration,
) -> Result<(), DeliveryError> {
    if text.chars().count() < limit {
        return match sink.send(text, Formatting::Rich).await {
            Ok(()) => Ok(()),
            Err(e) => {
                tracing::warn!(error = %e, "Rich send rejected; retrying as plain text");
                sink.send(text, Formatting::Plain).await
            }
        };
    }

    let chunks = split_chunks(text, limit);
    let total = chunks.len();
    let mut failed = 0usize;

    for (index, chunk) in chunks.iter().enumerate() {
        if index > 0 {
            tokio::time::sleep(pause).await;
        }
        if let Err(e) = sink.send(chunk, Formatting::Plain).await {
            failed += 1;
            tracing::warn!(chunk = index + 1, total, error = %e, "Chunk send failed; continuing");
        }
    }

    if failed == total {
        Err(DeliveryError::AllChunksFailed { total })
    } else {
        if failed > 0 {
            tracing::warn!(failed, total, "Delivery completed partially");
        }
        Ok(())
    }
}
