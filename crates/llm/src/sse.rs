//! SSE Stream Pump
//!
//! Reads a streaming HTTP response line by line on a background task, runs
//! each line through a provider adapter and forwards the unified events over
//! a bounded channel. Dropping the returned stream closes the channel, which
//! stops the task at its next send.

use futures_util::StreamExt;
use rag_pipeline_core::streaming::{StreamAdapter, UnifiedStreamEvent};
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;

use crate::types::EventStream;

/// Buffered events between the reader task and the consumer.
const STREAM_CHANNEL_CAPACITY: usize = 64;

/// Spawn the reader task for `response` and return the event stream.
pub(crate) fn spawn_event_stream(
    response: reqwest::Response,
    mut adapter: Box<dyn StreamAdapter>,
) -> EventStream {
    let (tx, rx) = mpsc::channel(STREAM_CHANNEL_CAPACITY);

    tokio::spawn(async move {
        let provider = adapter.provider_name();
        let mut body = response.bytes_stream();
        let mut buffer: Vec<u8> = Vec::new();

        while let Some(chunk) = body.next().await {
            let chunk = match chunk {
                Ok(chunk) => chunk,
                Err(e) => {
                    tracing::warn!(provider, error = %e, "stream body failed");
                    let _ = tx
                        .send(UnifiedStreamEvent::error(format!("Network error: {}", e)))
                        .await;
                    return;
                }
            };
            buffer.extend_from_slice(&chunk);

            while let Some(line) = take_line(&mut buffer) {
                if !forward_line(adapter.as_mut(), &line, &tx).await {
                    return;
                }
            }
        }

        // Flush a final line that arrived without a trailing newline.
        if !buffer.is_empty() {
            let line = String::from_utf8_lossy(&buffer).into_owned();
            if !forward_line(adapter.as_mut(), &line, &tx).await {
                return;
            }
        }

        let _ = tx
            .send(UnifiedStreamEvent::Complete { stop_reason: None })
            .await;
    });

    ReceiverStream::new(rx).boxed()
}

/// Remove and return the next complete line from `buffer`.
fn take_line(buffer: &mut Vec<u8>) -> Option<String> {
    let end = buffer.iter().position(|b| *b == b'\n')?;
    let line: Vec<u8> = buffer.drain(..=end).collect();
    Some(String::from_utf8_lossy(&line).into_owned())
}

/// Adapt one line and send its events. Returns false once the stream is over.
async fn forward_line(
    adapter: &mut dyn StreamAdapter,
    line: &str,
    tx: &mpsc::Sender<UnifiedStreamEvent>,
) -> bool {
    let line = line.trim();
    if line.is_empty() {
        return true;
    }

    let events = match adapter.adapt(line) {
        Ok(events) => events,
        Err(e) => vec![UnifiedStreamEvent::error(e.to_string())],
    };

    for event in events {
        let terminal = event.is_terminal();
        if tx.send(event).await.is_err() {
            tracing::debug!(
                provider = adapter.provider_name(),
                "stream receiver dropped, stopping reader"
            );
            return false;
        }
        if terminal {
            return false;
        }
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_take_line_splits_on_newline() {
        let mut buffer = b"data: one\ndata: tw".to_vec();
        assert_eq!(take_line(&mut buffer).as_deref(), Some("data: one\n"));
        assert_eq!(take_line(&mut buffer), None);
        assert_eq!(buffer, b"data: tw".to_vec());
    }

    #[test]
    fn test_take_line_keeps_multibyte_characters_whole() {
        // "é" split across two network chunks must survive once the line completes.
        let mut buffer = vec![b'c', b'a', b'f', 0xC3];
        assert_eq!(take_line(&mut buffer), None);
        buffer.extend_from_slice(&[0xA9, b'\n']);
        assert_eq!(take_line(&mut buffer).as_deref(), Some("café\n"));
    }
}
