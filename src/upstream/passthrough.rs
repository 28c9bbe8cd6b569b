//! Byte-bounded pass-through between the upstream body and the client.
//!
//! A pump task reads the upstream body and hands chunks to the consumer
//! through a channel. Each chunk holds semaphore permits for its size, so at
//! most `high_water_mark` unconsumed bytes sit between the two sides; the
//! pump stops reading until the consumer catches up.

use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use bytes::{Bytes, BytesMut};
use futures_util::{Stream, StreamExt};
use tokio::sync::{mpsc, OwnedSemaphorePermit, Semaphore};
use tracing::Instrument;

use super::UpstreamError;

/// Default high-water mark: 1 MiB.
pub const DEFAULT_HIGH_WATER_MARK: usize = 1024 * 1024;

const CHANNEL_DEPTH: usize = 64;

/// How the pump finished.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamOutcome {
    /// Upstream body ended normally.
    Completed { bytes: u64 },
    /// Upstream body failed; the error was handed to the consumer.
    Failed(String),
    /// Consumer went away before the upstream body ended.
    ConsumerDropped { bytes: u64 },
}

struct Chunk {
    bytes: Bytes,
    _permit: OwnedSemaphorePermit,
}

/// Consumer side of the pass-through.
pub struct PassThrough {
    rx: mpsc::Receiver<Result<Chunk, UpstreamError>>,
    budget: Arc<Semaphore>,
    high_water_mark: usize,
}

impl PassThrough {
    /// Start pumping `source`. `on_finish` runs exactly once, after the source
    /// has been dropped.
    pub fn spawn<S, F>(source: S, high_water_mark: usize, on_finish: F) -> Self
    where
        S: Stream<Item = Result<Bytes, UpstreamError>> + Send + 'static,
        F: FnOnce(StreamOutcome) + Send + 'static,
    {
        let high_water_mark = high_water_mark.max(1);
        let budget = Arc::new(Semaphore::new(high_water_mark));
        let (tx, rx) = mpsc::channel(CHANNEL_DEPTH);

        tokio::spawn(
            pump(source, tx, Arc::clone(&budget), high_water_mark, on_finish)
                .instrument(tracing::Span::current()),
        );

        Self {
            rx,
            budget,
            high_water_mark,
        }
    }

    /// Bytes read from upstream but not yet taken by the consumer.
    pub fn buffered_bytes(&self) -> usize {
        self.high_water_mark - self.budget.available_permits()
    }

    /// Drain the whole body into memory.
    pub async fn collect(mut self) -> Result<Bytes, UpstreamError> {
        let mut body = BytesMut::new();
        while let Some(chunk) = self.next().await {
            body.extend_from_slice(&chunk?);
        }
        Ok(body.freeze())
    }
}

impl Stream for PassThrough {
    type Item = Result<Bytes, UpstreamError>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.rx
            .poll_recv(cx)
            .map(|item| item.map(|result| result.map(|chunk| chunk.bytes)))
    }
}

async fn pump<S, F>(
    source: S,
    tx: mpsc::Sender<Result<Chunk, UpstreamError>>,
    budget: Arc<Semaphore>,
    high_water_mark: usize,
    on_finish: F,
) where
    S: Stream<Item = Result<Bytes, UpstreamError>> + Send + 'static,
    F: FnOnce(StreamOutcome) + Send + 'static,
{
    let mut source = Box::pin(source);
    let mut forwarded: u64 = 0;

    let outcome = loop {
        let next = tokio::select! {
            _ = tx.closed() => break StreamOutcome::ConsumerDropped { bytes: forwarded },
            next = source.next() => next,
        };

        match next {
            None => break StreamOutcome::Completed { bytes: forwarded },
            Some(Ok(bytes)) if bytes.is_empty() => continue,
            Some(Ok(bytes)) => {
                let wanted = u32::try_from(bytes.len().min(high_water_mark)).unwrap_or(u32::MAX);
                let permit = tokio::select! {
                    _ = tx.closed() => break StreamOutcome::ConsumerDropped { bytes: forwarded },
                    permit = Arc::clone(&budget).acquire_many_owned(wanted) => permit,
                };
                let Ok(permit) = permit else {
                    break StreamOutcome::ConsumerDropped { bytes: forwarded };
                };

                let len = bytes.len() as u64;
                if tx.send(Ok(Chunk { bytes, _permit: permit })).await.is_err() {
                    break StreamOutcome::ConsumerDropped { bytes: forwarded };
                }
                forwarded += len;
            }
            Some(Err(error)) => {
                let message = error.to_string();
                let _ = tx.send(Err(error)).await;
                break StreamOutcome::Failed(message);
            }
        }
    };

    drop(source);
    on_finish(outcome);
}
