//! The change subscription streamer.
//!
//! Hands a client connection over to the consensus set: a dedicated task
//! registers a channel sink with the set and, at the same time, pumps every
//! delivered change onto the connection. The caller only waits for the
//! registration outcome.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use tokio::io::AsyncWrite;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use siagate_consensus::{CancelSignal, ConsensusError, ConsensusSet, SubscriberId};
use siagate_core::ConsensusChangeId;

use crate::codec::ChangeEncoder;
use crate::config::StreamConfig;
use crate::error::{Result, StreamError};

/// Summary of a finished stream.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StreamReport {
    /// Number of changes written to the connection.
    pub changes_written: usize,
    /// Whether the stream ended because its cancel signal fired.
    pub cancelled: bool,
    /// Why the stream ended, if not by cancellation.
    pub error: Option<String>,
}

/// Unsubscribes from the consensus set when dropped.
///
/// Owned by the streaming task, so unsubscribe runs exactly once however the
/// task ends: cancellation, registry error, write failure, abort or panic.
pub struct SubscriptionGuard {
    consensus: Arc<dyn ConsensusSet>,
    subscriber: SubscriberId,
}

impl SubscriptionGuard {
    pub fn new(consensus: Arc<dyn ConsensusSet>, subscriber: SubscriberId) -> Self {
        Self {
            consensus,
            subscriber,
        }
    }
}

impl Drop for SubscriptionGuard {
    fn drop(&mut self) {
        self.consensus.unsubscribe(self.subscriber);
        info!(subscriber = %self.subscriber, "unsubscribed");
    }
}

/// A live subscription.
#[derive(Debug)]
pub struct SubscriptionHandle {
    subscriber: SubscriberId,
    task: JoinHandle<StreamReport>,
}

impl SubscriptionHandle {
    pub fn subscriber(&self) -> SubscriberId {
        self.subscriber
    }

    /// Wait for the stream to end.
    pub async fn join(self) -> Result<StreamReport> {
        self.task
            .await
            .map_err(|e| StreamError::Join(e.to_string()))
    }

    /// Stop the stream without waiting. The guard still unsubscribes.
    pub fn abort(&self) {
        self.task.abort();
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}

/// How the push loop ended.
enum PumpEnd {
    Cancelled,
    /// The consensus set dropped the sink, typically because the connection
    /// fell too far behind.
    Closed,
    WriteFailed(StreamError),
}

/// How registration with the consensus set ended.
enum Registration {
    Done,
    /// Refused before anything was written.
    Refused,
    /// Failed after part of the catch-up was already written.
    FailedLive(ConsensusError),
}

/// Streams consensus changes from a consensus set to client connections.
#[derive(Clone)]
pub struct ChangeStreamer {
    consensus: Arc<dyn ConsensusSet>,
    config: StreamConfig,
}

impl ChangeStreamer {
    pub fn new(consensus: Arc<dyn ConsensusSet>, config: StreamConfig) -> Self {
        Self { consensus, config }
    }

    /// Start streaming every change after `start` to `writer`.
    ///
    /// Returns once the consensus set has accepted the subscription (catch-up
    /// included) or refused it. A refusal before any change was written comes
    /// back as [`StreamError::Registry`]; anything later is only reported
    /// through the handle's [`StreamReport`].
    pub async fn subscribe<W>(
        &self,
        start: ConsensusChangeId,
        writer: W,
        cancel: CancelSignal,
    ) -> Result<SubscriptionHandle>
    where
        W: AsyncWrite + Unpin + Send + 'static,
    {
        let subscriber = SubscriberId::random();
        let guard = SubscriptionGuard::new(Arc::clone(&self.consensus), subscriber);
        let (ready_tx, ready_rx) = oneshot::channel();
        let consensus = Arc::clone(&self.consensus);
        let config = self.config.clone();

        info!(subscriber = %subscriber, start = %start, "subscription requested");
        let task = tokio::spawn(run_stream(
            consensus, guard, subscriber, start, writer, cancel, config, ready_tx,
        ));

        match ready_rx.await {
            Ok(Ok(())) => Ok(SubscriptionHandle { subscriber, task }),
            Ok(Err(e)) => {
                // let the task finish so the guard has run before we return
                let _ = task.await;
                Err(StreamError::Registry(e))
            }
            Err(_) => match task.await {
                Ok(report) => Err(StreamError::Join(
                    report
                        .error
                        .unwrap_or_else(|| "stream ended before registration".into()),
                )),
                Err(e) => Err(StreamError::Join(e.to_string())),
            },
        }
    }
}

#[allow(clippy::too_many_arguments)]
async fn run_stream<W>(
    consensus: Arc<dyn ConsensusSet>,
    guard: SubscriptionGuard,
    subscriber: SubscriberId,
    start: ConsensusChangeId,
    writer: W,
    cancel: CancelSignal,
    config: StreamConfig,
    ready_tx: oneshot::Sender<std::result::Result<(), ConsensusError>>,
) -> StreamReport
where
    W: AsyncWrite + Unpin + Send + 'static,
{
    let _guard = guard;
    let (sink, mut rx) = mpsc::channel(config.channel_capacity.max(1));
    let written = AtomicUsize::new(0);
    let written = &written;

    let register = {
        let cancel = cancel.clone();
        async move {
            let res = consensus
                .consensus_set_subscribe(subscriber, start, sink, cancel)
                .await;
            match res {
                Ok(()) => {
                    let _ = ready_tx.send(Ok(()));
                    Registration::Done
                }
                // the consumer side ended the stream; the pump reports why
                Err(ConsensusError::Cancelled | ConsensusError::SubscriberClosed) => {
                    let _ = ready_tx.send(Ok(()));
                    Registration::Done
                }
                Err(e) if written.load(Ordering::SeqCst) > 0 => {
                    let _ = ready_tx.send(Ok(()));
                    Registration::FailedLive(e)
                }
                Err(e) => {
                    let _ = ready_tx.send(Err(e));
                    Registration::Refused
                }
            }
        }
    };

    let pump = {
        let mut cancel = cancel;
        async move {
            let mut encoder = ChangeEncoder::new(writer, config.flush_each_change);
            let end = loop {
                let next = tokio::select! {
                    biased;
                    _ = cancel.cancelled() => break PumpEnd::Cancelled,
                    next = rx.recv() => next,
                };
                let Some(change) = next else {
                    break PumpEnd::Closed;
                };
                if let Err(e) = encoder.encode(&change).await {
                    break PumpEnd::WriteFailed(e);
                }
                written.fetch_add(1, Ordering::SeqCst);
                debug!(subscriber = %subscriber, change_id = %change.id, "change written");
            };
            // rx is dropped here, so a blocked delivery fails instead of waiting
            drop(rx);
            if let Err(e) = encoder.close().await {
                debug!(subscriber = %subscriber, error = %e, "closing stream failed");
            }
            end
        }
    };

    let (registration, end) = tokio::join!(register, pump);

    let mut report = StreamReport {
        changes_written: written.load(Ordering::SeqCst),
        ..StreamReport::default()
    };
    match end {
        PumpEnd::Cancelled => report.cancelled = true,
        PumpEnd::WriteFailed(e) => {
            warn!(subscriber = %subscriber, error = %e, "write to subscriber failed");
            report.error = Some(e.to_string());
        }
        PumpEnd::Closed => match registration {
            // the caller already has the error
            Registration::Refused => {}
            Registration::FailedLive(e) => {
                warn!(subscriber = %subscriber, error = %e, "registry error on live stream");
                report.error = Some(e.to_string());
            }
            Registration::Done => {
                warn!(subscriber = %subscriber, "consensus set closed the subscription");
                report.error = Some("consensus set closed the subscription".into());
            }
        },
    }
    info!(
        subscriber = %subscriber,
        changes = report.changes_written,
        cancelled = report.cancelled,
        "stream ended"
    );
    report
}
