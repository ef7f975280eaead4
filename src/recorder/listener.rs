use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicU32, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use once_cell::sync::OnceCell;
use tokio::io::AsyncWriteExt;
use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::database::StreamStatus;
use crate::media::{BroadcastStream, StreamEvent};
use crate::registry::ListenerRegistry;
use crate::store::MetadataStore;

const CLOSE_TIMEOUT: Duration = Duration::from_secs(5);

/// Captures one published stream into its target file.
///
/// The listener owns a background task draining samples into the file. It
/// stays registered until it is closed, the stream ends on its own, or it
/// is detached before the first sample ever arrives.
pub struct StreamListener {
    meta_id: Uuid,
    stream: Arc<BroadcastStream>,
    /// Sink slot on the broadcast stream, set once the attach completes
    slot: OnceCell<u64>,
    closed: AtomicBool,
    /// The publisher sent end-of-stream before we were closed
    ended: AtomicBool,
    bytes: AtomicU64,
    last_timestamp: AtomicU32,
    token: CancellationToken,
    task: Mutex<Option<JoinHandle<()>>>,
    metadata: Arc<dyn MetadataStore>,
}

impl StreamListener {
    /// Spawns the capture task and attaches it to the stream.
    ///
    /// The listener is registered before the attach so a stop racing the
    /// start still finds it.
    pub async fn start(
        meta_id: Uuid,
        stream: Arc<BroadcastStream>,
        path: PathBuf,
        channel_size: usize,
        registry: &ListenerRegistry,
        metadata: Arc<dyn MetadataStore>,
    ) -> Arc<Self> {
        let (tx, rx) = mpsc::channel(channel_size);

        let listener = Arc::new(Self {
            meta_id,
            stream: stream.clone(),
            slot: OnceCell::new(),
            closed: AtomicBool::new(false),
            ended: AtomicBool::new(false),
            bytes: AtomicU64::new(0),
            last_timestamp: AtomicU32::new(0),
            token: CancellationToken::new(),
            task: Mutex::new(None),
            metadata,
        });

        let handle = tokio::spawn(listener.clone().capture(path, rx, registry.clone()));
        *listener.task.lock().await = Some(handle);

        registry.register(meta_id, listener.clone()).await;

        let slot = stream.attach(tx).await;
        let _ = listener.slot.set(slot);

        listener
    }

    pub fn bytes_captured(&self) -> u64 {
        self.bytes.load(Ordering::Relaxed)
    }

    pub fn last_timestamp(&self) -> u32 {
        self.last_timestamp.load(Ordering::Relaxed)
    }

    pub fn end_of_stream(&self) -> bool {
        self.ended.load(Ordering::SeqCst)
    }

    async fn capture(
        self: Arc<Self>,
        path: PathBuf,
        events: mpsc::Receiver<StreamEvent>,
        registry: ListenerRegistry,
    ) {
        if let Err(err) = self.capture_inner(&path, events, &registry).await {
            tracing::error!(
                meta_id = %self.meta_id,
                path = %path.display(),
                error = %err,
                "capture task failed",
            );
        }
    }

    async fn capture_inner(
        &self,
        path: &Path,
        mut events: mpsc::Receiver<StreamEvent>,
        registry: &ListenerRegistry,
    ) -> Result<()> {
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        let mut file = tokio::fs::File::create(path).await?;

        let mut started = false;
        let mut end_of_stream = false;
        let mut detached = false;

        loop {
            tokio::select! {
                _ = self.token.cancelled() => break,
                event = events.recv() => match event {
                    Some(StreamEvent::Sample(sample)) => {
                        if !started {
                            started = true;
                            if !self
                                .metadata
                                .advance_status(self.meta_id, StreamStatus::Started)
                                .await?
                            {
                                tracing::debug!(meta_id = %self.meta_id, "status already past started");
                            }
                        }

                        file.write_all(&sample.payload).await?;
                        self.bytes
                            .fetch_add(sample.payload.len() as u64, Ordering::Relaxed);
                        self.last_timestamp.store(sample.timestamp, Ordering::Relaxed);
                    }
                    Some(StreamEvent::Closed) => {
                        end_of_stream = true;
                        break;
                    }
                    // Channel gone without a close event: the recorder
                    // detached this capture, the publisher may still be live.
                    None => {
                        detached = true;
                        break;
                    }
                },
            }
        }

        file.flush().await?;

        if end_of_stream {
            self.ended.store(true, Ordering::SeqCst);
            registry.unregister(self.meta_id).await;
            tracing::debug!(meta_id = %self.meta_id, "stream ended on its own, listener released");
        } else if detached && !started {
            // The stop path leaves streams that never produced a sample
            // alone, so nothing else would release this entry.
            registry.unregister(self.meta_id).await;
            tracing::debug!(meta_id = %self.meta_id, "detached before the first sample, listener released");
        }

        Ok(())
    }

    /// Detaches from the stream, waits for the capture task to flush and
    /// settles the final status.
    ///
    /// Safe to call more than once. A capture that saw end-of-stream is
    /// moved to stopped here; one that was cut off stays at whatever status
    /// the caller set.
    pub async fn close(&self) -> Result<()> {
        if self.closed.swap(true, Ordering::SeqCst) {
            return Ok(());
        }

        if let Some(slot) = self.slot.get() {
            self.stream.detach(*slot).await;
        }

        self.token.cancel();

        let handle = self.task.lock().await.take();
        if let Some(handle) = handle {
            match tokio::time::timeout(CLOSE_TIMEOUT, handle).await {
                Ok(Ok(())) => {}
                Ok(Err(err)) => {
                    tracing::error!(meta_id = %self.meta_id, error = %err, "capture task panicked");
                }
                Err(_) => {
                    tracing::warn!(meta_id = %self.meta_id, "capture task did not flush in time");
                    return Ok(());
                }
            }
        }

        if self.ended.load(Ordering::SeqCst) {
            self.metadata
                .advance_status(self.meta_id, StreamStatus::Stopped)
                .await?;
        }

        Ok(())
    }
}
