use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use bytes::Bytes;
use tokio::sync::{mpsc, RwLock};
use uuid::Uuid;

/// A single media payload as it came off the wire.
#[derive(Debug, Clone)]
pub struct MediaSample {
    pub payload: Bytes,
    pub timestamp: u32,
}

#[derive(Debug)]
pub enum StreamEvent {
    Sample(MediaSample),
    /// The publisher went away, no further samples will arrive.
    Closed,
}

struct Sink {
    id: u64,
    channel: mpsc::Sender<StreamEvent>,
}

/// A live published stream fanning samples out to any number of sinks.
pub struct BroadcastStream {
    room_id: Uuid,
    publish_name: String,
    next_sink: AtomicU64,
    ended: AtomicBool,
    sinks: RwLock<Vec<Sink>>,
}

impl BroadcastStream {
    pub fn new(room_id: Uuid, publish_name: String) -> Self {
        Self {
            room_id,
            publish_name,
            next_sink: AtomicU64::new(0),
            ended: AtomicBool::new(false),
            sinks: RwLock::new(Vec::new()),
        }
    }

    pub fn room_id(&self) -> Uuid {
        self.room_id
    }

    pub fn publish_name(&self) -> &str {
        &self.publish_name
    }

    pub fn is_ended(&self) -> bool {
        self.ended.load(Ordering::SeqCst)
    }

    /// Attaches a sink and returns its slot id for a later `detach`.
    ///
    /// A stream that already ended accepts the sink but immediately tells it
    /// the stream is closed instead of keeping it around.
    pub async fn attach(&self, channel: mpsc::Sender<StreamEvent>) -> u64 {
        let id = self.next_sink.fetch_add(1, Ordering::SeqCst);

        let mut sinks = self.sinks.write().await;

        // `close` flips the flag while holding the write lock, so checking it
        // here cannot race with the final Closed fanout.
        if self.ended.load(Ordering::SeqCst) {
            drop(sinks);
            let _ = channel.send(StreamEvent::Closed).await;
            return id;
        }

        sinks.push(Sink { id, channel });

        id
    }

    pub async fn detach(&self, id: u64) -> bool {
        let mut sinks = self.sinks.write().await;

        let before = sinks.len();
        sinks.retain(|sink| sink.id != id);

        sinks.len() != before
    }

    pub async fn detach_all(&self) -> usize {
        let mut sinks = self.sinks.write().await;

        let count = sinks.len();
        sinks.clear();

        count
    }

    /// Fans a sample out to every attached sink.
    pub async fn broadcast(&self, sample: MediaSample) {
        let targets = {
            let sinks = self.sinks.read().await;

            sinks
                .iter()
                .map(|sink| (sink.id, sink.channel.clone()))
                .collect::<Vec<_>>()
        };

        // We dont want to hold the lock while we wait for the channels to be
        // ready, a slow sink would stall every other one.
        let mut dead = Vec::new();
        for (id, channel) in targets {
            if channel.send(StreamEvent::Sample(sample.clone())).await.is_err() {
                dead.push(id);
            }
        }

        if !dead.is_empty() {
            let mut sinks = self.sinks.write().await;
            sinks.retain(|sink| !dead.contains(&sink.id));
        }
    }

    /// Marks the stream ended and tells every sink the publisher is gone.
    pub async fn close(&self) {
        let sinks = {
            let mut sinks = self.sinks.write().await;
            self.ended.store(true, Ordering::SeqCst);
            std::mem::take(&mut *sinks)
        };

        for sink in sinks {
            let _ = sink.channel.send(StreamEvent::Closed).await;
        }
    }
}

/// All live streams, keyed by room and publish name.
#[derive(Default)]
pub struct StreamHub {
    streams: RwLock<HashMap<(Uuid, String), Arc<BroadcastStream>>>,
}

impl StreamHub {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn publish(&self, room_id: Uuid, publish_name: &str) -> Arc<BroadcastStream> {
        let mut streams = self.streams.write().await;

        let stream = Arc::new(BroadcastStream::new(room_id, publish_name.to_string()));
        streams.insert((room_id, publish_name.to_string()), stream.clone());

        stream
    }

    pub async fn find(&self, room_id: Uuid, publish_name: &str) -> Option<Arc<BroadcastStream>> {
        let streams = self.streams.read().await;

        streams.get(&(room_id, publish_name.to_string())).cloned()
    }

    /// Removes the stream and closes it so attached sinks drain out.
    pub async fn unpublish(&self, room_id: Uuid, publish_name: &str) {
        let stream = {
            let mut streams = self.streams.write().await;
            streams.remove(&(room_id, publish_name.to_string()))
        };

        if let Some(stream) = stream {
            stream.close().await;
        }
    }
}
