use std::sync::Arc;

use tokio::sync::{broadcast, oneshot};

struct RawContext {
    // Dropped with the last Context clone, which is what completes
    // Handler::cancel.
    _sender: oneshot::Sender<()>,
    cancel_receiver: broadcast::Receiver<()>,
}

/// The cancellation side of a [`Context`].
///
/// Held by the shutdown path. Cancelling resolves every outstanding
/// [`Context::done`] and then waits until all `Context` clones are dropped,
/// which is how the service knows its tasks have finished.
pub struct Handler {
    recv: oneshot::Receiver<()>,
    cancel_sender: broadcast::Sender<()>,
}

impl Handler {
    /// Cancels every associated [`Context`] and waits for all holders to
    /// drop their clones.
    pub async fn cancel(self) {
        drop(self.cancel_sender);

        let _ = self.recv.await;
    }
}

/// A clonable handle tasks hold to learn about service shutdown.
///
/// Any task holding a clone keeps [`Handler::cancel`] waiting, so a task
/// must drop its clone (usually by returning) to let shutdown complete.
#[derive(Clone)]
pub struct Context(Arc<RawContext>);

impl Context {
    pub fn new() -> (Self, Handler) {
        let (sender, recv) = oneshot::channel();
        let (cancel_sender, cancel_receiver) = broadcast::channel(1);

        (
            Self(Arc::new(RawContext {
                _sender: sender,
                cancel_receiver,
            })),
            Handler {
                recv,
                cancel_sender,
            },
        )
    }

    /// Resolves once the owning [`Handler`] is cancelled or dropped.
    pub async fn done(&self) {
        let mut recv = self.0.cancel_receiver.resubscribe();

        // Either a cancel broadcast or the sender going away ends the wait.
        let _ = recv.recv().await;
    }
}
