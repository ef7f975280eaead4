use tokio::signal::unix::SignalKind;
use tokio::sync::mpsc;

/// Multiplexes any number of unix signals into a single receive call.
pub struct SignalHandler {
    send: mpsc::Sender<SignalKind>,
    recv: mpsc::Receiver<SignalKind>,
}

impl Default for SignalHandler {
    fn default() -> Self {
        let (send, recv) = mpsc::channel(1);
        Self { send, recv }
    }
}

impl SignalHandler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Subscribes to a signal kind. The forwarding task exits when the
    /// handler is dropped.
    pub fn with_signal(self, kind: SignalKind) -> Self {
        let mut signal = tokio::signal::unix::signal(kind).expect("failed to create signal");

        let send = self.send.clone();
        tokio::spawn(async move {
            loop {
                signal.recv().await;
                if send.send(kind).await.is_err() {
                    break;
                }
            }
        });

        self
    }

    /// Waits for the next subscribed signal to arrive.
    pub async fn recv(&mut self) -> SignalKind {
        self.recv.recv().await.expect("failed to receive signal")
    }
}
