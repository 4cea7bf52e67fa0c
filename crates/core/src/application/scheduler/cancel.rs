// Forced-cancellation signal shared by the scheduler and its timers

use tokio::sync::watch;

/// Observes forced cancellation of a scheduler
#[derive(Clone)]
pub struct CancelToken {
    rx: watch::Receiver<bool>,
}

impl CancelToken {
    /// Wait for the cancellation signal
    ///
    /// Returns immediately if the signal was already raised. If the sender
    /// is dropped without signalling, this never resolves.
    pub async fn cancelled(&mut self) {
        let signalled = self.rx.wait_for(|cancelled| *cancelled).await.is_ok();
        if !signalled {
            std::future::pending::<()>().await;
        }
    }
}

/// Raises the cancellation signal
pub struct CancelSender {
    tx: watch::Sender<bool>,
}

impl CancelSender {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(false);
        Self { tx }
    }

    /// Signal forced cancellation to every token
    pub fn cancel(&self) {
        self.tx.send_replace(true);
    }

    pub fn token(&self) -> CancelToken {
        CancelToken {
            rx: self.tx.subscribe(),
        }
    }
}

impl Default for CancelSender {
    fn default() -> Self {
        Self::new()
    }
}
