use std::sync::Arc;

use tokio::sync::watch;
use tracing::info;

/// Holds the current bearer token and publishes every transition.
///
/// Cloning yields another handle onto the same session.
#[derive(Clone)]
pub struct Session {
    tx: Arc<watch::Sender<Option<String>>>,
}

impl Session {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(None);
        Self { tx: Arc::new(tx) }
    }

    pub fn with_token(token: impl Into<String>) -> Self {
        let session = Self::new();
        session.sign_in(token);
        session
    }

    pub fn token(&self) -> Option<String> {
        self.tx.borrow().clone()
    }

    pub fn is_signed_in(&self) -> bool {
        self.tx.borrow().is_some()
    }

    pub fn sign_in(&self, token: impl Into<String>) {
        let token = token.into();
        let changed = self.tx.send_if_modified(|current| {
            if current.as_deref() == Some(token.as_str()) {
                return false;
            }
            *current = Some(token);
            true
        });
        if changed {
            info!("Session token set");
        }
    }

    pub fn sign_out(&self) {
        let changed = self.tx.send_if_modified(|current| current.take().is_some());
        if changed {
            info!("Session token cleared");
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<Option<String>> {
        self.tx.subscribe()
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}
