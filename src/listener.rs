use tokio::task::JoinHandle;
use tracing::{info, warn};

use crate::gateway::TodoGateway;
use crate::store::TodoStore;

/// Keeps `store` in step with its session: a new token triggers a full
/// refetch, losing the token clears the list.
///
/// The task holds a store handle, and with it the session's sender, so it
/// runs until the returned handle is aborted.
pub fn spawn_session_listener<G: TodoGateway>(store: TodoStore<G>) -> JoinHandle<()> {
    let mut rx = store.session().subscribe();
    tokio::spawn(async move {
        let mut current = rx.borrow_and_update().clone();
        if current.is_some() {
            spawn_initialize(&store);
        }

        while rx.changed().await.is_ok() {
            let next = rx.borrow_and_update().clone();
            match (&current, &next) {
                (Some(_), None) => {
                    info!("Session ended, clearing todos");
                    store.clear();
                }
                (None, Some(_)) => {
                    info!("Session started, loading todos");
                    spawn_initialize(&store);
                }
                (Some(old), Some(new)) if old != new => {
                    info!("Session token replaced, reloading todos");
                    spawn_initialize(&store);
                }
                _ => {}
            }
            current = next;
        }
    })
}

fn spawn_initialize<G: TodoGateway>(store: &TodoStore<G>) {
    let store = store.clone();
    tokio::spawn(async move {
        if let Err(err) = store.initialize().await {
            warn!(error = %err, "Initial todo load failed");
        }
    });
}
