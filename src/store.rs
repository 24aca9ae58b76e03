//! The authoritative in-memory todo list.
//!
//! Every change to the list is applied only after the gateway confirms it.
//! Fetches are tagged with a sequence number; only the most recently issued
//! fetch may replace the list, and only if no confirmed mutation landed while
//! it was in flight. Resetting the store bumps an epoch so that results of
//! calls issued before the reset are dropped.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::error::{GatewayError, Operation, StoreError};
use crate::filter::select;
use crate::gateway::TodoGateway;
use crate::models::{FilterMode, NewTodo, Todo, TodoPatch};
use crate::session::Session;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Phase {
    #[default]
    Uninitialized,
    Loading,
    Ready,
}

/// What presentation sees after every state change.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StoreSnapshot {
    pub phase: Phase,
    pub todos: Vec<Todo>,
    pub filter: FilterMode,
    pub last_error: Option<StoreError>,
}

impl StoreSnapshot {
    pub fn visible(&self) -> Vec<&Todo> {
        select(&self.todos, self.filter)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchOutcome {
    Applied,
    /// A newer fetch, a confirmed mutation or a reset overtook this one.
    Superseded,
}

#[derive(Debug, Default)]
struct StoreData {
    phase: Phase,
    todos: Vec<Todo>,
    filter: FilterMode,
    last_error: Option<StoreError>,
    loaded: bool,
    latest_fetch: u64,
    revision: u64,
    epoch: u64,
}

impl StoreData {
    fn snapshot(&self) -> StoreSnapshot {
        StoreSnapshot {
            phase: self.phase,
            todos: self.todos.clone(),
            filter: self.filter,
            last_error: self.last_error.clone(),
        }
    }

    fn position(&self, id: &str) -> Option<usize> {
        self.todos.iter().position(|todo| todo.id == id)
    }
}

struct FetchTicket {
    seq: u64,
    revision: u64,
    epoch: u64,
}

pub struct TodoStore<G> {
    gateway: Arc<G>,
    session: Session,
    inner: Arc<Mutex<StoreData>>,
    events: Arc<watch::Sender<StoreSnapshot>>,
}

impl<G> Clone for TodoStore<G> {
    fn clone(&self) -> Self {
        Self {
            gateway: Arc::clone(&self.gateway),
            session: self.session.clone(),
            inner: Arc::clone(&self.inner),
            events: Arc::clone(&self.events),
        }
    }
}

impl<G: TodoGateway> TodoStore<G> {
    pub fn new(gateway: Arc<G>, session: Session) -> Self {
        let (events, _rx) = watch::channel(StoreSnapshot::default());
        Self {
            gateway,
            session,
            inner: Arc::new(Mutex::new(StoreData::default())),
            events: Arc::new(events),
        }
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn subscribe(&self) -> watch::Receiver<StoreSnapshot> {
        self.events.subscribe()
    }

    pub fn snapshot(&self) -> StoreSnapshot {
        self.lock().snapshot()
    }

    pub fn phase(&self) -> Phase {
        self.lock().phase
    }

    pub fn todos(&self) -> Vec<Todo> {
        self.lock().todos.clone()
    }

    /// The list filtered by the store's current filter mode.
    pub fn visible(&self) -> Vec<Todo> {
        let data = self.lock();
        select(&data.todos, data.filter).into_iter().cloned().collect()
    }

    pub fn set_filter(&self, filter: FilterMode) {
        let mut data = self.lock();
        if data.filter != filter {
            data.filter = filter;
            self.publish(&data);
        }
    }

    /// Drops the list and everything in flight. Used when the session ends.
    pub fn clear(&self) {
        let mut data = self.lock();
        data.epoch += 1;
        data.todos.clear();
        data.loaded = false;
        data.phase = Phase::Uninitialized;
        data.last_error = None;
        self.publish(&data);
        info!(epoch = data.epoch, "Cleared todo list");
    }

    /// Full reset followed by a fetch. On failure the list is left empty and
    /// the store is still `Ready`.
    ///
    /// Mutations still in flight when this is called resolve to
    /// [`StoreError::Discarded`]. One the server confirms after the fresh list
    /// was read is then missing locally until the next `refresh`.
    pub async fn initialize(&self) -> Result<FetchOutcome, StoreError> {
        self.fetch(true).await
    }

    /// Refetches without dropping the current list first.
    pub async fn refresh(&self) -> Result<FetchOutcome, StoreError> {
        self.fetch(false).await
    }

    async fn fetch(&self, reset: bool) -> Result<FetchOutcome, StoreError> {
        let token = self.require_token()?;
        let ticket = {
            let mut data = self.lock();
            if reset {
                data.epoch += 1;
                data.todos.clear();
                data.loaded = false;
            }
            data.latest_fetch += 1;
            data.phase = Phase::Loading;
            self.publish(&data);
            FetchTicket {
                seq: data.latest_fetch,
                revision: data.revision,
                epoch: data.epoch,
            }
        };
        debug!(seq = ticket.seq, reset, "Fetching todos");

        let result = self.gateway.list(&token).await;

        let mut data = self.lock();
        if data.epoch != ticket.epoch || data.latest_fetch != ticket.seq {
            debug!(
                seq = ticket.seq,
                latest = data.latest_fetch,
                "Discarding superseded fetch"
            );
            return Ok(FetchOutcome::Superseded);
        }
        if data.revision != ticket.revision {
            // A confirmed mutation is newer than this snapshot of the server.
            // The list is kept, but a failed call is still reported.
            data.phase = Phase::Ready;
            return match result {
                Ok(_) => {
                    debug!(seq = ticket.seq, "Discarding fetch overtaken by a mutation");
                    self.publish(&data);
                    Ok(FetchOutcome::Superseded)
                }
                Err(err) => {
                    warn!(error = %err, seq = ticket.seq, "Failed to load todos");
                    let err = StoreError::load(err);
                    data.last_error = Some(err.clone());
                    self.publish(&data);
                    Err(err)
                }
            };
        }

        data.phase = Phase::Ready;
        data.loaded = true;
        match result {
            Ok(todos) => {
                info!(count = todos.len(), seq = ticket.seq, "Loaded todos");
                data.todos = todos;
                data.last_error = None;
                self.publish(&data);
                Ok(FetchOutcome::Applied)
            }
            Err(err) => {
                warn!(error = %err, seq = ticket.seq, "Failed to load todos");
                let err = StoreError::load(err);
                data.todos.clear();
                data.last_error = Some(err.clone());
                self.publish(&data);
                Err(err)
            }
        }
    }

    pub async fn add(&self, title: &str, description: &str) -> Result<Todo, StoreError> {
        if title.trim().is_empty() {
            return Err(self.report(StoreError::Validation("Title cannot be empty")));
        }
        let (token, epoch) = self.begin_mutation()?;
        let new_todo = NewTodo {
            title: title.to_string(),
            description: Some(description.to_string()),
        };

        let result = self.gateway.create(&token, new_todo).await;

        let mut data = self.lock();
        if data.epoch != epoch {
            warn!("Dropping add result from a previous session");
            return Err(StoreError::Discarded);
        }
        match result {
            Ok(todo) => {
                match data.position(&todo.id) {
                    Some(index) => data.todos[index] = todo.clone(),
                    None => data.todos.push(todo.clone()),
                }
                data.revision += 1;
                data.last_error = None;
                self.publish(&data);
                info!(id = %todo.id, title = %todo.title, "Added todo");
                Ok(todo)
            }
            Err(err) => Err(self.fail(&mut data, Operation::Add, err)),
        }
    }

    /// Returns the updated entry, or `None` if `id` is not in the list.
    pub async fn toggle(&self, id: &str, completed: bool) -> Result<Option<Todo>, StoreError> {
        self.patch(Operation::Toggle, id, TodoPatch::completed(completed))
            .await
    }

    pub async fn edit(
        &self,
        id: &str,
        title: &str,
        description: &str,
    ) -> Result<Option<Todo>, StoreError> {
        if title.trim().is_empty() {
            return Err(self.report(StoreError::Validation("Title cannot be empty")));
        }
        self.patch(Operation::Edit, id, TodoPatch::content(title, description))
            .await
    }

    async fn patch(
        &self,
        op: Operation,
        id: &str,
        patch: TodoPatch,
    ) -> Result<Option<Todo>, StoreError> {
        let (token, epoch) = self.begin_mutation()?;
        if self.lock().position(id).is_none() {
            debug!(id, %op, "Ignoring update for unknown todo");
            return Ok(None);
        }

        let result = self.gateway.update(&token, id, patch.clone()).await;

        let mut data = self.lock();
        if data.epoch != epoch {
            warn!(id, %op, "Dropping update result from a previous session");
            return Err(StoreError::Discarded);
        }
        match result {
            Ok(_) => {
                let Some(index) = data.position(id) else {
                    return Ok(None);
                };
                patch.apply_to(&mut data.todos[index]);
                let todo = data.todos[index].clone();
                data.revision += 1;
                data.last_error = None;
                self.publish(&data);
                info!(id, completed = todo.completed, %op, "Updated todo");
                Ok(Some(todo))
            }
            Err(err) => Err(self.fail(&mut data, op, err)),
        }
    }

    /// Returns `false` if `id` is not in the list.
    pub async fn remove(&self, id: &str) -> Result<bool, StoreError> {
        let (token, epoch) = self.begin_mutation()?;
        if self.lock().position(id).is_none() {
            debug!(id, "Ignoring removal of unknown todo");
            return Ok(false);
        }

        let result = self.gateway.delete(&token, id).await;

        let mut data = self.lock();
        if data.epoch != epoch {
            warn!(id, "Dropping remove result from a previous session");
            return Err(StoreError::Discarded);
        }
        match result {
            Ok(()) => {
                data.todos.retain(|todo| todo.id != id);
                data.revision += 1;
                data.last_error = None;
                self.publish(&data);
                info!(id, "Removed todo");
                Ok(true)
            }
            Err(err) => Err(self.fail(&mut data, Operation::Remove, err)),
        }
    }

    fn require_token(&self) -> Result<String, StoreError> {
        match self.session.token() {
            Some(token) => Ok(token),
            None => {
                if self.phase() != Phase::Uninitialized || !self.lock().todos.is_empty() {
                    self.clear();
                }
                Err(self.report(StoreError::NoSession))
            }
        }
    }

    fn begin_mutation(&self) -> Result<(String, u64), StoreError> {
        let token = self.require_token()?;
        let data = self.lock();
        if !data.loaded {
            drop(data);
            return Err(self.report(StoreError::NotReady));
        }
        Ok((token, data.epoch))
    }

    fn fail(
        &self,
        data: &mut StoreData,
        op: Operation,
        err: GatewayError,
    ) -> StoreError {
        warn!(error = %err, %op, "Todo operation failed");
        let err = StoreError::failed(op, err);
        data.last_error = Some(err.clone());
        self.publish(data);
        err
    }

    fn report(&self, err: StoreError) -> StoreError {
        let mut data = self.lock();
        data.last_error = Some(err.clone());
        self.publish(&data);
        err
    }

    fn publish(&self, data: &StoreData) {
        self.events.send_replace(data.snapshot());
    }

    fn lock(&self) -> MutexGuard<'_, StoreData> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
