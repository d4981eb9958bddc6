//! Database handle, client connections, and pending writes.
//!
//! [`MemoryDatabase::start`] spawns the backend task; every client then
//! calls [`MemoryDatabase::connect`] to get its own [`Connection`]. A
//! connection carries the client's auth state and the writes the backend
//! runs when the connection goes away (see [`Connection::on_disconnect`]).
//! The connection closes when its last clone is dropped.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;
use serde_json::Value;
use tokio::sync::{mpsc, oneshot, watch};
use tracing::{debug, error, info};
use uuid::Uuid;

use crate::backend::{Backend, DisconnectAction, Request};
use crate::error::StoreError;
use crate::event::EventKind;
use crate::path::DbPath;
use crate::query::Query;
use crate::rules::Rules;
use crate::snapshot::Snapshot;
use crate::subscription::{ListenerId, Subscription};
use crate::transaction::{TransactionResult, TxDecision};

/// Identifies one client connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ConnectionId(u64);

impl core::fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "conn-{}", self.0)
    }
}

/// The signed-in identity of a connection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthData {
    /// Stable user identifier.
    pub uid: String,
}

#[derive(Debug)]
struct Shared {
    requests: mpsc::UnboundedSender<Request>,
    next_id: AtomicU64,
}

impl Shared {
    fn next_id(&self) -> u64 {
        self.next_id.fetch_add(1, Ordering::Relaxed)
    }

    fn send(&self, request: Request) -> Result<(), StoreError> {
        self.requests
            .send(request)
            .map_err(|_closed| StoreError::Disconnected)
    }
}

async fn recv_reply<T>(reply: oneshot::Receiver<Result<T, StoreError>>) -> Result<T, StoreError> {
    match reply.await {
        Ok(result) => result,
        Err(_closed) => Err(StoreError::Disconnected),
    }
}

// =============================================================================
// Database handle
// =============================================================================

/// Handle to a running in-process realtime database.
///
/// Cloning the handle is cheap; the backend stops once every handle,
/// connection, and subscription is gone.
#[derive(Debug, Clone)]
pub struct MemoryDatabase {
    shared: Arc<Shared>,
}

impl MemoryDatabase {
    /// Spawn the backend task on the current tokio runtime.
    pub fn start(rules: Rules) -> Self {
        let (requests, inbox) = mpsc::unbounded_channel();
        tokio::spawn(Backend::new(rules).run(inbox));
        info!("realtime store started");
        Self {
            shared: Arc::new(Shared {
                requests,
                next_id: AtomicU64::new(1),
            }),
        }
    }

    /// Open a new client connection.
    pub fn connect(&self) -> Connection {
        let id = ConnectionId(self.shared.next_id());
        let (auth, _) = watch::channel(None);
        debug!(conn = %id, "connection opened");
        Connection {
            inner: Arc::new(ConnectionInner {
                id,
                shared: Arc::clone(&self.shared),
                auth,
            }),
        }
    }
}

// =============================================================================
// Connection
// =============================================================================

#[derive(Debug)]
struct ConnectionInner {
    id: ConnectionId,
    shared: Arc<Shared>,
    auth: watch::Sender<Option<AuthData>>,
}

impl Drop for ConnectionInner {
    fn drop(&mut self) {
        let _ = self.shared.send(Request::Disconnect { conn: self.id });
    }
}

/// One client's view of the database.
#[derive(Debug, Clone)]
pub struct Connection {
    inner: Arc<ConnectionInner>,
}

impl Connection {
    /// This connection's identifier.
    pub fn id(&self) -> ConnectionId {
        self.inner.id
    }

    // -------------------------------------------------------------------------
    // Auth
    // -------------------------------------------------------------------------

    /// Sign in as `uid`. Requests sent afterwards are checked as signed in.
    pub fn authenticate(&self, uid: impl Into<String>) -> Result<(), StoreError> {
        self.inner.shared.send(Request::Authenticate {
            conn: self.id(),
            authenticated: true,
        })?;
        let auth = AuthData { uid: uid.into() };
        info!(conn = %self.id(), uid = %auth.uid, "signed in");
        self.inner.auth.send_replace(Some(auth));
        Ok(())
    }

    /// Sign out.
    pub fn sign_out(&self) -> Result<(), StoreError> {
        self.inner.shared.send(Request::Authenticate {
            conn: self.id(),
            authenticated: false,
        })?;
        self.inner.auth.send_replace(None);
        Ok(())
    }

    /// The current auth state.
    pub fn auth(&self) -> Option<AuthData> {
        self.inner.auth.borrow().clone()
    }

    /// A receiver that observes every auth state change.
    pub fn on_auth(&self) -> watch::Receiver<Option<AuthData>> {
        self.inner.auth.subscribe()
    }

    // -------------------------------------------------------------------------
    // Writes
    // -------------------------------------------------------------------------

    fn write(&self, path: DbPath, value: Value) -> PendingWrite {
        let (reply, ack) = oneshot::channel();
        let request = Request::Write {
            conn: self.id(),
            path,
            value,
            reply,
        };
        match self.inner.shared.send(request) {
            Ok(()) => PendingWrite { ack },
            Err(err) => PendingWrite::failed(err),
        }
    }

    /// Replace the value at `path` (`null` removes it).
    pub fn set(&self, path: &str, value: Value) -> PendingWrite {
        match DbPath::parse(path) {
            Ok(path) => self.write(path, value),
            Err(err) => PendingWrite::failed(err),
        }
    }

    /// Serialize `value` and write it at `path`.
    pub fn set_json<T: Serialize>(&self, path: &str, value: &T) -> PendingWrite {
        match serde_json::to_value(value) {
            Ok(value) => self.set(path, value),
            Err(err) => PendingWrite::failed(err.into()),
        }
    }

    /// Remove the value at `path`.
    pub fn remove(&self, path: &str) -> PendingWrite {
        self.set(path, Value::Null)
    }

    /// Write `value` under a new time-ordered child key of `path`.
    ///
    /// The key is generated locally and returned immediately.
    pub fn push(&self, path: &str, value: Value) -> Result<(String, PendingWrite), StoreError> {
        let key = Uuid::now_v7().to_string();
        let path = DbPath::parse(path)?.join_unchecked(&key);
        Ok((key, self.write(path, value)))
    }

    /// Atomically read-modify-write the value at `path`.
    ///
    /// `update` sees the current value (`None` when absent) and returns
    /// either [`TxDecision::Set`] or [`TxDecision::Abort`].
    pub async fn transaction<F>(
        &self,
        path: &str,
        update: F,
    ) -> Result<TransactionResult, StoreError>
    where
        F: FnOnce(Option<&Value>) -> TxDecision + Send + 'static,
    {
        let path = DbPath::parse(path)?;
        let (reply, result) = oneshot::channel();
        self.inner.shared.send(Request::Transaction {
            conn: self.id(),
            path,
            update: Box::new(update),
            reply,
        })?;
        recv_reply(result).await
    }

    // -------------------------------------------------------------------------
    // Reads
    // -------------------------------------------------------------------------

    /// Listen for `kind` events at `path`.
    pub fn on(&self, path: &str, kind: EventKind) -> Result<Subscription, StoreError> {
        self.on_query(path, kind, Query::all())
    }

    /// Listen for `kind` events on a windowed view of `path`.
    pub fn on_query(
        &self,
        path: &str,
        kind: EventKind,
        query: Query,
    ) -> Result<Subscription, StoreError> {
        let path = DbPath::parse(path)?;
        let listener = ListenerId(self.inner.shared.next_id());
        let (sink, events) = mpsc::unbounded_channel();
        self.inner.shared.send(Request::Listen {
            conn: self.id(),
            listener,
            path: path.clone(),
            kind,
            query,
            sink,
        })?;
        Ok(Subscription::new(
            listener,
            path,
            kind,
            events,
            self.inner.shared.requests.clone(),
        ))
    }

    /// Wait for exactly one `kind` event at `path`, then stop listening.
    pub async fn once(&self, path: &str, kind: EventKind) -> Result<Snapshot, StoreError> {
        self.once_query(path, kind, Query::all()).await
    }

    /// Wait for exactly one `kind` event on a windowed view of `path`.
    pub async fn once_query(
        &self,
        path: &str,
        kind: EventKind,
        query: Query,
    ) -> Result<Snapshot, StoreError> {
        let mut subscription = self.on_query(path, kind, query)?;
        subscription.recv().await.unwrap_or(Err(StoreError::Disconnected))
    }

    // -------------------------------------------------------------------------
    // Presence
    // -------------------------------------------------------------------------

    /// Queue writes for the backend to run when this connection closes.
    pub fn on_disconnect(&self, path: &str) -> Result<OnDisconnect<'_>, StoreError> {
        Ok(OnDisconnect {
            conn: self,
            path: DbPath::parse(path)?,
        })
    }
}

/// Builder for writes that run when a connection closes.
#[derive(Debug)]
pub struct OnDisconnect<'a> {
    conn: &'a Connection,
    path: DbPath,
}

impl OnDisconnect<'_> {
    async fn queue(self, action: DisconnectAction) -> Result<(), StoreError> {
        let (reply, result) = oneshot::channel();
        self.conn.inner.shared.send(Request::OnDisconnect {
            conn: self.conn.id(),
            path: self.path,
            action,
            reply,
        })?;
        recv_reply(result).await
    }

    /// Remove the value when the connection closes.
    pub async fn remove(self) -> Result<(), StoreError> {
        self.queue(DisconnectAction::Set(Value::Null)).await
    }

    /// Write `value` when the connection closes.
    pub async fn set(self, value: Value) -> Result<(), StoreError> {
        self.queue(DisconnectAction::Set(value)).await
    }

    /// Drop queued writes at or below the path.
    pub async fn cancel(self) -> Result<(), StoreError> {
        self.queue(DisconnectAction::Cancel).await
    }
}

// =============================================================================
// Pending writes
// =============================================================================

/// A write that has been sent but not yet acknowledged.
///
/// Dropping the handle does not cancel the write; await [`PendingWrite::wait`]
/// to learn whether the backend accepted it.
#[derive(Debug)]
pub struct PendingWrite {
    ack: oneshot::Receiver<Result<(), StoreError>>,
}

impl PendingWrite {
    fn failed(err: StoreError) -> Self {
        error!(error = %err, "write rejected before sending");
        let (reply, ack) = oneshot::channel();
        let _ = reply.send(Err(err));
        Self { ack }
    }

    /// Wait for the backend's acknowledgement.
    pub async fn wait(self) -> Result<(), StoreError> {
        recv_reply(self.ack).await
    }
}
