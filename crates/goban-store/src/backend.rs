//! The task that owns the tree.
//!
//! Every connection sends its requests to one [`Backend`], which applies
//! them in arrival order and fans changes out to the listeners whose paths
//! overlap the written path. Because the backend handles one request at a
//! time, a transaction's read and write are never separated by another
//! client's write.

use std::collections::{BTreeMap, HashMap};

use serde_json::Value;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info};

use crate::connection::ConnectionId;
use crate::error::{Operation, StoreError};
use crate::event::EventKind;
use crate::path::DbPath;
use crate::query::Query;
use crate::rules::Rules;
use crate::snapshot::Snapshot;
use crate::subscription::ListenerId;
use crate::transaction::{TransactionResult, TxDecision};
use crate::tree;

/// Where a listener's events go.
pub(crate) type EventSink = mpsc::UnboundedSender<Result<Snapshot, StoreError>>;

/// A transaction's update function.
pub(crate) type TransactionFn = Box<dyn FnOnce(Option<&Value>) -> TxDecision + Send>;

/// A reply channel for a request.
pub(crate) type Reply<T> = oneshot::Sender<Result<T, StoreError>>;

/// What a connection asks the backend to do.
pub(crate) enum Request {
    Authenticate {
        conn: ConnectionId,
        authenticated: bool,
    },
    Write {
        conn: ConnectionId,
        path: DbPath,
        value: Value,
        reply: Reply<()>,
    },
    Transaction {
        conn: ConnectionId,
        path: DbPath,
        update: TransactionFn,
        reply: Reply<TransactionResult>,
    },
    Listen {
        conn: ConnectionId,
        listener: ListenerId,
        path: DbPath,
        kind: EventKind,
        query: Query,
        sink: EventSink,
    },
    Unlisten {
        listener: ListenerId,
    },
    OnDisconnect {
        conn: ConnectionId,
        path: DbPath,
        action: DisconnectAction,
        reply: Reply<()>,
    },
    Disconnect {
        conn: ConnectionId,
    },
}

/// An operation queued to run when a connection goes away.
pub(crate) enum DisconnectAction {
    /// Write this value (`null` removes).
    Set(Value),
    /// Drop queued operations at or below the path.
    Cancel,
}

struct Listener {
    conn: ConnectionId,
    path: DbPath,
    kind: EventKind,
    query: Query,
    sink: EventSink,
}

impl Listener {
    fn view(&self, root: &Value) -> Value {
        self.query.apply(tree::value_at(root, &self.path))
    }
}

#[derive(Default)]
struct ClientState {
    authenticated: bool,
    on_disconnect: Vec<(DbPath, Value)>,
}

/// The tree, its rules, and everything attached to it.
pub(crate) struct Backend {
    root: Value,
    rules: Rules,
    clients: HashMap<ConnectionId, ClientState>,
    listeners: BTreeMap<ListenerId, Listener>,
}

impl Backend {
    pub(crate) fn new(rules: Rules) -> Self {
        Self {
            root: Value::Null,
            rules,
            clients: HashMap::new(),
            listeners: BTreeMap::new(),
        }
    }

    /// Serve requests until every handle to the database is gone.
    pub(crate) async fn run(mut self, mut requests: mpsc::UnboundedReceiver<Request>) {
        debug!("store backend running");
        while let Some(request) = requests.recv().await {
            self.handle(request);
        }
        info!(listeners = self.listeners.len(), "store backend stopped");
    }

    fn handle(&mut self, request: Request) {
        match request {
            Request::Authenticate {
                conn,
                authenticated,
            } => {
                self.clients.entry(conn).or_default().authenticated = authenticated;
                debug!(%conn, authenticated, "auth state changed");
            }
            Request::Write {
                conn,
                path,
                value,
                reply,
            } => {
                let _ = reply.send(self.write(conn, &path, value));
            }
            Request::Transaction {
                conn,
                path,
                update,
                reply,
            } => {
                let _ = reply.send(self.transaction(conn, &path, update));
            }
            Request::Listen {
                conn,
                listener,
                path,
                kind,
                query,
                sink,
            } => self.listen(
                listener,
                Listener {
                    conn,
                    path,
                    kind,
                    query,
                    sink,
                },
            ),
            Request::Unlisten { listener } => {
                self.listeners.remove(&listener);
            }
            Request::OnDisconnect {
                conn,
                path,
                action,
                reply,
            } => {
                let _ = reply.send(self.on_disconnect(conn, path, action));
            }
            Request::Disconnect { conn } => self.disconnect(conn),
        }
    }

    fn authorize(
        &self,
        conn: ConnectionId,
        operation: Operation,
        path: &DbPath,
    ) -> Result<(), StoreError> {
        let authenticated = self.clients.get(&conn).is_some_and(|c| c.authenticated);
        if self.rules.allows(operation, path, authenticated) {
            Ok(())
        } else {
            debug!(%conn, %operation, %path, "request denied by rules");
            Err(StoreError::AccessDenied {
                operation,
                path: path.clone(),
            })
        }
    }

    fn write(&mut self, conn: ConnectionId, path: &DbPath, value: Value) -> Result<(), StoreError> {
        self.authorize(conn, Operation::Write, path)?;
        let value = tree::normalize(value)?;
        self.apply(path, value);
        Ok(())
    }

    fn transaction(
        &mut self,
        conn: ConnectionId,
        path: &DbPath,
        update: TransactionFn,
    ) -> Result<TransactionResult, StoreError> {
        self.authorize(conn, Operation::Read, path)?;
        self.authorize(conn, Operation::Write, path)?;

        let prior = tree::get(&self.root, path).cloned();
        match update(prior.as_ref()) {
            TxDecision::Abort => {
                debug!(%conn, %path, "transaction aborted");
                let snapshot = Snapshot::new(path.clone(), prior.clone().unwrap_or(Value::Null));
                Ok(TransactionResult {
                    committed: false,
                    snapshot,
                    prior,
                })
            }
            TxDecision::Set(value) => {
                let value = tree::normalize(value)?;
                self.apply(path, value);
                debug!(%conn, %path, "transaction committed");
                Ok(TransactionResult {
                    committed: true,
                    snapshot: Snapshot::new(path.clone(), tree::value_at(&self.root, path)),
                    prior,
                })
            }
        }
    }

    fn listen(&mut self, id: ListenerId, listener: Listener) {
        if let Err(err) = self.authorize(listener.conn, Operation::Read, &listener.path) {
            // Dropping the sink after the error ends the subscriber's stream.
            let _ = listener.sink.send(Err(err));
            return;
        }
        let current = listener.view(&self.root);
        for snapshot in listener.kind.initial(&listener.path, &current) {
            if listener.sink.send(Ok(snapshot)).is_err() {
                return;
            }
        }
        debug!(
            conn = %listener.conn,
            path = %listener.path,
            kind = %listener.kind,
            "listener attached"
        );
        self.listeners.insert(id, listener);
    }

    /// Replace the value at `path` and notify overlapping listeners.
    fn apply(&mut self, path: &DbPath, value: Value) {
        let before: Vec<(ListenerId, Value)> = self
            .listeners
            .iter()
            .filter(|(_, listener)| listener.path.overlaps(path))
            .map(|(id, listener)| (*id, listener.view(&self.root)))
            .collect();

        tree::set(&mut self.root, path, value);

        let mut closed = Vec::new();
        for (id, old) in before {
            let Some(listener) = self.listeners.get(&id) else {
                continue;
            };
            let new = listener.view(&self.root);
            for snapshot in listener.kind.diff(&listener.path, &old, &new) {
                if listener.sink.send(Ok(snapshot)).is_err() {
                    closed.push(id);
                    break;
                }
            }
        }
        for id in closed {
            self.listeners.remove(&id);
        }
    }

    fn on_disconnect(
        &mut self,
        conn: ConnectionId,
        path: DbPath,
        action: DisconnectAction,
    ) -> Result<(), StoreError> {
        self.authorize(conn, Operation::Write, &path)?;
        let queued = match action {
            DisconnectAction::Set(value) => Some(tree::normalize(value)?),
            DisconnectAction::Cancel => None,
        };
        let client = self.clients.entry(conn).or_default();
        match queued {
            Some(value) => {
                client.on_disconnect.retain(|(queued_path, _)| *queued_path != path);
                client.on_disconnect.push((path, value));
            }
            None => client
                .on_disconnect
                .retain(|(queued_path, _)| !path.contains(queued_path)),
        }
        Ok(())
    }

    fn disconnect(&mut self, conn: ConnectionId) {
        self.listeners.retain(|_, listener| listener.conn != conn);
        let Some(client) = self.clients.remove(&conn) else {
            debug!(%conn, "connection closed");
            return;
        };
        let queued = client.on_disconnect.len();
        for (path, value) in client.on_disconnect {
            debug!(%conn, %path, "running on-disconnect write");
            self.apply(&path, value);
        }
        info!(%conn, queued, "connection closed");
    }
}
