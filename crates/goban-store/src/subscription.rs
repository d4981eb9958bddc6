//! Cancellable listener streams.
//!
//! A [`Subscription`] yields every snapshot its listener produces, in the
//! order the backend applied the changes. It ends after an access-denied
//! error, when its connection closes, or when it is cancelled. Dropping a
//! subscription cancels it.

use std::pin::Pin;
use std::task::{Context, Poll};

use futures::Stream;
use tokio::sync::mpsc;

use crate::backend::Request;
use crate::error::StoreError;
use crate::event::EventKind;
use crate::path::DbPath;
use crate::snapshot::Snapshot;

/// Identifies a listener inside the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub(crate) struct ListenerId(pub(crate) u64);

/// A live listener on one path.
#[derive(Debug)]
pub struct Subscription {
    id: ListenerId,
    path: DbPath,
    kind: EventKind,
    events: mpsc::UnboundedReceiver<Result<Snapshot, StoreError>>,
    requests: mpsc::UnboundedSender<Request>,
}

impl Subscription {
    pub(crate) const fn new(
        id: ListenerId,
        path: DbPath,
        kind: EventKind,
        events: mpsc::UnboundedReceiver<Result<Snapshot, StoreError>>,
        requests: mpsc::UnboundedSender<Request>,
    ) -> Self {
        Self {
            id,
            path,
            kind,
            events,
            requests,
        }
    }

    /// The listened path.
    pub const fn path(&self) -> &DbPath {
        &self.path
    }

    /// The listened event kind.
    pub const fn kind(&self) -> EventKind {
        self.kind
    }

    /// Wait for the next snapshot. `None` once the stream has ended.
    pub async fn recv(&mut self) -> Option<Result<Snapshot, StoreError>> {
        self.events.recv().await
    }

    /// Stop listening.
    pub fn cancel(self) {
        drop(self);
    }
}

impl Stream for Subscription {
    type Item = Result<Snapshot, StoreError>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.get_mut().events.poll_recv(cx)
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        // The backend may already be gone; nothing is left to detach then.
        let _ = self.requests.send(Request::Unlisten { listener: self.id });
    }
}
