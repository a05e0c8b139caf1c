//! # Live Query Subscriptions
//!
//! The change notification layer: callers subscribe to a query and receive
//! the current result immediately, then a fresh result after every commit
//! that could have changed it.
//!
//! ## Delivery Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Change Notification Flow                             │
//! │                                                                         │
//! │  Repository mutation                                                   │
//! │       │  (holds the write gate)                                        │
//! │       ▼                                                                 │
//! │  COMMIT ──► ChangeBus.publish(ChangeEvent { seq, tables })             │
//! │       │        (seq issued under the gate: publish order = commit      │
//! │       │         order; broadcast::send never blocks the writer)        │
//! │       ▼                                                                 │
//! │  ┌───────────────────────────────┐   one spawned task per             │
//! │  │  Subscription delivery task   │   subscription                     │
//! │  │                               │                                     │
//! │  │  1. run query, send initial   │                                     │
//! │  │  2. on relevant event:        │                                     │
//! │  │       re-run query            │                                     │
//! │  │       deliver iff changed     │                                     │
//! │  │  3. on lag: re-query, catch   │                                     │
//! │  │       up to newest state      │                                     │
//! │  │  4. on cancel/drop: exit      │                                     │
//! │  └──────────────┬────────────────┘                                     │
//! │                 │ mpsc (bounded)                                       │
//! │                 ▼                                                       │
//! │  Subscriber: subscription.recv().await                                 │
//! │                                                                         │
//! │  GUARANTEES:                                                           │
//! │  • Initial snapshot delivered on subscribe                             │
//! │  • Monotonic: never a result older than one already received           │
//! │  • Commits that cannot change the result produce no snapshot           │
//! │  • A slow or dropped subscriber never stalls writers or other          │
//! │    subscribers (its task lags and catches up, or exits)                │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::{broadcast, mpsc};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::error::StoreResult;

// =============================================================================
// Table Set
// =============================================================================

/// A set of the four logical relations, used to route change events to the
/// subscriptions they can affect.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Tables(u8);

impl Tables {
    pub const CATEGORIES: Tables = Tables(1 << 0);
    pub const TRIPS: Tables = Tables(1 << 1);
    pub const EXPENSES: Tables = Tables(1 << 2);
    pub const BUDGETS: Tables = Tables(1 << 3);

    /// True when the two sets share at least one table.
    #[inline]
    pub const fn intersects(self, other: Tables) -> bool {
        self.0 & other.0 != 0
    }
}

impl std::ops::BitOr for Tables {
    type Output = Tables;

    #[inline]
    fn bitor(self, rhs: Tables) -> Tables {
        Tables(self.0 | rhs.0)
    }
}

// =============================================================================
// Change Bus
// =============================================================================

/// A committed mutation, as seen by subscriptions.
#[derive(Debug, Clone, Copy)]
pub struct ChangeEvent {
    /// Commit sequence number, issued under the write gate. Strictly
    /// increasing in commit order.
    pub seq: u64,

    /// The relations the mutation touched (including cascades).
    pub tables: Tables,
}

/// Broadcast bus carrying [`ChangeEvent`]s from repositories to subscription
/// delivery tasks.
///
/// Publishing never blocks: a subscription that falls behind sees a `Lagged`
/// error on its receiver and catches up by re-querying committed state.
#[derive(Debug, Clone)]
pub(crate) struct ChangeBus {
    tx: broadcast::Sender<ChangeEvent>,
    seq: Arc<AtomicU64>,
}

impl ChangeBus {
    /// Events buffered per subscription before a slow receiver lags.
    const CAPACITY: usize = 64;

    pub(crate) fn new() -> Self {
        let (tx, _) = broadcast::channel(Self::CAPACITY);
        ChangeBus {
            tx,
            seq: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Publishes a committed mutation. Called with the write gate held so
    /// sequence numbers match commit order.
    pub(crate) fn publish(&self, tables: Tables) {
        let seq = self.seq.fetch_add(1, Ordering::SeqCst) + 1;
        // send fails only when no subscription exists - not an error
        let _ = self.tx.send(ChangeEvent { seq, tables });
        debug!(seq, "published change event");
    }

    pub(crate) fn receiver(&self) -> broadcast::Receiver<ChangeEvent> {
        self.tx.subscribe()
    }
}

// =============================================================================
// Subscription
// =============================================================================

/// A live view of one query's results.
///
/// Receive snapshots with [`recv`](Subscription::recv); stop delivery with
/// [`cancel`](Subscription::cancel) or by dropping the subscription. Either
/// teardown path detaches the delivery task without blocking writers or
/// other subscribers.
#[derive(Debug)]
pub struct Subscription<T> {
    id: Uuid,
    rx: mpsc::Receiver<T>,
    shutdown_tx: mpsc::Sender<()>,
}

impl<T> Subscription<T> {
    /// Identifies this subscription in logs.
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Receives the next snapshot.
    ///
    /// The first call yields the initial snapshot taken at subscribe time.
    /// `None` means the subscription ended (cancelled, or the store was
    /// closed).
    pub async fn recv(&mut self) -> Option<T> {
        self.rx.recv().await
    }

    /// Stops further delivery. Immediate and idempotent - cancelling twice
    /// is harmless.
    pub fn cancel(&self) {
        // try_send: a full or closed channel means the task is already
        // shutting down
        let _ = self.shutdown_tx.try_send(());
    }
}

/// Snapshots buffered towards a subscriber before its delivery task awaits.
const SNAPSHOT_BUFFER: usize = 16;

/// Spawns the delivery task for one subscribed query.
///
/// `query` reads committed state only; it is re-run after every event whose
/// tables intersect `watched`, and its result is delivered iff it differs
/// from the last delivered snapshot.
pub(crate) fn spawn_subscription<T, F, Fut>(
    bus: &ChangeBus,
    watched: Tables,
    query: F,
) -> Subscription<T>
where
    T: PartialEq + Clone + Send + 'static,
    F: Fn() -> Fut + Send + 'static,
    Fut: Future<Output = StoreResult<T>> + Send,
{
    let id = Uuid::new_v4();
    let (tx, rx) = mpsc::channel(SNAPSHOT_BUFFER);
    let (shutdown_tx, mut shutdown_rx) = mpsc::channel::<()>(1);
    let mut events = bus.receiver();

    tokio::spawn(async move {
        // Initial snapshot, delivered unconditionally
        let mut last = match query().await {
            Ok(initial) => {
                if tx.send(initial.clone()).await.is_err() {
                    return; // subscriber already gone
                }
                initial
            }
            Err(e) => {
                warn!(subscription = %id, error = %e, "initial live query failed");
                return;
            }
        };

        loop {
            let relevant = tokio::select! {
                _ = shutdown_rx.recv() => break,
                event = events.recv() => match event {
                    Ok(event) => event.tables.intersects(watched),
                    // Missed events: re-query to catch up to newest state
                    Err(broadcast::error::RecvError::Lagged(missed)) => {
                        debug!(subscription = %id, missed, "subscription lagged, catching up");
                        true
                    }
                    // Store closed
                    Err(broadcast::error::RecvError::Closed) => break,
                },
            };

            if !relevant {
                continue;
            }

            match query().await {
                Ok(current) => {
                    if current != last {
                        if tx.send(current.clone()).await.is_err() {
                            break; // subscriber dropped
                        }
                        last = current;
                    }
                }
                Err(e) => {
                    warn!(subscription = %id, error = %e, "live query failed");
                }
            }
        }

        debug!(subscription = %id, "subscription ended");
    });

    debug!(subscription = %id, "subscription started");
    Subscription {
        id,
        rx,
        shutdown_tx,
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tables_intersects() {
        let watched = Tables::EXPENSES | Tables::CATEGORIES;
        assert!(watched.intersects(Tables::EXPENSES));
        assert!(watched.intersects(Tables::CATEGORIES));
        assert!(!watched.intersects(Tables::TRIPS));
        assert!(!Tables::BUDGETS.intersects(Tables::TRIPS));
    }

    #[tokio::test]
    async fn test_bus_sequence_increases() {
        let bus = ChangeBus::new();
        let mut rx = bus.receiver();

        bus.publish(Tables::EXPENSES);
        bus.publish(Tables::TRIPS);

        let first = rx.recv().await.unwrap();
        let second = rx.recv().await.unwrap();
        assert!(second.seq > first.seq);
        assert_eq!(first.tables, Tables::EXPENSES);
    }

    #[tokio::test]
    async fn test_subscription_delivers_initial_and_diffs() {
        let bus = ChangeBus::new();
        let counter = Arc::new(AtomicU64::new(0));

        let source = counter.clone();
        let mut sub = spawn_subscription(&bus, Tables::EXPENSES, move || {
            let source = source.clone();
            async move { Ok(source.load(Ordering::SeqCst)) }
        });

        // Initial snapshot
        assert_eq!(sub.recv().await, Some(0));

        // Relevant event with a changed result
        counter.store(7, Ordering::SeqCst);
        bus.publish(Tables::EXPENSES);
        assert_eq!(sub.recv().await, Some(7));

        // Relevant event with an unchanged result: no snapshot
        bus.publish(Tables::EXPENSES);
        let silent =
            tokio::time::timeout(std::time::Duration::from_millis(100), sub.recv()).await;
        assert!(silent.is_err(), "unchanged result must not deliver");

        // Irrelevant event: no re-query, even though the value changed
        counter.store(9, Ordering::SeqCst);
        bus.publish(Tables::TRIPS);
        let silent =
            tokio::time::timeout(std::time::Duration::from_millis(100), sub.recv()).await;
        assert!(silent.is_err(), "irrelevant commit must not deliver");
    }

    #[tokio::test]
    async fn test_cancel_is_idempotent() {
        let bus = ChangeBus::new();
        let mut sub = spawn_subscription(&bus, Tables::EXPENSES, || async { Ok(1u64) });

        assert_eq!(sub.recv().await, Some(1));

        sub.cancel();
        sub.cancel(); // harmless

        // Task exits; channel closes
        assert_eq!(sub.recv().await, None);
    }
}
