//! Tracking of queries forwarded upstream and awaiting a response.
//!
//! Every client query gets a freshly allocated transaction ID before it
//! goes upstream, so concurrent queries from different clients can never
//! collide at the upstream resolver. The table maps that rewritten ID
//! back to the original ID and client address when the response returns.
//!
//! An entry leaves the table through exactly one of two paths: a matching
//! upstream response ([`InflightTable::resolve`]) or its timeout firing
//! ([`InflightTable::expire`]). Whichever runs first removes the entry;
//! the other becomes a no-op.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use rustc_hash::FxHashMap;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::trace;

/// Metadata for one query currently forwarded upstream.
#[derive(Debug)]
pub struct InflightQuery {
    pub original_id: u16,
    pub rewritten_id: u16,
    pub client_addr: SocketAddr,
    pub received_at: Instant,
    /// Distinguishes this registration from a later reuse of the same
    /// rewritten ID, so a stale timer cannot evict the wrong entry.
    generation: u64,
    timer: Option<JoinHandle<()>>,
}

/// The table is at capacity; the query should be dropped.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("in-flight query table is full ({capacity} entries)")]
pub struct TableFull {
    pub capacity: usize,
}

struct Inner {
    entries: FxHashMap<u16, InflightQuery>,
    next_id: u16,
    next_generation: u64,
}

/// Table of in-flight queries, shared between the receive paths and the
/// timeout tasks.
pub struct InflightTable {
    inner: Mutex<Inner>,
    timeout: Duration,
    capacity: usize,
}

impl InflightTable {
    /// `capacity` is clamped below the 16-bit ID space so allocation can
    /// always find a free ID.
    pub fn new(timeout: Duration, capacity: usize) -> Arc<Self> {
        Arc::new(Self {
            inner: Mutex::new(Inner {
                entries: FxHashMap::default(),
                next_id: 0,
                next_generation: 0,
            }),
            timeout,
            capacity: capacity.min(u16::MAX as usize - 1),
        })
    }

    /// Register a client query, returning the rewritten transaction ID to
    /// forward upstream. Arms a timer that evicts the entry after the
    /// configured timeout.
    pub async fn register(
        self: &Arc<Self>,
        original_id: u16,
        client_addr: SocketAddr,
    ) -> Result<u16, TableFull> {
        let mut inner = self.inner.lock().await;

        if inner.entries.len() >= self.capacity {
            return Err(TableFull {
                capacity: self.capacity,
            });
        }

        // Cyclic allocation over [1, 65535]; 0 is never handed out.
        // Occupied IDs are skipped, and the capacity bound guarantees a
        // free one exists.
        let rewritten_id = loop {
            inner.next_id = match inner.next_id {
                u16::MAX => 1,
                id => id + 1,
            };
            if !inner.entries.contains_key(&inner.next_id) {
                break inner.next_id;
            }
        };

        let generation = inner.next_generation;
        inner.next_generation += 1;

        let table = Arc::clone(self);
        let timer = tokio::spawn(async move {
            tokio::time::sleep(table.timeout).await;
            table.expire(rewritten_id, generation).await;
        });

        inner.entries.insert(
            rewritten_id,
            InflightQuery {
                original_id,
                rewritten_id,
                client_addr,
                received_at: Instant::now(),
                generation,
                timer: Some(timer),
            },
        );

        Ok(rewritten_id)
    }

    /// Remove and return the entry for a rewritten ID, cancelling its
    /// timer. `None` means no matching query is in flight (unknown,
    /// duplicate or late response) and the caller should drop the
    /// datagram.
    pub async fn resolve(&self, rewritten_id: u16) -> Option<InflightQuery> {
        let mut entry = self.inner.lock().await.entries.remove(&rewritten_id)?;
        if let Some(timer) = entry.timer.take() {
            timer.abort();
        }
        Some(entry)
    }

    /// Timer path: drop the entry if this registration still owns the ID.
    /// A no-op when the entry was already resolved, or when the ID has
    /// since been reused by a newer registration.
    pub async fn expire(&self, rewritten_id: u16, generation: u64) {
        let mut inner = self.inner.lock().await;
        let owned = inner
            .entries
            .get(&rewritten_id)
            .is_some_and(|entry| entry.generation == generation);
        if owned {
            if let Some(entry) = inner.entries.remove(&rewritten_id) {
                trace!(
                    original_id = entry.original_id,
                    rewritten_id,
                    client = %entry.client_addr,
                    "in-flight query timed out"
                );
            }
        }
    }

    pub async fn len(&self) -> usize {
        self.inner.lock().await.entries.len()
    }
}
