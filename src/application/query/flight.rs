//! Single-flight registry: at most one upstream fetch per key at a time.
//!
//! The first caller to miss becomes the leader and receives a
//! [`FlightLease`]; everyone arriving while the fetch is outstanding gets a
//! receiver for the same result. The lease clears the slot before publishing,
//! and clears it on drop too, so a failed, timed-out or panicked fetch never
//! leaves waiters blocked or the key stuck.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use thiserror::Error;
use tokio::sync::broadcast;

use crate::domain::{Dividends, QueryKey};
use crate::error::Error;

/// Failure of a shared fetch, cloned to every waiter.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FlightError {
    #[error("upstream timed out after {0:?}")]
    Timeout(Duration),

    #[error("upstream error: {0}")]
    Upstream(String),

    /// The leader went away without publishing a result.
    #[error("upstream fetch abandoned")]
    Abandoned,
}

impl From<FlightError> for Error {
    fn from(err: FlightError) -> Self {
        match err {
            FlightError::Timeout(limit) => Error::UpstreamTimeout(limit),
            FlightError::Upstream(reason) => Error::Upstream(reason),
            FlightError::Abandoned => Error::Upstream("upstream fetch abandoned".into()),
        }
    }
}

impl From<Error> for FlightError {
    fn from(err: Error) -> Self {
        match err {
            Error::UpstreamTimeout(limit) => FlightError::Timeout(limit),
            Error::Upstream(reason) => FlightError::Upstream(reason),
            other => FlightError::Upstream(other.to_string()),
        }
    }
}

/// Value produced by one flight.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Landed {
    pub dividends: Dividends,
    /// True when the leader found a fresh cache entry written by an earlier
    /// flight instead of calling upstream.
    pub from_cache: bool,
}

pub type FlightResult = std::result::Result<Landed, FlightError>;

struct Slot {
    generation: u64,
    sender: broadcast::Sender<FlightResult>,
}

/// What a caller got when joining a key.
pub enum Joined {
    /// Run the fetch and publish through the lease.
    Leader(FlightLease, Waiter),
    /// Another caller is already fetching.
    Follower(Waiter),
}

/// Receives the result of a flight.
pub struct Waiter(broadcast::Receiver<FlightResult>);

impl Waiter {
    /// Wait for the flight to land.
    pub async fn wait(mut self) -> FlightResult {
        self.0.recv().await.unwrap_or(Err(FlightError::Abandoned))
    }
}

/// Tracks outstanding fetches by key.
#[derive(Default)]
pub struct FlightRegistry {
    slots: Mutex<HashMap<QueryKey, Slot>>,
    generations: AtomicU64,
}

impl FlightRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Join the flight for `key`, starting one if none is outstanding.
    pub fn join(self: &Arc<Self>, key: &QueryKey) -> Joined {
        let mut slots = self.slots.lock();
        if let Some(slot) = slots.get(key) {
            return Joined::Follower(Waiter(slot.sender.subscribe()));
        }

        let generation = self.generations.fetch_add(1, Ordering::Relaxed);
        let (sender, receiver) = broadcast::channel(1);
        slots.insert(
            key.clone(),
            Slot {
                generation,
                sender: sender.clone(),
            },
        );

        let lease = FlightLease {
            registry: Arc::clone(self),
            key: key.clone(),
            generation,
            sender: Some(sender),
        };
        Joined::Leader(lease, Waiter(receiver))
    }

    /// Number of keys with a fetch outstanding.
    #[must_use]
    pub fn in_flight(&self) -> usize {
        self.slots.lock().len()
    }

    fn release(&self, key: &QueryKey, generation: u64) {
        let mut slots = self.slots.lock();
        if slots.get(key).is_some_and(|slot| slot.generation == generation) {
            slots.remove(key);
        }
    }
}

/// Ownership of one outstanding flight.
///
/// Dropping the lease without calling [`land`](Self::land) publishes
/// [`FlightError::Abandoned`].
pub struct FlightLease {
    registry: Arc<FlightRegistry>,
    key: QueryKey,
    generation: u64,
    sender: Option<broadcast::Sender<FlightResult>>,
}

impl FlightLease {
    #[must_use]
    pub fn key(&self) -> &QueryKey {
        &self.key
    }

    /// Clear the slot and publish `result` to every waiter.
    pub fn land(mut self, result: FlightResult) {
        self.publish(result);
    }

    fn publish(&mut self, result: FlightResult) {
        // Clear first: anyone subscribing after this starts a new flight
        // instead of waiting on a sender that has already fired.
        self.registry.release(&self.key, self.generation);
        if let Some(sender) = self.sender.take() {
            let _ = sender.send(result);
        }
    }
}

impl Drop for FlightLease {
    fn drop(&mut self) {
        if self.sender.is_some() {
            self.publish(Err(FlightError::Abandoned));
        }
    }
}
