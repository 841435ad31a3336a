//! In-process trade job queue with leases.

use std::collections::{HashMap, VecDeque};
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::time::Instant;
use tracing::debug;

use crate::domain::{JobId, TradeJob};
use crate::error::{Error, Result};
use crate::port::outbound::dispatch::{Delivery, Enqueued, TaskDispatcher};

/// How long acknowledged ids are remembered for deduplication.
const DEFAULT_RETENTION: Duration = Duration::from_secs(3600);

struct Slot {
    job: TradeJob,
    attempts: u32,
    leased_until: Option<Instant>,
}

#[derive(Default)]
struct Queue {
    ready: VecDeque<JobId>,
    jobs: HashMap<JobId, Slot>,
    /// Acknowledged ids and when to forget them.
    acked: HashMap<JobId, Instant>,
}

impl Queue {
    /// Return expired leases to the back of the ready queue.
    fn reclaim(&mut self, now: Instant) {
        for (id, slot) in &mut self.jobs {
            if slot.leased_until.is_some_and(|until| until <= now) {
                slot.leased_until = None;
                self.ready.push_back(id.clone());
                debug!(job_id = %id, attempts = slot.attempts, "Lease expired, requeueing");
            }
        }
        self.acked.retain(|_, forget_at| *forget_at > now);
    }
}

/// Bounded queue held in process memory.
///
/// Jobs are lost if the process exits; use the SQLite dispatcher for
/// durability across restarts.
pub struct MemoryDispatcher {
    queue: Mutex<Queue>,
    capacity: usize,
    visibility_timeout: Duration,
    retention: Duration,
}

impl MemoryDispatcher {
    /// Create a queue holding at most `capacity` unacknowledged jobs.
    #[must_use]
    pub fn new(capacity: usize, visibility_timeout: Duration) -> Self {
        Self {
            queue: Mutex::new(Queue::default()),
            capacity,
            visibility_timeout,
            retention: DEFAULT_RETENTION,
        }
    }

    #[must_use]
    pub fn with_retention(mut self, retention: Duration) -> Self {
        self.retention = retention;
        self
    }
}

#[async_trait]
impl TaskDispatcher for MemoryDispatcher {
    fn name(&self) -> &'static str {
        "memory"
    }

    async fn enqueue(&self, job: &TradeJob) -> Result<Enqueued> {
        let mut queue = self.queue.lock();
        queue.reclaim(Instant::now());

        if queue.jobs.contains_key(&job.job_id) || queue.acked.contains_key(&job.job_id) {
            return Ok(Enqueued::Duplicate);
        }
        if queue.jobs.len() >= self.capacity {
            return Err(Error::DispatchUnavailable(format!(
                "queue full ({} jobs)",
                self.capacity
            )));
        }

        queue.jobs.insert(
            job.job_id.clone(),
            Slot {
                job: job.clone(),
                attempts: 0,
                leased_until: None,
            },
        );
        queue.ready.push_back(job.job_id.clone());
        Ok(Enqueued::Accepted)
    }

    async fn dequeue(&self) -> Result<Option<Delivery>> {
        let now = Instant::now();
        let mut queue = self.queue.lock();
        queue.reclaim(now);

        while let Some(id) = queue.ready.pop_front() {
            let Some(slot) = queue.jobs.get_mut(&id) else {
                continue;
            };
            if slot.leased_until.is_some() {
                continue;
            }
            slot.attempts += 1;
            slot.leased_until = Some(now + self.visibility_timeout);
            return Ok(Some(Delivery {
                job: slot.job.clone(),
                attempt: slot.attempts,
            }));
        }
        Ok(None)
    }

    async fn ack(&self, job_id: &JobId) -> Result<()> {
        let mut queue = self.queue.lock();
        if queue.jobs.remove(job_id).is_some() {
            let forget_at = Instant::now() + self.retention;
            queue.acked.insert(job_id.clone(), forget_at);
        }
        Ok(())
    }

    async fn pending(&self) -> Result<usize> {
        Ok(self.queue.lock().jobs.len())
    }
}
