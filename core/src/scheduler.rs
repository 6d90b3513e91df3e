use std::cmp::Ordering;
use std::collections::BinaryHeap;

use serde::{Deserialize, Serialize};

/// Work that completes some time after it was ordered.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum JobKind {
    Delivery { item: String, quantity: u32 },
    InstallUpgrade { upgrade: String },
}

/// Which counter a job's due time is measured against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ScheduleClock {
    /// Absolute service round (`day_counter * closing_round + round`).
    Round,
    /// Days elapsed on the calendar; checked at every close.
    Night,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduledJob {
    pub kind: JobKind,
    pub due_at: u64,
    sequence: u64,
}

impl Ord for ScheduledJob {
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .due_at
            .cmp(&self.due_at)
            .then_with(|| other.sequence.cmp(&self.sequence))
    }
}

impl PartialOrd for ScheduledJob {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PendingQueue {
    by_round: BinaryHeap<ScheduledJob>,
    by_night: BinaryHeap<ScheduledJob>,
    next_sequence: u64,
}

impl PendingQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn schedule(&mut self, kind: JobKind, clock: ScheduleClock, due_at: u64) {
        let job = ScheduledJob {
            kind,
            due_at,
            sequence: self.next_sequence,
        };
        self.next_sequence += 1;
        self.heap_mut(clock).push(job);
    }

    /// Removes and returns every job due at or before `now`, oldest first.
    pub fn take_due(&mut self, clock: ScheduleClock, now: u64) -> Vec<JobKind> {
        let heap = self.heap_mut(clock);
        let mut ready = Vec::new();
        while heap.peek().is_some_and(|job| job.due_at <= now) {
            if let Some(job) = heap.pop() {
                ready.push(job.kind);
            }
        }
        ready
    }

    pub fn is_installing(&self, upgrade: &str) -> bool {
        self.by_night.iter().any(|job| {
            matches!(&job.kind, JobKind::InstallUpgrade { upgrade: id } if id == upgrade)
        })
    }

    pub fn pending(&self, clock: ScheduleClock) -> Vec<&ScheduledJob> {
        let heap = match clock {
            ScheduleClock::Round => &self.by_round,
            ScheduleClock::Night => &self.by_night,
        };
        let mut jobs: Vec<&ScheduledJob> = heap.iter().collect();
        jobs.sort_by(|a, b| b.cmp(a));
        jobs
    }

    pub fn is_empty(&self) -> bool {
        self.by_round.is_empty() && self.by_night.is_empty()
    }

    /// Drops every queued upgrade install. Used when assets are repossessed.
    pub fn cancel_installs(&mut self) -> Vec<String> {
        let mut cancelled = Vec::new();
        for job in self.by_night.drain() {
            if let JobKind::InstallUpgrade { upgrade } = job.kind {
                cancelled.push(upgrade);
            }
        }
        cancelled
    }

    fn heap_mut(&mut self, clock: ScheduleClock) -> &mut BinaryHeap<ScheduledJob> {
        match clock {
            ScheduleClock::Round => &mut self.by_round,
            ScheduleClock::Night => &mut self.by_night,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn delivery(item: &str, quantity: u32) -> JobKind {
        JobKind::Delivery {
            item: item.to_string(),
            quantity,
        }
    }

    #[test]
    fn jobs_are_released_in_due_order() {
        let mut queue = PendingQueue::new();
        queue.schedule(delivery("ale", 5), ScheduleClock::Round, 9);
        queue.schedule(delivery("lager", 3), ScheduleClock::Round, 4);
        queue.schedule(delivery("cider", 2), ScheduleClock::Round, 4);

        assert!(queue.take_due(ScheduleClock::Round, 3).is_empty());
        let ready = queue.take_due(ScheduleClock::Round, 5);
        assert_eq!(ready, vec![delivery("lager", 3), delivery("cider", 2)]);
        assert_eq!(queue.take_due(ScheduleClock::Round, 9), vec![delivery("ale", 5)]);
        assert!(queue.is_empty());
    }

    #[test]
    fn clocks_do_not_interfere() {
        let mut queue = PendingQueue::new();
        queue.schedule(
            JobKind::InstallUpgrade {
                upgrade: "cctv".to_string(),
            },
            ScheduleClock::Night,
            2,
        );
        assert!(queue.is_installing("cctv"));
        assert!(queue.take_due(ScheduleClock::Round, 100).is_empty());
        assert_eq!(queue.take_due(ScheduleClock::Night, 2).len(), 1);
        assert!(!queue.is_installing("cctv"));
    }
}
