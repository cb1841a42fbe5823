use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};

pub const MAX_IN_FLIGHT: usize = 32;

pub const MAX_IN_FLIGHT_ENV: &str = "CRAFTING_MAX_IN_FLIGHT";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExpansionSnapshot {
    pub capacity: usize,
    pub in_flight: usize,
    pub spawned: usize,
    pub inline: usize,
}

/// Default number of concurrent expansions for a recipe limit
///
/// One slot per recipe beyond the first, so a single-recipe search runs fully
/// inline.
pub fn default_in_flight(recipe_limit: u32) -> usize {
    (recipe_limit.saturating_sub(1) as usize).min(MAX_IN_FLIGHT)
}

pub(crate) fn parse_in_flight(raw: Option<&str>, default_value: usize) -> usize {
    raw.map(str::trim)
        .filter(|v| !v.is_empty())
        .and_then(|v| v.parse::<usize>().ok())
        .unwrap_or(default_value)
        .min(MAX_IN_FLIGHT)
}

pub(crate) fn in_flight_from_env(default_value: usize) -> usize {
    let raw = std::env::var(MAX_IN_FLIGHT_ENV).ok();
    parse_in_flight(raw.as_deref(), default_value)
}

#[derive(Debug, Default)]
struct SlotCounters {
    in_flight: AtomicUsize,
    spawned: AtomicUsize,
    inline: AtomicUsize,
}

/// Fixed pool of concurrent expansion slots
///
/// Acquisition never waits: when every slot is taken the caller is expected
/// to run the expansion itself, which bounds in-flight tasks without any
/// possibility of deadlock.
#[derive(Debug, Clone)]
pub struct ExpansionSlots {
    semaphore: Arc<Semaphore>,
    capacity: usize,
    counters: Arc<SlotCounters>,
}

pub struct ExpansionPermit {
    #[allow(dead_code)]
    permit: OwnedSemaphorePermit,
    counters: Arc<SlotCounters>,
}

impl Drop for ExpansionPermit {
    fn drop(&mut self) {
        self.counters.in_flight.fetch_sub(1, Ordering::Relaxed);
    }
}

impl ExpansionSlots {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.min(MAX_IN_FLIGHT);
        Self {
            semaphore: Arc::new(Semaphore::new(capacity)),
            capacity,
            counters: Arc::new(SlotCounters::default()),
        }
    }

    /// Take a slot if one is free
    pub fn try_acquire(&self) -> Option<ExpansionPermit> {
        match self.semaphore.clone().try_acquire_owned() {
            Ok(permit) => {
                self.counters.in_flight.fetch_add(1, Ordering::Relaxed);
                self.counters.spawned.fetch_add(1, Ordering::Relaxed);
                Some(ExpansionPermit {
                    permit,
                    counters: self.counters.clone(),
                })
            }
            Err(_) => {
                self.counters.inline.fetch_add(1, Ordering::Relaxed);
                None
            }
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn snapshot(&self) -> ExpansionSnapshot {
        ExpansionSnapshot {
            capacity: self.capacity,
            in_flight: self.counters.in_flight.load(Ordering::Relaxed),
            spawned: self.counters.spawned.load(Ordering::Relaxed),
            inline: self.counters.inline.load(Ordering::Relaxed),
        }
    }
}
