//! Per-collection debounced push scheduling.

use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tokio::task::JoinHandle;

use super::SyncedCollection;

#[derive(Default)]
struct Slot {
    generation: u64,
    /// Timer task still waiting out the quiet period.
    pending: Option<JoinHandle<()>>,
    /// Tasks past the quiet period. Never aborted.
    in_flight: Vec<JoinHandle<()>>,
}

pub(crate) struct PushScheduler {
    quiet_period: Duration,
    slots: Mutex<HashMap<SyncedCollection, Slot>>,
}

impl PushScheduler {
    pub(crate) fn new(quiet_period: Duration) -> Self {
        Self {
            quiet_period,
            slots: Mutex::new(HashMap::new()),
        }
    }

    /// Run `push` once `collection` has been quiet for the quiet period.
    ///
    /// Replaces any unfired push for the same collection.
    pub(crate) fn schedule<F, Fut>(self: &Arc<Self>, collection: SyncedCollection, push: F)
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let scheduler = Arc::clone(self);
        let quiet_period = self.quiet_period;

        let mut slots = self.lock();
        let slot = slots.entry(collection).or_default();
        slot.generation += 1;
        let generation = slot.generation;
        if let Some(previous) = slot.pending.take() {
            previous.abort();
        }
        slot.in_flight.retain(|handle| !handle.is_finished());

        slot.pending = Some(tokio::spawn(async move {
            tokio::time::sleep(quiet_period).await;
            if scheduler.fire(collection, generation) {
                push().await;
            }
        }));
    }

    /// Move the timer task into the in-flight list, unless it was superseded.
    fn fire(&self, collection: SyncedCollection, generation: u64) -> bool {
        let mut slots = self.lock();
        let Some(slot) = slots.get_mut(&collection) else {
            return false;
        };
        if slot.generation != generation {
            return false;
        }
        if let Some(handle) = slot.pending.take() {
            slot.in_flight.push(handle);
        }
        true
    }

    /// Cancel every unfired push. Returns the collections that had one.
    pub(crate) fn cancel_pending(&self) -> Vec<SyncedCollection> {
        let mut slots = self.lock();
        let mut cancelled = Vec::new();
        for (collection, slot) in slots.iter_mut() {
            slot.generation += 1;
            if let Some(handle) = slot.pending.take() {
                handle.abort();
                cancelled.push(*collection);
            }
        }
        cancelled.sort();
        cancelled
    }

    pub(crate) fn take_in_flight(&self) -> Vec<JoinHandle<()>> {
        let mut slots = self.lock();
        slots
            .values_mut()
            .flat_map(|slot| slot.in_flight.drain(..))
            .collect()
    }

    pub(crate) fn has_pending(&self, collection: SyncedCollection) -> bool {
        self.lock()
            .get(&collection)
            .is_some_and(|slot| slot.pending.is_some())
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<SyncedCollection, Slot>> {
        self.slots.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
