// Copyright 2025 eraflo
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! The event dispatcher.

use crate::config::{EventSystemConfig, SpatialFilterMode};
use crate::deferred::{DeferredQueue, EnqueueOutcome};
use crate::error::{EventError, EventResult};
use crate::listener::{ListenerInfo, ListenerOptions};
use crate::registry::{ListenerEntry, ListenerRegistry};
use crate::stats::EventSystemMetrics;
use delve_core::event::EventFilter;
use delve_core::{EventPayload, EventTag, ListenerHandle, ListenerPriority, ObjectRef, Stopwatch};
use std::any::Any;
use std::cell::{Cell, RefCell};
use std::panic::{self, AssertUnwindSafe};
use std::rc::Rc;

/// Hierarchical publish/subscribe hub.
///
/// Listeners subscribe to an [`EventTag`] and receive every event broadcast
/// on that tag or on any of its descendants. Delivery runs `High` listeners
/// before `Normal` ones before `Low` ones across every matching tag, in
/// insertion order within a priority.
///
/// Every operation takes `&self`. Callbacks may register, unregister or
/// broadcast on the same dispatcher (typically through a `Weak` handle to an
/// `Rc<EventDispatcher>`); a broadcast never holds the registry borrow while
/// a callback runs.
pub struct EventDispatcher {
    config: EventSystemConfig,
    registry: RefCell<ListenerRegistry>,
    deferred: DeferredQueue,
    deferred_mode: Cell<bool>,
    metrics: RefCell<EventSystemMetrics>,
    frame_counter: Cell<u64>,
    clock: Stopwatch,
}

impl EventDispatcher {
    /// Creates a dispatcher with the given configuration.
    pub fn new(config: EventSystemConfig) -> Self {
        log::info!(
            "Event dispatcher initialized (deferred capacity {}, overflow {:?}, validation {}).",
            config.deferred_queue_capacity,
            config.overflow_policy,
            if config.validate_payloads { "on" } else { "off" }
        );
        Self {
            deferred: DeferredQueue::new(config.deferred_queue_capacity, config.overflow_policy),
            registry: RefCell::new(ListenerRegistry::new()),
            deferred_mode: Cell::new(false),
            metrics: RefCell::new(EventSystemMetrics::default()),
            frame_counter: Cell::new(0),
            clock: Stopwatch::new(),
            config,
        }
    }

    /// Returns the active configuration.
    pub fn config(&self) -> &EventSystemConfig {
        &self.config
    }

    // --- Registration ---

    /// Subscribes `callback` to `tag` and all of its descendants.
    ///
    /// Fails without touching the registry if the tag is invalid or the
    /// owner is already gone.
    pub fn register_listener<F>(
        &self,
        tag: &EventTag,
        callback: F,
        owner: impl Into<ObjectRef>,
        priority: ListenerPriority,
        filter: Option<EventFilter>,
    ) -> EventResult<ListenerHandle>
    where
        F: Fn(&EventPayload) + 'static,
    {
        let owner = owner.into();
        if !tag.is_valid() {
            log::error!("Cannot register listener: invalid event tag '{tag}'.");
            return Err(EventError::InvalidTag(tag.clone()));
        }
        if !owner.is_alive() {
            log::error!("Cannot register listener on '{tag}': owner {:?} is not alive.", owner);
            return Err(EventError::OwnerNotAlive { tag: tag.clone() });
        }

        let registration_timestamp = self.clock.elapsed_secs_f64();
        let handle = self.registry.borrow_mut().insert(tag, priority, |handle| ListenerEntry {
            handle,
            callback: Rc::new(callback),
            owner,
            filter,
            registration_timestamp,
            invocation_count: Rc::new(Cell::new(0)),
        });
        log::debug!("Registered {handle} on '{tag}' with {priority:?} priority.");
        Ok(handle)
    }

    /// Same as [`register_listener`](Self::register_listener) with the
    /// optional parameters grouped in [`ListenerOptions`].
    pub fn register_listener_with<F>(
        &self,
        tag: &EventTag,
        owner: impl Into<ObjectRef>,
        options: ListenerOptions,
        callback: F,
    ) -> EventResult<ListenerHandle>
    where
        F: Fn(&EventPayload) + 'static,
    {
        self.register_listener(tag, callback, owner, options.priority, options.filter)
    }

    /// Removes one listener. Returns `false` for invalid or unknown handles.
    pub fn unregister_listener(&self, handle: ListenerHandle) -> bool {
        if !handle.is_valid() {
            log::warn!("Ignoring unregister request for an invalid listener handle.");
            return false;
        }
        match self.registry.borrow_mut().remove(handle) {
            Some(_) => {
                log::debug!("Unregistered {handle}.");
                true
            }
            None => {
                log::warn!("{}", EventError::UnknownHandle(handle));
                false
            }
        }
    }

    /// Removes every listener owned by `owner` and returns how many were removed.
    pub fn unregister_all_listeners(&self, owner: &ObjectRef) -> usize {
        let handles = self
            .registry
            .borrow()
            .handles_where(|entry| &entry.owner == owner);
        let removed = handles
            .into_iter()
            .filter(|handle| self.unregister_listener(*handle))
            .count();
        if removed > 0 {
            log::debug!("Unregistered {removed} listener(s) owned by {owner:?}.");
        }
        removed
    }

    /// Removes every listener whose owner has been destroyed.
    pub fn cleanup_stale_listeners(&self) -> usize {
        let stale = self
            .registry
            .borrow()
            .handles_where(|entry| !entry.owner.is_alive());
        let removed = stale
            .into_iter()
            .filter(|handle| self.registry.borrow_mut().remove(*handle).is_some())
            .count();
        if removed > 0 {
            log::info!("Removed {removed} stale listener(s).");
        }
        removed
    }

    /// Removes every listener and discards queued deferred events.
    pub fn clear(&self) {
        self.registry.borrow_mut().clear();
        let dropped = self.deferred.clear();
        if dropped > 0 {
            log::warn!("Discarded {dropped} pending deferred event(s) on clear.");
        }
    }

    // --- Broadcasting ---

    /// Delivers `payload` to every matching listener, or queues it in deferred mode.
    pub fn broadcast_event(&self, payload: &EventPayload) {
        if !payload.tag.is_valid() {
            log::error!("Cannot broadcast event: invalid event tag '{}'.", payload.tag);
            return;
        }

        if self.config.validate_payloads {
            if let Err(report) = payload.validate() {
                log::error!("Rejected {} event: {report}", payload.data.kind());
                self.metrics.borrow_mut().rejected_events += 1;
                return;
            }
        }

        if self.deferred_mode.get() {
            self.enqueue(payload.clone());
            return;
        }

        self.dispatch(payload);
    }

    fn enqueue(&self, payload: EventPayload) {
        let tag = payload.tag.clone();
        let outcome = self.deferred.push(payload);
        let mut metrics = self.metrics.borrow_mut();
        match outcome {
            EnqueueOutcome::Queued => {
                metrics.deferred_events_queued += 1;
            }
            EnqueueOutcome::DroppedNewest => {
                metrics.dropped_deferred_events += 1;
                log::warn!(
                    "Deferred queue full ({}), dropped incoming '{tag}' event.",
                    self.deferred.capacity()
                );
            }
            EnqueueOutcome::DroppedOldest => {
                metrics.deferred_events_queued += 1;
                metrics.dropped_deferred_events += 1;
                log::warn!(
                    "Deferred queue full ({}), evicted the oldest event for '{tag}'.",
                    self.deferred.capacity()
                );
            }
        }
    }

    fn dispatch(&self, payload: &EventPayload) {
        let watch = Stopwatch::new();
        let lineage = payload.tag.lineage();
        let mut invocations = 0usize;
        let mut listener_ms = 0.0;
        let mut faults = 0u64;

        // Every bucket is copied up front so listeners registered by a callback
        // first hear the next broadcast.
        let registry = self.registry.borrow();
        let buckets: Vec<(&EventTag, Vec<ListenerEntry>)> = ListenerPriority::ORDERED
            .iter()
            .flat_map(|&priority| lineage.iter().map(move |tag| (tag, priority)))
            .map(|(tag, priority)| (tag, registry.snapshot(tag, priority)))
            .filter(|(_, bucket)| !bucket.is_empty())
            .collect();
        drop(registry);

        for (tag, bucket) in buckets {
            for entry in bucket {
                if !entry.owner.is_alive() || !self.accepts(&entry, payload) {
                    continue;
                }
                // Unregistered by an earlier callback of this broadcast.
                if !self.registry.borrow().contains(entry.handle) {
                    continue;
                }

                let call = Stopwatch::new();
                let result =
                    panic::catch_unwind(AssertUnwindSafe(|| (entry.callback)(payload)));
                listener_ms += call.elapsed_ms_f64();
                entry.record_invocation();
                invocations += 1;

                if let Err(cause) = result {
                    faults += 1;
                    log::error!(
                        "Listener {} on '{tag}' panicked while handling '{}': {}",
                        entry.handle,
                        payload.tag,
                        panic_message(cause.as_ref())
                    );
                }
            }
        }

        self.metrics.borrow_mut().record_broadcast(
            invocations,
            watch.elapsed_ms_f64(),
            listener_ms,
            faults,
        );
        log::trace!("Broadcast '{}' reached {invocations} listener(s).", payload.tag);
    }

    fn accepts(&self, entry: &ListenerEntry, payload: &EventPayload) -> bool {
        let Some(filter) = &entry.filter else {
            return true;
        };
        match (self.config.spatial_filter_mode, payload.location) {
            (SpatialFilterMode::UsePayloadLocation, Some(location)) => {
                filter.passes_at(payload, location)
            }
            _ => filter.passes(payload),
        }
    }

    // --- Deferred mode ---

    /// Queue subsequent broadcasts instead of delivering them.
    pub fn enable_deferred_mode(&self) {
        if !self.deferred_mode.replace(true) {
            log::debug!("Deferred event mode enabled.");
        }
    }

    /// Resume immediate delivery. Queued events stay queued.
    pub fn disable_deferred_mode(&self) {
        if self.deferred_mode.replace(false) {
            let pending = self.deferred.len();
            if pending > 0 {
                log::warn!(
                    "Deferred mode disabled with {pending} event(s) still queued; \
                     they are delivered on the next process_deferred_events call."
                );
            } else {
                log::debug!("Deferred event mode disabled.");
            }
        }
    }

    /// Returns `true` while broadcasts are being queued.
    pub fn is_deferred_mode(&self) -> bool {
        self.deferred_mode.get()
    }

    /// Number of queued events.
    pub fn pending_deferred_events(&self) -> usize {
        self.deferred.len()
    }

    /// Delivers, in FIFO order, the events queued when the call started.
    ///
    /// Events queued by listeners during the drain wait for the next call.
    pub fn process_deferred_events(&self) -> usize {
        let pending = self.deferred.len();
        let mut processed = 0;
        while processed < pending {
            let Some(payload) = self.deferred.pop() else {
                break;
            };
            self.dispatch(&payload);
            processed += 1;
        }
        if processed > 0 {
            log::debug!("Processed {processed} deferred event(s).");
        }
        processed
    }

    // --- Maintenance ---

    /// Advances the frame counter and runs the stale sweep on its interval.
    pub fn tick(&self) {
        let frame = self.frame_counter.get() + 1;
        self.frame_counter.set(frame);
        let interval = self.config.stale_sweep_interval_frames;
        if interval > 0 && frame % interval == 0 {
            self.cleanup_stale_listeners();
        }
    }

    // --- Introspection ---

    /// Listeners registered directly on `tag` (descendants excluded).
    pub fn listener_count(&self, tag: &EventTag) -> usize {
        self.registry.borrow().listener_count(tag)
    }

    /// Listeners registered across every tag.
    pub fn total_listener_count(&self) -> usize {
        self.registry.borrow().total_listener_count()
    }

    /// Tags with at least one listener, sorted.
    pub fn registered_tags(&self) -> Vec<EventTag> {
        self.registry.borrow().tags()
    }

    /// Returns `true` if `handle` is currently registered.
    pub fn is_registered(&self, handle: ListenerHandle) -> bool {
        self.registry.borrow().contains(handle)
    }

    /// Describes a registered listener.
    pub fn listener_info(&self, handle: ListenerHandle) -> Option<ListenerInfo> {
        let registry = self.registry.borrow();
        let (tag, priority, entry) = registry.entry(handle)?;
        Some(ListenerInfo {
            handle,
            tag: tag.clone(),
            priority,
            owner: entry.owner.id(),
            owner_alive: entry.owner.is_alive(),
            registration_timestamp: entry.registration_timestamp,
            invocation_count: entry.invocation_count.get(),
        })
    }

    /// Current performance counters.
    pub fn performance_metrics(&self) -> EventSystemMetrics {
        *self.metrics.borrow()
    }

    /// Zeroes every performance counter.
    pub fn reset_performance_metrics(&self) {
        *self.metrics.borrow_mut() = EventSystemMetrics::default();
    }
}

impl Default for EventDispatcher {
    fn default() -> Self {
        Self::new(EventSystemConfig::default())
    }
}

impl std::fmt::Debug for EventDispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventDispatcher")
            .field("listeners", &self.total_listener_count())
            .field("deferred_mode", &self.deferred_mode.get())
            .field("pending_deferred", &self.deferred.len())
            .finish()
    }
}

fn panic_message(cause: &(dyn Any + Send)) -> &str {
    if let Some(message) = cause.downcast_ref::<&str>() {
        *message
    } else if let Some(message) = cause.downcast_ref::<String>() {
        message.as_str()
    } else {
        "non-string panic payload"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use delve_core::ObjectToken;

    #[test]
    fn test_panic_message_extraction() {
        let boxed: Box<dyn Any + Send> = Box::new("static message");
        assert_eq!(panic_message(boxed.as_ref()), "static message");
        let boxed: Box<dyn Any + Send> = Box::new(String::from("owned message"));
        assert_eq!(panic_message(boxed.as_ref()), "owned message");
        let boxed: Box<dyn Any + Send> = Box::new(42u32);
        assert_eq!(panic_message(boxed.as_ref()), "non-string panic payload");
    }

    #[test]
    fn test_sweep_disabled_with_zero_interval() {
        let dispatcher = EventDispatcher::new(EventSystemConfig {
            stale_sweep_interval_frames: 0,
            ..Default::default()
        });
        let owner = ObjectToken::new("Owner");
        let tag = EventTag::new("Game").unwrap();
        dispatcher
            .register_listener(&tag, |_| {}, &owner, ListenerPriority::Normal, None)
            .unwrap();
        drop(owner);

        for _ in 0..1000 {
            dispatcher.tick();
        }
        assert_eq!(dispatcher.total_listener_count(), 1);
        assert_eq!(dispatcher.cleanup_stale_listeners(), 1);
    }

    #[test]
    fn test_clear_empties_registry_and_queue() {
        let dispatcher = EventDispatcher::default();
        let owner = ObjectToken::new("Owner");
        let tag = EventTag::new("Game").unwrap();
        dispatcher
            .register_listener(&tag, |_| {}, &owner, ListenerPriority::Normal, None)
            .unwrap();
        dispatcher.enable_deferred_mode();
        dispatcher.broadcast_event(&EventPayload::new(tag));

        dispatcher.clear();

        assert_eq!(dispatcher.total_listener_count(), 0);
        assert_eq!(dispatcher.pending_deferred_events(), 0);
        assert!(dispatcher.registered_tags().is_empty());
    }
}
