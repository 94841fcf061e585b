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

//! Bounded FIFO holding events broadcast while the dispatcher is deferred.

use crate::config::DeferredOverflowPolicy;
use delve_core::EventPayload;
use flume::TrySendError;

/// Result of pushing an event into the deferred queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum EnqueueOutcome {
    /// The event was queued without loss.
    Queued,
    /// The queue was full and the incoming event was discarded.
    DroppedNewest,
    /// The queue was full and its oldest event was evicted for the incoming one.
    DroppedOldest,
}

/// A bounded channel whose both ends are owned by the dispatcher.
pub(crate) struct DeferredQueue {
    sender: flume::Sender<EventPayload>,
    receiver: flume::Receiver<EventPayload>,
    policy: DeferredOverflowPolicy,
}

impl DeferredQueue {
    /// A zero capacity is bumped to one; flume treats zero as a rendezvous channel.
    pub fn new(capacity: usize, policy: DeferredOverflowPolicy) -> Self {
        let (sender, receiver) = flume::bounded(capacity.max(1));
        Self {
            sender,
            receiver,
            policy,
        }
    }

    pub fn push(&self, payload: EventPayload) -> EnqueueOutcome {
        let payload = match self.sender.try_send(payload) {
            Ok(()) => return EnqueueOutcome::Queued,
            Err(TrySendError::Full(payload)) => payload,
            // Both ends live as long as the queue does.
            Err(TrySendError::Disconnected(_)) => return EnqueueOutcome::DroppedNewest,
        };

        match self.policy {
            DeferredOverflowPolicy::DropNewest => EnqueueOutcome::DroppedNewest,
            DeferredOverflowPolicy::DropOldest => {
                let _evicted = self.receiver.try_recv();
                match self.sender.try_send(payload) {
                    Ok(()) => EnqueueOutcome::DroppedOldest,
                    Err(_) => EnqueueOutcome::DroppedNewest,
                }
            }
        }
    }

    pub fn pop(&self) -> Option<EventPayload> {
        self.receiver.try_recv().ok()
    }

    pub fn len(&self) -> usize {
        self.receiver.len()
    }

    pub fn capacity(&self) -> usize {
        self.sender.capacity().unwrap_or(0)
    }

    /// Discards every queued event and returns how many were dropped.
    pub fn clear(&self) -> usize {
        self.receiver.drain().count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use delve_core::EventTag;

    fn event(n: f64) -> EventPayload {
        EventPayload::new(EventTag::new("Game.Test").unwrap()).with_timestamp(n)
    }

    fn drain(queue: &DeferredQueue) -> Vec<f64> {
        std::iter::from_fn(|| queue.pop())
            .map(|p| p.timestamp)
            .collect()
    }

    #[test]
    fn test_fifo_order() {
        let queue = DeferredQueue::new(8, DeferredOverflowPolicy::DropNewest);
        for i in 0..3 {
            assert_eq!(queue.push(event(i as f64)), EnqueueOutcome::Queued);
        }
        assert_eq!(queue.len(), 3);
        assert_eq!(drain(&queue), vec![0.0, 1.0, 2.0]);
    }

    #[test]
    fn test_drop_newest_keeps_existing_events() {
        let queue = DeferredQueue::new(2, DeferredOverflowPolicy::DropNewest);
        queue.push(event(0.0));
        queue.push(event(1.0));
        assert_eq!(queue.push(event(2.0)), EnqueueOutcome::DroppedNewest);
        assert_eq!(drain(&queue), vec![0.0, 1.0]);
    }

    #[test]
    fn test_drop_oldest_evicts_head() {
        let queue = DeferredQueue::new(2, DeferredOverflowPolicy::DropOldest);
        queue.push(event(0.0));
        queue.push(event(1.0));
        assert_eq!(queue.push(event(2.0)), EnqueueOutcome::DroppedOldest);
        assert_eq!(drain(&queue), vec![1.0, 2.0]);
    }

    #[test]
    fn test_zero_capacity_and_clear() {
        let queue = DeferredQueue::new(0, DeferredOverflowPolicy::DropNewest);
        assert_eq!(queue.capacity(), 1);
        queue.push(event(0.0));
        assert_eq!(queue.clear(), 1);
        assert_eq!(queue.len(), 0);
    }
}
