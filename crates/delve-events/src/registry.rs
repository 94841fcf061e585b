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

//! Listener storage: per-tag priority buckets plus the handle index.

use delve_core::event::EventFilter;
use delve_core::{EventPayload, EventTag, ListenerHandle, ListenerPriority, ObjectRef};
use std::cell::Cell;
use std::collections::HashMap;
use std::rc::Rc;

/// Callback invoked for every delivered event.
pub(crate) type ListenerCallback = Rc<dyn Fn(&EventPayload)>;

/// One registered listener.
///
/// Cloning is cheap and clones share the invocation counter, so a broadcast
/// can iterate a copy of a bucket and still update the stored entry.
#[derive(Clone)]
pub(crate) struct ListenerEntry {
    pub handle: ListenerHandle,
    pub callback: ListenerCallback,
    pub owner: ObjectRef,
    pub filter: Option<EventFilter>,
    pub registration_timestamp: f64,
    pub invocation_count: Rc<Cell<u64>>,
}

impl ListenerEntry {
    pub fn record_invocation(&self) {
        self.invocation_count.set(self.invocation_count.get() + 1);
    }
}

/// The three priority buckets of a tag.
#[derive(Default)]
pub(crate) struct ListenerList {
    buckets: [Vec<ListenerEntry>; 3],
}

impl ListenerList {
    pub fn bucket(&self, priority: ListenerPriority) -> &[ListenerEntry] {
        &self.buckets[priority.index()]
    }

    fn bucket_mut(&mut self, priority: ListenerPriority) -> &mut Vec<ListenerEntry> {
        &mut self.buckets[priority.index()]
    }

    pub fn len(&self) -> usize {
        self.buckets.iter().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.buckets.iter().all(Vec::is_empty)
    }
}

/// Location of a listener inside the registry.
#[derive(Debug, Clone, PartialEq)]
struct HandleSlot {
    tag: EventTag,
    priority: ListenerPriority,
    index: usize,
}

/// Tag-indexed listener lists with O(1) handle lookup.
///
/// Every handle maps to the bucket position of its entry. Removing an entry
/// shifts the entries after it, so their slots are decremented in the same
/// operation.
pub(crate) struct ListenerRegistry {
    lists: HashMap<EventTag, ListenerList>,
    handles: HashMap<ListenerHandle, HandleSlot>,
    next_handle: u64,
}

impl ListenerRegistry {
    pub fn new() -> Self {
        Self {
            lists: HashMap::new(),
            handles: HashMap::new(),
            next_handle: 1,
        }
    }

    /// Mints a handle, appends the entry built by `make` and indexes it.
    pub fn insert(
        &mut self,
        tag: &EventTag,
        priority: ListenerPriority,
        make: impl FnOnce(ListenerHandle) -> ListenerEntry,
    ) -> ListenerHandle {
        let handle = ListenerHandle::from_raw(self.next_handle);
        self.next_handle += 1;

        let bucket = self.lists.entry(tag.clone()).or_default().bucket_mut(priority);
        let index = bucket.len();
        bucket.push(make(handle));

        self.handles.insert(
            handle,
            HandleSlot {
                tag: tag.clone(),
                priority,
                index,
            },
        );
        handle
    }

    /// Removes the entry behind `handle`, keeping every other slot accurate.
    pub fn remove(&mut self, handle: ListenerHandle) -> Option<ListenerEntry> {
        let slot = self.handles.get(&handle)?.clone();
        let Some(list) = self.lists.get_mut(&slot.tag) else {
            log::error!("No listener list for {handle} on '{}'", slot.tag);
            self.handles.remove(&handle);
            return None;
        };
        let bucket = list.bucket_mut(slot.priority);
        if slot.index >= bucket.len() {
            log::error!("Listener index out of range for {handle} on '{}'", slot.tag);
            self.handles.remove(&handle);
            return None;
        }

        let entry = bucket.remove(slot.index);
        for shifted in &bucket[slot.index..] {
            if let Some(moved) = self.handles.get_mut(&shifted.handle) {
                moved.index -= 1;
            }
        }
        self.handles.remove(&handle);

        if list.is_empty() {
            self.lists.remove(&slot.tag);
        }
        Some(entry)
    }

    pub fn contains(&self, handle: ListenerHandle) -> bool {
        self.handles.contains_key(&handle)
    }

    pub fn entry(
        &self,
        handle: ListenerHandle,
    ) -> Option<(&EventTag, ListenerPriority, &ListenerEntry)> {
        let slot = self.handles.get(&handle)?;
        let entry = self
            .lists
            .get(&slot.tag)?
            .bucket(slot.priority)
            .get(slot.index)?;
        Some((&slot.tag, slot.priority, entry))
    }

    /// Copies the bucket so callbacks can run without holding a borrow.
    pub fn snapshot(&self, tag: &EventTag, priority: ListenerPriority) -> Vec<ListenerEntry> {
        self.lists
            .get(tag)
            .map(|list| list.bucket(priority).to_vec())
            .unwrap_or_default()
    }

    /// Collects the handles of every entry matching `predicate`.
    pub fn handles_where(
        &self,
        predicate: impl Fn(&ListenerEntry) -> bool,
    ) -> Vec<ListenerHandle> {
        self.lists
            .values()
            .flat_map(|list| list.buckets.iter().flatten())
            .filter(|entry| predicate(entry))
            .map(|entry| entry.handle)
            .collect()
    }

    pub fn listener_count(&self, tag: &EventTag) -> usize {
        self.lists.get(tag).map_or(0, ListenerList::len)
    }

    pub fn total_listener_count(&self) -> usize {
        self.handles.len()
    }

    pub fn tags(&self) -> Vec<EventTag> {
        let mut tags: Vec<EventTag> = self.lists.keys().cloned().collect();
        tags.sort();
        tags
    }

    pub fn clear(&mut self) {
        self.lists.clear();
        self.handles.clear();
    }

    #[cfg(test)]
    fn slot_index(&self, handle: ListenerHandle) -> Option<usize> {
        self.handles.get(&handle).map(|slot| slot.index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use delve_core::ObjectToken;

    fn entry(owner: &ObjectToken) -> impl FnOnce(ListenerHandle) -> ListenerEntry + '_ {
        move |handle| ListenerEntry {
            handle,
            callback: Rc::new(|_| {}),
            owner: owner.downgrade(),
            filter: None,
            registration_timestamp: 0.0,
            invocation_count: Rc::new(Cell::new(0)),
        }
    }

    fn tag(name: &str) -> EventTag {
        EventTag::new(name).unwrap()
    }

    #[test]
    fn test_handles_are_unique_and_increasing() {
        let owner = ObjectToken::new("Owner");
        let mut registry = ListenerRegistry::new();
        let a = registry.insert(&tag("A"), ListenerPriority::Normal, entry(&owner));
        let b = registry.insert(&tag("A"), ListenerPriority::Normal, entry(&owner));
        assert!(a.is_valid());
        assert!(b.raw() > a.raw());
    }

    #[test]
    fn test_remove_drops_handle_without_list() {
        let owner = ObjectToken::new("Owner");
        let mut registry = ListenerRegistry::new();
        let t = tag("Game.Loot");
        let handle = registry.insert(&t, ListenerPriority::Normal, entry(&owner));
        registry.lists.remove(&t);

        assert!(registry.remove(handle).is_none());
        assert!(!registry.contains(handle), "Handle must not outlive its list");
    }

    #[test]
    fn test_remove_shifts_later_indices() {
        let owner = ObjectToken::new("Owner");
        let mut registry = ListenerRegistry::new();
        let t = tag("Game.Combat");
        let handles: Vec<_> = (0..4)
            .map(|_| registry.insert(&t, ListenerPriority::High, entry(&owner)))
            .collect();
        let other = registry.insert(&t, ListenerPriority::Low, entry(&owner));

        assert!(registry.remove(handles[1]).is_some());

        assert_eq!(registry.slot_index(handles[0]), Some(0));
        assert_eq!(registry.slot_index(handles[2]), Some(1));
        assert_eq!(registry.slot_index(handles[3]), Some(2));
        assert_eq!(registry.slot_index(other), Some(0), "other buckets are untouched");

        // Every remaining handle still resolves to its own entry.
        for handle in [handles[0], handles[2], handles[3], other] {
            let (_, _, stored) = registry.entry(handle).unwrap();
            assert_eq!(stored.handle, handle);
        }
    }

    #[test]
    fn test_empty_list_is_dropped() {
        let owner = ObjectToken::new("Owner");
        let mut registry = ListenerRegistry::new();
        let t = tag("A.B");
        let h = registry.insert(&t, ListenerPriority::Normal, entry(&owner));
        assert_eq!(registry.tags(), vec![t.clone()]);

        registry.remove(h);
        assert!(registry.tags().is_empty());
        assert_eq!(registry.listener_count(&t), 0);
        assert!(registry.remove(h).is_none(), "second removal is a no-op");
    }

    #[test]
    fn test_handles_where_filters_by_owner() {
        let a = ObjectToken::new("A");
        let b = ObjectToken::new("B");
        let mut registry = ListenerRegistry::new();
        registry.insert(&tag("X"), ListenerPriority::High, entry(&a));
        registry.insert(&tag("Y"), ListenerPriority::Low, entry(&a));
        registry.insert(&tag("Y"), ListenerPriority::Low, entry(&b));

        let a_ref = a.downgrade();
        let owned = registry.handles_where(|e| e.owner == a_ref);
        assert_eq!(owned.len(), 2);
        assert_eq!(registry.total_listener_count(), 3);
    }
}
