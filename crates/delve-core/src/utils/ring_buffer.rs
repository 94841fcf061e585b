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

/// A fixed-capacity circular buffer that overwrites its oldest element once full.
///
/// The capacity is chosen at runtime so it can come from configuration.
#[derive(Debug, Clone)]
pub struct RingBuffer<T> {
    data: Vec<T>,
    capacity: usize,
    /// Slot the next push writes to once the buffer is full.
    head: usize,
}

impl<T> RingBuffer<T> {
    /// Creates an empty buffer. A capacity of zero is bumped to one.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            data: Vec::with_capacity(capacity),
            capacity,
            head: 0,
        }
    }

    /// Pushes a new value, returning the evicted oldest value when full.
    pub fn push(&mut self, value: T) -> Option<T> {
        if self.data.len() < self.capacity {
            self.data.push(value);
            None
        } else {
            let evicted = std::mem::replace(&mut self.data[self.head], value);
            self.head = (self.head + 1) % self.capacity;
            Some(evicted)
        }
    }

    /// Returns the number of elements currently stored.
    #[inline]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Returns `true` if nothing has been pushed since creation or the last clear.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Returns the maximum number of stored elements.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Returns `true` once the next push will evict.
    #[inline]
    pub fn is_full(&self) -> bool {
        self.data.len() == self.capacity
    }

    /// Removes every element.
    pub fn clear(&mut self) {
        self.data.clear();
        self.head = 0;
    }

    /// Iterates over the values in chronological order (oldest to newest).
    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &T> {
        let (newer, older) = self.data.split_at(self.head);
        older.iter().chain(newer.iter())
    }

    /// Returns the most recently pushed value.
    pub fn latest(&self) -> Option<&T> {
        self.iter().next_back()
    }

    /// Iterates over at most `count` of the newest values, newest first.
    pub fn recent(&self, count: usize) -> impl Iterator<Item = &T> {
        self.iter().rev().take(count)
    }
}

impl RingBuffer<f64> {
    /// Arithmetic mean of the stored values, 0 when empty.
    pub fn average(&self) -> f64 {
        if self.is_empty() {
            return 0.0;
        }
        self.iter().sum::<f64>() / self.len() as f64
    }

    /// Population variance of the stored values, 0 with fewer than two values.
    pub fn variance(&self) -> f64 {
        if self.len() < 2 {
            return 0.0;
        }
        let avg = self.average();
        let sum_sq: f64 = self.iter().map(|v| (v - avg) * (v - avg)).sum();
        sum_sq / self.len() as f64
    }

    /// Smallest stored value, or `None` when empty.
    pub fn min(&self) -> Option<f64> {
        self.iter().copied().reduce(f64::min)
    }

    /// Largest stored value, or `None` when empty.
    pub fn max(&self) -> Option<f64> {
        self.iter().copied().reduce(f64::max)
    }

    /// Copies the stored values and sorts them ascending.
    pub fn sorted(&self) -> Vec<f64> {
        let mut values: Vec<f64> = self.iter().copied().collect();
        values.sort_by(|a, b| a.total_cmp(b));
        values
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ring_buffer_push_and_iter() {
        let mut rb = RingBuffer::new(3);
        assert_eq!(rb.push(1.0), None);
        rb.push(2.0);
        rb.push(3.0);
        assert_eq!(rb.push(4.0), Some(1.0)); // Overwrites 1.0

        let values: Vec<f64> = rb.iter().copied().collect();
        assert_eq!(values, vec![2.0, 3.0, 4.0]);
        assert_eq!(rb.len(), 3);
        assert!(rb.is_full());
        assert_eq!(rb.latest(), Some(&4.0));
    }

    #[test]
    fn test_ring_buffer_recent_is_newest_first() {
        let mut rb = RingBuffer::new(4);
        for v in 1..=6 {
            rb.push(v);
        }
        let recent: Vec<i32> = rb.recent(3).copied().collect();
        assert_eq!(recent, vec![6, 5, 4]);
        let all: Vec<i32> = rb.recent(10).copied().collect();
        assert_eq!(all, vec![6, 5, 4, 3]);
    }

    #[test]
    fn test_ring_buffer_statistics() {
        let mut rb = RingBuffer::new(4);
        rb.push(5.0);
        rb.push(15.0);
        rb.push(5.0);
        rb.push(15.0);
        assert_eq!(rb.average(), 10.0);
        // avg = 10.0, variance = ((5-10)^2 + (15-10)^2 + (5-10)^2 + (15-10)^2) / 4 = 25.0
        assert!((rb.variance() - 25.0).abs() < 1e-9);
        assert_eq!(rb.min(), Some(5.0));
        assert_eq!(rb.max(), Some(15.0));
        assert_eq!(rb.sorted(), vec![5.0, 5.0, 15.0, 15.0]);
    }

    #[test]
    fn test_ring_buffer_empty_and_clear() {
        let mut rb = RingBuffer::<f64>::new(0);
        assert_eq!(rb.capacity(), 1);
        assert_eq!(rb.average(), 0.0);
        assert_eq!(rb.variance(), 0.0);
        assert_eq!(rb.min(), None);

        rb.push(1.0);
        rb.push(2.0);
        rb.clear();
        assert!(rb.is_empty());
        rb.push(3.0);
        assert_eq!(rb.iter().copied().collect::<Vec<_>>(), vec![3.0]);
    }
}
