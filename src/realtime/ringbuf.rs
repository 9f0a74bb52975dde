// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Lock-free single-producer single-consumer bounded FIFO ring buffer.
//!
//! Used for passing result frames from the fast control thread to the slow
//! supervisor thread without blocking. Every accepted item is delivered in
//! order; when the ring is full a push is *refused* (the producer decides
//! whether to count or ignore the loss), it never overwrites queued items
//! and never blocks.
//!
//! # Example
//!
//! ```ignore
//! use servolink::realtime::RingBuffer;
//!
//! let (mut writer, mut reader) = RingBuffer::<f32>::new(16).split();
//!
//! // Fast thread pushes one result per tick
//! writer.try_push(0.8);
//!
//! // Slow thread drains whatever accumulated since its last cycle
//! while let Some(value) = reader.try_pop() {
//!     process(value);
//! }
//! ```

use crossbeam_utils::CachePadded;
use std::cell::UnsafeCell;
use std::mem::MaybeUninit;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// A lock-free single-producer single-consumer bounded FIFO.
///
/// The two positions are monotonically increasing counters; the physical
/// slot for a logical position is `pos & mask` (capacity is a power of two).
/// Each counter is stored by exactly one thread and only loaded by the
/// other, which is what lets the relaxed/acquire/release discipline below
/// stand in for any lock.
pub struct RingBuffer<T> {
    /// The slot storage. Slots in `[read_pos, write_pos)` are initialized.
    buffer: Box<[UnsafeCell<MaybeUninit<T>>]>,
    /// Write position (only stored by the writer). Padded to its own cache
    /// line so producer and consumer don't false-share.
    write_pos: CachePadded<AtomicUsize>,
    /// Read position (only stored by the reader).
    read_pos: CachePadded<AtomicUsize>,
    /// Capacity (power of 2).
    capacity: usize,
    /// Mask for efficient modulo operation.
    mask: usize,
}

// SAFETY: The ring buffer is designed for SPSC access.
// Only the writer stores write_pos and writes slots; only the reader stores
// read_pos and reads slots; the position counters partition the slots
// between them. `T: Copy` guarantees slot copies have no side effects.
unsafe impl<T: Copy + Send> Send for RingBuffer<T> {}
unsafe impl<T: Copy + Send> Sync for RingBuffer<T> {}

impl<T: Copy> RingBuffer<T> {
    /// Create a new ring buffer with the given capacity.
    ///
    /// The actual capacity is rounded up to the next power of 2. All
    /// allocation happens here; the channel operations are allocation-free.
    ///
    /// # Panics
    /// Panics if `capacity` is 0.
    pub fn new(capacity: usize) -> Self {
        assert!(capacity > 0, "ring capacity must be non-zero");

        let capacity = capacity.next_power_of_two();
        let mask = capacity - 1;

        let mut buffer = Vec::with_capacity(capacity);
        for _ in 0..capacity {
            buffer.push(UnsafeCell::new(MaybeUninit::uninit()));
        }

        Self {
            buffer: buffer.into_boxed_slice(),
            write_pos: CachePadded::new(AtomicUsize::new(0)),
            read_pos: CachePadded::new(AtomicUsize::new(0)),
            capacity,
            mask,
        }
    }

    /// Get the capacity of the buffer.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Split into writer and reader handles.
    pub fn split(self) -> (RingBufferWriter<T>, RingBufferReader<T>) {
        let shared = Arc::new(self);
        (
            RingBufferWriter {
                inner: Arc::clone(&shared),
            },
            RingBufferReader { inner: shared },
        )
    }

    /// Get the number of items currently queued.
    fn available(&self) -> usize {
        let write = self.write_pos.load(Ordering::Acquire);
        let read = self.read_pos.load(Ordering::Acquire);
        write.wrapping_sub(read)
    }
}

/// Writer handle for the ring buffer.
///
/// Only one writer exists per buffer; the handle is `Send` but not `Clone`.
pub struct RingBufferWriter<T> {
    inner: Arc<RingBuffer<T>>,
}

impl<T: Copy> RingBufferWriter<T> {
    /// Push an item to the buffer.
    ///
    /// Returns `true` if the item was accepted, `false` if the buffer is
    /// full. A refused item is dropped; nothing is overwritten and nothing
    /// is buffered elsewhere. Never blocks, O(1), allocation-free.
    pub fn try_push(&mut self, item: T) -> bool {
        // Relaxed: only this thread stores write_pos, the load just recovers
        // our own previous store.
        let write_pos = self.inner.write_pos.load(Ordering::Relaxed);
        // Acquire: observe the reader's latest progress, which decides how
        // many slots are free.
        let read_pos = self.inner.read_pos.load(Ordering::Acquire);

        if write_pos.wrapping_sub(read_pos) >= self.inner.capacity {
            return false;
        }

        let idx = write_pos & self.inner.mask;
        // SAFETY: the slot at write_pos is outside [read_pos, write_pos),
        // so the reader is not touching it, and we are the only writer.
        unsafe {
            (*self.inner.buffer[idx].get()).write(item);
        }

        // Release publishes the slot write above together with the new
        // position; the reader's acquire load of write_pos sees both or
        // neither.
        self.inner
            .write_pos
            .store(write_pos.wrapping_add(1), Ordering::Release);

        true
    }

    /// Get the number of items currently queued.
    pub fn available(&self) -> usize {
        self.inner.available()
    }

    /// Check if the buffer is full.
    pub fn is_full(&self) -> bool {
        self.inner.available() >= self.inner.capacity
    }

    /// Get the capacity of the buffer.
    pub fn capacity(&self) -> usize {
        self.inner.capacity()
    }
}

/// Reader handle for the ring buffer.
///
/// Only one reader exists per buffer; the handle is `Send` but not `Clone`.
pub struct RingBufferReader<T> {
    inner: Arc<RingBuffer<T>>,
}

impl<T: Copy> RingBufferReader<T> {
    /// Pop the oldest item from the buffer.
    ///
    /// Returns `None` if the buffer is empty. Never blocks, O(1),
    /// allocation-free.
    pub fn try_pop(&mut self) -> Option<T> {
        // Relaxed: only this thread stores read_pos.
        let read_pos = self.inner.read_pos.load(Ordering::Relaxed);
        // Acquire: pairs with the writer's release store, making the slot
        // write visible before the position that covers it.
        let write_pos = self.inner.write_pos.load(Ordering::Acquire);

        if read_pos == write_pos {
            return None;
        }

        let idx = read_pos & self.inner.mask;
        // SAFETY: read_pos < write_pos, so this slot was fully written and
        // published by the writer; `T: Copy`, so reading it out leaves the
        // slot bytes valid and nothing needs dropping.
        let item = unsafe { (*self.inner.buffer[idx].get()).assume_init_read() };

        // Release: the writer's acquire load of read_pos must not see the
        // slot as free before our copy out of it is done.
        self.inner
            .read_pos
            .store(read_pos.wrapping_add(1), Ordering::Release);

        Some(item)
    }

    /// Get the number of items currently queued.
    pub fn available(&self) -> usize {
        self.inner.available()
    }

    /// Check if the buffer is empty.
    pub fn is_empty(&self) -> bool {
        self.inner.available() == 0
    }

    /// Get the capacity of the buffer.
    pub fn capacity(&self) -> usize {
        self.inner.capacity()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn test_basic_push_pop() {
        let (mut writer, mut reader) = RingBuffer::<i32>::new(4).split();

        assert!(reader.is_empty());

        assert!(writer.try_push(1));
        assert!(writer.try_push(2));
        assert!(writer.try_push(3));

        assert_eq!(reader.available(), 3);
        assert_eq!(reader.try_pop(), Some(1));
        assert_eq!(reader.try_pop(), Some(2));
        assert_eq!(reader.try_pop(), Some(3));
        assert_eq!(reader.try_pop(), None);
    }

    #[test]
    fn test_full_refuses_push() {
        // Capacity 8, fill it, the 9th push must be refused; one pop frees
        // exactly one slot.
        let (mut writer, mut reader) = RingBuffer::<u64>::new(8).split();

        for i in 0..8 {
            assert!(writer.try_push(i), "push {} should succeed", i);
        }
        assert!(writer.is_full());
        assert!(!writer.try_push(99));

        // The refused item was dropped, not queued: contents are untouched.
        assert_eq!(reader.try_pop(), Some(0));
        assert!(writer.try_push(8));

        for i in 1..=8 {
            assert_eq!(reader.try_pop(), Some(i));
        }
        assert_eq!(reader.try_pop(), None);
    }

    #[test]
    fn test_wraparound() {
        let (mut writer, mut reader) = RingBuffer::<u64>::new(4).split();

        // Fill and drain repeatedly so the positions lap the storage.
        for round in 0..10 {
            for i in 0..4 {
                assert!(writer.try_push(round * 4 + i));
            }
            for i in 0..4 {
                assert_eq!(reader.try_pop(), Some(round * 4 + i));
            }
        }
    }

    #[test]
    fn test_capacity_rounds_up() {
        let (writer, _reader) = RingBuffer::<u8>::new(5).split();
        assert_eq!(writer.capacity(), 8);
    }

    #[test]
    #[should_panic(expected = "ring capacity must be non-zero")]
    fn test_zero_capacity_panics() {
        let _ = RingBuffer::<u8>::new(0);
    }

    /// Order preservation under real concurrency: everything the consumer
    /// sees is the producer's sequence, intact and in order.
    #[test]
    fn test_spsc_order_across_threads() {
        const COUNT: u64 = 10_000;

        let (mut writer, mut reader) = RingBuffer::<u64>::new(8).split();

        let producer = thread::spawn(move || {
            for i in 0..COUNT {
                while !writer.try_push(i) {
                    thread::yield_now();
                }
            }
        });

        let mut received = Vec::with_capacity(COUNT as usize);
        while received.len() < COUNT as usize {
            match reader.try_pop() {
                Some(v) => received.push(v),
                None => thread::yield_now(),
            }
        }

        producer.join().unwrap();

        let expected: Vec<u64> = (0..COUNT).collect();
        assert_eq!(received, expected);
        assert_eq!(reader.try_pop(), None);
    }
}
