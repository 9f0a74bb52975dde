// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Lock-free single-writer single-reader latest-value mailbox.
//!
//! Used for passing commands from the slow supervisor thread to the fast
//! control thread. Intermediate values are intentionally coalesced: the
//! reader only ever sees the most recently published value, never a queue of
//! stale ones.
//!
//! # Design
//!
//! The payload is too large to store atomically as a whole, so the mailbox
//! keeps two slots and one atomic index naming the published slot. The
//! writer copies into the *other* slot (dead memory nobody is reading) and
//! then release-stores the new index; the reader acquire-loads the index and
//! copies the slot it names. The small, hardware-atomic index carries all the
//! synchronization.
//!
//! # Timing precondition
//!
//! The two-slot scheme reuses a slot two publishes after it was last
//! published. A reader still mid-copy of that slot at that point would race
//! the writer. With one reader doing bounded per-tick work this holds
//! whenever a [`latest`](MailboxReader::latest) call completes faster than
//! two writer periods elapse, comfortably true for the millisecond-scale
//! periods this crate targets. This is a precondition on the surrounding
//! system, not something the mailbox can detect at runtime.
//!
//! # Example
//!
//! ```ignore
//! use servolink::realtime::Mailbox;
//!
//! let (mut writer, mut reader) = Mailbox::new(Frame::idle()).split();
//!
//! // Slow thread publishes each cycle
//! writer.publish(command);
//!
//! // Fast thread reads once per tick
//! let current = reader.latest();
//! ```

use std::cell::UnsafeCell;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// A lock-free single-writer single-reader latest-value mailbox.
///
/// Publishing never fails and never blocks; reading always returns a
/// complete, untorn value (possibly one already seen before).
pub struct Mailbox<T> {
    /// Double buffer: one published slot, one private staging slot.
    slots: [UnsafeCell<T>; 2],
    /// Index (0 or 1) of the currently published slot.
    latest: AtomicUsize,
}

// SAFETY: The mailbox is designed for single-writer single-reader access.
// Only the writer stores `latest` and writes the staging slot; the reader
// only copies the published slot. `T: Copy` guarantees the copies have no
// side effects.
unsafe impl<T: Copy + Send> Send for Mailbox<T> {}
unsafe impl<T: Copy + Send> Sync for Mailbox<T> {}

impl<T: Copy> Mailbox<T> {
    /// Create a mailbox seeded with an initial value.
    ///
    /// Both slots hold the initial value, so a read before the first publish
    /// returns it rather than uninitialized storage.
    pub fn new(initial: T) -> Self {
        Self {
            slots: [UnsafeCell::new(initial), UnsafeCell::new(initial)],
            latest: AtomicUsize::new(0),
        }
    }

    /// Split into writer and reader handles.
    pub fn split(self) -> (MailboxWriter<T>, MailboxReader<T>) {
        let shared = Arc::new(self);
        (
            MailboxWriter {
                inner: Arc::clone(&shared),
            },
            MailboxReader { inner: shared },
        )
    }
}

/// Writer handle for the mailbox.
///
/// Only one writer exists per mailbox; the handle is `Send` but not `Clone`.
pub struct MailboxWriter<T> {
    inner: Arc<Mailbox<T>>,
}

impl<T: Copy> MailboxWriter<T> {
    /// Publish a new value, replacing whatever was published before.
    ///
    /// Never blocks, never fails, O(1).
    pub fn publish(&mut self, value: T) {
        // Relaxed is enough here: only this thread ever stores `latest`, so
        // this load just recovers our own previous store. It synchronizes
        // nothing.
        let live = self.inner.latest.load(Ordering::Relaxed);
        let staging = 1 - live;

        // SAFETY: `staging` is not the published slot, so the reader is not
        // copying it now; reuse of a slot from an *earlier* publish is
        // covered by the timing precondition in the module docs.
        unsafe {
            *self.inner.slots[staging].get() = value;
        }

        // Release pairs with the reader's acquire load: the slot write above
        // becomes visible before the new index does, so the reader can never
        // observe a half-written slot.
        self.inner.latest.store(staging, Ordering::Release);
    }
}

/// Reader handle for the mailbox.
///
/// Only one reader exists per mailbox; the handle is `Send` but not `Clone`.
pub struct MailboxReader<T> {
    inner: Arc<Mailbox<T>>,
}

impl<T: Copy> MailboxReader<T> {
    /// Return a copy of the most recently published value.
    ///
    /// May return the same value as the previous call if nothing new was
    /// published; never returns a mixture of two publishes. Never blocks,
    /// never fails, O(1).
    pub fn latest(&mut self) -> T {
        // Acquire pairs with the writer's release store of the index.
        let live = self.inner.latest.load(Ordering::Acquire);

        // SAFETY: the writer never writes the slot named by `latest`; see
        // the module docs for the slot-reuse timing bound.
        unsafe { *self.inner.slots[live].get() }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn test_initial_value() {
        let (_writer, mut reader) = Mailbox::new(7u64).split();
        assert_eq!(reader.latest(), 7);
        // Reading again without a publish repeats the value.
        assert_eq!(reader.latest(), 7);
    }

    #[test]
    fn test_publish_then_read() {
        let (mut writer, mut reader) = Mailbox::new(0u64).split();

        writer.publish(1);
        assert_eq!(reader.latest(), 1);

        writer.publish(2);
        writer.publish(3);
        assert_eq!(reader.latest(), 3);
    }

    #[test]
    fn test_coalescing() {
        let (mut writer, mut reader) = Mailbox::new(0u64).split();

        // Two publishes with no intervening read: only the newest is
        // observable once the second publish has completed.
        writer.publish(10);
        writer.publish(20);
        assert_eq!(reader.latest(), 20);
        assert_eq!(reader.latest(), 20);
    }

    #[test]
    fn test_handles_cross_threads() {
        let (mut writer, mut reader) = Mailbox::new(0u32).split();

        let t = thread::spawn(move || {
            writer.publish(42);
            writer
        });
        let _writer = t.join().unwrap();

        assert_eq!(reader.latest(), 42);
    }

    /// Tearing check: both halves of the value always encode the same
    /// sequence number, whatever the interleaving.
    #[test]
    fn test_no_torn_reads() {
        #[derive(Clone, Copy)]
        struct Pair {
            a: u64,
            b: u64,
        }

        const ROUNDS: u64 = 20_000;

        let (mut writer, mut reader) = Mailbox::new(Pair { a: 0, b: 0 }).split();

        let t = thread::spawn(move || {
            for i in 1..=ROUNDS {
                writer.publish(Pair { a: i, b: i });
                // Keep a gap between publishes so the reader's copy stays
                // within the two-period bound the mailbox documents.
                for _ in 0..64 {
                    std::hint::spin_loop();
                }
            }
        });

        loop {
            let p = reader.latest();
            assert_eq!(p.a, p.b, "torn read: {} vs {}", p.a, p.b);
            if p.a == ROUNDS {
                break;
            }
        }

        t.join().unwrap();
    }
}
