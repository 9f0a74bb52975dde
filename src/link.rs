// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Bidirectional pairing of the two channel primitives.
//!
//! A [`Link`] bundles one latest-value mailbox (commands, slow → fast) and
//! one bounded FIFO ring (results, fast → slow) and hands each thread an
//! endpoint that can only perform its role's operations:
//!
//! - [`FastEndpoint`] reads commands and produces results.
//! - [`SlowEndpoint`] publishes commands and consumes results.
//!
//! The endpoints are `Send` but not `Clone`, so the single-writer
//! single-reader discipline both primitives depend on holds by construction:
//! a third thread cannot acquire either role.

use crate::realtime::{
    Frame, Mailbox, MailboxReader, MailboxWriter, RingBuffer, RingBufferReader, RingBufferWriter,
};

/// Constructor for a fast/slow endpoint pair.
pub struct Link;

impl Link {
    /// Build a link and split it into its two endpoints.
    ///
    /// `ring_capacity` bounds the fast → slow result stream (rounded up to a
    /// power of two); `initial_command` is what the fast side reads before
    /// the slow side's first publish.
    ///
    /// # Panics
    /// Panics if `ring_capacity` is 0.
    pub fn split(ring_capacity: usize, initial_command: Frame) -> (FastEndpoint, SlowEndpoint) {
        let (command_writer, command_reader) = Mailbox::new(initial_command).split();
        let (result_writer, result_reader) = RingBuffer::new(ring_capacity).split();

        (
            FastEndpoint {
                commands: command_reader,
                results: result_writer,
            },
            SlowEndpoint {
                commands: command_writer,
                results: result_reader,
            },
        )
    }
}

/// The fast thread's side of the link: command consumer, result producer.
pub struct FastEndpoint {
    commands: MailboxReader<Frame>,
    results: RingBufferWriter<Frame>,
}

impl FastEndpoint {
    /// Read the most recent command.
    ///
    /// Coalescing: commands published since the last read are skipped, only
    /// the newest is returned.
    pub fn latest_command(&mut self) -> Frame {
        self.commands.latest()
    }

    /// Offer a result to the slow side.
    ///
    /// Returns `false` if the ring is full; the frame is dropped in that
    /// case.
    pub fn try_push_result(&mut self, frame: Frame) -> bool {
        self.results.try_push(frame)
    }

    /// Capacity of the result ring.
    pub fn ring_capacity(&self) -> usize {
        self.results.capacity()
    }
}

/// The slow thread's side of the link: command producer, result consumer.
pub struct SlowEndpoint {
    commands: MailboxWriter<Frame>,
    results: RingBufferReader<Frame>,
}

impl SlowEndpoint {
    /// Publish a command, replacing any previously published one.
    pub fn publish_command(&mut self, frame: Frame) {
        self.commands.publish(frame)
    }

    /// Take the oldest pending result, if any.
    pub fn try_pop_result(&mut self) -> Option<Frame> {
        self.results.try_pop()
    }

    /// Number of results currently queued.
    pub fn pending_results(&self) -> usize {
        self.results.available()
    }

    /// Capacity of the result ring.
    pub fn ring_capacity(&self) -> usize {
        self.results.capacity()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_initial_command_visible() {
        let mut initial = Frame::idle();
        initial.slots[0] = 4.2;

        let (mut fast, _slow) = Link::split(8, initial);
        assert_eq!(fast.latest_command(), initial);
    }

    /// Commands coalesce to the newest; results keep their order.
    #[test]
    fn test_coalesced_commands_ordered_results() {
        let (mut fast, mut slow) = Link::split(8, Frame::idle());

        // Four commands with no read in between: only the last survives.
        for i in 0..4 {
            let mut cmd = Frame::idle();
            cmd.slots[0] = i as f32;
            slow.publish_command(cmd);
        }
        let seen = fast.latest_command();
        assert_eq!(seen.slots[0], 3.0);

        // Four results pushed in order come back in the same order.
        for i in 0..4 {
            let mut result = Frame::idle();
            result.slots[0] = 10.0 + i as f32;
            assert!(fast.try_push_result(result));
        }

        assert_eq!(slow.pending_results(), 4);
        for i in 0..4 {
            let frame = slow.try_pop_result().expect("result missing");
            assert_eq!(frame.slots[0], 10.0 + i as f32);
        }
        assert_eq!(slow.try_pop_result(), None);
    }

    #[test]
    fn test_result_ring_bound() {
        let (mut fast, mut slow) = Link::split(4, Frame::idle());
        assert_eq!(fast.ring_capacity(), 4);

        for _ in 0..4 {
            assert!(fast.try_push_result(Frame::idle()));
        }
        assert!(!fast.try_push_result(Frame::idle()));

        assert!(slow.try_pop_result().is_some());
        assert!(fast.try_push_result(Frame::idle()));
    }
}
