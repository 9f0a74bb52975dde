// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Real-time safe channel primitives.
//!
//! This module provides the lock-free data structures the fast control
//! thread and the slow supervisor thread communicate through.
//!
//! # Real-Time Safety
//!
//! The fast thread has strict requirements:
//! - No memory allocation
//! - No locks (mutexes, RwLocks)
//! - No system calls (file I/O, network)
//! - Bounded execution time
//!
//! Every channel operation in this module meets them: after construction,
//! [`publish`](mailbox::MailboxWriter::publish),
//! [`latest`](mailbox::MailboxReader::latest),
//! [`try_push`](ringbuf::RingBufferWriter::try_push) and
//! [`try_pop`](ringbuf::RingBufferReader::try_pop) are wait-free and
//! allocation-free regardless of what the other thread is doing.
//!
//! Both structures restrict payloads to `Copy` types; that bound is the
//! compile-time form of the trivially-copyable contract the atomic-index
//! tricks depend on.

pub mod frame;
pub mod mailbox;
pub mod ringbuf;

pub use frame::{Frame, FRAME_SLOTS};
pub use mailbox::{Mailbox, MailboxReader, MailboxWriter};
pub use ringbuf::{RingBuffer, RingBufferReader, RingBufferWriter};
