// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Lock-free bidirectional channel between two fixed-rate control threads.
//!
//! A fast thread (control loop, e.g. every 20 ms) and a slow thread
//! (supervisor, e.g. every 100 ms) exchange [`Frame`] values through two
//! single-writer single-reader primitives:
//!
//! - a latest-value [mailbox](realtime::mailbox) for commands (slow → fast),
//!   where only the newest command matters and intermediate ones coalesce;
//! - a bounded FIFO [ring](realtime::ringbuf) for results (fast → slow),
//!   where order matters and a full ring refuses new items instead of
//!   blocking.
//!
//! All cross-thread visibility rests on atomic loads and stores with
//! explicit acquire/release ordering; there are no locks and no allocation
//! after construction. [`Link`] fixes the two thread roles at the type
//! level, and [`driver`] supplies the periodic loops and the cooperative
//! stop protocol on top.

pub mod config;
pub mod driver;
pub mod link;
pub mod realtime;

pub use config::LinkConfig;
pub use link::{FastEndpoint, Link, SlowEndpoint};
pub use realtime::{Frame, FRAME_SLOTS};
