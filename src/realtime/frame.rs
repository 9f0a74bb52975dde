// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Control frame exchanged between the fast and slow threads.
//!
//! A [`Frame`] is a pure value: eight scalar slots plus a keep-running flag.
//! It is the only payload that crosses the thread boundary, in both
//! directions (commands slow → fast, results fast → slow), and it must stay
//! trivially copyable: the channel primitives copy it byte-for-byte while
//! only an atomic index carries the synchronization.

/// Number of scalar slots in a frame.
pub const FRAME_SLOTS: usize = 8;

/// Fixed-layout value passed between the fast and slow threads.
///
/// The meaning of the individual slots is up to the control logic on either
/// side; the channel never interprets them. The `keep_running` flag is the
/// cooperative stop signal: the fast loop polls it once per tick and exits
/// when it is cleared.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Frame {
    /// Scalar payload (setpoints on the command path, measurements on the
    /// result path).
    pub slots: [f32; FRAME_SLOTS],
    /// Cleared to request cooperative shutdown of the fast loop.
    pub keep_running: bool,
}

impl Frame {
    /// Create a frame with the given slots and flag.
    pub const fn new(slots: [f32; FRAME_SLOTS], keep_running: bool) -> Self {
        Self { slots, keep_running }
    }

    /// A zeroed frame with the keep-running flag set.
    pub const fn idle() -> Self {
        Self::new([0.0; FRAME_SLOTS], true)
    }

    /// A frame requesting cooperative shutdown of the fast loop.
    pub const fn stop() -> Self {
        Self::new([0.0; FRAME_SLOTS], false)
    }
}

// The channel primitives require their element type to be `Copy`, which in
// Rust already means no drop glue and no custom clone behavior. These checks
// pin the concrete frame down as well: layout changes that would break the
// bit-for-bit copy contract fail the build, not the running system.
const fn assert_trivially_copyable<T: Copy>() {}
const _: () = assert_trivially_copyable::<Frame>();
const _: () = assert!(std::mem::size_of::<Frame>() == 36);
const _: () = assert!(std::mem::align_of::<Frame>() == 4);
