// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Periodic loop drivers for the two sides of a link.
//!
//! The fast side runs on its own thread ([`FastThread`]) at a short fixed
//! period; the slow side runs wherever the caller wants
//! ([`run_slow_loop`]) at a longer fixed period. Both sleep to absolute
//! deadlines so the schedule does not drift, and both touch the link only
//! through the wait-free channel operations.
//!
//! Shutdown is cooperative: the slow side publishes a command with the
//! keep-running flag cleared, the fast loop observes it within one tick and
//! exits, and the slow side joins the thread before dropping the link. That
//! one-tick poll interval is the cancellation latency bound.

use crate::link::{FastEndpoint, SlowEndpoint};
use crate::realtime::Frame;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};
use thiserror::Error;
use tracing::{debug, error};

#[derive(Debug, Error)]
pub enum DriverError {
    #[error("failed to spawn fast thread: {0}")]
    Spawn(#[from] std::io::Error),
}

/// Fixed-period sleeper with absolute deadlines.
///
/// Each wait targets `start + n * period` rather than "now + period", so
/// jitter in one tick does not accumulate into the next. An overrun tick
/// simply doesn't sleep; the schedule stays anchored.
pub struct Ticker {
    period: Duration,
    deadline: Instant,
}

impl Ticker {
    /// Create a ticker whose first deadline is one period from now.
    pub fn new(period: Duration) -> Self {
        Self {
            period,
            deadline: Instant::now() + period,
        }
    }

    /// Sleep until the next absolute deadline, then advance it.
    pub fn wait(&mut self) {
        if let Some(remaining) = self.deadline.checked_duration_since(Instant::now()) {
            thread::sleep(remaining);
        }
        self.deadline += self.period;
    }
}

/// Counters reported by the fast loop when it stops.
#[derive(Debug, Clone, Copy, Default)]
pub struct FastStats {
    /// Ticks that ran the control step (the stop tick is not counted).
    pub ticks: u64,
    /// Results accepted by the ring.
    pub pushed: u64,
    /// Results refused because the ring was full.
    pub dropped: u64,
}

/// Counters reported by the slow loop.
#[derive(Debug, Clone, Copy, Default)]
pub struct SlowStats {
    /// Cycles completed.
    pub cycles: u64,
    /// Results drained from the ring.
    pub received: u64,
}

/// Handle to the fast control thread.
///
/// The thread only exits when it observes a command with the keep-running
/// flag cleared, so publish a stop command (see [`shutdown`]) before joining;
/// joining without one blocks forever.
pub struct FastThread {
    handle: Option<JoinHandle<FastStats>>,
}

impl FastThread {
    /// Spawn the fast loop on a named thread.
    ///
    /// `step` is the control logic: it receives the current command each
    /// tick and returns the result frame to offer to the slow side.
    pub fn spawn<F>(
        endpoint: FastEndpoint,
        period: Duration,
        step: F,
    ) -> Result<Self, DriverError>
    where
        F: FnMut(&Frame) -> Frame + Send + 'static,
    {
        let handle = thread::Builder::new()
            .name("servolink-fast".to_string())
            .spawn(move || run_fast_loop(endpoint, period, step))?;

        Ok(Self {
            handle: Some(handle),
        })
    }

    /// Wait for the fast loop to reach its stopped state and return its
    /// counters.
    pub fn join(mut self) -> FastStats {
        match self.handle.take() {
            Some(handle) => match handle.join() {
                Ok(stats) => stats,
                Err(_) => {
                    error!("fast thread panicked");
                    FastStats::default()
                }
            },
            None => FastStats::default(),
        }
    }
}

impl Drop for FastThread {
    fn drop(&mut self) {
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

/// Fast loop body: one command read, one control step, one push per tick.
fn run_fast_loop<F>(mut endpoint: FastEndpoint, period: Duration, mut step: F) -> FastStats
where
    F: FnMut(&Frame) -> Frame,
{
    debug!("fast loop running");
    let mut ticker = Ticker::new(period);
    let mut stats = FastStats::default();

    loop {
        let command = endpoint.latest_command();
        if !command.keep_running {
            break;
        }

        let result = step(&command);
        stats.ticks += 1;
        if endpoint.try_push_result(result) {
            stats.pushed += 1;
        } else {
            // Ring full: the frame is dropped by contract. Counted here,
            // logged once at exit - no syscalls on the tick path.
            stats.dropped += 1;
        }

        ticker.wait();
    }

    debug!(
        ticks = stats.ticks,
        pushed = stats.pushed,
        dropped = stats.dropped,
        "fast loop stopped"
    );
    stats
}

/// Run the slow supervisor loop for a fixed number of cycles.
///
/// Each cycle publishes the command produced by `command(cycle)`, then
/// drains pending results into `sink` (at most one full ring per cycle, so
/// a fast producer can never pin the loop) and sleeps to the next absolute
/// deadline.
pub fn run_slow_loop<C, S>(
    endpoint: &mut SlowEndpoint,
    period: Duration,
    cycles: u64,
    mut command: C,
    mut sink: S,
) -> SlowStats
where
    C: FnMut(u64) -> Frame,
    S: FnMut(Frame),
{
    let mut ticker = Ticker::new(period);
    let mut stats = SlowStats::default();

    for cycle in 0..cycles {
        endpoint.publish_command(command(cycle));

        for _ in 0..endpoint.ring_capacity() {
            match endpoint.try_pop_result() {
                Some(frame) => {
                    sink(frame);
                    stats.received += 1;
                }
                None => break,
            }
        }

        stats.cycles += 1;
        ticker.wait();
    }

    stats
}

/// End the session: request a cooperative stop and wait for the fast thread
/// to reach its terminal state.
///
/// Must complete before the endpoints are dropped; the join is what makes
/// tearing down the shared structures safe.
pub fn shutdown(endpoint: &mut SlowEndpoint, fast: FastThread) -> FastStats {
    endpoint.publish_command(Frame::stop());
    fast.join()
}
