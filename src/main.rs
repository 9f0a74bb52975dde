// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! ServoLink demo session.
//!
//! Runs one fast control thread against one slow supervisor loop with a toy
//! control law, then shuts the session down cooperatively and reports the
//! channel counters. Pass a TOML config path to override the default
//! periods and ring capacity.

use servolink::driver::{self, FastThread};
use servolink::{Frame, Link, LinkConfig};
use std::path::Path;
use tracing::{debug, info};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Slow cycles to run before requesting shutdown.
const DEMO_CYCLES: u64 = 20;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::from_default_env().add_directive("servolink=debug".parse().unwrap()))
        .init();

    info!("Starting ServoLink demo");

    let config = match std::env::args().nth(1) {
        Some(path) => LinkConfig::load(Path::new(&path))?,
        None => LinkConfig::default(),
    };
    info!(
        "Session config: fast tick {} ms, slow tick {} ms, ring capacity {}",
        config.fast_period_ms, config.slow_period_ms, config.ring_capacity
    );

    let (fast, mut slow) = Link::split(config.ring_capacity, Frame::idle());

    // Toy control law: track the commanded setpoints with a first-order lag.
    let mut state = [0.0f32; servolink::FRAME_SLOTS];
    let fast_thread = FastThread::spawn(fast, config.fast_period(), move |command| {
        let mut out = *command;
        for (current, target) in state.iter_mut().zip(command.slots) {
            *current += 0.2 * (target - *current);
        }
        out.slots = state;
        out
    })?;

    let slow_stats = driver::run_slow_loop(
        &mut slow,
        config.slow_period(),
        DEMO_CYCLES,
        |cycle| {
            // Step the setpoint once per cycle; the fast side chases it.
            let mut cmd = Frame::idle();
            cmd.slots[0] = cycle as f32;
            cmd
        },
        |frame| debug!("feedback: slot0 = {:.3}", frame.slots[0]),
    );

    let fast_stats = driver::shutdown(&mut slow, fast_thread);

    info!(
        "Session done: {} slow cycles received {} frames; fast ran {} ticks ({} pushed, {} dropped)",
        slow_stats.cycles, slow_stats.received, fast_stats.ticks, fast_stats.pushed,
        fast_stats.dropped
    );

    Ok(())
}
