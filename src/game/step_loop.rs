//! Fixed-interval driver for a shared [`GridSimulation`]

use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use log::debug;
use tokio::task::{JoinError, JoinHandle};
use tokio::time::{MissedTickBehavior, interval};

use super::engine::GridSimulation;

/// Simulation shared between the step loop and input handling
pub type SharedSimulation = Arc<Mutex<GridSimulation>>;

pub fn share(sim: GridSimulation) -> SharedSimulation {
    Arc::new(Mutex::new(sim))
}

/// Lock the simulation, recovering from a poisoned mutex
///
/// Every engine operation leaves the board consistent before it can panic,
/// so the inner value is still usable.
pub fn lock(sim: &SharedSimulation) -> MutexGuard<'_, GridSimulation> {
    sim.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Background task calling [`GridSimulation::tick`] every `period`
///
/// The task ends by itself once the game is over or the board has been
/// rebuilt since it was spawned. Dropping the handle aborts it.
pub struct StepLoop {
    handle: JoinHandle<()>,
}

impl StepLoop {
    /// Start ticking `sim`. Must be called inside a tokio runtime.
    pub fn spawn(sim: SharedSimulation, period: Duration) -> Self {
        let generation = lock(&sim).generation();
        Self {
            handle: tokio::spawn(run(sim, period, generation)),
        }
    }

    /// Restart the game and start a fresh loop for it
    pub fn restart(sim: SharedSimulation, period: Duration) -> Self {
        lock(&sim).restart_game();
        Self::spawn(sim, period)
    }

    /// Wait for the loop to end
    pub async fn wait(&mut self) -> Result<(), JoinError> {
        (&mut self.handle).await
    }
}

impl Drop for StepLoop {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

async fn run(sim: SharedSimulation, period: Duration, generation: u64) {
    let mut timer = interval(period);
    timer.set_missed_tick_behavior(MissedTickBehavior::Delay);
    // The first tick completes immediately; the first step waits a full period
    timer.tick().await;

    loop {
        timer.tick().await;
        let mut sim = lock(&sim);
        // A restart may land before an abort of this task takes effect
        if sim.generation() != generation {
            break;
        }
        if !sim.tick() {
            break;
        }
    }

    debug!("Step loop finished");
}
