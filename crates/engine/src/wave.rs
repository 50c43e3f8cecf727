//! Async wave runner
//!
//! Bridges the synchronous frame loop with tokio timers. The runner spawns
//! the planned enemies one interval apart, then polls until the roster is
//! clear. The frame loop keeps moving enemies and firing turrets through the
//! same shared roster; neither side holds the lock across an await.
//!
//! There is no cancellation token: clearing the roster drops the pending
//! spawns and the runner finishes on its next poll.

use std::sync::Arc;

use tokio::sync::Mutex;
use tokio::time::{sleep, Instant};
use tracing::info;

use crate::enemy::EnemyRoster;
use crate::turn::WavePlan;

/// Roster shared between the wave runner and the frame loop
pub type SharedRoster = Arc<Mutex<EnemyRoster>>;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WaveReport {
    pub turn: u32,
    pub spawned: u32,
    /// Polls needed after the last spawn before the roster was clear
    pub polls: u32,
}

pub async fn run_wave(plan: WavePlan, roster: SharedRoster) -> WaveReport {
    let started = Instant::now();
    roster.lock().await.set_pending(plan.count);

    let mut spawned = 0;
    for i in 0..plan.count {
        if i > 0 {
            sleep(plan.spawn_interval).await;
        }
        let mut r = roster.lock().await;
        // A cleared roster (base destroyed) ends the wave early
        if r.pending() == 0 {
            break;
        }
        r.spawn(plan.enemy);
        spawned += 1;
    }

    let mut polls = 0;
    while !roster.lock().await.is_clear() {
        sleep(plan.poll_interval).await;
        polls += 1;
    }

    info!(
        turn = plan.turn,
        spawned,
        elapsed_ms = started.elapsed().as_millis() as u64,
        "wave finished"
    );
    WaveReport {
        turn: plan.turn,
        spawned,
        polls,
    }
}
