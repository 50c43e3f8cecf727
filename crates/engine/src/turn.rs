//! Turn director - player phase, enemy phase, win and loss
//!
//! ```text
//! start_turn ──► Player ──end_player_phase──► Enemy ──finish_enemy_phase──► start_turn
//!                  │                            │
//!                  └───────── base destroyed ───┴──► Lost
//! start_turn with turn > max_turns ──► Won
//! ```

use std::time::Duration;

use serde::Serialize;
use tracing::info;

use crate::config::{TurnConfig, WaveConfig};
use crate::enemy::EnemyStats;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Player,
    Enemy,
    Won,
    Lost,
}

impl Phase {
    pub fn is_over(self) -> bool {
        matches!(self, Phase::Won | Phase::Lost)
    }

    pub fn label(self) -> &'static str {
        match self {
            Phase::Player => "BUILD",
            Phase::Enemy => "WAVE",
            Phase::Won => "VICTORY",
            Phase::Lost => "DEFEAT",
        }
    }
}

/// Last notable transition, for UI and economy collaborators
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnEvent {
    PlayerPhaseStarted { turn: u32 },
    EnemyPhaseStarted { turn: u32 },
    Won { reward: u32 },
    Lost { turn: u32 },
}

/// Enemies for one turn
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WavePlan {
    pub turn: u32,
    pub count: u32,
    pub enemy: EnemyStats,
    pub spawn_interval: Duration,
    pub poll_interval: Duration,
}

impl WavePlan {
    pub fn for_turn(wave: &WaveConfig, turn: u32) -> Self {
        let steps = turn.saturating_sub(1);
        let k = steps as f32;
        Self {
            turn,
            count: (wave.base_count + steps * wave.count_per_turn).max(1),
            enemy: EnemyStats {
                health: wave.base_health + k * wave.health_per_turn,
                damage: wave.base_damage + k * wave.damage_per_turn,
                speed: wave.base_speed + k * wave.speed_per_turn,
            },
            spawn_interval: wave.spawn_interval(),
            poll_interval: wave.poll_interval(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct TurnDirector {
    turn: u32,
    phase: Phase,
    turn_config: TurnConfig,
    wave_config: WaveConfig,
    last_event: Option<TurnEvent>,
}

impl TurnDirector {
    /// Starts in the player phase of turn 1
    pub fn new(turn_config: TurnConfig, wave_config: WaveConfig) -> Self {
        let mut director = Self {
            turn: 1,
            phase: Phase::Player,
            turn_config,
            wave_config,
            last_event: None,
        };
        director.start_turn();
        director
    }

    pub fn turn(&self) -> u32 {
        self.turn
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn max_turns(&self) -> u32 {
        self.turn_config.max_turns
    }

    pub fn take_last_event(&mut self) -> Option<TurnEvent> {
        self.last_event.take()
    }

    /// Enter the player phase of the current turn, or win past the last turn
    ///
    /// Returns true when a player phase began.
    pub fn start_turn(&mut self) -> bool {
        if self.phase.is_over() {
            return false;
        }
        if self.turn > self.turn_config.max_turns {
            self.phase = Phase::Won;
            self.last_event = Some(TurnEvent::Won {
                reward: self.turn_config.win_reward,
            });
            info!(turns = self.turn_config.max_turns, reward = self.turn_config.win_reward, "game won");
            return false;
        }
        self.phase = Phase::Player;
        self.last_event = Some(TurnEvent::PlayerPhaseStarted { turn: self.turn });
        info!(turn = self.turn, "player phase");
        true
    }

    /// Close the player phase and describe the coming wave
    pub fn end_player_phase(&mut self) -> Option<WavePlan> {
        if self.phase != Phase::Player {
            return None;
        }
        self.phase = Phase::Enemy;
        self.last_event = Some(TurnEvent::EnemyPhaseStarted { turn: self.turn });
        let plan = WavePlan::for_turn(&self.wave_config, self.turn);
        info!(turn = self.turn, enemies = plan.count, "enemy phase");
        Some(plan)
    }

    /// The wave is over: advance the turn and start the next one
    pub fn finish_enemy_phase(&mut self) -> bool {
        if self.phase != Phase::Enemy {
            return false;
        }
        self.turn += 1;
        self.start_turn()
    }

    pub fn base_destroyed(&mut self) {
        if self.phase.is_over() {
            return;
        }
        self.phase = Phase::Lost;
        self.last_event = Some(TurnEvent::Lost { turn: self.turn });
        info!(turn = self.turn, "base destroyed");
    }
}
