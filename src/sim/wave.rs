//! Wave director
//!
//! Builds each wave's spawn queue, drains it at a fixed cadence and detects
//! when a wave is cleared.
//!
//! State flow:
//! - `Spawning`: queue still has entries
//! - `WaitingForClear`: queue empty, enemies alive
//! - `Cleared`: arena empty, counting down (real time) to the upgrade screen
//! - `UpgradeChoice`: waiting for the player to pick
//!
//! Every 5th wave is a boss wave. Every 3rd wave that isn't a boss wave is a
//! mini-boss wave. Everything else draws from band-weighted tables.

use std::collections::VecDeque;

use rand::Rng;
use serde::{Deserialize, Serialize};

use super::enemy::EnemySystem;
use super::state::{EnemyKind, SimRng, WaveKind};
use crate::consts::{SPAWN_INTERVAL, WAVE_CLEAR_DELAY};
use crate::difficulty::Difficulty;

pub const BOSS_EVERY: u32 = 5;
pub const MINIBOSS_EVERY: u32 = 3;
/// Cap on a normal wave's base enemy count
pub const MAX_WAVE_COUNT: f32 = 45.0;
/// Cap on a mini-boss wave's escorts
pub const MAX_ESCORTS: u32 = 20;

const BOSSES: [EnemyKind; 3] = [EnemyKind::Boss1, EnemyKind::Boss2, EnemyKind::Boss3];

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum WavePhase {
    Spawning,
    WaitingForClear,
    /// Arena is empty; `delay` seconds of real time remain
    Cleared { delay: f32 },
    UpgradeChoice,
}

/// Raised by [`WaveDirector::update`] on a transition the orchestrator acts on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaveSignal {
    /// Queue and arena both empty
    Cleared,
    /// Post-clear delay elapsed; show the upgrade choice
    UpgradeReady,
}

pub fn wave_kind(wave: u32) -> WaveKind {
    if wave % BOSS_EVERY == 0 {
        WaveKind::Boss
    } else if wave % MINIBOSS_EVERY == 0 {
        WaveKind::MiniBoss
    } else {
        WaveKind::Normal
    }
}

/// Build the spawn queue for `wave`
pub fn compose(wave: u32, difficulty: Difficulty, rng: &mut SimRng) -> (WaveKind, Vec<EnemyKind>) {
    let kind = wave_kind(wave);
    let band = wave + difficulty.wave_shift();
    let scale = |n: f32| ((n.floor() * difficulty.spawn_count()).round() as usize).max(1);

    let queue = match kind {
        WaveKind::Boss => vec![BOSSES[rng.random_range(0..BOSSES.len())]],
        WaveKind::MiniBoss => {
            let extras = scale((5 + wave).min(MAX_ESCORTS) as f32);
            let mut q = Vec::with_capacity(extras + 1);
            q.push(EnemyKind::MiniBoss);
            q.extend((0..extras).map(|_| escort(band, rng.random::<f32>())));
            q
        }
        WaveKind::Normal => {
            let count = scale((6.0 + wave as f32 * 2.5).min(MAX_WAVE_COUNT));
            (0..count)
                .map(|_| pick_normal(band, rng.random::<f32>()))
                .collect()
        }
    };

    (kind, queue)
}

/// Escort picked for a mini-boss wave
fn escort(band: u32, r: f32) -> EnemyKind {
    if band <= 4 {
        EnemyKind::Drone
    } else if band <= 7 {
        if r < 0.5 { EnemyKind::Drone } else { EnemyKind::Scout }
    } else if r < 0.3 {
        EnemyKind::Drone
    } else if r < 0.6 {
        EnemyKind::Scout
    } else {
        EnemyKind::Tank
    }
}

/// Walk a cumulative weight table
fn pick(table: &[(f32, EnemyKind)], r: f32) -> EnemyKind {
    table
        .iter()
        .find(|(edge, _)| r < *edge)
        .or(table.last())
        .map(|(_, kind)| *kind)
        .unwrap_or(EnemyKind::Drone)
}

/// Enemy picked for a normal wave. Harder kinds come in as the band rises.
fn pick_normal(band: u32, r: f32) -> EnemyKind {
    use EnemyKind::*;
    match band {
        0..=2 => Drone,
        3..=4 => pick(&[(0.6, Drone), (1.0, Scout)], r),
        5..=7 => pick(
            &[(0.30, Drone), (0.55, Scout), (0.70, Tank), (0.85, Healer), (1.0, Bomber)],
            r,
        ),
        8..=10 => pick(
            &[
                (0.20, Drone),
                (0.40, Scout),
                (0.55, Tank),
                (0.65, Shield),
                (0.75, Sniper),
                (0.85, Healer),
                (0.92, Spawner),
                (1.0, Teleporter),
            ],
            r,
        ),
        _ => pick(
            &[
                (0.12, Drone),
                (0.28, Scout),
                (0.43, Tank),
                (0.55, Shield),
                (0.65, Sniper),
                (0.74, Swarm),
                (0.82, Healer),
                (0.88, Spawner),
                (0.93, Bomber),
                (0.96, Teleporter),
                (0.98, Kamikaze),
                (1.0, Artillery),
            ],
            r,
        ),
    }
}

/// Per-run wave scheduler
#[derive(Debug, Clone)]
pub struct WaveDirector {
    pub wave: u32,
    pub kind: WaveKind,
    pub phase: WavePhase,
    queue: VecDeque<EnemyKind>,
    spawn_timer: f32,
    difficulty: Difficulty,
}

impl WaveDirector {
    pub fn new(difficulty: Difficulty) -> Self {
        Self {
            wave: 0,
            kind: WaveKind::Normal,
            phase: WavePhase::UpgradeChoice,
            queue: VecDeque::new(),
            spawn_timer: 0.0,
            difficulty,
        }
    }

    /// Advance to the next wave and queue its enemies
    pub fn start_next(&mut self, rng: &mut SimRng) -> WaveKind {
        self.wave += 1;
        let (kind, queue) = compose(self.wave, self.difficulty, rng);
        log::info!(
            "Wave {} ({:?}, {} enemies queued)",
            self.wave,
            kind,
            queue.len()
        );
        self.kind = kind;
        self.queue = queue.into();
        self.spawn_timer = 0.0;
        self.phase = WavePhase::Spawning;
        kind
    }

    pub fn queued(&self) -> usize {
        self.queue.len()
    }

    /// Drain the queue and watch for a clear. `dt` is simulation time;
    /// `real_dt` is unscaled frame time and drives the post-clear delay.
    pub fn update(
        &mut self,
        dt: f32,
        real_dt: f32,
        enemies: &mut EnemySystem,
        rng: &mut SimRng,
    ) -> Option<WaveSignal> {
        match self.phase {
            WavePhase::Spawning | WavePhase::WaitingForClear => {
                self.spawn_timer -= dt;
                if self.spawn_timer <= 0.0 {
                    if let Some(kind) = self.queue.pop_front() {
                        self.spawn_timer = SPAWN_INTERVAL;
                        enemies.spawn(kind, self.wave, rng);
                    }
                }
                if self.queue.is_empty() {
                    self.phase = WavePhase::WaitingForClear;
                    if enemies.living_count() == 0 {
                        self.phase = WavePhase::Cleared {
                            delay: WAVE_CLEAR_DELAY,
                        };
                        return Some(WaveSignal::Cleared);
                    }
                }
                None
            }
            WavePhase::Cleared { delay } => {
                let delay = delay - real_dt;
                if delay <= 0.0 {
                    self.phase = WavePhase::UpgradeChoice;
                    Some(WaveSignal::UpgradeReady)
                } else {
                    self.phase = WavePhase::Cleared { delay };
                    None
                }
            }
            WavePhase::UpgradeChoice => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    #[test]
    fn test_wave_cadence() {
        assert_eq!(wave_kind(1), WaveKind::Normal);
        assert_eq!(wave_kind(3), WaveKind::MiniBoss);
        assert_eq!(wave_kind(5), WaveKind::Boss);
        assert_eq!(wave_kind(6), WaveKind::MiniBoss);
        assert_eq!(wave_kind(15), WaveKind::Boss);
        assert_eq!(wave_kind(30), WaveKind::Boss);
    }

    #[test]
    fn test_normal_wave_counts() {
        let mut rng = SimRng::seed_from_u64(5);
        let (_, q) = compose(1, Difficulty::Normal, &mut rng);
        assert_eq!(q.len(), 8);
        assert!(q.iter().all(|k| *k == EnemyKind::Drone));
        let (_, q) = compose(22, Difficulty::Normal, &mut rng);
        assert_eq!(q.len(), 45);
        let (_, q) = compose(22, Difficulty::Nightmare, &mut rng);
        assert_eq!(q.len(), 63);
    }

    #[test]
    fn test_boss_wave_is_single_boss() {
        let mut rng = SimRng::seed_from_u64(5);
        for wave in [5, 10, 25] {
            let (kind, q) = compose(wave, Difficulty::Normal, &mut rng);
            assert_eq!(kind, WaveKind::Boss);
            assert_eq!(q.len(), 1);
            assert!(q[0].is_boss());
        }
    }

    #[test]
    fn test_miniboss_wave_leads_with_miniboss() {
        let mut rng = SimRng::seed_from_u64(5);
        let (kind, q) = compose(3, Difficulty::Normal, &mut rng);
        assert_eq!(kind, WaveKind::MiniBoss);
        assert_eq!(q[0], EnemyKind::MiniBoss);
        assert_eq!(q.len(), 9);
        let (_, q) = compose(21, Difficulty::Normal, &mut rng);
        assert_eq!(q.len(), 1 + MAX_ESCORTS as usize);
    }

    #[test]
    fn test_difficulty_shift_unlocks_harder_kinds() {
        // Wave 1 on Nightmare reads the 5-7 band
        let mut rng = SimRng::seed_from_u64(8);
        let (_, q) = compose(1, Difficulty::Nightmare, &mut rng);
        assert!(q.iter().any(|k| *k != EnemyKind::Drone));
    }

    #[test]
    fn test_director_flow() {
        let mut rng = SimRng::seed_from_u64(1);
        let mut enemies = EnemySystem::new(Difficulty::Normal);
        let mut dir = WaveDirector::new(Difficulty::Normal);
        dir.start_next(&mut rng);
        assert_eq!(dir.phase, WavePhase::Spawning);

        let mut ticks = 0;
        while dir.queued() > 0 {
            dir.update(0.03, 0.03, &mut enemies, &mut rng);
            ticks += 1;
            assert!(ticks < 1000);
        }
        assert_eq!(enemies.living_count(), 8);
        assert_eq!(dir.phase, WavePhase::WaitingForClear);

        enemies.clear();
        assert_eq!(
            dir.update(0.03, 0.03, &mut enemies, &mut rng),
            Some(WaveSignal::Cleared)
        );
        // Slow motion does not stretch the delay
        let mut signal = None;
        for _ in 0..41 {
            signal = dir.update(0.001, 0.03, &mut enemies, &mut rng).or(signal);
        }
        assert_eq!(signal, Some(WaveSignal::UpgradeReady));
        assert_eq!(dir.phase, WavePhase::UpgradeChoice);
    }
}
