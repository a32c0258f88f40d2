//! Deterministic simulation module
//!
//! All gameplay logic lives here. This module must be pure and deterministic:
//! - Variable timestep, clamped per frame
//! - Seeded RNG only (gameplay and visual streams are separate)
//! - Stable iteration order (spawn order)
//! - No rendering, audio or platform dependencies; presentation reads
//!   snapshots and drains `GameEvent`s

pub mod effects;
pub mod enemy;
pub mod player;
pub mod state;
pub mod tick;
pub mod upgrade;
pub mod wave;
pub mod weapon;

pub use effects::{Effects, EffectsSink};
pub use enemy::EnemySystem;
pub use state::{
    Behavior, BossPhase, Bullet, Enemy, EnemyBullet, EnemyKind, GameEvent, GamePhase, Pickup,
    PickupKind, Player, RunStats, SoundCue, WaveKind,
};
pub use tick::{GameState, RunConfig, Snapshot, TickInput, autopilot, tick};
pub use upgrade::UpgradeKind;
pub use wave::WaveDirector;
pub use weapon::{FireMode, WeaponSystem};
