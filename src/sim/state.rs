//! Entity model and per-run shared state
//!
//! Plain data records. Behavior lives in the system modules
//! (`player`, `weapon`, `enemy`, `effects`, `upgrade`, `wave`).

use std::collections::VecDeque;

use glam::Vec2;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use crate::persistence::Achievement;
use crate::tuning::Ship;

/// Gameplay RNG. Seeded once per run.
pub type SimRng = Pcg32;

/// Top-level state of a run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GamePhase {
    /// Wave in progress (spawning, fighting, or the post-clear delay)
    Playing,
    /// Simulation frozen while the player picks an upgrade
    UpgradeChoice,
    /// Player died
    GameOver,
}

/// Dash state machine
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum DashState {
    Idle,
    /// Moving at dash speed along `angle` until `remaining` hits zero
    Dashing { remaining: f32, angle: f32 },
}

/// The player's ship
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Player {
    pub pos: Vec2,
    /// Facing angle (radians), toward the pointer
    pub angle: f32,
    pub hp: f32,
    pub max_hp: f32,
    pub shield: f32,
    pub max_shield: f32,
    /// Base movement speed (pixels/s), before transient multipliers
    pub speed: f32,
    /// Remaining invulnerability (s)
    pub invuln: f32,
    /// Remaining dash cooldown (s)
    pub dash_cooldown: f32,
    pub dash: DashState,
    pub ship: Ship,
    /// Visual upgrade stage (0-2), derived from wave
    pub upgrade_stage: u8,
    /// Dash teleports instead of sliding
    pub has_teleport: bool,
    /// Rapid-strike trigger counter
    pub shot_counter: u32,
    /// Remaining afterburner boost (s)
    pub afterburner: f32,
    /// Time since the last movement input (s)
    pub idle_time: f32,
}

impl Player {
    pub fn is_dashing(&self) -> bool {
        matches!(self.dash, DashState::Dashing { .. })
    }
}

/// Enemy type tag
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EnemyKind {
    Drone,
    Scout,
    Tank,
    Shield,
    Swarm,
    Sniper,
    Healer,
    Spawner,
    Bomber,
    Teleporter,
    Kamikaze,
    Artillery,
    Boss1,
    Boss2,
    Boss3,
    MiniBoss,
}

impl EnemyKind {
    pub fn is_boss(&self) -> bool {
        matches!(self, EnemyKind::Boss1 | EnemyKind::Boss2 | EnemyKind::Boss3)
    }

    pub fn name(&self) -> &'static str {
        match self {
            EnemyKind::Drone => "drone",
            EnemyKind::Scout => "scout",
            EnemyKind::Tank => "tank",
            EnemyKind::Shield => "shield",
            EnemyKind::Swarm => "swarm",
            EnemyKind::Sniper => "sniper",
            EnemyKind::Healer => "healer",
            EnemyKind::Spawner => "spawner",
            EnemyKind::Bomber => "bomber",
            EnemyKind::Teleporter => "teleporter",
            EnemyKind::Kamikaze => "kamikaze",
            EnemyKind::Artillery => "artillery",
            EnemyKind::Boss1 => "boss1",
            EnemyKind::Boss2 => "boss2",
            EnemyKind::Boss3 => "boss3",
            EnemyKind::MiniBoss => "miniboss",
        }
    }
}

/// Boss escalation. Only ever moves forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BossPhase {
    One,
    Two,
}

/// Type-specific AI state. Each variant carries exactly the fields its
/// behavior reads, initialized at spawn.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Behavior {
    /// Straight chase (drone, scout, tank)
    Chaser,
    Sniper {
        min_range: f32,
        /// Player position captured when the charge began
        charge_target: Option<Vec2>,
        charge_time: f32,
    },
    /// Rotating shield arc is cosmetic only
    Shielded { shield_angle: f32 },
    Swarm,
    Healer { heal_timer: f32 },
    Spawner { spawn_timer: f32, spawned: u32 },
    Bomber,
    Teleporter { teleport_timer: f32 },
    Kamikaze { charging: bool, charge_speed: f32 },
    Artillery {
        min_range: f32,
        shoot_timer: f32,
        turret_angle: f32,
    },
    Boss1 {
        phase: BossPhase,
        orbit_angle: f32,
        volley_timer: f32,
    },
    Boss2 {
        phase: BossPhase,
        spiral_angle: f32,
        shoot_timer: f32,
    },
    Boss3 {
        phase: BossPhase,
        shoot_timer: f32,
        spawn_timer: f32,
        retarget_timer: f32,
        target: Option<Vec2>,
    },
    MiniBoss {
        orbit_angle: f32,
        pulse: f32,
        shoot_timer: f32,
    },
}

/// An enemy entity
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Enemy {
    pub id: u32,
    pub kind: EnemyKind,
    pub pos: Vec2,
    /// Heading (radians), for rendering
    pub angle: f32,
    pub hp: f32,
    pub max_hp: f32,
    pub speed: f32,
    /// Collision radius
    pub size: f32,
    /// Score awarded on kill
    pub score: u32,
    /// False once despawned or handed to the death path
    pub alive: bool,
    /// Remaining white flash after a hit (s)
    pub hit_flash: f32,
    /// Free-running animation clock (s)
    pub anim: f32,
    pub color: u32,
    pub behavior: Behavior,
}

impl Enemy {
    /// Current boss phase, for bosses
    pub fn boss_phase(&self) -> Option<BossPhase> {
        match self.behavior {
            Behavior::Boss1 { phase, .. }
            | Behavior::Boss2 { phase, .. }
            | Behavior::Boss3 { phase, .. } => Some(phase),
            _ => None,
        }
    }

    /// Heal, never above max hp
    pub fn heal(&mut self, amount: f32) {
        self.hp = (self.hp + amount).min(self.max_hp);
    }
}

/// Maximum number of trail points kept per bullet
pub const TRAIL_LENGTH: usize = 5;

/// A player projectile
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Bullet {
    pub pos: Vec2,
    pub vel: Vec2,
    pub damage: f32,
    /// Remaining lifetime (s)
    pub life: f32,
    pub piercing: bool,
    pub homing: bool,
    pub mega: bool,
    pub ricochets_left: u32,
    /// Size multiplier (collision and rendering)
    pub size: f32,
    /// Trail history for rendering (oldest first)
    #[serde(skip)]
    pub trail: VecDeque<Vec2>,
}

impl Bullet {
    /// Record current position to trail
    pub fn record_trail(&mut self) {
        self.trail.push_back(self.pos);
        if self.trail.len() > TRAIL_LENGTH {
            self.trail.pop_front();
        }
    }
}

/// An enemy projectile
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnemyBullet {
    pub pos: Vec2,
    pub vel: Vec2,
    pub damage: f32,
    pub life: f32,
}

/// Pickup types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PickupKind {
    Health,
    Shield,
    Speed,
    Score,
    SlowMo,
}

/// A pickup entity
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Pickup {
    pub kind: PickupKind,
    pub pos: Vec2,
    /// Remaining lifetime (s)
    pub life: f32,
    /// Spin angle for the idle animation
    pub phase: f32,
}

/// A particle for visual effects
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Particle {
    pub pos: Vec2,
    pub vel: Vec2,
    pub color: u32,
    pub life: f32,
    pub size: f32,
}

/// Pulls enemies toward its center for a while after a dash
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GravityWell {
    pub pos: Vec2,
    pub radius: f32,
    pub strength: f32,
    pub life: f32,
    pub max_life: f32,
}

/// Telegraph marker shown while a sniper charges
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SniperWarning {
    pub pos: Vec2,
    pub remaining: f32,
}

/// Aggregate per-run counters
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RunStats {
    pub enemies_killed: u32,
    pub upgrades_taken: u32,
    pub peak_combo: u32,
    pub bosses_defeated: u32,
    /// Damage taken during the current wave
    pub wave_damage_taken: f32,
    /// Passive regeneration (hp/s)
    pub regen_rate: f32,
    /// Dash cooldown duration (s)
    pub dash_cooldown: f32,
    pub has_dash_upgrade: bool,
    /// Remaining speed-pickup boost (s)
    pub speed_boost: f32,
}

/// Named sound cues for the audio collaborator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SoundCue {
    Shoot,
    Shotgun,
    Laser,
    Hit,
    ShieldHit,
    EnemyHit,
    EnemyDie,
    BossDie,
    BossBegin,
    Dash,
    Teleport,
    GravityWell,
    Pickup,
    SlowMo,
    Upgrade,
    Ricochet,
    PlayerDie,
}

impl SoundCue {
    pub fn name(&self) -> &'static str {
        match self {
            SoundCue::Shoot => "shoot",
            SoundCue::Shotgun => "shotgun",
            SoundCue::Laser => "laser",
            SoundCue::Hit => "hit",
            SoundCue::ShieldHit => "shieldHit",
            SoundCue::EnemyHit => "enemyHit",
            SoundCue::EnemyDie => "enemyDie",
            SoundCue::BossDie => "bossDie",
            SoundCue::BossBegin => "bossBegin",
            SoundCue::Dash => "dash",
            SoundCue::Teleport => "teleport",
            SoundCue::GravityWell => "gravityWell",
            SoundCue::Pickup => "pickup",
            SoundCue::SlowMo => "slowmo",
            SoundCue::Upgrade => "upgrade",
            SoundCue::Ricochet => "ricochet",
            SoundCue::PlayerDie => "playerDie",
        }
    }
}

/// What kind of wave just started
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WaveKind {
    Normal,
    MiniBoss,
    Boss,
}

/// Discrete output for the presentation layer, drained once per frame
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum GameEvent {
    Sound(SoundCue),
    /// Score delta
    Score(u64),
    Notify { text: String, color: u32, duration: f32 },
    Shake { amount: f32, duration: f32 },
    WaveStarted { wave: u32, kind: WaveKind },
    AchievementUnlocked(Achievement),
    /// Upgrade choices are ready to be shown
    UpgradeChoice,
    PlayerDied,
    RunEnded { score: u64, wave: u32, new_high_score: bool },
    /// Progression changed and should be written out
    SaveRequested,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trail_is_bounded() {
        let mut b = Bullet {
            pos: Vec2::ZERO,
            vel: Vec2::X,
            damage: 1.0,
            life: 1.0,
            piercing: false,
            homing: false,
            mega: false,
            ricochets_left: 0,
            size: 1.0,
            trail: VecDeque::new(),
        };
        for i in 0..12 {
            b.pos = Vec2::new(i as f32, 0.0);
            b.record_trail();
        }
        assert_eq!(b.trail.len(), TRAIL_LENGTH);
        assert_eq!(b.trail.back(), Some(&Vec2::new(11.0, 0.0)));
        assert_eq!(b.trail.front(), Some(&Vec2::new(7.0, 0.0)));
    }

    #[test]
    fn test_sound_cue_names() {
        assert_eq!(SoundCue::BossBegin.name(), "bossBegin");
        assert_eq!(SoundCue::EnemyDie.name(), "enemyDie");
        assert_eq!(SoundCue::Shoot.name(), "shoot");
    }
}
