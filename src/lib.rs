//! Neon Arena - simulation core of a wave-based arena shooter
//!
//! Core modules:
//! - `sim`: Deterministic simulation (player, weapons, enemies, effects, waves)
//! - `persistence`: Progression save/load with default fallback
//! - `tuning`: Ship archetypes and permanent upgrade tables
//! - `difficulty`: Named difficulty tiers

pub mod difficulty;
pub mod persistence;
pub mod sim;
pub mod tuning;

pub use difficulty::Difficulty;
pub use persistence::{Achievement, JsonFileStore, PersistError, Progression};

use glam::Vec2;

/// Game configuration constants
pub mod consts {
    /// Arena dimensions (pixels)
    pub const ARENA_WIDTH: f32 = 900.0;
    pub const ARENA_HEIGHT: f32 = 680.0;

    /// Player is kept this far away from the arena edges
    pub const PLAYER_MARGIN: f32 = 28.0;
    /// Enemies are kept this far away from the arena edges
    pub const ENEMY_MARGIN: f32 = 30.0;
    /// Projectiles are culled once this far outside the arena
    pub const CULL_MARGIN: f32 = 20.0;

    /// Upper bound on a single frame step (avoids tunneling on hitches)
    pub const MAX_FRAME_DT: f32 = 0.033;
    /// Simulation rate multiplier while a slow-motion timer runs
    pub const SLOWMO_FACTOR: f32 = 0.4;
    /// Slow-motion granted by killing a boss
    pub const BOSS_KILL_SLOWMO: f32 = 1.2;

    /// Real-time delay between a cleared wave and the upgrade screen
    pub const WAVE_CLEAR_DELAY: f32 = 1.2;
    /// Interval between two queued enemy spawns
    pub const SPAWN_INTERVAL: f32 = 0.28;

    /// Combo decays after this long without a kill
    pub const COMBO_WINDOW: f32 = 1.8;
}

/// Center of the arena
#[inline]
pub fn arena_center() -> Vec2 {
    Vec2::new(consts::ARENA_WIDTH / 2.0, consts::ARENA_HEIGHT / 2.0)
}

/// Unit vector pointing from `from` to `to` (zero if they coincide)
#[inline]
pub fn dir_to(from: Vec2, to: Vec2) -> Vec2 {
    (to - from).normalize_or_zero()
}

/// Angle of the vector from `from` to `to`
#[inline]
pub fn angle_to(from: Vec2, to: Vec2) -> f32 {
    let d = to - from;
    d.y.atan2(d.x)
}

/// Unit vector for an angle
#[inline]
pub fn from_angle(angle: f32) -> Vec2 {
    Vec2::new(angle.cos(), angle.sin())
}

/// Clamp a position into the arena, keeping `margin` away from every edge
#[inline]
pub fn clamp_to_arena(pos: Vec2, margin: f32) -> Vec2 {
    Vec2::new(
        pos.x.clamp(margin, consts::ARENA_WIDTH - margin),
        pos.y.clamp(margin, consts::ARENA_HEIGHT - margin),
    )
}

/// True when `pos` lies more than `margin` outside the arena
#[inline]
pub fn out_of_arena(pos: Vec2, margin: f32) -> bool {
    pos.x < -margin
        || pos.x > consts::ARENA_WIDTH + margin
        || pos.y < -margin
        || pos.y > consts::ARENA_HEIGHT + margin
}

/// Distance from point `p` to the segment `a`-`b`
pub fn point_segment_distance(p: Vec2, a: Vec2, b: Vec2) -> f32 {
    let ab = b - a;
    let len_sq = ab.length_squared();
    if len_sq == 0.0 {
        return p.distance(a);
    }
    let t = ((p - a).dot(ab) / len_sq).clamp(0.0, 1.0);
    p.distance(a + ab * t)
}
