//! In-run upgrade catalogue
//!
//! Each entry has an eligibility predicate over the current weapon, player
//! and run stats, and an apply step that mutates them.

use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};

use super::state::{Player, RunStats, SimRng};
use super::weapon::{FireMode, RICOCHET_BOUNCES, Weapon};

/// How many choices are offered between waves
pub const CHOICES: usize = 3;
/// Fastest fire interval rapid fire can reach (s)
pub const RAPID_FIRE_FLOOR: f32 = 0.065;
pub const MAX_BULLET_SIZE: f32 = 2.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum UpgradeKind {
    DualShot,
    Spread,
    QuadShot,
    Ricochet,
    ShotgunBlast,
    LaserBeam,
    RapidFire,
    Piercing,
    Homing,
    MegaBlast,
    BulletSize,
    MaxHealth,
    SpeedUp,
    EnergyShield,
    Regen,
    QuickDash,
    Teleport,
}

impl UpgradeKind {
    pub const ALL: [UpgradeKind; 17] = [
        UpgradeKind::DualShot,
        UpgradeKind::Spread,
        UpgradeKind::QuadShot,
        UpgradeKind::Ricochet,
        UpgradeKind::ShotgunBlast,
        UpgradeKind::LaserBeam,
        UpgradeKind::RapidFire,
        UpgradeKind::Piercing,
        UpgradeKind::Homing,
        UpgradeKind::MegaBlast,
        UpgradeKind::BulletSize,
        UpgradeKind::MaxHealth,
        UpgradeKind::SpeedUp,
        UpgradeKind::EnergyShield,
        UpgradeKind::Regen,
        UpgradeKind::QuickDash,
        UpgradeKind::Teleport,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            UpgradeKind::DualShot => "DUAL SHOT",
            UpgradeKind::Spread => "SPREAD",
            UpgradeKind::QuadShot => "QUAD SHOT",
            UpgradeKind::Ricochet => "RICOCHET",
            UpgradeKind::ShotgunBlast => "SHOTGUN BLAST",
            UpgradeKind::LaserBeam => "LASER BEAM",
            UpgradeKind::RapidFire => "RAPID FIRE",
            UpgradeKind::Piercing => "PIERCING",
            UpgradeKind::Homing => "HOMING",
            UpgradeKind::MegaBlast => "MEGA BLAST",
            UpgradeKind::BulletSize => "BULLET SIZE",
            UpgradeKind::MaxHealth => "MAX HEALTH",
            UpgradeKind::SpeedUp => "SPEED UP",
            UpgradeKind::EnergyShield => "ENERGY SHIELD",
            UpgradeKind::Regen => "REGEN",
            UpgradeKind::QuickDash => "QUICK DASH",
            UpgradeKind::Teleport => "TELEPORT",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            UpgradeKind::DualShot => "Fire two bullets",
            UpgradeKind::Spread => "Three-shot cone",
            UpgradeKind::QuadShot => "Four-shot burst",
            UpgradeKind::Ricochet => "Bullets bounce off walls",
            UpgradeKind::ShotgunBlast => "Wide 8-pellet spread",
            UpgradeKind::LaserBeam => "Continuous damage beam",
            UpgradeKind::RapidFire => "Increase fire rate",
            UpgradeKind::Piercing => "Bullets pass through",
            UpgradeKind::Homing => "Bullets track enemies",
            UpgradeKind::MegaBlast => "Every 10th shot explodes",
            UpgradeKind::BulletSize => "Larger projectiles",
            UpgradeKind::MaxHealth => "+30 HP and heal",
            UpgradeKind::SpeedUp => "+18% movement speed",
            UpgradeKind::EnergyShield => "+50 shield capacity",
            UpgradeKind::Regen => "Passive heal",
            UpgradeKind::QuickDash => "Reduce dash cooldown",
            UpgradeKind::Teleport => "Dash becomes teleport",
        }
    }

    pub fn is_eligible(&self, w: &Weapon, p: &Player, stats: &RunStats) -> bool {
        match self {
            UpgradeKind::DualShot => w.mode == FireMode::Single,
            UpgradeKind::Spread => matches!(w.mode, FireMode::Single | FireMode::Double),
            UpgradeKind::QuadShot => {
                matches!(w.mode, FireMode::Single | FireMode::Double | FireMode::Spread)
            }
            UpgradeKind::Ricochet => w.ricochet_bounces == 0,
            UpgradeKind::ShotgunBlast | UpgradeKind::LaserBeam => w.mode.is_standard(),
            UpgradeKind::RapidFire => w.fire_interval > RAPID_FIRE_FLOOR,
            UpgradeKind::Piercing => !w.piercing,
            UpgradeKind::Homing => !w.homing,
            UpgradeKind::MegaBlast => !w.mega,
            UpgradeKind::BulletSize => w.bullet_size < MAX_BULLET_SIZE,
            UpgradeKind::MaxHealth
            | UpgradeKind::SpeedUp
            | UpgradeKind::EnergyShield
            | UpgradeKind::Regen => true,
            UpgradeKind::QuickDash => !stats.has_dash_upgrade,
            UpgradeKind::Teleport => !p.has_teleport,
        }
    }

    pub fn apply(&self, w: &mut Weapon, p: &mut Player, stats: &mut RunStats) {
        match self {
            UpgradeKind::DualShot => w.mode = FireMode::Double,
            UpgradeKind::Spread => w.mode = FireMode::Spread,
            UpgradeKind::QuadShot => w.mode = FireMode::Quad,
            UpgradeKind::Ricochet => w.ricochet_bounces = RICOCHET_BOUNCES,
            UpgradeKind::ShotgunBlast => w.mode = FireMode::Shotgun,
            UpgradeKind::LaserBeam => w.mode = FireMode::Laser,
            UpgradeKind::RapidFire => {
                w.fire_interval = (w.fire_interval * 0.82).max(RAPID_FIRE_FLOOR)
            }
            UpgradeKind::Piercing => w.piercing = true,
            UpgradeKind::Homing => w.homing = true,
            UpgradeKind::MegaBlast => w.mega = true,
            UpgradeKind::BulletSize => w.bullet_size += 0.4,
            UpgradeKind::MaxHealth => {
                p.max_hp += 30.0;
                p.hp = (p.hp + 30.0).min(p.max_hp);
            }
            UpgradeKind::SpeedUp => p.speed *= 1.18,
            UpgradeKind::EnergyShield => {
                p.max_shield += 50.0;
                p.shield = (p.shield + 50.0).min(p.max_shield);
            }
            UpgradeKind::Regen => stats.regen_rate += 2.2,
            UpgradeKind::QuickDash => {
                stats.dash_cooldown *= 0.7;
                stats.has_dash_upgrade = true;
            }
            UpgradeKind::Teleport => {
                p.has_teleport = true;
                stats.dash_cooldown *= 0.85;
            }
        }
    }
}

/// Draw up to three distinct eligible upgrades
pub fn get_pool(w: &Weapon, p: &Player, stats: &RunStats, rng: &mut SimRng) -> Vec<UpgradeKind> {
    let mut eligible: Vec<UpgradeKind> = UpgradeKind::ALL
        .into_iter()
        .filter(|u| u.is_eligible(w, p, stats))
        .collect();
    eligible.shuffle(rng);
    eligible.truncate(CHOICES);
    eligible
}

/// Apply a chosen upgrade and count it
pub fn select(upgrade: UpgradeKind, w: &mut Weapon, p: &mut Player, stats: &mut RunStats) {
    upgrade.apply(w, p, stats);
    stats.upgrades_taken += 1;
    log::debug!(
        "Upgrade {} applied ({} this run)",
        upgrade.name(),
        stats.upgrades_taken
    );
}
