//! Data-driven game balance
//!
//! Ship archetypes and the permanent (meta-progression) upgrade table.

use serde::{Deserialize, Serialize};

/// Selectable ship archetype, each with a signature perk
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum Ship {
    /// Balanced fighter. Perk: rapid strike
    #[default]
    Viper,
    /// Slow and sturdy. Perk: armor plating
    Tanks,
    /// Glass cannon. Perk: afterburner
    Razor,
}

/// Base numbers for a ship before permanent bonuses
#[derive(Debug, Clone, Copy)]
pub struct ShipStats {
    pub hp: f32,
    pub speed: f32,
    pub damage: f32,
    /// Seconds between shots
    pub fire_interval: f32,
    /// Seconds between dashes
    pub dash_cooldown: f32,
    /// Particle color used for dash bursts
    pub color: u32,
}

/// VIPER fires instantly on every Nth trigger
pub const RAPID_STRIKE_EVERY: u32 = 5;
/// TANKS damage reduction
pub const ARMOR_PLATING_REDUCTION: f32 = 0.25;
/// RAZOR speed bonus after a dash
pub const AFTERBURNER_MULT: f32 = 1.15;
pub const AFTERBURNER_DURATION: f32 = 2.0;

impl Ship {
    pub const ALL: [Ship; 3] = [Ship::Viper, Ship::Tanks, Ship::Razor];

    pub fn stats(&self) -> ShipStats {
        match self {
            Ship::Viper => ShipStats {
                hp: 100.0,
                speed: 240.0,
                damage: 24.0,
                fire_interval: 0.145,
                dash_cooldown: 0.75,
                color: 0x00ffff,
            },
            Ship::Tanks => ShipStats {
                hp: 150.0,
                speed: 185.0,
                damage: 22.0,
                fire_interval: 0.155,
                dash_cooldown: 0.90,
                color: 0x7733ff,
            },
            Ship::Razor => ShipStats {
                hp: 70.0,
                speed: 310.0,
                damage: 28.0,
                fire_interval: 0.155,
                dash_cooldown: 0.55,
                color: 0xff6600,
            },
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Ship::Viper => "VIPER",
            Ship::Tanks => "TANKS",
            Ship::Razor => "RAZOR",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "viper" => Some(Ship::Viper),
            "tanks" | "tank" => Some(Ship::Tanks),
            "razor" => Some(Ship::Razor),
            _ => None,
        }
    }

    pub fn index(&self) -> u8 {
        match self {
            Ship::Viper => 0,
            Ship::Tanks => 1,
            Ship::Razor => 2,
        }
    }

    pub fn from_index(index: u8) -> Self {
        Self::ALL.get(index as usize).copied().unwrap_or_default()
    }
}

/// Permanent upgrade bought between runs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PermanentUpgrade {
    MaxHpBonus,
    DamageBonus,
    SpeedBonus,
    StartingShield,
}

impl PermanentUpgrade {
    pub const ALL: [PermanentUpgrade; 4] = [
        PermanentUpgrade::MaxHpBonus,
        PermanentUpgrade::DamageBonus,
        PermanentUpgrade::SpeedBonus,
        PermanentUpgrade::StartingShield,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            PermanentUpgrade::MaxHpBonus => "Max HP Boost",
            PermanentUpgrade::DamageBonus => "Damage Boost",
            PermanentUpgrade::SpeedBonus => "Speed Boost",
            PermanentUpgrade::StartingShield => "Starting Shield",
        }
    }

    pub fn max_level(&self) -> u8 {
        match self {
            PermanentUpgrade::StartingShield => 3,
            _ => 5,
        }
    }

    /// Per-level bonus: flat points for HP/shield, percent for damage/speed
    pub fn bonus(&self) -> f32 {
        match self {
            PermanentUpgrade::MaxHpBonus => 15.0,
            PermanentUpgrade::DamageBonus => 8.0,
            PermanentUpgrade::SpeedBonus => 5.0,
            PermanentUpgrade::StartingShield => 20.0,
        }
    }
}

/// Permanent upgrade levels, as read from the progression at run start
pub trait UpgradeLevels {
    fn level(&self, upgrade: PermanentUpgrade) -> u8;
}

/// Starting numbers for a run: ship base stats plus permanent bonuses
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StartingStats {
    pub hp: f32,
    pub shield: f32,
    pub speed: f32,
    pub damage: f32,
}

impl StartingStats {
    pub fn compute(ship: Ship, levels: &impl UpgradeLevels) -> Self {
        let base = ship.stats();
        let lvl = |u: PermanentUpgrade| levels.level(u).min(u.max_level()) as f32;

        let hp_bonus = lvl(PermanentUpgrade::MaxHpBonus) * PermanentUpgrade::MaxHpBonus.bonus();
        let speed_mult =
            1.0 + lvl(PermanentUpgrade::SpeedBonus) * PermanentUpgrade::SpeedBonus.bonus() / 100.0;
        let damage_mult =
            1.0 + lvl(PermanentUpgrade::DamageBonus) * PermanentUpgrade::DamageBonus.bonus() / 100.0;
        let shield =
            lvl(PermanentUpgrade::StartingShield) * PermanentUpgrade::StartingShield.bonus();

        Self {
            hp: base.hp + hp_bonus,
            shield,
            speed: base.speed * speed_mult,
            damage: base.damage * damage_mult,
        }
    }
}
