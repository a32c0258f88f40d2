//! Achievement catalogue

use serde::{Deserialize, Serialize};

/// One-time unlockable achievement
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Achievement {
    FirstKill,
    Wave5,
    Wave10,
    Wave20,
    Boss1,
    Combo10,
    Enemies100,
    Enemies500,
    NoDamageWave,
    AllUpgrades,
}

impl Achievement {
    pub const ALL: [Achievement; 10] = [
        Achievement::FirstKill,
        Achievement::Wave5,
        Achievement::Wave10,
        Achievement::Wave20,
        Achievement::Boss1,
        Achievement::Combo10,
        Achievement::Enemies100,
        Achievement::Enemies500,
        Achievement::NoDamageWave,
        Achievement::AllUpgrades,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Achievement::FirstKill => "First Blood",
            Achievement::Wave5 => "Survivor",
            Achievement::Wave10 => "Veteran",
            Achievement::Wave20 => "Legend",
            Achievement::Boss1 => "Boss Slayer",
            Achievement::Combo10 => "Combo Master",
            Achievement::Enemies100 => "Exterminator",
            Achievement::Enemies500 => "Annihilator",
            Achievement::NoDamageWave => "Untouchable",
            Achievement::AllUpgrades => "Fully Loaded",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            Achievement::FirstKill => "Kill your first enemy",
            Achievement::Wave5 => "Reach wave 5",
            Achievement::Wave10 => "Reach wave 10",
            Achievement::Wave20 => "Reach wave 20",
            Achievement::Boss1 => "Defeat your first boss",
            Achievement::Combo10 => "Achieve 10x combo",
            Achievement::Enemies100 => "Kill 100 enemies",
            Achievement::Enemies500 => "Kill 500 enemies",
            Achievement::NoDamageWave => "Complete a wave without taking damage",
            Achievement::AllUpgrades => "Take 10 upgrades in one run",
        }
    }

    /// Achievement earned by reaching `wave`, if any
    pub fn for_wave(wave: u32) -> Option<Self> {
        match wave {
            5 => Some(Achievement::Wave5),
            10 => Some(Achievement::Wave10),
            20 => Some(Achievement::Wave20),
            _ => None,
        }
    }

    /// Achievement earned when the lifetime kill counter reaches `total`
    pub fn for_lifetime_kills(total: u64) -> Option<Self> {
        match total {
            1 => Some(Achievement::FirstKill),
            100 => Some(Achievement::Enemies100),
            500 => Some(Achievement::Enemies500),
            _ => None,
        }
    }
}

/// Persisted per-achievement state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct AchievementState {
    #[serde(default)]
    pub unlocked: bool,
}
