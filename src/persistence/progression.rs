//! Meta-progression record shared between runs

use std::collections::BTreeMap;

use serde::de::value::{Error as ValueError, StrDeserializer};
use serde::de::{DeserializeOwned, IntoDeserializer};
use serde::{Deserialize, Deserializer, Serialize};

use super::achievement::{Achievement, AchievementState};
use crate::difficulty::Difficulty;
use crate::tuning::{PermanentUpgrade, Ship, UpgradeLevels};

/// Everything that survives between runs
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Progression {
    /// Permanent upgrade levels (missing = level 0)
    #[serde(deserialize_with = "known_keys")]
    pub persistent_upgrades: BTreeMap<PermanentUpgrade, u8>,
    #[serde(deserialize_with = "known_keys")]
    pub achievements: BTreeMap<Achievement, AchievementState>,
    pub total_enemies_killed: u64,
    pub high_score: u64,
    pub selected_ship: u8,
    pub selected_difficulty: u8,
}

/// Read a map keyed by an enum, dropping keys this build doesn't know.
/// Saves from other versions keep everything else.
fn known_keys<'de, D, K, V>(deserializer: D) -> Result<BTreeMap<K, V>, D::Error>
where
    D: Deserializer<'de>,
    K: DeserializeOwned + Ord,
    V: Deserialize<'de>,
{
    let raw = BTreeMap::<String, V>::deserialize(deserializer)?;
    Ok(raw
        .into_iter()
        .filter_map(|(key, value)| {
            let de: StrDeserializer<'_, ValueError> = key.as_str().into_deserializer();
            match K::deserialize(de) {
                Ok(k) => Some((k, value)),
                Err(_) => {
                    log::warn!("Ignoring unknown save entry '{key}'");
                    None
                }
            }
        })
        .collect())
}

impl UpgradeLevels for Progression {
    fn level(&self, upgrade: PermanentUpgrade) -> u8 {
        self.persistent_upgrades
            .get(&upgrade)
            .copied()
            .unwrap_or(0)
            .min(upgrade.max_level())
    }
}

impl Progression {
    pub fn ship(&self) -> Ship {
        Ship::from_index(self.selected_ship)
    }

    pub fn difficulty(&self) -> Difficulty {
        Difficulty::from_index(self.selected_difficulty)
    }

    /// Set a permanent upgrade level, clamped to the upgrade's max
    pub fn set_upgrade_level(&mut self, upgrade: PermanentUpgrade, level: u8) {
        self.persistent_upgrades
            .insert(upgrade, level.min(upgrade.max_level()));
    }

    pub fn is_unlocked(&self, achievement: Achievement) -> bool {
        self.achievements
            .get(&achievement)
            .is_some_and(|s| s.unlocked)
    }

    /// Unlock an achievement. Returns true only the first time.
    pub fn unlock(&mut self, achievement: Achievement) -> bool {
        let state = self.achievements.entry(achievement).or_default();
        if state.unlocked {
            return false;
        }
        state.unlocked = true;
        log::info!("Achievement unlocked: {}", achievement.name());
        true
    }

    /// Count one kill toward the lifetime counter.
    /// Returns the kill-count achievement newly unlocked by it, if any.
    pub fn record_kill(&mut self) -> Option<Achievement> {
        self.total_enemies_killed += 1;
        Achievement::for_lifetime_kills(self.total_enemies_killed).filter(|&a| self.unlock(a))
    }

    /// Fold a finished run's score in. Returns true on a new high score.
    pub fn record_run(&mut self, score: u64) -> bool {
        if score > self.high_score {
            self.high_score = score;
            true
        } else {
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unlock_is_idempotent() {
        let mut p = Progression::default();
        assert!(!p.is_unlocked(Achievement::Boss1));
        assert!(p.unlock(Achievement::Boss1));
        assert!(!p.unlock(Achievement::Boss1));
        assert!(p.is_unlocked(Achievement::Boss1));
    }

    #[test]
    fn test_record_kill_thresholds() {
        let mut p = Progression::default();
        assert_eq!(p.record_kill(), Some(Achievement::FirstKill));
        for _ in 1..99 {
            assert_eq!(p.record_kill(), None);
        }
        assert_eq!(p.record_kill(), Some(Achievement::Enemies100));
        assert_eq!(p.total_enemies_killed, 100);
    }

    #[test]
    fn test_upgrade_level_clamped() {
        let mut p = Progression::default();
        p.set_upgrade_level(PermanentUpgrade::StartingShield, 10);
        assert_eq!(p.level(PermanentUpgrade::StartingShield), 3);
        assert_eq!(p.level(PermanentUpgrade::MaxHpBonus), 0);
    }

    #[test]
    fn test_record_run_high_score() {
        let mut p = Progression::default();
        assert!(p.record_run(120));
        assert!(!p.record_run(80));
        assert_eq!(p.high_score, 120);
    }
}
