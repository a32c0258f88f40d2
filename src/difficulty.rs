//! Difficulty tiers
//!
//! Selected on the menu, persisted with the progression, and read by the
//! wave director and enemy spawning at run start.

use serde::{Deserialize, Serialize};

/// Named difficulty tier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum Difficulty {
    Easy,
    #[default]
    Normal,
    Hard,
    Nightmare,
}

impl Difficulty {
    pub const ALL: [Difficulty; 4] = [
        Difficulty::Easy,
        Difficulty::Normal,
        Difficulty::Hard,
        Difficulty::Nightmare,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Difficulty::Easy => "Easy",
            Difficulty::Normal => "Normal",
            Difficulty::Hard => "Hard",
            Difficulty::Nightmare => "Nightmare",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "easy" => Some(Difficulty::Easy),
            "normal" | "norm" => Some(Difficulty::Normal),
            "hard" => Some(Difficulty::Hard),
            "nightmare" | "nm" => Some(Difficulty::Nightmare),
            _ => None,
        }
    }

    /// Index stored in the progression record
    pub fn index(&self) -> u8 {
        match self {
            Difficulty::Easy => 0,
            Difficulty::Normal => 1,
            Difficulty::Hard => 2,
            Difficulty::Nightmare => 3,
        }
    }

    /// Inverse of [`Difficulty::index`]; unknown indices map to Normal
    pub fn from_index(index: u8) -> Self {
        Self::ALL
            .get(index as usize)
            .copied()
            .unwrap_or(Difficulty::Normal)
    }

    /// Regular enemy HP multiplier
    pub fn enemy_hp(&self) -> f32 {
        match self {
            Difficulty::Easy => 0.75,
            Difficulty::Normal => 1.0,
            Difficulty::Hard => 1.3,
            Difficulty::Nightmare => 1.7,
        }
    }

    /// Enemy movement speed multiplier
    pub fn enemy_speed(&self) -> f32 {
        match self {
            Difficulty::Easy => 0.9,
            Difficulty::Normal => 1.0,
            Difficulty::Hard => 1.1,
            Difficulty::Nightmare => 1.2,
        }
    }

    /// Multiplier on the number of enemies queued per wave
    pub fn spawn_count(&self) -> f32 {
        match self {
            Difficulty::Easy => 0.8,
            Difficulty::Normal => 1.0,
            Difficulty::Hard => 1.2,
            Difficulty::Nightmare => 1.4,
        }
    }

    /// Multiplier on damage enemies deal to the player
    pub fn enemy_damage(&self) -> f32 {
        match self {
            Difficulty::Easy => 0.7,
            Difficulty::Normal => 1.0,
            Difficulty::Hard => 1.25,
            Difficulty::Nightmare => 1.5,
        }
    }

    /// Multiplier on score awarded for kills
    pub fn score(&self) -> f32 {
        match self {
            Difficulty::Easy => 0.75,
            Difficulty::Normal => 1.0,
            Difficulty::Hard => 1.5,
            Difficulty::Nightmare => 2.0,
        }
    }

    /// HP multiplier applied to bosses and mini-bosses instead of `enemy_hp`
    pub fn boss_hp(&self) -> f32 {
        match self {
            Difficulty::Easy => 0.7,
            Difficulty::Normal => 1.0,
            Difficulty::Hard => 1.35,
            Difficulty::Nightmare => 1.8,
        }
    }

    /// Added to the wave number when looking up composition bands
    pub fn wave_shift(&self) -> u32 {
        match self {
            Difficulty::Easy => 0,
            Difficulty::Normal => 0,
            Difficulty::Hard => 2,
            Difficulty::Nightmare => 4,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_trip_names() {
        for d in Difficulty::ALL {
            assert_eq!(Difficulty::from_str(d.as_str()), Some(d));
            assert_eq!(Difficulty::from_index(d.index()), d);
        }
        assert_eq!(Difficulty::from_str("bogus"), None);
        assert_eq!(Difficulty::from_index(42), Difficulty::Normal);
    }

    #[test]
    fn test_normal_is_identity() {
        let d = Difficulty::Normal;
        assert_eq!(d.enemy_hp(), 1.0);
        assert_eq!(d.enemy_speed(), 1.0);
        assert_eq!(d.spawn_count(), 1.0);
        assert_eq!(d.enemy_damage(), 1.0);
        assert_eq!(d.score(), 1.0);
        assert_eq!(d.boss_hp(), 1.0);
        assert_eq!(d.wave_shift(), 0);
    }
}
