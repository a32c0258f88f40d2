//! Particles, area detonations, pickups and camera shake
//!
//! Systems never reach back into the orchestrator. Anything they want the
//! presentation layer to see (bursts, shakes, sounds, notifications) goes
//! through an [`EffectsSink`].

use glam::Vec2;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use super::state::{
    Enemy, GameEvent, Particle, Pickup, PickupKind, Player, RunStats, SimRng, SoundCue,
};
use crate::from_angle;

/// Hard cap on live particles
pub const MAX_PARTICLES: usize = 600;
/// Downward particle acceleration (pixels/s²)
pub const PARTICLE_GRAVITY: f32 = 180.0;

/// Pickup lifetime (s)
pub const PICKUP_LIFETIME: f32 = 9.5;
/// Pickups are collected inside this radius
pub const PICKUP_RADIUS: f32 = 28.0;
/// Chance a non-boss kill drops a pickup
pub const PICKUP_DROP_CHANCE: f32 = 0.22;

pub const HEALTH_PICKUP_AMOUNT: f32 = 30.0;
pub const SHIELD_PICKUP_FLOOR: f32 = 50.0;
pub const SHIELD_PICKUP_AMOUNT: f32 = 25.0;
pub const SPEED_BOOST_DURATION: f32 = 5.0;
/// Movement multiplier while a speed boost runs
pub const SPEED_BOOST_MULT: f32 = 1.18;
pub const SCORE_PICKUP_BASE: u64 = 15;
pub const SLOWMO_PICKUP_DURATION: f32 = 3.5;

/// Inside this distance the player only takes chip damage from a detonation
pub const DETONATION_INNER_RADIUS: f32 = 30.0;
pub const DETONATION_CHIP_DAMAGE: f32 = 3.0;
/// Fraction of base damage the player takes from a detonation
pub const DETONATION_PLAYER_FRACTION: f32 = 0.3;

/// Where presentation output goes
pub trait EffectsSink {
    /// Spray `count` particles from `pos`
    fn burst(&mut self, pos: Vec2, color: u32, count: u32, speed: f32);
    /// Start (or restart) a camera shake
    fn shake(&mut self, amount: f32, duration: f32);
    /// Play a named sound
    fn cue(&mut self, cue: SoundCue);
    /// Show a transient on-screen message
    fn notify(&mut self, text: String, color: u32, duration: f32);
}

/// A pending area detonation (mega shot impact, bomber blast)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Detonation {
    pub pos: Vec2,
    pub damage: f32,
}

/// Result of collecting one or more pickups
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PickupResult {
    pub collected: Vec<PickupKind>,
    pub score: u64,
    /// Longest slow-motion granted this tick (s)
    pub slowmo: f32,
}

/// Visual effects, pickups and the outgoing event queue
#[derive(Debug, Clone)]
pub struct Effects {
    pub particles: Vec<Particle>,
    pub pickups: Vec<Pickup>,
    shake_amount: f32,
    shake_time: f32,
    /// Cosmetic randomness only; never shared with gameplay
    rng: SimRng,
    events: Vec<GameEvent>,
}

impl Effects {
    pub fn new(seed: u64) -> Self {
        Self {
            particles: Vec::new(),
            pickups: Vec::new(),
            shake_amount: 0.0,
            shake_time: 0.0,
            rng: SimRng::seed_from_u64(seed ^ 0x5eed_f00d),
            events: Vec::new(),
        }
    }

    /// Queue an arbitrary event for the presentation layer
    pub fn emit(&mut self, event: GameEvent) {
        self.events.push(event);
    }

    /// Take all events produced since the last drain
    pub fn drain_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }

    /// Integrate particles and drop the expired ones
    pub fn update_particles(&mut self, dt: f32) {
        for p in &mut self.particles {
            p.life -= dt;
            if p.life > 0.0 {
                p.pos += p.vel * dt;
                p.vel.y += PARTICLE_GRAVITY * dt;
            }
        }
        self.particles.retain(|p| p.life > 0.0);
    }

    /// Resolve an area detonation. Every living enemy in range takes the
    /// full base damage once. Returns the damage the player should take.
    pub fn explode_mega(
        &mut self,
        pos: Vec2,
        base_damage: f32,
        enemies: &mut [Enemy],
        player: &Player,
        wave: u32,
    ) -> f32 {
        let radius = detonation_radius(wave);

        for e in enemies.iter_mut().filter(|e| e.alive) {
            if e.pos.distance(pos) < radius {
                e.hp -= base_damage;
                let (at, color) = (e.pos, e.color);
                self.burst(at, color, 5, 80.0);
            }
        }

        let player_dist = player.pos.distance(pos);
        let player_damage = if player_dist >= radius {
            0.0
        } else if player_dist < DETONATION_INNER_RADIUS {
            DETONATION_CHIP_DAMAGE
        } else {
            base_damage * DETONATION_PLAYER_FRACTION
        };

        self.burst(pos, 0xff8800, 30, 180.0);
        self.shake(15.0, 0.18);

        player_damage
    }

    /// Drop a pickup. `forced` bypasses the weighted roll.
    pub fn spawn_pickup(&mut self, pos: Vec2, forced: Option<PickupKind>, rng: &mut SimRng) {
        let kind = forced.unwrap_or_else(|| roll_pickup_kind(rng.random::<f32>()));
        let phase = self.rng.random_range(0.0..std::f32::consts::TAU);
        self.pickups.push(Pickup {
            kind,
            pos,
            life: PICKUP_LIFETIME,
            phase,
        });
    }

    /// Apply one pickup to the player and run stats
    pub fn collect_pickup(
        &mut self,
        pickup: &Pickup,
        player: &mut Player,
        stats: &mut RunStats,
        combo: u32,
    ) -> PickupResult {
        let mut result = PickupResult {
            collected: vec![pickup.kind],
            ..Default::default()
        };

        match pickup.kind {
            PickupKind::Health => {
                player.hp = (player.hp + HEALTH_PICKUP_AMOUNT).min(player.max_hp);
                self.burst(pickup.pos, 0x00ff00, 10, 80.0);
            }
            PickupKind::Shield => {
                player.max_shield = player.max_shield.max(SHIELD_PICKUP_FLOOR);
                player.shield = (player.shield + SHIELD_PICKUP_AMOUNT).min(player.max_shield);
                self.burst(pickup.pos, 0x00aaff, 10, 80.0);
            }
            PickupKind::Speed => {
                stats.speed_boost = SPEED_BOOST_DURATION;
                self.burst(pickup.pos, 0xffff00, 10, 100.0);
            }
            PickupKind::Score => {
                result.score = score_pickup_value(combo);
                self.burst(pickup.pos, 0xffaa00, 10, 80.0);
            }
            PickupKind::SlowMo => {
                result.slowmo = SLOWMO_PICKUP_DURATION;
                self.burst(pickup.pos, 0xff00ff, 15, 120.0);
                self.cue(SoundCue::SlowMo);
            }
        }

        self.cue(SoundCue::Pickup);
        result
    }

    /// Age pickups and collect the ones the player touches
    pub fn update_pickups(
        &mut self,
        dt: f32,
        player: &mut Player,
        stats: &mut RunStats,
        combo: u32,
    ) -> PickupResult {
        let mut result = PickupResult::default();

        let mut pickups = std::mem::take(&mut self.pickups);
        for p in &mut pickups {
            p.life -= dt;
            p.phase += dt * 2.0;
            if p.life <= 0.0 {
                continue;
            }
            if p.pos.distance(player.pos) < PICKUP_RADIUS {
                let got = self.collect_pickup(p, player, stats, combo);
                result.score += got.score;
                result.slowmo = result.slowmo.max(got.slowmo);
                result.collected.extend(got.collected);
                // Collected: mark spent
                p.life = 0.0;
            }
        }
        pickups.retain(|p| p.life > 0.0);
        self.pickups = pickups;

        result
    }

    /// Advance the shake timer and return this frame's camera offset
    pub fn update_shake(&mut self, dt: f32) -> Vec2 {
        if self.shake_time <= 0.0 {
            return Vec2::ZERO;
        }
        self.shake_time -= dt;
        if self.shake_time <= 0.0 {
            self.shake_time = 0.0;
            return Vec2::ZERO;
        }
        let a = self.shake_amount;
        if a <= 0.0 {
            return Vec2::ZERO;
        }
        Vec2::new(self.rng.random_range(-a..a), self.rng.random_range(-a..a))
    }

    pub fn is_shaking(&self) -> bool {
        self.shake_time > 0.0
    }
}

impl EffectsSink for Effects {
    fn burst(&mut self, pos: Vec2, color: u32, count: u32, speed: f32) {
        for _ in 0..count {
            if self.particles.len() >= MAX_PARTICLES {
                break;
            }
            let angle = self.rng.random_range(0.0..std::f32::consts::TAU);
            let spd = speed * self.rng.random_range(0.6..1.4);
            self.particles.push(Particle {
                pos,
                vel: from_angle(angle) * spd,
                color,
                life: self.rng.random_range(0.25..0.55),
                size: self.rng.random_range(1.5..3.5),
            });
        }
    }

    fn shake(&mut self, amount: f32, duration: f32) {
        self.shake_amount = amount;
        self.shake_time = duration;
        self.events.push(GameEvent::Shake { amount, duration });
    }

    fn cue(&mut self, cue: SoundCue) {
        self.events.push(GameEvent::Sound(cue));
    }

    fn notify(&mut self, text: String, color: u32, duration: f32) {
        self.events.push(GameEvent::Notify {
            text,
            color,
            duration,
        });
    }
}

/// Detonation radius at a given wave
pub fn detonation_radius(wave: u32) -> f32 {
    80.0 + wave as f32 * 4.0
}

/// Map a uniform roll in [0, 1) onto the weighted pickup table
pub fn roll_pickup_kind(roll: f32) -> PickupKind {
    if roll < 0.40 {
        PickupKind::Health
    } else if roll < 0.58 {
        PickupKind::Shield
    } else if roll < 0.73 {
        PickupKind::Speed
    } else if roll < 0.88 {
        PickupKind::Score
    } else {
        PickupKind::SlowMo
    }
}

/// Score pickup value. Combos above 5 pay 1.5x, rounded down.
pub fn score_pickup_value(combo: u32) -> u64 {
    if combo > 5 {
        (SCORE_PICKUP_BASE as f64 * 1.5).floor() as u64
    } else {
        SCORE_PICKUP_BASE
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::player;
    use crate::tuning::{Ship, StartingStats};

    fn test_player() -> Player {
        player::init(
            Ship::Viper,
            &StartingStats {
                hp: 100.0,
                shield: 0.0,
                speed: 240.0,
                damage: 24.0,
            },
        )
    }

    #[test]
    fn test_burst_particles_fall_and_expire() {
        let mut fx = Effects::new(1);
        fx.burst(Vec2::new(100.0, 100.0), 0xffffff, 20, 100.0);
        assert_eq!(fx.particles.len(), 20);
        let vy0: Vec<f32> = fx.particles.iter().map(|p| p.vel.y).collect();
        fx.update_particles(0.1);
        for (p, v0) in fx.particles.iter().zip(vy0) {
            assert!(p.vel.y > v0);
        }
        fx.update_particles(1.0);
        assert!(fx.particles.is_empty());
    }

    #[test]
    fn test_burst_respects_cap() {
        let mut fx = Effects::new(1);
        fx.burst(Vec2::ZERO, 0, (MAX_PARTICLES + 50) as u32, 10.0);
        assert_eq!(fx.particles.len(), MAX_PARTICLES);
    }

    #[test]
    fn test_explode_mega_close_player_takes_chip() {
        let mut fx = Effects::new(3);
        let mut p = test_player();
        p.pos = Vec2::new(400.0, 300.0);
        let dmg = fx.explode_mega(Vec2::new(410.0, 300.0), 50.0, &mut [], &p, 1);
        assert_eq!(dmg, DETONATION_CHIP_DAMAGE);
    }

    #[test]
    fn test_explode_mega_falloff_bands() {
        let mut fx = Effects::new(3);
        let mut p = test_player();
        p.pos = Vec2::new(400.0, 300.0);
        // Radius at wave 0 is 80
        let mid = fx.explode_mega(Vec2::new(450.0, 300.0), 50.0, &mut [], &p, 0);
        assert!((mid - 15.0).abs() < 1e-5);
        let far = fx.explode_mega(Vec2::new(490.0, 300.0), 50.0, &mut [], &p, 0);
        assert_eq!(far, 0.0);
        // Always shakes and bursts
        assert!(fx.is_shaking());
        assert!(fx.particles.len() >= 60);
    }

    #[test]
    fn test_score_pickup_rounding() {
        assert_eq!(score_pickup_value(5), 15);
        assert_eq!(score_pickup_value(6), 22);
    }

    #[test]
    fn test_pickup_table_thresholds() {
        assert_eq!(roll_pickup_kind(0.0), PickupKind::Health);
        assert_eq!(roll_pickup_kind(0.39), PickupKind::Health);
        assert_eq!(roll_pickup_kind(0.40), PickupKind::Shield);
        assert_eq!(roll_pickup_kind(0.60), PickupKind::Speed);
        assert_eq!(roll_pickup_kind(0.80), PickupKind::Score);
        assert_eq!(roll_pickup_kind(0.95), PickupKind::SlowMo);
    }

    #[test]
    fn test_shield_pickup_raises_floor() {
        let mut fx = Effects::new(0);
        let mut p = test_player();
        let mut stats = RunStats::default();
        let pickup = Pickup {
            kind: PickupKind::Shield,
            pos: p.pos,
            life: 1.0,
            phase: 0.0,
        };
        fx.collect_pickup(&pickup, &mut p, &mut stats, 0);
        assert_eq!(p.max_shield, SHIELD_PICKUP_FLOOR);
        assert_eq!(p.shield, SHIELD_PICKUP_AMOUNT);
    }

    #[test]
    fn test_update_pickups_aggregates() {
        let mut fx = Effects::new(0);
        let mut rng = SimRng::seed_from_u64(9);
        let mut p = test_player();
        let mut stats = RunStats::default();
        fx.spawn_pickup(p.pos, Some(PickupKind::Score), &mut rng);
        fx.spawn_pickup(p.pos + Vec2::new(5.0, 0.0), Some(PickupKind::SlowMo), &mut rng);
        fx.spawn_pickup(p.pos + Vec2::new(200.0, 0.0), Some(PickupKind::Health), &mut rng);

        let result = fx.update_pickups(0.016, &mut p, &mut stats, 7);
        assert_eq!(result.score, 22);
        assert_eq!(result.slowmo, SLOWMO_PICKUP_DURATION);
        assert_eq!(result.collected.len(), 2);
        assert_eq!(fx.pickups.len(), 1);
        assert!(fx
            .drain_events()
            .contains(&GameEvent::Sound(SoundCue::Pickup)));
    }

    #[test]
    fn test_pickups_expire() {
        let mut fx = Effects::new(0);
        let mut rng = SimRng::seed_from_u64(9);
        let mut p = test_player();
        let mut stats = RunStats::default();
        fx.spawn_pickup(Vec2::new(10.0, 10.0), None, &mut rng);
        fx.update_pickups(PICKUP_LIFETIME + 0.1, &mut p, &mut stats, 0);
        assert!(fx.pickups.is_empty());
    }

    #[test]
    fn test_shake_decays_to_zero() {
        let mut fx = Effects::new(0);
        fx.shake(10.0, 0.1);
        let o = fx.update_shake(0.05);
        assert!(o.x.abs() <= 10.0 && o.y.abs() <= 10.0);
        assert_eq!(fx.update_shake(0.06), Vec2::ZERO);
        assert_eq!(fx.update_shake(0.06), Vec2::ZERO);
    }
}
