//! Weapon system
//!
//! Fire-rate gating and per-mode bullet patterns, player bullet physics
//! (homing, ricochet, pierce, mega detonation), the continuous laser,
//! enemy bullets and gravity wells.

use std::collections::VecDeque;
use std::f32::consts::FRAC_PI_2;

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::effects::{Detonation, EffectsSink};
use super::state::{Bullet, Enemy, EnemyBullet, GravityWell, Player, SoundCue};
use crate::consts::{ARENA_HEIGHT, ARENA_WIDTH, CULL_MARGIN};
use crate::tuning::{Ship, StartingStats};
use crate::{dir_to, from_angle, out_of_arena, point_segment_distance};

/// Base projectile speed before the wave bonus
pub const BASE_PROJECTILE_SPEED: f32 = 580.0;
/// Absolute floor on the effective fire interval (s)
pub const MIN_FIRE_INTERVAL: f32 = 0.085;
/// Fire interval multiplier under slow motion
pub const SLOWMO_FIRE_MULT: f32 = 0.35;

pub const BULLET_LIFETIME: f32 = 1.6;
pub const MEGA_LIFETIME: f32 = 2.1;
/// Every Nth standard shot is a mega shot
pub const MEGA_EVERY: u32 = 10;
pub const MEGA_SPEED_MULT: f32 = 0.78;
pub const MEGA_DAMAGE_MULT: f32 = 2.0;
/// Per-hit damage multiplier for piercing bullets
pub const PIERCE_DAMAGE_MULT: f32 = 0.75;
pub const HOMING_ACCEL: f32 = 300.0;
pub const RICOCHET_BOUNCES: u32 = 2;
pub const HIT_FLASH: f32 = 0.08;

pub const SHOTGUN_PELLETS: u32 = 8;
pub const SHOTGUN_SPREAD: f32 = 0.15;
pub const SHOTGUN_SPEED_MULT: f32 = 0.7;
pub const SHOTGUN_DAMAGE_MULT: f32 = 0.6;

pub const LASER_RANGE: f32 = 600.0;
pub const LASER_WARMUP: f32 = 0.1;
/// Extra beam half-width added to each enemy's radius
pub const LASER_WIDTH: f32 = 5.0;

pub const ENEMY_BULLET_LIFETIME: f32 = 4.0;
/// Enemy bullets hit the player inside this radius
pub const ENEMY_BULLET_HIT_RADIUS: f32 = 18.0;

pub const GRAVITY_WELL_RADIUS: f32 = 100.0;
pub const GRAVITY_WELL_STRENGTH: f32 = 150.0;
pub const GRAVITY_WELL_LIFETIME: f32 = 3.0;

/// Firing pattern
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FireMode {
    Single,
    Double,
    Spread,
    Quad,
    Shotgun,
    Laser,
}

impl FireMode {
    /// Discrete-projectile patterns that mega shots apply to
    pub fn is_standard(&self) -> bool {
        matches!(
            self,
            FireMode::Single | FireMode::Double | FireMode::Spread | FireMode::Quad
        )
    }
}

/// Mutable weapon configuration, changed only by upgrades
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Weapon {
    pub mode: FireMode,
    /// Seconds between shots
    pub fire_interval: f32,
    pub damage: f32,
    pub projectile_speed: f32,
    pub piercing: bool,
    pub homing: bool,
    pub mega: bool,
    /// Wall bounces given to each new bullet (0 = no ricochet)
    pub ricochet_bounces: u32,
    pub bullet_size: f32,
    pub shots_fired: u64,
}

/// Continuous beam state
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct LaserState {
    pub active: bool,
    /// Time since the beam switched on (s)
    pub charge: f32,
}

/// Owns every projectile and area effect in flight
#[derive(Debug, Clone)]
pub struct WeaponSystem {
    pub weapon: Weapon,
    pub bullets: Vec<Bullet>,
    pub enemy_bullets: Vec<EnemyBullet>,
    pub gravity_wells: Vec<GravityWell>,
    pub laser: LaserState,
    last_fired: f32,
    mega_counter: u32,
}

/// Speed of a newly fired projectile at `wave`
pub fn wave_speed(base: f32, wave: u32) -> f32 {
    base + wave as f32 * 5.0
}

/// Damage of a newly fired projectile at `wave`
pub fn wave_damage(base: f32, wave: u32) -> f32 {
    let bonus = if wave <= 10 {
        wave as f32 * 1.5
    } else {
        15.0 + (wave - 10) as f32
    };
    base + bonus
}

impl WeaponSystem {
    pub fn init(ship: Ship, start: &StartingStats) -> Self {
        Self {
            weapon: Weapon {
                mode: FireMode::Single,
                fire_interval: ship.stats().fire_interval,
                damage: start.damage,
                projectile_speed: BASE_PROJECTILE_SPEED,
                piercing: false,
                homing: false,
                mega: false,
                ricochet_bounces: 0,
                bullet_size: 1.0,
                shots_fired: 0,
            },
            bullets: Vec::new(),
            enemy_bullets: Vec::new(),
            gravity_wells: Vec::new(),
            laser: LaserState::default(),
            last_fired: f32::MIN,
            mega_counter: 0,
        }
    }

    /// Effective interval between shots
    pub fn effective_interval(&self, slowmo: bool) -> f32 {
        let rate = if slowmo {
            self.weapon.fire_interval * SLOWMO_FIRE_MULT
        } else {
            self.weapon.fire_interval
        };
        rate.max(MIN_FIRE_INTERVAL)
    }

    /// Try to fire at `time` (s). Returns true when a shot went out.
    pub fn fire(
        &mut self,
        time: f32,
        player: &Player,
        wave: u32,
        rapid_strike: bool,
        slowmo: bool,
        fx: &mut impl EffectsSink,
    ) -> bool {
        let interval = self.effective_interval(slowmo);
        if time - self.last_fired < interval && !rapid_strike {
            return false;
        }

        // A rapid strike leaves the gate open for the next regular shot
        self.last_fired = if rapid_strike { time - interval } else { time };

        let speed = wave_speed(self.weapon.projectile_speed, wave);
        let damage = wave_damage(self.weapon.damage, wave);

        match self.weapon.mode {
            FireMode::Shotgun => {
                self.fire_shotgun(player, speed, damage);
                fx.cue(SoundCue::Shotgun);
            }
            FireMode::Laser => self.activate_laser(fx),
            _ => self.fire_standard(player, speed, damage),
        }

        self.weapon.shots_fired += 1;
        fx.cue(SoundCue::Shoot);
        true
    }

    fn fire_shotgun(&mut self, player: &Player, speed: f32, damage: f32) {
        for i in 0..SHOTGUN_PELLETS {
            let spread = (i as f32 - (SHOTGUN_PELLETS - 1) as f32 / 2.0) * SHOTGUN_SPREAD;
            self.create_bullet(
                player.pos,
                player.angle + spread,
                speed * SHOTGUN_SPEED_MULT,
                damage * SHOTGUN_DAMAGE_MULT,
                false,
            );
        }
    }

    fn activate_laser(&mut self, fx: &mut impl EffectsSink) {
        // Holding the trigger keeps the beam warm
        if !self.laser.active {
            self.laser = LaserState {
                active: true,
                charge: 0.0,
            };
            fx.cue(SoundCue::Laser);
        }
    }

    pub fn deactivate_laser(&mut self) {
        self.laser = LaserState::default();
    }

    fn fire_standard(&mut self, player: &Player, speed: f32, damage: f32) {
        let mega = self.weapon.mega && self.mega_counter >= MEGA_EVERY - 1;
        if self.weapon.mega {
            self.mega_counter = if mega { 0 } else { self.mega_counter + 1 };
        }

        let (speed, damage) = if mega {
            (speed * MEGA_SPEED_MULT, damage * MEGA_DAMAGE_MULT)
        } else {
            (speed, damage)
        };

        let ang = player.angle;
        let pos = player.pos;
        match self.weapon.mode {
            FireMode::Double => {
                let side = from_angle(ang + FRAC_PI_2) * 6.0;
                self.create_bullet(pos + side, ang, speed, damage, mega);
                self.create_bullet(pos - side, ang, speed, damage, mega);
            }
            FireMode::Spread => {
                for i in -1..=1 {
                    self.create_bullet(pos, ang + i as f32 * 0.25, speed, damage, mega);
                }
            }
            FireMode::Quad => {
                for i in 0..4 {
                    let offset = from_angle(ang + i as f32 * FRAC_PI_2) * 8.0;
                    self.create_bullet(pos + offset, ang, speed, damage, mega);
                }
            }
            _ => self.create_bullet(pos, ang, speed, damage, mega),
        }
    }

    fn create_bullet(&mut self, pos: Vec2, angle: f32, speed: f32, damage: f32, mega: bool) {
        self.bullets.push(Bullet {
            pos,
            vel: from_angle(angle) * speed,
            damage,
            life: if mega { MEGA_LIFETIME } else { BULLET_LIFETIME },
            piercing: self.weapon.piercing || mega,
            homing: self.weapon.homing,
            mega,
            ricochets_left: self.weapon.ricochet_bounces,
            size: self.weapon.bullet_size,
            trail: VecDeque::new(),
        });
    }

    /// Move bullets and resolve hits against `enemies`.
    /// Returns the mega detonations triggered this tick.
    pub fn update_bullets(
        &mut self,
        dt: f32,
        enemies: &mut [Enemy],
        wave: u32,
        fx: &mut impl EffectsSink,
    ) -> Vec<Detonation> {
        let max_speed = wave_speed(self.weapon.projectile_speed, wave);
        let mut detonations = Vec::new();

        for b in &mut self.bullets {
            b.pos += b.vel * dt;
            b.life -= dt;

            if b.homing {
                if let Some(target) = nearest_living(b.pos, enemies) {
                    b.vel += dir_to(b.pos, target) * HOMING_ACCEL * dt;
                    b.vel = b.vel.clamp_length_max(max_speed);
                }
            }

            if b.ricochets_left > 0 && ricochet(b) {
                b.ricochets_left -= 1;
                fx.cue(SoundCue::Ricochet);
            }

            b.record_trail();

            let mult = if b.piercing { PIERCE_DAMAGE_MULT } else { 1.0 };
            let reach = 3.0 * b.size;
            for e in enemies.iter_mut().filter(|e| e.alive) {
                if b.pos.distance(e.pos) >= e.size + reach {
                    continue;
                }
                e.hp -= b.damage * mult;
                e.hit_flash = HIT_FLASH;
                fx.burst(e.pos, e.color, 5, 60.0);
                fx.cue(SoundCue::EnemyHit);

                if b.mega {
                    detonations.push(Detonation {
                        pos: b.pos,
                        damage: b.damage,
                    });
                }
                if !b.piercing {
                    // Spent
                    b.life = 0.0;
                    break;
                }
            }
        }

        self.bullets
            .retain(|b| b.life > 0.0 && !out_of_arena(b.pos, CULL_MARGIN));

        detonations
    }

    /// Apply beam damage while the laser is on
    pub fn update_laser(
        &mut self,
        dt: f32,
        player: &Player,
        enemies: &mut [Enemy],
        wave: u32,
        fx: &mut impl EffectsSink,
    ) {
        if !self.laser.active {
            return;
        }
        self.laser.charge += dt;
        if self.laser.charge < LASER_WARMUP {
            return;
        }

        let start = player.pos;
        let end = start + from_angle(player.angle) * LASER_RANGE;
        let damage = (self.weapon.damage * 0.5 + wave as f32) * dt * 10.0;

        for e in enemies.iter_mut().filter(|e| e.alive) {
            if point_segment_distance(e.pos, start, end) < e.size + LASER_WIDTH {
                e.hp -= damage;
                fx.burst(e.pos, e.color, 1, 40.0);
            }
        }
    }

    pub fn spawn_enemy_bullet(&mut self, pos: Vec2, angle: f32, speed: f32, damage: f32) {
        self.enemy_bullets.push(EnemyBullet {
            pos,
            vel: from_angle(angle) * speed,
            damage,
            life: ENEMY_BULLET_LIFETIME,
        });
    }

    /// Move enemy bullets. Returns the total damage of bullets that hit the player.
    pub fn update_enemy_bullets(&mut self, dt: f32, player: &Player) -> f32 {
        let mut damage = 0.0;
        for b in &mut self.enemy_bullets {
            b.pos += b.vel * dt;
            b.life -= dt;
            if b.pos.distance(player.pos) < ENEMY_BULLET_HIT_RADIUS {
                damage += b.damage;
                b.life = 0.0;
            }
        }
        self.enemy_bullets
            .retain(|b| b.life > 0.0 && !out_of_arena(b.pos, CULL_MARGIN));
        damage
    }

    pub fn spawn_gravity_well(&mut self, pos: Vec2, fx: &mut impl EffectsSink) {
        self.gravity_wells.push(GravityWell {
            pos,
            radius: GRAVITY_WELL_RADIUS,
            strength: GRAVITY_WELL_STRENGTH,
            life: GRAVITY_WELL_LIFETIME,
            max_life: GRAVITY_WELL_LIFETIME,
        });
        fx.cue(SoundCue::GravityWell);
    }

    /// Pull living enemies toward each well, linear falloff to the rim
    pub fn update_gravity_wells(&mut self, dt: f32, enemies: &mut [Enemy]) {
        for w in &mut self.gravity_wells {
            w.life -= dt;
            if w.life <= 0.0 {
                continue;
            }
            for e in enemies.iter_mut().filter(|e| e.alive) {
                let d = e.pos.distance(w.pos);
                if d < w.radius {
                    let pull = w.strength * (1.0 - d / w.radius);
                    e.pos += dir_to(e.pos, w.pos) * pull * dt;
                }
            }
        }
        self.gravity_wells.retain(|w| w.life > 0.0);
    }
}

/// Position of the closest living enemy
fn nearest_living(from: Vec2, enemies: &[Enemy]) -> Option<Vec2> {
    enemies
        .iter()
        .filter(|e| e.alive)
        .map(|e| e.pos)
        .min_by(|a, b| from.distance_squared(*a).total_cmp(&from.distance_squared(*b)))
}

/// Reflect off the arena walls. Returns true if the bullet bounced.
fn ricochet(b: &mut Bullet) -> bool {
    let mut bounced = false;
    if b.pos.x < 0.0 || b.pos.x > ARENA_WIDTH {
        b.vel.x = -b.vel.x;
        b.pos.x = b.pos.x.clamp(0.0, ARENA_WIDTH);
        bounced = true;
    }
    if b.pos.y < 0.0 || b.pos.y > ARENA_HEIGHT {
        b.vel.y = -b.vel.y;
        b.pos.y = b.pos.y.clamp(0.0, ARENA_HEIGHT);
        bounced = true;
    }
    bounced
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::effects::Effects;
    use crate::sim::enemy::test_enemy;
    use crate::sim::player;
    use crate::sim::state::EnemyKind;

    fn setup() -> (WeaponSystem, Player, Effects) {
        let start = StartingStats {
            hp: 100.0,
            shield: 0.0,
            speed: 240.0,
            damage: 20.0,
        };
        (
            WeaponSystem::init(Ship::Viper, &start),
            player::init(Ship::Viper, &start),
            Effects::new(0),
        )
    }

    #[test]
    fn test_fire_rate_gate() {
        let (mut ws, p, mut fx) = setup();
        assert!(ws.fire(1.0, &p, 1, false, false, &mut fx));
        assert!(!ws.fire(1.05, &p, 1, false, false, &mut fx));
        assert!(ws.fire(1.2, &p, 1, false, false, &mut fx));
        assert_eq!(ws.bullets.len(), 2);
        assert_eq!(ws.weapon.shots_fired, 2);
    }

    #[test]
    fn test_rapid_strike_bypasses_gate() {
        let (mut ws, p, mut fx) = setup();
        assert!(ws.fire(1.0, &p, 1, false, false, &mut fx));
        assert!(ws.fire(1.01, &p, 1, true, false, &mut fx));
        // Gate was left open by the rapid strike
        assert!(ws.fire(1.02, &p, 1, false, false, &mut fx));
    }

    #[test]
    fn test_slowmo_interval_floor() {
        let (mut ws, _, _) = setup();
        ws.weapon.fire_interval = 0.1;
        assert_eq!(ws.effective_interval(true), MIN_FIRE_INTERVAL);
        assert_eq!(ws.effective_interval(false), 0.1);
    }

    #[test]
    fn test_wave_scaling() {
        assert_eq!(wave_damage(20.0, 4), 26.0);
        assert_eq!(wave_damage(20.0, 10), 35.0);
        assert_eq!(wave_damage(20.0, 13), 38.0);
        assert_eq!(wave_speed(580.0, 2), 590.0);
    }

    #[test]
    fn test_patterns() {
        let (mut ws, p, mut fx) = setup();
        for (mode, count) in [
            (FireMode::Single, 1),
            (FireMode::Double, 2),
            (FireMode::Spread, 3),
            (FireMode::Quad, 4),
            (FireMode::Shotgun, 8),
        ] {
            ws.bullets.clear();
            ws.weapon.mode = mode;
            ws.last_fired = f32::MIN;
            assert!(ws.fire(0.0, &p, 0, false, false, &mut fx));
            assert_eq!(ws.bullets.len(), count, "{mode:?}");
        }
    }

    #[test]
    fn test_every_tenth_shot_is_mega() {
        let (mut ws, p, mut fx) = setup();
        ws.weapon.mega = true;
        for i in 0..20 {
            ws.fire(i as f32, &p, 0, false, false, &mut fx);
        }
        let megas: Vec<usize> = ws
            .bullets
            .iter()
            .enumerate()
            .filter(|(_, b)| b.mega)
            .map(|(i, _)| i)
            .collect();
        assert_eq!(megas, vec![9, 19]);
        let m = &ws.bullets[9];
        assert!(m.piercing);
        assert_eq!(m.damage, 40.0);
        assert_eq!(m.life, MEGA_LIFETIME);
    }

    #[test]
    fn test_laser_holds_charge_while_held() {
        let (mut ws, p, mut fx) = setup();
        ws.weapon.mode = FireMode::Laser;
        assert!(ws.fire(0.0, &p, 0, false, false, &mut fx));
        assert!(ws.laser.active);
        ws.update_laser(0.05, &p, &mut [], 0, &mut fx);
        ws.fire(1.0, &p, 0, false, false, &mut fx);
        assert_eq!(ws.laser.charge, 0.05);
        ws.deactivate_laser();
        assert!(!ws.laser.active);
        assert!(ws.bullets.is_empty());
    }

    #[test]
    fn test_laser_damages_along_beam() {
        let (mut ws, mut p, mut fx) = setup();
        ws.weapon.mode = FireMode::Laser;
        p.angle = 0.0;
        let mut enemies = vec![
            test_enemy(EnemyKind::Drone, p.pos + Vec2::new(200.0, 3.0), 100.0),
            test_enemy(EnemyKind::Drone, p.pos + Vec2::new(0.0, 200.0), 100.0),
        ];
        ws.fire(0.0, &p, 0, false, false, &mut fx);
        // Warm-up tick does nothing
        ws.update_laser(0.05, &p, &mut enemies, 0, &mut fx);
        assert_eq!(enemies[0].hp, 100.0);
        ws.update_laser(0.1, &p, &mut enemies, 0, &mut fx);
        assert!(enemies[0].hp < 100.0);
        assert_eq!(enemies[1].hp, 100.0);
    }

    #[test]
    fn test_non_piercing_bullet_consumed() {
        let (mut ws, p, mut fx) = setup();
        let mut enemies = vec![test_enemy(EnemyKind::Drone, p.pos + Vec2::new(10.0, 0.0), 100.0)];
        ws.fire(0.0, &p, 0, false, false, &mut fx);
        ws.update_bullets(0.001, &mut enemies, 0, &mut fx);
        assert!(ws.bullets.is_empty());
        assert_eq!(enemies[0].hp, 80.0);
        assert_eq!(enemies[0].hit_flash, HIT_FLASH);
    }

    #[test]
    fn test_ricochet_bounces_then_culls() {
        let (mut ws, _, mut fx) = setup();
        ws.weapon.ricochet_bounces = RICOCHET_BOUNCES;
        ws.create_bullet(Vec2::new(ARENA_WIDTH - 1.0, 300.0), 0.0, 600.0, 1.0, false);
        ws.update_bullets(0.01, &mut [], 0, &mut fx);
        let b = &ws.bullets[0];
        assert!(b.vel.x < 0.0);
        assert_eq!(b.ricochets_left, 1);
    }

    #[test]
    fn test_bullets_culled_out_of_bounds() {
        let (mut ws, _, mut fx) = setup();
        ws.create_bullet(Vec2::new(ARENA_WIDTH + 19.0, 300.0), 0.0, 600.0, 1.0, false);
        ws.update_bullets(0.01, &mut [], 0, &mut fx);
        assert!(ws.bullets.is_empty());
    }

    #[test]
    fn test_enemy_bullets_hit_player() {
        let (mut ws, p, _) = setup();
        ws.spawn_enemy_bullet(p.pos + Vec2::new(-30.0, 0.0), 0.0, 300.0, 12.0);
        ws.spawn_enemy_bullet(p.pos + Vec2::new(0.0, -300.0), 0.0, 300.0, 12.0);
        let dmg = ws.update_enemy_bullets(0.05, &p);
        assert_eq!(dmg, 12.0);
        assert_eq!(ws.enemy_bullets.len(), 1);
    }

    #[test]
    fn test_gravity_well_pulls_and_expires() {
        let (mut ws, _, mut fx) = setup();
        let center = Vec2::new(400.0, 300.0);
        ws.spawn_gravity_well(center, &mut fx);
        let mut enemies = vec![
            test_enemy(EnemyKind::Drone, center + Vec2::new(50.0, 0.0), 10.0),
            test_enemy(EnemyKind::Drone, center + Vec2::new(150.0, 0.0), 10.0),
        ];
        ws.update_gravity_wells(0.1, &mut enemies);
        assert!(enemies[0].pos.x < center.x + 50.0);
        assert_eq!(enemies[1].pos.x, center.x + 150.0);
        ws.update_gravity_wells(GRAVITY_WELL_LIFETIME, &mut enemies);
        assert!(ws.gravity_wells.is_empty());
    }
}
