//! Enemy system
//!
//! Spawn stats for every enemy kind, the per-kind behavior state machines,
//! contact damage and the death hand-off.
//!
//! Behaviors never mutate the collection they are iterating. Anything that
//! needs another entity (shots, spawns, heals, detonations) is recorded as
//! an [`EnemyAction`] and applied once the pass is over.

use std::f32::consts::{PI, TAU};

use glam::Vec2;
use rand::Rng;

use super::effects::{Detonation, EffectsSink};
use super::state::{
    Behavior, BossPhase, Enemy, EnemyKind, Player, SimRng, SniperWarning, SoundCue,
};
use crate::consts::{ARENA_HEIGHT, ARENA_WIDTH, ENEMY_MARGIN};
use crate::difficulty::Difficulty;
use crate::{angle_to, arena_center, clamp_to_arena, dir_to, from_angle};

/// Contact range is enemy size plus this margin
pub const CONTACT_MARGIN: f32 = 18.0;
/// Spawns happen this far outside the arena
const SPAWN_OFFSET: f32 = 30.0;

const SNIPER_MIN_RANGE: f32 = 180.0;
const SNIPER_CHARGE: f32 = 0.6;
const SWARM_FLEE_DISTANCE: f32 = 100.0;
const HEAL_INTERVAL: f32 = 2.0;
const HEAL_RADIUS: f32 = 120.0;
const HEAL_AMOUNT: f32 = 25.0;
const SPAWNER_INTERVAL: f32 = 4.0;
const SPAWNER_MAX: u32 = 3;
const SPAWNER_JITTER: f32 = 30.0;
const BOMBER_TRIGGER: f32 = 25.0;
const TELEPORT_INTERVAL: f32 = 2.5;
const TELEPORT_INSET: f32 = 50.0;
const KAMIKAZE_TRIGGER: f32 = 150.0;
const KAMIKAZE_CHARGE_SPEED: f32 = 280.0;
const ARTILLERY_MIN_RANGE: f32 = 200.0;
const ARTILLERY_INTERVAL: f32 = 1.8;
const BOSS3_INSET: f32 = 100.0;
const BOSS3_ADDS: u32 = 3;
const BOSS3_ADD_INTERVAL: f32 = 8.0;
const MINIBOSS_INTERVAL: f32 = 1.8;

/// Fixed per-kind numbers
#[derive(Debug, Clone, Copy)]
pub struct EnemyProfile {
    pub base_hp: f32,
    pub hp_per_wave: f32,
    /// Growth per wave past 10
    pub late_mult: f32,
    pub size: f32,
    pub color: u32,
    pub contact_damage: f32,
}

impl EnemyKind {
    pub fn profile(&self) -> EnemyProfile {
        let p = |base_hp, hp_per_wave, late_mult, size, color, contact_damage| EnemyProfile {
            base_hp,
            hp_per_wave,
            late_mult,
            size,
            color,
            contact_damage,
        };
        match self {
            EnemyKind::Drone => p(30.0, 12.0, 1.12, 14.0, 0x44aaff, 10.0),
            EnemyKind::Scout => p(18.0, 7.0, 1.12, 9.0, 0x88ff44, 6.0),
            EnemyKind::Tank => p(120.0, 30.0, 1.12, 26.0, 0xff4444, 12.0),
            EnemyKind::Shield => p(55.0, 15.0, 1.12, 20.0, 0xffaa00, 10.0),
            EnemyKind::Swarm => p(70.0, 18.0, 1.12, 18.0, 0xff88ff, 8.0),
            EnemyKind::Sniper => p(40.0, 11.0, 1.12, 12.0, 0x00ffff, 10.0),
            EnemyKind::Healer => p(50.0, 12.0, 1.12, 16.0, 0x00ff88, 8.0),
            EnemyKind::Spawner => p(80.0, 22.0, 1.12, 22.0, 0xffff00, 10.0),
            EnemyKind::Bomber => p(35.0, 9.0, 1.12, 13.0, 0xff6600, 8.0),
            EnemyKind::Teleporter => p(45.0, 11.0, 1.12, 14.0, 0xff00ff, 10.0),
            EnemyKind::Kamikaze => p(25.0, 8.0, 1.12, 11.0, 0xff2266, 10.0),
            EnemyKind::Artillery => p(60.0, 15.0, 1.12, 18.0, 0x8844ff, 8.0),
            EnemyKind::Boss1 => p(800.0, 220.0, 1.15, 45.0, 0xff0066, 15.0),
            EnemyKind::Boss2 => p(900.0, 250.0, 1.15, 48.0, 0x00ff88, 15.0),
            EnemyKind::Boss3 => p(750.0, 200.0, 1.15, 42.0, 0xff8800, 15.0),
            EnemyKind::MiniBoss => p(350.0, 110.0, 1.14, 35.0, 0xff44ff, 12.0),
        }
    }

    /// Movement speed at `wave`, before the difficulty multiplier
    pub fn speed(&self, wave: u32) -> f32 {
        let w = wave as f32;
        let late = wave.saturating_sub(10) as f32;
        match self {
            EnemyKind::Drone => 90.0 + w * 3.0,
            EnemyKind::Scout => 155.0 + w * 4.0,
            EnemyKind::Tank => 52.0 + w,
            EnemyKind::Shield => 48.0 + w,
            EnemyKind::Swarm => 75.0 + w * 3.0,
            EnemyKind::Sniper => 65.0 + w * 2.0,
            EnemyKind::Healer => 60.0 + w * 2.0,
            EnemyKind::Spawner => 55.0 + w,
            EnemyKind::Bomber => 85.0 + w * 3.0,
            EnemyKind::Teleporter => 70.0 + w * 2.0,
            EnemyKind::Kamikaze => 100.0 + w * 3.0,
            EnemyKind::Artillery => 50.0 + w,
            EnemyKind::Boss1 => 85.0 + late * 2.0,
            EnemyKind::Boss2 => 95.0 + late * 2.0,
            EnemyKind::Boss3 => 100.0 + late * 2.0,
            EnemyKind::MiniBoss => 80.0 + late * 1.5,
        }
    }

    /// Score for killing one at `wave`, before the difficulty multiplier
    pub fn score(&self, wave: u32) -> u32 {
        let (base, per_wave) = match self {
            EnemyKind::Drone => (10, 2),
            EnemyKind::Scout => (15, 2),
            EnemyKind::Tank => (35, 3),
            EnemyKind::Shield => (25, 2),
            EnemyKind::Swarm => (28, 3),
            EnemyKind::Sniper => (30, 3),
            EnemyKind::Healer => (40, 4),
            EnemyKind::Spawner => (50, 5),
            EnemyKind::Bomber => (35, 3),
            EnemyKind::Teleporter => (38, 3),
            EnemyKind::Kamikaze => (30, 3),
            EnemyKind::Artillery => (45, 4),
            EnemyKind::Boss1 => (500, 50),
            EnemyKind::Boss2 => (600, 60),
            EnemyKind::Boss3 => (550, 55),
            EnemyKind::MiniBoss => (300, 40),
        };
        base + per_wave * wave
    }

    /// Behavior payload a fresh spawn starts with
    fn initial_behavior(&self) -> Behavior {
        match self {
            EnemyKind::Drone | EnemyKind::Scout | EnemyKind::Tank => Behavior::Chaser,
            EnemyKind::Shield => Behavior::Shielded { shield_angle: 0.0 },
            EnemyKind::Swarm => Behavior::Swarm,
            EnemyKind::Sniper => Behavior::Sniper {
                min_range: SNIPER_MIN_RANGE,
                charge_target: None,
                charge_time: 0.0,
            },
            EnemyKind::Healer => Behavior::Healer {
                heal_timer: HEAL_INTERVAL,
            },
            EnemyKind::Spawner => Behavior::Spawner {
                spawn_timer: SPAWNER_INTERVAL,
                spawned: 0,
            },
            EnemyKind::Bomber => Behavior::Bomber,
            EnemyKind::Teleporter => Behavior::Teleporter {
                teleport_timer: TELEPORT_INTERVAL,
            },
            EnemyKind::Kamikaze => Behavior::Kamikaze {
                charging: false,
                charge_speed: KAMIKAZE_CHARGE_SPEED,
            },
            EnemyKind::Artillery => Behavior::Artillery {
                min_range: ARTILLERY_MIN_RANGE,
                shoot_timer: ARTILLERY_INTERVAL,
                turret_angle: 0.0,
            },
            EnemyKind::Boss1 => Behavior::Boss1 {
                phase: BossPhase::One,
                orbit_angle: 0.0,
                volley_timer: 5.0,
            },
            EnemyKind::Boss2 => Behavior::Boss2 {
                phase: BossPhase::One,
                spiral_angle: 0.0,
                shoot_timer: 1.2,
            },
            EnemyKind::Boss3 => Behavior::Boss3 {
                phase: BossPhase::One,
                shoot_timer: 1.0,
                spawn_timer: BOSS3_ADD_INTERVAL,
                retarget_timer: 0.0,
                target: None,
            },
            EnemyKind::MiniBoss => Behavior::MiniBoss {
                orbit_angle: 0.0,
                pulse: 0.0,
                shoot_timer: MINIBOSS_INTERVAL,
            },
        }
    }
}

/// Hybrid HP curve: linear through wave 10, then exponential from the
/// wave-10 value, floored.
pub fn enemy_hp(base: f32, per_wave: f32, wave: u32, late_mult: f32) -> f32 {
    if wave <= 10 {
        return base + wave as f32 * per_wave;
    }
    let anchor = base as f64 + 10.0 * per_wave as f64;
    (anchor * (late_mult as f64).powi((wave - 10) as i32)).floor() as f32
}

/// An enemy projectile request
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EnemyShot {
    pub pos: Vec2,
    pub angle: f32,
    pub speed: f32,
    /// Undifficulted damage
    pub damage: f32,
}

/// Deferred side effect of a behavior
#[derive(Debug, Clone)]
enum EnemyAction {
    Fire(EnemyShot),
    SpawnDrone(Vec2),
    SpawnMany(EnemyKind, u32),
    Heal { source: u32, origin: Vec2 },
    Detonate(Detonation),
    Warn(SniperWarning),
}

/// What an update pass produced for the orchestrator
#[derive(Debug, Clone, Default)]
pub struct EnemyUpdate {
    /// Enemies found at hp <= 0, already removed from the collection
    pub killed: Vec<Enemy>,
    /// Projectiles to spawn, damage already scaled by difficulty
    pub shots: Vec<EnemyShot>,
    /// Area blasts to resolve, damage already scaled by difficulty
    pub detonations: Vec<Detonation>,
}

/// Owns every living enemy
#[derive(Debug, Clone)]
pub struct EnemySystem {
    pub enemies: Vec<Enemy>,
    pub sniper_warnings: Vec<SniperWarning>,
    current_boss: Option<u32>,
    next_id: u32,
    difficulty: Difficulty,
}

impl EnemySystem {
    pub fn new(difficulty: Difficulty) -> Self {
        Self {
            enemies: Vec::new(),
            sniper_warnings: Vec::new(),
            current_boss: None,
            next_id: 1,
            difficulty,
        }
    }

    pub fn difficulty(&self) -> Difficulty {
        self.difficulty
    }

    /// The boss currently tracked for UI and targeting
    pub fn current_boss(&self) -> Option<&Enemy> {
        let id = self.current_boss?;
        self.enemies.iter().find(|e| e.id == id && e.alive)
    }

    pub fn living(&self) -> impl Iterator<Item = &Enemy> {
        self.enemies.iter().filter(|e| e.alive)
    }

    pub fn living_count(&self) -> usize {
        self.living().count()
    }

    /// Spawn just outside a random arena edge. Returns the new enemy's id.
    pub fn spawn(&mut self, kind: EnemyKind, wave: u32, rng: &mut SimRng) -> u32 {
        let pos = edge_position(rng);
        self.spawn_at(kind, wave, pos)
    }

    /// Spawn at an explicit position
    pub fn spawn_at(&mut self, kind: EnemyKind, wave: u32, pos: Vec2) -> u32 {
        let enemy = self.build(kind, wave, pos);
        let id = enemy.id;
        if kind.is_boss() {
            log::info!("Boss {} spawned with {:.0} hp", kind.name(), enemy.max_hp);
            self.current_boss = Some(id);
        } else {
            log::debug!("Spawned {} ({:.0} hp) at wave {}", kind.name(), enemy.max_hp, wave);
        }
        self.enemies.push(enemy);
        id
    }

    fn build(&mut self, kind: EnemyKind, wave: u32, pos: Vec2) -> Enemy {
        let profile = kind.profile();
        let hp_mult = if kind.is_boss() || kind == EnemyKind::MiniBoss {
            self.difficulty.boss_hp()
        } else {
            self.difficulty.enemy_hp()
        };
        let hp = (enemy_hp(profile.base_hp, profile.hp_per_wave, wave, profile.late_mult)
            * hp_mult)
            .round()
            .max(1.0);
        let speed_mult = self.difficulty.enemy_speed();

        let mut behavior = kind.initial_behavior();
        if let Behavior::Kamikaze { charge_speed, .. } = &mut behavior {
            *charge_speed *= speed_mult;
        }

        let id = self.next_id;
        self.next_id += 1;

        Enemy {
            id,
            kind,
            pos,
            angle: 0.0,
            hp,
            max_hp: hp,
            speed: kind.speed(wave) * speed_mult,
            size: profile.size,
            score: kind.score(wave),
            alive: true,
            hit_flash: 0.0,
            anim: 0.0,
            color: profile.color,
            behavior,
        }
    }

    /// A spawner's reduced drone
    fn spawn_minion(&mut self, pos: Vec2, wave: u32) {
        let mut drone = self.build(EnemyKind::Drone, wave, pos);
        let hp = ((20 + 5 * wave) as f32 * self.difficulty.enemy_hp()).round().max(1.0);
        drone.hp = hp;
        drone.max_hp = hp;
        drone.size = 12.0;
        drone.score = 8 + wave;
        self.enemies.push(drone);
    }

    /// Run one behavior pass over every enemy
    pub fn update(
        &mut self,
        dt: f32,
        player: &Player,
        wave: u32,
        rng: &mut SimRng,
        fx: &mut impl EffectsSink,
    ) -> EnemyUpdate {
        let mut result = EnemyUpdate::default();
        let mut actions = Vec::new();

        self.enemies.retain(|e| e.alive);

        for e in &mut self.enemies {
            if e.hp <= 0.0 {
                e.alive = false;
                result.killed.push(e.clone());
                continue;
            }

            e.anim += dt;
            e.hit_flash = (e.hit_flash - dt).max(0.0);

            let mut ctx = BehaviorCtx {
                dt,
                player: player.pos,
                wave,
                rng: &mut *rng,
                fx: &mut *fx,
                out: &mut actions,
            };
            run_behavior(e, &mut ctx);

            e.pos = clamp_to_arena(e.pos, ENEMY_MARGIN);
        }

        if let Some(boss) = self.current_boss {
            if result.killed.iter().any(|e| e.id == boss) {
                self.current_boss = None;
            }
        }

        let damage_mult = self.difficulty.enemy_damage();
        for action in actions {
            match action {
                EnemyAction::Fire(shot) => result.shots.push(EnemyShot {
                    damage: shot.damage * damage_mult,
                    ..shot
                }),
                EnemyAction::Detonate(d) => result.detonations.push(Detonation {
                    damage: d.damage * damage_mult,
                    ..d
                }),
                EnemyAction::Warn(w) => self.sniper_warnings.push(w),
                EnemyAction::Heal { source, origin } => {
                    for other in self.enemies.iter_mut() {
                        if other.id == source || !other.alive || other.hp <= 0.0 {
                            continue;
                        }
                        if other.pos.distance(origin) < HEAL_RADIUS && other.hp < other.max_hp {
                            other.heal(HEAL_AMOUNT);
                            fx.burst(other.pos, 0x00ff88, 8, 80.0);
                        }
                    }
                }
                EnemyAction::SpawnDrone(pos) => {
                    self.spawn_minion(pos, wave);
                    fx.burst(pos, 0xffff00, 12, 100.0);
                }
                EnemyAction::SpawnMany(kind, count) => {
                    for _ in 0..count {
                        self.spawn(kind, wave, rng);
                    }
                }
            }
        }

        self.enemies.retain(|e| e.alive);

        for w in &mut self.sniper_warnings {
            w.remaining -= dt;
        }
        self.sniper_warnings.retain(|w| w.remaining > 0.0);

        result
    }

    /// Total contact damage from every enemy touching the player this tick
    pub fn check_player_collision(&self, player: &Player) -> f32 {
        let total: f32 = self
            .living()
            .filter(|e| e.pos.distance(player.pos) < e.size + CONTACT_MARGIN)
            .map(|e| e.kind.profile().contact_damage)
            .sum();
        total * self.difficulty.enemy_damage()
    }

    /// Remove everything (run reset)
    pub fn clear(&mut self) {
        self.enemies.clear();
        self.sniper_warnings.clear();
        self.current_boss = None;
    }
}

/// Random point just outside one of the four arena edges
fn edge_position(rng: &mut SimRng) -> Vec2 {
    match rng.random_range(0..4) {
        0 => Vec2::new(rng.random_range(0.0..ARENA_WIDTH), -SPAWN_OFFSET),
        1 => Vec2::new(ARENA_WIDTH + SPAWN_OFFSET, rng.random_range(0.0..ARENA_HEIGHT)),
        2 => Vec2::new(rng.random_range(0.0..ARENA_WIDTH), ARENA_HEIGHT + SPAWN_OFFSET),
        _ => Vec2::new(-SPAWN_OFFSET, rng.random_range(0.0..ARENA_HEIGHT)),
    }
}

struct BehaviorCtx<'a, F> {
    dt: f32,
    player: Vec2,
    wave: u32,
    rng: &'a mut SimRng,
    fx: &'a mut F,
    out: &'a mut Vec<EnemyAction>,
}

impl<F: EffectsSink> BehaviorCtx<'_, F> {
    fn fire(&mut self, pos: Vec2, angle: f32, speed: f32, damage: f32) {
        self.out.push(EnemyAction::Fire(EnemyShot {
            pos,
            angle,
            speed,
            damage,
        }));
    }
}

fn step_toward(e: &mut Enemy, target: Vec2, speed: f32, dt: f32) {
    e.pos += dir_to(e.pos, target) * speed * dt;
}

fn step_away(e: &mut Enemy, from: Vec2, speed: f32, dt: f32) {
    e.pos += dir_to(from, e.pos) * speed * dt;
}

/// Keep between `near` and `far` of the target
fn hold_band(e: &mut Enemy, target: Vec2, near: f32, far: f32, dt: f32) {
    let d = e.pos.distance(target);
    if d < near {
        step_away(e, target, e.speed, dt);
    } else if d > far {
        step_toward(e, target, e.speed, dt);
    }
}

/// One-way phase flip at an hp threshold. Returns true on the flip.
fn escalate(phase: &mut BossPhase, hp: f32, max_hp: f32, threshold: f32) -> bool {
    if *phase == BossPhase::One && hp < max_hp * threshold {
        *phase = BossPhase::Two;
        true
    } else {
        false
    }
}

fn run_behavior<F: EffectsSink>(e: &mut Enemy, ctx: &mut BehaviorCtx<'_, F>) {
    let dt = ctx.dt;
    let target = ctx.player;
    e.angle = angle_to(e.pos, target);

    // Payload is taken out so the common fields stay borrowable
    let mut behavior = std::mem::replace(&mut e.behavior, Behavior::Chaser);

    match &mut behavior {
        Behavior::Chaser => step_toward(e, target, e.speed, dt),
        Behavior::Shielded { shield_angle } => {
            *shield_angle = (*shield_angle + dt * PI) % TAU;
            step_toward(e, target, e.speed, dt);
        }
        Behavior::Swarm => {
            if e.pos.distance(target) < SWARM_FLEE_DISTANCE {
                step_away(e, target, e.speed, dt);
            } else {
                step_toward(e, target, e.speed, dt);
            }
        }
        Behavior::Sniper {
            min_range,
            charge_target,
            charge_time,
        } => {
            let d = e.pos.distance(target);
            if d < *min_range {
                step_away(e, target, e.speed, dt);
            }
            if charge_target.is_none() && d >= *min_range {
                *charge_target = Some(target);
                *charge_time = 0.0;
                ctx.out.push(EnemyAction::Warn(SniperWarning {
                    pos: target,
                    remaining: SNIPER_CHARGE,
                }));
            }
            if let Some(aim) = *charge_target {
                *charge_time += dt;
                if *charge_time >= SNIPER_CHARGE {
                    ctx.fire(e.pos, angle_to(e.pos, aim), 350.0, 12.0);
                    *charge_target = None;
                }
            }
        }
        Behavior::Healer { heal_timer } => {
            hold_band(e, target, 140.0, 180.0, dt);
            *heal_timer -= dt;
            if *heal_timer <= 0.0 {
                *heal_timer = HEAL_INTERVAL;
                ctx.out.push(EnemyAction::Heal {
                    source: e.id,
                    origin: e.pos,
                });
            }
        }
        Behavior::Spawner {
            spawn_timer,
            spawned,
        } => {
            hold_band(e, target, 160.0, 200.0, dt);
            *spawn_timer -= dt;
            if *spawn_timer <= 0.0 && *spawned < SPAWNER_MAX {
                *spawn_timer = SPAWNER_INTERVAL;
                *spawned += 1;
                let jitter = Vec2::new(
                    ctx.rng.random_range(-SPAWNER_JITTER..SPAWNER_JITTER),
                    ctx.rng.random_range(-SPAWNER_JITTER..SPAWNER_JITTER),
                );
                ctx.out.push(EnemyAction::SpawnDrone(e.pos + jitter));
            }
        }
        Behavior::Bomber => {
            step_toward(e, target, e.speed, dt);
            if e.pos.distance(target) < BOMBER_TRIGGER {
                ctx.out.push(EnemyAction::Detonate(Detonation {
                    pos: e.pos,
                    damage: bomber_blast(ctx.wave),
                }));
                // Self-destruct: no score, no loot
                e.alive = false;
            }
        }
        Behavior::Teleporter { teleport_timer } => {
            *teleport_timer -= dt;
            if *teleport_timer <= 0.0 {
                *teleport_timer = TELEPORT_INTERVAL;
                e.pos = Vec2::new(
                    ctx.rng
                        .random_range(TELEPORT_INSET..ARENA_WIDTH - TELEPORT_INSET),
                    ctx.rng
                        .random_range(TELEPORT_INSET..ARENA_HEIGHT - TELEPORT_INSET),
                );
                ctx.fx.burst(e.pos, e.color, 15, 120.0);
                ctx.fx.cue(SoundCue::Teleport);
            }
        }
        Behavior::Kamikaze {
            charging,
            charge_speed,
        } => {
            if e.pos.distance(target) < KAMIKAZE_TRIGGER {
                *charging = true;
            }
            let speed = if *charging { *charge_speed } else { e.speed };
            step_toward(e, target, speed, dt);
        }
        Behavior::Artillery {
            min_range,
            shoot_timer,
            turret_angle,
        } => {
            let d = e.pos.distance(target);
            if d < *min_range {
                step_away(e, target, e.speed, dt);
            }
            *turret_angle = angle_to(e.pos, target);
            *shoot_timer -= dt;
            if *shoot_timer <= 0.0 && d >= *min_range {
                *shoot_timer = ARTILLERY_INTERVAL;
                ctx.fire(e.pos, *turret_angle, 280.0, 10.0);
            }
        }
        Behavior::Boss1 {
            phase,
            orbit_angle,
            volley_timer,
        } => {
            if escalate(phase, e.hp, e.max_hp, 0.4) {
                log::info!("Boss {} enters phase 2", e.kind.name());
                *volley_timer = volley_timer.min(3.0);
            }
            *orbit_angle += dt * 0.8;
            let anchor = arena_center() + from_angle(*orbit_angle) * 150.0;
            step_toward(e, anchor, e.speed, dt);

            *volley_timer -= dt;
            if *volley_timer <= 0.0 {
                let (count, interval) = match phase {
                    BossPhase::One => (6, 5.0),
                    BossPhase::Two => (8, 3.0),
                };
                *volley_timer = interval;
                let aim = angle_to(e.pos, target);
                for i in 0..count {
                    let a = aim + i as f32 / count as f32 * TAU;
                    ctx.fire(e.pos, a, 200.0, 15.0);
                }
            }
        }
        Behavior::Boss2 {
            phase,
            spiral_angle,
            shoot_timer,
        } => {
            if escalate(phase, e.hp, e.max_hp, 0.45) {
                log::info!("Boss {} enters phase 2", e.kind.name());
                *shoot_timer = 0.7;
            }
            *spiral_angle += dt * 1.5;
            let radius = 100.0 + (*spiral_angle * 0.5).sin() * 80.0;
            e.pos = arena_center() + from_angle(*spiral_angle) * radius;

            *shoot_timer -= dt;
            if *shoot_timer <= 0.0 {
                let (count, interval) = match phase {
                    BossPhase::One => (3, 1.2),
                    BossPhase::Two => (5, 0.7),
                };
                *shoot_timer = interval;
                for i in 0..count {
                    let a = *spiral_angle + i as f32 / count as f32 * TAU;
                    ctx.fire(e.pos, a, 180.0, 14.0);
                }
            }
        }
        Behavior::Boss3 {
            phase,
            shoot_timer,
            spawn_timer,
            retarget_timer,
            target: wander,
        } => {
            if escalate(phase, e.hp, e.max_hp, 0.5) {
                log::info!("Boss {} enters phase 2", e.kind.name());
                *shoot_timer = 0.6;
            }

            *retarget_timer -= dt;
            if *retarget_timer <= 0.0 {
                *retarget_timer = ctx.rng.random_range(1.5..3.5);
                *wander = Some(Vec2::new(
                    ctx.rng.random_range(BOSS3_INSET..ARENA_WIDTH - BOSS3_INSET),
                    ctx.rng.random_range(BOSS3_INSET..ARENA_HEIGHT - BOSS3_INSET),
                ));
            }
            if let Some(goal) = *wander {
                step_toward(e, goal, e.speed, dt);
            }

            *shoot_timer -= dt;
            if *shoot_timer <= 0.0 {
                *shoot_timer = match phase {
                    BossPhase::One => 1.0,
                    BossPhase::Two => 0.6,
                };
                ctx.fire(e.pos, angle_to(e.pos, target), 250.0, 15.0);
            }

            if *phase == BossPhase::Two {
                *spawn_timer -= dt;
                if *spawn_timer <= 0.0 {
                    *spawn_timer = BOSS3_ADD_INTERVAL;
                    ctx.out.push(EnemyAction::SpawnMany(EnemyKind::Scout, BOSS3_ADDS));
                }
            }
        }
        Behavior::MiniBoss {
            orbit_angle,
            pulse,
            shoot_timer,
        } => {
            *pulse += dt * 2.0;
            *orbit_angle += dt * 1.2;
            let radius = 120.0 + pulse.sin() * 40.0;
            let anchor = arena_center() + from_angle(*orbit_angle) * radius;
            step_toward(e, anchor, e.speed, dt);

            *shoot_timer -= dt;
            if *shoot_timer <= 0.0 {
                *shoot_timer = MINIBOSS_INTERVAL;
                let aim = angle_to(e.pos, target);
                if ctx.rng.random_bool(0.5) {
                    ctx.fire(e.pos, aim, 220.0, 12.0);
                } else {
                    for i in -1..=1 {
                        ctx.fire(e.pos, aim + i as f32 * 0.3, 220.0, 12.0);
                    }
                }
            }
        }
    }

    e.behavior = behavior;
}

/// Bomber blast damage at `wave`
pub fn bomber_blast(wave: u32) -> f32 {
    18.0 + wave as f32 * 2.0
}

#[cfg(test)]
pub(crate) fn test_enemy(kind: EnemyKind, pos: Vec2, hp: f32) -> Enemy {
    let mut sys = EnemySystem::new(Difficulty::Normal);
    let mut e = sys.build(kind, 1, pos);
    e.hp = hp;
    e.max_hp = hp;
    e
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::effects::Effects;
    use crate::sim::player;
    use crate::tuning::{Ship, StartingStats};
    use rand::SeedableRng;

    fn setup() -> (EnemySystem, Player, SimRng, Effects) {
        let p = player::init(
            Ship::Viper,
            &StartingStats {
                hp: 100.0,
                shield: 0.0,
                speed: 240.0,
                damage: 24.0,
            },
        );
        (
            EnemySystem::new(Difficulty::Normal),
            p,
            SimRng::seed_from_u64(11),
            Effects::new(0),
        )
    }

    #[test]
    fn test_drone_hp_at_wave_3() {
        let p = EnemyKind::Drone.profile();
        assert_eq!(enemy_hp(p.base_hp, p.hp_per_wave, 3, p.late_mult), 66.0);
    }

    #[test]
    fn test_boss_hp_at_wave_12() {
        let p = EnemyKind::Boss1.profile();
        assert_eq!(enemy_hp(p.base_hp, p.hp_per_wave, 12, p.late_mult), 3967.0);
    }

    #[test]
    fn test_hp_curve_continuity() {
        for kind in ALL_KINDS {
            let p = kind.profile();
            let w10 = enemy_hp(p.base_hp, p.hp_per_wave, 10, p.late_mult);
            let w11 = enemy_hp(p.base_hp, p.hp_per_wave, 11, p.late_mult);
            assert_eq!(w11, (w10 as f64 * p.late_mult as f64).floor() as f32, "{kind:?}");
        }
    }

    const ALL_KINDS: [EnemyKind; 16] = [
        EnemyKind::Drone,
        EnemyKind::Scout,
        EnemyKind::Tank,
        EnemyKind::Shield,
        EnemyKind::Swarm,
        EnemyKind::Sniper,
        EnemyKind::Healer,
        EnemyKind::Spawner,
        EnemyKind::Bomber,
        EnemyKind::Teleporter,
        EnemyKind::Kamikaze,
        EnemyKind::Artillery,
        EnemyKind::Boss1,
        EnemyKind::Boss2,
        EnemyKind::Boss3,
        EnemyKind::MiniBoss,
    ];

    #[test]
    fn test_every_kind_survives_updates() {
        let (mut sys, p, mut rng, mut fx) = setup();
        for kind in ALL_KINDS {
            sys.spawn(kind, 12, &mut rng);
        }
        for _ in 0..600 {
            sys.update(0.016, &p, 12, &mut rng, &mut fx);
        }
        for e in sys.living() {
            assert!(e.hp <= e.max_hp);
            assert!(e.pos.x >= ENEMY_MARGIN && e.pos.x <= ARENA_WIDTH - ENEMY_MARGIN);
            assert!(e.pos.y >= ENEMY_MARGIN && e.pos.y <= ARENA_HEIGHT - ENEMY_MARGIN);
        }
    }

    #[test]
    fn test_spawn_outside_edges() {
        let (mut sys, _, mut rng, _) = setup();
        for _ in 0..40 {
            sys.spawn(EnemyKind::Drone, 1, &mut rng);
        }
        for e in &sys.enemies {
            let outside = e.pos.x < 0.0
                || e.pos.x > ARENA_WIDTH
                || e.pos.y < 0.0
                || e.pos.y > ARENA_HEIGHT;
            assert!(outside, "{:?}", e.pos);
        }
    }

    #[test]
    fn test_dead_enemies_handed_off_once() {
        let (mut sys, p, mut rng, mut fx) = setup();
        let id = sys.spawn(EnemyKind::Tank, 1, &mut rng);
        sys.enemies[0].hp = 0.0;
        let out = sys.update(0.016, &p, 1, &mut rng, &mut fx);
        assert_eq!(out.killed.len(), 1);
        assert_eq!(out.killed[0].id, id);
        assert!(sys.enemies.is_empty());
        let out = sys.update(0.016, &p, 1, &mut rng, &mut fx);
        assert!(out.killed.is_empty());
    }

    #[test]
    fn test_current_boss_tracking() {
        let (mut sys, p, mut rng, mut fx) = setup();
        sys.spawn(EnemyKind::Drone, 5, &mut rng);
        assert!(sys.current_boss().is_none());
        sys.spawn(EnemyKind::Boss2, 5, &mut rng);
        assert_eq!(sys.current_boss().map(|b| b.kind), Some(EnemyKind::Boss2));
        for e in &mut sys.enemies {
            if e.kind == EnemyKind::Boss2 {
                e.hp = -5.0;
            }
        }
        sys.update(0.016, &p, 5, &mut rng, &mut fx);
        assert!(sys.current_boss().is_none());
    }

    #[test]
    fn test_boss_phase_is_one_way() {
        let (mut sys, p, mut rng, mut fx) = setup();
        sys.spawn_at(EnemyKind::Boss1, 5, Vec2::new(300.0, 300.0));
        let max = sys.enemies[0].max_hp;
        sys.enemies[0].hp = max * 0.3;
        sys.update(0.016, &p, 5, &mut rng, &mut fx);
        assert_eq!(sys.enemies[0].boss_phase(), Some(BossPhase::Two));
        sys.enemies[0].hp = max;
        sys.update(0.016, &p, 5, &mut rng, &mut fx);
        assert_eq!(sys.enemies[0].boss_phase(), Some(BossPhase::Two));
    }

    #[test]
    fn test_boss1_ring_volley() {
        let (mut sys, p, mut rng, mut fx) = setup();
        sys.spawn_at(EnemyKind::Boss1, 5, Vec2::new(300.0, 300.0));
        let mut shots = 0;
        // First volley lands at five seconds
        for _ in 0..320 {
            shots += sys.update(0.016, &p, 5, &mut rng, &mut fx).shots.len();
        }
        assert_eq!(shots, 6);
    }

    #[test]
    fn test_sniper_fires_at_charge_start_position() {
        let (mut sys, mut p, mut rng, mut fx) = setup();
        p.pos = Vec2::new(100.0, 340.0);
        sys.spawn_at(EnemyKind::Sniper, 1, Vec2::new(700.0, 340.0));
        let first = sys.update(0.016, &p, 1, &mut rng, &mut fx);
        assert!(first.shots.is_empty());
        assert_eq!(sys.sniper_warnings.len(), 1);
        assert_eq!(sys.sniper_warnings[0].pos, Vec2::new(100.0, 340.0));

        // Player moves during the charge; the shot still targets the old spot
        p.pos = Vec2::new(100.0, 100.0);
        let mut shots = Vec::new();
        for _ in 0..40 {
            shots.extend(sys.update(0.016, &p, 1, &mut rng, &mut fx).shots);
            if !shots.is_empty() {
                break;
            }
        }
        assert_eq!(shots.len(), 1);
        let e = &sys.enemies[0];
        let expected = angle_to(e.pos, Vec2::new(100.0, 340.0));
        assert!((shots[0].angle - expected).abs() < 0.05);
        assert_eq!(shots[0].damage, 12.0);
    }

    #[test]
    fn test_healer_heals_others_not_self() {
        let (mut sys, mut p, mut rng, mut fx) = setup();
        p.pos = Vec2::new(100.0, 100.0);
        sys.spawn_at(EnemyKind::Healer, 1, Vec2::new(600.0, 400.0));
        sys.spawn_at(EnemyKind::Tank, 1, Vec2::new(620.0, 400.0));
        sys.enemies[0].hp = 10.0;
        sys.enemies[1].hp = 100.0;
        let tank_max = sys.enemies[1].max_hp;
        for _ in 0..130 {
            sys.update(0.016, &p, 1, &mut rng, &mut fx);
        }
        let healer = &sys.enemies[0];
        let tank = &sys.enemies[1];
        assert_eq!(healer.hp, 10.0);
        assert!(tank.hp > 100.0 && tank.hp <= tank_max);
    }

    #[test]
    fn test_spawner_caps_minions() {
        let (mut sys, mut p, mut rng, mut fx) = setup();
        p.pos = Vec2::new(100.0, 100.0);
        sys.spawn_at(EnemyKind::Spawner, 2, Vec2::new(300.0, 200.0));
        for _ in 0..1200 {
            sys.update(0.016, &p, 2, &mut rng, &mut fx);
        }
        let minions: Vec<&Enemy> = sys
            .enemies
            .iter()
            .filter(|e| e.kind == EnemyKind::Drone)
            .collect();
        assert_eq!(minions.len(), 3);
        assert_eq!(minions[0].max_hp, 30.0);
        assert_eq!(minions[0].score, 10);
    }

    #[test]
    fn test_bomber_self_destructs() {
        let (mut sys, p, mut rng, mut fx) = setup();
        sys.spawn_at(EnemyKind::Bomber, 4, p.pos + Vec2::new(10.0, 0.0));
        let out = sys.update(0.016, &p, 4, &mut rng, &mut fx);
        assert_eq!(out.detonations.len(), 1);
        assert_eq!(out.detonations[0].damage, 26.0);
        assert!(out.killed.is_empty());
        assert!(sys.enemies.is_empty());
    }

    #[test]
    fn test_kamikaze_charge_is_permanent() {
        let (mut sys, mut p, mut rng, mut fx) = setup();
        p.pos = Vec2::new(450.0, 340.0);
        sys.spawn_at(EnemyKind::Kamikaze, 1, Vec2::new(550.0, 340.0));
        sys.update(0.016, &p, 1, &mut rng, &mut fx);
        p.pos = Vec2::new(100.0, 100.0);
        sys.update(0.016, &p, 1, &mut rng, &mut fx);
        assert!(matches!(
            sys.enemies[0].behavior,
            Behavior::Kamikaze { charging: true, .. }
        ));
    }

    #[test]
    fn test_contact_damage_table() {
        let (mut sys, p, _, _) = setup();
        sys.spawn_at(EnemyKind::Tank, 1, p.pos + Vec2::new(20.0, 0.0));
        sys.spawn_at(EnemyKind::Scout, 1, p.pos + Vec2::new(0.0, 20.0));
        sys.spawn_at(EnemyKind::Drone, 1, p.pos + Vec2::new(200.0, 0.0));
        assert_eq!(sys.check_player_collision(&p), 18.0);
    }

    #[test]
    fn test_difficulty_scales_spawn() {
        let mut hard = EnemySystem::new(Difficulty::Hard);
        hard.spawn_at(EnemyKind::Drone, 3, Vec2::ZERO);
        // 66 * 1.3 = 85.8
        assert_eq!(hard.enemies[0].max_hp, 86.0);
        let mut easy = EnemySystem::new(Difficulty::Easy);
        easy.spawn_at(EnemyKind::Boss1, 0, Vec2::ZERO);
        assert_eq!(easy.enemies[0].max_hp, 560.0);
    }
}
