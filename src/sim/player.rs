//! Player controller
//!
//! Movement, dash/teleport, aiming, regeneration and damage absorption.
//! Nothing here fails: out-of-range input is clamped and the run keeps going.

use glam::Vec2;
use rand::Rng;

use super::effects::EffectsSink;
use super::state::{DashState, Player, SimRng, SoundCue};
use crate::consts::PLAYER_MARGIN;
use crate::tuning::{
    AFTERBURNER_DURATION, AFTERBURNER_MULT, ARMOR_PLATING_REDUCTION, RAPID_STRIKE_EVERY, Ship,
    StartingStats,
};
use crate::{angle_to, arena_center, clamp_to_arena, from_angle};

pub const DASH_SPEED: f32 = 550.0;
pub const DASH_DURATION: f32 = 0.16;
pub const DASH_INVULN: f32 = 0.20;
pub const TELEPORT_DISTANCE: f32 = 120.0;
pub const TELEPORT_INVULN: f32 = 0.25;
/// Invulnerability after taking damage
pub const DAMAGE_INVULN: f32 = 0.35;
/// Chance a regular dash leaves a gravity well behind
pub const GRAVITY_WELL_CHANCE: f64 = 0.30;

/// What a dash trigger did this tick
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DashOutcome {
    None,
    /// Regular dash started; `well` is where a gravity well should spawn
    Dashed { well: Option<Vec2> },
    Teleported,
}

/// Create the player for a run
pub fn init(ship: Ship, start: &StartingStats) -> Player {
    Player {
        pos: arena_center(),
        angle: 0.0,
        hp: start.hp,
        max_hp: start.hp,
        shield: start.shield,
        max_shield: start.shield,
        speed: start.speed,
        invuln: 0.0,
        dash_cooldown: 0.0,
        dash: DashState::Idle,
        ship,
        upgrade_stage: 0,
        has_teleport: false,
        shot_counter: 0,
        afterburner: 0.0,
        idle_time: 0.0,
    }
}

/// Move along `input` (normalized here). `boosted` applies the speed pickup.
pub fn update_movement(p: &mut Player, dt: f32, input: Vec2, boosted: bool) {
    let dir = input.normalize_or_zero();
    let mut speed = p.speed;

    if boosted {
        speed *= super::effects::SPEED_BOOST_MULT;
    }
    if p.ship == Ship::Razor && p.afterburner > 0.0 {
        speed *= AFTERBURNER_MULT;
        p.afterburner = (p.afterburner - dt).max(0.0);
    }

    p.pos = clamp_to_arena(p.pos + dir * speed * dt, PLAYER_MARGIN);

    if dir == Vec2::ZERO {
        p.idle_time += dt;
    } else {
        p.idle_time = 0.0;
    }
}

/// Dash state machine. `cooldown` is the current dash cooldown duration.
pub fn update_dash(
    p: &mut Player,
    dt: f32,
    pressed: bool,
    input: Vec2,
    cooldown: f32,
    rng: &mut SimRng,
    fx: &mut impl EffectsSink,
) -> DashOutcome {
    if p.dash_cooldown > 0.0 {
        p.dash_cooldown = (p.dash_cooldown - dt).max(0.0);
    }

    if let DashState::Dashing { remaining, angle } = p.dash {
        let remaining = remaining - dt;
        if remaining <= 0.0 {
            p.dash = DashState::Idle;
            p.invuln = 0.0;
        } else {
            p.pos = clamp_to_arena(p.pos + from_angle(angle) * DASH_SPEED * dt, PLAYER_MARGIN);
            p.dash = DashState::Dashing { remaining, angle };
        }
    }

    let dir = input.normalize_or_zero();
    if !pressed || p.dash_cooldown > 0.0 || p.is_dashing() || dir == Vec2::ZERO {
        return DashOutcome::None;
    }

    let outcome = if p.has_teleport {
        p.pos = clamp_to_arena(p.pos + dir * TELEPORT_DISTANCE, PLAYER_MARGIN);
        p.invuln = TELEPORT_INVULN;
        fx.burst(p.pos, 0xff00ff, 20, 180.0);
        fx.cue(SoundCue::Teleport);
        DashOutcome::Teleported
    } else {
        p.dash = DashState::Dashing {
            remaining: DASH_DURATION,
            angle: dir.y.atan2(dir.x),
        };
        p.invuln = DASH_INVULN;
        fx.burst(p.pos, p.ship.stats().color, 15, 150.0);
        fx.cue(SoundCue::Dash);
        let well = rng.random_bool(GRAVITY_WELL_CHANCE).then_some(p.pos);
        DashOutcome::Dashed { well }
    };

    p.dash_cooldown = cooldown;
    if p.ship == Ship::Razor {
        p.afterburner = AFTERBURNER_DURATION;
    }

    outcome
}

/// Face the pointer
pub fn update_aiming(p: &mut Player, pointer: Vec2) {
    if pointer != p.pos {
        p.angle = angle_to(p.pos, pointer);
    }
}

pub fn update_regen(p: &mut Player, dt: f32, regen_rate: f32) {
    if p.hp < p.max_hp && p.hp > 0.0 {
        p.hp = (p.hp + regen_rate * dt).min(p.max_hp);
    }
}

pub fn update_invuln(p: &mut Player, dt: f32) {
    p.invuln = (p.invuln - dt).max(0.0);
}

/// Apply damage: shield first, then hp. Returns true when the player is dead.
pub fn take_damage(p: &mut Player, amount: f32, fx: &mut impl EffectsSink) -> bool {
    if p.invuln > 0.0 || amount <= 0.0 {
        return false;
    }

    let mut amount = amount;
    if p.ship == Ship::Tanks {
        amount *= 1.0 - ARMOR_PLATING_REDUCTION;
    }

    if p.shield > 0.0 {
        let absorbed = p.shield.min(amount);
        p.shield -= absorbed;
        amount -= absorbed;
        fx.cue(SoundCue::ShieldHit);
    }

    if amount > 0.0 {
        p.hp -= amount;
        fx.cue(SoundCue::Hit);
        fx.shake(12.0, 0.12);
    }

    p.invuln = DAMAGE_INVULN;
    p.hp <= 0.0
}

/// VIPER perk: every Nth trigger fires regardless of the fire-rate gate
pub fn can_rapid_strike(p: &mut Player) -> bool {
    if p.ship != Ship::Viper {
        return false;
    }
    p.shot_counter += 1;
    if p.shot_counter >= RAPID_STRIKE_EVERY {
        p.shot_counter = 0;
        true
    } else {
        false
    }
}

/// Visual ship stage for a wave
pub fn stage_for_wave(wave: u32) -> u8 {
    match wave {
        0..=4 => 0,
        5..=14 => 1,
        _ => 2,
    }
}
