//! Per-frame simulation tick
//!
//! `GameState` owns every system for one run plus the shared run state
//! (score, combo, stats, slow-motion). `tick` advances it by one frame.

use glam::Vec2;
use rand::{Rng, SeedableRng};
use serde::Serialize;

use super::effects::{Detonation, Effects, EffectsSink, PICKUP_DROP_CHANCE};
use super::enemy::{EnemySystem, bomber_blast};
use super::player::{self, DashOutcome};
use super::state::{
    Bullet, Enemy, EnemyBullet, EnemyKind, GameEvent, GamePhase, GravityWell, Particle, Pickup,
    PickupKind, Player, RunStats, SimRng, SniperWarning, SoundCue, WaveKind,
};
use super::upgrade::{self, UpgradeKind};
use super::wave::{WaveDirector, WavePhase, WaveSignal};
use super::weapon::{LaserState, WeaponSystem};
use crate::consts::{BOSS_KILL_SLOWMO, COMBO_WINDOW, MAX_FRAME_DT, SLOWMO_FACTOR};
use crate::difficulty::Difficulty;
use crate::persistence::{Achievement, Progression};
use crate::tuning::{Ship, StartingStats};
use crate::{arena_center, from_angle};

/// Upgrades taken in one run that unlock the matching achievement
const ALL_UPGRADES_COUNT: u32 = 10;
/// Combo that unlocks the matching achievement
const COMBO_ACHIEVEMENT: u32 = 10;

/// Run-time configuration chosen before a run starts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct RunConfig {
    pub seed: u64,
    pub ship: Ship,
    pub difficulty: Difficulty,
}

/// Input for a single tick
#[derive(Debug, Clone, Default)]
pub struct TickInput {
    /// Movement direction (normalized by the player controller)
    pub movement: Vec2,
    /// Primary action held
    pub fire: bool,
    /// Dash pressed this tick
    pub dash: bool,
    /// Aim point in arena coordinates
    pub pointer: Vec2,
    /// Demo mode: the autopilot plays and picks upgrades
    pub autopilot: bool,
}

/// Everything for one run
#[derive(Debug, Clone)]
pub struct GameState {
    pub config: RunConfig,
    pub progression: Progression,
    pub player: Player,
    pub weapons: WeaponSystem,
    pub enemies: EnemySystem,
    pub effects: Effects,
    pub director: WaveDirector,
    pub stats: RunStats,
    pub score: u64,
    pub combo: u32,
    pub combo_timer: f32,
    /// Pickup slow-motion remaining (s)
    pub slowmo: f32,
    /// Boss-kill slow-motion remaining (s)
    pub boss_slowmo: f32,
    /// Choices on offer while in the upgrade phase
    pub upgrade_choices: Vec<UpgradeKind>,
    /// Camera offset for this frame
    pub shake_offset: Vec2,
    /// Unscaled run time (s), used for fire-rate gating
    pub clock: f32,
    pub game_over: bool,
    rng: SimRng,
}

/// Serializable view of every live entity
#[derive(Debug, Serialize)]
pub struct Snapshot<'a> {
    pub wave: u32,
    pub score: u64,
    pub combo: u32,
    pub phase: GamePhase,
    pub player: &'a Player,
    pub enemies: &'a [Enemy],
    pub bullets: &'a [Bullet],
    pub enemy_bullets: &'a [EnemyBullet],
    pub pickups: &'a [Pickup],
    pub particles: &'a [Particle],
    pub gravity_wells: &'a [GravityWell],
    pub sniper_warnings: &'a [SniperWarning],
    pub laser: LaserState,
    pub stats: &'a RunStats,
}

impl GameState {
    /// Start a run. The progression is read for starting stats and updated
    /// in place as achievements unlock and when the run ends.
    pub fn new(config: RunConfig, mut progression: Progression) -> Self {
        let start = StartingStats::compute(config.ship, &progression);
        progression.selected_ship = config.ship.index();
        progression.selected_difficulty = config.difficulty.index();

        let stats = RunStats {
            dash_cooldown: config.ship.stats().dash_cooldown,
            ..Default::default()
        };

        let mut state = Self {
            config,
            progression,
            player: player::init(config.ship, &start),
            weapons: WeaponSystem::init(config.ship, &start),
            enemies: EnemySystem::new(config.difficulty),
            effects: Effects::new(config.seed),
            director: WaveDirector::new(config.difficulty),
            stats,
            score: 0,
            combo: 0,
            combo_timer: 0.0,
            slowmo: 0.0,
            boss_slowmo: 0.0,
            upgrade_choices: Vec::new(),
            shake_offset: Vec2::ZERO,
            clock: 0.0,
            game_over: false,
            rng: SimRng::seed_from_u64(config.seed),
        };
        log::info!(
            "Run started: {} on {} (seed {})",
            config.ship.name(),
            config.difficulty.as_str(),
            config.seed
        );
        state.start_wave();
        state
    }

    pub fn wave(&self) -> u32 {
        self.director.wave
    }

    pub fn phase(&self) -> GamePhase {
        if self.game_over {
            GamePhase::GameOver
        } else if self.director.phase == WavePhase::UpgradeChoice {
            GamePhase::UpgradeChoice
        } else {
            GamePhase::Playing
        }
    }

    pub fn is_slowmo(&self) -> bool {
        self.slowmo > 0.0 || self.boss_slowmo > 0.0
    }

    /// Events produced since the last call
    pub fn drain_events(&mut self) -> Vec<GameEvent> {
        self.effects.drain_events()
    }

    pub fn snapshot(&self) -> Snapshot<'_> {
        Snapshot {
            wave: self.wave(),
            score: self.score,
            combo: self.combo,
            phase: self.phase(),
            player: &self.player,
            enemies: &self.enemies.enemies,
            bullets: &self.weapons.bullets,
            enemy_bullets: &self.weapons.enemy_bullets,
            pickups: &self.effects.pickups,
            particles: &self.effects.particles,
            gravity_wells: &self.weapons.gravity_wells,
            sniper_warnings: &self.enemies.sniper_warnings,
            laser: self.weapons.laser,
            stats: &self.stats,
        }
    }

    /// Pick one of the offered upgrades and start the next wave.
    /// Returns false when no choice is pending or the index is out of range.
    pub fn choose_upgrade(&mut self, index: usize) -> bool {
        if self.phase() != GamePhase::UpgradeChoice {
            return false;
        }
        let Some(&choice) = self.upgrade_choices.get(index) else {
            return false;
        };

        upgrade::select(
            choice,
            &mut self.weapons.weapon,
            &mut self.player,
            &mut self.stats,
        );
        self.effects.cue(SoundCue::Upgrade);
        if self.stats.upgrades_taken >= ALL_UPGRADES_COUNT {
            self.unlock(Achievement::AllUpgrades);
        }

        self.upgrade_choices.clear();
        self.start_wave();
        true
    }

    fn start_wave(&mut self) {
        self.stats.wave_damage_taken = 0.0;
        let kind = self.director.start_next(&mut self.rng);
        let wave = self.director.wave;

        if let Some(a) = Achievement::for_wave(wave) {
            self.unlock(a);
        }

        let stage = player::stage_for_wave(wave);
        if stage > self.player.upgrade_stage {
            self.player.upgrade_stage = stage;
            let name = if stage == 1 { "ENHANCED" } else { "ULTIMATE" };
            self.effects
                .notify(format!("SHIP UPGRADED: {name}"), 0x00ffff, 2.5);
            self.effects.cue(SoundCue::Upgrade);
            let (pos, color) = (self.player.pos, self.config.ship.stats().color);
            self.effects.burst(pos, color, 30, 150.0);
        }

        if kind == WaveKind::Boss {
            self.effects.cue(SoundCue::BossBegin);
        }
        self.effects.emit(GameEvent::WaveStarted { wave, kind });
    }

    /// Unlock and announce. Announces only on the first unlock.
    fn unlock(&mut self, achievement: Achievement) {
        if self.progression.unlock(achievement) {
            self.announce(achievement);
        }
    }

    fn announce(&mut self, achievement: Achievement) {
        self.effects
            .notify(format!("ACHIEVEMENT: {}", achievement.name()), 0xffd700, 2.5);
        self.effects.emit(GameEvent::AchievementUnlocked(achievement));
        self.effects.emit(GameEvent::SaveRequested);
    }

    /// Route damage through the player's shield/hp and handle the fallout
    fn hurt_player(&mut self, amount: f32) {
        if self.game_over || amount <= 0.0 {
            return;
        }
        let before = self.player.hp + self.player.shield;
        let died = player::take_damage(&mut self.player, amount, &mut self.effects);
        let taken = before - (self.player.hp + self.player.shield);
        if taken > 0.0 {
            self.combo = 0;
            self.stats.wave_damage_taken += taken;
        }
        if died {
            self.die();
        }
    }

    fn detonate(&mut self, d: Detonation) {
        let wave = self.wave();
        let damage =
            self.effects
                .explode_mega(d.pos, d.damage, &mut self.enemies.enemies, &self.player, wave);
        self.hurt_player(damage);
    }

    /// Score, combo, loot and achievements for one death
    fn kill_enemy(&mut self, e: Enemy) {
        let wave = self.wave();
        let is_boss = e.kind.is_boss();

        if e.kind == EnemyKind::Bomber {
            let damage = bomber_blast(wave) * self.config.difficulty.enemy_damage();
            self.detonate(Detonation { pos: e.pos, damage });
        }

        if is_boss {
            self.stats.bosses_defeated += 1;
            if self.stats.bosses_defeated == 1 {
                self.unlock(Achievement::Boss1);
            }
        }

        let points = (e.score as f32 * self.config.difficulty.score()).round() as u64;
        self.score += points;
        self.effects.emit(GameEvent::Score(points));

        self.combo += 1;
        self.combo_timer = COMBO_WINDOW;
        self.stats.peak_combo = self.stats.peak_combo.max(self.combo);
        if self.combo == COMBO_ACHIEVEMENT {
            self.unlock(Achievement::Combo10);
        }

        self.stats.enemies_killed += 1;
        if let Some(a) = self.progression.record_kill() {
            self.announce(a);
        }

        if is_boss {
            log::info!("Boss {} defeated at wave {}", e.kind.name(), wave);
            self.effects.cue(SoundCue::BossDie);
            self.boss_slowmo = BOSS_KILL_SLOWMO;
            self.effects.burst(e.pos, e.color, 60, 220.0);
            self.effects.shake(25.0, 0.25);
            self.effects
                .spawn_pickup(e.pos, Some(PickupKind::Health), &mut self.rng);
            self.effects.spawn_pickup(
                e.pos + Vec2::new(30.0, -20.0),
                Some(PickupKind::Shield),
                &mut self.rng,
            );
        } else {
            self.effects.cue(SoundCue::EnemyDie);
            self.effects.burst(e.pos, e.color, 10, 100.0);
            if self.rng.random::<f32>() < PICKUP_DROP_CHANCE {
                self.effects.spawn_pickup(e.pos, None, &mut self.rng);
            }
        }
    }

    fn die(&mut self) {
        if self.game_over {
            return;
        }
        self.game_over = true;
        self.weapons.deactivate_laser();
        self.effects.cue(SoundCue::PlayerDie);
        self.effects.shake(20.0, 0.30);

        let new_high_score = self.progression.record_run(self.score);
        log::info!(
            "Run ended at wave {} with score {}{}",
            self.wave(),
            self.score,
            if new_high_score { " (new high score)" } else { "" }
        );
        self.effects.emit(GameEvent::PlayerDied);
        self.effects.emit(GameEvent::RunEnded {
            score: self.score,
            wave: self.wave(),
            new_high_score,
        });
        self.effects.emit(GameEvent::SaveRequested);
    }
}

/// Advance the run by one frame of `frame_dt` seconds
pub fn tick(state: &mut GameState, input: &TickInput, frame_dt: f32) {
    if state.game_over {
        return;
    }

    let input = if input.autopilot {
        autopilot(state)
    } else {
        input.clone()
    };

    // Frame time, clamped; slow-motion timers run on scaled time and compound
    let real_dt = frame_dt.clamp(0.0, MAX_FRAME_DT);
    let mut dt = real_dt;
    if state.slowmo > 0.0 {
        state.slowmo = (state.slowmo - dt).max(0.0);
        dt *= SLOWMO_FACTOR;
    }
    if state.boss_slowmo > 0.0 {
        state.boss_slowmo = (state.boss_slowmo - dt).max(0.0);
        dt *= SLOWMO_FACTOR;
    }
    state.clock += real_dt;
    state.shake_offset = state.effects.update_shake(real_dt);

    if state.phase() == GamePhase::UpgradeChoice {
        if input.autopilot && !state.upgrade_choices.is_empty() {
            state.choose_upgrade(0);
        }
        return;
    }

    let wave = state.wave();

    // Beam and wells act on positions from the previous frame
    state.weapons.update_laser(
        dt,
        &state.player,
        &mut state.enemies.enemies,
        wave,
        &mut state.effects,
    );
    state
        .weapons
        .update_gravity_wells(dt, &mut state.enemies.enemies);

    // Player
    player::update_movement(
        &mut state.player,
        dt,
        input.movement,
        state.stats.speed_boost > 0.0,
    );
    let dash = player::update_dash(
        &mut state.player,
        dt,
        input.dash,
        input.movement,
        state.stats.dash_cooldown,
        &mut state.rng,
        &mut state.effects,
    );
    if let DashOutcome::Dashed { well: Some(pos) } = dash {
        state.weapons.spawn_gravity_well(pos, &mut state.effects);
    }
    player::update_regen(&mut state.player, dt, state.stats.regen_rate);
    player::update_invuln(&mut state.player, dt);
    player::update_aiming(&mut state.player, input.pointer);

    // Weapon
    if input.fire {
        let rapid = player::can_rapid_strike(&mut state.player);
        let slow = state.is_slowmo();
        state.weapons.fire(
            state.clock,
            &state.player,
            wave,
            rapid,
            slow,
            &mut state.effects,
        );
    } else {
        state.weapons.deactivate_laser();
    }

    // Combo decay
    if state.combo > 0 {
        state.combo_timer -= dt;
        if state.combo_timer <= 0.0 {
            state.combo = 0;
        }
    }

    // Waves
    match state
        .director
        .update(dt, real_dt, &mut state.enemies, &mut state.rng)
    {
        Some(WaveSignal::Cleared) => {
            if state.stats.wave_damage_taken == 0.0 {
                state.unlock(Achievement::NoDamageWave);
            }
        }
        Some(WaveSignal::UpgradeReady) => {
            state.upgrade_choices = upgrade::get_pool(
                &state.weapons.weapon,
                &state.player,
                &state.stats,
                &mut state.rng,
            );
            if state.upgrade_choices.is_empty() {
                state.start_wave();
            } else {
                state.effects.emit(GameEvent::UpgradeChoice);
            }
        }
        None => {}
    }

    // Enemies
    let update = state.enemies.update(
        dt,
        &state.player,
        wave,
        &mut state.rng,
        &mut state.effects,
    );
    for e in update.killed {
        state.kill_enemy(e);
    }
    for shot in update.shots {
        state
            .weapons
            .spawn_enemy_bullet(shot.pos, shot.angle, shot.speed, shot.damage);
    }
    for d in update.detonations {
        state.detonate(d);
    }

    // Player bullets
    let detonations = state.weapons.update_bullets(
        dt,
        &mut state.enemies.enemies,
        wave,
        &mut state.effects,
    );
    for d in detonations {
        state.detonate(d);
    }

    // Damage to the player
    let bullet_damage = state.weapons.update_enemy_bullets(dt, &state.player);
    state.hurt_player(bullet_damage);
    let contact_damage = state.enemies.check_player_collision(&state.player);
    state.hurt_player(contact_damage);

    // Effects and pickups
    state.effects.update_particles(dt);
    let picked = state
        .effects
        .update_pickups(dt, &mut state.player, &mut state.stats, state.combo);
    if picked.score > 0 {
        state.score += picked.score;
        state.effects.emit(GameEvent::Score(picked.score));
    }
    if picked.slowmo > 0.0 {
        state.slowmo = state.slowmo.max(picked.slowmo);
    }
    state.stats.speed_boost = (state.stats.speed_boost - dt).max(0.0);
}

/// Demo-mode pilot: kite the nearest enemy, keep shooting, dash out of trouble
pub fn autopilot(state: &GameState) -> TickInput {
    let me = state.player.pos;
    let nearest = state
        .enemies
        .living()
        .min_by(|a, b| me.distance_squared(a.pos).total_cmp(&me.distance_squared(b.pos)));

    let Some(target) = nearest else {
        // Drift back toward the middle between waves
        let home = arena_center() - me;
        let movement = if home.length() > 40.0 { home } else { Vec2::ZERO };
        return TickInput {
            movement,
            pointer: me + from_angle(state.player.angle) * 100.0,
            autopilot: true,
            ..Default::default()
        };
    };

    let dist = me.distance(target.pos);
    let away = (me - target.pos).normalize_or_zero();
    // Strafe around the threat, backing off when it gets close
    let strafe = away.perp();
    let movement = if dist < 160.0 { away + strafe * 0.5 } else { strafe };

    TickInput {
        movement,
        fire: true,
        dash: dist < target.size + 40.0,
        pointer: target.pos,
        autopilot: true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_state(seed: u64) -> GameState {
        GameState::new(
            RunConfig {
                seed,
                ..Default::default()
            },
            Progression::default(),
        )
    }

    #[test]
    fn test_new_run_starts_wave_one() {
        let mut state = new_state(1);
        assert_eq!(state.wave(), 1);
        assert_eq!(state.phase(), GamePhase::Playing);
        let events = state.drain_events();
        assert!(events.contains(&GameEvent::WaveStarted {
            wave: 1,
            kind: WaveKind::Normal
        }));
    }

    #[test]
    fn test_slowmo_scales_dt() {
        let mut state = new_state(1);
        state.slowmo = 1.0;
        state.boss_slowmo = 1.0;
        let combo_before = 5;
        state.combo = combo_before;
        state.combo_timer = 1.0;
        tick(&mut state, &TickInput::default(), 0.1);
        // Clamped to 0.033, then scaled twice
        let expected = 1.0 - MAX_FRAME_DT * SLOWMO_FACTOR * SLOWMO_FACTOR;
        assert!((state.combo_timer - expected).abs() < 1e-5);
        assert!((state.clock - MAX_FRAME_DT).abs() < 1e-6);
    }

    #[test]
    fn test_kill_awards_score_and_combo() {
        let mut state = new_state(2);
        state
            .enemies
            .spawn_at(EnemyKind::Drone, 1, Vec2::new(100.0, 100.0));
        for e in &mut state.enemies.enemies {
            e.hp = 0.0;
        }
        tick(&mut state, &TickInput::default(), 0.016);
        assert!(state.score > 0);
        assert!(state.combo >= 1);
        assert!(state.progression.is_unlocked(Achievement::FirstKill));
        assert_eq!(state.progression.total_enemies_killed as u32, state.stats.enemies_killed);
    }

    #[test]
    fn test_damage_resets_combo() {
        let mut state = new_state(3);
        state.combo = 4;
        state.combo_timer = 1.0;
        state.hurt_player(10.0);
        assert_eq!(state.combo, 0);
        assert_eq!(state.stats.wave_damage_taken, 10.0);
    }

    #[test]
    fn test_death_ends_run() {
        let mut state = new_state(4);
        state.score = 1234;
        state.hurt_player(10_000.0);
        assert!(state.game_over);
        assert_eq!(state.phase(), GamePhase::GameOver);
        assert_eq!(state.progression.high_score, 1234);
        let events = state.drain_events();
        assert!(events.contains(&GameEvent::PlayerDied));
        assert!(events.contains(&GameEvent::SaveRequested));

        // Frozen after death
        let clock = state.clock;
        tick(&mut state, &TickInput::default(), 0.016);
        assert_eq!(state.clock, clock);
    }

    #[test]
    fn test_upgrade_choice_advances_wave() {
        let mut state = new_state(5);
        state.director.phase = WavePhase::Cleared { delay: 0.01 };
        tick(&mut state, &TickInput::default(), 0.016);
        assert_eq!(state.phase(), GamePhase::UpgradeChoice);
        assert_eq!(state.upgrade_choices.len(), 3);
        assert!(state.drain_events().contains(&GameEvent::UpgradeChoice));

        assert!(!state.choose_upgrade(7));
        assert!(state.choose_upgrade(1));
        assert_eq!(state.wave(), 2);
        assert_eq!(state.stats.upgrades_taken, 1);
        assert_eq!(state.phase(), GamePhase::Playing);
    }

    #[test]
    fn test_boss_kill_drops_and_slows() {
        let mut state = new_state(6);
        state
            .enemies
            .spawn_at(EnemyKind::Boss3, 5, Vec2::new(200.0, 200.0));
        for e in &mut state.enemies.enemies {
            if e.kind.is_boss() {
                e.hp = -1.0;
            }
        }
        tick(&mut state, &TickInput::default(), 0.016);
        assert!(state.boss_slowmo > 0.0);
        assert!(state.progression.is_unlocked(Achievement::Boss1));
        let kinds: Vec<PickupKind> = state.effects.pickups.iter().map(|p| p.kind).collect();
        assert!(kinds.contains(&PickupKind::Health));
        assert!(kinds.contains(&PickupKind::Shield));
    }

    #[test]
    fn test_same_seed_same_run() {
        let run = |seed| {
            let mut state = new_state(seed);
            let input = TickInput {
                autopilot: true,
                ..Default::default()
            };
            for _ in 0..600 {
                tick(&mut state, &input, 1.0 / 60.0);
            }
            (
                state.score,
                state.wave(),
                state.enemies.enemies.len(),
                state.player.pos,
            )
        };
        assert_eq!(run(42), run(42));
    }

    #[test]
    fn test_snapshot_serializes() {
        let state = new_state(7);
        let json = serde_json::to_string(&state.snapshot()).expect("serialize");
        assert!(json.contains("\"wave\":1"));
    }
}
