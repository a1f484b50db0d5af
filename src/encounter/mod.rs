//! Combat state machine.
//!
//! `Encounter` is the single owner and mutator of every combatant in a fight.
//! It exposes the command surface (start/stop/reset/reconfigure/use_skill/
//! use_interrupt/select_target) and the two scheduler entry points: `step`
//! for continuous mode and the round phases in [`turn`] for discrete mode.
//!
//! A step runs in a fixed order:
//! boss phase → status ticks → player → defeat check → enemy → defeat check
//! → status decay → snapshot. A killing blow ends the step on the spot.

use rand::SeedableRng;
use rand_xoshiro::Xoshiro256PlusPlus;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info};

pub mod events;
pub mod snapshot;
pub mod turn;

pub use events::{
    CombatEvent, CombatListener, CombatLog, EncounterOutcome, EncounterResult, EventKind,
    LogEntry, LogKind, NullListener, RecordingListener,
};
pub use snapshot::{BossView, EncounterSnapshot, SkillView};
pub use turn::PlayerAction;

use crate::abilities::{Ability, AbilityCatalog, AbilityEffect, TargetType, INTERRUPT_ID};
use crate::boss::{BossController, SpecialStrike, Telegraph};
use crate::combat::defense::DefenseAction;
use crate::combat::rank::{blocked_damage, effective_damage};
use crate::combat::status::{StatusEffect, StatusType};
use crate::combat::{Combatant, HitReport};
use crate::config::CombatConfig;
use crate::error::{CombatError, CombatResult};
use crate::monster::{predict_action, EnemyAction, Roster};
use crate::player::{PlayerConfig, Role};

/// Which scheduler drives the encounter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Mode {
    Continuous,
    Discrete,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Lifecycle {
    Idle,
    Running,
    Victory,
    Defeat,
}

/// Discrete-mode sub-cycle of `Running`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TurnPhase {
    PlayerTurn,
    EnemyTurn,
    RoundEnd,
}

/// Why an action was declined
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum RejectReason {
    NotRunning,
    UnknownAbility(String),
    NotInLoadout(String),
    OnCooldown { id: String, remaining_ms: u64 },
    InsufficientResources(String),
    PreconditionFailed(String),
    InvalidTarget(String),
    NotPreparing,
    WrongPhase,
    NoPendingAction,
}

impl fmt::Display for RejectReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RejectReason::NotRunning => write!(f, "Combat is not running"),
            RejectReason::UnknownAbility(id) => write!(f, "Unknown ability '{id}'"),
            RejectReason::NotInLoadout(id) => write!(f, "'{id}' is not in your loadout"),
            RejectReason::OnCooldown { id, remaining_ms } => {
                write!(f, "'{id}' is on cooldown ({remaining_ms}ms)")
            }
            RejectReason::InsufficientResources(what) => write!(f, "Not enough resources for {what}"),
            RejectReason::PreconditionFailed(id) => write!(f, "'{id}' cannot be used right now"),
            RejectReason::InvalidTarget(why) => write!(f, "Invalid target: {why}"),
            RejectReason::NotPreparing => write!(f, "Nothing to interrupt"),
            RejectReason::WrongPhase => write!(f, "Not allowed in this phase"),
            RejectReason::NoPendingAction => write!(f, "No action selected"),
        }
    }
}

/// Result of a command
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActionResult {
    Applied,
    /// The action ended the encounter
    Finished(EncounterResult),
    Rejected(RejectReason),
}

impl ActionResult {
    pub fn is_applied(&self) -> bool {
        !matches!(self, ActionResult::Rejected(_))
    }

    pub fn is_rejected(&self) -> bool {
        matches!(self, ActionResult::Rejected(_))
    }
}

/// Result of one continuous-mode step or timer callback
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepOutcome {
    /// Not running; nothing happened
    Idle,
    Continue,
    Finished(EncounterResult),
}

pub struct Encounter {
    mode: Mode,
    config: Arc<CombatConfig>,
    catalog: Arc<AbilityCatalog>,
    player_config: PlayerConfig,
    player: Combatant,
    enemy: Combatant,
    roster: Roster,
    initial_roster: Roster,
    active_index: usize,
    boss: Option<BossController>,
    /// Controllers of bosses the player switched away from, by roster index
    parked_bosses: HashMap<usize, BossController>,
    lifecycle: Lifecycle,
    phase: TurnPhase,
    step: u64,
    log: CombatLog,
    loadout: Vec<String>,
    rng: Xoshiro256PlusPlus,
    listener: Arc<dyn CombatListener>,
    pending_action: Option<PlayerAction>,
    player_defense: DefenseAction,
    enemy_intent: Option<EnemyAction>,
    started_cooldowns: Vec<String>,
    outcome: Option<EncounterOutcome>,
}

impl fmt::Debug for Encounter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Encounter")
            .field("mode", &self.mode)
            .field("lifecycle", &self.lifecycle)
            .field("step", &self.step)
            .field("player", &self.player.name)
            .field("enemy", &self.enemy.name)
            .finish()
    }
}

impl Encounter {
    /// Build an encounter. Config and roster are validated here, before any
    /// scheduler can arm a timer.
    pub fn new(
        mode: Mode,
        player_config: PlayerConfig,
        roster: Roster,
        catalog: Arc<AbilityCatalog>,
        config: Arc<CombatConfig>,
    ) -> CombatResult<Self> {
        config.validate()?;
        roster.validate()?;
        let active_index = roster
            .first_undefeated()
            .ok_or_else(|| CombatError::InvalidConfig("every roster entry is defeated".into()))?;

        let entry = &roster.entries[active_index];
        let enemy = Combatant::enemy(entry);
        let boss = entry
            .is_boss
            .then(|| BossController::new(&entry.name, &config));
        let player = Combatant::player(&player_config);
        let loadout = catalog.available_for(&player_config);
        let rng = Xoshiro256PlusPlus::seed_from_u64(config.rng_seed);

        let mut encounter = Self {
            mode,
            config,
            catalog,
            player_config,
            player,
            enemy,
            initial_roster: roster.clone(),
            roster,
            active_index,
            boss,
            parked_bosses: HashMap::new(),
            lifecycle: Lifecycle::Idle,
            phase: TurnPhase::PlayerTurn,
            step: 0,
            log: CombatLog::default(),
            loadout,
            rng,
            listener: Arc::new(NullListener),
            pending_action: None,
            player_defense: DefenseAction::None,
            enemy_intent: None,
            started_cooldowns: Vec::new(),
            outcome: None,
        };
        let opening = format!(
            "{} ({} {}) faces {}",
            encounter.player.name,
            encounter.player_config.rank,
            encounter.player_config.role,
            encounter.enemy.name
        );
        encounter.log.push(0, LogKind::System, opening);
        Ok(encounter)
    }

    pub fn with_listener(mut self, listener: Arc<dyn CombatListener>) -> Self {
        self.listener = listener;
        self
    }

    // ------------------------------------------------------------------
    // Accessors
    // ------------------------------------------------------------------

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn lifecycle(&self) -> Lifecycle {
        self.lifecycle
    }

    pub fn is_running(&self) -> bool {
        self.lifecycle == Lifecycle::Running
    }

    pub fn phase(&self) -> TurnPhase {
        self.phase
    }

    pub fn step_count(&self) -> u64 {
        self.step
    }

    pub fn player(&self) -> &Combatant {
        &self.player
    }

    pub fn enemy(&self) -> &Combatant {
        &self.enemy
    }

    pub fn roster(&self) -> &Roster {
        &self.roster
    }

    pub fn active_index(&self) -> usize {
        self.active_index
    }

    pub fn boss(&self) -> Option<&BossController> {
        self.boss.as_ref()
    }

    pub fn is_fighting_boss(&self) -> bool {
        self.boss.is_some()
    }

    pub fn is_preparing_special(&self) -> bool {
        self.boss.as_ref().is_some_and(|b| b.is_preparing())
    }

    pub fn log(&self) -> &CombatLog {
        &self.log
    }

    pub fn loadout(&self) -> &[String] {
        &self.loadout
    }

    pub fn config(&self) -> &CombatConfig {
        &self.config
    }

    pub fn player_config(&self) -> &PlayerConfig {
        &self.player_config
    }

    pub fn enemy_intent(&self) -> Option<EnemyAction> {
        self.enemy_intent
    }

    pub fn catalog(&self) -> &AbilityCatalog {
        &self.catalog
    }

    /// Whether `use_skill(id)` would currently be accepted
    pub fn can_use_skill(&self, id: &str) -> bool {
        self.is_running() && self.check_skill(id).is_ok()
    }

    pub fn outcome(&self) -> Option<&EncounterOutcome> {
        self.outcome.as_ref()
    }

    /// Cooldowns started since the last call, for schedulers that run one
    /// decrementer per slot.
    pub fn take_started_cooldowns(&mut self) -> Vec<String> {
        std::mem::take(&mut self.started_cooldowns)
    }

    // ------------------------------------------------------------------
    // Lifecycle commands
    // ------------------------------------------------------------------

    /// Idle → Running. No-op when already running or finished.
    pub fn start(&mut self) -> bool {
        match self.lifecycle {
            Lifecycle::Running => false,
            Lifecycle::Victory | Lifecycle::Defeat => {
                self.info("Encounter is over; reset to fight again".into());
                false
            }
            Lifecycle::Idle => {
                self.lifecycle = Lifecycle::Running;
                self.refresh_intent();
                let msg = format!("Combat started against {}", self.enemy.name);
                self.info(msg);
                info!(target: "gate_core::encounter", mode = ?self.mode, enemy = %self.enemy.name, "Combat started");
                self.emit_snapshot();
                true
            }
        }
    }

    /// Running → Idle. State is kept for inspection; an in-flight special is
    /// dropped along with its timers.
    pub fn stop(&mut self) -> bool {
        if !self.is_running() {
            return false;
        }
        self.lifecycle = Lifecycle::Idle;
        if let Some(boss) = self.boss.as_mut() {
            boss.calm();
        }
        self.started_cooldowns.clear();
        self.info("Combat stopped".into());
        info!(target: "gate_core::encounter", step = self.step, "Combat stopped");
        self.emit_snapshot();
        true
    }

    /// Rebuild the whole encounter from the player configuration and the
    /// roster as it was handed in.
    pub fn reset(&mut self) {
        self.lifecycle = Lifecycle::Idle;
        self.roster = self.initial_roster.clone();
        self.boss = None;
        self.parked_bosses.clear();
        self.player = Combatant::player(&self.player_config);
        let first = self.roster.first_undefeated().unwrap_or(0);
        self.load_enemy(first);
        self.step = 0;
        self.phase = TurnPhase::PlayerTurn;
        self.pending_action = None;
        self.player_defense = DefenseAction::None;
        self.started_cooldowns.clear();
        self.outcome = None;
        self.loadout = self.catalog.available_for(&self.player_config);
        self.rng = Xoshiro256PlusPlus::seed_from_u64(self.config.rng_seed);
        self.log = CombatLog::default();
        self.info("Encounter reset".into());
        info!(target: "gate_core::encounter", "Encounter reset");
        self.emit_snapshot();
    }

    /// Switch role. Always a full restart, never a mid-fight mutation.
    pub fn reconfigure(&mut self, role: Role) {
        self.player_config.role = role;
        self.reset();
        self.info(format!("Role changed to {role}"));
    }

    /// Replace the slotted skills. Every id must exist and pass gating.
    pub fn set_skills(&mut self, ids: &[&str]) -> CombatResult<()> {
        for id in ids {
            let ability = self
                .catalog
                .get(id)
                .ok_or_else(|| CombatError::InvalidAbility {
                    id: id.to_string(),
                    reason: "not in catalog".into(),
                })?;
            if !ability.def().gating.allows(&self.player_config) {
                return Err(CombatError::InvalidAbility {
                    id: id.to_string(),
                    reason: "not available to this player".into(),
                });
            }
        }
        self.loadout = ids.iter().map(|s| s.to_string()).collect();
        self.emit_snapshot();
        Ok(())
    }

    // ------------------------------------------------------------------
    // Target selection (multi-enemy)
    // ------------------------------------------------------------------

    pub fn select_target(&mut self, index: usize) -> ActionResult {
        let Some(entry) = self.roster.get(index) else {
            return self.reject(RejectReason::InvalidTarget(format!("no enemy #{index}")));
        };
        if entry.is_defeated {
            let why = format!("{} is already defeated", entry.name);
            return self.reject(RejectReason::InvalidTarget(why));
        }
        if self.lifecycle == Lifecycle::Defeat {
            return self.reject(RejectReason::NotRunning);
        }
        if self.mode == Mode::Discrete && self.is_running() && self.phase != TurnPhase::PlayerTurn {
            return self.reject(RejectReason::WrongPhase);
        }
        if index == self.active_index && self.lifecycle != Lifecycle::Victory {
            return ActionResult::Applied;
        }

        self.write_back_active();
        self.load_enemy(index);
        let msg = format!("Now targeting {}", self.enemy.name);
        self.info(msg);
        self.emit_snapshot();
        ActionResult::Applied
    }

    /// After a victory with enemies left, move on to the next one.
    pub fn advance_roster(&mut self) -> ActionResult {
        if self.lifecycle != Lifecycle::Victory {
            return self.reject(RejectReason::WrongPhase);
        }
        match self.roster.next_undefeated(self.active_index) {
            Some(next) => self.select_target(next),
            None => self.reject(RejectReason::InvalidTarget("no enemies left".into())),
        }
    }

    fn write_back_active(&mut self) {
        let hp = self.enemy.health.current();
        if let Some(entry) = self.roster.get_mut(self.active_index) {
            entry.current_hp = Some(hp);
        }
    }

    fn load_enemy(&mut self, index: usize) {
        let Some(entry) = self.roster.get(index) else {
            return;
        };
        self.enemy = Combatant::enemy(entry);
        if let Some(mut previous) = self.boss.take() {
            previous.calm();
            self.parked_bosses.insert(self.active_index, previous);
        }
        // enrage and special counters survive a target switch
        self.boss = if entry.is_boss {
            let parked = self.parked_bosses.remove(&index);
            Some(parked.unwrap_or_else(|| BossController::new(&entry.name, &self.config)))
        } else {
            None
        };
        self.active_index = index;
        if self.lifecycle == Lifecycle::Victory {
            self.lifecycle = Lifecycle::Running;
            self.phase = TurnPhase::PlayerTurn;
            self.player_defense = DefenseAction::None;
            self.outcome = None;
        }
        self.refresh_intent();
    }

    // ------------------------------------------------------------------
    // Continuous mode
    // ------------------------------------------------------------------

    /// One continuous-mode step.
    pub fn step(&mut self) -> StepOutcome {
        if !self.is_running() {
            return StepOutcome::Idle;
        }
        self.step += 1;
        self.check_boss_phase();

        if let Some(result) = self.resolve_status_ticks() {
            return StepOutcome::Finished(result);
        }
        if let Some(result) = self.player_auto_attacks() {
            return StepOutcome::Finished(result);
        }
        if let Some(result) = self.enemy_auto_attack() {
            return StepOutcome::Finished(result);
        }

        self.decay_statuses();
        self.emit_snapshot();
        StepOutcome::Continue
    }

    /// Cooldown decrementer callback. Returns the time left on the slot.
    pub fn tick_cooldown(&mut self, ability_id: &str, elapsed_ms: u64) -> u64 {
        let left = self.player.cooldowns.tick(ability_id, elapsed_ms);
        if left == 0 {
            debug!(target: "gate_core::encounter", ability = ability_id, "Cooldown ready");
        }
        self.emit_snapshot();
        left
    }

    /// Boss interval callback: Calm → Preparing with a telegraph.
    pub fn begin_boss_special(&mut self) -> bool {
        if !self.is_running() || !self.enemy.is_alive() {
            return false;
        }
        let Some(telegraph) = self.boss.as_mut().and_then(|b| b.begin_prepare()) else {
            return false;
        };
        self.announce(telegraph);
        self.refresh_intent();
        self.emit_snapshot();
        true
    }

    /// Prepare-delay callback: the special lands unless it was interrupted.
    pub fn resolve_boss_special(&mut self) -> StepOutcome {
        if !self.is_running() {
            return StepOutcome::Idle;
        }
        let Some(strike) = self.boss.as_mut().and_then(|b| b.resolve()) else {
            return StepOutcome::Continue;
        };
        match self.land_special(strike, false) {
            Some(result) => StepOutcome::Finished(result),
            None => {
                self.emit_snapshot();
                StepOutcome::Continue
            }
        }
    }

    // ------------------------------------------------------------------
    // Skills
    // ------------------------------------------------------------------

    /// Fire a skill. Discrete mode routes through a full round.
    pub fn use_skill(&mut self, id: &str) -> ActionResult {
        if self.mode == Mode::Discrete {
            return self.act(PlayerAction::Skill(id.to_string()));
        }
        if !self.is_running() {
            return self.reject(RejectReason::NotRunning);
        }
        self.cast_skill(id)
    }

    /// Break a telegraphed special. Rejected with no side effects unless the
    /// boss is preparing.
    pub fn use_interrupt(&mut self) -> ActionResult {
        if self.mode == Mode::Discrete {
            return self.act(PlayerAction::Interrupt);
        }
        if !self.is_running() {
            return self.reject(RejectReason::NotRunning);
        }
        if !self.is_preparing_special() {
            return self.reject(RejectReason::NotPreparing);
        }
        self.cast_skill(INTERRUPT_ID)
    }

    /// Every check a skill must pass, without touching state.
    fn check_skill(&self, id: &str) -> Result<Arc<dyn Ability>, RejectReason> {
        let ability = self
            .catalog
            .get(id)
            .ok_or_else(|| RejectReason::UnknownAbility(id.to_string()))?;
        if !self.loadout.iter().any(|s| s == id) {
            return Err(RejectReason::NotInLoadout(id.to_string()));
        }
        if ability.effects().contains(&AbilityEffect::Interrupt) && !self.is_preparing_special() {
            return Err(RejectReason::NotPreparing);
        }
        let remaining_ms = self.player.cooldowns.remaining(id);
        if remaining_ms > 0 {
            return Err(RejectReason::OnCooldown {
                id: id.to_string(),
                remaining_ms,
            });
        }
        if !self.player.can_afford(&ability.cost()) {
            return Err(RejectReason::InsufficientResources(ability.name().to_string()));
        }
        let hostile = ability.target().is_hostile();
        if hostile && !self.enemy.is_alive() {
            return Err(RejectReason::InvalidTarget("target is dead".into()));
        }
        let target = hostile.then_some(&self.enemy);
        if !ability.precondition(&self.player, target) {
            return Err(RejectReason::PreconditionFailed(id.to_string()));
        }
        Ok(ability)
    }

    fn cast_skill(&mut self, id: &str) -> ActionResult {
        let ability = match self.check_skill(id) {
            Ok(ability) => ability,
            Err(reason) => return self.reject(reason),
        };

        self.player.spend(&ability.cost());
        self.player
            .cooldowns
            .start(ability.id(), ability.cooldown_ms());
        if ability.cooldown_ms() > 0 {
            self.started_cooldowns.push(ability.id().to_string());
        }
        let msg = format!("{} uses {}", self.player.name, ability.name());
        self.record(LogKind::Action, EventKind::Skill, msg);

        self.resolve_effects(ability.as_ref());

        if !self.enemy.is_alive() {
            if let Some(msg) = ability.on_kill(&mut self.player) {
                self.record(LogKind::Action, EventKind::Skill, msg);
            }
            return ActionResult::Finished(self.finish(EncounterResult::Victory));
        }
        self.emit_snapshot();
        ActionResult::Applied
    }

    fn resolve_effects(&mut self, ability: &dyn Ability) {
        let rank = self.player.rank;
        for effect in ability.effects() {
            if effect.is_hostile() && !self.enemy.is_alive() {
                break;
            }
            match *effect {
                AbilityEffect::Damage { amount } => {
                    let dmg = effective_damage(amount, rank);
                    self.hit_enemy(dmg, ability.name());
                    if ability.target() == TargetType::AllEnemies {
                        self.splash_roster(dmg);
                    }
                }
                AbilityEffect::Heal { amount } => {
                    let healed = self.player.heal(amount);
                    let msg = format!(
                        "{} heals {} ({}/{})",
                        self.player.name,
                        healed,
                        self.player.health.current(),
                        self.player.health.max()
                    );
                    self.record(LogKind::Heal, EventKind::Heal, msg);
                }
                AbilityEffect::Shield { amount } => {
                    let gained = self.player.add_shield(amount);
                    let msg = format!("{} gains a {} point shield", self.player.name, gained);
                    self.record(LogKind::Status, EventKind::Status, msg);
                }
                AbilityEffect::Fortify {
                    reduction_pct,
                    duration,
                } => {
                    let effect = StatusEffect::new(StatusType::Fortify, duration, reduction_pct);
                    self.apply_to_player(effect);
                }
                AbilityEffect::Focus { duration } => {
                    self.apply_to_player(StatusEffect::new(StatusType::Focus, duration, 0));
                }
                AbilityEffect::Bleed { per_step, duration } => {
                    let value = effective_damage(per_step, rank);
                    self.apply_to_enemy(StatusEffect::new(StatusType::Bleed, duration, value));
                }
                AbilityEffect::Burn { per_step, duration } => {
                    let value = effective_damage(per_step, rank);
                    self.apply_to_enemy(StatusEffect::new(StatusType::Burn, duration, value));
                }
                AbilityEffect::WeakSpot {
                    multiplier_pct,
                    duration,
                } => {
                    let effect = StatusEffect::new(StatusType::WeakSpot, duration, multiplier_pct);
                    self.apply_to_enemy(effect);
                }
                AbilityEffect::Stun { duration } => {
                    self.apply_to_enemy(StatusEffect::new(StatusType::Stunned, duration, 0));
                }
                AbilityEffect::RestoreStamina { amount } => {
                    let restored = self
                        .player
                        .stamina
                        .as_mut()
                        .map(|p| p.restore(amount))
                        .unwrap_or(0);
                    let msg = format!("{} recovers {} stamina", self.player.name, restored);
                    self.record(LogKind::Heal, EventKind::Heal, msg);
                }
                AbilityEffect::Interrupt => {
                    if self.boss.as_mut().is_some_and(|b| b.interrupt()) {
                        let msg = format!("{}'s special attack is interrupted!", self.enemy.name);
                        self.record(LogKind::Telegraph, EventKind::Status, msg);
                        // the enemy picks a fresh action on its turn
                        self.enemy_intent = None;
                    }
                }
            }
        }
    }

    /// Area damage also lands on the benched roster entries.
    fn splash_roster(&mut self, dmg: u32) {
        let active = self.active_index;
        let mut fallen = Vec::new();
        for (i, entry) in self.roster.entries.iter_mut().enumerate() {
            if i == active || entry.is_defeated {
                continue;
            }
            let hp = entry.hp().saturating_sub(dmg);
            entry.current_hp = Some(hp);
            if hp == 0 {
                entry.is_defeated = true;
                fallen.push(entry.name.clone());
            }
        }
        for name in fallen {
            self.record(LogKind::Damage, EventKind::Damage, format!("{name} is defeated"));
        }
    }

    // ------------------------------------------------------------------
    // Step pieces
    // ------------------------------------------------------------------

    fn check_boss_phase(&mut self) {
        let fraction = self.enemy.health.fraction();
        if self.boss.as_mut().is_some_and(|b| b.check_enrage(fraction)) {
            let msg = format!("{} becomes enraged!", self.enemy.name);
            self.record(LogKind::Status, EventKind::Status, msg);
        }
    }

    /// DOT ticks and passive healing, before anyone acts.
    fn resolve_status_ticks(&mut self) -> Option<EncounterResult> {
        for (kind, value) in self.player.statuses.pending_ticks() {
            let report = self.player.take_direct(value);
            let msg = format!(
                "{} takes {} {} damage ({}/{})",
                self.player.name,
                report.dealt,
                kind,
                report.hp_after,
                self.player.health.max()
            );
            self.record(LogKind::Damage, EventKind::Damage, msg);
        }
        for (kind, value) in self.enemy.statuses.pending_ticks() {
            let report = self.enemy.take_direct(value);
            let msg = format!(
                "{} takes {} {} damage ({}/{})",
                self.enemy.name,
                report.dealt,
                kind,
                report.hp_after,
                self.enemy.health.max()
            );
            self.record(LogKind::Damage, EventKind::Damage, msg);
            self.check_boss_phase();
        }

        let regen = self.player.passive_regen();
        if regen > 0 && self.player.is_alive() {
            let healed = self.player.heal(regen);
            if healed > 0 {
                let msg = format!("{} regenerates {}", self.player.name, healed);
                self.record(LogKind::Heal, EventKind::Heal, msg);
            }
        }

        if !self.enemy.is_alive() {
            return Some(self.finish(EncounterResult::Victory));
        }
        if !self.player.is_alive() {
            return Some(self.finish(EncounterResult::Defeat));
        }
        None
    }

    fn stun_penalty(&self, who: &Combatant, dmg: u32) -> u32 {
        if who.statuses.has(StatusType::Stunned) {
            (dmg as u64 * (100 - self.config.stun_attack_penalty_pct.min(100)) as u64 / 100) as u32
        } else {
            dmg
        }
    }

    fn player_swing_damage(&mut self) -> u32 {
        let mut dmg = effective_damage(self.player.attack, self.player.rank);
        self.player.auto_attacks += 1;
        let doubles = self
            .player
            .role
            .is_some_and(|r| r.doubles_every_third_attack());
        if doubles && self.player.auto_attacks % crate::constants::MARKSMAN_DOUBLE_EVERY == 0 {
            dmg *= 2;
        }
        self.stun_penalty(&self.player, dmg)
    }

    /// Player's auto-attack volley; Focus adds a swing.
    fn player_auto_attacks(&mut self) -> Option<EncounterResult> {
        let swings = if self.player.statuses.has(StatusType::Focus) {
            2
        } else {
            1
        };
        for _ in 0..swings {
            let dmg = self.player_swing_damage();
            self.hit_enemy(dmg, "auto-attack");
            if !self.enemy.is_alive() {
                return Some(self.finish(EncounterResult::Victory));
            }
        }
        None
    }

    /// Enemy damage for a normal swing: rank, stun, enrage.
    fn enemy_swing_damage(&self, heavy: bool) -> u32 {
        let mut dmg = effective_damage(self.enemy.attack, self.enemy.rank);
        if heavy {
            dmg = dmg * crate::constants::ENEMY_HEAVY_ATTACK_PCT / 100;
        }
        let dmg = self.stun_penalty(&self.enemy, dmg);
        match &self.boss {
            Some(boss) => boss.outgoing_damage(dmg),
            None => dmg,
        }
    }

    fn enemy_auto_attack(&mut self) -> Option<EncounterResult> {
        if !self.enemy.is_alive() {
            return None;
        }
        let dmg = self.enemy_swing_damage(false);
        self.hit_player(dmg, "attack");
        if !self.player.is_alive() {
            return Some(self.finish(EncounterResult::Defeat));
        }
        None
    }

    /// Special attack landing: mitigated like a normal hit, then stun.
    /// `blockable` lets a discrete-mode block shave the hit.
    fn land_special(&mut self, strike: SpecialStrike, blockable: bool) -> Option<EncounterResult> {
        let dmg = if blockable && self.player_defense == DefenseAction::Block {
            blocked_damage(strike.damage, self.player.rank)
        } else {
            strike.damage
        };
        self.hit_player(dmg, "special attack");
        self.apply_to_player(StatusEffect::new(StatusType::Stunned, strike.stun_steps, 0));
        if let Some(boss) = self.boss.as_mut() {
            boss.finish_resolve();
        }
        self.refresh_intent();
        if !self.player.is_alive() {
            return Some(self.finish(EncounterResult::Defeat));
        }
        None
    }

    fn announce(&mut self, telegraph: Telegraph) {
        let msg = format!(
            "{} is coming ({} damage)! Interrupt it!",
            telegraph.attack_name, telegraph.damage
        );
        self.record(LogKind::Telegraph, EventKind::Info, msg);
    }

    fn decay_statuses(&mut self) {
        for kind in self.player.decay_statuses() {
            let msg = format!("{} expired on {}", kind, self.player.name);
            self.record(LogKind::Status, EventKind::Status, msg);
        }
        for kind in self.enemy.decay_statuses() {
            let msg = format!("{} expired on {}", kind, self.enemy.name);
            self.record(LogKind::Status, EventKind::Status, msg);
        }
    }

    // ------------------------------------------------------------------
    // Damage plumbing
    // ------------------------------------------------------------------

    fn hit_enemy(&mut self, raw: u32, source: &str) -> HitReport {
        let raw = if self.enemy.guarding {
            blocked_damage(raw, self.enemy.rank)
        } else {
            raw
        };
        let report = self.enemy.take_hit(raw);
        let attacker = self.player.name.clone();
        let target = self.enemy.name.clone();
        let max = self.enemy.health.max();
        self.report_hit(&attacker, &target, source, report, max);
        self.check_boss_phase();
        report
    }

    fn hit_player(&mut self, raw: u32, source: &str) -> HitReport {
        let report = self.player.take_hit(raw);
        let attacker = self.enemy.name.clone();
        let target = self.player.name.clone();
        let max = self.player.health.max();
        self.report_hit(&attacker, &target, source, report, max);
        report
    }

    fn report_hit(&mut self, attacker: &str, target: &str, source: &str, report: HitReport, max: u32) {
        if report.absorbed > 0 {
            let msg = format!("{target}'s shield absorbs {}", report.absorbed);
            self.record(LogKind::Damage, EventKind::Damage, msg);
        }
        if report.shield_broken {
            self.record(
                LogKind::Status,
                EventKind::Status,
                format!("{target}'s shield breaks!"),
            );
        }
        let msg = format!(
            "{attacker}'s {source} hits {target} for {} ({}/{max})",
            report.dealt, report.hp_after
        );
        self.record(LogKind::Damage, EventKind::Damage, msg);
    }

    fn apply_to_player(&mut self, effect: StatusEffect) {
        if self.player.apply_status(effect) {
            let msg = format!(
                "{} gains {} ({} steps)",
                self.player.name, effect.effect_type, effect.remaining
            );
            self.record(LogKind::Status, EventKind::Status, msg);
        }
    }

    fn apply_to_enemy(&mut self, effect: StatusEffect) {
        if self.enemy.apply_status(effect) {
            let msg = format!(
                "{} is afflicted with {} ({} steps)",
                self.enemy.name, effect.effect_type, effect.remaining
            );
            self.record(LogKind::Status, EventKind::Status, msg);
        }
    }

    // ------------------------------------------------------------------
    // End of encounter
    // ------------------------------------------------------------------

    fn finish(&mut self, result: EncounterResult) -> EncounterResult {
        self.lifecycle = match result {
            EncounterResult::Victory => Lifecycle::Victory,
            EncounterResult::Defeat => Lifecycle::Defeat,
        };
        if let Some(boss) = self.boss.as_mut() {
            boss.calm();
        }
        self.pending_action = None;
        self.enemy_intent = None;

        let hp = self.enemy.health.current();
        if let Some(entry) = self.roster.get_mut(self.active_index) {
            entry.current_hp = Some(hp);
            if result == EncounterResult::Victory {
                entry.is_defeated = true;
            }
        }

        let (kind, msg) = match result {
            EncounterResult::Victory => (
                EventKind::Victory,
                format!("{} is defeated!", self.enemy.name),
            ),
            EncounterResult::Defeat => (
                EventKind::Defeat,
                format!("{} has fallen", self.player.name),
            ),
        };
        self.record(LogKind::System, kind, msg);
        info!(target: "gate_core::encounter", ?result, step = self.step, "Encounter finished");
        self.emit_snapshot();

        if self.outcome.is_none() {
            let outcome = EncounterOutcome {
                result,
                roster_index: self.active_index,
                all_defeated: self.roster.all_defeated(),
                steps: self.step,
            };
            self.listener.on_encounter_complete(&outcome);
            self.outcome = Some(outcome);
        }
        result
    }

    // ------------------------------------------------------------------
    // Events & snapshots
    // ------------------------------------------------------------------

    fn record(&mut self, log_kind: LogKind, event_kind: EventKind, message: String) {
        debug!(target: "gate_core::encounter", step = self.step, "{}", message);
        let timestamp = self.log.push(self.step, log_kind, message.clone()).timestamp;
        self.listener.on_combat_event(&CombatEvent {
            kind: event_kind,
            message,
            timestamp,
        });
    }

    fn info(&mut self, message: String) {
        self.record(LogKind::System, EventKind::Info, message);
    }

    fn reject(&mut self, reason: RejectReason) -> ActionResult {
        debug!(target: "gate_core::encounter", ?reason, "Action rejected");
        self.info(reason.to_string());
        ActionResult::Rejected(reason)
    }

    fn refresh_intent(&mut self) {
        self.enemy_intent = match self.mode {
            Mode::Continuous => None,
            Mode::Discrete if self.is_preparing_special() => Some(EnemyAction::Special),
            Mode::Discrete => Some(predict_action(
                self.enemy.behavior.unwrap_or_default(),
                self.enemy.health.fraction(),
                self.step + 1,
            )),
        };
    }

    pub fn snapshot(&self) -> EncounterSnapshot {
        let skills = self
            .loadout
            .iter()
            .filter_map(|id| self.catalog.get(id))
            .map(|ability| SkillView {
                id: ability.id().to_string(),
                name: ability.name().to_string(),
                cooldown_remaining_ms: self.player.cooldowns.remaining(ability.id()),
                affordable: self.player.can_afford(&ability.cost()),
            })
            .collect();
        let boss = self.boss.as_ref().map(|b| BossView {
            combat_phase: b.combat_phase,
            special_phase: b.special_phase,
            is_enraged: b.is_enraged(),
            is_preparing_special: b.is_preparing(),
            special_damage: b.special_damage,
            attack_name: b.attack_name.clone(),
        });
        EncounterSnapshot {
            mode: self.mode,
            lifecycle: self.lifecycle,
            is_running: self.is_running(),
            phase: self.phase,
            step: self.step,
            player: self.player.clone(),
            enemy: self.enemy.clone(),
            active_index: self.active_index,
            roster: self.roster.entries.clone(),
            is_fighting_boss: self.boss.is_some(),
            boss,
            enemy_intent: self.enemy_intent,
            skills,
            log: self.log.entries().to_vec(),
        }
    }

    fn emit_snapshot(&self) {
        if !self.listener.wants_snapshots() {
            return;
        }
        self.listener.on_state_update(&self.snapshot());
    }
}
