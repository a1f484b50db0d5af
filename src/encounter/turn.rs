//! Discrete (turn-based) rounds.
//!
//! A round is PlayerTurn → EnemyTurn → RoundEnd. The phases can be driven one
//! at a time (`select_player_action`, `execute_player_action_only`,
//! `execute_enemy_action_only`, `finish_round`) or all at once with `act`.

use rand::Rng;
use serde::{Deserialize, Serialize};

use super::{ActionResult, Encounter, EncounterResult, Lifecycle, Mode, RejectReason, TurnPhase};
use crate::abilities::INTERRUPT_ID;
use crate::combat::defense::{check_defense, DefenseAction, DefenseResult};
use crate::combat::resources::Cost;
use crate::constants::{
    ATTACK_STAMINA_COST, BLOCK_STAMINA_COST, DODGE_STAMINA_COST, RECOVER_STAMINA_GAIN,
    STAMINA_REGEN_PER_ROUND,
};
use crate::encounter::events::{EventKind, LogKind};
use crate::monster::{predict_action, EnemyAction};

/// What the player does with a round
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum PlayerAction {
    Attack,
    Block,
    Dodge,
    Skill(String),
    Interrupt,
    Recover,
}

impl PlayerAction {
    /// Stamina the action itself costs, on top of any skill cost
    pub fn stamina_cost(&self) -> u32 {
        match self {
            PlayerAction::Attack => ATTACK_STAMINA_COST,
            PlayerAction::Block => BLOCK_STAMINA_COST,
            PlayerAction::Dodge => DODGE_STAMINA_COST,
            PlayerAction::Skill(_) | PlayerAction::Interrupt | PlayerAction::Recover => 0,
        }
    }
}

impl Encounter {
    fn check_round_phase(&self, expected: TurnPhase) -> Result<(), RejectReason> {
        if self.mode != Mode::Discrete {
            return Err(RejectReason::WrongPhase);
        }
        if self.lifecycle != Lifecycle::Running {
            return Err(RejectReason::NotRunning);
        }
        if self.phase != expected {
            return Err(RejectReason::WrongPhase);
        }
        Ok(())
    }

    /// Validate and store the player's choice for this round.
    pub fn select_player_action(&mut self, action: PlayerAction) -> ActionResult {
        if let Err(reason) = self.check_round_phase(TurnPhase::PlayerTurn) {
            return self.reject(reason);
        }
        let check = match &action {
            PlayerAction::Skill(id) => self.check_skill(id).map(|_| ()),
            PlayerAction::Interrupt => {
                if self.is_preparing_special() {
                    self.check_skill(INTERRUPT_ID).map(|_| ())
                } else {
                    Err(RejectReason::NotPreparing)
                }
            }
            other => {
                if self.player.can_afford(&Cost::stamina(other.stamina_cost())) {
                    Ok(())
                } else {
                    Err(RejectReason::InsufficientResources(format!("{other:?}")))
                }
            }
        };
        if let Err(reason) = check {
            return self.reject(reason);
        }
        self.pending_action = Some(action);
        ActionResult::Applied
    }

    /// Open the round and resolve the stored player action.
    pub fn execute_player_action_only(&mut self) -> ActionResult {
        if let Err(reason) = self.check_round_phase(TurnPhase::PlayerTurn) {
            return self.reject(reason);
        }
        let Some(action) = self.pending_action.take() else {
            return self.reject(RejectReason::NoPendingAction);
        };

        self.step += 1;
        self.check_boss_phase();
        if let Some(result) = self.resolve_status_ticks() {
            return ActionResult::Finished(result);
        }

        self.player.spend(&Cost::stamina(action.stamina_cost()));
        match &action {
            PlayerAction::Attack => {
                if let Some(result) = self.player_auto_attacks() {
                    return ActionResult::Finished(result);
                }
            }
            PlayerAction::Block => {
                self.player_defense = DefenseAction::Block;
                let msg = format!("{} raises a guard", self.player.name);
                self.record(LogKind::Action, EventKind::Info, msg);
            }
            PlayerAction::Dodge => {
                self.player_defense = DefenseAction::Dodge;
                let msg = format!("{} readies a dodge", self.player.name);
                self.record(LogKind::Action, EventKind::Info, msg);
            }
            PlayerAction::Skill(id) => {
                // A skill that fails its checks here costs the turn.
                if let ActionResult::Finished(result) = self.cast_skill(id) {
                    return ActionResult::Finished(result);
                }
            }
            PlayerAction::Interrupt => {
                if let ActionResult::Finished(result) = self.cast_skill(INTERRUPT_ID) {
                    return ActionResult::Finished(result);
                }
            }
            PlayerAction::Recover => {
                let gained = self
                    .player
                    .stamina
                    .as_mut()
                    .map(|p| p.restore(RECOVER_STAMINA_GAIN))
                    .unwrap_or(0);
                let msg = format!("{} recovers {} stamina", self.player.name, gained);
                self.record(LogKind::Action, EventKind::Heal, msg);
            }
        }

        // an enemy guard lasts through one player action
        self.enemy.guarding = false;
        self.phase = TurnPhase::EnemyTurn;
        ActionResult::Applied
    }

    /// Resolve the targeted enemy's action for the round. The enemy does what
    /// its intent showed at the start of the round; an interrupted special
    /// falls back to a fresh prediction.
    pub fn execute_enemy_action_only(&mut self) -> ActionResult {
        if let Err(reason) = self.check_round_phase(TurnPhase::EnemyTurn) {
            return self.reject(reason);
        }

        let action = match self.enemy_intent {
            _ if self.is_preparing_special() => EnemyAction::Special,
            Some(intent) if intent != EnemyAction::Special => intent,
            _ => predict_action(
                self.enemy.behavior.unwrap_or_default(),
                self.enemy.health.fraction(),
                self.step,
            ),
        };

        match action {
            EnemyAction::Special => {
                if let Some(strike) = self.boss.as_mut().and_then(|b| b.resolve()) {
                    if let Some(result) = self.land_special(strike, true) {
                        return ActionResult::Finished(result);
                    }
                }
            }
            EnemyAction::Attack | EnemyAction::HeavyAttack => {
                let heavy = action == EnemyAction::HeavyAttack;
                let dmg = self.enemy_swing_damage(heavy);
                let roll = self.rng.gen_range(0..100);
                let defense = check_defense(
                    self.player_defense,
                    dmg,
                    self.player.rank,
                    self.enemy.rank,
                    roll,
                );
                let source = if heavy { "heavy attack" } else { "attack" };
                match defense {
                    DefenseResult::DodgeSuccess => {
                        let msg = format!("{} dodges the {}", self.player.name, source);
                        self.record(LogKind::Action, EventKind::Info, msg);
                    }
                    other => {
                        if other == DefenseResult::DodgeFailed {
                            let msg = format!("{} fails to dodge", self.player.name);
                            self.record(LogKind::Action, EventKind::Info, msg);
                        }
                        if let DefenseResult::BlockAbsorb { absorbed, .. } = other {
                            let msg = format!("{} blocks {}", self.player.name, absorbed);
                            self.record(LogKind::Action, EventKind::Info, msg);
                        }
                        self.hit_player(other.remaining(dmg), source);
                    }
                }
            }
            EnemyAction::Guard => {
                self.enemy.guarding = true;
                let msg = format!("{} takes a defensive stance", self.enemy.name);
                self.record(LogKind::Action, EventKind::Info, msg);
            }
        }

        if !self.player.is_alive() {
            return ActionResult::Finished(self.finish(EncounterResult::Defeat));
        }
        self.phase = TurnPhase::RoundEnd;
        ActionResult::Applied
    }

    /// Close the round: decay, regen, cooldowns, boss round counter.
    pub fn finish_round(&mut self) -> ActionResult {
        if let Err(reason) = self.check_round_phase(TurnPhase::RoundEnd) {
            return self.reject(reason);
        }

        self.decay_statuses();
        self.player_defense = DefenseAction::None;
        if let Some(stamina) = self.player.stamina.as_mut() {
            stamina.restore(STAMINA_REGEN_PER_ROUND);
        }
        self.player.cooldowns.tick_all(self.config.round_duration_ms);
        self.started_cooldowns.clear();

        let telegraph = self.boss.as_mut().and_then(|b| b.on_round_closed());
        if let Some(telegraph) = telegraph {
            self.announce(telegraph);
        }

        self.phase = TurnPhase::PlayerTurn;
        self.refresh_intent();
        self.emit_snapshot();
        ActionResult::Applied
    }

    /// Run a whole round with one action.
    pub fn act(&mut self, action: PlayerAction) -> ActionResult {
        let selected = self.select_player_action(action);
        if selected.is_rejected() {
            return selected;
        }
        for phase in [
            Self::execute_player_action_only,
            Self::execute_enemy_action_only,
            Self::finish_round,
        ] {
            match phase(self) {
                ActionResult::Applied => {}
                done => return done,
            }
        }
        ActionResult::Applied
    }
}
