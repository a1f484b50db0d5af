//! Boss phase and telegraph controller.
//!
//! Two independent axes:
//! - `BossCombatPhase`: Normal → Enraged, one-way, at the health threshold
//! - `BossSpecialPhase`: Calm → Preparing → Resolving → Calm, with an
//!   interrupt edge Preparing → Calm
//!
//! The controller only moves between states; when to call it (timers in
//! continuous mode, round counts in discrete mode) is up to the scheduler.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::CombatConfig;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum BossCombatPhase {
    #[default]
    Normal,
    Enraged,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum BossSpecialPhase {
    #[default]
    Calm,
    Preparing, // telegraph visible, interruptible
    Resolving, // hit is landing
}

/// Warning emitted when a special starts preparing
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Telegraph {
    pub attack_name: String,
    pub damage: u32,
}

/// The special attack as it lands, before the target's mitigation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SpecialStrike {
    pub damage: u32,
    pub stun_steps: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BossController {
    pub combat_phase: BossCombatPhase,
    pub special_phase: BossSpecialPhase,
    pub attack_name: String,
    pub special_damage: u32,
    pub stun_steps: u32,
    enrage_hp_fraction: f32,
    enrage_bonus_pct: u32,
    special_every_rounds: u64,
    rounds_since_special: u64,
    pub specials_landed: u32,
    pub specials_interrupted: u32,
}

impl BossController {
    pub fn new(boss_name: &str, config: &CombatConfig) -> Self {
        Self {
            combat_phase: BossCombatPhase::Normal,
            special_phase: BossSpecialPhase::Calm,
            attack_name: format!("{boss_name}'s Cataclysm"),
            special_damage: config.boss_special_damage,
            stun_steps: config.boss_special_stun_steps,
            enrage_hp_fraction: config.enrage_hp_fraction,
            enrage_bonus_pct: config.enrage_damage_bonus_pct,
            special_every_rounds: config.boss_special_every_rounds.max(1),
            rounds_since_special: 0,
            specials_landed: 0,
            specials_interrupted: 0,
        }
    }

    pub fn is_enraged(&self) -> bool {
        self.combat_phase == BossCombatPhase::Enraged
    }

    pub fn is_preparing(&self) -> bool {
        self.special_phase == BossSpecialPhase::Preparing
    }

    /// Returns true only on the Normal → Enraged edge.
    pub fn check_enrage(&mut self, hp_fraction: f32) -> bool {
        if self.combat_phase == BossCombatPhase::Normal && hp_fraction <= self.enrage_hp_fraction {
            self.combat_phase = BossCombatPhase::Enraged;
            debug!(target: "gate_core::boss", hp_fraction, "Boss enraged");
            return true;
        }
        false
    }

    /// Damage the boss deals after the enrage bonus
    pub fn outgoing_damage(&self, base: u32) -> u32 {
        if self.is_enraged() {
            (base as u64 * (100 + self.enrage_bonus_pct) as u64 / 100) as u32
        } else {
            base
        }
    }

    /// Calm → Preparing. `None` if a special is already in flight.
    pub fn begin_prepare(&mut self) -> Option<Telegraph> {
        if self.special_phase != BossSpecialPhase::Calm {
            return None;
        }
        self.special_phase = BossSpecialPhase::Preparing;
        Some(Telegraph {
            attack_name: self.attack_name.clone(),
            damage: self.special_damage,
        })
    }

    /// Preparing → Calm without effect.
    pub fn interrupt(&mut self) -> bool {
        if !self.is_preparing() {
            return false;
        }
        self.special_phase = BossSpecialPhase::Calm;
        self.specials_interrupted += 1;
        true
    }

    /// Preparing → Resolving. The caller applies the strike and then calls
    /// [`BossController::finish_resolve`].
    pub fn resolve(&mut self) -> Option<SpecialStrike> {
        if !self.is_preparing() {
            return None;
        }
        self.special_phase = BossSpecialPhase::Resolving;
        self.specials_landed += 1;
        Some(SpecialStrike {
            damage: self.outgoing_damage(self.special_damage),
            stun_steps: self.stun_steps,
        })
    }

    pub fn finish_resolve(&mut self) {
        if self.special_phase == BossSpecialPhase::Resolving {
            self.special_phase = BossSpecialPhase::Calm;
        }
    }

    /// Discrete mode: count a closed round, telegraph every N rounds.
    pub fn on_round_closed(&mut self) -> Option<Telegraph> {
        if self.special_phase != BossSpecialPhase::Calm {
            return None;
        }
        self.rounds_since_special += 1;
        if self.rounds_since_special < self.special_every_rounds {
            return None;
        }
        self.rounds_since_special = 0;
        self.begin_prepare()
    }

    /// Drop any in-flight special (timers torn down, target switched).
    pub fn calm(&mut self) {
        self.special_phase = BossSpecialPhase::Calm;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn boss() -> BossController {
        BossController::new("Orc Warlord", &CombatConfig::default())
    }

    #[test]
    fn test_enrage_is_one_way() {
        let mut ctrl = boss();
        assert!(!ctrl.check_enrage(0.55));
        assert!(ctrl.check_enrage(0.48));
        assert!(!ctrl.check_enrage(0.40), "edge fires once");
        assert!(!ctrl.check_enrage(0.90));
        assert!(ctrl.is_enraged(), "healing never reverts");
    }

    #[test]
    fn test_enrage_at_exact_threshold() {
        let mut ctrl = boss();
        assert!(ctrl.check_enrage(0.5));
    }

    #[test]
    fn test_enrage_bonus() {
        let mut ctrl = boss();
        assert_eq!(ctrl.outgoing_damage(10), 10);
        ctrl.check_enrage(0.1);
        assert_eq!(ctrl.outgoing_damage(10), 15);
    }

    #[test]
    fn test_special_cycle() {
        let mut ctrl = boss();
        assert!(ctrl.resolve().is_none(), "nothing to resolve while calm");
        let telegraph = ctrl.begin_prepare().unwrap();
        assert_eq!(telegraph.damage, 40);
        assert!(ctrl.begin_prepare().is_none(), "no double telegraph");

        let strike = ctrl.resolve().unwrap();
        assert_eq!(strike.damage, 40);
        assert_eq!(ctrl.special_phase, BossSpecialPhase::Resolving);
        ctrl.finish_resolve();
        assert_eq!(ctrl.special_phase, BossSpecialPhase::Calm);
    }

    #[test]
    fn test_interrupt_only_while_preparing() {
        let mut ctrl = boss();
        assert!(!ctrl.interrupt());
        ctrl.begin_prepare();
        assert!(ctrl.interrupt());
        assert_eq!(ctrl.special_phase, BossSpecialPhase::Calm);
        assert!(ctrl.resolve().is_none(), "interrupted special never lands");
        assert_eq!(ctrl.specials_interrupted, 1);
        assert_eq!(ctrl.specials_landed, 0);
    }

    #[test]
    fn test_round_counter() {
        let mut ctrl = boss();
        assert!(ctrl.on_round_closed().is_none());
        assert!(ctrl.on_round_closed().is_none());
        assert!(ctrl.on_round_closed().is_some());
        assert!(ctrl.is_preparing());
        // counter pauses while a special is in flight
        assert!(ctrl.on_round_closed().is_none());
    }
}
