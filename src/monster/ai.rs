//! Enemy round behavior.
//!
//! Deterministic mapping from behavior tag, health and round number to the
//! action the targeted enemy takes. The same function feeds the intent shown
//! to the player before they commit.

use serde::{Deserialize, Serialize};

use super::EnemyBehavior;

/// What an enemy does on its half of a round
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EnemyAction {
    Attack,
    HeavyAttack,
    Guard,
    /// Telegraphed boss special resolves instead of a normal action
    Special,
}

impl EnemyAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            EnemyAction::Attack => "attack",
            EnemyAction::HeavyAttack => "heavy attack",
            EnemyAction::Guard => "guard",
            EnemyAction::Special => "special",
        }
    }
}

/// Pick the enemy action for `round` (1-based).
pub fn predict_action(behavior: EnemyBehavior, hp_fraction: f32, round: u64) -> EnemyAction {
    match behavior {
        EnemyBehavior::Aggressive => {
            if round % 3 == 0 {
                EnemyAction::HeavyAttack
            } else {
                EnemyAction::Attack
            }
        }
        EnemyBehavior::Defensive => {
            if hp_fraction <= 0.5 && round % 2 == 1 {
                EnemyAction::Guard
            } else {
                EnemyAction::Attack
            }
        }
        EnemyBehavior::Balanced => {
            if hp_fraction <= 0.3 && round % 2 == 0 {
                EnemyAction::Guard
            } else if round % 4 == 0 {
                EnemyAction::HeavyAttack
            } else {
                EnemyAction::Attack
            }
        }
    }
}
