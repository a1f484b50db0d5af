//! Immutable copies of encounter state handed to listeners.

use serde::{Deserialize, Serialize};

use super::events::LogEntry;
use super::{Lifecycle, Mode, TurnPhase};
use crate::boss::{BossCombatPhase, BossSpecialPhase};
use crate::combat::Combatant;
use crate::monster::{EnemyAction, RosterEntry};

/// Boss flags as the UI reads them
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BossView {
    pub combat_phase: BossCombatPhase,
    pub special_phase: BossSpecialPhase,
    pub is_enraged: bool,
    pub is_preparing_special: bool,
    pub special_damage: u32,
    pub attack_name: String,
}

/// One slotted skill with its live availability
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkillView {
    pub id: String,
    pub name: String,
    pub cooldown_remaining_ms: u64,
    pub affordable: bool,
}

impl SkillView {
    pub fn is_ready(&self) -> bool {
        self.cooldown_remaining_ms == 0 && self.affordable
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EncounterSnapshot {
    pub mode: Mode,
    pub lifecycle: Lifecycle,
    pub is_running: bool,
    pub phase: TurnPhase,
    pub step: u64,
    pub player: Combatant,
    pub enemy: Combatant,
    pub active_index: usize,
    pub roster: Vec<RosterEntry>,
    pub is_fighting_boss: bool,
    pub boss: Option<BossView>,
    /// Discrete mode: what the targeted enemy will do this round
    pub enemy_intent: Option<EnemyAction>,
    pub skills: Vec<SkillView>,
    pub log: Vec<LogEntry>,
}

impl EncounterSnapshot {
    pub fn skill(&self, id: &str) -> Option<&SkillView> {
        self.skills.iter().find(|s| s.id == id)
    }

    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_default()
    }
}
