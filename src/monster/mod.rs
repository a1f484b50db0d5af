//! Enemy roster entries supplied by the gate generator.
//!
//! The roster is read-only input except for the `current_hp` / `is_defeated`
//! bookkeeping written back as enemies are fought and defeated.

use serde::{Deserialize, Serialize};

use crate::combat::rank::Rank;
use crate::error::{CombatError, CombatResult};

pub mod ai;

pub use ai::{predict_action, EnemyAction};

/// Behavior pattern, drives the enemy's round action in discrete mode
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum EnemyBehavior {
    Aggressive, // attacks every round, heavy swings
    Defensive,  // guards when hurt
    #[default]
    Balanced,
}

/// One enemy definition plus write-back fields
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RosterEntry {
    pub id: String,
    pub name: String,
    pub max_health: u32,
    pub auto_attack_damage: u32,
    #[serde(default)]
    pub is_boss: bool,
    #[serde(default)]
    pub rank: Rank,
    #[serde(default)]
    pub behavior: EnemyBehavior,
    #[serde(default)]
    pub current_hp: Option<u32>,
    #[serde(default)]
    pub is_defeated: bool,
}

impl RosterEntry {
    pub fn new(id: &str, name: &str, max_health: u32, auto_attack_damage: u32) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            max_health,
            auto_attack_damage,
            is_boss: false,
            rank: Rank::E,
            behavior: EnemyBehavior::Balanced,
            current_hp: None,
            is_defeated: false,
        }
    }

    pub fn boss(mut self) -> Self {
        self.is_boss = true;
        self
    }

    pub fn with_rank(mut self, rank: Rank) -> Self {
        self.rank = rank;
        self
    }

    pub fn with_behavior(mut self, behavior: EnemyBehavior) -> Self {
        self.behavior = behavior;
        self
    }

    /// Health to load the live copy with
    pub fn hp(&self) -> u32 {
        self.current_hp.unwrap_or(self.max_health).min(self.max_health)
    }
}

/// Ordered enemy list for a multi-encounter run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Roster {
    pub entries: Vec<RosterEntry>,
}

impl Roster {
    pub fn new(entries: Vec<RosterEntry>) -> CombatResult<Self> {
        let roster = Self { entries };
        roster.validate()?;
        Ok(roster)
    }

    pub fn single(entry: RosterEntry) -> CombatResult<Self> {
        Self::new(vec![entry])
    }

    pub fn from_json(json: &str) -> CombatResult<Self> {
        let entries: Vec<RosterEntry> =
            serde_json::from_str(json).map_err(|e| CombatError::InvalidConfig(e.to_string()))?;
        Self::new(entries)
    }

    pub fn validate(&self) -> CombatResult<()> {
        if self.entries.is_empty() {
            return Err(CombatError::EmptyRoster);
        }
        if let Some(bad) = self.entries.iter().find(|e| e.max_health == 0) {
            return Err(CombatError::InvalidConfig(format!(
                "enemy '{}' has zero max_health",
                bad.id
            )));
        }
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&RosterEntry> {
        self.entries.get(index)
    }

    pub fn get_mut(&mut self, index: usize) -> Option<&mut RosterEntry> {
        self.entries.get_mut(index)
    }

    pub fn all_defeated(&self) -> bool {
        self.entries.iter().all(|e| e.is_defeated)
    }

    /// First undefeated entry, searching forward from `after` then wrapping.
    pub fn next_undefeated(&self, after: usize) -> Option<usize> {
        let n = self.entries.len();
        (1..=n)
            .map(|offset| (after + offset) % n)
            .find(|&i| !self.entries[i].is_defeated)
    }

    pub fn first_undefeated(&self) -> Option<usize> {
        self.entries.iter().position(|e| !e.is_defeated)
    }
}
