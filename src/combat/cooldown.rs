//! Per-ability cooldown state.
//!
//! Cooldowns are wall-clock countdowns in milliseconds. The tracker only
//! holds the numbers; who decrements them (a timer per slot in continuous
//! mode, the round close in discrete mode) is the scheduler's business.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// ability_id → remaining cooldown in ms
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CooldownTracker {
    cooldowns: BTreeMap<String, u64>,
}

impl CooldownTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Check if ability is off cooldown
    pub fn is_ready(&self, ability_id: &str) -> bool {
        self.remaining(ability_id) == 0
    }

    /// Start (or restart) a cooldown
    pub fn start(&mut self, ability_id: &str, duration_ms: u64) {
        if duration_ms == 0 {
            self.cooldowns.remove(ability_id);
        } else {
            self.cooldowns.insert(ability_id.to_string(), duration_ms);
        }
    }

    pub fn remaining(&self, ability_id: &str) -> u64 {
        self.cooldowns.get(ability_id).copied().unwrap_or(0)
    }

    /// Decrement one slot. Returns the remaining time; a slot reaching zero
    /// is dropped.
    pub fn tick(&mut self, ability_id: &str, elapsed_ms: u64) -> u64 {
        let Some(cd) = self.cooldowns.get_mut(ability_id) else {
            return 0;
        };
        *cd = cd.saturating_sub(elapsed_ms);
        let left = *cd;
        if left == 0 {
            self.cooldowns.remove(ability_id);
        }
        left
    }

    /// Decrement every slot. Returns the ids that became ready.
    pub fn tick_all(&mut self, elapsed_ms: u64) -> Vec<String> {
        let mut ready = Vec::new();
        for (id, cd) in self.cooldowns.iter_mut() {
            *cd = cd.saturating_sub(elapsed_ms);
            if *cd == 0 {
                ready.push(id.clone());
            }
        }
        self.cooldowns.retain(|_, cd| *cd > 0);
        ready
    }

    pub fn active(&self) -> impl Iterator<Item = (&str, u64)> {
        self.cooldowns.iter().map(|(id, cd)| (id.as_str(), *cd))
    }

    pub fn active_count(&self) -> usize {
        self.cooldowns.len()
    }
}
