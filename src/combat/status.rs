//! Status effects and buff/debuff bookkeeping.
//!
//! Effects are step-counted. A kind is present at most once per combatant;
//! re-application overwrites duration and value instead of stacking.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Status effect types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StatusType {
    // Damage over time
    Bleed, // value = damage per step
    Burn,  // value = damage per step

    // Debuffs
    WeakSpot, // value = incoming damage multiplier, percent
    Stunned,  // auto-attacks weakened

    // Buffs
    Fortify, // value = damage reduction, percent
    Focus,   // one extra auto-attack per step
}

impl StatusType {
    pub fn as_str(&self) -> &'static str {
        match self {
            StatusType::Bleed => "Bleed",
            StatusType::Burn => "Burn",
            StatusType::WeakSpot => "Weak-Spot",
            StatusType::Stunned => "Stunned",
            StatusType::Fortify => "Fortify",
            StatusType::Focus => "Focus",
        }
    }

    pub fn is_damage_over_time(&self) -> bool {
        matches!(self, StatusType::Bleed | StatusType::Burn)
    }
}

impl fmt::Display for StatusType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single status effect instance
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusEffect {
    pub effect_type: StatusType,
    pub remaining: u32, // steps remaining
    pub value: u32,
}

impl StatusEffect {
    pub fn new(effect_type: StatusType, duration: u32, value: u32) -> Self {
        Self {
            effect_type,
            remaining: duration,
            value,
        }
    }

    pub fn is_expired(&self) -> bool {
        self.remaining == 0
    }
}

/// Ordered list of active effects on one combatant
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusEffects {
    effects: Vec<StatusEffect>,
}

impl StatusEffects {
    /// Apply an effect. An existing instance of the same kind is refreshed to
    /// the new duration and value; a zero-duration application is ignored.
    pub fn apply(&mut self, effect: StatusEffect) -> bool {
        if effect.remaining == 0 {
            return false;
        }
        if let Some(existing) = self
            .effects
            .iter_mut()
            .find(|e| e.effect_type == effect.effect_type)
        {
            existing.remaining = effect.remaining;
            existing.value = effect.value;
        } else {
            self.effects.push(effect);
        }
        true
    }

    pub fn has(&self, effect_type: StatusType) -> bool {
        self.effects.iter().any(|e| e.effect_type == effect_type)
    }

    pub fn get(&self, effect_type: StatusType) -> Option<&StatusEffect> {
        self.effects.iter().find(|e| e.effect_type == effect_type)
    }

    pub fn iter(&self) -> impl Iterator<Item = &StatusEffect> {
        self.effects.iter()
    }

    pub fn len(&self) -> usize {
        self.effects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.effects.is_empty()
    }

    /// Damage-over-time ticks due this step, in list order.
    pub fn pending_ticks(&self) -> Vec<(StatusType, u32)> {
        self.effects
            .iter()
            .filter(|e| e.effect_type.is_damage_over_time() && e.value > 0)
            .map(|e| (e.effect_type, e.value))
            .collect()
    }

    /// Decrement every effect by one step and drop the ones that hit zero.
    /// Returns the expired kinds, one entry per kind.
    pub fn decay(&mut self) -> Vec<StatusType> {
        for effect in &mut self.effects {
            effect.remaining = effect.remaining.saturating_sub(1);
        }
        let expired: Vec<StatusType> = self
            .effects
            .iter()
            .filter(|e| e.is_expired())
            .map(|e| e.effect_type)
            .collect();
        self.effects.retain(|e| !e.is_expired());
        expired
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reapply_refreshes_instead_of_stacking() {
        let mut statuses = StatusEffects::default();

        statuses.apply(StatusEffect::new(StatusType::Bleed, 5, 3));
        statuses.apply(StatusEffect::new(StatusType::Bleed, 2, 7));

        assert_eq!(statuses.len(), 1, "Same type must not stack");
        let bleed = statuses.get(StatusType::Bleed).unwrap();
        assert_eq!(bleed.remaining, 2, "Latest application wins");
        assert_eq!(bleed.value, 7);
    }

    #[test]
    fn test_decay_expires_in_same_step() {
        let mut statuses = StatusEffects::default();
        statuses.apply(StatusEffect::new(StatusType::Stunned, 1, 0));
        statuses.apply(StatusEffect::new(StatusType::Fortify, 2, 50));

        let expired = statuses.decay();
        assert_eq!(expired, vec![StatusType::Stunned]);
        assert!(!statuses.has(StatusType::Stunned));
        assert_eq!(statuses.get(StatusType::Fortify).unwrap().remaining, 1);

        let expired = statuses.decay();
        assert_eq!(expired, vec![StatusType::Fortify]);
        assert!(statuses.is_empty());
    }

    #[test]
    fn test_zero_duration_ignored() {
        let mut statuses = StatusEffects::default();
        assert!(!statuses.apply(StatusEffect::new(StatusType::Burn, 0, 4)));
        assert!(statuses.is_empty());
    }

    #[test]
    fn test_pending_ticks_only_dots() {
        let mut statuses = StatusEffects::default();
        statuses.apply(StatusEffect::new(StatusType::Burn, 3, 4));
        statuses.apply(StatusEffect::new(StatusType::WeakSpot, 3, 120));
        statuses.apply(StatusEffect::new(StatusType::Bleed, 3, 5));

        assert_eq!(
            statuses.pending_ticks(),
            vec![(StatusType::Burn, 4), (StatusType::Bleed, 5)]
        );
    }
}
