//! Tunable encounter configuration.
//!
//! Defaults mirror [`crate::constants`]. A config can be loaded from JSON and
//! must pass [`CombatConfig::validate`] before an encounter accepts it.

use serde::{Deserialize, Serialize};

use crate::constants::*;
use crate::error::{CombatError, CombatResult};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CombatConfig {
    pub step_interval_ms: u64,
    pub cooldown_tick_ms: u64,
    pub round_duration_ms: u64,
    pub boss_cycle_delay_ms: u64,
    pub boss_special_interval_ms: u64,
    pub boss_prepare_delay_ms: u64,
    pub boss_special_every_rounds: u64,
    pub boss_special_damage: u32,
    pub boss_special_stun_steps: u32,
    pub enrage_hp_fraction: f32,
    pub enrage_damage_bonus_pct: u32,
    pub stun_attack_penalty_pct: u32,
    /// Seed for dodge rolls; same seed + same inputs = same fight
    pub rng_seed: u64,
}

impl Default for CombatConfig {
    fn default() -> Self {
        Self {
            step_interval_ms: STEP_INTERVAL_MS,
            cooldown_tick_ms: COOLDOWN_TICK_MS,
            round_duration_ms: ROUND_DURATION_MS,
            boss_cycle_delay_ms: BOSS_CYCLE_DELAY_MS,
            boss_special_interval_ms: BOSS_SPECIAL_INTERVAL_MS,
            boss_prepare_delay_ms: BOSS_PREPARE_DELAY_MS,
            boss_special_every_rounds: BOSS_SPECIAL_EVERY_ROUNDS,
            boss_special_damage: BOSS_SPECIAL_DAMAGE,
            boss_special_stun_steps: BOSS_SPECIAL_STUN_STEPS,
            enrage_hp_fraction: ENRAGE_HP_FRACTION,
            enrage_damage_bonus_pct: ENRAGE_DAMAGE_BONUS_PCT,
            stun_attack_penalty_pct: STUN_ATTACK_PENALTY_PCT,
            rng_seed: 42,
        }
    }
}

impl CombatConfig {
    pub fn from_json(json: &str) -> CombatResult<Self> {
        let config: Self =
            serde_json::from_str(json).map_err(|e| CombatError::InvalidConfig(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_default()
    }

    /// Reject configs that would arm zero-length timers or never telegraph.
    pub fn validate(&self) -> CombatResult<()> {
        let nonzero = [
            ("step_interval_ms", self.step_interval_ms),
            ("cooldown_tick_ms", self.cooldown_tick_ms),
            ("round_duration_ms", self.round_duration_ms),
            ("boss_special_interval_ms", self.boss_special_interval_ms),
            ("boss_prepare_delay_ms", self.boss_prepare_delay_ms),
            ("boss_special_every_rounds", self.boss_special_every_rounds),
        ];
        for (name, value) in nonzero {
            if value == 0 {
                return Err(CombatError::InvalidConfig(format!("{name} must be > 0")));
            }
        }
        if self.boss_prepare_delay_ms >= self.boss_special_interval_ms {
            return Err(CombatError::InvalidConfig(
                "boss_prepare_delay_ms must be shorter than boss_special_interval_ms".into(),
            ));
        }
        if !(0.0..=1.0).contains(&self.enrage_hp_fraction) {
            return Err(CombatError::InvalidConfig(
                "enrage_hp_fraction must be within [0, 1]".into(),
            ));
        }
        if self.stun_attack_penalty_pct > 100 {
            return Err(CombatError::InvalidConfig(
                "stun_attack_penalty_pct must be <= 100".into(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        assert!(CombatConfig::default().validate().is_ok());
    }

    #[test]
    fn test_json_partial_uses_defaults() {
        let config = CombatConfig::from_json(r#"{"step_interval_ms": 500}"#).unwrap();
        assert_eq!(config.step_interval_ms, 500);
        assert_eq!(config.cooldown_tick_ms, COOLDOWN_TICK_MS);
    }

    #[test]
    fn test_zero_interval_rejected() {
        let config = CombatConfig {
            cooldown_tick_ms: 0,
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(CombatError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_prepare_longer_than_interval_rejected() {
        let config = CombatConfig {
            boss_prepare_delay_ms: 20_000,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_malformed_json() {
        assert!(CombatConfig::from_json("{not json").is_err());
    }
}
