//! Combatants and the damage pipeline.
//!
//! Incoming damage goes: Weak-Spot multiplier → damage reduction → shield →
//! health. Damage over time skips reduction and shield.

use serde::{Deserialize, Serialize};

pub mod cooldown;
pub mod defense;
pub mod rank;
pub mod resources;
pub mod status;

use cooldown::CooldownTracker;
use rank::Rank;
use resources::{Cost, Pool};
use status::{StatusEffect, StatusEffects, StatusType};

use crate::constants::HEALER_REGEN_PER_STEP;
use crate::monster::{EnemyBehavior, RosterEntry};
use crate::player::{PlayerConfig, Role};

/// The unit of simulation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Combatant {
    pub name: String,
    pub is_player: bool,
    pub role: Option<Role>,
    pub rank: Rank,
    pub level: u32,
    /// Auto-attack base damage before rank scaling
    pub attack: u32,
    pub health: Pool,
    pub mana: Option<Pool>,
    pub stamina: Option<Pool>,
    /// Absorbs incoming damage before health; capped at max health
    pub shield: Pool,
    pub damage_reduction_pct: u32,
    pub statuses: StatusEffects,
    pub cooldowns: CooldownTracker,
    /// Incoming damage multiplier in percent (100 = neutral)
    pub damage_taken_pct: u32,
    pub behavior: Option<EnemyBehavior>,
    pub is_boss: bool,
    pub auto_attacks: u32,
    pub guarding: bool,
}

/// What one hit did to its target
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HitReport {
    /// After Weak-Spot and damage reduction
    pub incoming: u32,
    pub absorbed: u32,
    pub shield_broken: bool,
    pub dealt: u32,
    pub hp_after: u32,
}

impl Combatant {
    pub fn player(config: &PlayerConfig) -> Self {
        let stats = config.stats();
        Self {
            name: config.name.clone(),
            is_player: true,
            role: Some(config.role),
            rank: config.rank,
            level: config.level,
            attack: stats.attack,
            health: Pool::full(stats.max_hp),
            mana: Some(Pool::full(stats.max_mana)),
            stamina: Some(Pool::full(stats.max_stamina)),
            shield: Pool::new(0, stats.max_hp),
            damage_reduction_pct: 0,
            statuses: StatusEffects::default(),
            cooldowns: CooldownTracker::new(),
            damage_taken_pct: 100,
            behavior: None,
            is_boss: false,
            auto_attacks: 0,
            guarding: false,
        }
    }

    pub fn enemy(entry: &RosterEntry) -> Self {
        Self {
            name: entry.name.clone(),
            is_player: false,
            role: None,
            rank: entry.rank,
            level: 1,
            attack: entry.auto_attack_damage,
            health: Pool::new(entry.hp(), entry.max_health),
            mana: None,
            stamina: None,
            shield: Pool::new(0, entry.max_health),
            damage_reduction_pct: 0,
            statuses: StatusEffects::default(),
            cooldowns: CooldownTracker::new(),
            damage_taken_pct: 100,
            behavior: Some(entry.behavior),
            is_boss: entry.is_boss,
            auto_attacks: 0,
            guarding: false,
        }
    }

    pub fn is_alive(&self) -> bool {
        !self.health.is_empty()
    }

    pub fn damage_multiplier(&self) -> f32 {
        self.damage_taken_pct as f32 / 100.0
    }

    pub fn can_afford(&self, cost: &Cost) -> bool {
        let mana_ok = cost.mana == 0 || self.mana.is_some_and(|p| p.can_afford(cost.mana));
        let stamina_ok =
            cost.stamina == 0 || self.stamina.is_some_and(|p| p.can_afford(cost.stamina));
        mana_ok && stamina_ok
    }

    /// Spend both parts of a cost or neither.
    pub fn spend(&mut self, cost: &Cost) -> bool {
        if !self.can_afford(cost) {
            return false;
        }
        if let Some(mana) = self.mana.as_mut() {
            mana.spend(cost.mana);
        }
        if let Some(stamina) = self.stamina.as_mut() {
            stamina.spend(cost.stamina);
        }
        true
    }

    /// Scale an incoming amount by the Weak-Spot multiplier.
    fn amplify(&self, amount: u32) -> u32 {
        (amount as u64 * self.damage_taken_pct as u64 / 100) as u32
    }

    /// A mitigated hit: multiplier, reduction, shield, then health.
    pub fn take_hit(&mut self, raw: u32) -> HitReport {
        let amplified = self.amplify(raw);
        let reduced =
            (amplified as u64 * (100 - self.damage_reduction_pct.min(100)) as u64 / 100) as u32;
        let had_shield = !self.shield.is_empty();
        let absorbed = self.shield.drain(reduced);
        let shield_broken = had_shield && absorbed > 0 && self.shield.is_empty();
        let dealt = self.health.drain(reduced - absorbed);
        HitReport {
            incoming: reduced,
            absorbed,
            shield_broken,
            dealt,
            hp_after: self.health.current(),
        }
    }

    /// Direct damage (DOTs): multiplier applies, mitigation does not.
    pub fn take_direct(&mut self, raw: u32) -> HitReport {
        let amplified = self.amplify(raw);
        let dealt = self.health.drain(amplified);
        HitReport {
            incoming: amplified,
            absorbed: 0,
            shield_broken: false,
            dealt,
            hp_after: self.health.current(),
        }
    }

    pub fn heal(&mut self, amount: u32) -> u32 {
        self.health.restore(amount)
    }

    pub fn add_shield(&mut self, amount: u32) -> u32 {
        self.shield.restore(amount)
    }

    /// Passive per-step healing for roles that have it
    pub fn passive_regen(&self) -> u32 {
        match self.role {
            Some(role) if role.has_passive_regen() => HEALER_REGEN_PER_STEP,
            _ => 0,
        }
    }

    /// Apply an effect and sync the fields it drives.
    pub fn apply_status(&mut self, effect: StatusEffect) -> bool {
        let applied = self.statuses.apply(effect);
        if applied {
            match effect.effect_type {
                StatusType::WeakSpot => self.damage_taken_pct = effect.value,
                StatusType::Fortify => self.damage_reduction_pct = effect.value.min(100),
                _ => {}
            }
        }
        applied
    }

    /// One step of duration decay. Fields driven by an expired effect return
    /// to neutral in the same call.
    pub fn decay_statuses(&mut self) -> Vec<StatusType> {
        let expired = self.statuses.decay();
        for kind in &expired {
            match kind {
                StatusType::WeakSpot => self.damage_taken_pct = 100,
                StatusType::Fortify => self.damage_reduction_pct = 0,
                _ => {}
            }
        }
        expired
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn goblin() -> Combatant {
        Combatant::enemy(&RosterEntry::new("g", "Goblin", 80, 6))
    }

    #[test]
    fn test_shield_absorbs_first() {
        let mut target = goblin();
        target.add_shield(10);
        let hit = target.take_hit(15);
        assert_eq!(hit.absorbed, 10);
        assert_eq!(hit.dealt, 5);
        assert!(hit.shield_broken);
        assert_eq!(target.health.current(), 75);
    }

    #[test]
    fn test_shield_partial_absorb_not_broken() {
        let mut target = goblin();
        target.add_shield(20);
        let hit = target.take_hit(15);
        assert_eq!(hit.absorbed, 15);
        assert_eq!(hit.dealt, 0);
        assert!(!hit.shield_broken);
        assert_eq!(target.shield.current(), 5);
    }

    #[test]
    fn test_exact_depletion_breaks_shield() {
        let mut target = goblin();
        target.add_shield(15);
        let hit = target.take_hit(15);
        assert!(hit.shield_broken);
        assert_eq!(hit.dealt, 0);
    }

    #[test]
    fn test_weak_spot_multiplies_and_resets() {
        let mut target = goblin();
        target.apply_status(StatusEffect::new(StatusType::WeakSpot, 1, 120));
        assert_eq!(target.take_hit(10).dealt, 12);
        assert_eq!(target.take_direct(5).dealt, 6);
        let expired = target.decay_statuses();
        assert_eq!(expired, vec![StatusType::WeakSpot]);
        assert_eq!(target.damage_taken_pct, 100);
        assert_eq!(target.take_hit(10).dealt, 10);
    }

    #[test]
    fn test_fortify_reduces_until_expiry() {
        let mut player = Combatant::player(&PlayerConfig::default());
        player.apply_status(StatusEffect::new(StatusType::Fortify, 1, 50));
        assert_eq!(player.take_hit(20).dealt, 10);
        player.decay_statuses();
        assert_eq!(player.damage_reduction_pct, 0);
        assert_eq!(player.take_hit(20).dealt, 20);
    }

    #[test]
    fn test_direct_damage_bypasses_shield() {
        let mut target = goblin();
        target.add_shield(50);
        let hit = target.take_direct(7);
        assert_eq!(hit.dealt, 7);
        assert_eq!(target.shield.current(), 50);
    }

    #[test]
    fn test_spend_is_all_or_nothing() {
        let mut player = Combatant::player(&PlayerConfig::default());
        let cost = Cost {
            mana: 10,
            stamina: 500,
        };
        assert!(!player.spend(&cost));
        assert_eq!(player.mana.unwrap().current(), 40);
    }

    #[test]
    fn test_enemy_without_mana_cannot_pay_mana() {
        let enemy = goblin();
        assert!(!enemy.can_afford(&Cost::mana(1)));
        assert!(enemy.can_afford(&Cost::free()));
    }

    #[test]
    fn test_health_never_underflows() {
        let mut target = goblin();
        let hit = target.take_hit(10_000);
        assert_eq!(hit.dealt, 80);
        assert!(!target.is_alive());
    }
}
