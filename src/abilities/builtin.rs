//! Built-in ability table, used when no external catalog is available.

use super::{AbilityDef, AbilityEffect, Script, TargetType, INTERRUPT_ID};
use crate::combat::rank::Rank;
use crate::combat::resources::Cost;
use crate::player::Role;

pub fn builtin_abilities() -> Vec<AbilityDef> {
    use AbilityEffect as E;
    use TargetType as T;

    vec![
        // Guardian
        AbilityDef::new("shield_bash", "Shield Bash", T::SingleEnemy)
            .describe("Slam the target with your shield")
            .cost(Cost::mana(8))
            .cooldown_ms(3_000)
            .effect(E::Damage { amount: 18 })
            .roles(&[Role::Guardian]),
        AbilityDef::new("fortify", "Fortify", T::SelfOnly)
            .describe("Halve incoming damage for 3 steps")
            .cost(Cost::mana(10))
            .cooldown_ms(8_000)
            .effect(E::Fortify {
                reduction_pct: 50,
                duration: 3,
            })
            .roles(&[Role::Guardian]),
        AbilityDef::new("barrier", "Barrier", T::SelfOnly)
            .describe("Raise a 30 point damage shield")
            .cost(Cost::mana(12))
            .cooldown_ms(10_000)
            .effect(E::Shield { amount: 30 })
            .roles(&[Role::Guardian])
            .min_level(3),
        // Striker
        AbilityDef::new("heavy_strike", "Heavy Strike", T::SingleEnemy)
            .cost(Cost::mana(10))
            .cooldown_ms(4_000)
            .effect(E::Damage { amount: 25 })
            .roles(&[Role::Striker]),
        AbilityDef::new("rend", "Rend", T::SingleEnemy)
            .describe("Cut deep, the wound bleeds for 3 steps")
            .cost(Cost::mana(8))
            .cooldown_ms(5_000)
            .effect(E::Damage { amount: 8 })
            .effect(E::Bleed {
                per_step: 5,
                duration: 3,
            })
            .roles(&[Role::Striker]),
        AbilityDef::new("expose_weakness", "Expose Weakness", T::SingleEnemy)
            .describe("Target takes 20% more damage from every source for 3 steps")
            .cost(Cost::mana(12))
            .cooldown_ms(8_000)
            .effect(E::WeakSpot {
                multiplier_pct: 120,
                duration: 3,
            })
            .roles(&[Role::Striker, Role::Assassin]),
        AbilityDef::new("whirlwind", "Whirlwind", T::AllEnemies)
            .describe("Hit every enemy in the gate")
            .cost(Cost {
                mana: 14,
                stamina: 10,
            })
            .cooldown_ms(7_000)
            .effect(E::Damage { amount: 12 })
            .roles(&[Role::Striker])
            .min_rank(Rank::D),
        // Assassin
        AbilityDef::new("backstab", "Backstab", T::SingleEnemy)
            .cost(Cost::mana(10))
            .cooldown_ms(3_000)
            .effect(E::Damage { amount: 22 })
            .roles(&[Role::Assassin]),
        AbilityDef::new("execute", "Execute", T::SingleEnemy)
            .describe("Finish a target at or below 30% health")
            .cost(Cost::mana(15))
            .cooldown_ms(6_000)
            .effect(E::Damage { amount: 45 })
            .roles(&[Role::Assassin])
            .script(Script::Execute { threshold_pct: 30 })
            .refund_on_kill(),
        // Marksman
        AbilityDef::new("aimed_shot", "Aimed Shot", T::SingleEnemy)
            .cost(Cost::mana(10))
            .cooldown_ms(3_000)
            .effect(E::Damage { amount: 20 })
            .roles(&[Role::Marksman]),
        AbilityDef::new("fire_arrow", "Fire Arrow", T::SingleEnemy)
            .cost(Cost::mana(12))
            .cooldown_ms(5_000)
            .effect(E::Damage { amount: 10 })
            .effect(E::Burn {
                per_step: 4,
                duration: 3,
            })
            .roles(&[Role::Marksman]),
        AbilityDef::new("focus", "Focus", T::SelfOnly)
            .describe("One extra auto-attack per step for 3 steps")
            .cost(Cost::mana(15))
            .cooldown_ms(12_000)
            .effect(E::Focus { duration: 3 })
            .roles(&[Role::Marksman]),
        // Healer
        AbilityDef::new("mend", "Mend", T::SingleAlly)
            .cost(Cost::mana(12))
            .cooldown_ms(4_000)
            .effect(E::Heal { amount: 30 })
            .roles(&[Role::Healer]),
        AbilityDef::new("smite", "Smite", T::SingleEnemy)
            .cost(Cost::mana(8))
            .cooldown_ms(3_000)
            .effect(E::Damage { amount: 14 })
            .roles(&[Role::Healer]),
        AbilityDef::new("judgement", "Judgement", T::SingleEnemy)
            .describe("Stun the target for 2 steps")
            .cost(Cost::mana(15))
            .cooldown_ms(9_000)
            .effect(E::Stun { duration: 2 })
            .roles(&[Role::Healer])
            .min_rank(Rank::C),
        // Everyone
        AbilityDef::new("second_wind", "Second Wind", T::SelfOnly)
            .cooldown_ms(10_000)
            .effect(E::RestoreStamina { amount: 30 }),
        AbilityDef::new(INTERRUPT_ID, "Interrupt", T::SingleEnemy)
            .describe("Break a boss special while it is being telegraphed")
            .cost(Cost::mana(10))
            .cooldown_ms(6_000)
            .effect(E::Interrupt),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_role_has_a_damage_skill() {
        let defs = builtin_abilities();
        for role in Role::ALL {
            let has_damage = defs.iter().any(|d| {
                d.gating.roles.contains(&role)
                    && d.effects
                        .iter()
                        .any(|e| matches!(e, AbilityEffect::Damage { .. }))
            });
            assert!(has_damage, "{role} has no damage skill");
        }
    }

    #[test]
    fn test_shield_bash_numbers() {
        let bash = builtin_abilities()
            .into_iter()
            .find(|d| d.id == "shield_bash")
            .unwrap();
        assert_eq!(bash.cost.mana, 8);
        assert_eq!(bash.cooldown_ms, 3_000);
        assert_eq!(bash.effects, vec![AbilityEffect::Damage { amount: 18 }]);
    }
}
