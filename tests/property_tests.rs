//! Property-based tests using proptest
//!
//! Invariants that must hold for ALL inputs:
//! - Pools: any sequence of mutations stays within [0, max]
//! - Statuses: one instance per kind, however often re-applied
//! - Ranks: damage/block monotonic, dodge clamped
//! - Encounters: random command sequences never break pool bounds

use proptest::prelude::*;
use std::sync::Arc;

use gate_core::combat::rank::{blocked_damage, dodge_chance, effective_damage};
use gate_core::combat::resources::Pool;
use gate_core::combat::status::{StatusEffect, StatusEffects, StatusType};
use gate_core::encounter::PlayerAction;
use gate_core::{
    AbilityCatalog, CombatConfig, Combatant, Encounter, Mode, PlayerConfig, Rank, Role, Roster,
    RosterEntry,
};

fn any_rank() -> impl Strategy<Value = Rank> {
    (0usize..8).prop_map(|i| Rank::ALL[i])
}

fn any_role() -> impl Strategy<Value = Role> {
    (0usize..5).prop_map(|i| Role::ALL[i])
}

fn any_status() -> impl Strategy<Value = StatusType> {
    prop_oneof![
        Just(StatusType::Bleed),
        Just(StatusType::Burn),
        Just(StatusType::WeakSpot),
        Just(StatusType::Stunned),
        Just(StatusType::Fortify),
        Just(StatusType::Focus),
    ]
}

fn pool_within_bounds(pool: &Pool) -> bool {
    pool.current() <= pool.max()
}

fn combatant_within_bounds(c: &Combatant) -> bool {
    pool_within_bounds(&c.health)
        && pool_within_bounds(&c.shield)
        && c.mana.as_ref().map_or(true, pool_within_bounds)
        && c.stamina.as_ref().map_or(true, pool_within_bounds)
        && c.damage_reduction_pct <= 100
}

// ============================================================
// Pool Properties
// ============================================================

#[derive(Debug, Clone)]
enum PoolOp {
    Drain(u32),
    Restore(u32),
    Spend(u32),
    Set(u32),
}

fn pool_op() -> impl Strategy<Value = PoolOp> {
    prop_oneof![
        (0u32..500).prop_map(PoolOp::Drain),
        (0u32..500).prop_map(PoolOp::Restore),
        (0u32..500).prop_map(PoolOp::Spend),
        (0u32..1000).prop_map(PoolOp::Set),
    ]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    #[test]
    fn prop_pool_stays_clamped(max in 0u32..400, ops in prop::collection::vec(pool_op(), 0..40)) {
        let mut pool = Pool::full(max);
        for op in ops {
            let before = pool.current();
            match op {
                PoolOp::Drain(n) => {
                    let taken = pool.drain(n);
                    prop_assert_eq!(before - taken, pool.current());
                }
                PoolOp::Restore(n) => {
                    let added = pool.restore(n);
                    prop_assert_eq!(before + added, pool.current());
                }
                PoolOp::Spend(n) => {
                    let ok = pool.spend(n);
                    prop_assert_eq!(ok, before >= n);
                    if !ok {
                        prop_assert_eq!(before, pool.current());
                    }
                }
                PoolOp::Set(n) => pool.set(n),
            }
            prop_assert!(pool_within_bounds(&pool), "pool out of bounds: {:?}", pool);
        }
    }
}

// ============================================================
// Status Properties
// ============================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    #[test]
    fn prop_status_never_duplicates(
        applications in prop::collection::vec((any_status(), 0u32..6, 0u32..200), 0..30),
        decays in 0usize..8,
    ) {
        let mut statuses = StatusEffects::default();
        for (kind, duration, value) in applications {
            statuses.apply(StatusEffect::new(kind, duration, value));
            let kinds: Vec<_> = statuses.iter().map(|s| s.effect_type).collect();
            for kind in &kinds {
                prop_assert_eq!(kinds.iter().filter(|k| *k == kind).count(), 1);
            }
        }
        for _ in 0..decays {
            statuses.decay();
            prop_assert!(statuses.iter().all(|s| s.remaining > 0));
        }
    }

    #[test]
    fn prop_reapply_overwrites(kind in any_status(), first in 1u32..6, second in 1u32..6) {
        let mut statuses = StatusEffects::default();
        statuses.apply(StatusEffect::new(kind, first, 10));
        statuses.apply(StatusEffect::new(kind, second, 20));
        let effect = statuses.get(kind).unwrap();
        prop_assert_eq!(effect.remaining, second);
        prop_assert_eq!(effect.value, 20);
    }
}

// ============================================================
// Rank Properties
// ============================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(300))]

    #[test]
    fn prop_damage_monotonic_in_rank(base in 0u32..1000, a in any_rank(), b in any_rank()) {
        let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
        prop_assert!(effective_damage(base, lo) <= effective_damage(base, hi));
        prop_assert!(effective_damage(base, lo) >= base);
    }

    #[test]
    fn prop_block_never_increases_damage(incoming in 0u32..1000, rank in any_rank()) {
        let blocked = blocked_damage(incoming, rank);
        prop_assert!(blocked <= incoming);
    }

    #[test]
    fn prop_dodge_clamped(own in any_rank(), opponent in any_rank()) {
        let chance = dodge_chance(own, opponent);
        prop_assert!((10..=95).contains(&chance), "dodge {chance} out of range");
    }
}

// ============================================================
// Encounter Properties
// ============================================================

#[derive(Debug, Clone)]
enum Command {
    Step,
    Skill(usize),
    Interrupt,
    BeginSpecial,
    ResolveSpecial,
    Tick(u64),
    Target(usize),
    Stop,
    Start,
}

fn command() -> impl Strategy<Value = Command> {
    prop_oneof![
        4 => Just(Command::Step),
        3 => (0usize..8).prop_map(Command::Skill),
        1 => Just(Command::Interrupt),
        1 => Just(Command::BeginSpecial),
        1 => Just(Command::ResolveSpecial),
        2 => (0u64..3000).prop_map(Command::Tick),
        1 => (0usize..3).prop_map(Command::Target),
        1 => Just(Command::Stop),
        1 => Just(Command::Start),
    ]
}

fn action() -> impl Strategy<Value = PlayerAction> {
    prop_oneof![
        Just(PlayerAction::Attack),
        Just(PlayerAction::Block),
        Just(PlayerAction::Dodge),
        Just(PlayerAction::Recover),
        Just(PlayerAction::Interrupt),
        (0usize..8).prop_map(|i| PlayerAction::Skill(format!("#{i}"))),
    ]
}

fn roster() -> Roster {
    Roster::new(vec![
        RosterEntry::new("wolf", "Wolf", 90, 7),
        RosterEntry::new("shaman", "Shaman", 70, 5).with_rank(Rank::C),
        RosterEntry::new("alpha", "Alpha", 260, 9).boss().with_rank(Rank::D),
    ])
    .unwrap()
}

fn encounter(mode: Mode, role: Role, rank: Rank, seed: u64) -> Encounter {
    let config = CombatConfig {
        rng_seed: seed,
        ..Default::default()
    };
    Encounter::new(
        mode,
        PlayerConfig::new(role, rank, 3),
        roster(),
        Arc::new(AbilityCatalog::builtin()),
        Arc::new(config),
    )
    .unwrap()
}

fn skill_at(enc: &Encounter, index: usize) -> String {
    let loadout = enc.loadout();
    loadout[index % loadout.len()].clone()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    #[test]
    fn prop_continuous_commands_keep_bounds(
        role in any_role(),
        rank in any_rank(),
        commands in prop::collection::vec(command(), 0..80),
    ) {
        let mut enc = encounter(Mode::Continuous, role, rank, 7);
        enc.start();
        for cmd in commands {
            match cmd {
                Command::Step => { enc.step(); }
                Command::Skill(i) => {
                    let id = skill_at(&enc, i);
                    enc.use_skill(&id);
                }
                Command::Interrupt => { enc.use_interrupt(); }
                Command::BeginSpecial => { enc.begin_boss_special(); }
                Command::ResolveSpecial => { enc.resolve_boss_special(); }
                Command::Tick(ms) => {
                    let ids: Vec<String> = enc.loadout().to_vec();
                    for id in ids {
                        enc.tick_cooldown(&id, ms);
                    }
                }
                Command::Target(i) => {
                    enc.select_target(i);
                    enc.advance_roster();
                }
                Command::Stop => { enc.stop(); }
                Command::Start => { enc.start(); }
            }
            prop_assert!(combatant_within_bounds(enc.player()));
            prop_assert!(combatant_within_bounds(enc.enemy()));
            prop_assert!(enc.roster().entries.iter().all(|e| e.hp() <= e.max_health));
            if !enc.player().is_alive() {
                prop_assert!(!enc.is_running());
            }
        }
    }

    #[test]
    fn prop_discrete_rounds_keep_bounds(
        role in any_role(),
        rank in any_rank(),
        seed in any::<u64>(),
        actions in prop::collection::vec(action(), 0..60),
    ) {
        let mut enc = encounter(Mode::Discrete, role, rank, seed);
        enc.start();
        for action in actions {
            let action = match action {
                PlayerAction::Skill(slot) => {
                    let i: usize = slot.trim_start_matches('#').parse().unwrap_or(0);
                    PlayerAction::Skill(skill_at(&enc, i))
                }
                other => other,
            };
            let steps_before = enc.step_count();
            let result = enc.act(action);
            if result.is_rejected() {
                prop_assert_eq!(enc.step_count(), steps_before);
            }
            prop_assert!(combatant_within_bounds(enc.player()));
            prop_assert!(combatant_within_bounds(enc.enemy()));
            if enc.outcome().is_some_and(|o| o.should_advance()) {
                enc.advance_roster();
            }
        }
    }

    #[test]
    fn prop_discrete_is_deterministic(
        seed in any::<u64>(),
        actions in prop::collection::vec(action(), 1..30),
    ) {
        let run = |actions: &[PlayerAction]| {
            let mut enc = encounter(Mode::Discrete, Role::Striker, Rank::C, seed);
            enc.start();
            for action in actions {
                enc.act(action.clone());
            }
            (enc.player().health.current(), enc.enemy().health.current(), enc.step_count())
        };
        prop_assert_eq!(run(&actions), run(&actions));
    }
}
