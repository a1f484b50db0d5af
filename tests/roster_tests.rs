//! Multi-enemy rosters: targeting, write-back, advancing and resets.

use std::sync::Arc;

use gate_core::abilities::{AbilityDef, AbilityEffect, FileSource, TargetType};
use gate_core::encounter::{
    ActionResult, EncounterResult, Lifecycle, PlayerAction, RecordingListener, RejectReason,
    StepOutcome, TurnPhase,
};
use gate_core::{
    AbilityCatalog, CombatConfig, Encounter, Mode, PlayerConfig, Rank, Role, Roster, RosterEntry,
};

fn encounter(mode: Mode, player: PlayerConfig, entries: Vec<RosterEntry>) -> Encounter {
    Encounter::new(
        mode,
        player,
        Roster::new(entries).unwrap(),
        Arc::new(AbilityCatalog::builtin()),
        Arc::new(CombatConfig::default()),
    )
    .unwrap()
}

fn guardian() -> PlayerConfig {
    PlayerConfig::new(Role::Guardian, Rank::E, 1)
}

fn goblin_pack() -> Vec<RosterEntry> {
    vec![
        RosterEntry::new("goblin", "Goblin", 80, 6),
        RosterEntry::new("archer", "Goblin Archer", 60, 9),
    ]
}

fn rats() -> Vec<RosterEntry> {
    vec![
        RosterEntry::new("rat_a", "Rat", 10, 2),
        RosterEntry::new("rat_b", "Big Rat", 10, 2),
    ]
}

#[test]
fn switching_targets_writes_back_health() {
    let mut enc = encounter(Mode::Continuous, guardian(), goblin_pack());
    enc.start();
    enc.step();
    assert_eq!(enc.enemy().health.current(), 70);

    assert_eq!(enc.select_target(1), ActionResult::Applied);
    assert_eq!(enc.active_index(), 1);
    assert_eq!(enc.enemy().name, "Goblin Archer");
    assert_eq!(enc.enemy().health.current(), 60);
    assert_eq!(enc.roster().get(0).unwrap().current_hp, Some(70));

    enc.select_target(0);
    assert_eq!(enc.enemy().health.current(), 70);
    assert!(enc.is_running());
}

#[test]
fn out_of_range_target_rejected() {
    let mut enc = encounter(Mode::Continuous, guardian(), goblin_pack());
    enc.start();
    assert!(matches!(
        enc.select_target(7),
        ActionResult::Rejected(RejectReason::InvalidTarget(_))
    ));
    assert_eq!(enc.active_index(), 0);
}

#[test]
fn defeated_target_cannot_be_selected() {
    let mut entries = rats();
    entries.push(RosterEntry::new("goblin", "Goblin", 80, 6));
    let mut enc = encounter(Mode::Continuous, guardian(), entries);
    enc.start();
    assert_eq!(
        enc.use_skill("shield_bash"),
        ActionResult::Finished(EncounterResult::Victory)
    );
    assert!(matches!(
        enc.select_target(0),
        ActionResult::Rejected(RejectReason::InvalidTarget(_))
    ));
    assert_eq!(enc.lifecycle(), Lifecycle::Victory);

    assert_eq!(enc.advance_roster(), ActionResult::Applied);
    assert_eq!(enc.active_index(), 1);
    assert_eq!(enc.lifecycle(), Lifecycle::Running);
}

#[test]
fn advance_requires_a_victory() {
    let mut enc = encounter(Mode::Continuous, guardian(), goblin_pack());
    enc.start();
    assert_eq!(
        enc.advance_roster(),
        ActionResult::Rejected(RejectReason::WrongPhase)
    );
}

#[test]
fn clearing_the_roster_sets_all_defeated() {
    let listener = Arc::new(RecordingListener::new());
    let mut enc =
        encounter(Mode::Continuous, guardian(), rats()).with_listener(listener.clone());
    enc.start();

    assert_eq!(enc.step(), StepOutcome::Finished(EncounterResult::Victory));
    let first = enc.outcome().unwrap().clone();
    assert!(!first.all_defeated);
    assert!(first.should_advance());

    enc.advance_roster();
    assert!(enc.outcome().is_none());
    enc.step();
    let last = enc.outcome().unwrap();
    assert!(last.all_defeated);
    assert_eq!(last.roster_index, 1);
    assert!(enc.roster().all_defeated());

    // one outcome per victory transition
    assert_eq!(listener.outcomes().len(), 2);
    assert!(matches!(
        enc.advance_roster(),
        ActionResult::Rejected(RejectReason::InvalidTarget(_))
    ));
}

#[test]
fn reset_restores_the_roster() {
    let mut enc = encounter(Mode::Continuous, guardian(), rats());
    enc.start();
    enc.step();
    enc.advance_roster();
    enc.step();
    assert!(enc.roster().all_defeated());

    enc.reset();
    assert_eq!(enc.lifecycle(), Lifecycle::Idle);
    assert_eq!(enc.active_index(), 0);
    assert!(enc
        .roster()
        .entries
        .iter()
        .all(|e| !e.is_defeated && e.current_hp.is_none()));
    assert_eq!(enc.enemy().health.current(), 10);
}

#[test]
fn reset_keeps_entries_defeated_before_the_fight() {
    let mut dead = RosterEntry::new("dead", "Already Dead", 50, 4);
    dead.is_defeated = true;
    let mut hurt = RosterEntry::new("hurt", "Hurt", 50, 4);
    hurt.current_hp = Some(30);

    let mut enc = encounter(Mode::Continuous, guardian(), vec![dead, hurt]);
    assert_eq!(enc.active_index(), 1);
    enc.start();
    enc.step();
    assert_eq!(enc.enemy().health.current(), 20);

    enc.reset();
    assert_eq!(enc.active_index(), 1);
    assert_eq!(enc.enemy().name, "Hurt");
    assert_eq!(enc.enemy().health.current(), 30);
    assert!(enc.roster().get(0).unwrap().is_defeated);
    assert_eq!(enc.roster().get(1).unwrap().current_hp, Some(30));
}

#[test]
fn enrage_survives_switching_targets() {
    let entries = vec![
        RosterEntry::new("warlord", "Warlord", 40, 2).boss(),
        RosterEntry::new("goblin", "Goblin", 80, 6),
    ];
    let mut enc = encounter(Mode::Continuous, guardian(), entries);
    enc.start();
    // 40 -> 30 -> 20, enrage is checked at the top of the third step
    for _ in 0..3 {
        enc.step();
    }
    assert!(enc.boss().unwrap().is_enraged());
    assert_eq!(enc.enemy().health.current(), 10);

    enc.select_target(1);
    assert!(!enc.is_fighting_boss());
    enc.select_target(0);
    assert!(enc.boss().unwrap().is_enraged());
    assert_eq!(enc.enemy().health.current(), 10);

    assert_eq!(enc.step(), StepOutcome::Finished(EncounterResult::Victory));
    let enrage_lines = enc
        .log()
        .entries()
        .iter()
        .filter(|e| e.message.contains("becomes enraged"))
        .count();
    assert_eq!(enrage_lines, 1);
}

#[test]
fn boss_round_counter_survives_switching_targets() {
    let entries = vec![
        RosterEntry::new("warlord", "Warlord", 1000, 1).boss(),
        RosterEntry::new("goblin", "Goblin", 80, 6),
    ];
    let mut enc = encounter(Mode::Discrete, guardian(), entries);
    enc.start();
    enc.act(PlayerAction::Attack);
    enc.act(PlayerAction::Attack);

    assert_eq!(enc.select_target(1), ActionResult::Applied);
    enc.act(PlayerAction::Attack);
    assert_eq!(enc.select_target(0), ActionResult::Applied);
    assert!(!enc.is_preparing_special());

    // third round against the boss itself
    enc.act(PlayerAction::Attack);
    assert!(enc.is_preparing_special());
    assert_eq!(enc.enemy().health.current(), 970);
}

#[test]
fn whirlwind_hits_the_whole_roster() {
    let striker = PlayerConfig::new(Role::Striker, Rank::D, 1);
    let entries = vec![
        RosterEntry::new("goblin", "Goblin", 80, 6),
        RosterEntry::new("rat", "Rat", 10, 2),
        RosterEntry::new("archer", "Goblin Archer", 60, 9),
    ];
    let mut enc = encounter(Mode::Continuous, striker, entries);
    enc.start();
    assert!(enc.use_skill("whirlwind").is_applied());

    // floor(12 * 1.10) = 13
    assert_eq!(enc.enemy().health.current(), 67);
    let rat = enc.roster().get(1).unwrap();
    assert!(rat.is_defeated);
    assert_eq!(rat.current_hp, Some(0));
    assert_eq!(enc.roster().get(2).unwrap().current_hp, Some(47));
    assert_eq!(enc.player().stamina.unwrap().current(), 90);

    assert!(enc.select_target(1).is_rejected());
    assert_eq!(enc.select_target(2), ActionResult::Applied);
    assert_eq!(enc.enemy().health.current(), 47);
}

#[test]
fn whirlwind_needs_rank_d() {
    let striker = PlayerConfig::new(Role::Striker, Rank::E, 1);
    let mut enc = encounter(Mode::Continuous, striker, goblin_pack());
    enc.start();
    assert!(matches!(
        enc.use_skill("whirlwind"),
        ActionResult::Rejected(RejectReason::NotInLoadout(_))
    ));
}

#[test]
fn discrete_roster_runs_through_act() {
    let mut enc = encounter(Mode::Discrete, guardian(), rats());
    enc.start();
    assert_eq!(
        enc.act(PlayerAction::Attack),
        ActionResult::Finished(EncounterResult::Victory)
    );
    assert_eq!(enc.step_count(), 1);

    assert_eq!(enc.advance_roster(), ActionResult::Applied);
    assert_eq!(enc.phase(), TurnPhase::PlayerTurn);
    assert!(enc.enemy_intent().is_some());
    assert_eq!(
        enc.act(PlayerAction::Attack),
        ActionResult::Finished(EncounterResult::Victory)
    );
    assert!(enc.outcome().unwrap().all_defeated);
}

#[test]
fn discrete_target_switch_only_on_player_turn() {
    let mut enc = encounter(Mode::Discrete, guardian(), goblin_pack());
    enc.start();
    assert!(enc.select_player_action(PlayerAction::Block).is_applied());
    assert!(enc.execute_player_action_only().is_applied());
    assert_eq!(enc.phase(), TurnPhase::EnemyTurn);
    assert_eq!(
        enc.select_target(1),
        ActionResult::Rejected(RejectReason::WrongPhase)
    );

    enc.execute_enemy_action_only();
    enc.finish_round();
    assert_eq!(enc.select_target(1), ActionResult::Applied);
    assert_eq!(enc.enemy().name, "Goblin Archer");
}

#[test]
fn roster_from_json_defaults() {
    let roster = Roster::from_json(
        r#"[
            {"id": "imp", "name": "Imp", "max_health": 40, "auto_attack_damage": 5},
            {"id": "lord", "name": "Imp Lord", "max_health": 200, "auto_attack_damage": 12,
             "is_boss": true, "rank": "C", "behavior": "Aggressive"}
        ]"#,
    )
    .unwrap();
    assert_eq!(roster.len(), 2);
    assert_eq!(roster.get(0).unwrap().rank, Rank::E);
    assert!(roster.get(1).unwrap().is_boss);

    let enc = encounter(Mode::Continuous, guardian(), roster.entries);
    assert!(!enc.is_fighting_boss());
    assert!(Roster::from_json("[]").is_err());
}

#[test]
fn catalog_file_loads_or_falls_back() {
    let dir = tempfile::tempdir().unwrap();

    let good = dir.path().join("abilities.json");
    let defs = vec![AbilityDef::new("jab", "Jab", TargetType::SingleEnemy)
        .cooldown_ms(1_000)
        .effect(AbilityEffect::Damage { amount: 5 })];
    std::fs::write(&good, serde_json::to_string(&defs).unwrap()).unwrap();
    let catalog = AbilityCatalog::load_or_builtin(&FileSource::new(&good));
    assert_eq!(catalog.len(), 2);
    assert!(catalog.contains("jab"));
    assert!(catalog.contains("interrupt"));

    let bad = dir.path().join("broken.json");
    std::fs::write(&bad, "{ not json").unwrap();
    let fallback = AbilityCatalog::load_or_builtin(&FileSource::new(&bad));
    assert_eq!(fallback.len(), AbilityCatalog::builtin().len());

    let missing = AbilityCatalog::load_or_builtin(&FileSource::new(dir.path().join("nope.ron")));
    assert!(missing.contains("interrupt"));
}
