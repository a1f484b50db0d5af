//! gate-sim: drive the combat core from the command line.
//!
//! Environment:
//! - `GATE_MODE`     continuous | discrete | balance (default continuous)
//! - `GATE_ROLE`     player role (default Striker)
//! - `GATE_RANK`     player rank (default C)
//! - `GATE_CATALOG`  optional JSON/RON ability file
//! - `GATE_CONFIG`   optional JSON `CombatConfig`

use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context};
use tokio::sync::mpsc;
use tracing::info;

use gate_core::abilities::{BuiltinSource, FileSource, INTERRUPT_ID};
use gate_core::balance::{run_balance_simulation, scripted_action, Playstyle, SimConfig};
use gate_core::encounter::CombatEvent;
use gate_core::logging::{init_tracing, TracingConfig};
use gate_core::{
    AbilityCatalog, ActionResult, CombatConfig, CombatListener, Encounter, EncounterHandle,
    EncounterOutcome, EnemyBehavior, Mode, PlayerConfig, Rank, Role, Roster, RosterEntry,
};

/// Forwards narrative events to tracing and outcomes to the driver loop
struct DemoListener {
    outcomes: mpsc::UnboundedSender<EncounterOutcome>,
}

impl CombatListener for DemoListener {
    fn wants_snapshots(&self) -> bool {
        false
    }

    fn on_combat_event(&self, event: &CombatEvent) {
        info!(target: "gate_sim", kind = ?event.kind, "{}", event.message);
    }

    fn on_encounter_complete(&self, outcome: &EncounterOutcome) {
        let _ = self.outcomes.send(outcome.clone());
    }
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

fn load_config() -> anyhow::Result<CombatConfig> {
    match std::env::var("GATE_CONFIG") {
        Ok(path) => {
            let text = std::fs::read_to_string(&path)
                .with_context(|| format!("reading config {path}"))?;
            Ok(CombatConfig::from_json(&text)?)
        }
        Err(_) => Ok(CombatConfig::default()),
    }
}

fn load_catalog() -> AbilityCatalog {
    match std::env::var("GATE_CATALOG") {
        Ok(path) => AbilityCatalog::load_or_builtin(&FileSource::new(path)),
        Err(_) => AbilityCatalog::load_or_builtin(&BuiltinSource),
    }
}

fn demo_roster() -> anyhow::Result<Roster> {
    Ok(Roster::new(vec![
        RosterEntry::new("goblin", "Goblin", 80, 6),
        RosterEntry::new("archer", "Goblin Archer", 60, 9)
            .with_behavior(EnemyBehavior::Aggressive),
        RosterEntry::new("chief", "Goblin Chief", 260, 10)
            .boss()
            .with_rank(Rank::D)
            .with_behavior(EnemyBehavior::Defensive),
    ])?)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing(&TracingConfig::default());

    let mode = env_or("GATE_MODE", "continuous");
    let role: Role = env_or("GATE_ROLE", "Striker").parse()?;
    let rank: Rank = env_or("GATE_RANK", "C").parse()?;
    let player = PlayerConfig::new(role, rank, 1);

    match mode.as_str() {
        "continuous" => run_continuous(player).await,
        "discrete" => run_discrete(player),
        "balance" => {
            let report = tokio::task::spawn_blocking(|| run_balance_simulation(&SimConfig::default()))
                .await?;
            println!("{}", serde_json::to_string_pretty(&report)?);
            Ok(())
        }
        other => bail!("unknown GATE_MODE '{other}'"),
    }
}

async fn run_continuous(player: PlayerConfig) -> anyhow::Result<()> {
    let (tx, mut outcomes) = mpsc::unbounded_channel();
    let encounter = Encounter::new(
        Mode::Continuous,
        player,
        demo_roster()?,
        Arc::new(load_catalog()),
        Arc::new(load_config()?),
    )?
    .with_listener(Arc::new(DemoListener { outcomes: tx }));

    let (handle, task) = EncounterHandle::spawn(encounter);
    handle.start().await?;

    // a very simple pilot: interrupt telegraphs, otherwise fire whatever is ready
    let mut pilot = tokio::time::interval(Duration::from_millis(500));
    let last = loop {
        tokio::select! {
            Some(outcome) = outcomes.recv() => {
                if outcome.should_advance() {
                    handle.advance_roster().await?;
                    continue;
                }
                break outcome;
            }
            _ = pilot.tick() => {
                let snap = handle.snapshot().await?;
                if snap.boss.as_ref().is_some_and(|b| b.is_preparing_special) {
                    handle.use_interrupt().await?;
                } else if let Some(skill) =
                    snap.skills.iter().find(|s| s.is_ready() && s.id != INTERRUPT_ID)
                {
                    handle.use_skill(&skill.id).await?;
                }
            }
        }
    };

    handle.shutdown().await?;
    let encounter = task.await?;
    info!(
        target: "gate_sim",
        result = ?last.result,
        steps = last.steps,
        log_entries = encounter.log().len(),
        "Run finished"
    );
    Ok(())
}

fn run_discrete(player: PlayerConfig) -> anyhow::Result<()> {
    let mut encounter = Encounter::new(
        Mode::Discrete,
        player,
        demo_roster()?,
        Arc::new(load_catalog()),
        Arc::new(load_config()?),
    )?;
    encounter.start();

    loop {
        let action = scripted_action(&encounter, Playstyle::Balanced);
        match encounter.act(action) {
            ActionResult::Finished(_) => {
                let outcome = encounter
                    .outcome()
                    .cloned()
                    .context("finished encounter has no outcome")?;
                if outcome.should_advance() {
                    encounter.advance_roster();
                    continue;
                }
                info!(target: "gate_sim", result = ?outcome.result, rounds = outcome.steps, "Run finished");
                break;
            }
            ActionResult::Applied => {}
            ActionResult::Rejected(reason) => bail!("scripted action rejected: {reason}"),
        }
    }

    for entry in encounter.log().entries() {
        println!("[{:>3}] {:?}: {}", entry.step, entry.kind, entry.message);
    }
    Ok(())
}
