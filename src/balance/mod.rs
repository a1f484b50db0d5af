//! Monte-Carlo balance simulation.
//!
//! Plays thousands of discrete-mode encounters per role × rank cell with a
//! scripted player and reports win rates, so a dominant or hopeless role
//! shows up before content ships. Uses rayon across CPU cores; every
//! encounter is seeded from its index, so a run is reproducible.

use std::sync::Arc;

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::abilities::{AbilityCatalog, INTERRUPT_ID};
use crate::combat::rank::Rank;
use crate::config::CombatConfig;
use crate::encounter::{ActionResult, Encounter, EncounterResult, Mode, PlayerAction};
use crate::logging::TimingSpan;
use crate::monster::{EnemyAction, Roster, RosterEntry};
use crate::player::{PlayerConfig, Role};

/// Scripted player behavior
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Playstyle {
    Aggressive, // skills on cooldown, never defends
    Defensive,  // blocks telegraphed heavy hits
    Balanced,   // dodges heavies, otherwise aggressive
}

impl Playstyle {
    pub const ALL: [Playstyle; 3] = [Playstyle::Aggressive, Playstyle::Defensive, Playstyle::Balanced];

    fn defense_against(self, intent: Option<EnemyAction>) -> Option<PlayerAction> {
        let threatening = matches!(
            intent,
            Some(EnemyAction::HeavyAttack) | Some(EnemyAction::Special)
        );
        match self {
            Playstyle::Aggressive => None,
            Playstyle::Defensive if threatening => Some(PlayerAction::Block),
            Playstyle::Balanced if threatening => Some(PlayerAction::Dodge),
            _ => None,
        }
    }
}

/// Configuration for a simulation run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimConfig {
    /// Encounters per role × rank cell
    pub encounters_per_cell: u32,
    pub ranks: Vec<Rank>,
    pub level: u32,
    /// Enemy template; its rank is replaced by the player's rank
    pub enemy: RosterEntry,
    pub max_rounds: u64,
    pub base_seed: u64,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            encounters_per_cell: 200,
            ranks: Rank::ALL.to_vec(),
            level: 1,
            enemy: RosterEntry::new("gate_keeper", "Gate Keeper", 300, 12).boss(),
            max_rounds: 200,
            base_seed: 42,
        }
    }
}

/// One simulated encounter
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimOutcome {
    pub role: Role,
    pub rank: Rank,
    pub playstyle: Playstyle,
    pub victory: bool,
    pub rounds: u64,
    pub hp_left_fraction: f32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CellReport {
    pub role: Role,
    pub rank: Rank,
    pub encounters: u32,
    pub wins: u32,
    pub win_rate: f32,
    pub avg_rounds: f32,
    /// Average remaining HP fraction over victories
    pub avg_hp_left: f32,
}

/// Results of a balance simulation run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BalanceReport {
    pub total_encounters: u64,
    pub overall_win_rate: f32,
    pub role_win_rates: Vec<(Role, f32)>,
    pub rank_win_rates: Vec<(Rank, f32)>,
    pub playstyle_win_rates: Vec<(Playstyle, f32)>,
    pub cells: Vec<CellReport>,
    /// Best role win rate minus worst
    pub role_spread: f32,
    pub balance_grade: BalanceGrade,
}

/// Overall balance assessment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BalanceGrade {
    Excellent, // spread < 0.10
    Good,      // spread < 0.20
    Fair,      // spread < 0.35
    Poor,      // spread < 0.50
    Critical,
}

impl BalanceGrade {
    pub fn from_spread(spread: f32) -> Self {
        if spread < 0.10 {
            BalanceGrade::Excellent
        } else if spread < 0.20 {
            BalanceGrade::Good
        } else if spread < 0.35 {
            BalanceGrade::Fair
        } else if spread < 0.50 {
            BalanceGrade::Poor
        } else {
            BalanceGrade::Critical
        }
    }
}

/// Job description derived from the flat encounter index
#[derive(Debug, Clone, Copy)]
struct SimJob {
    role: Role,
    rank: Rank,
    playstyle: Playstyle,
    seed: u64,
}

fn job_for(index: u64, config: &SimConfig) -> SimJob {
    let per_cell = config.encounters_per_cell.max(1) as u64;
    let cell = index / per_cell;
    let roles = Role::ALL.len() as u64;
    SimJob {
        role: Role::ALL[(cell % roles) as usize],
        rank: config.ranks[((cell / roles) as usize) % config.ranks.len()],
        playstyle: Playstyle::ALL[(index % Playstyle::ALL.len() as u64) as usize],
        seed: config
            .base_seed
            .wrapping_add(index)
            .wrapping_mul(0x9E37_79B9_7F4A_7C15),
    }
}

/// Pick the next action for a scripted player.
pub fn scripted_action(encounter: &Encounter, playstyle: Playstyle) -> PlayerAction {
    if encounter.is_preparing_special() && encounter.can_use_skill(INTERRUPT_ID) {
        return PlayerAction::Interrupt;
    }
    let stamina = encounter.player().stamina.map(|p| p.current()).unwrap_or(0);
    if let Some(defense) = playstyle.defense_against(encounter.enemy_intent()) {
        if stamina >= defense.stamina_cost() {
            return defense;
        }
    }
    let ready = encounter
        .loadout()
        .iter()
        .filter(|id| id.as_str() != INTERRUPT_ID)
        .find(|id| encounter.can_use_skill(id));
    if let Some(id) = ready {
        return PlayerAction::Skill(id.clone());
    }
    if stamina >= PlayerAction::Attack.stamina_cost() {
        PlayerAction::Attack
    } else {
        PlayerAction::Recover
    }
}

fn simulate_one(job: SimJob, config: &SimConfig, catalog: &Arc<AbilityCatalog>) -> Option<SimOutcome> {
    let combat_config = CombatConfig {
        rng_seed: job.seed,
        ..CombatConfig::default()
    };
    let enemy = config.enemy.clone().with_rank(job.rank);
    let mut encounter = Encounter::new(
        Mode::Discrete,
        PlayerConfig::new(job.role, job.rank, config.level),
        Roster::single(enemy).ok()?,
        Arc::clone(catalog),
        Arc::new(combat_config),
    )
    .ok()?;
    encounter.start();

    let mut victory = false;
    while encounter.step_count() < config.max_rounds {
        let action = scripted_action(&encounter, job.playstyle);
        match encounter.act(action) {
            ActionResult::Finished(result) => {
                victory = result == EncounterResult::Victory;
                break;
            }
            ActionResult::Applied => {}
            // the policy only picks validated actions; bail out if it didn't
            ActionResult::Rejected(_) => break,
        }
    }

    Some(SimOutcome {
        role: job.role,
        rank: job.rank,
        playstyle: job.playstyle,
        victory,
        rounds: encounter.step_count(),
        hp_left_fraction: encounter.player().health.fraction(),
    })
}

/// Run the simulation in parallel and aggregate.
pub fn run_balance_simulation(config: &SimConfig) -> BalanceReport {
    let _span = TimingSpan::new("balance_simulation");
    let catalog = Arc::new(AbilityCatalog::builtin());
    if config.ranks.is_empty() {
        return analyze_results(&[], config);
    }
    let total = config.encounters_per_cell as u64 * Role::ALL.len() as u64 * config.ranks.len() as u64;

    let results: Vec<SimOutcome> = (0..total)
        .into_par_iter()
        .filter_map(|i| simulate_one(job_for(i, config), config, &catalog))
        .collect();

    let report = analyze_results(&results, config);
    info!(
        target: "gate_core::balance",
        encounters = report.total_encounters,
        win_rate = report.overall_win_rate,
        grade = ?report.balance_grade,
        "Balance simulation finished"
    );
    report
}

fn win_rate<'a>(outcomes: impl Iterator<Item = &'a SimOutcome>) -> f32 {
    let (wins, n) = outcomes.fold((0u32, 0u32), |(w, n), o| (w + o.victory as u32, n + 1));
    if n == 0 {
        0.0
    } else {
        wins as f32 / n as f32
    }
}

fn analyze_results(results: &[SimOutcome], config: &SimConfig) -> BalanceReport {
    let mut cells = Vec::new();
    for &rank in &config.ranks {
        for role in Role::ALL {
            let cell: Vec<&SimOutcome> = results
                .iter()
                .filter(|o| o.role == role && o.rank == rank)
                .collect();
            let wins: Vec<&&SimOutcome> = cell.iter().filter(|o| o.victory).collect();
            let n = cell.len().max(1) as f32;
            cells.push(CellReport {
                role,
                rank,
                encounters: cell.len() as u32,
                wins: wins.len() as u32,
                win_rate: wins.len() as f32 / n,
                avg_rounds: cell.iter().map(|o| o.rounds as f32).sum::<f32>() / n,
                avg_hp_left: wins.iter().map(|o| o.hp_left_fraction).sum::<f32>()
                    / wins.len().max(1) as f32,
            });
        }
    }

    let role_win_rates: Vec<(Role, f32)> = Role::ALL
        .iter()
        .map(|&r| (r, win_rate(results.iter().filter(|o| o.role == r))))
        .collect();
    let rank_win_rates = config
        .ranks
        .iter()
        .map(|&r| (r, win_rate(results.iter().filter(|o| o.rank == r))))
        .collect();
    let playstyle_win_rates = Playstyle::ALL
        .iter()
        .map(|&p| (p, win_rate(results.iter().filter(|o| o.playstyle == p))))
        .collect();

    let best = role_win_rates.iter().map(|(_, w)| *w).fold(0.0, f32::max);
    let worst = role_win_rates.iter().map(|(_, w)| *w).fold(1.0, f32::min);
    let role_spread = if results.is_empty() { 0.0 } else { best - worst };

    BalanceReport {
        total_encounters: results.len() as u64,
        overall_win_rate: win_rate(results.iter()),
        role_win_rates,
        rank_win_rates,
        playstyle_win_rates,
        cells,
        role_spread,
        balance_grade: BalanceGrade::from_spread(role_spread),
    }
}
