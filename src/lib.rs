//! Gate Combat Core
//!
//! Deterministic combat rules for gate encounters, independent of any UI:
//! - Roles, ranks and rank-scaled damage, block and dodge
//! - Resource pools, cooldowns, shields and timed status effects
//! - Data-driven ability catalog with pluggable sources
//! - Boss enrage and interruptible telegraphed specials
//! - Two schedulers over one model: a continuous tokio actor with named
//!   timers, and a synchronous round engine
//! - Monte-Carlo balance simulation

pub mod abilities;
pub mod balance;
pub mod boss;
pub mod combat;
pub mod config;
pub mod constants;
pub mod encounter;
pub mod error;
pub mod logging;
pub mod monster;
pub mod player;
pub mod runtime;

pub use abilities::{Ability, AbilityCatalog, AbilityDef, AbilityEffect, AbilitySource, TargetType};
pub use combat::rank::Rank;
pub use combat::Combatant;
pub use config::CombatConfig;
pub use encounter::{
    ActionResult, CombatListener, Encounter, EncounterOutcome, EncounterResult, EncounterSnapshot,
    Lifecycle, Mode, PlayerAction, RejectReason, TurnPhase,
};
pub use error::{CombatError, CombatResult};
pub use monster::{EnemyBehavior, Roster, RosterEntry};
pub use player::{PlayerConfig, Role};
pub use runtime::EncounterHandle;
