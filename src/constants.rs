//! Centralized game constants for the gate combat core.
//!
//! Tunable intervals and balance knobs live in [`crate::config::CombatConfig`];
//! the values here are the defaults it starts from plus the few numbers that
//! are fixed rules of the game rather than tuning.

// =====================================================
// Scheduling
// =====================================================

/// Continuous-mode step interval in milliseconds
pub const STEP_INTERVAL_MS: u64 = 1_000;

/// Cooldown decrementer sub-interval in milliseconds
pub const COOLDOWN_TICK_MS: u64 = 100;

/// Discrete-mode: cooldown time that passes when a round closes
pub const ROUND_DURATION_MS: u64 = 1_000;

// =====================================================
// Boss
// =====================================================

/// Delay before the first special-attack cycle is armed
pub const BOSS_CYCLE_DELAY_MS: u64 = 5_000;

/// Interval between special-attack telegraphs
pub const BOSS_SPECIAL_INTERVAL_MS: u64 = 10_000;

/// Telegraph window: time between "preparing" and the hit landing
pub const BOSS_PREPARE_DELAY_MS: u64 = 2_000;

/// Discrete mode: a special is telegraphed every N rounds
pub const BOSS_SPECIAL_EVERY_ROUNDS: u64 = 3;

/// Raw damage of the special attack before mitigation
pub const BOSS_SPECIAL_DAMAGE: u32 = 40;

/// Steps of Stunned applied by a landed special attack
pub const BOSS_SPECIAL_STUN_STEPS: u32 = 2;

/// Health fraction at or below which a boss enrages (one-way)
pub const ENRAGE_HP_FRACTION: f32 = 0.5;

/// Extra damage an enraged boss deals, in percent
pub const ENRAGE_DAMAGE_BONUS_PCT: u32 = 50;

// =====================================================
// Status effects & passives
// =====================================================

/// Auto-attack damage lost while carrying Stunned, in percent
pub const STUN_ATTACK_PENALTY_PCT: u32 = 50;

/// Healer passive regeneration per step
pub const HEALER_REGEN_PER_STEP: u32 = 3;

/// Marksman passive: every Nth auto-attack deals double damage
pub const MARKSMAN_DOUBLE_EVERY: u32 = 3;

/// Neutral incoming-damage multiplier (no Weak-Spot)
pub const NEUTRAL_DAMAGE_MULTIPLIER: f32 = 1.0;

// =====================================================
// Discrete-mode stamina
// =====================================================

pub const ATTACK_STAMINA_COST: u32 = 5;
pub const BLOCK_STAMINA_COST: u32 = 10;
pub const DODGE_STAMINA_COST: u32 = 15;
pub const RECOVER_STAMINA_GAIN: u32 = 25;

/// Stamina regained by the player when a round closes
pub const STAMINA_REGEN_PER_ROUND: u32 = 10;

/// Heavy attack multiplier for enemy heavy swings, in percent
pub const ENEMY_HEAVY_ATTACK_PCT: u32 = 150;

// =====================================================
// Dodge clamp
// =====================================================

/// Dodge swing per rank of advantage/disadvantage
pub const DODGE_PER_RANK_DIFF: i32 = 10;
pub const DODGE_MIN_PCT: i32 = 10;
pub const DODGE_MAX_PCT: i32 = 95;
