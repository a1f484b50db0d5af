//! Rank scaling table.
//!
//! Pure lookups: damage multiplier, block reduction and base dodge per rank,
//! plus the rank-difference dodge adjustment.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::constants::{DODGE_MAX_PCT, DODGE_MIN_PCT, DODGE_PER_RANK_DIFF};
use crate::error::CombatError;

/// 8-tier power classification, weakest first
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Rank {
    E,
    D,
    C,
    B,
    A,
    S,
    SS,
    SSS,
}

impl Rank {
    pub const ALL: [Rank; 8] = [
        Rank::E,
        Rank::D,
        Rank::C,
        Rank::B,
        Rank::A,
        Rank::S,
        Rank::SS,
        Rank::SSS,
    ];

    pub fn index(self) -> i32 {
        self as i32
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Rank::E => "E",
            Rank::D => "D",
            Rank::C => "C",
            Rank::B => "B",
            Rank::A => "A",
            Rank::S => "S",
            Rank::SS => "SS",
            Rank::SSS => "SSS",
        }
    }

    pub fn stats(self) -> RankStats {
        rank_stats(self)
    }
}

impl Default for Rank {
    fn default() -> Self {
        Rank::E
    }
}

impl fmt::Display for Rank {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Rank {
    type Err = CombatError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Rank::ALL
            .iter()
            .copied()
            .find(|r| r.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| CombatError::UnknownRank(s.to_string()))
    }
}

/// Derived numbers for one rank
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RankStats {
    pub damage_multiplier: f32,
    pub block_reduction_pct: u32,
    pub base_dodge_pct: u32,
}

pub fn rank_stats(rank: Rank) -> RankStats {
    let (damage_multiplier, block_reduction_pct, base_dodge_pct) = match rank {
        Rank::E => (1.00, 10, 5),
        Rank::D => (1.10, 15, 8),
        Rank::C => (1.25, 20, 11),
        Rank::B => (1.40, 25, 14),
        Rank::A => (1.60, 30, 17),
        Rank::S => (1.85, 35, 20),
        Rank::SS => (2.15, 40, 23),
        Rank::SSS => (2.50, 45, 26),
    };
    RankStats {
        damage_multiplier,
        block_reduction_pct,
        base_dodge_pct,
    }
}

/// `floor(base * damage_multiplier(attacker))`
pub fn effective_damage(base: u32, attacker: Rank) -> u32 {
    (base as f32 * rank_stats(attacker).damage_multiplier).floor() as u32
}

/// `floor(incoming - incoming * block%/100)`
pub fn blocked_damage(incoming: u32, defender: Rank) -> u32 {
    let pct = rank_stats(defender).block_reduction_pct as f32;
    let incoming = incoming as f32;
    (incoming - incoming * pct / 100.0).floor().max(0.0) as u32
}

/// Base dodge shifted 10 points per rank of difference, clamped to [10, 95].
pub fn dodge_chance(own: Rank, opponent: Rank) -> u32 {
    let base = rank_stats(own).base_dodge_pct as i32;
    let swing = DODGE_PER_RANK_DIFF * (own.index() - opponent.index());
    (base + swing).clamp(DODGE_MIN_PCT, DODGE_MAX_PCT) as u32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_table_is_monotonic() {
        for pair in Rank::ALL.windows(2) {
            let lo = rank_stats(pair[0]);
            let hi = rank_stats(pair[1]);
            assert!(hi.damage_multiplier >= lo.damage_multiplier);
            assert!(hi.block_reduction_pct >= lo.block_reduction_pct);
            assert!(hi.base_dodge_pct >= lo.base_dodge_pct);
        }
    }

    #[test]
    fn test_rank_e_is_neutral() {
        assert_eq!(effective_damage(18, Rank::E), 18);
    }

    #[test]
    fn test_effective_damage_floors() {
        // 10 * 1.25 = 12.5
        assert_eq!(effective_damage(10, Rank::C), 12);
        assert_eq!(effective_damage(10, Rank::SSS), 25);
    }

    #[test]
    fn test_blocked_damage() {
        assert_eq!(blocked_damage(20, Rank::E), 18);
        assert_eq!(blocked_damage(20, Rank::SSS), 11);
        assert_eq!(blocked_damage(0, Rank::A), 0);
    }

    #[test]
    fn test_dodge_clamped_low() {
        assert_eq!(dodge_chance(Rank::E, Rank::E), 10);
        assert_eq!(dodge_chance(Rank::E, Rank::SSS), 10);
    }

    #[test]
    fn test_dodge_clamped_high() {
        // 26 + 70 = 96 -> 95
        assert_eq!(dodge_chance(Rank::SSS, Rank::E), 95);
    }

    #[test]
    fn test_dodge_rank_advantage() {
        // B vs D: 14 + 20
        assert_eq!(dodge_chance(Rank::B, Rank::D), 34);
    }

    #[test]
    fn test_parse_rank() {
        assert_eq!("ss".parse::<Rank>().unwrap(), Rank::SS);
        assert_eq!(" A ".parse::<Rank>().unwrap(), Rank::A);
        assert!("F".parse::<Rank>().is_err());
    }

    #[test]
    fn test_rank_ordering() {
        assert!(Rank::E < Rank::D);
        assert!(Rank::SS < Rank::SSS);
        assert_eq!(Rank::SSS.index(), 7);
    }
}
