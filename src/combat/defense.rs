//! Block and dodge defensive mechanics (discrete mode).
//!
//! - Block: reduces the incoming hit by the defender's rank block percentage
//! - Dodge: avoids the hit entirely if the roll lands under the dodge chance
//!
//! Rolls are passed in so the resolver stays pure; the encounter owns the RNG.

use serde::{Deserialize, Serialize};

use super::rank::{blocked_damage, dodge_chance, Rank};

/// Defensive stance chosen for the current round
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum DefenseAction {
    #[default]
    None,
    Block,
    Dodge,
}

/// Result of a defense check against one incoming hit
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DefenseResult {
    /// Block absorbed part of the hit
    BlockAbsorb { absorbed: u32, remaining: u32 },
    /// Dodge landed, the attack missed
    DodgeSuccess,
    /// Dodge attempted but the roll failed
    DodgeFailed,
    /// No defense active, full damage
    NoDefense,
}

impl DefenseResult {
    /// Damage that still goes through to mitigation
    pub fn remaining(&self, incoming: u32) -> u32 {
        match self {
            DefenseResult::BlockAbsorb { remaining, .. } => *remaining,
            DefenseResult::DodgeSuccess => 0,
            DefenseResult::DodgeFailed | DefenseResult::NoDefense => incoming,
        }
    }
}

/// Check if an incoming hit is defended.
///
/// `roll` is a uniform value in `0..100`; a dodge succeeds when
/// `roll < dodge_chance(defender, attacker)`.
pub fn check_defense(
    action: DefenseAction,
    incoming: u32,
    defender: Rank,
    attacker: Rank,
    roll: u32,
) -> DefenseResult {
    match action {
        DefenseAction::Block => {
            let remaining = blocked_damage(incoming, defender);
            DefenseResult::BlockAbsorb {
                absorbed: incoming - remaining,
                remaining,
            }
        }
        DefenseAction::Dodge => {
            if roll < dodge_chance(defender, attacker) {
                DefenseResult::DodgeSuccess
            } else {
                DefenseResult::DodgeFailed
            }
        }
        DefenseAction::None => DefenseResult::NoDefense,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_block_uses_defender_rank() {
        let result = check_defense(DefenseAction::Block, 20, Rank::A, Rank::E, 0);
        // A blocks 30%
        assert_eq!(
            result,
            DefenseResult::BlockAbsorb {
                absorbed: 6,
                remaining: 14
            }
        );
        assert_eq!(result.remaining(20), 14);
    }

    #[test]
    fn test_dodge_roll_threshold() {
        // E vs E clamps to 10%
        assert_eq!(
            check_defense(DefenseAction::Dodge, 20, Rank::E, Rank::E, 9),
            DefenseResult::DodgeSuccess
        );
        assert_eq!(
            check_defense(DefenseAction::Dodge, 20, Rank::E, Rank::E, 10),
            DefenseResult::DodgeFailed
        );
    }

    #[test]
    fn test_no_defense_passes_through() {
        let result = check_defense(DefenseAction::None, 17, Rank::S, Rank::E, 0);
        assert_eq!(result, DefenseResult::NoDefense);
        assert_eq!(result.remaining(17), 17);
    }

    #[test]
    fn test_dodge_success_negates() {
        assert_eq!(DefenseResult::DodgeSuccess.remaining(50), 0);
    }
}
