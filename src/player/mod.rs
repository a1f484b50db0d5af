//! Player roles and configuration.
//!
//! The configuration provider hands over role, rank, level and
//! specialization; starting pools and base attack are derived here.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::combat::rank::Rank;
use crate::error::CombatError;

/// Playable roles
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Role {
    Guardian, // tank: shields, damage reduction
    Striker,  // bruiser: bleeds, weak spots
    Assassin, // burst: execute
    Marksman, // ranged: every 3rd auto-attack doubles
    Healer,   // sustain: passive regeneration
}

impl Role {
    pub const ALL: [Role; 5] = [
        Role::Guardian,
        Role::Striker,
        Role::Assassin,
        Role::Marksman,
        Role::Healer,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Guardian => "Guardian",
            Role::Striker => "Striker",
            Role::Assassin => "Assassin",
            Role::Marksman => "Marksman",
            Role::Healer => "Healer",
        }
    }

    /// Level-1 stats for the role
    pub fn base_stats(&self) -> RoleStats {
        match self {
            Role::Guardian => RoleStats::new(140, 40, 100, 10),
            Role::Striker => RoleStats::new(120, 35, 100, 14),
            Role::Assassin => RoleStats::new(100, 40, 100, 16),
            Role::Marksman => RoleStats::new(100, 50, 100, 12),
            Role::Healer => RoleStats::new(110, 80, 100, 8),
        }
    }

    pub fn has_passive_regen(&self) -> bool {
        matches!(self, Role::Healer)
    }

    pub fn doubles_every_third_attack(&self) -> bool {
        matches!(self, Role::Marksman)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = CombatError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Role::ALL
            .iter()
            .copied()
            .find(|r| r.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| CombatError::UnknownRole(s.to_string()))
    }
}

/// Starting pools and attack for a role at a level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleStats {
    pub max_hp: u32,
    pub max_mana: u32,
    pub max_stamina: u32,
    pub attack: u32,
}

impl RoleStats {
    const fn new(max_hp: u32, max_mana: u32, max_stamina: u32, attack: u32) -> Self {
        Self {
            max_hp,
            max_mana,
            max_stamina,
            attack,
        }
    }

    /// +10 HP, +5 MP, +1 attack per level above 1
    pub fn at_level(self, level: u32) -> Self {
        let extra = level.max(1) - 1;
        Self {
            max_hp: self.max_hp + extra * 10,
            max_mana: self.max_mana + extra * 5,
            max_stamina: self.max_stamina,
            attack: self.attack + extra,
        }
    }
}

/// What the player configuration provider supplies
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerConfig {
    pub name: String,
    pub role: Role,
    pub rank: Rank,
    pub level: u32,
    #[serde(default)]
    pub specialization: Option<String>,
}

impl PlayerConfig {
    pub fn new(role: Role, rank: Rank, level: u32) -> Self {
        Self {
            name: "Hunter".into(),
            role,
            rank,
            level: level.max(1),
            specialization: None,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn with_specialization(mut self, spec: impl Into<String>) -> Self {
        self.specialization = Some(spec.into());
        self
    }

    pub fn stats(&self) -> RoleStats {
        self.role.base_stats().at_level(self.level)
    }
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self::new(Role::Guardian, Rank::E, 1)
    }
}
