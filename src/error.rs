//! Error type for encounter construction and external inputs.
//!
//! Rejected player actions are not errors; see
//! [`crate::encounter::ActionResult`].

/// Error type for the combat core
#[derive(Debug, thiserror::Error)]
pub enum CombatError {
    #[error("Unknown role: {0}")]
    UnknownRole(String),
    #[error("Unknown rank: {0}")]
    UnknownRank(String),
    #[error("Invalid ability '{id}': {reason}")]
    InvalidAbility { id: String, reason: String },
    #[error("Roster is empty")]
    EmptyRoster,
    #[error("Invalid config: {0}")]
    InvalidConfig(String),
    #[error("Catalog IO error: {0}")]
    CatalogIo(#[from] std::io::Error),
    #[error("Catalog parse error: {0}")]
    CatalogParse(String),
    #[error("Encounter is closed")]
    EncounterClosed,
}

pub type CombatResult<T> = Result<T, CombatError>;
