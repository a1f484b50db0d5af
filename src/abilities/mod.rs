//! Active Abilities System
//!
//! Abilities are data: cost, cooldown, targeting and a list of effects. The
//! encounter resolves the effects. A few abilities carry a script (execute
//! below a health threshold, refund on kill) and get their own [`Ability`]
//! implementation for the precondition and on-kill hooks.
//!
//! The catalog is built once, validated, and shared between encounters
//! behind an `Arc`. It is never mutated afterwards.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;
use tracing::{error, warn};

use crate::combat::rank::Rank;
use crate::combat::resources::Cost;
use crate::combat::Combatant;
use crate::error::{CombatError, CombatResult};
use crate::player::{PlayerConfig, Role};

pub mod builtin;
pub mod source;

pub use source::{AbilitySource, BuiltinSource, FileSource, StaticSource};

/// Ability id every role can use against a telegraphed special
pub const INTERRUPT_ID: &str = "interrupt";

/// Targeting type for abilities
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TargetType {
    SelfOnly,
    SingleEnemy,
    AllEnemies,
    SingleAlly,
    AllAllies,
}

impl TargetType {
    pub fn is_hostile(&self) -> bool {
        matches!(self, TargetType::SingleEnemy | TargetType::AllEnemies)
    }
}

/// What an ability does on activation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AbilityEffect {
    Damage { amount: u32 },
    Heal { amount: u32 },
    Shield { amount: u32 },
    Fortify { reduction_pct: u32, duration: u32 },
    Bleed { per_step: u32, duration: u32 },
    Burn { per_step: u32, duration: u32 },
    WeakSpot { multiplier_pct: u32, duration: u32 },
    Stun { duration: u32 },
    Focus { duration: u32 },
    RestoreStamina { amount: u32 },
    /// Cancels a boss special that is being telegraphed
    Interrupt,
}

impl AbilityEffect {
    /// Whether the effect lands on the opposing side
    pub fn is_hostile(&self) -> bool {
        matches!(
            self,
            AbilityEffect::Damage { .. }
                | AbilityEffect::Bleed { .. }
                | AbilityEffect::Burn { .. }
                | AbilityEffect::WeakSpot { .. }
                | AbilityEffect::Stun { .. }
                | AbilityEffect::Interrupt
        )
    }

    fn duration(&self) -> Option<u32> {
        match self {
            AbilityEffect::Fortify { duration, .. }
            | AbilityEffect::Bleed { duration, .. }
            | AbilityEffect::Burn { duration, .. }
            | AbilityEffect::WeakSpot { duration, .. }
            | AbilityEffect::Stun { duration }
            | AbilityEffect::Focus { duration } => Some(*duration),
            _ => None,
        }
    }
}

/// Who may slot an ability
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Gating {
    pub min_level: u32,
    pub min_rank: Rank,
    /// Empty = every role
    pub roles: Vec<Role>,
    pub specialization: Option<String>,
}

impl Gating {
    pub fn allows(&self, config: &PlayerConfig) -> bool {
        config.level >= self.min_level
            && config.rank >= self.min_rank
            && (self.roles.is_empty() || self.roles.contains(&config.role))
            && self
                .specialization
                .as_ref()
                .is_none_or(|spec| config.specialization.as_ref() == Some(spec))
    }
}

/// Scripted behavior on top of the data effects
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Script {
    /// Usable only while target health is at or below the threshold
    Execute { threshold_pct: u32 },
}

/// Static, immutable ability definition
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AbilityDef {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub cost: Cost,
    #[serde(default)]
    pub cooldown_ms: u64,
    pub target: TargetType,
    pub effects: Vec<AbilityEffect>,
    #[serde(default)]
    pub gating: Gating,
    #[serde(default)]
    pub script: Option<Script>,
    /// Give the mana cost back when the ability lands a killing blow
    #[serde(default)]
    pub refund_on_kill: bool,
}

impl AbilityDef {
    pub fn new(id: &str, name: &str, target: TargetType) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            description: String::new(),
            cost: Cost::free(),
            cooldown_ms: 0,
            target,
            effects: Vec::new(),
            gating: Gating::default(),
            script: None,
            refund_on_kill: false,
        }
    }

    pub fn describe(mut self, text: &str) -> Self {
        self.description = text.into();
        self
    }

    pub fn cost(mut self, cost: Cost) -> Self {
        self.cost = cost;
        self
    }

    pub fn cooldown_ms(mut self, ms: u64) -> Self {
        self.cooldown_ms = ms;
        self
    }

    pub fn effect(mut self, effect: AbilityEffect) -> Self {
        self.effects.push(effect);
        self
    }

    pub fn roles(mut self, roles: &[Role]) -> Self {
        self.gating.roles = roles.to_vec();
        self
    }

    pub fn min_level(mut self, level: u32) -> Self {
        self.gating.min_level = level;
        self
    }

    pub fn min_rank(mut self, rank: Rank) -> Self {
        self.gating.min_rank = rank;
        self
    }

    pub fn specialization(mut self, spec: &str) -> Self {
        self.gating.specialization = Some(spec.into());
        self
    }

    pub fn script(mut self, script: Script) -> Self {
        self.script = Some(script);
        self
    }

    pub fn refund_on_kill(mut self) -> Self {
        self.refund_on_kill = true;
        self
    }

    /// Reject definitions the resolver cannot make sense of.
    pub fn validate(&self) -> CombatResult<()> {
        let invalid = |reason: &str| CombatError::InvalidAbility {
            id: self.id.clone(),
            reason: reason.to_string(),
        };

        if self.id.trim().is_empty() {
            return Err(invalid("empty id"));
        }
        if self.name.trim().is_empty() {
            return Err(invalid("empty name"));
        }
        if self.effects.is_empty() {
            return Err(invalid("no effects"));
        }
        for effect in &self.effects {
            if effect.duration() == Some(0) {
                return Err(invalid("effect with zero duration"));
            }
            if effect.is_hostile() != self.target.is_hostile() {
                return Err(invalid("effect side does not match target type"));
            }
            match effect {
                AbilityEffect::WeakSpot { multiplier_pct, .. } if *multiplier_pct < 100 => {
                    return Err(invalid("weak spot multiplier below 100%"));
                }
                AbilityEffect::Fortify { reduction_pct, .. } if *reduction_pct > 100 => {
                    return Err(invalid("fortify above 100%"));
                }
                _ => {}
            }
        }
        if self.effects.contains(&AbilityEffect::Interrupt) && self.effects.len() > 1 {
            return Err(invalid("interrupt cannot be combined with other effects"));
        }
        if let Some(Script::Execute { threshold_pct }) = self.script {
            if threshold_pct == 0 || threshold_pct > 100 {
                return Err(invalid("execute threshold must be within 1..=100"));
            }
            if !self
                .effects
                .iter()
                .any(|e| matches!(e, AbilityEffect::Damage { .. }))
            {
                return Err(invalid("execute needs a damage effect"));
            }
        }
        Ok(())
    }
}

/// Capability interface the encounter resolves against.
pub trait Ability: Send + Sync + fmt::Debug {
    fn def(&self) -> &AbilityDef;

    fn id(&self) -> &str {
        &self.def().id
    }

    fn name(&self) -> &str {
        &self.def().name
    }

    fn cost(&self) -> Cost {
        self.def().cost
    }

    fn cooldown_ms(&self) -> u64 {
        self.def().cooldown_ms
    }

    fn target(&self) -> TargetType {
        self.def().target
    }

    fn effects(&self) -> &[AbilityEffect] {
        &self.def().effects
    }

    /// Scripted precondition checked after cooldown and cost.
    fn precondition(&self, _caster: &Combatant, _target: Option<&Combatant>) -> bool {
        true
    }

    /// Runs when the ability's own effects killed the target.
    /// Returns a log line when it did something.
    fn on_kill(&self, caster: &mut Combatant) -> Option<String> {
        if !self.def().refund_on_kill || self.cost().mana == 0 {
            return None;
        }
        let refunded = caster.mana.as_mut()?.restore(self.cost().mana);
        Some(format!("{} refunds {} MP", self.name(), refunded))
    }
}

/// Plain data-driven ability
#[derive(Debug, Clone)]
pub struct DataAbility(pub AbilityDef);

impl Ability for DataAbility {
    fn def(&self) -> &AbilityDef {
        &self.0
    }
}

/// Finisher: only usable at or below a target health threshold
#[derive(Debug, Clone)]
pub struct ExecuteAbility {
    def: AbilityDef,
    threshold_pct: u32,
}

impl Ability for ExecuteAbility {
    fn def(&self) -> &AbilityDef {
        &self.def
    }

    fn precondition(&self, _caster: &Combatant, target: Option<&Combatant>) -> bool {
        target.is_some_and(|t| {
            t.health.current() as u64 * 100 <= t.health.max() as u64 * self.threshold_pct as u64
        })
    }
}

fn instantiate(def: AbilityDef) -> Arc<dyn Ability> {
    match def.script {
        Some(Script::Execute { threshold_pct }) => Arc::new(ExecuteAbility { def, threshold_pct }),
        None => Arc::new(DataAbility(def)),
    }
}

/// Validated, immutable ability lookup
#[derive(Debug, Clone)]
pub struct AbilityCatalog {
    abilities: BTreeMap<String, Arc<dyn Ability>>,
}

impl AbilityCatalog {
    /// Build from definitions, failing fast on the first malformed or
    /// duplicate entry.
    pub fn from_defs(defs: Vec<AbilityDef>) -> CombatResult<Self> {
        let mut abilities = BTreeMap::new();
        for def in defs {
            def.validate()?;
            if abilities.contains_key(&def.id) {
                return Err(CombatError::InvalidAbility {
                    id: def.id,
                    reason: "duplicate id".into(),
                });
            }
            abilities.insert(def.id.clone(), instantiate(def));
        }
        Ok(Self { abilities })
    }

    pub fn builtin() -> Self {
        Self::from_defs(builtin::builtin_abilities()).unwrap_or_else(|e| {
            error!(error = %e, "Built-in ability table failed validation");
            Self {
                abilities: BTreeMap::new(),
            }
        })
    }

    /// Load from an external source; any failure falls back to the built-in
    /// table so the encounter is never left without abilities.
    pub fn load_or_builtin(source: &dyn AbilitySource) -> Self {
        match source.load().and_then(Self::from_defs) {
            Ok(mut catalog) if !catalog.is_empty() => {
                catalog.ensure_interrupt(source.name());
                catalog
            }
            Ok(_) => {
                warn!(source = source.name(), "Ability source is empty, using built-in catalog");
                Self::builtin()
            }
            Err(e) => {
                warn!(source = source.name(), error = %e, "Ability source failed, using built-in catalog");
                Self::builtin()
            }
        }
    }

    /// Every catalog carries the interrupt; a source without one gets the
    /// built-in definition.
    fn ensure_interrupt(&mut self, source: &str) {
        if self.contains(INTERRUPT_ID) {
            return;
        }
        let Some(def) = builtin::builtin_abilities()
            .into_iter()
            .find(|d| d.id == INTERRUPT_ID)
        else {
            return;
        };
        warn!(source, "Ability source has no interrupt, adding the built-in one");
        self.abilities.insert(def.id.clone(), instantiate(def));
    }

    pub fn get(&self, id: &str) -> Option<Arc<dyn Ability>> {
        self.abilities.get(id).cloned()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.abilities.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.abilities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.abilities.is_empty()
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.abilities.keys().map(|k| k.as_str())
    }

    /// Ids the configured player may slot, in id order
    pub fn available_for(&self, config: &PlayerConfig) -> Vec<String> {
        self.abilities
            .values()
            .filter(|a| a.def().gating.allows(config))
            .map(|a| a.id().to_string())
            .collect()
    }
}

impl Default for AbilityCatalog {
    fn default() -> Self {
        Self::builtin()
    }
}
