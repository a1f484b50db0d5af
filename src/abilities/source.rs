//! Where ability definitions come from.
//!
//! The core accepts any [`AbilitySource`]: the built-in table, a JSON/RON
//! file, or definitions fetched elsewhere and handed over as a list.

use std::path::PathBuf;

use super::{builtin::builtin_abilities, AbilityDef};
use crate::error::{CombatError, CombatResult};

pub trait AbilitySource {
    fn name(&self) -> &str;
    fn load(&self) -> CombatResult<Vec<AbilityDef>>;
}

/// The static table compiled into the crate
#[derive(Debug, Default, Clone, Copy)]
pub struct BuiltinSource;

impl AbilitySource for BuiltinSource {
    fn name(&self) -> &str {
        "builtin"
    }

    fn load(&self) -> CombatResult<Vec<AbilityDef>> {
        Ok(builtin_abilities())
    }
}

/// Definitions already in memory (e.g. fetched from a content server)
#[derive(Debug, Default, Clone)]
pub struct StaticSource(pub Vec<AbilityDef>);

impl AbilitySource for StaticSource {
    fn name(&self) -> &str {
        "static"
    }

    fn load(&self) -> CombatResult<Vec<AbilityDef>> {
        Ok(self.0.clone())
    }
}

/// A catalog file; `.ron` is parsed as RON, anything else as JSON
#[derive(Debug, Clone)]
pub struct FileSource {
    path: PathBuf,
}

impl FileSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    fn is_ron(&self) -> bool {
        self.path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case("ron"))
    }
}

impl AbilitySource for FileSource {
    fn name(&self) -> &str {
        self.path.to_str().unwrap_or("file")
    }

    fn load(&self) -> CombatResult<Vec<AbilityDef>> {
        let text = std::fs::read_to_string(&self.path)?;
        if self.is_ron() {
            ron::from_str(&text).map_err(|e| CombatError::CatalogParse(e.to_string()))
        } else {
            serde_json::from_str(&text).map_err(|e| CombatError::CatalogParse(e.to_string()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::abilities::{AbilityCatalog, AbilityEffect, TargetType, INTERRUPT_ID};
    use std::io::Write;

    #[test]
    fn test_json_file_source() {
        let defs = vec![AbilityDef::new("jab", "Jab", TargetType::SingleEnemy)
            .effect(AbilityEffect::Damage { amount: 3 })];
        let mut file = tempfile::Builder::new().suffix(".json").tempfile().unwrap();
        file.write_all(serde_json::to_string(&defs).unwrap().as_bytes())
            .unwrap();

        let loaded = FileSource::new(file.path()).load().unwrap();
        assert_eq!(loaded, defs);
    }

    #[test]
    fn test_ron_file_source() {
        let defs = vec![AbilityDef::new("jab", "Jab", TargetType::SingleEnemy)
            .effect(AbilityEffect::Damage { amount: 3 })];
        let mut file = tempfile::Builder::new().suffix(".ron").tempfile().unwrap();
        file.write_all(ron::to_string(&defs).unwrap().as_bytes())
            .unwrap();

        let catalog = AbilityCatalog::load_or_builtin(&FileSource::new(file.path()));
        assert_eq!(catalog.len(), 2);
        assert!(catalog.contains("jab"));
        assert!(catalog.contains(INTERRUPT_ID), "interrupt is always available");
    }

    #[test]
    fn test_missing_file_falls_back() {
        let source = FileSource::new("/definitely/not/here.json");
        assert!(matches!(source.load(), Err(CombatError::CatalogIo(_))));

        let catalog = AbilityCatalog::load_or_builtin(&source);
        assert_eq!(catalog.len(), builtin_abilities().len());
    }

    #[test]
    fn test_malformed_file_falls_back() {
        let mut file = tempfile::Builder::new().suffix(".json").tempfile().unwrap();
        file.write_all(b"[{\"id\": 3}]").unwrap();
        let source = FileSource::new(file.path());
        assert!(matches!(source.load(), Err(CombatError::CatalogParse(_))));
        assert!(AbilityCatalog::load_or_builtin(&source).contains("shield_bash"));
    }

    #[test]
    fn test_invalid_definition_falls_back() {
        let bad = StaticSource(vec![AbilityDef::new("x", "X", TargetType::SelfOnly)]);
        let catalog = AbilityCatalog::load_or_builtin(&bad);
        assert!(catalog.contains("shield_bash"));
    }
}
