//! Combat log, narrative events and the listener interface.

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use super::snapshot::EncounterSnapshot;

/// Log entry category, used for UI replay
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LogKind {
    Action,
    Damage,
    Heal,
    Status,
    Telegraph,
    System,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogEntry {
    pub step: u64,
    pub timestamp: DateTime<Utc>,
    pub kind: LogKind,
    pub message: String,
}

/// Append-only combat log
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CombatLog {
    entries: Vec<LogEntry>,
}

impl CombatLog {
    pub fn push(&mut self, step: u64, kind: LogKind, message: impl Into<String>) -> &LogEntry {
        self.entries.push(LogEntry {
            step,
            timestamp: Utc::now(),
            kind,
            message: message.into(),
        });
        &self.entries[self.entries.len() - 1]
    }

    pub fn entries(&self) -> &[LogEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn last(&self) -> Option<&LogEntry> {
        self.entries.last()
    }

    pub fn of_kind(&self, kind: LogKind) -> impl Iterator<Item = &LogEntry> {
        self.entries.iter().filter(move |e| e.kind == kind)
    }

    pub fn to_json(&self) -> String {
        serde_json::to_string(&self.entries).unwrap_or_default()
    }
}

/// Narrative event type pushed to listeners
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EventKind {
    Damage,
    Heal,
    Skill,
    Status,
    Info,
    Victory,
    Defeat,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CombatEvent {
    pub kind: EventKind,
    pub message: String,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EncounterResult {
    Victory,
    Defeat,
}

/// Fired once per Victory/Defeat transition
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncounterOutcome {
    pub result: EncounterResult,
    pub roster_index: usize,
    pub all_defeated: bool,
    pub steps: u64,
}

impl EncounterOutcome {
    /// Caller should load the next roster entry rather than end the run
    pub fn should_advance(&self) -> bool {
        self.result == EncounterResult::Victory && !self.all_defeated
    }
}

/// External observer (UI collaborator). All methods default to no-ops.
pub trait CombatListener: Send + Sync {
    /// Return false to skip building snapshots nobody reads
    fn wants_snapshots(&self) -> bool {
        true
    }
    fn on_state_update(&self, _snapshot: &EncounterSnapshot) {}
    fn on_combat_event(&self, _event: &CombatEvent) {}
    fn on_encounter_complete(&self, _outcome: &EncounterOutcome) {}
}

/// Listener that ignores everything
#[derive(Debug, Default, Clone, Copy)]
pub struct NullListener;

impl CombatListener for NullListener {
    fn wants_snapshots(&self) -> bool {
        false
    }
}

/// Listener that keeps everything it receives
#[derive(Debug, Default)]
pub struct RecordingListener {
    snapshots: Mutex<Vec<EncounterSnapshot>>,
    events: Mutex<Vec<CombatEvent>>,
    outcomes: Mutex<Vec<EncounterOutcome>>,
}

impl RecordingListener {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn snapshot_count(&self) -> usize {
        self.snapshots.lock().len()
    }

    pub fn last_snapshot(&self) -> Option<EncounterSnapshot> {
        self.snapshots.lock().last().cloned()
    }

    pub fn events(&self) -> Vec<CombatEvent> {
        self.events.lock().clone()
    }

    pub fn event_count(&self) -> usize {
        self.events.lock().len()
    }

    pub fn outcomes(&self) -> Vec<EncounterOutcome> {
        self.outcomes.lock().clone()
    }

    /// Total callbacks received of any kind
    pub fn total(&self) -> usize {
        self.snapshots.lock().len() + self.events.lock().len() + self.outcomes.lock().len()
    }
}

impl CombatListener for RecordingListener {
    fn on_state_update(&self, snapshot: &EncounterSnapshot) {
        self.snapshots.lock().push(snapshot.clone());
    }

    fn on_combat_event(&self, event: &CombatEvent) {
        self.events.lock().push(event.clone());
    }

    fn on_encounter_complete(&self, outcome: &EncounterOutcome) {
        self.outcomes.lock().push(outcome.clone());
    }
}
