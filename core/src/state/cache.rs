use hashbrown::HashMap;

use crate::combat_log::{LogLineParser, NameCache, ParsedLogEvent};
use crate::state::info::CombatantStanding;
use crate::state::ipc::{DecodeWorkerOutput, WorkerEncounterInfo};
use crate::wire::{CombatantKey, CombatantRecord, EncounterRecord, Record};

/// What applying one record did to the cache.
#[derive(Debug, Clone, PartialEq)]
pub enum CacheUpdate {
    /// A new encounter uid; all per-encounter state was cleared first.
    EncounterStarted,
    EncounterUpdated,
    Combatant(CombatantKey),
    /// Parsed combat event, `None` if the line didn't parse.
    LogLine(Option<ParsedLogEvent>),
    Flag,
    /// Belongs to another encounter, or a combatant with no name.
    Ignored,
}

/// Consumer-side state for the encounter currently being received.
///
/// Pure storage: the pipeline never touches it, a consumer feeds it records.
#[derive(Debug, Clone, Default)]
pub struct EncounterCache {
    encounter: Option<EncounterRecord>,
    // Latest snapshot per combatant
    combatants: HashMap<CombatantKey, CombatantRecord>,
    names: NameCache,
    flags: HashMap<String, bool>,
    log_lines: usize,
    parsed_events: usize,
    encounters_seen: usize,
}

impl EncounterCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply one record. Log lines are parsed with `parser` only when given.
    pub fn apply(&mut self, record: &Record, parser: Option<&LogLineParser>) -> CacheUpdate {
        match record {
            Record::Encounter(encounter) => self.apply_encounter(encounter),
            Record::Combatant(combatant) => self.apply_combatant(combatant),
            Record::LogLine(line) => {
                if !self.is_current(&line.encounter_uid) {
                    return CacheUpdate::Ignored;
                }
                self.log_lines += 1;
                let Some(parser) = parser else {
                    return CacheUpdate::LogLine(None);
                };
                let event = parser.parse(&line.raw_text).map(|mut event| {
                    self.names.observe(&event);
                    self.names.fill_ids(&mut event);
                    event
                });
                if event.is_some() {
                    self.parsed_events += 1;
                }
                CacheUpdate::LogLine(event)
            }
            Record::Flag(flag) => {
                self.flags.insert(flag.name.clone(), flag.value);
                CacheUpdate::Flag
            }
        }
    }

    fn apply_encounter(&mut self, encounter: &EncounterRecord) -> CacheUpdate {
        let same = self.encounter.as_ref().is_some_and(|e| e.uid == encounter.uid);
        if same {
            self.encounter = Some(encounter.clone());
            return CacheUpdate::EncounterUpdated;
        }

        tracing::debug!(uid = %encounter.uid, zone = %encounter.zone, "New encounter");
        self.reset_encounter_state();
        self.encounter = Some(encounter.clone());
        self.encounters_seen += 1;
        CacheUpdate::EncounterStarted
    }

    fn apply_combatant(&mut self, combatant: &CombatantRecord) -> CacheUpdate {
        if combatant.name.is_empty() || !self.is_current(&combatant.encounter_uid) {
            return CacheUpdate::Ignored;
        }
        let key = combatant.key();
        self.combatants.insert(key.clone(), combatant.clone());
        CacheUpdate::Combatant(key)
    }

    /// Records arriving before any encounter record are accepted.
    fn is_current(&self, uid: &str) -> bool {
        self.encounter.as_ref().is_none_or(|e| e.uid == uid)
    }

    fn reset_encounter_state(&mut self) {
        self.combatants.clear();
        self.names.clear();
        self.log_lines = 0;
        self.parsed_events = 0;
    }

    // --- Accessors ---

    pub fn encounter(&self) -> Option<&EncounterRecord> {
        self.encounter.as_ref()
    }

    pub fn combatant(&self, key: &CombatantKey) -> Option<&CombatantRecord> {
        self.combatants.get(key)
    }

    pub fn combatant_count(&self) -> usize {
        self.combatants.len()
    }

    pub fn flag(&self, name: &str) -> Option<bool> {
        self.flags.get(name).copied()
    }

    pub fn names(&self) -> &NameCache {
        &self.names
    }

    pub fn log_line_count(&self) -> usize {
        self.log_lines
    }

    /// Encounter length in seconds, from the record's start/end times.
    pub fn duration_secs(&self) -> Option<f64> {
        let encounter = self.encounter.as_ref()?;
        let start = encounter.start_time.value?;
        let end = encounter.end_time.value?;
        let millis = (end - start).num_milliseconds();
        (millis > 0).then(|| millis as f64 / 1000.0)
    }

    /// Combatants ordered by damage, highest first, ties by name.
    pub fn standings(&self) -> Vec<CombatantStanding> {
        let mut rows: Vec<CombatantStanding> = self
            .combatants
            .values()
            .map(CombatantStanding::from_record)
            .collect();
        rows.sort_by(|a, b| b.damage.cmp(&a.damage).then_with(|| a.name.cmp(&b.name)));
        rows
    }

    pub fn to_worker_output(
        &self,
        messages: usize,
        failed_messages: usize,
        records: usize,
    ) -> DecodeWorkerOutput {
        let mut flags: Vec<(String, bool)> =
            self.flags.iter().map(|(k, v)| (k.clone(), *v)).collect();
        flags.sort();

        DecodeWorkerOutput {
            messages,
            failed_messages,
            records,
            log_lines: self.log_lines,
            parsed_events: self.parsed_events,
            encounters_seen: self.encounters_seen,
            encounter: self
                .encounter
                .as_ref()
                .map(|e| WorkerEncounterInfo::from_record(e, self.duration_secs())),
            combatants: self.standings(),
            flags,
            protocol_warnings: 0,
            elapsed_ms: 0,
        }
    }
}
