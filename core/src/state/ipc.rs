//! Output contract of the decode worker binary.
//!
//! Plain serde structs so scripts reading the worker's stdout can deserialize
//! the same definitions.

use serde::{Deserialize, Serialize};

use crate::state::info::CombatantStanding;
use crate::wire::EncounterRecord;

/// Encounter info for output (plain strings instead of parsed times).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkerEncounterInfo {
    pub uid: String,
    pub zone: String,
    pub start_time: String,
    pub end_time: String,
    pub duration_secs: Option<f64>,
    pub damage_total: u32,
    pub active: bool,
    pub success_level: u8,
}

impl WorkerEncounterInfo {
    pub fn from_record(record: &EncounterRecord, duration_secs: Option<f64>) -> Self {
        Self {
            uid: record.uid.clone(),
            zone: record.zone.clone(),
            start_time: record.start_time.raw.clone(),
            end_time: record.end_time.raw.clone(),
            duration_secs,
            damage_total: record.damage_total,
            active: record.active,
            success_level: record.success_level,
        }
    }
}

/// Final summary line printed by the decode worker.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DecodeWorkerOutput {
    /// Messages read from the capture.
    pub messages: usize,
    /// Messages that ended in a decompress or decode failure.
    pub failed_messages: usize,
    /// Records emitted by the pipeline (after the encounter filter).
    pub records: usize,
    /// Log lines received for the last encounter.
    pub log_lines: usize,
    /// Log lines that parsed into combat events.
    pub parsed_events: usize,
    pub encounters_seen: usize,
    /// Last encounter seen, if any.
    pub encounter: Option<WorkerEncounterInfo>,
    pub combatants: Vec<CombatantStanding>,
    pub flags: Vec<(String, bool)>,
    pub protocol_warnings: usize,
    /// Elapsed time in milliseconds.
    pub elapsed_ms: u128,
}
