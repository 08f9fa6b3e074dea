//! Typed records carried on the wire.
//!
//! Four fixed-schema kinds, discriminated by the first byte of each encoded
//! record. Every consumer matches on [`Record`] exhaustively.

use chrono::{DateTime, Utc};
use serde::Serialize;

pub const DATA_TYPE_ENCOUNTER: u8 = 2;
pub const DATA_TYPE_COMBATANT: u8 = 3;
pub const DATA_TYPE_LOG_LINE: u8 = 5;
pub const DATA_TYPE_FLAG: u8 = 99;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordKind {
    Encounter,
    Combatant,
    LogLine,
    Flag,
}

impl RecordKind {
    pub const fn tag(self) -> u8 {
        match self {
            RecordKind::Encounter => DATA_TYPE_ENCOUNTER,
            RecordKind::Combatant => DATA_TYPE_COMBATANT,
            RecordKind::LogLine => DATA_TYPE_LOG_LINE,
            RecordKind::Flag => DATA_TYPE_FLAG,
        }
    }

    pub const fn from_tag(tag: u8) -> Option<Self> {
        match tag {
            DATA_TYPE_ENCOUNTER => Some(RecordKind::Encounter),
            DATA_TYPE_COMBATANT => Some(RecordKind::Combatant),
            DATA_TYPE_LOG_LINE => Some(RecordKind::LogLine),
            DATA_TYPE_FLAG => Some(RecordKind::Flag),
            _ => None,
        }
    }
}

/// An ISO8601 time field as sent, plus its parsed value.
///
/// The producer writes RFC3339 with nanoseconds. A string that doesn't parse
/// is kept verbatim with `value = None` rather than failing the record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EventTime {
    pub raw: String,
    pub value: Option<DateTime<Utc>>,
}

impl EventTime {
    pub fn parse(raw: String) -> Self {
        let value = DateTime::parse_from_rfc3339(&raw)
            .ok()
            .map(|dt| dt.with_timezone(&Utc));
        Self { raw, value }
    }

    /// Format a time the way the producer does (UTC, RFC3339 with nanoseconds).
    pub fn from_datetime(dt: DateTime<Utc>) -> Self {
        let raw = dt.to_rfc3339_opts(chrono::SecondsFormat::AutoSi, true);
        Self {
            raw,
            value: Some(dt),
        }
    }
}

/// One encounter "epoch". `uid` is the natural key.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EncounterRecord {
    pub uid: String,
    pub start_time: EventTime,
    pub end_time: EventTime,
    pub zone: String,
    pub damage_total: u32,
    pub active: bool,
    pub end_wait: bool,
    pub success_level: u8,
}

/// Point-in-time snapshot of one combatant within an encounter.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CombatantRecord {
    pub encounter_uid: String,
    /// Zero when the producer has no stable id (pets, some NPCs).
    pub id: i32,
    pub name: String,
    pub world: String,
    pub job: String,
    pub damage: i32,
    pub damage_taken: i32,
    pub damage_healed: i32,
    pub deaths: i32,
    pub hits: i32,
    pub heals: i32,
    pub kills: i32,
    pub snapshot_time: EventTime,
}

/// Identity of a combatant across snapshots.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub enum CombatantKey {
    Id(i32),
    Name(String),
}

impl CombatantRecord {
    /// `id` when present, otherwise the name.
    pub fn key(&self) -> CombatantKey {
        if self.id != 0 {
            CombatantKey::Id(self.id)
        } else {
            CombatantKey::Name(self.name.clone())
        }
    }
}

/// A raw combat log line, not yet interpreted.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LogLineRecord {
    pub encounter_uid: String,
    pub time: EventTime,
    pub raw_text: String,
}

/// Out-of-band signal unrelated to any encounter (e.g. "active").
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FlagRecord {
    pub name: String,
    pub value: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Record {
    Encounter(EncounterRecord),
    Combatant(CombatantRecord),
    LogLine(LogLineRecord),
    Flag(FlagRecord),
}

impl Record {
    pub fn kind(&self) -> RecordKind {
        match self {
            Record::Encounter(_) => RecordKind::Encounter,
            Record::Combatant(_) => RecordKind::Combatant,
            Record::LogLine(_) => RecordKind::LogLine,
            Record::Flag(_) => RecordKind::Flag,
        }
    }

    /// Encounter this record belongs to. Flags belong to none.
    pub fn encounter_uid(&self) -> Option<&str> {
        match self {
            Record::Encounter(e) => Some(&e.uid),
            Record::Combatant(c) => Some(&c.encounter_uid),
            Record::LogLine(l) => Some(&l.encounter_uid),
            Record::Flag(_) => None,
        }
    }

    /// Whether this record passes an optional single-encounter filter.
    pub fn matches_encounter(&self, filter: Option<&str>) -> bool {
        match (filter, self.encounter_uid()) {
            (None, _) | (_, None) => true,
            (Some(wanted), Some(uid)) => wanted == uid,
        }
    }
}
