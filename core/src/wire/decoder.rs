//! Decode one record at a time from a decompressed buffer.
//!
//! Records have no outer length framing: each kind knows its own field
//! layout, so the offset after a record is only known once every field has
//! been read. An unknown tag therefore poisons the rest of the buffer.

use super::error::DecodeError;
use super::reader::{read_bool, read_i32, read_length_prefixed_string, read_u8, read_u32};
use super::record::{
    CombatantRecord, EncounterRecord, EventTime, FlagRecord, LogLineRecord, Record, RecordKind,
};

/// Decode the record starting at `offset`.
///
/// Returns the record and the number of bytes it occupied. An `offset` at or
/// past the end of the buffer yields `TruncatedBuffer`.
pub fn decode_one(buffer: &[u8], offset: usize) -> Result<(Record, usize), DecodeError> {
    let (tag, pos) = read_u8(buffer, offset)?;
    let kind = RecordKind::from_tag(tag).ok_or(DecodeError::UnknownRecordKind { tag, offset })?;

    let (record, end) = match kind {
        RecordKind::Encounter => decode_encounter(buffer, pos)?,
        RecordKind::Combatant => decode_combatant(buffer, pos)?,
        RecordKind::LogLine => decode_log_line(buffer, pos)?,
        RecordKind::Flag => decode_flag(buffer, pos)?,
    };
    Ok((record, end - offset))
}

fn read_time(buffer: &[u8], pos: usize) -> Result<(EventTime, usize), DecodeError> {
    let (raw, pos) = read_length_prefixed_string(buffer, pos)?;
    Ok((EventTime::parse(raw), pos))
}

fn decode_encounter(buffer: &[u8], pos: usize) -> Result<(Record, usize), DecodeError> {
    let (uid, pos) = read_length_prefixed_string(buffer, pos)?;
    let (start_time, pos) = read_time(buffer, pos)?;
    let (end_time, pos) = read_time(buffer, pos)?;
    let (zone, pos) = read_length_prefixed_string(buffer, pos)?;
    let (damage_total, pos) = read_u32(buffer, pos)?;
    let (active, pos) = read_bool(buffer, pos)?;
    let (end_wait, pos) = read_bool(buffer, pos)?;
    let (success_level, pos) = read_u8(buffer, pos)?;

    Ok((
        Record::Encounter(EncounterRecord {
            uid,
            start_time,
            end_time,
            zone,
            damage_total,
            active,
            end_wait,
            success_level,
        }),
        pos,
    ))
}

fn decode_combatant(buffer: &[u8], pos: usize) -> Result<(Record, usize), DecodeError> {
    let (encounter_uid, pos) = read_length_prefixed_string(buffer, pos)?;
    let (id, pos) = read_i32(buffer, pos)?;
    let (name, pos) = read_length_prefixed_string(buffer, pos)?;
    let (world, pos) = read_length_prefixed_string(buffer, pos)?;
    let (job, pos) = read_length_prefixed_string(buffer, pos)?;
    let (damage, pos) = read_i32(buffer, pos)?;
    let (damage_taken, pos) = read_i32(buffer, pos)?;
    let (damage_healed, pos) = read_i32(buffer, pos)?;
    let (deaths, pos) = read_i32(buffer, pos)?;
    let (hits, pos) = read_i32(buffer, pos)?;
    let (heals, pos) = read_i32(buffer, pos)?;
    let (kills, pos) = read_i32(buffer, pos)?;
    let (snapshot_time, pos) = read_time(buffer, pos)?;

    Ok((
        Record::Combatant(CombatantRecord {
            encounter_uid,
            id,
            name,
            world,
            job,
            damage,
            damage_taken,
            damage_healed,
            deaths,
            hits,
            heals,
            kills,
            snapshot_time,
        }),
        pos,
    ))
}

fn decode_log_line(buffer: &[u8], pos: usize) -> Result<(Record, usize), DecodeError> {
    let (encounter_uid, pos) = read_length_prefixed_string(buffer, pos)?;
    let (time, pos) = read_time(buffer, pos)?;
    let (raw_text, pos) = read_length_prefixed_string(buffer, pos)?;

    Ok((
        Record::LogLine(LogLineRecord {
            encounter_uid,
            time,
            raw_text,
        }),
        pos,
    ))
}

fn decode_flag(buffer: &[u8], pos: usize) -> Result<(Record, usize), DecodeError> {
    let (name, pos) = read_length_prefixed_string(buffer, pos)?;
    let (value, pos) = read_bool(buffer, pos)?;

    Ok((Record::Flag(FlagRecord { name, value }), pos))
}
