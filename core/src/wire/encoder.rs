//! Producer side of the wire format.
//!
//! Writes exactly what [`decode_one`](super::decode_one) reads. Used to build
//! fixtures and capture files.

use std::io::Write;

use flate2::Compression;
use flate2::write::ZlibEncoder;

use super::record::{CombatantRecord, EncounterRecord, FlagRecord, LogLineRecord, Record};

fn write_u8(data: &mut Vec<u8>, value: u8) {
    data.push(value);
}

fn write_bool(data: &mut Vec<u8>, value: bool) {
    data.push(u8::from(value));
}

fn write_u16(data: &mut Vec<u8>, value: u16) {
    data.extend_from_slice(&value.to_be_bytes());
}

fn write_u32(data: &mut Vec<u8>, value: u32) {
    data.extend_from_slice(&value.to_be_bytes());
}

fn write_i32(data: &mut Vec<u8>, value: i32) {
    data.extend_from_slice(&value.to_be_bytes());
}

/// Length-prefixed string, cut on a char boundary if it exceeds `u16::MAX` bytes.
fn write_string(data: &mut Vec<u8>, value: &str) {
    let mut end = value.len().min(u16::MAX as usize);
    while !value.is_char_boundary(end) {
        end -= 1;
    }
    write_u16(data, end as u16);
    data.extend_from_slice(&value.as_bytes()[..end]);
}

fn encode_encounter(data: &mut Vec<u8>, value: &EncounterRecord) {
    write_string(data, &value.uid);
    write_string(data, &value.start_time.raw);
    write_string(data, &value.end_time.raw);
    write_string(data, &value.zone);
    write_u32(data, value.damage_total);
    write_bool(data, value.active);
    write_bool(data, value.end_wait);
    write_u8(data, value.success_level);
}

fn encode_combatant(data: &mut Vec<u8>, value: &CombatantRecord) {
    write_string(data, &value.encounter_uid);
    write_i32(data, value.id);
    write_string(data, &value.name);
    write_string(data, &value.world);
    write_string(data, &value.job);
    write_i32(data, value.damage);
    write_i32(data, value.damage_taken);
    write_i32(data, value.damage_healed);
    write_i32(data, value.deaths);
    write_i32(data, value.hits);
    write_i32(data, value.heals);
    write_i32(data, value.kills);
    write_string(data, &value.snapshot_time.raw);
}

fn encode_log_line(data: &mut Vec<u8>, value: &LogLineRecord) {
    write_string(data, &value.encounter_uid);
    write_string(data, &value.time.raw);
    write_string(data, &value.raw_text);
}

fn encode_flag(data: &mut Vec<u8>, value: &FlagRecord) {
    write_string(data, &value.name);
    write_bool(data, value.value);
}

/// Append one record, tag first.
pub fn encode(record: &Record, data: &mut Vec<u8>) {
    write_u8(data, record.kind().tag());
    match record {
        Record::Encounter(e) => encode_encounter(data, e),
        Record::Combatant(c) => encode_combatant(data, c),
        Record::LogLine(l) => encode_log_line(data, l),
        Record::Flag(f) => encode_flag(data, f),
    }
}

/// Concatenate records into one uncompressed message body.
pub fn encode_all(records: &[Record]) -> Vec<u8> {
    let mut data = Vec::new();
    for record in records {
        encode(record, &mut data);
    }
    data
}

/// Compress a message body into a zlib payload, as sent on the wire.
pub fn compress(data: &[u8]) -> std::io::Result<Vec<u8>> {
    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(data)?;
    encoder.finish()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::wire::decode_one;
    use crate::wire::record::EventTime;

    #[test]
    fn test_overlong_string_truncated_on_char_boundary() {
        // 65,536 bytes with the u16::MAX cut landing inside the trailing 'é'
        let mut text = "a".repeat(65_534);
        text.push('é');
        let record = Record::LogLine(LogLineRecord {
            encounter_uid: String::new(),
            time: EventTime::parse(String::new()),
            raw_text: text,
        });

        let mut buf = Vec::new();
        encode(&record, &mut buf);
        let (decoded, consumed) = decode_one(&buf, 0).unwrap();
        assert_eq!(consumed, buf.len());

        let Record::LogLine(line) = decoded else {
            panic!("expected log line");
        };
        assert_eq!(line.raw_text.len(), 65_534);
        assert!(line.raw_text.chars().all(|c| c == 'a'));
    }

    #[test]
    fn test_encode_all_concatenates() {
        let flags = vec![
            Record::Flag(FlagRecord {
                name: "a".into(),
                value: false,
            }),
            Record::Flag(FlagRecord {
                name: "b".into(),
                value: true,
            }),
        ];
        let buf = encode_all(&flags);
        assert_eq!(buf.len(), 2 * (1 + 2 + 1 + 1));
    }

    #[test]
    fn test_compress_is_zlib() {
        let payload = compress(b"hello").unwrap();
        // zlib header: CM=8 (deflate) in the low nibble of the first byte
        assert_eq!(payload[0] & 0x0F, 0x08);
        assert_eq!((u16::from(payload[0]) << 8 | u16::from(payload[1])) % 31, 0);
    }
}
