//! Positional field layout and hex decoding for network log lines.
//!
//! Lines look like `[hh:mm:ss.mmm] 15:<attacker id>:<attacker>:...`: a
//! 15-character header, then `:`-separated fields with the hex message type
//! first.

use super::event::LogLineFlags;

/// Width of the `[hh:mm:ss.mmm] ` header, in characters.
pub const HEADER_LEN: usize = 15;

// Message type codes (hex on the wire)
pub const MESSAGE_TYPE_SINGLE_TARGET: u32 = 0x15;
pub const MESSAGE_TYPE_AOE: u32 = 0x16;
pub const MESSAGE_TYPE_DEATH: u32 = 0x19;
pub const MESSAGE_TYPE_GAIN_EFFECT: u32 = 0x1A;
pub const MESSAGE_TYPE_LOSE_EFFECT: u32 = 0x1E;

// Field indices for single target / aoe lines
pub const FIELD_TYPE: usize = 0;
pub const FIELD_ATTACKER_ID: usize = 1;
pub const FIELD_ATTACKER_NAME: usize = 2;
pub const FIELD_ABILITY_ID: usize = 3;
pub const FIELD_ABILITY_NAME: usize = 4;
pub const FIELD_TARGET_ID: usize = 5;
pub const FIELD_TARGET_NAME: usize = 6;
pub const FIELD_FLAGS: usize = 7;
pub const FIELD_DAMAGE: usize = 8;
pub const FIELD_TARGET_CURRENT_HP: usize = 23;
pub const FIELD_TARGET_MAX_HP: usize = 24;

/// Flag values after which the real flags and damage sit two fields later.
///
/// Upstream log quirk, reproduced as-is. Versioned with the log format; do not
/// derive new entries from observed data.
pub const SHIFT_FLAG_VALUES: [&str; 4] = ["3E", "113", "213", "313"];

/// Leading hex digits of `s` as an integer, like a lenient `parseInt(s, 16)`.
///
/// `None` when there is no leading hex digit or the value overflows.
pub fn parse_hex_prefix(s: &str) -> Option<u64> {
    let end = s
        .bytes()
        .position(|b| !b.is_ascii_hexdigit())
        .unwrap_or(s.len());
    if end == 0 {
        return None;
    }
    u64::from_str_radix(&s[..end], 16).ok()
}

/// Hex id field, e.g. `"10400001"`.
pub fn parse_id(s: &str) -> Option<u32> {
    parse_hex_prefix(s).and_then(|v| u32::try_from(v).ok())
}

/// Decode the damage field.
///
/// The low 16 bits carry flags. When the byte above them is `0x40` the
/// client has split a >16-bit value across two lanes and the last byte holds
/// the high part.
pub fn damage_from_field(field: &str) -> i64 {
    let len = field.len();
    if len <= 4 || !field.is_ascii() {
        return 0;
    }

    // Out-of-range values decode like non-hex input
    let Some(damage) = parse_hex_prefix(&field[..len - 4]).and_then(|v| i64::try_from(v).ok())
    else {
        return 0;
    };
    if field.as_bytes()[len - 4] != b'4' {
        return damage;
    }
    let right = parse_hex_prefix(&field[len - 2..]).map_or(0, |v| v as i64);
    damage
        .checked_sub(right)
        .and_then(|d| d.checked_add(right << 16))
        .unwrap_or(0)
}

/// Decode the hit-result category from the flags field.
///
/// Only the trailing digits matter. Blocked (`5`), parried (`6`), instant
/// death (`33`) and anything unknown yield no flags.
pub fn decode_flags(raw: &str) -> LogLineFlags {
    let bytes = raw.as_bytes();
    let from_end = |n: usize| bytes.len().checked_sub(n).map(|i| bytes[i]);

    let mut flags = LogLineFlags::default();
    match from_end(1) {
        Some(b'1') => flags.dodge = true,
        Some(b'3') => {
            if from_end(2) != Some(b'3') {
                flags.damage = true;
                match from_end(3) {
                    Some(b'1') => flags.crit = true,
                    Some(b'2') => flags.direct_hit = true,
                    Some(b'3') => {
                        flags.crit = true;
                        flags.direct_hit = true;
                    }
                    _ => {}
                }
            }
        }
        Some(b'4') => {
            flags.heal = true;
            if from_end(5) == Some(b'1') {
                flags.crit = true;
            }
        }
        _ => {}
    }
    flags
}
