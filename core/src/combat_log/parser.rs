use std::sync::LazyLock;

use memchr::memmem;
use rayon::prelude::*;
use regex::Regex;

use super::event::{EventKind, ParsedLogEvent};
use super::fields::*;

const GAIN_EFFECT_PATTERN: &str = concat!(
    r"1A:(?:([0-9A-F]*):)?([a-zA-Z0-9` ']*) gains the effect of ([a-zA-Z0-9` ']*)",
    r" from ([a-zA-Z0-9` ']*) for ([0-9]*)\.00 Seconds\.",
);
const LOSE_EFFECT_PATTERN: &str = concat!(
    r"1E:(?:([0-9A-F]*):)?([a-zA-Z0-9` ']*) loses the effect of ([a-zA-Z0-9` ']*)",
    r" from ([a-zA-Z0-9` ']*)\.",
);

const DEFEATED_PHRASE: &[u8] = b" was defeated";

/// Process-wide parser backing [`parse_line`].
pub static DEFAULT_PARSER: LazyLock<LogLineParser> = LazyLock::new(LogLineParser::new);

/// Parse one line with the shared default tables.
pub fn parse_line(raw: &str) -> Option<ParsedLogEvent> {
    DEFAULT_PARSER.parse(raw)
}

/// Parse many lines in parallel with the shared default tables.
pub fn parse_batch<S: AsRef<str> + Sync>(lines: &[S]) -> Vec<Option<ParsedLogEvent>> {
    DEFAULT_PARSER.parse_batch(lines)
}

/// Compiled line-matching tables. Immutable once built; share by reference.
#[derive(Debug, Clone)]
pub struct LogLineParser {
    gain_effect: Regex,
    lose_effect: Regex,
    defeated: memmem::Finder<'static>,
}

impl Default for LogLineParser {
    fn default() -> Self {
        Self::new()
    }
}

impl LogLineParser {
    pub fn new() -> Self {
        Self {
            gain_effect: Regex::new(GAIN_EFFECT_PATTERN).expect("gain effect pattern is valid"),
            lose_effect: Regex::new(LOSE_EFFECT_PATTERN).expect("lose effect pattern is valid"),
            defeated: memmem::Finder::new(DEFEATED_PHRASE),
        }
    }

    /// Turn one raw combat-log line into a structured event.
    ///
    /// Returns `None` for empty input and for death / effect lines that don't
    /// match their sentence template.
    pub fn parse(&self, raw: &str) -> Option<ParsedLogEvent> {
        if raw.is_empty() {
            tracing::debug!("Empty log line");
            return None;
        }

        let body = &raw[char_offset(raw, HEADER_LEN)..];
        let fields: Vec<&str> = body.split(':').collect();
        let type_code = fields
            .get(FIELD_TYPE)
            .and_then(|f| parse_hex_prefix(f))
            .and_then(|v| u32::try_from(v).ok());

        match type_code {
            Some(MESSAGE_TYPE_SINGLE_TARGET) => {
                Some(self.parse_action(EventKind::SingleTarget, type_code, raw, fields))
            }
            Some(MESSAGE_TYPE_AOE) => {
                Some(self.parse_action(EventKind::Aoe, type_code, raw, fields))
            }
            Some(MESSAGE_TYPE_DEATH) => self.parse_death(type_code, raw, &fields),
            Some(MESSAGE_TYPE_GAIN_EFFECT) => self.parse_gain_effect(type_code, raw),
            Some(MESSAGE_TYPE_LOSE_EFFECT) => self.parse_lose_effect(type_code, raw),
            _ => Some(ParsedLogEvent::new(EventKind::Unrecognized, type_code, raw)),
        }
    }

    /// Parse many lines on the rayon pool. Output order matches input order.
    pub fn parse_batch<S: AsRef<str> + Sync>(&self, lines: &[S]) -> Vec<Option<ParsedLogEvent>> {
        lines.par_iter().map(|line| self.parse(line.as_ref())).collect()
    }

    fn parse_action(
        &self,
        kind: EventKind,
        type_code: Option<u32>,
        raw: &str,
        mut fields: Vec<&str>,
    ) -> ParsedLogEvent {
        let shifted = fields
            .get(FIELD_FLAGS)
            .is_some_and(|f| SHIFT_FLAG_VALUES.contains(f));
        if shifted {
            // real flags and damage sit two fields later
            let flags = fields.get(FIELD_FLAGS + 2).copied().unwrap_or_default();
            let damage = fields.get(FIELD_DAMAGE + 2).copied().unwrap_or_default();
            fields[FIELD_FLAGS] = flags;
            if let Some(slot) = fields.get_mut(FIELD_DAMAGE) {
                *slot = damage;
            }
        }

        let text = |i: usize| fields.get(i).map(|s| s.to_string());
        let id = |i: usize| fields.get(i).and_then(|s| parse_id(s));
        let hp = |i: usize| fields.get(i).and_then(|s| s.parse::<u64>().ok());

        let mut event = ParsedLogEvent::new(kind, type_code, raw);
        event.source_id = id(FIELD_ATTACKER_ID);
        event.source_name = text(FIELD_ATTACKER_NAME);
        event.action_id = id(FIELD_ABILITY_ID);
        event.action_name = text(FIELD_ABILITY_NAME);
        event.target_id = id(FIELD_TARGET_ID);
        event.target_name = text(FIELD_TARGET_NAME);
        event.flags = fields.get(FIELD_FLAGS).map(|f| decode_flags(f)).unwrap_or_default();
        event.damage = fields.get(FIELD_DAMAGE).map(|f| damage_from_field(f)).unwrap_or(0);
        event.target_current_hp = hp(FIELD_TARGET_CURRENT_HP);
        event.target_max_hp = hp(FIELD_TARGET_MAX_HP);
        event
    }

    fn parse_death(
        &self,
        type_code: Option<u32>,
        raw: &str,
        fields: &[&str],
    ) -> Option<ParsedLogEvent> {
        // header + "19:"
        let start = char_offset(raw, HEADER_LEN + 3);
        let end = self.defeated.find(raw.as_bytes())?;
        // An empty name (phrase right after the type) is no event, not a nameless death
        if end <= start {
            return None;
        }

        let mut event = ParsedLogEvent::new(EventKind::Death, type_code, raw);
        event.source_name = Some(raw[start..end].to_string());
        if let Some(flags) = fields.get(FIELD_FLAGS) {
            event.flags = decode_flags(flags);
        }
        Some(event)
    }

    fn parse_gain_effect(&self, type_code: Option<u32>, raw: &str) -> Option<ParsedLogEvent> {
        let caps = self.gain_effect.captures(raw)?;
        let mut event = effect_event(EventKind::GainEffect, type_code, raw, &caps);
        event.flags.gain_effect = true;
        event.effect_duration_secs = caps.get(5).and_then(|m| m.as_str().parse().ok());
        Some(event)
    }

    fn parse_lose_effect(&self, type_code: Option<u32>, raw: &str) -> Option<ParsedLogEvent> {
        let caps = self.lose_effect.captures(raw)?;
        let mut event = effect_event(EventKind::LoseEffect, type_code, raw, &caps);
        event.flags.lose_effect = true;
        Some(event)
    }
}

/// `X gains/loses the effect of Y from Z`: X is the target, Z the source.
fn effect_event(
    kind: EventKind,
    type_code: Option<u32>,
    raw: &str,
    caps: &regex::Captures<'_>,
) -> ParsedLogEvent {
    let text = |i: usize| caps.get(i).map(|m| m.as_str().to_string());

    let mut event = ParsedLogEvent::new(kind, type_code, raw);
    // `1A::X gains ...` carries an empty id
    event.target_id = caps
        .get(1)
        .filter(|m| !m.as_str().is_empty())
        .and_then(|m| parse_id(m.as_str()));
    event.target_name = text(2);
    event.action_name = text(3);
    event.source_name = text(4);
    event
}

/// Byte offset of the `n`th character, clamped to the end of `s`.
fn char_offset(s: &str, n: usize) -> usize {
    s.char_indices().nth(n).map_or(s.len(), |(i, _)| i)
}

#[cfg(test)]
mod tests {
    use super::*;

    const HEADER: &str = "[21:10:04.512] ";

    fn line(body: &str) -> String {
        format!("{HEADER}{body}")
    }

    #[test]
    fn test_single_target_fields() {
        let raw = line(
            "15:10400001:Tia Tea:07:Fast Blade:4000ABCD:Striking Dummy:10003:0A4001:\
             0:0:0:0:0:0:0:0:0:0:0:0:0:0:7500:10000:0",
        );
        let event = parse_line(&raw).unwrap();

        assert_eq!(event.kind, EventKind::SingleTarget);
        assert_eq!(event.type_code, Some(0x15));
        assert_eq!(event.source_id, Some(0x1040_0001));
        assert_eq!(event.source_name.as_deref(), Some("Tia Tea"));
        assert_eq!(event.action_id, Some(0x07));
        assert_eq!(event.action_name.as_deref(), Some("Fast Blade"));
        assert_eq!(event.target_id, Some(0x4000_ABCD));
        assert_eq!(event.target_name.as_deref(), Some("Striking Dummy"));
        assert!(event.flags.damage);
        assert_eq!(event.damage, 65545);
        assert_eq!(event.target_current_hp, Some(7500));
        assert_eq!(event.target_max_hp, Some(10000));
        assert_eq!(event.raw, raw);
    }

    #[test]
    fn test_shift_sentinel_rereads_flags_and_damage() {
        // field 7 is a sentinel; real flags "13" and damage "270000" follow two fields on
        let raw = line("16:10400001:Tia Tea:8D2:Holy:4000ABCD:Ifrit:3E:0:13:270000");
        let event = parse_line(&raw).unwrap();

        assert_eq!(event.kind, EventKind::Aoe);
        assert!(event.flags.damage && !event.flags.crit);
        assert_eq!(event.damage, 0x27);
    }

    #[test]
    fn test_unshifted_damage_and_flags() {
        let raw = line("15:10400001:Tia Tea:07:Fast Blade:4000ABCD:Striking Dummy:113:0A4001");
        let event = parse_line(&raw).unwrap();
        // "113" is also a sentinel; with no fields 9/10 the lookups come back empty
        assert!(event.flags.is_empty());
        assert_eq!(event.damage, 0);

        let raw = line("15:10400001:Tia Tea:07:Fast Blade:4000ABCD:Striking Dummy:10003:0A4001");
        let event = parse_line(&raw).unwrap();
        assert!(event.flags.damage && !event.flags.crit);
        assert_eq!(event.damage, 65545);
    }

    #[test]
    fn test_oversized_damage_field_does_not_panic() {
        let raw = line("15:10400001:Tia Tea:07:Fast Blade:4000ABCD:Dummy:3:80000000000000004001");
        let event = parse_line(&raw).unwrap();
        assert!(event.flags.damage);
        assert_eq!(event.damage, 0);
    }

    #[test]
    fn test_dodge_line() {
        let raw = line("15:10400001:Tia Tea:07:Fast Blade:4000ABCD:Striking Dummy:31:0");
        let event = parse_line(&raw).unwrap();
        assert!(event.flags.dodge);
        assert_eq!(event.damage, 0);
    }

    #[test]
    fn test_death_line() {
        let event =
            parse_line("[hh:mm:ss.mmm] 19:Goblin was defeated by the Warrior of Light.").unwrap();
        assert_eq!(event.kind, EventKind::Death);
        assert_eq!(event.type_code, Some(0x19));
        assert_eq!(event.source_name.as_deref(), Some("Goblin"));
    }

    #[test]
    fn test_death_without_phrase_is_none() {
        assert!(parse_line(&line("19:Goblin fled.")).is_none());
        // phrase right at the name offset
        assert!(parse_line(&line("19: was defeated by Tia Tea.")).is_none());
    }

    #[test]
    fn test_gain_effect() {
        let raw = line(
            "1A:4000ABCD:Striking Dummy gains the effect of Dia from Tia Tea for 30.00 Seconds.",
        );
        let event = parse_line(&raw).unwrap();

        assert_eq!(event.kind, EventKind::GainEffect);
        assert_eq!(event.target_id, Some(0x4000_ABCD));
        assert_eq!(event.target_name.as_deref(), Some("Striking Dummy"));
        assert_eq!(event.action_name.as_deref(), Some("Dia"));
        assert_eq!(event.source_name.as_deref(), Some("Tia Tea"));
        assert_eq!(event.effect_duration_secs, Some(30));
        assert!(event.flags.gain_effect && !event.flags.lose_effect);
    }

    #[test]
    fn test_gain_effect_without_target_id() {
        let raw = line("1A:Tia Tea gains the effect of Swiftcast from Tia Tea for 10.00 Seconds.");
        let event = parse_line(&raw).unwrap();
        assert_eq!(event.target_id, None);
        assert_eq!(event.target_name.as_deref(), Some("Tia Tea"));
        assert_eq!(event.effect_duration_secs, Some(10));
    }

    #[test]
    fn test_effects_with_empty_target_id() {
        let raw =
            line("1A::Striking Dummy gains the effect of Dia from Tia Tea for 30.00 Seconds.");
        let event = parse_line(&raw).unwrap();
        assert_eq!(event.kind, EventKind::GainEffect);
        assert_eq!(event.target_id, None);
        assert_eq!(event.target_name.as_deref(), Some("Striking Dummy"));
        assert_eq!(event.effect_duration_secs, Some(30));

        let raw = line("1E::Striking Dummy loses the effect of Dia from Tia Tea.");
        let event = parse_line(&raw).unwrap();
        assert_eq!(event.kind, EventKind::LoseEffect);
        assert_eq!(event.target_id, None);
        assert_eq!(event.target_name.as_deref(), Some("Striking Dummy"));
        assert_eq!(event.source_name.as_deref(), Some("Tia Tea"));
    }

    #[test]
    fn test_lose_effect() {
        let raw = line("1E:4000ABCD:Striking Dummy loses the effect of Dia from Tia Tea.");
        let event = parse_line(&raw).unwrap();

        assert_eq!(event.kind, EventKind::LoseEffect);
        assert_eq!(event.action_name.as_deref(), Some("Dia"));
        assert_eq!(event.source_name.as_deref(), Some("Tia Tea"));
        assert_eq!(event.effect_duration_secs, None);
        assert!(event.flags.lose_effect);
    }

    #[test]
    fn test_effect_template_mismatch_is_none() {
        assert!(parse_line(&line("1A:4000ABCD:Striking Dummy is now stunned.")).is_none());
        assert!(parse_line(&line("1E:4000ABCD:Striking Dummy recovers.")).is_none());
    }

    #[test]
    fn test_unrecognized_keeps_raw_and_type() {
        let raw = line("0C:Welcome to Eorzea.");
        let event = parse_line(&raw).unwrap();
        assert_eq!(event.kind, EventKind::Unrecognized);
        assert_eq!(event.type_code, Some(0x0C));
        assert_eq!(event.source_name, None);
        assert!(event.flags.is_empty());

        let event = parse_line(&line("zz:nonsense")).unwrap();
        assert_eq!(event.type_code, None);
        assert_eq!(event.kind, EventKind::Unrecognized);
    }

    #[test]
    fn test_short_and_empty_lines() {
        assert!(parse_line("").is_none());
        let event = parse_line("[00:00").unwrap();
        assert_eq!(event.kind, EventKind::Unrecognized);
    }

    #[test]
    fn test_multibyte_header_does_not_panic() {
        let event = parse_line("[ääääääääääääää19:Goblin was defeated").unwrap();
        assert_eq!(event.source_name.as_deref(), Some("Goblin"));
    }

    #[test]
    fn test_parse_is_idempotent() {
        let lines = [
            line("15:10400001:Tia Tea:07:Fast Blade:4000ABCD:Striking Dummy:10003:0A4001"),
            line("19:Goblin was defeated by Tia Tea."),
            line("1A:4000ABCD:Dummy gains the effect of Dia from Tia Tea for 3.00 Seconds."),
            line("0C:Welcome to Eorzea."),
        ];
        for raw in &lines {
            assert_eq!(parse_line(raw), parse_line(raw));
        }
    }

    #[test]
    fn test_parse_batch_preserves_order() {
        let parser = LogLineParser::new();
        let lines: Vec<String> = (0..64)
            .map(|i| {
                line(&format!(
                    "15:10400001:Tia Tea:07:Fast Blade:4000ABCD:Dummy {i}:10003:0A4001"
                ))
            })
            .collect();

        let parsed = parser.parse_batch(&lines);
        assert_eq!(parsed.len(), 64);
        for (i, event) in parsed.iter().enumerate() {
            let name = format!("Dummy {i}");
            assert_eq!(event.as_ref().unwrap().target_name.as_deref(), Some(name.as_str()));
        }
    }
}
