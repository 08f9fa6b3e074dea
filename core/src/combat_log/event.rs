use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    SingleTarget,
    Aoe,
    Death,
    GainEffect,
    LoseEffect,
    /// Any other message type. Only the raw text and type code are kept.
    Unrecognized,
}

/// Hit-result category of an action line.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct LogLineFlags {
    pub dodge: bool,
    pub damage: bool,
    pub crit: bool,
    pub direct_hit: bool,
    pub heal: bool,
    pub gain_effect: bool,
    pub lose_effect: bool,
}

impl LogLineFlags {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Set flags by their display names, in declaration order.
    pub fn names(&self) -> Vec<&'static str> {
        [
            (self.dodge, "dodge"),
            (self.damage, "damage"),
            (self.crit, "crit"),
            (self.direct_hit, "direct-hit"),
            (self.heal, "heal"),
            (self.gain_effect, "gain-effect"),
            (self.lose_effect, "lose-effect"),
        ]
        .into_iter()
        .filter_map(|(set, name)| set.then_some(name))
        .collect()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ParsedLogEvent {
    pub kind: EventKind,
    /// Hex message type from the first field. `None` if it didn't parse.
    pub type_code: Option<u32>,
    pub raw: String,

    pub source_id: Option<u32>,
    pub source_name: Option<String>,
    pub action_id: Option<u32>,
    pub action_name: Option<String>,
    pub target_id: Option<u32>,
    pub target_name: Option<String>,

    pub damage: i64,
    pub flags: LogLineFlags,
    pub target_current_hp: Option<u64>,
    pub target_max_hp: Option<u64>,
    /// Whole seconds, gain-effect lines only.
    pub effect_duration_secs: Option<u32>,
}

impl ParsedLogEvent {
    pub(crate) fn new(kind: EventKind, type_code: Option<u32>, raw: &str) -> Self {
        Self {
            kind,
            type_code,
            raw: raw.to_string(),
            source_id: None,
            source_name: None,
            action_id: None,
            action_name: None,
            target_id: None,
            target_name: None,
            damage: 0,
            flags: LogLineFlags::default(),
            target_current_hp: None,
            target_max_hp: None,
            effect_duration_secs: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flag_names_in_order() {
        let flags = LogLineFlags {
            crit: true,
            damage: true,
            direct_hit: true,
            ..Default::default()
        };
        assert_eq!(flags.names(), vec!["damage", "crit", "direct-hit"]);
        assert!(LogLineFlags::default().names().is_empty());
    }
}
