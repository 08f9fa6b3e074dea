//! Binary wire format: readers, record types, decoder and encoder.

mod decoder;
mod encoder;
mod error;
pub mod reader;
mod record;

pub use decoder::decode_one;
pub use encoder::{compress, encode, encode_all};
pub use error::DecodeError;
pub use record::{
    CombatantKey, CombatantRecord, DATA_TYPE_COMBATANT, DATA_TYPE_ENCOUNTER, DATA_TYPE_FLAG,
    DATA_TYPE_LOG_LINE, EncounterRecord, EventTime, FlagRecord, LogLineRecord, Record, RecordKind,
};
