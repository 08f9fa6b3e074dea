//! Combat-log text lines carried inside `LogLine` records.
//!
//! Parsing is pure and lazy: nothing here runs unless a consumer asks for
//! combat semantics.

mod event;
pub mod fields;
mod name_cache;
mod parser;

pub use event::{EventKind, LogLineFlags, ParsedLogEvent};
pub use fields::{damage_from_field, decode_flags};
pub use name_cache::NameCache;
pub use parser::{DEFAULT_PARSER, LogLineParser, parse_batch, parse_line};
