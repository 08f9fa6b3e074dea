pub mod combat_log;
pub mod config;
pub mod dispatch;
pub mod state;
pub mod stream;
pub mod wire;

// Re-exports for convenience
pub use combat_log::{LogLineParser, ParsedLogEvent, parse_line};
pub use dispatch::{Dispatcher, MessageError, PipelineEvent, ProtocolMismatchMonitor};
pub use liveparse_types::{DecodeMode, PipelineConfig};
pub use state::EncounterCache;
pub use stream::{StopSignal, decompress, pump, pump_cooperative};
pub use wire::{DecodeError, Record, decode_one};
