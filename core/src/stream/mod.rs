//! Message-level decoding: inflate, then pump records out of the buffer.

mod decompress;
mod pump;
mod stop;

pub use decompress::{Container, decompress, detect_container};
pub use pump::{
    PumpError, PumpSink, PumpState, PumpSummary, SliceOutcome, pump, pump_cooperative,
};
pub use stop::StopSignal;
