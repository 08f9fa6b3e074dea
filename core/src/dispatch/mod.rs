//! Inbound message dispatch: inline cooperative decoding or a round-robin
//! pool of decode workers, both reporting on one event channel.

mod dispatcher;
mod message;
mod monitor;
mod router;
mod worker;


pub use dispatcher::{DispatchError, Dispatcher};
pub use message::{MessageError, MessageSummary, PipelineEvent, RawMessage};
pub use monitor::{ProtocolMismatchMonitor, ProtocolWarning};
pub use router::worker_index;
