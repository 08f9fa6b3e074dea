use std::io;

use thiserror::Error;
use tokio::sync::mpsc::UnboundedSender;

use crate::stream::{PumpError, PumpSink, PumpSummary};
use crate::wire::Record;

/// One compressed payload as received from the transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawMessage {
    /// Submission order, assigned by the dispatcher starting at 0.
    pub seq: u64,
    pub payload: Vec<u8>,
}

/// Why one message produced no (or only some) records. Scoped to that message.
#[derive(Debug, Error)]
pub enum MessageError {
    #[error("failed to inflate message: {0}")]
    Decompress(#[from] io::Error),
    #[error("failed to decode message: {0}")]
    Decode(#[from] PumpError),
}

impl MessageError {
    pub fn is_unknown_kind(&self) -> bool {
        matches!(self, Self::Decode(e) if e.error.is_unknown_kind())
    }

    /// Records already emitted before the failure.
    pub fn records_emitted(&self) -> usize {
        match self {
            Self::Decompress(_) => 0,
            Self::Decode(e) => e.records_emitted,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MessageSummary {
    /// Records decoded from the buffer.
    pub records: usize,
    /// Records that passed the encounter filter and were emitted.
    pub forwarded: usize,
    pub trailing_bytes: usize,
    pub cancelled: bool,
}

/// Everything a pipeline reports, on one channel.
#[derive(Debug)]
pub enum PipelineEvent {
    Record {
        seq: u64,
        /// Pool index in parallel mode, `None` inline.
        worker: Option<usize>,
        record: Record,
    },
    /// Fraction of the decompressed buffer consumed, large messages only.
    Progress { seq: u64, fraction: f64 },
    Ready {
        seq: u64,
        worker: Option<usize>,
        summary: MessageSummary,
    },
    Failed {
        seq: u64,
        worker: Option<usize>,
        error: MessageError,
    },
}

impl PipelineEvent {
    pub fn seq(&self) -> u64 {
        match self {
            Self::Record { seq, .. }
            | Self::Progress { seq, .. }
            | Self::Ready { seq, .. }
            | Self::Failed { seq, .. } => *seq,
        }
    }

    /// Ready or Failed: nothing more will arrive for this message.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Ready { .. } | Self::Failed { .. })
    }
}

/// Per-message decode settings shared by inline and worker decoding.
#[derive(Debug, Clone)]
pub(crate) struct DecodeOptions {
    pub slice_len: usize,
    pub progress_min_bytes: usize,
    pub encounter_uid: Option<String>,
}

impl DecodeOptions {
    pub fn report_progress(&self, payload_len: usize) -> bool {
        payload_len > self.progress_min_bytes
    }
}

/// Pump sink that filters records and forwards them as pipeline events.
pub(crate) struct EventSink<'a> {
    seq: u64,
    worker: Option<usize>,
    encounter_uid: Option<&'a str>,
    tx: &'a UnboundedSender<PipelineEvent>,
    forwarded: usize,
}

impl<'a> EventSink<'a> {
    pub fn new(
        seq: u64,
        worker: Option<usize>,
        options: &'a DecodeOptions,
        tx: &'a UnboundedSender<PipelineEvent>,
    ) -> Self {
        Self {
            seq,
            worker,
            encounter_uid: options.encounter_uid.as_deref(),
            tx,
            forwarded: 0,
        }
    }

    /// Send the terminal event for this message.
    pub fn finish(self, result: Result<PumpSummary, MessageError>) {
        let event = match result {
            Ok(summary) => {
                tracing::debug!(
                    seq = self.seq,
                    worker = ?self.worker,
                    records = summary.records,
                    forwarded = self.forwarded,
                    cancelled = summary.cancelled,
                    "Message decoded"
                );
                PipelineEvent::Ready {
                    seq: self.seq,
                    worker: self.worker,
                    summary: MessageSummary {
                        records: summary.records,
                        forwarded: self.forwarded,
                        trailing_bytes: summary.trailing_bytes,
                        cancelled: summary.cancelled,
                    },
                }
            }
            Err(error) => {
                tracing::debug!(
                    seq = self.seq,
                    worker = ?self.worker,
                    error = %error,
                    "Message failed"
                );
                PipelineEvent::Failed {
                    seq: self.seq,
                    worker: self.worker,
                    error,
                }
            }
        };
        // Receiver gone means the consumer has stopped listening
        let _ = self.tx.send(event);
    }
}

impl PumpSink for EventSink<'_> {
    fn record(&mut self, record: Record) {
        if !record.matches_encounter(self.encounter_uid) {
            return;
        }
        self.forwarded += 1;
        let _ = self.tx.send(PipelineEvent::Record {
            seq: self.seq,
            worker: self.worker,
            record,
        });
    }

    fn progress(&mut self, fraction: f64) {
        let _ = self.tx.send(PipelineEvent::Progress {
            seq: self.seq,
            fraction,
        });
    }
}
