//! Drive the frame decoder over a whole decompressed buffer.
//!
//! The loop is an explicit resumable state, [`PumpState`], holding the buffer,
//! the running offset and the number of records emitted. Each call to
//! [`PumpState::run_slice`] decodes at most N records. Drivers decide what
//! happens between slices:
//!
//! - [`pump_cooperative`] yields to the tokio scheduler so a multi-megabyte
//!   backlog doesn't monopolise the task's thread.
//! - [`pump`] runs slices back to back, for dedicated worker threads.

use thiserror::Error;

use super::stop::StopSignal;
use crate::wire::{DecodeError, Record, decode_one};

/// Receives decoded records, in buffer order.
pub trait PumpSink {
    fn record(&mut self, record: Record);

    /// Called at each yield boundary with `offset / buffer.len()`.
    fn progress(&mut self, _fraction: f64) {}
}

impl<F: FnMut(Record)> PumpSink for F {
    fn record(&mut self, record: Record) {
        self(record)
    }
}

/// Decoding stopped on a record the rest of the buffer can't be read past.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{error} (after {records_emitted} records)")]
pub struct PumpError {
    pub error: DecodeError,
    pub records_emitted: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PumpSummary {
    pub records: usize,
    pub slices: usize,
    /// Bytes left over after the last complete record.
    pub trailing_bytes: usize,
    /// Stopped at a yield boundary before reaching the end.
    pub cancelled: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SliceOutcome {
    /// Slice budget used up with data remaining.
    Yielded,
    /// No more complete records.
    Finished,
    Failed(DecodeError),
}

/// Continuation state between slices.
#[derive(Debug, Clone)]
pub struct PumpState {
    buffer: Vec<u8>,
    offset: usize,
    count: usize,
}

impl PumpState {
    pub fn new(buffer: Vec<u8>) -> Self {
        Self {
            buffer,
            offset: 0,
            count: 0,
        }
    }

    pub fn offset(&self) -> usize {
        self.offset
    }

    pub fn count(&self) -> usize {
        self.count
    }

    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    /// Fraction of the buffer consumed so far.
    pub fn progress(&self) -> f64 {
        if self.buffer.is_empty() {
            1.0
        } else {
            self.offset as f64 / self.buffer.len() as f64
        }
    }

    /// Decode up to `max_records` records into `sink`, resuming at the saved offset.
    pub fn run_slice<S: PumpSink + ?Sized>(
        &mut self,
        max_records: usize,
        sink: &mut S,
    ) -> SliceOutcome {
        let max_records = max_records.max(1);
        for _ in 0..max_records {
            if self.offset >= self.buffer.len() {
                return SliceOutcome::Finished;
            }
            match decode_one(&self.buffer, self.offset) {
                Ok((record, consumed)) => {
                    sink.record(record);
                    self.offset += consumed;
                    self.count += 1;
                }
                Err(e) if e.is_truncated() => {
                    tracing::trace!(
                        offset = self.offset,
                        len = self.buffer.len(),
                        "Partial record at end of buffer"
                    );
                    return SliceOutcome::Finished;
                }
                Err(e) => return SliceOutcome::Failed(e),
            }
        }

        if self.offset >= self.buffer.len() {
            SliceOutcome::Finished
        } else {
            SliceOutcome::Yielded
        }
    }

    fn summary(&self, slices: usize, cancelled: bool) -> PumpSummary {
        PumpSummary {
            records: self.count,
            slices,
            trailing_bytes: self.buffer.len().saturating_sub(self.offset),
            cancelled,
        }
    }

    fn fail(&self, error: DecodeError) -> PumpError {
        PumpError {
            error,
            records_emitted: self.count,
        }
    }
}

/// Decode the whole buffer on the current thread, slice after slice.
///
/// Progress is still reported at slice boundaries when `report_progress` is set.
pub fn pump<S: PumpSink + ?Sized>(
    buffer: Vec<u8>,
    slice_len: usize,
    report_progress: bool,
    sink: &mut S,
) -> Result<PumpSummary, PumpError> {
    let mut state = PumpState::new(buffer);
    let mut slices = 0;
    loop {
        slices += 1;
        match state.run_slice(slice_len, sink) {
            SliceOutcome::Finished => return Ok(state.summary(slices, false)),
            SliceOutcome::Failed(e) => return Err(state.fail(e)),
            SliceOutcome::Yielded => {
                if report_progress {
                    sink.progress(state.progress());
                }
            }
        }
    }
}

/// Decode the whole buffer, yielding to the scheduler after every slice.
///
/// The stop signal is checked at each yield boundary; once set no further
/// continuation is scheduled and the summary comes back with `cancelled`.
pub async fn pump_cooperative<S: PumpSink + ?Sized>(
    buffer: Vec<u8>,
    slice_len: usize,
    report_progress: bool,
    sink: &mut S,
    stop: &StopSignal,
) -> Result<PumpSummary, PumpError> {
    let mut state = PumpState::new(buffer);
    let mut slices = 0;
    loop {
        slices += 1;
        match state.run_slice(slice_len, sink) {
            SliceOutcome::Finished => return Ok(state.summary(slices, false)),
            SliceOutcome::Failed(e) => return Err(state.fail(e)),
            SliceOutcome::Yielded => {
                if report_progress {
                    sink.progress(state.progress());
                }
                if stop.is_stopped() {
                    tracing::debug!(
                        offset = state.offset(),
                        records = state.count(),
                        "Pump stopped at yield boundary"
                    );
                    return Ok(state.summary(slices, true));
                }
                tokio::task::yield_now().await;
            }
        }
    }
}
