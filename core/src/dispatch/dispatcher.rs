//! Message dispatcher: one per transport connection.
//!
//! # Lifecycle
//!
//! 1. `Dispatcher::new(config)` spawns the worker pool (parallel mode) and
//!    returns the receiving end of the pipeline's event channel.
//! 2. `submit()` each inbound payload in arrival order.
//! 3. `finish()` to drain queued work, or `stop()` / `shutdown()` to abandon it.

use std::io;

use liveparse_types::{DecodeMode, PipelineConfig};
use thiserror::Error;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};

use super::message::{DecodeOptions, EventSink, MessageError, PipelineEvent, RawMessage};
use super::router::worker_index;
use super::worker::DecodeWorker;
use crate::stream::{StopSignal, decompress, pump_cooperative};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum DispatchError {
    #[error("pipeline stopped")]
    Stopped,
    #[error("decode worker {worker} is no longer running")]
    WorkerGone { worker: usize },
}

pub struct Dispatcher {
    mode: DecodeMode,
    options: DecodeOptions,
    next_seq: u64,
    workers: Vec<DecodeWorker>,
    tx: UnboundedSender<PipelineEvent>,
    stop: StopSignal,
}

impl Dispatcher {
    pub fn new(config: &PipelineConfig) -> io::Result<(Self, UnboundedReceiver<PipelineEvent>)> {
        let (tx, rx) = mpsc::unbounded_channel();
        let stop = StopSignal::new();
        let options = DecodeOptions {
            slice_len: config.slice_len(),
            progress_min_bytes: config.progress_min_bytes,
            encounter_uid: config.encounter_uid.clone(),
        };

        let mut workers = Vec::new();
        if config.mode == DecodeMode::Parallel {
            let pool_size = config.pool_size();
            workers.reserve(pool_size);
            for index in 0..pool_size {
                let worker = DecodeWorker::spawn(index, options.clone(), tx.clone(), stop.clone())?;
                workers.push(worker);
            }
            tracing::info!(workers = pool_size, "Started decode workers");
        }

        let dispatcher = Self {
            mode: config.mode,
            options,
            next_seq: 0,
            workers,
            tx,
            stop,
        };
        Ok((dispatcher, rx))
    }

    pub fn is_stopped(&self) -> bool {
        self.stop.is_stopped()
    }

    /// Accept one inbound payload and return its sequence number.
    ///
    /// Inline mode decodes it on this task before returning, yielding to the
    /// scheduler between slices. Parallel mode queues it on worker
    /// `seq % pool_size` and returns immediately.
    pub async fn submit(&mut self, payload: Vec<u8>) -> Result<u64, DispatchError> {
        if self.stop.is_stopped() {
            return Err(DispatchError::Stopped);
        }

        let seq = self.next_seq;
        self.next_seq += 1;
        let message = RawMessage { seq, payload };

        match self.mode {
            DecodeMode::Inline => {
                self.decode_inline(message).await;
            }
            DecodeMode::Parallel => {
                let worker = worker_index(seq, self.workers.len());
                tracing::trace!(seq, worker, "Dispatching message");
                if !self.workers[worker].send(message) {
                    return Err(DispatchError::WorkerGone { worker });
                }
            }
        }
        Ok(seq)
    }

    async fn decode_inline(&self, message: RawMessage) {
        let RawMessage { seq, payload } = message;
        let report_progress = self.options.report_progress(payload.len());
        let mut sink = EventSink::new(seq, None, &self.options, &self.tx);

        let result = match decompress(&payload) {
            Ok(buffer) => {
                let slice_len = self.options.slice_len;
                pump_cooperative(buffer, slice_len, report_progress, &mut sink, &self.stop)
                    .await
                    .map_err(MessageError::from)
            }
            Err(e) => Err(MessageError::from(e)),
        };
        sink.finish(result);
    }

    /// Stop accepting and decoding messages.
    ///
    /// In-flight messages finish their current slice (inline) or the whole
    /// message (workers); anything still queued is dropped. Single-shot.
    pub fn stop(&self) {
        if !self.stop.stop() {
            return;
        }
        tracing::debug!("Stopping decode pipeline");
        for worker in &self.workers {
            worker.request_shutdown();
        }
    }

    /// Let every queued message finish, then join the workers.
    pub fn finish(&mut self) {
        for worker in &self.workers {
            worker.request_shutdown();
        }
        self.join_workers();
    }

    /// Stop and join the workers.
    pub fn shutdown(&mut self) {
        self.stop();
        self.join_workers();
    }

    fn join_workers(&mut self) {
        for worker in &mut self.workers {
            worker.join();
        }
    }
}

impl Drop for Dispatcher {
    fn drop(&mut self) {
        self.shutdown();
    }
}
