//! Decode worker threads for parallel mode.
//!
//! Each worker owns a private inbox and handles its messages strictly in
//! arrival order. Workers share nothing mutable; every record goes out on the
//! pipeline's single output channel.

use std::io;
use std::sync::mpsc;
use std::thread;

use tokio::sync::mpsc::UnboundedSender;

use super::message::{DecodeOptions, EventSink, MessageError, PipelineEvent, RawMessage};
use crate::stream::{StopSignal, decompress, pump};

pub(crate) enum WorkerRequest {
    Decode(RawMessage),
    /// Exit once everything queued ahead of this is done.
    Shutdown,
}

pub(crate) struct DecodeWorker {
    index: usize,
    inbox: mpsc::Sender<WorkerRequest>,
    handle: Option<thread::JoinHandle<()>>,
}

impl DecodeWorker {
    pub fn spawn(
        index: usize,
        options: DecodeOptions,
        tx: UnboundedSender<PipelineEvent>,
        stop: StopSignal,
    ) -> io::Result<Self> {
        let (inbox, requests) = mpsc::channel();
        let handle = thread::Builder::new()
            .name(format!("liveparse-decode-{index}"))
            .spawn(move || worker_loop(index, &requests, &options, &tx, &stop))?;

        Ok(Self {
            index,
            inbox,
            handle: Some(handle),
        })
    }

    /// Queue a message. False if the worker thread has already exited.
    pub fn send(&self, message: RawMessage) -> bool {
        self.inbox.send(WorkerRequest::Decode(message)).is_ok()
    }

    pub fn request_shutdown(&self) {
        let _ = self.inbox.send(WorkerRequest::Shutdown);
    }

    pub fn join(&mut self) {
        let Some(handle) = self.handle.take() else {
            return;
        };
        if handle.join().is_err() {
            tracing::error!(worker = self.index, "Decode worker panicked");
        }
    }
}

fn worker_loop(
    index: usize,
    requests: &mpsc::Receiver<WorkerRequest>,
    options: &DecodeOptions,
    tx: &UnboundedSender<PipelineEvent>,
    stop: &StopSignal,
) {
    tracing::debug!(worker = index, "Decode worker started");

    for request in requests {
        let message = match request {
            WorkerRequest::Decode(message) => message,
            WorkerRequest::Shutdown => break,
        };
        if stop.is_stopped() {
            tracing::debug!(worker = index, seq = message.seq, "Stopped; dropping queued messages");
            break;
        }
        decode_message(Some(index), message, options, tx);
    }

    tracing::debug!(worker = index, "Decode worker exiting");
}

/// Inflate and decode one message to completion on the current thread.
pub(crate) fn decode_message(
    worker: Option<usize>,
    message: RawMessage,
    options: &DecodeOptions,
    tx: &UnboundedSender<PipelineEvent>,
) {
    let RawMessage { seq, payload } = message;
    let report_progress = options.report_progress(payload.len());
    let mut sink = EventSink::new(seq, worker, options, tx);

    let result = decompress(&payload)
        .map_err(MessageError::from)
        .and_then(|buffer| {
            pump(buffer, options.slice_len, report_progress, &mut sink)
                .map_err(MessageError::from)
        });
    sink.finish(result);
}
