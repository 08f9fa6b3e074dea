use liveparse_types::DEFAULT_MISMATCH_WARN_THRESHOLD;

use super::message::PipelineEvent;

/// Reported once per run of unknown-kind failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProtocolWarning {
    pub consecutive_failures: u32,
    /// Sequence number of the message that crossed the threshold.
    pub seq: u64,
}

/// Watches terminal pipeline events for a producer speaking a newer protocol.
///
/// A run of messages that all fail with an unknown record kind almost always
/// means a version mismatch rather than corruption. Any successfully decoded
/// message ends the run.
#[derive(Debug, Clone)]
pub struct ProtocolMismatchMonitor {
    threshold: u32,
    consecutive: u32,
    warned: bool,
}

impl Default for ProtocolMismatchMonitor {
    fn default() -> Self {
        Self::new(DEFAULT_MISMATCH_WARN_THRESHOLD)
    }
}

impl ProtocolMismatchMonitor {
    pub fn new(threshold: u32) -> Self {
        Self {
            threshold: threshold.max(1),
            consecutive: 0,
            warned: false,
        }
    }

    pub fn consecutive_failures(&self) -> u32 {
        self.consecutive
    }

    /// Feed any pipeline event. Returns a warning the first time the run of
    /// unknown-kind failures reaches the threshold.
    pub fn observe(&mut self, event: &PipelineEvent) -> Option<ProtocolWarning> {
        match event {
            PipelineEvent::Ready { .. } => {
                self.consecutive = 0;
                self.warned = false;
                None
            }
            PipelineEvent::Failed { seq, error, .. } if error.is_unknown_kind() => {
                self.consecutive += 1;
                if self.warned || self.consecutive < self.threshold {
                    return None;
                }
                self.warned = true;
                tracing::warn!(
                    consecutive_failures = self.consecutive,
                    seq,
                    "Repeated unknown record kinds; producer may be using a newer protocol"
                );
                Some(ProtocolWarning {
                    consecutive_failures: self.consecutive,
                    seq: *seq,
                })
            }
            _ => None,
        }
    }
}
