use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// Single-shot stop signal shared by one pipeline instance.
///
/// Once set it stays set. Checked at yield boundaries and before dispatch,
/// never mid-record.
#[derive(Debug, Clone, Default)]
pub struct StopSignal(Arc<AtomicBool>);

impl StopSignal {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns true if this call was the one that stopped the pipeline.
    pub fn stop(&self) -> bool {
        !self.0.swap(true, Ordering::AcqRel)
    }

    pub fn is_stopped(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stop_is_single_shot_and_shared() {
        let signal = StopSignal::new();
        let clone = signal.clone();
        assert!(!clone.is_stopped());

        assert!(signal.stop());
        assert!(!signal.stop());
        assert!(clone.is_stopped());
    }
}
