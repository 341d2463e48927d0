use crate::article::GenerationResult;
use crate::error::GenerationError;
use serde::Serialize;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

/// What the status page and API report about the current or last run.
#[derive(Debug, Clone, Default, Serialize)]
pub struct StatusSnapshot {
    pub in_progress: bool,
    pub current_topic: Option<String>,
    pub result: Option<GenerationResult>,
    pub error: Option<String>,
}

/// Process-wide slot admitting one generation at a time.
#[derive(Debug, Default)]
pub struct GenerationSlot {
    busy: AtomicBool,
    state: Mutex<StatusSnapshot>,
}

impl GenerationSlot {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Claims the slot for `topic`, clearing the previous run's outcome.
    pub fn try_begin(self: &Arc<Self>, topic: &str) -> Result<RunTicket, GenerationError> {
        if self
            .busy
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return Err(GenerationError::Busy);
        }

        *self.lock() = StatusSnapshot {
            in_progress: true,
            current_topic: Some(topic.to_string()),
            result: None,
            error: None,
        };

        Ok(RunTicket {
            slot: Arc::clone(self),
            finished: false,
        })
    }

    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::Acquire)
    }

    pub fn snapshot(&self) -> StatusSnapshot {
        self.lock().clone()
    }

    fn lock(&self) -> MutexGuard<'_, StatusSnapshot> {
        match self.state.lock() {
            Ok(guard) => guard,
            Err(poisoned) => {
                tracing::warn!("status lock was poisoned, recovering");
                poisoned.into_inner()
            }
        }
    }

    fn release(&self, outcome: Option<Result<GenerationResult, String>>) {
        {
            let mut state = self.lock();
            state.in_progress = false;
            match outcome {
                Some(Ok(result)) => state.result = Some(result),
                Some(Err(error)) => state.error = Some(error),
                None => state.error = Some("Generation was interrupted".to_string()),
            }
        }
        self.busy.store(false, Ordering::Release);
    }
}

/// Proof of holding the slot. Finishing or dropping it frees the slot.
#[derive(Debug)]
pub struct RunTicket {
    slot: Arc<GenerationSlot>,
    finished: bool,
}

impl RunTicket {
    pub fn finish(mut self, outcome: Result<GenerationResult, GenerationError>) {
        self.finished = true;
        self.slot.release(Some(outcome.map_err(|err| err.to_string())));
    }
}

impl Drop for RunTicket {
    fn drop(&mut self) {
        if !self.finished {
            self.slot.release(None);
        }
    }
}
