use std::sync::Mutex;

use uuid::Uuid;

use nido_core::errors::{NidoResult, StorageError};
use nido_core::traits::IRecomputeDispatch;

/// Dispatcher that records every triggered record id.
#[derive(Default)]
pub struct RecordingDispatch {
    dispatched: Mutex<Vec<Uuid>>,
    fail_all: Mutex<bool>,
}

impl RecordingDispatch {
    pub fn new() -> Self {
        Self::default()
    }

    /// All record ids dispatched so far, in order.
    pub fn dispatched(&self) -> Vec<Uuid> {
        self.dispatched.lock().unwrap().clone()
    }

    /// Make every subsequent dispatch fail (dispatch failures must be
    /// logged, never retried inline).
    pub fn fail_all(&self) {
        *self.fail_all.lock().unwrap() = true;
    }
}

impl IRecomputeDispatch for RecordingDispatch {
    fn dispatch(&self, record_id: Uuid) -> NidoResult<()> {
        if *self.fail_all.lock().unwrap() {
            return Err(StorageError::Unavailable("dispatch transport down".to_string()).into());
        }
        self.dispatched.lock().unwrap().push(record_id);
        Ok(())
    }
}
