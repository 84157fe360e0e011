//! Progress reporting port.

use std::sync::{Arc, Mutex};

use chunlian_types::workflow::ProgressEvent;

/// Receives every stage transition of a run, in order.
///
/// Listeners are called synchronously on the run's task; keep them cheap.
pub trait ProgressListener: Send + Sync {
    fn on_event(&self, event: &ProgressEvent);
}

impl<F> ProgressListener for F
where
    F: Fn(&ProgressEvent) + Send + Sync,
{
    fn on_event(&self, event: &ProgressEvent) {
        self(event)
    }
}

/// No-op listener for when progress reporting is not needed.
pub struct NoProgress;

impl ProgressListener for NoProgress {
    fn on_event(&self, _event: &ProgressEvent) {}
}

/// Keeps every event; handy for inspecting a run after the fact.
#[derive(Debug, Default, Clone)]
pub struct ProgressRecorder {
    events: Arc<Mutex<Vec<ProgressEvent>>>,
}

impl ProgressRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<ProgressEvent> {
        self.events
            .lock()
            .map(|events| events.clone())
            .unwrap_or_default()
    }
}

impl ProgressListener for ProgressRecorder {
    fn on_event(&self, event: &ProgressEvent) {
        if let Ok(mut events) = self.events.lock() {
            events.push(event.clone());
        }
    }
}
