//! Test double for [`LifecycleObserver`] that records events for assertions.

use std::sync::Mutex;

use crate::lifecycle::{LifecycleObserver, RuntimeLifecycleEvent};

/// Records lifecycle events in arrival order.
#[derive(Debug, Default)]
pub struct RecordingObserver {
    events: Mutex<Vec<RuntimeLifecycleEvent>>,
}

impl RecordingObserver {
    /// Captures a copy of the recorded events.
    pub fn events(&self) -> Vec<RuntimeLifecycleEvent> {
        self.events
            .lock()
            .expect("observer mutex poisoned")
            .clone()
    }
}

impl LifecycleObserver for RecordingObserver {
    fn on_event(&self, event: &RuntimeLifecycleEvent) {
        self.events
            .lock()
            .expect("observer mutex poisoned")
            .push(event.clone());
    }
}
