//! Build progress events (spec §4.10/§9): each phase reports
//! `(op_code, current, max, message)` to a `BuildMonitor`, which keeps the
//! run's event log and forwards each event to an optional external
//! callback — the seam a task-queue progress hook would attach to (spec
//! §5's push-channel streaming, out of scope here per §6.3 Non-goals).

use std::sync::Mutex;

#[derive(Debug, Clone, PartialEq)]
pub struct MonitorEvent {
    pub op_code: &'static str,
    pub current: u32,
    pub max: u32,
    pub message: String,
}

/// Collects the events of a single build run. `callback` is invoked
/// synchronously as each event is published, before it's appended to the
/// log, so a slow external sink can't reorder the log relative to what it
/// saw.
pub struct BuildMonitor {
    events: Mutex<Vec<MonitorEvent>>,
    callback: Option<Box<dyn Fn(&MonitorEvent) + Send + Sync>>,
}

impl BuildMonitor {
    pub fn new() -> Self {
        BuildMonitor { events: Mutex::new(Vec::new()), callback: None }
    }

    pub fn with_callback(callback: impl Fn(&MonitorEvent) + Send + Sync + 'static) -> Self {
        BuildMonitor { events: Mutex::new(Vec::new()), callback: Some(Box::new(callback)) }
    }

    pub fn publish(&self, op_code: &'static str, current: u32, max: u32, message: impl Into<String>) {
        let event = MonitorEvent { op_code, current, max, message: message.into() };
        if let Some(cb) = &self.callback {
            cb(&event);
        }
        self.events.lock().expect("monitor event log poisoned").push(event);
    }

    pub fn events(&self) -> Vec<MonitorEvent> {
        self.events.lock().expect("monitor event log poisoned").clone()
    }
}

impl Default for BuildMonitor {
    fn default() -> Self {
        BuildMonitor::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    #[test]
    fn events_accumulate_in_publish_order() {
        let monitor = BuildMonitor::new();
        monitor.publish("checkout", 1, 7, "checking out");
        monitor.publish("read", 3, 7, "reading modules");
        let events = monitor.events();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].op_code, "checkout");
        assert_eq!(events[1].current, 3);
    }

    #[test]
    fn callback_fires_once_per_publish() {
        let count = Arc::new(AtomicU32::new(0));
        let count2 = count.clone();
        let monitor = BuildMonitor::with_callback(move |_event| {
            count2.fetch_add(1, Ordering::SeqCst);
        });
        monitor.publish("checkout", 1, 1, "done");
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }
}
