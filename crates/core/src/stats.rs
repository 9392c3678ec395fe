//! Process-wide usage statistics
//!
//! Every connector instance in the process feeds the same counter set:
//! instances created, transport handles created, requests dispatched and
//! total milliseconds spent in requests. A single mutex guards the set so
//! statistics summaries read a consistent snapshot while other connectors
//! keep mutating it. The counters are never reset.

use std::sync::Mutex;

/// Snapshot of the process-wide counters
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct GlobalStats {
    /// Connector instances created since process start
    pub connector_instances: u64,
    /// Transport handles created since process start
    pub transport_handles: u64,
    /// Requests dispatched across all connectors
    pub requests: u64,
    /// Total wall-clock milliseconds spent in requests
    pub total_request_ms: f64,
}

static GLOBAL: Mutex<GlobalStats> = Mutex::new(GlobalStats {
    connector_instances: 0,
    transport_handles: 0,
    requests: 0,
    total_request_ms: 0.0,
});

fn global() -> std::sync::MutexGuard<'static, GlobalStats> {
    // A poisoned counter lock only means a panic elsewhere mid-increment;
    // the counters are still usable.
    GLOBAL.lock().unwrap_or_else(|e| e.into_inner())
}

/// Register a new connector instance; returns its instance number (1-based)
pub fn register_connector() -> u64 {
    let mut g = global();
    g.connector_instances += 1;
    g.connector_instances
}

/// Register a new transport handle
pub fn register_transport_handle() {
    global().transport_handles += 1;
}

/// Count one dispatched request; returns the process-wide request number
pub fn record_request() -> u64 {
    let mut g = global();
    g.requests += 1;
    g.requests
}

/// Add elapsed request time to the process-wide accumulator
pub fn record_request_time(elapsed_ms: f64) {
    global().total_request_ms += elapsed_ms;
}

/// Consistent snapshot of the counters
pub fn snapshot() -> GlobalStats {
    *global()
}

#[cfg(test)]
mod tests {
    use super::*;

    // The counters are process-wide and other tests increment them
    // concurrently, so these assert on deltas observed by this thread.

    #[test]
    fn test_register_connector_numbers_increase() {
        let first = register_connector();
        let second = register_connector();
        assert!(second > first);
    }

    #[test]
    fn test_record_request_advances_counter_and_time() {
        let before = snapshot();
        let number = record_request();
        record_request_time(12.5);
        let after = snapshot();

        assert!(number > before.requests);
        assert!(after.requests >= before.requests + 1);
        assert!(after.total_request_ms >= before.total_request_ms + 12.5);
    }

    #[test]
    fn test_transport_handles_counted() {
        let before = snapshot().transport_handles;
        register_transport_handle();
        assert!(snapshot().transport_handles >= before + 1);
    }
}
