use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use tokio_util::sync::CancellationToken;

/// Bookkeeping for at-most-one pending request per dedupe key, process-wide.
///
/// Last write wins: registering a new flight for a key cancels whatever was
/// pending under that key. A flight's registry entry is removed when it
/// settles, but only while the entry still points at that flight, so a newer
/// registration is never cleaned up by an older request settling late.
#[derive(Default)]
pub struct InFlightRegistry {
    flights: Mutex<HashMap<String, Arc<Flight>>>,
}

#[derive(Debug)]
struct Flight {
    cancel: CancellationToken,
}

impl InFlightRegistry {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Register a new flight for `key`, cancelling any older one still pending.
    pub fn begin(self: &Arc<Self>, key: &str) -> FlightTicket {
        let flight = Arc::new(Flight {
            cancel: CancellationToken::new(),
        });
        let previous = {
            let mut map = self.flights.lock().expect("inflight map lock poisoned");
            map.insert(key.to_string(), Arc::clone(&flight))
        };
        if let Some(old) = previous {
            old.cancel.cancel();
        }
        FlightTicket {
            registry: Arc::clone(self),
            key: key.to_string(),
            flight,
        }
    }

    /// Cancel the pending flight for `key`, if any, without replacing it.
    pub fn cancel(&self, key: &str) {
        let flight = {
            let map = self.flights.lock().expect("inflight map lock poisoned");
            map.get(key).cloned()
        };
        if let Some(flight) = flight {
            flight.cancel.cancel();
        }
    }

    /// Whether a flight is currently registered for `key`.
    pub fn pending(&self, key: &str) -> bool {
        self.flights
            .lock()
            .expect("inflight map lock poisoned")
            .contains_key(key)
    }

    fn finish(&self, key: &str, flight: &Arc<Flight>) {
        let mut map = self.flights.lock().expect("inflight map lock poisoned");
        if let Some(current) = map.get(key) {
            if Arc::ptr_eq(current, flight) {
                map.remove(key);
            }
        }
    }
}

/// Handle to one registered flight. Dropping it settles the registry entry,
/// unless a newer flight already replaced it.
pub struct FlightTicket {
    registry: Arc<InFlightRegistry>,
    key: String,
    flight: Arc<Flight>,
}

impl FlightTicket {
    pub fn key(&self) -> &str {
        &self.key
    }

    /// True once a newer flight for the same key (or an explicit cancel)
    /// superseded this one.
    pub fn is_cancelled(&self) -> bool {
        self.flight.cancel.is_cancelled()
    }

    /// Resolves when this flight is superseded or cancelled.
    pub async fn cancelled(&self) {
        self.flight.cancel.cancelled().await;
    }
}

impl Drop for FlightTicket {
    fn drop(&mut self) {
        self.registry.finish(&self.key, &self.flight);
    }
}
