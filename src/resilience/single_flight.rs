use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, Mutex, PoisonError};

use tokio::sync::watch;
use tracing::debug;

type Flights<T> = Arc<Mutex<HashMap<String, watch::Receiver<Option<T>>>>>;

/// Collapses concurrent calls for the same key into one execution.
///
/// The first caller for a key runs the operation; callers arriving while it
/// is in flight wait for and receive a clone of its result.
#[derive(Debug)]
pub struct SingleFlight<T> {
    in_flight: Flights<T>,
}

impl<T> Clone for SingleFlight<T> {
    fn clone(&self) -> Self {
        Self { in_flight: self.in_flight.clone() }
    }
}

impl<T> Default for SingleFlight<T> {
    fn default() -> Self {
        Self { in_flight: Arc::new(Mutex::new(HashMap::new())) }
    }
}

// Removes the flight even if the leading future is dropped mid-way.
struct FlightGuard<'a, T> {
    in_flight: &'a Flights<T>,
    key: &'a str,
}

impl<T> Drop for FlightGuard<'_, T> {
    fn drop(&mut self) {
        self.in_flight
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(self.key);
    }
}

impl<T: Clone> SingleFlight<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run `operation` unless a call for `key` is already in flight, in which
    /// case wait for its result. If that call is cancelled, one waiter takes
    /// over as the new leader and the rest wait on it.
    pub async fn run<F, Fut>(&self, key: &str, operation: F) -> T
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = T>,
    {
        let tx = loop {
            let mut rx = {
                let mut flights = self.in_flight.lock().unwrap_or_else(PoisonError::into_inner);
                match flights.get(key) {
                    Some(rx) => rx.clone(),
                    None => {
                        let (tx, rx) = watch::channel(None);
                        flights.insert(key.to_owned(), rx);
                        break tx;
                    }
                }
            };

            debug!("joining in-flight call for '{}'", key);
            let shared = rx
                .wait_for(|value| value.is_some())
                .await
                .ok()
                .and_then(|value| (*value).clone());
            if let Some(result) = shared {
                return result;
            }
            // leader was cancelled before producing a result
            debug!("in-flight call for '{}' abandoned, rejoining", key);
        };

        // declared after `tx` so the key is released before waiters see the sender close
        let guard = FlightGuard { in_flight: &self.in_flight, key };
        let result = operation().await;
        drop(guard);
        let _ = tx.send(Some(result.clone()));
        result
    }

    /// Keys with a call currently in flight.
    pub fn in_flight(&self) -> usize {
        self.in_flight.lock().unwrap_or_else(PoisonError::into_inner).len()
    }
}
