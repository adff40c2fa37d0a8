//! Host limiter: shared in-flight cap and per-host request spacing
//!
//! The crawl batch shares one limiter across all workers. A semaphore
//! bounds the total number of in-flight requests; a per-host map of last
//! request times enforces the minimum delay between requests to the same
//! host.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tokio::sync::{OwnedSemaphorePermit, Semaphore};

pub struct HostLimiter {
    in_flight: Arc<Semaphore>,
    min_delay: Duration,
    last_request: Mutex<HashMap<String, Instant>>,
}

impl HostLimiter {
    /// Creates a limiter with the given in-flight cap and per-host delay
    pub fn new(max_in_flight: usize, min_delay: Duration) -> Self {
        Self {
            in_flight: Arc::new(Semaphore::new(max_in_flight)),
            min_delay,
            last_request: Mutex::new(HashMap::new()),
        }
    }

    /// Acquires an in-flight slot and waits out the host's delay window
    ///
    /// The returned permit must be held for the duration of the request;
    /// dropping it frees the slot for other workers.
    pub async fn acquire(&self, host: &str) -> Option<OwnedSemaphorePermit> {
        let permit = self.in_flight.clone().acquire_owned().await.ok()?;
        self.wait_for_host(host).await;
        Some(permit)
    }

    /// Waits until the minimum delay since the host's last request has
    /// passed, then records a new request time
    pub async fn wait_for_host(&self, host: &str) {
        loop {
            let wait = {
                let map = self.last_request.lock().unwrap_or_else(|e| e.into_inner());
                map.get(host).and_then(|last| {
                    let elapsed = last.elapsed();
                    (elapsed < self.min_delay).then(|| self.min_delay - elapsed)
                })
            };

            match wait {
                Some(remaining) => tokio::time::sleep(remaining).await,
                None => break,
            }
        }

        let mut map = self.last_request.lock().unwrap_or_else(|e| e.into_inner());
        map.insert(host.to_string(), Instant::now());
    }

    /// Number of in-flight slots currently available
    pub fn available_slots(&self) -> usize {
        self.in_flight.available_permits()
    }
}
