//! Bounded connection pool
//!
//! This module handles:
//! - The global cap on concurrently open fetches (`max_connections`)
//! - The per-host cap (`max_host_connections`)
//!
//! A fetch unit holds a [`PoolPermit`] for as long as its request and body
//! transfer are in progress. Units that cannot get a permit wait inside
//! their own task, so the run loop never blocks on the pool.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tokio::sync::{AcquireError, OwnedSemaphorePermit, Semaphore};

/// Permission for one fetch to use a connection
///
/// Both slots are released when the permit is dropped.
#[derive(Debug)]
pub struct PoolPermit {
    _host: OwnedSemaphorePermit,
    _global: OwnedSemaphorePermit,
}

/// Global and per-host connection limits shared by all fetch units of a run
#[derive(Debug)]
pub struct ConnectionPool {
    /// Global semaphore for limiting concurrent fetches
    global: Arc<Semaphore>,

    /// One semaphore per host key, created on first use
    per_host: Mutex<HashMap<String, Arc<Semaphore>>>,

    host_limit: usize,
}

impl ConnectionPool {
    pub fn new(max_connections: usize, max_host_connections: usize) -> Self {
        Self {
            global: Arc::new(Semaphore::new(max_connections)),
            per_host: Mutex::new(HashMap::new()),
            host_limit: max_host_connections,
        }
    }

    /// Waits for a connection slot for `host`
    ///
    /// The host slot is taken first so a unit queued behind a busy host
    /// does not sit on one of the global slots.
    pub async fn acquire(&self, host: &str) -> Result<PoolPermit, AcquireError> {
        let host_semaphore = self.host_semaphore(host);

        let host_permit = host_semaphore.acquire_owned().await?;
        tracing::trace!("Host slot acquired for {}", host);
        let global_permit = Arc::clone(&self.global).acquire_owned().await?;

        Ok(PoolPermit {
            _host: host_permit,
            _global: global_permit,
        })
    }

    /// Free slots across all hosts
    pub fn available(&self) -> usize {
        self.global.available_permits()
    }

    /// Free slots for one host
    pub fn available_for(&self, host: &str) -> usize {
        self.host_semaphore(host).available_permits()
    }

    fn host_semaphore(&self, host: &str) -> Arc<Semaphore> {
        let mut per_host = self
            .per_host
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        Arc::clone(
            per_host
                .entry(host.to_string())
                .or_insert_with(|| Arc::new(Semaphore::new(self.host_limit))),
        )
    }
}
