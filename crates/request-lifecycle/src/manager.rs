//! Request Lifecycle Manager
//!
//! ```text
//! pending ──success──▶ connected ──clear/expiry──▶ (removed)
//!    │
//!    └──failure/transport──▶ failed ──clear──▶ (removed)
//! ```
//!
//! Nothing re-enters `pending`, and nothing leaves `connected` except clear
//! or expiry. A result for an unknown or already-decided request is dropped,
//! so a late response can never resurrect a cleared request.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use network_topology::{Path, TopologyStore};
use rand::Rng;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::allocator::{AllocationRequest, AllocationResult, AllocatorChannel};
use crate::expiry::ExpiryScheduler;
use crate::generator::RequestGenerator;
use crate::qos::ServiceClass;
use crate::request::{GenerationMode, Request, RequestStatus};
use crate::{LifecycleError, Result};

/// Used when a connected request carries a zero demand timeout
pub const FALLBACK_TIMEOUT_S: u64 = 30;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct LifecycleStats {
    pub generated: u64,
    pub connected: u64,
    pub failed: u64,
    pub expired: u64,
    pub cleared: u64,
    pub discarded_results: u64,
}

/// What `on_allocation_result` did with a result
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ResultOutcome {
    Connected,
    Failed,
    Discarded,
}

pub struct RequestManager {
    requests: Vec<Request>,
    generator: RequestGenerator,
    allocator: Arc<dyn AllocatorChannel>,
    expiry: ExpiryScheduler,
    stats: LifecycleStats,
}

impl RequestManager {
    pub fn new(allocator: Arc<dyn AllocatorChannel>, expiry: ExpiryScheduler) -> Self {
        Self::with_generator(allocator, expiry, RequestGenerator::default())
    }

    pub fn with_generator(
        allocator: Arc<dyn AllocatorChannel>,
        expiry: ExpiryScheduler,
        generator: RequestGenerator,
    ) -> Self {
        Self {
            requests: Vec::new(),
            generator,
            allocator,
            expiry,
            stats: LifecycleStats::default(),
        }
    }

    // ========================================================================
    // Queries
    // ========================================================================

    pub fn get(&self, id: &str) -> Option<&Request> {
        self.requests.iter().find(|r| r.id == id)
    }

    pub fn requests(&self) -> &[Request] {
        &self.requests
    }

    pub fn stats(&self) -> LifecycleStats {
        self.stats
    }

    /// Seconds left before a connected request expires
    pub fn remaining_time(&self, id: &str) -> Option<Duration> {
        self.get(id)
            .filter(|r| r.is_connected())
            .and_then(|_| self.expiry.remaining(id))
    }

    // ========================================================================
    // Commands
    // ========================================================================

    pub fn generate<R: Rng + ?Sized>(
        &self,
        rng: &mut R,
        class: ServiceClass,
        mode: GenerationMode,
    ) -> Result<Request> {
        self.generator.generate(rng, class, mode)
    }

    /// Track `request`, place its marker and hand it to the allocator.
    ///
    /// Returns the status right after submission: `Pending`, or `Failed` when
    /// the allocator channel refused it.
    pub fn submit(&mut self, store: &mut TopologyStore, request: Request) -> Result<RequestStatus> {
        if self.get(&request.id).is_some() {
            return Err(LifecycleError::DuplicateRequest(request.id));
        }

        store.insert_request_marker(&request.id, request.origin)?;
        let payload = AllocationRequest::from(&request);
        let id = request.id.clone();
        self.requests.push(request);
        self.stats.generated += 1;

        match self.allocator.submit(payload) {
            Ok(()) => {
                debug!("Submitted {} to allocator", id);
                Ok(RequestStatus::Pending)
            }
            Err(e) => {
                warn!("Allocator submission for {} failed: {}", id, e);
                self.set_status(&id, RequestStatus::Failed);
                self.stats.failed += 1;
                Ok(RequestStatus::Failed)
            }
        }
    }

    /// Generate and submit in one step. Returns the new request id.
    pub fn generate_and_submit<R: Rng + ?Sized>(
        &mut self,
        rng: &mut R,
        store: &mut TopologyStore,
        class: ServiceClass,
        mode: GenerationMode,
    ) -> Result<String> {
        let request = self.generate(rng, class, mode)?;
        let id = request.id.clone();
        self.submit(store, request)?;
        Ok(id)
    }

    /// Reconcile an allocator result. Must run inside a tokio runtime since a
    /// success arms the expiry timer.
    pub fn on_allocation_result(
        &mut self,
        store: &mut TopologyStore,
        result: AllocationResult,
    ) -> ResultOutcome {
        let Some(request) = self.requests.iter_mut().find(|r| r.id == result.id) else {
            debug!("Discarding result for unknown request {}", result.id);
            self.stats.discarded_results += 1;
            return ResultOutcome::Discarded;
        };

        if !request.is_pending() {
            debug!(
                "Discarding duplicate result for {} ({:?})",
                result.id, request.status
            );
            self.stats.discarded_results += 1;
            return ResultOutcome::Discarded;
        }

        if !result.is_success() {
            info!("Request {} failed: {}", result.id, result.result);
            request.status = RequestStatus::Failed;
            self.stats.failed += 1;
            return ResultOutcome::Failed;
        }

        request.status = RequestStatus::Connected;
        request.connected_at = Some(Utc::now());
        request.allocated = Some(result.allocated.unwrap_or_default());

        let timeout_s = match request.demand_timeout_s {
            0 => FALLBACK_TIMEOUT_S,
            t => t,
        };

        if let Some(hops) = result.path {
            let mut nodes = Vec::with_capacity(hops.len() + 1);
            nodes.push(result.id.clone());
            nodes.extend(hops);
            store.add_path(Path::new(result.id.clone(), nodes));
        }

        self.expiry
            .schedule(&result.id, Duration::from_secs(timeout_s));
        self.stats.connected += 1;
        info!("Request {} connected, expires in {}s", result.id, timeout_s);
        ResultOutcome::Connected
    }

    /// Remove a request with its marker and path. Idempotent.
    pub fn clear(&mut self, store: &mut TopologyStore, id: &str) -> bool {
        let removed = self.remove(store, id);
        if removed {
            self.stats.cleared += 1;
            info!("Request {} cleared", id);
        }
        removed
    }

    /// Expiry-timer entry point. Same removal as `clear`; a no-op for a
    /// request that is already gone.
    pub fn expire(&mut self, store: &mut TopologyStore, id: &str) -> bool {
        let removed = self.remove(store, id);
        if removed {
            self.stats.expired += 1;
            info!("Request {} expired", id);
        }
        removed
    }

    /// Flip visibility of the path owned by request `id`
    pub fn toggle_path(&self, store: &mut TopologyStore, id: &str) -> Result<bool> {
        Ok(store.toggle_path(id)?)
    }

    fn remove(&mut self, store: &mut TopologyStore, id: &str) -> bool {
        self.expiry.cancel(id);
        store.remove_path(id);
        store.remove_request_marker(id);

        match self.requests.iter().position(|r| r.id == id) {
            Some(idx) => {
                self.requests.remove(idx);
                true
            }
            None => false,
        }
    }

    fn set_status(&mut self, id: &str, status: RequestStatus) {
        if let Some(r) = self.requests.iter_mut().find(|r| r.id == id) {
            r.status = status;
        }
    }
}
