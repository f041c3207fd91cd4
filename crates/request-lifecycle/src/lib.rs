//! Request Lifecycle Library
//!
//! Synthesizes QoS-profiled traffic requests, submits them to the external
//! allocator, reconciles asynchronous results and expires connected requests.
//!
//! | Module | Purpose |
//! |--------|---------|
//! | `qos` | Service classes and their QoS ranges |
//! | `region` | Weighted origin regions for automatic requests |
//! | `generator` | Request synthesis |
//! | `allocator` | Allocator wire format and submission seam |
//! | `expiry` | Cancellable wall-clock timers |
//! | `manager` | State machine tying it together |

use network_topology::TopologyError;
use orbital_mechanics::OrbitalError;
use thiserror::Error;

pub mod allocator;
pub mod expiry;
pub mod generator;
pub mod manager;
pub mod qos;
pub mod region;
pub mod request;

pub use allocator::{AllocationRequest, AllocationResult, AllocatorChannel};
pub use expiry::ExpiryScheduler;
pub use generator::RequestGenerator;
pub use manager::{LifecycleStats, RequestManager, ResultOutcome};
pub use qos::{QosProfile, QosRange, ServiceClass};
pub use region::{Region, RegionTable};
pub use request::{AllocatedQos, GenerationMode, ManualOverrides, QosDemand, Request, RequestStatus};

#[derive(Error, Debug)]
pub enum LifecycleError {
    #[error("Unknown service class: {0}")]
    UnknownServiceClass(String),
    #[error("Region table has no drawable region")]
    EmptyRegionTable,
    #[error("Request already tracked: {0}")]
    DuplicateRequest(String),
    #[error("Allocator transport error: {0}")]
    Transport(String),
    #[error(transparent)]
    Topology(#[from] TopologyError),
    #[error(transparent)]
    Orbital(#[from] OrbitalError),
}

pub type Result<T> = std::result::Result<T, LifecycleError>;
