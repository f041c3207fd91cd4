//! Allocator wire format and channel seam
//!
//! Submission is fire-and-forget: [`AllocatorChannel::submit`] must not block
//! and results come back later as [`AllocationResult`] through whatever
//! delivery path the implementation owns (an mpsc channel in the gateway).

use serde::{Deserialize, Serialize};

use crate::qos::ServiceClass;
use crate::request::{AllocatedQos, Request};
use crate::Result;

pub const RESULT_SUCCESS: &str = "success";
pub const RESULT_FAILED: &str = "failed";

/// Submit payload, field names as the allocator expects them
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AllocationRequest {
    pub id: String,
    #[serde(rename = "type")]
    pub class: ServiceClass,
    pub lat: f64,
    pub lon: f64,
    pub alt: f64,
    pub uplink: f64,
    pub downlink: f64,
    pub latency: f64,
    pub reliability: f64,
    pub cpu: u32,
    pub power: u32,
    pub packet_size: u32,
    pub priority: u32,
    pub demand_timeout: u64,
    #[serde(rename = "support5G")]
    pub support_5g: bool,
}

impl From<&Request> for AllocationRequest {
    fn from(req: &Request) -> Self {
        Self {
            id: req.id.clone(),
            class: req.class,
            lat: req.origin.latitude,
            lon: req.origin.longitude,
            alt: req.origin.altitude_m,
            uplink: req.demand.uplink,
            downlink: req.demand.downlink,
            latency: req.demand.latency,
            reliability: req.demand.reliability,
            cpu: req.demand.cpu,
            power: req.demand.power,
            packet_size: req.demand.packet_size,
            priority: req.demand.priority,
            demand_timeout: req.demand_timeout_s,
            support_5g: req.demand.support_5g,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AllocationResult {
    pub id: String,
    pub result: String,
    #[serde(default)]
    pub path: Option<Vec<String>>,
    #[serde(default)]
    pub allocated: Option<AllocatedQos>,
}

impl AllocationResult {
    pub fn is_success(&self) -> bool {
        self.result == RESULT_SUCCESS
    }

    pub fn failed(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            result: RESULT_FAILED.to_string(),
            path: None,
            allocated: None,
        }
    }
}

/// Outbound seam to the external allocator
pub trait AllocatorChannel: Send + Sync {
    /// Hand off a request without waiting for the answer. An `Err` means the
    /// request never left; the caller marks it failed.
    fn submit(&self, request: AllocationRequest) -> Result<()>;
}
