//! Request model

use chrono::{DateTime, Utc};
use orbital_mechanics::GeoPosition;
use serde::{Deserialize, Serialize};

use crate::qos::ServiceClass;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RequestStatus {
    Pending,
    Connected,
    Failed,
}

/// Demand sampled from the class profile
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct QosDemand {
    pub uplink: f64,
    pub downlink: f64,
    pub latency: f64,
    pub reliability: f64,
    pub cpu: u32,
    pub power: u32,
    pub priority: u32,
    pub packet_size: u32,
    #[serde(rename = "support5G")]
    pub support_5g: bool,
}

/// Resources granted by the allocator. Any field may be absent.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct AllocatedQos {
    #[serde(default)]
    pub uplink: Option<f64>,
    #[serde(default)]
    pub downlink: Option<f64>,
    #[serde(default)]
    pub latency: Option<f64>,
    #[serde(default)]
    pub reliability: Option<f64>,
    #[serde(default)]
    pub cpu: Option<f64>,
    #[serde(default)]
    pub power: Option<f64>,
}

/// Operator-supplied origin and timeout for manual requests
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ManualOverrides {
    pub lat: f64,
    pub lon: f64,
    #[serde(default)]
    pub alt: f64,
    pub timeout_s: u64,
}

impl Default for ManualOverrides {
    /// Ho Chi Minh City, 100 s
    fn default() -> Self {
        Self {
            lat: 10.8231,
            lon: 106.6297,
            alt: 0.0,
            timeout_s: 100,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum GenerationMode {
    Automatic,
    Manual(ManualOverrides),
}

#[derive(Debug, Clone, Serialize)]
pub struct Request {
    pub id: String,
    pub class: ServiceClass,
    pub origin: GeoPosition,
    pub demand: QosDemand,
    pub demand_timeout_s: u64,
    pub status: RequestStatus,
    pub created_at: DateTime<Utc>,
    pub connected_at: Option<DateTime<Utc>>,
    pub allocated: Option<AllocatedQos>,
}

impl Request {
    pub fn is_pending(&self) -> bool {
        self.status == RequestStatus::Pending
    }

    pub fn is_connected(&self) -> bool {
        self.status == RequestStatus::Connected
    }
}
