//! Request synthesis
//!
//! Generic over the RNG so tests can run seeded.

use chrono::Utc;
use orbital_mechanics::GeoPosition;
use rand::Rng;
use uuid::Uuid;

use crate::qos::{QosProfile, QosRange, ServiceClass};
use crate::region::{round_to, uniform, RegionTable};
use crate::request::{GenerationMode, QosDemand, Request, RequestStatus};
use crate::{LifecycleError, Result};

/// Automatic demand timeouts are drawn from this range (seconds, inclusive)
pub const AUTO_TIMEOUT_RANGE_S: (u64, u64) = (100, 1000);

/// Packet size range (inclusive)
pub const PACKET_SIZE_RANGE: (u32, u32) = (1, 100);

pub fn new_request_id() -> String {
    format!("req_{}", Uuid::new_v4().simple())
}

/// Sample demand from a class profile
pub fn sample_demand<R: Rng + ?Sized>(rng: &mut R, profile: &QosProfile) -> QosDemand {
    QosDemand {
        uplink: round_to(uniform(rng, (profile.uplink.min, profile.uplink.max)), 2),
        downlink: round_to(uniform(rng, (profile.downlink.min, profile.downlink.max)), 2),
        latency: round_to(uniform(rng, (profile.latency.min, profile.latency.max)), 2),
        reliability: round_to(
            uniform(rng, (profile.reliability.min, profile.reliability.max)),
            4,
        ),
        cpu: uniform_int(rng, profile.cpu),
        power: uniform_int(rng, profile.power),
        priority: uniform_int(rng, profile.priority),
        packet_size: rng.gen_range(PACKET_SIZE_RANGE.0..=PACKET_SIZE_RANGE.1),
        support_5g: true,
    }
}

fn uniform_int<R: Rng + ?Sized>(rng: &mut R, range: QosRange) -> u32 {
    let lo = range.min.ceil().max(0.0) as u32;
    let hi = range.max.floor().max(0.0) as u32;
    if hi <= lo {
        return lo;
    }
    rng.gen_range(lo..=hi)
}

#[derive(Debug, Clone, Default)]
pub struct RequestGenerator {
    regions: RegionTable,
}

impl RequestGenerator {
    pub fn new(regions: RegionTable) -> Self {
        Self { regions }
    }

    pub fn regions(&self) -> &RegionTable {
        &self.regions
    }

    /// Build a fresh pending request.
    ///
    /// Automatic mode also samples the origin region and the demand timeout;
    /// manual mode takes both from the overrides.
    pub fn generate<R: Rng + ?Sized>(
        &self,
        rng: &mut R,
        class: ServiceClass,
        mode: GenerationMode,
    ) -> Result<Request> {
        let demand = sample_demand(rng, class.profile());

        let (origin, demand_timeout_s) = match mode {
            GenerationMode::Automatic => {
                let (_, lat, lon) = self
                    .regions
                    .sample(rng)
                    .ok_or(LifecycleError::EmptyRegionTable)?;
                let timeout = rng.gen_range(AUTO_TIMEOUT_RANGE_S.0..=AUTO_TIMEOUT_RANGE_S.1);
                (GeoPosition::surface(lat, lon)?, timeout)
            }
            GenerationMode::Manual(o) => (GeoPosition::new(o.lat, o.lon, o.alt)?, o.timeout_s),
        };

        Ok(Request {
            id: new_request_id(),
            class,
            origin,
            demand,
            demand_timeout_s,
            status: RequestStatus::Pending,
            created_at: Utc::now(),
            connected_at: None,
            allocated: None,
        })
    }
}
