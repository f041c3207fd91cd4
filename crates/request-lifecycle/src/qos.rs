//! QoS Profile Catalog
//!
//! Static per-class ranges the generator samples demand from.
//!
//! | Code | Class | Latency (ms) | Reliability |
//! |------|-------|--------------|-------------|
//! | 1 | Voice | 20–100 | 0.95–0.99 |
//! | 2 | Video | 50–150 | 0.90–0.98 |
//! | 3 | Data | 50–200 | 0.90–0.97 |
//! | 4 | IoT | 10–100 | 0.97–0.999 |
//! | 5 | Streaming | 50–150 | 0.90–0.97 |
//! | 6 | Bulk Transfer | 100–500 | 0.85–0.95 |
//! | 7 | Control | 5–50 | 0.99–0.999 |
//! | 8 | Emergency | 1–20 | 0.999–1.0 |

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::LifecycleError;

/// Service class. Serialized as its wire code (1–8).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum ServiceClass {
    Voice,
    Video,
    Data,
    IoT,
    Streaming,
    BulkTransfer,
    Control,
    Emergency,
}

impl ServiceClass {
    pub const ALL: [ServiceClass; 8] = [
        ServiceClass::Voice,
        ServiceClass::Video,
        ServiceClass::Data,
        ServiceClass::IoT,
        ServiceClass::Streaming,
        ServiceClass::BulkTransfer,
        ServiceClass::Control,
        ServiceClass::Emergency,
    ];

    pub fn code(&self) -> u8 {
        match self {
            ServiceClass::Voice => 1,
            ServiceClass::Video => 2,
            ServiceClass::Data => 3,
            ServiceClass::IoT => 4,
            ServiceClass::Streaming => 5,
            ServiceClass::BulkTransfer => 6,
            ServiceClass::Control => 7,
            ServiceClass::Emergency => 8,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            ServiceClass::Voice => "Voice",
            ServiceClass::Video => "Video",
            ServiceClass::Data => "Data",
            ServiceClass::IoT => "IoT",
            ServiceClass::Streaming => "Streaming",
            ServiceClass::BulkTransfer => "Bulk Transfer",
            ServiceClass::Control => "Control",
            ServiceClass::Emergency => "Emergency",
        }
    }

    pub fn profile(&self) -> &'static QosProfile {
        &CATALOG[(self.code() - 1) as usize]
    }
}

impl TryFrom<u8> for ServiceClass {
    type Error = LifecycleError;

    fn try_from(code: u8) -> Result<Self, Self::Error> {
        ServiceClass::ALL
            .iter()
            .copied()
            .find(|c| c.code() == code)
            .ok_or(LifecycleError::UnknownServiceClass(code.to_string()))
    }
}

impl From<ServiceClass> for u8 {
    fn from(class: ServiceClass) -> u8 {
        class.code()
    }
}

impl FromStr for ServiceClass {
    type Err = LifecycleError;

    /// Accepts a wire code or a case-insensitive class name
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if let Ok(code) = s.parse::<u8>() {
            return ServiceClass::try_from(code);
        }
        let wanted: String = s
            .chars()
            .filter(|c| c.is_ascii_alphanumeric())
            .collect::<String>()
            .to_ascii_lowercase();
        ServiceClass::ALL
            .iter()
            .copied()
            .find(|c| c.name().replace(' ', "").to_ascii_lowercase() == wanted)
            .ok_or_else(|| LifecycleError::UnknownServiceClass(s.to_string()))
    }
}

impl fmt::Display for ServiceClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Closed interval [min, max]
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct QosRange {
    pub min: f64,
    pub max: f64,
}

impl QosRange {
    const fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    pub fn contains(&self, value: f64) -> bool {
        value >= self.min && value <= self.max
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct QosProfile {
    /// Mbps
    pub uplink: QosRange,
    /// Mbps
    pub downlink: QosRange,
    /// ms
    pub latency: QosRange,
    pub reliability: QosRange,
    pub priority: QosRange,
    pub cpu: QosRange,
    pub power: QosRange,
}

const fn profile(
    uplink: (f64, f64),
    downlink: (f64, f64),
    latency: (f64, f64),
    reliability: (f64, f64),
    priority: (f64, f64),
    cpu: (f64, f64),
    power: (f64, f64),
) -> QosProfile {
    QosProfile {
        uplink: QosRange::new(uplink.0, uplink.1),
        downlink: QosRange::new(downlink.0, downlink.1),
        latency: QosRange::new(latency.0, latency.1),
        reliability: QosRange::new(reliability.0, reliability.1),
        priority: QosRange::new(priority.0, priority.1),
        cpu: QosRange::new(cpu.0, cpu.1),
        power: QosRange::new(power.0, power.1),
    }
}

/// Indexed by wire code - 1
static CATALOG: [QosProfile; 8] = [
    profile((0.1, 0.3), (0.2, 0.5), (20.0, 100.0), (0.95, 0.99), (2.0, 4.0), (1.0, 4.0), (2.0, 6.0)),
    profile((1.0, 3.0), (5.0, 10.0), (50.0, 150.0), (0.90, 0.98), (3.0, 6.0), (10.0, 30.0), (20.0, 50.0)),
    profile((1.0, 5.0), (5.0, 20.0), (50.0, 200.0), (0.90, 0.97), (4.0, 7.0), (5.0, 20.0), (10.0, 40.0)),
    profile((0.05, 0.3), (0.05, 0.2), (10.0, 100.0), (0.97, 0.999), (2.0, 5.0), (1.0, 3.0), (1.0, 5.0)),
    profile((1.0, 3.0), (8.0, 15.0), (50.0, 150.0), (0.90, 0.97), (3.0, 6.0), (15.0, 40.0), (20.0, 60.0)),
    profile((5.0, 20.0), (20.0, 100.0), (100.0, 500.0), (0.85, 0.95), (7.0, 10.0), (20.0, 50.0), (40.0, 80.0)),
    profile((0.1, 0.5), (0.1, 0.5), (5.0, 50.0), (0.99, 0.999), (1.0, 3.0), (2.0, 6.0), (5.0, 10.0)),
    profile((0.5, 2.0), (0.5, 2.0), (1.0, 20.0), (0.999, 1.0), (1.0, 1.0), (5.0, 15.0), (10.0, 20.0)),
];

/// Full catalog in wire-code order
pub fn catalog() -> impl Iterator<Item = (ServiceClass, &'static QosProfile)> {
    ServiceClass::ALL.iter().map(|c| (*c, c.profile()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wire_codes() {
        for (i, class) in ServiceClass::ALL.iter().enumerate() {
            assert_eq!(class.code() as usize, i + 1);
            assert_eq!(ServiceClass::try_from(class.code()).unwrap(), *class);
        }
        assert!(ServiceClass::try_from(0).is_err());
        assert!(ServiceClass::try_from(9).is_err());
    }

    #[test]
    fn test_serde_as_code() {
        assert_eq!(serde_json::to_string(&ServiceClass::Emergency).unwrap(), "8");
        let class: ServiceClass = serde_json::from_str("6").unwrap();
        assert_eq!(class, ServiceClass::BulkTransfer);
        assert!(serde_json::from_str::<ServiceClass>("42").is_err());
    }

    #[test]
    fn test_parse_names() {
        assert_eq!("iot".parse::<ServiceClass>().unwrap(), ServiceClass::IoT);
        assert_eq!("Bulk Transfer".parse::<ServiceClass>().unwrap(), ServiceClass::BulkTransfer);
        assert_eq!("bulk_transfer".parse::<ServiceClass>().unwrap(), ServiceClass::BulkTransfer);
        assert_eq!("3".parse::<ServiceClass>().unwrap(), ServiceClass::Data);
        assert!("telepathy".parse::<ServiceClass>().is_err());
    }

    #[test]
    fn test_catalog_ranges_are_ordered() {
        for (class, p) in catalog() {
            for r in [p.uplink, p.downlink, p.latency, p.reliability, p.priority, p.cpu, p.power] {
                assert!(r.min <= r.max, "{} has inverted range {:?}", class, r);
            }
            assert!(p.reliability.max <= 1.0);
        }
        assert_eq!(ServiceClass::Emergency.profile().priority, QosRange::new(1.0, 1.0));
        assert_eq!(ServiceClass::Voice.profile().latency, QosRange::new(20.0, 100.0));
    }
}
