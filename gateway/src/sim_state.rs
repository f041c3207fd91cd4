//! Simulation State
//!
//! Everything mutable lives in one [`Simulation`] behind a single
//! `tokio::sync::RwLock`. Every writer (clock loop, allocator results, expiry
//! events, auto-generation, node feed refresh, HTTP commands) takes the write
//! lock for a short synchronous section and never awaits while holding it.

use std::str::FromStr;
use std::sync::Arc;
use std::time::Instant;

use network_topology::{Node, SimulationClock, TickReport, TopologyStore};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use request_lifecycle::{
    AllocationResult, GenerationMode, LifecycleStats, ManualOverrides, RequestManager,
    ResultOutcome, ServiceClass,
};
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use tracing::{debug, error, warn};

pub type SharedSimulation = Arc<RwLock<Simulation>>;

// ============================================================================
// Operator console
// ============================================================================

/// Which class an automatic-mode request uses. Manual mode always uses
/// the console's selected class.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AutoClassPolicy {
    /// Uniformly sampled per request
    #[default]
    Sampled,
    /// The console's selected class
    Selected,
}

impl FromStr for AutoClassPolicy {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "sampled" | "random" => Ok(Self::Sampled),
            "selected" => Ok(Self::Selected),
            other => Err(anyhow::anyhow!("unknown auto class policy {:?}", other)),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ConsoleState {
    pub selected_class: ServiceClass,
    pub manual_mode: bool,
    pub manual: ManualOverrides,
    pub auto_generate: bool,
    pub auto_class_policy: AutoClassPolicy,
}

impl Default for ConsoleState {
    fn default() -> Self {
        Self {
            selected_class: ServiceClass::Data,
            manual_mode: false,
            manual: ManualOverrides::default(),
            auto_generate: false,
            auto_class_policy: AutoClassPolicy::Sampled,
        }
    }
}


// ============================================================================
// Simulation
// ============================================================================

pub struct Simulation {
    pub store: TopologyStore,
    pub requests: RequestManager,
    pub clock: SimulationClock,
    pub console: ConsoleState,
    rng: StdRng,
}

#[derive(Debug, Clone, Serialize)]
pub struct SimSnapshot {
    pub nodes: usize,
    pub satellites: usize,
    pub requests: usize,
    pub paths: usize,
    pub clock_running: bool,
    pub clock_steps: u64,
    pub simulated_seconds: f64,
    pub lifecycle: LifecycleStats,
}

impl Simulation {
    pub fn new(
        store: TopologyStore,
        requests: RequestManager,
        clock: SimulationClock,
        console: ConsoleState,
    ) -> Self {
        Self {
            store,
            requests,
            clock,
            console,
            rng: StdRng::from_entropy(),
        }
    }

    pub fn into_shared(self) -> SharedSimulation {
        Arc::new(RwLock::new(self))
    }

    /// Class and mode for the next request: manual mode takes the selected
    /// class and the form overrides, automatic mode follows the class policy.
    fn console_choice(&mut self) -> (ServiceClass, GenerationMode) {
        let console = &self.console;
        if console.manual_mode {
            return (console.selected_class, GenerationMode::Manual(console.manual));
        }

        let class = match console.auto_class_policy {
            AutoClassPolicy::Selected => console.selected_class,
            AutoClassPolicy::Sampled => *ServiceClass::ALL
                .choose(&mut self.rng)
                .unwrap_or(&console.selected_class),
        };
        (class, GenerationMode::Automatic)
    }

    /// Generate and submit one request from the console settings
    pub fn generate_from_console(&mut self) -> request_lifecycle::Result<String> {
        let (class, mode) = self.console_choice();
        self.requests
            .generate_and_submit(&mut self.rng, &mut self.store, class, mode)
    }

    /// One auto-generation round. Does nothing while auto-generation is off.
    pub fn auto_generate(&mut self) -> Option<String> {
        if !self.console.auto_generate {
            return None;
        }

        match self.generate_from_console() {
            Ok(id) => {
                debug!("Auto-generated {}", id);
                Some(id)
            }
            Err(e) => {
                warn!("Auto-generation failed: {}", e);
                None
            }
        }
    }

    pub fn tick(&mut self, now: Instant) -> TickReport {
        match self.clock.tick(now, &mut self.store) {
            Ok(report) => report,
            Err(e) => {
                error!("Propagation failed: {}", e);
                TickReport::default()
            }
        }
    }

    pub fn apply_result(&mut self, result: AllocationResult) -> ResultOutcome {
        self.requests.on_allocation_result(&mut self.store, result)
    }

    pub fn expire(&mut self, id: &str) -> bool {
        self.requests.expire(&mut self.store, id)
    }

    pub fn clear(&mut self, id: &str) -> bool {
        self.requests.clear(&mut self.store, id)
    }

    /// Replace infrastructure nodes from a fresh node feed
    pub fn refresh_infrastructure(&mut self, nodes: Vec<Node>) -> network_topology::Result<usize> {
        self.store.load_infrastructure(nodes)
    }

    pub fn snapshot(&self) -> SimSnapshot {
        SimSnapshot {
            nodes: self.store.len(),
            satellites: self.store.satellites().count(),
            requests: self.requests.requests().len(),
            paths: self.store.paths().count(),
            clock_running: self.clock.is_running(),
            clock_steps: self.clock.steps(),
            simulated_seconds: self.clock.simulated_seconds(),
            lifecycle: self.requests.stats(),
        }
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use network_topology::{parse_feed, ClockConfig};
    use request_lifecycle::{AllocationRequest, AllocatorChannel, ExpiryScheduler};
    use std::sync::Mutex;
    use tokio::sync::mpsc::UnboundedReceiver;

    pub const FEED: &str = r#"[
        {"id": "GS_Hanoi", "type": "groundstation", "position": {"lat": 21.03, "lon": 105.85}},
        {"id": "GS_HCM", "type": "groundstation", "position": {"lat": 10.82, "lon": 106.63}},
        {"id": "LEO-41", "type": "satellite", "position": {"lat": 12.1, "lon": 101.3, "alt": 550000},
         "sat_type": "LEO",
         "orbit": {"inclination": 53, "raan": 40, "period": 5700, "eccentricity": 0.001},
         "orbit_state": {"last_theta": 0.93}}
    ]"#;

    #[derive(Default)]
    pub struct RecordingAllocator {
        pub sent: Mutex<Vec<AllocationRequest>>,
    }

    impl AllocatorChannel for RecordingAllocator {
        fn submit(&self, request: AllocationRequest) -> request_lifecycle::Result<()> {
            self.sent.lock().unwrap().push(request);
            Ok(())
        }
    }

    pub fn simulation() -> (Simulation, Arc<RecordingAllocator>, UnboundedReceiver<String>) {
        let allocator = Arc::new(RecordingAllocator::default());
        let (expiry, rx) = ExpiryScheduler::channel();
        let sim = Simulation::new(
            TopologyStore::with_nodes(parse_feed(FEED).unwrap()).unwrap(),
            RequestManager::new(allocator.clone(), expiry),
            SimulationClock::new(ClockConfig::default()).unwrap(),
            ConsoleState::default(),
        );
        (sim, allocator, rx)
    }
}

#[cfg(test)]
mod tests {
    use super::testing::simulation;
    use super::*;
    use request_lifecycle::RequestStatus;

    #[tokio::test]
    async fn test_generate_from_console_manual() {
        let (mut sim, allocator, _rx) = simulation();
        sim.console.manual_mode = true;
        sim.console.selected_class = ServiceClass::Emergency;
        sim.console.manual.timeout_s = 250;

        let id = sim.generate_from_console().unwrap();
        let req = sim.requests.get(&id).unwrap();
        assert_eq!(req.class, ServiceClass::Emergency);
        assert_eq!(req.demand_timeout_s, 250);
        assert_eq!(req.origin.latitude, 10.8231);
        assert_eq!(allocator.sent.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_auto_generate_follows_manual_console() {
        let (mut sim, _allocator, _rx) = simulation();
        assert!(sim.auto_generate().is_none());

        sim.console.auto_generate = true;
        sim.console.manual_mode = true;
        sim.console.selected_class = ServiceClass::Emergency;
        sim.console.manual.timeout_s = 42;

        for _ in 0..20 {
            let id = sim.auto_generate().unwrap();
            let req = sim.requests.get(&id).unwrap();
            assert_eq!(req.class, ServiceClass::Emergency);
            assert_eq!(req.demand_timeout_s, 42);
            assert_eq!(req.origin.latitude, 10.8231);
            assert_eq!(req.origin.longitude, 106.6297);
        }
    }

    #[tokio::test]
    async fn test_automatic_console_samples_class_unless_selected() {
        let (mut sim, _allocator, _rx) = simulation();
        sim.console.auto_generate = true;
        sim.console.selected_class = ServiceClass::IoT;

        let mut classes = std::collections::HashSet::new();
        for _ in 0..200 {
            let id = sim.auto_generate().unwrap();
            let req = sim.requests.get(&id).unwrap();
            assert!((100..=1000).contains(&req.demand_timeout_s));
            classes.insert(req.class);
        }
        assert!(classes.len() > 1);

        sim.console.auto_class_policy = AutoClassPolicy::Selected;
        for _ in 0..20 {
            let id = sim.generate_from_console().unwrap();
            assert_eq!(sim.requests.get(&id).unwrap().class, ServiceClass::IoT);
        }
    }

    #[tokio::test]
    async fn test_refresh_keeps_requests() {
        let (mut sim, _allocator, _rx) = simulation();
        let id = sim.generate_from_console().unwrap();

        let loaded = sim
            .refresh_infrastructure(network_topology::parse_feed("[]").unwrap())
            .unwrap();
        assert_eq!(loaded, 0);
        assert!(sim.store.contains(&id));
        assert_eq!(sim.snapshot().nodes, 1);
    }

    #[tokio::test]
    async fn test_result_and_clear() {
        let (mut sim, _allocator, _rx) = simulation();
        let id = sim.generate_from_console().unwrap();

        let outcome = sim.apply_result(AllocationResult {
            id: id.clone(),
            result: "success".into(),
            path: Some(vec!["LEO-41".into(), "GS_Hanoi".into()]),
            allocated: None,
        });
        assert_eq!(outcome, ResultOutcome::Connected);
        assert_eq!(sim.requests.get(&id).unwrap().status, RequestStatus::Connected);
        assert_eq!(sim.snapshot().paths, 1);

        assert!(sim.clear(&id));
        assert!(!sim.expire(&id));
        assert_eq!(sim.snapshot().paths, 0);
    }

    #[test]
    fn test_policy_parse() {
        assert_eq!("Selected".parse::<AutoClassPolicy>().unwrap(), AutoClassPolicy::Selected);
        assert_eq!("random".parse::<AutoClassPolicy>().unwrap(), AutoClassPolicy::Sampled);
        assert!("other".parse::<AutoClassPolicy>().is_err());
    }
}
