//! Background loops
//!
//! | Loop | Trigger | Effect |
//! |------|---------|--------|
//! | clock | every frame | satellite propagation when the interval is crossed |
//! | results | allocator channel | request state + paths |
//! | expiry | expiry channel | removes expired requests |
//! | auto-generate | every N seconds | one synthetic request while enabled |

use std::time::Duration;

use request_lifecycle::AllocationResult;
use tokio::sync::mpsc::UnboundedReceiver;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info};

use crate::sim_state::SharedSimulation;

pub fn spawn_clock(sim: SharedSimulation, frame: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(frame);
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
        loop {
            interval.tick().await;
            let now = std::time::Instant::now();
            sim.write().await.tick(now);
        }
    })
}

pub fn spawn_result_pump(
    sim: SharedSimulation,
    mut results: UnboundedReceiver<AllocationResult>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(result) = results.recv().await {
            let outcome = sim.write().await.apply_result(result);
            debug!("Allocation result applied: {:?}", outcome);
        }
        info!("Allocator result channel closed");
    })
}

pub fn spawn_expiry_pump(sim: SharedSimulation, mut expired: UnboundedReceiver<String>) -> JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(id) = expired.recv().await {
            sim.write().await.expire(&id);
        }
        info!("Expiry channel closed");
    })
}

pub fn spawn_auto_generate(sim: SharedSimulation, every: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(every);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // first tick fires immediately; wait a full period instead
        interval.tick().await;
        loop {
            interval.tick().await;
            sim.write().await.auto_generate();
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim_state::testing::simulation;
    use tokio::sync::mpsc;

    #[tokio::test(start_paused = true)]
    async fn test_auto_generate_every_period() {
        let (mut sim, allocator, _rx) = simulation();
        sim.console.auto_generate = true;
        let sim = sim.into_shared();

        let handle = spawn_auto_generate(sim.clone(), Duration::from_secs(3));
        tokio::time::sleep(Duration::from_millis(9_500)).await;
        handle.abort();

        assert_eq!(allocator.sent.lock().unwrap().len(), 3);
        assert_eq!(sim.read().await.requests.requests().len(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_result_pump_applies_results() {
        let (sim, _allocator, _rx) = simulation();
        let sim = sim.into_shared();
        let id = sim.write().await.generate_from_console().unwrap();

        let (tx, rx) = mpsc::unbounded_channel();
        let handle = spawn_result_pump(sim.clone(), rx);
        tx.send(AllocationResult::failed(id.clone())).unwrap();
        drop(tx);
        handle.await.unwrap();

        let guard = sim.read().await;
        assert!(!guard.requests.get(&id).unwrap().is_pending());
    }

    #[tokio::test(start_paused = true)]
    async fn test_expiry_pump_removes_request() {
        let (sim, _allocator, expired_rx) = simulation();
        let sim = sim.into_shared();
        let id = {
            let mut guard = sim.write().await;
            let id = guard.generate_from_console().unwrap();
            guard.apply_result(AllocationResult {
                id: id.clone(),
                result: "success".into(),
                path: None,
                allocated: None,
            });
            id
        };

        let _pump = spawn_expiry_pump(sim.clone(), expired_rx);
        let timeout = sim.read().await.requests.get(&id).unwrap().demand_timeout_s;
        tokio::time::sleep(Duration::from_secs(timeout + 1)).await;

        let guard = sim.read().await;
        assert!(guard.requests.get(&id).is_none());
        assert!(!guard.store.contains(&id));
        assert_eq!(guard.requests.stats().expired, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_clock_loop_propagates() {
        let (sim, _allocator, _rx) = simulation();
        let sim = sim.into_shared();
        let before = sim.read().await.store.get("LEO-41").unwrap().position();

        let handle = spawn_clock(sim.clone(), Duration::from_millis(50));
        // the clock reads std Instant, which paused tokio time does not move
        for _ in 0..2 {
            tokio::task::yield_now().await;
            std::thread::sleep(Duration::from_millis(250));
            tokio::time::sleep(Duration::from_millis(60)).await;
        }
        handle.abort();

        let after = sim.read().await.store.get("LEO-41").unwrap().position();
        assert_ne!(before, after);
    }
}
