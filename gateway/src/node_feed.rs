//! Node feed source
//!
//! Loads the infrastructure node list from the feed server (`/allnodes`) or a
//! local JSON file, and optionally re-polls it.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use network_topology::{parse_feed, Node};
use tokio::task::JoinHandle;
use tracing::{error, info};

use crate::sim_state::SharedSimulation;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeFeedSource {
    Url(String),
    File(PathBuf),
}

impl std::fmt::Display for NodeFeedSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            NodeFeedSource::Url(url) => write!(f, "{}", url),
            NodeFeedSource::File(path) => write!(f, "{}", path.display()),
        }
    }
}

impl NodeFeedSource {
    pub async fn fetch(&self, client: &reqwest::Client) -> Result<Vec<Node>> {
        let body = match self {
            NodeFeedSource::Url(url) => client
                .get(url)
                .send()
                .await
                .with_context(|| format!("node feed request to {} failed", url))?
                .error_for_status()?
                .text()
                .await?,
            NodeFeedSource::File(path) => tokio::fs::read_to_string(path)
                .await
                .with_context(|| format!("cannot read node feed {}", path.display()))?,
        };

        let nodes = parse_feed(&body).with_context(|| format!("malformed node feed from {}", self))?;
        Ok(nodes)
    }
}

/// Fetch once and swap the result into the simulation
pub async fn refresh(
    source: &NodeFeedSource,
    client: &reqwest::Client,
    sim: &SharedSimulation,
) -> Result<usize> {
    // fetch before locking: the network call must not hold the lock
    let nodes = source.fetch(client).await?;
    let loaded = sim.write().await.refresh_infrastructure(nodes)?;
    Ok(loaded)
}

/// Re-poll the feed every `every`. A failed refresh keeps the current nodes.
pub fn spawn_refresh(
    source: NodeFeedSource,
    client: reqwest::Client,
    sim: SharedSimulation,
    every: Duration,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(every);
        // startup already loaded the feed
        interval.tick().await;
        loop {
            interval.tick().await;
            match refresh(&source, &client, &sim).await {
                Ok(n) => info!("Node feed refreshed: {} nodes", n),
                Err(e) => error!("Node feed refresh failed: {:#}", e),
            }
        }
    })
}
