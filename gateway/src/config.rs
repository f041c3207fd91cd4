//! Gateway configuration
//!
//! Read once from the environment at startup.
//!
//! | Variable | Default |
//! |----------|---------|
//! | `GATEWAY_PORT` / `PORT` | 18601 |
//! | `NODE_FEED_URL` | unset |
//! | `NODE_FEED_PATH` | `data/sample_nodes.json` |
//! | `NODE_FEED_REFRESH_SECS` | 0 (no re-poll) |
//! | `NODE_FEED_TIMEOUT_SECS` | 10 |
//! | `ALLOCATOR_URL` | `http://127.0.0.1:8000/handlereq` |
//! | `ALLOCATOR_TIMEOUT_SECS` | 30 |
//! | `SIM_UPDATE_INTERVAL_SECS` | 0.2 |
//! | `SIM_SPEED_UP` | 1 |
//! | `SIM_FRAME_MILLIS` | 50 |
//! | `AUTO_GENERATE` | false |
//! | `AUTO_GENERATE_SECS` | 3 |
//! | `AUTO_CLASS_POLICY` | `sampled` |

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{bail, Context};
use network_topology::ClockConfig;

use crate::node_feed::NodeFeedSource;
use crate::sim_state::AutoClassPolicy;

pub const DEFAULT_PORT: u16 = 18601;
pub const DEFAULT_NODE_FEED_PATH: &str = "data/sample_nodes.json";
pub const DEFAULT_ALLOCATOR_URL: &str = "http://127.0.0.1:8000/handlereq";

#[derive(Debug, Clone)]
pub struct GatewayConfig {
    pub port: u16,
    pub node_feed: NodeFeedSource,
    pub node_feed_refresh: Option<Duration>,
    pub node_feed_timeout: Duration,
    pub allocator_url: String,
    pub allocator_timeout: Duration,
    pub clock: ClockConfig,
    pub frame_interval: Duration,
    pub auto_generate: bool,
    pub auto_generate_interval: Duration,
    pub auto_class_policy: AutoClassPolicy,
}

impl GatewayConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup. Unparseable values are errors, not defaults.
    pub fn from_lookup(get: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let port = match get("GATEWAY_PORT").or_else(|| get("PORT")) {
            Some(p) => p.trim().parse().with_context(|| format!("invalid port {:?}", p))?,
            None => DEFAULT_PORT,
        };

        let node_feed = match (get("NODE_FEED_URL"), get("NODE_FEED_PATH")) {
            (Some(url), _) if !url.trim().is_empty() => NodeFeedSource::Url(url),
            (_, Some(path)) if !path.trim().is_empty() => NodeFeedSource::File(PathBuf::from(path)),
            _ => NodeFeedSource::File(PathBuf::from(DEFAULT_NODE_FEED_PATH)),
        };

        let refresh_secs: u64 = parse_or(&get, "NODE_FEED_REFRESH_SECS", 0)?;
        let node_feed_refresh = (refresh_secs > 0).then(|| Duration::from_secs(refresh_secs));
        let feed_timeout_secs: u64 = parse_or(&get, "NODE_FEED_TIMEOUT_SECS", 10)?;
        if feed_timeout_secs == 0 {
            bail!("NODE_FEED_TIMEOUT_SECS must be positive");
        }

        let allocator_url = get("ALLOCATOR_URL").unwrap_or_else(|| DEFAULT_ALLOCATOR_URL.to_string());
        let allocator_timeout = Duration::from_secs(parse_or(&get, "ALLOCATOR_TIMEOUT_SECS", 30)?);

        let clock = ClockConfig {
            update_interval_s: parse_or(&get, "SIM_UPDATE_INTERVAL_SECS", 0.2)?,
            speed_up: parse_or(&get, "SIM_SPEED_UP", 1.0)?,
        };
        clock.validate()?;

        let frame_millis: u64 = parse_or(&get, "SIM_FRAME_MILLIS", 50)?;
        if frame_millis == 0 {
            bail!("SIM_FRAME_MILLIS must be positive");
        }

        let auto_generate = match get("AUTO_GENERATE") {
            Some(v) => parse_bool(&v).with_context(|| format!("invalid AUTO_GENERATE {:?}", v))?,
            None => false,
        };
        let auto_secs: u64 = parse_or(&get, "AUTO_GENERATE_SECS", 3)?;
        if auto_secs == 0 {
            bail!("AUTO_GENERATE_SECS must be positive");
        }

        let auto_class_policy = match get("AUTO_CLASS_POLICY") {
            Some(v) => v.parse()?,
            None => AutoClassPolicy::default(),
        };

        Ok(Self {
            port,
            node_feed,
            node_feed_refresh,
            node_feed_timeout: Duration::from_secs(feed_timeout_secs),
            allocator_url,
            allocator_timeout,
            clock,
            frame_interval: Duration::from_millis(frame_millis),
            auto_generate,
            auto_generate_interval: Duration::from_secs(auto_secs),
            auto_class_policy,
        })
    }
}

fn parse_or<T>(get: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> anyhow::Result<T>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match get(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|e| anyhow::anyhow!("invalid {} {:?}: {}", key, raw, e)),
        None => Ok(default),
    }
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
