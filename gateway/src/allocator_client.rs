//! HTTP allocator client
//!
//! Each submission is posted from its own task; the answer (or a synthesized
//! failure when the HTTP exchange breaks) is pushed onto the results channel
//! that the result pump drains.

use std::time::Duration;

use anyhow::{bail, Result};
use request_lifecycle::{
    AllocationRequest, AllocationResult, AllocatorChannel, LifecycleError,
};
use tokio::sync::mpsc;
use tracing::{debug, warn};

pub struct HttpAllocator {
    client: reqwest::Client,
    url: String,
    results: mpsc::UnboundedSender<AllocationResult>,
}

impl HttpAllocator {
    pub fn new(
        url: impl Into<String>,
        timeout: Duration,
        results: mpsc::UnboundedSender<AllocationResult>,
    ) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("orbital-gateway/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self {
            client,
            url: url.into(),
            results,
        })
    }
}

impl AllocatorChannel for HttpAllocator {
    fn submit(&self, request: AllocationRequest) -> request_lifecycle::Result<()> {
        if self.results.is_closed() {
            return Err(LifecycleError::Transport("result channel closed".into()));
        }
        let runtime = tokio::runtime::Handle::try_current()
            .map_err(|e| LifecycleError::Transport(e.to_string()))?;

        let client = self.client.clone();
        let url = self.url.clone();
        let results = self.results.clone();

        runtime.spawn(async move {
            let result = match post(&client, &url, &request).await {
                Ok(result) => result,
                Err(e) => {
                    warn!("Allocator call for {} failed: {:#}", request.id, e);
                    AllocationResult::failed(request.id.clone())
                }
            };
            debug!("Allocator answered {} with {}", result.id, result.result);
            // receiver gone means shutdown
            let _ = results.send(result);
        });

        Ok(())
    }
}

async fn post(
    client: &reqwest::Client,
    url: &str,
    request: &AllocationRequest,
) -> Result<AllocationResult> {
    let response = client
        .post(url)
        .json(request)
        .send()
        .await?
        .error_for_status()?;
    let result: AllocationResult = response.json().await?;

    if result.id != request.id {
        bail!(
            "allocator answered for {} while {} was asked",
            result.id,
            request.id
        );
    }
    Ok(result)
}
