/// Server discovery: a pluggable boundary with a best-effort probe sweep
/// as the default implementation.
use crate::api::PlexApi;
use crate::models::{Connection, Server};
use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use futures::future::join_all;
use std::sync::Arc;
use std::time::Duration;
use url::Url;

/// Fallback probe targets for installs without a configured server.
/// A stand-in for real network discovery; callers with better knowledge
/// inject their own candidate list.
pub const DEFAULT_CANDIDATES: &[&str] = &[
    "http://192.168.1.100:32400",
    "http://192.168.1.101:32400",
    "http://192.168.0.100:32400",
    "http://10.0.0.100:32400",
];

const PROBE_TIMEOUT: Duration = Duration::from_secs(2);

/// Trait for anything that can produce a list of reachable servers
#[async_trait]
pub trait ServerDiscovery: Send + Sync {
    /// Best-effort sweep: partial results are acceptable, failures are
    /// skipped rather than reported.
    async fn discover(&self) -> Vec<Server>;
}

/// Probes a fixed candidate list for a server identity endpoint. Every
/// probe runs concurrently with a short timeout; anything that does not
/// answer 200 with a parseable identity is dropped.
pub struct ProbeDiscovery {
    api: Arc<PlexApi>,
    candidates: Vec<String>,
    timeout: Duration,
}

impl ProbeDiscovery {
    pub fn new(api: Arc<PlexApi>) -> Self {
        Self {
            api,
            candidates: DEFAULT_CANDIDATES.iter().map(|c| c.to_string()).collect(),
            timeout: PROBE_TIMEOUT,
        }
    }

    pub fn with_candidates(mut self, candidates: Vec<String>) -> Self {
        self.candidates = candidates;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

#[async_trait]
impl ServerDiscovery for ProbeDiscovery {
    async fn discover(&self) -> Vec<Server> {
        let probes = self
            .candidates
            .iter()
            .map(|candidate| self.api.identity(candidate, self.timeout));

        join_all(probes)
            .await
            .into_iter()
            .zip(&self.candidates)
            .filter_map(|(result, candidate)| match result {
                Ok(server) => Some(server),
                Err(e) => {
                    tracing::debug!("no server at {candidate}: {e}");
                    None
                }
            })
            .collect()
    }
}

/// Build a server entry from a user-supplied URL. Identity and version
/// stay at placeholder values until a later details refresh backfills
/// them.
pub fn manual_server(input: &str) -> Result<Server> {
    let parsed = Url::parse(input).with_context(|| format!("invalid server url: {input}"))?;
    if parsed.scheme() != "http" && parsed.scheme() != "https" {
        bail!("unsupported scheme {:?}, expected http or https", parsed.scheme());
    }
    let address = parsed
        .host_str()
        .context("server url has no host")?
        .to_string();
    let port = parsed.port().unwrap_or(32400);
    let uri = input.trim_end_matches('/').to_string();

    Ok(Server {
        id: "manual".to_string(),
        name: "Manual Server".to_string(),
        address: address.clone(),
        port,
        version: "Unknown".to_string(),
        access_token: None,
        local: true,
        connections: vec![Connection {
            protocol: parsed.scheme().to_string(),
            address,
            port,
            uri,
            local: true,
        }],
    })
}
