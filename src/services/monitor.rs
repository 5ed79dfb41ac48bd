//! Per-tenant instance health monitor.
//!
//! Each tenant's dashboard shows two independent signals: the aggregate
//! health of its backing containers (from the management API) and the
//! reachability of its public site (a direct HTTP probe). A background
//! watcher task per tenant refreshes both every poll cycle and publishes the
//! result through a watch channel; snapshots are served from the latest
//! published view. The two signals are deliberately kept separate, since a
//! container can report "up" while the site is still unreachable.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tokio::sync::{watch, Notify};
use tokio::time::{interval, MissedTickBehavior};

use crate::config::CONFIG;
use crate::services::management::{ContainerStatus, ManagementClient};
use crate::services::security;

const POLL_INTERVAL: Duration = Duration::from_secs(5);
const PROBE_TIMEOUT: Duration = Duration::from_secs(5);
/// How long a watcher keeps polling after the last snapshot was requested.
const IDLE_GRACE: Duration = Duration::from_secs(30);
/// Lifetime of the per-cycle token minted for management API calls.
const POLL_TOKEN_EXPIRE: i64 = 60;

/// Aggregate container health of a tenant instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InstanceStatus {
    Running,
    Degraded,
    Stopped,
    Restarting,
}

impl InstanceStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            InstanceStatus::Running => "running",
            InstanceStatus::Degraded => "degraded",
            InstanceStatus::Stopped => "stopped",
            InstanceStatus::Restarting => "restarting",
        }
    }

    /// Parse a persisted status label, falling back to `stopped`.
    pub fn parse(value: &str) -> Self {
        match value {
            "running" => InstanceStatus::Running,
            "degraded" => InstanceStatus::Degraded,
            "restarting" => InstanceStatus::Restarting,
            _ => InstanceStatus::Stopped,
        }
    }
}

/// Reachability of a tenant's public site.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SiteStatus {
    Online,
    Offline,
    Checking,
}

/// Latest reconciled view of a tenant instance. `containers` and `site` are
/// independent last-write-wins fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InstanceView {
    pub containers: InstanceStatus,
    pub site: SiteStatus,
    pub checked_at: Option<DateTime<Utc>>,
}

/// Fold a container list into one aggregate label.
///
/// All containers up means the instance runs; a strict subset up means it
/// runs degraded; an empty list or no healthy container means stopped.
pub fn aggregate_status(statuses: &[ContainerStatus]) -> InstanceStatus {
    if statuses.is_empty() {
        return InstanceStatus::Stopped;
    }

    let up = statuses.iter().filter(|s| s.status == "up").count();
    if up == statuses.len() {
        InstanceStatus::Running
    } else if up > 0 {
        InstanceStatus::Degraded
    } else {
        InstanceStatus::Stopped
    }
}

/// Probe a URL and classify the site as online or offline.
///
/// Any non-2xx answer, network error or timeout is offline; health is never
/// assumed on failure. The client's own timeout bounds the wait.
pub async fn probe_site(client: &Client, url: &str) -> SiteStatus {
    match client.get(url).send().await {
        Ok(response) if response.status().is_success() => SiteStatus::Online,
        _ => SiteStatus::Offline,
    }
}

struct WatcherHandle {
    view: watch::Receiver<InstanceView>,
    wake: Arc<Notify>,
    last_seen: Arc<Mutex<Instant>>,
}

/// Registry of per-tenant watcher tasks.
#[derive(Clone)]
pub struct InstanceMonitor {
    management: ManagementClient,
    probe: Client,
    watchers: Arc<Mutex<HashMap<i64, WatcherHandle>>>,
}

impl InstanceMonitor {
    #[allow(clippy::expect_used)]
    pub fn new(management: ManagementClient) -> Self {
        Self {
            management,
            probe: Client::builder()
                .timeout(PROBE_TIMEOUT)
                .build()
                .expect("Failed to create HTTP client"),
            watchers: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Current view for a tenant, starting its watcher on first use.
    ///
    /// The first snapshot carries the persisted deployment status as fallback
    /// until the watcher has completed a poll cycle.
    pub fn snapshot(&self, enterprise_id: i64, app_port: i32, fallback: InstanceStatus) -> InstanceView {
        let mut watchers = self.watchers.lock();

        if let Some(handle) = watchers.get(&enterprise_id) {
            *handle.last_seen.lock() = Instant::now();
            return handle.view.borrow().clone();
        }

        let initial = InstanceView {
            containers: fallback,
            site: SiteStatus::Checking,
            checked_at: None,
        };

        let (tx, rx) = watch::channel(initial.clone());
        let wake = Arc::new(Notify::new());
        let last_seen = Arc::new(Mutex::new(Instant::now()));

        watchers.insert(
            enterprise_id,
            WatcherHandle {
                view: rx,
                wake: wake.clone(),
                last_seen: last_seen.clone(),
            },
        );

        let monitor = self.clone();
        tokio::spawn(async move {
            monitor
                .run_watcher(enterprise_id, app_port, tx, wake, last_seen)
                .await;
        });

        initial
    }

    /// Trigger one immediate off-cycle poll, so deploy/stop feedback does not
    /// wait for the next scheduled tick.
    pub fn poke(&self, enterprise_id: i64) {
        if let Some(handle) = self.watchers.lock().get(&enterprise_id) {
            handle.wake.notify_one();
        }
    }

    /// One-off reachability probe of an arbitrary URL.
    pub async fn probe_url(&self, url: &str) -> SiteStatus {
        probe_site(&self.probe, url).await
    }

    async fn run_watcher(
        self,
        enterprise_id: i64,
        app_port: i32,
        tx: watch::Sender<InstanceView>,
        wake: Arc<Notify>,
        last_seen: Arc<Mutex<Instant>>,
    ) {
        let site_url = format!("http://{}:{}", CONFIG.monitor.instance_host, app_port);

        // Polls run strictly one at a time; a cycle slower than the interval
        // drops ticks instead of piling up concurrent requests.
        let mut ticker = interval(POLL_INTERVAL);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        tracing::debug!(enterprise_id, app_port, "instance watcher started");

        loop {
            tokio::select! {
                _ = ticker.tick() => {}
                _ = wake.notified() => {}
            }

            if last_seen.lock().elapsed() > IDLE_GRACE {
                self.watchers.lock().remove(&enterprise_id);
                tracing::debug!(enterprise_id, "instance watcher idle, stopping");
                return;
            }

            // Both checks run concurrently and fail independently.
            let (containers, site) = tokio::join!(
                self.fetch_aggregate(enterprise_id),
                probe_site(&self.probe, &site_url),
            );

            tx.send_modify(|view| {
                view.containers = containers;
                view.checked_at = Some(Utc::now());
            });
            tx.send_modify(|view| view.site = site);
        }
    }

    /// Poll the management API and fold the result. Poll failures are not
    /// surfaced to callers; the state shows as stopped until a poll succeeds.
    async fn fetch_aggregate(&self, enterprise_id: i64) -> InstanceStatus {
        let token = match security::create_access_token(
            &enterprise_id.to_string(),
            None,
            Some(POLL_TOKEN_EXPIRE),
        ) {
            Ok(token) => token,
            Err(e) => {
                tracing::warn!(error = %e, "could not mint a status token");
                return InstanceStatus::Stopped;
            }
        };

        match self
            .management
            .container_statuses(enterprise_id, &token)
            .await
        {
            Ok(statuses) => aggregate_status(&statuses),
            Err(e) => {
                tracing::debug!(enterprise_id, error = %e, "status poll failed");
                InstanceStatus::Stopped
            }
        }
    }
}
