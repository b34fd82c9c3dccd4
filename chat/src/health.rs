use crate::api::ApiClient;
use std::sync::{Arc, RwLock};
use std::time::Duration;

const POLL_INTERVAL: Duration = Duration::from_secs(30);

/// Last known backend health. Stays at its previous value when a poll
/// fails, so the display can go stale but never flickers on transient
/// errors.
#[derive(Debug, Clone)]
pub struct HealthSnapshot {
    pub indicator: &'static str,
    pub documents_loaded: usize,
}

impl Default for HealthSnapshot {
    fn default() -> Self {
        Self {
            indicator: "unknown",
            documents_loaded: 0,
        }
    }
}

/// "connected" iff the backend reports a live watsonx connection.
pub fn indicator(watsonx_connected: bool) -> &'static str {
    if watsonx_connected {
        "connected"
    } else {
        "disconnected"
    }
}

/// Polls `/api/health` immediately and then every 30 seconds, forever.
/// Failures are logged and otherwise ignored.
pub struct HealthPoller {
    api: Arc<ApiClient>,
    snapshot: Arc<RwLock<HealthSnapshot>>,
}

impl HealthPoller {
    pub fn new(api: Arc<ApiClient>) -> Self {
        Self {
            api,
            snapshot: Arc::new(RwLock::new(HealthSnapshot::default())),
        }
    }

    pub fn snapshot(&self) -> HealthSnapshot {
        self.snapshot.read().unwrap().clone()
    }

    pub fn spawn(&self) -> tokio::task::JoinHandle<()> {
        let api = Arc::clone(&self.api);
        let snapshot = Arc::clone(&self.snapshot);

        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(POLL_INTERVAL);
            loop {
                ticker.tick().await;
                match api.health().await {
                    Ok(health) => {
                        *snapshot.write().unwrap() = HealthSnapshot {
                            indicator: indicator(health.watsonx_connected),
                            documents_loaded: health.documents_loaded,
                        };
                    }
                    Err(e) => {
                        log::debug!("Health check failed: {}", e);
                    }
                }
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn indicator_tracks_watsonx_flag() {
        assert_eq!(indicator(true), "connected");
        assert_eq!(indicator(false), "disconnected");
    }

    #[test]
    fn snapshot_starts_unknown() {
        let snapshot = HealthSnapshot::default();
        assert_eq!(snapshot.indicator, "unknown");
        assert_eq!(snapshot.documents_loaded, 0);
    }
}
