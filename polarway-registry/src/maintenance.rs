//! Maintenance scheduler for optional background tasks
//!
//! Session expiry is lazy: a token is checked against its deadline only
//! when presented. Expired sessions therefore stay on disk until logout or
//! until this scheduler's sweep removes them. The sweep is off unless a
//! `sweep_interval` is configured, and it goes through the auth actor like
//! any other mutation.

use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::{error, info, warn};

use crate::auth::AuthHandle;
use crate::config::RegistryConfig;
use crate::error::Result;

/// Background maintenance scheduler
pub struct MaintenanceScheduler {
    auth: AuthHandle,
    handles: Vec<JoinHandle<()>>,
}

impl MaintenanceScheduler {
    /// Create a new scheduler tied to the auth actor
    pub fn new(auth: AuthHandle) -> Self {
        Self {
            auth,
            handles: Vec::new(),
        }
    }

    /// Start every task the config enables
    pub fn start(&mut self, config: &RegistryConfig) {
        match config.sweep_interval {
            Some(interval) => {
                self.start_session_sweep(interval);
                info!(interval_secs = interval.as_secs(), "Maintenance scheduler started");
            }
            None => info!("Session sweep disabled, expiry is lazy only"),
        }
    }

    /// Start periodic expired session sweep
    pub fn start_session_sweep(&mut self, interval: Duration) {
        if interval.is_zero() {
            warn!("Session sweep interval is zero, sweep not started");
            return;
        }
        let auth = self.auth.clone();
        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            loop {
                ticker.tick().await;
                if let Err(e) = Self::run_once(&auth).await {
                    error!(error = ?e, "Session sweep failed");
                }
            }
        });
        self.handles.push(handle);
    }

    /// Run a one-shot sweep (useful for CLI or tests)
    pub async fn run_once(auth: &AuthHandle) -> Result<usize> {
        let purged = auth.purge_expired().await?;
        if purged > 0 {
            info!(purged, "Cleaned expired sessions");
        }
        Ok(purged)
    }

    /// Stop all background tasks
    pub fn stop(&mut self) {
        for handle in self.handles.drain(..) {
            handle.abort();
        }
    }
}

impl Drop for MaintenanceScheduler {
    fn drop(&mut self) {
        self.stop();
    }
}
