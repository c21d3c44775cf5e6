//! # Token Refresher
//!
//! Background task that keeps the partner access token fresh.
//!
//! ## Loop
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       Refresh Cycle                                     │
//! │                                                                         │
//! │   ┌──────────────┐  absent or stale   ┌────────────────┐               │
//! │   │ Check token  │───────────────────►│ POST /auth     │◄──────┐       │
//! │   └──────▲───────┘                    └───────┬────────┘       │       │
//! │          │ fresh                              │                │       │
//! │          │                 ┌──────────────────┼──────────┐     │       │
//! │          │                 │ 201              │ 400      │ other       │
//! │          │                 ▼                  ▼          ▼     │       │
//! │          │          store + persist    sleep backoff   log     │       │
//! │          │                 │           (1s, 2s, 4s…)───┼───────┘       │
//! │          │                 ▼                           │               │
//! │   ┌──────┴───────┐◄────────────────────────────────────┘               │
//! │   │ sleep check  │                                                      │
//! │   │ interval     │                                                      │
//! │   └──────────────┘                                                      │
//! │                                                                         │
//! │  Fatal (task ends): 201 without a usable token, or token file failure  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Freshness is judged against the wall clock (`chrono`), sleeps against the
//! tokio clock.

use std::convert::Infallible;
use std::sync::Arc;
use std::time::Duration;

use backoff::backoff::Backoff;
use backoff::ExponentialBackoff;
use catalog_core::AccessToken;
use chrono::Utc;
use serde::Deserialize;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::config::PartnerConfig;
use crate::error::{SyncError, SyncResult};
use crate::partner::PartnerApi;
use crate::token::TokenStore;

/// Status the partner uses to ask for a retry.
const RETRY_STATUS: u16 = 400;

/// Status of a successful token issue.
const CREATED_STATUS: u16 = 201;

// =============================================================================
// Settings
// =============================================================================

/// Timing of the refresh loop.
#[derive(Debug, Clone)]
pub struct RefreshSettings {
    /// Sleep between checks.
    pub check_interval: Duration,

    /// Maximum age of a token that is not refreshed.
    pub freshness: chrono::Duration,

    /// First delay after a 400.
    pub initial_backoff: Duration,

    /// Cap on the delay after repeated 400s.
    pub max_backoff: Duration,
}

impl Default for RefreshSettings {
    fn default() -> Self {
        Self {
            check_interval: Duration::from_secs(300),
            freshness: chrono::Duration::minutes(5),
            initial_backoff: Duration::from_secs(1),
            max_backoff: Duration::from_secs(60),
        }
    }
}

impl RefreshSettings {
    pub fn from_config(config: &PartnerConfig) -> Self {
        Self {
            check_interval: config.check_interval(),
            freshness: config.freshness(),
            initial_backoff: config.initial_backoff(),
            max_backoff: config.max_backoff(),
        }
    }
}

/// Result of one refresh attempt that did not stop the loop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RefreshOutcome {
    /// A new token is stored.
    Refreshed,

    /// The partner answered with a status other than 201 or 400, or with a
    /// 201 that carried no token.
    NotAcquired { status: u16 },

    /// No response from the partner.
    Unreachable { reason: String },
}

#[derive(Debug, Deserialize)]
struct AuthResponse {
    #[serde(default)]
    access_token: Option<String>,
}

// =============================================================================
// Refresher
// =============================================================================

/// Owns the [`TokenStore`] and keeps its token fresh.
pub struct TokenRefresher {
    partner: Arc<dyn PartnerApi>,
    store: TokenStore,
    refresh_credential: String,
    settings: RefreshSettings,
}

impl TokenRefresher {
    pub fn new(
        partner: Arc<dyn PartnerApi>,
        store: TokenStore,
        refresh_credential: impl Into<String>,
        settings: RefreshSettings,
    ) -> Self {
        Self {
            partner,
            store,
            refresh_credential: refresh_credential.into(),
            settings,
        }
    }

    /// Spawns [`run`](Self::run) on the runtime.
    ///
    /// A fatal error is logged by the task before it ends.
    pub fn spawn(self) -> RefresherHandle {
        let task = tokio::spawn(async move {
            match self.run().await {
                Ok(never) => match never {},
                Err(e) => error!(error = %e, "Token refresher stopped"),
            }
        });
        RefresherHandle { task }
    }

    /// Runs the refresh loop until a fatal error.
    pub async fn run(self) -> SyncResult<Infallible> {
        info!(
            check_interval_secs = self.settings.check_interval.as_secs(),
            freshness_secs = self.settings.freshness.num_seconds(),
            "Token refresher started"
        );

        loop {
            if self.needs_refresh() {
                self.refresh().await?;
            } else {
                debug!("Access token still fresh");
            }

            tokio::time::sleep(self.settings.check_interval).await;
        }
    }

    /// Checks if the stored token is absent or stale.
    pub fn needs_refresh(&self) -> bool {
        match self.store.current() {
            Some(token) => !token.is_fresh_at(self.settings.freshness, Utc::now()),
            None => true,
        }
    }

    /// Performs one refresh, retrying while the partner answers 400.
    ///
    /// ## Errors
    /// Only fatal errors: `InvalidAuthResponse` and `TokenPersist`.
    pub async fn refresh(&self) -> SyncResult<RefreshOutcome> {
        let mut backoff = self.create_backoff();
        let mut attempt: u32 = 1;

        loop {
            let response = match self.partner.authenticate(&self.refresh_credential).await {
                Ok(response) => response,
                Err(e) => {
                    warn!(attempt, error = %e, "Token refresh request failed");
                    return Ok(RefreshOutcome::Unreachable {
                        reason: e.to_string(),
                    });
                }
            };

            match response.status() {
                CREATED_STATUS => {
                    let body: AuthResponse = response.json().map_err(|e| {
                        error!(error = %e, "Partner issued an unreadable token response");
                        SyncError::InvalidAuthResponse(e.to_string())
                    })?;

                    let Some(token) = body.access_token.filter(|t| !t.is_empty()) else {
                        warn!(attempt, "Token response carried no access token");
                        return Ok(RefreshOutcome::NotAcquired {
                            status: CREATED_STATUS,
                        });
                    };

                    self.store
                        .replace(AccessToken::new(token))
                        .await
                        .inspect_err(|e| error!(error = %e, "Failed to persist access token"))?;

                    info!(attempt, "Access token refreshed");
                    return Ok(RefreshOutcome::Refreshed);
                }
                RETRY_STATUS => {
                    let delay = backoff.next_backoff().unwrap_or(self.settings.max_backoff);
                    warn!(
                        attempt,
                        delay_ms = delay.as_millis() as u64,
                        "Partner rejected token request, backing off"
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                status => {
                    warn!(status, attempt, "Access token not acquired");
                    return Ok(RefreshOutcome::NotAcquired { status });
                }
            }
        }
    }

    /// Doubling backoff with no jitter and no total time limit.
    fn create_backoff(&self) -> ExponentialBackoff {
        ExponentialBackoff {
            current_interval: self.settings.initial_backoff,
            initial_interval: self.settings.initial_backoff,
            max_interval: self.settings.max_backoff,
            multiplier: 2.0,
            randomization_factor: 0.0,
            max_elapsed_time: None,
            ..Default::default()
        }
    }
}

// =============================================================================
// Handle
// =============================================================================

/// Handle to the spawned refresher task.
#[derive(Debug)]
pub struct RefresherHandle {
    task: JoinHandle<()>,
}

impl RefresherHandle {
    /// Checks if the refresher task is still alive.
    pub fn is_running(&self) -> bool {
        !self.task.is_finished()
    }

    /// Stops the refresher.
    pub fn abort(&self) {
        self.task.abort();
    }
}

impl Drop for RefresherHandle {
    fn drop(&mut self) {
        self.task.abort();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::ServiceResponse;
    use crate::testing::ScriptedPartner;
    use serde_json::json;

    fn token_response() -> SyncResult<ServiceResponse> {
        Ok(ServiceResponse::json_body(201, &json!({"access_token": "fresh"})))
    }

    fn status(code: u16) -> SyncResult<ServiceResponse> {
        Ok(ServiceResponse::new(code, ""))
    }

    fn refresher(partner: Arc<ScriptedPartner>, store: TokenStore) -> TokenRefresher {
        TokenRefresher::new(partner, store, "refresh-credential", RefreshSettings::default())
    }

    #[tokio::test(start_paused = true)]
    async fn test_backs_off_on_400_then_stores_token() {
        let partner = Arc::new(ScriptedPartner::default());
        partner.push_auth(status(400));
        partner.push_auth(status(400));
        partner.push_auth(token_response());

        let store = TokenStore::in_memory();
        let reader = store.reader();
        let refresher = refresher(partner.clone(), store);

        let outcome = refresher.refresh().await.unwrap();

        assert_eq!(outcome, RefreshOutcome::Refreshed);
        assert_eq!(reader.bearer().as_deref(), Some("fresh"));

        let times = partner.call_times("auth");
        assert_eq!(times.len(), 3);
        let first_gap = times[1] - times[0];
        let second_gap = times[2] - times[1];
        assert!(first_gap >= Duration::from_secs(1) && first_gap < Duration::from_millis(1010));
        assert!(second_gap >= Duration::from_secs(2) && second_gap < Duration::from_millis(2010));
    }

    #[tokio::test(start_paused = true)]
    async fn test_sends_refresh_credential() {
        let partner = Arc::new(ScriptedPartner::default());
        partner.push_auth(token_response());

        refresher(partner.clone(), TokenStore::in_memory())
            .refresh()
            .await
            .unwrap();

        assert_eq!(partner.tokens_used("auth"), vec!["refresh-credential"]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_other_status_leaves_token_untouched() {
        let partner = Arc::new(ScriptedPartner::default());
        partner.push_auth(status(500));

        let store = TokenStore::in_memory();
        let reader = store.reader();
        let outcome = refresher(partner.clone(), store).refresh().await.unwrap();

        assert_eq!(outcome, RefreshOutcome::NotAcquired { status: 500 });
        assert!(reader.bearer().is_none());
        assert_eq!(partner.call_times("auth").len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_transport_failure_is_not_fatal() {
        let partner = Arc::new(ScriptedPartner::default());
        partner.push_auth(Err(SyncError::Transport("connection refused".into())));

        let outcome = refresher(partner, TokenStore::in_memory())
            .refresh()
            .await
            .unwrap();

        assert!(matches!(outcome, RefreshOutcome::Unreachable { .. }));
    }

    #[tokio::test(start_paused = true)]
    async fn test_undecodable_token_response_is_fatal() {
        let partner = Arc::new(ScriptedPartner::default());
        partner.push_auth(Ok(ServiceResponse::new(201, "not json")));

        let err = refresher(partner, TokenStore::in_memory())
            .run()
            .await
            .unwrap_err();

        assert!(matches!(err, SyncError::InvalidAuthResponse(_)));
        assert!(err.is_fatal());
    }

    #[tokio::test(start_paused = true)]
    async fn test_created_without_token_waits_for_next_check() {
        let partner = Arc::new(ScriptedPartner::default());
        partner.push_auth(Ok(ServiceResponse::json_body(201, &json!({"token": "x"}))));
        partner.push_auth(Ok(ServiceResponse::json_body(201, &json!({"access_token": ""}))));
        partner.push_auth(token_response());

        let store = TokenStore::in_memory();
        let reader = store.reader();
        let refresher = refresher(partner.clone(), store);

        assert_eq!(
            refresher.refresh().await.unwrap(),
            RefreshOutcome::NotAcquired { status: 201 }
        );
        assert!(reader.bearer().is_none());

        let run = refresher.run();
        let _ = tokio::time::timeout(Duration::from_secs(301), run).await;

        assert_eq!(reader.bearer().as_deref(), Some("fresh"));
        let times = partner.call_times("auth");
        assert_eq!(times.len(), 3);
        assert!(times[2] - times[1] >= Duration::from_secs(300));
    }

    #[tokio::test(start_paused = true)]
    async fn test_loop_retries_at_each_check_while_unacquired() {
        let partner = Arc::new(ScriptedPartner::default());
        // No scripted responses: every call answers 500.
        let run = refresher(partner.clone(), TokenStore::in_memory()).run();

        let result = tokio::time::timeout(Duration::from_secs(601), run).await;

        assert!(result.is_err(), "refresher must keep running");
        assert_eq!(partner.call_times("auth").len(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_loop_skips_fresh_token() {
        let partner = Arc::new(ScriptedPartner::default());
        partner.push_auth(token_response());
        let run = refresher(partner.clone(), TokenStore::in_memory()).run();

        // Wall-clock age stays near zero while tokio time is paused.
        let _ = tokio::time::timeout(Duration::from_secs(901), run).await;

        assert_eq!(partner.call_times("auth").len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stale_loaded_token_is_refreshed() {
        let partner = Arc::new(ScriptedPartner::default());
        partner.push_auth(token_response());

        let stale = AccessToken {
            token: "old".to_string(),
            acquired_at: Utc::now() - chrono::Duration::minutes(10),
        };
        let refresher = refresher(partner, TokenStore::with_token(stale));

        assert!(refresher.needs_refresh());
        refresher.refresh().await.unwrap();
        assert!(!refresher.needs_refresh());
    }

    #[tokio::test(start_paused = true)]
    async fn test_spawned_refresher_reports_stopped_after_fatal_error() {
        let partner = Arc::new(ScriptedPartner::default());
        partner.push_auth(Ok(ServiceResponse::new(201, "not json")));

        let handle = refresher(partner, TokenStore::in_memory()).spawn();

        for _ in 0..100 {
            if !handle.is_running() {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        assert!(!handle.is_running());
    }

    #[test]
    fn test_backoff_doubles_and_caps() {
        let settings = RefreshSettings {
            max_backoff: Duration::from_secs(5),
            ..RefreshSettings::default()
        };
        let refresher = TokenRefresher::new(
            Arc::new(ScriptedPartner::default()),
            TokenStore::in_memory(),
            "c",
            settings,
        );
        let mut backoff = refresher.create_backoff();

        let delays: Vec<u64> = (0..5)
            .map(|_| backoff.next_backoff().unwrap().as_secs())
            .collect();
        assert_eq!(delays, vec![1, 2, 4, 5, 5]);
    }
}
