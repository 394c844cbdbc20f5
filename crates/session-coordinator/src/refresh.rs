//! Token refresh scheduling.
//!
//! Three triggers funnel into one verification routine: a periodic ticker,
//! a visibility restore after a long absence, and a focus regain after a
//! long blur. The in-flight guard makes the triggers mutually exclusive.

use crate::environment::EnvironmentSignal;
use crate::ports::ProviderHandle;
use crate::state::SharedState;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, info, warn};

/// Timing knobs for session verification.
#[derive(Debug, Clone, Copy)]
pub struct RefreshConfig {
    /// Interval of the periodic verification ticker.
    pub tick_interval: Duration,
    /// Refresh proactively when the token expires within this many seconds.
    pub refresh_threshold_secs: i64,
    /// Verify on visibility restore only after being hidden this long.
    pub visible_stale_after: Duration,
    /// Verify on focus regain only after being blurred this long.
    pub focus_stale_after: Duration,
}

impl Default for RefreshConfig {
    fn default() -> Self {
        Self {
            tick_interval: Duration::from_secs(600),
            refresh_threshold_secs: 300,
            visible_stale_after: Duration::from_secs(60),
            focus_stale_after: Duration::from_secs(30),
        }
    }
}

/// Verify the held session against the provider and renew it if it is close
/// to expiry.
///
/// Returns `true` when a valid session is held afterwards. A missing or
/// unrefreshable session forces a sign-out and returns `false`. Returns
/// `false` without doing anything when another verification is in flight.
pub(crate) async fn verify_and_renew(
    config: &RefreshConfig,
    state: &Arc<SharedState>,
    provider: &ProviderHandle,
) -> bool {
    let _permit = match state.refresh_guard.try_acquire() {
        Some(permit) => permit,
        None => {
            debug!("Session verification already in flight; skipping");
            return false;
        }
    };

    let session = match provider.current_session().await {
        Some(session) => session,
        None => {
            info!("Provider reports no session; signing out");
            force_sign_out(state, provider).await;
            return false;
        }
    };

    let remaining = session.remaining_secs(chrono::Utc::now().timestamp());
    if remaining < config.refresh_threshold_secs {
        debug!(remaining, "Token near expiry; refreshing");
        match provider.refresh_session().await {
            Ok(fresh) => {
                state.set_session(fresh).await;
                true
            }
            Err(err) => {
                warn!(error = %err, "Token refresh failed; signing out");
                force_sign_out(state, provider).await;
                false
            }
        }
    } else {
        // Plenty of time left; opportunistically pick up identity changes.
        state.set_session(session).await;
        if let Ok(user) = provider.get_user().await {
            state.update_user(user).await;
        }
        true
    }
}

/// Sign out at the provider (best-effort) and clear local identity state.
pub(crate) async fn force_sign_out(state: &Arc<SharedState>, provider: &ProviderHandle) {
    if let Err(err) = provider.sign_out().await {
        warn!(error = %err, "Provider sign-out failed; clearing local state anyway");
    }
    state.clear_identity_state().await;
}

/// Background task driving periodic and environment-triggered verification.
pub(crate) struct TokenRefreshScheduler {
    pub(crate) config: RefreshConfig,
    pub(crate) state: Arc<SharedState>,
    pub(crate) provider: ProviderHandle,
}

impl TokenRefreshScheduler {
    /// Spawn the scheduler loop. It runs until the signal channel closes or
    /// the task is aborted at teardown.
    pub(crate) fn spawn(self, mut signals: mpsc::Receiver<EnvironmentSignal>) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(self.config.tick_interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            // interval fires immediately; the startup path already verified.
            ticker.tick().await;

            let mut visible = true;

            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        if !self.state.is_mounted() {
                            break;
                        }
                        if visible && self.state.session().await.is_some() {
                            verify_and_renew(&self.config, &self.state, &self.provider).await;
                        }
                    }
                    signal = signals.recv() => {
                        let Some(signal) = signal else { break };
                        if !self.state.is_mounted() {
                            break;
                        }
                        match signal {
                            EnvironmentSignal::BecameHidden => {
                                visible = false;
                                self.state.mark_hidden(Instant::now()).await;
                            }
                            EnvironmentSignal::FocusLost => {
                                self.state.mark_blurred(Instant::now()).await;
                            }
                            EnvironmentSignal::BecameVisible => {
                                visible = true;
                                if let Some(hidden_at) = self.state.take_hidden().await {
                                    if hidden_at.elapsed() > self.config.visible_stale_after
                                        && self.state.session().await.is_some()
                                    {
                                        debug!("Visible after long absence; verifying session");
                                        verify_and_renew(&self.config, &self.state, &self.provider)
                                            .await;
                                    }
                                }
                            }
                            EnvironmentSignal::FocusGained => {
                                if let Some(blurred_at) = self.state.take_blurred().await {
                                    if blurred_at.elapsed() > self.config.focus_stale_after
                                        && self.state.session().await.is_some()
                                    {
                                        debug!("Focus after long blur; verifying session");
                                        verify_and_renew(&self.config, &self.state, &self.provider)
                                            .await;
                                    }
                                }
                            }
                        }
                    }
                }
            }
        })
    }
}
