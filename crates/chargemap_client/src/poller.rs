use std::sync::{Arc, Mutex};
use std::time::Duration;

use chargemap_session::{RefreshOutcome, SessionState};
use tokio::time::MissedTickBehavior;

use crate::search::{SearchError, StationSearch};

/// Session state as shared between the UI thread, the poller and the push
/// pump. Locked per event, never across an await.
pub type SharedSession = Arc<Mutex<SessionState>>;

/// Periodic full-refresh loop for the current search context.
///
/// The poller owns no failure state: a failed fetch is logged and retried on
/// the next tick, leaving the session's last good list in place. A fetch
/// that completes after the search context changed is dropped by the
/// session's ticket check.
pub struct Poller<S> {
    search: S,
    session: SharedSession,
    period: Duration,
}

impl<S: StationSearch> Poller<S> {
    pub fn new(search: S, session: SharedSession, period: Duration) -> Self {
        Poller {
            search,
            session,
            period,
        }
    }

    /// Run one refresh cycle; `Ok(None)` when no search is active.
    pub async fn poll_once(&self) -> Result<Option<RefreshOutcome>, SearchError> {
        let Some(ticket) = self.session.lock().unwrap().current_ticket() else {
            return Ok(None);
        };

        let response = self.search.nearby(ticket.context()).await?;

        let outcome = self
            .session
            .lock()
            .unwrap()
            .complete_refresh(&ticket, response.stations);
        Ok(Some(outcome))
    }

    /// Refresh on an interval until the task is dropped. The first cycle
    /// runs immediately.
    pub async fn run(&self) {
        let mut interval = tokio::time::interval(self.period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            interval.tick().await;
            match self.poll_once().await {
                Ok(Some(RefreshOutcome::Applied)) => {
                    let counts = self.session.lock().unwrap().status_counts();
                    tracing::info!(
                        total = counts.total,
                        available = counts.available,
                        busy = counts.busy,
                        out_of_order = counts.out_of_order,
                        unknown = counts.unknown,
                        "Station list refreshed"
                    );
                }
                Ok(Some(RefreshOutcome::Stale)) => {
                    tracing::debug!("Refresh superseded by a newer search");
                }
                Ok(None) => {
                    tracing::debug!("No active search, skipping refresh");
                }
                Err(error) => {
                    tracing::warn!(%error, "Station refresh failed, retrying on next tick");
                }
            }
        }
    }
}
