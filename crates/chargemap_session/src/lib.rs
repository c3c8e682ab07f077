mod listeners;

pub use crate::listeners::Subscription;

use std::collections::BTreeSet;

use chargemap_core::{
    SearchContext, Station, StationStatus, StationViewModel, StatusCounts, StatusPatch,
};

use crate::listeners::ListenerRegistry;

/// Change notification delivered to subscribed listeners after every
/// effective mutation of the session.
#[derive(Debug, Clone, PartialEq)]
pub enum ModelEvent {
    /// The station list was replaced by a completed refresh.
    ListReplaced { total: usize },
    /// A push patch changed one station's status.
    StatusChanged {
        station_id: String,
        status: StationStatus,
    },
    /// A station was added to or removed from the favorites.
    FavoritesChanged { station_id: String, favorite: bool },
    /// The session was torn down.
    Cleared,
}

/// What happened to a completed fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshOutcome {
    /// The fetch was for the current search context and replaced the list.
    Applied,
    /// The search context changed while the fetch was in flight; the result
    /// was dropped.
    Stale,
}

/// Tag handed out when a fetch starts, checked when it completes.
///
/// Overlapping fetches may finish in any order; only a ticket minted for the
/// current search context is allowed to replace the list ("last full refresh
/// wins").
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RefreshTicket {
    generation: u64,
    context: SearchContext,
}

impl RefreshTicket {
    pub fn context(&self) -> &SearchContext {
        &self.context
    }
}

/// Session-scoped station state: the view-model plus the current search
/// context, the favorites set, and the change listeners.
///
/// All mutations are synchronous. The client layer shares the session across
/// tasks behind `Arc<Mutex<_>>`, locking per event and never across an await.
#[derive(Debug, Default)]
pub struct SessionState {
    model: StationViewModel,
    context: Option<SearchContext>,
    generation: u64,
    favorites: BTreeSet<String>,
    listeners: ListenerRegistry,
}

impl SessionState {
    pub fn new() -> Self {
        SessionState::default()
    }

    pub fn model(&self) -> &StationViewModel {
        &self.model
    }

    pub fn status_counts(&self) -> StatusCounts {
        self.model.status_counts()
    }

    pub fn availability_rate(&self) -> f64 {
        self.model.availability_rate()
    }

    pub fn context(&self) -> Option<SearchContext> {
        self.context
    }

    /// Install a search context and mint a ticket for its fetch.
    ///
    /// A changed center, radius or filter supersedes every ticket minted
    /// before it. Re-submitting the current context keeps in-flight fetches
    /// valid. The previous list is kept until the new fetch completes, so the
    /// presentation layer may keep showing it as stale-but-present.
    pub fn begin_search(&mut self, context: SearchContext) -> RefreshTicket {
        if self.context != Some(context) {
            self.generation += 1;
            self.context = Some(context);
            tracing::info!(
                latitude = context.latitude(),
                longitude = context.longitude(),
                radius_meters = context.radius_meters(),
                "Search context changed"
            );
        }
        RefreshTicket {
            generation: self.generation,
            context,
        }
    }

    /// Mint a ticket for the current context, for a periodic re-fetch.
    pub fn current_ticket(&self) -> Option<RefreshTicket> {
        self.context.map(|context| RefreshTicket {
            generation: self.generation,
            context,
        })
    }

    /// Complete a fetch: replace the list if the ticket is still current,
    /// drop the result otherwise.
    pub fn complete_refresh(
        &mut self,
        ticket: &RefreshTicket,
        stations: Vec<Station>,
    ) -> RefreshOutcome {
        if ticket.generation != self.generation {
            tracing::debug!(
                total = stations.len(),
                "Dropping refresh for superseded search context"
            );
            return RefreshOutcome::Stale;
        }
        let total = stations.len();
        self.model.replace_all(stations);
        self.listeners.notify(&ModelEvent::ListReplaced { total });
        RefreshOutcome::Applied
    }

    /// Apply one push patch; returns whether it applied.
    pub fn apply_patch(&mut self, patch: &StatusPatch) -> bool {
        let applied = self.model.apply_patch(patch);
        if applied {
            self.listeners.notify(&ModelEvent::StatusChanged {
                station_id: patch.station_id.clone(),
                status: patch.status,
            });
        }
        applied
    }

    /// Apply a batch of push patches; returns how many applied.
    pub fn apply_patches(&mut self, patches: &[StatusPatch]) -> usize {
        patches
            .iter()
            .filter(|patch| self.apply_patch(patch))
            .count()
    }

    /// Add a station id to the favorites; returns whether it was new.
    pub fn add_favorite(&mut self, station_id: &str) -> bool {
        let added = self.favorites.insert(station_id.to_string());
        if added {
            self.listeners.notify(&ModelEvent::FavoritesChanged {
                station_id: station_id.to_string(),
                favorite: true,
            });
        }
        added
    }

    /// Remove a station id from the favorites; returns whether it was there.
    pub fn remove_favorite(&mut self, station_id: &str) -> bool {
        let removed = self.favorites.remove(station_id);
        if removed {
            self.listeners.notify(&ModelEvent::FavoritesChanged {
                station_id: station_id.to_string(),
                favorite: false,
            });
        }
        removed
    }

    /// Flip a station's favorite flag; returns whether it is now a favorite.
    pub fn toggle_favorite(&mut self, station_id: &str) -> bool {
        if self.is_favorite(station_id) {
            self.remove_favorite(station_id);
            false
        } else {
            self.add_favorite(station_id);
            true
        }
    }

    pub fn is_favorite(&self, station_id: &str) -> bool {
        self.favorites.contains(station_id)
    }

    pub fn favorites(&self) -> impl Iterator<Item = &str> {
        self.favorites.iter().map(String::as_str)
    }

    /// Favorited stations that are in the current list, in list order.
    pub fn favorite_stations(&self) -> Vec<&Station> {
        self.model
            .stations()
            .iter()
            .filter(|station| self.favorites.contains(&station.id))
            .collect()
    }

    /// Register a change listener; dropping the returned [`Subscription`]
    /// unregisters it.
    ///
    /// Listeners run synchronously inside the mutating call. When the session
    /// is shared behind a mutex they therefore run under that lock and must
    /// not call back into the session.
    pub fn subscribe(&self, callback: impl Fn(&ModelEvent) + Send + 'static) -> Subscription {
        self.listeners.subscribe(callback)
    }

    /// Discard the session on logout or navigation away.
    ///
    /// Clears the list, the context and the favorites, invalidates every
    /// outstanding ticket, notifies listeners once, then drops them.
    pub fn teardown(&mut self) {
        tracing::info!("Tearing down session state");
        self.model.clear();
        self.context = None;
        self.generation += 1;
        self.favorites.clear();
        self.listeners.notify(&ModelEvent::Cleared);
        self.listeners.clear();
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use chargemap_core::Location;
    use std::sync::{Arc, Mutex};

    fn station(id: &str, status: StationStatus) -> Station {
        Station {
            id: id.into(),
            name: format!("Station {id}"),
            location: Location::new(48.8508, 2.2855),
            status,
            address: None,
            connectors: vec![],
            operator: None,
        }
    }

    fn context(radius_meters: u32) -> SearchContext {
        SearchContext::new(48.85, 2.29, radius_meters).unwrap()
    }

    fn recording_listener(state: &SessionState) -> (Arc<Mutex<Vec<ModelEvent>>>, Subscription) {
        let events = Arc::new(Mutex::new(Vec::new()));
        let sink = events.clone();
        let subscription = state.subscribe(move |event| {
            sink.lock().unwrap().push(event.clone());
        });
        (events, subscription)
    }

    #[test]
    fn test_stale_refresh_is_dropped() {
        let mut state = SessionState::new();

        let old_ticket = state.begin_search(context(5000));
        // The user widens the radius while the first fetch is in flight.
        let new_ticket = state.begin_search(context(10000));

        let outcome = state.complete_refresh(&old_ticket, vec![station("A", StationStatus::Busy)]);
        assert_eq!(outcome, RefreshOutcome::Stale);
        assert!(state.model().is_empty());

        let outcome = state.complete_refresh(
            &new_ticket,
            vec![
                station("A", StationStatus::Available),
                station("B", StationStatus::Busy),
            ],
        );
        assert_eq!(outcome, RefreshOutcome::Applied);
        assert_eq!(state.status_counts().total, 2);
    }

    #[test]
    fn test_same_context_does_not_invalidate() {
        let mut state = SessionState::new();

        let first = state.begin_search(context(5000));
        // A manual refresh for the identical context.
        let second = state.begin_search(context(5000));

        assert_eq!(
            state.complete_refresh(&first, vec![station("A", StationStatus::Available)]),
            RefreshOutcome::Applied
        );
        assert_eq!(
            state.complete_refresh(&second, vec![station("A", StationStatus::Busy)]),
            RefreshOutcome::Applied
        );
        assert_eq!(state.model().get("A").unwrap().status, StationStatus::Busy);
    }

    #[test]
    fn test_current_ticket_rearms_periodic_refresh() {
        let mut state = SessionState::new();
        assert!(state.current_ticket().is_none());

        let initial = state.begin_search(context(5000));
        let periodic = state.current_ticket().unwrap();
        assert_eq!(initial, periodic);
        assert_eq!(periodic.context().radius_meters(), 5000);

        assert_eq!(
            state.complete_refresh(&periodic, vec![station("A", StationStatus::Available)]),
            RefreshOutcome::Applied
        );
    }

    #[test]
    fn test_patch_events_only_when_applied() {
        let mut state = SessionState::new();
        let ticket = state.begin_search(context(5000));
        state.complete_refresh(&ticket, vec![station("A", StationStatus::Busy)]);

        let (events, _subscription) = recording_listener(&state);

        let applied = state.apply_patches(&[
            StatusPatch {
                station_id: "A".into(),
                status: StationStatus::Available,
            },
            StatusPatch {
                station_id: "ghost".into(),
                status: StationStatus::Available,
            },
        ]);
        assert_eq!(applied, 1);

        let events = events.lock().unwrap();
        assert_eq!(
            *events,
            vec![ModelEvent::StatusChanged {
                station_id: "A".into(),
                status: StationStatus::Available,
            }]
        );
    }

    #[test]
    fn test_refresh_notifies_listeners() {
        let mut state = SessionState::new();
        let (events, _subscription) = recording_listener(&state);

        let ticket = state.begin_search(context(5000));
        state.complete_refresh(
            &ticket,
            vec![
                station("A", StationStatus::Available),
                station("B", StationStatus::Busy),
            ],
        );

        assert_eq!(
            *events.lock().unwrap(),
            vec![ModelEvent::ListReplaced { total: 2 }]
        );
    }

    #[test]
    fn test_dropped_subscription_stops_receiving() {
        let mut state = SessionState::new();
        let (events, subscription) = recording_listener(&state);
        drop(subscription);

        let ticket = state.begin_search(context(5000));
        state.complete_refresh(&ticket, vec![station("A", StationStatus::Available)]);

        assert!(events.lock().unwrap().is_empty());
    }

    #[test]
    fn test_favorites_toggle_and_filter() {
        let mut state = SessionState::new();
        let ticket = state.begin_search(context(5000));
        state.complete_refresh(
            &ticket,
            vec![
                station("A", StationStatus::Available),
                station("B", StationStatus::Busy),
            ],
        );

        assert!(state.toggle_favorite("B"));
        // Favoriting an id that is not currently listed is allowed; it just
        // does not show up in favorite_stations().
        assert!(state.toggle_favorite("elsewhere"));

        assert!(state.is_favorite("B"));
        assert_eq!(state.favorites().collect::<Vec<_>>(), vec!["B", "elsewhere"]);

        let listed: Vec<&str> = state
            .favorite_stations()
            .iter()
            .map(|s| s.id.as_str())
            .collect();
        assert_eq!(listed, vec!["B"]);

        assert!(!state.toggle_favorite("B"));
        assert!(!state.is_favorite("B"));
    }

    #[test]
    fn test_favorite_events() {
        let mut state = SessionState::new();
        let (events, _subscription) = recording_listener(&state);

        state.add_favorite("A");
        // Duplicate add is not an effective mutation.
        assert!(!state.add_favorite("A"));
        state.remove_favorite("A");

        assert_eq!(
            *events.lock().unwrap(),
            vec![
                ModelEvent::FavoritesChanged {
                    station_id: "A".into(),
                    favorite: true,
                },
                ModelEvent::FavoritesChanged {
                    station_id: "A".into(),
                    favorite: false,
                },
            ]
        );
    }

    #[test]
    fn test_teardown() {
        let mut state = SessionState::new();
        let in_flight = state.begin_search(context(5000));
        state.complete_refresh(&in_flight, vec![station("A", StationStatus::Available)]);
        state.add_favorite("A");

        let (events, _subscription) = recording_listener(&state);
        let pending = state.current_ticket().unwrap();

        state.teardown();

        assert!(state.model().is_empty());
        assert!(state.context().is_none());
        assert_eq!(state.favorites().count(), 0);
        assert_eq!(*events.lock().unwrap(), vec![ModelEvent::Cleared]);

        // A fetch that was in flight during teardown must not resurrect data.
        assert_eq!(
            state.complete_refresh(&pending, vec![station("A", StationStatus::Available)]),
            RefreshOutcome::Stale
        );
        assert!(state.model().is_empty());
    }
}
