mod models;

pub use crate::models::*;

/// The authoritative in-memory list of nearby stations for the current
/// session.
///
/// The list is replaced wholesale by each successful fetch, mutated in place
/// (status field only) by push patches, and discarded on teardown. The
/// view-model has no failure state of its own: when a fetch fails it simply
/// is not updated, and the caller decides whether to keep showing the last
/// good list.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StationViewModel {
    stations: Vec<Station>,
}

impl StationViewModel {
    pub fn new() -> Self {
        StationViewModel::default()
    }

    pub fn stations(&self) -> &[Station] {
        &self.stations
    }

    pub fn get(&self, id: &str) -> Option<&Station> {
        self.stations.iter().find(|s| s.id == id)
    }

    pub fn len(&self) -> usize {
        self.stations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stations.is_empty()
    }

    /// Set the list to exactly the given stations, in the given order.
    ///
    /// Supersedes all previous entries; a pending patch for an identifier
    /// that is no longer present becomes a no-op.
    pub fn replace_all(&mut self, stations: Vec<Station>) {
        tracing::debug!(total = stations.len(), "Replacing station list");
        self.stations = stations;
    }

    /// Update the status of the station the patch targets.
    ///
    /// Returns whether the patch applied. A patch for an identifier not in
    /// the list is dropped silently; ordering and all other fields are left
    /// untouched.
    pub fn apply_patch(&mut self, patch: &StatusPatch) -> bool {
        match self.stations.iter_mut().find(|s| s.id == patch.station_id) {
            Some(station) => {
                tracing::debug!(
                    station_id = %patch.station_id,
                    status = %patch.status,
                    "Applying status patch"
                );
                station.status = patch.status;
                true
            }
            None => {
                tracing::debug!(
                    station_id = %patch.station_id,
                    "Ignoring patch for station not in the current list"
                );
                false
            }
        }
    }

    /// Apply a batch of patches, returning how many applied.
    ///
    /// Patches targeting different identifiers commute; for a repeated
    /// identifier the last patch in the batch wins.
    pub fn apply_patches(&mut self, patches: &[StatusPatch]) -> usize {
        patches
            .iter()
            .filter(|patch| self.apply_patch(patch))
            .count()
    }

    /// Count the current list per status category.
    ///
    /// Computed fresh on every call; deterministic for a given list state.
    pub fn status_counts(&self) -> StatusCounts {
        let mut counts = StatusCounts {
            total: self.stations.len(),
            ..StatusCounts::default()
        };
        for station in &self.stations {
            match station.status {
                StationStatus::Available => counts.available += 1,
                StationStatus::Busy => counts.busy += 1,
                StationStatus::OutOfOrder => counts.out_of_order += 1,
                StationStatus::Unknown => counts.unknown += 1,
            }
        }
        counts
    }

    /// Fraction of stations currently available, 0.0 for an empty list.
    pub fn availability_rate(&self) -> f64 {
        let counts = self.status_counts();
        if counts.total == 0 {
            0.0
        } else {
            counts.available as f64 / counts.total as f64
        }
    }

    pub fn clear(&mut self) {
        self.stations.clear();
    }
}
