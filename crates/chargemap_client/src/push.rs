use chargemap_core::StatusPatch;
use tokio::sync::mpsc;

use crate::poller::SharedSession;

/// Apply status pushes to the session until the channel closes.
///
/// The socket transport is an external collaborator; whatever owns it feeds
/// decoded `{tomtom_id, status}` events into the sender side. Each event is
/// applied at most once; patches for stations not in the current list are
/// dropped by the session.
pub async fn run_push_channel(mut events: mpsc::Receiver<StatusPatch>, session: SharedSession) {
    while let Some(patch) = events.recv().await {
        let applied = session.lock().unwrap().apply_patch(&patch);
        if !applied {
            tracing::debug!(
                station_id = %patch.station_id,
                "Dropped push update for unlisted station"
            );
        }
    }
    tracing::debug!("Push channel closed");
}
