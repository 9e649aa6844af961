//! Host election.
//!
//! The host is whoever first writes their id into the room's
//! `hostUsername` key with a compare-and-set that expects the key to be
//! absent. The store guarantees only one such write succeeds; every later
//! claim fails the precondition and changes nothing.
//!
//! Host privileges are not enforced here. Games compare the stored host
//! with the local identity before offering host-only actions.

use roomsync_protocol::{ParticipantId, Path, RoomId};
use roomsync_store::Store;
use serde_json::Value;

use crate::RoomError;

/// Shared-state key holding the elected host's participant id.
pub const HOST_KEY: &str = "hostUsername";

/// Attempts to make `candidate` the host of the room at `room_path`.
///
/// Returns `true` if this call won the election, `false` if a host was
/// already set. Losing is not an error.
pub async fn elect_host<S: Store>(
    store: &S,
    room_id: &RoomId,
    room_path: &Path,
    candidate: &ParticipantId,
) -> Result<bool, RoomError> {
    let won = store
        .compare_and_set(
            &room_path.child(HOST_KEY),
            None,
            Value::String(candidate.to_string()),
        )
        .await?;

    if won {
        tracing::info!(%room_id, host = %candidate, "host elected");
    } else {
        tracing::debug!(%room_id, participant = %candidate, "host already claimed");
    }
    Ok(won)
}

#[cfg(test)]
mod tests {
    use super::*;
    use roomsync_store::MemoryStore;

    #[tokio::test]
    async fn test_elect_host_first_claim_wins() {
        let store = MemoryStore::new();
        let room_id = RoomId::new("r1");
        let path = Path::room("room", &room_id);

        let a = ParticipantId::new("a");
        let b = ParticipantId::new("b");
        assert!(elect_host(&store, &room_id, &path, &a).await.unwrap());
        assert!(!elect_host(&store, &room_id, &path, &b).await.unwrap());
        assert!(!elect_host(&store, &room_id, &path, &a).await.unwrap());

        let host = store.get(&path.child(HOST_KEY)).await.unwrap();
        assert_eq!(host, Some(Value::String("a".into())));
    }
}
