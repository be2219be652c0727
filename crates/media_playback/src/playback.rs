// Copyright 2026 The Matrix.org Foundation C.I.C.
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::{DecodeError, StoreError};
use crate::store::{
    derived_entry, update_derived_entry, DerivedDataStore, MessageId,
};

/// Derived-data tag the playback state is stored under.
pub const MEDIA_PLAYBACK_TAG: &str = "mps";

/// Where playback of a message's media was left, in seconds.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct MediaPlaybackStoredState {
    pub timestamp: f64,
}

impl MediaPlaybackStoredState {
    pub fn new(timestamp: f64) -> Self {
        Self { timestamp }
    }
}

/// The stored playback state of message `id`, if any.
pub fn media_playback_stored_state(
    store: &dyn DerivedDataStore,
    id: MessageId,
) -> Result<Option<MediaPlaybackStoredState>, DecodeError> {
    derived_entry(store, id, MEDIA_PLAYBACK_TAG)
}

/// Remember `state` for message `id`; `None` forgets it.
pub fn update_media_playback_stored_state(
    store: &mut dyn DerivedDataStore,
    id: MessageId,
    state: Option<MediaPlaybackStoredState>,
) -> Result<(), StoreError> {
    if let Some(state) = state {
        if !state.timestamp.is_finite() {
            warn!(%id, timestamp = state.timestamp, "refusing to store playback position");
            return Err(StoreError::NonFiniteTimestamp(state.timestamp));
        }
    }
    debug!(%id, timestamp = ?state.map(|s| s.timestamp), "storing playback position");
    update_derived_entry(store, id, MEDIA_PLAYBACK_TAG, state.as_ref())
}

#[cfg(test)]
mod tests {
    use speculoos::prelude::*;

    use super::*;
    use crate::store::{DerivedEntry, InMemoryDerivedDataStore};

    fn store_with(id: MessageId) -> InMemoryDerivedDataStore {
        let mut store = InMemoryDerivedDataStore::new();
        store.insert_message(id);
        store
    }

    const ID: MessageId = MessageId {
        peer_id: 1,
        namespace: 0,
        id: 100,
    };

    #[test]
    fn encodes_the_timestamp_field() {
        let entry = DerivedEntry::encode(&MediaPlaybackStoredState::new(12.5)).unwrap();
        assert_eq!(entry.as_bytes(), br#"{"timestamp":12.5}"#);
    }

    #[test]
    fn stored_state_reads_back() {
        let mut store = store_with(ID);
        update_media_playback_stored_state(
            &mut store,
            ID,
            Some(MediaPlaybackStoredState::new(73.25)),
        )
        .unwrap();
        assert_that!(media_playback_stored_state(&store, ID).unwrap())
            .is_equal_to(Some(MediaPlaybackStoredState::new(73.25)));
    }

    #[test]
    fn none_removes_the_stored_state() {
        let mut store = store_with(ID);
        update_media_playback_stored_state(
            &mut store,
            ID,
            Some(MediaPlaybackStoredState::new(1.0)),
        )
        .unwrap();
        update_media_playback_stored_state(&mut store, ID, None).unwrap();
        assert_that!(media_playback_stored_state(&store, ID).unwrap()).is_none();
        assert!(!store.derived_data(ID).unwrap().contains_key(MEDIA_PLAYBACK_TAG));
    }

    #[test]
    fn non_finite_timestamps_are_rejected_and_keep_the_old_state() {
        let mut store = store_with(ID);
        let kept = MediaPlaybackStoredState::new(4.0);
        update_media_playback_stored_state(&mut store, ID, Some(kept)).unwrap();

        for timestamp in [f64::INFINITY, f64::NEG_INFINITY, f64::NAN] {
            let result = update_media_playback_stored_state(
                &mut store,
                ID,
                Some(MediaPlaybackStoredState::new(timestamp)),
            );
            assert!(matches!(result, Err(StoreError::NonFiniteTimestamp(_))));
        }
        assert_that!(media_playback_stored_state(&store, ID).unwrap())
            .is_equal_to(Some(kept));
    }

    #[test]
    fn missing_timestamp_is_a_decode_error() {
        let mut store = store_with(ID);
        let empty = serde_json::json!({});
        update_derived_entry(&mut store, ID, MEDIA_PLAYBACK_TAG, Some(&empty))
            .unwrap();
        let error = media_playback_stored_state(&store, ID).unwrap_err();
        assert_eq!(error.tag, MEDIA_PLAYBACK_TAG);
    }
}
