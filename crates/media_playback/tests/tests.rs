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

use std::collections::HashMap;

use media_playback::{
    media_playback_stored_state, update_media_playback_stored_state,
    DerivedData, DerivedDataStore, DerivedEntry, InMemoryDerivedDataStore,
    MediaPlaybackStoredState, MessageId, StoreError, MEDIA_PLAYBACK_TAG,
};
use speculoos::prelude::*;

fn message(id: i32) -> MessageId {
    MessageId {
        peer_id: 10,
        namespace: 0,
        id,
    }
}

/// A store that keeps other tags alongside the playback state and counts
/// writes, like a real message database would.
#[derive(Default)]
struct CountingStore {
    messages: HashMap<MessageId, DerivedData>,
    writes: usize,
}

impl DerivedDataStore for CountingStore {
    fn derived_data(&self, id: MessageId) -> Option<DerivedData> {
        self.messages.get(&id).cloned()
    }

    fn update_derived_data(
        &mut self,
        id: MessageId,
        update: &mut dyn FnMut(DerivedData) -> DerivedData,
    ) -> Result<(), StoreError> {
        let current = self.messages.remove(&id).unwrap_or_default();
        self.messages.insert(id, update(current));
        self.writes += 1;
        Ok(())
    }
}

#[test]
fn playback_position_survives_alongside_other_tags() {
    let mut store = CountingStore::default();
    let mut data = DerivedData::new();
    data.insert("tr".to_owned(), DerivedEntry::encode(&"translated").unwrap());
    store.messages.insert(message(1), data);

    update_media_playback_stored_state(
        &mut store,
        message(1),
        Some(MediaPlaybackStoredState::new(31.0)),
    )
    .unwrap();

    let data = store.derived_data(message(1)).unwrap();
    assert_eq!(data.len(), 2);
    assert!(data.contains_key(MEDIA_PLAYBACK_TAG));
    assert_eq!(store.writes, 1);
    assert_that!(media_playback_stored_state(&store, message(1)).unwrap())
        .is_equal_to(Some(MediaPlaybackStoredState::new(31.0)));
}

#[test]
fn positions_are_kept_per_message() {
    let mut store = InMemoryDerivedDataStore::new();
    store.insert_message(message(1));
    store.insert_message(message(2));

    update_media_playback_stored_state(
        &mut store,
        message(1),
        Some(MediaPlaybackStoredState::new(5.0)),
    )
    .unwrap();

    assert_that!(media_playback_stored_state(&store, message(2)).unwrap())
        .is_none();
    assert_that!(media_playback_stored_state(&store, message(3)).unwrap())
        .is_none();
}

#[test]
fn forgetting_a_position_of_a_deleted_message_fails() {
    let mut store = InMemoryDerivedDataStore::new();
    store.insert_message(message(1));
    assert!(store.remove_message(message(1)));
    let result = update_media_playback_stored_state(&mut store, message(1), None);
    assert!(matches!(result, Err(StoreError::MessageNotFound(_))));
}
