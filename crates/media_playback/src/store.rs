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

//! Locally derived per-message data.
//!
//! Each message carries a small map from short tags to JSON-encoded entries
//! computed on this device (playback positions and the like). The data is
//! never sent anywhere.

use std::collections::{BTreeMap, HashMap};
use std::fmt;

use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::trace;

use crate::error::{DecodeError, StoreError};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MessageId {
    pub peer_id: i64,
    pub namespace: i32,
    pub id: i32,
}

impl fmt::Display for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.peer_id, self.namespace, self.id)
    }
}

/// One encoded value in a message's derived data.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DerivedEntry(Vec<u8>);

impl DerivedEntry {
    pub fn encode<T: Serialize>(value: &T) -> Result<Self, serde_json::Error> {
        serde_json::to_vec(value).map(Self)
    }

    pub fn decode<T: DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        serde_json::from_slice(&self.0)
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

pub type DerivedData = BTreeMap<String, DerivedEntry>;

/// Message storage as far as derived data is concerned.
pub trait DerivedDataStore {
    /// The derived data of message `id`, or `None` if there is no such
    /// message. A message without derived data yields an empty map.
    fn derived_data(&self, id: MessageId) -> Option<DerivedData>;

    /// Replace the derived data of message `id` with `update(current)`.
    fn update_derived_data(
        &mut self,
        id: MessageId,
        update: &mut dyn FnMut(DerivedData) -> DerivedData,
    ) -> Result<(), StoreError>;
}

/// Read and decode the entry stored under `tag`.
pub fn derived_entry<T: DeserializeOwned>(
    store: &dyn DerivedDataStore,
    id: MessageId,
    tag: &str,
) -> Result<Option<T>, DecodeError> {
    let Some(data) = store.derived_data(id) else {
        trace!(%id, "no such message");
        return Ok(None);
    };
    data.get(tag)
        .map(|entry| {
            entry.decode().map_err(|source| DecodeError {
                tag: tag.to_owned(),
                source,
            })
        })
        .transpose()
}

/// Store `value` under `tag`, or remove the tag when `value` is `None`.
pub fn update_derived_entry<T: Serialize>(
    store: &mut dyn DerivedDataStore,
    id: MessageId,
    tag: &str,
    value: Option<&T>,
) -> Result<(), StoreError> {
    let entry = value.map(DerivedEntry::encode).transpose()?;
    let mut entry = Some(entry);
    store.update_derived_data(id, &mut |mut data: DerivedData| {
        match entry.take().flatten() {
            Some(entry) => {
                data.insert(tag.to_owned(), entry);
            }
            None => {
                data.remove(tag);
            }
        }
        data
    })
}

/// A [`DerivedDataStore`] kept in memory.
#[derive(Clone, Debug, Default)]
pub struct InMemoryDerivedDataStore {
    messages: HashMap<MessageId, DerivedData>,
}

impl InMemoryDerivedDataStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make message `id` known, with no derived data.
    pub fn insert_message(&mut self, id: MessageId) {
        self.messages.entry(id).or_default();
    }

    pub fn remove_message(&mut self, id: MessageId) -> bool {
        self.messages.remove(&id).is_some()
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}

impl DerivedDataStore for InMemoryDerivedDataStore {
    fn derived_data(&self, id: MessageId) -> Option<DerivedData> {
        self.messages.get(&id).cloned()
    }

    fn update_derived_data(
        &mut self,
        id: MessageId,
        update: &mut dyn FnMut(DerivedData) -> DerivedData,
    ) -> Result<(), StoreError> {
        let data = self
            .messages
            .get_mut(&id)
            .ok_or(StoreError::MessageNotFound(id))?;
        *data = update(std::mem::take(data));
        trace!(%id, tags = data.len(), "updated derived data");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MESSAGE: MessageId = MessageId {
        peer_id: 7,
        namespace: 0,
        id: 42,
    };

    #[test]
    fn unknown_messages_read_as_absent() {
        let store = InMemoryDerivedDataStore::new();
        let value: Option<u32> = derived_entry(&store, MESSAGE, "x").unwrap();
        assert_eq!(value, None);
    }

    #[test]
    fn updating_an_unknown_message_fails() {
        let mut store = InMemoryDerivedDataStore::new();
        let result = update_derived_entry(&mut store, MESSAGE, "x", Some(&1u32));
        assert!(matches!(result, Err(StoreError::MessageNotFound(id)) if id == MESSAGE));
    }

    #[test]
    fn entries_are_stored_and_removed_per_tag() {
        let mut store = InMemoryDerivedDataStore::new();
        store.insert_message(MESSAGE);
        update_derived_entry(&mut store, MESSAGE, "a", Some(&1u32)).unwrap();
        update_derived_entry(&mut store, MESSAGE, "b", Some(&"two")).unwrap();
        update_derived_entry::<u32>(&mut store, MESSAGE, "a", None).unwrap();

        let data = store.derived_data(MESSAGE).unwrap();
        assert_eq!(data.keys().collect::<Vec<_>>(), vec!["b"]);
        assert_eq!(data["b"].as_bytes(), b"\"two\"");
    }

    #[test]
    fn malformed_entries_report_their_tag() {
        let mut store = InMemoryDerivedDataStore::new();
        store.insert_message(MESSAGE);
        update_derived_entry(&mut store, MESSAGE, "n", Some(&"not a number"))
            .unwrap();
        let error = derived_entry::<u32>(&store, MESSAGE, "n").unwrap_err();
        assert_eq!(error.tag, "n");
    }

    #[test]
    fn message_ids_display_compactly() {
        assert_eq!(MESSAGE.to_string(), "7:0:42");
    }
}
