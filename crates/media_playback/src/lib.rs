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

//! Per-message media playback positions.
//!
//! A playback position is kept in the message's locally derived data under
//! the [`MEDIA_PLAYBACK_TAG`] tag, so that playback can resume where it was
//! left the next time the message is opened.

mod error;
mod playback;
mod store;

pub use crate::error::{DecodeError, StoreError};
pub use crate::playback::{
    media_playback_stored_state, update_media_playback_stored_state,
    MediaPlaybackStoredState, MEDIA_PLAYBACK_TAG,
};
pub use crate::store::{
    derived_entry, update_derived_entry, DerivedData, DerivedDataStore,
    DerivedEntry, InMemoryDerivedDataStore, MessageId,
};
