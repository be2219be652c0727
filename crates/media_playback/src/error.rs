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

use thiserror::Error;

use crate::MessageId;

/// A derived-data entry could not be read back.
#[derive(Debug, Error)]
#[error("derived data entry {tag:?} is malformed")]
pub struct DecodeError {
    pub tag: String,
    #[source]
    pub source: serde_json::Error,
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("message {0} not found")]
    MessageNotFound(MessageId),
    #[error("playback timestamp {0} is not a finite number")]
    NonFiniteTimestamp(f64),
    #[error("could not encode derived data entry")]
    Encode(#[from] serde_json::Error),
}
