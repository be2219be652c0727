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


//! The interaction controller: the single owner of the current
//! [`InputState`](crate::InputState).
//!
//! Every change goes through [`InputInteractions::update`], which compares
//! the new value with the old one and, when they differ, notifies observers
//! with `(new, old, animated)`. An `update` made from inside an observer is
//! queued and delivered as a separate round once the current round is done,
//! so notification never recurses.

mod base;
mod hooks;
mod transform;

pub use base::{InputInteractions, ObserverFn, ObserverId};
pub use hooks::{InputHooks, KeyEvent, Modifiers, PasteboardContent};
pub use transform::{
    LinkEdit, LinkEditRequest, LinkEditor, SkipReason, TransformOutcome,
    TransformReason,
};
