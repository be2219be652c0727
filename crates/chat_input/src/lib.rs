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

//! Rich text input state for a chat composer.
//!
//! [`InputState`] is an immutable value: UTF-16 text with attribute spans
//! and a selection. The functions in [`formatting`] derive new values from
//! old ones. [`InputInteractions`] owns the current value and notifies
//! observers when it changes, and [`ChatInputView`] keeps a host text widget
//! and its undo stack in step with it.

mod attachments;
mod attributes;
mod config;
mod error;
pub mod formatting;
mod interactions;
mod render;
mod text_state;
mod timers;
mod view;

pub use crate::attachments::{
    emoji_attachments, AttachmentId, AttachmentRegistry, AttachmentRequest,
    EmojiRenderer, PlayPolicy, RendererFactory,
};
pub use crate::attributes::{
    AttributeCategory, AttributeKey, CustomEmojiAttribute, RenderPayload,
    TextAttribute,
};
pub use crate::config::{InputConfig, InputTheme, SendShortcut};
pub use crate::error::ConfigError;
pub use crate::interactions::{
    InputHooks, InputInteractions, KeyEvent, LinkEdit, LinkEditRequest,
    LinkEditor, Modifiers, ObserverFn, ObserverId, PasteboardContent,
    SkipReason, TransformOutcome, TransformReason,
};
pub use crate::text_state::{
    AttributeSpan, InputState, InputText, SelectionRange,
};
pub use crate::timers::{ManualTimers, TimerScheduler, TimerToken};
pub use crate::view::{
    ChatInputView, HostTextView, RenderOptions, RenderedText, UndoItem,
    SPOILER_REVEAL_DURATION,
};
