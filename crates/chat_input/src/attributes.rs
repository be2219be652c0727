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

//! The closed set of attributes that can be attached to input text.
//!
//! | Attribute      | Key              | Category   | Merges with neighbours |
//! |----------------|------------------|------------|------------------------|
//! | Bold           | `bold`           | Formatting | yes                    |
//! | Italic         | `italic`         | Formatting | yes                    |
//! | Underline      | `underline`      | Formatting | yes                    |
//! | Strikethrough  | `strikethrough`  | Formatting | yes                    |
//! | Monospace      | `monospace`      | Formatting | yes                    |
//! | Spoiler        | `spoiler`        | Formatting | yes                    |
//! | Text URL       | `text_url`       | Formatting | same URL only          |
//! | Quote          | `quote`          | Block      | same collapsed state   |
//! | Custom emoji   | `custom_emoji`   | Content    | never                  |

use std::hash::{Hash, Hasher};
use std::sync::Arc;

use strum_macros::{Display, EnumDiscriminants, EnumIter, IntoStaticStr};

/// A formatting or content attribute applied over a range of input text.
#[derive(Clone, Debug, PartialEq, Eq, Hash, EnumDiscriminants)]
#[strum_discriminants(name(AttributeKey))]
#[strum_discriminants(derive(
    Hash,
    PartialOrd,
    Ord,
    EnumIter,
    IntoStaticStr,
    Display
))]
#[strum_discriminants(strum(serialize_all = "snake_case"))]
pub enum TextAttribute {
    Bold,
    Italic,
    Underline,
    Strikethrough,
    Monospace,
    Spoiler,
    /// A link whose visible text differs from its target.
    TextUrl(String),
    /// A paragraph-like quote block which can be shown collapsed.
    Quote { collapsed: bool },
    CustomEmoji(CustomEmojiAttribute),
}

/// How an attribute kind behaves under range operations.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AttributeCategory {
    /// Character-run formatting, removed by a plain "clear formatting".
    Formatting,
    /// Applies to a whole paragraph-like span.
    Block,
    /// Describes what a run of text *is* rather than how it looks.
    Content,
}

impl TextAttribute {
    pub fn key(&self) -> AttributeKey {
        AttributeKey::from(self)
    }

    pub fn category(&self) -> AttributeCategory {
        self.key().category()
    }

    /// Whether two touching spans carrying this same value collapse into
    /// one. Each custom emoji glyph keeps its own span.
    pub(crate) fn merges_with_neighbour(&self) -> bool {
        !matches!(self, Self::CustomEmoji(_))
    }
}

impl AttributeKey {
    pub fn category(&self) -> AttributeCategory {
        match self {
            Self::Quote => AttributeCategory::Block,
            Self::CustomEmoji => AttributeCategory::Content,
            _ => AttributeCategory::Formatting,
        }
    }
}

/// Opaque description handed to the emoji renderer (e.g. a file reference).
/// Never inspected by the input model.
#[derive(Clone, Debug)]
pub struct RenderPayload(Arc<str>);

impl RenderPayload {
    pub fn new(payload: impl Into<Arc<str>>) -> Self {
        Self(payload.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Reference to a custom emoji file occupying a run of text.
///
/// Two references are equal when they point at the same file; the render
/// payload is ignored.
#[derive(Clone, Debug)]
pub struct CustomEmojiAttribute {
    pub file_id: i64,
    pub payload: Option<RenderPayload>,
}

impl CustomEmojiAttribute {
    pub fn new(file_id: i64) -> Self {
        Self {
            file_id,
            payload: None,
        }
    }

    pub fn with_payload(file_id: i64, payload: RenderPayload) -> Self {
        Self {
            file_id,
            payload: Some(payload),
        }
    }
}

impl PartialEq for CustomEmojiAttribute {
    fn eq(&self, other: &Self) -> bool {
        self.file_id == other.file_id
    }
}

impl Eq for CustomEmojiAttribute {}

impl Hash for CustomEmojiAttribute {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.file_id.hash(state);
    }
}
