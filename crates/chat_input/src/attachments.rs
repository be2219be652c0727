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

//! Live renderers for inline custom emoji.
//!
//! The registry owns one renderer per [`AttachmentId`]. Renderers are
//! created lazily the first time an emoji span is rendered and dropped once
//! the span disappears from the text.

use std::collections::{HashMap, HashSet};

use serde::Deserialize;
use tracing::{debug, trace};

use crate::attributes::{RenderPayload, TextAttribute};
use crate::text_state::InputText;

/// How an animated emoji plays.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlayPolicy {
    #[default]
    Loop,
    Once,
    /// Play once and rest on the last frame.
    OnceEnd,
    FramesCount(u32),
}

/// Identifies one emoji occurrence: the `occurrence`-th emoji in the text
/// referencing `file_id`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AttachmentId {
    pub file_id: i64,
    pub occurrence: u32,
}

/// Everything a factory needs to build a renderer.
#[derive(Clone, Debug)]
pub struct AttachmentRequest {
    pub id: AttachmentId,
    pub payload: Option<RenderPayload>,
    /// Side of the square the emoji is drawn in.
    pub size: f32,
    pub play_policy: PlayPolicy,
    /// ARGB tint for single-colour emoji.
    pub text_color: u32,
    /// False in lite mode: draw the first frame only.
    pub playable: bool,
}

/// A live, drawable emoji. The input model only ever changes its play policy.
pub trait EmojiRenderer {
    fn set_play_policy(&mut self, policy: PlayPolicy);
}

pub trait RendererFactory {
    fn make_renderer(
        &mut self,
        request: &AttachmentRequest,
    ) -> Box<dyn EmojiRenderer>;
}

impl<F> RendererFactory for F
where
    F: FnMut(&AttachmentRequest) -> Box<dyn EmojiRenderer>,
{
    fn make_renderer(
        &mut self,
        request: &AttachmentRequest,
    ) -> Box<dyn EmojiRenderer> {
        self(request)
    }
}

pub struct AttachmentRegistry {
    factory: Box<dyn RendererFactory>,
    live: HashMap<AttachmentId, Box<dyn EmojiRenderer>>,
    play_policy: PlayPolicy,
    /// Whether the live renderers were built playable.
    playable: bool,
}

impl AttachmentRegistry {
    pub fn new(factory: Box<dyn RendererFactory>, play_policy: PlayPolicy) -> Self {
        Self {
            factory,
            live: HashMap::new(),
            play_policy,
            playable: true,
        }
    }

    pub fn play_policy(&self) -> PlayPolicy {
        self.play_policy
    }

    pub fn len(&self) -> usize {
        self.live.len()
    }

    pub fn is_empty(&self) -> bool {
        self.live.is_empty()
    }

    pub fn contains(&self, id: &AttachmentId) -> bool {
        self.live.contains_key(id)
    }

    /// Return the live renderer for `request.id`, creating it if needed.
    ///
    /// Renderers cannot switch lite mode, so a request with a different
    /// `playable` flag rebuilds every live renderer on demand.
    pub fn resolve(
        &mut self,
        request: &AttachmentRequest,
    ) -> &mut dyn EmojiRenderer {
        if request.playable != self.playable {
            debug!(
                playable = request.playable,
                count = self.live.len(),
                "lite mode changed, rebuilding emoji renderers"
            );
            self.live.clear();
            self.playable = request.playable;
        }
        let factory = &mut self.factory;
        self.live
            .entry(request.id)
            .or_insert_with(|| {
                debug!(file_id = request.id.file_id, occurrence = request.id.occurrence, "creating emoji renderer");
                factory.make_renderer(request)
            })
            .as_mut()
    }

    /// Drop every renderer whose id is not in `keep`.
    pub fn retain_only(&mut self, keep: &HashSet<AttachmentId>) {
        self.live.retain(|id, _| {
            let kept = keep.contains(id);
            if !kept {
                trace!(file_id = id.file_id, occurrence = id.occurrence, "dropping emoji renderer");
            }
            kept
        });
    }

    /// Apply `policy` to all live renderers and to those created later.
    pub fn update_play_policy(&mut self, policy: PlayPolicy) {
        self.play_policy = policy;
        for renderer in self.live.values_mut() {
            renderer.set_play_policy(policy);
        }
    }

    pub fn teardown(&mut self) {
        debug!(count = self.live.len(), "releasing emoji renderers");
        self.live.clear();
    }
}

impl std::fmt::Debug for AttachmentRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AttachmentRegistry")
            .field("live", &self.live.keys().collect::<Vec<_>>())
            .field("play_policy", &self.play_policy)
            .finish()
    }
}

/// The custom emoji in `text`, in document order, with their ids.
pub fn emoji_attachments(
    text: &InputText,
) -> Vec<(AttachmentId, Option<RenderPayload>)> {
    let mut seen: HashMap<i64, u32> = HashMap::new();
    text.spans()
        .iter()
        .filter_map(|span| match &span.attribute {
            TextAttribute::CustomEmoji(emoji) => {
                let occurrence = seen.entry(emoji.file_id).or_insert(0);
                let id = AttachmentId {
                    file_id: emoji.file_id,
                    occurrence: *occurrence,
                };
                *occurrence += 1;
                Some((id, emoji.payload.clone()))
            }
            _ => None,
        })
        .collect()
}
