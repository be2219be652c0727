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

use std::collections::BTreeSet;

use strum_macros::AsRefStr;
use tracing::{debug, warn};

use super::InputInteractions;
use crate::formatting;
use crate::{AttributeKey, SelectionRange, TextAttribute};

/// A formatting request coming from the toolbar, a menu or a shortcut.
#[derive(Clone, Debug, PartialEq, Eq, AsRefStr)]
pub enum TransformReason {
    /// Toggle an attribute over the selection.
    Attribute(TextAttribute),
    /// Ask the link editor for a URL and link the selection to it.
    Url,
    /// Remove formatting from the selection.
    Clear,
    /// Collapse or expand the quote covering `range`.
    ToggleQuote {
        collapsed: bool,
        range: SelectionRange,
    },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TransformOutcome {
    Applied,
    /// The request was valid but left the value as it was.
    Unchanged,
    Skipped(SkipReason),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, AsRefStr)]
pub enum SkipReason {
    TransformsDisabled,
    SimpleTransformOnly,
    EmptySelection,
    NoLinkEditor,
    Cancelled,
    InvalidUrl,
    LinkHostNotAllowed,
}

/// What a link editor is shown when it opens.
#[derive(Clone, Debug)]
pub struct LinkEditRequest<'a> {
    /// The text being linked.
    pub text: &'a str,
    /// The link already on that text, if any.
    pub url: Option<&'a str>,
    pub allowed_hosts: &'a BTreeSet<String>,
}

/// The user's answer. A `None` or empty `url` removes the link.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct LinkEdit {
    pub text: String,
    pub url: Option<String>,
}

/// A surface that collects a link from the user. Returning `None` cancels.
pub trait LinkEditor {
    fn edit_link(&mut self, request: &LinkEditRequest<'_>) -> Option<LinkEdit>;
}

impl<F> LinkEditor for F
where
    F: FnMut(&LinkEditRequest<'_>) -> Option<LinkEdit>,
{
    fn edit_link(&mut self, request: &LinkEditRequest<'_>) -> Option<LinkEdit> {
        self(request)
    }
}

impl InputInteractions {
    /// Apply a formatting request to the current value.
    ///
    /// Nothing here fails: a request that cannot be honoured is reported as
    /// [`TransformOutcome::Skipped`] and leaves the value untouched.
    pub fn apply_transform(
        &self,
        reason: TransformReason,
        link_editor: Option<&mut dyn LinkEditor>,
    ) -> TransformOutcome {
        if !self.can_transform() {
            return skipped(&reason, SkipReason::TransformsDisabled);
        }
        if self.simple_transform_only() && !is_simple(&reason) {
            return skipped(&reason, SkipReason::SimpleTransformOnly);
        }

        let changed = match &reason {
            TransformReason::Attribute(TextAttribute::Quote { collapsed }) => {
                let selection = self.presentation().selection();
                if selection.is_empty() {
                    return skipped(&reason, SkipReason::EmptySelection);
                }
                let collapsed = *collapsed;
                self.update(|state| {
                    formatting::add_quote_attribute(
                        state, selection, collapsed, false,
                    )
                })
            }
            TransformReason::Attribute(attribute) => {
                if self.presentation().selection().is_empty() {
                    return skipped(&reason, SkipReason::EmptySelection);
                }
                let attribute = attribute.clone();
                self.update(|state| {
                    formatting::toggle_formatting_attribute(
                        state, attribute, None,
                    )
                })
            }
            TransformReason::Clear => {
                if self.presentation().selection().is_empty() {
                    return skipped(&reason, SkipReason::EmptySelection);
                }
                self.update(|state| {
                    formatting::clear_formatting_attributes(state, None, None)
                })
            }
            TransformReason::ToggleQuote { collapsed, range } => {
                let (collapsed, range) = (*collapsed, *range);
                self.update(|state| {
                    formatting::add_quote_attribute(
                        state, range, !collapsed, true,
                    )
                })
            }
            TransformReason::Url => match self.edit_link(link_editor) {
                Ok(changed) => changed,
                Err(why) => return skipped(&reason, why),
            },
        };

        if changed {
            debug!(reason = reason.as_ref(), "applied transform");
            TransformOutcome::Applied
        } else {
            TransformOutcome::Unchanged
        }
    }

    fn edit_link(
        &self,
        link_editor: Option<&mut dyn LinkEditor>,
    ) -> Result<bool, SkipReason> {
        let state = self.presentation();
        let selection = state.selection();
        if selection.is_empty() {
            return Err(SkipReason::EmptySelection);
        }
        let Some(editor) = link_editor else {
            return Err(SkipReason::NoLinkEditor);
        };

        let text = state.input_text().substring(selection);
        let current_url = text
            .spans_for_key(AttributeKey::TextUrl, 0..text.len())
            .find_map(|span| match &span.attribute {
                TextAttribute::TextUrl(url) => Some(url.clone()),
                _ => None,
            });
        let allowed_hosts = self.allowed_link_hosts();
        let plain = text.to_plain_string();
        let request = LinkEditRequest {
            text: &plain,
            url: current_url.as_deref(),
            allowed_hosts: &allowed_hosts,
        };
        let edit = editor.edit_link(&request).ok_or(SkipReason::Cancelled)?;

        let url = match edit.url.as_deref().filter(|url| !url.trim().is_empty())
        {
            Some(raw) => {
                let url =
                    formatting::parse_link_url(raw).ok_or(SkipReason::InvalidUrl)?;
                if !self.config.borrow().allows_link(&url) {
                    return Err(SkipReason::LinkHostNotAllowed);
                }
                Some(String::from(url))
            }
            None => None,
        };
        let display = Some(edit.text.as_str()).filter(|t| *t != plain);

        Ok(self.update(|state| {
            formatting::add_link_attribute(
                state,
                selection,
                url.as_deref(),
                display,
            )
        }))
    }
}

fn is_simple(reason: &TransformReason) -> bool {
    match reason {
        TransformReason::Url | TransformReason::ToggleQuote { .. } => false,
        TransformReason::Attribute(attribute) => !matches!(
            attribute.key(),
            AttributeKey::TextUrl | AttributeKey::Quote
        ),
        TransformReason::Clear => true,
    }
}

fn skipped(reason: &TransformReason, why: SkipReason) -> TransformOutcome {
    warn!(reason = reason.as_ref(), skipped = why.as_ref(), "transform skipped");
    TransformOutcome::Skipped(why)
}
