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

//! Pure transforms from one [`InputState`] to the next.
//!
//! None of these fail. Ranges default to the current selection, are clamped
//! to the text, and an operation that has nothing to act on returns the
//! input unchanged.

use unicode_segmentation::UnicodeSegmentation;
use url::Url;

use crate::attributes::{AttributeCategory, AttributeKey, TextAttribute};
use crate::text_state::{InputState, InputText, SelectionRange};

fn target_range(
    state: &InputState,
    range: Option<SelectionRange>,
) -> SelectionRange {
    state
        .input_text()
        .clamp(range.unwrap_or_else(|| state.selection()))
}

/// Replace `range` (default: the selection) with `text`.
///
/// The selection collapses to just after the inserted text.
pub fn insert_text(
    state: &InputState,
    text: &InputText,
    range: Option<SelectionRange>,
) -> InputState {
    let range = target_range(state, range);
    let input_text = state.input_text().replace_range(range, text);
    InputState::new(input_text, SelectionRange::caret(range.start + text.len()))
}

/// Apply `attribute` over `range` (default: the selection).
///
/// Any value of the same kind already there is replaced, so applying the
/// same attribute twice is the same as applying it once.
pub fn add_formatting_attribute(
    state: &InputState,
    attribute: TextAttribute,
    range: Option<SelectionRange>,
) -> InputState {
    let range = target_range(state, range);
    if range.is_empty() {
        return state.clone();
    }
    let mut input_text = state.input_text().clone();
    input_text.apply(range.as_range(), attribute);
    InputState::new(input_text, state.selection())
}

/// Remove `attribute` if it already covers the whole range, add it otherwise.
pub fn toggle_formatting_attribute(
    state: &InputState,
    attribute: TextAttribute,
    range: Option<SelectionRange>,
) -> InputState {
    let range = target_range(state, range);
    if range.is_empty() {
        return state.clone();
    }
    let key = attribute.key();
    let fully_applied = state.input_text().covers(key, &range.as_range())
        && state
            .input_text()
            .spans_for_key(key, range.as_range())
            .all(|span| span.attribute == attribute);
    if fully_applied {
        clear_formatting_attributes(state, Some(key), Some(range))
    } else {
        add_formatting_attribute(state, attribute, Some(range))
    }
}

/// Remove formatting over `range` (default: the selection).
///
/// With a `key`, only that kind is removed. Without one, every formatting
/// attribute goes; quote blocks and custom emoji are kept.
pub fn clear_formatting_attributes(
    state: &InputState,
    key: Option<AttributeKey>,
    range: Option<SelectionRange>,
) -> InputState {
    let range = target_range(state, range);
    if range.is_empty() {
        return state.clone();
    }
    let mut input_text = state.input_text().clone();
    match key {
        Some(key) => input_text
            .remove_where(range.as_range(), |attribute| attribute.key() == key),
        None => input_text.remove_where(range.as_range(), |attribute| {
            attribute.category() == AttributeCategory::Formatting
        }),
    }
    InputState::new(input_text, state.selection())
}

/// Turn `range` into a link to `url`.
///
/// An empty range leaves the state unchanged. An absent or empty `url`
/// removes links over the range instead. When `text` is given the range is
/// replaced by it; either way the link text carries no other formatting
/// and the caret lands after it.
pub fn add_link_attribute(
    state: &InputState,
    range: SelectionRange,
    url: Option<&str>,
    text: Option<&str>,
) -> InputState {
    let range = state.input_text().clamp(range);
    if range.is_empty() {
        return state.clone();
    }
    let Some(url) = url.filter(|url| !url.is_empty()) else {
        return clear_formatting_attributes(
            state,
            Some(AttributeKey::TextUrl),
            Some(range),
        );
    };

    let mut link_text = match text.filter(|text| !text.is_empty()) {
        Some(text) => InputText::new(text),
        None => state.input_text().substring(range),
    };
    let whole = 0..link_text.len();
    link_text.remove_where(whole.clone(), |attribute| {
        attribute.category() == AttributeCategory::Formatting
    });
    link_text.apply(whole, TextAttribute::TextUrl(url.to_owned()));

    insert_text(state, &link_text, Some(range))
}

/// Put `range` in a quote block with the given collapsed state.
///
/// Unless `do_not_update_selection` is set the caret moves to the end of the
/// quote.
pub fn add_quote_attribute(
    state: &InputState,
    range: SelectionRange,
    collapsed: bool,
    do_not_update_selection: bool,
) -> InputState {
    let range = state.input_text().clamp(range);
    if range.is_empty() {
        return state.clone();
    }
    let mut input_text = state.input_text().clone();
    input_text.apply(range.as_range(), TextAttribute::Quote { collapsed });
    let selection = if do_not_update_selection {
        state.selection()
    } else {
        SelectionRange::caret(range.end)
    };
    InputState::new(input_text, selection)
}

/// Flip the collapsed state of the quote block overlapping `range`.
///
/// Text, other attributes and the selection are untouched.
pub fn toggle_quote(state: &InputState, range: SelectionRange) -> InputState {
    let quote = state
        .input_text()
        .spans_for_key(AttributeKey::Quote, range.start..range.end.max(range.start + 1))
        .next()
        .map(|span| (span.range.clone(), span.attribute.clone()));
    match quote {
        Some((quote_range, TextAttribute::Quote { collapsed })) => {
            add_quote_attribute(state, quote_range.into(), !collapsed, true)
        }
        _ => state.clone(),
    }
}

pub fn select_all(state: &InputState) -> InputState {
    state.with_selection(SelectionRange::new(0, state.len()))
}

pub fn set_to_end(state: &InputState) -> InputState {
    state.with_selection(SelectionRange::caret(state.len()))
}

/// Delete the selection, or the grapheme cluster before the caret.
pub fn delete_backward(state: &InputState) -> InputState {
    let selection = state.selection();
    if !selection.is_empty() {
        return insert_text(state, &InputText::default(), None);
    }
    let previous = grapheme_boundaries(state.input_text())
        .into_iter()
        .rev()
        .find(|b| *b < selection.start);
    match previous {
        Some(start) => insert_text(
            state,
            &InputText::default(),
            Some(SelectionRange::new(start, selection.start)),
        ),
        None => state.clone(),
    }
}

/// Delete the selection, or the grapheme cluster after the caret.
pub fn delete_forward(state: &InputState) -> InputState {
    let selection = state.selection();
    if !selection.is_empty() {
        return insert_text(state, &InputText::default(), None);
    }
    let next = grapheme_boundaries(state.input_text())
        .into_iter()
        .find(|b| *b > selection.start);
    match next {
        Some(end) => insert_text(
            state,
            &InputText::default(),
            Some(SelectionRange::new(selection.start, end)),
        ),
        None => state.clone(),
    }
}

/// UTF-16 offsets of every extended grapheme cluster boundary.
fn grapheme_boundaries(text: &InputText) -> Vec<usize> {
    let plain = text.to_plain_string();
    let mut boundaries = Vec::with_capacity(plain.len() + 1);
    boundaries.push(0);
    let mut pos = 0;
    for grapheme in plain.graphemes(true) {
        pos += grapheme.encode_utf16().count();
        boundaries.push(pos);
    }
    boundaries
}

/// Parse a user-typed link target, assuming `https` when no scheme is given.
pub fn parse_link_url(raw: &str) -> Option<Url> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    match Url::parse(raw) {
        Ok(url) if url.has_host() || url.scheme() == "mailto" => Some(url),
        _ => Url::parse(&format!("https://{raw}"))
            .ok()
            .filter(|url| url.has_host()),
    }
}
