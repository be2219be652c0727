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

//! The immutable input value: attributed text plus a selection.
//!
//! All offsets are UTF-16 code units, matching platform text APIs. Ranges
//! are half-open. Every constructor and every edit normalizes the attribute
//! spans, so two values holding the same text and formatting compare equal
//! regardless of how they were built.

use std::collections::BTreeMap;
use std::ops::Range;

use widestring::{Utf16Str, Utf16String};

use crate::attributes::{AttributeKey, TextAttribute};

/// A half-open `[start, end)` range over UTF-16 code units.
///
/// Constructing a range orders its endpoints, so `start <= end` always holds.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct SelectionRange {
    pub start: usize,
    pub end: usize,
}

impl SelectionRange {
    pub fn new(start: usize, end: usize) -> Self {
        Self {
            start: start.min(end),
            end: start.max(end),
        }
    }

    /// A collapsed range (a caret) at `pos`.
    pub fn caret(pos: usize) -> Self {
        Self {
            start: pos,
            end: pos,
        }
    }

    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    pub fn as_range(&self) -> Range<usize> {
        self.start..self.end
    }

    pub fn intersects(&self, range: &Range<usize>) -> bool {
        range.start < self.end && range.end > self.start
    }
}

impl From<Range<usize>> for SelectionRange {
    fn from(range: Range<usize>) -> Self {
        Self::new(range.start, range.end)
    }
}

/// An attribute applied over a range of an [`InputText`].
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct AttributeSpan {
    pub range: Range<usize>,
    pub attribute: TextAttribute,
}

/// Text with attribute spans.
///
/// Spans are kept normalized: clipped to the text, never empty, never
/// overlapping for the same [`AttributeKey`], merged with equal neighbours
/// (custom emoji excepted) and ordered by `(start, key)`.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct InputText {
    text: Utf16String,
    spans: Vec<AttributeSpan>,
}

impl InputText {
    /// Plain text with no attributes.
    pub fn new(text: &str) -> Self {
        Self {
            text: Utf16String::from_str(text),
            spans: Vec::new(),
        }
    }

    pub fn from_utf16(text: Utf16String) -> Self {
        Self {
            text,
            spans: Vec::new(),
        }
    }

    /// Build text from raw spans. Later spans win where they overlap
    /// earlier spans of the same key.
    pub fn from_parts(text: Utf16String, spans: Vec<AttributeSpan>) -> Self {
        let mut input_text = Self { text, spans };
        input_text.normalize();
        input_text
    }

    /// Return a copy with `attribute` applied over `range`.
    pub fn with_attribute(
        mut self,
        range: Range<usize>,
        attribute: TextAttribute,
    ) -> Self {
        self.apply(range, attribute);
        self
    }

    /// Length in UTF-16 code units.
    pub fn len(&self) -> usize {
        self.text.len()
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    pub fn as_utf16(&self) -> &Utf16Str {
        &self.text
    }

    pub fn to_plain_string(&self) -> String {
        self.text.to_string()
    }

    pub fn spans(&self) -> &[AttributeSpan] {
        &self.spans
    }

    /// Attributes active at the code unit at `index`.
    pub fn attributes_at(
        &self,
        index: usize,
    ) -> impl Iterator<Item = &TextAttribute> {
        self.spans
            .iter()
            .filter(move |span| span.range.contains(&index))
            .map(|span| &span.attribute)
    }

    /// The spans of one key which overlap `range`.
    pub fn spans_for_key(
        &self,
        key: AttributeKey,
        range: Range<usize>,
    ) -> impl Iterator<Item = &AttributeSpan> {
        self.spans.iter().filter(move |span| {
            span.attribute.key() == key
                && span.range.start < range.end
                && span.range.end > range.start
        })
    }

    /// Whether every code unit of the non-empty `range` carries `key`.
    pub fn covers(&self, key: AttributeKey, range: &Range<usize>) -> bool {
        if range.start >= range.end {
            return false;
        }
        // Same-key spans never overlap and are ordered, so walk them in turn.
        let mut pos = range.start;
        for span in self.spans_for_key(key, range.clone()) {
            if span.range.start > pos {
                return false;
            }
            pos = pos.max(span.range.end);
            if pos >= range.end {
                return true;
            }
        }
        false
    }

    /// Whether `index` lies on a character boundary, i.e. does not split a
    /// surrogate pair.
    pub fn is_char_boundary(&self, index: usize) -> bool {
        let units = self.text.as_slice();
        if index == 0 || index >= units.len() {
            return index <= units.len();
        }
        !is_low_surrogate(units[index])
    }

    /// Clamp `range` to the text bounds, moving each endpoint off the middle
    /// of a surrogate pair.
    ///
    /// A caret stays a caret and moves to the start of the character it
    /// splits. A non-empty range widens to cover whole characters.
    pub fn clamp(&self, range: SelectionRange) -> SelectionRange {
        let len = self.len();
        let mut start = range.start.min(len);
        let mut end = range.end.min(len);
        if !self.is_char_boundary(start) {
            start -= 1;
        }
        if range.is_empty() {
            return SelectionRange::caret(start);
        }
        if !self.is_char_boundary(end) {
            end += 1;
        }
        SelectionRange::new(start, end)
    }

    /// Copy of the text and attributes inside `range`, re-based to 0.
    pub fn substring(&self, range: SelectionRange) -> Self {
        let range = self.clamp(range);
        let text = self.text[range.as_range()].to_owned();
        let spans = self
            .spans
            .iter()
            .filter(|span| range.intersects(&span.range))
            .map(|span| AttributeSpan {
                range: span.range.start.max(range.start) - range.start
                    ..span.range.end.min(range.end) - range.start,
                attribute: span.attribute.clone(),
            })
            .collect();
        Self::from_parts(text, spans)
    }

    /// Replace `range` with `replacement`, returning the new text.
    ///
    /// Spans straddling the replaced range are cut around it; the
    /// replacement keeps exactly its own attributes.
    pub fn replace_range(
        &self,
        range: SelectionRange,
        replacement: &InputText,
    ) -> Self {
        let range = self.clamp(range);
        let inserted = replacement.len();

        let mut text = Utf16String::with_capacity(
            self.len() - range.len() + inserted,
        );
        text.push_utfstr(&self.text[..range.start]);
        text.push_utfstr(&replacement.text);
        text.push_utfstr(&self.text[range.end..]);

        let mut spans = Vec::with_capacity(
            self.spans.len() + replacement.spans.len() + 1,
        );
        for span in &self.spans {
            if span.range.start < range.start {
                spans.push(AttributeSpan {
                    range: span.range.start..span.range.end.min(range.start),
                    attribute: span.attribute.clone(),
                });
            }
            if span.range.end > range.end {
                let start = span.range.start.max(range.end);
                spans.push(AttributeSpan {
                    range: start - range.len() + inserted
                        ..span.range.end - range.len() + inserted,
                    attribute: span.attribute.clone(),
                });
            }
        }
        spans.extend(replacement.spans.iter().map(|span| AttributeSpan {
            range: span.range.start + range.start
                ..span.range.end + range.start,
            attribute: span.attribute.clone(),
        }));

        Self::from_parts(text, spans)
    }

    /// Apply `attribute` over `range`; it replaces any same-key value there.
    pub(crate) fn apply(&mut self, range: Range<usize>, attribute: TextAttribute) {
        let range = self.clamp(range.into()).as_range();
        self.spans.push(AttributeSpan { range, attribute });
        self.normalize();
    }

    /// Cut `range` out of every span whose attribute matches `predicate`.
    pub(crate) fn remove_where(
        &mut self,
        range: Range<usize>,
        predicate: impl Fn(&TextAttribute) -> bool,
    ) {
        let mut spans = Vec::with_capacity(self.spans.len() + 1);
        for span in self.spans.drain(..) {
            let overlaps =
                span.range.start < range.end && span.range.end > range.start;
            if !overlaps || !predicate(&span.attribute) {
                spans.push(span);
                continue;
            }
            if span.range.start < range.start {
                spans.push(AttributeSpan {
                    range: span.range.start..range.start,
                    attribute: span.attribute.clone(),
                });
            }
            if span.range.end > range.end {
                spans.push(AttributeSpan {
                    range: range.end..span.range.end,
                    attribute: span.attribute,
                });
            }
        }
        self.spans = spans;
        self.normalize();
    }

    /// Split the text into maximal runs with a constant attribute set.
    pub(crate) fn segments(&self) -> Vec<(Range<usize>, Vec<&TextAttribute>)> {
        self.boundaries()
            .windows(2)
            .filter(|w| w[0] < w[1])
            .map(|w| {
                let attributes = self
                    .spans
                    .iter()
                    .filter(|span| {
                        span.range.start <= w[0] && span.range.end >= w[1]
                    })
                    .map(|span| &span.attribute)
                    .collect();
                (w[0]..w[1], attributes)
            })
            .collect()
    }

    fn boundaries(&self) -> Vec<usize> {
        let len = self.len();
        let mut boundaries = Vec::with_capacity(2 + self.spans.len() * 2);
        boundaries.push(0);
        boundaries.push(len);
        for span in &self.spans {
            boundaries.push(span.range.start.min(len));
            boundaries.push(span.range.end.min(len));
        }
        boundaries.sort_unstable();
        boundaries.dedup();
        boundaries
    }

    /// Rebuild the span list into canonical form.
    fn normalize(&mut self) {
        struct OpenRun {
            start: usize,
            end: usize,
            source: usize,
            attribute: TextAttribute,
        }

        // Spans never split a surrogate pair.
        self.spans.retain(|span| span.range.start < span.range.end);
        let snapped: Vec<Range<usize>> = self
            .spans
            .iter()
            .map(|span| self.clamp(span.range.clone().into()).as_range())
            .collect();
        for (span, range) in self.spans.iter_mut().zip(snapped) {
            span.range = range;
        }

        let boundaries = self.boundaries();
        let mut open: BTreeMap<AttributeKey, OpenRun> = BTreeMap::new();
        let mut out: Vec<AttributeSpan> = Vec::with_capacity(self.spans.len());

        for w in boundaries.windows(2) {
            let (seg_start, seg_end) = (w[0], w[1]);
            if seg_start == seg_end {
                continue;
            }

            // The last span of each key covering this segment wins.
            let mut active: BTreeMap<AttributeKey, (usize, &TextAttribute)> =
                BTreeMap::new();
            for (index, span) in self.spans.iter().enumerate() {
                if span.range.start <= seg_start
                    && span.range.end >= seg_end
                    && span.range.start < span.range.end
                {
                    active.insert(span.attribute.key(), (index, &span.attribute));
                }
            }

            let open_keys: Vec<AttributeKey> = open.keys().copied().collect();
            for key in open_keys {
                let extends = match (active.get(&key), open.get(&key)) {
                    (Some((source, attribute)), Some(run)) => {
                        run.source == *source
                            || (attribute.merges_with_neighbour()
                                && run.attribute == **attribute)
                    }
                    _ => false,
                };
                if !extends {
                    if let Some(run) = open.remove(&key) {
                        out.push(AttributeSpan {
                            range: run.start..run.end,
                            attribute: run.attribute,
                        });
                    }
                }
            }

            for (key, (source, attribute)) in active {
                match open.get_mut(&key) {
                    Some(run) => {
                        run.end = seg_end;
                        run.source = source;
                    }
                    None => {
                        open.insert(
                            key,
                            OpenRun {
                                start: seg_start,
                                end: seg_end,
                                source,
                                attribute: attribute.clone(),
                            },
                        );
                    }
                }
            }
        }

        out.extend(open.into_values().map(|run| AttributeSpan {
            range: run.start..run.end,
            attribute: run.attribute,
        }));
        out.sort_by_key(|span| (span.range.start, span.attribute.key()));
        self.spans = out;

        #[cfg(feature = "assert-invariants")]
        self.assert_invariants();
    }

    #[cfg(feature = "assert-invariants")]
    fn assert_invariants(&self) {
        for (i, a) in self.spans.iter().enumerate() {
            assert!(a.range.start < a.range.end, "empty span {a:?}");
            assert!(a.range.end <= self.len(), "span past end {a:?}");
            for b in &self.spans[i + 1..] {
                if a.attribute.key() == b.attribute.key() {
                    assert!(
                        a.range.end <= b.range.start,
                        "overlapping spans {a:?} {b:?}"
                    );
                }
            }
        }
    }
}

impl From<&str> for InputText {
    fn from(text: &str) -> Self {
        Self::new(text)
    }
}

fn is_low_surrogate(unit: u16) -> bool {
    (0xDC00..=0xDFFF).contains(&unit)
}

/// The rich-text input value: attributed text and a selection over it.
///
/// The selection is always clamped to the text.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct InputState {
    input_text: InputText,
    selection: SelectionRange,
}

impl InputState {
    pub fn new(input_text: InputText, selection: SelectionRange) -> Self {
        let selection = input_text.clamp(selection);
        Self {
            input_text,
            selection,
        }
    }

    /// Text with the caret placed after its last character.
    pub fn with_caret_at_end(input_text: InputText) -> Self {
        let end = input_text.len();
        Self {
            input_text,
            selection: SelectionRange::caret(end),
        }
    }

    pub fn input_text(&self) -> &InputText {
        &self.input_text
    }

    pub fn selection(&self) -> SelectionRange {
        self.selection
    }

    pub fn len(&self) -> usize {
        self.input_text.len()
    }

    pub fn is_empty(&self) -> bool {
        self.input_text.is_empty()
    }

    pub fn plain_text(&self) -> String {
        self.input_text.to_plain_string()
    }

    /// The same text with a different (clamped) selection.
    pub fn with_selection(&self, selection: SelectionRange) -> Self {
        Self::new(self.input_text.clone(), selection)
    }

    pub fn into_parts(self) -> (InputText, SelectionRange) {
        (self.input_text, self.selection)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attributes::CustomEmojiAttribute;

    #[test]
    fn selection_range_orders_endpoints() {
        let r = SelectionRange::new(5, 2);
        assert_eq!((r.start, r.end), (2, 5));
        assert_eq!(r.len(), 3);
    }

    #[test]
    fn selection_is_clamped_to_text() {
        let state =
            InputState::new(InputText::new("abc"), SelectionRange::new(2, 9));
        assert_eq!(state.selection(), SelectionRange::new(2, 3));
    }

    #[test]
    fn clamping_never_splits_a_surrogate_pair() {
        // \u{1F4A9} is 2 UTF-16 code units
        let text = InputText::new("a\u{1F4A9}b");
        assert_eq!(text.len(), 4);
        assert!(!text.is_char_boundary(2));
        assert_eq!(text.clamp(SelectionRange::new(2, 2)), SelectionRange::caret(1));
        assert_eq!(text.clamp(SelectionRange::new(0, 2)), SelectionRange::new(0, 3));
        assert_eq!(text.clamp(SelectionRange::new(2, 4)), SelectionRange::new(1, 4));
    }

    #[test]
    fn caret_inside_surrogate_pair_stays_a_caret() {
        let state = InputState::new(
            InputText::new("a\u{1F600}b"),
            SelectionRange::caret(2),
        );
        assert_eq!(state.selection(), SelectionRange::caret(1));
    }

    #[test]
    fn spans_splitting_a_surrogate_pair_cover_the_whole_character() {
        let text = InputText::from_parts(
            Utf16String::from_str("a\u{1F600}b"),
            vec![AttributeSpan {
                range: 2..4,
                attribute: TextAttribute::Bold,
            }],
        );
        assert_eq!(
            text.spans(),
            &[AttributeSpan {
                range: 1..4,
                attribute: TextAttribute::Bold
            }]
        );
        assert_eq!(text.to_html(), "a<strong>\u{1F600}b</strong>");
    }

    #[test]
    fn reversed_spans_are_dropped() {
        #[allow(clippy::reversed_empty_ranges)]
        let range = 3..1;
        let text = InputText::from_parts(
            Utf16String::from_str("abcd"),
            vec![AttributeSpan {
                range,
                attribute: TextAttribute::Italic,
            }],
        );
        assert!(text.spans().is_empty());
    }

    #[test]
    fn overlapping_same_key_spans_are_merged() {
        let text = InputText::new("abcdefgh")
            .with_attribute(0..4, TextAttribute::Bold)
            .with_attribute(2..6, TextAttribute::Bold);
        assert_eq!(
            text.spans(),
            &[AttributeSpan {
                range: 0..6,
                attribute: TextAttribute::Bold
            }]
        );
    }

    #[test]
    fn last_applied_value_wins_on_overlap() {
        let text = InputText::new("abcdefgh")
            .with_attribute(0..6, TextAttribute::TextUrl("https://a".into()))
            .with_attribute(4..8, TextAttribute::TextUrl("https://b".into()));
        let spans: Vec<_> = text
            .spans()
            .iter()
            .map(|s| (s.range.clone(), s.attribute.clone()))
            .collect();
        assert_eq!(
            spans,
            vec![
                (0..4, TextAttribute::TextUrl("https://a".into())),
                (4..8, TextAttribute::TextUrl("https://b".into())),
            ]
        );
    }

    #[test]
    fn adjacent_emoji_with_the_same_file_stay_separate() {
        let emoji = TextAttribute::CustomEmoji(CustomEmojiAttribute::new(42));
        let text = InputText::new("xy")
            .with_attribute(0..1, emoji.clone())
            .with_attribute(1..2, emoji);
        assert_eq!(text.spans().len(), 2);
    }

    #[test]
    fn spans_are_equal_regardless_of_construction_order() {
        let a = InputText::new("hello")
            .with_attribute(0..2, TextAttribute::Italic)
            .with_attribute(1..5, TextAttribute::Bold);
        let b = InputText::new("hello")
            .with_attribute(1..3, TextAttribute::Bold)
            .with_attribute(3..5, TextAttribute::Bold)
            .with_attribute(0..2, TextAttribute::Italic);
        assert_eq!(a, b);
    }

    #[test]
    fn replace_range_cuts_spans_around_the_replacement() {
        let text = InputText::new("Hello").with_attribute(0..5, TextAttribute::Bold);
        let replaced =
            text.replace_range(SelectionRange::new(1, 4), &InputText::new("XY"));
        assert_eq!(replaced.to_plain_string(), "HXYo");
        let ranges: Vec<_> = replaced.spans().iter().map(|s| s.range.clone()).collect();
        assert_eq!(ranges, vec![0..1, 3..4]);
    }

    #[test]
    fn substring_rebases_spans() {
        let text = InputText::new("abcdef").with_attribute(2..5, TextAttribute::Spoiler);
        let sub = text.substring(SelectionRange::new(3, 6));
        assert_eq!(sub.to_plain_string(), "def");
        assert_eq!(sub.spans()[0].range, 0..2);
    }

    #[test]
    fn covers_checks_the_whole_range() {
        let text = InputText::new("abcdef")
            .with_attribute(0..3, TextAttribute::Bold)
            .with_attribute(3..6, TextAttribute::Bold);
        assert!(text.covers(AttributeKey::Bold, &(1..6)));
        let gap = InputText::new("abcdef").with_attribute(0..3, TextAttribute::Bold);
        assert!(!gap.covers(AttributeKey::Bold, &(1..6)));
        assert!(!gap.covers(AttributeKey::Bold, &(1..1)));
    }

    #[test]
    fn remove_where_splits_spans() {
        let mut text = InputText::new("abcdef").with_attribute(0..6, TextAttribute::Underline);
        text.remove_where(2..4, |a| *a == TextAttribute::Underline);
        let ranges: Vec<_> = text.spans().iter().map(|s| s.range.clone()).collect();
        assert_eq!(ranges, vec![0..2, 4..6]);
    }
}
