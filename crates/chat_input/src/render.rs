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

//! Text renderings of the input value for debugging and tests.
//!
//! Attributes map to HTML as follows:
//! - `Bold`          → `<strong>`
//! - `Italic`        → `<em>`
//! - `Underline`     → `<u>`
//! - `Strikethrough` → `<del>`
//! - `Monospace`     → `<code>`
//! - `Spoiler`       → `<tg-spoiler>`
//! - `TextUrl`       → `<a href="…">`
//! - `Quote`         → `<blockquote>`, or `<blockquote expandable>` when
//!   collapsed
//! - `CustomEmoji`   → `<tg-emoji emoji-id="…">`

use std::ops::Range;

use crate::attributes::{AttributeKey, TextAttribute};
use crate::{InputState, InputText};

impl InputState {
    /// Return a debug tree of the text runs with the selection marked.
    ///
    /// A caret is shown as `|`, a range as `{…}`.
    pub fn to_tree(&self) -> String {
        let selection = self.selection();
        let text = self.input_text();
        let mut out = format!("sel: ({},{})\n", selection.start, selection.end);

        let segments = text.segments();
        if segments.is_empty() {
            out.push_str("│  \"|\"\n");
            return out;
        }

        let doc_len = text.len();
        for (range, attributes) in segments {
            let marks: Vec<String> =
                attributes.into_iter().map(mark_name).collect();
            let marks = if marks.is_empty() {
                String::new()
            } else {
                format!(" [{}]", marks.join(", "))
            };
            let display = annotate_selection(
                &text.as_utf16()[range.clone()].to_string(),
                range.start,
                doc_len,
                (selection.start, selection.end),
            );
            out.push_str(&format!("│  \"{display}\"{marks}\n"));
        }
        out
    }
}

impl InputText {
    /// Render the text as HTML, escaping its content.
    pub fn to_html(&self) -> String {
        let mut html = String::new();
        let mut open_tags: Vec<Tag> = Vec::new();

        for (range, _) in self.segments() {
            let mut desired: Vec<Tag> = self
                .spans()
                .iter()
                .enumerate()
                .filter(|(_, span)| {
                    span.range.start <= range.start
                        && span.range.end >= range.end
                })
                .map(|(index, span)| Tag::new(&span.attribute, index))
                .collect();
            desired.sort_by_key(|tag| tag.rank);

            // Keep the longest shared prefix open; reopen the rest in order.
            let keep = open_tags
                .iter()
                .zip(&desired)
                .take_while(|(open, wanted)| open == wanted)
                .count();
            close_tags(&mut html, &mut open_tags, keep);
            for tag in desired.into_iter().skip(keep) {
                html.push_str(&tag.open);
                open_tags.push(tag);
            }

            html.push_str(&html_escape::encode_text(&segment_text(
                self, range,
            )));
        }

        close_tags(&mut html, &mut open_tags, 0);
        html
    }
}

/// An open HTML element. Tags compare equal when they would render the same
/// opening tag for the same run; emoji tags are also tied to their span.
#[derive(Debug, PartialEq)]
struct Tag {
    rank: (u8, AttributeKey),
    open: String,
    close: &'static str,
    span: Option<usize>,
}

impl Tag {
    fn new(attribute: &TextAttribute, span_index: usize) -> Self {
        let key = attribute.key();
        let (open, close) = match attribute {
            TextAttribute::Bold => ("<strong>".to_owned(), "</strong>"),
            TextAttribute::Italic => ("<em>".to_owned(), "</em>"),
            TextAttribute::Underline => ("<u>".to_owned(), "</u>"),
            TextAttribute::Strikethrough => ("<del>".to_owned(), "</del>"),
            TextAttribute::Monospace => ("<code>".to_owned(), "</code>"),
            TextAttribute::Spoiler => {
                ("<tg-spoiler>".to_owned(), "</tg-spoiler>")
            }
            TextAttribute::TextUrl(url) => (
                format!(
                    "<a href=\"{}\">",
                    html_escape::encode_double_quoted_attribute(url)
                ),
                "</a>",
            ),
            TextAttribute::Quote { collapsed: false } => {
                ("<blockquote>".to_owned(), "</blockquote>")
            }
            TextAttribute::Quote { collapsed: true } => {
                ("<blockquote expandable>".to_owned(), "</blockquote>")
            }
            TextAttribute::CustomEmoji(emoji) => (
                format!("<tg-emoji emoji-id=\"{}\">", emoji.file_id),
                "</tg-emoji>",
            ),
        };
        // Quotes outermost, then links, then formatting, emoji innermost.
        let rank = match key {
            AttributeKey::Quote => 0,
            AttributeKey::TextUrl => 1,
            AttributeKey::CustomEmoji => 3,
            _ => 2,
        };
        let span = matches!(key, AttributeKey::CustomEmoji).then_some(span_index);
        Self {
            rank: (rank, key),
            open,
            close,
            span,
        }
    }
}

fn close_tags(html: &mut String, open_tags: &mut Vec<Tag>, keep: usize) {
    while open_tags.len() > keep {
        if let Some(tag) = open_tags.pop() {
            html.push_str(tag.close);
        }
    }
}

fn segment_text(text: &InputText, range: Range<usize>) -> String {
    text.as_utf16()[range].to_string()
}

fn mark_name(attribute: &TextAttribute) -> String {
    match attribute {
        TextAttribute::TextUrl(url) => format!("{}=\"{url}\"", attribute.key()),
        TextAttribute::Quote { collapsed: true } => "quote(collapsed)".to_owned(),
        TextAttribute::CustomEmoji(emoji) => {
            format!("{}={}", attribute.key(), emoji.file_id)
        }
        _ => attribute.key().to_string(),
    }
}

/// Insert `|` (caret) or `{…}` (range) markers into one run of text.
///
/// `run_start` is the UTF-16 offset of the run in the document. The caret
/// is drawn before the character it precedes, or after the last character
/// of the document.
fn annotate_selection(
    text: &str,
    run_start: usize,
    doc_len: usize,
    (sel_start, sel_end): (usize, usize),
) -> String {
    let mut result = String::with_capacity(text.len() + 2);
    let mut pos = run_start;
    for ch in text.chars() {
        if pos == sel_start {
            result.push(if sel_start == sel_end { '|' } else { '{' });
        }
        result.push(ch);
        pos += ch.len_utf16();
        if pos == sel_end && sel_start != sel_end {
            result.push('}');
        }
    }
    if pos == doc_len && sel_start == doc_len && sel_end == doc_len {
        result.push('|');
    }
    result
}
