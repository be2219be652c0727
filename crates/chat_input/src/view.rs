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

//! Keeps a host text widget in step with an [`InputInteractions`] value.
//!
//! The widget is reached only through [`HostTextView`]. Whenever the model
//! changes, the view compares it with what the widget currently shows; if
//! text or attributes differ it pushes an [`UndoItem`] and then overwrites
//! the widget. Edits made in the widget come back through
//! [`ChatInputView::text_did_change`] and
//! [`ChatInputView::selection_did_change`].

use std::cell::{Cell, Ref, RefCell, RefMut};
use std::collections::HashSet;
use std::rc::Rc;
use std::time::Duration;

use tracing::{debug, trace};

use crate::attachments::{
    emoji_attachments, AttachmentRegistry, AttachmentRequest, PlayPolicy,
    RendererFactory,
};
use crate::interactions::{
    InputInteractions, KeyEvent, LinkEditor, ObserverId, PasteboardContent,
    TransformOutcome, TransformReason,
};
use crate::timers::{TimerScheduler, TimerToken};
use crate::{InputState, InputText, InputTheme, SelectionRange};

/// How long spoilers stay revealed.
pub const SPOILER_REVEAL_DURATION: Duration = Duration::from_secs(5);

/// What the host widget displays.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RenderedText {
    pub text: InputText,
    pub selection: SelectionRange,
}

#[derive(Clone, Debug, PartialEq)]
pub struct RenderOptions {
    pub spoilers_revealed: bool,
    pub animated: bool,
    pub theme: InputTheme,
}

/// One step on the host's undo stack.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UndoItem {
    pub was: InputText,
    pub be: InputText,
    pub was_range: SelectionRange,
    pub be_range: SelectionRange,
}

/// The text widget the input is drawn in.
///
/// Implementations report user edits by calling
/// [`ChatInputView::text_did_change`] and may do so from inside
/// [`set_rendered`](Self::set_rendered); such calls are ignored.
pub trait HostTextView {
    fn rendered(&self) -> RenderedText;

    fn set_rendered(&mut self, rendered: RenderedText, options: &RenderOptions);

    fn push_undo(&mut self, item: UndoItem);
}

pub struct ChatInputView<H> {
    host: RefCell<H>,
    interactions: Rc<InputInteractions>,
    observer: Cell<Option<ObserverId>>,

    /// Held while the widget is being overwritten from the model.
    updating_input_state: Cell<bool>,

    theme: RefCell<InputTheme>,
    reveal_spoilers: Cell<bool>,
    spoiler_timer: Cell<Option<TimerToken>>,
    next_timer_token: Cell<u64>,
    scheduler: RefCell<Box<dyn TimerScheduler>>,
    attachments: RefCell<AttachmentRegistry>,
}

impl<H: HostTextView + 'static> ChatInputView<H> {
    /// Create a view and subscribe it to `interactions`.
    ///
    /// The current value is rendered straight away without an undo step.
    pub fn new(
        host: H,
        interactions: Rc<InputInteractions>,
        scheduler: Box<dyn TimerScheduler>,
        theme: InputTheme,
        factory: Box<dyn RendererFactory>,
    ) -> Rc<Self> {
        let play_policy = interactions.emoji_play_policy();
        let view = Rc::new(Self {
            host: RefCell::new(host),
            interactions: Rc::clone(&interactions),
            observer: Cell::new(None),
            updating_input_state: Cell::new(false),
            theme: RefCell::new(theme),
            reveal_spoilers: Cell::new(false),
            spoiler_timer: Cell::new(None),
            next_timer_token: Cell::new(0),
            scheduler: RefCell::new(scheduler),
            attachments: RefCell::new(AttachmentRegistry::new(
                factory,
                play_policy,
            )),
        });

        let weak = Rc::downgrade(&view);
        let id = interactions.add_observer(Rc::new(
            move |value: &InputState, old_value: &InputState, animated: bool| {
                if let Some(view) = weak.upgrade() {
                    view.update_input(value, old_value, animated);
                }
            },
        ));
        view.observer.set(Some(id));
        view.render(&interactions.presentation(), false, false);
        view
    }
}

impl<H: HostTextView> ChatInputView<H> {
    pub fn interactions(&self) -> &Rc<InputInteractions> {
        &self.interactions
    }

    pub fn host(&self) -> Ref<'_, H> {
        self.host.borrow()
    }

    pub fn host_mut(&self) -> RefMut<'_, H> {
        self.host.borrow_mut()
    }

    pub fn spoilers_revealed(&self) -> bool {
        self.reveal_spoilers.get()
    }

    pub fn live_attachments(&self) -> usize {
        self.attachments.borrow().len()
    }

    fn update_input(
        &self,
        value: &InputState,
        old_value: &InputState,
        animated: bool,
    ) {
        self.render(value, animated, true);
        if value != old_value {
            self.interactions.input_did_update(value);
        }
    }

    fn render(&self, value: &InputState, animated: bool, record_undo: bool) {
        self.updating_input_state.set(true);

        let rendered = self.host.borrow().rendered();
        if record_undo && rendered.text != *value.input_text() {
            debug!(
                was_len = rendered.text.len(),
                be_len = value.len(),
                "recording input undo step"
            );
            self.host.borrow_mut().push_undo(UndoItem {
                was: rendered.text,
                be: value.input_text().clone(),
                was_range: rendered.selection,
                be_range: value.selection(),
            });
        }

        let options = self.render_options(animated);
        self.host.borrow_mut().set_rendered(
            RenderedText {
                text: value.input_text().clone(),
                selection: value.selection(),
            },
            &options,
        );
        self.sync_attachments(value.input_text());

        self.updating_input_state.set(false);
    }

    fn render_options(&self, animated: bool) -> RenderOptions {
        RenderOptions {
            spoilers_revealed: self.reveal_spoilers.get(),
            animated,
            theme: self.theme.borrow().clone(),
        }
    }

    /// Create renderers for new emoji and drop those no longer in `text`.
    fn sync_attachments(&self, text: &InputText) {
        let theme = self.theme.borrow();
        let playable = !self.interactions.config.borrow().emoji_lite_mode;
        let mut registry = self.attachments.borrow_mut();
        let mut keep = HashSet::new();
        for (id, payload) in emoji_attachments(text) {
            let request = AttachmentRequest {
                id,
                payload,
                size: theme.emoji_size(),
                play_policy: registry.play_policy(),
                text_color: theme.text_color,
                playable,
            };
            registry.resolve(&request);
            keep.insert(id);
        }
        registry.retain_only(&keep);
    }

    /// Redraw the current value, e.g. after a theme or spoiler change.
    fn rerender(&self) {
        self.render(&self.interactions.presentation(), false, false);
    }

    // -----------------------------------------------------------------------
    // Host callbacks
    // -----------------------------------------------------------------------

    /// The user edited the widget: fold its content back into the model.
    pub fn text_did_change(&self) {
        if self.updating_input_state.get() {
            return;
        }
        let rendered = self.host.borrow().rendered();
        let state = InputState::new(rendered.text, rendered.selection);
        self.interactions.update_animated(false, move |_| state);
    }

    /// The widget's selection moved. Moves caused by editing arrive with
    /// the text change instead.
    pub fn selection_did_change(&self, due_to_editing: bool) {
        if due_to_editing || self.updating_input_state.get() {
            return;
        }
        let selection = self.host.borrow().rendered().selection;
        self.interactions
            .update_animated(false, |current| current.with_selection(selection));
    }

    /// Whether replacing `range` with `replacement_len` code units keeps
    /// the input within its configured limits.
    pub fn should_change_text(
        &self,
        range: SelectionRange,
        replacement_len: usize,
    ) -> bool {
        if !self.interactions.input_enabled() {
            return false;
        }
        let current = self.host.borrow().rendered().text.len();
        let range = SelectionRange::new(range.start.min(current), range.end.min(current));
        current - range.len() + replacement_len
            <= self.interactions.max_input_length()
    }

    // -----------------------------------------------------------------------
    // Spoilers
    // -----------------------------------------------------------------------

    /// Show spoiler text for [`SPOILER_REVEAL_DURATION`]. Revealing again
    /// restarts the countdown.
    pub fn reveal_spoilers(&self) {
        let mut scheduler = self.scheduler.borrow_mut();
        if let Some(pending) = self.spoiler_timer.take() {
            scheduler.cancel(pending);
        }
        let token = TimerToken(self.next_timer_token.get());
        self.next_timer_token.set(token.0 + 1);
        scheduler.schedule(SPOILER_REVEAL_DURATION, token);
        drop(scheduler);
        self.spoiler_timer.set(Some(token));
        trace!(token = token.0, "revealing spoilers");

        if !self.reveal_spoilers.replace(true) {
            self.rerender();
        }
    }

    /// Deliver a due timer. Returns whether `token` was the live one; stale
    /// or repeated tokens are ignored.
    pub fn timer_fired(&self, token: TimerToken) -> bool {
        if self.spoiler_timer.get() != Some(token) {
            trace!(token = token.0, "ignoring stale timer");
            return false;
        }
        self.spoiler_timer.set(None);
        self.reveal_spoilers.set(false);
        debug!(token = token.0, "hiding spoilers");
        self.rerender();
        true
    }

    // -----------------------------------------------------------------------
    // Appearance
    // -----------------------------------------------------------------------

    pub fn set_theme(&self, theme: InputTheme) {
        if *self.theme.borrow() == theme {
            return;
        }
        *self.theme.borrow_mut() = theme;
        self.rerender();
    }

    pub fn update_play_policy(&self, policy: PlayPolicy) {
        self.interactions
            .update_config(|config| config.emoji_play_policy = policy);
        self.attachments.borrow_mut().update_play_policy(policy);
    }

    /// Switch emoji lite mode. Live renderers are rebuilt with the new
    /// setting.
    pub fn set_emoji_lite_mode(&self, enabled: bool) {
        if self.interactions.config.borrow().emoji_lite_mode == enabled {
            return;
        }
        self.interactions
            .update_config(|config| config.emoji_lite_mode = enabled);
        self.rerender();
    }

    // -----------------------------------------------------------------------
    // Model operations
    // -----------------------------------------------------------------------

    pub fn apply_transform(
        &self,
        reason: TransformReason,
        link_editor: Option<&mut dyn LinkEditor>,
    ) -> TransformOutcome {
        self.interactions.apply_transform(reason, link_editor)
    }

    pub fn insert_text(
        &self,
        text: &InputText,
        range: Option<SelectionRange>,
    ) -> bool {
        self.interactions.insert_text(text, range)
    }

    pub fn set_to_end(&self) -> bool {
        self.interactions.set_to_end()
    }

    pub fn select_all(&self) -> bool {
        self.interactions.select_all()
    }

    pub fn set(&self, state: InputState) -> bool {
        self.interactions.set(state)
    }

    // -----------------------------------------------------------------------
    // Delegate queries
    // -----------------------------------------------------------------------

    pub fn input_enabled(&self) -> bool {
        self.interactions.input_enabled()
    }

    pub fn process_enter(&self, event: &KeyEvent) -> bool {
        self.interactions.process_enter(event)
    }

    pub fn process_paste(&self, content: &PasteboardContent) -> bool {
        self.interactions.process_paste(content)
    }

    /// Offer the selected text to the copy hook.
    pub fn process_copy(&self) -> bool {
        let state = self.interactions.presentation();
        let selected = state.input_text().substring(state.selection());
        self.interactions.process_attributed_copy(&selected)
    }

    pub fn responder_did_update(&self) {
        self.interactions.responder_did_update();
    }

    pub fn filter_event(&self, event: &KeyEvent) -> bool {
        self.interactions.filter_event(event)
    }

    pub fn max_height(&self) -> f64 {
        self.interactions.max_height()
    }

    pub fn max_input_length(&self) -> usize {
        self.interactions.max_input_length()
    }

    pub fn supports_continuity_camera(&self) -> bool {
        self.interactions.supports_continuity_camera()
    }

    pub fn can_transform(&self) -> bool {
        self.interactions.can_transform()
    }

    pub fn simple_transform_only(&self) -> bool {
        self.interactions.simple_transform_only()
    }
}

impl<H> ChatInputView<H> {
    /// Unsubscribe from the model, cancel the spoiler timer and release
    /// emoji renderers. Safe to call more than once.
    pub fn teardown(&self) {
        if let Some(id) = self.observer.take() {
            self.interactions.remove_observer(id);
        }
        if let Some(token) = self.spoiler_timer.take() {
            self.scheduler.borrow_mut().cancel(token);
        }
        self.attachments.borrow_mut().teardown();
    }
}

impl<H> Drop for ChatInputView<H> {
    fn drop(&mut self) {
        self.teardown();
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use speculoos::prelude::*;

    use super::*;
    use crate::attachments::EmojiRenderer;
    use crate::timers::ManualTimers;
    use crate::{CustomEmojiAttribute, InputConfig, TextAttribute};

    #[derive(Default)]
    struct FakeHost {
        rendered: RenderedText,
        undo_stack: Vec<UndoItem>,
        renders: Vec<RenderOptions>,
    }

    impl FakeHost {
        fn showing(text: &str) -> Self {
            Self {
                rendered: RenderedText {
                    text: InputText::new(text),
                    selection: SelectionRange::caret(text.len()),
                },
                ..Self::default()
            }
        }

        fn type_text(&mut self, text: &str) {
            let state = InputState::new(
                self.rendered.text.clone(),
                self.rendered.selection,
            );
            let typed =
                crate::formatting::insert_text(&state, &InputText::new(text), None);
            let (text, selection) = typed.into_parts();
            self.rendered = RenderedText { text, selection };
        }

        fn undo(&mut self) -> bool {
            match self.undo_stack.pop() {
                Some(item) => {
                    self.rendered = RenderedText {
                        text: item.was,
                        selection: item.was_range,
                    };
                    true
                }
                None => false,
            }
        }
    }

    impl HostTextView for FakeHost {
        fn rendered(&self) -> RenderedText {
            self.rendered.clone()
        }

        fn set_rendered(&mut self, rendered: RenderedText, options: &RenderOptions) {
            self.rendered = rendered;
            self.renders.push(options.clone());
        }

        fn push_undo(&mut self, item: UndoItem) {
            self.undo_stack.push(item);
        }
    }

    struct NullRenderer;

    impl EmojiRenderer for NullRenderer {
        fn set_play_policy(&mut self, _: PlayPolicy) {}
    }

    fn null_factory() -> Box<dyn RendererFactory> {
        Box::new(|_: &AttachmentRequest| -> Box<dyn EmojiRenderer> {
            Box::new(NullRenderer)
        })
    }

    fn view_over(
        host: FakeHost,
        state: InputState,
        timers: &ManualTimers,
    ) -> Rc<ChatInputView<FakeHost>> {
        let interactions =
            Rc::new(InputInteractions::new(state, InputConfig::default()));
        ChatInputView::new(
            host,
            interactions,
            Box::new(timers.clone()),
            InputTheme::default(),
            null_factory(),
        )
    }

    fn plain_hello() -> InputState {
        InputState::new(InputText::new("Hello"), SelectionRange::new(0, 5))
    }

    #[test]
    fn initial_render_records_no_undo() {
        let view = view_over(FakeHost::default(), plain_hello(), &ManualTimers::new());
        assert_eq!(view.host().rendered.text, InputText::new("Hello"));
        assert!(view.host().undo_stack.is_empty());
    }

    #[test]
    fn attribute_change_records_undo_before_rendering() {
        let view = view_over(FakeHost::showing("Hello"), plain_hello(), &ManualTimers::new());
        view.apply_transform(TransformReason::Attribute(TextAttribute::Bold), None);

        let host = view.host();
        assert_that!(host.undo_stack.len()).is_equal_to(1);
        let item = &host.undo_stack[0];
        assert_eq!(item.was, InputText::new("Hello"));
        assert_eq!(
            item.be,
            InputText::new("Hello").with_attribute(0..5, TextAttribute::Bold)
        );
        assert_eq!(host.rendered.text, item.be);
    }

    #[test]
    fn selection_only_change_records_nothing() {
        let view = view_over(FakeHost::showing("Hello"), plain_hello(), &ManualTimers::new());
        view.set_to_end();
        let host = view.host();
        assert!(host.undo_stack.is_empty());
        assert_eq!(host.rendered.selection, SelectionRange::caret(5));
    }

    #[test]
    fn typed_text_is_folded_into_the_model() {
        let view = view_over(FakeHost::default(), InputState::default(), &ManualTimers::new());
        view.host_mut().type_text("Hi");
        view.text_did_change();

        let state = view.interactions().presentation();
        assert_eq!(state.plain_text(), "Hi");
        assert_eq!(state.selection(), SelectionRange::caret(2));
        assert!(view.host().undo_stack.is_empty());
    }

    #[test]
    fn undo_restores_the_previous_rendering() {
        let view = view_over(FakeHost::showing("Hello"), plain_hello(), &ManualTimers::new());
        view.apply_transform(TransformReason::Attribute(TextAttribute::Italic), None);
        assert!(view.host_mut().undo());
        view.text_did_change();

        let state = view.interactions().presentation();
        assert!(state.input_text().spans().is_empty());
        assert!(view.host().undo_stack.is_empty());
    }

    #[test]
    fn selection_changes_from_editing_are_ignored() {
        let view = view_over(FakeHost::showing("Hello"), plain_hello(), &ManualTimers::new());
        view.host_mut().rendered.selection = SelectionRange::caret(1);
        view.selection_did_change(true);
        assert_eq!(
            view.interactions().presentation().selection(),
            SelectionRange::new(0, 5)
        );
        view.selection_did_change(false);
        assert_eq!(
            view.interactions().presentation().selection(),
            SelectionRange::caret(1)
        );
    }

    #[test]
    fn input_did_update_hook_sees_each_change() {
        let view = view_over(FakeHost::default(), InputState::default(), &ManualTimers::new());
        let seen = Rc::new(RefCell::new(Vec::new()));
        let s = Rc::clone(&seen);
        view.interactions().update_hooks(|hooks| {
            hooks.input_did_update = Some(Rc::new(move |state: &InputState| {
                s.borrow_mut().push(state.plain_text());
            }));
        });
        view.insert_text(&InputText::new("a"), None);
        view.insert_text(&InputText::new("b"), None);
        assert_eq!(*seen.borrow(), vec!["a".to_owned(), "ab".to_owned()]);
    }

    #[test]
    fn spoilers_hide_again_after_five_seconds() {
        let timers = ManualTimers::new();
        let view = view_over(FakeHost::default(), plain_hello(), &timers);
        view.reveal_spoilers();
        assert!(view.spoilers_revealed());
        assert!(view.host().renders.last().is_some_and(|o| o.spoilers_revealed));

        assert!(timers.advance(Duration::from_secs(4)).is_empty());
        let due = timers.advance(Duration::from_secs(1));
        assert_eq!(due.len(), 1);
        assert!(view.timer_fired(due[0]));
        assert!(!view.spoilers_revealed());
        assert!(!view.timer_fired(due[0]));
        assert!(view.host().renders.last().is_some_and(|o| !o.spoilers_revealed));
    }

    #[test]
    fn revealing_again_restarts_the_countdown() {
        let timers = ManualTimers::new();
        let view = view_over(FakeHost::default(), plain_hello(), &timers);
        view.reveal_spoilers();
        let first = timers.advance(Duration::from_secs(3));
        assert!(first.is_empty());
        view.reveal_spoilers();
        assert_that!(timers.pending_count()).is_equal_to(1);
        assert!(timers.advance(Duration::from_secs(2)).is_empty());
        let due = timers.advance(Duration::from_secs(3));
        assert!(view.timer_fired(due[0]));
        assert!(!view.spoilers_revealed());
    }

    #[test]
    fn emoji_renderers_follow_the_text() {
        let emoji = TextAttribute::CustomEmoji(CustomEmojiAttribute::new(42));
        let text = InputText::new("ab").with_attribute(0..1, emoji.clone());
        let view = view_over(
            FakeHost::default(),
            InputState::with_caret_at_end(text),
            &ManualTimers::new(),
        );
        assert_that!(view.live_attachments()).is_equal_to(1);
        view.insert_text(&InputText::new("x").with_attribute(0..1, emoji), None);
        assert_that!(view.live_attachments()).is_equal_to(2);
        view.set(InputState::default());
        assert_that!(view.live_attachments()).is_equal_to(0);
    }

    #[test]
    fn lite_mode_rebuilds_live_emoji_renderers() {
        let requested = Rc::new(RefCell::new(Vec::new()));
        let log = Rc::clone(&requested);
        let factory = move |request: &AttachmentRequest| -> Box<dyn EmojiRenderer> {
            log.borrow_mut().push(request.playable);
            Box::new(NullRenderer)
        };
        let emoji = TextAttribute::CustomEmoji(CustomEmojiAttribute::new(3));
        let text = InputText::new("ab").with_attribute(0..1, emoji);
        let view = ChatInputView::new(
            FakeHost::default(),
            Rc::new(InputInteractions::default()),
            Box::new(ManualTimers::new()),
            InputTheme::default(),
            Box::new(factory),
        );
        view.set(InputState::with_caret_at_end(text));
        assert_eq!(*requested.borrow(), vec![true]);

        view.set_emoji_lite_mode(true);
        view.set_emoji_lite_mode(true);
        assert_eq!(*requested.borrow(), vec![true, false]);
        assert_that!(view.live_attachments()).is_equal_to(1);
    }

    #[test]
    fn length_limit_is_enforced() {
        let view = view_over(FakeHost::showing("Hello"), plain_hello(), &ManualTimers::new());
        view.interactions()
            .update_config(|config| config.max_input_length = 6);
        assert!(view.should_change_text(SelectionRange::caret(5), 1));
        assert!(!view.should_change_text(SelectionRange::caret(5), 2));
        assert!(view.should_change_text(SelectionRange::new(0, 5), 6));
    }

    #[test]
    fn dropping_the_view_unsubscribes_it() {
        let timers = ManualTimers::new();
        let view = view_over(FakeHost::default(), plain_hello(), &timers);
        let interactions = Rc::clone(view.interactions());
        view.reveal_spoilers();
        assert_eq!(interactions.observer_count(), 1);
        drop(view);
        assert_eq!(interactions.observer_count(), 0);
        assert_that!(timers.pending_count()).is_equal_to(0);
    }
}
