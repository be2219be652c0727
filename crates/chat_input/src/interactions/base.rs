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

use std::cell::{Cell, RefCell};
use std::collections::{BTreeSet, VecDeque};
use std::rc::Rc;

use tracing::{debug, trace};

use super::InputHooks;
use crate::attachments::PlayPolicy;
use crate::formatting;
use crate::{InputConfig, InputState, InputText, SelectionRange};

/// Observer callback: `(value, old_value, animated)`.
pub type ObserverFn = dyn Fn(&InputState, &InputState, bool);

/// Handle returned by [`InputInteractions::add_observer`], used to remove
/// the observer again.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ObserverId(u64);

struct Notification {
    value: InputState,
    old_value: InputState,
    animated: bool,
}

/// Marks a notification round as running until dropped, including when an
/// observer panics. Notifications still queued from a panicked round are
/// dropped.
struct NotifyingRound<'a>(&'a InputInteractions);

impl<'a> NotifyingRound<'a> {
    fn start(interactions: &'a InputInteractions) -> Self {
        interactions.notifying.set(true);
        Self(interactions)
    }
}

impl Drop for NotifyingRound<'_> {
    fn drop(&mut self) {
        self.0.notifying.set(false);
        if std::thread::panicking() {
            self.0.queue.borrow_mut().clear();
        }
    }
}

/// Owns the current input value, its configuration and the embedder hooks.
///
/// Lives on the UI thread and is shared by `Rc`; all methods take `&self`.
pub struct InputInteractions {
    /// The current value.
    presentation: RefCell<InputState>,

    pub(crate) config: RefCell<InputConfig>,

    pub(crate) hooks: RefCell<InputHooks>,

    /// Registered observers in insertion order.
    observers: RefCell<Vec<(ObserverId, Rc<ObserverFn>)>>,

    /// Notifications waiting for the current round to finish.
    queue: RefCell<VecDeque<Notification>>,

    /// Set while observers are being notified.
    notifying: Cell<bool>,

    next_observer_id: Cell<u64>,
}

impl InputInteractions {
    pub fn new(presentation: InputState, config: InputConfig) -> Self {
        Self {
            presentation: RefCell::new(presentation),
            config: RefCell::new(config),
            hooks: RefCell::new(InputHooks::default()),
            observers: RefCell::new(Vec::new()),
            queue: RefCell::new(VecDeque::new()),
            notifying: Cell::new(false),
            next_observer_id: Cell::new(0),
        }
    }

    pub fn with_config(config: InputConfig) -> Self {
        Self::new(InputState::default(), config)
    }

    /// A copy of the current value.
    pub fn presentation(&self) -> InputState {
        self.presentation.borrow().clone()
    }

    /// Replace the value with `f(current)`, notifying observers (animated)
    /// if it changed. Returns whether it changed.
    pub fn update(&self, f: impl FnOnce(&InputState) -> InputState) -> bool {
        self.update_animated(true, f)
    }

    /// As [`update`](Self::update), passing `animated` on to observers.
    pub fn update_animated(
        &self,
        animated: bool,
        f: impl FnOnce(&InputState) -> InputState,
    ) -> bool {
        let old_value = self.presentation();
        let value = f(&old_value);
        if value == old_value {
            trace!("input update produced an equal value");
            return false;
        }

        *self.presentation.borrow_mut() = value.clone();
        self.queue.borrow_mut().push_back(Notification {
            value,
            old_value,
            animated,
        });

        if self.notifying.get() {
            // The round in progress further up the stack delivers it.
            return true;
        }

        let _round = NotifyingRound::start(self);
        loop {
            let next = self.queue.borrow_mut().pop_front();
            let Some(notification) = next else {
                break;
            };
            let observers: Vec<Rc<ObserverFn>> = self
                .observers
                .borrow()
                .iter()
                .map(|(_, observer)| Rc::clone(observer))
                .collect();
            debug!(
                observers = observers.len(),
                len = notification.value.len(),
                selection = ?notification.value.selection(),
                "notifying input observers"
            );
            for observer in observers {
                observer(
                    &notification.value,
                    &notification.old_value,
                    notification.animated,
                );
            }
        }
        true
    }

    /// Register `observer`. Registering the same `Rc` twice returns the
    /// existing id.
    pub fn add_observer(&self, observer: Rc<ObserverFn>) -> ObserverId {
        let mut observers = self.observers.borrow_mut();
        if let Some((id, _)) =
            observers.iter().find(|(_, o)| Rc::ptr_eq(o, &observer))
        {
            return *id;
        }
        let id = ObserverId(self.next_observer_id.get());
        self.next_observer_id.set(id.0 + 1);
        observers.push((id, observer));
        id
    }

    /// Unregister an observer. A round already in progress still reaches it.
    pub fn remove_observer(&self, id: ObserverId) -> bool {
        let mut observers = self.observers.borrow_mut();
        let before = observers.len();
        observers.retain(|(observer_id, _)| *observer_id != id);
        observers.len() != before
    }

    pub fn observer_count(&self) -> usize {
        self.observers.borrow().len()
    }

    // -----------------------------------------------------------------------
    // Edits expressed as updates
    // -----------------------------------------------------------------------

    /// Insert `text` over `range` (default: the selection).
    pub fn insert_text(
        &self,
        text: &InputText,
        range: Option<SelectionRange>,
    ) -> bool {
        self.update(|current| formatting::insert_text(current, text, range))
    }

    pub fn set_to_end(&self) -> bool {
        self.update(formatting::set_to_end)
    }

    pub fn select_all(&self) -> bool {
        self.update(formatting::select_all)
    }

    /// Replace the whole value, e.g. when restoring a draft.
    pub fn set(&self, state: InputState) -> bool {
        self.update(move |_| state)
    }

    // -----------------------------------------------------------------------
    // Configuration
    // -----------------------------------------------------------------------

    pub fn config(&self) -> InputConfig {
        self.config.borrow().clone()
    }

    pub fn update_config(&self, f: impl FnOnce(&mut InputConfig)) {
        f(&mut self.config.borrow_mut());
    }

    pub fn max_height(&self) -> f64 {
        self.config.borrow().max_height
    }

    pub fn min_height(&self) -> f64 {
        self.config.borrow().min_height
    }

    pub fn max_input_length(&self) -> usize {
        self.config.borrow().max_input_length
    }

    pub fn supports_continuity_camera(&self) -> bool {
        self.config.borrow().supports_continuity_camera
    }

    pub fn input_enabled(&self) -> bool {
        self.config.borrow().input_enabled
    }

    pub fn can_transform(&self) -> bool {
        self.config.borrow().can_transform
    }

    pub fn simple_transform_only(&self) -> bool {
        self.config.borrow().simple_transform_only
    }

    pub fn emoji_play_policy(&self) -> PlayPolicy {
        self.config.borrow().emoji_play_policy
    }

    pub fn allowed_link_hosts(&self) -> BTreeSet<String> {
        self.config.borrow().allowed_link_hosts.clone()
    }
}

impl Default for InputInteractions {
    fn default() -> Self {
        Self::new(InputState::default(), InputConfig::default())
    }
}

impl std::fmt::Debug for InputInteractions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InputInteractions")
            .field("presentation", &self.presentation.borrow())
            .field("config", &self.config.borrow())
            .field("observers", &self.observers.borrow().len())
            .finish()
    }
}
