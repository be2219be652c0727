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

//! Callbacks through which the embedding screen customises key, paste and
//! copy handling.

use std::path::PathBuf;
use std::rc::Rc;

use super::InputInteractions;
use crate::config::SendShortcut;
use crate::{InputState, InputText};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Modifiers {
    pub shift: bool,
    pub control: bool,
    pub option: bool,
    pub command: bool,
}

/// A key press forwarded by the text widget.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct KeyEvent {
    pub characters: String,
    pub modifiers: Modifiers,
}

impl KeyEvent {
    pub fn enter(modifiers: Modifiers) -> Self {
        Self {
            characters: "\r".to_owned(),
            modifiers,
        }
    }
}

/// What the widget found on the pasteboard.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PasteboardContent {
    pub text: Option<String>,
    pub file_paths: Vec<PathBuf>,
    pub has_image: bool,
}

/// Embedder callbacks. Unset hooks fall back to the defaults documented on
/// the corresponding [`InputInteractions`] method.
#[derive(Clone, Default)]
pub struct InputHooks {
    pub input_did_update: Option<Rc<dyn Fn(&InputState)>>,
    pub process_enter: Option<Rc<dyn Fn(&KeyEvent) -> bool>>,
    pub process_paste: Option<Rc<dyn Fn(&PasteboardContent) -> bool>>,
    pub process_attributed_copy: Option<Rc<dyn Fn(&InputText) -> bool>>,
    pub responder_did_update: Option<Rc<dyn Fn()>>,
    pub filter_event: Option<Rc<dyn Fn(&KeyEvent) -> bool>>,
}

impl std::fmt::Debug for InputHooks {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InputHooks")
            .field("input_did_update", &self.input_did_update.is_some())
            .field("process_enter", &self.process_enter.is_some())
            .field("process_paste", &self.process_paste.is_some())
            .field(
                "process_attributed_copy",
                &self.process_attributed_copy.is_some(),
            )
            .field("responder_did_update", &self.responder_did_update.is_some())
            .field("filter_event", &self.filter_event.is_some())
            .finish()
    }
}

impl InputInteractions {
    pub fn set_hooks(&self, hooks: InputHooks) {
        *self.hooks.borrow_mut() = hooks;
    }

    pub fn update_hooks(&self, f: impl FnOnce(&mut InputHooks)) {
        f(&mut self.hooks.borrow_mut());
    }

    // Hooks are cloned out before being called so that a hook may replace
    // the hooks without a double borrow.

    pub(crate) fn input_did_update(&self, state: &InputState) {
        let hook = self.hooks.borrow().input_did_update.clone();
        if let Some(hook) = hook {
            hook(state);
        }
    }

    /// Whether Enter was consumed (the message should be sent). Without a
    /// hook the configured [`SendShortcut`] decides.
    pub fn process_enter(&self, event: &KeyEvent) -> bool {
        let hook = self.hooks.borrow().process_enter.clone();
        match hook {
            Some(hook) => hook(event),
            None => {
                let modifiers = event.modifiers;
                match self.config.borrow().send_shortcut {
                    SendShortcut::Enter => !modifiers.shift && !modifiers.option,
                    SendShortcut::CommandEnter => modifiers.command,
                }
            }
        }
    }

    /// Whether the embedder handled the paste itself. Defaults to `false`.
    pub fn process_paste(&self, content: &PasteboardContent) -> bool {
        let hook = self.hooks.borrow().process_paste.clone();
        hook.is_some_and(|hook| hook(content))
    }

    /// Whether the embedder handled the copy itself. Defaults to `false`.
    pub fn process_attributed_copy(&self, text: &InputText) -> bool {
        let hook = self.hooks.borrow().process_attributed_copy.clone();
        hook.is_some_and(|hook| hook(text))
    }

    pub fn responder_did_update(&self) {
        let hook = self.hooks.borrow().responder_did_update.clone();
        if let Some(hook) = hook {
            hook();
        }
    }

    /// Whether the widget should accept `event`. Defaults to `true`.
    pub fn filter_event(&self, event: &KeyEvent) -> bool {
        let hook = self.hooks.borrow().filter_event.clone();
        hook.map_or(true, |hook| hook(event))
    }
}
