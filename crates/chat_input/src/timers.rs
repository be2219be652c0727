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

//! Cancellable deferred callbacks.
//!
//! The input view never spawns timers itself. It asks a [`TimerScheduler`]
//! to fire a [`TimerToken`] later, and the event loop hands the token back
//! through the view once it is due. [`ManualTimers`] drives this from
//! simulated time.

use std::cell::RefCell;
use std::rc::Rc;
use std::time::Duration;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimerToken(pub u64);

pub trait TimerScheduler {
    /// Arrange for `token` to be delivered after `delay`.
    fn schedule(&mut self, delay: Duration, token: TimerToken);

    /// Forget `token`. Cancelling an unknown or already fired token is a
    /// no-op.
    fn cancel(&mut self, token: TimerToken);
}

#[derive(Debug, Default)]
struct ManualTimersInner {
    now: Duration,
    pending: Vec<(Duration, TimerToken)>,
}

/// A scheduler over simulated time. Clones share the same clock.
#[derive(Clone, Debug, Default)]
pub struct ManualTimers {
    inner: Rc<RefCell<ManualTimersInner>>,
}

impl ManualTimers {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn now(&self) -> Duration {
        self.inner.borrow().now
    }

    pub fn pending_count(&self) -> usize {
        self.inner.borrow().pending.len()
    }

    /// Move the clock forward and return the tokens that fell due, earliest
    /// first.
    pub fn advance(&self, by: Duration) -> Vec<TimerToken> {
        let mut inner = self.inner.borrow_mut();
        inner.now += by;
        let now = inner.now;
        let (mut due, pending): (Vec<_>, Vec<_>) =
            inner.pending.drain(..).partition(|(at, _)| *at <= now);
        inner.pending = pending;
        due.sort();
        due.into_iter().map(|(_, token)| token).collect()
    }
}

impl TimerScheduler for ManualTimers {
    fn schedule(&mut self, delay: Duration, token: TimerToken) {
        let mut inner = self.inner.borrow_mut();
        let at = inner.now + delay;
        inner.pending.push((at, token));
    }

    fn cancel(&mut self, token: TimerToken) {
        self.inner.borrow_mut().pending.retain(|(_, t)| *t != token);
    }
}
