// SPDX-License-Identifier: GPL-3.0-only

//! Deferred session stop driven by view and app visibility
//!
//! When the camera view disappears the session is not stopped right away:
//! a grace countdown starts, and only if the view stays hidden for the
//! whole grace period is the session stopped. Backgrounding the app
//! freezes the countdown; foregrounding resumes it from where it froze.
//!
//! ```text
//! viewWillDisappear ──▶ countdown(G) ──expires──▶ session.stop()
//!        │                  │   ▲
//!        │     appWillBackground │ appWillForeground
//!        │                  ▼   │
//!        │               paused(remaining)
//!        ▼
//! viewWillAppear ──▶ cancel countdown, session.start()
//! ```
//!
//! All timer state lives behind one lock. The countdown task re-checks its
//! generation under that lock before stopping the session, so a cancel and
//! an expiry can never both take effect.

use crate::backends::camera::session::SessionController;
use crate::errors::CameraError;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, info, warn};

/// Visibility notifications forwarded by the presentation layer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VisibilityEvent {
    ViewWillAppear,
    ViewWillDisappear,
    AppWillBackground,
    AppWillForeground,
}

#[derive(Debug)]
struct TimerState {
    /// App is in the foreground
    foreground: bool,
    /// A countdown is armed (ticking or paused)
    active: bool,
    /// Time left when paused; the full grace period otherwise
    remaining: Duration,
    /// Expiry instant while ticking
    deadline: Option<Instant>,
    /// Bumped whenever the ticking countdown is superseded
    generation: u64,
    task: Option<JoinHandle<()>>,
}

struct TimerInner {
    session: SessionController,
    /// Runtime countdowns are spawned on; the hooks may run on any thread
    runtime: Handle,
    grace: Duration,
    state: Mutex<TimerState>,
}

/// Grace-period stop policy for the capture session
///
/// Must be created inside a Tokio runtime. Countdowns are spawned on that
/// runtime, so the event hooks can be called from any thread.
#[derive(Clone)]
pub struct LifecycleTimer {
    inner: Arc<TimerInner>,
}

impl LifecycleTimer {
    /// Create a timer stopping `session` after `grace` of invisibility
    pub fn new(session: SessionController, grace: Duration) -> Self {
        Self {
            inner: Arc::new(TimerInner {
                session,
                runtime: Handle::current(),
                grace,
                state: Mutex::new(TimerState {
                    foreground: true,
                    active: false,
                    remaining: grace,
                    deadline: None,
                    generation: 0,
                    task: None,
                }),
            }),
        }
    }

    /// Dispatch a visibility event to its hook
    pub fn handle(&self, event: VisibilityEvent) -> Result<(), CameraError> {
        debug!(?event, "Visibility event");
        match event {
            VisibilityEvent::ViewWillAppear => return self.view_will_appear(),
            VisibilityEvent::ViewWillDisappear => self.view_will_disappear(),
            VisibilityEvent::AppWillBackground => self.app_will_background(),
            VisibilityEvent::AppWillForeground => self.app_will_foreground(),
        }
        Ok(())
    }

    /// Camera view is going away: start a fresh grace countdown
    ///
    /// Supersedes any countdown already armed. Ignored while backgrounded.
    pub fn view_will_disappear(&self) {
        let mut state = self.inner.lock();

        if !state.foreground {
            debug!("View disappeared while backgrounded, no countdown");
            return;
        }

        TimerInner::disarm(&mut state);
        state.active = true;
        state.remaining = self.inner.grace;
        self.inner.session.schedule_grace_stop();
        TimerInner::arm(&self.inner, &mut state);

        info!(grace = ?self.inner.grace, "Grace countdown started");
    }

    /// App is being backgrounded: freeze the countdown
    pub fn app_will_background(&self) {
        let mut state = self.inner.lock();
        state.foreground = false;

        if let Some(deadline) = state.deadline {
            let remaining = deadline.saturating_duration_since(Instant::now());
            TimerInner::disarm(&mut state);
            state.remaining = remaining;
            debug!(?remaining, "Grace countdown paused");
        }
    }

    /// App is back in the foreground: resume a frozen countdown
    pub fn app_will_foreground(&self) {
        let mut state = self.inner.lock();
        state.foreground = true;

        if state.active && state.deadline.is_none() {
            debug!(remaining = ?state.remaining, "Grace countdown resumed");
            TimerInner::arm(&self.inner, &mut state);
        }
    }

    /// Camera view is visible again: cancel the countdown and run the session
    pub fn view_will_appear(&self) -> Result<(), CameraError> {
        let mut state = self.inner.lock();

        if state.active {
            info!("Grace countdown cancelled");
        }
        TimerInner::disarm(&mut state);
        state.active = false;
        state.remaining = self.inner.grace;

        self.inner.session.cancel_grace_stop();
        self.inner.session.start().inspect_err(|e| {
            warn!(error = %e, "Could not start session on view appear");
        })
    }

    /// Whether a countdown is armed (ticking or paused)
    pub fn is_active(&self) -> bool {
        self.inner.lock().active
    }

    /// Whether the countdown is currently ticking
    pub fn is_ticking(&self) -> bool {
        self.inner.lock().deadline.is_some()
    }

    /// Time left before the session is stopped, if a countdown is armed
    pub fn remaining(&self) -> Option<Duration> {
        let state = self.inner.lock();
        if !state.active {
            return None;
        }
        Some(match state.deadline {
            Some(deadline) => deadline.saturating_duration_since(Instant::now()),
            None => state.remaining,
        })
    }

    pub fn is_foreground(&self) -> bool {
        self.inner.lock().foreground
    }

    pub fn grace_period(&self) -> Duration {
        self.inner.grace
    }
}

impl TimerInner {
    fn lock(&self) -> MutexGuard<'_, TimerState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Start ticking from `state.remaining`
    fn arm(this: &Arc<Self>, state: &mut TimerState) {
        state.generation += 1;
        let generation = state.generation;
        let deadline = Instant::now() + state.remaining;
        state.deadline = Some(deadline);

        let inner = Arc::clone(this);
        state.task = Some(this.runtime.spawn(async move {
            tokio::time::sleep_until(deadline).await;
            // Stopping joins hardware workers; keep that off the async workers
            let expired = tokio::task::spawn_blocking(move || inner.expire(generation)).await;
            if let Err(e) = expired {
                warn!(error = %e, "Grace countdown expiry failed");
            }
        }));
    }

    /// Stop ticking; leaves `active` and `remaining` to the caller
    fn disarm(state: &mut TimerState) {
        state.generation += 1;
        state.deadline = None;
        if let Some(task) = state.task.take() {
            task.abort();
        }
    }

    fn expire(&self, generation: u64) {
        let mut state = self.lock();

        if state.generation != generation || !state.active {
            debug!(generation, current = state.generation, "Stale countdown ignored");
            return;
        }

        state.active = false;
        state.deadline = None;
        state.task = None;
        state.remaining = self.grace;

        info!("Grace period elapsed, stopping session");
        self.session.stop();
    }
}

impl std::fmt::Debug for LifecycleTimer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.inner.lock();
        f.debug_struct("LifecycleTimer")
            .field("grace", &self.inner.grace)
            .field("foreground", &state.foreground)
            .field("active", &state.active)
            .field("ticking", &state.deadline.is_some())
            .finish()
    }
}
