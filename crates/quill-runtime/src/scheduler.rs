#![forbid(unsafe_code)]

//! Change scheduling: when to capture history and when to autosave.
//!
//! Two independent loops run side by side:
//!
//! - **Capture loop**: a periodic tick plus key-release and pointer-release
//!   heuristics. Each trigger asks for a history capture; since capture is
//!   idempotent, redundant triggers cost nothing.
//! - **Autosave loop**: a pure trailing-edge [`Debouncer`]. Every content
//!   change restarts the wait, and the write happens once the document has
//!   been quiet for the full delay. There is no maximum wait.
//!
//! All methods take an explicit `now` so behaviour is deterministic under
//! test; the runtime passes the wall clock.

use std::time::Duration;

use quill_core::event::KeyCode;
use web_time::Instant;

/// Default capture tick interval.
pub const DEFAULT_CAPTURE_INTERVAL: Duration = Duration::from_millis(1000);
/// Default autosave quiet period.
pub const DEFAULT_AUTOSAVE_DELAY: Duration = Duration::from_millis(5000);

/// State of a [`Debouncer`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DebounceState {
    #[default]
    Idle,
    /// An action is scheduled for `deadline`.
    Pending { deadline: Instant },
}

/// Trailing-edge debounce timer.
///
/// # Example
///
/// ```
/// use std::time::Duration;
/// use quill_runtime::scheduler::Debouncer;
/// use web_time::Instant;
///
/// let t0 = Instant::now();
/// let mut debounce = Debouncer::new(Duration::from_secs(5));
/// debounce.trigger(t0);
/// assert!(!debounce.poll(t0 + Duration::from_secs(4)));
/// assert!(debounce.poll(t0 + Duration::from_secs(5)));
/// assert!(!debounce.is_pending());
/// ```
#[derive(Debug, Clone)]
pub struct Debouncer {
    delay: Duration,
    state: DebounceState,
}

impl Debouncer {
    #[must_use]
    pub const fn new(delay: Duration) -> Self {
        Self {
            delay,
            state: DebounceState::Idle,
        }
    }

    #[must_use]
    pub const fn delay(&self) -> Duration {
        self.delay
    }

    #[must_use]
    pub const fn state(&self) -> DebounceState {
        self.state
    }

    /// Restart the wait: any pending deadline is replaced by `now + delay`.
    pub fn trigger(&mut self, now: Instant) {
        self.state = DebounceState::Pending {
            deadline: now + self.delay,
        };
    }

    /// Drop the pending action. Returns whether one was pending.
    pub fn cancel(&mut self) -> bool {
        let was_pending = self.is_pending();
        self.state = DebounceState::Idle;
        was_pending
    }

    /// Returns `true` exactly once when the deadline has been reached,
    /// moving back to `Idle`.
    pub fn poll(&mut self, now: Instant) -> bool {
        match self.state {
            DebounceState::Pending { deadline } if now >= deadline => {
                self.state = DebounceState::Idle;
                true
            }
            _ => false,
        }
    }

    #[must_use]
    pub const fn deadline(&self) -> Option<Instant> {
        match self.state {
            DebounceState::Pending { deadline } => Some(deadline),
            DebounceState::Idle => None,
        }
    }

    #[must_use]
    pub const fn is_pending(&self) -> bool {
        matches!(self.state, DebounceState::Pending { .. })
    }
}

/// Something that happened on the surface, as seen by the scheduler.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeTrigger {
    /// The content changed.
    Input,
    /// A key was released.
    KeyUp(KeyCode),
    /// A pointer button was released.
    PointerUp,
    /// The periodic capture tick fired.
    Tick,
}

impl ChangeTrigger {
    /// Whether this trigger should cause a history capture.
    #[must_use]
    pub const fn wants_capture(&self) -> bool {
        match self {
            Self::Input => false,
            Self::KeyUp(code) => code.edits_content(),
            Self::PointerUp | Self::Tick => true,
        }
    }
}

/// Combined capture and autosave scheduling.
#[derive(Debug, Clone)]
pub struct ChangeScheduler {
    capture_interval: Duration,
    autosave: Debouncer,
}

impl Default for ChangeScheduler {
    fn default() -> Self {
        Self::new(DEFAULT_CAPTURE_INTERVAL, DEFAULT_AUTOSAVE_DELAY)
    }
}

impl ChangeScheduler {
    #[must_use]
    pub const fn new(capture_interval: Duration, autosave_delay: Duration) -> Self {
        Self {
            capture_interval,
            autosave: Debouncer::new(autosave_delay),
        }
    }

    /// Target spacing of the periodic capture tick.
    #[must_use]
    pub const fn capture_interval(&self) -> Duration {
        self.capture_interval
    }

    /// Feed a trigger. Content input re-arms the autosave debounce.
    ///
    /// Returns whether the caller should capture history now.
    pub fn observe(&mut self, trigger: ChangeTrigger, now: Instant) -> bool {
        if trigger == ChangeTrigger::Input {
            self.autosave.trigger(now);
        }
        trigger.wants_capture()
    }

    /// Arm (or re-arm) the autosave debounce.
    pub fn arm_autosave(&mut self, now: Instant) {
        self.autosave.trigger(now);
        tracing::trace!(
            target: "quill.autosave",
            delay_ms = self.autosave.delay().as_millis() as u64,
            "autosave armed"
        );
    }

    /// Cancel a pending autosave. Returns whether one was pending.
    pub fn cancel_autosave(&mut self) -> bool {
        self.autosave.cancel()
    }

    /// Whether the autosave deadline has passed. Fires at most once per arm.
    pub fn autosave_due(&mut self, now: Instant) -> bool {
        self.autosave.poll(now)
    }

    #[must_use]
    pub const fn autosave_pending(&self) -> bool {
        self.autosave.is_pending()
    }

    #[must_use]
    pub const fn next_deadline(&self) -> Option<Instant> {
        self.autosave.deadline()
    }

    #[must_use]
    pub const fn autosave(&self) -> &Debouncer {
        &self.autosave
    }
}
