#![forbid(unsafe_code)]

//! Transient user-facing notifications.
//!
//! The queue provides:
//! - FIFO ordering with severity priority (errors are shown first)
//! - A maximum visible limit; the rest wait their turn
//! - Content-based deduplication within a short window
//! - Automatic dismissal a fixed time after a notification is shown
//!
//! Hosts drive the queue with [`NotificationQueue::tick`] and render the
//! returned [`QueueAction`]s; nothing here draws anything.
//!
//! # Example
//!
//! ```
//! use std::time::Duration;
//! use quill_runtime::notification::{NotificationQueue, QueueAction, QueueConfig, Severity};
//! use web_time::Instant;
//!
//! let t0 = Instant::now();
//! let mut queue = NotificationQueue::new(QueueConfig::default());
//! queue.push("Document saved successfully", Severity::Success, t0);
//!
//! let shown = queue.tick(t0);
//! assert!(matches!(&shown[0], QueueAction::Show(n) if n.severity == Severity::Success));
//!
//! let hidden = queue.tick(t0 + Duration::from_secs(3));
//! assert!(matches!(hidden[0], QueueAction::Hide(_)));
//! ```

use std::collections::{HashMap, VecDeque};
use std::fmt;
use std::time::Duration;

use web_time::Instant;

/// Default display time of a notification.
pub const DEFAULT_DURATION: Duration = Duration::from_millis(3000);

/// How a notification is styled.
///
/// Ordering doubles as queue priority: `Error` jumps ahead of `Warning`,
/// which jumps ahead of `Success`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub enum Severity {
    #[default]
    Success,
    Warning,
    Error,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Success => "success",
            Self::Warning => "warning",
            Self::Error => "error",
        })
    }
}

/// Identifier assigned to each accepted notification.
pub type NotificationId = u64;

/// A notification message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub id: NotificationId,
    pub message: String,
    pub severity: Severity,
}

/// Receives notifications for display.
///
/// Implemented by hosts; the runtime forwards queue actions here.
pub trait NotificationSink {
    /// Show `message` styled by `severity`.
    fn notify(&mut self, message: &str, severity: Severity);

    /// The notification with `id` has expired.
    fn dismiss(&mut self, _id: NotificationId) {}
}

/// Configuration for the notification queue.
#[derive(Debug, Clone)]
pub struct QueueConfig {
    /// Maximum number of notifications visible at once.
    pub max_visible: usize,
    /// Maximum number of notifications waiting to be shown.
    pub max_queued: usize,
    /// How long a notification stays visible.
    pub duration: Duration,
    /// Identical messages within this window are dropped.
    pub dedup_window: Duration,
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            max_visible: 3,
            max_queued: 16,
            duration: DEFAULT_DURATION,
            dedup_window: Duration::from_secs(1),
        }
    }
}

impl QueueConfig {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn max_visible(mut self, max: usize) -> Self {
        self.max_visible = max;
        self
    }

    #[must_use]
    pub fn max_queued(mut self, max: usize) -> Self {
        self.max_queued = max;
        self
    }

    #[must_use]
    pub fn duration(mut self, duration: Duration) -> Self {
        self.duration = duration;
        self
    }

    #[must_use]
    pub fn dedup_window(mut self, window: Duration) -> Self {
        self.dedup_window = window;
        self
    }
}

/// Actions returned by `tick()` for the host to carry out.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueueAction {
    Show(Notification),
    Hide(NotificationId),
}

/// Queue statistics for monitoring and debugging.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueueStats {
    pub total_pushed: u64,
    pub overflow_count: u64,
    pub dedup_count: u64,
    pub auto_expired: u64,
}

#[derive(Debug)]
struct Visible {
    notification: Notification,
    expires_at: Instant,
}

/// Notification queue manager.
#[derive(Debug)]
pub struct NotificationQueue {
    pending: VecDeque<Notification>,
    visible: Vec<Visible>,
    config: QueueConfig,
    recent: HashMap<(Severity, String), Instant>,
    next_id: NotificationId,
    stats: QueueStats,
}

impl Default for NotificationQueue {
    fn default() -> Self {
        Self::new(QueueConfig::default())
    }
}

impl NotificationQueue {
    #[must_use]
    pub fn new(config: QueueConfig) -> Self {
        Self {
            pending: VecDeque::new(),
            visible: Vec::new(),
            config,
            recent: HashMap::new(),
            next_id: 1,
            stats: QueueStats::default(),
        }
    }

    /// Queue a notification.
    ///
    /// Returns the assigned id, or `None` if it was dropped as a duplicate
    /// or because the queue is full of equal-or-higher severity entries.
    pub fn push(
        &mut self,
        message: impl Into<String>,
        severity: Severity,
        now: Instant,
    ) -> Option<NotificationId> {
        self.stats.total_pushed += 1;
        let message = message.into();

        let window = self.config.dedup_window;
        self.recent
            .retain(|_, seen| now.saturating_duration_since(*seen) < window);
        let key = (severity, message);
        if self.recent.contains_key(&key) {
            self.stats.dedup_count += 1;
            return None;
        }

        if self.pending.len() >= self.config.max_queued {
            self.stats.overflow_count += 1;
            let lowest = self
                .pending
                .iter()
                .enumerate()
                .min_by_key(|(_, n)| n.severity)
                .map(|(i, n)| (i, n.severity));
            match lowest {
                Some((idx, lowest)) if lowest < severity => {
                    self.pending.remove(idx);
                }
                _ => return None,
            }
        }

        self.recent.insert(key.clone(), now);
        let (severity, message) = key;
        let id = self.next_id;
        self.next_id += 1;
        let notification = Notification {
            id,
            message,
            severity,
        };
        let idx = self
            .pending
            .iter()
            .position(|n| n.severity < severity)
            .unwrap_or(self.pending.len());
        self.pending.insert(idx, notification);
        Some(id)
    }

    /// Expire visible notifications and promote pending ones.
    pub fn tick(&mut self, now: Instant) -> Vec<QueueAction> {
        let mut actions = Vec::new();

        let before = self.visible.len();
        self.visible.retain(|v| {
            if now >= v.expires_at {
                actions.push(QueueAction::Hide(v.notification.id));
                false
            } else {
                true
            }
        });
        self.stats.auto_expired += (before - self.visible.len()) as u64;

        while self.visible.len() < self.config.max_visible {
            let Some(notification) = self.pending.pop_front() else {
                break;
            };
            actions.push(QueueAction::Show(notification.clone()));
            self.visible.push(Visible {
                notification,
                expires_at: now + self.config.duration,
            });
        }

        actions
    }

    /// Earliest instant at which `tick` has something to do.
    #[must_use]
    pub fn next_deadline(&self) -> Option<Instant> {
        self.visible.iter().map(|v| v.expires_at).min()
    }

    /// Whether there are queued notifications and room to show them.
    #[must_use]
    pub fn has_promotable(&self) -> bool {
        !self.pending.is_empty() && self.visible.len() < self.config.max_visible
    }

    pub fn visible(&self) -> impl Iterator<Item = &Notification> {
        self.visible.iter().map(|v| &v.notification)
    }

    #[must_use]
    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    #[must_use]
    pub fn visible_count(&self) -> usize {
        self.visible.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pending.is_empty() && self.visible.is_empty()
    }

    #[must_use]
    pub fn stats(&self) -> &QueueStats {
        &self.stats
    }

    #[must_use]
    pub fn config(&self) -> &QueueConfig {
        &self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn shown(actions: &[QueueAction]) -> Vec<String> {
        actions
            .iter()
            .filter_map(|a| match a {
                QueueAction::Show(n) => Some(n.message.clone()),
                QueueAction::Hide(_) => None,
            })
            .collect()
    }

    #[test]
    fn push_then_tick_shows() {
        let t0 = Instant::now();
        let mut q = NotificationQueue::default();
        let id = q.push("hello", Severity::Success, t0).unwrap();
        assert_eq!(q.pending_count(), 1);
        let actions = q.tick(t0);
        assert_eq!(
            actions,
            vec![QueueAction::Show(Notification {
                id,
                message: "hello".into(),
                severity: Severity::Success,
            })]
        );
        assert_eq!(q.visible_count(), 1);
    }

    #[test]
    fn expires_after_duration() {
        let t0 = Instant::now();
        let mut q = NotificationQueue::default();
        let id = q.push("bye", Severity::Warning, t0).unwrap();
        q.tick(t0);
        assert_eq!(q.next_deadline(), Some(t0 + DEFAULT_DURATION));
        assert!(q.tick(t0 + Duration::from_millis(2999)).is_empty());
        assert_eq!(q.tick(t0 + DEFAULT_DURATION), vec![QueueAction::Hide(id)]);
        assert!(q.is_empty());
        assert_eq!(q.stats().auto_expired, 1);
    }

    #[test]
    fn max_visible_holds_back_extras() {
        let t0 = Instant::now();
        let mut q = NotificationQueue::new(QueueConfig::new().max_visible(2));
        for msg in ["a", "b", "c"] {
            q.push(msg, Severity::Success, t0);
        }
        assert_eq!(shown(&q.tick(t0)), vec!["a", "b"]);
        assert!(!q.has_promotable());
        assert_eq!(q.pending_count(), 1);
        let later = t0 + DEFAULT_DURATION;
        assert_eq!(shown(&q.tick(later)), vec!["c"]);
    }

    #[test]
    fn errors_jump_ahead() {
        let t0 = Instant::now();
        let mut q = NotificationQueue::new(QueueConfig::new().max_visible(1));
        q.push("saved", Severity::Success, t0);
        q.push("careful", Severity::Warning, t0);
        q.push("broken", Severity::Error, t0);
        assert_eq!(shown(&q.tick(t0)), vec!["broken"]);
    }

    #[test]
    fn duplicates_within_window_are_dropped() {
        let t0 = Instant::now();
        let mut q = NotificationQueue::default();
        assert!(q.push("same", Severity::Success, t0).is_some());
        assert!(q.push("same", Severity::Success, t0 + Duration::from_millis(500)).is_none());
        // Different severity is a different notification.
        assert!(q.push("same", Severity::Error, t0).is_some());
        assert!(q.push("same", Severity::Success, t0 + Duration::from_secs(1)).is_some());
        assert_eq!(q.stats().dedup_count, 1);
    }

    #[test]
    fn overflow_drops_lower_severity() {
        let t0 = Instant::now();
        let mut q = NotificationQueue::new(QueueConfig::new().max_queued(2));
        q.push("a", Severity::Success, t0);
        q.push("b", Severity::Success, t0);
        assert!(q.push("c", Severity::Success, t0).is_none());
        assert!(q.push("d", Severity::Error, t0).is_some());
        assert_eq!(q.pending_count(), 2);
        assert_eq!(q.stats().overflow_count, 2);
        assert_eq!(shown(&q.tick(t0))[0], "d");
    }

    #[test]
    fn severity_display() {
        assert_eq!(Severity::Warning.to_string(), "warning");
        assert!(Severity::Error > Severity::Success);
    }
}
