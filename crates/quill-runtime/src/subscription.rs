#![forbid(unsafe_code)]

//! Background event sources for the editor runtime.
//!
//! A [`Subscription`] runs on its own thread and only ever sends messages
//! into the runtime's channel; it never touches session state. The
//! [`SubscriptionManager`] owns that channel, starts and stops
//! subscriptions by id, and hands out extra senders so hosts can post
//! messages into the same queue.
//!
//! # How it works
//!
//! 1. The runtime declares the subscriptions it wants (the capture tick).
//! 2. [`SubscriptionManager::reconcile`] starts new ids and stops missing ones.
//! 3. The runtime blocks on [`SubscriptionManager::recv_timeout`] and routes
//!    every message to the session.

use std::collections::HashSet;
use std::sync::mpsc::{self, RecvTimeoutError};
use std::sync::{Arc, Condvar, Mutex, PoisonError};
use std::thread;
use std::time::Duration;

/// A unique identifier for a subscription.
pub type SubId = u64;

/// A subscription produces messages from an external event source.
pub trait Subscription<M: Send + 'static>: Send {
    /// Subscriptions with the same id are considered identical.
    fn id(&self) -> SubId;

    /// Run until `stop` fires or the receiver goes away.
    ///
    /// Called on a dedicated background thread.
    fn run(&self, sender: mpsc::Sender<M>, stop: StopSignal);
}

/// Cooperative stop flag handed to a running subscription.
#[derive(Clone)]
pub struct StopSignal {
    inner: Arc<(Mutex<bool>, Condvar)>,
}

impl StopSignal {
    /// Create a linked (signal, trigger) pair.
    pub(crate) fn new() -> (Self, StopTrigger) {
        let inner = Arc::new((Mutex::new(false), Condvar::new()));
        let signal = Self {
            inner: Arc::clone(&inner),
        };
        (signal, StopTrigger { inner })
    }

    #[must_use]
    pub fn is_stopped(&self) -> bool {
        let (lock, _) = &*self.inner;
        *lock.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Wait for either the stop signal or a timeout.
    ///
    /// Returns `true` if stopped, `false` if timed out.
    pub fn wait_timeout(&self, duration: Duration) -> bool {
        let (lock, cvar) = &*self.inner;
        let stopped = lock.lock().unwrap_or_else(PoisonError::into_inner);
        if *stopped {
            return true;
        }
        let (stopped, _) = cvar
            .wait_timeout_while(stopped, duration, |stopped| !*stopped)
            .unwrap_or_else(PoisonError::into_inner);
        *stopped
    }
}

/// Runtime-side half of a [`StopSignal`].
pub(crate) struct StopTrigger {
    inner: Arc<(Mutex<bool>, Condvar)>,
}

impl StopTrigger {
    pub(crate) fn stop(&self) {
        let (lock, cvar) = &*self.inner;
        let mut stopped = lock.lock().unwrap_or_else(PoisonError::into_inner);
        *stopped = true;
        cvar.notify_all();
    }
}

struct RunningSubscription {
    id: SubId,
    trigger: StopTrigger,
    thread: Option<thread::JoinHandle<()>>,
}

impl RunningSubscription {
    fn stop(mut self) {
        self.trigger.stop();
        let Some(handle) = self.thread.take() else {
            return;
        };
        if handle.join().is_err() {
            tracing::warn!(target: "quill.subscription", sub_id = self.id, "subscription thread panicked");
        }
    }
}

impl Drop for RunningSubscription {
    fn drop(&mut self) {
        self.trigger.stop();
    }
}

/// Owns the runtime's message channel and the running subscriptions.
pub struct SubscriptionManager<M: Send + 'static> {
    active: Vec<RunningSubscription>,
    sender: mpsc::Sender<M>,
    receiver: mpsc::Receiver<M>,
}

impl<M: Send + 'static> Default for SubscriptionManager<M> {
    fn default() -> Self {
        Self::new()
    }
}

impl<M: Send + 'static> SubscriptionManager<M> {
    #[must_use]
    pub fn new() -> Self {
        let (sender, receiver) = mpsc::channel();
        Self {
            active: Vec::new(),
            sender,
            receiver,
        }
    }

    /// Another sender into the runtime's queue.
    #[must_use]
    pub fn sender(&self) -> mpsc::Sender<M> {
        self.sender.clone()
    }

    /// Start subscriptions with new ids and stop those no longer declared.
    ///
    /// Subscriptions whose id is already running are left alone.
    pub fn reconcile(&mut self, subscriptions: Vec<Box<dyn Subscription<M>>>) {
        let wanted: HashSet<SubId> = subscriptions.iter().map(|s| s.id()).collect();

        let (keep, stop): (Vec<_>, Vec<_>) = self
            .active
            .drain(..)
            .partition(|running| wanted.contains(&running.id));
        self.active = keep;
        for running in stop {
            tracing::debug!(target: "quill.subscription", sub_id = running.id, "stopping subscription");
            running.stop();
        }

        let mut running_ids: HashSet<SubId> = self.active.iter().map(|r| r.id).collect();
        for sub in subscriptions {
            let id = sub.id();
            if !running_ids.insert(id) {
                continue;
            }
            tracing::debug!(target: "quill.subscription", sub_id = id, "starting subscription");
            let (signal, trigger) = StopSignal::new();
            let sender = self.sender.clone();
            let thread = thread::spawn(move || sub.run(sender, signal));
            self.active.push(RunningSubscription {
                id,
                trigger,
                thread: Some(thread),
            });
        }
    }

    /// Block until a message arrives or `timeout` elapses.
    pub fn recv_timeout(&self, timeout: Duration) -> Result<M, RecvTimeoutError> {
        self.receiver.recv_timeout(timeout)
    }

    /// Take every message already queued without blocking.
    pub fn drain_messages(&self) -> Vec<M> {
        self.receiver.try_iter().collect()
    }

    /// Ids of the running subscriptions.
    #[must_use]
    pub fn active_ids(&self) -> Vec<SubId> {
        self.active.iter().map(|r| r.id).collect()
    }

    /// Stop every running subscription and join its thread.
    pub fn stop_all(&mut self) {
        for running in self.active.drain(..) {
            running.stop();
        }
    }
}

impl<M: Send + 'static> Drop for SubscriptionManager<M> {
    fn drop(&mut self) {
        self.stop_all();
    }
}

// --- Built-in subscriptions ---

/// A subscription that fires at a fixed interval.
///
/// The interval is a target: the next wait starts only after the message
/// was sent, so spacing drifts by the send latency.
pub struct Every<M: Send + 'static> {
    id: SubId,
    interval: Duration,
    make_msg: Box<dyn Fn() -> M + Send + Sync>,
}

impl<M: Send + 'static> Every<M> {
    /// Tick subscription whose id is derived from the interval.
    pub fn new(interval: Duration, make_msg: impl Fn() -> M + Send + Sync + 'static) -> Self {
        let id = interval.as_nanos() as u64 ^ 0x5449_434B;
        Self::with_id(id, interval, make_msg)
    }

    pub fn with_id(
        id: SubId,
        interval: Duration,
        make_msg: impl Fn() -> M + Send + Sync + 'static,
    ) -> Self {
        Self {
            id,
            interval,
            make_msg: Box::new(make_msg),
        }
    }

    #[must_use]
    pub fn interval(&self) -> Duration {
        self.interval
    }
}

impl<M: Send + 'static> Subscription<M> for Every<M> {
    fn id(&self) -> SubId {
        self.id
    }

    fn run(&self, sender: mpsc::Sender<M>, stop: StopSignal) {
        while !stop.wait_timeout(self.interval) {
            if sender.send((self.make_msg)()).is_err() {
                break;
            }
        }
    }
}

/// Test double: sends its queued messages once and returns.
pub struct MockSubscription<M: Send + 'static> {
    id: SubId,
    messages: Vec<M>,
}

impl<M: Send + Clone + 'static> MockSubscription<M> {
    pub fn new(id: SubId, messages: Vec<M>) -> Self {
        Self { id, messages }
    }
}

impl<M: Send + Clone + 'static> Subscription<M> for MockSubscription<M> {
    fn id(&self) -> SubId {
        self.id
    }

    fn run(&self, sender: mpsc::Sender<M>, _stop: StopSignal) {
        for msg in &self.messages {
            if sender.send(msg.clone()).is_err() {
                break;
            }
        }
    }
}
