#![forbid(unsafe_code)]

//! The editor runtime loop.
//!
//! [`EditorRuntime`] owns one [`EditorSession`] and a
//! [`SubscriptionManager`] whose channel is the session's only inbox. Surface
//! observers, the capture tick and hosts (through a [`RuntimeHandle`]) all
//! post [`RuntimeMsg`]s into it; the loop applies them one at a time on its
//! own thread, so the session never needs a lock.
//!
//! Hosts that own the thread themselves call [`EditorRuntime::start`] once
//! and then [`EditorRuntime::pump`] whenever they like. Hosts that hand the
//! thread over call [`EditorRuntime::run`], which blocks until shutdown and
//! sleeps until the next autosave or notification deadline in between.

use std::sync::mpsc::{self, RecvTimeoutError};
use std::time::Duration;

use web_time::Instant;

use crate::command::{CommandOutcome, EditorCommand};
use crate::notification::{NotificationSink, QueueAction};
use crate::session::{EditorSession, SaveRecord, SessionEvent, SessionStats};
use crate::spellcheck::SuggestionMenu;
use crate::subscription::{Every, SubId, Subscription, SubscriptionManager};
use crate::surface::EditorSurface;

/// Subscription id of the periodic capture tick.
pub const CAPTURE_TICK_ID: SubId = 0x4361_7074;

/// Longest the loop sleeps when nothing is scheduled.
const IDLE_WAIT: Duration = Duration::from_millis(100);

/// Messages accepted by the runtime.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RuntimeMsg {
    /// Activity on the editing surface.
    Surface(SessionEvent),
    /// A toolbar, dialog or host command.
    Command(EditorCommand),
    /// Open the spelling suggestion menu for a word (blank: the selection).
    Suggest(String),
    /// Stop the loop and dispose the session.
    Shutdown,
}

impl From<SessionEvent> for RuntimeMsg {
    fn from(event: SessionEvent) -> Self {
        Self::Surface(event)
    }
}

impl From<EditorCommand> for RuntimeMsg {
    fn from(command: EditorCommand) -> Self {
        Self::Command(command)
    }
}

/// Cloneable sender for posting messages into a runtime.
#[derive(Debug, Clone)]
pub struct RuntimeHandle {
    sender: mpsc::Sender<RuntimeMsg>,
}

impl RuntimeHandle {
    /// Post a message. Returns `false` once the runtime is gone.
    pub fn send(&self, msg: impl Into<RuntimeMsg>) -> bool {
        self.sender.send(msg.into()).is_ok()
    }

    pub fn command(&self, command: EditorCommand) -> bool {
        self.send(command)
    }

    pub fn shutdown(&self) -> bool {
        self.send(RuntimeMsg::Shutdown)
    }
}

/// Callbacks through which the runtime reports back to its host.
pub trait RuntimeHost: NotificationSink {
    /// A command ran, either posted directly or through a shortcut.
    fn on_outcome(&mut self, _outcome: &CommandOutcome) {}

    /// The suggestion menu opened, moved or closed (`None`).
    fn on_suggestions(&mut self, _menu: Option<&SuggestionMenu>) {}

    /// The document reached storage, by an explicit save or the autosave.
    /// Hosts show this as their save status.
    fn on_saved(&mut self, _record: &SaveRecord) {}
}

/// Single-threaded owner of an editor session.
pub struct EditorRuntime<S: EditorSurface, H: RuntimeHost> {
    session: EditorSession<S>,
    subscriptions: SubscriptionManager<RuntimeMsg>,
    host: H,
    started: bool,
}

impl<S: EditorSurface, H: RuntimeHost> std::fmt::Debug for EditorRuntime<S, H> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EditorRuntime")
            .field("session", &self.session)
            .field("subscriptions", &self.subscriptions.active_ids())
            .field("started", &self.started)
            .finish_non_exhaustive()
    }
}

impl<S: EditorSurface, H: RuntimeHost> EditorRuntime<S, H> {
    #[must_use]
    pub fn new(session: EditorSession<S>, host: H) -> Self {
        Self {
            session,
            subscriptions: SubscriptionManager::new(),
            host,
            started: false,
        }
    }

    /// A sender into this runtime's queue.
    #[must_use]
    pub fn handle(&self) -> RuntimeHandle {
        RuntimeHandle {
            sender: self.subscriptions.sender(),
        }
    }

    #[must_use]
    pub fn session(&self) -> &EditorSession<S> {
        &self.session
    }

    #[must_use]
    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn host_mut(&mut self) -> &mut H {
        &mut self.host
    }

    /// Wire the surface observer and start the capture tick. Idempotent.
    pub fn start(&mut self) {
        if self.started {
            return;
        }
        self.started = true;

        let sender = self.subscriptions.sender();
        self.session
            .surface_mut()
            .subscribe(Box::new(move |event| {
                let _ = sender.send(RuntimeMsg::Surface(event));
            }));

        let interval = self.session.scheduler().capture_interval();
        let tick: Box<dyn Subscription<RuntimeMsg>> = Box::new(Every::with_id(
            CAPTURE_TICK_ID,
            interval,
            || RuntimeMsg::Surface(SessionEvent::Tick),
        ));
        self.subscriptions.reconcile(vec![tick]);
        tracing::info!(
            target: "quill.runtime",
            capture_interval_ms = interval.as_millis() as u64,
            "runtime started"
        );
    }

    /// Apply every queued message, then fire due timers.
    ///
    /// Returns `false` once a shutdown message has been seen.
    pub fn pump(&mut self) -> bool {
        for msg in self.subscriptions.drain_messages() {
            if !self.dispatch(msg, Instant::now()) {
                self.poll(Instant::now());
                return false;
            }
        }
        self.poll(Instant::now());
        true
    }

    /// Run until shutdown, then dispose the session.
    pub fn run(mut self) -> (SessionStats, H) {
        self.start();
        loop {
            let timeout = self.effective_timeout(Instant::now());
            match self.subscriptions.recv_timeout(timeout) {
                Ok(msg) => {
                    if !self.dispatch(msg, Instant::now()) {
                        break;
                    }
                }
                Err(RecvTimeoutError::Timeout) => {}
                Err(RecvTimeoutError::Disconnected) => break,
            }
            self.poll(Instant::now());
        }
        self.shutdown()
    }

    /// Stop subscriptions and dispose the session. A flushed autosave is
    /// still reported to the host.
    pub fn shutdown(mut self) -> (SessionStats, H) {
        self.subscriptions.stop_all();
        let now = Instant::now();
        let saved_before = self.session.last_saved();
        self.session.settle_autosave(now);
        self.report_save(saved_before);
        let stats = self.session.dispose(now);
        tracing::info!(target: "quill.runtime", "runtime stopped");
        (stats, self.host)
    }

    fn effective_timeout(&self, now: Instant) -> Duration {
        self.session
            .next_deadline()
            .map_or(IDLE_WAIT, |deadline| {
                deadline.saturating_duration_since(now).min(IDLE_WAIT)
            })
    }

    /// Apply one message. Returns `false` on shutdown.
    fn dispatch(&mut self, msg: RuntimeMsg, now: Instant) -> bool {
        tracing::trace!(target: "quill.runtime", ?msg, "dispatch");
        let menu_before = self.session.suggestion_menu().cloned();
        let saved_before = self.session.last_saved();
        match msg {
            RuntimeMsg::Surface(event) => {
                if let Some(outcome) = self.session.handle(event, now) {
                    self.host.on_outcome(&outcome);
                }
            }
            RuntimeMsg::Command(command) => {
                let outcome = self.session.execute(command, now);
                self.host.on_outcome(&outcome);
            }
            RuntimeMsg::Suggest(word) => {
                self.session.open_suggestions(&word);
            }
            RuntimeMsg::Shutdown => return false,
        }
        let menu_after = self.session.suggestion_menu();
        if menu_after != menu_before.as_ref() {
            self.host.on_suggestions(menu_after);
        }
        self.report_save(saved_before);
        true
    }

    fn poll(&mut self, now: Instant) {
        let saved_before = self.session.last_saved();
        let actions = self.session.poll(now);
        self.report_save(saved_before);
        for action in actions {
            match action {
                QueueAction::Show(notification) => {
                    self.host.notify(&notification.message, notification.severity);
                }
                QueueAction::Hide(id) => self.host.dismiss(id),
            }
        }
    }

    fn report_save(&mut self, before: Option<SaveRecord>) {
        if let Some(record) = self.session.last_saved()
            && Some(record) != before
        {
            tracing::debug!(target: "quill.runtime", kind = ?record.kind, "save reported");
            self.host.on_saved(&record);
        }
    }
}
