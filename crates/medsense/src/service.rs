//! The reminder loop.
//!
//! One interval timer drives everything: each tick re-reads the medication
//! slot if another process changed it, asks the scheduler what is due, and
//! hands due reminders to the dispatcher on the blocking pool so a dialog
//! waiting for the user never stalls the timer.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{oneshot, Notify};
use tokio::task::JoinSet;
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, info, warn};

use crate::dispatch::{AlertDispatcher, DispatchReport};
use crate::permission::{record_consent, PermissionGate, PermissionPrompt, PermissionState};
use crate::scheduler::{Clock, DueAlert, ReminderScheduler};
use crate::store::RecordStore;

/// How long shutdown waits for reminders that are still being shown.
const SHUTDOWN_GRACE: Duration = Duration::from_secs(2);

/// A cloneable handle that stops a running [`ReminderService`].
#[derive(Debug, Clone, Default)]
pub struct ReminderHandle {
    stop_signal: Arc<AtomicBool>,
    wake: Arc<Notify>,
}

impl ReminderHandle {
    /// Create a new handle.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Signal the loop to stop.
    pub fn stop(&self) {
        self.stop_signal.store(true, Ordering::SeqCst);
        self.wake.notify_waiters();
    }

    /// Check if the stop signal has been sent.
    #[must_use]
    pub fn is_stopped(&self) -> bool {
        self.stop_signal.load(Ordering::SeqCst)
    }

    /// Wait until the stop signal is sent.
    pub async fn stopped(&self) {
        loop {
            let notified = self.wake.notified();
            if self.is_stopped() {
                return;
            }
            notified.await;
        }
    }
}

/// Counters for one run of the loop.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ServiceStats {
    /// Schedule checks performed.
    pub polls: u64,
    /// Reminders that came due.
    pub alerts: u64,
    /// Reminders a channel accepted.
    pub delivered: u64,
}

/// Runs the reminder loop.
#[derive(Debug)]
pub struct ReminderService<C: Clock> {
    store: RecordStore,
    scheduler: ReminderScheduler,
    dispatcher: Arc<AlertDispatcher>,
    gate: PermissionGate,
    clock: C,
    interval: Duration,
    handle: ReminderHandle,
    prompt: Option<Box<dyn PermissionPrompt>>,
    stats: ServiceStats,
}

impl<C: Clock> ReminderService<C> {
    /// Create a service polling every 30 seconds.
    #[must_use]
    pub fn new(
        store: RecordStore,
        dispatcher: AlertDispatcher,
        gate: PermissionGate,
        clock: C,
    ) -> Self {
        Self {
            store,
            scheduler: ReminderScheduler::new(),
            dispatcher: Arc::new(dispatcher),
            gate,
            clock,
            interval: Duration::from_secs(30),
            handle: ReminderHandle::new(),
            prompt: None,
            stats: ServiceStats::default(),
        }
    }

    /// Set the poll interval.
    #[must_use]
    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    /// Ask for notification permission at start-up if it is undetermined.
    #[must_use]
    pub fn with_prompt(mut self, prompt: Box<dyn PermissionPrompt>) -> Self {
        self.prompt = Some(prompt);
        self
    }

    /// Get a handle that can stop the loop.
    #[must_use]
    pub fn handle(&self) -> ReminderHandle {
        self.handle.clone()
    }

    /// The permission gate.
    #[must_use]
    pub fn gate(&self) -> &PermissionGate {
        &self.gate
    }

    /// The record store.
    #[must_use]
    pub fn store(&self) -> &RecordStore {
        &self.store
    }

    /// Counters so far.
    #[must_use]
    pub fn stats(&self) -> ServiceStats {
        self.stats
    }

    /// Check the schedule once at the clock's current time.
    pub fn poll_once(&mut self) -> Vec<DueAlert> {
        if self.store.refresh() {
            debug!(count = self.store.len(), "Reloaded medication list");
        }

        let now = self.clock.now();
        let due = self.scheduler.poll(now, self.store.list());
        self.stats.polls += 1;
        self.stats.alerts += due.len() as u64;

        for alert in &due {
            info!(
                medication_id = %alert.medication.id,
                name = %alert.medication.name,
                time = %alert.time,
                "Reminder due"
            );
        }
        due
    }

    /// Run until the handle is stopped.
    pub async fn run(&mut self) -> ServiceStats {
        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        let mut pending_answer = self.start_permission_prompt();
        let mut in_flight: JoinSet<DispatchReport> = JoinSet::new();
        let handle = self.handle.clone();

        info!(
            interval_secs = self.interval.as_secs_f64(),
            medications = self.store.len(),
            notifications = self.gate.notifications_enabled(),
            "Reminder loop started"
        );

        while !handle.is_stopped() {
            tokio::select! {
                _ = ticker.tick() => {
                    for alert in self.poll_once() {
                        self.spawn_dispatch(&mut in_flight, alert);
                    }
                }
                answered = next_answer(&mut pending_answer) => {
                    if let Some((gate, answer)) = answered {
                        self.apply_permission(gate, answer);
                    }
                }
                Some(joined) = in_flight.join_next(), if !in_flight.is_empty() => {
                    self.record_dispatch(joined);
                }
                () = handle.stopped() => break,
            }
        }

        if !in_flight.is_empty() {
            debug!(pending = in_flight.len(), "Waiting for reminders in progress");
            let drained = tokio::time::timeout(SHUTDOWN_GRACE, async {
                while let Some(joined) = in_flight.join_next().await {
                    self.record_dispatch(joined);
                }
            })
            .await;
            if drained.is_err() {
                warn!("Reminders still showing at shutdown");
            }
        }

        info!(
            polls = self.stats.polls,
            alerts = self.stats.alerts,
            delivered = self.stats.delivered,
            "Reminder loop stopped"
        );
        self.stats
    }

    fn spawn_dispatch(&self, in_flight: &mut JoinSet<DispatchReport>, alert: DueAlert) {
        let dispatcher = Arc::clone(&self.dispatcher);
        let notifications_enabled = self.gate.notifications_enabled();
        in_flight.spawn_blocking(move || {
            dispatcher.dispatch(&alert.medication, &alert.time, notifications_enabled)
        });
    }

    fn record_dispatch(&mut self, joined: Result<DispatchReport, tokio::task::JoinError>) {
        match joined {
            Ok(report) => {
                if let Some(channel) = report.channel {
                    self.stats.delivered += 1;
                    debug!(channel, tone = report.tone_played, "Reminder delivered");
                }
            }
            Err(e) => error!("Reminder task failed: {e}"),
        }
    }

    /// Ask on a blocking task. The gate is asked on a copy and sent back
    /// with the answer.
    fn start_permission_prompt(&mut self) -> Option<oneshot::Receiver<PromptOutcome>> {
        if !self.gate.needs_prompt() {
            return None;
        }
        let mut prompt = self.prompt.take()?;
        let mut gate = self.gate;

        let (tx, rx) = oneshot::channel();
        tokio::task::spawn_blocking(move || {
            let answer = gate.request_permission(&mut *prompt);
            let _ = tx.send((gate, answer));
        });
        Some(rx)
    }

    fn apply_permission(&mut self, gate: PermissionGate, answer: PermissionState) {
        self.gate = gate;
        if answer == PermissionState::Undetermined {
            return;
        }
        if let Err(e) = record_consent(self.store.storage(), answer) {
            warn!("Failed to record notification permission: {e}");
        }
    }
}

/// The gate after a prompt, and the answer given.
type PromptOutcome = (PermissionGate, PermissionState);

/// Resolve with the prompt's outcome, or never if there is no prompt.
/// `None` means the prompt task went away without answering.
async fn next_answer(
    pending: &mut Option<oneshot::Receiver<PromptOutcome>>,
) -> Option<PromptOutcome> {
    let Some(rx) = pending.as_mut() else {
        return std::future::pending().await;
    };
    let outcome = rx.await.ok();
    *pending = None;
    outcome
}
