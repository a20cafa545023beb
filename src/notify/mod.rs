//! Notification dispatch.
//!
//! The engine hands notifications to a [`NotificationDispatcher`] only after
//! a transition has committed. Delivery failures are logged and dropped; they
//! never reach the caller of the engine.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, RwLock};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::models::{EmployeeId, IssuedToken, RequestId};

/// What happened to the request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    /// An approver is asked to decide a stage.
    ApprovalRequested,
    /// The owner's request was sent for approval.
    Submitted,
    /// The manager approved; the request moved to the accountant.
    StageApproved,
    /// The request was approved and the days debited.
    Approved,
    /// The request was rejected.
    Rejected,
    /// Someone other than the owner cancelled the request.
    Cancelled,
}

impl std::fmt::Display for NotificationKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            NotificationKind::ApprovalRequested => write!(f, "approval_requested"),
            NotificationKind::Submitted => write!(f, "submitted"),
            NotificationKind::StageApproved => write!(f, "stage_approved"),
            NotificationKind::Approved => write!(f, "approved"),
            NotificationKind::Rejected => write!(f, "rejected"),
            NotificationKind::Cancelled => write!(f, "cancelled"),
        }
    }
}

/// A message for one recipient.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    /// What happened.
    pub kind: NotificationKind,
    /// The request concerned.
    pub request_id: RequestId,
    /// Who to tell.
    pub recipient: EmployeeId,
    /// Address of the recipient, when the directory knows it.
    pub recipient_email: Option<String>,
    /// Approval links for the recipient (approve and reject).
    #[serde(default)]
    pub tokens: Vec<IssuedToken>,
}

/// Delivery failure. Logged by the dispatcher, never propagated.
#[derive(Debug, Clone, Error)]
pub enum NotifyError {
    /// The transport refused or failed the message.
    #[error("Notification transport failed: {0}")]
    Transport(String),
    /// The recipient has no usable address.
    #[error("Recipient {0} has no address")]
    NoAddress(EmployeeId),
}

/// Delivers notifications (email, chat, ...).
pub trait Notifier: Send + Sync {
    /// Delivers one notification.
    fn notify(&self, notification: &Notification) -> Result<(), NotifyError>;
}

/// Notifier that only writes a log line. Used by the binary.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify(&self, notification: &Notification) -> Result<(), NotifyError> {
        let email = notification
            .recipient_email
            .as_deref()
            .ok_or(NotifyError::NoAddress(notification.recipient))?;
        info!(
            kind = %notification.kind,
            request_id = %notification.request_id,
            recipient = %notification.recipient,
            email,
            links = notification.tokens.len(),
            "Notification sent"
        );
        Ok(())
    }
}

/// Notifier that keeps every notification in memory, for tests.
#[derive(Debug, Default)]
pub struct RecordingNotifier {
    sent: RwLock<Vec<Notification>>,
    failing: AtomicBool,
}

impl RecordingNotifier {
    /// Creates an empty recorder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every subsequent delivery fail.
    pub fn fail_deliveries(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// Notifications delivered so far.
    pub fn sent(&self) -> Vec<Notification> {
        self.sent.read().map(|s| s.clone()).unwrap_or_default()
    }

    /// Notifications of one kind delivered so far.
    pub fn sent_of(&self, kind: NotificationKind) -> Vec<Notification> {
        self.sent().into_iter().filter(|n| n.kind == kind).collect()
    }

    /// Forgets every recorded notification.
    pub fn clear(&self) {
        if let Ok(mut sent) = self.sent.write() {
            sent.clear();
        }
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&self, notification: &Notification) -> Result<(), NotifyError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(NotifyError::Transport("simulated outage".to_string()));
        }
        self.sent
            .write()
            .map_err(|_| NotifyError::Transport("recorder lock poisoned".to_string()))?
            .push(notification.clone());
        Ok(())
    }
}

/// Where deliveries run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DispatchMode {
    /// On a blocking task of the current tokio runtime; inline when there is
    /// no runtime.
    #[default]
    Background,
    /// On the calling thread, before `dispatch` returns.
    Inline,
}

/// Fire-and-forget delivery of notifications.
#[derive(Clone)]
pub struct NotificationDispatcher {
    notifier: Arc<dyn Notifier>,
    mode: DispatchMode,
}

impl NotificationDispatcher {
    /// Creates a dispatcher delivering in the background.
    pub fn new(notifier: Arc<dyn Notifier>) -> Self {
        Self {
            notifier,
            mode: DispatchMode::Background,
        }
    }

    /// Creates a dispatcher delivering on the calling thread.
    pub fn inline(notifier: Arc<dyn Notifier>) -> Self {
        Self {
            notifier,
            mode: DispatchMode::Inline,
        }
    }

    /// Delivers notifications. Never fails and never blocks on the transport
    /// in background mode.
    pub fn dispatch(&self, notifications: Vec<Notification>) {
        if notifications.is_empty() {
            return;
        }
        let handle = match self.mode {
            DispatchMode::Background => tokio::runtime::Handle::try_current().ok(),
            DispatchMode::Inline => None,
        };
        match handle {
            Some(handle) => {
                let notifier = Arc::clone(&self.notifier);
                debug!(count = notifications.len(), "Dispatching notifications in background");
                handle.spawn_blocking(move || deliver_all(notifier.as_ref(), &notifications));
            }
            None => deliver_all(self.notifier.as_ref(), &notifications),
        }
    }
}

impl std::fmt::Debug for NotificationDispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NotificationDispatcher")
            .field("mode", &self.mode)
            .finish_non_exhaustive()
    }
}

fn deliver_all(notifier: &dyn Notifier, notifications: &[Notification]) {
    for notification in notifications {
        if let Err(err) = notifier.notify(notification) {
            warn!(
                error = %err,
                kind = %notification.kind,
                request_id = %notification.request_id,
                recipient = %notification.recipient,
                "Notification delivery failed"
            );
        }
    }
}
