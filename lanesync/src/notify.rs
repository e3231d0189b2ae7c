//! Transient operator notifications
//!
//! A [`Toast`] closes itself after its display interval unless dismissed first.
//! Closing happens exactly once whichever way it is triggered; later attempts
//! are no-ops.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use crate::feedback::{Action, Notice, Tone};

pub const DEFAULT_DISPLAY: Duration = Duration::from_secs(5);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CloseReason {
    Timeout,
    Dismissed,
    Replaced,
}

/// Receives operator notices about a save or a load.
pub trait Notifier: Send + Sync {
    fn notify(&self, action: Action, notice: Notice);
}

struct ToastInner {
    notice: Notice,
    state: watch::Sender<Option<CloseReason>>,
    cancel: CancellationToken,
}

impl ToastInner {
    /// Returns true only for the call that actually closed the toast.
    fn close(&self, reason: CloseReason) -> bool {
        let closed = self.state.send_if_modified(|state| {
            if state.is_some() {
                return false;
            }
            *state = Some(reason);
            true
        });
        self.cancel.cancel();
        closed
    }
}

/// A notice on screen.
#[derive(Clone)]
pub struct Toast {
    inner: Arc<ToastInner>,
}

impl Toast {
    /// Show `notice` for `display_for`. Must be called within a tokio runtime.
    pub fn show(notice: Notice, display_for: Duration) -> Self {
        let (state, _) = watch::channel(None);
        let inner = Arc::new(ToastInner {
            notice,
            state,
            cancel: CancellationToken::new(),
        });

        let timer = inner.clone();
        tokio::spawn(async move {
            tokio::select! {
                _ = tokio::time::sleep(display_for) => {
                    if timer.close(CloseReason::Timeout) {
                        tracing::debug!("Notice expired: {}", timer.notice.message);
                    }
                }
                _ = timer.cancel.cancelled() => {}
            }
        });

        Self { inner }
    }

    pub fn notice(&self) -> &Notice {
        &self.inner.notice
    }

    pub fn is_open(&self) -> bool {
        self.inner.state.borrow().is_none()
    }

    pub fn close_reason(&self) -> Option<CloseReason> {
        *self.inner.state.borrow()
    }

    /// Close on operator request. Returns false if it was already closed.
    pub fn dismiss(&self) -> bool {
        self.inner.close(CloseReason::Dismissed)
    }

    /// Wait until the toast is closed, however that happens.
    pub async fn closed(&self) -> Option<CloseReason> {
        let mut rx = self.inner.state.subscribe();
        let state = rx.wait_for(Option::is_some).await.ok()?;
        *state
    }
}

/// Shows one toast per action. A new notice replaces the toast of the same
/// action only.
pub struct ToastNotifier {
    display_for: Duration,
    slots: Mutex<HashMap<Action, Toast>>,
}

impl ToastNotifier {
    pub fn new(display_for: Duration) -> Self {
        Self {
            display_for,
            slots: Mutex::new(HashMap::new()),
        }
    }

    /// Toast currently or most recently shown for `action`.
    pub fn current(&self, action: Action) -> Option<Toast> {
        self.slots
            .lock()
            .ok()
            .and_then(|slots| slots.get(&action).cloned())
    }

    /// Toasts still on screen.
    pub fn open(&self) -> Vec<Toast> {
        match self.slots.lock() {
            Ok(slots) => slots.values().filter(|toast| toast.is_open()).cloned().collect(),
            Err(_) => Vec::new(),
        }
    }
}

impl Default for ToastNotifier {
    fn default() -> Self {
        Self::new(DEFAULT_DISPLAY)
    }
}

impl Notifier for ToastNotifier {
    fn notify(&self, action: Action, notice: Notice) {
        match notice.tone {
            Tone::Positive => tracing::info!("{}", notice.message),
            Tone::Negative => tracing::warn!("{}", notice.message),
        }

        let toast = Toast::show(notice, self.display_for);
        let previous = match self.slots.lock() {
            Ok(mut slots) => slots.insert(action, toast),
            Err(e) => {
                tracing::error!("Notification slots poisoned: {}", e);
                return;
            }
        };

        if let Some(previous) = previous {
            previous.inner.close(CloseReason::Replaced);
        }
    }
}
