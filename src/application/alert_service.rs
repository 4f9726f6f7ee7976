//! Ordered queue of active notifications with per-alert expiry timers.
//!
//! Observers subscribe to a current-value channel and always see the full,
//! ordered list of active alerts. Every auto-closing alert owns exactly one
//! timer task; dismissing or clearing aborts it, and a timer that fires after
//! its registration was removed does nothing.

use crate::domain::{
    Alert, AlertKind, AlertOptions, Clock, SystemClock, DEFAULT_ALERT_DURATION_MS,
};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, Weak};
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::sync::watch;
use tokio::task::AbortHandle;
use tracing::{debug, warn};

/// Shared alert queue; clones refer to the same queue.
#[derive(Clone)]
pub struct AlertQueue {
    inner: Arc<AlertQueueInner>,
}

struct AlertQueueInner {
    alerts: watch::Sender<Vec<Alert>>,
    /// Pending expiry timers by alert id
    timers: Mutex<HashMap<String, AbortHandle>>,
    counter: AtomicU64,
    clock: Arc<dyn Clock>,
    default_duration_ms: u64,
}

impl Default for AlertQueue {
    fn default() -> Self {
        Self::new()
    }
}

impl AlertQueue {
    pub fn new() -> Self {
        Self::with_settings(Arc::new(SystemClock), DEFAULT_ALERT_DURATION_MS)
    }

    /// Queue with a custom clock (for `createdAtEpochMs`) and default lifetime
    pub fn with_settings(clock: Arc<dyn Clock>, default_duration_ms: u64) -> Self {
        let (alerts, _) = watch::channel(Vec::new());
        Self {
            inner: Arc::new(AlertQueueInner {
                alerts,
                timers: Mutex::new(HashMap::new()),
                counter: AtomicU64::new(0),
                clock,
                default_duration_ms,
            }),
        }
    }

    /// Options used by the `info`/`success`/`error` shortcuts
    pub fn default_options(&self) -> AlertOptions {
        AlertOptions::with_duration_ms(self.inner.default_duration_ms)
    }

    pub fn info(&self, message: impl Into<String>) -> String {
        self.push(AlertKind::Info, message, self.default_options())
    }

    pub fn success(&self, message: impl Into<String>) -> String {
        self.push(AlertKind::Success, message, self.default_options())
    }

    pub fn error(&self, message: impl Into<String>) -> String {
        self.push(AlertKind::Error, message, self.default_options())
    }

    /// Append an alert and, if it auto-closes, schedule its removal.
    ///
    /// Returns the new alert's id. Must be called from within a tokio
    /// runtime for auto-close timers to be scheduled.
    pub fn push(&self, kind: AlertKind, message: impl Into<String>, options: AlertOptions) -> String {
        let now = self.inner.clock.now_ms();
        let sequence = self.inner.counter.fetch_add(1, Ordering::Relaxed) + 1;
        let alert = Alert {
            id: format!("alert-{}-{}", now, sequence),
            kind,
            message: message.into(),
            auto_close: options.auto_close,
            created_at_epoch_ms: now,
            duration_ms: options.duration_ms,
        };
        let id = alert.id.clone();
        debug!("Pushing {} alert {}", kind.as_str(), id);

        // Held across the push so an early-firing timer always finds its entry.
        let mut timers = self.inner.lock_timers();
        self.inner.alerts.send_modify(|alerts| alerts.push(alert));

        if options.auto_close {
            match Handle::try_current() {
                Ok(handle) => {
                    let queue = Arc::downgrade(&self.inner);
                    let timer_id = id.clone();
                    let delay = Duration::from_millis(options.duration_ms);
                    let task = handle.spawn(async move {
                        tokio::time::sleep(delay).await;
                        expire(queue, &timer_id);
                    });
                    timers.insert(id.clone(), task.abort_handle());
                }
                Err(_) => warn!("No async runtime available; alert {} will not auto-close", id),
            }
        }

        id
    }

    /// Remove an alert and cancel its timer. Unknown ids are ignored.
    pub fn dismiss(&self, id: &str) {
        let mut timers = self.inner.lock_timers();
        if let Some(timer) = timers.remove(id) {
            timer.abort();
        }
        self.inner.remove_alert(id);
    }

    /// Cancel every timer and empty the queue in a single update.
    pub fn clear(&self) {
        let mut timers = self.inner.lock_timers();
        for (_, timer) in timers.drain() {
            timer.abort();
        }
        self.inner.alerts.send_if_modified(|alerts| {
            if alerts.is_empty() {
                return false;
            }
            alerts.clear();
            true
        });
    }

    /// Current active alerts in display order
    pub fn snapshot(&self) -> Vec<Alert> {
        self.inner.alerts.borrow().clone()
    }

    /// Receive the full alert list on every change
    pub fn subscribe(&self) -> watch::Receiver<Vec<Alert>> {
        self.inner.alerts.subscribe()
    }

    pub fn len(&self) -> usize {
        self.inner.alerts.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of alerts with a pending expiry timer
    pub fn pending_timers(&self) -> usize {
        self.inner.lock_timers().len()
    }
}

/// Timer callback. A no-op when the registration is gone, i.e. the alert
/// was dismissed or cleared first, or the queue itself was dropped.
fn expire(queue: Weak<AlertQueueInner>, id: &str) {
    let Some(inner) = queue.upgrade() else {
        return;
    };
    let mut timers = inner.lock_timers();
    if timers.remove(id).is_none() {
        return;
    }
    debug!("Alert {} expired", id);
    inner.remove_alert(id);
}

impl AlertQueueInner {
    fn lock_timers(&self) -> MutexGuard<'_, HashMap<String, AbortHandle>> {
        self.timers.lock().unwrap_or_else(|poisoned| {
            warn!("Alert timer table lock poisoned, recovering");
            poisoned.into_inner()
        })
    }

    fn remove_alert(&self, id: &str) {
        self.alerts.send_if_modified(|alerts| {
            let before = alerts.len();
            alerts.retain(|alert| alert.id != id);
            alerts.len() != before
        });
    }
}

impl Drop for AlertQueueInner {
    fn drop(&mut self) {
        let timers = self
            .timers
            .get_mut()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        for (_, timer) in timers.drain() {
            timer.abort();
        }
    }
}
