//! Transient toast messages.
//!
//! A toast is appended to the notification container with an enter
//! animation class, swapped to the exit animation after the display
//! duration, and removed once the exit animation has had time to run.

use std::cell::{Cell, RefCell};
use std::rc::Rc;
use std::time::Duration;

use tracing::{debug, warn};

use tracker_common::config::Config;

use crate::dom::Dom;
use crate::render::escape_html;

const ENTER_CLASS: &str = "animate__fadeInDown";
const EXIT_CLASS: &str = "animate__fadeOutUp";

/// Bootstrap alert flavour.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Level {
    Primary,
    Danger,
}

impl Level {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Primary => "primary",
            Self::Danger => "danger",
        }
    }

    fn icon(&self) -> &'static str {
        match self {
            Self::Primary => "bi-info-circle",
            Self::Danger => "bi-exclamation-circle",
        }
    }
}

/// Appends toasts to one container.
#[derive(Debug)]
pub struct Notifier {
    container: String,
    display: Duration,
    exit: Duration,
    seq: Cell<u64>,
}

impl Notifier {
    pub fn new(container: impl Into<String>, display: Duration, exit: Duration) -> Self {
        Notifier {
            container: container.into(),
            display,
            exit,
            seq: Cell::new(0),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(
            config.notification_container.clone(),
            config.notify_display(),
            config.notify_exit(),
        )
    }

    /// Append a toast. Returns `None` (and logs) when the page has no
    /// container. The caller drives the returned [`Toast`] to dismiss it.
    pub fn show(&self, dom: &mut dyn Dom, message: &str, level: Level) -> Option<Toast> {
        if !dom.contains(&self.container) {
            warn!("Notification container #{} not found; dropped: {message}", self.container);
            return None;
        }

        let n = self.seq.get() + 1;
        self.seq.set(n);
        let id = format!("notification-{n}");

        let class = format!(
            "alert alert-{} alert-dismissible fade show modern-alert shadow-sm animate__animated {ENTER_CLASS}",
            level.as_str()
        );
        let html = format!(
            r#"<i class="bi {} me-2"></i>{}<button type="button" class="btn-close" data-bs-dismiss="alert" aria-label="Close"></button>"#,
            level.icon(),
            escape_html(message)
        );

        if !dom.append_element(&self.container, &id, &class, &html) {
            warn!("Cannot append notification to #{}", self.container);
            return None;
        }
        debug!("Notification {id} ({}): {message}", level.as_str());

        Some(Toast {
            id,
            display: self.display,
            exit: self.exit,
        })
    }
}

/// A toast on the page, waiting to be dismissed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Toast {
    pub id: String,
    display: Duration,
    exit: Duration,
}

impl Toast {
    /// Swap the enter animation for the exit animation. No-op if the node
    /// is already gone.
    pub fn begin_exit<D: Dom + ?Sized>(&self, dom: &mut D) -> bool {
        if !dom.contains(&self.id) {
            debug!("Notification {} already gone", self.id);
            return false;
        }
        dom.remove_class(&self.id, ENTER_CLASS);
        dom.add_class(&self.id, EXIT_CLASS);
        true
    }

    /// Remove the node. No-op if it is already gone.
    pub fn remove<D: Dom + ?Sized>(&self, dom: &mut D) -> bool {
        dom.remove_element(&self.id)
    }

    /// Full lifecycle: wait, start the exit animation, wait, remove.
    pub async fn run<D: Dom + ?Sized>(self, dom: Rc<RefCell<D>>) {
        sleep(self.display).await;
        self.begin_exit(&mut *dom.borrow_mut());
        sleep(self.exit).await;
        self.remove(&mut *dom.borrow_mut());
    }
}

async fn sleep(d: Duration) {
    cfg_if::cfg_if! {
        if #[cfg(target_arch = "wasm32")] {
            gloo_timers::future::sleep(d).await;
        } else {
            tokio::time::sleep(d).await;
        }
    }
}
