//! Best-effort delivery of escalation directives.
//!
//! Delivery is fire-and-forget: a failing notifier is logged and never
//! undoes the state change that produced the directive.

mod message;

pub use message::{render, Message};

use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};

use parking_lot::Mutex;
use tracing::{info, warn};

use crate::error::NotifyError;
use crate::escalation::Directive;

/// Trait for notification transports.
pub trait Notifier: Send + Sync {
    /// Deliver one directive.
    fn deliver(&self, directive: &Directive) -> Result<(), NotifyError>;
}

/// Writes notifications to the log.
#[derive(Debug, Default)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn deliver(&self, directive: &Directive) -> Result<(), NotifyError> {
        let message = render(directive);
        info!(
            kind = %directive.kind(),
            to = %message.to,
            "Notification: {}",
            message.subject
        );
        Ok(())
    }
}

/// Appends rendered notifications to a JSON-lines file for a mailer to pick up.
#[derive(Debug)]
pub struct OutboxNotifier {
    path: PathBuf,
    lock: Mutex<()>,
}

impl OutboxNotifier {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Notifier for OutboxNotifier {
    fn deliver(&self, directive: &Directive) -> Result<(), NotifyError> {
        let mut line = serde_json::to_string(&render(directive))?;
        line.push('\n');

        let _guard = self.lock.lock();
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        file.write_all(line.as_bytes())?;
        Ok(())
    }
}

/// Deliver every directive, logging failures instead of returning them.
///
/// Returns how many were delivered.
pub fn dispatch(notifier: &dyn Notifier, directives: &[Directive]) -> usize {
    directives
        .iter()
        .filter(|directive| match notifier.deliver(directive) {
            Ok(()) => true,
            Err(e) => {
                warn!(
                    "Failed to deliver {} notification to {}: {}",
                    directive.kind(),
                    directive.recipient(),
                    e
                );
                false
            }
        })
        .count()
}
