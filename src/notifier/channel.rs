//! Delivery channels for operator notifications.

use crate::error::NotifyError;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// A destination that accepts text messages and image attachments.
///
/// Implementations are keyed to one destination (chat, channel, inbox) at
/// construction.
pub trait NotificationChannel: Send {
    /// Deliver a formatted text message.
    fn send_text(&self, text: &str) -> Result<(), NotifyError>;

    /// Deliver an image file. The path has already been validated.
    fn send_image(&self, path: &Path) -> Result<(), NotifyError>;
}

/// One delivery recorded by [`MemoryChannel`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Delivery {
    /// A text message.
    Text(String),
    /// An image attachment.
    Image(PathBuf),
}

#[derive(Debug, Default)]
struct MemoryState {
    deliveries: Vec<Delivery>,
    fail_next: Option<String>,
}

/// In-memory channel that records deliveries.
///
/// Clones share state, so a test can keep a handle after moving one into a
/// [`super::Notifier`].
#[derive(Debug, Clone, Default)]
pub struct MemoryChannel {
    state: Arc<Mutex<MemoryState>>,
}

impl MemoryChannel {
    /// Create an empty channel.
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, MemoryState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Make the next delivery fail with `reason`.
    pub fn inject_next_failure(&self, reason: impl Into<String>) {
        self.state().fail_next = Some(reason.into());
    }

    /// Every successful delivery, oldest first.
    pub fn deliveries(&self) -> Vec<Delivery> {
        self.state().deliveries.clone()
    }

    /// Delivered text messages.
    pub fn texts(&self) -> Vec<String> {
        self.state()
            .deliveries
            .iter()
            .filter_map(|d| match d {
                Delivery::Text(text) => Some(text.clone()),
                Delivery::Image(_) => None,
            })
            .collect()
    }

    /// Delivered image paths.
    pub fn images(&self) -> Vec<PathBuf> {
        self.state()
            .deliveries
            .iter()
            .filter_map(|d| match d {
                Delivery::Image(path) => Some(path.clone()),
                Delivery::Text(_) => None,
            })
            .collect()
    }

    fn record(&self, delivery: Delivery) -> Result<(), NotifyError> {
        let mut state = self.state();
        if let Some(reason) = state.fail_next.take() {
            return Err(NotifyError::Delivery(reason));
        }
        state.deliveries.push(delivery);
        Ok(())
    }
}

impl NotificationChannel for MemoryChannel {
    fn send_text(&self, text: &str) -> Result<(), NotifyError> {
        self.record(Delivery::Text(text.to_string()))
    }

    fn send_image(&self, path: &Path) -> Result<(), NotifyError> {
        self.record(Delivery::Image(path.to_path_buf()))
    }
}
