//! Operator notifications.
//!
//! A [`Notifier`] formats severity-tagged messages, counts them per level,
//! mirrors them into `tracing`, and forwards them to an optional
//! [`NotificationChannel`] so that an operator can follow a long unattended
//! measurement from a phone.
//!
//! The notifier is a plain value owned by the caller. Nothing here exits the
//! process: [`Notifier::fatal`] hands back a [`Fatal`] and the caller decides
//! how to stop.
//!
//! ```
//! use harpia_daq::notifier::{Level, MemoryChannel, Notifier};
//!
//! let channel = MemoryChannel::new();
//! let mut notifier = Notifier::with_channel(channel.clone());
//! notifier.info("Scan 3/10 finished").unwrap();
//!
//! assert_eq!(notifier.count(Level::Info), 1);
//! assert!(channel.texts()[0].ends_with("-INFO: Scan 3/10 finished"));
//! ```

pub mod channel;
pub mod telegram;

pub use channel::{Delivery, MemoryChannel, NotificationChannel};
pub use telegram::TelegramChannel;

use crate::config::NotifierConfig;
use crate::error::NotifyError;
use chrono::{Local, NaiveDateTime};
use std::collections::BTreeMap;
use std::error::Error as StdError;
use std::fmt;
use std::path::Path;
use thiserror::Error;
use tracing::{error, info, warn};

/// Timestamp layout used in every notification line.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

const IMAGE_EXTENSIONS: [&str; 3] = ["png", "jpg", "jpeg"];

/// Notification severity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Level {
    /// Routine progress.
    Log,
    /// Noteworthy progress.
    Info,
    /// Something the operator should look at.
    Warning,
    /// A failed step; the run may continue.
    Error,
    /// The run cannot continue.
    Fatal,
}

impl Level {
    /// Every level, lowest severity first.
    pub const ALL: [Level; 5] = [
        Level::Log,
        Level::Info,
        Level::Warning,
        Level::Error,
        Level::Fatal,
    ];

    /// Label written into the notification line.
    pub fn label(self) -> &'static str {
        match self {
            Level::Log => "LOG",
            Level::Info => "INFO",
            Level::Warning => "WARNING",
            Level::Error => "ERROR",
            Level::Fatal => "FATAL",
        }
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Format one notification line: `{timestamp}-{LEVEL}: {message}`.
pub fn format_notification(level: Level, message: &str, at: NaiveDateTime) -> String {
    format!("{}-{}: {}", at.format(TIMESTAMP_FORMAT), level.label(), message)
}

/// Outcome of [`Notifier::fatal`].
///
/// Carries the delivered message and, if the channel failed, why. The caller
/// is expected to stop the run after receiving one.
#[derive(Debug, Error)]
#[error("{message}")]
pub struct Fatal {
    message: String,
    delivery_error: Option<NotifyError>,
}

impl Fatal {
    /// The message including any cause chain.
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Set if the fatal notification itself could not be delivered.
    pub fn delivery_error(&self) -> Option<&NotifyError> {
        self.delivery_error.as_ref()
    }
}

/// Severity-tagged notifications with per-level counters.
pub struct Notifier {
    channel: Option<Box<dyn NotificationChannel>>,
    counts: BTreeMap<Level, u64>,
}

impl fmt::Debug for Notifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Notifier")
            .field("has_channel", &self.channel.is_some())
            .field("counts", &self.counts)
            .finish()
    }
}

impl Default for Notifier {
    fn default() -> Self {
        Self::new(None)
    }
}

impl Notifier {
    /// Create a notifier over an optional channel.
    pub fn new(channel: Option<Box<dyn NotificationChannel>>) -> Self {
        Self {
            channel,
            counts: BTreeMap::new(),
        }
    }

    /// Notifier that only counts and traces.
    pub fn silent() -> Self {
        Self::new(None)
    }

    /// Notifier delivering to `channel`.
    pub fn with_channel(channel: impl NotificationChannel + 'static) -> Self {
        Self::new(Some(Box::new(channel)))
    }

    /// Build from the `[notifier]` section. A disabled section yields a
    /// silent notifier.
    pub fn from_config(config: &NotifierConfig) -> Result<Self, NotifyError> {
        if config.enabled {
            Ok(Self::with_channel(TelegramChannel::from_config(config)?))
        } else {
            Ok(Self::silent())
        }
    }

    /// Whether a delivery channel is attached.
    pub fn has_channel(&self) -> bool {
        self.channel.is_some()
    }

    /// Routine progress message.
    pub fn log(&mut self, message: &str) -> Result<(), NotifyError> {
        self.notify(Level::Log, message)
    }

    /// Informational message.
    pub fn info(&mut self, message: &str) -> Result<(), NotifyError> {
        self.notify(Level::Info, message)
    }

    /// Warning message.
    pub fn warning(&mut self, message: &str) -> Result<(), NotifyError> {
        self.notify(Level::Warning, message)
    }

    /// Error message.
    pub fn error(&mut self, message: &str) -> Result<(), NotifyError> {
        self.notify(Level::Error, message)
    }

    /// Format, count, trace and deliver one message at `level`.
    ///
    /// The counter and the trace event happen even if delivery fails.
    pub fn notify(&mut self, level: Level, message: &str) -> Result<(), NotifyError> {
        let line = format_notification(level, message, Local::now().naive_local());
        *self.counts.entry(level).or_insert(0) += 1;

        match level {
            Level::Log | Level::Info => info!(notification = level.label(), "{}", line),
            Level::Warning => warn!(notification = level.label(), "{}", line),
            Level::Error | Level::Fatal => error!(notification = level.label(), "{}", line),
        }

        match &self.channel {
            Some(channel) => channel.send_text(&line).map_err(|e| {
                warn!(error = %e, "Notification delivery failed");
                e
            }),
            None => Ok(()),
        }
    }

    /// Report an unrecoverable condition.
    ///
    /// The cause chain, if any, is appended after a blank line with one
    /// `caused by:` line per source.
    pub fn fatal(&mut self, message: &str, cause: Option<&(dyn StdError + 'static)>) -> Fatal {
        let mut text = message.to_string();
        if let Some(cause) = cause {
            if !text.is_empty() {
                text.push_str("\n\n");
            }
            text.push_str(&cause_chain(cause));
        }

        let delivery_error = self.notify(Level::Fatal, &text).err();
        Fatal {
            message: text,
            delivery_error,
        }
    }

    /// Send an image file.
    ///
    /// The file must exist and end in `.png`, `.jpg` or `.jpeg`. Without a
    /// channel an error notification is emitted instead.
    pub fn image(&mut self, path: impl AsRef<Path>) -> Result<(), NotifyError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(NotifyError::ImageNotFound(path.to_path_buf()));
        }
        let supported = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| IMAGE_EXTENSIONS.contains(&ext));
        if !supported {
            return Err(NotifyError::UnsupportedImageFormat(path.to_path_buf()));
        }

        match &self.channel {
            Some(channel) => channel.send_image(path),
            None => self.error("Notification channel not configured. Cannot send image."),
        }
    }

    /// Messages emitted so far at `level`.
    pub fn count(&self, level: Level) -> u64 {
        self.counts.get(&level).copied().unwrap_or(0)
    }

    /// Per-level counters, including levels never used.
    pub fn counts(&self) -> BTreeMap<Level, u64> {
        Level::ALL
            .iter()
            .map(|&level| (level, self.count(level)))
            .collect()
    }

    /// One-line summary such as `LOG=0 INFO=2 WARNING=1 ERROR=0 FATAL=0`.
    pub fn summary(&self) -> String {
        Level::ALL
            .iter()
            .map(|&level| format!("{}={}", level.label(), self.count(level)))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

fn cause_chain(cause: &(dyn StdError + 'static)) -> String {
    let mut lines = vec![cause.to_string()];
    let mut source = cause.source();
    while let Some(err) = source {
        lines.push(format!("caused by: {err}"));
        source = err.source();
    }
    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use std::io;
    use tracing_test::traced_test;

    fn at() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 3, 7)
            .unwrap()
            .and_hms_opt(9, 5, 2)
            .unwrap()
    }

    #[test]
    fn test_format_notification() {
        assert_eq!(
            format_notification(Level::Warning, "Laser power low", at()),
            "2024-03-07T09:05:02-WARNING: Laser power low"
        );
        assert_eq!(
            format_notification(Level::Fatal, "", at()),
            "2024-03-07T09:05:02-FATAL: "
        );
    }

    #[test]
    fn test_counts_per_level() {
        let mut notifier = Notifier::silent();
        notifier.info("a").unwrap();
        notifier.info("b").unwrap();
        notifier.warning("c").unwrap();
        notifier.log("d").unwrap();

        assert_eq!(notifier.count(Level::Info), 2);
        assert_eq!(notifier.count(Level::Warning), 1);
        assert_eq!(notifier.count(Level::Error), 0);
        assert_eq!(notifier.counts().len(), 5);
        assert_eq!(notifier.summary(), "LOG=1 INFO=2 WARNING=1 ERROR=0 FATAL=0");
    }

    #[test]
    fn test_delivers_formatted_line() {
        let channel = MemoryChannel::new();
        let mut notifier = Notifier::with_channel(channel.clone());
        notifier.error("Spectrum read failed").unwrap();

        let texts = channel.texts();
        assert_eq!(texts.len(), 1);
        assert!(texts[0].ends_with("-ERROR: Spectrum read failed"));
        // "YYYY-MM-DDTHH:MM:SS" prefix
        assert_eq!(texts[0].find("-ERROR"), Some(19));
    }

    #[test]
    fn test_delivery_failure_still_counts() {
        let channel = MemoryChannel::new();
        channel.inject_next_failure("network down");
        let mut notifier = Notifier::with_channel(channel.clone());

        let err = notifier.warning("x").unwrap_err();
        assert!(matches!(err, NotifyError::Delivery(_)));
        assert_eq!(notifier.count(Level::Warning), 1);
        assert!(channel.texts().is_empty());

        notifier.warning("y").unwrap();
        assert_eq!(channel.texts().len(), 1);
    }

    #[test]
    fn test_fatal_appends_cause_chain() {
        #[derive(Debug, Error)]
        #[error("scan aborted")]
        struct ScanAborted(#[source] io::Error);

        let channel = MemoryChannel::new();
        let mut notifier = Notifier::with_channel(channel.clone());
        let cause = ScanAborted(io::Error::new(io::ErrorKind::ConnectionReset, "connection reset"));

        let fatal = notifier.fatal("Measurement stopped", Some(&cause));
        assert_eq!(
            fatal.message(),
            "Measurement stopped\n\nscan aborted\ncaused by: connection reset"
        );
        assert!(fatal.delivery_error().is_none());
        assert_eq!(notifier.count(Level::Fatal), 1);
        assert!(channel.texts()[0].contains("-FATAL: Measurement stopped"));
    }

    #[test]
    fn test_fatal_without_cause() {
        let mut notifier = Notifier::silent();
        let fatal = notifier.fatal("Out of disk", None);
        assert_eq!(fatal.to_string(), "Out of disk");
    }

    #[test]
    fn test_fatal_reports_delivery_failure() {
        let channel = MemoryChannel::new();
        channel.inject_next_failure("timeout");
        let mut notifier = Notifier::with_channel(channel);

        let fatal = notifier.fatal("Stop", None);
        assert!(fatal.delivery_error().is_some());
    }

    #[test]
    fn test_image_missing_file() {
        let channel = MemoryChannel::new();
        let mut notifier = Notifier::with_channel(channel.clone());
        let err = notifier.image("/nonexistent/plot.png").unwrap_err();
        assert!(matches!(err, NotifyError::ImageNotFound(_)));
        assert!(channel.deliveries().is_empty());
    }

    #[test]
    fn test_image_rejects_extension() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("plot.gif");
        std::fs::write(&path, b"GIF89a").unwrap();

        let channel = MemoryChannel::new();
        let mut notifier = Notifier::with_channel(channel.clone());
        let err = notifier.image(&path).unwrap_err();
        assert!(matches!(err, NotifyError::UnsupportedImageFormat(_)));
        assert!(channel.deliveries().is_empty());
    }

    #[test]
    fn test_image_delivered() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("spectrum.jpeg");
        std::fs::write(&path, [0xFF, 0xD8, 0xFF]).unwrap();

        let channel = MemoryChannel::new();
        let mut notifier = Notifier::with_channel(channel.clone());
        notifier.image(&path).unwrap();
        assert_eq!(channel.images(), vec![path]);
    }

    #[test]
    #[traced_test]
    fn test_image_without_channel_emits_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("spectrum.png");
        std::fs::write(&path, [0x89, b'P', b'N', b'G']).unwrap();

        let mut notifier = Notifier::silent();
        notifier.image(&path).unwrap();
        assert_eq!(notifier.count(Level::Error), 1);
        assert!(logs_contain("Notification channel not configured"));
    }

    #[test]
    fn test_disabled_config_is_silent() {
        let notifier = Notifier::from_config(&NotifierConfig::default()).unwrap();
        assert!(!notifier.has_channel());
    }
}
