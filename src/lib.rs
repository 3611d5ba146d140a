//! Control library for a HARPIA pump-probe spectrometer.
//!
//! The instrument exposes a REST/JSON API. This crate wraps it in typed,
//! blocking device controllers and adds operator notifications for long
//! unattended measurement runs. It is used by the `harpia` command-line tool
//! and by measurement scripts written in Rust.
//!
//! - [`connector`]: request construction, status checking, JSON decoding
//! - [`instrument`]: shutters, delay line, spectrometer
//! - [`notifier`]: severity-tagged operator messages
//! - [`adapters`]: HTTP and in-memory transports

pub mod adapters;
pub mod config;
pub mod connector;
pub mod error;
pub mod instrument;
pub mod notifier;
pub mod tracing_setup;

pub use connector::HarpiaConnector;
pub use error::{HarpiaError, HarpiaResult, NotifyError};
pub use instrument::Harpia;
pub use notifier::Notifier;
