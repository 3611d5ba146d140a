//! Shutter controller
//!
//! The instrument exposes one open and one close endpoint per shutter:
//!
//! ```text
//! POST Shutters/OpenPumpShutter    POST Shutters/ClosePumpShutter
//! POST Shutters/OpenProbeShutter   POST Shutters/CloseProbeShutter
//! POST Shutters/OpenGateShutter    POST Shutters/CloseGateShutter
//! ```

use crate::connector::HarpiaConnector;
use crate::error::{HarpiaError, HarpiaResult};
use std::fmt;
use std::str::FromStr;
use tracing::info;

/// One of the instrument's optical shutters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Shutter {
    /// Pump beam shutter.
    Pump,
    /// Probe beam shutter.
    Probe,
    /// Gate beam shutter.
    Gate,
}

impl Shutter {
    /// Every shutter, in the order close-all visits them.
    pub const ALL: [Shutter; 3] = [Shutter::Pump, Shutter::Probe, Shutter::Gate];

    /// Lower-case identifier token.
    pub fn as_str(self) -> &'static str {
        match self {
            Shutter::Pump => "pump",
            Shutter::Probe => "probe",
            Shutter::Gate => "gate",
        }
    }
}

impl fmt::Display for Shutter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Shutter {
    type Err = HarpiaError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Shutter::ALL
            .into_iter()
            .find(|shutter| shutter.as_str() == s)
            .ok_or_else(|| HarpiaError::UnknownShutter(s.to_string()))
    }
}

/// Which shutters a close operation applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShutterTarget {
    /// Every known shutter, in [`Shutter::ALL`] order.
    All,
    /// A single shutter.
    One(Shutter),
}

impl From<Shutter> for ShutterTarget {
    fn from(shutter: Shutter) -> Self {
        ShutterTarget::One(shutter)
    }
}

impl From<Option<Shutter>> for ShutterTarget {
    fn from(shutter: Option<Shutter>) -> Self {
        shutter.map_or(ShutterTarget::All, ShutterTarget::One)
    }
}

impl FromStr for ShutterTarget {
    type Err = HarpiaError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s == "all" {
            Ok(ShutterTarget::All)
        } else {
            s.parse().map(ShutterTarget::One)
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum Action {
    Open,
    Close,
}

impl Action {
    fn verb(self) -> &'static str {
        match self {
            Action::Open => "Open",
            Action::Close => "Close",
        }
    }

    fn as_str(self) -> &'static str {
        match self {
            Action::Open => "open",
            Action::Close => "close",
        }
    }
}

/// Upper-case the first character, leave the rest untouched.
fn capitalize(token: &str) -> String {
    let mut chars = token.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

fn endpoint(action: Action, shutter: Shutter) -> String {
    format!(
        "Shutters/{}{}Shutter",
        action.verb(),
        capitalize(shutter.as_str())
    )
}

/// Open/close control over the instrument shutters.
#[derive(Debug, Clone)]
pub struct Shutters {
    connector: HarpiaConnector,
}

impl Shutters {
    /// Create a controller over `connector`.
    pub fn new(connector: HarpiaConnector) -> Self {
        Self { connector }
    }

    fn actuate(&self, action: Action, shutter: Shutter) -> HarpiaResult<()> {
        let message = format!("Failed to {} {} shutter", action.as_str(), shutter);
        self.connector
            .post(&endpoint(action, shutter), None, Some(&message))?;
        info!(%shutter, action = action.as_str(), "Shutter actuated");
        Ok(())
    }

    /// Open one shutter.
    pub fn open(&self, shutter: Shutter) -> HarpiaResult<()> {
        self.actuate(Action::Open, shutter)
    }

    /// Open a shutter given by its identifier token.
    ///
    /// Unknown tokens fail with `UnknownShutter` before any request.
    pub fn open_named(&self, name: &str) -> HarpiaResult<()> {
        self.open(name.parse()?)
    }

    /// Close one shutter, or all of them.
    ///
    /// Closing all issues one request per shutter in [`Shutter::ALL`] order
    /// and stops at the first failure; shutters after the failing one are
    /// not attempted.
    pub fn close(&self, target: impl Into<ShutterTarget>) -> HarpiaResult<()> {
        match target.into() {
            ShutterTarget::All => Shutter::ALL
                .into_iter()
                .try_for_each(|shutter| self.actuate(Action::Close, shutter)),
            ShutterTarget::One(shutter) => self.actuate(Action::Close, shutter),
        }
    }

    /// Close a shutter given by its identifier token, or `"all"`.
    pub fn close_named(&self, name: &str) -> HarpiaResult<()> {
        self.close(name.parse::<ShutterTarget>()?)
    }
}
