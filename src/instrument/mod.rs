//! Device controllers for the HARPIA spectrometer.
//!
//! Each controller is a thin mapping from a domain operation to one or more
//! requests on a shared [`HarpiaConnector`]:
//!
//! - [`Shutters`]: open/close the pump, probe and gate shutters
//! - [`DelayLine`]: move the motorized delay line
//! - [`Spectrometer`]: read pump-probe spectra, set spectra per acquisition
//!
//! [`Harpia`] bundles all three over one connector.
//!
//! ## Example
//!
//! ```no_run
//! use harpia_daq::instrument::{Harpia, Shutter};
//!
//! let harpia = Harpia::connect("http://localhost:20050/v1/")?;
//! harpia.spectrometer().set_spectra_per_acquisition(100)?;
//! harpia.shutters().open(Shutter::Pump)?;
//! harpia.delay_line().set(1500)?;
//! let spectrum = harpia.spectrometer().read_spectrum(None)?;
//! harpia.shutters().close(None::<Shutter>)?;
//! # let _ = spectrum;
//! # Ok::<(), harpia_daq::HarpiaError>(())
//! ```

pub mod delay_line;
pub mod shutters;
pub mod spectrometer;

pub use delay_line::{DelayLine, DelayValue};
pub use shutters::{Shutter, ShutterTarget, Shutters};
pub use spectrometer::{SpectraPerAcquisition, Spectrometer};

use crate::config::InstrumentConfig;
use crate::connector::HarpiaConnector;
use crate::error::HarpiaResult;

/// All device controllers of one instrument, sharing a connector.
#[derive(Debug, Clone)]
pub struct Harpia {
    connector: HarpiaConnector,
    shutters: Shutters,
    delay_line: DelayLine,
    spectrometer: Spectrometer,
}

impl Harpia {
    /// Build the controllers over an existing connector.
    pub fn new(connector: HarpiaConnector) -> Self {
        Self {
            shutters: Shutters::new(connector.clone()),
            delay_line: DelayLine::new(connector.clone()),
            spectrometer: Spectrometer::new(connector.clone()),
            connector,
        }
    }

    /// Connect to `base_url` over HTTP.
    pub fn connect(base_url: impl Into<String>) -> HarpiaResult<Self> {
        Ok(Self::new(HarpiaConnector::new(base_url)?))
    }

    /// Connect using the `[instrument]` configuration section.
    pub fn from_config(config: &InstrumentConfig) -> HarpiaResult<Self> {
        Ok(Self::new(HarpiaConnector::from_config(config)?))
    }

    /// The shared connector.
    pub fn connector(&self) -> &HarpiaConnector {
        &self.connector
    }

    /// Shutter controller.
    pub fn shutters(&self) -> &Shutters {
        &self.shutters
    }

    /// Delay line controller.
    pub fn delay_line(&self) -> &DelayLine {
        &self.delay_line
    }

    /// Spectrometer controller.
    pub fn spectrometer(&self) -> &Spectrometer {
        &self.spectrometer
    }
}
