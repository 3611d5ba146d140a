//! Pump-probe spectrometer readout and acquisition settings.

use super::delay_line::DelayValue;
use crate::connector::HarpiaConnector;
use crate::error::{HarpiaError, HarpiaResult};
use serde_json::Value;
use std::fmt;
use std::num::NonZeroU32;
use tracing::{debug, info};

const SPECTRA_PER_ACQUISITION: &str = "Basic/NumberOfSpectraPerAcquisition";

/// Number of spectra averaged into one acquisition. Always a whole number > 0.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SpectraPerAcquisition(NonZeroU32);

impl SpectraPerAcquisition {
    /// The validated count.
    pub fn get(self) -> u32 {
        self.0.get()
    }

    fn from_u64(value: u64, original: &dyn fmt::Display) -> HarpiaResult<Self> {
        u32::try_from(value)
            .ok()
            .and_then(NonZeroU32::new)
            .map(Self)
            .ok_or_else(|| HarpiaError::InvalidSpectraCount(original.to_string()))
    }
}

impl fmt::Display for SpectraPerAcquisition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<u32> for SpectraPerAcquisition {
    type Error = HarpiaError;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        Self::from_u64(u64::from(value), &value)
    }
}

impl TryFrom<u64> for SpectraPerAcquisition {
    type Error = HarpiaError;

    fn try_from(value: u64) -> Result<Self, Self::Error> {
        Self::from_u64(value, &value)
    }
}

impl TryFrom<i64> for SpectraPerAcquisition {
    type Error = HarpiaError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        let unsigned =
            u64::try_from(value).map_err(|_| HarpiaError::InvalidSpectraCount(value.to_string()))?;
        Self::from_u64(unsigned, &value)
    }
}

impl TryFrom<i32> for SpectraPerAcquisition {
    type Error = HarpiaError;

    fn try_from(value: i32) -> Result<Self, Self::Error> {
        Self::try_from(i64::from(value))
    }
}

impl TryFrom<f64> for SpectraPerAcquisition {
    type Error = HarpiaError;

    /// Accepts only finite, whole, positive values.
    fn try_from(value: f64) -> Result<Self, Self::Error> {
        if !value.is_finite() || value.fract() != 0.0 || value < 1.0 || value > f64::from(u32::MAX)
        {
            return Err(HarpiaError::InvalidSpectraCount(value.to_string()));
        }
        let whole = value as u64;
        Self::from_u64(whole, &value)
    }
}

fn spectrum_path(delay: Option<&DelayValue>) -> String {
    match delay {
        None => "Basic/PumpProbeSpectrum/false".to_string(),
        Some(delay) => format!("Basic/PumpProbeSpectrum/{delay}/false"),
    }
}

/// Spectrometer controller.
#[derive(Debug, Clone)]
pub struct Spectrometer {
    connector: HarpiaConnector,
}

impl Spectrometer {
    /// Create a controller over `connector`.
    pub fn new(connector: HarpiaConnector) -> Self {
        Self { connector }
    }

    /// Read the current unfiltered pump-probe spectrum, optionally at `delay`.
    ///
    /// The payload shape is defined by the instrument and returned as is.
    pub fn read_spectrum(&self, delay: Option<DelayValue>) -> HarpiaResult<Value> {
        let path = spectrum_path(delay.as_ref());
        debug!(path = %path, "Reading pump-probe spectrum");
        self.connector.get(&path, None)
    }

    /// Read the pump-probe spectrum at `delay`.
    pub fn read_spectrum_at(&self, delay: impl Into<DelayValue>) -> HarpiaResult<Value> {
        self.read_spectrum(Some(delay.into()))
    }

    /// Set the number of spectra per acquisition.
    ///
    /// Anything other than a whole number greater than zero fails with
    /// `InvalidSpectraCount` before any request.
    pub fn set_spectra_per_acquisition<N>(&self, count: N) -> HarpiaResult<()>
    where
        N: TryInto<SpectraPerAcquisition, Error = HarpiaError>,
    {
        let count = count.try_into()?;
        self.connector.put(
            SPECTRA_PER_ACQUISITION,
            &Value::String(count.to_string()),
            Some("Failed to set spectra_per_acquisition"),
        )?;
        info!(%count, "Spectra per acquisition set");
        Ok(())
    }
}
