//! Power sequencing of an external bridge chip on the DSI output.

use embedded_hal_1::delay::DelayNs;
use embedded_hal_1::digital::OutputPin;

use crate::error::{Error, Result};

const STEP_US: u32 = 1_000;

/// Supply and reset control of whatever sits behind the link.
pub trait Bridge {
    fn power_on<D: DelayNs>(&mut self, delay: &mut D) -> Result<()>;
    fn power_off(&mut self) -> Result<()>;
}

/// Nothing to sequence.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoBridge;

impl Bridge for NoBridge {
    fn power_on<D: DelayNs>(&mut self, _delay: &mut D) -> Result<()> {
        Ok(())
    }

    fn power_off(&mut self) -> Result<()> {
        Ok(())
    }
}

/// Bridge with an optional enable line and an optional active-high reset line.
pub struct GpioBridge<EN, RST> {
    enable: Option<EN>,
    reset: Option<RST>,
}

impl<EN: OutputPin, RST: OutputPin> GpioBridge<EN, RST> {
    pub fn new(enable: Option<EN>, reset: Option<RST>) -> Self {
        Self { enable, reset }
    }

    pub fn release(self) -> (Option<EN>, Option<RST>) {
        (self.enable, self.reset)
    }
}

impl<EN: OutputPin, RST: OutputPin> Bridge for GpioBridge<EN, RST> {
    /// Enable, then pulse reset.
    fn power_on<D: DelayNs>(&mut self, delay: &mut D) -> Result<()> {
        if let Some(en) = &mut self.enable {
            en.set_high().map_err(|_| Error::Bridge)?;
            delay.delay_us(STEP_US);
        }

        if let Some(rst) = &mut self.reset {
            rst.set_low().map_err(|_| Error::Bridge)?;
            delay.delay_us(STEP_US);
            rst.set_high().map_err(|_| Error::Bridge)?;
            delay.delay_us(STEP_US);
            rst.set_low().map_err(|_| Error::Bridge)?;
            delay.delay_us(STEP_US);
        }
        Ok(())
    }

    fn power_off(&mut self) -> Result<()> {
        if let Some(rst) = &mut self.reset {
            rst.set_high().map_err(|_| Error::Bridge)?;
        }
        if let Some(en) = &mut self.enable {
            en.set_low().map_err(|_| Error::Bridge)?;
        }
        Ok(())
    }
}
