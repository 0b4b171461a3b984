//! MIPI D-PHY handling.
//!
//! Either the Synopsys PHY embedded next to the host, programmed through the
//! [test interface](testif), or an external PHY driver behind [`ExternalPhy`].

mod power;
pub mod testif;

/// PHY owned by another driver.
pub trait ExternalPhy {
    fn power_on(&mut self);
    fn power_off(&mut self);
    /// Closest high-speed clock rate the PHY can produce, in Hz.
    fn round_rate(&mut self, rate_hz: u64) -> u64;
    fn set_rate(&mut self, rate_hz: u64);
}

/// Placeholder for links driving the embedded PHY.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoPhy {}

impl ExternalPhy for NoPhy {
    fn power_on(&mut self) {
        match *self {}
    }

    fn power_off(&mut self) {
        match *self {}
    }

    fn round_rate(&mut self, _rate_hz: u64) -> u64 {
        match *self {}
    }

    fn set_rate(&mut self, _rate_hz: u64) {
        match *self {}
    }
}

/// Which PHY a link drives.
#[derive(Debug)]
pub enum PhyBackend<P = NoPhy> {
    /// Embedded PHY with its PLL fed from `ref_clk_hz`.
    TestInterface { ref_clk_hz: u32 },
    External(P),
}

impl<P> PhyBackend<P> {
    pub fn is_test_interface(&self) -> bool {
        matches!(self, PhyBackend::TestInterface { .. })
    }
}

/// Power sequencer state of one link's PHY.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PhyState {
    #[default]
    Uninitialized,
    /// Shutdown, reset and test-clear asserted, request lines zeroed.
    Cleared,
    /// Frequency range and PLL programmed.
    Configured,
    /// Lane modules and clock lane enabled.
    ClockEnabled,
    PllLocking,
    LaneStopWait,
    PoweredOn,
    ClockDisabled,
    ShutdownAsserted,
}
