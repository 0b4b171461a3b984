//! D-PHY power sequencing.

use embedded_hal_1::delay::DelayNs;

use super::testif::{self, TestInterface};
use super::{ExternalPhy, PhyBackend, PhyState};
use crate::error::{Error, Result, Wait};
use crate::grf::{self, GrfSignal};
use crate::link::Link;
use crate::regs::{self, PhyRstz, PhyStatus, RegisterBus};
use crate::timing;
use crate::utils::{poll_until, PollSpec};

/// Settle after FORCEPLL before the lock can be observed.
const PLL_SETTLE_US: u32 = 1_500;
const STOP_STATE_SETTLE_US: u32 = 100;
const POWER_ON_SETTLE_US: u32 = 10;

impl<R: RegisterBus, P: ExternalPhy, B> Link<R, P, B> {
    fn expect_phy(&self, expected: PhyState) -> Result<()> {
        if self.phy_state != expected {
            return Err(Error::InvalidPhyState {
                expected,
                actual: self.phy_state,
            });
        }
        Ok(())
    }

    fn rstz(&mut self, delay: &mut impl DelayNs, bits: PhyRstz, set: bool) {
        let value = if set { bits.bits() } else { 0 };
        self.regs.update_bits(regs::PHY_RSTZ, bits.bits(), value);
        delay.delay_us(1);
    }

    /// Puts the PHY in shutdown and reset and zeroes every request line.
    ///
    /// Allowed from any state but [`PhyState::PoweredOn`], so a bring-up that
    /// failed halfway can be restarted.
    pub(crate) fn phy_clear<G: RegisterBus>(&mut self, grf: &mut G, delay: &mut impl DelayNs) -> Result<()> {
        if self.phy_state == PhyState::PoweredOn {
            return Err(Error::InvalidPhyState {
                expected: PhyState::Uninitialized,
                actual: PhyState::PoweredOn,
            });
        }

        self.rstz(delay, PhyRstz::SHUTDOWNZ, false);
        self.rstz(delay, PhyRstz::RSTZ, false);
        TestInterface::new(&mut self.regs, delay).clear(true);

        let table = self.grf_table;
        // Master, lanes in TX direction.
        grf::write(grf, table, GrfSignal::MasterSlaveZ, 1);
        grf::write(grf, table, GrfSignal::BaseDir, 0);
        grf::write(grf, table, GrfSignal::TurnRequest, 0);
        grf::write(grf, table, GrfSignal::TurnDisable, 0);
        grf::write(grf, table, GrfSignal::ForceTxStopMode, 0);
        grf::write(grf, table, GrfSignal::ForceRxMode, 0);
        delay.delay_us(1);

        TestInterface::new(&mut self.regs, delay).clear(false);
        self.phy_state = PhyState::Cleared;
        Ok(())
    }

    /// Programs frequency range and PLL of the embedded PHY. External PHYs
    /// were already given their rate and are left alone.
    pub(crate) fn phy_configure(&mut self, delay: &mut impl DelayNs) -> Result<()> {
        self.expect_phy(PhyState::Cleared)?;

        if self.phy.is_test_interface() {
            let pll = self.pll.ok_or(Error::NoPllSolution)?;
            let lane_mbps = self.lane_mbps;
            let mut tif = TestInterface::new(&mut self.regs, delay);

            let range = timing::hs_freq_range(lane_mbps);
            tif.write(testif::CODE_HSFREQRANGE, testif::hsfreqrange(range));
            if lane_mbps > 1000 {
                tif.write(testif::CODE_BIAS_EXTRA, testif::BIAS_EXTRA_1G5);
            }

            tif.write(
                testif::CODE_PLL_PROGRAM_EN,
                testif::LOOP_DIV_PROGRAM_EN | testif::INPUT_DIV_PROGRAM_EN,
            );
            tif.write(testif::CODE_PLL_INPUT_DIV, testif::input_div(pll.input_div - 1));
            let m = pll.feedback_div - 1;
            tif.write(testif::CODE_PLL_LOOP_DIV, testif::loop_div_low(m));
            tif.write(testif::CODE_PLL_LOOP_DIV, testif::loop_div_high(m));

            tif.write(testif::CODE_INACTIVE, 0);
        }

        self.phy_state = PhyState::Configured;
        Ok(())
    }

    /// Enables the data lane modules and the clock lane.
    pub(crate) fn phy_enable_clock<G: RegisterBus>(&mut self, grf: &mut G, delay: &mut impl DelayNs) -> Result<()> {
        self.expect_phy(PhyState::Configured)?;
        self.check_bring_up_lanes()?;

        let lanes = self.config.lanes as u32;
        grf::write(grf, self.grf_table, GrfSignal::EnableN, (1 << lanes) - 1);

        grf::write(grf, self.grf_table, GrfSignal::EnableClk, 1);
        self.rstz(delay, PhyRstz::ENABLE_CLK, true);

        self.phy_state = PhyState::ClockEnabled;
        Ok(())
    }

    /// Releases the PHY and waits for PLL lock and lane stop state.
    pub(crate) fn phy_power_on(&mut self, delay: &mut impl DelayNs) -> Result<()> {
        self.expect_phy(PhyState::ClockEnabled)?;

        self.rstz(delay, PhyRstz::SHUTDOWNZ, true);
        self.rstz(delay, PhyRstz::RSTZ, true);
        self.rstz(delay, PhyRstz::FORCE_PLL, true);
        delay.delay_us(PLL_SETTLE_US);

        if let PhyBackend::External(phy) = &mut self.phy {
            phy.power_on();
        }

        self.phy_state = PhyState::PllLocking;
        let bus = &mut self.regs;
        poll_until(delay, PollSpec::PLL_LOCK, || {
            PhyStatus::from_bits_truncate(bus.read(regs::PHY_STATUS)).contains(PhyStatus::LOCK)
        })
        .map_err(|_| {
            error!("dsi{}: PLL is not locked", self.index);
            Error::Timeout(Wait::PllLock)
        })?;

        delay.delay_us(STOP_STATE_SETTLE_US);

        self.phy_state = PhyState::LaneStopWait;
        let stop = PhyStatus::STOPSTATE_LANE0 | PhyStatus::STOPSTATE_CLK_LANE;
        let bus = &mut self.regs;
        poll_until(delay, PollSpec::STOP_STATE, || {
            PhyStatus::from_bits_truncate(bus.read(regs::PHY_STATUS)).contains(stop)
        })
        .map_err(|_| {
            error!("dsi{}: lane module is not in stop state", self.index);
            Error::Timeout(Wait::LaneStopState)
        })?;

        delay.delay_us(POWER_ON_SETTLE_US);
        self.phy_state = PhyState::PoweredOn;
        Ok(())
    }

    /// Tears the PHY down. A no-op on a PHY that was never brought up.
    pub(crate) fn phy_power_off<G: RegisterBus>(&mut self, grf: &mut G, delay: &mut impl DelayNs) -> Result<()> {
        if self.phy_state == PhyState::Uninitialized {
            return Ok(());
        }

        self.regs.update_bits(regs::PHY_RSTZ, PhyRstz::ENABLE_CLK.bits(), 0);
        grf::write(grf, self.grf_table, GrfSignal::EnableClk, 0);
        delay.delay_us(1);
        self.phy_state = PhyState::ClockDisabled;

        self.rstz(delay, PhyRstz::SHUTDOWNZ, false);
        self.phy_state = PhyState::ShutdownAsserted;

        if let PhyBackend::External(phy) = &mut self.phy {
            phy.power_off();
        }

        self.phy_state = PhyState::Uninitialized;
        Ok(())
    }
}
