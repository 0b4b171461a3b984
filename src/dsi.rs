//! DSI link lifecycle: attach, timing, pre-enable, enable, disable,
//! post-disable, transfers and interrupt service, over one link or a
//! dual-channel pair.

use embedded_hal_1::delay::DelayNs;

use crate::bridge::{Bridge, NoBridge};
use crate::config::{HostSettings, LinkConfig, ModeFlags, VideoMode};
use crate::error::{Error, Result};
use crate::grf::{self, GrfSignal};
use crate::irq::IrqStatus;
use crate::link::Link;
use crate::packet::{Message, MsgFlags};
use crate::phy::{ExternalPhy, NoPhy, PhyBackend};
use crate::regs::RegisterBus;
use crate::timing::{required_bandwidth, solve_pll};

/// Platform callbacks around the lifecycle.
pub trait HostHooks {
    /// Keep the controller's power domain up. Called per link in pre-enable.
    fn runtime_get(&mut self, _index: u8) {}
    /// Matching release, called per link in post-disable.
    fn runtime_put(&mut self, _index: u8) {}
    /// The attached peripheral changed.
    fn hotplug_event(&mut self) {}
}

impl HostHooks for () {}

/// Which half of a pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Role {
    Master,
    Slave,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Phase {
    #[default]
    Idle,
    /// Host and PHY up, command mode.
    Prepared,
    /// Streaming video.
    Enabled,
    /// Back in command mode, lanes forced to stop state.
    Disabled,
}

/// DSI output driving one link, or two links as a single dual-channel
/// display.
///
/// The master decides lane count, format and rates; the slave gets copies.
/// Every phase runs on the master first, then on the slave.
pub struct Dsi<R, G, D, P = NoPhy, B = NoBridge, H = ()> {
    master: Link<R, P, B>,
    slave: Option<Link<R, P, B>>,
    grf: G,
    delay: D,
    settings: HostSettings,
    hooks: H,
    attached: Option<LinkConfig>,
    timing_ready: bool,
    phase: Phase,
}

impl<R, G, D, P, B> Dsi<R, G, D, P, B, ()> {
    pub fn new(master: Link<R, P, B>, grf: G, delay: D, settings: HostSettings) -> Self {
        Self {
            master,
            slave: None,
            grf,
            delay,
            settings,
            hooks: (),
            attached: None,
            timing_ready: false,
            phase: Phase::Idle,
        }
    }
}

impl<R, G, D, P, B, H> Dsi<R, G, D, P, B, H> {
    pub fn with_hooks<H2: HostHooks>(self, hooks: H2) -> Dsi<R, G, D, P, B, H2> {
        Dsi {
            master: self.master,
            slave: self.slave,
            grf: self.grf,
            delay: self.delay,
            settings: self.settings,
            hooks,
            attached: self.attached,
            timing_ready: self.timing_ready,
            phase: self.phase,
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn settings(&self) -> &HostSettings {
        &self.settings
    }

    /// Configuration the peripheral attached with, before any split.
    pub fn attached(&self) -> Option<&LinkConfig> {
        self.attached.as_ref()
    }

    pub fn master(&self) -> &Link<R, P, B> {
        &self.master
    }

    pub fn slave(&self) -> Option<&Link<R, P, B>> {
        self.slave.as_ref()
    }

    pub fn link(&self, role: Role) -> Option<&Link<R, P, B>> {
        match role {
            Role::Master => Some(&self.master),
            Role::Slave => self.slave.as_ref(),
        }
    }

    pub fn link_mut(&mut self, role: Role) -> Option<&mut Link<R, P, B>> {
        match role {
            Role::Master => Some(&mut self.master),
            Role::Slave => self.slave.as_mut(),
        }
    }

    pub fn grf(&mut self) -> &mut G {
        &mut self.grf
    }

    pub fn hooks(&mut self) -> &mut H {
        &mut self.hooks
    }

    pub fn is_dual(&self) -> bool {
        self.slave.is_some()
    }

    /// Total data lanes over both links.
    pub fn total_lanes(&self) -> u8 {
        match self.slave {
            Some(_) => self.master.config.lanes * 2,
            None => self.master.config.lanes,
        }
    }

    /// Pushes the attached configuration down to the links. A pair splits
    /// the lanes evenly; an odd lane is dropped.
    fn propagate_config(&mut self) {
        let Some(mut config) = self.attached else {
            return;
        };
        if let Some(slave) = &mut self.slave {
            config.lanes /= 2;
            slave.config = config;
        }
        self.master.config = config;
        self.timing_ready = false;
    }

    pub fn release(self) -> (Link<R, P, B>, Option<Link<R, P, B>>, G, D, H) {
        (self.master, self.slave, self.grf, self.delay, self.hooks)
    }
}

impl<R, G, D, P, B, H> Dsi<R, G, D, P, B, H>
where
    R: RegisterBus,
    G: RegisterBus,
    D: DelayNs,
    P: ExternalPhy,
    B: Bridge,
    H: HostHooks,
{
    /// Records the peripheral's link requirements.
    pub fn attach(&mut self, config: LinkConfig) -> Result<()> {
        config.validate()?;
        self.attached = Some(config);
        self.propagate_config();
        self.hooks.hotplug_event();
        Ok(())
    }

    pub fn detach(&mut self) {
        self.attached = None;
        self.timing_ready = false;
        self.hooks.hotplug_event();
    }

    /// Makes `slave` the second half of a dual-channel link. Both halves
    /// must sit on the same SoC and drive the same kind of PHY.
    pub fn pair(&mut self, mut slave: Link<R, P, B>) -> Result<()> {
        if slave.index == self.master.index || !core::ptr::eq(slave.soc, self.master.soc) {
            return Err(Error::NoSuchInstance);
        }
        if slave.phy.is_test_interface() != self.master.phy.is_test_interface() {
            error!("dsi{}: cannot pair with dsi{}, PHY backends differ", self.master.index, slave.index);
            return Err(Error::MismatchedPhy);
        }
        slave.paired = true;
        slave.video = self.master.video;
        self.master.paired = true;
        self.slave = Some(slave);
        self.propagate_config();
        Ok(())
    }

    /// Dissolves the pair. The master gets the full lane count back.
    pub fn unpair(&mut self) -> Option<Link<R, P, B>> {
        let mut slave = self.slave.take()?;
        slave.paired = false;
        self.master.paired = false;
        self.propagate_config();
        Some(slave)
    }

    /// Sets the display timings on both links.
    pub fn set_display_mode(&mut self, mode: VideoMode) {
        self.master.video = mode;
        if let Some(slave) = &mut self.slave {
            slave.video = mode;
        }
        self.timing_ready = false;
    }

    /// Picks the lane rate, solves or requests it from the PHY, and copies
    /// the result to the slave. Returns the lane rate in Mbps.
    pub fn compute_transmission_timing(&mut self) -> Result<u32> {
        if self.attached.is_none() {
            return Err(Error::NotAttached);
        }
        let dual = self.slave.is_some();
        let master = &mut self.master;

        let bandwidth = match self.settings.bit_rate_per_lane_override {
            Some(bps) => bps,
            None => {
                let pclk = master.video.pixel_clock_hz;
                if pclk == 0 {
                    return Err(Error::InvalidPixelClock);
                }
                let bpp = master.config.format.bpp();
                required_bandwidth(pclk, bpp, master.config.lanes, dual, master.soc)
            }
        };

        let rate = match &mut master.phy {
            PhyBackend::External(phy) => {
                let rate = phy.round_rate(bandwidth);
                phy.set_rate(rate);
                master.pll = None;
                rate
            }
            PhyBackend::TestInterface { ref_clk_hz } => {
                let pll = solve_pll(*ref_clk_hz, bandwidth).ok_or_else(|| {
                    error!("dsi{}: no PLL setting for {} bps", master.index, bandwidth);
                    Error::NoPllSolution
                })?;
                debug!(
                    "dsi{}: fin={}, prediv={}, fbdiv={}",
                    master.index, *ref_clk_hz, pll.input_div, pll.feedback_div
                );
                master.pll = Some(pll);
                pll.freq_hz
            }
        };
        master.lane_mbps = (rate / 1_000_000) as u32;

        if let Some(slave) = &mut self.slave {
            slave.pll = master.pll;
            slave.lane_mbps = master.lane_mbps;
            if let PhyBackend::External(phy) = &mut slave.phy {
                phy.set_rate(rate);
            }
        }

        info!(
            "final DSI-Link bandwidth: {} x {} Mbps",
            master.lane_mbps,
            if dual { master.config.lanes * 2 } else { master.config.lanes }
        );
        self.timing_ready = true;
        Ok(self.master.lane_mbps)
    }

    /// Selects which display controller (VOP) feeds the link.
    pub fn route_vop(&mut self, pipe: u8) {
        let Self { master, slave, grf, .. } = self;
        for link in core::iter::once(master).chain(slave.as_mut()) {
            grf::write(grf, link.grf_table, GrfSignal::VopSel, pipe as u32);
        }
    }

    /// Powers the bridge, initializes the host and brings the PHY up, master
    /// first. Leaves the links in command mode with the HS clock requested.
    ///
    /// If a link fails, the links already brought up are powered off again,
    /// so the whole call can be retried.
    pub fn pre_enable(&mut self) -> Result<()> {
        if self.attached.is_none() {
            return Err(Error::NotAttached);
        }
        if !self.timing_ready {
            self.compute_transmission_timing()?;
        }

        let Self {
            master,
            slave,
            grf,
            delay,
            hooks,
            ..
        } = self;
        let mut up = 0;
        let mut failure = None;
        for link in core::iter::once(&mut *master).chain(slave.as_mut()) {
            match Self::pre_enable_link(link, grf, delay, hooks) {
                Ok(()) => up += 1,
                Err(e) => {
                    failure = Some(e);
                    break;
                }
            }
        }
        if let Some(e) = failure {
            for done in core::iter::once(master).chain(slave.as_mut()).take(up) {
                warn!("dsi{}: powering off after a failed pre-enable", done.index);
                if let Err(e) = Self::post_disable_link(done, grf, delay, hooks) {
                    error!("dsi{}: power-off failed: {:?}", done.index, e);
                }
            }
            return Err(e);
        }

        self.phase = Phase::Prepared;
        Ok(())
    }

    fn pre_enable_link(link: &mut Link<R, P, B>, grf: &mut G, delay: &mut D, hooks: &mut H) -> Result<()> {
        link.check_bring_up_lanes()?;
        link.bridge.power_on(delay)?;
        hooks.runtime_get(link.index);
        link.host_reset();
        link.host_init();
        link.phy_clear(grf, delay)?;
        link.phy_configure(delay)?;
        link.phy_enable_clock(grf, delay)?;
        link.hstt_config();
        link.phy_if_config();
        link.request_hs_clock(delay, true);
        link.phy_power_on(delay)?;
        link.host_power_up();
        Ok(())
    }

    fn post_disable_link(link: &mut Link<R, P, B>, grf: &mut G, delay: &mut D, hooks: &mut H) -> Result<()> {
        link.bridge.power_off()?;
        link.host_reset();
        link.phy_power_off(grf, delay)?;
        hooks.runtime_put(link.index);
        Ok(())
    }

    /// Switches both links to video mode.
    pub fn enable(&mut self) -> Result<()> {
        let Self {
            master,
            slave,
            delay,
            settings,
            ..
        } = self;
        for link in core::iter::once(master).chain(slave.as_mut()) {
            link.host_reset();
            link.dpi_config();
            link.video_timing_config();
            link.video_mode_config(settings);
            link.request_hs_clock(delay, true);
            link.set_video_mode();
            link.host_power_up();
        }

        self.phase = Phase::Enabled;
        Ok(())
    }

    /// Back to command mode with the clock lane released and the data lanes
    /// forced into stop state.
    pub fn disable(&mut self) {
        let Self {
            master, slave, grf, delay, ..
        } = self;
        for link in core::iter::once(master).chain(slave.as_mut()) {
            link.set_command_mode();
            link.request_hs_clock(delay, false);
            grf::write(grf, link.grf_table, GrfSignal::ForceTxStopMode, 1);
        }

        self.phase = Phase::Disabled;
    }

    /// Powers down bridge, host and PHY, and drops the power claim.
    pub fn post_disable(&mut self) -> Result<()> {
        let Self {
            master,
            slave,
            grf,
            delay,
            hooks,
            ..
        } = self;
        for link in core::iter::once(master).chain(slave.as_mut()) {
            Self::post_disable_link(link, grf, delay, hooks)?;
        }

        self.phase = Phase::Idle;
        Ok(())
    }

    /// Full bring-up: timing, VOP routing, pre-enable and enable.
    pub fn power_on(&mut self, pipe: u8) -> Result<()> {
        self.compute_transmission_timing()?;
        self.route_vop(pipe);
        self.pre_enable()?;
        self.enable()
    }

    /// Full teardown: disable and post-disable.
    pub fn power_off(&mut self) -> Result<()> {
        self.disable();
        self.post_disable()
    }

    /// Sends a message on the master link. See [`Dsi::transfer_on`].
    pub fn transfer(&mut self, msg: &mut Message<'_>) -> Result<usize> {
        self.transfer_on(Role::Master, msg)
    }

    /// Sends a message on one link of the pair.
    ///
    /// A peripheral attached with [`ModeFlags::LPM`] gets every message in
    /// low-power mode. Returns the number of bytes received for reads,
    /// otherwise the number of bytes put on the link. Timeouts are returned
    /// as is; retrying is up to the caller.
    pub fn transfer_on(&mut self, role: Role, msg: &mut Message<'_>) -> Result<usize> {
        let link = match role {
            Role::Master => &mut self.master,
            Role::Slave => self.slave.as_mut().ok_or(Error::NoSuchInstance)?,
        };
        if link.config.mode_flags.contains(ModeFlags::LPM) {
            msg.flags |= MsgFlags::USE_LPM;
        }
        link.transfer(&mut self.grf, &mut self.delay, &self.settings, msg)
    }

    /// Reads and logs the protocol error status of one link.
    pub fn service_irq(&mut self, role: Role) -> Result<IrqStatus> {
        let link = match role {
            Role::Master => &mut self.master,
            Role::Slave => self.slave.as_mut().ok_or(Error::NoSuchInstance)?,
        };
        let status = IrqStatus::read(&mut link.regs);
        status.log(link.index);
        Ok(status)
    }
}
