//! One DSI host controller instance.

use crate::bridge::NoBridge;
use crate::config::{LinkConfig, VideoMode};
use crate::error::{Error, Result};
use crate::grf::GrfTable;
use crate::phy::{NoPhy, PhyBackend, PhyState};
use crate::soc::SocData;
use crate::timing::PllParams;

/// Host registers, PHY and bridge lines of one controller, plus everything
/// derived for it so far.
///
/// Lifecycle phases are driven through [`Dsi`](crate::Dsi), which owns one or
/// two links.
pub struct Link<R, P = NoPhy, B = NoBridge> {
    pub(crate) index: u8,
    pub(crate) regs: R,
    pub(crate) soc: &'static SocData,
    pub(crate) grf_table: &'static GrfTable,
    pub(crate) phy: PhyBackend<P>,
    pub(crate) bridge: B,
    pub(crate) config: LinkConfig,
    pub(crate) video: VideoMode,
    pub(crate) lane_mbps: u32,
    pub(crate) pll: Option<PllParams>,
    pub(crate) phy_state: PhyState,
    /// Half of a dual-channel pair.
    pub(crate) paired: bool,
}

impl<R, P> Link<R, P, NoBridge> {
    /// Controller `index` of `soc`, with no external bridge lines.
    pub fn new(soc: &'static SocData, index: u8, regs: R, phy: PhyBackend<P>) -> Result<Self> {
        Self::with_bridge(soc, index, regs, phy, NoBridge)
    }
}

impl<R, P, B> Link<R, P, B> {
    pub fn with_bridge(soc: &'static SocData, index: u8, regs: R, phy: PhyBackend<P>, bridge: B) -> Result<Self> {
        let grf_table = soc.grf_table(index).ok_or(Error::NoSuchInstance)?;
        Ok(Self {
            index,
            regs,
            soc,
            grf_table,
            phy,
            bridge,
            config: LinkConfig::default(),
            video: VideoMode::default(),
            lane_mbps: 0,
            pll: None,
            phy_state: PhyState::Uninitialized,
            paired: false,
        })
    }

    pub fn index(&self) -> u8 {
        self.index
    }

    pub fn soc(&self) -> &'static SocData {
        self.soc
    }

    /// Per-link configuration. In dual-channel mode the lane count is already
    /// halved.
    pub fn config(&self) -> &LinkConfig {
        &self.config
    }

    pub fn video_mode(&self) -> &VideoMode {
        &self.video
    }

    /// Negotiated lane bit rate in Mbps, zero until timing is computed.
    pub fn lane_mbps(&self) -> u32 {
        self.lane_mbps
    }

    pub fn pll(&self) -> Option<&PllParams> {
        self.pll.as_ref()
    }

    pub fn phy_state(&self) -> PhyState {
        self.phy_state
    }

    pub fn is_paired(&self) -> bool {
        self.paired
    }

    pub fn regs(&mut self) -> &mut R {
        &mut self.regs
    }

    pub fn bridge(&mut self) -> &mut B {
        &mut self.bridge
    }

    pub fn release(self) -> (R, PhyBackend<P>, B) {
        (self.regs, self.phy, self.bridge)
    }

    /// Host `N_LANES` is two bits wide, so one link carries at most four.
    pub(crate) fn check_bring_up_lanes(&self) -> Result<()> {
        match self.config.lanes {
            1..=4 => Ok(()),
            n => Err(Error::InvalidLaneCount(n)),
        }
    }
}
