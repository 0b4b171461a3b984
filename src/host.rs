//! DSI host controller programming and the generic packet interface.

use embedded_hal_1::delay::DelayNs;

use crate::config::{HostSettings, ModeFlags};
use crate::error::{Error, Result, Wait};
use crate::grf::{self, GrfSignal};
use crate::link::Link;
use crate::packet::{Message, MsgFlags, Packet};
use crate::regs::{self, CmdPktStatus, RegisterBus};
use crate::timing::{self, escape_clock_divider, lane_byte_clock_hz, to_lane_byte_cycles};
use crate::utils::{poll_until, PollSpec};

impl<R: RegisterBus, P, B> Link<R, P, B> {
    pub(crate) fn host_reset(&mut self) {
        self.regs.write(regs::PWR_UP, regs::RESET);
    }

    pub(crate) fn host_power_up(&mut self) {
        self.regs.write(regs::PWR_UP, regs::POWERUP);
    }

    pub(crate) fn set_command_mode(&mut self) {
        self.regs.write(regs::MODE_CFG, regs::MODE_COMMAND);
    }

    pub(crate) fn set_video_mode(&mut self) {
        self.regs.write(regs::MODE_CFG, regs::MODE_VIDEO);
    }

    /// Drives (or releases) the high-speed clock request of the clock lane.
    pub(crate) fn request_hs_clock(&mut self, delay: &mut impl DelayNs, on: bool) {
        let value = if on { regs::LPCLK_PHY_TXREQUESTCLKHS } else { 0 };
        self.regs.update_bits(regs::LPCLK_CTRL, regs::LPCLK_PHY_TXREQUESTCLKHS, value);
        delay.delay_us(1);
    }

    /// Timeouts, escape clock, command mode, packet handling, virtual channel
    /// and interrupt masks. Writes the same values every time.
    pub(crate) fn host_init(&mut self) {
        // Response timeouts in lane byte clock cycles; zero disables them.
        for reg in [
            regs::BTA_TO_CNT,
            regs::LP_WR_TO_CNT,
            regs::HS_WR_TO_CNT,
            regs::LP_RD_TO_CNT,
            regs::HS_RD_TO_CNT,
        ] {
            self.regs.write(reg, 0);
        }

        self.regs
            .update_bits(regs::CLKMGR_CFG, 0xff00, regs::clkmgr_cfg(regs::TIMEOUT_CLK_DIVISION, 0));
        self.regs
            .write(regs::TO_CNT_CFG, regs::to_cnt_cfg(regs::HSTX_TIMEOUT, regs::LPRX_TIMEOUT));

        let esc_div = escape_clock_divider(self.lane_mbps);
        self.regs.update_bits(regs::CLKMGR_CFG, 0x00ff, regs::clkmgr_cfg(0, esc_div));

        self.set_command_mode();
        self.regs
            .write(regs::PCKHDL_CFG, regs::PCKHDL_ECC_RX_EN | regs::PCKHDL_BTA_EN);
        self.regs.write(regs::GEN_VCID, self.config.channel as u32 & 0x3);

        self.regs.write(regs::INT_MSK0, regs::INT_MSK0_ALL);
        self.regs.write(regs::INT_MSK1, regs::INT_MSK1_ALL);
    }

    /// LP/HS transition times for the negotiated lane rate.
    pub(crate) fn hstt_config(&mut self) {
        let row = timing::hs_transition_times(self.lane_mbps);
        self.regs.write(
            regs::PHY_TMR_CFG,
            regs::phy_tmr_cfg(
                row.data_lane.hs2lp as u32,
                row.data_lane.lp2hs as u32,
                regs::PHY_MAX_RD_TIME,
            ),
        );
        self.regs.write(
            regs::PHY_TMR_LPCLK_CFG,
            regs::phy_tmr_lpclk_cfg(row.clk_lane.hs2lp as u32, row.clk_lane.lp2hs as u32),
        );
    }

    pub(crate) fn phy_if_config(&mut self) {
        self.regs.write(regs::PHY_IF_CFG, regs::phy_if_cfg(self.config.lanes));
    }

    /// Color coding, sync polarities and virtual channel of the DPI input.
    pub(crate) fn dpi_config(&mut self) {
        use crate::config::DisplayFlags;

        let (coding, loosely18) = self.config.format.color_coding();
        let mut val = coding as u32 & 0xf;
        if loosely18 {
            val |= regs::LOOSELY18_EN;
        }
        self.regs.write(regs::DPI_COLOR_CODING, val);

        let flags = self.video.flags;
        let mut pol = 0;
        if flags.contains(DisplayFlags::VSYNC_LOW) {
            pol |= regs::DPI_VSYNC_ACTIVE_LOW;
        }
        if flags.contains(DisplayFlags::HSYNC_LOW) {
            pol |= regs::DPI_HSYNC_ACTIVE_LOW;
        }
        if flags.contains(DisplayFlags::DE_LOW) {
            pol |= regs::DPI_DATAEN_ACTIVE_LOW;
        }
        self.regs.write(regs::DPI_CFG_POL, pol);

        self.regs.write(regs::DPI_VCID, self.config.channel as u32 & 0x3);
    }

    /// Line and porch timings. Horizontal values are converted from pixel
    /// clocks to lane byte clocks; vertical ones are in lines.
    pub(crate) fn video_timing_config(&mut self) {
        let vm = self.video;

        self.regs.write(regs::VACTIVE_LINES, vm.vactive & 0x3fff);
        self.regs.write(regs::VSA_LINES, vm.vsync_len & 0x3ff);
        self.regs.write(regs::VFP_LINES, vm.vfront_porch & 0x3ff);
        self.regs.write(regs::VBP_LINES, vm.vback_porch & 0x3ff);

        let lbc = lane_byte_clock_hz(self.lane_mbps);
        let pclk = vm.pixel_clock_hz;
        self.regs
            .write(regs::HLINE_TIME, to_lane_byte_cycles(vm.hline(), lbc, pclk) & 0x7fff);
        self.regs
            .write(regs::HSA_TIME, to_lane_byte_cycles(vm.hsync_len, lbc, pclk) & 0xfff);
        self.regs
            .write(regs::HBP_TIME, to_lane_byte_cycles(vm.hback_porch, lbc, pclk) & 0xfff);

        // Each half of a pair carries half of every line.
        let pixels = if self.paired { vm.hactive / 2 } else { vm.hactive };
        self.regs.write(regs::VID_PKT_SIZE, regs::vid_pkt_size(pixels));
    }

    /// Video packet type, low-power blanking, pattern generator, clock lane
    /// control and EoTp.
    pub(crate) fn video_mode_config(&mut self, settings: &HostSettings) {
        let flags = self.config.mode_flags;

        let mut val = regs::VID_LP_VACT_EN | regs::VID_LP_VFP_EN | regs::VID_LP_VBP_EN | regs::VID_LP_VSA_EN;
        if !flags.contains(ModeFlags::VIDEO_HFP) {
            val |= regs::VID_LP_HFP_EN;
        }
        if !flags.contains(ModeFlags::VIDEO_HBP) {
            val |= regs::VID_LP_HBP_EN;
        }

        val |= if flags.contains(ModeFlags::VIDEO_BURST) {
            regs::VID_MODE_BURST
        } else if flags.contains(ModeFlags::VIDEO_SYNC_PULSE) {
            regs::VID_MODE_NON_BURST_SYNC_PULSES
        } else {
            regs::VID_MODE_NON_BURST_SYNC_EVENTS
        };

        if let Some(orientation) = settings.vpg_orientation {
            val |= regs::VID_VPG_EN;
            if orientation & 1 != 0 {
                val |= regs::VID_VPG_ORIENTATION;
            }
        }
        if let Some(mode) = settings.vpg_mode {
            val |= regs::VID_VPG_EN;
            if mode & 1 != 0 {
                val |= regs::VID_VPG_MODE;
            }
        }
        self.regs.write(regs::VID_MODE_CFG, val);

        if flags.contains(ModeFlags::CLOCK_NON_CONTINUOUS) {
            self.regs
                .update_bits(regs::LPCLK_CTRL, regs::LPCLK_AUTO_CLKLANE_CTRL, regs::LPCLK_AUTO_CLKLANE_CTRL);
        }
        if !flags.contains(ModeFlags::NO_EOT_PACKET) {
            self.regs
                .update_bits(regs::PCKHDL_CFG, regs::PCKHDL_EOTP_TX_EN, regs::PCKHDL_EOTP_TX_EN);
        }
    }

    fn wait_status<D: DelayNs>(
        &mut self,
        delay: &mut D,
        spec: PollSpec,
        wait: Wait,
        ready: impl Fn(CmdPktStatus) -> bool,
    ) -> Result<()> {
        let bus = &mut self.regs;
        poll_until(delay, spec, || {
            ready(CmdPktStatus::from_bits_truncate(bus.read(regs::CMD_PKT_STATUS)))
        })
        .map_err(|_| Error::Timeout(wait))
    }

    /// Sends `msg` through the generic interface and, for reads, collects the
    /// response into `msg.rx`.
    ///
    /// Returns the number of bytes received for reads, otherwise the number
    /// of bytes put on the link. Any expired wait aborts the transfer with no
    /// further register writes.
    pub(crate) fn transfer<G: RegisterBus, D: DelayNs>(
        &mut self,
        grf: &mut G,
        delay: &mut D,
        settings: &HostSettings,
        msg: &mut Message<'_>,
    ) -> Result<usize> {
        let packet = Packet::new(msg).inspect_err(|_| {
            error!("dsi{}: failed to create packet", self.index);
        })?;

        let mut cfg = if msg.flags.contains(MsgFlags::USE_LPM) {
            regs::CMD_MODE_ALL_LP
        } else {
            self.request_hs_clock(delay, true);
            regs::CMD_MODE_ALL_HS
        };
        if msg.flags.contains(MsgFlags::REQ_ACK) || settings.ack_request {
            cfg |= regs::CMD_MODE_ACK_RQST_EN;
        }
        self.regs.write(regs::CMD_MODE_CFG, cfg);

        for word in packet.payload_words() {
            self.wait_status(delay, PollSpec::FIFO, Wait::PayloadFifoNotFull, |s| {
                !s.contains(CmdPktStatus::PLD_W_FULL)
            })
            .inspect_err(|_| error!("dsi{}: write payload FIFO is full", self.index))?;
            self.regs.write(regs::GEN_PLD_DATA, word);
        }
        if let Some(tail) = packet.payload_tail() {
            self.regs.write(regs::GEN_PLD_DATA, tail);
        }

        self.wait_status(delay, PollSpec::FIFO, Wait::CommandFifoNotFull, |s| {
            !s.contains(CmdPktStatus::CMD_FULL)
        })
        .inspect_err(|_| error!("dsi{}: command FIFO is full", self.index))?;
        self.regs.write(regs::GEN_HDR, packet.header_word());

        let drained = CmdPktStatus::CMD_EMPTY | CmdPktStatus::PLD_W_EMPTY;
        self.wait_status(delay, PollSpec::FIFO, Wait::WriteFifosEmpty, |s| s.contains(drained))
            .inspect_err(|_| error!("dsi{}: write payload FIFO is not empty", self.index))?;

        if !msg.expects_response() {
            return Ok(packet.size());
        }

        // The host must hand the bus to the peripheral for its response.
        grf::write(grf, self.grf_table, GrfSignal::TurnRequest, 1);
        self.read_fifo(delay, msg.rx)?;
        grf::write(grf, self.grf_table, GrfSignal::TurnRequest, 0);

        Ok(msg.rx.len())
    }

    /// Drains a read response into `rx`, four bytes per FIFO word.
    fn read_fifo<D: DelayNs>(&mut self, delay: &mut D, rx: &mut [u8]) -> Result<()> {
        self.wait_status(delay, PollSpec::CMD_BUSY, Wait::ReadCommandNotBusy, |s| {
            !s.contains(CmdPktStatus::RD_CMD_BUSY)
        })
        .inspect_err(|_| error!("dsi{}: entire response is not stored in the FIFO", self.index))?;

        for chunk in rx.chunks_mut(4) {
            self.wait_status(delay, PollSpec::FIFO, Wait::ReadFifoNotEmpty, |s| {
                !s.contains(CmdPktStatus::PLD_R_EMPTY)
            })
            .inspect_err(|_| error!("dsi{}: read payload FIFO is empty", self.index))?;

            let word = self.regs.read(regs::GEN_PLD_DATA).to_le_bytes();
            chunk.copy_from_slice(&word[..chunk.len()]);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests;
