//! DesignWare MIPI DSI host register map and the register access boundary.

use core::ptr;

/// 32-bit register window.
///
/// Implemented by [`Mmio`] for real hardware. The GRF syscon goes through the
/// same trait, so anything that can read and write a 32-bit word at an offset
/// (a regmap, a bus bridge, a test fake) can back the driver.
pub trait RegisterBus {
    fn read(&mut self, offset: u32) -> u32;
    fn write(&mut self, offset: u32, value: u32);

    /// Read-modify-write of the bits in `mask`.
    fn update_bits(&mut self, offset: u32, mask: u32, value: u32) {
        let old = self.read(offset);
        self.write(offset, (old & !mask) | (value & mask));
    }
}

impl<T: RegisterBus + ?Sized> RegisterBus for &mut T {
    fn read(&mut self, offset: u32) -> u32 {
        (**self).read(offset)
    }

    fn write(&mut self, offset: u32, value: u32) {
        (**self).write(offset, value)
    }
}

/// Memory-mapped register window.
#[derive(Debug)]
pub struct Mmio {
    base: *mut u32,
}

impl Mmio {
    /// # Safety
    ///
    /// `base` must point at a mapped register window of this block that stays
    /// valid for the lifetime of the returned value and is not accessed
    /// through any other path concurrently.
    pub const unsafe fn new(base: usize) -> Self {
        Self { base: base as *mut u32 }
    }
}

impl RegisterBus for Mmio {
    fn read(&mut self, offset: u32) -> u32 {
        // SAFETY: `new` contract; offsets come from the constants below.
        unsafe { ptr::read_volatile(self.base.byte_add(offset as usize)) }
    }

    fn write(&mut self, offset: u32, value: u32) {
        // SAFETY: as above.
        unsafe { ptr::write_volatile(self.base.byte_add(offset as usize), value) }
    }
}

// ============================================================================
// Register offsets
// ============================================================================

pub const PWR_UP: u32 = 0x004;
pub const CLKMGR_CFG: u32 = 0x008;
pub const DPI_VCID: u32 = 0x00c;
pub const DPI_COLOR_CODING: u32 = 0x010;
pub const DPI_CFG_POL: u32 = 0x014;
pub const PCKHDL_CFG: u32 = 0x02c;
pub const GEN_VCID: u32 = 0x030;
pub const MODE_CFG: u32 = 0x034;
pub const VID_MODE_CFG: u32 = 0x038;
pub const VID_PKT_SIZE: u32 = 0x03c;
pub const HSA_TIME: u32 = 0x048;
pub const HBP_TIME: u32 = 0x04c;
pub const HLINE_TIME: u32 = 0x050;
pub const VSA_LINES: u32 = 0x054;
pub const VBP_LINES: u32 = 0x058;
pub const VFP_LINES: u32 = 0x05c;
pub const VACTIVE_LINES: u32 = 0x060;
pub const CMD_MODE_CFG: u32 = 0x068;
pub const GEN_HDR: u32 = 0x06c;
pub const GEN_PLD_DATA: u32 = 0x070;
pub const CMD_PKT_STATUS: u32 = 0x074;
pub const TO_CNT_CFG: u32 = 0x078;
pub const HS_RD_TO_CNT: u32 = 0x07c;
pub const LP_RD_TO_CNT: u32 = 0x080;
pub const HS_WR_TO_CNT: u32 = 0x084;
pub const LP_WR_TO_CNT: u32 = 0x088;
pub const BTA_TO_CNT: u32 = 0x08c;
pub const LPCLK_CTRL: u32 = 0x094;
pub const PHY_TMR_LPCLK_CFG: u32 = 0x098;
pub const PHY_TMR_CFG: u32 = 0x09c;
pub const PHY_RSTZ: u32 = 0x0a0;
pub const PHY_IF_CFG: u32 = 0x0a4;
pub const PHY_STATUS: u32 = 0x0b0;
pub const PHY_TST_CTRL0: u32 = 0x0b4;
pub const PHY_TST_CTRL1: u32 = 0x0b8;
pub const INT_ST0: u32 = 0x0bc;
pub const INT_ST1: u32 = 0x0c0;
pub const INT_MSK0: u32 = 0x0c4;
pub const INT_MSK1: u32 = 0x0c8;

// ============================================================================
// Field values
// ============================================================================

pub const RESET: u32 = 0;
pub const POWERUP: u32 = 1;

pub const MODE_VIDEO: u32 = 0;
pub const MODE_COMMAND: u32 = 1;

pub const LOOSELY18_EN: u32 = 1 << 8;

pub const DPI_HSYNC_ACTIVE_LOW: u32 = 1 << 2;
pub const DPI_VSYNC_ACTIVE_LOW: u32 = 1 << 1;
pub const DPI_DATAEN_ACTIVE_LOW: u32 = 1 << 0;

pub const PCKHDL_ECC_RX_EN: u32 = 1 << 3;
pub const PCKHDL_BTA_EN: u32 = 1 << 2;
pub const PCKHDL_EOTP_TX_EN: u32 = 1 << 0;

pub const VID_VPG_ORIENTATION: u32 = 1 << 24;
pub const VID_VPG_MODE: u32 = 1 << 20;
pub const VID_VPG_EN: u32 = 1 << 16;
pub const VID_LP_HFP_EN: u32 = 1 << 13;
pub const VID_LP_HBP_EN: u32 = 1 << 12;
pub const VID_LP_VACT_EN: u32 = 1 << 11;
pub const VID_LP_VFP_EN: u32 = 1 << 10;
pub const VID_LP_VBP_EN: u32 = 1 << 9;
pub const VID_LP_VSA_EN: u32 = 1 << 8;
pub const VID_MODE_NON_BURST_SYNC_PULSES: u32 = 0;
pub const VID_MODE_NON_BURST_SYNC_EVENTS: u32 = 1;
pub const VID_MODE_BURST: u32 = 2;

/// Every generic and DCS command type sent in low-power escape mode.
pub const CMD_MODE_ALL_LP: u32 = 0x010f_7f00;
pub const CMD_MODE_ALL_HS: u32 = 0;
pub const CMD_MODE_ACK_RQST_EN: u32 = 1 << 1;

pub const LPCLK_AUTO_CLKLANE_CTRL: u32 = 1 << 1;
pub const LPCLK_PHY_TXREQUESTCLKHS: u32 = 1 << 0;

pub const PHY_MAX_RD_TIME: u32 = 0x7fff;
pub const PHY_STOP_WAIT_TIME: u32 = 0x20;

pub const PHY_TESTCLK: u32 = 1 << 1;
pub const PHY_TESTCLR: u32 = 1 << 0;
pub const PHY_TESTEN: u32 = 1 << 16;

pub const INT_MSK0_ALL: u32 = 0x001f_ffff;
pub const INT_MSK1_ALL: u32 = 0x0000_1f7f;

pub const TIMEOUT_CLK_DIVISION: u32 = 10;
pub const HSTX_TIMEOUT: u32 = 0xffff;
pub const LPRX_TIMEOUT: u32 = 0xffff;

pub const fn clkmgr_cfg(timeout_div: u32, esc_div: u32) -> u32 {
    ((timeout_div & 0xff) << 8) | (esc_div & 0xff)
}

pub const fn to_cnt_cfg(hstx: u32, lprx: u32) -> u32 {
    ((hstx & 0xffff) << 16) | (lprx & 0xffff)
}

pub const fn phy_tmr_cfg(hs2lp: u32, lp2hs: u32, max_rd: u32) -> u32 {
    ((hs2lp & 0xff) << 24) | ((lp2hs & 0xff) << 16) | (max_rd & 0x7fff)
}

pub const fn phy_tmr_lpclk_cfg(hs2lp: u32, lp2hs: u32) -> u32 {
    ((hs2lp & 0x3ff) << 16) | (lp2hs & 0x3ff)
}

pub const fn phy_if_cfg(lanes: u8) -> u32 {
    (PHY_STOP_WAIT_TIME << 8) | ((lanes.saturating_sub(1) as u32) & 0x3)
}

pub const fn vid_pkt_size(pixels: u32) -> u32 {
    pixels & 0x3fff
}

pub const fn test_din(code: u8) -> u32 {
    code as u32
}

pub const fn test_dout(ctrl1: u32) -> u8 {
    (ctrl1 >> 8) as u8
}

bitflags::bitflags! {
    /// `CMD_PKT_STATUS`: generic interface FIFO state.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct CmdPktStatus: u32 {
        const CMD_EMPTY = 1 << 0;
        const CMD_FULL = 1 << 1;
        const PLD_W_EMPTY = 1 << 2;
        const PLD_W_FULL = 1 << 3;
        const PLD_R_EMPTY = 1 << 4;
        const PLD_R_FULL = 1 << 5;
        const RD_CMD_BUSY = 1 << 6;
    }
}

bitflags::bitflags! {
    /// `PHY_STATUS`
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct PhyStatus: u32 {
        const LOCK = 1 << 0;
        const STOPSTATE_CLK_LANE = 1 << 2;
        const STOPSTATE_LANE0 = 1 << 4;
    }
}

bitflags::bitflags! {
    /// `PHY_RSTZ`
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct PhyRstz: u32 {
        /// Active-low shutdown. Set means "not shut down".
        const SHUTDOWNZ = 1 << 0;
        /// Active-low reset.
        const RSTZ = 1 << 1;
        const ENABLE_CLK = 1 << 2;
        const FORCE_PLL = 1 << 3;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::FakeRegs;

    #[test]
    fn packed_fields() {
        assert_eq!(clkmgr_cfg(TIMEOUT_CLK_DIVISION, 7), 0x0a07);
        assert_eq!(to_cnt_cfg(HSTX_TIMEOUT, LPRX_TIMEOUT), 0xffff_ffff);
        assert_eq!(phy_tmr_cfg(14, 28, PHY_MAX_RD_TIME), 0x0e1c_7fff);
        assert_eq!(phy_tmr_lpclk_cfg(23, 35), 0x0017_0023);
        assert_eq!(phy_if_cfg(4), 0x2003);
        assert_eq!(phy_if_cfg(1), 0x2000);
        assert_eq!(test_dout(0x0000_ab00), 0xab);
    }

    #[test]
    fn update_bits_preserves_other_bits() {
        let mut regs = FakeRegs::new();
        regs.write(LPCLK_CTRL, 0xf0);
        regs.update_bits(LPCLK_CTRL, LPCLK_PHY_TXREQUESTCLKHS, LPCLK_PHY_TXREQUESTCLKHS);
        assert_eq!(regs.value(LPCLK_CTRL), 0xf1);
        regs.update_bits(LPCLK_CTRL, 0xf0, 0);
        assert_eq!(regs.value(LPCLK_CTRL), 0x01);
    }
}
