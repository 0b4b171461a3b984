use super::*;
use crate::config::{DisplayFlags, LinkConfig, PixelFormat, VideoMode};
use crate::packet::DataType;
use crate::phy::{NoPhy, PhyBackend};
use crate::soc::RK3288;
use crate::testing::{Access, FakeDelay, FakeRegs};

const DRAINED: u32 = CmdPktStatus::CMD_EMPTY.bits() | CmdPktStatus::PLD_W_EMPTY.bits();

fn link(regs: &mut FakeRegs) -> Link<&mut FakeRegs, NoPhy> {
    let mut link = Link::new(&RK3288, 0, regs, PhyBackend::TestInterface { ref_clk_hz: 24_000_000 }).unwrap();
    link.config = LinkConfig::new(4, 0, PixelFormat::Rgb888, ModeFlags::VIDEO | ModeFlags::VIDEO_BURST).unwrap();
    link.lane_mbps = 1068;
    link.video = VideoMode {
        pixel_clock_hz: 148_500_000,
        hactive: 1920,
        hfront_porch: 88,
        hback_porch: 148,
        hsync_len: 44,
        vactive: 1080,
        vfront_porch: 4,
        vback_porch: 36,
        vsync_len: 5,
        flags: DisplayFlags::empty(),
    };
    link
}

#[test]
fn host_init_values() {
    let mut regs = FakeRegs::new();
    let mut link = link(&mut regs);
    link.config.channel = 2;
    link.host_init();
    drop(link);

    assert_eq!(regs.value(regs::CLKMGR_CFG), 0x0a07);
    assert_eq!(regs.value(regs::TO_CNT_CFG), 0xffff_ffff);
    assert_eq!(regs.value(regs::MODE_CFG), regs::MODE_COMMAND);
    assert_eq!(regs.value(regs::PCKHDL_CFG), 0xc);
    assert_eq!(regs.value(regs::GEN_VCID), 2);
    assert_eq!(regs.value(regs::INT_MSK0), 0x1f_ffff);
    assert_eq!(regs.value(regs::INT_MSK1), 0x1f7f);
    for reg in [regs::BTA_TO_CNT, regs::HS_RD_TO_CNT, regs::LP_WR_TO_CNT] {
        assert!(regs.writes_to(reg).iter().all(|v| *v == 0));
    }
}

#[test]
fn host_init_is_idempotent() {
    let mut regs = FakeRegs::new();
    let mut link = link(&mut regs);
    link.host_init();
    let first = link.regs.snapshot();
    link.host_init();
    assert_eq!(link.regs.snapshot(), first);
}

#[test]
fn video_timing_in_lane_byte_clocks() {
    let mut regs = FakeRegs::new();
    let mut link = link(&mut regs);
    link.video_timing_config();
    assert_eq!(link.regs.value(regs::HLINE_TIME), 1978);
    assert_eq!(link.regs.value(regs::HSA_TIME), 40);
    assert_eq!(link.regs.value(regs::HBP_TIME), 133);
    assert_eq!(link.regs.value(regs::VACTIVE_LINES), 1080);
    assert_eq!(link.regs.value(regs::VSA_LINES), 5);
    assert_eq!(link.regs.value(regs::VFP_LINES), 4);
    assert_eq!(link.regs.value(regs::VBP_LINES), 36);
    assert_eq!(link.regs.value(regs::VID_PKT_SIZE), 1920);

    link.paired = true;
    link.video_timing_config();
    assert_eq!(link.regs.value(regs::VID_PKT_SIZE), 960);
}

#[test]
fn video_mode_flags() {
    let mut regs = FakeRegs::new();
    let mut link = link(&mut regs);
    link.video_mode_config(&HostSettings::default());
    // Burst, every blanking period in low power, EoTp on.
    assert_eq!(link.regs.value(regs::VID_MODE_CFG), 0x3f02);
    assert_eq!(link.regs.value(regs::PCKHDL_CFG), regs::PCKHDL_EOTP_TX_EN);
    assert_eq!(link.regs.value(regs::LPCLK_CTRL), 0);

    let mut regs = FakeRegs::new();
    let mut link = self::link(&mut regs);
    link.config.mode_flags = ModeFlags::VIDEO
        | ModeFlags::VIDEO_SYNC_PULSE
        | ModeFlags::VIDEO_HFP
        | ModeFlags::VIDEO_HBP
        | ModeFlags::NO_EOT_PACKET
        | ModeFlags::CLOCK_NON_CONTINUOUS;
    let settings = HostSettings {
        vpg_orientation: Some(1),
        vpg_mode: Some(0),
        ..Default::default()
    };
    link.video_mode_config(&settings);
    assert_eq!(link.regs.value(regs::VID_MODE_CFG), 0x0101_0f00);
    assert_eq!(link.regs.value(regs::PCKHDL_CFG), 0);
    assert_eq!(link.regs.value(regs::LPCLK_CTRL), regs::LPCLK_AUTO_CLKLANE_CTRL);
}

#[test]
fn dpi_coding_and_polarity() {
    let mut regs = FakeRegs::new();
    let mut link = link(&mut regs);
    link.config.format = PixelFormat::Rgb666Packed;
    link.config.channel = 1;
    link.video.flags = DisplayFlags::HSYNC_LOW | DisplayFlags::DE_LOW;
    link.dpi_config();
    assert_eq!(link.regs.value(regs::DPI_COLOR_CODING), 0x103);
    assert_eq!(link.regs.value(regs::DPI_CFG_POL), 0x5);
    assert_eq!(link.regs.value(regs::DPI_VCID), 1);
}

#[test]
fn phy_interface_and_transition_times() {
    let mut regs = FakeRegs::new();
    let mut link = link(&mut regs);
    link.lane_mbps = 95;
    link.config.lanes = 2;
    link.hstt_config();
    link.phy_if_config();
    assert_eq!(link.regs.value(regs::PHY_TMR_CFG), regs::phy_tmr_cfg(14, 28, 0x7fff));
    assert_eq!(link.regs.value(regs::PHY_TMR_LPCLK_CFG), regs::phy_tmr_lpclk_cfg(23, 35));
    assert_eq!(link.regs.value(regs::PHY_IF_CFG), 0x2001);
}

#[test]
fn short_write_in_low_power() {
    let mut regs = FakeRegs::new();
    regs.pin(regs::CMD_PKT_STATUS, DRAINED);
    let mut grf = FakeRegs::hiword();
    let mut delay = FakeDelay::default();
    let mut link = link(&mut regs);

    let mut msg = Message::dcs_write(0, &[0x29]).unwrap().with_flags(MsgFlags::USE_LPM);
    let sent = link
        .transfer(&mut grf, &mut delay, &HostSettings::default(), &mut msg)
        .unwrap();
    assert_eq!(sent, 4);
    drop(link);

    assert_eq!(regs.value(regs::CMD_MODE_CFG), regs::CMD_MODE_ALL_LP);
    assert!(regs.writes_to(regs::LPCLK_CTRL).is_empty());
    assert!(regs.writes_to(regs::GEN_PLD_DATA).is_empty());
    assert_eq!(regs.writes_to(regs::GEN_HDR), vec![0x1c00_2905]);
    assert!(grf.log().is_empty());
}

#[test]
fn long_write_payload_precedes_header() {
    let mut regs = FakeRegs::new();
    regs.pin(regs::CMD_PKT_STATUS, DRAINED);
    let mut grf = FakeRegs::hiword();
    let mut delay = FakeDelay::default();
    let mut link = link(&mut regs);

    let data = [1, 2, 3, 4, 5, 6, 7, 8, 9];
    let mut msg = Message::generic_write(0, &data).with_flags(MsgFlags::REQ_ACK);
    let header = Packet::new(&msg).unwrap().header_word();
    let sent = link
        .transfer(&mut grf, &mut delay, &HostSettings::default(), &mut msg)
        .unwrap();
    assert_eq!(sent, 13);
    drop(link);

    // High speed, clock lane requested, acknowledge requested.
    assert_eq!(regs.value(regs::CMD_MODE_CFG), regs::CMD_MODE_ALL_HS | regs::CMD_MODE_ACK_RQST_EN);
    assert_eq!(regs.value(regs::LPCLK_CTRL), regs::LPCLK_PHY_TXREQUESTCLKHS);

    let fifo: Vec<(u32, u32)> = regs
        .writes()
        .into_iter()
        .filter(|(off, _)| *off == regs::GEN_PLD_DATA || *off == regs::GEN_HDR)
        .collect();
    assert_eq!(
        fifo,
        vec![
            (regs::GEN_PLD_DATA, 0x0403_0201),
            (regs::GEN_PLD_DATA, 0x0807_0605),
            (regs::GEN_PLD_DATA, 0x0000_0009),
            (regs::GEN_HDR, header),
        ]
    );
}

#[test]
fn static_ack_request_applies_to_every_message() {
    let mut regs = FakeRegs::new();
    regs.pin(regs::CMD_PKT_STATUS, DRAINED);
    let mut grf = FakeRegs::hiword();
    let mut delay = FakeDelay::default();
    let mut link = link(&mut regs);
    let settings = HostSettings {
        ack_request: true,
        ..Default::default()
    };

    let mut msg = Message::new(0, DataType::TURN_ON_PERIPHERAL, &[]).with_flags(MsgFlags::USE_LPM);
    link.transfer(&mut grf, &mut delay, &settings, &mut msg).unwrap();
    assert_eq!(
        link.regs.value(regs::CMD_MODE_CFG),
        regs::CMD_MODE_ALL_LP | regs::CMD_MODE_ACK_RQST_EN
    );
}

#[test]
fn read_of_five_bytes_takes_two_words() {
    let mut regs = FakeRegs::new();
    regs.pin(regs::CMD_PKT_STATUS, DRAINED);
    regs.queue(regs::GEN_PLD_DATA, &[0x4433_2211, 0xddcc_bbaa]);
    let mut grf = FakeRegs::hiword();
    let mut delay = FakeDelay::default();
    let mut link = link(&mut regs);

    let cmd = 0xa1;
    let mut rx = [0u8; 5];
    let mut msg = Message::dcs_read(0, &cmd, &mut rx).with_flags(MsgFlags::USE_LPM);
    let got = link
        .transfer(&mut grf, &mut delay, &HostSettings::default(), &mut msg)
        .unwrap();
    assert_eq!(got, 5);
    drop(link);

    assert_eq!(rx, [0x11, 0x22, 0x33, 0x44, 0xaa]);
    let data_reads = regs
        .log()
        .iter()
        .filter(|a| **a == Access::Read(regs::GEN_PLD_DATA))
        .count();
    assert_eq!(data_reads, 2);

    // Bus turnaround requested for the response, then released.
    assert_eq!(
        grf.log(),
        &[Access::Write(0x3a4, 0x0700_0100), Access::Write(0x3a4, 0x0700_0000)]
    );
}

#[test]
fn full_payload_fifo_aborts_without_more_writes() {
    let mut regs = FakeRegs::new();
    regs.pin(regs::CMD_PKT_STATUS, CmdPktStatus::PLD_W_FULL.bits());
    let mut grf = FakeRegs::hiword();
    let mut delay = FakeDelay::default();
    let mut link = link(&mut regs);

    let data = [0u8; 16];
    let mut msg = Message::generic_write(0, &data).with_flags(MsgFlags::USE_LPM);
    let err = link
        .transfer(&mut grf, &mut delay, &HostSettings::default(), &mut msg)
        .unwrap_err();
    assert_eq!(err, Error::Timeout(Wait::PayloadFifoNotFull));
    assert!(err.is_fifo_full());
    assert_eq!(delay.total_us(), 1_000);
    drop(link);

    assert_eq!(regs.writes().last(), Some(&(regs::CMD_MODE_CFG, regs::CMD_MODE_ALL_LP)));
}

#[test]
fn full_command_fifo() {
    let mut regs = FakeRegs::new();
    regs.pin(regs::CMD_PKT_STATUS, CmdPktStatus::CMD_FULL.bits());
    let mut grf = FakeRegs::hiword();
    let mut delay = FakeDelay::default();
    let mut link = link(&mut regs);

    let mut msg = Message::dcs_write(0, &[0x28]).unwrap().with_flags(MsgFlags::USE_LPM);
    let err = link
        .transfer(&mut grf, &mut delay, &HostSettings::default(), &mut msg)
        .unwrap_err();
    assert_eq!(err, Error::Timeout(Wait::CommandFifoNotFull));
    drop(link);
    assert!(regs.writes_to(regs::GEN_HDR).is_empty());
}

#[test]
fn read_timeout_keeps_turnaround_asserted() {
    let mut regs = FakeRegs::new();
    regs.pin(
        regs::CMD_PKT_STATUS,
        DRAINED | CmdPktStatus::RD_CMD_BUSY.bits(),
    );
    let mut grf = FakeRegs::hiword();
    let mut delay = FakeDelay::default();
    let mut link = link(&mut regs);

    let cmd = 0x0a;
    let mut rx = [0u8; 1];
    let mut msg = Message::dcs_read(0, &cmd, &mut rx).with_flags(MsgFlags::USE_LPM);
    let err = link
        .transfer(&mut grf, &mut delay, &HostSettings::default(), &mut msg)
        .unwrap_err();
    assert_eq!(err, Error::Timeout(Wait::ReadCommandNotBusy));
    assert_eq!(err.kind(), crate::ErrorKind::Transfer);
    // The busy wait polls every 50 us for 5 ms.
    assert_eq!(delay.total_us(), 5_000);
    drop(link);

    assert_eq!(grf.value(0x3a4) >> 8 & 0x7, 1);
    assert!(!regs.log().contains(&Access::Read(regs::GEN_PLD_DATA)));
}
