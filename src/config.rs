//! Link and display configuration.

use crate::error::{Error, Result};

bitflags::bitflags! {
    /// Peripheral operating mode, as requested at attach time.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct ModeFlags: u32 {
        /// Video mode (as opposed to command mode).
        const VIDEO = 1 << 0;
        /// Burst video packets.
        const VIDEO_BURST = 1 << 1;
        /// Non-burst with sync pulses. Without it, sync events are used.
        const VIDEO_SYNC_PULSE = 1 << 2;
        /// Transmit the horizontal front porch in high speed.
        const VIDEO_HFP = 1 << 4;
        /// Transmit the horizontal back porch in high speed.
        const VIDEO_HBP = 1 << 5;
        /// Do not append End of Transmission packets.
        const NO_EOT_PACKET = 1 << 9;
        /// The clock lane may drop to low power between transmissions.
        const CLOCK_NON_CONTINUOUS = 1 << 10;
        /// Send every command in low-power mode.
        const LPM = 1 << 11;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PixelFormat {
    #[default]
    Rgb888,
    /// 18 bits per pixel, each pixel padded to 3 bytes.
    Rgb666,
    /// 18 bits per pixel, tightly packed.
    Rgb666Packed,
    Rgb565,
}

/// DPI `COLOR_CODING` field values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum ColorCoding {
    Bit16Config1 = 0,
    Bit16Config2 = 1,
    Bit16Config3 = 2,
    Bit18Config1 = 3,
    Bit18Config2 = 4,
    Bit24 = 5,
}

impl PixelFormat {
    pub const fn bpp(self) -> u32 {
        match self {
            PixelFormat::Rgb888 | PixelFormat::Rgb666 => 24,
            PixelFormat::Rgb666Packed => 18,
            PixelFormat::Rgb565 => 16,
        }
    }

    /// DPI color coding and whether loosely packed 18-bit is enabled.
    pub const fn color_coding(self) -> (ColorCoding, bool) {
        match self {
            PixelFormat::Rgb888 => (ColorCoding::Bit24, false),
            PixelFormat::Rgb666 => (ColorCoding::Bit18Config2, false),
            PixelFormat::Rgb666Packed => (ColorCoding::Bit18Config1, true),
            PixelFormat::Rgb565 => (ColorCoding::Bit16Config1, false),
        }
    }
}

/// What the peripheral asked for when it attached.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LinkConfig {
    /// Data lanes, 1..=8. In dual-channel mode this is the total over both
    /// links until the pair splits it.
    pub lanes: u8,
    /// Virtual channel, 0..=3.
    pub channel: u8,
    pub format: PixelFormat,
    pub mode_flags: ModeFlags,
}

impl LinkConfig {
    pub const MAX_LANES: u8 = 8;

    pub fn new(lanes: u8, channel: u8, format: PixelFormat, mode_flags: ModeFlags) -> Result<Self> {
        let config = Self {
            lanes,
            channel: channel & 0x3,
            format,
            mode_flags,
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.lanes == 0 || self.lanes > Self::MAX_LANES {
            return Err(Error::InvalidLaneCount(self.lanes));
        }
        Ok(())
    }
}

impl Default for LinkConfig {
    fn default() -> Self {
        Self {
            lanes: 4,
            channel: 0,
            format: PixelFormat::Rgb888,
            mode_flags: ModeFlags::VIDEO | ModeFlags::VIDEO_BURST,
        }
    }
}

bitflags::bitflags! {
    /// Signal polarities of a video mode.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct DisplayFlags: u32 {
        const HSYNC_LOW = 1 << 0;
        const VSYNC_LOW = 1 << 2;
        const DE_LOW = 1 << 4;
    }
}

/// Display timings, in pixel clock cycles and lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct VideoMode {
    pub pixel_clock_hz: u32,
    pub hactive: u32,
    pub hfront_porch: u32,
    pub hback_porch: u32,
    pub hsync_len: u32,
    pub vactive: u32,
    pub vfront_porch: u32,
    pub vback_porch: u32,
    pub vsync_len: u32,
    pub flags: DisplayFlags,
}

impl VideoMode {
    /// Total line length in pixel clock cycles.
    pub const fn hline(&self) -> u32 {
        self.hsync_len + self.hback_porch + self.hactive + self.hfront_porch
    }
}

/// Board-level host settings that do not come from the peripheral.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct HostSettings {
    /// Fixed lane bit rate in bps. Skips the bandwidth calculation.
    pub bit_rate_per_lane_override: Option<u64>,
    /// Request an acknowledge after every command packet.
    pub ack_request: bool,
    /// Enable the pattern generator with this orientation (0 vertical, 1
    /// horizontal).
    pub vpg_orientation: Option<u8>,
    /// Enable the pattern generator with this mode (0 color bars, 1 BER).
    pub vpg_mode: Option<u8>,
}
