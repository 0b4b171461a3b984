//! Link timing calculations.
//!
//! Everything here is pure: bandwidth from the pixel stream, the D-PHY PLL
//! divider search, and the two rate-indexed D-PHY tables.

use crate::soc::SocData;

#[cfg(test)]
mod tests;

/// Extra link bandwidth over the DPI input rate, in tenths. Burst mode needs
/// headroom to drop to low power once per line.
const BANDWIDTH_MARGIN_TENTHS: u64 = 12;

/// Lane bit rate needed to carry the pixel stream, in bits per second.
///
/// `lanes` is the per-link count; in dual-channel mode the stream is split
/// over twice as many. A result outside the SoC's lane rate range is replaced
/// by its maximum.
pub fn required_bandwidth(pixel_clock_hz: u32, bpp: u32, lanes: u8, dual: bool, soc: &SocData) -> u64 {
    let lanes = (if dual { lanes as u64 * 2 } else { lanes as u64 }).max(1);
    let bps = pixel_clock_hz as u64 * bpp as u64 * BANDWIDTH_MARGIN_TENTHS / 10 / lanes;

    let min = soc.min_bit_rate_per_lane as u64 * 1_000_000;
    let max = soc.max_bit_rate_per_lane as u64 * 1_000_000;
    if bps < min || bps > max {
        max
    } else {
        bps
    }
}

/// D-PHY PLL dividers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PllParams {
    /// Input divider N, 1..=128.
    pub input_div: u8,
    /// Feedback divider M, even, 13..=999.
    pub feedback_div: u16,
    /// Achieved VCO frequency in Hz.
    pub freq_hz: u64,
}

const FVCO_MIN_MHZ: u32 = 80;
const FVCO_MAX_MHZ: u32 = 1500;
const FREF_DIV_MIN_MHZ: u32 = 5;
const FREF_DIV_MAX_MHZ: u32 = 40;
const INPUT_DIV_MAX: u32 = 128;

/// Searches the divider pair whose output is closest to `target_hz`.
///
/// Works on whole MHz like the PHY's own programming model. Constraints:
/// `5 MHz <= Fref / N <= 40 MHz`, `12 < M < 1000` with M even (the PHY has a
/// divide-by-two prescaler), `80 MHz <= Fvco <= 1500 MHz`. Among equal
/// deviations the smallest N wins.
pub fn solve_pll(ref_clk_hz: u32, target_hz: u64) -> Option<PllParams> {
    let fin = ref_clk_hz / 1_000_000;
    let fout = (target_hz / 1_000_000).min(u32::MAX as u64) as u32;
    if fin == 0 {
        return None;
    }

    let min_div = fin.div_ceil(FREF_DIV_MAX_MHZ).max(1);
    let max_div = (fin / FREF_DIV_MIN_MHZ).min(INPUT_DIV_MAX);

    let mut best: Option<(u32, u32, u32)> = None;
    let mut min_delta = u32::MAX;

    for div in min_div..=max_div {
        let mut fbdiv = (fout as u64 * div as u64 / fin as u64) as u32;
        if fbdiv <= 12 || fbdiv >= 1000 {
            continue;
        }
        if fbdiv % 2 != 0 {
            fbdiv += 1;
        }

        let fvco = fbdiv * fin / div;
        if !(FVCO_MIN_MHZ..=FVCO_MAX_MHZ).contains(&fvco) {
            continue;
        }

        let delta = fout.abs_diff(fvco);
        if delta < min_delta {
            min_delta = delta;
            best = Some((div, fbdiv, fvco));
        }
    }

    best.map(|(div, fbdiv, fvco)| PllParams {
        input_div: div as u8,
        feedback_div: fbdiv as u16,
        freq_hz: fvco as u64 * 1_000_000,
    })
}

/// LP/HS transition times of one lane, in lane byte clock cycles.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct LaneTransition {
    pub lp2hs: u16,
    pub hs2lp: u16,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct HsTransition {
    /// Upper lane rate bound of this row, exclusive, in Mbps.
    pub max_mbps: u16,
    pub clk_lane: LaneTransition,
    pub data_lane: LaneTransition,
}

const fn hstt(max_mbps: u16, c_lp2hs: u16, c_hs2lp: u16, d_lp2hs: u16, d_hs2lp: u16) -> HsTransition {
    HsTransition {
        max_mbps,
        clk_lane: LaneTransition { lp2hs: c_lp2hs, hs2lp: c_hs2lp },
        data_lane: LaneTransition { lp2hs: d_lp2hs, hs2lp: d_hs2lp },
    }
}

#[rustfmt::skip]
static HSTT_TABLE: [HsTransition; 39] = [
    hstt(90,    32, 20,  26, 13), hstt(100,   35, 23,  28, 14),
    hstt(110,   32, 22,  26, 13), hstt(130,   31, 20,  27, 13),
    hstt(140,   33, 22,  26, 14), hstt(150,   33, 21,  26, 14),
    hstt(170,   32, 20,  27, 13), hstt(180,   36, 23,  30, 15),
    hstt(200,   40, 22,  33, 15), hstt(220,   40, 22,  33, 15),
    hstt(240,   44, 24,  36, 16), hstt(250,   48, 24,  38, 17),
    hstt(270,   48, 24,  38, 17), hstt(300,   50, 27,  41, 18),
    hstt(330,   56, 28,  45, 18), hstt(360,   59, 28,  48, 19),
    hstt(400,   61, 30,  50, 20), hstt(450,   67, 31,  55, 21),
    hstt(500,   73, 31,  59, 22), hstt(550,   79, 36,  63, 24),
    hstt(600,   83, 37,  68, 25), hstt(650,   90, 38,  73, 27),
    hstt(700,   95, 40,  77, 28), hstt(750,  102, 40,  84, 28),
    hstt(800,  106, 42,  87, 30), hstt(850,  113, 44,  93, 31),
    hstt(900,  118, 47,  98, 32), hstt(950,  124, 47, 102, 34),
    hstt(1000, 130, 49, 107, 35), hstt(1050, 135, 51, 111, 37),
    hstt(1100, 139, 51, 114, 38), hstt(1150, 146, 54, 120, 40),
    hstt(1200, 153, 57, 125, 41), hstt(1250, 158, 58, 130, 42),
    hstt(1300, 163, 58, 135, 44), hstt(1350, 168, 60, 140, 45),
    hstt(1400, 172, 64, 144, 47), hstt(1450, 176, 65, 148, 48),
    hstt(1500, 181, 66, 153, 50),
];

/// `(max_mbps, hsfreqrange)` rows for D-PHY test code 0x44.
#[rustfmt::skip]
static HSFREQRANGE_TABLE: [(u16, u8); 39] = [
    (  90, 0x00), ( 100, 0x10), ( 110, 0x20), ( 130, 0x01),
    ( 140, 0x11), ( 150, 0x21), ( 170, 0x02), ( 180, 0x12),
    ( 200, 0x22), ( 220, 0x03), ( 240, 0x13), ( 250, 0x23),
    ( 270, 0x04), ( 300, 0x14), ( 330, 0x05), ( 360, 0x15),
    ( 400, 0x25), ( 450, 0x06), ( 500, 0x16), ( 550, 0x07),
    ( 600, 0x17), ( 650, 0x08), ( 700, 0x18), ( 750, 0x09),
    ( 800, 0x19), ( 850, 0x29), ( 900, 0x39), ( 950, 0x0a),
    (1000, 0x1a), (1050, 0x2a), (1100, 0x3a), (1150, 0x0b),
    (1200, 0x1b), (1250, 0x2b), (1300, 0x3b), (1350, 0x0c),
    (1400, 0x1c), (1450, 0x2c), (1500, 0x3c),
];

/// Index of the first row whose bound exceeds `mbps`, or the last row.
fn row_for<T>(table: &[T], mbps: u32, bound: impl Fn(&T) -> u16) -> usize {
    table
        .iter()
        .position(|row| mbps < bound(row) as u32)
        .unwrap_or(table.len() - 1)
}

/// HS transition times for a lane rate in Mbps.
pub fn hs_transition_times(lane_mbps: u32) -> &'static HsTransition {
    &HSTT_TABLE[row_for(&HSTT_TABLE, lane_mbps, |row| row.max_mbps)]
}

/// D-PHY `hsfreqrange` code for a lane rate in Mbps.
pub fn hs_freq_range(lane_mbps: u32) -> u8 {
    HSFREQRANGE_TABLE[row_for(&HSFREQRANGE_TABLE, lane_mbps, |row| row.0)].1
}

/// Lane byte clock, one eighth of the lane bit rate.
pub const fn lane_byte_clock_hz(lane_mbps: u32) -> u64 {
    lane_mbps as u64 * 1_000_000 / 8
}

/// Maximum TX escape clock frequency.
pub const ESCAPE_CLOCK_MAX_HZ: u64 = 20_000_000;

/// Divider taking the lane byte clock down to at most 20 MHz.
pub const fn escape_clock_divider(lane_mbps: u32) -> u32 {
    lane_byte_clock_hz(lane_mbps).div_ceil(ESCAPE_CLOCK_MAX_HZ) as u32
}

/// Converts a count of pixel clock cycles to lane byte clock cycles, rounded
/// to the nearest.
pub const fn to_lane_byte_cycles(pixels: u32, lane_byte_clock_hz: u64, pixel_clock_hz: u32) -> u32 {
    if pixel_clock_hz == 0 {
        return 0;
    }
    let pclk = pixel_clock_hz as u64;
    ((pixels as u64 * lane_byte_clock_hz + pclk / 2) / pclk) as u32
}
