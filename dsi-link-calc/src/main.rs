use std::fs;
use std::path::PathBuf;

use anyhow::{anyhow, bail, Context, Result};
use clap::Parser;
use serde::Deserialize;

use rockchip_dsi::timing::{
    escape_clock_divider, hs_freq_range, hs_transition_times, lane_byte_clock_hz, required_bandwidth, solve_pll,
    to_lane_byte_cycles,
};
use rockchip_dsi::{PixelFormat, SocData};

/// Works out the D-PHY settings a panel link will be brought up with
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Link description (hjson)
    input: PathBuf,
}

#[derive(Deserialize, Debug, Clone, Copy)]
#[serde(rename_all = "lowercase")]
enum Format {
    Rgb888,
    Rgb666,
    Rgb666Packed,
    Rgb565,
}

impl From<Format> for PixelFormat {
    fn from(format: Format) -> Self {
        match format {
            Format::Rgb888 => PixelFormat::Rgb888,
            Format::Rgb666 => PixelFormat::Rgb666,
            Format::Rgb666Packed => PixelFormat::Rgb666Packed,
            Format::Rgb565 => PixelFormat::Rgb565,
        }
    }
}

#[derive(Deserialize, Debug)]
struct Timings {
    pixel_clock_khz: u32,
    hactive: u32,
    hfront_porch: u32,
    hback_porch: u32,
    hsync_len: u32,
}

#[derive(Deserialize, Debug)]
struct LinkDesc {
    /// SoC name or DSI compatible string.
    soc: String,
    #[serde(default = "default_ref_clk")]
    ref_clk_hz: u32,
    /// Lanes of the whole panel, both links together when dual.
    lanes: u8,
    #[serde(default)]
    dual: bool,
    format: Format,
    /// Forces the lane rate, in Mbps.
    bit_rate_mbps: Option<u32>,
    timings: Timings,
}

fn default_ref_clk() -> u32 {
    24_000_000
}

/// Lanes driven by each controller, once the description was checked
/// against the SoC.
fn link_lanes(desc: &LinkDesc, soc: &SocData) -> Result<u8> {
    if desc.dual && soc.instance_count() < 2 {
        bail!("{} has a single DSI controller", soc.name);
    }
    if desc.lanes == 0 || desc.lanes > 8 {
        bail!("lane count {} out of range 1..=8", desc.lanes);
    }
    if desc.dual && desc.lanes < 2 {
        bail!("a dual link needs at least one lane per controller, got {} in total", desc.lanes);
    }
    if !desc.dual && desc.lanes > 4 {
        bail!("{} lanes need a dual link", desc.lanes);
    }
    Ok(if desc.dual { desc.lanes / 2 } else { desc.lanes })
}

fn pixel_clock_hz(timings: &Timings) -> Result<u32> {
    timings
        .pixel_clock_khz
        .checked_mul(1_000)
        .ok_or_else(|| anyhow!("pixel clock of {} kHz does not fit in 32 bits of Hz", timings.pixel_clock_khz))
}

fn main() -> Result<()> {
    let args = Args::parse();
    let text = fs::read_to_string(&args.input).with_context(|| format!("failed to read {:?}", args.input))?;
    let desc: LinkDesc = serde_hjson::from_str(&text).context("failed to parse link description")?;

    let soc = SocData::from_name(&desc.soc)
        .or_else(|| SocData::from_compatible(&desc.soc))
        .ok_or_else(|| anyhow!("unknown SoC '{}'", desc.soc))?;
    let link_lanes = link_lanes(&desc, soc)?;
    let pclk_hz = pixel_clock_hz(&desc.timings)?;
    let format = PixelFormat::from(desc.format);

    let bandwidth = match desc.bit_rate_mbps {
        Some(mbps) => mbps as u64 * 1_000_000,
        None => {
            if pclk_hz == 0 {
                bail!("pixel clock is zero and no lane rate was given");
            }
            required_bandwidth(pclk_hz, format.bpp(), link_lanes, desc.dual, soc)
        }
    };
    println!("SoC:              {}", soc.name);
    println!("Lanes:            {} x {}", if desc.dual { 2 } else { 1 }, link_lanes);
    println!("Required rate:    {} bps per lane", bandwidth);

    let pll = solve_pll(desc.ref_clk_hz, bandwidth)
        .ok_or_else(|| anyhow!("no PLL setting reaches {} bps from {} Hz", bandwidth, desc.ref_clk_hz))?;
    let lane_mbps = (pll.freq_hz / 1_000_000) as u32;
    println!("PLL:              N = {}, M = {}", pll.input_div, pll.feedback_div);
    println!("Lane rate:        {} Mbps", lane_mbps);

    let row = hs_transition_times(lane_mbps);
    println!("HSFREQRANGE:      {:#04x}", hs_freq_range(lane_mbps));
    println!(
        "Clock lane:       lp2hs {}, hs2lp {} (row < {} Mbps)",
        row.clk_lane.lp2hs, row.clk_lane.hs2lp, row.max_mbps
    );
    println!("Data lane:        lp2hs {}, hs2lp {}", row.data_lane.lp2hs, row.data_lane.hs2lp);
    println!("Escape divider:   {}", escape_clock_divider(lane_mbps));

    let lbc = lane_byte_clock_hz(lane_mbps);
    let t = &desc.timings;
    let hline = t.hsync_len + t.hback_porch + t.hactive + t.hfront_porch;
    println!("HLINE_TIME:       {}", to_lane_byte_cycles(hline, lbc, pclk_hz));
    println!("HSA_TIME:         {}", to_lane_byte_cycles(t.hsync_len, lbc, pclk_hz));
    println!("HBP_TIME:         {}", to_lane_byte_cycles(t.hback_porch, lbc, pclk_hz));
    let pkt = if desc.dual { t.hactive / 2 } else { t.hactive };
    println!("VID_PKT_SIZE:     {}", pkt);

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rockchip_dsi::soc::{RK3288, RK3368};

    fn desc(lanes: u8, dual: bool) -> LinkDesc {
        let text = format!(
            "{{
              soc: rk3288
              lanes: {}
              dual: {}
              format: rgb888
              timings: {{
                pixel_clock_khz: 148500
                hactive: 1920
                hfront_porch: 88
                hback_porch: 148
                hsync_len: 44
              }}
            }}",
            lanes, dual
        );
        serde_hjson::from_str(&text).unwrap()
    }

    #[test]
    fn dual_links_split_the_lanes() {
        let d = desc(8, true);
        assert_eq!(link_lanes(&d, &RK3288).unwrap(), 4);
        assert!(link_lanes(&d, &RK3368).is_err());
        assert!(link_lanes(&desc(8, false), &RK3288).is_err());
    }

    #[test]
    fn dual_link_with_one_lane_is_rejected() {
        assert!(link_lanes(&desc(1, true), &RK3288).is_err());
        assert_eq!(link_lanes(&desc(1, false), &RK3288).unwrap(), 1);
    }

    #[test]
    fn oversized_pixel_clock_is_an_error() {
        let d = desc(4, false);
        assert_eq!(pixel_clock_hz(&d.timings).unwrap(), 148_500_000);

        let t = Timings {
            pixel_clock_khz: 5_000_000,
            ..d.timings
        };
        assert!(pixel_clock_hz(&t).is_err());
    }
}
