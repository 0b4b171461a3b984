use proptest::prelude::*;

use super::*;
use crate::soc::{RK3288, RK3366};

#[test]
fn bandwidth_of_1080p60_on_four_lanes() {
    assert_eq!(required_bandwidth(148_500_000, 24, 4, false, &RK3288), 1_069_200_000);
    // Same pixel stream split across two 2-lane links.
    assert_eq!(required_bandwidth(148_500_000, 24, 2, true, &RK3288), 1_069_200_000);
}

#[test]
fn bandwidth_out_of_range_uses_max() {
    assert_eq!(required_bandwidth(148_500_000, 24, 4, false, &RK3366), 1_000_000_000);
    assert_eq!(required_bandwidth(1_000_000, 24, 4, false, &RK3288), 1_500_000_000);
}

#[test]
fn pll_for_1080p60() {
    let pll = solve_pll(24_000_000, 1_069_200_000).unwrap();
    assert_eq!(
        pll,
        PllParams {
            input_div: 4,
            feedback_div: 178,
            freq_hz: 1_068_000_000,
        }
    );
}

#[test]
fn pll_ties_keep_smallest_input_divider() {
    let pll = solve_pll(24_000_000, 1_056_000_000).unwrap();
    assert_eq!(pll.input_div, 1);
    assert_eq!(pll.feedback_div, 44);
    assert_eq!(pll.freq_hz, 1_056_000_000);
}

#[test]
fn pll_without_solution() {
    assert_eq!(solve_pll(0, 500_000_000), None);
    // Reference too slow for Fref / N >= 5 MHz.
    assert_eq!(solve_pll(4_000_000, 500_000_000), None);
    // Target far below the VCO range.
    assert_eq!(solve_pll(24_000_000, 10_000_000), None);
}

#[test]
fn hstt_row_selection() {
    let row = hs_transition_times(95);
    assert_eq!(row.max_mbps, 100);
    assert_eq!(row.clk_lane, LaneTransition { lp2hs: 35, hs2lp: 23 });
    assert_eq!(row.data_lane, LaneTransition { lp2hs: 28, hs2lp: 14 });

    assert_eq!(hs_transition_times(89).max_mbps, 90);
    assert_eq!(hs_transition_times(90).max_mbps, 100);
}

#[test]
fn table_lookups_clamp_at_both_ends() {
    assert_eq!(hs_transition_times(0).max_mbps, 90);
    assert_eq!(hs_transition_times(1500).max_mbps, 1500);
    assert_eq!(hs_transition_times(u32::MAX).data_lane.hs2lp, 50);

    assert_eq!(hs_freq_range(0), 0x00);
    assert_eq!(hs_freq_range(95), 0x10);
    assert_eq!(hs_freq_range(1068), 0x3a);
    assert_eq!(hs_freq_range(5000), 0x3c);
}

#[test]
fn escape_clock_stays_under_20mhz() {
    assert_eq!(lane_byte_clock_hz(1068), 133_500_000);
    assert_eq!(escape_clock_divider(1068), 7);
    assert_eq!(escape_clock_divider(80), 1);
    assert_eq!(escape_clock_divider(160), 1);
    assert_eq!(escape_clock_divider(168), 2);
}

#[test]
fn horizontal_timing_conversion_rounds_to_nearest() {
    let lbc = lane_byte_clock_hz(1068);
    assert_eq!(to_lane_byte_cycles(2200, lbc, 148_500_000), 1978);
    assert_eq!(to_lane_byte_cycles(44, lbc, 148_500_000), 40);
    assert_eq!(to_lane_byte_cycles(148, lbc, 148_500_000), 133);
    assert_eq!(to_lane_byte_cycles(100, lbc, 0), 0);
}

proptest! {
    #[test]
    fn pll_solution_respects_constraints(
        fin_mhz in 5u32..=200,
        fout_mhz in 40u32..=1600,
    ) {
        let Some(pll) = solve_pll(fin_mhz * 1_000_000, fout_mhz as u64 * 1_000_000) else {
            return Ok(());
        };
        let div = pll.input_div as u32;
        let fbdiv = pll.feedback_div as u32;
        let fvco = (pll.freq_hz / 1_000_000) as u32;

        prop_assert!((1..=128).contains(&div));
        prop_assert!(fbdiv > 12 && fbdiv < 1000);
        prop_assert_eq!(fbdiv % 2, 0);
        prop_assert!((80..=1500).contains(&fvco));
        prop_assert!(fin_mhz / div >= 5 && fin_mhz.div_ceil(div) <= 40);
        prop_assert_eq!(fvco, fbdiv * fin_mhz / div);
        // Rounding M up to even costs at most one reference step.
        prop_assert!(fout_mhz.abs_diff(fvco) * div <= fin_mhz + div);
    }

    #[test]
    fn pll_from_24mhz_always_solves_in_range(fout_mhz in 80u32..=1500) {
        prop_assert!(solve_pll(24_000_000, fout_mhz as u64 * 1_000_000).is_some());
    }
}
