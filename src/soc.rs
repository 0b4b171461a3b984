//! Per-SoC variant data.

use crate::grf::GrfTable;

#[derive(Debug)]
pub struct SocData {
    pub name: &'static str,
    /// Device-tree compatible string of the DSI node.
    pub compatible: &'static str,
    /// Lowest supported lane bit rate, in Mbps.
    pub min_bit_rate_per_lane: u32,
    /// Highest supported lane bit rate, in Mbps.
    pub max_bit_rate_per_lane: u32,
    pub dsi0_grf: GrfTable,
    /// `None` on chips with a single DSI controller.
    pub dsi1_grf: Option<GrfTable>,
}

/// All supported variants.
pub static ALL: [&SocData; 4] = [&RK3288, &RK3366, &RK3368, &RK3399];

impl SocData {
    pub fn from_compatible(compatible: &str) -> Option<&'static SocData> {
        ALL.iter().copied().find(|soc| soc.compatible == compatible)
    }

    pub fn from_name(name: &str) -> Option<&'static SocData> {
        ALL.iter().copied().find(|soc| soc.name.eq_ignore_ascii_case(name))
    }

    /// Descriptor table of controller `index`, if the chip has it.
    pub fn grf_table(&self, index: u8) -> Option<&GrfTable> {
        match index {
            0 => Some(&self.dsi0_grf),
            1 => self.dsi1_grf.as_ref(),
            _ => None,
        }
    }

    pub fn instance_count(&self) -> u8 {
        if self.dsi1_grf.is_some() {
            2
        } else {
            1
        }
    }
}

pub static RK3288: SocData = SocData {
    name: "rk3288",
    compatible: "rockchip,rk3288-mipi-dsi",
    min_bit_rate_per_lane: 80,
    max_bit_rate_per_lane: 1500,
    dsi0_grf: grf_table! {
        DpiColorM => (0x025c, 8, 8),
        DpiShutdn => (0x025c, 7, 7),
        VopSel => (0x025c, 6, 6),
        ForceTxStopMode => (0x0264, 11, 8),
        ForceRxMode => (0x0264, 7, 4),
        TurnDisable => (0x0264, 3, 0),
        TurnRequest => (0x03a4, 10, 8),
        DpiUpdateCfg => (0x03a8, 0, 0),
    },
    dsi1_grf: Some(grf_table! {
        DpiColorM => (0x025c, 11, 11),
        DpiShutdn => (0x025c, 10, 10),
        VopSel => (0x025c, 9, 9),
        EnableN => (0x0268, 15, 12),
        ForceTxStopMode => (0x0268, 11, 8),
        ForceRxMode => (0x0268, 7, 4),
        TurnDisable => (0x0268, 3, 0),
        BaseDir => (0x027c, 15, 15),
        MasterSlaveZ => (0x027c, 14, 14),
        EnableClk => (0x027c, 12, 12),
        TurnRequest => (0x03a4, 7, 4),
        DpiUpdateCfg => (0x03a8, 1, 1),
    }),
};

pub static RK3366: SocData = SocData {
    name: "rk3366",
    compatible: "rockchip,rk3366-mipi-dsi",
    min_bit_rate_per_lane: 80,
    max_bit_rate_per_lane: 1000,
    dsi0_grf: grf_table! {
        VopSel => (0x0400, 2, 2),
        DpiUpdateCfg => (0x0410, 9, 9),
        DpiColorM => (0x0410, 3, 3),
        DpiShutdn => (0x0410, 2, 2),
        ForceTxStopMode => (0x0414, 10, 7),
        ForceRxMode => (0x0414, 6, 6),
        TurnDisable => (0x0414, 5, 5),
    },
    dsi1_grf: None,
};

pub static RK3368: SocData = SocData {
    name: "rk3368",
    compatible: "rockchip,rk3368-mipi-dsi",
    min_bit_rate_per_lane: 80,
    max_bit_rate_per_lane: 1000,
    dsi0_grf: grf_table! {
        DpiUpdateCfg => (0x0418, 7, 7),
        DpiColorM => (0x0418, 3, 3),
        DpiShutdn => (0x0418, 2, 2),
        ForceTxStopMode => (0x041c, 10, 7),
        ForceRxMode => (0x041c, 6, 6),
        TurnDisable => (0x041c, 5, 5),
    },
    dsi1_grf: None,
};

pub static RK3399: SocData = SocData {
    name: "rk3399",
    compatible: "rockchip,rk3399-mipi-dsi",
    min_bit_rate_per_lane: 80,
    max_bit_rate_per_lane: 1500,
    dsi0_grf: grf_table! {
        DpiUpdateCfg => (0x6224, 15, 15),
        DpiShutdn => (0x6224, 14, 14),
        DpiColorM => (0x6224, 13, 13),
        VopSel => (0x6250, 0, 0),
        TurnRequest => (0x6258, 15, 12),
        TurnDisable => (0x6258, 11, 8),
        ForceTxStopMode => (0x6258, 7, 4),
        ForceRxMode => (0x6258, 3, 0),
    },
    dsi1_grf: Some(grf_table! {
        VopSel => (0x6250, 4, 4),
        DpiUpdateCfg => (0x6250, 3, 3),
        DpiShutdn => (0x6250, 2, 2),
        DpiColorM => (0x6250, 1, 1),
        TurnDisable => (0x625c, 15, 12),
        ForceTxStopMode => (0x625c, 11, 8),
        ForceRxMode => (0x625c, 7, 4),
        EnableN => (0x625c, 3, 0),
        MasterSlaveZ => (0x6260, 7, 7),
        EnableClk => (0x6260, 6, 6),
        BaseDir => (0x6260, 5, 5),
        TurnRequest => (0x6260, 3, 0),
    }),
};
