//! General Register File (GRF) field descriptors.
//!
//! A handful of DSI control lines (turn request, lane enables, VOP select and
//! so on) do not live in the DSI block but in the SoC-wide GRF, at a different
//! place on every chip. Each SoC supplies a [`GrfTable`] per controller,
//! indexed by [`GrfSignal`]; an entry equal to [`GrfDesc::ABSENT`] means the
//! line does not exist on that chip and writes to it are dropped.

use crate::regs::RegisterBus;
use crate::utils::{field_get, field_prep, genmask};

/// Logical DSI control line routed through the GRF.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum GrfSignal {
    DpiUpdateCfg,
    DpiShutdn,
    DpiColorM,
    VopSel,
    TurnRequest,
    TurnDisable,
    ForceTxStopMode,
    ForceRxMode,
    EnableN,
    MasterSlaveZ,
    EnableClk,
    BaseDir,
}

impl GrfSignal {
    pub const COUNT: usize = 12;
}

/// Location of a field inside a GRF register.
///
/// Packed as `offset << 16 | high << 8 | low`. The all-zero value is reserved
/// for "absent".
///
/// Descriptors only come from the built-in SoC tables:
///
/// ```compile_fail
/// let _ = rockchip_dsi::grf::GrfDesc::new(0x25c, 6, 6);
/// ```
#[derive(Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct GrfDesc(u32);

impl GrfDesc {
    pub const ABSENT: Self = Self(0);

    /// Panics on a malformed field. Only called from `grf_table!`, where that
    /// is a compile error.
    pub(crate) const fn new(offset: u16, high: u8, low: u8) -> Self {
        assert!(high < 16 && low <= high);
        Self(((offset as u32) << 16) | ((high as u32) << 8) | low as u32)
    }

    pub const fn is_absent(self) -> bool {
        self.0 == 0
    }

    pub const fn offset(self) -> u32 {
        self.0 >> 16
    }

    pub const fn high(self) -> u8 {
        (self.0 >> 8) as u8
    }

    pub const fn low(self) -> u8 {
        self.0 as u8
    }

    pub const fn mask(self) -> u32 {
        genmask(self.high(), self.low())
    }

    /// Returns `reg` with this field replaced by `value`. Excess bits of
    /// `value` are dropped.
    pub const fn apply(self, reg: u32, value: u32) -> u32 {
        (reg & !self.mask()) | field_prep(self.high(), self.low(), value)
    }

    /// Reads this field back out of `reg`.
    pub const fn extract(self, reg: u32) -> u32 {
        field_get(self.high(), self.low(), reg)
    }

    /// Word to store for a hiword-mask write: the field value in the low half
    /// and its write-enable mask in the high half.
    pub const fn hiword_value(self, value: u32) -> u32 {
        field_prep(self.high(), self.low(), value) | (self.mask() << 16)
    }
}

impl core::fmt::Debug for GrfDesc {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        if self.is_absent() {
            f.write_str("GrfDesc(absent)")
        } else {
            write!(f, "GrfDesc({:#x}[{}:{}])", self.offset(), self.high(), self.low())
        }
    }
}

pub type GrfTable = [GrfDesc; GrfSignal::COUNT];

/// Writes `value` to `signal` with a hiword-mask store. Absent signals are a
/// no-op.
pub(crate) fn write<G: RegisterBus>(grf: &mut G, table: &GrfTable, signal: GrfSignal, value: u32) {
    let desc = table[signal as usize];
    if desc.is_absent() {
        return;
    }
    trace!("grf {:?} <- {}", signal, value);
    grf.write(desc.offset(), desc.hiword_value(value));
}
