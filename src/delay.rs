//! Blocking delay sources.
//!
//! Every operation in this crate takes an [`embedded_hal_1::delay::DelayNs`]
//! implementation, so any HAL's delay works. These are provided for targets
//! that have nothing better at hand.

#[cfg(feature = "time")]
pub use embassy_time::Delay;

/// Busy-wait delay that counts core cycles.
#[cfg(feature = "cortex-m")]
#[derive(Debug, Clone, Copy)]
pub struct CycleDelay {
    cpu_hz: u32,
}

#[cfg(feature = "cortex-m")]
impl CycleDelay {
    pub const fn new(cpu_hz: u32) -> Self {
        Self { cpu_hz }
    }
}

#[cfg(feature = "cortex-m")]
impl embedded_hal_1::delay::DelayNs for CycleDelay {
    fn delay_ns(&mut self, ns: u32) {
        let cycles = (ns as u64 * self.cpu_hz as u64).div_ceil(1_000_000_000);
        cortex_m::asm::delay(cycles.min(u32::MAX as u64) as u32);
    }

    fn delay_us(&mut self, us: u32) {
        let cycles = (us as u64 * self.cpu_hz as u64).div_ceil(1_000_000);
        cortex_m::asm::delay(cycles.min(u32::MAX as u64) as u32);
    }
}
