use embedded_hal_1::delay::DelayNs;

/// Step and deadline for a bounded hardware poll, in microseconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PollSpec {
    pub step_us: u32,
    pub timeout_us: u32,
}

impl PollSpec {
    /// Generic FIFO status bits.
    pub const FIFO: Self = Self::new(1, 1_000);
    /// Read command busy bit. The peripheral needs a turnaround to answer.
    pub const CMD_BUSY: Self = Self::new(50, 5_000);
    pub const PLL_LOCK: Self = Self::new(10, 1_000);
    pub const STOP_STATE: Self = Self::new(1, 1_000);

    pub const fn new(step_us: u32, timeout_us: u32) -> Self {
        Self { step_us, timeout_us }
    }
}

/// A poll ran past its deadline without the condition holding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct TimedOut;

/// Re-evaluates `condition` every `spec.step_us` until it holds or
/// `spec.timeout_us` have elapsed.
///
/// The condition is always checked once before the deadline test, so a zero
/// timeout still observes the current hardware state.
pub(crate) fn poll_until<D, F>(delay: &mut D, spec: PollSpec, mut condition: F) -> Result<(), TimedOut>
where
    D: DelayNs,
    F: FnMut() -> bool,
{
    let mut waited: u32 = 0;
    loop {
        if condition() {
            return Ok(());
        }
        if waited >= spec.timeout_us {
            return Err(TimedOut);
        }
        delay.delay_us(spec.step_us);
        waited = waited.saturating_add(spec.step_us.max(1));
    }
}

/// Contiguous mask covering bits `high..=low`.
pub(crate) const fn genmask(high: u8, low: u8) -> u32 {
    (u32::MAX >> (31 - high)) & (u32::MAX << low)
}

/// Places `value` into the field `high..=low`, dropping any excess bits.
pub(crate) const fn field_prep(high: u8, low: u8, value: u32) -> u32 {
    (value << low) & genmask(high, low)
}

/// Extracts the field `high..=low` from `reg`.
pub(crate) const fn field_get(high: u8, low: u8, reg: u32) -> u32 {
    (reg & genmask(high, low)) >> low
}

pub(crate) struct BitIter(pub(crate) u32);

impl Iterator for BitIter {
    type Item = u8;

    fn next(&mut self) -> Option<Self::Item> {
        match self.0.trailing_zeros() {
            32 => None,
            b => {
                self.0 &= !(1 << b);
                Some(b as _)
            }
        }
    }
}
