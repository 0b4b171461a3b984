//! D-PHY test interface.
//!
//! The embedded PHY exposes its configuration registers through a
//! bit-banged port in `PHY_TST_CTRL0`/`PHY_TST_CTRL1`: a falling TESTCLK edge
//! with TESTEN high latches a test code (register address), a rising edge
//! with TESTEN low latches test data. Every line change must settle for 1 us.

use embedded_hal_1::delay::DelayNs;

use crate::regs::{self, RegisterBus};

/// Settle time after every test interface line change.
const SETTLE_US: u32 = 1;

// Test codes.
pub const CODE_INACTIVE: u8 = 0x00;
pub const CODE_PLL_INPUT_DIV: u8 = 0x17;
pub const CODE_PLL_LOOP_DIV: u8 = 0x18;
pub const CODE_PLL_PROGRAM_EN: u8 = 0x19;
pub const CODE_BIAS_EXTRA: u8 = 0x22;
pub const CODE_HSFREQRANGE: u8 = 0x44;

pub const INPUT_DIV_PROGRAM_EN: u8 = 1 << 4;
pub const LOOP_DIV_PROGRAM_EN: u8 = 1 << 5;
pub const LOOP_DIV_HIGH_SEL: u8 = 1 << 7;
/// Analog support for lane rates above 1 Gbps.
pub const BIAS_EXTRA_1G5: u8 = 0x88;

pub const fn hsfreqrange(code: u8) -> u8 {
    (code << 1) & 0x7e
}

pub const fn input_div(n: u8) -> u8 {
    n & 0x7f
}

pub const fn loop_div_low(m: u16) -> u8 {
    (m & 0x1f) as u8
}

pub const fn loop_div_high(m: u16) -> u8 {
    LOOP_DIV_HIGH_SEL | ((m >> 5) & 0xf) as u8
}

pub struct TestInterface<'a, R, D> {
    regs: &'a mut R,
    delay: &'a mut D,
}

impl<'a, R: RegisterBus, D: DelayNs> TestInterface<'a, R, D> {
    pub fn new(regs: &'a mut R, delay: &'a mut D) -> Self {
        Self { regs, delay }
    }

    fn ctrl0(&mut self, mask: u32, value: u32) {
        self.regs.update_bits(regs::PHY_TST_CTRL0, mask, value);
        self.delay.delay_us(SETTLE_US);
    }

    fn ctrl1(&mut self, mask: u32, value: u32) {
        self.regs.update_bits(regs::PHY_TST_CTRL1, mask, value);
        self.delay.delay_us(SETTLE_US);
    }

    fn testclk(&mut self, high: bool) {
        self.ctrl0(regs::PHY_TESTCLK, if high { regs::PHY_TESTCLK } else { 0 });
    }

    fn testen(&mut self, high: bool) {
        self.ctrl1(regs::PHY_TESTEN, if high { regs::PHY_TESTEN } else { 0 });
    }

    fn set_data(&mut self, data: u8) {
        self.ctrl1(0xff, regs::test_din(data));
    }

    /// Holds the test interface in reset while `assert` is set.
    pub fn clear(&mut self, assert: bool) {
        self.ctrl0(regs::PHY_TESTCLR, if assert { regs::PHY_TESTCLR } else { 0 });
    }

    fn monitor(&mut self) -> u8 {
        regs::test_dout(self.regs.read(regs::PHY_TST_CTRL1))
    }

    fn code(&mut self, code: u8) {
        self.testclk(true);
        self.set_data(code);
        self.testen(true);
        self.testclk(false);
        self.testen(false);
    }

    fn data(&mut self, data: u8) {
        self.testclk(false);
        self.set_data(data);
        self.testclk(true);
    }

    pub fn write(&mut self, code: u8, data: u8) {
        self.code(code);
        self.data(data);
        debug!(
            "test_code={:#x}, test_data={:#x}, monitor_data={:#x}",
            code,
            data,
            self.monitor()
        );
    }

    /// Reads a PHY register. The value read is written back to complete the
    /// data phase.
    pub fn read(&mut self, code: u8) -> u8 {
        self.code(code);
        let value = self.monitor();
        self.data(value);
        value
    }
}
