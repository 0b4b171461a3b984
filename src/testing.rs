//! Host-side fakes for unit tests.

use std::cell::RefCell;
use std::collections::{BTreeMap, VecDeque};
use std::rc::Rc;

use embedded_hal_1::delay::DelayNs;
use embedded_hal_1::digital::{self, ErrorType, OutputPin};

use crate::phy::ExternalPhy;
use crate::regs::RegisterBus;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Access {
    Read(u32),
    /// Offset and the raw value written.
    Write(u32, u32),
}

/// Register file that records every access.
///
/// Reads return, in order of precedence: the next queued value, the pinned
/// value, the last stored value, zero. In hiword mode writes follow the GRF
/// convention and only touch the low-half bits enabled in the high half.
#[derive(Debug, Default)]
pub(crate) struct FakeRegs {
    values: BTreeMap<u32, u32>,
    pinned: BTreeMap<u32, u32>,
    queued: BTreeMap<u32, VecDeque<u32>>,
    hiword: bool,
    log: Vec<Access>,
}

impl FakeRegs {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn hiword() -> Self {
        Self {
            hiword: true,
            ..Self::default()
        }
    }

    /// Stores a value without logging.
    pub(crate) fn set(&mut self, offset: u32, value: u32) {
        self.values.insert(offset, value);
    }

    /// Every read of `offset` returns `value`, whatever was written.
    pub(crate) fn pin(&mut self, offset: u32, value: u32) {
        self.pinned.insert(offset, value);
    }

    pub(crate) fn queue(&mut self, offset: u32, values: &[u32]) {
        self.queued.entry(offset).or_default().extend(values);
    }

    /// Last stored value, without logging.
    pub(crate) fn value(&self, offset: u32) -> u32 {
        self.values.get(&offset).copied().unwrap_or(0)
    }

    pub(crate) fn snapshot(&self) -> BTreeMap<u32, u32> {
        self.values.clone()
    }

    pub(crate) fn log(&self) -> &[Access] {
        &self.log
    }

    pub(crate) fn clear_log(&mut self) {
        self.log.clear();
    }

    pub(crate) fn writes(&self) -> Vec<(u32, u32)> {
        self.log
            .iter()
            .filter_map(|a| match *a {
                Access::Write(off, v) => Some((off, v)),
                Access::Read(_) => None,
            })
            .collect()
    }

    pub(crate) fn writes_to(&self, offset: u32) -> Vec<u32> {
        self.writes()
            .into_iter()
            .filter(|(off, _)| *off == offset)
            .map(|(_, v)| v)
            .collect()
    }
}

impl RegisterBus for FakeRegs {
    fn read(&mut self, offset: u32) -> u32 {
        self.log.push(Access::Read(offset));
        if let Some(v) = self.queued.get_mut(&offset).and_then(VecDeque::pop_front) {
            return v;
        }
        if let Some(v) = self.pinned.get(&offset) {
            return *v;
        }
        self.value(offset)
    }

    fn write(&mut self, offset: u32, value: u32) {
        self.log.push(Access::Write(offset, value));
        let stored = if self.hiword {
            let mask = value >> 16;
            (self.value(offset) & !mask) | (value & mask)
        } else {
            value
        };
        self.values.insert(offset, stored);
    }
}

/// Accesses to several register buses, interleaved in the order they
/// happened.
#[derive(Debug, Default, Clone)]
pub(crate) struct Timeline(Rc<RefCell<Vec<(&'static str, Access)>>>);

impl Timeline {
    pub(crate) fn take(&self) -> Vec<(&'static str, Access)> {
        self.0.borrow_mut().drain(..).collect()
    }
}

/// [`FakeRegs`] that also reports every access to a [`Timeline`].
#[derive(Debug)]
pub(crate) struct TracedRegs {
    pub(crate) regs: FakeRegs,
    name: &'static str,
    timeline: Timeline,
}

impl TracedRegs {
    pub(crate) fn new(name: &'static str, regs: FakeRegs, timeline: &Timeline) -> Self {
        Self {
            regs,
            name,
            timeline: timeline.clone(),
        }
    }
}

impl RegisterBus for TracedRegs {
    fn read(&mut self, offset: u32) -> u32 {
        self.timeline.0.borrow_mut().push((self.name, Access::Read(offset)));
        self.regs.read(offset)
    }

    fn write(&mut self, offset: u32, value: u32) {
        self.timeline.0.borrow_mut().push((self.name, Access::Write(offset, value)));
        self.regs.write(offset, value);
    }
}

/// Adds up requested delays instead of waiting.
#[derive(Debug, Default)]
pub(crate) struct FakeDelay {
    ns: u64,
}

impl FakeDelay {
    pub(crate) fn total_us(&self) -> u64 {
        self.ns / 1_000
    }
}

impl DelayNs for FakeDelay {
    fn delay_ns(&mut self, ns: u32) {
        self.ns += ns as u64;
    }

    fn delay_us(&mut self, us: u32) {
        self.ns += us as u64 * 1_000;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum PhyCall {
    PowerOn,
    PowerOff,
    RoundRate(u64),
    SetRate(u64),
}

/// External PHY that rounds rates down to whole MHz.
#[derive(Debug, Default)]
pub(crate) struct FakePhy {
    pub(crate) calls: Vec<PhyCall>,
}

impl ExternalPhy for FakePhy {
    fn power_on(&mut self) {
        self.calls.push(PhyCall::PowerOn);
    }

    fn power_off(&mut self) {
        self.calls.push(PhyCall::PowerOff);
    }

    fn round_rate(&mut self, rate_hz: u64) -> u64 {
        self.calls.push(PhyCall::RoundRate(rate_hz));
        rate_hz / 1_000_000 * 1_000_000
    }

    fn set_rate(&mut self, rate_hz: u64) {
        self.calls.push(PhyCall::SetRate(rate_hz));
    }
}

/// Level changes of every [`FakePin`] sharing it, in order.
#[derive(Debug, Default, Clone)]
pub(crate) struct PinLog(Rc<RefCell<Vec<(&'static str, bool)>>>);

impl PinLog {
    pub(crate) fn take(&self) -> Vec<(&'static str, bool)> {
        self.0.borrow_mut().drain(..).collect()
    }
}

pub(crate) struct FakePin {
    name: &'static str,
    log: PinLog,
    fail: bool,
}

impl FakePin {
    pub(crate) fn new(name: &'static str, log: &PinLog) -> Self {
        Self {
            name,
            log: log.clone(),
            fail: false,
        }
    }

    pub(crate) fn failing(name: &'static str, log: &PinLog) -> Self {
        Self {
            fail: true,
            ..Self::new(name, log)
        }
    }

    fn drive(&mut self, level: bool) -> Result<(), digital::ErrorKind> {
        if self.fail {
            return Err(digital::ErrorKind::Other);
        }
        self.log.0.borrow_mut().push((self.name, level));
        Ok(())
    }
}

impl ErrorType for FakePin {
    type Error = digital::ErrorKind;
}

impl OutputPin for FakePin {
    fn set_low(&mut self) -> Result<(), Self::Error> {
        self.drive(false)
    }

    fn set_high(&mut self) -> Result<(), Self::Error> {
        self.drive(true)
    }
}
