//! Protocol error interrupt decoding.
//!
//! Purely diagnostic: nothing here changes driver state.

use crate::regs::{self, RegisterBus};
use crate::utils::BitIter;

static ACK_ERRORS: [&str; 16] = [
    "SoT error from the acknowledge error report",
    "SoT sync error from the acknowledge error report",
    "EoT sync error from the acknowledge error report",
    "escape mode entry command error from the acknowledge error report",
    "LP transmit sync error from the acknowledge error report",
    "peripheral timeout error from the acknowledge error report",
    "false control error from the acknowledge error report",
    "reserved (device specific) error from the acknowledge error report",
    "single-bit ECC error (corrected) from the acknowledge error report",
    "multi-bit ECC error (not corrected) from the acknowledge error report",
    "checksum error (long packet only) from the acknowledge error report",
    "unrecognized DSI data type from the acknowledge error report",
    "invalid DSI VC ID from the acknowledge error report",
    "invalid transmission length from the acknowledge error report",
    "reserved (device specific) error from the acknowledge error report",
    "DSI protocol violation from the acknowledge error report",
];

static DPHY_ERRORS: [&str; 5] = [
    "ErrEsc escape entry error from lane 0",
    "ErrSyncEsc low-power data transmission synchronization error from lane 0",
    "ErrControl error from lane 0",
    "ErrContentionLP0 LP0 contention error from lane 0",
    "ErrContentionLP1 LP1 contention error from lane 0",
];

static HOST_ERRORS: [&str; 13] = [
    "high-speed transmission timeout counter expired",
    "low-power reception timeout counter expired",
    "received packet contains a single-bit ECC error",
    "received packet contains a multi-bit ECC error",
    "received long packet has a CRC error in its payload",
    "received transmission does not end on a byte boundary",
    "received transmission does not end with an EoT packet",
    "DPI pixel payload FIFO overflow",
    "generic command FIFO overflow",
    "generic write payload FIFO overflow",
    "generic write payload FIFO underflow",
    "generic read FIFO underflow",
    "generic read FIFO overflow",
];

/// D-PHY errors sit above the acknowledge errors in `INT_ST0`.
const DPHY_SHIFT: u32 = 16;

/// One reported protocol or link quality error, by bit index.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ProtocolError {
    /// Error reported by the peripheral in an acknowledge packet.
    Ack(u8),
    /// Lane 0 escape or contention error seen by the D-PHY.
    Dphy(u8),
    /// Timeout, ECC/CRC or FIFO error detected by the host.
    Host(u8),
}

impl ProtocolError {
    pub fn description(&self) -> &'static str {
        let (table, bit): (&[&'static str], u8) = match *self {
            ProtocolError::Ack(bit) => (&ACK_ERRORS, bit),
            ProtocolError::Dphy(bit) => (&DPHY_ERRORS, bit),
            ProtocolError::Host(bit) => (&HOST_ERRORS, bit),
        };
        table.get(bit as usize).copied().unwrap_or("unknown error")
    }
}

/// Raw `INT_ST0`/`INT_ST1` snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct IrqStatus {
    pub st0: u32,
    pub st1: u32,
}

impl IrqStatus {
    /// Reads both status registers. Reading clears them.
    pub fn read<R: RegisterBus>(regs: &mut R) -> Self {
        Self {
            st0: regs.read(regs::INT_ST0),
            st1: regs.read(regs::INT_ST1),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.errors().next().is_none()
    }

    /// Every described error bit that is set: acknowledge errors, then D-PHY,
    /// then host.
    pub fn errors(&self) -> impl Iterator<Item = ProtocolError> {
        let ack = BitIter(self.st0 & 0xffff).map(ProtocolError::Ack);
        let dphy = BitIter((self.st0 >> DPHY_SHIFT) & 0x1f).map(ProtocolError::Dphy);
        let host = BitIter(self.st1 & 0x1fff).map(ProtocolError::Host);
        ack.chain(dphy).chain(host)
    }

    pub(crate) fn log(&self, index: u8) {
        for err in self.errors() {
            debug!("dsi{}: {}", index, err.description());
        }
    }
}
