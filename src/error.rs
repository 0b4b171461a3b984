//! Driver error type.

use crate::phy::PhyState;

/// Hardware wait that can expire.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Wait {
    /// D-PHY PLL lock status.
    PllLock,
    /// Data lane 0 and clock lane stop state.
    LaneStopState,
    /// Generic write payload FIFO not full.
    PayloadFifoNotFull,
    /// Generic command FIFO not full.
    CommandFifoNotFull,
    /// Generic command and write payload FIFOs drained.
    WriteFifosEmpty,
    /// Generic read command no longer busy.
    ReadCommandNotBusy,
    /// Generic read payload FIFO not empty.
    ReadFifoNotEmpty,
}

/// Coarse error category, for callers that branch on retry policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ErrorKind {
    /// Bad configuration. Fatal to the operation that reported it.
    Config,
    /// PHY bring-up handshake failed. Aborts the lifecycle phase.
    Handshake,
    /// A single transfer failed. The caller may retry.
    Transfer,
}

/// DSI driver error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Error {
    /// Lane count outside of the supported range.
    InvalidLaneCount(u8),
    /// The SoC has no DSI controller with that index.
    NoSuchInstance,
    /// No PLL divider pair reaches the requested rate.
    NoPllSolution,
    /// Pixel clock is zero and no bandwidth override is set.
    InvalidPixelClock,
    /// Message cannot be turned into a DSI packet.
    InvalidPacket,
    /// Long packet payload exceeds the 16-bit word count.
    PayloadTooLong(usize),
    /// A hardware wait expired.
    Timeout(Wait),
    /// Driving an external bridge GPIO failed.
    Bridge,
    /// PHY power sequencer step requested out of order.
    InvalidPhyState { expected: PhyState, actual: PhyState },
    /// No peripheral attached to the host.
    NotAttached,
    /// The halves of a pair drive different kinds of PHY.
    MismatchedPhy,
}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::InvalidLaneCount(_)
            | Error::NoSuchInstance
            | Error::NoPllSolution
            | Error::InvalidPixelClock
            | Error::NotAttached
            | Error::MismatchedPhy
            | Error::InvalidPhyState { .. } => ErrorKind::Config,
            Error::Timeout(Wait::PllLock) | Error::Timeout(Wait::LaneStopState) | Error::Bridge => {
                ErrorKind::Handshake
            }
            Error::Timeout(_) | Error::InvalidPacket | Error::PayloadTooLong(_) => ErrorKind::Transfer,
        }
    }

    /// Whether this is a FIFO that stayed full past its deadline.
    pub fn is_fifo_full(&self) -> bool {
        matches!(
            self,
            Error::Timeout(Wait::PayloadFifoNotFull) | Error::Timeout(Wait::CommandFifoNotFull)
        )
    }

    /// Whether the caller can reasonably retry the same operation.
    pub fn is_retryable(&self) -> bool {
        self.kind() == ErrorKind::Transfer && matches!(self, Error::Timeout(_))
    }
}

impl core::fmt::Display for Error {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Error::InvalidLaneCount(n) => write!(f, "invalid lane count {}", n),
            Error::NoSuchInstance => f.write_str("no such DSI controller on this SoC"),
            Error::NoPllSolution => f.write_str("no PLL divider pair reaches the requested rate"),
            Error::InvalidPixelClock => f.write_str("pixel clock is zero"),
            Error::InvalidPacket => f.write_str("message is not a valid DSI packet"),
            Error::PayloadTooLong(len) => write!(f, "payload of {} bytes is too long", len),
            Error::Timeout(wait) => write!(f, "timed out waiting for {:?}", wait),
            Error::Bridge => f.write_str("external bridge GPIO failed"),
            Error::InvalidPhyState { expected, actual } => {
                write!(f, "PHY in state {:?}, expected {:?}", actual, expected)
            }
            Error::NotAttached => f.write_str("no peripheral attached"),
            Error::MismatchedPhy => f.write_str("paired links use different PHY backends"),
        }
    }
}

pub type Result<T> = core::result::Result<T, Error>;
