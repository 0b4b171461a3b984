#![cfg_attr(not(test), no_std)]
#![doc = include_str!("../README.md")]

// This mod MUST go first, so that the others see its macros.
pub(crate) mod fmt;

mod macros;

mod utils;

pub mod bridge;
pub mod config;
pub mod delay;
pub mod dsi;
pub mod error;
pub mod grf;
mod host;
pub mod irq;
pub mod link;
pub mod packet;
pub mod phy;
pub mod regs;
pub mod soc;
pub mod timing;

#[cfg(test)]
mod testing;

// Reexports
pub use bridge::{Bridge, GpioBridge, NoBridge};
pub use config::{HostSettings, LinkConfig, ModeFlags, PixelFormat, VideoMode};
pub use dsi::{Dsi, HostHooks, Phase, Role};
pub use error::{Error, ErrorKind, Result, Wait};
pub use irq::{IrqStatus, ProtocolError};
pub use link::Link;
pub use packet::{DataType, Message, MsgFlags};
pub use phy::{ExternalPhy, NoPhy, PhyBackend, PhyState};
pub use regs::{Mmio, RegisterBus};
pub use soc::SocData;
pub use utils::PollSpec;
