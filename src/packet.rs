//! DSI packets as they are pushed through the generic interface FIFOs.

use core::slice::ChunksExact;

use crate::error::{Error, Result};

/// DSI data identifier type, the low 6 bits of the packet header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct DataType(pub u8);

impl DataType {
    pub const V_SYNC_START: Self = Self(0x01);
    pub const V_SYNC_END: Self = Self(0x11);
    pub const H_SYNC_START: Self = Self(0x21);
    pub const H_SYNC_END: Self = Self(0x31);
    pub const COLOR_MODE_OFF: Self = Self(0x02);
    pub const COLOR_MODE_ON: Self = Self(0x12);
    pub const SHUTDOWN_PERIPHERAL: Self = Self(0x22);
    pub const TURN_ON_PERIPHERAL: Self = Self(0x32);
    pub const GENERIC_SHORT_WRITE_0_PARAM: Self = Self(0x03);
    pub const GENERIC_SHORT_WRITE_1_PARAM: Self = Self(0x13);
    pub const GENERIC_SHORT_WRITE_2_PARAM: Self = Self(0x23);
    pub const GENERIC_READ_REQUEST_0_PARAM: Self = Self(0x04);
    pub const GENERIC_READ_REQUEST_1_PARAM: Self = Self(0x14);
    pub const GENERIC_READ_REQUEST_2_PARAM: Self = Self(0x24);
    pub const DCS_SHORT_WRITE: Self = Self(0x05);
    pub const DCS_SHORT_WRITE_PARAM: Self = Self(0x15);
    pub const DCS_READ: Self = Self(0x06);
    pub const SET_MAXIMUM_RETURN_PACKET_SIZE: Self = Self(0x37);
    pub const END_OF_TRANSMISSION: Self = Self(0x08);

    pub const NULL_PACKET: Self = Self(0x09);
    pub const BLANKING_PACKET: Self = Self(0x19);
    pub const GENERIC_LONG_WRITE: Self = Self(0x29);
    pub const DCS_LONG_WRITE: Self = Self(0x39);
    pub const LOOSELY_PACKED_PIXEL_STREAM_YCBCR20: Self = Self(0x0c);
    pub const PACKED_PIXEL_STREAM_YCBCR24: Self = Self(0x1c);
    pub const PACKED_PIXEL_STREAM_YCBCR16: Self = Self(0x2c);
    pub const PACKED_PIXEL_STREAM_30: Self = Self(0x0d);
    pub const PACKED_PIXEL_STREAM_36: Self = Self(0x1d);
    pub const PACKED_PIXEL_STREAM_YCBCR12: Self = Self(0x3d);
    pub const PACKED_PIXEL_STREAM_16: Self = Self(0x0e);
    pub const PACKED_PIXEL_STREAM_18: Self = Self(0x1e);
    pub const PIXEL_STREAM_3BYTE_18: Self = Self(0x2e);
    pub const PACKED_PIXEL_STREAM_24: Self = Self(0x3e);

    pub const fn is_short(self) -> bool {
        matches!(
            self.0,
            0x01 | 0x11 | 0x21 | 0x31
                | 0x02 | 0x12 | 0x22 | 0x32
                | 0x03 | 0x13 | 0x23
                | 0x04 | 0x14 | 0x24
                | 0x05 | 0x15 | 0x06
                | 0x37 | 0x08
        )
    }

    pub const fn is_long(self) -> bool {
        matches!(
            self.0,
            0x09 | 0x19 | 0x29 | 0x39
                | 0x0c | 0x1c | 0x2c
                | 0x0d | 0x1d | 0x3d
                | 0x0e | 0x1e | 0x2e | 0x3e
        )
    }
}

bitflags::bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct MsgFlags: u16 {
        /// Send in low-power escape mode.
        const USE_LPM = 1 << 0;
        /// Ask the peripheral to acknowledge.
        const REQ_ACK = 1 << 1;
    }
}

/// A transfer request from the peripheral driver.
#[derive(Debug)]
pub struct Message<'a> {
    /// Virtual channel, 0..=3.
    pub channel: u8,
    pub data_type: DataType,
    pub flags: MsgFlags,
    pub tx: &'a [u8],
    /// Response buffer. Empty for writes.
    pub rx: &'a mut [u8],
}

impl<'a> Message<'a> {
    pub fn new(channel: u8, data_type: DataType, tx: &'a [u8]) -> Self {
        Self {
            channel,
            data_type,
            flags: MsgFlags::empty(),
            tx,
            rx: &mut [],
        }
    }

    /// DCS command with optional parameters. `data[0]` is the command byte.
    pub fn dcs_write(channel: u8, data: &'a [u8]) -> Result<Self> {
        let data_type = match data.len() {
            0 => return Err(Error::InvalidPacket),
            1 => DataType::DCS_SHORT_WRITE,
            2 => DataType::DCS_SHORT_WRITE_PARAM,
            _ => DataType::DCS_LONG_WRITE,
        };
        Ok(Self::new(channel, data_type, data))
    }

    /// DCS read of command `cmd` into `rx`.
    pub fn dcs_read(channel: u8, cmd: &'a u8, rx: &'a mut [u8]) -> Self {
        Self {
            rx,
            ..Self::new(channel, DataType::DCS_READ, core::slice::from_ref(cmd))
        }
    }

    /// Manufacturer specific write with any number of parameters.
    pub fn generic_write(channel: u8, data: &'a [u8]) -> Self {
        let data_type = match data.len() {
            0 => DataType::GENERIC_SHORT_WRITE_0_PARAM,
            1 => DataType::GENERIC_SHORT_WRITE_1_PARAM,
            2 => DataType::GENERIC_SHORT_WRITE_2_PARAM,
            _ => DataType::GENERIC_LONG_WRITE,
        };
        Self::new(channel, data_type, data)
    }

    pub fn with_flags(mut self, flags: MsgFlags) -> Self {
        self.flags = flags;
        self
    }

    pub fn expects_response(&self) -> bool {
        !self.rx.is_empty()
    }
}

/// Serialized packet: 4-byte header plus the payload of long packets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Packet<'a> {
    pub header: [u8; 4],
    pub payload: &'a [u8],
}

impl<'a> Packet<'a> {
    pub fn new(msg: &Message<'a>) -> Result<Self> {
        let ty = msg.data_type;
        if msg.channel > 3 || (!ty.is_short() && !ty.is_long()) {
            return Err(Error::InvalidPacket);
        }

        let data_id = (msg.channel << 6) | (ty.0 & 0x3f);
        let (wc_lsb, wc_msb, payload) = if ty.is_long() {
            let len = u16::try_from(msg.tx.len()).map_err(|_| Error::PayloadTooLong(msg.tx.len()))?;
            let [lsb, msb] = len.to_le_bytes();
            (lsb, msb, msg.tx)
        } else {
            if msg.tx.len() > 2 {
                return Err(Error::InvalidPacket);
            }
            let p0 = msg.tx.first().copied().unwrap_or(0);
            let p1 = msg.tx.get(1).copied().unwrap_or(0);
            (p0, p1, &[][..])
        };

        let mut header = [data_id, wc_lsb, wc_msb, 0];
        header[3] = ecc(&header);
        Ok(Self { header, payload })
    }

    /// Header as written to `GEN_HDR`.
    pub fn header_word(&self) -> u32 {
        u32::from_le_bytes(self.header)
    }

    /// Bytes this packet puts on the link.
    pub fn size(&self) -> usize {
        self.header.len() + self.payload.len()
    }

    /// Full little-endian payload words, in FIFO order.
    pub fn payload_words(&self) -> PayloadWords<'a> {
        PayloadWords(self.payload.chunks_exact(4))
    }

    /// The 1-3 trailing payload bytes packed little-endian into one word.
    pub fn payload_tail(&self) -> Option<u32> {
        let rest = self.payload.chunks_exact(4).remainder();
        if rest.is_empty() {
            return None;
        }
        let mut word = [0u8; 4];
        word[..rest.len()].copy_from_slice(rest);
        Some(u32::from_le_bytes(word))
    }
}

pub struct PayloadWords<'a>(ChunksExact<'a, u8>);

impl Iterator for PayloadWords<'_> {
    type Item = u32;

    fn next(&mut self) -> Option<u32> {
        self.0
            .next()
            .map(|c| u32::from_le_bytes([c[0], c[1], c[2], c[3]]))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.0.size_hint()
    }
}

impl ExactSizeIterator for PayloadWords<'_> {}

/// Hamming parity masks over the 24 header bits, one per ECC bit.
const ECC_MASKS: [u32; 6] = [
    0xf1_2cb7, // P0
    0xf2_555b, // P1
    0x74_9a6d, // P2
    0xb8_e38e, // P3
    0xdf_03f0, // P4
    0xef_fc00, // P5
];

/// 6-bit MIPI DSI header error correction code.
pub fn ecc(header: &[u8; 4]) -> u8 {
    let data = u32::from_le_bytes([header[0], header[1], header[2], 0]);
    ECC_MASKS
        .iter()
        .enumerate()
        .fold(0u8, |ecc, (bit, mask)| ecc | ((((data & mask).count_ones() & 1) as u8) << bit))
}
