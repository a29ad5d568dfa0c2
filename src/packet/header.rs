//! WWIVnet packet header.
//!
//! ```text
//! ┌─────────────────────────────────────┐
//! │ HEADER (24 bytes, little endian)    │
//! │  to_system: u16     to_user: u16    │
//! │  from_system: u16   from_user: u16  │
//! │  main_type: u16     minor_type: u16 │
//! │  list_len: u16                      │
//! │  daten: u32         length: u32     │
//! │  method: u16                        │
//! ├─────────────────────────────────────┤
//! │ LIST (list_len × u16 system number) │
//! ├─────────────────────────────────────┤
//! │ PAYLOAD (length bytes)              │
//! └─────────────────────────────────────┘
//! ```

use std::io::{self, Read, Write};

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use serde::Serialize;

use crate::model::types::MainType;

/// Size of an encoded [`NetHeader`].
pub const HEADER_SIZE: usize = 24;

/// Size of one list entry.
pub const LIST_ENTRY_SIZE: usize = 2;

/// Fixed header preceding every WWIVnet packet.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct NetHeader {
    /// Destination system, 0 when the list names the destinations.
    pub to_system: u16,
    /// Destination user number, 0 for system messages.
    pub to_user: u16,
    pub from_system: u16,
    pub from_user: u16,
    /// Raw main type; see [`NetHeader::main_type`].
    pub main_type: u16,
    pub minor_type: u16,
    /// Number of `u16` system numbers between header and payload.
    pub list_len: u16,
    /// Creation time, seconds since the Unix epoch.
    pub daten: u32,
    /// Payload length in bytes.
    pub length: u32,
    /// Compression/encoding method, 0 for plain text.
    pub method: u16,
}

impl NetHeader {
    /// Header with the given type; all other fields zero.
    pub fn with_type(main_type: MainType, minor_type: u16) -> Self {
        Self {
            main_type: main_type.as_u16(),
            minor_type,
            ..Self::default()
        }
    }

    /// The main type, if it is one we know.
    pub fn main_type(&self) -> Option<MainType> {
        MainType::try_from(self.main_type).ok()
    }

    pub fn encode<W: Write>(&self, writer: &mut W) -> io::Result<()> {
        writer.write_u16::<LittleEndian>(self.to_system)?;
        writer.write_u16::<LittleEndian>(self.to_user)?;
        writer.write_u16::<LittleEndian>(self.from_system)?;
        writer.write_u16::<LittleEndian>(self.from_user)?;
        writer.write_u16::<LittleEndian>(self.main_type)?;
        writer.write_u16::<LittleEndian>(self.minor_type)?;
        writer.write_u16::<LittleEndian>(self.list_len)?;
        writer.write_u32::<LittleEndian>(self.daten)?;
        writer.write_u32::<LittleEndian>(self.length)?;
        writer.write_u16::<LittleEndian>(self.method)?;
        Ok(())
    }

    pub fn decode<R: Read>(reader: &mut R) -> io::Result<Self> {
        Ok(Self {
            to_system: reader.read_u16::<LittleEndian>()?,
            to_user: reader.read_u16::<LittleEndian>()?,
            from_system: reader.read_u16::<LittleEndian>()?,
            from_user: reader.read_u16::<LittleEndian>()?,
            main_type: reader.read_u16::<LittleEndian>()?,
            minor_type: reader.read_u16::<LittleEndian>()?,
            list_len: reader.read_u16::<LittleEndian>()?,
            daten: reader.read_u32::<LittleEndian>()?,
            length: reader.read_u32::<LittleEndian>()?,
            method: reader.read_u16::<LittleEndian>()?,
        })
    }

    /// Bytes the list and payload declared by this header occupy.
    pub fn body_len(&self) -> u64 {
        u64::from(self.list_len) * LIST_ENTRY_SIZE as u64 + u64::from(self.length)
    }
}
