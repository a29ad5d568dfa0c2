//! FidoNet packed messages (FTS-0001 section 5.2).
//!
//! ```text
//! message_type u16 (=2)  orig_node u16  dest_node u16
//! orig_net u16  dest_net u16  attribute u16  cost u16
//! date_time   20 bytes, NUL padded
//! to_user     NUL terminated, max 36 with NUL
//! from_user   NUL terminated, max 36 with NUL
//! subject     NUL terminated, max 72 with NUL
//! text        NUL terminated
//! ```

use std::io::{self, BufRead, Write};

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use serde::Serialize;

use crate::error::{NetError, Result};
use crate::packet::field::NetText;

/// Size of the fixed part of a packed message.
pub const PACKED_HEADER_SIZE: usize = 14;
/// Only message type defined by FTS-0001.
pub const PACKED_MESSAGE_TYPE: u16 = 2;

pub const DATE_TIME_LEN: usize = 20;
pub const MAX_USER_NAME_LEN: usize = 36;
pub const MAX_SUBJECT_LEN: usize = 72;

pub const MSG_PRIVATE: u16 = 0x0001;
pub const MSG_CRASH: u16 = 0x0002;
pub const MSG_RECEIVED: u16 = 0x0004;
pub const MSG_SENT: u16 = 0x0008;
pub const MSG_FILE: u16 = 0x0010;
pub const MSG_IN_TRANSIT: u16 = 0x0020;
pub const MSG_ORPHAN: u16 = 0x0040;
pub const MSG_KILL: u16 = 0x0080;
pub const MSG_LOCAL: u16 = 0x0100;
pub const MSG_HOLD: u16 = 0x0200;
pub const MSG_FILE_REQUEST: u16 = 0x0800;
pub const MSG_RETURN_RECEIPT_REQUEST: u16 = 0x1000;
pub const MSG_IS_RETURN_RECEIPT: u16 = 0x2000;
pub const MSG_AUDIT_REQUEST: u16 = 0x4000;
pub const MSG_FILE_UPDATE_REQUEST: u16 = 0x8000;

/// Fixed-size part of a packed message.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct PackedMessageHeader {
    pub message_type: u16,
    pub orig_node: u16,
    pub dest_node: u16,
    pub orig_net: u16,
    pub dest_net: u16,
    pub attribute: u16,
    pub cost: u16,
}

impl PackedMessageHeader {
    pub fn is_private(&self) -> bool {
        self.attribute & MSG_PRIVATE != 0
    }

    pub fn encode<W: Write>(&self, writer: &mut W) -> io::Result<()> {
        for value in [
            self.message_type,
            self.orig_node,
            self.dest_node,
            self.orig_net,
            self.dest_net,
            self.attribute,
            self.cost,
        ] {
            writer.write_u16::<LittleEndian>(value)?;
        }
        Ok(())
    }
}

/// One message out of a FidoNet packet.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FidoPackedMessage {
    pub header: PackedMessageHeader,
    /// FTS-0001 or SEAdog date string.
    pub date_time: NetText,
    pub to_user_name: NetText,
    pub from_user_name: NetText,
    pub subject: NetText,
    /// Body with CR line endings, kludge lines included.
    pub text: NetText,
}

impl FidoPackedMessage {
    /// Write the message. Envelope fields too long for their slots are cut.
    pub fn encode<W: Write>(&self, writer: &mut W) -> io::Result<()> {
        let mut header = self.header;
        header.message_type = PACKED_MESSAGE_TYPE;
        header.encode(writer)?;

        let mut date = [0u8; DATE_TIME_LEN];
        let d = truncate_field(&self.date_time, DATE_TIME_LEN - 1);
        date[..d.len()].copy_from_slice(d);
        writer.write_all(&date)?;

        for (value, max) in [
            (&self.to_user_name, MAX_USER_NAME_LEN),
            (&self.from_user_name, MAX_USER_NAME_LEN),
            (&self.subject, MAX_SUBJECT_LEN),
        ] {
            writer.write_all(truncate_field(value, max - 1))?;
            writer.write_u8(0)?;
        }
        writer.write_all(until_nul(&self.text))?;
        writer.write_u8(0)?;
        Ok(())
    }

    /// Read the next message, advancing `offset` by the bytes consumed.
    ///
    /// Returns `Ok(None)` on the packet terminator or a clean end of input.
    pub(crate) fn read<R: BufRead>(reader: &mut R, offset: &mut u64) -> Result<Option<Self>> {
        let start = *offset;
        let mut message_type = [0u8; 2];
        let got = read_up_to(reader, &mut message_type)?;
        *offset += got as u64;
        match got {
            0 => return Ok(None),
            1 => {
                return Err(NetError::Truncated {
                    offset: start,
                    needed: 2,
                    available: 1,
                })
            }
            _ => {}
        }
        let message_type = u16::from_le_bytes(message_type);
        if message_type == 0 {
            return Ok(None);
        }
        if message_type != PACKED_MESSAGE_TYPE {
            return Err(NetError::Malformed {
                offset: start,
                reason: format!("unexpected message type {message_type}"),
            });
        }

        let mut fixed = [0u8; PACKED_HEADER_SIZE - 2 + DATE_TIME_LEN];
        let got = read_up_to(reader, &mut fixed)?;
        *offset += got as u64;
        if got < fixed.len() {
            return Err(NetError::Truncated {
                offset: start,
                needed: (PACKED_HEADER_SIZE + DATE_TIME_LEN) as u64,
                available: (got + 2) as u64,
            });
        }
        let mut cursor = &fixed[..];
        let header = PackedMessageHeader {
            message_type,
            orig_node: cursor.read_u16::<LittleEndian>()?,
            dest_node: cursor.read_u16::<LittleEndian>()?,
            orig_net: cursor.read_u16::<LittleEndian>()?,
            dest_net: cursor.read_u16::<LittleEndian>()?,
            attribute: cursor.read_u16::<LittleEndian>()?,
            cost: cursor.read_u16::<LittleEndian>()?,
        };
        let date_end = cursor.iter().position(|&b| b == 0).unwrap_or(cursor.len());
        let date_time = NetText::from(&cursor[..date_end]);

        let to_user_name = read_cstring(reader, offset, Some(MAX_USER_NAME_LEN), "to_user_name")?;
        let from_user_name =
            read_cstring(reader, offset, Some(MAX_USER_NAME_LEN), "from_user_name")?;
        let subject = read_cstring(reader, offset, Some(MAX_SUBJECT_LEN), "subject")?;
        let text = read_cstring(reader, offset, None, "text")?;

        Ok(Some(Self {
            header,
            date_time,
            to_user_name,
            from_user_name,
            subject,
            text,
        }))
    }
}

/// Read a NUL-terminated string of at most `max` bytes including the NUL.
fn read_cstring<R: BufRead>(
    reader: &mut R,
    offset: &mut u64,
    max: Option<usize>,
    field: &str,
) -> Result<NetText> {
    let start = *offset;
    let mut bytes = Vec::new();
    loop {
        let available = reader.fill_buf()?;
        if available.is_empty() {
            return Err(NetError::Truncated {
                offset: start,
                needed: bytes.len() as u64 + 1,
                available: bytes.len() as u64,
            });
        }
        let limit = max.map_or(available.len(), |m| available.len().min(m - bytes.len()));
        match available[..limit].iter().position(|&b| b == 0) {
            Some(nul) => {
                bytes.extend_from_slice(&available[..nul]);
                reader.consume(nul + 1);
                *offset += nul as u64 + 1;
                return Ok(bytes.into());
            }
            None => {
                bytes.extend_from_slice(&available[..limit]);
                reader.consume(limit);
                *offset += limit as u64;
                if max.is_some_and(|m| bytes.len() >= m) {
                    return Err(NetError::Malformed {
                        offset: start,
                        reason: format!("{field} longer than {} bytes", bytes.len()),
                    });
                }
            }
        }
    }
}

/// Fill `buf` as far as the input allows, returning the byte count.
fn read_up_to<R: BufRead>(reader: &mut R, buf: &mut [u8]) -> io::Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        let available = reader.fill_buf()?;
        if available.is_empty() {
            break;
        }
        let n = available.len().min(buf.len() - filled);
        buf[filled..filled + n].copy_from_slice(&available[..n]);
        reader.consume(n);
        filled += n;
    }
    Ok(filled)
}

/// Bytes before the first NUL, which would end the field early on the wire.
fn until_nul(bytes: &[u8]) -> &[u8] {
    let end = bytes.iter().position(|&b| b == 0).unwrap_or(bytes.len());
    &bytes[..end]
}

/// Longest prefix of a field that fits in `max` bytes.
///
/// UTF-8 text is cut on a character boundary; other bytes are cut at `max`.
fn truncate_field(bytes: &[u8], max: usize) -> &[u8] {
    let bytes = until_nul(bytes);
    if bytes.len() <= max {
        return bytes;
    }
    match std::str::from_utf8(bytes) {
        Ok(s) => {
            let mut end = max;
            while !s.is_char_boundary(end) {
                end -= 1;
            }
            &bytes[..end]
        }
        Err(_) => &bytes[..max],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn sample() -> FidoPackedMessage {
        FidoPackedMessage {
            header: PackedMessageHeader {
                message_type: PACKED_MESSAGE_TYPE,
                orig_node: 115,
                dest_node: 100,
                orig_net: 2,
                dest_net: 1,
                attribute: MSG_LOCAL | MSG_PRIVATE,
                cost: 0,
            },
            date_time: "02 Jan 06  15:04:05".into(),
            to_user_name: "Rushfan".into(),
            from_user_name: "Sysop".into(),
            subject: "test 4".into(),
            text: "AREA:GENERAL\rHello\r".into(),
        }
    }

    #[test]
    fn test_encode_then_read() {
        let msg = sample();
        let mut buf = Vec::new();
        msg.encode(&mut buf).unwrap();
        assert_eq!(&buf[0..2], &[2, 0]);
        assert_eq!(&buf[14..33], b"02 Jan 06  15:04:05");
        assert_eq!(buf[33], 0);
        assert_eq!(&buf[34..42], b"Rushfan\0");

        let mut offset = 0;
        let read = FidoPackedMessage::read(&mut Cursor::new(&buf), &mut offset)
            .unwrap()
            .unwrap();
        assert_eq!(read, msg);
        assert_eq!(offset as usize, buf.len());
        assert!(read.header.is_private());
    }

    #[test]
    fn test_terminator_and_eof() {
        let mut offset = 0;
        assert_eq!(
            FidoPackedMessage::read(&mut Cursor::new(vec![0u8, 0]), &mut offset).unwrap(),
            None
        );
        let mut offset = 0;
        assert_eq!(
            FidoPackedMessage::read(&mut Cursor::new(Vec::new()), &mut offset).unwrap(),
            None
        );
    }

    #[test]
    fn test_unknown_message_type() {
        let mut offset = 0;
        let err = FidoPackedMessage::read(&mut Cursor::new(vec![7u8, 0, 1, 2]), &mut offset)
            .unwrap_err();
        assert!(matches!(err, NetError::Malformed { offset: 0, .. }));
    }

    #[test]
    fn test_missing_text_terminator() {
        let mut buf = Vec::new();
        sample().encode(&mut buf).unwrap();
        buf.pop();
        let mut offset = 0;
        let err = FidoPackedMessage::read(&mut Cursor::new(buf), &mut offset).unwrap_err();
        assert!(matches!(err, NetError::Truncated { .. }));
    }

    #[test]
    fn test_overlong_to_field() {
        let mut buf = Vec::new();
        sample().encode(&mut buf).unwrap();
        let mut bad = buf[..34].to_vec();
        bad.extend(std::iter::repeat(b'x').take(40));
        bad.push(0);
        let mut offset = 0;
        let err = FidoPackedMessage::read(&mut Cursor::new(bad), &mut offset).unwrap_err();
        assert!(matches!(err, NetError::Malformed { .. }));
    }

    #[test]
    fn test_long_fields_are_cut_on_write() {
        let mut msg = sample();
        msg.subject = "s".repeat(100).into();
        let mut buf = Vec::new();
        msg.encode(&mut buf).unwrap();
        let mut offset = 0;
        let read = FidoPackedMessage::read(&mut Cursor::new(buf), &mut offset)
            .unwrap()
            .unwrap();
        assert_eq!(read.subject.len(), MAX_SUBJECT_LEN - 1);
    }

    #[test]
    fn test_truncate_field() {
        assert_eq!(truncate_field("héllo".as_bytes(), 2), b"h");
        assert_eq!(truncate_field(b"abc", 10), b"abc");
        assert_eq!(truncate_field(b"\x81\x82\x83", 2), b"\x81\x82");
        assert_eq!(truncate_field(b"ab\0cd", 10), b"ab");
    }

    #[test]
    fn test_eight_bit_fields_survive() {
        let mut msg = sample();
        msg.from_user_name = NetText::from(&b"M\x81ller"[..]);
        msg.text = NetText::from(&b"\xc9\xcd\xbb\rHej d\x86\r"[..]);
        let mut buf = Vec::new();
        msg.encode(&mut buf).unwrap();
        let mut offset = 0;
        let read = FidoPackedMessage::read(&mut Cursor::new(buf), &mut offset)
            .unwrap()
            .unwrap();
        assert_eq!(read.from_user_name.as_bytes(), b"M\x81ller");
        assert_eq!(read.from_user_name.to_text(), "Müller");
        assert_eq!(read, msg);
    }
}
