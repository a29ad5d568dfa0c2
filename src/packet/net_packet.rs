//! One WWIVnet packet: header, destination list and payload.

use std::fs::OpenOptions;
use std::io::{self, BufWriter, Read, Write};
use std::path::Path;

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use serde::Serialize;
use tracing::debug;

use crate::error::{NetError, Result};
use crate::model::network::Network;
use crate::packet::field::decode_text;
use crate::packet::header::{NetHeader, HEADER_SIZE, LIST_ENTRY_SIZE};
use crate::packet::routing;
use crate::packet::text::ParsedNetPacketText;

/// In-memory WWIVnet packet.
///
/// `header.length` always equals `text().len()` and `header.list_len`
/// always equals `list().len()`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NetPacket {
    header: NetHeader,
    list: Vec<u16>,
    #[serde(serialize_with = "serialize_text")]
    text: Vec<u8>,
}

impl NetPacket {
    /// Build a packet, fixing up the header's length fields to match.
    ///
    /// Fails with [`NetError::Malformed`] when the list has more entries than
    /// `list_len` can count or the payload is too long for `length`.
    pub fn new(mut header: NetHeader, list: Vec<u16>, text: Vec<u8>) -> Result<Self> {
        header.list_len = u16::try_from(list.len()).map_err(|_| NetError::Malformed {
            offset: 0,
            reason: format!("{} list entries do not fit a u16 count", list.len()),
        })?;
        header.length = payload_len(&text)?;
        Ok(Self { header, list, text })
    }

    pub fn header(&self) -> &NetHeader {
        &self.header
    }

    /// Systems this packet is also destined for.
    pub fn list(&self) -> &[u16] {
        &self.list
    }

    /// Raw payload.
    pub fn text(&self) -> &[u8] {
        &self.text
    }

    pub fn into_parts(self) -> (NetHeader, Vec<u16>, Vec<u8>) {
        (self.header, self.list, self.text)
    }

    /// Payload split into envelope fields for this packet's main type.
    pub fn parsed_text(&self) -> ParsedNetPacketText {
        ParsedNetPacketText::from_packet(self)
    }

    /// Record a hop through `network`; see [`routing::update_routing`].
    pub fn update_routing(&mut self, network: &Network) -> bool {
        routing::update_routing(self, network)
    }

    /// Replace the payload, keeping `header.length` in step.
    pub(crate) fn set_text(&mut self, text: Vec<u8>) -> Result<()> {
        self.header.length = payload_len(&text)?;
        self.text = text;
        Ok(())
    }

    /// Number of bytes [`NetPacket::encode`] writes.
    pub fn encoded_len(&self) -> usize {
        HEADER_SIZE + self.list.len() * LIST_ENTRY_SIZE + self.text.len()
    }

    /// Write header, list and payload, in that order.
    pub fn encode<W: Write>(&self, writer: &mut W) -> io::Result<usize> {
        self.header.encode(writer)?;
        for system in &self.list {
            writer.write_u16::<LittleEndian>(*system)?;
        }
        writer.write_all(&self.text)?;
        Ok(self.encoded_len())
    }
}

fn payload_len(text: &[u8]) -> Result<u32> {
    u32::try_from(text.len()).map_err(|_| NetError::Malformed {
        offset: 0,
        reason: format!("{} byte payload does not fit a u32 length", text.len()),
    })
}

fn serialize_text<S: serde::Serializer>(text: &[u8], s: S) -> std::result::Result<S::Ok, S::Error> {
    s.serialize_str(&decode_text(text))
}

/// Outcome of reading one packet from a stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReadNetPacketResponse {
    Packet(NetPacket),
    /// The stream ended cleanly on a packet boundary.
    EndOfFile,
    /// The stream ended inside a packet.
    Truncated { needed: u64, available: u64 },
}

/// Read the next packet from `reader`.
///
/// Short reads are reported as [`ReadNetPacketResponse::Truncated`]; any
/// other I/O failure is an error.
pub fn read_wwivnet_packet<R: Read>(reader: &mut R) -> Result<ReadNetPacketResponse> {
    let mut raw_header = [0u8; HEADER_SIZE];
    let got = read_full(reader, &mut raw_header)?;
    if got == 0 {
        return Ok(ReadNetPacketResponse::EndOfFile);
    }
    if got < HEADER_SIZE {
        return Ok(ReadNetPacketResponse::Truncated {
            needed: HEADER_SIZE as u64,
            available: got as u64,
        });
    }
    let header = NetHeader::decode(&mut &raw_header[..])?;

    let list_bytes = usize::from(header.list_len) * LIST_ENTRY_SIZE;
    let mut raw_list = vec![0u8; list_bytes];
    let got = read_full(reader, &mut raw_list)?;
    if got < list_bytes {
        return Ok(ReadNetPacketResponse::Truncated {
            needed: header.body_len(),
            available: got as u64,
        });
    }
    let mut list_reader = &raw_list[..];
    let mut list = Vec::with_capacity(usize::from(header.list_len));
    for _ in 0..header.list_len {
        list.push(list_reader.read_u16::<LittleEndian>()?);
    }

    // Grow the buffer as bytes arrive so a corrupt length cannot force a huge allocation.
    let mut text = Vec::new();
    reader
        .by_ref()
        .take(u64::from(header.length))
        .read_to_end(&mut text)?;
    if text.len() < header.length as usize {
        return Ok(ReadNetPacketResponse::Truncated {
            needed: header.body_len(),
            available: (list_bytes + text.len()) as u64,
        });
    }

    Ok(ReadNetPacketResponse::Packet(NetPacket {
        header,
        list,
        text,
    }))
}

/// Fill `buf` as far as the stream allows, returning the byte count.
fn read_full<R: Read>(reader: &mut R, buf: &mut [u8]) -> io::Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }
    Ok(filled)
}

/// Append `packet` to the file at `path`, creating the file if needed.
pub fn write_wwivnet_packet(path: impl AsRef<Path>, packet: &NetPacket) -> Result<()> {
    let path = path.as_ref();
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(|e| NetError::io(path, e))?;
    let mut writer = BufWriter::new(file);
    packet
        .encode(&mut writer)
        .map_err(|e| NetError::io(path, e))?;
    writer.flush().map_err(|e| NetError::io(path, e))?;
    debug!(
        path = %path.display(),
        main_type = packet.header.main_type,
        length = packet.header.length,
        "Wrote WWIVnet packet"
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::types::MainType;
    use std::io::Cursor;

    fn sample() -> NetPacket {
        let header = NetHeader {
            to_system: 2,
            from_system: 1,
            main_type: MainType::Email.as_u16(),
            daten: 1_000_000,
            ..NetHeader::default()
        };
        NetPacket::new(header, vec![5, 6], b"Title\0Sender\r\ndate\r\nbody".to_vec()).unwrap()
    }

    #[test]
    fn test_new_fixes_lengths() {
        let header = NetHeader {
            length: 999,
            list_len: 42,
            ..NetHeader::default()
        };
        let packet = NetPacket::new(header, vec![1], b"abc".to_vec()).unwrap();
        assert_eq!(packet.header().length, 3);
        assert_eq!(packet.header().list_len, 1);
    }

    #[test]
    fn test_list_too_long_for_count() {
        let list: Vec<u16> = (0..=u16::MAX).collect();
        assert_eq!(list.len(), 65_536);
        let err = NetPacket::new(NetHeader::default(), list, b"x".to_vec()).unwrap_err();
        assert!(matches!(err, NetError::Malformed { .. }));
    }

    #[test]
    fn test_longest_list_encodes_and_reads_back() {
        let list: Vec<u16> = (0..u16::MAX).collect();
        let packet = NetPacket::new(NetHeader::default(), list, b"x".to_vec()).unwrap();
        assert_eq!(packet.header().list_len, u16::MAX);

        let mut buf = Vec::new();
        packet.encode(&mut buf).unwrap();
        let mut cursor = Cursor::new(buf);
        assert_eq!(
            read_wwivnet_packet(&mut cursor).unwrap(),
            ReadNetPacketResponse::Packet(packet)
        );
        assert_eq!(
            read_wwivnet_packet(&mut cursor).unwrap(),
            ReadNetPacketResponse::EndOfFile
        );
    }

    #[test]
    fn test_encode_decode() {
        let packet = sample();
        let mut buf = Vec::new();
        let written = packet.encode(&mut buf).unwrap();
        assert_eq!(written, buf.len());
        assert_eq!(buf.len(), HEADER_SIZE + 4 + packet.text().len());
        assert_eq!(&buf[HEADER_SIZE..HEADER_SIZE + 4], &[5, 0, 6, 0]);

        let mut cursor = Cursor::new(buf);
        assert_eq!(
            read_wwivnet_packet(&mut cursor).unwrap(),
            ReadNetPacketResponse::Packet(packet)
        );
        assert_eq!(
            read_wwivnet_packet(&mut cursor).unwrap(),
            ReadNetPacketResponse::EndOfFile
        );
    }

    #[test]
    fn test_truncated_header() {
        let mut cursor = Cursor::new(vec![0u8; 10]);
        assert_eq!(
            read_wwivnet_packet(&mut cursor).unwrap(),
            ReadNetPacketResponse::Truncated {
                needed: HEADER_SIZE as u64,
                available: 10
            }
        );
    }

    #[test]
    fn test_truncated_payload() {
        let mut buf = Vec::new();
        sample().encode(&mut buf).unwrap();
        buf.truncate(buf.len() - 3);
        let response = read_wwivnet_packet(&mut Cursor::new(buf)).unwrap();
        assert!(matches!(response, ReadNetPacketResponse::Truncated { .. }));
    }

    #[test]
    fn test_corrupt_length_does_not_allocate_upfront() {
        let header = NetHeader {
            length: u32::MAX,
            ..NetHeader::default()
        };
        let mut buf = Vec::new();
        header.encode(&mut buf).unwrap();
        buf.extend_from_slice(b"tiny");
        let response = read_wwivnet_packet(&mut Cursor::new(buf)).unwrap();
        assert_eq!(
            response,
            ReadNetPacketResponse::Truncated {
                needed: u64::from(u32::MAX),
                available: 4
            }
        );
    }

    #[test]
    fn test_write_appends() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("s2.net");
        write_wwivnet_packet(&path, &sample()).unwrap();
        write_wwivnet_packet(&path, &sample()).unwrap();
        let len = std::fs::metadata(&path).unwrap().len();
        assert_eq!(len as usize, 2 * sample().encoded_len());
    }

    #[test]
    fn test_write_to_missing_dir_fails() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("no-such-dir").join("s2.net");
        let err = write_wwivnet_packet(&path, &sample()).unwrap_err();
        assert!(matches!(err, NetError::Io { .. }));
    }
}
