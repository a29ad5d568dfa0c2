//! Hop records inside WWIVnet message text.
//!
//! Each system that forwards a text-bearing packet inserts a control line
//! right after the date line:
//!
//! ```text
//! TITLE\0 SENDER\r\n DATE\r\n ^D0R 1@WWIVnet\r\n ^D0R 5@WWIVnet\r\n TEXT
//! ```
//!
//! The newest hop comes first. The line lives in the free text rather than
//! the binary header, so its byte sequence is part of the wire format.

use serde::Serialize;

use crate::model::network::Network;
use crate::packet::field::{FieldReader, FIELD_DELIMITERS, MAX_FIELD_LEN};
use crate::packet::net_packet::NetPacket;
use crate::packet::text::TextLayout;

/// Prefix of a routing line: control-D, `0`, `R`, space.
pub const ROUTING_PREFIX: &[u8] = b"\x040R ";

/// One recorded hop.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RoutingHop {
    pub system_number: u16,
    pub network: String,
}

impl RoutingHop {
    /// The hop line, CRLF terminated.
    pub fn to_line(&self) -> Vec<u8> {
        let mut line = ROUTING_PREFIX.to_vec();
        line.extend_from_slice(format!("{}@{}\r\n", self.system_number, self.network).as_bytes());
        line
    }

    /// Parse the part of a routing line after [`ROUTING_PREFIX`].
    fn parse(value: &str) -> Option<Self> {
        let (system, network) = value.split_once('@')?;
        Some(Self {
            system_number: system.trim().parse().ok()?,
            network: network.trim().to_string(),
        })
    }
}

impl From<&Network> for RoutingHop {
    fn from(network: &Network) -> Self {
        Self {
            system_number: network.system_number,
            network: network.name.clone(),
        }
    }
}

/// Offset just past the date line, or `None` for layouts without an envelope.
fn routing_offset(packet: &NetPacket) -> Option<usize> {
    let layout = TextLayout::for_raw(packet.header().main_type);
    if !layout.has_envelope() {
        return None;
    }
    let mut reader = FieldReader::new(packet.text());
    if matches!(layout, TextLayout::SubtypePost | TextLayout::NamedEmail) {
        reader.field();
    }
    // title, sender, date
    for _ in 0..3 {
        reader.field();
    }
    Some(reader.position().min(packet.text().len()))
}

/// Insert a hop through `network` in front of any existing hops.
///
/// Returns `false`, leaving the packet untouched, when the main type has no
/// text envelope to carry routing lines or the payload cannot grow any
/// further. Calling this N times records N hops.
pub fn update_routing(packet: &mut NetPacket, network: &Network) -> bool {
    let Some(offset) = routing_offset(packet) else {
        return false;
    };
    let line = RoutingHop::from(network).to_line();
    let mut text = Vec::with_capacity(packet.text().len() + line.len());
    text.extend_from_slice(&packet.text()[..offset]);
    text.extend_from_slice(&line);
    text.extend_from_slice(&packet.text()[offset..]);
    packet.set_text(text).is_ok()
}

/// Hops recorded in `packet`, most recent first.
pub fn routing_hops(packet: &NetPacket) -> Vec<RoutingHop> {
    let Some(offset) = routing_offset(packet) else {
        return Vec::new();
    };
    let mut reader = FieldReader::new(&packet.text()[offset..]);
    let mut hops = Vec::new();
    while reader.rest().starts_with(ROUTING_PREFIX) {
        let line = reader.field_with(&FIELD_DELIMITERS[1..], MAX_FIELD_LEN * 2);
        match line
            .strip_prefix(ROUTING_PREFIX)
            .and_then(|value| std::str::from_utf8(value).ok())
            .and_then(RoutingHop::parse)
        {
            Some(hop) => hops.push(hop),
            None => break,
        }
    }
    hops
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::types::MainType;
    use crate::packet::header::NetHeader;
    use crate::packet::text::ParsedNetPacketText;

    fn post_packet() -> NetPacket {
        let text = b"GENCHAT\0Title\0Sender #1 @1\r\nMon Jan 02 15:04:05 2006\r\nBody".to_vec();
        NetPacket::new(NetHeader::with_type(MainType::NewPost, 0), Vec::new(), text).unwrap()
    }

    #[test]
    fn test_update_routing_inserts_after_date() {
        let mut packet = post_packet();
        assert!(packet.update_routing(&Network::new("WWIVnet", 1)));
        assert_eq!(
            packet.text(),
            b"GENCHAT\0Title\0Sender #1 @1\r\nMon Jan 02 15:04:05 2006\r\n\x040R 1@WWIVnet\r\nBody"
        );
        assert_eq!(packet.header().length as usize, packet.text().len());
    }

    #[test]
    fn test_hops_stack_newest_first() {
        let mut packet = post_packet();
        packet.update_routing(&Network::new("WWIVnet", 1));
        packet.update_routing(&Network::new("WWIVnet", 5));
        packet.update_routing(&Network::new("FilNet", 7));
        let hops = routing_hops(&packet);
        assert_eq!(
            hops,
            vec![
                RoutingHop { system_number: 7, network: "FilNet".into() },
                RoutingHop { system_number: 5, network: "WWIVnet".into() },
                RoutingHop { system_number: 1, network: "WWIVnet".into() },
            ]
        );
        assert_eq!(packet.header().length as usize, packet.text().len());
    }

    #[test]
    fn test_envelope_fields_unchanged_by_routing() {
        let mut packet = post_packet();
        let before = packet.parsed_text();
        packet.update_routing(&Network::new("WWIVnet", 1));
        let after = packet.parsed_text();
        assert_eq!(after.subtype, before.subtype);
        assert_eq!(after.title, before.title);
        assert_eq!(after.sender, before.sender);
        assert_eq!(after.date, before.date);
        assert!(after.text.ends_with(b"Body"));
    }

    #[test]
    fn test_email_routing() {
        let mut text = ParsedNetPacketText::new(MainType::Email);
        text.title = "Hi".into();
        text.sender = "Me".into();
        text.date = "today".into();
        text.text = "x".into();
        let mut packet = text.to_packet(NetHeader::default(), Vec::new()).unwrap();
        assert!(packet.update_routing(&Network::new("WWIVnet", 9)));
        assert!(packet.text().starts_with(b"Hi\0Me\r\ntoday\r\n\x040R 9@WWIVnet\r\n"));
    }

    #[test]
    fn test_body_only_type_is_not_routed() {
        let mut packet = NetPacket::new(
            NetHeader::with_type(MainType::Ssm, 0),
            Vec::new(),
            b"short message".to_vec(),
        )
        .unwrap();
        assert!(!packet.update_routing(&Network::new("WWIVnet", 1)));
        assert_eq!(packet.text(), b"short message");
        assert!(routing_hops(&packet).is_empty());
    }

    #[test]
    fn test_truncated_envelope_routes_at_end() {
        let mut packet = NetPacket::new(
            NetHeader::with_type(MainType::Email, 0),
            Vec::new(),
            b"Title only".to_vec(),
        )
        .unwrap();
        assert!(packet.update_routing(&Network::new("WWIVnet", 2)));
        assert_eq!(packet.text(), b"Title only\x040R 2@WWIVnet\r\n");
        assert_eq!(packet.header().length, 25);
    }
}
