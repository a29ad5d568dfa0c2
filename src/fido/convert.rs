//! Gateway between FidoNet packed messages and WWIVnet packets.
//!
//! Private FidoNet messages become `email_name` packets and everything else
//! becomes a `new_post` in the sub named by the `AREA:` line. In the other
//! direction `new_post` packets become echomail and email becomes netmail.

use std::io::Write;

use tracing::{debug, warn};

use crate::datetime::{daten_to_fido, daten_to_wwivnet_time, fido_to_daten};
use crate::error::{NetError, Result};
use crate::fido::address::{get_address_from_origin, FidoAddress};
use crate::fido::header::FidoPacketHeader;
use crate::fido::message::{FidoPackedMessage, PackedMessageHeader, MSG_LOCAL, MSG_PRIVATE};
use crate::fido::packet::FidoPacket;
use crate::fido::text::{echomail_area_name, fido_to_wwiv_text, wwiv_to_fido_text};
use crate::model::types::{main_type_name, MainType};
use crate::packet::field::NetText;
use crate::packet::header::NetHeader;
use crate::packet::net_packet::NetPacket;
use crate::packet::text::ParsedNetPacketText;

/// System number FidoNet traffic appears to come from inside WWIVnet.
pub const FTN_FAKE_OUTBOUND_NODE: u16 = 32765;

/// Control line naming the FidoNet recipient of a post.
const FIDO_ADDR_LINE: &[u8] = b"\x040FidoAddr: ";

/// Settings for turning FidoNet messages into WWIVnet packets.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportOptions {
    /// `from_system` of imported packets.
    pub fake_outbound_node: u16,
    /// `to_system` of imported packets; the local system.
    pub to_system: u16,
    /// Timestamp used when a message date cannot be parsed.
    pub fallback_daten: u32,
    /// Password the sending node must put in its packet headers.
    pub packet_password: String,
}

impl Default for ImportOptions {
    fn default() -> Self {
        Self {
            fake_outbound_node: FTN_FAKE_OUTBOUND_NODE,
            to_system: 1,
            fallback_daten: 0,
            packet_password: String::new(),
        }
    }
}

/// Settings for turning WWIVnet packets into FidoNet messages.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportOptions {
    /// Our FidoNet address.
    pub from: FidoAddress,
    /// Address of the node the message is sent to.
    pub dest: FidoAddress,
    /// Text of the origin line, usually the BBS name.
    pub origin_line: String,
    /// Product name for the PID and TID kludges and the tear line.
    pub program: String,
}

impl ExportOptions {
    pub fn new(from: FidoAddress, dest: FidoAddress, origin_line: impl Into<String>) -> Self {
        Self {
            from,
            dest,
            origin_line: origin_line.into(),
            program: format!("wwivnet {}", env!("CARGO_PKG_VERSION")),
        }
    }
}

/// Fail with [`NetError::PasswordMismatch`] unless the packet carries
/// `expected`. Case is ignored.
pub fn check_packet_password(header: &FidoPacketHeader, expected: &str) -> Result<()> {
    if header.password().eq_ignore_ascii_case(expected) {
        return Ok(());
    }
    let address = header.orig_address();
    warn!(orig = %address, "Unexpected packet password");
    Err(NetError::PasswordMismatch {
        address: address.to_string(),
    })
}

/// Check the packet password, then convert every message of `packet`.
///
/// Nothing is converted when the password does not match.
pub fn import_packet(packet: &mut FidoPacket, options: &ImportOptions) -> Result<Vec<NetPacket>> {
    check_packet_password(packet.header(), &options.packet_password)?;
    let mut imported = Vec::new();
    while let Some(msg) = packet.read()? {
        imported.push(import_message(&msg, options)?);
    }
    Ok(imported)
}

/// Convert one FidoNet message to a WWIVnet packet.
pub fn import_message(msg: &FidoPackedMessage, options: &ImportOptions) -> Result<NetPacket> {
    let is_email = msg.header.is_private();
    let daten = fido_to_daten(&msg.date_time.to_text()).unwrap_or(options.fallback_daten);

    let main_type = if is_email {
        MainType::EmailName
    } else {
        MainType::NewPost
    };
    let mut text = ParsedNetPacketText::new(main_type);
    if is_email {
        text.to = msg.to_user_name.clone();
    } else {
        text.subtype = echomail_area_name(&msg.text).unwrap_or_default();
    }
    text.title = msg.subject.clone();

    // "NAME(ZONE:NET/NODE)", or "NAME()" when the origin line has no address.
    let origin = get_address_from_origin(&msg.text.to_text())
        .map(|addr| addr.to_string())
        .unwrap_or_default();
    let mut sender = msg.from_user_name.as_bytes().to_vec();
    sender.extend_from_slice(format!("({origin})").as_bytes());
    text.sender = sender.into();

    text.date = daten_to_wwivnet_time(daten).into();
    text.text = fido_to_wwiv_text(&msg.text).into();

    let header = NetHeader {
        to_system: options.to_system,
        from_system: options.fake_outbound_node,
        daten,
        ..NetHeader::default()
    };
    debug!(
        subject = %msg.subject,
        main_type = main_type.name(),
        "Imported FidoNet message"
    );
    text.to_packet(header, Vec::new())
}

/// Convert one WWIVnet packet to a FidoNet message.
///
/// Only `new_post`, `email` and `email_name` packets can be exported.
pub fn export_packet(packet: &NetPacket, options: &ExportOptions) -> Result<FidoPackedMessage> {
    let main_type = packet.header().main_type();
    let is_email = match main_type {
        Some(MainType::Email | MainType::EmailName) => true,
        Some(MainType::NewPost) => false,
        _ => {
            return Err(NetError::Malformed {
                offset: 0,
                reason: format!(
                    "cannot export {} to FidoNet",
                    main_type_name(packet.header().main_type)
                ),
            })
        }
    };
    let parsed = packet.parsed_text();

    let mut to_user_name = cleanup_wwiv_name(&parsed.to);
    let mut body: &[u8] = &parsed.text;
    if !is_email {
        let (addressee, rest) = split_post_preamble(body);
        to_user_name = addressee.map(cleanup_wwiv_name).unwrap_or_default();
        body = rest;
    }
    let to_user_name = if to_user_name.is_empty() {
        NetText::from("All")
    } else {
        properize(&to_user_name)
    };

    let from = &options.from;
    let mut text = Vec::new();
    if is_email {
        write!(
            text,
            "\u{1}INTL {} {}\r",
            options.dest.to_zone_net_node(),
            from.to_zone_net_node()
        )?;
    } else {
        text.extend_from_slice(b"AREA:");
        text.extend_from_slice(&parsed.subtype);
        text.push(b'\r');
    }
    write!(text, "\u{1}PID: {}\r", options.program)?;
    write!(text, "\u{1}TID: {}\r", options.program)?;
    write!(
        text,
        "\u{1}MSGID: {} {:08x}\r",
        from.to_zone_net_node(),
        packet.header().daten
    )?;
    text.extend_from_slice(&wwiv_to_fido_text(body));
    write!(text, "--- {}\r", options.program)?;
    write!(
        text,
        " * Origin: {} ({})\r",
        options.origin_line,
        from.to_zone_net_node()
    )?;
    if !is_email {
        write!(text, "SEEN-BY: {}\r", from.to_net_node())?;
    }

    let mut attribute = MSG_LOCAL;
    if is_email {
        attribute |= MSG_PRIVATE;
    }
    Ok(FidoPackedMessage {
        header: PackedMessageHeader {
            message_type: 2,
            orig_node: from.node,
            dest_node: options.dest.node,
            orig_net: from.net,
            dest_net: options.dest.net,
            attribute,
            cost: 0,
        },
        date_time: daten_to_fido(packet.header().daten).into(),
        to_user_name,
        from_user_name: cleanup_wwiv_name(&parsed.sender),
        subject: parsed.title,
        text: text.into(),
    })
}

/// Strip WWIV decorations (`#NN`, `@NODE`, `(ADDR)`) from a user name.
pub fn cleanup_wwiv_name(name: &[u8]) -> NetText {
    let end = name
        .iter()
        .position(|&b| matches!(b, b'#' | b'@' | b'('))
        .unwrap_or(name.len());
    NetText::from(name[..end].trim_ascii())
}

/// Split off the control lines and `BY:` line that open a gated post.
///
/// Returns the FidoNet recipient named by a `FidoAddr` line, if any, and the
/// remaining body.
fn split_post_preamble(body: &[u8]) -> (Option<&[u8]>, &[u8]) {
    let mut addressee = None;
    let mut rest = body;
    while rest.starts_with(b"\x04") {
        let (line, tail) = split_line(rest);
        // Older systems doubled the ^D.
        let line = match line.strip_prefix(b"\x04") {
            Some(inner) if inner.starts_with(b"\x04") => inner,
            _ => line,
        };
        if let Some(name) = line.strip_prefix(FIDO_ADDR_LINE) {
            addressee = Some(name);
        }
        rest = tail;
    }
    if rest.starts_with(b"BY: ") {
        rest = split_line(rest).1;
    }
    (addressee, rest)
}

/// First CRLF-terminated line and the rest; the whole input when there is no CRLF.
fn split_line(text: &[u8]) -> (&[u8], &[u8]) {
    match text.windows(2).position(|pair| pair == b"\r\n") {
        Some(at) => (&text[..at], &text[at + 2..]),
        None => (text, &[]),
    }
}

/// Capitalize the first letter of each word, lowercasing the rest.
fn properize(name: &[u8]) -> NetText {
    let mut word_start = true;
    let out: Vec<u8> = name
        .iter()
        .map(|&c| {
            let mapped = if word_start {
                c.to_ascii_uppercase()
            } else {
                c.to_ascii_lowercase()
            };
            word_start = c.is_ascii_whitespace() || c == b'-';
            mapped
        })
        .collect();
    out.into()
}
