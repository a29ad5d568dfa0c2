//! Structured view of a WWIVnet payload.
//!
//! Text-bearing packets start with a short envelope whose shape depends on
//! the main type (the payload is not self-describing):
//!
//! ```text
//! new_post:    SUBTYPE\0 TITLE\0 SENDER\r\n DATE\r\n TEXT
//! email:       TITLE\0 SENDER\r\n DATE\r\n TEXT
//! email_name:  TO\0 TITLE\0 SENDER\r\n DATE\r\n TEXT
//! file (info): FILENAME\0 FLAGS\0 DATA
//! ```

use serde::Serialize;

use crate::error::Result;
use crate::model::types::{MainType, NetInfoType};
use crate::packet::field::{FieldReader, NetText, MAX_FIELD_LEN};
use crate::packet::header::NetHeader;
use crate::packet::net_packet::NetPacket;

/// Envelope shape of a payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum TextLayout {
    /// Sub type, title, sender, date.
    SubtypePost,
    /// Title, sender, date.
    Titled,
    /// Recipient name, title, sender, date.
    NamedEmail,
    /// No envelope; the payload is all body.
    Body,
}

impl TextLayout {
    /// Layout used by packets of `main_type`.
    pub fn for_main_type(main_type: MainType) -> Self {
        match main_type {
            MainType::NewPost => TextLayout::SubtypePost,
            MainType::Email
            | MainType::Post
            | MainType::PrePost
            | MainType::External
            | MainType::NewExternal => TextLayout::Titled,
            MainType::EmailName => TextLayout::NamedEmail,
            MainType::NetUpdate
            | MainType::File
            | MainType::NetEdit
            | MainType::SubList
            | MainType::ExtraData
            | MainType::BbsList
            | MainType::Connect
            | MainType::RequestedFile
            | MainType::GroupInfo
            | MainType::Ssm
            | MainType::SubAddReq
            | MainType::SubDropReq
            | MainType::SubAddResp
            | MainType::SubDropResp
            | MainType::SubListInfo => TextLayout::Body,
        }
    }

    /// Layout for a raw header value; unknown types are body only.
    pub fn for_raw(main_type: u16) -> Self {
        MainType::try_from(main_type)
            .map(Self::for_main_type)
            .unwrap_or(TextLayout::Body)
    }

    /// Whether the payload carries title/sender/date lines.
    pub fn has_envelope(self) -> bool {
        self != TextLayout::Body
    }
}

/// Payload decomposed into its envelope fields and body.
///
/// Fields hold the payload bytes unchanged, so splitting and joining give
/// back the original payload whatever its encoding.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ParsedNetPacketText {
    /// Raw main type the payload was parsed as.
    pub main_type: u16,
    /// Recipient name (`email_name` only).
    pub to: NetText,
    /// Sub-board tag (`new_post` only).
    pub subtype: NetText,
    pub title: NetText,
    pub sender: NetText,
    /// Date line as written by the sender.
    pub date: NetText,
    /// Body, including any control lines.
    pub text: NetText,
}

impl ParsedNetPacketText {
    /// Empty text for `main_type`.
    pub fn new(main_type: MainType) -> Self {
        Self {
            main_type: main_type.as_u16(),
            ..Self::default()
        }
    }

    /// Split `text` according to the layout of `main_type`.
    pub fn from_text(main_type: MainType, text: &[u8]) -> Self {
        Self::from_raw(main_type.as_u16(), text)
    }

    /// Split a packet's payload according to its own main type.
    pub fn from_packet(packet: &NetPacket) -> Self {
        Self::from_raw(packet.header().main_type, packet.text())
    }

    fn from_raw(main_type: u16, text: &[u8]) -> Self {
        let layout = TextLayout::for_raw(main_type);
        let mut reader = FieldReader::new(text);
        let mut parsed = Self {
            main_type,
            ..Self::default()
        };
        match layout {
            TextLayout::SubtypePost => parsed.subtype = reader.field(),
            TextLayout::NamedEmail => parsed.to = reader.field(),
            TextLayout::Titled | TextLayout::Body => {}
        }
        if layout.has_envelope() {
            parsed.title = reader.field();
            parsed.sender = reader.field();
            parsed.date = reader.field();
        }
        parsed.text = reader.rest().into();
        parsed
    }

    pub fn layout(&self) -> TextLayout {
        TextLayout::for_raw(self.main_type)
    }

    /// Serialize back to payload bytes.
    ///
    /// NUL follows the sub type, recipient and title; CRLF follows sender and date.
    pub fn to_packet_text(&self) -> Vec<u8> {
        let layout = self.layout();
        let mut out = Vec::with_capacity(
            self.to.len()
                + self.subtype.len()
                + self.title.len()
                + self.sender.len()
                + self.date.len()
                + self.text.len()
                + 8,
        );
        match layout {
            TextLayout::SubtypePost => {
                out.extend_from_slice(self.subtype.as_bytes());
                out.push(0);
            }
            TextLayout::NamedEmail => {
                out.extend_from_slice(self.to.as_bytes());
                out.push(0);
            }
            TextLayout::Titled | TextLayout::Body => {}
        }
        if layout.has_envelope() {
            out.extend_from_slice(self.title.as_bytes());
            out.push(0);
            out.extend_from_slice(self.sender.as_bytes());
            out.extend_from_slice(b"\r\n");
            out.extend_from_slice(self.date.as_bytes());
            out.extend_from_slice(b"\r\n");
        }
        out.extend_from_slice(self.text.as_bytes());
        out
    }

    /// Build a packet carrying this text; `header.main_type` is overwritten.
    pub fn to_packet(&self, mut header: NetHeader, list: Vec<u16>) -> Result<NetPacket> {
        header.main_type = self.main_type;
        NetPacket::new(header, list, self.to_packet_text())
    }
}

/// Payload of a `file` packet carrying a network info file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct NetInfoFile {
    pub filename: NetText,
    pub flags: NetText,
    pub data: Vec<u8>,
}

impl NetInfoFile {
    pub fn from_text(text: &[u8]) -> Self {
        let mut reader = FieldReader::new(text);
        let filename = reader.field_with(b"\0", MAX_FIELD_LEN);
        let flags = reader.field_with(b"\0", MAX_FIELD_LEN);
        Self {
            filename,
            flags,
            data: reader.rest().to_vec(),
        }
    }

    /// Wrap in a `file` packet of the given info type.
    pub fn to_packet(&self, info_type: NetInfoType, mut header: NetHeader) -> Result<NetPacket> {
        header.main_type = MainType::File.as_u16();
        header.minor_type = info_type.as_u16();
        NetPacket::new(header, Vec::new(), self.to_packet_text())
    }

    pub fn to_packet_text(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.filename.len() + self.flags.len() + self.data.len() + 2);
        out.extend_from_slice(self.filename.as_bytes());
        out.push(0);
        out.extend_from_slice(self.flags.as_bytes());
        out.push(0);
        out.extend_from_slice(&self.data);
        out
    }
}
