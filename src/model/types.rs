//! WWIVnet message classes.
//!
//! The `main_type` word of a packet header selects how the payload is laid
//! out; the `minor_type` refines it (sub-board number for numeric posts,
//! info-file kind for `File` packets).

use serde::Serialize;

/// Closed set of WWIVnet main types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[repr(u16)]
pub enum MainType {
    NetUpdate = 0x0000,
    /// Email addressed by user number.
    Email = 0x0001,
    /// Post from a sub host, numeric sub type in `minor_type`.
    Post = 0x0002,
    File = 0x0003,
    /// Post to a sub host, numeric sub type in `minor_type`.
    PrePost = 0x0004,
    External = 0x0005,
    /// Email addressed by name.
    EmailName = 0x0006,
    NetEdit = 0x0007,
    SubList = 0x0008,
    ExtraData = 0x0009,
    BbsList = 0x000a,
    Connect = 0x000b,
    RequestedFile = 0x000c,
    GroupInfo = 0x000d,
    Ssm = 0x000e,
    SubAddReq = 0x000f,
    SubDropReq = 0x0010,
    SubAddResp = 0x0011,
    SubDropResp = 0x0012,
    SubListInfo = 0x0013,
    /// Post with a string sub type carried in the payload.
    NewPost = 0x0019,
    NewExternal = 0x001a,
}

impl MainType {
    /// Raw wire value.
    pub fn as_u16(self) -> u16 {
        self as u16
    }

    /// Human readable description.
    pub fn name(self) -> &'static str {
        match self {
            MainType::NetUpdate => "Network Update",
            MainType::Email => "email by usernum",
            MainType::Post => "post from sub host",
            MainType::File => "file",
            MainType::PrePost => "post to sub host",
            MainType::External => "external message",
            MainType::EmailName => "email by name",
            MainType::NetEdit => "NetEdit message",
            MainType::SubList => "SUBS.LST",
            MainType::ExtraData => "Extra Data",
            MainType::BbsList => "BBSLIST from GC",
            MainType::Connect => "CONNECT from GC",
            MainType::RequestedFile => "requested file",
            MainType::GroupInfo => "Info from GC",
            MainType::Ssm => "SSM",
            MainType::SubAddReq => "Sub Add Request",
            MainType::SubDropReq => "Sub Drop Request",
            MainType::SubAddResp => "Sub Add Response",
            MainType::SubDropResp => "Sub Drop Response",
            MainType::SubListInfo => "Sub Info",
            MainType::NewPost => "new post",
            MainType::NewExternal => "new external",
        }
    }
}

impl TryFrom<u16> for MainType {
    type Error = u16;

    fn try_from(value: u16) -> Result<Self, Self::Error> {
        Ok(match value {
            0x0000 => MainType::NetUpdate,
            0x0001 => MainType::Email,
            0x0002 => MainType::Post,
            0x0003 => MainType::File,
            0x0004 => MainType::PrePost,
            0x0005 => MainType::External,
            0x0006 => MainType::EmailName,
            0x0007 => MainType::NetEdit,
            0x0008 => MainType::SubList,
            0x0009 => MainType::ExtraData,
            0x000a => MainType::BbsList,
            0x000b => MainType::Connect,
            0x000c => MainType::RequestedFile,
            0x000d => MainType::GroupInfo,
            0x000e => MainType::Ssm,
            0x000f => MainType::SubAddReq,
            0x0010 => MainType::SubDropReq,
            0x0011 => MainType::SubAddResp,
            0x0012 => MainType::SubDropResp,
            0x0013 => MainType::SubListInfo,
            0x0019 => MainType::NewPost,
            0x001a => MainType::NewExternal,
            other => return Err(other),
        })
    }
}

/// Display name for a raw main type, including unknown values.
pub fn main_type_name(raw: u16) -> String {
    match MainType::try_from(raw) {
        Ok(t) => t.name().to_string(),
        Err(v) => format!("unknown type {v:#06x}"),
    }
}

/// Minor types carried by `MainType::File` packets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[repr(u16)]
pub enum NetInfoType {
    Generic = 0,
    BbsList = 1,
    Connect = 2,
    SubList = 3,
    WwivNews = 4,
    Feedback = 5,
    MoreWwivNews = 6,
    CategoryNet = 7,
    NetworkList = 8,
    File = 9,
    Binkp = 10,
}

impl NetInfoType {
    pub fn as_u16(self) -> u16 {
        self as u16
    }
}

impl TryFrom<u16> for NetInfoType {
    type Error = u16;

    fn try_from(value: u16) -> Result<Self, Self::Error> {
        Ok(match value {
            0 => NetInfoType::Generic,
            1 => NetInfoType::BbsList,
            2 => NetInfoType::Connect,
            3 => NetInfoType::SubList,
            4 => NetInfoType::WwivNews,
            5 => NetInfoType::Feedback,
            6 => NetInfoType::MoreWwivNews,
            7 => NetInfoType::CategoryNet,
            8 => NetInfoType::NetworkList,
            9 => NetInfoType::File,
            10 => NetInfoType::Binkp,
            other => return Err(other),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_main_type_wire_values() {
        assert_eq!(MainType::NewPost.as_u16(), 0x19);
        assert_eq!(MainType::EmailName.as_u16(), 6);
        assert_eq!(MainType::try_from(0x19), Ok(MainType::NewPost));
        assert_eq!(MainType::try_from(0x14), Err(0x14));
    }

    #[test]
    fn test_main_type_name_unknown() {
        assert_eq!(main_type_name(1), "email by usernum");
        assert_eq!(main_type_name(0x30), "unknown type 0x0030");
    }

    #[test]
    fn test_net_info_type() {
        assert_eq!(NetInfoType::try_from(9), Ok(NetInfoType::File));
        assert!(NetInfoType::try_from(11).is_err());
    }
}
