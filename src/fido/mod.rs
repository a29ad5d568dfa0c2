//! FidoNet packets and the FidoNet <-> WWIVnet gateway.

pub mod address;
pub mod convert;
pub mod header;
pub mod message;
pub mod packet;
pub mod text;

pub use address::FidoAddress;
pub use convert::{
    check_packet_password, export_packet, import_message, import_packet, ExportOptions,
    ImportOptions,
};
pub use header::FidoPacketHeader;
pub use message::{FidoPackedMessage, PackedMessageHeader};
pub use packet::{FidoPacket, FidoPacketState, FidoPacketWriter};
