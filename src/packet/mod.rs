//! WWIVnet packets: binary header, destination list and text payload.

pub mod field;
pub mod file;
pub mod header;
pub mod net_packet;
pub mod routing;
pub mod text;

pub use field::{get_message_field, FieldReader, NetText};
pub use file::NetMailFile;
pub use header::NetHeader;
pub use net_packet::{read_wwivnet_packet, write_wwivnet_packet, NetPacket, ReadNetPacketResponse};
pub use routing::{routing_hops, RoutingHop};
pub use text::{NetInfoFile, ParsedNetPacketText, TextLayout};
