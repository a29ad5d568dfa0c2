//! `wwivnet`: WWIVnet and FidoNet packet handling for BBS network tools.
//!
//! This crate reads and writes WWIVnet packet files, splits packet text into
//! its envelope fields, records routing hops, reads FidoNet type 2+ packets
//! and converts messages between the two networks.

pub mod config;
pub mod datetime;
pub mod error;
pub mod fido;
pub mod model;
pub mod packet;
