//! Core data model: message classes and network identity.

pub mod network;
pub mod types;
