//! Identity of the local system on one network.

use serde::{Deserialize, Serialize};

/// A network as seen from the local system: its name and our node number on it.
///
/// Passed explicitly to routing and gateway code; nothing in the packet layer
/// looks this up from global state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Network {
    /// Network name, e.g. `WWIVnet`.
    pub name: String,
    /// Our system (node) number on this network.
    pub system_number: u16,
}

impl Network {
    pub fn new(name: impl Into<String>, system_number: u16) -> Self {
        Self {
            name: name.into(),
            system_number,
        }
    }
}
