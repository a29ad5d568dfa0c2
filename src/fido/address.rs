//! FidoNet Technology Network addresses (`zone:net/node[.point][@domain]`).

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::NetError;

/// A 5D FTN address.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FidoAddress {
    pub zone: u16,
    pub net: u16,
    pub node: u16,
    /// Point number, 0 for the boss node itself.
    pub point: u16,
    /// Domain such as `fidonet`, empty when unknown.
    pub domain: String,
}

impl FidoAddress {
    pub fn new(zone: u16, net: u16, node: u16) -> Self {
        Self {
            zone,
            net,
            node,
            ..Self::default()
        }
    }

    pub fn with_point(mut self, point: u16) -> Self {
        self.point = point;
        self
    }

    pub fn with_domain(mut self, domain: impl Into<String>) -> Self {
        self.domain = domain.into();
        self
    }

    /// `zone:net/node`, as used in origin lines.
    pub fn to_zone_net_node(&self) -> String {
        format!("{}:{}/{}", self.zone, self.net, self.node)
    }

    /// `net/node`, as used in SEEN-BY lines.
    pub fn to_net_node(&self) -> String {
        format!("{}/{}", self.net, self.node)
    }
}

impl fmt::Display for FidoAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}/{}", self.zone, self.net, self.node)?;
        if self.point != 0 {
            write!(f, ".{}", self.point)?;
        }
        if !self.domain.is_empty() {
            write!(f, "@{}", self.domain)?;
        }
        Ok(())
    }
}

impl FromStr for FidoAddress {
    type Err = NetError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || NetError::InvalidAddress(s.to_string());
        let number = |part: &str| part.trim().parse::<u16>().map_err(|_| invalid());

        let (address, domain) = match s.trim().split_once('@') {
            Some((address, domain)) => (address, domain.trim().to_string()),
            None => (s.trim(), String::new()),
        };
        let (zone, rest) = address.split_once(':').ok_or_else(invalid)?;
        let (net, rest) = rest.split_once('/').ok_or_else(invalid)?;
        let (node, point) = match rest.split_once('.') {
            Some((node, point)) => (node, number(point)?),
            None => (rest, 0),
        };

        Ok(Self {
            zone: number(zone)?,
            net: number(net)?,
            node: number(node)?,
            point,
            domain,
        })
    }
}

/// Address in parentheses at the end of the last ` * Origin:` line of `text`.
///
/// FidoNet text separates lines with CR; LF is tolerated too.
pub fn get_address_from_origin(text: &str) -> Option<FidoAddress> {
    let origin = text
        .split(['\r', '\n'])
        .filter(|line| line.starts_with(" * Origin:"))
        .last()?;
    let open = origin.rfind('(')?;
    let close = origin[open..].find(')')? + open;
    origin[open + 1..close].parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_zone_net_node() {
        let addr: FidoAddress = "21:2/115".parse().unwrap();
        assert_eq!(addr, FidoAddress::new(21, 2, 115));
        assert_eq!(addr.to_string(), "21:2/115");
    }

    #[test]
    fn test_parse_point_and_domain() {
        let addr: FidoAddress = "1:218/700.3@fidonet".parse().unwrap();
        assert_eq!(
            addr,
            FidoAddress::new(1, 218, 700).with_point(3).with_domain("fidonet")
        );
        assert_eq!(addr.to_string(), "1:218/700.3@fidonet");
        assert_eq!(addr.to_zone_net_node(), "1:218/700");
        assert_eq!(addr.to_net_node(), "218/700");
    }

    #[test]
    fn test_parse_errors() {
        for bad in ["", "1/2", "1:2", "a:b/c", "1:2/3.x", "70000:1/1"] {
            let err = bad.parse::<FidoAddress>().unwrap_err();
            assert!(matches!(err, NetError::InvalidAddress(_)), "{bad}");
        }
    }

    #[test]
    fn test_address_from_origin() {
        let text = "Hello\r--- WWIV\r * Origin: Some BBS (Telnet bbs.example:2323) (21:1/100)\rSEEN-BY: 1/100\r";
        assert_eq!(
            get_address_from_origin(text),
            Some(FidoAddress::new(21, 1, 100))
        );
    }

    #[test]
    fn test_last_origin_wins() {
        let text = " * Origin: quoted (1:1/1)\r\rreply\r * Origin: real (2:2/2.5)\r";
        assert_eq!(
            get_address_from_origin(text),
            Some(FidoAddress::new(2, 2, 2).with_point(5))
        );
    }

    #[test]
    fn test_no_origin() {
        assert_eq!(get_address_from_origin("just text\r"), None);
        assert_eq!(get_address_from_origin(" * Origin: no address\r"), None);
    }
}
