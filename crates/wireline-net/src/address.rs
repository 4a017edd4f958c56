//! Endpoint descriptions and address resolution.

use std::{
    fmt,
    net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr, ToSocketAddrs},
};

use wireline_core::error::{ErrorKind, Result};

/// Address family of an endpoint.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AddressFamily {
    /// Let the resolver choose. Valid only when connecting; resolved and
    /// accepted endpoints always carry a concrete family.
    Unspecified,
    /// IPv4.
    Ipv4,
    /// IPv6.
    Ipv6,
}

impl AddressFamily {
    fn matches(self, address: &SocketAddr) -> bool {
        match self {
            AddressFamily::Unspecified => true,
            AddressFamily::Ipv4 => address.is_ipv4(),
            AddressFamily::Ipv6 => address.is_ipv6(),
        }
    }
}

/// A resolved endpoint: family, textual address, and port.
///
/// The textual address is dotted decimal for IPv4 and colon-hex without
/// brackets for IPv6; `Display` renders the canonical `addr:port` /
/// `[addr]:port` forms.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Endpoint {
    /// Address family of the endpoint.
    pub family: AddressFamily,
    /// Textual address without port or brackets.
    pub address: String,
    /// Port number.
    pub port: u16,
}

impl Default for Endpoint {
    fn default() -> Self {
        Self { family: AddressFamily::Unspecified, address: String::new(), port: 0 }
    }
}

impl From<SocketAddr> for Endpoint {
    fn from(address: SocketAddr) -> Self {
        let family =
            if address.is_ipv4() { AddressFamily::Ipv4 } else { AddressFamily::Ipv6 };
        Self { family, address: address.ip().to_string(), port: address.port() }
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.family {
            AddressFamily::Unspecified => write!(f, "<unspecified>"),
            AddressFamily::Ipv4 => write!(f, "{}:{}", self.address, self.port),
            AddressFamily::Ipv6 => write!(f, "[{}]:{}", self.address, self.port),
        }
    }
}

/// Resolves `host:port` and returns the first candidate matching `family`.
pub(crate) fn resolve_host(family: AddressFamily, host: &str, port: u16) -> Result<SocketAddr> {
    let mut candidates = (host, port)
        .to_socket_addrs()
        .map_err(|error| ErrorKind::ResolveFailed(error.to_string()))?;
    candidates.find(|address| family.matches(address)).ok_or_else(|| {
        ErrorKind::ResolveFailed(format!("no {:?} address found for {}:{}", family, host, port))
    })
}

/// Wildcard listen address of the requested family.
///
/// Listeners need a concrete family; `Unspecified` is rejected here before
/// any socket is created.
pub(crate) fn wildcard_address(family: AddressFamily, port: u16) -> Result<SocketAddr> {
    match family {
        AddressFamily::Ipv4 => Ok(SocketAddr::new(IpAddr::V4(Ipv4Addr::UNSPECIFIED), port)),
        AddressFamily::Ipv6 => Ok(SocketAddr::new(IpAddr::V6(Ipv6Addr::UNSPECIFIED), port)),
        AddressFamily::Unspecified => Err(ErrorKind::ResolveFailed(
            "a listener needs a concrete address family".to_string(),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_renders_canonical_forms() {
        let endpoint = Endpoint {
            family: AddressFamily::Ipv4,
            address: "127.0.0.1".to_string(),
            port: 8080,
        };
        assert_eq!(endpoint.to_string(), "127.0.0.1:8080");

        let endpoint =
            Endpoint { family: AddressFamily::Ipv6, address: "::1".to_string(), port: 443 };
        assert_eq!(endpoint.to_string(), "[::1]:443");

        assert_eq!(Endpoint::default().to_string(), "<unspecified>");
    }

    #[test]
    fn socket_addresses_convert() {
        let endpoint = Endpoint::from("192.168.1.1:9000".parse::<SocketAddr>().unwrap());
        assert_eq!(endpoint.family, AddressFamily::Ipv4);
        assert_eq!(endpoint.address, "192.168.1.1");
        assert_eq!(endpoint.port, 9000);

        let endpoint = Endpoint::from("[::1]:9001".parse::<SocketAddr>().unwrap());
        assert_eq!(endpoint.family, AddressFamily::Ipv6);
        assert_eq!(endpoint.address, "::1");
        assert_eq!(endpoint.port, 9001);
    }

    #[test]
    fn resolution_respects_the_family_filter() {
        let address = resolve_host(AddressFamily::Ipv4, "127.0.0.1", 80).unwrap();
        assert!(address.is_ipv4());
        assert_eq!(address.port(), 80);

        let result = resolve_host(AddressFamily::Ipv6, "127.0.0.1", 80);
        assert!(matches!(result, Err(ErrorKind::ResolveFailed(_))));
    }

    #[test]
    fn listeners_reject_the_unspecified_family() {
        assert!(matches!(
            wildcard_address(AddressFamily::Unspecified, 0),
            Err(ErrorKind::ResolveFailed(_))
        ));
        assert!(wildcard_address(AddressFamily::Ipv4, 0).unwrap().ip().is_unspecified());
    }
}
