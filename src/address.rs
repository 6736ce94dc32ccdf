//! Listen address parsing.
//!
//! Addresses use the `host:port` form. The host may be empty (`:8080`),
//! which means "listen on all interfaces"; IPv6 hosts must be bracketed
//! (`[::1]:8080`).

use std::io;
use std::net::{Ipv4Addr, Ipv6Addr, SocketAddr, ToSocketAddrs};
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AddrError {
    #[error("address {0}: missing port in address")]
    MissingPort(String),

    #[error("address {0}: too many colons in address")]
    TooManyColons(String),

    #[error("address {0}: missing ']' in address")]
    MissingBracket(String),

    #[error("address {0}: unexpected '[' in address")]
    UnexpectedOpenBracket(String),

    #[error("address {0}: unexpected ']' in address")]
    UnexpectedCloseBracket(String),

    #[error("address {addr}: invalid port {port:?}")]
    InvalidPort { addr: String, port: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListenAddr {
    pub host: String,
    pub port: u16,
}

/// Splits `host:port` into its parts without interpreting either one.
pub fn split_host_port(addr: &str) -> Result<(&str, &str), AddrError> {
    let missing_port = || AddrError::MissingPort(addr.to_string());
    let colon = addr.rfind(':').ok_or_else(missing_port)?;

    let (host, rest_from, tail_from) = if addr.starts_with('[') {
        let end = addr
            .find(']')
            .ok_or_else(|| AddrError::MissingBracket(addr.to_string()))?;
        if end + 1 == addr.len() {
            return Err(missing_port());
        }
        if end + 1 != colon {
            return Err(if addr.as_bytes()[end + 1] == b':' {
                AddrError::TooManyColons(addr.to_string())
            } else {
                missing_port()
            });
        }
        (&addr[1..end], 1, end + 1)
    } else {
        let host = &addr[..colon];
        if host.contains(':') {
            return Err(AddrError::TooManyColons(addr.to_string()));
        }
        (host, 0, 0)
    };

    if addr[rest_from..].contains('[') {
        return Err(AddrError::UnexpectedOpenBracket(addr.to_string()));
    }
    if addr[tail_from..].contains(']') {
        return Err(AddrError::UnexpectedCloseBracket(addr.to_string()));
    }

    Ok((host, &addr[colon + 1..]))
}

impl FromStr for ListenAddr {
    type Err = AddrError;

    fn from_str(addr: &str) -> Result<Self, Self::Err> {
        let (host, port) = split_host_port(addr)?;
        let port = port.parse::<u16>().map_err(|_| AddrError::InvalidPort {
            addr: addr.to_string(),
            port: port.to_string(),
        })?;
        Ok(ListenAddr {
            host: host.to_string(),
            port,
        })
    }
}

impl ListenAddr {
    /// True when no host was given and the server listens on every interface.
    pub fn is_wildcard(&self) -> bool {
        self.host.is_empty()
    }

    /// Socket addresses to try binding, in order. A wildcard prefers the
    /// dual-stack IPv6 socket and falls back to IPv4 only.
    pub fn socket_addrs(&self) -> io::Result<Vec<SocketAddr>> {
        if self.is_wildcard() {
            return Ok(vec![
                SocketAddr::from((Ipv6Addr::UNSPECIFIED, self.port)),
                SocketAddr::from((Ipv4Addr::UNSPECIFIED, self.port)),
            ]);
        }
        Ok((self.host.as_str(), self.port).to_socket_addrs()?.collect())
    }
}
