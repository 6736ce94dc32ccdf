//! Works out which URLs the server is reachable at, for the startup banner.

use std::io;
use std::net::{IpAddr, Ipv4Addr};

use crate::address::ListenAddr;
use crate::error::{Error, Result};

/// Local network interfaces and their addresses.
pub trait InterfaceSource {
    fn interfaces(&self) -> io::Result<Vec<String>>;
    fn addresses(&self, interface: &str) -> io::Result<Vec<IpAddr>>;
}

/// Reads interfaces from the operating system.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemInterfaces;

impl InterfaceSource for SystemInterfaces {
    fn interfaces(&self) -> io::Result<Vec<String>> {
        let mut names: Vec<String> = Vec::new();
        for iface in if_addrs::get_if_addrs()? {
            if !names.contains(&iface.name) {
                names.push(iface.name);
            }
        }
        Ok(names)
    }

    fn addresses(&self, interface: &str) -> io::Result<Vec<IpAddr>> {
        Ok(if_addrs::get_if_addrs()?
            .into_iter()
            .filter(|iface| iface.name == interface)
            .map(|iface| iface.ip())
            .collect())
    }
}

/// IPv4 form of `addr`, including IPv4-mapped IPv6 addresses.
pub fn ipv4_of(addr: IpAddr) -> Option<Ipv4Addr> {
    match addr {
        IpAddr::V4(v4) => Some(v4),
        IpAddr::V6(v6) => v6.to_ipv4_mapped(),
    }
}

/// URLs to print for a server listening on `listen`. `raw` is the address
/// as configured and is echoed verbatim when a host was given.
pub fn listening_urls<S: InterfaceSource>(
    listen: &ListenAddr,
    raw: &str,
    source: &S,
) -> Result<Vec<String>> {
    if !listen.is_wildcard() {
        return Ok(vec![format!("http://{}/", raw)]);
    }

    let mut urls = Vec::new();
    for name in source.interfaces().map_err(Error::Interfaces)? {
        let addrs = source
            .addresses(&name)
            .map_err(|source| Error::InterfaceAddrs {
                name: name.clone(),
                source,
            })?;
        urls.extend(
            addrs
                .into_iter()
                .filter_map(ipv4_of)
                .map(|ip| format!("http://{}:{}/", ip, listen.port)),
        );
    }
    Ok(urls)
}
