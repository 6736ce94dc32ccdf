use std::io;
use std::net::SocketAddr;
use std::path::PathBuf;
use thiserror::Error;

use crate::address::AddrError;

pub type Result<T> = std::result::Result<T, Error>;

/// Fatal conditions. Each one maps to a distinct process exit code.
#[derive(Debug, Error)]
pub enum Error {
    #[error("Failed to resolve {path:?}: {source}")]
    ResolvePath {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Failed to split addr: {0}")]
    Addr(#[from] AddrError),

    #[error("Failed to read password: {0}")]
    Prompt(#[source] io::Error),

    #[error("Failed to get interfaces: {0}")]
    Interfaces(#[source] io::Error),

    #[error("Failed to get interface addresses | interface: {name} | error: {source}")]
    InterfaceAddrs {
        name: String,
        #[source]
        source: io::Error,
    },

    #[error("Failed to resolve listen address {addr}: {source}")]
    Lookup {
        addr: String,
        #[source]
        source: io::Error,
    },

    #[error("Failed to bind {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: io::Error,
    },

    #[error("Server Error on {addr}: {source}")]
    Serve {
        addr: SocketAddr,
        #[source]
        source: hyper::Error,
    },
}

impl Error {
    pub fn exit_code(&self) -> u8 {
        match self {
            Error::ResolvePath { .. } => 1,
            Error::Addr(_) => 2,
            Error::Prompt(_) => 3,
            Error::Lookup { .. } | Error::Bind { .. } | Error::Serve { .. } => 4,
            Error::Interfaces(_) => 11,
            Error::InterfaceAddrs { .. } => 12,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn io_err() -> io::Error {
        io::Error::other("boom")
    }

    #[test]
    fn exit_codes_are_distinct_per_failure() {
        let cases = [
            (
                Error::ResolvePath {
                    path: PathBuf::from("x"),
                    source: io_err(),
                },
                1,
            ),
            (Error::Addr(AddrError::MissingPort("x".into())), 2),
            (Error::Prompt(io_err()), 3),
            (
                Error::Bind {
                    addr: ":1".into(),
                    source: io_err(),
                },
                4,
            ),
            (Error::Interfaces(io_err()), 11),
            (
                Error::InterfaceAddrs {
                    name: "eth0".into(),
                    source: io_err(),
                },
                12,
            ),
        ];
        for (err, code) in cases {
            assert_eq!(err.exit_code(), code, "{err}");
        }
    }
}
