//! Serve a folder over HTTP for quick local-network sharing.
//!
//! Two binaries sit on top of this crate: `servefolder` serves a folder as
//! is, `sharefolder` can additionally require a Basic Auth password.
//! Not suitable for public hosting over the internet.

pub mod address;
pub mod app;
pub mod args;
pub mod auth;
pub mod config;
pub mod error;
pub mod handler;
pub mod interfaces;
pub mod logging;
pub mod server;
pub mod version;

pub use error::{Error, Result};
