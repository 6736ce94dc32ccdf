use std::fmt;

/// Build and project metadata printed by `--version`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionInfo {
    pub name: &'static str,
    pub version: &'static str,
    pub platform: String,
    pub toolchain: &'static str,
    pub author: &'static str,
    pub home: &'static str,
}

impl VersionInfo {
    pub fn new(name: &'static str) -> Self {
        VersionInfo {
            name,
            version: env!("CARGO_PKG_VERSION"),
            platform: format!("{} {}", std::env::consts::OS, std::env::consts::ARCH),
            toolchain: env!("SERVEFOLDER_RUSTC_VERSION"),
            author: env!("CARGO_PKG_AUTHORS"),
            home: env!("CARGO_PKG_HOMEPAGE"),
        }
    }
}

impl fmt::Display for VersionInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{} version: v{}", self.name, self.version)?;
        writeln!(f, "Platform: {}", self.platform)?;
        writeln!(f, "Built with: {}", self.toolchain)?;
        writeln!(f, "Author: {}", self.author)?;
        writeln!(f, "Home page: {}", self.home)
    }
}
