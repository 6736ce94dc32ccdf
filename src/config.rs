use log::{info, warn};
use std::io::{self, BufRead, Write};
use std::path::{Component, Path, PathBuf};

use crate::args::{ServeArgs, ShareArgs};
use crate::error::{Error, Result};

/// Startup configuration. Built once from the command line and never mutated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub addr: String,
    pub root: PathBuf,
    pub password: Option<String>,
}

impl Config {
    pub fn from_serve_args(args: ServeArgs) -> Result<Self> {
        let root = resolve_root(args.common.folder.as_deref())?;
        Ok(Config {
            addr: args.common.addr,
            root,
            password: None,
        })
    }

    /// Builds the configuration for the password-capable variant. When a
    /// prompt is requested and no password was passed, one line is read
    /// from `input` after writing the prompt to `prompt_out`.
    pub fn from_share_args<R: BufRead, W: Write>(
        args: ShareArgs,
        input: &mut R,
        prompt_out: &mut W,
    ) -> Result<Self> {
        let mut password = args.password;
        if args.prompt_password && password.is_empty() {
            password = prompt_password(input, prompt_out).map_err(Error::Prompt)?;
            if password.is_empty() {
                warn!("Empty password entered, basic auth disabled");
            }
        }

        let password = if password.is_empty() {
            None
        } else {
            info!("Using basic auth password {}", mask(&password));
            Some(password)
        };

        let root = resolve_root(args.common.folder.as_deref())?;
        Ok(Config {
            addr: args.common.addr,
            root,
            password,
        })
    }
}

/// One `*` per character, so the log shows the length but not the secret.
pub fn mask(password: &str) -> String {
    "*".repeat(password.chars().count())
}

pub fn prompt_password<R: BufRead, W: Write>(input: &mut R, out: &mut W) -> io::Result<String> {
    write!(out, "Enter basic authentication password: ")?;
    out.flush()?;
    let mut line = String::new();
    input.read_line(&mut line)?;
    let trimmed = line.trim_end_matches(['\r', '\n']);
    Ok(trimmed.to_string())
}

/// Makes `folder` absolute against the working directory and removes `.`
/// and `..` components. `None` and the empty path both mean the working
/// directory.
pub fn resolve_root(folder: Option<&Path>) -> Result<PathBuf> {
    let folder = folder.unwrap_or(Path::new(""));
    let absolute = if folder.is_absolute() {
        folder.to_path_buf()
    } else {
        let cwd = std::env::current_dir().map_err(|source| Error::ResolvePath {
            path: folder.to_path_buf(),
            source,
        })?;
        cwd.join(folder)
    };
    let root = clean(&absolute);
    if !root.is_dir() {
        warn!("Served folder is not an existing directory | path: {:?}", root);
    }
    Ok(root)
}

fn clean(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if !matches!(
                    out.components().next_back(),
                    Some(Component::RootDir | Component::Prefix(_)) | None
                ) {
                    out.pop();
                }
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}
