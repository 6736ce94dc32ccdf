use clap::{Args, Parser};
use std::ffi::OsString;
use std::path::PathBuf;

/// Long flags that may also be spelled with a single dash (`-addr :9000`).
const LONG_FLAGS: &[&str] = &["version", "addr", "password", "prompt-password", "promptPassword"];

/// Long flags that take their value from the next argument.
const VALUE_FLAGS: &[&str] = &["addr", "password"];

/// Rewrites `-addr`, `-version` and friends to their `--` form so clap does
/// not read them as clusters of short flags. Values and everything after
/// `--` are left alone.
pub fn normalize_flags<I, T>(args: I) -> Vec<OsString>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString>,
{
    let mut out = Vec::new();
    let mut passthrough = false;
    let mut expect_value = false;
    for arg in args {
        let arg: OsString = arg.into();
        if passthrough || expect_value {
            expect_value = false;
            out.push(arg);
            continue;
        }
        if arg == "--" {
            passthrough = true;
            out.push(arg);
            continue;
        }
        let Some(text) = arg.to_str() else {
            out.push(arg);
            continue;
        };
        let long = text.strip_prefix("--").or_else(|| text.strip_prefix('-'));
        match long {
            Some(rest) => {
                let (name, inline_value) = match rest.split_once('=') {
                    Some((name, _)) => (name, true),
                    None => (rest, false),
                };
                if LONG_FLAGS.contains(&name) {
                    expect_value = !inline_value && VALUE_FLAGS.contains(&name);
                    out.push(format!("--{}", rest).into());
                } else {
                    out.push(arg);
                }
            }
            None => out.push(arg),
        }
    }
    out
}

/// Flags shared by both binaries.
#[derive(Args, Debug, Clone)]
pub struct CommonArgs {
    #[arg(long, help = "Print version info and exit")]
    pub version: bool,

    #[arg(
        long,
        default_value = ":8080",
        allow_hyphen_values = true,
        help = "Address to start the server on (host:port, empty host listens on all interfaces)"
    )]
    pub addr: String,

    #[arg(
        value_name = "FOLDER",
        help = "Folder to serve (the current working directory is served if not specified)"
    )]
    pub folder: Option<PathBuf>,
}

/// Serves a folder via HTTP
#[derive(Parser, Debug)]
#[command(
    name = "servefolder",
    about = "Serves a folder via HTTP",
    long_about = Some(
        "servefolder serves a folder via HTTP.\n\
        Useful for quick sharing. Not suitable for public hosting over the internet."
    ),
    disable_version_flag = true
)]
pub struct ServeArgs {
    #[command(flatten)]
    pub common: CommonArgs,
}

/// Serves a folder via HTTP, optionally protected by a Basic Auth password
#[derive(Parser, Debug)]
#[command(
    name = "sharefolder",
    about = "Serves a folder via HTTP, optionally protected by a Basic Auth password",
    long_about = Some(
        "sharefolder serves a folder via HTTP.\n\
        Set a password to require HTTP basic authentication (any username is accepted).\n\
        Useful for quick sharing. Not suitable for public hosting over the internet."
    ),
    disable_version_flag = true
)]
pub struct ShareArgs {
    #[command(flatten)]
    pub common: CommonArgs,

    #[arg(
        long,
        default_value = "",
        hide_default_value = true,
        help = "Require basic authentication with this password"
    )]
    pub password: String,

    #[arg(
        long = "prompt-password",
        alias = "promptPassword",
        help = "Prompt for the password in the console instead of passing --password"
    )]
    pub prompt_password: bool,
}
